mod args;

use args::{Args, AskArgs, Command};
use clap::Parser;
use ielts_ai::{AiClient, AiRequest, Cancellation, RequestLogger};
use ielts_config::{AiConfig, Config};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config {
            ai: AiConfig::from_env()?,
            ..Config::default()
        },
    };

    ielts_telemetry::init(&config.telemetry)?;

    match args.command {
        Command::Ask(ask) => run_ask(&config.ai, ask).await,
    }
}

async fn run_ask(config: &AiConfig, args: AskArgs) -> anyhow::Result<()> {
    let client = AiClient::new(config)?;

    let mut request = AiRequest::new(
        args.model.unwrap_or_else(|| config.model.clone()),
        args.max_tokens.unwrap_or(config.max_tokens),
    )
    .with_temperature(args.temperature.unwrap_or(config.temperature));

    if let Some(system) = args.system {
        request = request.with_system(system);
    }
    let request = request.with_user(args.prompt);

    // Ctrl-C or SIGTERM abandons the call, including any pending retry
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    let mut cancel = Cancellation::token(shutdown);
    if let Some(timeout) = args.timeout {
        cancel = cancel.with_timeout(timeout);
    }

    let logger = args
        .request_log
        .then(|| RequestLogger::stdout().with_context("command", "ask"));

    tracing::debug!(model = request.model(), "asking model");

    let text = client
        .call_for_text_until(&request, None, logger.as_ref(), &cancel)
        .await
        .into_result()?;

    println!("{text}");
    Ok(())
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
