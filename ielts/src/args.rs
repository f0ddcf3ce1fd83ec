use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

/// IELTS prep AI tooling
#[derive(Debug, Parser)]
#[command(name = "ielts", about = "Ask the IELTS prep AI model from the command line")]
pub struct Args {
    /// Path to configuration file; the environment is used when absent
    #[arg(short, long, global = true, env = "IELTS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a prompt and print the model's reply
    Ask(AskArgs),
}

#[derive(Debug, clap::Args)]
pub struct AskArgs {
    /// Prompt text
    pub prompt: String,

    /// Model identifier, overriding the configured default
    #[arg(long)]
    pub model: Option<String>,

    /// Output token ceiling, overriding the configured default
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature, overriding the configured default
    #[arg(long)]
    pub temperature: Option<f64>,

    /// System prompt
    #[arg(long)]
    pub system: Option<String>,

    /// Upper bound on total time including retries, e.g. "45s"
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Emit a JSON log line per attempt on stdout
    #[arg(long)]
    pub request_log: bool,
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    duration_str::parse(s).map_err(|e| format!("invalid duration '{s}': {e}"))
}
