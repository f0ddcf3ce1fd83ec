//! End-to-end text calls against a mock Messages API

mod harness;

use harness::config::ConfigBuilder;
use harness::mock_provider::{MockProvider, Reply};
use ielts_ai::{AiClient, AiError, AiRequest, MemorySink, Outcome, RequestLogger};
use std::sync::Arc;

fn request() -> AiRequest {
    AiRequest::new("mock-model", 256)
        .with_system("You are an IELTS examiner.")
        .with_user("Score this essay.")
}

#[tokio::test]
async fn returns_first_text_block() {
    let mock = MockProvider::builder()
        .reply(Reply::Text("Band 7".to_owned()))
        .start()
        .await
        .unwrap();
    let client = AiClient::new(&ConfigBuilder::new(&mock.base_url()).build()).unwrap();

    let outcome = client.call_for_text(&request(), None, None).await;

    assert_eq!(outcome, Outcome::Success("Band 7".to_owned()));
    assert_eq!(mock.request_count(), 1);
}

#[tokio::test]
async fn sends_credential_version_and_messages_body() {
    let mock = MockProvider::start().await.unwrap();
    let client = AiClient::new(&ConfigBuilder::new(&mock.base_url()).build()).unwrap();

    let outcome = client.call_for_text(&request(), None, None).await;
    assert!(outcome.is_success());

    let received = mock.received();
    assert_eq!(received.api_key.as_deref(), Some("test-key"));
    assert_eq!(received.version.as_deref(), Some("2023-06-01"));

    let body = received.body.unwrap();
    assert_eq!(body["model"], "mock-model");
    assert_eq!(body["max_tokens"], 256);
    assert_eq!(body["temperature"], 0.3);
    assert_eq!(body["system"], "You are an IELTS examiner.");
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "Score this essay.");
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_content_is_not_retried() {
    let mock = MockProvider::builder().reply(Reply::Empty).start().await.unwrap();
    let client = AiClient::new(&ConfigBuilder::new(&mock.base_url()).build()).unwrap();

    let outcome = client.call_for_text(&request(), None, None).await;

    assert_eq!(outcome.error(), Some(&AiError::NoTextContent));
    assert_eq!(mock.request_count(), 1);
}

#[tokio::test]
async fn client_error_carries_provider_message() {
    let mock = MockProvider::builder()
        .reply(Reply::Error(401, "invalid x-api-key".to_owned()))
        .start()
        .await
        .unwrap();
    let client = AiClient::new(&ConfigBuilder::new(&mock.base_url()).build()).unwrap();

    let outcome = client.call_for_text(&request(), None, None).await;

    match outcome {
        Outcome::Failure(AiError::Upstream { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid x-api-key");
        }
        other => panic!("expected upstream failure, got {other:?}"),
    }
    assert_eq!(mock.request_count(), 1);
}

#[tokio::test]
async fn missing_credential_sends_nothing() {
    let mock = MockProvider::start().await.unwrap();
    let config = ConfigBuilder::new(&mock.base_url()).without_credential().build();
    let client = AiClient::new(&config).unwrap();

    let outcome = client.call_for_text(&request(), None, None).await;

    assert_eq!(outcome.error(), Some(&AiError::CredentialMissing));
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn logger_records_one_entry_per_attempt() {
    let mock = MockProvider::builder().failing(1, 529).start().await.unwrap();
    let client = AiClient::new(&ConfigBuilder::new(&mock.base_url()).build()).unwrap();
    let sink = Arc::new(MemorySink::default());
    let logger = RequestLogger::new(sink.clone()).with_request_id("req-it-1");

    let outcome = client.call_for_text(&request(), None, Some(&logger)).await;
    assert!(outcome.is_success());

    let attempts: Vec<_> = sink
        .entries()
        .into_iter()
        .filter(|e| e.message == "AI call attempt")
        .collect();
    assert_eq!(attempts.len(), 2);
    assert!(attempts.iter().all(|e| e.request_id == "req-it-1"));
    assert_eq!(attempts[0].context["outcome"], "retryable");
    assert_eq!(attempts[0].context["status"], 529);
    assert_eq!(attempts[1].context["outcome"], "success");
}
