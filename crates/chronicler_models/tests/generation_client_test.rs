//! Tests for the resilient generation client.

mod test_utils;

use chronicler_core::{EmbeddingTask, GenerateRequest};
use chronicler_error::GenerationErrorKind;
use chronicler_models::GenerationClient;
use chronicler_rate_limit::{RateLimitConfig, RateLimiter, RetryConfig, RetryPolicy};
use std::time::Duration;
use test_utils::{Reply, ScriptedDriver};

fn client(driver: ScriptedDriver, retry: RetryConfig) -> GenerationClient<ScriptedDriver> {
    let limiter = RateLimiter::new(&RateLimitConfig::default()).expect("valid limiter");
    GenerationClient::new(driver, limiter, RetryPolicy::new(retry))
}

fn fast_retry() -> RetryConfig {
    RetryConfig::default()
        .with_initial_backoff_ms(20)
        .with_jitter(false)
}

fn request() -> GenerateRequest {
    GenerateRequest::new("You are a novelist.", "Write the opening line.")
}

#[tokio::test]
async fn test_two_throttles_then_success() -> anyhow::Result<()> {
    let driver = ScriptedDriver::new(vec![
        Reply::Fail(GenerationErrorKind::Throttled("429".into())),
        Reply::Fail(GenerationErrorKind::Throttled("429".into())),
        Reply::Text("The tide came in red.".into()),
    ]);
    let client = client(driver, fast_retry());

    let response = client.generate(&request()).await?;

    assert_eq!(response.text, "The tide came in red.");
    assert_eq!(client.driver().call_count(), 3);
    let gaps = client.driver().gaps();
    assert_eq!(gaps.len(), 2, "two backoff delays");
    assert!(gaps[0] >= Duration::from_millis(20));
    assert!(gaps[1] >= Duration::from_millis(40));
    Ok(())
}

#[tokio::test]
async fn test_invalid_input_fails_without_retry() {
    let driver = ScriptedDriver::new(vec![Reply::Fail(GenerationErrorKind::InvalidInput(
        "prompt too long".into(),
    ))]);
    let client = client(driver, fast_retry());

    let err = client.generate(&request()).await.expect_err("invalid input");
    assert!(matches!(
        err.generation_kind(),
        Some(GenerationErrorKind::InvalidInput(_))
    ));
    assert_eq!(client.driver().call_count(), 1);
}

#[tokio::test]
async fn test_configuration_error_is_distinct_from_exhaustion() {
    let driver = ScriptedDriver::new(vec![Reply::Fail(GenerationErrorKind::Configuration(
        "API key rejected".into(),
    ))]);
    let client = client(driver, fast_retry());

    let err = client.generate(&request()).await.expect_err("bad key");
    assert!(matches!(
        err.generation_kind(),
        Some(GenerationErrorKind::Configuration(_))
    ));
}

#[tokio::test]
async fn test_unavailable_until_exhausted() {
    let driver = ScriptedDriver::new(vec![
        Reply::Fail(GenerationErrorKind::Unavailable("503".into())),
        Reply::Fail(GenerationErrorKind::Unavailable("503".into())),
        Reply::Fail(GenerationErrorKind::Unavailable("503".into())),
        Reply::Fail(GenerationErrorKind::Unavailable("503".into())),
    ]);
    let client = client(driver, fast_retry().with_max_retries(3));

    let err = client.generate(&request()).await.expect_err("exhausted");
    match err.generation_kind() {
        Some(GenerationErrorKind::RetryExhausted { attempts, .. }) => assert_eq!(*attempts, 4),
        other => panic!("expected RetryExhausted, got {:?}", other),
    }
    assert_eq!(client.driver().call_count(), 4);
}

#[tokio::test]
async fn test_blank_text_is_empty_response() {
    let driver = ScriptedDriver::new(vec![Reply::Text("   \n".into())]);
    let client = client(driver, fast_retry());

    let err = client.generate(&request()).await.expect_err("blank");
    assert_eq!(
        err.generation_kind(),
        Some(&GenerationErrorKind::EmptyResponse)
    );
}

#[tokio::test(start_paused = true)]
async fn test_hung_call_times_out_and_retries() -> anyhow::Result<()> {
    let driver = ScriptedDriver::new(vec![Reply::Hang, Reply::Text("Finally.".into())]);
    let client = client(driver, fast_retry().with_timeout_secs(30));

    let response = client.generate(&request()).await?;

    assert_eq!(response.text, "Finally.");
    assert_eq!(client.driver().call_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_embed_batches_and_marks_failed_items() -> anyhow::Result<()> {
    let driver = ScriptedDriver::new(Vec::new()).with_failing_inputs(&["poison"]);
    let client = client(driver, fast_retry()).with_embedding_batch_size(10);
    let texts: Vec<String> = ["a", "bb", "poison", "dddd", "eeeee"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let vectors = client.embed(&texts, EmbeddingTask::RetrievalDocument).await?;

    assert_eq!(vectors.len(), 5);
    assert_eq!(vectors[0], Some(vec![1.0; 4]));
    assert_eq!(vectors[1], Some(vec![2.0; 4]));
    assert_eq!(vectors[2], None);
    assert_eq!(vectors[3], Some(vec![4.0; 4]));
    assert_eq!(vectors[4], Some(vec![5.0; 4]));
    // Batch cap of 3: [a, bb, poison] fails and is split into 3 item calls, then [dddd, eeeee].
    assert_eq!(client.driver().call_count(), 5);
    Ok(())
}
