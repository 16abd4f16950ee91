//! Live tests against the Gemini API.

#![cfg(feature = "gemini")]

use chronicler::{GeminiDriver, GenerateRequest, GenerationDriver};

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)] // Requires GEMINI_API_KEY
async fn test_gemini_short_generation() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let driver = GeminiDriver::from_env("gemini-2.5-flash")?;

    let request = GenerateRequest::new("You are terse.", "Say 'ok'").with_max_output_tokens(16);
    let response = driver.generate(&request).await?;

    assert!(!response.text.trim().is_empty());
    Ok(())
}
