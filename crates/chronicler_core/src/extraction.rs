//! Pulling JSON objects out of model responses.
//!
//! Agents are asked for a single JSON object, but models still wrap it in
//! markdown fences or surround it with chatter. These helpers find the
//! object and deserialize it.

use chronicler_error::{ChroniclerResult, JsonError};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Locate the JSON object in `response`.
///
/// Tries a fenced code block first (```` ```json ```` or bare fences), then
/// the first balanced `{ ... }` span, skipping braces inside strings.
///
/// # Errors
///
/// Returns a JSON error when no object is found.
///
/// # Examples
///
/// ```
/// use chronicler_core::extraction::extract_json;
///
/// let response = "Here is the outline:\n```json\n{\"title\": \"Ash\"}\n```\nGood luck!";
/// assert_eq!(extract_json(response)?, "{\"title\": \"Ash\"}");
/// # Ok::<(), chronicler_error::ChroniclerError>(())
/// ```
pub fn extract_json(response: &str) -> ChroniclerResult<&str> {
    if let Some(object) = fenced_block(response).and_then(balanced_object) {
        return Ok(object);
    }
    balanced_object(response).ok_or_else(|| {
        JsonError::new(format!(
            "no JSON object found in response ({} chars)",
            response.len()
        ))
        .into()
    })
}

/// Extract and deserialize the JSON object in `response`.
///
/// # Errors
///
/// Returns a JSON error when no object is found or it does not match `T`.
pub fn parse_json<T: DeserializeOwned>(response: &str) -> ChroniclerResult<T> {
    let json = extract_json(response)?;
    serde_json::from_str(json).map_err(|e| {
        let preview: String = json.chars().take(100).collect();
        debug!(error = %e, preview = %preview, "JSON parsing failed");
        JsonError::new(format!("failed to parse JSON: {} ({}...)", e, preview)).into()
    })
}

/// Content of the first fenced code block; runs to the end when unclosed.
fn fenced_block(response: &str) -> Option<&str> {
    let start = response.find("```")? + 3;
    let body_start = response[start..]
        .find('\n')
        .map(|n| start + n + 1)
        .unwrap_or(start);
    let body = &response[body_start..];
    Some(match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    })
}

/// First balanced `{ ... }` span, ignoring braces inside string literals.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
