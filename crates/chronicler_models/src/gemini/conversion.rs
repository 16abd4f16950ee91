//! Conversion between Chronicler requests and Gemini DTOs.

use super::dto::{
    ApiErrorBody, BatchEmbedRequest, BatchEmbedResponse, Content, EmbedContentRequest,
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
use chronicler_core::{EmbeddingTask, GenerateRequest, GenerateResponse, Usage};
use chronicler_error::{ChroniclerResult, GenerationError, GenerationErrorKind};

pub(crate) fn to_generate_request(req: &GenerateRequest) -> GenerateContentRequest {
    let system_instruction = if req.system_prompt.trim().is_empty() {
        None
    } else {
        Some(Content {
            role: None,
            parts: vec![Part {
                text: req.system_prompt.clone(),
            }],
        })
    };

    GenerateContentRequest {
        system_instruction,
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: req.prompt.clone(),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: req.temperature,
            max_output_tokens: req.max_output_tokens,
        },
    }
}

pub(crate) fn from_generate_response(
    response: GenerateContentResponse,
) -> ChroniclerResult<GenerateResponse> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::new(GenerationErrorKind::EmptyResponse))?;

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(GenerationError::new(GenerationErrorKind::InvalidInput(
            "response blocked by safety filter".to_string(),
        ))
        .into());
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    Ok(GenerateResponse {
        text,
        usage: Usage {
            prompt_tokens: response.usage_metadata.prompt_token_count,
            output_tokens: response.usage_metadata.candidates_token_count,
        },
    })
}

pub(crate) fn to_embed_request(
    model: &str,
    inputs: &[String],
    task: EmbeddingTask,
) -> BatchEmbedRequest {
    BatchEmbedRequest {
        requests: inputs
            .iter()
            .map(|text| EmbedContentRequest {
                model: format!("models/{}", model),
                content: Content {
                    role: None,
                    parts: vec![Part { text: text.clone() }],
                },
                task_type: task.to_string(),
            })
            .collect(),
    }
}

pub(crate) fn from_embed_response(response: BatchEmbedResponse) -> Vec<Vec<f32>> {
    response.embeddings.into_iter().map(|e| e.values).collect()
}

/// Map a failed HTTP response onto a generation error kind.
pub(crate) fn error_from_status(status: u16, body: &str) -> GenerationErrorKind {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if parsed.error.status == "RESOURCE_EXHAUSTED" => {
            // Gemini reports both per-minute throttling and spent quota as
            // RESOURCE_EXHAUSTED; only the latter mentions quota.
            parsed.error.message
        }
        Ok(parsed) => format!("{}: {}", parsed.error.status, parsed.error.message),
        Err(_) => body.chars().take(500).collect(),
    };
    GenerationErrorKind::from_status(status, message)
}
