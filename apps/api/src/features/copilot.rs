//! Interview co-pilot: streams follow-up probes while an interview is running.

use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::features::prompts::{COPILOT_PROMPT_TEMPLATE, COPILOT_SYSTEM};
use crate::llm_client::{CompletionOptions, CompletionStream, LlmClient};

/// Only the tail of a long transcript is sent.
const MAX_TRANSCRIPT_CHARS: usize = 6000;

#[derive(Debug, Clone, Deserialize)]
pub struct CopilotRequest {
    pub question: String,
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub jd_text: String,
}

pub async fn stream_follow_ups(
    request: &CopilotRequest,
    llm: &LlmClient,
) -> Result<CompletionStream, AppError> {
    if request.question.trim().is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }

    let transcript = transcript_tail(request.transcript.trim(), MAX_TRANSCRIPT_CHARS);
    let prompt = COPILOT_PROMPT_TEMPLATE
        .replace("{question}", request.question.trim())
        .replace("{transcript}", if transcript.is_empty() { "(none yet)" } else { transcript })
        .replace("{jd_text}", request.jd_text.trim());

    let opts = CompletionOptions::default()
        .with_temperature(0.5)
        .with_max_tokens(300);
    let stream = llm.stream_completion(COPILOT_SYSTEM, &prompt, opts).await?;

    info!("Co-pilot stream opened ({} transcript chars)", transcript.len());
    Ok(stream)
}

/// Last `max` bytes of `text`, cut on a char boundary.
fn transcript_tail(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
