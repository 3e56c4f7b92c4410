//! Bias-aware job description generation.
//!
//! Bias flags come from the offline scanner over the generated text, not from
//! the model, so the flags are deterministic for a given output.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::features::bias::{detect_bias, BiasFlag};
use crate::features::prompts::{JD_GENERATION_PROMPT_TEMPLATE, JD_GENERATION_SYSTEM};
use crate::llm_client::schema::require_text;
use crate::llm_client::{CompletionOptions, LlmClient, Validate, ValidationError};

#[derive(Debug, Clone, Deserialize)]
pub struct JdRequest {
    pub role_title: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub seniority: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct JdDraft {
    title: String,
    #[serde(default)]
    mission_statement: String,
    #[serde(default)]
    milestones_90_day: Vec<String>,
    #[serde(default)]
    requirements: Vec<String>,
    #[serde(default)]
    culture_traits: Vec<String>,
    #[serde(default)]
    growth_path: String,
    #[serde(default)]
    talent_density_score: Option<i64>,
}

impl Validate for JdDraft {
    fn validate(mut self) -> Result<Self, ValidationError> {
        require_text("title", &self.title)?;
        require_text("mission_statement", &self.mission_statement)?;

        for list in [
            &mut self.milestones_90_day,
            &mut self.requirements,
            &mut self.culture_traits,
        ] {
            list.retain(|item| !item.trim().is_empty());
        }

        if let Some(score) = self.talent_density_score {
            if !(0..=100).contains(&score) {
                warn!("Dropping out-of-range talent_density_score={score}");
                self.talent_density_score = None;
            }
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedJd {
    pub title: String,
    pub mission_statement: String,
    pub milestones_90_day: Vec<String>,
    pub requirements: Vec<String>,
    pub culture_traits: Vec<String>,
    pub growth_path: String,
    pub talent_density_score: Option<u8>,
    pub bias_flags: Vec<BiasFlag>,
}

impl GeneratedJd {
    /// All prose fields joined, in display order.
    pub fn flattened_text(&self) -> String {
        let mut parts = vec![self.title.as_str(), self.mission_statement.as_str()];
        parts.extend(self.milestones_90_day.iter().map(String::as_str));
        parts.extend(self.requirements.iter().map(String::as_str));
        parts.extend(self.culture_traits.iter().map(String::as_str));
        parts.push(self.growth_path.as_str());
        parts.join("\n")
    }
}

fn or_unspecified(value: &str) -> &str {
    match value.trim() {
        "" => "Not specified",
        v => v,
    }
}

pub async fn generate_jd(request: &JdRequest, llm: &LlmClient) -> Result<GeneratedJd, AppError> {
    if request.role_title.trim().is_empty() {
        return Err(AppError::Validation(
            "role_title cannot be empty".to_string(),
        ));
    }

    let prompt = JD_GENERATION_PROMPT_TEMPLATE
        .replace("{role_title}", request.role_title.trim())
        .replace("{department}", or_unspecified(&request.department))
        .replace("{seniority}", or_unspecified(&request.seniority))
        .replace("{style}", or_unspecified(&request.style))
        .replace(
            "{notes}",
            or_unspecified(request.notes.as_deref().unwrap_or_default()),
        );

    let draft: JdDraft = llm
        .validated_json(JD_GENERATION_SYSTEM, &prompt, CompletionOptions::default())
        .await?;

    let mut jd = GeneratedJd {
        title: draft.title,
        mission_statement: draft.mission_statement,
        milestones_90_day: draft.milestones_90_day,
        requirements: draft.requirements,
        culture_traits: draft.culture_traits,
        growth_path: draft.growth_path,
        talent_density_score: draft.talent_density_score.map(|s| s as u8),
        bias_flags: vec![],
    };
    jd.bias_flags = detect_bias(&jd.flattened_text());

    info!(
        "Generated JD '{}': {} requirements, {} bias flags",
        jd.title,
        jd.requirements.len(),
        jd.bias_flags.len()
    );

    Ok(jd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{client, ScriptedBackend};
    use crate::llm_client::LlmError;

    fn request(title: &str) -> JdRequest {
        JdRequest {
            role_title: title.to_string(),
            department: "Engineering".to_string(),
            seniority: "Senior".to_string(),
            style: "Direct".to_string(),
            notes: None,
        }
    }

    const DRAFT: &str = r#"{
        "title": "Senior Backend Engineer",
        "mission_statement": "Own the billing platform.",
        "milestones_90_day": ["Ship one feature", "", "Lead an incident review"],
        "requirements": ["Rust in production", "Be a coding ninja"],
        "culture_traits": ["Writes things down"],
        "growth_path": "Staff engineer",
        "talent_density_score": 74
    }"#;

    #[tokio::test]
    async fn test_empty_role_title_makes_no_calls() {
        let backend = ScriptedBackend::replying([DRAFT]);
        let err = generate_jd(&request("   "), &client(&backend))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_bias_flags_come_from_scanner() {
        let backend = ScriptedBackend::replying([DRAFT]);
        let jd = generate_jd(&request("Backend Engineer"), &client(&backend))
            .await
            .unwrap();

        assert_eq!(jd.title, "Senior Backend Engineer");
        assert_eq!(jd.milestones_90_day.len(), 2);
        assert_eq!(jd.talent_density_score, Some(74));
        assert_eq!(jd.bias_flags.len(), 1);
        assert_eq!(jd.bias_flags[0].text, "ninja");
        assert_eq!(jd.bias_flags[0].suggestion, "expert");
    }

    #[tokio::test]
    async fn test_out_of_range_density_is_dropped() {
        let reply = DRAFT.replace("74", "250");
        let backend = ScriptedBackend::replying([reply]);
        let jd = generate_jd(&request("Backend Engineer"), &client(&backend))
            .await
            .unwrap();
        assert_eq!(jd.talent_density_score, None);
    }

    #[tokio::test]
    async fn test_missing_title_is_schema_error() {
        let backend = ScriptedBackend::replying([r#"{"title": "", "mission_statement": "x"}"#]);
        let err = generate_jd(&request("Backend Engineer"), &client(&backend))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(LlmError::Schema(_))));
    }

    #[tokio::test]
    async fn test_prompt_fills_unspecified_fields() {
        let backend = ScriptedBackend::replying([DRAFT]);
        let req = JdRequest {
            role_title: "Designer".to_string(),
            department: String::new(),
            seniority: String::new(),
            style: String::new(),
            notes: Some("Remote-first".to_string()),
        };
        generate_jd(&req, &client(&backend)).await.unwrap();

        let user = backend.last_request().unwrap().messages[1].content.clone();
        assert!(user.contains("ROLE TITLE: Designer"));
        assert!(user.contains("DEPARTMENT: Not specified"));
        assert!(user.contains("HIRING MANAGER NOTES: Remote-first"));
    }

    #[tokio::test]
    async fn test_auth_failure_surfaces() {
        let backend = ScriptedBackend::failing(|| LlmError::Auth("Invalid API Key".to_string()));
        let err = generate_jd(&request("Backend Engineer"), &client(&backend))
            .await
            .unwrap_err();
        assert_eq!(
            err.user_message(),
            "The AI provider rejected the configured API key"
        );
    }
}
