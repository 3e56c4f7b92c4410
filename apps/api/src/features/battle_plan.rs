//! Battle plan — risk factors, core questions and trap questions for a CV/JD pair.
//!
//! The expected counts (10 core, 3 trap) are requested in the prompt only.
//! Other counts are accepted and logged. Unknown risk levels become `Medium`.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::features::prompts::{BATTLE_PLAN_PROMPT_TEMPLATE, BATTLE_PLAN_SYSTEM};
use crate::llm_client::prompts::GROUNDING_INSTRUCTION;
use crate::llm_client::{CompletionOptions, LlmClient, Validate, ValidationError};

pub const EXPECTED_CORE_QUESTIONS: usize = 10;
pub const EXPECTED_TRAP_QUESTIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    /// Case-insensitive; anything unrecognized is treated as `Medium`.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => RiskLevel::High,
            "low" => RiskLevel::Low,
            "medium" => RiskLevel::Medium,
            other => {
                warn!("Unrecognized risk level '{other}', using medium");
                RiskLevel::Medium
            }
        }
    }
}

impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(RiskLevel::coerce).unwrap_or(RiskLevel::Medium))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    pub level: RiskLevel,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreQuestion {
    pub question: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub expected_answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrapQuestion {
    pub question: String,
    #[serde(default)]
    pub trap: String,
    #[serde(default)]
    pub good_answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattlePlan {
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default)]
    pub core_questions: Vec<CoreQuestion>,
    #[serde(default)]
    pub trap_questions: Vec<TrapQuestion>,
}

impl Validate for BattlePlan {
    fn validate(mut self) -> Result<Self, ValidationError> {
        self.risk_factors.retain(|r| !r.description.trim().is_empty());
        self.core_questions.retain(|q| !q.question.trim().is_empty());
        self.trap_questions.retain(|q| !q.question.trim().is_empty());

        if self.core_questions.is_empty() {
            return Err(ValidationError::new(
                "core_questions",
                "no usable questions returned",
            ));
        }

        if self.core_questions.len() != EXPECTED_CORE_QUESTIONS
            || self.trap_questions.len() != EXPECTED_TRAP_QUESTIONS
        {
            warn!(
                "Battle plan returned {} core / {} trap questions (expected {}/{}), accepting as-is",
                self.core_questions.len(),
                self.trap_questions.len(),
                EXPECTED_CORE_QUESTIONS,
                EXPECTED_TRAP_QUESTIONS
            );
        }

        Ok(self)
    }
}

/// Builds the interview battle plan for one candidate.
pub async fn generate_battle_plan(
    cv_text: &str,
    jd_text: &str,
    candidate_name: &str,
    llm: &LlmClient,
) -> Result<BattlePlan, AppError> {
    if cv_text.trim().is_empty() {
        return Err(AppError::Validation("cv_text cannot be empty".to_string()));
    }
    if jd_text.trim().is_empty() {
        return Err(AppError::Validation("jd_text cannot be empty".to_string()));
    }

    let name = match candidate_name.trim() {
        "" => "the candidate",
        name => name,
    };

    let prompt = BATTLE_PLAN_PROMPT_TEMPLATE
        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
        .replace("{candidate_name}", name)
        .replace("{cv_text}", cv_text.trim())
        .replace("{jd_text}", jd_text.trim());

    let opts = CompletionOptions::default().with_max_tokens(4096);
    let plan: BattlePlan = llm
        .validated_json(BATTLE_PLAN_SYSTEM, &prompt, opts)
        .await?;

    info!(
        "Battle plan for {name}: {} risks, {} core, {} trap questions",
        plan.risk_factors.len(),
        plan.core_questions.len(),
        plan.trap_questions.len()
    );

    Ok(plan)
}
