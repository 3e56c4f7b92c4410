//! Shadow interview — one in-character turn of a mock interview.
//!
//! The model answers with `{reply, feedback}`. `feedback` grades the candidate's
//! latest answer; when it is missing or malformed the turn simply has no feedback.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::features::prompts::{SHADOW_OPENING_MESSAGE, SHADOW_SYSTEM_TEMPLATE};
use crate::llm_client::schema::require_text;
use crate::llm_client::{
    ChatMessage, CompletionOptions, LlmClient, LlmError, Role, Validate, ValidationError,
};

/// The fixed interviewer archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    TechnicalSkeptic,
    CultureArchitect,
    ExecutiveCloser,
}

pub struct PersonaProfile {
    pub name: &'static str,
    pub focus: &'static str,
    pub tone: &'static str,
}

impl Persona {
    pub const ALL: [Persona; 3] = [
        Persona::TechnicalSkeptic,
        Persona::CultureArchitect,
        Persona::ExecutiveCloser,
    ];

    pub fn profile(self) -> PersonaProfile {
        match self {
            Persona::TechnicalSkeptic => PersonaProfile {
                name: "The Technical Skeptic",
                focus: "depth of technical claims, trade-offs, debugging, system design",
                tone: "dry, precise, unimpressed by buzzwords; asks 'how exactly?'",
            },
            Persona::CultureArchitect => PersonaProfile {
                name: "The Culture Architect",
                focus: "collaboration, conflict, feedback, values and how the candidate works with others",
                tone: "warm but probing; asks for specific stories rather than opinions",
            },
            Persona::ExecutiveCloser => PersonaProfile {
                name: "The Executive Closer",
                focus: "business impact, ownership, prioritization and motivation for this role",
                tone: "brisk and outcome-driven; pushes for numbers and decisions",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Coaching,
    #[default]
    Standard,
    HighStress,
}

impl Difficulty {
    fn instruction(self) -> &'static str {
        match self {
            Difficulty::Coaching => {
                "Coaching. Be encouraging, give hints when the candidate is stuck, ask one thing at a time."
            }
            Difficulty::Standard => {
                "Standard. A realistic interview: fair, neutral, follow up on vague answers."
            }
            Difficulty::HighStress => {
                "High stress. Interrupt weak answers, challenge every claim, add time pressure."
            }
        }
    }

    fn harder(self) -> Self {
        match self {
            Difficulty::Coaching => Difficulty::Standard,
            Difficulty::Standard | Difficulty::HighStress => Difficulty::HighStress,
        }
    }

    fn easier(self) -> Self {
        match self {
            Difficulty::HighStress => Difficulty::Standard,
            Difficulty::Standard | Difficulty::Coaching => Difficulty::Coaching,
        }
    }
}

/// Escalates after two consecutive scores >= 8, de-escalates after two <= 4.
pub fn adjust_difficulty(current: Difficulty, scores: &[u8]) -> Difficulty {
    let [.., a, b] = scores else {
        return current;
    };
    if *a >= 8 && *b >= 8 {
        current.harder()
    } else if *a <= 4 && *b <= 4 {
        current.easier()
    } else {
        current
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub score: u8,
    pub refinement: String,
    pub trap: String,
}

impl Feedback {
    /// Lenient: anything that is not a well-formed 1-10 grade yields `None`.
    fn from_value(value: Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        let feedback: Feedback = match serde_json::from_value(value) {
            Ok(f) => f,
            Err(e) => {
                debug!("Discarding malformed feedback: {e}");
                return None;
            }
        };
        if !(1..=10).contains(&feedback.score) {
            debug!("Discarding feedback with score {}", feedback.score);
            return None;
        }
        Some(feedback)
    }
}

#[derive(Debug, Deserialize)]
struct RawTurn {
    #[serde(default)]
    reply: String,
    #[serde(default)]
    feedback: Value,
}

impl Validate for RawTurn {
    fn validate(self) -> Result<Self, ValidationError> {
        require_text("reply", &self.reply)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShadowRequest {
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    pub persona: Persona,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub jd_text: String,
    /// Scores from earlier turns, oldest first.
    #[serde(default)]
    pub scores: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShadowTurn {
    pub reply: String,
    pub feedback: Option<Feedback>,
    /// Difficulty to use for the next turn.
    pub difficulty: Difficulty,
}

fn build_system_prompt(request: &ShadowRequest) -> String {
    let profile = request.persona.profile();
    SHADOW_SYSTEM_TEMPLATE
        .replace("{persona_name}", profile.name)
        .replace("{persona_focus}", profile.focus)
        .replace("{persona_tone}", profile.tone)
        .replace("{difficulty_instruction}", request.difficulty.instruction())
        .replace("{resume_text}", request.resume_text.trim())
        .replace("{jd_text}", request.jd_text.trim())
}

/// Conversation turns only; an empty history starts the interview.
fn build_history(history: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut turns: Vec<ChatMessage> = history
        .iter()
        .filter(|m| m.role != Role::System && !m.content.trim().is_empty())
        .cloned()
        .collect();
    if turns.is_empty() {
        turns.push(ChatMessage::user(SHADOW_OPENING_MESSAGE));
    }
    turns
}

pub async fn shadow_turn(request: &ShadowRequest, llm: &LlmClient) -> Result<ShadowTurn, AppError> {
    if request.resume_text.trim().is_empty() && request.jd_text.trim().is_empty() {
        return Err(AppError::Validation(
            "resume_text or jd_text is required".to_string(),
        ));
    }

    let system = build_system_prompt(request);
    let history = build_history(&request.history);

    let raw: RawTurn = llm
        .chat_json(&system, &history, CompletionOptions::default())
        .await?;
    let raw = raw.validate().map_err(LlmError::from)?;

    let feedback = Feedback::from_value(raw.feedback);
    // A turn without a usable score leaves the tier where it is.
    let difficulty = match &feedback {
        Some(f) => {
            let mut scores = request.scores.clone();
            scores.push(f.score);
            adjust_difficulty(request.difficulty, &scores)
        }
        None => request.difficulty,
    };

    info!(
        "Shadow turn ({:?}, {:?}): score={:?}, next difficulty={:?}",
        request.persona,
        request.difficulty,
        feedback.as_ref().map(|f| f.score),
        difficulty
    );

    Ok(ShadowTurn {
        reply: raw.reply.trim().to_string(),
        feedback,
        difficulty,
    })
}
