use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Interview-side candidate record.
/// List and grade fields are JSON columns holding the feature output shapes
/// (`CoreQuestion`, `TrapQuestion`, `RiskFactor`, `Grade`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub cv_text: String,
    pub jd_text: String,
    pub questions: Value,
    pub trap_questions: Value,
    pub risk_factors: Value,
    pub human_grades: Value,
    pub ai_grades: Value,
    pub notes: Option<String>,
    pub transcript: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
