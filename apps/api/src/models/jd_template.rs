use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JdTemplateRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// Serialized `GeneratedJd`.
    pub content: Value,
    pub talent_density_score: Option<i32>,
    /// Serialized `Vec<BiasFlag>`.
    pub bias_flags: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
