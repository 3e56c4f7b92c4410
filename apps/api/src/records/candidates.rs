use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::features::battle_plan::BattlePlan;
use crate::features::calibration::Grade;
use crate::models::candidate::CandidateRow;

/// Writable candidate fields. JSON fields default to empty collections.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateInput {
    pub user_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub cv_text: String,
    #[serde(default)]
    pub jd_text: String,
    #[serde(default = "empty_list")]
    pub questions: Value,
    #[serde(default = "empty_list")]
    pub trap_questions: Value,
    #[serde(default = "empty_list")]
    pub risk_factors: Value,
    #[serde(default = "empty_list")]
    pub human_grades: Value,
    #[serde(default = "empty_list")]
    pub ai_grades: Value,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
}

fn empty_list() -> Value {
    json!([])
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Candidate {id} not found"))
}

pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<CandidateRow>, AppError> {
    let rows = sqlx::query_as::<_, CandidateRow>(
        "SELECT * FROM candidates WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<CandidateRow, AppError> {
    sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(id))
}

pub async fn create(pool: &PgPool, input: &CandidateInput) -> Result<CandidateRow, AppError> {
    let row = sqlx::query_as::<_, CandidateRow>(
        r#"
        INSERT INTO candidates
            (id, user_id, name, cv_text, jd_text, questions, trap_questions,
             risk_factors, human_grades, ai_grades, notes, transcript)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(input.user_id)
    .bind(&input.name)
    .bind(&input.cv_text)
    .bind(&input.jd_text)
    .bind(&input.questions)
    .bind(&input.trap_questions)
    .bind(&input.risk_factors)
    .bind(&input.human_grades)
    .bind(&input.ai_grades)
    .bind(&input.notes)
    .bind(&input.transcript)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Full replacement of the writable fields.
pub async fn update(pool: &PgPool, id: Uuid, input: &CandidateInput) -> Result<CandidateRow, AppError> {
    sqlx::query_as::<_, CandidateRow>(
        r#"
        UPDATE candidates
        SET name = $3, cv_text = $4, jd_text = $5, questions = $6, trap_questions = $7,
            risk_factors = $8, human_grades = $9, ai_grades = $10, notes = $11,
            transcript = $12, updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(input.user_id)
    .bind(&input.name)
    .bind(&input.cv_text)
    .bind(&input.jd_text)
    .bind(&input.questions)
    .bind(&input.trap_questions)
    .bind(&input.risk_factors)
    .bind(&input.human_grades)
    .bind(&input.ai_grades)
    .bind(&input.notes)
    .bind(&input.transcript)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(id))
}

/// Writes a generated battle plan onto an existing candidate.
pub async fn store_battle_plan(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    plan: &BattlePlan,
) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE candidates
        SET questions = $3, trap_questions = $4, risk_factors = $5, updated_at = now()
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(json!(plan.core_questions))
    .bind(json!(plan.trap_questions))
    .bind(json!(plan.risk_factors))
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

pub async fn store_ai_grades(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    grades: &[Grade],
) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE candidates SET ai_grades = $3, updated_at = now() WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .bind(json!(grades))
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM candidates WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_defaults_json_fields_to_empty_lists() {
        let input: CandidateInput = serde_json::from_value(json!({
            "user_id": "6f1c7a6e-2d0b-4d8e-9a55-1d1f0e3c9b21",
            "name": "Grace Hopper"
        }))
        .unwrap();
        assert_eq!(input.questions, json!([]));
        assert_eq!(input.ai_grades, json!([]));
        assert!(input.notes.is_none());
    }

    #[test]
    fn test_input_requires_user_id() {
        let result = serde_json::from_value::<CandidateInput>(json!({"name": "x"}));
        assert!(result.is_err());
    }
}
