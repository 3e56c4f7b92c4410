use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{Resume, ResumeVersionRow};

#[derive(Debug, Clone, Deserialize)]
pub struct ResumeVersionInput {
    pub user_id: Uuid,
    pub name: String,
    pub content: Resume,
    #[serde(default)]
    pub target_company: Option<String>,
}

impl ResumeVersionInput {
    fn validate(&self) -> Result<serde_json::Value, AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name cannot be empty".to_string()));
        }
        serde_json::to_value(&self.content).map_err(|e| AppError::Internal(e.into()))
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Resume version {id} not found"))
}

pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<ResumeVersionRow>, AppError> {
    let rows = sqlx::query_as::<_, ResumeVersionRow>(
        "SELECT * FROM resume_versions WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<ResumeVersionRow, AppError> {
    sqlx::query_as::<_, ResumeVersionRow>(
        "SELECT * FROM resume_versions WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(id))
}

pub async fn create(pool: &PgPool, input: &ResumeVersionInput) -> Result<ResumeVersionRow, AppError> {
    let content = input.validate()?;
    let row = sqlx::query_as::<_, ResumeVersionRow>(
        r#"
        INSERT INTO resume_versions (id, user_id, name, content, target_company)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(input.user_id)
    .bind(input.name.trim())
    .bind(content)
    .bind(&input.target_company)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    input: &ResumeVersionInput,
) -> Result<ResumeVersionRow, AppError> {
    let content = input.validate()?;
    sqlx::query_as::<_, ResumeVersionRow>(
        r#"
        UPDATE resume_versions
        SET name = $3, content = $4, target_company = $5, updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(input.user_id)
    .bind(input.name.trim())
    .bind(content)
    .bind(&input.target_company)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(id))
}

pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM resume_versions WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}
