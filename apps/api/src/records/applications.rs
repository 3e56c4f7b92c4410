use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{ApplicationStatus, JobApplicationRow};

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationInput {
    pub user_id: Uuid,
    pub company_name: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub talent_density_score: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub resume_version_id: Option<Uuid>,
}

impl ApplicationInput {
    fn validate(&self) -> Result<ApplicationStatus, AppError> {
        if self.company_name.trim().is_empty() {
            return Err(AppError::Validation(
                "company_name cannot be empty".to_string(),
            ));
        }
        if let Some(score) = self.talent_density_score {
            if !(0..=100).contains(&score) {
                return Err(AppError::Validation(format!(
                    "talent_density_score {score} is outside 0..=100"
                )));
            }
        }
        self.status
            .as_deref()
            .map(parse_status)
            .unwrap_or(Ok(ApplicationStatus::NotApplied))
    }
}

/// Unknown status strings are a validation error, never stored.
pub fn parse_status(raw: &str) -> Result<ApplicationStatus, AppError> {
    raw.trim().parse().map_err(AppError::Validation)
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Application {id} not found"))
}

pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<JobApplicationRow>, AppError> {
    let rows = sqlx::query_as::<_, JobApplicationRow>(
        "SELECT * FROM job_applications WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<JobApplicationRow, AppError> {
    sqlx::query_as::<_, JobApplicationRow>(
        "SELECT * FROM job_applications WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(id))
}

pub async fn create(pool: &PgPool, input: &ApplicationInput) -> Result<JobApplicationRow, AppError> {
    let status = input.validate()?;
    let row = sqlx::query_as::<_, JobApplicationRow>(
        r#"
        INSERT INTO job_applications
            (id, user_id, company_name, job_title, status, talent_density_score,
             notes, resume_version_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(input.user_id)
    .bind(input.company_name.trim())
    .bind(input.job_title.trim())
    .bind(status.as_str())
    .bind(input.talent_density_score)
    .bind(&input.notes)
    .bind(input.resume_version_id)
    .fetch_one(pool)
    .await?;

    info!("Application {} created for {}", row.id, row.company_name);
    Ok(row)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    input: &ApplicationInput,
) -> Result<JobApplicationRow, AppError> {
    let status = input.validate()?;
    sqlx::query_as::<_, JobApplicationRow>(
        r#"
        UPDATE job_applications
        SET company_name = $3, job_title = $4, status = $5, talent_density_score = $6,
            notes = $7, resume_version_id = $8, updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(input.user_id)
    .bind(input.company_name.trim())
    .bind(input.job_title.trim())
    .bind(status.as_str())
    .bind(input.talent_density_score)
    .bind(&input.notes)
    .bind(input.resume_version_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(id))
}

/// Any status may follow any other; last writer wins.
pub async fn update_status(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    status: ApplicationStatus,
) -> Result<JobApplicationRow, AppError> {
    sqlx::query_as::<_, JobApplicationRow>(
        r#"
        UPDATE job_applications
        SET status = $3, updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(id))
}

pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM job_applications WHERE id = $1 AND user_id = $2")
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
    use serde_json::json;

    fn input(value: serde_json::Value) -> ApplicationInput {
        let mut base = json!({
            "user_id": "6f1c7a6e-2d0b-4d8e-9a55-1d1f0e3c9b21",
            "company_name": "Acme"
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), value.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn test_status_defaults_to_not_applied() {
        assert_eq!(
            input(json!({})).validate().unwrap(),
            ApplicationStatus::NotApplied
        );
    }

    #[test]
    fn test_unknown_status_is_validation_error() {
        let err = input(json!({"status": "ghosted"})).validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("ghosted")));
    }

    #[test]
    fn test_known_status_parses() {
        assert_eq!(
            input(json!({"status": "interview_scheduled"}))
                .validate()
                .unwrap(),
            ApplicationStatus::InterviewScheduled
        );
    }

    #[test]
    fn test_blank_company_and_bad_score_rejected() {
        assert!(input(json!({"company_name": " "})).validate().is_err());
        assert!(input(json!({"talent_density_score": 101}))
            .validate()
            .is_err());
    }
}
