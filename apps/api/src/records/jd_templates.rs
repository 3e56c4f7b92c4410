use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::features::bias::{detect_bias, BiasFlag};
use crate::models::jd_template::JdTemplateRow;

#[derive(Debug, Clone, Deserialize)]
pub struct JdTemplateInput {
    pub user_id: Uuid,
    pub title: String,
    pub content: Value,
    #[serde(default)]
    pub talent_density_score: Option<i32>,
    /// Recomputed from `content` when absent.
    #[serde(default)]
    pub bias_flags: Option<Vec<BiasFlag>>,
}

impl JdTemplateInput {
    fn validate(&self) -> Result<Value, AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title cannot be empty".to_string()));
        }
        let flags = match &self.bias_flags {
            Some(flags) => flags.clone(),
            None => detect_bias(&collect_text(&self.content)),
        };
        Ok(json!(flags))
    }
}

/// Every string leaf of a JSON value, newline-joined.
fn collect_text(value: &Value) -> String {
    fn walk(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) => out.push(s.clone()),
            Value::Array(items) => items.iter().for_each(|v| walk(v, out)),
            Value::Object(map) => map.values().for_each(|v| walk(v, out)),
            _ => {}
        }
    }
    let mut out = Vec::new();
    walk(value, &mut out);
    out.join("\n")
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("JD template {id} not found"))
}

pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<JdTemplateRow>, AppError> {
    let rows = sqlx::query_as::<_, JdTemplateRow>(
        "SELECT * FROM jd_templates WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<JdTemplateRow, AppError> {
    sqlx::query_as::<_, JdTemplateRow>("SELECT * FROM jd_templates WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(id))
}

pub async fn create(pool: &PgPool, input: &JdTemplateInput) -> Result<JdTemplateRow, AppError> {
    let bias_flags = input.validate()?;
    let row = sqlx::query_as::<_, JdTemplateRow>(
        r#"
        INSERT INTO jd_templates (id, user_id, title, content, talent_density_score, bias_flags)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(input.user_id)
    .bind(input.title.trim())
    .bind(&input.content)
    .bind(input.talent_density_score)
    .bind(bias_flags)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update(pool: &PgPool, id: Uuid, input: &JdTemplateInput) -> Result<JdTemplateRow, AppError> {
    let bias_flags = input.validate()?;
    sqlx::query_as::<_, JdTemplateRow>(
        r#"
        UPDATE jd_templates
        SET title = $3, content = $4, talent_density_score = $5, bias_flags = $6,
            updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(input.user_id)
    .bind(input.title.trim())
    .bind(&input.content)
    .bind(input.talent_density_score)
    .bind(bias_flags)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(id))
}

pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM jd_templates WHERE id = $1 AND user_id = $2")
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
    fn test_bias_flags_recomputed_from_content() {
        let input: JdTemplateInput = serde_json::from_value(json!({
            "user_id": "6f1c7a6e-2d0b-4d8e-9a55-1d1f0e3c9b21",
            "title": "Engineer",
            "content": {"requirements": ["Be a rockstar"], "growth_path": "Lead a young team"}
        }))
        .unwrap();
        let flags = input.validate().unwrap();
        let flags = flags.as_array().unwrap();
        assert_eq!(flags.len(), 2);
    }

    #[test]
    fn test_explicit_bias_flags_are_kept() {
        let input: JdTemplateInput = serde_json::from_value(json!({
            "user_id": "6f1c7a6e-2d0b-4d8e-9a55-1d1f0e3c9b21",
            "title": "Engineer",
            "content": {"mission_statement": "ninja"},
            "bias_flags": []
        }))
        .unwrap();
        assert_eq!(input.validate().unwrap(), json!([]));
    }

    #[test]
    fn test_collect_text_walks_nested_values() {
        let text = collect_text(&json!({"a": ["x", {"b": "y"}], "c": 3}));
        assert!(text.contains('x'));
        assert!(text.contains('y'));
        assert!(!text.contains('3'));
    }
}
