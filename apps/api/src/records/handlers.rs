//! Axum handlers for the user-scoped record API.
//!
//! Reads and deletes take `?user_id=`; writes carry `user_id` in the body.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::JobApplicationRow;
use crate::models::candidate::CandidateRow;
use crate::models::jd_template::JdTemplateRow;
use crate::models::resume::ResumeVersionRow;
use crate::records::applications::{self, parse_status, ApplicationInput};
use crate::records::candidates::{self, CandidateInput};
use crate::records::jd_templates::{self, JdTemplateInput};
use crate::records::resume_versions::{self, ResumeVersionInput};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub user_id: Uuid,
    pub status: String,
}

// ─── Candidates ────────────────────────────────────────────────────────────

/// GET /api/v1/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<CandidateRow>>, AppError> {
    Ok(Json(candidates::list(&state.db, params.user_id).await?))
}

/// POST /api/v1/candidates
pub async fn handle_create_candidate(
    State(state): State<AppState>,
    Json(input): Json<CandidateInput>,
) -> Result<(StatusCode, Json<CandidateRow>), AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    let row = candidates::create(&state.db, &input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<CandidateRow>, AppError> {
    Ok(Json(candidates::get(&state.db, params.user_id, id).await?))
}

/// PUT /api/v1/candidates/:id
pub async fn handle_update_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CandidateInput>,
) -> Result<Json<CandidateRow>, AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    Ok(Json(candidates::update(&state.db, id, &input).await?))
}

/// DELETE /api/v1/candidates/:id
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    candidates::delete(&state.db, params.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Resume versions ───────────────────────────────────────────────────────

/// GET /api/v1/resume-versions
pub async fn handle_list_resume_versions(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ResumeVersionRow>>, AppError> {
    Ok(Json(resume_versions::list(&state.db, params.user_id).await?))
}

/// POST /api/v1/resume-versions
pub async fn handle_create_resume_version(
    State(state): State<AppState>,
    Json(input): Json<ResumeVersionInput>,
) -> Result<(StatusCode, Json<ResumeVersionRow>), AppError> {
    let row = resume_versions::create(&state.db, &input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/resume-versions/:id
pub async fn handle_get_resume_version(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ResumeVersionRow>, AppError> {
    Ok(Json(
        resume_versions::get(&state.db, params.user_id, id).await?,
    ))
}

/// PUT /api/v1/resume-versions/:id
pub async fn handle_update_resume_version(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ResumeVersionInput>,
) -> Result<Json<ResumeVersionRow>, AppError> {
    Ok(Json(resume_versions::update(&state.db, id, &input).await?))
}

/// DELETE /api/v1/resume-versions/:id
pub async fn handle_delete_resume_version(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    resume_versions::delete(&state.db, params.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Job applications ──────────────────────────────────────────────────────

/// GET /api/v1/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<JobApplicationRow>>, AppError> {
    Ok(Json(applications::list(&state.db, params.user_id).await?))
}

/// POST /api/v1/applications
pub async fn handle_create_application(
    State(state): State<AppState>,
    Json(input): Json<ApplicationInput>,
) -> Result<(StatusCode, Json<JobApplicationRow>), AppError> {
    let row = applications::create(&state.db, &input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<JobApplicationRow>, AppError> {
    Ok(Json(applications::get(&state.db, params.user_id, id).await?))
}

/// PUT /api/v1/applications/:id
pub async fn handle_update_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ApplicationInput>,
) -> Result<Json<JobApplicationRow>, AppError> {
    Ok(Json(applications::update(&state.db, id, &input).await?))
}

/// PATCH /api/v1/applications/:id/status
///
/// Validates the status before touching the database.
pub async fn handle_update_application_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdate>,
) -> Result<Json<JobApplicationRow>, AppError> {
    let status = parse_status(&req.status)?;
    Ok(Json(
        applications::update_status(&state.db, req.user_id, id, status).await?,
    ))
}

/// DELETE /api/v1/applications/:id
pub async fn handle_delete_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    applications::delete(&state.db, params.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── JD templates ──────────────────────────────────────────────────────────

/// GET /api/v1/jd-templates
pub async fn handle_list_jd_templates(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<JdTemplateRow>>, AppError> {
    Ok(Json(jd_templates::list(&state.db, params.user_id).await?))
}

/// POST /api/v1/jd-templates
pub async fn handle_create_jd_template(
    State(state): State<AppState>,
    Json(input): Json<JdTemplateInput>,
) -> Result<(StatusCode, Json<JdTemplateRow>), AppError> {
    let row = jd_templates::create(&state.db, &input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/jd-templates/:id
pub async fn handle_get_jd_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<JdTemplateRow>, AppError> {
    Ok(Json(jd_templates::get(&state.db, params.user_id, id).await?))
}

/// PUT /api/v1/jd-templates/:id
pub async fn handle_update_jd_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<JdTemplateInput>,
) -> Result<Json<JdTemplateRow>, AppError> {
    Ok(Json(jd_templates::update(&state.db, id, &input).await?))
}

/// DELETE /api/v1/jd-templates/:id
pub async fn handle_delete_jd_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    jd_templates::delete(&state.db, params.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
