//! Axum route handlers for the prompt-backed features.

use std::convert::Infallible;

use axum::{
    extract::{Multipart, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::features::battle_plan::{generate_battle_plan, BattlePlan, CoreQuestion};
use crate::features::bias::{detect_bias, fix_all, fix_term, BiasFlag};
use crate::features::calibration::{calibration_report, grade_answers, CalibrationReport, Grade};
use crate::features::copilot::{stream_follow_ups, CopilotRequest};
use crate::features::jd_generator::{generate_jd, GeneratedJd, JdRequest};
use crate::features::morph::{morph_resume, MorphResult};
use crate::features::shadow_interview::{shadow_turn, ShadowRequest, ShadowTurn};
use crate::features::skill_insights::{categorize_skills, SkillInsights};
use crate::models::application::JobApplicationRow;
use crate::models::resume::Resume;
use crate::records::applications::{self, ApplicationInput};
use crate::records::candidates;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MorphRequest {
    pub resume: Resume,
    pub jd_text: String,
    /// With `company_name`, the morph is tracked as a `not_applied` application.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub resume_version_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct MorphResponse {
    #[serde(flatten)]
    pub result: MorphResult,
    pub application: Option<JobApplicationRow>,
}

#[derive(Debug, Deserialize)]
pub struct SkillInsightsRequest {
    pub skills: Vec<String>,
    #[serde(default)]
    pub target_role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractTextResponse {
    pub file_name: Option<String>,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct BiasScanRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct BiasScanResponse {
    pub flags: Vec<BiasFlag>,
}

/// Without `term`, every table row is applied.
#[derive(Debug, Deserialize)]
pub struct BiasFixRequest {
    pub text: String,
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub replacement: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BiasFixResponse {
    pub text: String,
    pub remaining_flags: Vec<BiasFlag>,
}

#[derive(Debug, Deserialize)]
pub struct BattlePlanRequest {
    pub cv_text: String,
    pub jd_text: String,
    #[serde(default)]
    pub candidate_name: String,
    /// With `user_id`, the plan is written onto this candidate.
    #[serde(default)]
    pub candidate_id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    pub questions: Vec<CoreQuestion>,
    pub transcript: String,
    #[serde(default)]
    pub candidate_id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct GradeResponse {
    pub grades: Vec<Grade>,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub human_grades: Vec<Grade>,
    pub ai_grades: Vec<Grade>,
}

// ────────────────────────────────────────────────────────────────────────────
// Resume features
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/morph
///
/// Never fails on LLM errors: the original resume comes back with no score.
pub async fn handle_morph(
    State(state): State<AppState>,
    Json(req): Json<MorphRequest>,
) -> Result<Json<MorphResponse>, AppError> {
    let result = morph_resume(req.resume, &req.jd_text, &state.llm).await;

    let company = req
        .company_name
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let application = match (req.user_id, company) {
        (Some(user_id), Some(company_name)) => {
            let input = ApplicationInput {
                user_id,
                company_name: company_name.to_string(),
                job_title: req.job_title.unwrap_or_default(),
                status: None,
                talent_density_score: result.talent_density_score.map(i32::from),
                notes: None,
                resume_version_id: req.resume_version_id,
            };
            Some(applications::create(&state.db, &input).await?)
        }
        _ => None,
    };

    Ok(Json(MorphResponse {
        result,
        application,
    }))
}

/// POST /api/v1/resumes/skill-insights
pub async fn handle_skill_insights(
    State(state): State<AppState>,
    Json(req): Json<SkillInsightsRequest>,
) -> Json<SkillInsights> {
    Json(categorize_skills(req.skills, req.target_role.as_deref(), &state.llm).await)
}

/// POST /api/v1/documents/extract-text
///
/// Multipart upload with a `file` field holding a PDF.
pub async fn handle_extract_text(
    mut multipart: Multipart,
) -> Result<Json<ExtractTextResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        let size = bytes.len();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .map_err(|e| {
                warn!("PDF extraction failed: {e:?}");
                AppError::UnprocessableEntity("Could not read text from this PDF".to_string())
            })?;

        info!("Extracted {} chars from {} byte upload", text.len(), size);
        return Ok(Json(ExtractTextResponse {
            file_name,
            text: text.trim().to_string(),
        }));
    }

    Err(AppError::Validation("Missing 'file' field".to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// JD features
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jd/generate
pub async fn handle_generate_jd(
    State(state): State<AppState>,
    Json(req): Json<JdRequest>,
) -> Result<Json<GeneratedJd>, AppError> {
    Ok(Json(generate_jd(&req, &state.llm).await?))
}

/// POST /api/v1/jd/bias/scan
pub async fn handle_bias_scan(Json(req): Json<BiasScanRequest>) -> Json<BiasScanResponse> {
    Json(BiasScanResponse {
        flags: detect_bias(&req.text),
    })
}

/// POST /api/v1/jd/bias/fix
pub async fn handle_bias_fix(
    Json(req): Json<BiasFixRequest>,
) -> Result<Json<BiasFixResponse>, AppError> {
    let text = match (req.term.as_deref(), req.replacement.as_deref()) {
        (Some(term), Some(replacement)) => fix_term(&req.text, term, replacement),
        (Some(_), None) => {
            return Err(AppError::Validation(
                "replacement is required with term".to_string(),
            ))
        }
        (None, _) => fix_all(&req.text),
    };
    let remaining_flags = detect_bias(&text);
    Ok(Json(BiasFixResponse {
        text,
        remaining_flags,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Interview features
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interview/battle-plan
pub async fn handle_battle_plan(
    State(state): State<AppState>,
    Json(req): Json<BattlePlanRequest>,
) -> Result<Json<BattlePlan>, AppError> {
    let plan =
        generate_battle_plan(&req.cv_text, &req.jd_text, &req.candidate_name, &state.llm).await?;

    if let (Some(user_id), Some(candidate_id)) = (req.user_id, req.candidate_id) {
        candidates::store_battle_plan(&state.db, user_id, candidate_id, &plan).await?;
    }

    Ok(Json(plan))
}

/// POST /api/v1/interview/shadow/turn
pub async fn handle_shadow_turn(
    State(state): State<AppState>,
    Json(req): Json<ShadowRequest>,
) -> Result<Json<ShadowTurn>, AppError> {
    Ok(Json(shadow_turn(&req, &state.llm).await?))
}

/// POST /api/v1/interview/copilot/stream
///
/// Server-sent events: one `data:` event per text delta, then `event: done`.
/// A mid-stream provider error becomes a single `event: error`.
/// Closing the connection drops the provider stream.
pub async fn handle_copilot_stream(
    State(state): State<AppState>,
    Json(req): Json<CopilotRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let deltas = stream_follow_ups(&req, &state.llm).await?;

    let events = deltas
        .map(|item| {
            Ok::<_, Infallible>(match item {
                Ok(delta) => Event::default().data(sse_text(&delta)),
                Err(e) => {
                    warn!("Co-pilot stream error: {e}");
                    Event::default()
                        .event("error")
                        .data(sse_text(&AppError::Llm(e).user_message()))
                }
            })
        })
        .chain(stream::once(async {
            Ok::<_, Infallible>(Event::default().event("done").data(""))
        }));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// `Event::data` splits on `\n` only and rejects a bare `\r`.
fn sse_text(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// POST /api/v1/interview/calibration/grade
pub async fn handle_calibration_grade(
    State(state): State<AppState>,
    Json(req): Json<GradeRequest>,
) -> Result<Json<GradeResponse>, AppError> {
    let grades = grade_answers(&req.questions, &req.transcript, &state.llm).await?;

    if let (Some(user_id), Some(candidate_id)) = (req.user_id, req.candidate_id) {
        candidates::store_ai_grades(&state.db, user_id, candidate_id, &grades).await?;
    }

    Ok(Json(GradeResponse { grades }))
}

/// POST /api/v1/interview/calibration/report
pub async fn handle_calibration_report(Json(req): Json<ReportRequest>) -> Json<CalibrationReport> {
    Json(calibration_report(&req.human_grades, &req.ai_grades))
}
