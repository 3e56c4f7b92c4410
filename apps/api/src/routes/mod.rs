pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::handlers as features;
use crate::records::handlers as records;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resume tooling
        .route("/api/v1/resumes/morph", post(features::handle_morph))
        .route(
            "/api/v1/resumes/skill-insights",
            post(features::handle_skill_insights),
        )
        .route(
            "/api/v1/documents/extract-text",
            post(features::handle_extract_text),
        )
        // JD tooling
        .route("/api/v1/jd/generate", post(features::handle_generate_jd))
        .route("/api/v1/jd/bias/scan", post(features::handle_bias_scan))
        .route("/api/v1/jd/bias/fix", post(features::handle_bias_fix))
        // Interview tooling
        .route(
            "/api/v1/interview/battle-plan",
            post(features::handle_battle_plan),
        )
        .route(
            "/api/v1/interview/shadow/turn",
            post(features::handle_shadow_turn),
        )
        .route(
            "/api/v1/interview/copilot/stream",
            post(features::handle_copilot_stream),
        )
        .route(
            "/api/v1/interview/calibration/grade",
            post(features::handle_calibration_grade),
        )
        .route(
            "/api/v1/interview/calibration/report",
            post(features::handle_calibration_report),
        )
        // Records
        .route(
            "/api/v1/candidates",
            get(records::handle_list_candidates).post(records::handle_create_candidate),
        )
        .route(
            "/api/v1/candidates/:id",
            get(records::handle_get_candidate)
                .put(records::handle_update_candidate)
                .delete(records::handle_delete_candidate),
        )
        .route(
            "/api/v1/resume-versions",
            get(records::handle_list_resume_versions).post(records::handle_create_resume_version),
        )
        .route(
            "/api/v1/resume-versions/:id",
            get(records::handle_get_resume_version)
                .put(records::handle_update_resume_version)
                .delete(records::handle_delete_resume_version),
        )
        .route(
            "/api/v1/applications",
            get(records::handle_list_applications).post(records::handle_create_application),
        )
        .route(
            "/api/v1/applications/:id",
            get(records::handle_get_application)
                .put(records::handle_update_application)
                .delete(records::handle_delete_application),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(records::handle_update_application_status),
        )
        .route(
            "/api/v1/jd-templates",
            get(records::handle_list_jd_templates).post(records::handle_create_jd_template),
        )
        .route(
            "/api/v1/jd-templates/:id",
            get(records::handle_get_jd_template)
                .put(records::handle_update_jd_template)
                .delete(records::handle_delete_jd_template),
        )
        .with_state(state)
}
