//! Persisted records: candidates, resume versions, job applications, JD templates.
//!
//! Every statement filters on `user_id`. A missing (or foreign) row is `NotFound`.

pub mod applications;
pub mod candidates;
pub mod handlers;
pub mod jd_templates;
pub mod resume_versions;
