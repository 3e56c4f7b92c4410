pub mod application;
pub mod candidate;
pub mod jd_template;
pub mod resume;
