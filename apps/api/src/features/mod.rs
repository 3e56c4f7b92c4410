//! Prompt-backed product features plus the offline bias scanner.
//!
//! Every builder is a plain async function of its inputs and `&LlmClient`.

pub mod battle_plan;
pub mod bias;
pub mod calibration;
pub mod copilot;
pub mod handlers;
pub mod jd_generator;
pub mod morph;
pub mod prompts;
pub mod shadow_interview;
pub mod skill_insights;
