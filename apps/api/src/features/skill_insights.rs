//! Skill insights: groups a resume's skills into categories.
//!
//! Uses a plain text completion and recovers the JSON with `extract_json`.
//! Never fails: on any error every skill lands in a single "Uncategorized" bucket.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::features::prompts::{SKILL_INSIGHTS_PROMPT_TEMPLATE, SKILL_INSIGHTS_SYSTEM};
use crate::llm_client::extract::extract_json;
use crate::llm_client::{CompletionOptions, LlmClient, LlmError};

pub const OTHER_CATEGORY: &str = "Other";
pub const UNCATEGORIZED: &str = "Uncategorized";
const MAX_FOCUS_ITEMS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCategory {
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillInsights {
    pub categories: Vec<SkillCategory>,
    pub recommended_focus: Vec<String>,
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawInsights {
    #[serde(default)]
    categories: Vec<SkillCategory>,
    #[serde(default)]
    recommended_focus: Vec<String>,
}

impl SkillInsights {
    fn fallback(skills: Vec<String>, reason: impl Into<String>) -> Self {
        Self {
            categories: vec![SkillCategory {
                name: UNCATEGORIZED.to_string(),
                skills,
            }],
            recommended_focus: vec![],
            fallback_reason: Some(reason.into()),
        }
    }
}

pub async fn categorize_skills(
    skills: Vec<String>,
    target_role: Option<&str>,
    llm: &LlmClient,
) -> SkillInsights {
    let skills = unique_skills(skills);
    if skills.is_empty() {
        return SkillInsights {
            categories: vec![],
            recommended_focus: vec![],
            fallback_reason: None,
        };
    }

    match request_categories(&skills, target_role, llm).await {
        Ok(raw) => {
            let categories = reconcile(&skills, raw.categories);
            info!(
                "Categorized {} skills into {} categories",
                skills.len(),
                categories.len()
            );
            SkillInsights {
                categories,
                recommended_focus: raw
                    .recommended_focus
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .take(MAX_FOCUS_ITEMS)
                    .collect(),
                fallback_reason: None,
            }
        }
        Err(e) => {
            warn!("Skill categorization unavailable: {e}");
            SkillInsights::fallback(skills, e.to_string())
        }
    }
}

async fn request_categories(
    skills: &[String],
    target_role: Option<&str>,
    llm: &LlmClient,
) -> Result<RawInsights, LlmError> {
    let skills_json = serde_json::to_string(skills).map_err(LlmError::InvalidJson)?;
    let target_role = target_role
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("Not specified");

    let prompt = SKILL_INSIGHTS_PROMPT_TEMPLATE
        .replace("{skills_json}", &skills_json)
        .replace("{target_role}", target_role);

    let opts = CompletionOptions::default().with_temperature(0.3);
    let text = llm
        .text_completion(SKILL_INSIGHTS_SYSTEM, &prompt, opts)
        .await?;
    let value = extract_json(&text)?;
    serde_json::from_value(value).map_err(LlmError::InvalidJson)
}

/// Keeps only skills from the input (matched case-insensitively, input spelling
/// wins), each at most once. Skills the model left out go to "Other".
fn reconcile(skills: &[String], categories: Vec<SkillCategory>) -> Vec<SkillCategory> {
    let mut placed = vec![false; skills.len()];
    let mut out: Vec<SkillCategory> = Vec::with_capacity(categories.len() + 1);

    for category in categories {
        let name = category.name.trim();
        if name.is_empty() {
            continue;
        }
        let mut kept = Vec::new();
        for skill in &category.skills {
            let Some(i) = skills
                .iter()
                .position(|s| s.eq_ignore_ascii_case(skill.trim()))
            else {
                continue;
            };
            if !placed[i] {
                placed[i] = true;
                kept.push(skills[i].clone());
            }
        }
        if kept.is_empty() {
            continue;
        }
        match out.iter_mut().find(|c| c.name.eq_ignore_ascii_case(name)) {
            Some(existing) => existing.skills.extend(kept),
            None => out.push(SkillCategory {
                name: name.to_string(),
                skills: kept,
            }),
        }
    }

    let leftover: Vec<String> = skills
        .iter()
        .zip(&placed)
        .filter(|&(_, &p)| !p)
        .map(|(s, _)| s.clone())
        .collect();
    if !leftover.is_empty() {
        match out
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(OTHER_CATEGORY))
        {
            Some(other) => other.skills.extend(leftover),
            None => out.push(SkillCategory {
                name: OTHER_CATEGORY.to_string(),
                skills: leftover,
            }),
        }
    }
    out
}

fn unique_skills(skills: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills {
        let skill = skill.trim();
        if !skill.is_empty() && !out.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
            out.push(skill.to_string());
        }
    }
    out
}
