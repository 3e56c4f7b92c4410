//! Resume morph — re-presents an existing resume for a specific job description.
//!
//! The model only ranks: a match score, skills to highlight, section order and a
//! permutation of experience entries. Resume content is never rewritten.
//!
//! Failure policy: any client or validation error returns the ORIGINAL resume with
//! `match_score = None` ("analysis unavailable") and the default section order.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::features::prompts::{MORPH_PROMPT_TEMPLATE, MORPH_SYSTEM};
use crate::llm_client::prompts::GROUNDING_INSTRUCTION;
use crate::llm_client::schema::require_range;
use crate::llm_client::{CompletionOptions, LlmClient, Validate, ValidationError};
use crate::models::resume::{Resume, ResumeSection};

pub const DEFAULT_SECTION_ORDER: [&str; 4] = ["summary", "experience", "skills", "education"];

/// Raw analysis as returned by the model.
#[derive(Debug, Clone, Deserialize)]
struct MorphAnalysis {
    match_score: i64,
    #[serde(default)]
    highlighted_skills: Vec<String>,
    #[serde(default)]
    prioritized_sections: Vec<String>,
    #[serde(default)]
    experience_order: Vec<i64>,
    #[serde(default)]
    talent_density_score: Option<i64>,
}

impl Validate for MorphAnalysis {
    fn validate(mut self) -> Result<Self, ValidationError> {
        require_range("match_score", self.match_score, 0, 100)?;

        if let Some(score) = self.talent_density_score {
            if !(0..=100).contains(&score) {
                warn!("Dropping out-of-range talent_density_score={score}");
                self.talent_density_score = None;
            }
        }

        self.highlighted_skills = dedup_nonempty(self.highlighted_skills);
        self.prioritized_sections = normalize_sections(&self.prioritized_sections);
        Ok(self)
    }
}

/// Outcome of a morph. `match_score` is `None` whenever analysis was unavailable.
#[derive(Debug, Clone, Serialize)]
pub struct MorphResult {
    pub resume: Resume,
    pub match_score: Option<u8>,
    pub highlighted_skills: Vec<String>,
    pub prioritized_sections: Vec<String>,
    pub talent_density_score: Option<u8>,
    pub fallback_reason: Option<String>,
}

impl MorphResult {
    fn fallback(resume: Resume, reason: impl Into<String>) -> Self {
        Self {
            resume,
            match_score: None,
            highlighted_skills: vec![],
            prioritized_sections: default_sections(),
            talent_density_score: None,
            fallback_reason: Some(reason.into()),
        }
    }
}

/// Ranks `resume` against `jd_text`. Never fails; see module docs for the fallback.
pub async fn morph_resume(resume: Resume, jd_text: &str, llm: &LlmClient) -> MorphResult {
    if jd_text.trim().is_empty() {
        return MorphResult::fallback(resume, "Job description is empty");
    }

    let prompt = build_morph_prompt(&resume, jd_text);
    let opts = CompletionOptions::default().with_temperature(0.3);

    let analysis = match llm
        .validated_json::<MorphAnalysis>(MORPH_SYSTEM, &prompt, opts)
        .await
    {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!("Resume morph unavailable, returning original resume: {e}");
            return MorphResult::fallback(resume, e.to_string());
        }
    };

    info!(
        "Resume morphed: match_score={}, highlighted={}",
        analysis.match_score,
        analysis.highlighted_skills.len()
    );

    let Resume {
        personal,
        experience,
        education,
        skills,
    } = resume;

    MorphResult {
        resume: Resume {
            personal,
            experience: reorder_experience(experience, &analysis.experience_order),
            education,
            skills,
        },
        match_score: Some(analysis.match_score as u8),
        highlighted_skills: analysis.highlighted_skills,
        prioritized_sections: analysis.prioritized_sections,
        talent_density_score: analysis.talent_density_score.map(|s| s as u8),
        fallback_reason: None,
    }
}

fn build_morph_prompt(resume: &Resume, jd_text: &str) -> String {
    MORPH_PROMPT_TEMPLATE
        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
        .replace("{experience_count}", &resume.experience.len().to_string())
        .replace("{resume_text}", &resume.to_prompt_text())
        .replace("{jd_text}", jd_text.trim())
}

/// Applies a model-supplied permutation. Out-of-range and repeated indices are
/// ignored; entries the permutation omits keep their relative order at the end.
pub fn reorder_experience(experience: Vec<ResumeSection>, order: &[i64]) -> Vec<ResumeSection> {
    let mut slots: Vec<Option<ResumeSection>> = experience.into_iter().map(Some).collect();
    let mut reordered = Vec::with_capacity(slots.len());

    for &index in order {
        let Ok(index) = usize::try_from(index) else {
            continue;
        };
        if let Some(section) = slots.get_mut(index).and_then(Option::take) {
            reordered.push(section);
        }
    }

    reordered.extend(slots.into_iter().flatten());
    reordered
}

fn default_sections() -> Vec<String> {
    DEFAULT_SECTION_ORDER.iter().map(|s| s.to_string()).collect()
}

/// Keeps known section names once each, then appends any the model left out.
fn normalize_sections(sections: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(DEFAULT_SECTION_ORDER.len());
    for section in sections {
        let name = section.trim().to_lowercase();
        if DEFAULT_SECTION_ORDER.contains(&name.as_str()) && !out.contains(&name) {
            out.push(name);
        }
    }
    for name in DEFAULT_SECTION_ORDER {
        if !out.iter().any(|s| s == name) {
            out.push(name.to_string());
        }
    }
    out
}

fn dedup_nonempty(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim().to_string();
        if !item.is_empty() && !out.iter().any(|o| o.eq_ignore_ascii_case(&item)) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{client, ScriptedBackend};
    use crate::llm_client::LlmError;
    use crate::models::resume::PersonalInfo;

    fn section(title: &str) -> ResumeSection {
        ResumeSection {
            title: title.to_string(),
            items: vec![format!("Did things at {title}")],
        }
    }

    fn sample_resume() -> Resume {
        Resume {
            personal: PersonalInfo {
                name: "Ada Lovelace".to_string(),
                title: "Backend Engineer".to_string(),
                ..Default::default()
            },
            experience: vec![section("Acme"), section("Globex"), section("Initech")],
            education: vec![section("University")],
            skills: vec!["Rust".to_string(), "PostgreSQL".to_string()],
        }
    }

    #[tokio::test]
    async fn test_fallback_keeps_original_experience_when_client_fails() {
        let backend = ScriptedBackend::failing(|| LlmError::Api {
            status: 500,
            message: "upstream down".to_string(),
        });
        let resume = sample_resume();

        let result = morph_resume(resume.clone(), "Rust backend role", &client(&backend)).await;

        assert_eq!(result.match_score, None);
        assert_eq!(result.resume.experience, resume.experience);
        assert!(result.highlighted_skills.is_empty());
        assert_eq!(result.prioritized_sections, default_sections());
        assert!(result.fallback_reason.is_some());
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_fallback_on_invalid_json() {
        let backend = ScriptedBackend::replying(["{\"match_score\": "]);
        let resume = sample_resume();
        let result = morph_resume(resume.clone(), "Rust role", &client(&backend)).await;
        assert_eq!(result.match_score, None);
        assert_eq!(result.resume, resume);
    }

    #[tokio::test]
    async fn test_fallback_on_out_of_range_score() {
        let backend = ScriptedBackend::replying([r#"{"match_score": 140}"#]);
        let result = morph_resume(sample_resume(), "Rust role", &client(&backend)).await;
        assert_eq!(result.match_score, None);
        assert!(result
            .fallback_reason
            .unwrap()
            .contains("match_score: 140 is outside 0..=100"));
    }

    #[tokio::test]
    async fn test_empty_jd_short_circuits() {
        let backend = ScriptedBackend::replying([r#"{"match_score": 50}"#]);
        let result = morph_resume(sample_resume(), "   ", &client(&backend)).await;
        assert_eq!(result.match_score, None);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_morph_applies_permutation() {
        let backend = ScriptedBackend::replying([r#"{
            "match_score": 81,
            "highlighted_skills": ["Rust", "rust", " PostgreSQL "],
            "prioritized_sections": ["Skills", "experience", "bogus"],
            "experience_order": [2, 0, 1],
            "talent_density_score": 66
        }"#]);

        let result = morph_resume(sample_resume(), "Rust role", &client(&backend)).await;

        assert_eq!(result.match_score, Some(81));
        assert_eq!(result.talent_density_score, Some(66));
        assert_eq!(result.highlighted_skills, vec!["Rust", "PostgreSQL"]);
        assert_eq!(
            result.prioritized_sections,
            vec!["skills", "experience", "summary", "education"]
        );
        let titles: Vec<_> = result
            .resume
            .experience
            .iter()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Initech", "Acme", "Globex"]);
        assert!(result.fallback_reason.is_none());
    }

    #[tokio::test]
    async fn test_prompt_contains_indexed_resume_and_jd() {
        let backend = ScriptedBackend::replying([r#"{"match_score": 10}"#]);
        morph_resume(sample_resume(), "Needs Kafka", &client(&backend)).await;
        let request = backend.last_request().unwrap();
        let user = &request.messages[1].content;
        assert!(user.contains("[2] Initech"));
        assert!(user.contains("Needs Kafka"));
        assert!(user.contains("3 experience entries"));
    }

    #[test]
    fn test_reorder_ignores_bad_indices_and_keeps_omitted() {
        let experience = vec![section("A"), section("B"), section("C"), section("D")];
        let reordered = reorder_experience(experience, &[3, 3, -1, 9, 1]);
        let titles: Vec<_> = reordered.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["D", "B", "A", "C"]);
    }

    #[test]
    fn test_reorder_empty_permutation_is_identity() {
        let experience = vec![section("A"), section("B")];
        assert_eq!(reorder_experience(experience.clone(), &[]), experience);
    }
}
