use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Contact header and summary at the top of a resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub summary: String,
}

/// A titled block of bullet items (one job, one degree).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeSection {
    pub title: String,
    pub items: Vec<String>,
}

/// The candidate-side resume document. Persisted as an opaque JSON blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resume {
    pub personal: PersonalInfo,
    pub experience: Vec<ResumeSection>,
    pub education: Vec<ResumeSection>,
    pub skills: Vec<String>,
}

impl Resume {
    /// Flattens the resume into prompt-friendly plain text.
    pub fn to_prompt_text(&self) -> String {
        let mut out = String::new();
        let p = &self.personal;
        out.push_str(&format!("{} — {}\n", p.name, p.title));
        if !p.summary.is_empty() {
            out.push_str(&format!("Summary: {}\n", p.summary));
        }

        out.push_str("\nEXPERIENCE:\n");
        for (i, section) in self.experience.iter().enumerate() {
            out.push_str(&format!("[{i}] {}\n", section.title));
            for item in &section.items {
                out.push_str(&format!("  - {item}\n"));
            }
        }

        out.push_str("\nEDUCATION:\n");
        for section in &self.education {
            out.push_str(&format!("{}\n", section.title));
            for item in &section.items {
                out.push_str(&format!("  - {item}\n"));
            }
        }

        out.push_str(&format!("\nSKILLS: {}\n", self.skills.join(", ")));
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeVersionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// Serialized `Resume`, stored as-is.
    pub content: Value,
    pub target_company: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_deserializes_with_missing_fields() {
        let resume: Resume = serde_json::from_str(r#"{"skills": ["Rust"]}"#).unwrap();
        assert_eq!(resume.skills, vec!["Rust"]);
        assert!(resume.experience.is_empty());
        assert_eq!(resume.personal, PersonalInfo::default());
    }

    #[test]
    fn test_prompt_text_indexes_experience() {
        let resume = Resume {
            personal: PersonalInfo {
                name: "Ada".to_string(),
                title: "Engineer".to_string(),
                ..Default::default()
            },
            experience: vec![
                ResumeSection {
                    title: "Acme".to_string(),
                    items: vec!["Built X".to_string()],
                },
                ResumeSection {
                    title: "Globex".to_string(),
                    items: vec![],
                },
            ],
            education: vec![],
            skills: vec!["Rust".to_string(), "SQL".to_string()],
        };
        let text = resume.to_prompt_text();
        assert!(text.contains("[0] Acme"));
        assert!(text.contains("[1] Globex"));
        assert!(text.contains("  - Built X"));
        assert!(text.contains("SKILLS: Rust, SQL"));
    }
}
