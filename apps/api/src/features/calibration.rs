//! Interviewer calibration: AI grading of an interview transcript and a
//! deterministic comparison of human and AI grades.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::features::battle_plan::CoreQuestion;
use crate::features::prompts::{GRADING_PROMPT_TEMPLATE, GRADING_SYSTEM};
use crate::llm_client::{CompletionOptions, LlmClient, LlmError, Validate, ValidationError};

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;
/// Deltas at or above this are flagged for discussion.
pub const DISAGREEMENT_THRESHOLD: u8 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub question_index: usize,
    pub score: u8,
    #[serde(default)]
    pub rationale: String,
}

#[derive(Debug, Deserialize)]
struct RawGrade {
    question_index: i64,
    score: f64,
    #[serde(default)]
    rationale: String,
}

#[derive(Debug, Deserialize)]
struct RawGrades {
    #[serde(default)]
    grades: Vec<RawGrade>,
}

impl Validate for RawGrades {
    fn validate(self) -> Result<Self, ValidationError> {
        if self.grades.is_empty() {
            return Err(ValidationError::new("grades", "no grades returned"));
        }
        Ok(self)
    }
}

/// Clamps scores into range, drops unknown or repeated indices, sorts by index.
fn normalize_grades(raw: Vec<RawGrade>, question_count: usize) -> Vec<Grade> {
    let mut by_index: BTreeMap<usize, Grade> = BTreeMap::new();
    for grade in raw {
        let Ok(index) = usize::try_from(grade.question_index) else {
            continue;
        };
        if index >= question_count || by_index.contains_key(&index) || !grade.score.is_finite() {
            debug!("Dropping grade for question_index={}", grade.question_index);
            continue;
        }
        let score = grade
            .score
            .round()
            .clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE)) as u8;
        by_index.insert(
            index,
            Grade {
                question_index: index,
                score,
                rationale: grade.rationale.trim().to_string(),
            },
        );
    }
    by_index.into_values().collect()
}

pub async fn grade_answers(
    questions: &[CoreQuestion],
    transcript: &str,
    llm: &LlmClient,
) -> Result<Vec<Grade>, AppError> {
    if questions.is_empty() {
        return Err(AppError::Validation("questions cannot be empty".to_string()));
    }
    if transcript.trim().is_empty() {
        return Err(AppError::Validation("transcript cannot be empty".to_string()));
    }

    let questions_json = serde_json::to_string_pretty(questions)
        .map_err(|e| AppError::Internal(e.into()))?;
    let prompt = GRADING_PROMPT_TEMPLATE
        .replace("{questions_json}", &questions_json)
        .replace("{transcript}", transcript.trim());

    let opts = CompletionOptions::default().with_temperature(0.2);
    let raw: RawGrades = llm.validated_json(GRADING_SYSTEM, &prompt, opts).await?;
    let grades = normalize_grades(raw.grades, questions.len());
    if grades.is_empty() {
        return Err(LlmError::from(ValidationError::new(
            "grades",
            "no grade refers to a known question",
        ))
        .into());
    }

    info!("Graded {}/{} questions", grades.len(), questions.len());
    Ok(grades)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeComparison {
    pub question_index: usize,
    pub human_score: u8,
    pub ai_score: u8,
    /// `ai_score - human_score`.
    pub delta: i16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    pub comparisons: Vec<GradeComparison>,
    pub mean_absolute_deviation: Option<f64>,
    pub flagged_questions: Vec<usize>,
}

/// Compares grades for questions both sides graded. Pure, no LLM call.
pub fn calibration_report(human: &[Grade], ai: &[Grade]) -> CalibrationReport {
    let ai_by_index: BTreeMap<usize, u8> = ai
        .iter()
        .map(|g| (g.question_index, g.score))
        .collect();

    let mut seen = BTreeMap::new();
    for grade in human {
        seen.entry(grade.question_index).or_insert(grade.score);
    }

    let comparisons: Vec<GradeComparison> = seen
        .into_iter()
        .filter_map(|(index, human_score)| {
            ai_by_index.get(&index).map(|&ai_score| GradeComparison {
                question_index: index,
                human_score,
                ai_score,
                delta: i16::from(ai_score) - i16::from(human_score),
            })
        })
        .collect();

    let mean_absolute_deviation = (!comparisons.is_empty()).then(|| {
        let total: f64 = comparisons.iter().map(|c| f64::from(c.delta.abs())).sum();
        total / comparisons.len() as f64
    });

    let flagged_questions = comparisons
        .iter()
        .filter(|c| c.delta.unsigned_abs() >= u16::from(DISAGREEMENT_THRESHOLD))
        .map(|c| c.question_index)
        .collect();

    CalibrationReport {
        comparisons,
        mean_absolute_deviation,
        flagged_questions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{client, ScriptedBackend};

    fn grade(index: usize, score: u8) -> Grade {
        Grade {
            question_index: index,
            score,
            rationale: String::new(),
        }
    }

    fn questions(n: usize) -> Vec<CoreQuestion> {
        (0..n)
            .map(|i| CoreQuestion {
                question: format!("Question {i}"),
                purpose: String::new(),
                expected_answer: format!("Answer {i}"),
            })
            .collect()
    }

    #[test]
    fn test_report_deltas_and_flags() {
        let human = [grade(0, 4), grade(1, 2), grade(2, 5)];
        let ai = [grade(0, 4), grade(1, 5), grade(2, 3), grade(7, 1)];

        let report = calibration_report(&human, &ai);

        assert_eq!(report.comparisons.len(), 3);
        assert_eq!(report.comparisons[1].delta, 3);
        assert_eq!(report.comparisons[2].delta, -2);
        assert_eq!(report.flagged_questions, vec![1, 2]);
        let mad = report.mean_absolute_deviation.unwrap();
        assert!((mad - 5.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_report_without_overlap() {
        let report = calibration_report(&[grade(0, 3)], &[grade(1, 3)]);
        assert!(report.comparisons.is_empty());
        assert_eq!(report.mean_absolute_deviation, None);
        assert!(report.flagged_questions.is_empty());
    }

    #[test]
    fn test_report_uses_first_human_grade_per_question() {
        let report = calibration_report(&[grade(0, 1), grade(0, 5)], &[grade(0, 2)]);
        assert_eq!(report.comparisons[0].human_score, 1);
    }

    #[tokio::test]
    async fn test_grades_are_clamped_and_filtered() {
        let backend = ScriptedBackend::replying([r#"{"grades": [
            {"question_index": 1, "score": 9, "rationale": " Strong "},
            {"question_index": 0, "score": 0, "rationale": "Missed it"},
            {"question_index": 0, "score": 4, "rationale": "duplicate"},
            {"question_index": 5, "score": 3, "rationale": "unknown"},
            {"question_index": -1, "score": 3, "rationale": "negative"},
            {"question_index": 2, "score": 3.6, "rationale": "fractional"}
        ]}"#]);

        let grades = grade_answers(&questions(3), "Q: ... A: ...", &client(&backend))
            .await
            .unwrap();

        assert_eq!(
            grades,
            vec![
                Grade {
                    question_index: 0,
                    score: 1,
                    rationale: "Missed it".to_string()
                },
                Grade {
                    question_index: 1,
                    score: 5,
                    rationale: "Strong".to_string()
                },
                Grade {
                    question_index: 2,
                    score: 4,
                    rationale: "fractional".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_only_unknown_indices_is_an_error() {
        let backend = ScriptedBackend::replying([
            r#"{"grades": [{"question_index": 9, "score": 3, "rationale": "x"}]}"#,
        ]);
        let err = grade_answers(&questions(2), "transcript", &client(&backend))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(LlmError::Schema(_))));
    }

    #[tokio::test]
    async fn test_empty_inputs_rejected_without_calls() {
        let backend = ScriptedBackend::replying([r#"{"grades": []}"#]);
        let llm = client(&backend);
        assert!(grade_answers(&[], "t", &llm).await.is_err());
        assert!(grade_answers(&questions(1), " ", &llm).await.is_err());
        assert_eq!(backend.calls(), 0);
    }
}
