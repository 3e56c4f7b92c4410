//! Bias-pattern scanner — deterministic, offline, no LLM call.
//!
//! A fixed table of word-bounded, case-insensitive patterns. Each row maps a
//! problematic term to the issue it signals and a neutral replacement.
//! Rows do not overlap; `test_table_rows_do_not_overlap` guards that.

use std::sync::LazyLock;

use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

struct BiasRule {
    pattern: Regex,
    issue: &'static str,
    suggestion: &'static str,
}

const RULES: &[(&str, &str, &str)] = &[
    (r"ninjas?", "Exclusionary jargon", "expert"),
    (r"rock ?stars?", "Exclusionary jargon", "skilled professional"),
    (r"gurus?", "Exclusionary jargon", "specialist"),
    (r"wizards?", "Exclusionary jargon", "expert"),
    (r"superstars?", "Exclusionary jargon", "high performer"),
    (r"aggressive", "Masculine-coded language", "ambitious"),
    (r"dominant", "Masculine-coded language", "leading"),
    (r"fearless", "Masculine-coded language", "confident"),
    (r"young", "Age bias", "motivated"),
    (r"digital natives?", "Age bias", "proficient with digital tools"),
    (r"recent (?:college )?graduates?", "Age bias", "early-career professional"),
    (r"manpower", "Gendered language", "workforce"),
    (r"chairman", "Gendered language", "chairperson"),
    (r"salesm[ae]n", "Gendered language", "salesperson"),
];

static TABLE: LazyLock<Vec<BiasRule>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|&(pattern, issue, suggestion)| BiasRule {
            pattern: word_bounded(pattern).expect("bias patterns are valid"),
            issue,
            suggestion,
        })
        .collect()
});

fn word_bounded(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!(r"\b(?:{pattern})\b"))
        .case_insensitive(true)
        .build()
}

/// One flagged term. `text` keeps the original casing of the first match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiasFlag {
    pub text: String,
    pub issue: String,
    pub suggestion: String,
}

/// Returns one flag per table row that matches, in table order.
pub fn detect_bias(text: &str) -> Vec<BiasFlag> {
    TABLE
        .iter()
        .filter_map(|rule| {
            rule.pattern.find(text).map(|m| BiasFlag {
                text: m.as_str().to_string(),
                issue: rule.issue.to_string(),
                suggestion: rule.suggestion.to_string(),
            })
        })
        .collect()
}

/// Replaces every word-bounded, case-insensitive occurrence of `term`.
pub fn fix_term(text: &str, term: &str, replacement: &str) -> String {
    if term.trim().is_empty() {
        return text.to_string();
    }
    let term = term.trim();
    // `\b` only holds next to word characters, so terms like "C++" get it on one side only.
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let pattern = format!(
        "{}{}{}",
        if is_word(term.chars().next()) { r"\b" } else { "" },
        regex::escape(term),
        if is_word(term.chars().last()) { r"\b" } else { "" },
    );
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re.replace_all(text, NoExpand(replacement)).into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Applies every table row in table order.
pub fn fix_all(text: &str) -> String {
    TABLE.iter().fold(text.to_string(), |acc, rule| {
        rule.pattern
            .replace_all(&acc, NoExpand(rule.suggestion))
            .into_owned()
    })
}
