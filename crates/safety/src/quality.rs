//! Post-hoc quality report for a processed answer.

use crate::phrases::forbidden_phrases;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static WRONG_ESCALATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[Cc]onsumer\s+[Ff]orum.*(?:employ|tenant|rent|labour)")
        .expect("wrong escalation regex")
});

#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub word_count: usize,
    pub within_limit: bool,
    pub has_quick_answer: bool,
    pub has_context: bool,
    pub has_jurisdiction_note: bool,
    pub has_next_steps: bool,
    pub has_disclaimer: bool,
    pub forbidden_phrases_remaining: Vec<String>,
    pub has_wrong_escalation: bool,
    /// Share of the structural checks that passed, 0.0 to 1.0
    pub score: f32,
}

pub fn check_quality(answer: &str, max_words: usize) -> QualityReport {
    let word_count = answer.split_whitespace().count();
    let lower = answer.to_lowercase();

    let has_quick_answer = answer.contains("Quick Answer");
    let has_context = answer.contains("Context");
    let has_jurisdiction_note = answer.contains("Jurisdiction") || lower.contains("state");
    let has_next_steps = answer.contains("Next Steps");
    let has_disclaimer = answer.contains("Disclaimer") || lower.contains("not legal advice");
    let forbidden_phrases_remaining = forbidden_phrases(answer);
    let has_wrong_escalation = WRONG_ESCALATION.is_match(answer);

    let checks = [
        has_quick_answer,
        has_context,
        has_jurisdiction_note,
        has_next_steps,
        has_disclaimer,
        forbidden_phrases_remaining.is_empty(),
        !has_wrong_escalation,
    ];
    let passed = checks.iter().filter(|c| **c).count();

    QualityReport {
        word_count,
        within_limit: word_count <= max_words,
        has_quick_answer,
        has_context,
        has_jurisdiction_note,
        has_next_steps,
        has_disclaimer,
        forbidden_phrases_remaining,
        has_wrong_escalation,
        score: passed as f32 / checks.len() as f32,
    }
}
