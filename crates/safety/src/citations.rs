//! Provenance and citation cleanup.

use crate::rules::{Step, StepContext};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static SOURCE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\*{0,2}(?:Sources?|References?|Referenced Sections?|Legal Sources?):?\*{0,2}:?\s*$",
    )
    .expect("source header regex")
});

static CASE_CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\b[A-Z][a-z]+ v\.? [A-Z][a-z]+.*?)(\n|$)").expect("case citation regex")
});

static CASE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+ v\.? [A-Z][a-z]+").expect("case name regex"));

fn is_list_item(line: &str) -> bool {
    let line = line.trim_start();
    (line.starts_with('-') || line.starts_with('•') || line.starts_with('*')) && !line.starts_with("**")
}

/// Drops "Sources"/"References" blocks the model invented.
///
/// The header line is always removed. If a list follows it (blank lines
/// allowed in between) the list is removed up to the next blank line or
/// `**` heading.
pub struct ProvenanceStrip;

impl ProvenanceStrip {
    pub fn strip(text: &str) -> String {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut kept = Vec::with_capacity(lines.len());
        let mut i = 0;

        while i < lines.len() {
            if !SOURCE_HEADER.is_match(lines[i].trim()) {
                kept.push(lines[i]);
                i += 1;
                continue;
            }

            let mut next = i + 1;
            while next < lines.len() && lines[next].trim().is_empty() {
                next += 1;
            }

            if next < lines.len() && is_list_item(lines[next]) {
                while next < lines.len()
                    && !lines[next].trim().is_empty()
                    && !lines[next].trim_start().starts_with("**")
                {
                    next += 1;
                }
                i = next;
            } else {
                i += 1;
            }
        }

        kept.join("\n")
    }
}

impl Step for ProvenanceStrip {
    fn name(&self) -> &'static str {
        "provenance_strip"
    }

    fn apply(&self, text: &str, _ctx: &StepContext) -> String {
        Self::strip(text)
    }
}

/// Shortens long `Party v. Party ...` citations to the case name.
pub struct CaseCitationTruncation {
    max_chars: usize,
}

impl CaseCitationTruncation {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Step for CaseCitationTruncation {
    fn name(&self) -> &'static str {
        "case_citation_truncation"
    }

    fn apply(&self, text: &str, _ctx: &StepContext) -> String {
        CASE_CITATION
            .replace_all(text, |caps: &Captures| {
                let citation = &caps[1];
                let line_end = &caps[2];
                if citation.chars().count() > self.max_chars {
                    if let Some(name) = CASE_NAME.find(citation) {
                        return format!("{} (landmark case){}", name.as_str(), line_end);
                    }
                }
                caps[0].to_string()
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> StepContext {
        StepContext::new("", "")
    }

    #[test]
    fn test_strips_source_list() {
        let raw = "Answer text.\n\n**Sources:**\n- IPC Section 420\n- Some website\n\n**Next:** more";
        assert_eq!(ProvenanceStrip::strip(raw), "Answer text.\n\n\n**Next:** more");
    }

    #[test]
    fn test_strips_list_after_blank_line() {
        let raw = "Answer.\nReferences:\n\n• Case A\n• Case B";
        assert_eq!(ProvenanceStrip::strip(raw), "Answer.");
    }

    #[test]
    fn test_strips_bare_header() {
        let raw = "Answer.\nReferenced Sections:\nSection 420 is relevant.";
        assert_eq!(
            ProvenanceStrip::strip(raw),
            "Answer.\nSection 420 is relevant."
        );
    }

    #[test]
    fn test_keeps_sentences_mentioning_sources() {
        let raw = "Sources of law include statutes.\n- a bullet";
        assert_eq!(ProvenanceStrip::strip(raw), raw);
    }

    #[test]
    fn test_strip_idempotent() {
        let raw = "A\n**Legal Sources:**\n- x\n- y\nB";
        let once = ProvenanceStrip.apply(raw, &ctx());
        assert_eq!(ProvenanceStrip.apply(&once, &ctx()), once);
    }

    #[test]
    fn test_truncates_long_case_citation() {
        let raw = "See Kesavananda v. Bharati and others, decided by a thirteen judge bench of the Supreme Court in 1973 on basic structure.\nNext line.";
        let step = CaseCitationTruncation::new(80);
        let out = step.apply(raw, &ctx());

        assert_eq!(out, "See Kesavananda v. Bharati (landmark case)\nNext line.");
        assert_eq!(step.apply(&out, &ctx()), out);
    }

    #[test]
    fn test_short_citation_unchanged() {
        let raw = "Maneka v. Union of India expanded Article 21.";
        assert_eq!(CaseCitationTruncation::new(80).apply(raw, &ctx()), raw);
    }
}
