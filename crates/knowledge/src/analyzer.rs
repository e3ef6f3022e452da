//! Query analysis: section-reference extraction and keyword expansion.

use crate::types::{ActType, SectionReference};
use regex::Regex;
use std::sync::LazyLock;

/// How a pattern's capture groups map onto (act, number).
#[derive(Debug, Clone, Copy)]
enum Captures {
    ActThenNumber,
    NumberThenOptionalAct,
    NumberOnly,
}

/// Tried in order against the lowercased query. The act-first form must run
/// before the bare `sec. N` form so "section 420 of ipc" keeps its act.
static SECTION_PATTERNS: LazyLock<Vec<(Regex, Captures)>> = LazyLock::new(|| {
    [
        (
            r"\b(ipc|crpc|cpc|evidence)\s*(?:section)?\s*(\d+)\b",
            Captures::ActThenNumber,
        ),
        (
            r"\bsection\s*(\d+)\s*(?:of\s*)?(ipc|crpc|cpc|evidence)?\b",
            Captures::NumberThenOptionalAct,
        ),
        (r"\bsec\.?\s*(\d+)\b", Captures::NumberOnly),
        (r"\bwhat\s+is\s+(\d+)\b", Captures::NumberOnly),
    ]
    .into_iter()
    .map(|(pattern, captures)| {
        let regex = Regex::new(pattern).expect("section reference pattern must compile");
        (regex, captures)
    })
    .collect()
});

/// Extract the section the query asks about, if any.
///
/// When the matching pattern carries no act, IPC is assumed.
pub fn extract_section_reference(query: &str) -> Option<SectionReference> {
    let lowered = query.to_lowercase();

    SECTION_PATTERNS.iter().find_map(|(regex, captures)| {
        let caps = regex.captures(&lowered)?;
        let group = |i: usize| caps.get(i).map(|m| m.as_str());

        let (act, number) = match captures {
            Captures::ActThenNumber => (group(1), group(2)),
            Captures::NumberThenOptionalAct => (group(2), group(1)),
            Captures::NumberOnly => (None, group(1)),
        };

        let act = act.and_then(ActType::parse).unwrap_or(ActType::Ipc);
        number.map(|n| SectionReference::new(n, act))
    })
}

/// Prefix the query with the act's keyword bag and the literal section token.
///
/// The user's original wording is kept at the end.
pub fn expand_query(query: &str, reference: &SectionReference) -> String {
    format!(
        "Section {} {} {} {}",
        reference.number,
        reference.act.as_str().to_uppercase(),
        reference.act.expansion_keywords(),
        query
    )
}

/// The text to embed: expanded when a section reference is present.
pub fn search_text(query: &str, reference: Option<&SectionReference>) -> String {
    match reference {
        Some(reference) => expand_query(query, reference),
        None => query.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(query: &str) -> Option<(String, ActType)> {
        extract_section_reference(query).map(|r| (r.number, r.act))
    }

    #[test]
    fn test_act_then_number() {
        assert_eq!(extract("IPC 420"), Some(("420".to_string(), ActType::Ipc)));
        assert_eq!(
            extract("what does crpc section 41 say about arrest?"),
            Some(("41".to_string(), ActType::Crpc))
        );
        assert_eq!(
            extract("Evidence 65 electronic records"),
            Some(("65".to_string(), ActType::Evidence))
        );
    }

    #[test]
    fn test_section_of_act_keeps_act() {
        assert_eq!(
            extract("Explain section 420 of ipc"),
            Some(("420".to_string(), ActType::Ipc))
        );
        assert_eq!(
            extract("section 9 of cpc jurisdiction"),
            Some(("9".to_string(), ActType::Cpc))
        );
        assert_eq!(
            extract("Section 420 IPC"),
            Some(("420".to_string(), ActType::Ipc))
        );
    }

    #[test]
    fn test_bare_forms_default_to_ipc() {
        assert_eq!(extract("Section 302"), Some(("302".to_string(), ActType::Ipc)));
        assert_eq!(extract("sec. 498 cruelty"), Some(("498".to_string(), ActType::Ipc)));
        assert_eq!(extract("What is 376?"), Some(("376".to_string(), ActType::Ipc)));
    }

    #[test]
    fn test_no_reference() {
        assert_eq!(extract("my landlord kept my deposit"), None);
        assert_eq!(extract("section of the act"), None);
        // "ipc" without a number never matches the act-first pattern
        assert_eq!(extract("is cheating covered by ipc"), None);
    }

    #[test]
    fn test_expand_query() {
        let reference = SectionReference::new("420", ActType::Ipc);
        assert_eq!(
            expand_query("Section 420 IPC", &reference),
            "Section 420 IPC Indian Penal Code IPC offense crime punishment penalty Section 420 IPC"
        );

        let reference = SectionReference::new("41", ActType::Crpc);
        let expanded = expand_query("arrest without warrant", &reference);
        assert!(expanded.starts_with("Section 41 CRPC Code of Criminal Procedure"));
        assert!(expanded.ends_with("arrest without warrant"));
    }

    #[test]
    fn test_search_text_passthrough() {
        assert_eq!(search_text("tenant rights", None), "tenant rights");
    }
}
