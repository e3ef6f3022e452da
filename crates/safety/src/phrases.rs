//! Phrase sanitization: hedging, meta-references and absolute commands.

use crate::rules::{RuleSet, Step, StepContext};
use std::sync::LazyLock;

/// Applied once, top to bottom. Case is handled in the patterns themselves.
const PHRASE_TABLE: &[(&str, &str)] = &[
    // references to the retrieval context
    (r"[Bb]ased on the provided documents?", "Generally"),
    (r"[Bb]ased on the context provided", "Under Indian law"),
    (r"[Bb]ased on the legal documents?", "Typically"),
    (r"[Tt]he documents? do(?:es)? not contain", "While specific details may vary"),
    (r"[Tt]he provided context", "the available information"),
    (r"[Aa]ccording to the documents?", "Under Indian law"),
    (r"[Ff]rom the retrieved documents?", "Generally"),
    (r"[Aa]ccording to the text", "Generally"),
    (r"[Tt]he text (?:does not |doesn't )", "The specific provision "),
    // information limitations
    (r"[Ii] don'?t have (?:enough )?information", "While specifics may vary"),
    (r"[Ii] cannot find", "The specific provision may vary, but"),
    (r"[Nn]o information (?:is )?available", "While specific details may vary"),
    (r"[Ii] (?:do not|don't) have access", "The specific details may vary"),
    // absolute commands
    (r"[Yy]ou should", "You may consider"),
    (r"[Yy]ou must", "It may be advisable to"),
    (r"[Yy]ou need to", "You might want to"),
    (r"[Yy]ou have to", "It can be helpful to"),
    (r"[Dd]o this", "consider this approach"),
    (r"[Ii]t is mandatory", "It is often required"),
    (r"[Ii]t is illegal", "It may be considered unlawful"),
    (r"[Ii]t is legal", "It is generally permissible"),
    (r"[Tt]his is always", "This is typically"),
    (r"[Tt]his is never", "This is generally not"),
    // absolute certainty
    (r"\balways\b", "typically"),
    (r"\bnever\b", "generally not"),
    (r"\bdefinitely\b", "likely"),
    (r"\bcertainly\b", "generally"),
    // "threaten" is never acceptable advice
    (r"[Yy]ou can threaten", "You may inform them of your intention to pursue"),
    (r"[Tt]hreaten(?:ing)? legal action", "informing of your intention to pursue legal remedies"),
    (r"[Tt]hreaten(?:ing)? to (?:sue|file)", "communicating your intention to pursue"),
    (r"\bthreaten\b", "inform"),
    (r"\bthreatening\b", "communicating"),
];

pub(crate) static PHRASE_RULES: LazyLock<RuleSet> =
    LazyLock::new(|| RuleSet::from_table(PHRASE_TABLE, false).expect("phrase table regex"));

/// Replaces risky phrasing with safer equivalents.
pub struct PhraseSanitizer;

impl Step for PhraseSanitizer {
    fn name(&self) -> &'static str {
        "phrase_sanitizer"
    }

    fn apply(&self, text: &str, _ctx: &StepContext) -> String {
        PHRASE_RULES.apply(text)
    }
}

/// Phrase-table patterns still present in `text`.
pub fn forbidden_phrases(text: &str) -> Vec<String> {
    PHRASE_RULES
        .matching(text)
        .into_iter()
        .map(str::to_string)
        .collect()
}
