//! Mandatory notes, warnings and the disclaimer.
//!
//! Every step here only adds text, and only when the answer does not already
//! carry an equivalent passage.

use crate::rules::{insert_before_disclaimer, keyword_set, Step, StepContext};
use regex::{Regex, RegexBuilder, RegexSet};
use std::sync::LazyLock;

pub const PRIVACY_WARNING: &str = "
⚠️ **Critical Privacy Warning:**
• Accessing someone's phone, messages, or accounts WITHOUT their consent may be illegal (privacy violation, IT Act offenses, or theft)
• Admissibility ≠ Permission — courts may accept evidence, but OBTAINING it illegally is a separate offense
• Evidence ≠ Proof — screenshots or messages alone rarely prove anything conclusively in court
• Obtaining evidence without consent carries its own legal risks and may harm your case ethically
";

pub const FAMILY_EVIDENCE_WARNING: &str = "
⚠️ **Important for Family/Divorce Matters:**
• Private messages showing infidelity are NOT automatic grounds for divorce in India
• Family courts evaluate overall conduct and circumstances, not just digital evidence
• Illegally obtained evidence may be admitted but could affect your credibility
• The burden of proof in family matters differs from criminal cases
";

pub const DEFAULT_JURISDICTION: &str = "
**Jurisdiction Note:**
This applies to Indian law, which can vary significantly by state. Your state may have specific provisions that differ from general principles.
";

pub const DEFAULT_DISCLAIMER: &str = "
---
⚠️ **Disclaimer:** This is general legal information, not legal advice. Consult a qualified lawyer for advice specific to your situation.
";

const STATE_SPECIFIC_TOPICS: &[&str] = &[
    r"\b(?:rent\s+control|tenancy|landlord|tenant)\b",
    r"\b(?:labour|labor|minimum\s+wage|shop.*establishment)\b",
    r"\b(?:stamp\s+duty|registration|property\s+tax)\b",
    r"\b(?:excise|liquor|alcohol)\b",
    r"\b(?:agricultural|farming|land\s+reform)\b",
    r"\b(?:municipal|local\s+body|panchayat)\b",
];

const STATE_PHRASES: &[&str] = &[
    r"vary by state",
    r"state's law",
    r"state-specific",
    r"depends on.*state",
    r"your state",
    r"some states",
];

/// Active evidence collection.
const EVIDENCE_KEYWORDS: &[&str] = &[
    r"\b(?:record(?:ing)?|spy|surveillance|monitor|track|hack)\b",
    r"\b(?:screenshot|phone\s+tap|hidden\s+camera)\b",
    r"\b(?:collect\s+evidence|gather\s+evidence)\b",
    r"\b(?:whatsapp.*(?:evidence|proof)|sms.*(?:evidence|proof))\b",
];

const NORMAL_EVIDENCE_CONTEXTS: &[&str] = &[
    r"\b(?:bank\s+statement|receipt|invoice|contract|agreement)\b",
    r"\b(?:witness|testimony|document|letter|notice)\b",
    r"\b(?:IPC|section\s+\d+|penal\s+code|criminal)\b",
];

/// Criminal "cheating" (IPC 420 fraud), not marital infidelity.
const CRIMINAL_CHEATING_CONTEXT: &[&str] = &[
    r"\b(?:IPC|section|penal\s+code|BNS)\b",
    r"\b(?:420|fraud|dishonest|property|induce)\b",
    r"\b(?:criminal|offense|offence|punishment|imprisonment)\b",
];

const FAMILY_EVIDENCE_KEYWORDS: &[&str] = &[
    r"\b(?:divorce|spouse|husband|wife|marriage)\b.*\b(?:affair|cheating|infidelity|adultery)\b",
    r"\b(?:affair|infidelity|adultery)\b.*\b(?:divorce|spouse|husband|wife|marriage)\b",
    r"\b(?:whatsapp|message|chat|screenshot).*(?:court|evidence|proof)\b",
    r"\b(?:evidence|proof).*(?:divorce|cheating|affair)\b",
    r"\b(?:my\s+(?:husband|wife|spouse).*(?:cheating|affair))\b",
    r"\b(?:prove.*(?:cheating|affair|infidelity))\b",
];

const STRONG_WARNING_PHRASES: &[&str] = &[
    "without consent",
    "illegal",
    "separate offense",
    "legal risk",
    "privacy violation",
    "obtaining it",
];

fn compile_set(patterns: &[&str], what: &str) -> RegexSet {
    keyword_set(patterns).unwrap_or_else(|e| panic!("invalid {} pattern: {}", what, e))
}

static STATE_TOPICS: LazyLock<RegexSet> =
    LazyLock::new(|| compile_set(STATE_SPECIFIC_TOPICS, "state topic"));
static STATE_NOTES: LazyLock<RegexSet> = LazyLock::new(|| compile_set(STATE_PHRASES, "state phrase"));
static EVIDENCE: LazyLock<RegexSet> = LazyLock::new(|| compile_set(EVIDENCE_KEYWORDS, "evidence"));
static NORMAL_EVIDENCE: LazyLock<RegexSet> =
    LazyLock::new(|| compile_set(NORMAL_EVIDENCE_CONTEXTS, "normal evidence"));
static CRIMINAL_CONTEXT: LazyLock<RegexSet> =
    LazyLock::new(|| compile_set(CRIMINAL_CHEATING_CONTEXT, "criminal context"));
static FAMILY_EVIDENCE: LazyLock<RegexSet> =
    LazyLock::new(|| compile_set(FAMILY_EVIDENCE_KEYWORDS, "family evidence"));

static RELATIONSHIP_INFIDELITY: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(
        r"\b(?:spouse|husband|wife|marriage|divorce).*(?:cheating|affair|infidelity)\b|\b(?:cheating|affair|infidelity).*(?:spouse|husband|wife|marriage|divorce)\b",
    )
    .case_insensitive(true)
    .build()
    .expect("relationship infidelity regex")
});

pub fn needs_state_variation_note(text: &str) -> bool {
    STATE_TOPICS.is_match(text)
}

fn is_criminal_context(text: &str) -> bool {
    CRIMINAL_CONTEXT.is_match(text)
}

/// Covert evidence collection, unless the text is about criminal cheating.
pub fn needs_privacy_warning(text: &str) -> bool {
    if is_criminal_context(text) {
        return false;
    }

    let collecting = EVIDENCE.is_match(text);
    let ordinary_evidence = NORMAL_EVIDENCE.is_match(text);
    let infidelity = RELATIONSHIP_INFIDELITY.is_match(text);

    collecting && (infidelity || !ordinary_evidence)
}

pub fn needs_family_evidence_warning(text: &str) -> bool {
    !is_criminal_context(text) && FAMILY_EVIDENCE.is_match(text)
}

/// Adds a "may vary by state" note for state-governed subjects.
pub struct StateVariationNote;

impl Step for StateVariationNote {
    fn name(&self) -> &'static str {
        "state_variation_note"
    }

    fn applies(&self, ctx: &StepContext) -> bool {
        needs_state_variation_note(&ctx.combined)
    }

    fn apply(&self, text: &str, _ctx: &StepContext) -> String {
        if STATE_NOTES.is_match(text) {
            return text.to_string();
        }

        if text.contains("**Important Context:**") {
            return text.replacen(
                "**Important Context:**",
                "**Important Context:**\n• This may vary by state - some states have specific laws that differ",
                1,
            );
        }

        if let Some((before, after)) = text.split_once("**Quick Answer:**") {
            if let Some((answer, rest)) = after.split_once("\n\n") {
                return format!(
                    "{}**Quick Answer:**{}\n\n**Important Context:**\n• State laws may vary - check your state's specific provisions\n\n{}",
                    before, answer, rest
                );
            }
        }

        text.to_string()
    }
}

/// Privacy warning for covert evidence gathering, with a family-law addendum.
pub struct PrivacyWarning;

impl Step for PrivacyWarning {
    fn name(&self) -> &'static str {
        "privacy_warning"
    }

    fn applies(&self, ctx: &StepContext) -> bool {
        needs_privacy_warning(&ctx.combined) || needs_family_evidence_warning(&ctx.combined)
    }

    fn apply(&self, text: &str, ctx: &StepContext) -> String {
        let lower = text.to_lowercase();
        let strong = STRONG_WARNING_PHRASES
            .iter()
            .filter(|p| lower.contains(*p))
            .count();
        if strong >= 2 {
            return text.to_string();
        }

        let combined = format!("{} {}", ctx.query, text);
        let warning = if FAMILY_EVIDENCE.is_match(&combined) {
            format!("{}{}", FAMILY_EVIDENCE_WARNING, PRIVACY_WARNING)
        } else {
            PRIVACY_WARNING.to_string()
        };

        if text.contains("**Disclaimer") {
            insert_before_disclaimer(text, &warning, "\n")
        } else if text.contains("Disclaimer:") {
            text.replacen("Disclaimer:", &format!("{}\nDisclaimer:", warning), 1)
        } else if text.contains("---") {
            insert_before_disclaimer(text, &warning, "\n")
        } else {
            format!("{}\n{}", text.trim_end(), warning)
        }
    }
}

/// Jurisdiction note, unless the answer already frames itself in Indian law.
pub struct JurisdictionNote;

impl Step for JurisdictionNote {
    fn name(&self) -> &'static str {
        "jurisdiction_note"
    }

    fn apply(&self, text: &str, _ctx: &StepContext) -> String {
        let present = ["Jurisdiction Note", "Indian law", "state's law", "vary by state"]
            .iter()
            .any(|p| text.contains(p));
        if present {
            return text.to_string();
        }
        insert_before_disclaimer(text, DEFAULT_JURISDICTION, "")
    }
}

/// Next steps ending in the topic's escalation path.
pub struct NextSteps;

impl NextSteps {
    pub fn block(path: &str) -> String {
        format!(
            "
**Suggested Next Steps:**
• Document all relevant details and preserve any evidence
• Consider direct communication or mediation first
• If unresolved, {} may be appropriate
• Consulting a local lawyer can provide guidance tailored to your state and situation
",
            path
        )
    }
}

impl Step for NextSteps {
    fn name(&self) -> &'static str {
        "next_steps"
    }

    fn apply(&self, text: &str, ctx: &StepContext) -> String {
        if text.contains("Next Steps") {
            return text.to_string();
        }
        insert_before_disclaimer(text, &Self::block(ctx.topic.escalation_path()), "\n")
    }
}

/// Final disclaimer block.
pub struct Disclaimer;

static DISCLAIMER_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[Dd]isclaimer").expect("disclaimer regex"));

impl Step for Disclaimer {
    fn name(&self) -> &'static str {
        "disclaimer"
    }

    fn apply(&self, text: &str, _ctx: &StepContext) -> String {
        if DISCLAIMER_MENTION.is_match(text) {
            return text.to_string();
        }
        format!("{}{}", text.trim_end(), DEFAULT_DISCLAIMER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::Topic;

    #[test]
    fn test_criminal_cheating_suppresses_privacy_warning() {
        let text = "What is IPC 420 cheating punishment Section 420 deals with cheating and dishonestly inducing delivery of property.";
        assert!(!needs_privacy_warning(text));
        assert!(!needs_family_evidence_warning(text));
    }

    #[test]
    fn test_spousal_surveillance_triggers_warnings() {
        let text = "Can I record my wife's calls to prove she is cheating in the divorce?";
        assert!(needs_privacy_warning(text));
        assert!(needs_family_evidence_warning(text));
    }

    #[test]
    fn test_ordinary_evidence_does_not_trigger() {
        let text = "Should I track the payment with a bank statement and receipt?";
        assert!(!needs_privacy_warning(text));
    }

    #[test]
    fn test_privacy_warning_with_family_addendum() {
        let query = "Can I record my husband's calls to prove he is cheating";
        let raw = "**Quick Answer:**\nRecordings may be admissible.\n";
        let ctx = StepContext::new(query, raw);
        assert!(PrivacyWarning.applies(&ctx));

        let out = PrivacyWarning.apply(raw, &ctx);
        assert!(out.contains("Important for Family/Divorce Matters"));
        assert!(out.contains("Critical Privacy Warning"));
        assert_eq!(PrivacyWarning.apply(&out, &ctx), out);
    }

    #[test]
    fn test_state_variation_note_after_quick_answer() {
        let raw = "**Quick Answer:**\nA landlord must give notice.\n\nMore text.";
        let ctx = StepContext::new("Can my landlord evict me?", raw);
        assert!(StateVariationNote.applies(&ctx));

        let out = StateVariationNote.apply(raw, &ctx);
        assert_eq!(
            out,
            "**Quick Answer:**\nA landlord must give notice.\n\n**Important Context:**\n• State laws may vary - check your state's specific provisions\n\nMore text."
        );
        assert_eq!(StateVariationNote.apply(&out, &ctx), out);
    }

    #[test]
    fn test_state_variation_note_into_context() {
        let raw = "**Quick Answer:**\nYes.\n\n**Important Context:**\n• Point";
        let ctx = StepContext::new("tenant rights", raw);
        let out = StateVariationNote.apply(raw, &ctx);
        assert!(out.contains("**Important Context:**\n• This may vary by state"));
    }

    #[test]
    fn test_jurisdiction_and_next_steps_before_rule() {
        let ctx = StepContext::new("My employer fired me", "");
        assert_eq!(ctx.topic, Topic::Employment);

        let raw = "Answer body.\n---\nfooter";
        let with_note = JurisdictionNote.apply(raw, &ctx);
        assert!(with_note.contains("**Jurisdiction Note:**"));
        assert_eq!(JurisdictionNote.apply(&with_note, &ctx), with_note);

        let with_steps = NextSteps.apply(&with_note, &ctx);
        assert!(with_steps.contains(
            "If unresolved, Labour Commissioner, Industrial Tribunal, or Labour Court may be appropriate"
        ));
        assert!(with_steps.find("Next Steps").unwrap() < with_steps.rfind("---").unwrap());
        assert_eq!(NextSteps.apply(&with_steps, &ctx), with_steps);
    }

    #[test]
    fn test_jurisdiction_skipped_for_indian_law_answers() {
        let ctx = StepContext::new("", "");
        let raw = "Under Indian law this is allowed.";
        assert_eq!(JurisdictionNote.apply(raw, &ctx), raw);
    }

    #[test]
    fn test_disclaimer_appended_once() {
        let ctx = StepContext::new("", "");
        let out = Disclaimer.apply("Body text.\n", &ctx);
        assert!(out.ends_with(DEFAULT_DISCLAIMER));
        assert_eq!(Disclaimer.apply(&out, &ctx), out);
    }
}
