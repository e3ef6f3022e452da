//! The ordered response safety pipeline.

use crate::citations::{CaseCitationTruncation, ProvenanceStrip};
use crate::disclosures::{Disclaimer, JurisdictionNote, NextSteps, PrivacyWarning, StateVariationNote};
use crate::escalation::EscalationCorrection;
use crate::format::{StructureFormatter, WordLimit};
use crate::phrases::PhraseSanitizer;
use crate::rules::{Step, StepContext};
use crate::topic::Topic;
use nyaya_core::config::SafetySettings;

/// Tunable limits and topic policy.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_words: usize,
    pub civil_only_topics: Vec<Topic>,
    pub case_citation_cap: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_words: 280,
            civil_only_topics: vec![Topic::Debt],
            case_citation_cap: 80,
        }
    }
}

impl PipelineConfig {
    pub fn from_settings(settings: &SafetySettings) -> Self {
        let civil_only_topics = settings
            .civil_only_topics
            .iter()
            .filter_map(|name| {
                let topic = Topic::parse(name);
                if topic.is_none() {
                    tracing::warn!("Ignoring unknown civil-only topic '{}'", name);
                }
                topic
            })
            .collect();

        Self {
            max_words: settings.max_words,
            civil_only_topics,
            case_citation_cap: settings.case_citation_cap,
        }
    }
}

/// Rewrites raw model output into a safe, structured answer.
///
/// Steps run in a fixed order and each sees only the previous step's output.
/// Provider error messages (anything starting with `Error`) and empty answers
/// pass through untouched.
pub struct SafetyPipeline {
    steps: Vec<Box<dyn Step>>,
}

impl SafetyPipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        let steps: Vec<Box<dyn Step>> = vec![
            Box::new(ProvenanceStrip),
            Box::new(PhraseSanitizer),
            Box::new(EscalationCorrection::new(config.civil_only_topics.clone())),
            Box::new(CaseCitationTruncation::new(config.case_citation_cap)),
            Box::new(StructureFormatter),
            Box::new(StateVariationNote),
            Box::new(PrivacyWarning),
            Box::new(JurisdictionNote),
            Box::new(NextSteps),
            Box::new(Disclaimer),
            Box::new(WordLimit::new(config.max_words)),
        ];
        Self { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn process(&self, raw: &str, query: &str) -> String {
        if raw.trim().is_empty() || raw.starts_with("Error") {
            return raw.to_string();
        }

        let ctx = StepContext::new(query, raw);
        tracing::debug!(topic = %ctx.topic, "Post-processing answer");

        let mut text = raw.to_string();
        for step in &self.steps {
            if !step.applies(&ctx) {
                continue;
            }
            let next = step.apply(&text, &ctx);
            if next != text {
                tracing::debug!(step = step.name(), "Safety step rewrote answer");
            }
            text = next;
        }

        text.trim().to_string()
    }
}

impl Default for SafetyPipeline {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disclosures::DEFAULT_DISCLAIMER;

    fn mentions_police(text: &str) -> bool {
        text.split(|c: char| !c.is_alphanumeric())
            .any(|w| w.eq_ignore_ascii_case("police") || w.eq_ignore_ascii_case("fir"))
    }

    #[test]
    fn test_step_order() {
        assert_eq!(
            SafetyPipeline::default().step_names(),
            vec![
                "provenance_strip",
                "phrase_sanitizer",
                "escalation_correction",
                "case_citation_truncation",
                "structure_formatter",
                "state_variation_note",
                "privacy_warning",
                "jurisdiction_note",
                "next_steps",
                "disclaimer",
                "word_limit",
            ]
        );
    }

    #[test]
    fn test_error_and_empty_pass_through() {
        let pipeline = SafetyPipeline::default();
        let error = "Error: Request timed out. The model may be loading or the query is too complex.";
        assert_eq!(pipeline.process(error, "anything"), error);
        assert_eq!(pipeline.process("", "anything"), "");
    }

    #[test]
    fn test_debt_answer_loses_police_advice() {
        let query = "My friend borrowed money from me and is not repaying the loan. What can I do?";
        let raw = "You should file an FIR at the police station immediately. The police will help you recover the money.\n\n\
                   You can also approach the police again if he refuses.";

        let out = SafetyPipeline::default().process(raw, query);

        assert!(!mentions_police(&out), "{}", out);
        assert_eq!(out.matches("Non-payment of debt is generally a civil matter").count(), 1);
        assert!(out.contains("If unresolved, Civil Court (money suit), legal notice, or mediation may be appropriate"));
        assert!(out.ends_with(DEFAULT_DISCLAIMER.trim()));
    }

    #[test]
    fn test_ipc_cheating_gets_no_privacy_warning() {
        let query = "What is IPC 420 cheating punishment";
        let raw = "Section 420 of the IPC deals with cheating and dishonestly inducing delivery of property. \
                   The punishment may extend to seven years of imprisonment and fine.";

        let out = SafetyPipeline::default().process(raw, query);

        assert!(!out.contains("Critical Privacy Warning"));
        assert!(!out.contains("Family/Divorce"));
        assert!(out.starts_with("**Quick Answer:**"));
    }

    #[test]
    fn test_employment_answer_gets_labour_forum() {
        let query = "My employer terminated me and has not paid my salary";
        let raw = "You should approach the Consumer Forum for your unpaid salary.\n\nSources:\n- Some Act";

        let out = SafetyPipeline::default().process(raw, query);

        assert!(!out.contains("Consumer Forum"), "{}", out);
        assert!(!out.contains("Some Act"));
        assert!(out.contains("Labour Commissioner, Industrial Tribunal, or Labour Court"));
        assert!(out.contains("**Suggested Next Steps:**"));
        assert!(out.contains("**Jurisdiction Note:**"));
        assert!(out.ends_with(DEFAULT_DISCLAIMER.trim()));
    }

    #[test]
    fn test_long_answer_is_capped() {
        let raw = "This sentence is filler text for the word limit. ".repeat(80);
        let out = SafetyPipeline::default().process(&raw, "What is bail?");

        assert!(out.split_whitespace().count() <= 280);
        assert!(out.ends_with(DEFAULT_DISCLAIMER.trim()));
    }

    #[test]
    fn test_long_debt_paragraph_keeps_civil_guidance() {
        let query = "My friend borrowed money from me and is not repaying the loan. What can I do?";
        let raw = format!(
            "You should file an FIR at the police station immediately. {}",
            "A civil suit for recovery of the amount can be filed in the court that has jurisdiction over the borrower. "
                .repeat(25)
        );

        let out = SafetyPipeline::default().process(&raw, query);

        assert!(out.split_whitespace().count() <= 280, "{}", out);
        assert!(!mentions_police(&out), "{}", out);
        assert!(out.contains("..."));
        assert_eq!(out.matches("Non-payment of debt is generally a civil matter").count(), 1);
        assert!(out.contains("**Jurisdiction Note:**"));
        assert_eq!(out.matches("**Suggested Next Steps:**").count(), 1);
        assert!(out.contains("If unresolved, Civil Court (money suit), legal notice, or mediation may be appropriate"));
        assert!(out.ends_with(DEFAULT_DISCLAIMER.trim()));
    }

    #[test]
    fn test_config_from_settings() {
        let settings = SafetySettings {
            max_words: 150,
            civil_only_topics: vec!["debt".into(), "contract".into(), "tenancy".into()],
            case_citation_cap: 60,
        };
        let config = PipelineConfig::from_settings(&settings);
        assert_eq!(config.civil_only_topics, vec![Topic::Debt, Topic::Tenancy]);
        assert_eq!(config.max_words, 150);
    }
}
