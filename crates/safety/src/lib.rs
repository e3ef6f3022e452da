//! Response safety pipeline for legal answers.
//!
//! Raw model output goes through a fixed sequence of idempotent rewrites:
//! provenance cleanup, phrase sanitization, escalation correction, citation
//! truncation, structural formatting, mandatory disclosures and a word cap.
//! Topic detection drives the escalation forum and which warnings apply.

pub mod citations;
pub mod disclosures;
pub mod escalation;
pub mod format;
pub mod phrases;
pub mod pipeline;
pub mod quality;
pub mod rules;
pub mod topic;

pub use pipeline::{PipelineConfig, SafetyPipeline};
pub use quality::{check_quality, QualityReport};
pub use rules::{RuleSet, Step, StepContext};
pub use topic::{detect_topic, Topic};
