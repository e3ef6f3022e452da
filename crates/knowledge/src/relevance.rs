//! Relevance gate deciding between local answers and web fallback.

use crate::analyzer::extract_section_reference;
use crate::types::RetrievedDocument;

#[derive(Debug, Clone, Copy)]
pub struct RelevanceGate {
    threshold: f32,
}

impl RelevanceGate {
    /// `threshold` is the cosine distance the best semantic hit must beat.
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Whether local candidates are trustworthy enough to answer from.
    ///
    /// Checks run in a fixed order: an exact hit always wins, and a section
    /// the user named but that is absent from the candidates is never
    /// satisfied by a close but unrelated neighbor.
    pub fn is_relevant(&self, candidates: &[RetrievedDocument], query: &str) -> bool {
        let Some(best) = candidates.first() else {
            return false;
        };

        if best.is_exact() {
            return true;
        }

        if let Some(reference) = extract_section_reference(query) {
            return candidates.iter().any(|doc| reference.matches(&doc.metadata));
        }

        best.distance < self.threshold
    }
}
