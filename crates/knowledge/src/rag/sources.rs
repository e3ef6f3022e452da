//! Source citations for local documents and web results.

use crate::rag::types::SourceCitation;
use crate::types::{RetrievedDocument, WebResult};

/// Citations are built from this many leading candidates.
pub const MAX_CITATIONS: usize = 3;

pub fn local_citations(documents: &[RetrievedDocument]) -> Vec<SourceCitation> {
    documents
        .iter()
        .take(MAX_CITATIONS)
        .map(|doc| {
            let metadata = &doc.metadata;
            let source = match metadata.act() {
                Some(act) => format!("{} Section {}", act.abbreviation(), metadata.section_number),
                None => metadata.source().unwrap_or("Unknown").to_string(),
            };

            SourceCitation {
                source,
                section: metadata.section_number.clone(),
                source_type: Some(metadata.doc_type.clone()),
                url: metadata.url().map(str::to_string),
                distance: round3(doc.distance),
            }
        })
        .collect()
}

pub fn web_citations(results: &[WebResult]) -> Vec<SourceCitation> {
    results
        .iter()
        .take(MAX_CITATIONS)
        .map(|result| SourceCitation {
            source: if result.title.is_empty() {
                "Web Source".to_string()
            } else {
                result.title.clone()
            },
            section: "Web".to_string(),
            source_type: Some("web".to_string()),
            url: (!result.url.is_empty()).then(|| result.url.clone()),
            distance: round3(1.0 - result.score),
        })
        .collect()
}

fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentMetadata;

    #[test]
    fn test_local_citation_names() {
        let docs = vec![
            RetrievedDocument::exact(
                "a",
                DocumentMetadata::new("ipc", "420").with("url", "https://indiankanoon.org/doc/1"),
            ),
            RetrievedDocument::new("b", DocumentMetadata::new("evidence", "65"), 0.23456),
            RetrievedDocument::new("c", DocumentMetadata::new("crpc", "41"), 0.3),
            RetrievedDocument::new("d", DocumentMetadata::new("cpc", "9"), 0.4),
        ];

        let citations = local_citations(&docs);
        assert_eq!(citations.len(), 3);
        assert_eq!(citations[0].source, "IPC Section 420");
        assert_eq!(citations[0].url.as_deref(), Some("https://indiankanoon.org/doc/1"));
        assert_eq!(citations[0].distance, 0.0);
        assert_eq!(citations[1].source, "Evidence Act Section 65");
        assert_eq!(citations[1].distance, 0.235);
        assert_eq!(citations[2].source, "CrPC Section 41");
        assert_eq!(citations[2].source_type.as_deref(), Some("crpc"));
    }

    #[test]
    fn test_unknown_act_uses_source_field() {
        let docs = vec![
            RetrievedDocument::new(
                "a",
                DocumentMetadata::new("constitution", "21").with("source", "India Code"),
                0.1,
            ),
            RetrievedDocument::new("b", DocumentMetadata::new("rules", "3"), 0.2),
        ];
        let citations = local_citations(&docs);
        assert_eq!(citations[0].source, "India Code");
        assert_eq!(citations[1].source, "Unknown");
    }

    #[test]
    fn test_web_citations() {
        let results = vec![
            WebResult {
                title: "Security deposit rules".to_string(),
                url: "https://lawrato.com/a".to_string(),
                content: String::new(),
                score: 0.8123,
            },
            WebResult {
                title: String::new(),
                url: String::new(),
                content: String::new(),
                score: 0.0,
            },
        ];

        let citations = web_citations(&results);
        assert_eq!(citations[0].section, "Web");
        assert_eq!(citations[0].distance, 0.188);
        assert_eq!(citations[1].source, "Web Source");
        assert_eq!(citations[1].url, None);
        assert_eq!(citations[1].distance, 1.0);
    }
}
