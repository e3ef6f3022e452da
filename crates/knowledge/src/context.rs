//! Prompt context assembly from local documents or web results.

use crate::types::{RetrievedDocument, WebResult};

pub const NO_DOCUMENTS_CONTEXT: &str = "No relevant legal documents were found for this query.";
pub const NO_WEB_RESULTS_CONTEXT: &str =
    "General legal principles apply. Specifics may vary by situation.";
const WEB_HEADER: &str = "**Legal Information from Authoritative Sources:**\n";

/// Web results rendered into the context; the rest only feed citations.
const WEB_RESULTS_IN_CONTEXT: usize = 2;

/// Context used when neither the index nor the web produced anything.
pub fn no_information_context(query: &str) -> String {
    format!(
        "No relevant information found in local database or web search for: {}",
        query
    )
}

/// Renders bounded context blocks. Lengths are counted in characters.
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    max_context_length: usize,
    web_snippet_chars: usize,
}

impl ContextAssembler {
    pub fn new(max_context_length: usize, web_snippet_chars: usize) -> Self {
        Self {
            max_context_length,
            web_snippet_chars,
        }
    }

    /// Concatenate whole document segments while they fit the budget.
    ///
    /// Segments are never cut; the first one that would overflow ends the
    /// loop.
    pub fn build_local(&self, documents: &[RetrievedDocument]) -> String {
        if documents.is_empty() {
            return NO_DOCUMENTS_CONTEXT.to_string();
        }

        let mut parts: Vec<String> = Vec::new();
        let mut length = 0usize;

        for (i, doc) in documents.iter().enumerate() {
            let segment = render_segment(i + 1, doc);
            let separator = usize::from(!parts.is_empty());
            let added = separator + segment.chars().count();

            if length + added > self.max_context_length {
                break;
            }

            length += added;
            parts.push(segment);
        }

        parts.join("\n")
    }

    /// Render the top web results with each snippet capped.
    pub fn build_web(&self, results: &[WebResult]) -> String {
        if results.is_empty() {
            return NO_WEB_RESULTS_CONTEXT.to_string();
        }

        let mut parts = vec![WEB_HEADER.to_string()];
        for (i, result) in results.iter().take(WEB_RESULTS_IN_CONTEXT).enumerate() {
            let title = if result.title.is_empty() {
                "Legal Resource"
            } else {
                result.title.as_str()
            };
            parts.push(format!(
                "\n[Source {}: {}]\n{}\n",
                i + 1,
                title,
                truncate_chars(&result.content, self.web_snippet_chars)
            ));
        }

        parts.join("\n")
    }
}

fn render_segment(position: usize, doc: &RetrievedDocument) -> String {
    let metadata = &doc.metadata;
    let mut segment = format!("\n--- Document {} ---\n", position);

    match metadata.act() {
        Some(act) => {
            segment.push_str(&format!(
                "{} - Section {}\n",
                act.context_label(),
                metadata.section_number
            ));
        }
        None => {
            if let Some(source) = metadata.source() {
                segment.push_str(&format!("Source: {}\n", source));
            }
            segment.push_str(&format!("Section: {}\n", metadata.section_number));
        }
    }

    if let Some(title) = metadata.section_title() {
        let title = title.replace("in TheIndian", " - ").replace("in The", " - ");
        segment.push_str(&format!("Title: {}\n", title));
    }

    segment.push_str(&format!("\n{}\n---\n", doc.content));
    segment
}

fn truncate_chars(text: &str, cap: usize) -> String {
    match text.char_indices().nth(cap) {
        Some((byte, _)) => format!("{}...", &text[..byte]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentMetadata;

    fn ipc(section: &str, content: &str) -> RetrievedDocument {
        RetrievedDocument::new(
            content,
            DocumentMetadata::new("ipc", section).with("section_title", "Cheating in The Indian Penal Code"),
            0.2,
        )
    }

    #[test]
    fn test_empty_returns_sentinel() {
        let assembler = ContextAssembler::new(4000, 800);
        assert_eq!(assembler.build_local(&[]), NO_DOCUMENTS_CONTEXT);
    }

    #[test]
    fn test_segment_format() {
        let assembler = ContextAssembler::new(4000, 800);
        let context = assembler.build_local(&[ipc("420", "Whoever cheats...")]);

        assert_eq!(
            context,
            "\n--- Document 1 ---\nIndian Penal Code (IPC) - Section 420\nTitle: Cheating  -  Indian Penal Code\n\nWhoever cheats...\n---\n"
        );
    }

    #[test]
    fn test_unknown_type_uses_source_header() {
        let assembler = ContextAssembler::new(4000, 800);
        let doc = RetrievedDocument::new(
            "Article text",
            DocumentMetadata::new("constitution", "21").with("source", "India Code"),
            0.1,
        );
        let context = assembler.build_local(&[doc]);
        assert!(context.contains("Source: India Code\nSection: 21\n"));
    }

    #[test]
    fn test_budget_never_exceeded() {
        let docs: Vec<RetrievedDocument> = (0..20)
            .map(|i| ipc(&i.to_string(), &"x".repeat(300)))
            .collect();

        for budget in [0, 100, 400, 900, 1500, 4000] {
            let assembler = ContextAssembler::new(budget, 800);
            let context = assembler.build_local(&docs);
            assert!(
                context.chars().count() <= budget,
                "budget {} exceeded: {}",
                budget,
                context.chars().count()
            );
        }
    }

    #[test]
    fn test_stops_at_first_overflow() {
        let small = ipc("1", "short");
        let large = ipc("2", &"y".repeat(5000));
        let later = ipc("3", "short");
        let assembler = ContextAssembler::new(1000, 800);

        let context = assembler.build_local(&[small, large, later]);
        assert!(context.contains("Document 1"));
        assert!(!context.contains("Document 2"));
        assert!(!context.contains("Document 3"));
    }

    #[test]
    fn test_web_context_caps_results_and_snippets() {
        let assembler = ContextAssembler::new(4000, 10);
        let results = vec![
            WebResult {
                title: "Consumer rights".to_string(),
                url: "https://example.org/a".to_string(),
                content: "abcdefghijklmnop".to_string(),
                score: 0.9,
            },
            WebResult {
                title: String::new(),
                url: "https://example.org/b".to_string(),
                content: "short".to_string(),
                score: 0.8,
            },
            WebResult {
                title: "Third".to_string(),
                url: "https://example.org/c".to_string(),
                content: "never shown".to_string(),
                score: 0.7,
            },
        ];

        let context = assembler.build_web(&results);
        assert!(context.starts_with(WEB_HEADER));
        assert!(context.contains("[Source 1: Consumer rights]\nabcdefghij...\n"));
        assert!(context.contains("[Source 2: Legal Resource]\nshort\n"));
        assert!(!context.contains("Third"));
    }

    #[test]
    fn test_web_context_without_results() {
        let assembler = ContextAssembler::new(4000, 800);
        assert_eq!(assembler.build_web(&[]), NO_WEB_RESULTS_CONTEXT);
    }

    #[test]
    fn test_truncate_chars_is_utf8_safe() {
        assert_eq!(truncate_chars("धारा चार सौ बीस", 4), "धारा...");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }
}
