//! Answer structure and length.

use crate::disclosures::{
    NextSteps, DEFAULT_DISCLAIMER, DEFAULT_JURISDICTION, FAMILY_EVIDENCE_WARNING, PRIVACY_WARNING,
};
use crate::escalation::civil_note;
use crate::rules::{Step, StepContext};
use crate::topic::Topic;
use regex::Regex;
use std::sync::LazyLock;

const QUICK_ANSWER_SENTENCES: usize = 4;
const MAX_CONTEXT_BULLETS: usize = 4;

static DISCLAIMER_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)---\s*\n*⚠️\s*\*\*Disclaimer.*").expect("disclaimer block regex")
});

fn sentence_marks(line: &str) -> usize {
    line.chars().filter(|c| matches!(c, '.' | '?' | '!')).count()
}

fn to_bullet(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.starts_with('•') {
        trimmed.to_string()
    } else if let Some(rest) = trimmed.strip_prefix("- ") {
        format!("• {}", rest.trim())
    } else {
        format!("• {}", trimmed)
    }
}

/// Gives unstructured answers a "Quick Answer" / "Important Context" shape.
///
/// Leading prose (up to about four sentences) becomes the quick answer. The
/// first few remaining lines become context bullets. Everything from the
/// first `**` heading onward is kept verbatim.
pub struct StructureFormatter;

impl Step for StructureFormatter {
    fn name(&self) -> &'static str {
        "structure_formatter"
    }

    fn apply(&self, text: &str, _ctx: &StepContext) -> String {
        if text.contains("Quick Answer:") {
            return text.to_string();
        }

        let mut quick = Vec::new();
        let mut remaining = Vec::new();
        let mut sentences = 0;

        for line in text.trim().split('\n') {
            let is_marked = line.starts_with('•') || line.starts_with('-') || line.starts_with("**");
            if sentences < QUICK_ANSWER_SENTENCES && !is_marked {
                sentences += sentence_marks(line);
                quick.push(line);
            } else {
                remaining.push(line);
            }
        }

        while quick.last().is_some_and(|l| l.trim().is_empty()) {
            quick.pop();
        }

        let heading = remaining.iter().position(|l| l.starts_with("**"));
        let (body, tail) = remaining.split_at(heading.unwrap_or(remaining.len()));

        let bullets: Vec<String> = body
            .iter()
            .take(MAX_CONTEXT_BULLETS)
            .filter(|l| !l.trim().is_empty())
            .map(|l| to_bullet(l))
            .collect();

        let mut out = format!("**Quick Answer:**\n{}\n\n", quick.join("\n"));

        if !bullets.is_empty() {
            out.push_str("**Important Context:**\n");
            for bullet in &bullets {
                out.push_str(bullet);
                out.push('\n');
            }
        }

        if !tail.is_empty() {
            out.push('\n');
            out.push_str(tail.join("\n").trim_end());
            out.push('\n');
        }

        out
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Blocks earlier steps add that must survive truncation.
fn protected_blocks(topic: Topic) -> Vec<String> {
    vec![
        civil_note(topic).trim().to_string(),
        FAMILY_EVIDENCE_WARNING.trim().to_string(),
        PRIVACY_WARNING.trim().to_string(),
        DEFAULT_JURISDICTION.trim().to_string(),
        NextSteps::block(topic.escalation_path()).trim().to_string(),
    ]
}

/// Split `text` into the model's own prose and the protected blocks it
/// contains, the blocks in their original order.
fn split_protected(text: &str, topic: Topic) -> (String, Vec<String>) {
    let mut spans: Vec<(usize, usize)> = protected_blocks(topic)
        .iter()
        .filter_map(|block| text.find(block.as_str()).map(|start| (start, start + block.len())))
        .collect();
    spans.sort_unstable();

    let mut body = Vec::new();
    let mut blocks = Vec::new();
    let mut cursor = 0;
    for (start, end) in spans {
        if start < cursor {
            continue;
        }
        body.push(text[cursor..start].trim());
        blocks.push(text[start..end].to_string());
        cursor = end;
    }
    body.push(text[cursor..].trim());

    let body = body
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    (body, blocks)
}

/// Caps the word count by cutting the model's prose only.
///
/// The civil note, warnings, jurisdiction note, next steps and disclaimer
/// form a protected tail that is kept whole after the cut prose. When the
/// tail alone is over the limit it is returned without any prose.
pub struct WordLimit {
    max_words: usize,
}

impl WordLimit {
    pub fn new(max_words: usize) -> Self {
        Self { max_words }
    }

    /// Cut `text` after its `n`th word, keeping the original whitespace.
    fn keep_words(text: &str, n: usize) -> &str {
        let mut count = 0;
        let mut in_word = false;
        for (idx, ch) in text.char_indices() {
            if ch.is_whitespace() {
                if in_word {
                    count += 1;
                    if count == n {
                        return &text[..idx];
                    }
                }
                in_word = false;
            } else {
                in_word = true;
            }
        }
        text
    }
}

impl Step for WordLimit {
    fn name(&self) -> &'static str {
        "word_limit"
    }

    fn apply(&self, text: &str, ctx: &StepContext) -> String {
        if word_count(text) <= self.max_words {
            return text.to_string();
        }

        let (main, disclaimer) = match DISCLAIMER_BLOCK.find(text) {
            Some(m) => (&text[..m.start()], m.as_str()),
            None => (text, DEFAULT_DISCLAIMER.trim()),
        };

        let (body, blocks) = split_protected(main, ctx.topic);
        let mut tail: Vec<&str> = blocks.iter().map(String::as_str).collect();
        tail.push(disclaimer.trim());

        let reserved: usize = tail.iter().map(|part| word_count(part)).sum();
        let budget = self.max_words.saturating_sub(reserved);
        if budget == 0 {
            tracing::debug!("{} protected words fill the {}-word limit", reserved, self.max_words);
        }

        let body = if budget == 0 {
            String::new()
        } else if word_count(&body) > budget {
            format!("{}...", Self::keep_words(&body, budget).trim_end())
        } else {
            body
        };

        let mut parts = Vec::with_capacity(tail.len() + 1);
        if !body.is_empty() {
            parts.push(body.as_str());
        }
        parts.extend(tail);
        parts.join("\n\n")
    }
}
