//! Declarative rewrite rules and the step abstraction the pipeline runs.
//!
//! Rule tables are ordered `(pattern, replacement)` pairs compiled once into a
//! [`RuleSet`]. Keyword predicates are compiled into a [`RegexSet`] so a single
//! scan answers both "does anything match" and "how many patterns match".

use crate::topic::Topic;
use regex::{NoExpand, Regex, RegexBuilder, RegexSet, RegexSetBuilder};
use std::borrow::Cow;

/// One regex substitution.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: String,
}

impl RewriteRule {
    pub fn new(pattern: &str, replacement: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Self {
            pattern,
            replacement: replacement.to_string(),
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Replace every match; the replacement is literal text.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern.replace_all(text, NoExpand(&self.replacement))
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Ordered rewrite table; each rule sees the output of the one before it.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    pub fn from_table(table: &[(&str, &str)], case_insensitive: bool) -> Result<Self, regex::Error> {
        let rules = table
            .iter()
            .map(|(pattern, replacement)| RewriteRule::new(pattern, replacement, case_insensitive))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        for rule in &self.rules {
            let next = match rule.apply(&out) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(replaced) => replaced,
            };
            out = next;
        }
        out
    }

    /// Patterns that still match `text`.
    pub fn matching(&self, text: &str) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|rule| rule.is_match(text))
            .map(RewriteRule::pattern)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Case-insensitive keyword predicate set.
pub fn keyword_set(patterns: &[&str]) -> Result<RegexSet, regex::Error> {
    RegexSetBuilder::new(patterns).case_insensitive(true).build()
}

/// Per-answer facts every step may consult.
#[derive(Debug, Clone)]
pub struct StepContext {
    /// The user's question
    pub query: String,
    /// Query and raw answer joined by a space
    pub combined: String,
    /// Dominant topic, query first
    pub topic: Topic,
}

impl StepContext {
    pub fn new(query: &str, raw_answer: &str) -> Self {
        let combined = format!("{} {}", query, raw_answer);
        let topic = crate::topic::detect_topic(&combined, query);
        Self {
            query: query.to_string(),
            combined,
            topic,
        }
    }
}

/// One text transform in the safety pipeline.
///
/// Implementations must be idempotent for a fixed context:
/// `apply(apply(x)) == apply(x)`.
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the step runs at all for this answer.
    fn applies(&self, _ctx: &StepContext) -> bool {
        true
    }

    fn apply(&self, text: &str, ctx: &StepContext) -> String;
}

/// Insert `block` before the first `**Disclaimer`, else before the last `---`,
/// else append it.
pub(crate) fn insert_before_disclaimer(text: &str, block: &str, separator_suffix: &str) -> String {
    if text.contains("**Disclaimer") {
        text.replacen("**Disclaimer", &format!("{}\n**Disclaimer", block), 1)
    } else if let Some(pos) = text.rfind("---") {
        format!("{}{}{}{}", &text[..pos], block, separator_suffix, &text[pos..])
    } else {
        format!("{}{}", text, block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_apply_in_order() {
        let rules = RuleSet::from_table(&[("cat", "dog"), ("dog", "wolf")], false).unwrap();
        assert_eq!(rules.apply("cat"), "wolf");
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_replacement_is_literal() {
        let rules = RuleSet::from_table(&[("fee", "$1 fine")], false).unwrap();
        assert_eq!(rules.apply("fee"), "$1 fine");
    }

    #[test]
    fn test_matching_reports_patterns() {
        let rules = RuleSet::from_table(&[("alpha", "a"), ("beta", "b")], true).unwrap();
        assert_eq!(rules.matching("BETA only"), vec!["beta"]);
    }

    #[test]
    fn test_keyword_set_counts_patterns() {
        let set = keyword_set(&[r"\bloan\b", r"\bdebt\b", r"\bbail\b"]).unwrap();
        assert_eq!(set.matches("Loan and DEBT").iter().count(), 2);
    }

    #[test]
    fn test_insert_before_disclaimer() {
        let with_marker = insert_before_disclaimer("body\n**Disclaimer:** x", "\nNOTE\n", "");
        assert_eq!(with_marker, "body\n\nNOTE\n\n**Disclaimer:** x");

        let with_rule = insert_before_disclaimer("body\n---\nend", "NOTE\n", "\n");
        assert_eq!(with_rule, "body\nNOTE\n\n---\nend");

        assert_eq!(insert_before_disclaimer("body", "\nNOTE", ""), "body\nNOTE");
    }
}
