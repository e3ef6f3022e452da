//! Legal topic detection.
//!
//! Each topic owns a handful of keyword patterns; a text's score for a topic is
//! the number of its patterns that match. The highest score wins and ties go
//! to the topic listed first in [`Topic::DETECTABLE`].

use crate::rules::keyword_set;
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Employment,
    Tenancy,
    Consumer,
    Family,
    Criminal,
    Debt,
    Privacy,
    Property,
    Default,
}

impl Topic {
    /// Scoring order; earlier topics win ties.
    pub const DETECTABLE: [Topic; 8] = [
        Topic::Employment,
        Topic::Tenancy,
        Topic::Consumer,
        Topic::Family,
        Topic::Criminal,
        Topic::Debt,
        Topic::Privacy,
        Topic::Property,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Employment => "employment",
            Topic::Tenancy => "tenancy",
            Topic::Consumer => "consumer",
            Topic::Family => "family",
            Topic::Criminal => "criminal",
            Topic::Debt => "debt",
            Topic::Privacy => "privacy",
            Topic::Property => "property",
            Topic::Default => "default",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::DETECTABLE
            .iter()
            .chain(std::iter::once(&Topic::Default))
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
    }

    /// Forum a dispute on this topic should be taken to.
    pub fn escalation_path(&self) -> &'static str {
        match self {
            Topic::Employment => "Labour Commissioner, Industrial Tribunal, or Labour Court",
            Topic::Tenancy => "Rent Controller, Rent Tribunal, or Civil Court",
            Topic::Consumer => "Consumer Forum or Consumer Disputes Redressal Commission",
            Topic::Family => "Family Court or Mediation Center",
            Topic::Criminal => "Police Station (FIR), Magistrate Court",
            Topic::Debt => "Civil Court (money suit), legal notice, or mediation",
            Topic::Property => "Civil Court, Revenue Court, or Tehsildar office",
            Topic::Privacy => "Cyber Cell (if criminal), or Civil Court for injunction",
            Topic::Default => "appropriate legal forum or Civil Court",
        }
    }

    fn patterns(&self) -> &'static [&'static str] {
        match self {
            Topic::Employment => &[
                r"\b(?:employ|job|salary|wages|termination|fired|dismissal|workplace|labour|labor|worker|workman)\b",
                r"\b(?:HR|employer|employee|contract\s+(?:job|work)|permanent|probation)\b",
            ],
            Topic::Tenancy => &[
                r"\b(?:tenant|landlord|rent|lease|eviction|tenancy|rental|paying\s+guest|PG)\b",
                r"\b(?:flat|apartment|house|property).*(?:rent|lease|owner)\b",
            ],
            Topic::Consumer => &[
                r"\b(?:product|service|defective|refund|warranty|consumer|purchase|bought|seller)\b",
                r"\b(?:online\s+(?:order|shopping)|e-commerce|delivery)\b",
            ],
            Topic::Family => &[
                r"\b(?:divorce|marriage|custody|alimony|maintenance|domestic|spouse|husband|wife)\b",
                r"\b(?:child\s+support|matrimonial|dowry|DV|domestic\s+violence)\b",
            ],
            Topic::Criminal => &[
                r"\b(?:FIR|arrested|bail|crime|criminal|theft|assault|murder)\b",
                r"\b(?:forgery|defamation|cyber\s*crime)\b",
            ],
            Topic::Debt => &[
                r"\b(?:debt|owe[sd]?|loan|repay|recover\s+money)\b",
                r"\b(?:money\s+(?:lent|borrowed|due)|(?:lent|borrowed|lend)\s+money)\b",
                r"\b(?:not\s+(?:paying|returning|repaying)|cheque\s+bounce|dishonour)\b",
                r"\b(?:gave\s+(?:money|loan)|took\s+(?:money|loan)|won'?t\s+(?:pay|return))\b",
            ],
            Topic::Privacy => &[
                r"\b(?:privacy|surveillance|spy|spying|recording|camera|tracking|hack)\b",
                r"\b(?:phone\s+tap|monitor|digital|screenshot|chat|message)\b",
            ],
            Topic::Property => &[
                r"\b(?:property|land|plot|real\s+estate|registration|mutation|inheritance)\b",
                r"\b(?:will|succession|partition|boundary|encroachment)\b",
            ],
            Topic::Default => &[],
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static TOPIC_SETS: LazyLock<Vec<(Topic, RegexSet)>> = LazyLock::new(|| {
    Topic::DETECTABLE
        .iter()
        .map(|topic| {
            let set = keyword_set(topic.patterns()).expect("topic pattern table");
            (*topic, set)
        })
        .collect()
});

/// Score every topic against `text` and return the winner.
pub fn detect_topic_in(text: &str) -> Topic {
    let mut best = Topic::Default;
    let mut best_score = 0;

    for (topic, set) in TOPIC_SETS.iter() {
        let score = set.matches(text).iter().count();
        // strict > keeps the earlier topic on ties
        if score > best_score {
            best = *topic;
            best_score = score;
        }
    }

    best
}

/// Detect the dominant topic, letting the query override the answer text.
///
/// When the query alone identifies a topic that topic is used, so wording in
/// the model's answer (such as "FIR" in bad advice) cannot change it.
pub fn detect_topic(text: &str, query: &str) -> Topic {
    if !query.trim().is_empty() {
        let from_query = detect_topic_in(query);
        if from_query != Topic::Default {
            return from_query;
        }
    }
    detect_topic_in(text)
}
