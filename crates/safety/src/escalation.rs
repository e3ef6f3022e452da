//! Escalation-path correction.
//!
//! Fixes known-wrong forum suggestions and, for civil-only topics, rewrites
//! any advice to involve the police into a civil remedy.

use crate::rules::{RewriteRule, RuleSet, Step, StepContext};
use crate::topic::Topic;
use regex::{NoExpand, Regex};
use std::sync::LazyLock;

const LABOUR_FORUM: &str = "Labour Commissioner, Industrial Tribunal, or Labour Court";
const RENT_FORUM: &str = "Rent Controller, Rent Tribunal, or Civil Court";

const FORUM_FIXES: &[(&str, &str)] = &[
    (
        r"[Cc]onsumer [Ff]orum.*(?:employ|labour|labor|salary|termination|workplace|job|dismissal)",
        LABOUR_FORUM,
    ),
    (
        r"(?:employ|labour|labor|salary|termination|workplace|job|dismissal).*[Cc]onsumer [Ff]orum",
        LABOUR_FORUM,
    ),
    (
        r"[Cc]onsumer [Ff]orum.*(?:tenant|landlord|rent|tenancy|eviction|lease)",
        RENT_FORUM,
    ),
    (
        r"(?:tenant|landlord|rent|tenancy|eviction|lease).*[Cc]onsumer [Ff]orum",
        RENT_FORUM,
    ),
];

/// Most specific first.
const POLICE_TABLE: &[(&str, &str)] = &[
    (
        r"[Ff]ile\s+(?:an?\s+)?FIR\s+at\s+(?:the\s+)?police\s+station",
        "pursue civil remedies through Civil Court, legal notice, or mediation",
    ),
    (
        r"[Ll]odge\s+(?:an?\s+)?FIR\s+(?:at|with)\s+(?:the\s+)?police",
        "file a civil suit or send a legal notice",
    ),
    (
        r"[Tt]he\s+police\s+(?:will|can)\s+help(?:\s+you)?(?:\s+recover)?(?:\s+the\s+money)?",
        "Civil courts can help through a money suit to recover the amount",
    ),
    (
        r"[Pp]olice\s+(?:will|can)\s+(?:help|assist|recover)(?:\s+the\s+money)?",
        "Civil remedies through courts can help",
    ),
    (r"[Ff]ile\s+(?:an?\s+)?FIR", "send a legal notice or file a civil suit"),
    (r"[Ll]odge\s+(?:an?\s+)?FIR", "send a legal notice"),
    (
        r"[Aa]pproach\s+(?:the\s+)?police",
        "approach Civil Court, legal notice, or mediation",
    ),
    (
        r"[Gg]o\s+to\s+(?:the\s+)?police",
        "go to Civil Court, legal notice, or mediation",
    ),
    (
        r"[Cc]ontact\s+(?:the\s+)?police",
        "send a legal notice or approach Civil Court, legal notice, or mediation",
    ),
    (r"[Rr]eport\s+to\s+(?:the\s+)?police", "pursue civil remedies"),
    (r"[Pp]olice\s+complaint", "legal notice or civil suit"),
    (r"(?:at\s+)?(?:the\s+)?[Pp]olice\s+station", "through civil courts"),
    // anything the phrasings above missed
    (r"\b(?:an?\s+)?FIR\b", "a legal notice"),
    (r"\b(?:the\s+)?police\b", "the civil court"),
];

const DEBT_NOTE: &str = "\n\n**Important:** Non-payment of debt is generally a civil matter, not a criminal offense. Unpaid private debts are recovered through civil courts or a legal notice, not through a criminal complaint.";

const CIVIL_REMEDY: &str = "is generally a civil matter, not a criminal offense. It is resolved through a legal notice, a civil suit or mediation, not through a criminal complaint.";

/// Note added when police advice is rewritten for a civil-only topic.
pub fn civil_note(topic: Topic) -> String {
    match topic {
        Topic::Debt => DEBT_NOTE.to_string(),
        Topic::Default => format!("\n\n**Important:** A dispute like this {}", CIVIL_REMEDY),
        other => format!("\n\n**Important:** A {} dispute like this {}", other, CIVIL_REMEDY),
    }
}

static FORUM_RULES: LazyLock<RuleSet> =
    LazyLock::new(|| RuleSet::from_table(FORUM_FIXES, true).expect("forum fix regex"));

static CONSUMER_FORUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[Cc]onsumer\s+[Ff]orum(?:\s+or\s+[Cc]onsumer\s+[Cc]ommission)?")
        .expect("consumer forum regex")
});

static POLICE_RULES: LazyLock<RuleSet> =
    LazyLock::new(|| RuleSet::from_table(POLICE_TABLE, true).expect("police rewrite regex"));

static POLICE_MENTION: LazyLock<RewriteRule> = LazyLock::new(|| {
    RewriteRule::new(r"\bpolice\b|\bFIR\b", "", true).expect("police mention regex")
});

/// Corrects the forum an answer sends the user to.
pub struct EscalationCorrection {
    civil_only: Vec<Topic>,
}

impl EscalationCorrection {
    pub fn new(civil_only: Vec<Topic>) -> Self {
        Self { civil_only }
    }

    fn is_civil_only(&self, topic: Topic) -> bool {
        self.civil_only.contains(&topic)
    }

    fn fix_wrong_forum(&self, text: &str, topic: Topic) -> String {
        let mut fixed = FORUM_RULES.apply(text);

        if matches!(topic, Topic::Employment | Topic::Tenancy) && CONSUMER_FORUM.is_match(&fixed) {
            fixed = CONSUMER_FORUM
                .replace_all(&fixed, NoExpand(topic.escalation_path()))
                .into_owned();
        }

        fixed
    }

    fn block_police(&self, text: &str, topic: Topic) -> String {
        if !self.is_civil_only(topic) {
            return text.to_string();
        }

        let mut fixed = POLICE_RULES.apply(text);
        let note = civil_note(topic);

        if POLICE_MENTION.is_match(text) && !fixed.contains(note.trim_start()) {
            tracing::debug!("Rewrote police advice for civil topic '{}'", topic);
            fixed = if fixed.contains("**Disclaimer") {
                fixed.replacen("**Disclaimer", &format!("{}\n\n**Disclaimer", note), 1)
            } else {
                format!("{}{}", fixed.trim_end(), note)
            };
        }

        fixed
    }
}

impl Step for EscalationCorrection {
    fn name(&self) -> &'static str {
        "escalation_correction"
    }

    fn apply(&self, text: &str, ctx: &StepContext) -> String {
        let fixed = self.fix_wrong_forum(text, ctx.topic);
        self.block_police(&fixed, ctx.topic)
    }
}
