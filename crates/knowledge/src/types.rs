//! Core types for retrieval and answering.

use nyaya_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Statute families the index knows how to look up by section number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActType {
    Ipc,
    Crpc,
    Cpc,
    Evidence,
}

impl ActType {
    pub const ALL: [ActType; 4] = [ActType::Ipc, ActType::Crpc, ActType::Cpc, ActType::Evidence];

    /// Code stored in the `type` metadata field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActType::Ipc => "ipc",
            ActType::Crpc => "crpc",
            ActType::Cpc => "cpc",
            ActType::Evidence => "evidence",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ipc" => Some(ActType::Ipc),
            "crpc" => Some(ActType::Crpc),
            "cpc" => Some(ActType::Cpc),
            "evidence" => Some(ActType::Evidence),
            _ => None,
        }
    }

    /// Short label used in citations and document text ("CrPC Section 41").
    pub fn abbreviation(&self) -> &'static str {
        match self {
            ActType::Ipc => "IPC",
            ActType::Crpc => "CrPC",
            ActType::Cpc => "CPC",
            ActType::Evidence => "Evidence Act",
        }
    }

    /// Full statute name with enactment year.
    pub fn long_name(&self) -> &'static str {
        match self {
            ActType::Ipc => "Indian Penal Code, 1860",
            ActType::Crpc => "Code of Criminal Procedure, 1973",
            ActType::Cpc => "Code of Civil Procedure, 1908",
            ActType::Evidence => "Indian Evidence Act, 1872",
        }
    }

    /// Header used when rendering a document into the prompt context.
    pub fn context_label(&self) -> &'static str {
        match self {
            ActType::Ipc => "Indian Penal Code (IPC)",
            ActType::Crpc => "Code of Criminal Procedure (CrPC)",
            ActType::Cpc => "Code of Civil Procedure (CPC)",
            ActType::Evidence => "Indian Evidence Act",
        }
    }

    /// Keyword bag prepended to section queries to bias embedding recall.
    pub fn expansion_keywords(&self) -> &'static str {
        match self {
            ActType::Ipc => "Indian Penal Code IPC offense crime punishment penalty",
            ActType::Crpc => "Code of Criminal Procedure CrPC criminal procedure bail arrest",
            ActType::Cpc => "Code of Civil Procedure CPC civil procedure suit decree",
            ActType::Evidence => "Indian Evidence Act evidence witness proof testimony",
        }
    }
}

impl fmt::Display for ActType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A specific section the user asked about, e.g. IPC 420.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionReference {
    pub number: String,
    pub act: ActType,
}

impl SectionReference {
    pub fn new(number: impl Into<String>, act: ActType) -> Self {
        Self {
            number: number.into(),
            act,
        }
    }

    /// True when `metadata` describes this exact section.
    pub fn matches(&self, metadata: &DocumentMetadata) -> bool {
        metadata.doc_type == self.act.as_str() && metadata.section_number == self.number
    }
}

/// Typed metadata attached to every indexed document.
///
/// `type` and `section_number` are required; everything else the indexer
/// writes (title, source, url, chunk position) lives in the open `extra` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(rename = "type")]
    pub doc_type: String,

    pub section_number: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl DocumentMetadata {
    pub fn new(doc_type: impl Into<String>, section_number: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            section_number: section_number.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Builder-style insert into the extension map.
    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Validate a loosely-typed map coming back from the index.
    ///
    /// Falls back to `section` when `section_number` is absent. Numbers are
    /// accepted and stringified.
    pub fn from_map(mut map: BTreeMap<String, serde_json::Value>) -> AppResult<Self> {
        let doc_type = take_scalar(&mut map, "type").ok_or_else(|| {
            AppError::Retrieval("document metadata is missing 'type'".to_string())
        })?;

        let section_number = take_scalar(&mut map, "section_number")
            .or_else(|| take_scalar(&mut map, "section"))
            .ok_or_else(|| {
                AppError::Retrieval(format!(
                    "document metadata for '{}' is missing 'section_number'",
                    doc_type
                ))
            })?;

        Ok(Self {
            doc_type,
            section_number,
            extra: map,
        })
    }

    /// Parse the JSON object stored alongside an index row.
    pub fn from_json(json: &str) -> AppResult<Self> {
        let map: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
        Self::from_map(map)
    }

    /// Deduplication identity: `{type}_{section_number}`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.doc_type, self.section_number)
    }

    pub fn act(&self) -> Option<ActType> {
        ActType::parse(&self.doc_type)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn section_title(&self) -> Option<&str> {
        self.get_str("section_title")
    }

    pub fn source(&self) -> Option<&str> {
        self.get_str("source")
    }

    pub fn url(&self) -> Option<&str> {
        self.get_str("url")
    }

    pub fn chunk_index(&self) -> u64 {
        self.extra
            .get("chunk_index")
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    }
}

fn take_scalar(map: &mut BTreeMap<String, serde_json::Value>, key: &str) -> Option<String> {
    let value = map.remove(key)?;
    let text = match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// A candidate returned by the hybrid retriever.
///
/// A distance of exactly `0.0` marks a structured exact match rather than a
/// measured similarity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedDocument {
    pub content: String,
    pub metadata: DocumentMetadata,
    pub distance: f32,
}

impl RetrievedDocument {
    pub const EXACT_MATCH_DISTANCE: f32 = 0.0;

    pub fn new(content: impl Into<String>, metadata: DocumentMetadata, distance: f32) -> Self {
        Self {
            content: content.into(),
            metadata,
            distance,
        }
    }

    pub fn exact(content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self::new(content, metadata, Self::EXACT_MATCH_DISTANCE)
    }

    pub fn is_exact(&self) -> bool {
        self.distance == Self::EXACT_MATCH_DISTANCE
    }

    pub fn key(&self) -> String {
        self.metadata.key()
    }
}

/// One hit from the web-search collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f32,
}
