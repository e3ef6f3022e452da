//! Configuration management for Nyaya.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.nyaya/config.yaml` or `NYAYA_CONFIG`)
//! - Environment variables (secrets and endpoints)
//! - Command-line flags
//!
//! Later sources override earlier ones.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .nyaya/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Retrieval and context settings
    pub retrieval: RetrievalSettings,

    /// Embedding collaborator settings
    pub embedding: EmbeddingSettings,

    /// Answer generation settings
    pub llm: LlmSettings,

    /// Web search fallback settings
    pub web_search: WebSearchSettings,

    /// Response safety settings
    pub safety: SafetySettings,

    /// Optional YAML prompt definition
    pub prompt_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON
    pub log_json: bool,
}

/// Retrieval, relevance and context budget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalSettings {
    pub top_k: usize,
    /// Best semantic distance must be strictly below this to trust local results
    pub relevance_threshold: f32,
    pub max_context_length: usize,
    pub web_snippet_chars: usize,
    pub retrieval_timeout_secs: u64,
    /// Index directory, relative to the workspace unless absolute
    pub index_dir: PathBuf,
    pub table: String,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 10,
            relevance_threshold: 0.5,
            max_context_length: 4000,
            web_snippet_chars: 800,
            retrieval_timeout_secs: 15,
            index_dir: PathBuf::from(".nyaya/index"),
            table: "indian_law_collection".to_string(),
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// "mock" or "ollama"
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub endpoint: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
    /// "local", "cloud" or "multiprovider"
    pub provider: String,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub connect_retries: u32,
    pub retry_backoff_ms: u64,
    pub local: LocalProviderSettings,
    pub cloud: CloudProviderSettings,
    pub multiprovider: MultiproviderSettings,
    /// Secondary generator used only for web-grounded answers
    pub web_answer_provider: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            model: None,
            max_tokens: 512,
            temperature: 0.7,
            timeout_secs: 120,
            connect_retries: 2,
            retry_backoff_ms: 2000,
            local: LocalProviderSettings::default(),
            cloud: CloudProviderSettings::default(),
            multiprovider: MultiproviderSettings::default(),
            web_answer_provider: None,
        }
    }
}

impl LlmSettings {
    /// Model used by the active provider.
    pub fn active_model(&self) -> String {
        self.model_for(&self.provider)
    }

    /// Model used by a given provider kind, honoring the global override.
    pub fn model_for(&self, provider: &str) -> String {
        if let Some(ref model) = self.model {
            if provider == self.provider {
                return model.clone();
            }
        }
        match provider {
            "cloud" => self.cloud.model.clone(),
            // Empty means the upstream's default model
            "multiprovider" => self.multiprovider.model.clone().unwrap_or_default(),
            _ => self.local.model.clone(),
        }
    }
}

/// Local daemon (Ollama) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalProviderSettings {
    pub endpoint: String,
    pub model: String,
}

impl Default for LocalProviderSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2:1b".to_string(),
        }
    }
}

/// Cloud API (Gemini) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CloudProviderSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for CloudProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            max_output_tokens: 2048,
            timeout_secs: 60,
        }
    }
}

/// Multi-provider middleware settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MultiproviderSettings {
    pub url: String,
    pub secret: Option<String>,
    /// Upstream provider routed by the middleware: openai, google, cerebras, groq
    pub upstream: String,
    pub model: Option<String>,
    pub use_socket: bool,
    pub connect_timeout_secs: u64,
}

impl Default for MultiproviderSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
            secret: None,
            upstream: "groq".to_string(),
            model: None,
            use_socket: true,
            connect_timeout_secs: 10,
        }
    }
}

/// Web search (Tavily) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebSearchSettings {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub search_depth: String,
    pub max_results: usize,
    pub timeout_secs: u64,
    pub include_domains: Vec<String>,
}

impl Default for WebSearchSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.tavily.com/search".to_string(),
            search_depth: "basic".to_string(),
            max_results: 5,
            timeout_secs: 30,
            include_domains: [
                "indiankanoon.org",
                "legislative.gov.in",
                "indiacode.nic.in",
                "lawmin.gov.in",
                "sci.gov.in",
                "lawrato.com",
                "livelaw.in",
                "barandbench.com",
            ]
            .iter()
            .map(|d| d.to_string())
            .collect(),
        }
    }
}

impl WebSearchSettings {
    /// Web search is enabled only when an API key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Response safety pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SafetySettings {
    pub max_words: usize,
    /// Topics whose disputes are civil; police/FIR advice is rewritten for these
    pub civil_only_topics: Vec<String>,
    pub case_citation_cap: usize,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            max_words: 280,
            civil_only_topics: vec!["debt".to_string()],
            case_citation_cap: 80,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    retrieval: Option<RetrievalSettings>,
    embedding: Option<EmbeddingSettings>,
    llm: Option<LlmSettings>,
    web_search: Option<WebSearchSettings>,
    safety: Option<SafetySettings>,
    prompt_file: Option<PathBuf>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

/// Known generation providers.
pub const KNOWN_PROVIDERS: [&str; 3] = ["local", "cloud", "multiprovider"];

/// Upstream providers the multi-provider middleware can route to.
pub const MIDDLEWARE_UPSTREAMS: [&str; 4] = ["openai", "google", "cerebras", "groq"];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            retrieval: RetrievalSettings::default(),
            embedding: EmbeddingSettings::default(),
            llm: LlmSettings::default(),
            web_search: WebSearchSettings::default(),
            safety: SafetySettings::default(),
            prompt_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and environment variables.
    ///
    /// Environment variables:
    /// - `NYAYA_WORKSPACE`: Override workspace path
    /// - `NYAYA_CONFIG`: Path to config file
    /// - `NYAYA_LLM_PROVIDER`: local, cloud or multiprovider
    /// - `NYAYA_MODEL`: Model identifier for the active provider
    /// - `OLLAMA_BASE_URL`: Local daemon endpoint
    /// - `GEMINI_API_KEY`: Cloud API key
    /// - `LLM_MIDDLEWARE_URL` / `LLM_MIDDLEWARE_SECRET`: Middleware endpoint and secret
    /// - `TAVILY_API_KEY`: Web search key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use nyaya_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("NYAYA_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("NYAYA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.workspace.join(".nyaya/config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        config.apply_env();
        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }
        if let Some(web_search) = config_file.web_search {
            result.web_search = web_search;
        }
        if let Some(safety) = config_file.safety {
            result.safety = safety;
        }
        if config_file.prompt_file.is_some() {
            result.prompt_file = config_file.prompt_file;
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Environment variables override YAML values. Secrets only come from here
    /// unless the file sets them explicitly.
    fn apply_env(&mut self) {
        if let Ok(provider) = std::env::var("NYAYA_LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Ok(model) = std::env::var("NYAYA_MODEL") {
            self.llm.model = Some(model);
        }
        if let Ok(endpoint) = std::env::var("OLLAMA_BASE_URL") {
            self.llm.local.endpoint = endpoint;
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.llm.cloud.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("LLM_MIDDLEWARE_URL") {
            self.llm.multiprovider.url = url;
        }
        if let Ok(secret) = std::env::var("LLM_MIDDLEWARE_SECRET") {
            self.llm.multiprovider.secret = Some(secret);
        }
        if let Ok(key) = std::env::var("TAVILY_API_KEY") {
            self.web_search.api_key = Some(key);
        }
        if self.log_level.is_none() {
            self.log_level = std::env::var("RUST_LOG").ok();
        }
        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = Some(model);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .nyaya directory.
    pub fn nyaya_dir(&self) -> PathBuf {
        self.workspace.join(".nyaya")
    }

    /// Resolved vector index directory.
    pub fn index_path(&self) -> PathBuf {
        if self.retrieval.index_dir.is_absolute() {
            self.retrieval.index_dir.clone()
        } else {
            self.workspace.join(&self.retrieval.index_dir)
        }
    }

    /// Resolved prompt definition path, if any.
    pub fn prompt_path(&self) -> Option<PathBuf> {
        self.prompt_file.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                self.workspace.join(p)
            }
        })
    }

    /// Ensure the .nyaya directory exists.
    pub fn ensure_nyaya_dir(&self) -> AppResult<()> {
        let dir = self.nyaya_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .nyaya directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        validate_provider(&self.llm, &self.llm.provider)?;

        if let Some(ref web_provider) = self.llm.web_answer_provider {
            validate_provider(&self.llm, web_provider)?;
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("retrieval.topK must be at least 1".to_string()));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_provider(llm: &LlmSettings, provider: &str) -> AppResult<()> {
    if !KNOWN_PROVIDERS.contains(&provider) {
        return Err(AppError::Config(format!(
            "Unknown provider: {}. Supported: {}",
            provider,
            KNOWN_PROVIDERS.join(", ")
        )));
    }

    match provider {
        "cloud" => {
            if llm.cloud.api_key.as_deref().map_or(true, str::is_empty) {
                return Err(AppError::Config(
                    "Cloud provider requires GEMINI_API_KEY".to_string(),
                ));
            }
        }
        "multiprovider" => {
            if llm.multiprovider.secret.as_deref().map_or(true, str::is_empty) {
                return Err(AppError::Config(
                    "Multiprovider requires LLM_MIDDLEWARE_SECRET".to_string(),
                ));
            }
            if !MIDDLEWARE_UPSTREAMS.contains(&llm.multiprovider.upstream.as_str()) {
                return Err(AppError::Config(format!(
                    "Unknown middleware upstream: {}. Supported: {}",
                    llm.multiprovider.upstream,
                    MIDDLEWARE_UPSTREAMS.join(", ")
                )));
            }
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "local");
        assert_eq!(config.llm.active_model(), "llama3.2:1b");
        assert_eq!(config.retrieval.top_k, 10);
        assert_eq!(config.retrieval.max_context_length, 4000);
        assert_eq!(config.safety.max_words, 280);
        assert_eq!(config.safety.civil_only_topics, vec!["debt".to_string()]);
        assert_eq!(config.web_search.include_domains.len(), 8);
        assert!(!config.verbose);
    }

    #[test]
    fn test_nyaya_dir_and_index_path() {
        let config = AppConfig::default();
        assert!(config.nyaya_dir().ends_with(".nyaya"));
        assert!(config.index_path().ends_with(".nyaya/index"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("cloud".to_string()),
            Some("gemini-1.5-pro".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.llm.provider, "cloud");
        assert_eq!(overridden.llm.active_model(), "gemini-1.5-pro");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
retrieval:
  topK: 5
  relevanceThreshold: 0.35
llm:
  provider: multiprovider
  multiprovider:
    url: http://middleware:3000
    secret: s3cret
    upstream: openai
safety:
  civilOnlyTopics: [debt, property]
logging:
  level: debug
  json: true
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.retrieval.top_k, 5);
        assert!((merged.retrieval.relevance_threshold - 0.35).abs() < f32::EPSILON);
        assert_eq!(merged.retrieval.max_context_length, 4000);
        assert_eq!(merged.llm.provider, "multiprovider");
        assert_eq!(merged.llm.multiprovider.upstream, "openai");
        assert_eq!(merged.llm.max_tokens, 512);
        assert_eq!(merged.safety.civil_only_topics.len(), 2);
        assert_eq!(merged.log_level.as_deref(), Some("debug"));
        assert!(merged.log_json);
        assert!(merged.validate().is_ok());
    }

    #[test]
    fn test_merge_yaml_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "retrieval: [not, a, map").unwrap();
        assert!(matches!(
            AppConfig::default().merge_yaml(&path),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.llm.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_cloud_requires_key() {
        let mut config = AppConfig::default();
        config.llm.provider = "cloud".to_string();
        assert!(config.validate().is_err());

        config.llm.cloud.api_key = Some("key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_local() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_web_search_configured_only_with_key() {
        let mut settings = WebSearchSettings::default();
        assert!(!settings.is_configured());
        settings.api_key = Some("  ".to_string());
        assert!(!settings.is_configured());
        settings.api_key = Some("tvly-key".to_string());
        assert!(settings.is_configured());
    }
}
