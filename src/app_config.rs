use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings. Every numeric threshold in
/// here is tunable configuration, not a fixed contract.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Extraction config
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Reconstruction/render config
    #[serde(default)]
    pub render: RenderConfig,

    /// Pipeline config
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    // @backend: OpenAI-compatible chat API
    #[default]
    OpenAI,
    // @backend: Anthropic messages API
    Anthropic,
    // @backend: Offline exact-phrase dictionary
    Glossary,
}

impl BackendKind {
    // @returns: Capitalized backend name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Glossary => "Glossary",
        }
    }

    // @returns: Lowercase backend identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Glossary => "glossary".to_string(),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "glossary" => Ok(Self::Glossary),
            _ => Err(anyhow!("Invalid backend type: {}", s)),
        }
    }
}

/// Backend configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendConfig {
    // @field: Backend type identifier
    #[serde(rename = "type")]
    pub backend_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL (glossary file path for the glossary backend)
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl BackendConfig {
    // @param kind: Backend enum
    // @returns: Backend config with defaults
    pub fn new(kind: BackendKind) -> Self {
        match kind {
            BackendKind::OpenAI => Self {
                backend_type: "openai".to_string(),
                model: default_openai_model(),
                api_key: String::new(),
                endpoint: default_openai_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
            BackendKind::Anthropic => Self {
                backend_type: "anthropic".to_string(),
                model: default_anthropic_model(),
                api_key: String::new(),
                endpoint: default_anthropic_endpoint(),
                timeout_secs: default_anthropic_timeout_secs(),
            },
            BackendKind::Glossary => Self {
                backend_type: "glossary".to_string(),
                model: String::new(),
                api_key: String::new(),
                endpoint: String::new(),
                timeout_secs: default_timeout_secs(),
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Backends to try, in priority order
    #[serde(default = "default_backend_priority")]
    pub backend_priority: Vec<BackendKind>,

    /// Available backend configurations
    #[serde(default)]
    pub available_backends: Vec<BackendConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,

    /// Whether the in-memory cache is enabled
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Optional on-disk cache location; absent disables persistence
    #[serde(default)]
    pub cache_persistence_path: Option<PathBuf>,
}

/// Common translation settings applicable to all backends
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// System prompt template for translation
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Attempts per backend before falling to the next one
    #[serde(default = "default_max_retries_per_backend")]
    pub max_retries_per_backend: u32,

    /// Backoff base for retries (in milliseconds, doubled per attempt)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum in-flight backend requests per page
    #[serde(default = "default_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            max_retries_per_backend: default_max_retries_per_backend(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
            max_concurrent_requests: default_concurrent_requests(),
        }
    }
}

/// Extraction stage configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// Pages below this text-coverage fraction are routed through OCR
    #[serde(default = "default_text_coverage_threshold")]
    pub text_coverage_threshold: f32,

    /// Maximum inter-line gap within a block, as a multiple of font size
    #[serde(default = "default_line_gap_factor")]
    pub line_gap_factor: f32,

    /// Maximum relative font-size difference within a block
    #[serde(default = "default_font_size_tolerance")]
    pub font_size_tolerance: f32,

    /// Maximum horizontal span gap on one line, as a multiple of font size
    #[serde(default = "default_span_gap_factor")]
    pub span_gap_factor: f32,

    /// Minimum fully-empty horizontal gap separating column bands (points)
    #[serde(default = "default_column_gap_min_pt")]
    pub column_gap_min_pt: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            text_coverage_threshold: default_text_coverage_threshold(),
            line_gap_factor: default_line_gap_factor(),
            font_size_tolerance: default_font_size_tolerance(),
            span_gap_factor: default_span_gap_factor(),
            column_gap_min_pt: default_column_gap_min_pt(),
        }
    }
}

/// Reconstruction stage configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RenderConfig {
    /// Permitted height growth of a text box (percent) before font shrink
    #[serde(default = "default_overflow_allowance_pct")]
    pub overflow_allowance_pct: f32,

    /// Font size floor for shrink-to-fit (points)
    #[serde(default = "default_min_font_size_pt")]
    pub min_font_size_pt: f32,

    /// Font shrink step (points)
    #[serde(default = "default_font_shrink_step_pt")]
    pub font_shrink_step_pt: f32,

    /// Line height as a multiple of font size
    #[serde(default = "default_line_height_factor")]
    pub line_height_factor: f32,

    /// Text at or above this multiple of the page's median font size is
    /// emitted as a heading in HTML output
    #[serde(default = "default_heading_size_ratio")]
    pub heading_size_ratio: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            overflow_allowance_pct: default_overflow_allowance_pct(),
            min_font_size_pt: default_min_font_size_pt(),
            font_shrink_step_pt: default_font_shrink_step_pt(),
            line_height_factor: default_line_height_factor(),
            heading_size_ratio: default_heading_size_ratio(),
        }
    }
}

/// Output formats to produce
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// HTML only
    Html,
    /// PDF only
    Pdf,
    /// Both outputs
    #[default]
    Both,
}

impl OutputFormat {
    /// Whether HTML output is requested
    pub fn wants_html(&self) -> bool {
        matches!(self, Self::Html | Self::Both)
    }

    /// Whether PDF output is requested
    pub fn wants_pdf(&self) -> bool {
        matches!(self, Self::Pdf | Self::Both)
    }
}

/// Pipeline coordination configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PipelineConfig {
    /// Page worker pool size; absent means available CPU parallelism
    #[serde(default)]
    pub worker_pool_size: Option<usize>,

    /// Which outputs to produce
    #[serde(default)]
    pub outputs: OutputFormat,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_source_language() -> String {
    "ja".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_anthropic_timeout_secs() -> u64 {
    60
}

fn default_max_retries_per_backend() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_temperature() -> f32 {
    0.3
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_backend_priority() -> Vec<BackendKind> {
    vec![BackendKind::OpenAI, BackendKind::Anthropic, BackendKind::Glossary]
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku".to_string()
}

fn default_system_prompt() -> String {
    "You are a professional translator. Translate the following text from {source_language} to {target_language}. This is magazine copy: keep headings terse, preserve emphasis, and respond with the translated text only.".to_string()
}

fn default_text_coverage_threshold() -> f32 {
    0.05
}

fn default_line_gap_factor() -> f32 {
    0.8
}

fn default_font_size_tolerance() -> f32 {
    0.15
}

fn default_span_gap_factor() -> f32 {
    1.0
}

fn default_column_gap_min_pt() -> f32 {
    18.0
}

fn default_overflow_allowance_pct() -> f32 {
    15.0
}

fn default_min_font_size_pt() -> f32 {
    6.0
}

fn default_font_shrink_step_pt() -> f32 {
    0.5
}

fn default_line_height_factor() -> f32 {
    1.2
}

fn default_heading_size_ratio() -> f32 {
    1.5
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file when it exists, defaults otherwise
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        if self.translation.backend_priority.is_empty() {
            return Err(anyhow!("At least one translation backend must be configured"));
        }

        // Validate API keys for remote backends in the priority list
        for kind in &self.translation.backend_priority {
            match kind {
                BackendKind::OpenAI | BackendKind::Anthropic => {
                    let backend = self.translation.backend_config(kind);
                    if backend.api_key.is_empty() {
                        return Err(anyhow!(
                            "Translation API key is required for the {} backend",
                            kind.display_name()
                        ));
                    }
                }
                BackendKind::Glossary => {}
            }
        }

        if let Some(size) = self.pipeline.worker_pool_size {
            if size == 0 {
                return Err(anyhow!("worker_pool_size must be at least 1"));
            }
        }

        if self.render.font_shrink_step_pt <= 0.0 {
            return Err(anyhow!("font_shrink_step_pt must be positive"));
        }
        if self.render.min_font_size_pt <= 0.0 {
            return Err(anyhow!("min_font_size_pt must be positive"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            extraction: ExtractionConfig::default(),
            render: RenderConfig::default(),
            pipeline: PipelineConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get a backend's configuration from the available_backends array,
    /// falling back to the defaults for its kind
    pub fn backend_config(&self, kind: &BackendKind) -> BackendConfig {
        let kind_str = kind.to_lowercase_string();
        self.available_backends
            .iter()
            .find(|b| b.backend_type == kind_str)
            .cloned()
            .unwrap_or_else(|| BackendConfig::new(*kind))
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        let mut config = Self {
            backend_priority: default_backend_priority(),
            available_backends: Vec::new(),
            common: TranslationCommonConfig::default(),
            cache_enabled: true,
            cache_persistence_path: None,
        };

        // Add default backends
        config.available_backends.push(BackendConfig::new(BackendKind::OpenAI));
        config.available_backends.push(BackendConfig::new(BackendKind::Anthropic));
        config.available_backends.push(BackendConfig::new(BackendKind::Glossary));

        config
    }
}
