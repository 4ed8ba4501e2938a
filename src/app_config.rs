use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

use crate::file_utils::FileManager;
use crate::skeleton::merger::is_utf8_label;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Locale of the native documents being imported
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Locale rendered on export
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Import settings
    #[serde(default)]
    pub import: ImportConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// How new TU ids are generated
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TuIdStyle {
    // @style: tu1, tu2, ... shared across the streams of one document
    #[default]
    Sequential,
    // @style: Random v4 UUIDs
    Uuid,
}

/// Host-format escaping applied to rendered segment text
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputEscaping {
    #[default]
    None,
    // @escaping: " becomes "" (CSV-like hosts)
    QuoteDoubling,
    // @escaping: non-ASCII becomes \uXXXX (properties-like hosts)
    UnicodeEscape,
}

impl std::fmt::Display for OutputEscaping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::QuoteDoubling => "quote_doubling",
            Self::UnicodeEscape => "unicode_escape",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for OutputEscaping {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "none" => Ok(Self::None),
            "quote_doubling" => Ok(Self::QuoteDoubling),
            "unicode_escape" => Ok(Self::UnicodeEscape),
            _ => Err(anyhow!("Invalid output escaping: {}", s)),
        }
    }
}

/// Import settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImportConfig {
    /// Elements whose text content becomes a translatable segment
    #[serde(default = "default_translatable_elements")]
    pub translatable_elements: Vec<String>,

    /// Elements kept inside a segment as inline references
    #[serde(default = "default_inline_elements")]
    pub inline_elements: Vec<String>,

    /// Elements whose end receives a wildcard placeholder
    #[serde(default = "default_container_elements")]
    pub container_elements: Vec<String>,

    /// Opening exclude marker
    #[serde(default = "default_exclude_open")]
    pub exclude_open: String,

    /// Closing exclude marker
    #[serde(default = "default_exclude_close")]
    pub exclude_close: String,

    /// How many TU placeholders may nest
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// TU id generation
    #[serde(default)]
    pub tu_id_style: TuIdStyle,

    /// Skeleton encoding
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Treat merge warnings as failures
    #[serde(default)]
    pub strict: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            translatable_elements: default_translatable_elements(),
            inline_elements: default_inline_elements(),
            container_elements: default_container_elements(),
            exclude_open: default_exclude_open(),
            exclude_close: default_exclude_close(),
            max_depth: default_max_depth(),
            tu_id_style: TuIdStyle::default(),
            encoding: default_encoding(),
            strict: false,
        }
    }
}

/// Export settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExportConfig {
    /// Phase to render; absent means the first target for the locale
    #[serde(default)]
    pub phase: Option<String>,

    /// Highest numbered phase considered by fallback
    #[serde(default)]
    pub max_phase: u32,

    /// Escape bare ampersands in resolved texts
    #[serde(default = "default_true")]
    pub escape_ampersands: bool,

    /// Render the source text for units with no target
    #[serde(default)]
    pub fallback_to_source: bool,

    /// Host-format escaping of segment text
    #[serde(default)]
    pub output_escaping: OutputEscaping,

    /// Expansion of wildcard placeholders, with {id}, {lang} and {text} slots
    #[serde(default)]
    pub wildcard_template: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            phase: None,
            max_phase: 0,
            escape_ampersands: true,
            fallback_to_source: false,
            output_escaping: OutputEscaping::default(),
            wildcard_template: None,
        }
    }
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

impl LogLevel {
    // @returns: Matching log crate filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "fr".to_string()
}

fn default_translatable_elements() -> Vec<String> {
    ["p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "td", "th", "title", "caption", "source", "target"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_inline_elements() -> Vec<String> {
    ["b", "i", "u", "em", "strong", "span", "a", "br", "sup", "sub", "code"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_container_elements() -> Vec<String> {
    vec!["trans-unit".to_string()]
}

fn default_exclude_open() -> String {
    "<xliff-exclude>".to_string()
}

fn default_exclude_close() -> String {
    "</xliff-exclude>".to_string()
}

fn default_max_depth() -> usize {
    1
}

fn default_encoding() -> String {
    "UTF-8".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = FileManager::read_to_string(&path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Load configuration, writing defaults first when the file is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if FileManager::file_exists(&path) {
            return Self::from_file(path);
        }
        let config = Self::default();
        config.save(&path)?;
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        FileManager::write_to_file(path, &content)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_locale(&self.source_language)
            .with_context(|| format!("Invalid source language: {}", self.source_language))?;
        crate::language_utils::validate_locale(&self.target_language)
            .with_context(|| format!("Invalid target language: {}", self.target_language))?;

        if self.import.max_depth == 0 {
            return Err(anyhow!("import.max_depth must be at least 1"));
        }

        if !is_utf8_label(&self.import.encoding) {
            return Err(anyhow!("Unsupported skeleton encoding: {}", self.import.encoding));
        }

        if self.import.exclude_open.is_empty() != self.import.exclude_close.is_empty() {
            return Err(anyhow!("Exclude markers must be both set or both empty"));
        }

        if let Some(phase) = &self.export.phase {
            if phase.trim().is_empty() {
                return Err(anyhow!("export.phase must not be empty when set"));
            }
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
            import: ImportConfig::default(),
            export: ExportConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
