/*!
 * Translation resolver: TU id to target text for one locale and phase.
 *
 * All selection happens once at load time; afterwards `resolve` is a map
 * probe.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;

use super::interchange::InterchangeDocument;
use super::phase::PhaseSelector;
use crate::errors::InterchangeError;
use crate::file_utils::FileManager;

/// Selection parameters for a resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Target locale
    pub locale: String,

    /// Requested phase; `None` takes the first target for the locale
    pub phase_name: Option<String>,

    /// Highest numbered phase that fallback may consider
    pub max_phase: u32,

    /// Rewrite bare `&` to `&amp;` once segment text is decoded
    pub escape_ampersands: bool,

    /// Use the source text when a unit has no acceptable target
    pub fallback_to_source: bool,
}

impl ResolveOptions {
    pub fn new(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            phase_name: None,
            max_phase: 0,
            escape_ampersands: true,
            fallback_to_source: false,
        }
    }

    pub fn with_phase(mut self, phase_name: &str, max_phase: u32) -> Self {
        self.phase_name = Some(phase_name.to_string());
        self.max_phase = max_phase;
        self
    }

    pub fn with_escape_ampersands(mut self, escape: bool) -> Self {
        self.escape_ampersands = escape;
        self
    }

    pub fn with_fallback_to_source(mut self, fallback: bool) -> Self {
        self.fallback_to_source = fallback;
        self
    }
}

/// Id-indexed target texts for one locale
#[derive(Debug, Clone, Default)]
pub struct TranslationResolver {
    locale: String,
    texts: HashMap<String, String>,
    escape_ampersands: bool,
}

impl TranslationResolver {
    /// Select targets from a parsed document
    pub fn from_document(document: &InterchangeDocument, options: &ResolveOptions) -> Self {
        let selector = PhaseSelector::from_phase_name(options.phase_name.as_deref());
        let mut texts = HashMap::with_capacity(document.len());
        let mut from_source = 0usize;

        for unit in document.units() {
            let candidates = unit.targets_for(&options.locale);
            let selected = match selector.select(&candidates, options.max_phase) {
                Some(target) => &target.text,
                None if options.fallback_to_source => {
                    from_source += 1;
                    &unit.source
                }
                None => continue,
            };

            texts.insert(unit.id.clone(), selected.clone());
        }

        info!(
            "Resolved {} of {} units for locale {} (phase: {:?})",
            texts.len(),
            document.len(),
            options.locale,
            selector
        );
        if from_source > 0 {
            debug!("{} units fell back to their source text", from_source);
        }

        Self {
            locale: options.locale.clone(),
            texts,
            escape_ampersands: options.escape_ampersands,
        }
    }

    /// Parse document text and select targets
    pub fn from_xml(xml: &str, options: &ResolveOptions) -> Result<Self, InterchangeError> {
        let document = InterchangeDocument::parse(xml)?;
        Ok(Self::from_document(&document, options))
    }

    /// Load a document from disk and select targets
    pub fn load<P: AsRef<Path>>(path: P, options: &ResolveOptions) -> Result<Self> {
        let content = FileManager::read_to_string(&path)?;
        Self::from_xml(&content, options)
            .with_context(|| format!("Failed to load translations from {:?}", path.as_ref()))
    }

    /// Target text for `id`; empty when nothing was selected
    pub fn resolve(&self, id: &str) -> &str {
        self.texts.get(id).map_or("", String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.texts.contains_key(id)
    }

    /// Whether decoded segment text must have its bare `&` escaped.
    ///
    /// Stored texts carry one escaping level, so the rewrite only makes
    /// sense after the substitutor has decoded them.
    pub fn escapes_ampersands(&self) -> bool {
        self.escape_ampersands
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}
