/*!
 * Interchange document: source segments and their translations.
 *
 * A small XLIFF 1.2 style shape read and written at the regex level:
 * one `<file>` with `<trans-unit>` entries, each holding a `<source>` and
 * any number of `<target>` elements distinguished by locale and phase.
 * Segment content is stored as it appears in the document, one level of
 * XML escaping included.
 */

use anyhow::{Context, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

use super::phase::Phase;
use crate::errors::InterchangeError;
use crate::file_utils::FileManager;
use crate::language_utils::locale_tags_match;
use crate::markup::{escape_attribute, parse_attributes};

static FILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<file\b([^>]*)>").expect("Invalid file element regex")
});

static UNIT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<trans-unit\b([^>]*?)(?:/>|>(.*?)</trans-unit>)").expect("Invalid trans-unit regex")
});

static SOURCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<source\b([^>]*?)(?:/>|>(.*?)</source>)").expect("Invalid source regex")
});

static TARGET_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<target\b([^>]*?)(?:/>|>(.*?)</target>)").expect("Invalid target regex")
});

/// One translation of a segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Locale tag
    pub locale: String,

    /// Revision pass this text belongs to
    pub phase: Phase,

    /// Escaped content, inline references and markers included
    pub text: String,

    /// Optional workflow state carried through unchanged
    pub state: Option<String>,
}

impl Target {
    pub fn new(locale: &str, phase: Phase, text: impl Into<String>) -> Self {
        Self {
            locale: locale.to_string(),
            phase,
            text: text.into(),
            state: None,
        }
    }
}

/// A translatable segment and its translations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    /// Document-unique id
    pub id: String,

    /// Locale of the source text
    pub source_locale: String,

    /// Escaped source content
    pub source: String,

    /// Translations in document order
    pub targets: Vec<Target>,
}

impl TranslationUnit {
    pub fn new(id: &str, source_locale: &str, source: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            source_locale: source_locale.to_string(),
            source: source.into(),
            targets: Vec::new(),
        }
    }

    /// Targets for `locale` in document order
    pub fn targets_for(&self, locale: &str) -> Vec<&Target> {
        self.targets
            .iter()
            .filter(|target| locale_tags_match(&target.locale, locale))
            .collect()
    }
}

/// Parsed interchange document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterchangeDocument {
    /// Name of the native document the units came from
    pub original: String,

    /// Locale of every source segment
    pub source_locale: String,

    /// Native format label
    pub datatype: String,

    /// SHA-256 of the skeleton text(s) written by the same import
    pub checksum: Option<String>,

    units: Vec<TranslationUnit>,
    index: HashMap<String, usize>,
}

impl InterchangeDocument {
    pub fn new(original: &str, source_locale: &str, datatype: &str) -> Self {
        Self {
            original: original.to_string(),
            source_locale: source_locale.to_string(),
            datatype: datatype.to_string(),
            ..Self::default()
        }
    }

    /// Append a unit; a unit with the same id replaces the earlier one
    pub fn push_unit(&mut self, unit: TranslationUnit) {
        if let Some(&position) = self.index.get(&unit.id) {
            warn!("Translation unit {} defined twice; keeping the later one", unit.id);
            self.units[position] = unit;
            return;
        }
        self.index.insert(unit.id.clone(), self.units.len());
        self.units.push(unit);
    }

    pub fn unit(&self, id: &str) -> Option<&TranslationUnit> {
        self.index.get(id).map(|&position| &self.units[position])
    }

    pub fn unit_mut(&mut self, id: &str) -> Option<&mut TranslationUnit> {
        self.index.get(id).map(|&position| &mut self.units[position])
    }

    pub fn units(&self) -> &[TranslationUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Add or replace the target with the same locale and phase.
    ///
    /// Returns false when the unit does not exist.
    pub fn add_target(&mut self, id: &str, target: Target) -> bool {
        let Some(unit) = self.unit_mut(id) else {
            return false;
        };
        match unit
            .targets
            .iter_mut()
            .find(|t| t.phase == target.phase && locale_tags_match(&t.locale, &target.locale))
        {
            Some(existing) => *existing = target,
            None => unit.targets.push(target),
        }
        true
    }

    /// Remove the target with this locale and phase; true if one was removed
    pub fn remove_target(&mut self, id: &str, locale: &str, phase: &Phase) -> bool {
        let Some(unit) = self.unit_mut(id) else {
            return false;
        };
        let before = unit.targets.len();
        unit.targets
            .retain(|t| !(t.phase == *phase && locale_tags_match(&t.locale, locale)));
        unit.targets.len() != before
    }

    /// Parse document text
    pub fn parse(text: &str) -> Result<Self, InterchangeError> {
        let file = FILE_REGEX.captures(text).ok_or(InterchangeError::MissingFile)?;
        let file_attrs = parse_attributes(&file[1]);
        let source_locale = file_attrs
            .get("source-language")
            .cloned()
            .ok_or_else(|| InterchangeError::MissingAttribute {
                element: "file".to_string(),
                attribute: "source-language".to_string(),
            })?;

        let mut document = Self::new(
            file_attrs.get("original").map_or("", String::as_str),
            &source_locale,
            file_attrs.get("datatype").map_or("xml", String::as_str),
        );
        document.checksum = file_attrs.get("checksum").cloned();

        let body_start = file.get(0).map_or(0, |m| m.end());
        for unit_cap in UNIT_REGEX.captures_iter(&text[body_start..]) {
            let unit_attrs = parse_attributes(&unit_cap[1]);
            let id = unit_attrs.get("id").ok_or_else(|| InterchangeError::MissingAttribute {
                element: "trans-unit".to_string(),
                attribute: "id".to_string(),
            })?;
            let content = unit_cap.get(2).map_or("", |m| m.as_str());
            document.push_unit(Self::parse_unit(id, content, &source_locale)?);
        }

        debug!("Parsed interchange document with {} units", document.len());
        Ok(document)
    }

    fn parse_unit(id: &str, content: &str, file_locale: &str) -> Result<TranslationUnit, InterchangeError> {
        let mut unit = TranslationUnit::new(id, file_locale, "");

        if let Some(source) = SOURCE_REGEX.captures(content) {
            let attrs = parse_attributes(&source[1]);
            if let Some(locale) = attrs.get("xml:lang") {
                unit.source_locale = locale.clone();
            }
            unit.source = source.get(2).map_or("", |m| m.as_str()).to_string();
        } else {
            warn!("Translation unit {} has no <source>", id);
        }

        for target in TARGET_REGEX.captures_iter(content) {
            let attrs = parse_attributes(&target[1]);
            let locale = attrs.get("xml:lang").ok_or_else(|| InterchangeError::MissingAttribute {
                element: "target".to_string(),
                attribute: "xml:lang".to_string(),
            })?;
            unit.targets.push(Target {
                locale: locale.clone(),
                phase: Phase::from_attribute(attrs.get("phase-name").map(String::as_str)),
                text: target.get(2).map_or("", |m| m.as_str()).to_string(),
                state: attrs.get("state").cloned(),
            });
        }

        Ok(unit)
    }

    /// Read a document from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = FileManager::read_to_string(&path)?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse interchange document: {:?}", path.as_ref()))
    }

    /// Serialise the document
    pub fn to_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str("<xliff version=\"1.2\">\n");
        out.push_str(&format!(
            "<file original=\"{}\" source-language=\"{}\" datatype=\"{}\"",
            escape_attribute(&self.original),
            escape_attribute(&self.source_locale),
            escape_attribute(&self.datatype)
        ));
        if let Some(checksum) = &self.checksum {
            out.push_str(&format!(" checksum=\"{}\"", escape_attribute(checksum)));
        }
        out.push_str(">\n<body>\n");

        for unit in &self.units {
            out.push_str(&format!("<trans-unit id=\"{}\">\n", escape_attribute(&unit.id)));
            out.push_str(&format!(
                "<source xml:lang=\"{}\">{}</source>\n",
                escape_attribute(&unit.source_locale),
                unit.source
            ));
            for target in &unit.targets {
                out.push_str(&format!("<target xml:lang=\"{}\"", escape_attribute(&target.locale)));
                if let Some(phase) = target.phase.to_attribute() {
                    out.push_str(&format!(" phase-name=\"{}\"", escape_attribute(&phase)));
                }
                if let Some(state) = &target.state {
                    out.push_str(&format!(" state=\"{}\"", escape_attribute(state)));
                }
                out.push_str(&format!(">{}</target>\n", target.text));
            }
            out.push_str("</trans-unit>\n");
        }

        out.push_str("</body>\n</file>\n</xliff>\n");
        out
    }

    /// Write the document to disk
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        FileManager::write_to_file(path, &self.to_xml())
    }
}
