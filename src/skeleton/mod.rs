/*!
 * Skeleton model: literal text interleaved with placeholders.
 *
 * - `trace`: the structural trace consumed by the merger
 * - `buffer`: cursor-split buffer the merger operates on
 * - `merger`: builds a skeleton from a trace and the original text
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt;

use crate::format_store::FormatStore;
use crate::markup::parse_attributes;
use crate::translation::InterchangeDocument;

pub mod buffer;
pub mod merger;
pub mod trace;

pub use self::buffer::MergeBuffer;
pub use self::merger::{ExcludeMarkers, MergeOptions, MergeOutcome, MergeWarning, SkeletonMerger};
pub use self::trace::{StructuralTrace, TraceLine, TraceWriter, TuBoundary};

static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<placeholder\s+([^>]*?)\s*/>|<format\s+id\s*=\s*(?:'(\d+)'|"(\d+)")\s*/>"#)
        .expect("Invalid placeholder regex")
});

/// Placeholder standing in for a translatable segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuPlaceholder {
    /// TU id
    pub id: String,

    /// Target slot rather than source slot
    pub is_target: bool,

    /// Locale, absent when it equals the skeleton's source locale
    pub locale: Option<String>,

    /// Marks "insert any additional targets for this TU here"
    pub wildcard: bool,
}

impl TuPlaceholder {
    /// Plain source-locale placeholder
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            is_target: false,
            locale: None,
            wildcard: false,
        }
    }

    /// Wildcard placeholder for `id`
    pub fn wildcard(id: &str) -> Self {
        Self {
            wildcard: true,
            ..Self::new(id)
        }
    }

    fn from_attributes(raw: &str) -> Option<Self> {
        let attrs = parse_attributes(raw);
        Some(Self {
            id: attrs.get("id")?.clone(),
            is_target: attrs.get("istarget").is_some_and(|v| v == "true"),
            locale: attrs.get("xml:lang").cloned(),
            wildcard: attrs.get("wildcard").is_some_and(|v| v == "true"),
        })
    }
}

impl fmt::Display for TuPlaceholder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<placeholder id='{}'", self.id)?;
        if self.is_target {
            write!(f, " istarget='true'")?;
        }
        if let Some(locale) = &self.locale {
            write!(f, " xml:lang='{}'", locale)?;
        }
        if self.wildcard {
            write!(f, " wildcard='true'")?;
        }
        write!(f, "/>")
    }
}

/// Whether `text` holds anything `Skeleton::parse` would read as a placeholder
pub fn has_placeholder_token(text: &str) -> bool {
    PLACEHOLDER_REGEX.is_match(text)
}

/// Token for an inline-markup placeholder
pub fn markup_placeholder(id: u64) -> String {
    format!("<format id='{}'/>", id)
}

/// One piece of a skeleton
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkeletonPart {
    /// Text copied to the output unchanged
    Literal(String),
    /// Translatable segment placeholder
    Tu(TuPlaceholder),
    /// Inline-markup placeholder
    Markup(u64),
}

/// Parsed skeleton
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Skeleton {
    parts: Vec<SkeletonPart>,
}

impl Skeleton {
    /// Split skeleton text into literals and placeholders.
    ///
    /// Never fails: anything that is not a well-formed placeholder token
    /// stays literal.
    pub fn parse(text: &str) -> Self {
        let mut parts = Vec::new();
        let mut last = 0;

        for cap in PLACEHOLDER_REGEX.captures_iter(text) {
            let Some(whole) = cap.get(0) else { continue };
            let Some(part) = Self::token_part(&cap) else { continue };
            if whole.start() > last {
                parts.push(SkeletonPart::Literal(text[last..whole.start()].to_string()));
            }
            parts.push(part);
            last = whole.end();
        }
        if last < text.len() {
            parts.push(SkeletonPart::Literal(text[last..].to_string()));
        }

        Self { parts }
    }

    fn token_part(cap: &Captures) -> Option<SkeletonPart> {
        if let Some(attrs) = cap.get(1) {
            return TuPlaceholder::from_attributes(attrs.as_str()).map(SkeletonPart::Tu);
        }
        let digits = cap.get(2).or_else(|| cap.get(3))?;
        digits.as_str().parse().ok().map(SkeletonPart::Markup)
    }

    pub fn parts(&self) -> &[SkeletonPart] {
        &self.parts
    }

    /// TU ids referenced, in order, without duplicates
    pub fn tu_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for part in &self.parts {
            if let SkeletonPart::Tu(tu) = part {
                if !ids.contains(&tu.id.as_str()) {
                    ids.push(&tu.id);
                }
            }
        }
        ids
    }

    /// Inline-markup ids referenced, in order
    pub fn markup_ids(&self) -> Vec<u64> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                SkeletonPart::Markup(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Placeholders that do not resolve to an entry in their table
    pub fn dangling_references(&self, document: &InterchangeDocument, formats: &FormatStore) -> Vec<String> {
        let mut dangling: Vec<String> = self
            .tu_ids()
            .into_iter()
            .filter(|id| document.unit(id).is_none())
            .map(|id| format!("tu:{}", id))
            .collect();
        dangling.extend(
            self.markup_ids()
                .into_iter()
                .filter(|id| formats.entry(*id).is_none())
                .map(|id| format!("format:{}", id)),
        );
        dangling
    }
}

impl fmt::Display for Skeleton {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for part in &self.parts {
            match part {
                SkeletonPart::Literal(text) => f.write_str(text)?,
                SkeletonPart::Tu(tu) => write!(f, "{}", tu)?,
                SkeletonPart::Markup(id) => f.write_str(&markup_placeholder(*id))?,
            }
        }
        Ok(())
    }
}
