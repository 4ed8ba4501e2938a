/*!
 * Placeholder substitution: regenerates a native document from a skeleton.
 *
 * The skeleton is replayed line by line. TU placeholders expand to the
 * resolved target text, with protective markers stripped, inline
 * references replaced from the format table and entities unescaped.
 * Bare `&` left over by unescaping is re-escaped when the resolver asks
 * for it.
 * Markup placeholders expand to their format table entry. Every other
 * character of the skeleton is copied unchanged.
 */

use log::debug;
use std::io::{self, Write};

use crate::app_config::OutputEscaping;
use crate::format_store::FormatStore;
use crate::markup::{escape_bare_ampersands, unescape};
use crate::skeleton::{Skeleton, SkeletonPart, TuPlaceholder};
use crate::translation::markers::{split_inline, strip_protective_markers, InlinePiece};
use crate::translation::TranslationResolver;

/// Host-format post-processing of rendered segment text
pub trait TextFilter: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Transform segment text
    fn apply(&self, text: &str) -> String;
}

/// Doubles `"` for hosts that quote with doubled delimiters
#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteDoubling;

impl TextFilter for QuoteDoubling {
    fn name(&self) -> &str {
        "quote-doubling"
    }

    fn apply(&self, text: &str) -> String {
        text.replace('"', "\"\"")
    }
}

/// Writes every non-ASCII character as `\uXXXX` (UTF-16 units)
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeEscape;

impl TextFilter for UnicodeEscape {
    fn name(&self) -> &str {
        "unicode-escape"
    }

    fn apply(&self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        let mut units = [0u16; 2];
        for c in text.chars() {
            if c.is_ascii() {
                escaped.push(c);
            } else {
                for unit in c.encode_utf16(&mut units) {
                    escaped.push_str(&format!("\\u{:04X}", unit));
                }
            }
        }
        escaped
    }
}

/// Filter for a configured escaping mode
pub fn filter_for(escaping: OutputEscaping) -> Option<Box<dyn TextFilter>> {
    match escaping {
        OutputEscaping::None => None,
        OutputEscaping::QuoteDoubling => Some(Box::new(QuoteDoubling)),
        OutputEscaping::UnicodeEscape => Some(Box::new(UnicodeEscape)),
    }
}

/// Replays skeletons against a resolver and a format table
pub struct PlaceholderSubstitutor<'a> {
    resolver: &'a TranslationResolver,
    formats: &'a FormatStore,
    filters: Vec<Box<dyn TextFilter>>,
    wildcard_template: Option<String>,
}

impl<'a> PlaceholderSubstitutor<'a> {
    pub fn new(resolver: &'a TranslationResolver, formats: &'a FormatStore) -> Self {
        Self {
            resolver,
            formats,
            filters: Vec::new(),
            wildcard_template: None,
        }
    }

    /// Add a text filter; filters run in insertion order
    pub fn with_filter(mut self, filter: Box<dyn TextFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Expand wildcard placeholders with a template using `{id}`, `{lang}`
    /// and `{text}`; without a template they render as nothing.
    pub fn with_wildcard_template(mut self, template: Option<String>) -> Self {
        self.wildcard_template = template;
        self
    }

    /// Rendered text of one segment
    pub fn expand_unit(&self, id: &str) -> String {
        let resolved = self.resolver.resolve(id);
        if resolved.is_empty() {
            return String::new();
        }

        let stripped = strip_protective_markers(resolved);
        let mut text = String::with_capacity(stripped.len());
        for piece in split_inline(&stripped) {
            match piece {
                InlinePiece::Text(run) => {
                    let decoded = unescape(run);
                    if self.resolver.escapes_ampersands() {
                        text.push_str(&escape_bare_ampersands(&decoded));
                    } else {
                        text.push_str(&decoded);
                    }
                }
                InlinePiece::Markup(markup_id) => text.push_str(&self.formats.lookup(markup_id)),
            }
        }

        self.filters
            .iter()
            .fold(text, |current, filter| filter.apply(&current))
    }

    fn expand_placeholder(&self, placeholder: &TuPlaceholder) -> String {
        if !placeholder.wildcard {
            return self.expand_unit(&placeholder.id);
        }
        match &self.wildcard_template {
            Some(template) => template
                .replace("{id}", &placeholder.id)
                .replace("{lang}", self.resolver.locale())
                .replace("{text}", &self.expand_unit(&placeholder.id)),
            None => String::new(),
        }
    }

    /// Replay `skeleton` into `out`
    pub fn render<W: Write>(&self, skeleton: &str, out: &mut W) -> io::Result<()> {
        let mut lines = 0usize;
        let mut expanded = 0usize;

        for line in skeleton.split_inclusive('\n') {
            lines += 1;
            for part in Skeleton::parse(line).parts() {
                match part {
                    SkeletonPart::Literal(text) => out.write_all(text.as_bytes())?,
                    SkeletonPart::Tu(placeholder) => {
                        expanded += 1;
                        out.write_all(self.expand_placeholder(placeholder).as_bytes())?;
                    }
                    SkeletonPart::Markup(id) => {
                        expanded += 1;
                        out.write_all(self.formats.lookup(*id).as_bytes())?;
                    }
                }
            }
        }
        out.flush()?;

        debug!(
            "Rendered {} skeleton lines, {} placeholders expanded ({} filters)",
            lines,
            expanded,
            self.filters.len()
        );
        Ok(())
    }

    /// Replay `skeleton` into a string
    pub fn render_to_string(&self, skeleton: &str) -> String {
        let mut out = Vec::with_capacity(skeleton.len());
        // Writing to a Vec cannot fail
        let _ = self.render(skeleton, &mut out);
        String::from_utf8_lossy(&out).into_owned()
    }
}
