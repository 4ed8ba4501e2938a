/*!
 * Native format adapters.
 *
 * An adapter turns a native document into intermediate markup on import
 * and turns rendered markup back into the native format on export. The
 * rest of the pipeline only ever sees intermediate markup.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::errors::ConversionError;
use crate::markup::{escape_text, unescape};

static PARAGRAPH_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"</?p>").expect("Invalid paragraph tag regex")
});

/// Native format to intermediate markup and back
pub trait NativeAdapter: Send + Sync {
    /// Label written as the interchange `datatype`
    fn datatype(&self) -> &str;

    /// Elements this adapter always wraps translatable text in
    fn translatable_elements(&self) -> &[&str] {
        &[]
    }

    /// Native text to intermediate markup
    fn to_markup(&self, native: &str) -> Result<String, ConversionError>;

    /// Rendered intermediate markup back to native text
    fn from_markup(&self, markup: &str) -> Result<String, ConversionError>;
}

/// Documents that already are markup (XML, XHTML, XLIFF)
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityAdapter;

impl NativeAdapter for IdentityAdapter {
    fn datatype(&self) -> &str {
        "xml"
    }

    fn to_markup(&self, native: &str) -> Result<String, ConversionError> {
        Ok(native.to_string())
    }

    fn from_markup(&self, markup: &str) -> Result<String, ConversionError> {
        Ok(markup.to_string())
    }
}

/// Plain text: every non-blank line is one paragraph
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextAdapter;

impl NativeAdapter for PlainTextAdapter {
    fn datatype(&self) -> &str {
        "plaintext"
    }

    fn translatable_elements(&self) -> &[&str] {
        &["p"]
    }

    fn to_markup(&self, native: &str) -> Result<String, ConversionError> {
        let mut markup = String::with_capacity(native.len() + native.len() / 4);
        for line in native.split_inclusive('\n') {
            let content = line.trim_end_matches(['\r', '\n']);
            let ending = &line[content.len()..];
            if content.trim().is_empty() {
                markup.push_str(line);
            } else {
                markup.push_str("<p>");
                markup.push_str(&escape_text(content));
                markup.push_str("</p>");
                markup.push_str(ending);
            }
        }
        Ok(markup)
    }

    fn from_markup(&self, markup: &str) -> Result<String, ConversionError> {
        Ok(unescape(&PARAGRAPH_TAG_REGEX.replace_all(markup, "")))
    }
}

/// Adapter chosen by file extension
pub fn adapter_for_path(path: &Path) -> Box<dyn NativeAdapter> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "txt" | "text" => Box::new(PlainTextAdapter),
        _ => Box::new(IdentityAdapter),
    }
}
