/*!
 * Regex-level markup helpers shared by the trace, skeleton, format table
 * and interchange readers.
 *
 * None of these build a tree; they operate on single tags or text runs.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

// @const: name='value' or name="value"
static ATTRIBUTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_][\w:.-]*)\s*=\s*(?:'([^']*)'|"([^"]*)")"#)
        .expect("Invalid attribute regex")
});

// @const: Predefined and numeric entity references
static ENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(amp|lt|gt|quot|apos|#[0-9]+|#x[0-9A-Fa-f]+);").expect("Invalid entity regex")
});

// @const: Any well-formed entity reference, named or numeric
static ENTITY_PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^&(?:[A-Za-z_][\w.-]*|#[0-9]+|#x[0-9A-Fa-f]+);").expect("Invalid entity prefix regex")
});

/// Parse the attributes of one tag into a map; later duplicates win.
pub fn parse_attributes(tag: &str) -> HashMap<String, String> {
    ATTRIBUTE_REGEX
        .captures_iter(tag)
        .map(|cap| {
            let value = cap.get(2).or_else(|| cap.get(3)).map(|m| m.as_str()).unwrap_or("");
            (cap[1].to_string(), value.to_string())
        })
        .collect()
}

/// Escape text for element content
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escape text for a double-quoted attribute value
pub fn escape_attribute(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

/// Undo one level of entity escaping.
///
/// Single pass: `&amp;lt;` becomes `&lt;`, not `<`. Unknown named
/// entities are left as they are.
pub fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY_REGEX
        .replace_all(text, |cap: &Captures| {
            let name = &cap[1];
            match name {
                "amp" => "&".to_string(),
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                _ => decode_numeric(name).map(String::from).unwrap_or_else(|| cap[0].to_string()),
            }
        })
        .into_owned()
}

fn decode_numeric(reference: &str) -> Option<char> {
    let code = if let Some(hex) = reference.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        reference.strip_prefix('#')?.parse().ok()?
    };
    char::from_u32(code)
}

/// Rewrite every `&` that does not start an entity reference to `&amp;`
pub fn escape_bare_ampersands(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut result = String::with_capacity(text.len() + 8);
    for (index, c) in text.char_indices() {
        if c == '&' && !ENTITY_PREFIX_REGEX.is_match(&text[index..]) {
            result.push_str("&amp;");
        } else {
            result.push(c);
        }
    }
    result
}
