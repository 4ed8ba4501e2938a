/*!
 * Inline content of segments: protective markers and inline references.
 *
 * Segment text may wrap its translatable core in `<mrk mtype="x-coretext">`
 * and joined regions in `<mrk mtype="x-merge">`. Both are bookkeeping for
 * translators and are stripped before rendering. Inline references
 * (`bpt`, `ept`, `ph`, `it`, `x`) carry the id of a format table entry.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::markup::parse_attributes;

/// `mtype` of the marker around a segment's translatable core
pub const CORE_TEXT_MTYPE: &str = "x-coretext";

/// `mtype` of the marker around joined regions
pub const MERGE_MTYPE: &str = "x-merge";

static MRK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<mrk\b([^>]*?)(/?)>|</mrk\s*>").expect("Invalid mrk regex")
});

static INLINE_REF_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)<(?:bpt|ept|ph|it|x)\b([^>]*?)/>|<bpt\b([^>]*)>.*?</bpt>|<ept\b([^>]*)>.*?</ept>|<ph\b([^>]*)>.*?</ph>|<it\b([^>]*)>.*?</it>",
    )
    .expect("Invalid inline reference regex")
});

/// A run of segment content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlinePiece<'a> {
    /// Escaped text
    Text(&'a str),
    /// Reference to a format table entry
    Markup(u64),
}

fn is_protective(attributes: &str) -> bool {
    parse_attributes(attributes)
        .get("mtype")
        .is_some_and(|mtype| mtype == CORE_TEXT_MTYPE || mtype == MERGE_MTYPE)
}

/// Remove core-text and merge markers, keeping their content and any
/// other `mrk` elements.
pub fn strip_protective_markers(text: &str) -> String {
    if !text.contains("<mrk") {
        return text.to_string();
    }

    let mut open: Vec<bool> = Vec::new();
    MRK_REGEX
        .replace_all(text, |cap: &Captures| {
            match cap.get(1) {
                Some(attributes) => {
                    let protective = is_protective(attributes.as_str());
                    // <mrk .../> has nothing to close
                    if cap.get(2).is_none_or(|slash| slash.as_str().is_empty()) {
                        open.push(protective);
                    }
                    if protective { String::new() } else { cap[0].to_string() }
                }
                None => match open.pop() {
                    Some(true) => String::new(),
                    _ => cap[0].to_string(),
                },
            }
        })
        .into_owned()
}

/// Wrap the core of `text` in a core-text marker; leading and trailing
/// whitespace stays outside.
pub fn wrap_core_text(text: &str) -> String {
    let core = text.trim();
    if core.is_empty() {
        return text.to_string();
    }
    let start = text.len() - text.trim_start().len();
    let end = start + core.len();
    format!(
        "{}<mrk mtype=\"{}\">{}</mrk>{}",
        &text[..start],
        CORE_TEXT_MTYPE,
        core,
        &text[end..]
    )
}

/// Split segment content into text runs and inline references.
///
/// References without a usable numeric `id` stay inside the text.
pub fn split_inline(text: &str) -> Vec<InlinePiece<'_>> {
    let mut pieces = Vec::new();
    let mut last = 0;

    for cap in INLINE_REF_REGEX.captures_iter(text) {
        let Some(whole) = cap.get(0) else { continue };
        let Some(id) = (1..=5)
            .find_map(|group| cap.get(group))
            .and_then(|attrs| parse_attributes(attrs.as_str()).get("id")?.parse::<u64>().ok())
        else {
            continue;
        };
        if whole.start() > last {
            pieces.push(InlinePiece::Text(&text[last..whole.start()]));
        }
        pieces.push(InlinePiece::Markup(id));
        last = whole.end();
    }
    if last < text.len() {
        pieces.push(InlinePiece::Text(&text[last..]));
    }

    pieces
}

/// Self-closing inline reference for a format id
pub fn inline_reference(kind: &str, id: u64) -> String {
    format!("<{} id=\"{}\"/>", kind, id)
}
