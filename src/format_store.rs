/*!
 * Format table: literal native markup behind inline-markup placeholders.
 *
 * The table is written once at import time and read many times at export
 * time. On disk it keeps its small self-describing shape; in memory it is
 * indexed by id at load time so each lookup is a hash probe.
 */

use anyhow::{Context, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

use crate::errors::FormatTableError;
use crate::file_utils::FileManager;
use crate::markup::{escape_text, parse_attributes, unescape};

/// Delimiter that opens a markup construct
pub const MARKUP_OPEN: char = '<';

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";
const ENTRY_CLOSE: &str = "</entry>";

static ROOT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<formatting\b([^>]*)>").expect("Invalid format root regex")
});

static ENTRY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<entry\b([^>]*?)(/?)>").expect("Invalid format entry regex")
});

/// One inline-markup substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatEntry {
    /// Placeholder id
    pub id: u64,

    /// Stored text: without its leading delimiter in markup mode,
    /// the CDATA payload when `cdata_literal` is set
    pub text: String,

    /// Content is a CDATA payload and must not be re-escaped
    pub cdata_literal: bool,

    /// Carried through unchanged
    pub recursive: bool,
}

impl FormatEntry {
    /// Create a plain entry
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            cdata_literal: false,
            recursive: false,
        }
    }

    /// Create an entry holding a CDATA payload
    pub fn cdata(id: u64, payload: impl Into<String>) -> Self {
        Self {
            cdata_literal: true,
            ..Self::new(id, payload)
        }
    }
}

/// Loaded, id-indexed format table
#[derive(Debug, Clone, Default)]
pub struct FormatStore {
    cdata_literal: bool,
    entries: HashMap<u64, FormatEntry>,
}

impl FormatStore {
    /// Parse the on-disk table shape
    pub fn parse(table: &str) -> Result<Self, FormatTableError> {
        let root = ROOT_REGEX.captures(table).ok_or(FormatTableError::MissingRoot)?;
        let root_attrs = parse_attributes(&root[1]);
        let cdata_literal = root_attrs
            .get("cdata-literal")
            .is_some_and(|value| value == "true");

        let mut entries = HashMap::new();
        let mut pos = root.get(0).map_or(0, |m| m.end());

        while let Some(cap) = ENTRY_REGEX.captures_at(table, pos) {
            let header = cap.get(0).ok_or_else(|| FormatTableError::MalformedEntry("empty match".to_string()))?;
            let attrs = parse_attributes(&cap[1]);
            let raw_id = attrs
                .get("id")
                .ok_or_else(|| FormatTableError::MalformedEntry(header.as_str().to_string()))?;
            let id: u64 = raw_id
                .parse()
                .map_err(|_| FormatTableError::InvalidId(raw_id.clone()))?;

            let (text, next) = if &cap[2] == "/" {
                (String::new(), header.end())
            } else {
                Self::read_entry_body(table, header.end())?
            };

            let entry = FormatEntry {
                id,
                text,
                cdata_literal: attrs.get("cdataTagIsLiteral").is_some_and(|v| v == "true"),
                recursive: attrs.get("recursive").is_some_and(|v| v == "true"),
            };
            if entries.insert(id, entry).is_some() {
                warn!("Format table repeats id {}; keeping the last entry", id);
            }
            pos = next;
        }

        debug!("Loaded format table with {} entries (cdata-literal: {})", entries.len(), cdata_literal);

        Ok(Self { cdata_literal, entries })
    }

    // @reads: Entry body starting at `start`, returns (text, position after </entry>)
    fn read_entry_body(table: &str, start: usize) -> Result<(String, usize), FormatTableError> {
        let mut pos = start;
        let mut text = String::new();
        let mut saw_cdata = false;

        while table[pos..].starts_with(CDATA_OPEN) {
            let payload_start = pos + CDATA_OPEN.len();
            let payload_end = table[payload_start..]
                .find(CDATA_CLOSE)
                .map(|offset| payload_start + offset)
                .ok_or_else(|| FormatTableError::MalformedEntry("unterminated CDATA section".to_string()))?;
            text.push_str(&table[payload_start..payload_end]);
            pos = payload_end + CDATA_CLOSE.len();
            saw_cdata = true;
        }

        let close = table[pos..]
            .find(ENTRY_CLOSE)
            .map(|offset| pos + offset)
            .ok_or_else(|| FormatTableError::MalformedEntry("missing </entry>".to_string()))?;

        if saw_cdata {
            if close != pos {
                return Err(FormatTableError::MalformedEntry(
                    "text after CDATA section".to_string(),
                ));
            }
        } else {
            text = unescape(&table[pos..close]);
        }

        Ok((text, close + ENTRY_CLOSE.len()))
    }

    /// Read a table from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = FileManager::read_to_string(&path)?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse format table: {:?}", path.as_ref()))
    }

    /// Whether the whole table stores literal CDATA payloads
    pub fn is_cdata_literal(&self) -> bool {
        self.cdata_literal
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw entry access
    pub fn entry(&self, id: u64) -> Option<&FormatEntry> {
        self.entries.get(&id)
    }

    /// Replacement text for `id`, delimiter handling chosen by the table mode.
    ///
    /// A miss yields an empty string.
    pub fn lookup(&self, id: u64) -> String {
        self.lookup_formatted(id, !self.cdata_literal)
    }

    /// Replacement text for `id`, prefixing the markup-open delimiter when
    /// `prepend_delimiter` is set and the stored text is non-empty.
    pub fn lookup_formatted(&self, id: u64, prepend_delimiter: bool) -> String {
        let Some(entry) = self.entries.get(&id) else {
            debug!("No format entry for id {}", id);
            return String::new();
        };

        if entry.cdata_literal {
            return format!("{}{}{}", CDATA_OPEN, entry.text, CDATA_CLOSE);
        }

        if prepend_delimiter && !entry.text.is_empty() {
            let mut text = String::with_capacity(entry.text.len() + 1);
            text.push(MARKUP_OPEN);
            text.push_str(&entry.text);
            text
        } else {
            entry.text.clone()
        }
    }

    /// Serialise to the on-disk shape, entries ordered by id
    pub fn to_table_string(&self) -> String {
        let mut ids: Vec<&u64> = self.entries.keys().collect();
        ids.sort();

        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&format!("<formatting cdata-literal=\"{}\">\n", self.cdata_literal));
        for id in ids {
            let entry = &self.entries[id];
            out.push_str(&format!("<entry id=\"{}\"", entry.id));
            if entry.cdata_literal {
                out.push_str(" cdataTagIsLiteral=\"true\"");
            }
            if entry.recursive {
                out.push_str(" recursive=\"true\"");
            }
            out.push('>');
            if self.cdata_literal || entry.cdata_literal {
                out.push_str(&cdata_sections(&entry.text));
            } else {
                out.push_str(&escape_text(&entry.text));
            }
            out.push_str(ENTRY_CLOSE);
            out.push('\n');
        }
        out.push_str("</formatting>\n");
        out
    }

    /// Write the table to disk
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        FileManager::write_to_file(path, &self.to_table_string())
    }
}

// @wraps: Text in CDATA sections, splitting any embedded terminator
fn cdata_sections(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let body = text.replace(CDATA_CLOSE, "]]]]><![CDATA[>");
    format!("{}{}{}", CDATA_OPEN, body, CDATA_CLOSE)
}

/// Collects entries during import and decides the table mode
#[derive(Debug, Default)]
pub struct FormatTableBuilder {
    entries: Vec<FormatEntry>,
}

impl FormatTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the full native markup for `id`
    pub fn insert(&mut self, id: u64, markup: &str) {
        self.entries.push(FormatEntry::new(id, markup));
    }

    /// Record a CDATA payload for `id`
    pub fn insert_cdata(&mut self, id: u64, payload: &str) {
        self.entries.push(FormatEntry::cdata(id, payload));
    }

    /// Record a fully specified entry
    pub fn insert_entry(&mut self, entry: FormatEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze into a store.
    ///
    /// Markup mode is used when every plain entry starts with the open
    /// delimiter; the delimiter is then dropped from the stored text.
    pub fn build(self) -> FormatStore {
        let cdata_literal = self
            .entries
            .iter()
            .any(|e| !e.cdata_literal && !e.text.starts_with(MARKUP_OPEN));

        let mut entries = HashMap::with_capacity(self.entries.len());
        for mut entry in self.entries {
            if !cdata_literal && !entry.cdata_literal {
                entry.text.remove(0);
            }
            if let Some(previous) = entries.insert(entry.id, entry) {
                warn!("Format id {} recorded twice; keeping the later entry", previous.id);
            }
        }

        FormatStore { cdata_literal, entries }
    }
}
