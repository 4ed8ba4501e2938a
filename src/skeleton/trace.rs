/*!
 * Structural trace: the line-oriented product of the first-pass scan.
 *
 * Lists structural tag boundaries (name + sequence number) and TU
 * boundaries. Consumed once by the merger, never persisted by it.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;

use crate::errors::TraceError;
use crate::markup::parse_attributes;

static TAG_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^<(/?)([A-Za-z_][\w:.-]*)\s+seq\s*=\s*(?:'(\d+)'|"(\d+)")\s*>$"#)
        .expect("Invalid trace tag regex")
});

static TU_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<tu\s+([^>]*)>$").expect("Invalid trace TU regex")
});

/// TU boundary carried by a trace line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuBoundary {
    /// TU id
    pub id: String,

    /// Whether this occurrence is a target slot rather than the source
    pub is_target: bool,

    /// Locale tag of the text the TU stands for
    pub locale: String,
}

/// One line of a structural trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceLine {
    /// Opening structural tag
    Open { name: String, seq: u64 },
    /// Closing structural tag
    Close { name: String, seq: u64 },
    /// Start of a translatable segment
    TuOpen(TuBoundary),
}

impl TraceLine {
    /// Sequence number of tag lines
    pub fn seq(&self) -> Option<u64> {
        match self {
            Self::Open { seq, .. } | Self::Close { seq, .. } => Some(*seq),
            Self::TuOpen(_) => None,
        }
    }

    /// Parse a single non-empty line
    pub fn parse(line: &str, line_no: usize) -> Result<Self, TraceError> {
        let trimmed = line.trim();

        if let Some(cap) = TAG_LINE_REGEX.captures(trimmed) {
            let name = cap[2].to_string();
            let digits = cap.get(3).or_else(|| cap.get(4)).map(|m| m.as_str()).unwrap_or("");
            let seq = digits.parse().map_err(|_| TraceError::MalformedLine {
                line_no,
                line: line.to_string(),
            })?;
            return Ok(if &cap[1] == "/" {
                Self::Close { name, seq }
            } else {
                Self::Open { name, seq }
            });
        }

        if let Some(cap) = TU_LINE_REGEX.captures(trimmed) {
            let attrs = parse_attributes(&cap[1]);
            let id = attrs.get("id").cloned().ok_or_else(|| TraceError::MalformedLine {
                line_no,
                line: line.to_string(),
            })?;
            return Ok(Self::TuOpen(TuBoundary {
                id,
                is_target: attrs.get("istarget").is_some_and(|v| v == "true"),
                locale: attrs.get("xml:lang").cloned().unwrap_or_default(),
            }));
        }

        Err(TraceError::MalformedLine {
            line_no,
            line: line.to_string(),
        })
    }
}

impl fmt::Display for TraceLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Open { name, seq } => write!(f, "<{} seq='{}'>", name, seq),
            Self::Close { name, seq } => write!(f, "</{} seq='{}'>", name, seq),
            Self::TuOpen(tu) => write!(
                f,
                "<tu id='{}' istarget='{}' xml:lang='{}'>",
                tu.id, tu.is_target, tu.locale
            ),
        }
    }
}

// Open lines must carry a sequence number above every number seen so far;
// a close line repeats its element's number and may appear only once.
#[derive(Debug, Default)]
struct SequenceOrder {
    highest: Option<u64>,
    closed: HashSet<u64>,
}

impl SequenceOrder {
    fn check(&mut self, line: &TraceLine, line_no: usize) -> Result<(), TraceError> {
        match line {
            TraceLine::Open { seq, .. } => {
                if let Some(previous) = self.highest {
                    if *seq <= previous {
                        return Err(TraceError::NonMonotonicSequence {
                            line_no,
                            previous,
                            found: *seq,
                        });
                    }
                }
                self.highest = Some(*seq);
            }
            TraceLine::Close { seq, .. } => {
                if !self.closed.insert(*seq) {
                    return Err(TraceError::RepeatedSequence { line_no, seq: *seq });
                }
                self.highest = Some(self.highest.map_or(*seq, |h| h.max(*seq)));
            }
            TraceLine::TuOpen(_) => {}
        }
        Ok(())
    }
}

/// Validated structural trace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralTrace {
    lines: Vec<TraceLine>,
}

impl StructuralTrace {
    /// Parse trace text; blank lines are skipped
    pub fn parse(text: &str) -> Result<Self, TraceError> {
        let mut lines = Vec::new();
        let mut order = SequenceOrder::default();

        for (index, raw) in text.lines().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            let line_no = index + 1;
            let line = TraceLine::parse(raw, line_no)?;
            order.check(&line, line_no)?;
            lines.push(line);
        }

        Ok(Self { lines })
    }

    /// Build from already-parsed lines, applying the same validation
    pub fn from_lines(lines: Vec<TraceLine>) -> Result<Self, TraceError> {
        let mut order = SequenceOrder::default();
        for (index, line) in lines.iter().enumerate() {
            order.check(line, index + 1)?;
        }
        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[TraceLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render back to the line-oriented text shape
    pub fn to_trace_string(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.to_string());
            out.push('\n');
        }
        out
    }
}

/// Incremental trace producer used by the scanner
#[derive(Debug, Default)]
pub struct TraceWriter {
    lines: Vec<TraceLine>,
}

impl TraceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, name: &str, seq: u64) {
        self.lines.push(TraceLine::Open { name: name.to_string(), seq });
    }

    pub fn close(&mut self, name: &str, seq: u64) {
        self.lines.push(TraceLine::Close { name: name.to_string(), seq });
    }

    pub fn tu(&mut self, id: &str, is_target: bool, locale: &str) {
        self.lines.push(TraceLine::TuOpen(TuBoundary {
            id: id.to_string(),
            is_target,
            locale: locale.to_string(),
        }));
    }

    /// Finish, validating sequence order
    pub fn finish(self) -> Result<StructuralTrace, TraceError> {
        StructuralTrace::from_lines(self.lines)
    }
}
