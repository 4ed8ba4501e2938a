/*!
 * Skeleton merger.
 *
 * Walks a structural trace line by line against a full copy of the
 * original text and produces the skeleton: the original bytes with every
 * translatable span removed and replaced, in place, by a TU placeholder.
 *
 * Malformed input never aborts a merge. Unmatched exclude markers and tags
 * that cannot be located are recorded as warnings and the merge carries on
 * best-effort; callers that need byte-exact guarantees escalate them.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::io::Write;

use super::buffer::MergeBuffer;
use super::trace::{StructuralTrace, TraceLine, TuBoundary};
use super::TuPlaceholder;
use crate::errors::ConversionError;
use crate::language_utils::locale_tags_match;

static SEQ_ATTRIBUTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\sseq\s*=\s*(?:'(\d+)'|"(\d+)")"#).expect("Invalid seq attribute regex")
});

/// Delimiters enclosing already-duplicated sub-regions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludeMarkers {
    pub open: String,
    pub close: String,
}

impl Default for ExcludeMarkers {
    fn default() -> Self {
        Self {
            open: "<xliff-exclude>".to_string(),
            close: "</xliff-exclude>".to_string(),
        }
    }
}

/// Merge parameters
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// How many TU placeholders may be pending at once
    pub max_depth: usize,

    /// Locale that placeholders leave implicit
    pub source_locale: String,

    /// Elements whose closing line receives a wildcard placeholder
    pub container_tags: Vec<String>,

    /// Exclude-region delimiters removed before merging
    pub exclude: ExcludeMarkers,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            max_depth: 1,
            source_locale: "en".to_string(),
            container_tags: vec!["trans-unit".to_string()],
            exclude: ExcludeMarkers::default(),
        }
    }
}

/// Non-fatal problems recorded during a merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeWarning {
    /// A closing exclude marker without an opener; normalisation stopped there
    UnmatchedExcludeClose { offset: usize },

    /// A trace tag could not be located after the cursor
    TagNotFound { line_no: usize, tag: String },

    /// A TU opened while `max_depth` placeholders were already pending
    NestingTooDeep { line_no: usize, id: String, max_depth: usize },
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnmatchedExcludeClose { offset } => {
                write!(f, "Closing exclude marker at offset {} has no opening marker", offset)
            }
            Self::TagNotFound { line_no, tag } => {
                write!(f, "Trace line {}: tag {} not found after cursor", line_no, tag)
            }
            Self::NestingTooDeep { line_no, id, max_depth } => write!(
                f,
                "Trace line {}: TU {} exceeds maximum nesting depth {}",
                line_no, id, max_depth
            ),
        }
    }
}

/// Result of a merge
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Final skeleton text
    pub skeleton: String,

    /// Cursor position reached when the trace was exhausted
    pub cursor: usize,

    /// Problems tolerated along the way
    pub warnings: Vec<MergeWarning>,
}

// Location of a tag in the remaining source, relative offsets
#[derive(Debug, Clone, Copy)]
struct TagMatch {
    start: usize,
    end: usize,
    self_closing: bool,
}

/// Builds skeletons from a trace plus the original text
#[derive(Debug, Clone, Default)]
pub struct SkeletonMerger {
    options: MergeOptions,
}

impl SkeletonMerger {
    pub fn new(options: MergeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Remove exclude regions, innermost first.
    ///
    /// Each pass deletes from the first closing marker back to the nearest
    /// opening marker before it, markers included. Stops with a warning at
    /// a closing marker that has no opener.
    pub fn normalize_excludes(&self, text: &mut String) -> Vec<MergeWarning> {
        let ExcludeMarkers { open, close } = &self.options.exclude;
        let mut warnings = Vec::new();
        if open.is_empty() || close.is_empty() {
            return warnings;
        }

        while let Some(close_start) = text.find(close.as_str()) {
            let Some(open_start) = text[..close_start].rfind(open.as_str()) else {
                let warning = MergeWarning::UnmatchedExcludeClose { offset: close_start };
                warn!("{}", warning);
                warnings.push(warning);
                break;
            };
            text.replace_range(open_start..close_start + close.len(), "");
        }

        warnings
    }

    /// Merge a parsed trace with the original text
    pub fn merge(&self, trace: &StructuralTrace, original: &str) -> MergeOutcome {
        let mut text = original.to_string();
        let mut warnings = self.normalize_excludes(&mut text);
        let mut outcome = self.merge_normalized(trace, text);
        warnings.append(&mut outcome.warnings);
        outcome.warnings = warnings;
        outcome
    }

    /// Merge text whose exclude regions were already removed
    pub fn merge_normalized(&self, trace: &StructuralTrace, text: String) -> MergeOutcome {
        let mut warnings = Vec::new();
        let mut buffer = MergeBuffer::new(text);

        let mut pending: Vec<TuBoundary> = Vec::new();
        let mut last_finished: Option<String> = None;
        let mut previous_match: Option<(u64, bool)> = None;

        for (index, line) in trace.lines().iter().enumerate() {
            let line_no = index + 1;

            let (name, seq, closing) = match line {
                TraceLine::TuOpen(tu) => {
                    if pending.len() >= self.options.max_depth {
                        let warning = MergeWarning::NestingTooDeep {
                            line_no,
                            id: tu.id.clone(),
                            max_depth: self.options.max_depth,
                        };
                        warn!("{}", warning);
                        warnings.push(warning);
                        continue;
                    }
                    buffer.insert_at_cursor(&self.placeholder_for(tu).to_string());
                    pending.push(tu.clone());
                    continue;
                }
                TraceLine::Open { name, seq } => (name, *seq, false),
                TraceLine::Close { name, seq } => (name, *seq, true),
            };

            // Phantom close synthesised for a self-closing element
            if closing {
                if let Some((previous_seq, true)) = previous_match {
                    if previous_seq.checked_add(1) == Some(seq) {
                        debug!("Skipping phantom close {} on trace line {}", line, line_no);
                        previous_match = Some((seq, false));
                        continue;
                    }
                }
            }

            if let Some(tu) = pending.pop() {
                match Self::find_tag(buffer.remaining(), name, seq, closing) {
                    Some(found) => {
                        buffer.delete_to(found.start);
                        buffer.advance_to(found.end - found.start);
                        previous_match = Some((seq, found.self_closing));
                    }
                    None => {
                        let warning = MergeWarning::TagNotFound { line_no, tag: line.to_string() };
                        warn!("{}", warning);
                        warnings.push(warning);
                    }
                }
                last_finished = Some(tu.id);
                continue;
            }

            if closing && self.options.container_tags.iter().any(|tag| tag == name) {
                if let Some(id) = last_finished.take() {
                    buffer.insert_at_cursor(&TuPlaceholder::wildcard(&id).to_string());
                }
            }

            match Self::find_tag(buffer.remaining(), name, seq, closing) {
                Some(found) => {
                    buffer.advance_to(found.end);
                    previous_match = Some((seq, found.self_closing));
                }
                None => {
                    let warning = MergeWarning::TagNotFound { line_no, tag: line.to_string() };
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        if !pending.is_empty() {
            debug!("Trace ended with {} TU placeholder(s) still open", pending.len());
        }

        let cursor = buffer.cursor();
        debug!(
            "Merged {} trace lines, cursor at {}, {} warning(s)",
            trace.len(),
            cursor,
            warnings.len()
        );

        MergeOutcome {
            skeleton: buffer.into_string(),
            cursor,
            warnings,
        }
    }

    /// Parse trace text, then merge
    pub fn merge_text(&self, trace_text: &str, original: &str) -> Result<MergeOutcome, ConversionError> {
        let trace = StructuralTrace::parse(trace_text)?;
        Ok(self.merge(&trace, original))
    }

    /// Merge and write the skeleton to `out` in the requested encoding
    pub fn merge_to<W: Write>(
        &self,
        trace: &StructuralTrace,
        original: &str,
        out: &mut W,
        encoding: &str,
    ) -> Result<Vec<MergeWarning>, ConversionError> {
        if !is_utf8_label(encoding) {
            return Err(ConversionError::UnsupportedEncoding(encoding.to_string()));
        }

        let outcome = self.merge(trace, original);
        out.write_all(outcome.skeleton.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| ConversionError::Io {
                path: "<skeleton>".to_string(),
                message: e.to_string(),
            })?;

        Ok(outcome.warnings)
    }

    fn placeholder_for(&self, tu: &TuBoundary) -> TuPlaceholder {
        let implicit = tu.locale.is_empty() || locale_tags_match(&tu.locale, &self.options.source_locale);
        TuPlaceholder {
            id: tu.id.clone(),
            is_target: tu.is_target,
            locale: (!implicit).then(|| tu.locale.clone()),
            wildcard: false,
        }
    }

    // Matchers are compiled per call; nothing mutable is shared between merges.
    fn find_tag(remaining: &str, name: &str, seq: u64, closing: bool) -> Option<TagMatch> {
        let escaped = regex::escape(name);
        let pattern = if closing {
            format!(r"</{}(?:\s[^>]*)?>", escaped)
        } else {
            format!(r"<{}(?:\s[^>]*)?/?>", escaped)
        };
        let matcher = Regex::new(&pattern).ok()?;

        matcher
            .find_iter(remaining)
            .find(|m| match SEQ_ATTRIBUTE_REGEX.captures(m.as_str()) {
                Some(cap) => cap
                    .get(1)
                    .or_else(|| cap.get(2))
                    .and_then(|d| d.as_str().parse::<u64>().ok())
                    == Some(seq),
                None => true,
            })
            .map(|m| TagMatch {
                start: m.start(),
                end: m.end(),
                self_closing: !closing && m.as_str().ends_with("/>"),
            })
    }
}

/// Whether an encoding label names UTF-8
pub fn is_utf8_label(label: &str) -> bool {
    matches!(label.trim().to_ascii_lowercase().as_str(), "utf-8" | "utf8")
}
