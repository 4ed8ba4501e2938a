/*!
 * Markup scanner: the shared intermediate-markup stage of every import.
 *
 * One pass over intermediate markup produces everything the merger and
 * the interchange writer need:
 *
 * - a structural trace of every element boundary, numbered from the
 *   shared allocator's structural position
 * - the merge text, i.e. the markup with comments, processing
 *   instructions, declarations and CDATA sections replaced by
 *   `<format id='N'/>` tokens whose content went to the format table;
 *   native tags that would read as skeleton tokens are stored the same way
 * - one translation unit per translatable element holding text
 *
 * A translatable element becomes a unit only when everything inside it is
 * text, inline elements or markup constructs; otherwise it is treated as
 * an ordinary structural element and its children are scanned in turn.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use uuid::Uuid;

use crate::app_config::TuIdStyle;
use crate::errors::TraceError;
use crate::format_store::FormatTableBuilder;
use crate::ids::IdAllocator;
use crate::markup::{escape_text, parse_attributes};
use crate::skeleton::{has_placeholder_token, markup_placeholder, StructuralTrace, TraceWriter};
use crate::translation::markers::{inline_reference, wrap_core_text};
use crate::translation::TranslationUnit;

static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?s)(<!--.*?-->)",
        r"|<!\[CDATA\[(.*?)\]\]>",
        r"|(<\?.*?\?>|<![A-Za-z][^>\[]*(?:\[.*?\])?\s*>)",
        r"|</([A-Za-z_][\w:.-]*)\s*>",
        r#"|<([A-Za-z_][\w:.-]*)(?:\s+[^\s=/>]+\s*=\s*(?:"[^"]*"|'[^']*'))*\s*(/?)>"#,
    ))
    .expect("Invalid markup token regex")
});

// Segments of this element fill a target slot rather than a source slot
const TARGET_ELEMENT: &str = "target";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    Comment(&'a str),
    Cdata { raw: &'a str, payload: &'a str },
    // processing instruction or declaration
    Instruction(&'a str),
    Start { raw: &'a str, name: &'a str, self_closing: bool },
    End { raw: &'a str, name: &'a str },
}

impl<'a> Token<'a> {
    fn raw(&self) -> &'a str {
        match *self {
            Token::Text(raw) | Token::Comment(raw) | Token::Instruction(raw) => raw,
            Token::Cdata { raw, .. } | Token::Start { raw, .. } | Token::End { raw, .. } => raw,
        }
    }
}

// Anything that does not match a construct, a stray `<` included, is text.
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for cap in TOKEN_REGEX.captures_iter(text) {
        let Some(whole) = cap.get(0) else { continue };
        if whole.start() > last {
            tokens.push(Token::Text(&text[last..whole.start()]));
        }
        let raw = whole.as_str();
        let token = if cap.get(1).is_some() {
            Token::Comment(raw)
        } else if let Some(payload) = cap.get(2) {
            Token::Cdata { raw, payload: payload.as_str() }
        } else if cap.get(3).is_some() {
            Token::Instruction(raw)
        } else if let Some(name) = cap.get(4) {
            Token::End { raw, name: name.as_str() }
        } else if let Some(name) = cap.get(5) {
            Token::Start {
                raw,
                name: name.as_str(),
                self_closing: cap.get(6).is_some_and(|slash| !slash.as_str().is_empty()),
            }
        } else {
            Token::Text(raw)
        };
        tokens.push(token);
        last = whole.end();
    }
    if last < text.len() {
        tokens.push(Token::Text(&text[last..]));
    }

    tokens
}

/// Issues TU ids for one logical document
#[derive(Debug, Clone, Default)]
pub struct TuIdGenerator {
    style: TuIdStyle,
    issued: u64,
}

impl TuIdGenerator {
    pub fn new(style: TuIdStyle) -> Self {
        Self { style, issued: 0 }
    }

    pub fn next_id(&mut self) -> String {
        self.issued += 1;
        match self.style {
            TuIdStyle::Sequential => format!("tu{}", self.issued),
            TuIdStyle::Uuid => Uuid::new_v4().to_string(),
        }
    }

    /// Number of ids handed out
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

/// Which elements carry translatable text
#[derive(Debug, Clone)]
pub struct ScanRules {
    pub translatable: HashSet<String>,
    pub inline: HashSet<String>,
    pub source_locale: String,
}

impl ScanRules {
    pub fn new<S: AsRef<str>>(translatable: &[S], inline: &[S], source_locale: &str) -> Self {
        Self {
            translatable: translatable.iter().map(|s| s.as_ref().to_string()).collect(),
            inline: inline.iter().map(|s| s.as_ref().to_string()).collect(),
            source_locale: source_locale.to_string(),
        }
    }
}

/// Shared id state threaded through every stream of a document
pub struct ScanContext<'a> {
    pub ids: &'a mut IdAllocator,
    pub formats: &'a mut FormatTableBuilder,
    pub tu_ids: &'a mut TuIdGenerator,
}

impl ScanContext<'_> {
    // @returns: Id of a new format entry holding a markup construct
    fn store_markup(&mut self, token: Token) -> u64 {
        let id = self.ids.next_inline_markup_id();
        match token {
            Token::Cdata { payload, .. } => self.formats.insert_cdata(id, payload),
            other => self.formats.insert(id, other.raw()),
        }
        id
    }
}

/// Products of one scan
#[derive(Debug, Clone)]
pub struct ScanOutput {
    pub trace: StructuralTrace,
    pub merge_text: String,
    pub units: Vec<TranslationUnit>,
}

/// Intermediate markup to trace, merge text and translation units
#[derive(Debug, Clone)]
pub struct MarkupScanner {
    rules: ScanRules,
}

impl MarkupScanner {
    pub fn new(rules: ScanRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ScanRules {
        &self.rules
    }

    /// Scan one stream of intermediate markup
    pub fn scan(&self, text: &str, ctx: &mut ScanContext) -> Result<ScanOutput, TraceError> {
        let tokens = tokenize(text);
        let mut writer = TraceWriter::new();
        let mut merge_text = String::with_capacity(text.len());
        let mut units = Vec::new();
        let mut open: Vec<(&str, u64)> = Vec::new();
        let mut index = 0;

        while index < tokens.len() {
            match tokens[index] {
                token @ (Token::Start { raw, .. } | Token::End { raw, .. }) if has_placeholder_token(raw) => {
                    let id = ctx.store_markup(token);
                    merge_text.push_str(&markup_placeholder(id));
                }
                Token::Start { raw, name, self_closing } => {
                    if !self_closing && self.rules.translatable.contains(name) {
                        if let Some(end) = self.segment_end(&tokens, index, name) {
                            let seq = ctx.ids.advance_structural_position();
                            writer.open(name, seq);
                            merge_text.push_str(raw);

                            let id = ctx.tu_ids.next_id();
                            let is_target = name == TARGET_ELEMENT;
                            let locale = self.segment_locale(raw, is_target);
                            writer.tu(&id, is_target, &locale);
                            let source = Self::segment_source(&tokens[index + 1..end], ctx, &mut merge_text);
                            units.push(TranslationUnit::new(&id, &locale, wrap_core_text(&source)));

                            writer.close(name, seq);
                            merge_text.push_str(tokens[end].raw());
                            index = end + 1;
                            continue;
                        }
                    }

                    let seq = ctx.ids.advance_structural_position();
                    writer.open(name, seq);
                    if self_closing {
                        writer.close(name, ctx.ids.advance_structural_position());
                    } else {
                        open.push((name, seq));
                    }
                    merge_text.push_str(raw);
                }
                Token::End { raw, name } => {
                    // Elements still open inside this one are closed implicitly
                    if let Some(depth) = open.iter().rposition(|(open_name, _)| *open_name == name) {
                        let (_, seq) = open[depth];
                        open.truncate(depth);
                        writer.close(name, seq);
                    }
                    merge_text.push_str(raw);
                }
                Token::Text(raw) => merge_text.push_str(raw),
                other => {
                    let id = ctx.store_markup(other);
                    merge_text.push_str(&markup_placeholder(id));
                }
            }
            index += 1;
        }

        if !open.is_empty() {
            debug!("{} element(s) left open at end of stream", open.len());
        }

        let trace = writer.finish()?;
        debug!("Scanned {} tokens: {} trace lines, {} units", tokens.len(), trace.len(), units.len());

        Ok(ScanOutput { trace, merge_text, units })
    }

    // @returns: Locale of a segment; target elements may carry their own
    fn segment_locale(&self, raw: &str, is_target: bool) -> String {
        if is_target {
            if let Some(locale) = parse_attributes(raw).remove("xml:lang") {
                return locale;
            }
        }
        self.rules.source_locale.clone()
    }

    // @returns: Index of the closing tag when the element at `start` is a segment
    fn segment_end(&self, tokens: &[Token], start: usize, name: &str) -> Option<usize> {
        let mut has_text = false;

        for (offset, token) in tokens[start + 1..].iter().enumerate() {
            match *token {
                Token::End { name: inner, .. } if inner == name => {
                    return has_text.then_some(start + 1 + offset);
                }
                Token::Start { name: inner, .. } | Token::End { name: inner, .. } => {
                    if inner == name || !self.rules.inline.contains(inner) {
                        return None;
                    }
                }
                Token::Text(text) => has_text |= !text.trim().is_empty(),
                _ => {}
            }
        }

        None
    }

    // @returns: Escaped segment source with inline references
    fn segment_source(content: &[Token], ctx: &mut ScanContext, merge_text: &mut String) -> String {
        let mut source = String::new();

        for token in content {
            match *token {
                Token::Text(raw) => {
                    source.push_str(&escape_text(raw));
                    merge_text.push_str(raw);
                }
                Token::Start { raw, self_closing, .. } => {
                    let id = ctx.ids.next_inline_markup_id();
                    ctx.formats.insert(id, raw);
                    source.push_str(&inline_reference(if self_closing { "ph" } else { "bpt" }, id));
                    merge_text.push_str(raw);
                }
                Token::End { raw, .. } => {
                    let id = ctx.ids.next_inline_markup_id();
                    ctx.formats.insert(id, raw);
                    source.push_str(&inline_reference("ept", id));
                    merge_text.push_str(raw);
                }
                other => {
                    let id = ctx.store_markup(other);
                    source.push_str(&inline_reference("ph", id));
                    merge_text.push_str(&markup_placeholder(id));
                }
            }
        }

        source
    }
}
