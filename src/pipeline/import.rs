/*!
 * Document import: native streams to skeletons, interchange document and
 * format table.
 *
 * A logical document may consist of several physical streams. Every
 * stream goes through the same three stages (adapter, scanner, merger)
 * while the importer keeps the id spaces shared: allocator counters are
 * suspended after one stream and resumed for the next, TU ids keep
 * counting and all markup entries land in one format table.
 */

use log::{debug, info, warn};

use crate::app_config::ImportConfig;
use crate::errors::ConversionError;
use crate::file_utils::FileManager;
use crate::format_store::{FormatStore, FormatTableBuilder};
use crate::ids::{AllocatorState, IdAllocator};
use crate::skeleton::{ExcludeMarkers, MergeOptions, MergeWarning, SkeletonMerger};
use crate::translation::{InterchangeDocument, TranslationUnit};

use super::adapter::{IdentityAdapter, NativeAdapter};
use super::scanner::{MarkupScanner, ScanContext, ScanRules, TuIdGenerator};

/// Skeleton of one imported stream
#[derive(Debug, Clone)]
pub struct ImportedStream {
    /// Stream name
    pub name: String,

    /// Skeleton text
    pub skeleton: String,

    /// Warnings recorded while merging this stream
    pub warnings: Vec<MergeWarning>,
}

/// Everything produced by importing one logical document
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub streams: Vec<ImportedStream>,
    pub interchange: InterchangeDocument,
    pub formats: FormatStore,
}

impl ImportResult {
    /// Total number of merge warnings
    pub fn warning_count(&self) -> usize {
        self.streams.iter().map(|stream| stream.warnings.len()).sum()
    }

    /// Skeleton of the first stream
    pub fn skeleton(&self) -> &str {
        self.streams.first().map_or("", |stream| stream.skeleton.as_str())
    }
}

/// Checksum recorded in the interchange document for a set of skeletons
pub fn skeleton_checksum<S: AsRef<str>>(skeletons: &[S]) -> String {
    let joined: String = skeletons.iter().map(|s| s.as_ref()).collect();
    FileManager::hash_text(&joined)
}

/// Composes adapter, scanner and merger over one or more streams
pub struct DocumentImporter {
    adapter: Box<dyn NativeAdapter>,
    scanner: MarkupScanner,
    merger: SkeletonMerger,
    strict: bool,
    source_locale: String,
    ids: AllocatorState,
    tu_ids: TuIdGenerator,
    formats: FormatTableBuilder,
    units: Vec<TranslationUnit>,
    streams: Vec<ImportedStream>,
}

impl DocumentImporter {
    /// Importer for intermediate markup input
    pub fn new(config: &ImportConfig, source_locale: &str) -> Self {
        Self::with_adapter(config, source_locale, Box::new(IdentityAdapter))
    }

    /// Importer with a native format adapter in front
    pub fn with_adapter(config: &ImportConfig, source_locale: &str, adapter: Box<dyn NativeAdapter>) -> Self {
        let mut translatable = config.translatable_elements.clone();
        translatable.extend(adapter.translatable_elements().iter().map(|s| s.to_string()));

        let scanner = MarkupScanner::new(ScanRules::new(&translatable, &config.inline_elements, source_locale));
        let merger = SkeletonMerger::new(MergeOptions {
            max_depth: config.max_depth,
            source_locale: source_locale.to_string(),
            container_tags: config.container_elements.clone(),
            exclude: ExcludeMarkers {
                open: config.exclude_open.clone(),
                close: config.exclude_close.clone(),
            },
        });

        Self {
            adapter,
            scanner,
            merger,
            strict: config.strict,
            source_locale: source_locale.to_string(),
            ids: AllocatorState::default(),
            tu_ids: TuIdGenerator::new(config.tu_id_style),
            formats: FormatTableBuilder::new(),
            units: Vec::new(),
            streams: Vec::new(),
        }
    }

    /// Allocator counters after the streams imported so far
    pub fn allocator_state(&self) -> AllocatorState {
        self.ids
    }

    /// Import one physical stream
    pub fn import_stream(&mut self, name: &str, native: &str) -> Result<&ImportedStream, ConversionError> {
        let mut markup = self.adapter.to_markup(native)?;
        // Exclude regions never reach the scanner
        let mut warnings = self.merger.normalize_excludes(&mut markup);

        let mut ids = IdAllocator::from_state(self.ids);
        let scanned = {
            let mut ctx = ScanContext {
                ids: &mut ids,
                formats: &mut self.formats,
                tu_ids: &mut self.tu_ids,
            };
            self.scanner.scan(&markup, &mut ctx)?
        };
        self.ids = ids.suspend();

        let outcome = self.merger.merge_normalized(&scanned.trace, scanned.merge_text);
        warnings.extend(outcome.warnings);

        if self.strict && !warnings.is_empty() {
            for warning in &warnings {
                warn!("{}: {}", name, warning);
            }
            return Err(ConversionError::StrictMode { warnings: warnings.len() });
        }

        debug!(
            "Stream {}: {} units, markup ids up to {}",
            name,
            scanned.units.len(),
            self.ids.last_markup_id
        );
        self.units.extend(scanned.units);
        self.streams.push(ImportedStream {
            name: name.to_string(),
            skeleton: outcome.skeleton,
            warnings,
        });

        Ok(&self.streams[self.streams.len() - 1])
    }

    /// Freeze the collected streams into the three artefacts
    pub fn finish(self, original: &str) -> ImportResult {
        let mut interchange = InterchangeDocument::new(original, &self.source_locale, self.adapter.datatype());
        for unit in self.units {
            interchange.push_unit(unit);
        }

        let skeletons: Vec<&str> = self.streams.iter().map(|s| s.skeleton.as_str()).collect();
        interchange.checksum = Some(skeleton_checksum(&skeletons));

        let formats = self.formats.build();
        info!(
            "Imported {}: {} stream(s), {} units, {} format entries",
            original,
            self.streams.len(),
            interchange.len(),
            formats.len()
        );

        ImportResult {
            streams: self.streams,
            interchange,
            formats,
        }
    }

    /// Import a single-stream document
    pub fn import_document(mut self, original: &str, native: &str) -> Result<ImportResult, ConversionError> {
        self.import_stream(original, native)?;
        Ok(self.finish(original))
    }
}
