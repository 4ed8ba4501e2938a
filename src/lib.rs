/*!
 * # skelweave - skeleton/placeholder round trips for translatable documents
 *
 * Converts documents between their native markup and a locale-neutral
 * interchange document, and regenerates structurally identical documents
 * from translated interchange documents.
 *
 * ## Features
 *
 * - Skeletons: the original document with every translatable span replaced
 *   in place by a placeholder
 * - Format tables: inline markup moved out of segments behind numeric ids
 * - Per-locale, per-phase target selection with phase fallback
 * - Several physical streams per logical document with shared id spaces
 * - Plain text and markup adapters behind one pipeline
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `ids`: inline-markup id and structural position allocation
 * - `format_store`: format table builder, reader and lookups
 * - `skeleton`: structural traces, the skeleton model and the merger
 * - `translation`: interchange document, phases and the resolver
 * - `substitutor`: skeleton replay into a native document
 * - `pipeline`: adapters, the markup scanner, import and export
 * - `app_config`: Configuration management
 * - `app_controller`: File-level import and export jobs
 * - `file_utils`: File system operations
 * - `language_utils`: Locale tag utilities
 * - `markup`: Regex-level attribute and entity helpers
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod format_store;
pub mod ids;
pub mod language_utils;
pub mod markup;
pub mod pipeline;
pub mod skeleton;
pub mod substitutor;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, ConversionError, FormatTableError, InterchangeError, TraceError};
pub use format_store::{FormatStore, FormatTableBuilder};
pub use ids::IdAllocator;
pub use language_utils::{get_language_name, locale_tags_match, normalize_locale};
pub use skeleton::{Skeleton, SkeletonMerger, StructuralTrace};
pub use substitutor::PlaceholderSubstitutor;
pub use translation::{InterchangeDocument, TranslationResolver};
