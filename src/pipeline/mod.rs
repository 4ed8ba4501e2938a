/*!
 * Import and export pipelines.
 *
 * - `adapter`: native format to intermediate markup and back
 * - `scanner`: intermediate markup to trace, merge text and units
 * - `import`: adapter, scanner and merger over the streams of a document
 * - `export`: resolver, format table and substitutor for one locale
 */

pub use self::adapter::{adapter_for_path, IdentityAdapter, NativeAdapter, PlainTextAdapter};
pub use self::export::DocumentExporter;
pub use self::import::{skeleton_checksum, DocumentImporter, ImportResult, ImportedStream};
pub use self::scanner::{MarkupScanner, ScanContext, ScanOutput, ScanRules, TuIdGenerator};

pub mod adapter;
pub mod export;
pub mod import;
pub mod scanner;
