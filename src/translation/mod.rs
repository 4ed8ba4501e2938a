/*!
 * Translations: the interchange document and target selection.
 *
 * - `interchange`: document model, reader and writer
 * - `phase`: phase values and the phase fallback search
 * - `markers`: protective markers and inline references inside segments
 * - `resolver`: per-locale, per-phase id to text lookup
 */

pub use self::interchange::{InterchangeDocument, Target, TranslationUnit};
pub use self::phase::{Phase, PhaseSelector};
pub use self::resolver::{ResolveOptions, TranslationResolver};

pub mod interchange;
pub mod markers;
pub mod phase;
pub mod resolver;
