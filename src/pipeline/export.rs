/*!
 * Document export: skeleton + interchange document + format table back to
 * a native document for one locale and phase.
 */

use log::{debug, warn};
use std::io::Write;

use crate::app_config::ExportConfig;
use crate::errors::ConversionError;
use crate::format_store::FormatStore;
use crate::substitutor::{filter_for, PlaceholderSubstitutor};
use crate::translation::{InterchangeDocument, ResolveOptions, TranslationResolver};

use super::adapter::{IdentityAdapter, NativeAdapter};
use super::import::skeleton_checksum;

/// Composes resolver, format table and substitutor
pub struct DocumentExporter {
    adapter: Box<dyn NativeAdapter>,
    options: ResolveOptions,
    config: ExportConfig,
}

impl DocumentExporter {
    /// Exporter rendering intermediate markup as is
    pub fn new(config: &ExportConfig, locale: &str) -> Self {
        Self::with_adapter(config, locale, Box::new(IdentityAdapter))
    }

    /// Exporter with a native format adapter behind the substitutor
    pub fn with_adapter(config: &ExportConfig, locale: &str, adapter: Box<dyn NativeAdapter>) -> Self {
        let options = ResolveOptions {
            locale: locale.to_string(),
            phase_name: config.phase.clone(),
            max_phase: config.max_phase,
            escape_ampersands: config.escape_ampersands,
            fallback_to_source: config.fallback_to_source,
        };
        Self {
            adapter,
            options,
            config: config.clone(),
        }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Whether `skeletons` are the ones the document was imported with.
    ///
    /// Documents without a checksum always verify.
    pub fn verify_checksum<S: AsRef<str>>(skeletons: &[S], interchange: &InterchangeDocument) -> bool {
        match &interchange.checksum {
            Some(expected) => expected.eq_ignore_ascii_case(&skeleton_checksum(skeletons)),
            None => true,
        }
    }

    /// Render one skeleton to native text
    pub fn export(
        &self,
        skeleton: &str,
        interchange: &InterchangeDocument,
        formats: &FormatStore,
    ) -> Result<String, ConversionError> {
        if !Self::verify_checksum(&[skeleton], interchange) {
            warn!(
                "Skeleton does not match the checksum recorded for {}; output may be misaligned",
                interchange.original
            );
        }
        self.render(skeleton, interchange, formats)
    }

    /// Render every stream of a multi-stream document, in import order
    pub fn export_streams<S: AsRef<str>>(
        &self,
        skeletons: &[S],
        interchange: &InterchangeDocument,
        formats: &FormatStore,
    ) -> Result<Vec<String>, ConversionError> {
        if !Self::verify_checksum(skeletons, interchange) {
            warn!(
                "Skeletons do not match the checksum recorded for {}; output may be misaligned",
                interchange.original
            );
        }
        skeletons
            .iter()
            .map(|skeleton| self.render(skeleton.as_ref(), interchange, formats))
            .collect()
    }

    fn render(
        &self,
        skeleton: &str,
        interchange: &InterchangeDocument,
        formats: &FormatStore,
    ) -> Result<String, ConversionError> {
        let resolver = TranslationResolver::from_document(interchange, &self.options);
        let mut substitutor = PlaceholderSubstitutor::new(&resolver, formats)
            .with_wildcard_template(self.config.wildcard_template.clone());
        if let Some(filter) = filter_for(self.config.output_escaping) {
            debug!("Applying {} to segment text", filter.name());
            substitutor = substitutor.with_filter(filter);
        }

        let markup = substitutor.render_to_string(skeleton);
        self.adapter.from_markup(&markup)
    }

    /// Render one skeleton into `out`
    pub fn export_to<W: Write>(
        &self,
        skeleton: &str,
        interchange: &InterchangeDocument,
        formats: &FormatStore,
        out: &mut W,
    ) -> Result<(), ConversionError> {
        let native = self.export(skeleton, interchange, formats)?;
        out.write_all(native.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}
