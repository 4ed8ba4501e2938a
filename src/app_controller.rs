use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::format_store::FormatStore;
use crate::pipeline::{adapter_for_path, DocumentExporter, DocumentImporter};
use crate::translation::InterchangeDocument;

// @module: Application controller for import and export jobs

/// Skeleton file extension
pub const SKELETON_EXTENSION: &str = "skl";

/// Interchange document file extension
pub const INTERCHANGE_EXTENSION: &str = "xlf";

/// Format table file extension
pub const FORMAT_TABLE_EXTENSION: &str = "fmt";

/// Paths written by one import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub input: PathBuf,
    pub skeleton: PathBuf,
    pub interchange: PathBuf,
    pub formats: PathBuf,
    pub units: usize,
    pub warnings: usize,
}

/// Artefacts an export reads
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub skeleton: PathBuf,
    pub interchange: PathBuf,
    pub formats: PathBuf,
    pub output_dir: PathBuf,
}

impl ExportRequest {
    /// Sibling artefacts of a skeleton path
    pub fn from_skeleton<P1: AsRef<Path>, P2: AsRef<Path>>(skeleton: P1, output_dir: P2) -> Self {
        let skeleton = skeleton.as_ref();
        let dir = skeleton.parent().unwrap_or(Path::new("."));
        Self {
            skeleton: skeleton.to_path_buf(),
            interchange: FileManager::artefact_path(skeleton, dir, INTERCHANGE_EXTENSION),
            formats: FileManager::artefact_path(skeleton, dir, FORMAT_TABLE_EXTENSION),
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }
}

/// Main application controller for conversion jobs
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with a validated configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Import one native document into skeleton, interchange document and
    /// format table inside `output_dir`
    pub fn import_file(&self, input_file: &Path, output_dir: &Path) -> Result<ImportReport> {
        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let start_time = Instant::now();
        let native = FileManager::read_to_string(input_file)?;
        let original = input_file
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        let importer = DocumentImporter::with_adapter(
            &self.config.import,
            &self.config.source_language,
            adapter_for_path(input_file),
        );
        let result = importer
            .import_document(&original, &native)
            .with_context(|| format!("Failed to import {:?}", input_file))?;

        FileManager::ensure_dir(output_dir)?;
        let report = ImportReport {
            input: input_file.to_path_buf(),
            skeleton: FileManager::artefact_path(input_file, output_dir, SKELETON_EXTENSION),
            interchange: FileManager::artefact_path(input_file, output_dir, INTERCHANGE_EXTENSION),
            formats: FileManager::artefact_path(input_file, output_dir, FORMAT_TABLE_EXTENSION),
            units: result.interchange.len(),
            warnings: result.warning_count(),
        };

        FileManager::write_to_file(&report.skeleton, result.skeleton())?;
        result.interchange.save(&report.interchange)?;
        result.formats.save(&report.formats)?;

        if report.warnings > 0 {
            warn!("{}: {} merge warning(s)", original, report.warnings);
        }
        info!(
            "Imported {} ({} units) in {}",
            report.input.display(),
            report.units,
            Self::format_duration(start_time.elapsed())
        );

        Ok(report)
    }

    /// Import every file with `extension` under `input_dir`; failures are
    /// logged and counted, not fatal
    pub fn import_folder(&self, input_dir: &Path, output_dir: &Path, extension: &str) -> Result<Vec<ImportReport>> {
        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files = FileManager::find_files(input_dir, extension)?;
        if files.is_empty() {
            return Err(anyhow!("No .{} files found in directory: {:?}", extension, input_dir));
        }

        let start_time = Instant::now();
        let folder_pb = ProgressBar::new(files.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("=>-"));

        let mut reports = Vec::with_capacity(files.len());
        let mut error_count = 0;

        for file in &files {
            let file_name = file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Importing: {}", file_name));

            // Keep the folder layout below the output directory
            let relative_dir = file
                .parent()
                .and_then(|parent| parent.strip_prefix(input_dir).ok())
                .unwrap_or(Path::new(""));

            match self.import_file(file, &output_dir.join(relative_dir)) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!("Error importing {}: {:#}", file_name, e);
                    error_count += 1;
                }
            }
            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder import complete");

        let summary = format!(
            "Folder import completed: {} imported, {} errors in {}",
            reports.len(),
            error_count,
            Self::format_duration(start_time.elapsed())
        );
        info!("{}", summary);
        let log_file_path = output_dir.join("skelweave.issues.log");
        if let Err(e) = FileManager::append_to_log_file(&log_file_path, &summary) {
            warn!("Failed to write folder summary to {:?}: {}", log_file_path, e);
        }

        Ok(reports)
    }

    /// Render a skeleton for the configured target locale; returns the
    /// written path
    pub fn export_file(&self, request: &ExportRequest) -> Result<PathBuf> {
        let skeleton = FileManager::read_to_string(&request.skeleton)?;
        let interchange = InterchangeDocument::load(&request.interchange)?;
        let formats = FormatStore::load(&request.formats)?;

        let original = if interchange.original.is_empty() {
            request.skeleton.clone()
        } else {
            PathBuf::from(&interchange.original)
        };
        let locale = &self.config.target_language;

        let exporter = DocumentExporter::with_adapter(&self.config.export, locale, adapter_for_path(&original));
        let output = exporter
            .export(&skeleton, &interchange, &formats)
            .with_context(|| format!("Failed to export {:?}", request.skeleton))?;

        let output_path = FileManager::generate_output_path(&original, &request.output_dir, locale);
        FileManager::write_to_file(&output_path, &output)?;
        info!("Success: {}", output_path.display());

        Ok(output_path)
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
