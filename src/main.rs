// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use skelweave::app_config::{self, Config, OutputEscaping};
use skelweave::app_controller::{Controller, ExportRequest};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for OutputEscaping to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliOutputEscaping {
    None,
    QuoteDoubling,
    UnicodeEscape,
}

impl From<CliOutputEscaping> for OutputEscaping {
    fn from(cli_escaping: CliOutputEscaping) -> Self {
        match cli_escaping {
            CliOutputEscaping::None => OutputEscaping::None,
            CliOutputEscaping::QuoteDoubling => OutputEscaping::QuoteDoubling,
            CliOutputEscaping::UnicodeEscape => OutputEscaping::UnicodeEscape,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split native documents into skeleton, interchange document and format table
    Import(ImportArgs),

    /// Rebuild a native document for one locale from the three artefacts
    Export(ExportArgs),

    /// Generate shell completions for skelweave
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ImportArgs {
    /// Input document or directory to import
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Directory receiving the artefacts (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// File extension to look for when importing a directory
    #[arg(short, long, default_value = "xml")]
    extension: String,

    /// Fail on any merge warning
    #[arg(long)]
    strict: bool,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Skeleton file produced by import
    #[arg(value_name = "SKELETON")]
    skeleton: PathBuf,

    /// Interchange document (defaults to the skeleton's sibling .xlf)
    #[arg(long)]
    interchange: Option<PathBuf>,

    /// Format table (defaults to the skeleton's sibling .fmt)
    #[arg(long)]
    formats: Option<PathBuf>,

    /// Target locale (e.g., 'fr', 'pt-BR')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Phase to render; "0" renders the latest phase up to --max-phase
    #[arg(long)]
    phase: Option<String>,

    /// Highest numbered phase considered by fallback
    #[arg(long)]
    max_phase: Option<u32>,

    /// Render the source text for segments without a translation
    #[arg(long)]
    fallback_to_source: bool,

    /// Host-format escaping of segment text
    #[arg(long, value_enum)]
    output_escaping: Option<CliOutputEscaping>,

    /// Output directory (defaults to the skeleton's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

/// skelweave - skeleton/placeholder round trips for translatable documents
///
/// Imports native documents into a locale-neutral interchange document plus
/// a skeleton and a format table, and regenerates structurally identical
/// documents from translated interchange documents.
#[derive(Parser, Debug)]
#[command(name = "skelweave")]
#[command(version)]
#[command(about = "Skeleton/placeholder round trips for translatable documents")]
#[command(long_about = "skelweave separates translatable text from document structure and puts it back.

EXAMPLES:
    skelweave import guide.xml                      # Writes guide.skl, guide.xlf, guide.fmt
    skelweave import -e html docs/ -o build/        # Import a directory tree
    skelweave export guide.skl -t fr                # Writes guide.fr.xml
    skelweave export guide.skl -t de --phase 0 --max-phase 3
    skelweave completions bash > skelweave.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Source locale of imported documents
    #[arg(short, long, global = true)]
    source_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set after the config loads
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "skelweave", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Import(args) => run_import(config, args),
        Commands::Export(args) => run_export(config, args),
        Commands::Completions { .. } => Ok(()),
    }
}

fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    if !Path::new(&cli.config_path).exists() {
        warn!("Config file not found at '{}', creating default config.", cli.config_path);
    }
    let mut config = Config::load_or_create(&cli.config_path)
        .with_context(|| format!("Failed to load config: {}", cli.config_path))?;

    if let Some(source_lang) = &cli.source_language {
        config.source_language = source_lang.clone();
    }
    match &cli.log_level {
        Some(level) => config.log_level = level.clone().into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    Ok(config)
}

fn run_import(mut config: Config, args: ImportArgs) -> Result<()> {
    if args.strict {
        config.import.strict = true;
    }
    let controller = Controller::with_config(config)?;

    if args.input_path.is_file() {
        let output_dir = args
            .output_dir
            .unwrap_or_else(|| args.input_path.parent().unwrap_or(Path::new(".")).to_path_buf());
        let report = controller.import_file(&args.input_path, &output_dir)?;
        info!("Skeleton: {}", report.skeleton.display());
        info!("Interchange: {}", report.interchange.display());
        info!("Format table: {}", report.formats.display());
    } else if args.input_path.is_dir() {
        let output_dir = args.output_dir.unwrap_or_else(|| args.input_path.clone());
        let reports = controller.import_folder(&args.input_path, &output_dir, &args.extension)?;
        info!("Imported {} file(s)", reports.len());
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", args.input_path));
    }

    Ok(())
}

fn run_export(mut config: Config, args: ExportArgs) -> Result<()> {
    if let Some(target_lang) = args.target_language {
        config.target_language = target_lang;
    }
    if args.phase.is_some() {
        config.export.phase = args.phase;
    }
    if let Some(max_phase) = args.max_phase {
        config.export.max_phase = max_phase;
    }
    if args.fallback_to_source {
        config.export.fallback_to_source = true;
    }
    if let Some(escaping) = args.output_escaping {
        config.export.output_escaping = escaping.into();
    }

    let output_dir = args
        .output_dir
        .unwrap_or_else(|| args.skeleton.parent().unwrap_or(Path::new(".")).to_path_buf());
    let mut request = ExportRequest::from_skeleton(&args.skeleton, &output_dir);
    if let Some(interchange) = args.interchange {
        request.interchange = interchange;
    }
    if let Some(formats) = args.formats {
        request.formats = formats;
    }

    let controller = Controller::with_config(config)?;
    controller.export_file(&request)?;
    Ok(())
}
