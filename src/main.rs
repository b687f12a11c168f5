// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_arguments)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record};

use pagelift::app_config::{Config, LogLevel, OutputFormat};
use pagelift::extraction::lopdf_source::LopdfContentSource;
use pagelift::extraction::PdfContentSource;
use pagelift::file_utils::FileManager;
use pagelift::pipeline::PipelineCoordinator;
use pagelift::translation::{CacheStore, TranslationCache};

/// CLI wrapper for OutputFormat to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliOutputFormat {
    Html,
    Pdf,
    Both,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(cli_format: CliOutputFormat) -> Self {
        match cli_format {
            CliOutputFormat::Html => OutputFormat::Html,
            CliOutputFormat::Pdf => OutputFormat::Pdf,
            CliOutputFormat::Both => OutputFormat::Both,
        }
    }
}

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate PDF documents while preserving their layout (default command)
    #[command(alias = "translate")]
    Translate(TranslateArgs),

    /// Extract embedded images from a PDF to numbered files
    ExtractImages(ExtractImagesArgs),

    /// Generate shell completions for pagelift
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input PDF file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Output directory for translated documents
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Source language code (e.g., 'ja')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<CliOutputFormat>,

    /// Page worker pool size
    #[arg(short, long)]
    workers: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "pagelift.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Parser, Debug)]
struct ExtractImagesArgs {
    /// Input PDF file
    #[arg(value_name = "INPUT_PDF")]
    input_pdf: PathBuf,

    /// Output file path prefix for extracted images
    #[arg(value_name = "OUTPUT_PREFIX")]
    output_prefix: String,
}

#[derive(Parser, Debug)]
#[command(
    name = "pagelift",
    about = "Layout-preserving translation of Japanese magazine PDFs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Compact stderr logger; progress bars own stdout
struct AppLogger;

impl Log for AppLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let prefix = match record.level() {
                Level::Error => "ERROR",
                Level::Warn => " WARN",
                Level::Info => " INFO",
                Level::Debug => "DEBUG",
                Level::Trace => "TRACE",
            };
            eprintln!("{} {}", prefix, record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: AppLogger = AppLogger;

fn install_logger(level: &LogLevel) {
    let filter = match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    };
    // A second install only happens in tests; ignore it.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(filter);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Translate(args) => run_translate(args).await,
        Commands::ExtractImages(args) => run_extract_images(args),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "pagelift", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run_translate(args: TranslateArgs) -> Result<()> {
    let mut config = Config::from_file_or_default(&args.config_path)?;

    // CLI flags override config fields.
    if let Some(source) = args.source_language {
        config.source_language = source;
    }
    if let Some(target) = args.target_language {
        config.target_language = target;
    }
    if let Some(format) = args.format {
        config.pipeline.outputs = format.into();
    }
    if let Some(workers) = args.workers {
        config.pipeline.worker_pool_size = Some(workers);
    }
    if let Some(level) = args.log_level {
        config.log_level = level.into();
    }

    install_logger(&config.log_level);
    config.validate()?;

    let inputs = collect_inputs(&args.input_path)?;
    info!("processing {} document(s)", inputs.len());

    // One cache (and persistence lifecycle) spans all documents of the run.
    let cache = TranslationCache::new(config.translation.cache_enabled);
    let store = match &config.translation.cache_persistence_path {
        Some(path) => {
            let store = CacheStore::open(path)?;
            store.load_into(&cache)?;
            Some(store)
        }
        None => None,
    };

    for input in &inputs {
        translate_one(input, &args.output_dir, &config, cache.clone()).await?;
    }

    if let Some(store) = store {
        store.flush(&cache)?;
    }

    Ok(())
}

async fn translate_one(
    input: &PathBuf,
    output_dir: &PathBuf,
    config: &Config,
    cache: TranslationCache,
) -> Result<()> {
    info!("translating {:?}", input);
    let pdf_bytes = FileManager::read_bytes(input)?;
    let source = Arc::new(LopdfContentSource::load(&pdf_bytes)?);

    let coordinator = PipelineCoordinator::from_config(config, source, None, cache)?;

    // Ctrl-C requests cooperative cancellation; in-flight pages finish.
    let cancel = coordinator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("cancellation requested, finishing in-flight pages");
            cancel.cancel();
        }
    });

    let progress = ProgressBar::new(0).with_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} pages {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let progress_clone = progress.clone();

    let result = coordinator
        .translate_document(move |done, total| {
            progress_clone.set_length(total as u64);
            progress_clone.set_position(done as u64);
        })
        .await?;
    progress.finish_and_clear();

    for failure in &result.errors {
        warn!("page {}: {}", failure.page_index + 1, failure.error);
    }
    info!(
        "{}/{} page(s) translated, {} unit(s) failed, {} cache hit(s)",
        result.pages.len(),
        result.stats.pages_total,
        result.stats.units_failed,
        result.stats.cache_hits
    );

    if let Some(html) = &result.html {
        let path = FileManager::generate_output_path(
            input,
            output_dir,
            &config.target_language,
            "html",
        );
        FileManager::write_to_file(&path, html)?;
        info!("wrote {:?}", path);
    }
    if let Some(pdf) = &result.pdf {
        let path =
            FileManager::generate_output_path(input, output_dir, &config.target_language, "pdf");
        FileManager::write_bytes(&path, pdf)?;
        info!("wrote {:?}", path);
    }

    Ok(())
}

fn run_extract_images(args: ExtractImagesArgs) -> Result<()> {
    install_logger(&LogLevel::Info);

    let pdf_bytes = FileManager::read_bytes(&args.input_pdf)?;
    let source = LopdfContentSource::load(&pdf_bytes)?;

    let mut counter = 0usize;
    for page_index in 0..source.page_count()? {
        for region in source.embedded_images(page_index)? {
            let extension = match pagelift::layout::ImageFormat::sniff(&region.data) {
                pagelift::layout::ImageFormat::Jpeg => "jpg",
                pagelift::layout::ImageFormat::Png => "png",
                pagelift::layout::ImageFormat::Other => "bin",
            };
            let path = PathBuf::from(format!("{}_{:03}.{}", args.output_prefix, counter, extension));
            FileManager::write_bytes(&path, &region.data)?;
            info!("wrote {:?}", path);
            counter += 1;
        }
    }

    println!("Extracted {} images", counter);
    Ok(())
}

fn collect_inputs(input_path: &PathBuf) -> Result<Vec<PathBuf>> {
    if FileManager::file_exists(input_path) {
        Ok(vec![input_path.clone()])
    } else if FileManager::dir_exists(input_path) {
        let files = FileManager::find_files(input_path, "pdf")?;
        if files.is_empty() {
            Err(anyhow!("no PDF files found under {:?}", input_path))
        } else {
            Ok(files)
        }
    } else {
        Err(anyhow!("input path does not exist: {:?}", input_path))
            .with_context(|| "expected a PDF file or a directory of PDFs")
    }
}
