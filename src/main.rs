use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter};

use filekit::app::{Extractor, ItemStatus};
use filekit::audio::SymphoniaDecoder;
use filekit::config::{self, AppConfig};
use filekit::download::{DownloadStatus, Downloader};
use filekit::format::format_size;
use filekit::pdf;

#[derive(Parser)]
#[command(name = "filekit")]
#[command(about = "Local file utilities: audio extraction, PDF page selection, video downloads")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, env = "FILEKIT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the audio track of video files as 16-bit WAV
    Extract {
        /// Video files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve a page range such as "1-5, 8, 11-20"
    Pages {
        /// Page range expression
        range: String,

        /// Number of pages in the document
        #[arg(short = 'n', long)]
        count: usize,

        /// Source PDF file name, used to show the output name
        #[arg(long)]
        name: Option<String>,

        /// Print the selection as JSON
        #[arg(long)]
        json: bool,

        /// Show one output document per page instead of a single extraction
        #[arg(long, requires = "name")]
        split: bool,
    },

    /// Download a file from a direct URL
    Download {
        url: String,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate the default configuration file (at --config when given)
    InitConfig,
}

#[derive(Serialize)]
struct PageSelection {
    pages: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    archive: Option<String>,
}

/// Filter used unless RUST_LOG overrides it
fn filter_directive(debug: bool, level: &str) -> String {
    if debug {
        "filekit=debug,info".to_string()
    } else {
        format!("filekit={},warn", level)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging before anything logs; the configured level is
    // applied once the config file has been read
    let env_filter = if cli.debug {
        None
    } else {
        EnvFilter::try_from_default_env().ok()
    };
    let from_env = env_filter.is_some();
    let filter = env_filter
        .unwrap_or_else(|| EnvFilter::new(filter_directive(cli.debug, "info")));
    let (filter, reload_handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config = match &cli.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };

    if !cli.debug && !from_env {
        reload_handle.modify(|f| {
            *f = EnvFilter::new(filter_directive(false, &config.logging.level))
        })?;
    }

    match cli.command {
        Commands::Extract { files, output } => run_extract(config, files, output).await?,
        Commands::Pages {
            range,
            count,
            name,
            json,
            split,
        } => show_pages(&range, count, name, json, split)?,
        Commands::Download { url, output } => run_download(config, &url, output).await?,
        Commands::InitConfig => init_config(cli.config)?,
    }

    Ok(())
}

async fn run_extract(
    config: AppConfig,
    files: Vec<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let output_dir = output.unwrap_or_else(|| config.output_dir());
    let mut extractor = Extractor::new(
        config.extract.clone(),
        output_dir,
        Arc::new(SymphoniaDecoder::new()),
    );

    let outcome = extractor.add_files(&files).await;
    for skipped in &outcome.skipped {
        eprintln!("Skipped (not a video): {}", skipped.display());
    }
    for unreadable in &outcome.unreadable {
        eprintln!("Unreadable: {}", unreadable.display());
    }
    if outcome.added.is_empty() {
        anyhow::bail!("no video files to process");
    }

    let mut progress = extractor.progress_receiver();
    let watcher = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let p = progress.borrow().clone();
            debug!("Progress: {}/{} done, {} failed", p.done, p.total, p.failed);
        }
    });

    let report = extractor.process_all().await?;

    for item in extractor.items() {
        match (item.status, &item.output) {
            (ItemStatus::Done, Some(out)) => {
                println!("ok    {} ({}) -> {}", item.name, format_size(item.size), out.display())
            }
            _ => println!("error {} ({})", item.name, format_size(item.size)),
        }
    }

    drop(extractor);
    let _ = watcher.await;

    info!(
        "Extracted {} of {} files",
        report.succeeded, report.processed
    );
    if report.failed > 0 {
        anyhow::bail!("{} file(s) failed", report.failed);
    }
    Ok(())
}

fn show_pages(
    range: &str,
    count: usize,
    name: Option<String>,
    json: bool,
    split: bool,
) -> anyhow::Result<()> {
    let pages = pdf::select_pages(range, count)?;

    let (output, files, archive) = match name.as_deref() {
        Some(name) if split => (
            None,
            Some(pdf::split_file_names(name, &pages)),
            Some(pdf::split_archive_name(name)),
        ),
        Some(name) => (Some(pdf::extracted_file_name(name)), None, None),
        None => (None, None, None),
    };

    if json {
        let selection = PageSelection {
            pages: pages.iter().map(|p| p + 1).collect(),
            output,
            files,
            archive,
        };
        println!("{}", serde_json::to_string_pretty(&selection)?);
    } else {
        let list: Vec<String> = pages.iter().map(|p| (p + 1).to_string()).collect();
        println!("Pages: {}", list.join(", "));
        if let Some(out) = output {
            println!("Output: {}", out);
        }
        for file in files.unwrap_or_default() {
            println!("Page file: {}", file);
        }
        if let Some(archive) = archive {
            println!("Archive: {}", archive);
        }
    }
    Ok(())
}

async fn run_download(config: AppConfig, url: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    let dest = output.unwrap_or_else(|| config.output_dir());
    let downloader = Downloader::new(&config.download)?;

    let mut status = downloader.status_receiver();
    let reporter = tokio::spawn(async move {
        let mut last = None;
        while status.changed().await.is_ok() {
            let current = *status.borrow();
            match current {
                DownloadStatus::Checking => eprintln!("Checking URL..."),
                DownloadStatus::Downloading {
                    percent: Some(pct),
                    ..
                } if last != Some(pct) => {
                    last = Some(pct);
                    eprint!("\rDownloading... {}%", pct);
                }
                DownloadStatus::Done | DownloadStatus::Error => {
                    eprintln!();
                    break;
                }
                _ => {}
            }
        }
    });

    let result = downloader.download(url, &dest).await;
    drop(downloader);
    let _ = reporter.await;

    let file = result?;
    println!("{} ({}) -> {}", file.name, file.size_label(), file.path.display());
    Ok(())
}

fn init_config(path: Option<PathBuf>) -> anyhow::Result<()> {
    let config_path = path.unwrap_or_else(config::config_path);

    config::write_default_config(&config_path)?;

    println!("Configuration file created at {:?}", config_path);
    Ok(())
}
