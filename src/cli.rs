//! CLI parsing and orchestration. Parses args, merges config, runs the scan, writes the optional
//! report. Maps errors to exit codes.

use crate::config;
use crate::logging::ProgressSlot;
use crate::model::{ChapterId, ScanJob, ScanReport, Title};
use crate::scan::{
    PoliteClient, PoliteClientBuilder, ScanError, ScanPatterns, Scanner, SiteLayout,
    DEFAULT_CHAPTER_PATTERN, DEFAULT_DOMAIN, DEFAULT_PAGE_COUNT_PATTERN,
};
use clap::Parser;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Scan(#[from] ScanError),

    #[error("Cannot write report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{missing} page(s) could not be downloaded.")]
    Incomplete { missing: usize },
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Scan(_) | CliRunError::Report { .. } => 2,
            CliRunError::Incomplete { .. } => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "scandl")]
#[command(about = "Download manga scans chapter by chapter")]
#[command(
    after_help = "Config file keys (dir_path, domain, user_agent, request_delay_ms, timeout_secs, retry_count, retry_backoff_secs, chapter_pattern, page_count_pattern) are read from ./scandl.toml or ~/.config/scandl/config.toml. CLI flags override config."
)]
pub struct Args {
    /// Label of the scan to download, as used in the site's URLs. Ex: shingekinokyojin
    pub scan_label: String,

    /// Chapters to download. Ex: 1 2 3 4. Default: every chapter listed on the index page.
    #[arg(value_parser = parse_chapter)]
    pub chapters: Vec<ChapterId>,

    /// Download directory. Default: ~/scan_dl
    #[arg(short, long)]
    pub dir_path: Option<PathBuf>,

    /// Re-download files that already exist and overwrite them.
    #[arg(short, long)]
    pub ignore_files: bool,

    /// Scan host (overrides config). Default: http://www.lecture-en-ligne.com
    #[arg(long)]
    pub domain: Option<String>,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Delay between requests in milliseconds (overrides config; default 250).
    #[arg(long)]
    pub delay: Option<u64>,

    /// Request timeout in seconds (overrides config; default 30).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Resolve chapters and page counts, print them, download nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Write a JSON report of downloaded, already present and missing pages to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Exit with code 3 when any page could not be downloaded.
    #[arg(long)]
    pub strict: bool,

    /// Suppress progress output (warnings and errors only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug logging and verbose error chain.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Default log filter for these flags; RUST_LOG overrides it.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

fn parse_chapter(s: &str) -> Result<ChapterId, String> {
    let n: ChapterId = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid chapter '{}': expected a positive integer", s))?;
    if n == 0 {
        return Err("Invalid chapter '0': chapters start at 1".to_string());
    }
    Ok(n)
}

/// Fail early when the report cannot be written, before spending a whole run.
fn validate_report_path(path: &Path) -> Result<(), CliRunError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(CliRunError::InvalidInput(format!(
                "Cannot write report: {}: parent directory does not exist.",
                path.display()
            )));
        }
    }
    Ok(())
}

fn write_report(report: &ScanReport, path: &Path) -> Result<(), CliRunError> {
    let f = std::fs::File::create(path).map_err(|e| CliRunError::Report {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::to_writer_pretty(f, report).map_err(|e| CliRunError::Report {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

/// Client settings from CLI flags, then config; anything unset keeps the builder's default.
fn client_builder(args: &Args, config: Option<&config::Config>) -> PoliteClientBuilder {
    let mut builder = PoliteClient::builder();
    if let Some(ms) = args.delay.or_else(|| config.and_then(|c| c.request_delay_ms)) {
        builder = builder.delay_ms(ms);
    }
    if let Some(secs) = args.timeout.or_else(|| config.and_then(|c| c.timeout_secs)) {
        builder = builder.timeout_secs(secs);
    }
    if let Some(n) = config.and_then(|c| c.retry_count) {
        builder = builder.retry_count(n);
    }
    if let Some(secs) = config.and_then(|c| c.retry_backoff_secs.clone()) {
        builder = builder.retry_backoff_secs(secs);
    }
    if let Some(ua) = args
        .user_agent
        .clone()
        .or_else(|| config.and_then(|c| c.user_agent.clone()))
    {
        builder = builder.user_agent(ua);
    }
    builder
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
/// The download bar is registered in `progress` so log lines are written around it.
pub fn run(args: &Args, progress: &ProgressSlot) -> Result<(), CliRunError> {
    let title = Title::new(args.scan_label.clone())
        .ok_or_else(|| CliRunError::InvalidInput(ScanError::EmptyTitle.to_string()))?;

    let config = config::load_config().map_err(CliRunError::InvalidInput)?;

    if let Some(ref path) = args.report {
        validate_report_path(path)?;
    }

    let root: PathBuf = args
        .dir_path
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.dir_path.clone()))
        .unwrap_or_else(config::default_scan_path);

    let domain = args
        .domain
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.domain.clone()))
        .unwrap_or_else(|| DEFAULT_DOMAIN.to_string());
    let layout = SiteLayout::new(&domain).map_err(|e| CliRunError::InvalidInput(e.to_string()))?;

    let chapter_pattern = config
        .as_ref()
        .and_then(|c| c.chapter_pattern.as_deref())
        .unwrap_or(DEFAULT_CHAPTER_PATTERN);
    let page_count_pattern = config
        .as_ref()
        .and_then(|c| c.page_count_pattern.as_deref())
        .unwrap_or(DEFAULT_PAGE_COUNT_PATTERN);
    let patterns = ScanPatterns::new(chapter_pattern, page_count_pattern)
        .map_err(|e| CliRunError::InvalidInput(e.to_string()))?;

    let mut client = client_builder(args, config.as_ref())
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

    let job = ScanJob {
        title,
        chapters: args.chapters.clone(),
        root,
        ignore_existing: args.ignore_files,
    };
    let mut scanner = Scanner::new(&mut client, &layout, &patterns);

    let plan = scanner.plan(&job);
    if plan.is_empty() {
        tracing::warn!("No chapters found for {}", job.title);
    }

    if args.dry_run {
        for chapter in &plan {
            eprintln!(
                "Chapter {}: {} pages -> {}",
                chapter.chapter,
                chapter.pages.len(),
                job.chapter_dir(chapter.chapter).display()
            );
        }
        eprintln!("Chapters: {}", plan.len());
        return Ok(());
    }

    let progress_state: RefCell<Option<indicatif::ProgressBar>> = RefCell::new(None);
    let progress_cb = |done: usize, total: usize| {
        if total == 0 {
            return;
        }
        let mut state = progress_state.borrow_mut();
        let pb = state.get_or_insert_with(|| {
            let bar = indicatif::ProgressBar::new(total as u64);
            let style = indicatif::ProgressStyle::default_bar()
                .template("{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .progress_chars("█▉▊▋▌▍▎▏ ");
            bar.set_style(style);
            bar.enable_steady_tick(Duration::from_millis(80));
            progress.set(Some(bar.clone()));
            bar
        });
        pb.set_position(done as u64);
        pb.set_message(format!("Page {}/{}", done, total));
    };
    let on_page: Option<&dyn Fn(usize, usize)> = if args.quiet { None } else { Some(&progress_cb) };

    let result = scanner.download(&job, &plan, on_page);

    if let Some(pb) = progress_state.borrow_mut().take() {
        progress.set(None);
        pb.disable_steady_tick();
        pb.finish_and_clear();
    }
    let report = result?;

    if let Some(ref path) = args.report {
        write_report(&report, path)?;
    }

    if !args.quiet {
        eprintln!(
            "{} page(s) saved under {}, {} missing",
            report.pages_succeeded(),
            job.root.join(job.title.as_str()).display(),
            report.pages_missing()
        );
    }

    if args.strict && !report.is_complete() {
        return Err(CliRunError::Incomplete {
            missing: report.pages_missing(),
        });
    }
    Ok(())
}
