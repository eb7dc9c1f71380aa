//! cfind CLI - search a directory tree and collect matching files
//!
//! Usage:
//!   cfind <root> <output> <term> [--regex] [--extensions <regex>]
//!   cfind --config search.json [<root> <output> <term>] [--json]

use anyhow::{Context, Result};
use cfind_core::{
    run_search, CancellationToken, Phase, ProgressReporter, ProgressUpdate, RunReport, RunStatus,
    SearchConfig,
};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cfind")]
#[command(about = "Find files whose content matches a term and copy them to a folder", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory to search
    root: Option<PathBuf>,

    /// Directory matching files are copied into
    output: Option<PathBuf>,

    /// Text to look for (a regular expression with --regex)
    term: Option<String>,

    /// Treat the search term as a regular expression
    #[arg(long)]
    regex: bool,

    /// Regular expression over file extensions, without the dot
    #[arg(short, long)]
    extensions: Option<String>,

    /// JSON file with default search settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors, no progress line
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Settings from `--config` (if any) with command-line values on top
    fn load_config(&self) -> Result<SearchConfig> {
        let base = match &self.config {
            Some(path) => SearchConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => SearchConfig::default(),
        };
        Ok(self.merge_overrides(base))
    }

    fn merge_overrides(&self, mut config: SearchConfig) -> SearchConfig {
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(term) = &self.term {
            config.term = term.clone();
        }
        if self.regex {
            config.regex = true;
        }
        if let Some(extensions) = &self.extensions {
            config.extensions = extensions.clone();
        }
        config
    }

    fn log_filter(&self) -> EnvFilter {
        if self.verbose {
            EnvFilter::new("debug")
        } else if self.quiet {
            EnvFilter::new("warn")
        } else {
            EnvFilter::new("info")
        }
    }
}

/// Events forwarded from the search worker to the terminal
#[derive(Debug, Clone, PartialEq)]
enum RunEvent {
    PhaseStarted(Phase, usize),
    Progress(ProgressUpdate),
    PhaseFinished(Phase, usize),
    Matched(PathBuf),
}

/// Forwards pipeline callbacks over an unbounded channel
struct ChannelReporter {
    tx: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelReporter {
    fn new(tx: mpsc::UnboundedSender<RunEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: RunEvent) {
        // receiver gone means the CLI is shutting down
        let _ = self.tx.send(event);
    }
}

impl ProgressReporter for ChannelReporter {
    fn on_phase_start(&self, phase: Phase, total: usize) {
        self.send(RunEvent::PhaseStarted(phase, total));
    }

    fn on_progress(&self, update: &ProgressUpdate) {
        self.send(RunEvent::Progress(*update));
    }

    fn on_phase_complete(&self, phase: Phase, processed: usize) {
        self.send(RunEvent::PhaseFinished(phase, processed));
    }

    fn on_match(&self, path: &Path) {
        self.send(RunEvent::Matched(path.to_path_buf()));
    }
}

/// Single-line `[phase] NN%` indicator on stderr
struct ProgressLine {
    enabled: bool,
    last_percent: Option<u32>,
}

impl ProgressLine {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last_percent: None,
        }
    }

    fn handle(&mut self, event: &RunEvent) {
        if !self.enabled {
            return;
        }

        match event {
            RunEvent::PhaseStarted(phase, _) => {
                self.last_percent = None;
                self.draw(*phase, 0);
            }
            RunEvent::Progress(update) => {
                let percent = update.percentage.floor() as u32;
                if self.last_percent != Some(percent) {
                    self.draw(update.phase, percent);
                }
            }
            RunEvent::PhaseFinished(phase, processed) => {
                eprintln!("\r[{}] done, {} files", phase, processed);
                self.last_percent = None;
            }
            RunEvent::Matched(_) => {}
        }
    }

    fn draw(&mut self, phase: Phase, percent: u32) {
        self.last_percent = Some(percent);
        eprint!("\r[{}] {:>3}%", phase, percent);
        let _ = std::io::stderr().flush();
    }
}

/// What a Ctrl-C should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    /// Ask the worker to stop between files
    Cancel,
    /// The worker ignored the first request; leave without it
    Abort,
}

/// First Ctrl-C cancels the token, any later one aborts
fn on_interrupt(cancel: &CancellationToken) -> Interrupt {
    if cancel.is_cancelled() {
        Interrupt::Abort
    } else {
        cancel.cancel();
        Interrupt::Cancel
    }
}

const INTERRUPTED: u8 = 130;

fn exit_code(status: &RunStatus) -> u8 {
    match status {
        RunStatus::Completed => 0,
        RunStatus::Failed(_) => 1,
        RunStatus::Cancelled => INTERRUPTED,
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("=== cfind {} start ===", cfind_core::VERSION);

    let config = cli.load_config()?;
    let search = match config.compile() {
        Ok(search) => search,
        Err(e) => {
            eprintln!("Error: {}", e);
            tracing::info!("=== cfind end (invalid input) ===");
            return Ok(ExitCode::from(1));
        }
    };

    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let worker_cancel = cancel.clone();
    let mut worker = tokio::task::spawn_blocking(move || {
        let reporter = ChannelReporter::new(tx);
        run_search(&search, &reporter, &worker_cancel)
    });

    let mut progress = ProgressLine::new(!cli.quiet && !cli.json);
    let joined = loop {
        tokio::select! {
            Some(event) = rx.recv() => progress.handle(&event),
            joined = &mut worker => break joined,
            _ = tokio::signal::ctrl_c() => match on_interrupt(&cancel) {
                Interrupt::Cancel => {
                    tracing::warn!("Interrupted, cancelling run (press Ctrl-C again to abort)");
                }
                Interrupt::Abort => {
                    eprintln!();
                    tracing::error!("Interrupted twice, aborting without waiting for the search");
                    // the runtime would wait on the blocking worker
                    std::process::exit(INTERRUPTED.into());
                }
            },
        }
    };
    while let Ok(event) = rx.try_recv() {
        progress.handle(&event);
    }

    let report = match joined {
        Ok(report) => report,
        Err(e) => {
            let mut report = RunReport::new();
            report.status = RunStatus::Failed(format!("search worker stopped: {}", e));
            report
        }
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        print_summary(&config, &report);
    }

    tracing::info!("=== cfind end ({:?}) ===", report.status);
    Ok(ExitCode::from(exit_code(&report.status)))
}

fn print_summary(config: &SearchConfig, report: &RunReport) {
    println!();
    println!("Search Summary");
    println!("==============");
    println!();
    println!("Root:           {}", config.root.display());
    println!("Output:         {}", config.output.display());
    println!(
        "Term:           {}{}",
        config.term,
        if config.regex { " (regex)" } else { "" }
    );
    println!("Extensions:     {}", config.extensions);
    println!();
    println!("Files visited:  {}", report.files_visited);
    println!("Files searched: {}", report.files_searched);
    for bucket in &report.buckets {
        println!("  {:<14}{:>6}", bucket.extractor, bucket.files);
    }
    println!("Matches:        {}", report.matches);
    println!("Copied:         {}", report.copied);

    if !report.skipped_existing.is_empty() {
        println!();
        println!("Already in output, not copied:");
        for path in &report.skipped_existing {
            println!("  {}", path.display());
        }
    }

    let failures = report.search_failures + report.copy_failures + report.skipped_entries.len();
    if failures > 0 {
        println!();
        println!(
            "Problems:       {} unreadable, {} search errors, {} copy errors",
            report.skipped_entries.len(),
            report.search_failures,
            report.copy_failures
        );
    }

    println!();
    match &report.status {
        RunStatus::Completed => println!("Done in {:.2}s", report.elapsed_ms as f64 / 1000.0),
        RunStatus::Cancelled => println!("Cancelled after {:.2}s", report.elapsed_ms as f64 / 1000.0),
        RunStatus::Failed(message) => println!("Failed: {}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_positionals_and_flags() {
        let cli = Cli::try_parse_from([
            "cfind", "/data", "/out", "^h.*d$", "--regex", "--extensions", "txt|log",
        ])
        .unwrap();

        assert_eq!(cli.root, Some(PathBuf::from("/data")));
        assert_eq!(cli.output, Some(PathBuf::from("/out")));
        assert_eq!(cli.term.as_deref(), Some("^h.*d$"));
        assert!(cli.regex);
        assert_eq!(cli.extensions.as_deref(), Some("txt|log"));
        assert!(!cli.json);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["cfind", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_defaults_without_config() {
        let cli = Cli::try_parse_from(["cfind", "/data", "/out", "hello"]).unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.extensions, ".*");
        assert!(!config.regex);
        assert_eq!(config.term, "hello");
    }

    #[test]
    fn test_command_line_overrides_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("search.json");
        std::fs::write(
            &path,
            r#"{"root": "/from/file", "output": "/file/out", "term": "old", "extensions": "docx"}"#,
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "cfind",
            "--config",
            path.to_str().unwrap(),
            "/data",
            "/out",
            "new",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.root, PathBuf::from("/data"));
        assert_eq!(config.output, PathBuf::from("/out"));
        assert_eq!(config.term, "new");
        // not given on the command line
        assert_eq!(config.extensions, "docx");
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let cli = Cli::try_parse_from(["cfind", "--config", "/no/such/search.json"]).unwrap();
        let err = cli.load_config().unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[test]
    fn test_channel_reporter_forwards_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = ChannelReporter::new(tx);

        reporter.on_phase_start(Phase::Scan, 2);
        reporter.on_match(Path::new("/data/a.txt"));
        reporter.on_phase_complete(Phase::Scan, 2);
        // events the CLI does not render are dropped
        reporter.on_copy_skipped(Path::new("/out/a.txt"));
        drop(reporter);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                RunEvent::PhaseStarted(Phase::Scan, 2),
                RunEvent::Matched(PathBuf::from("/data/a.txt")),
                RunEvent::PhaseFinished(Phase::Scan, 2),
            ]
        );
    }

    #[test]
    fn test_reporter_survives_closed_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        ChannelReporter::new(tx).on_phase_start(Phase::Search, 1);
    }

    #[test]
    fn test_second_interrupt_aborts() {
        let cancel = CancellationToken::new();

        assert_eq!(on_interrupt(&cancel), Interrupt::Cancel);
        assert!(cancel.is_cancelled());
        assert_eq!(on_interrupt(&cancel), Interrupt::Abort);
        assert_eq!(on_interrupt(&cancel), Interrupt::Abort);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&RunStatus::Completed), 0);
        assert_eq!(exit_code(&RunStatus::Failed("boom".into())), 1);
        assert_eq!(exit_code(&RunStatus::Cancelled), 130);
    }

    #[test]
    fn test_end_to_end_run_through_channel() {
        let root = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        std::fs::write(root.path().join("a.txt"), "hello world").unwrap();

        let cli = Cli::try_parse_from([
            "cfind",
            root.path().to_str().unwrap(),
            out.path().to_str().unwrap(),
            "hello",
        ])
        .unwrap();
        let search = cli.load_config().unwrap().compile().unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let report = run_search(&search, &ChannelReporter::new(tx), &CancellationToken::new());

        assert_eq!(exit_code(&report.status), 0);
        assert!(out.path().join("a.txt").exists());

        let mut saw_match = false;
        while let Ok(event) = rx.try_recv() {
            if let RunEvent::Matched(_) = event {
                saw_match = true;
            }
        }
        assert!(saw_match);
    }
}
