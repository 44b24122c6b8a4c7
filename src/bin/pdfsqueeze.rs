//! CLI binary for pdfsqueeze.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RunConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfsqueeze::{
    run, FileReport, Mode, Preset, ProgressCallback, RunConfig, RunProgressCallback, RunSummary,
};
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const RULE: &str = "===================================================================";

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over all discovered files plus a
/// log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.set_message("Looking for PDFs…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Self {
            bar,
            started: Mutex::new(None),
        }
    }

    fn elapsed(&self) -> String {
        let secs = self
            .started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_files: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total_files as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Compressing");
    }

    fn on_file_start(&self, _index: usize, _total: usize, input: &Path) {
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(input.display().to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, report: &FileReport) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {} → {}  {}",
            green("✓"),
            index,
            total,
            report.input.display(),
            bold(&report.ratio_percent()),
            dim(&format!("{:.1}MB", report.final_megabytes())),
            self.elapsed(),
        ));
        self.bar.inc(1);
    }

    fn on_file_skipped(&self, _index: usize, _total: usize, _input: &Path) {
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, input: &Path, error: &str) {
        let first_line = error.lines().next().unwrap_or(error);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index,
            total,
            input.display(),
            red(first_line),
            self.elapsed(),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, _total_files: usize, _compressed: usize, _failed: usize) {
        self.bar.finish_and_clear();
    }

    fn on_run_failed(&self, _error: &str) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Compress a file in place (printer preset)
  pdfsqueeze report.pdf

  # In place, keeping report_BACKUP.pdf, then open it
  pdfsqueeze report.pdf -b --open

  # Write to an explicit file with the ebook preset
  pdfsqueeze report.pdf -o report-small.pdf -c 3

  # Write into a directory (keeps the file name)
  pdfsqueeze report.pdf -o compressed/

  # Whole tree, mirrored under another root
  pdfsqueeze scans/ -o scans-small/ -c 4 -cm 1

  # Machine-readable summary
  pdfsqueeze scans/ -o scans-small/ -cm 1 --json > summary.json

COMPRESSION LEVELS (-c takes the number or the name):
  0  default    general purpose
  1  prepress   high quality, colour preserving, 300 dpi images
  2  printer    high quality, 300 dpi images (default)
  3  ebook      medium quality, 150 dpi images
  4  screen     screen-view-only quality, 72 dpi images

ENVIRONMENT VARIABLES:
  PDFSQUEEZE_GS           Ghostscript executable (default: auto-detect gs / gswin64c)
  RUST_LOG                Log filter, overrides -v / -q

SETUP:
  Ghostscript must be installed:
    macOS:          brew install ghostscript
    Debian/Ubuntu:  sudo apt install ghostscript
    Windows:        https://ghostscript.com/releases/
"#;

/// Compress PDF files with Ghostscript.
#[derive(Parser, Debug)]
#[command(
    name = "pdfsqueeze",
    version,
    about = "Compress PDF files (or whole directory trees) with Ghostscript presets",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input PDF file, or directory with --cm 1.
    input: PathBuf,

    /// Output PDF file or directory. Omit to replace the input in place.
    #[arg(short, long, env = "PDFSQUEEZE_OUT")]
    out: Option<PathBuf>,

    /// Compression level from 0 to 4, or a preset name (e.g. ebook).
    #[arg(short, long, env = "PDFSQUEEZE_COMPRESS", default_value = "2",
          value_parser = parse_preset)]
    compress: Preset,

    /// Compress method: 0 = single file, anything else = directory tree.
    #[arg(long = "cm", env = "PDFSQUEEZE_CM", default_value_t = 0)]
    cm: u8,

    /// Back up the original PDF as <name>_BACKUP.pdf before replacing it.
    #[arg(short, long, env = "PDFSQUEEZE_BACKUP")]
    backup: bool,

    /// Open the PDF after compression.
    #[arg(long, env = "PDFSQUEEZE_OPEN")]
    open: bool,

    /// Ghostscript executable name or path.
    #[arg(long, env = "PDFSQUEEZE_GS")]
    gs: Option<String>,

    /// PDF compatibility level handed to Ghostscript.
    #[arg(long, env = "PDFSQUEEZE_COMPAT_LEVEL", default_value = "1.4")]
    compat_level: String,

    /// Print the run summary as JSON on stdout.
    #[arg(long, env = "PDFSQUEEZE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFSQUEEZE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFSQUEEZE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFSQUEEZE_QUIET")]
    quiet: bool,
}

fn parse_preset(s: &str) -> Result<Preset, String> {
    s.parse::<Preset>().map_err(|e| e.to_string())
}

/// clap has no two-letter short flags; accept the historical `-cm` spelling
/// (`-cm 1`, `-cm=1`, `-cm1`).
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| rewrite_cm(&arg).unwrap_or(arg))
        .collect()
}

fn rewrite_cm(arg: &OsStr) -> Option<OsString> {
    let value = arg.to_str()?.strip_prefix("-cm")?;
    if value.is_empty() {
        return Some(OsString::from("--cm"));
    }
    let value = value.strip_prefix('=').unwrap_or(value);
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        Some(OsString::from(format!("--cm={value}")))
    } else {
        None
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    // ── Logging setup ────────────────────────────────────────────────────
    let mode = Mode::from_selector(cli.cm);
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && mode == Mode::Directory;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress || cli.json {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = Arc::new(CliProgressCallback::new());
        Some(cb as Arc<dyn RunProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, mode, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let summary = run(&config).context("Compression failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&summary, show_progress);
    }

    summary
        .into_result()
        .context("Some files could not be compressed")?;
    Ok(())
}

/// Map CLI args to `RunConfig`.
fn build_config(cli: &Cli, mode: Mode, progress: Option<ProgressCallback>) -> Result<RunConfig> {
    let mut builder = RunConfig::builder(&cli.input)
        .mode(mode)
        .preset(cli.compress)
        .backup(cli.backup)
        .open_after(cli.open)
        .compatibility_level(cli.compat_level.clone());

    if let Some(ref out) = cli.out {
        builder = builder.output(out);
    }
    if let Some(ref gs) = cli.gs {
        builder = builder.engine_program(gs.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(summary: &RunSummary, progress_shown: bool) {
    // Without a progress bar every report is printed in full.
    if !progress_shown {
        for report in summary.reports() {
            println!("{RULE}");
            println!("Compressing PDF...");
            println!("{report}");
            println!("Done.");
        }
    }

    let stats = &summary.stats;
    if summary.mode == Mode::Single && stats.failed == 0 {
        return;
    }

    eprintln!(
        "{}  {} compressed, {} skipped, {} failed  {}ms",
        if stats.failed == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        bold(&stats.compressed.to_string()),
        stats.skipped,
        if stats.failed == 0 {
            stats.failed.to_string()
        } else {
            red(&stats.failed.to_string())
        },
        stats.duration_ms,
    );
    if stats.compressed > 0 {
        eprintln!(
            "   {} → {} bytes  ({:.0}% smaller)",
            dim(&stats.bytes_before.to_string()),
            dim(&stats.bytes_after.to_string()),
            summary.overall_ratio() * 100.0,
        );
    }
    for outcome in &summary.files {
        if let Some(error) = outcome.error() {
            eprintln!("   {} {}", red("✗"), error);
        }
    }
}
