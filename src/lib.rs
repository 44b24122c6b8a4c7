//! # pdfsqueeze
//!
//! Shrink PDF files with Ghostscript, one file at a time or a whole
//! directory tree at once.
//!
//! The heavy lifting is done by Ghostscript's `pdfwrite` device; this crate
//! decides which files to feed it, where the results go, and how much was
//! saved.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input path
//!  │
//!  ├─ 1. Validate  file (single mode) or directory (directory mode)
//!  ├─ 2. Discover  walk the tree, mirror its directories under the output root
//!  ├─ 3. Resolve   output path per file (explicit, mirrored, or in place)
//!  ├─ 4. Compress  gs -sDEVICE=pdfwrite -dPDFSETTINGS=/<preset> …
//!  ├─ 5. Finalize  backup + replace originals, open the result
//!  └─ 6. Report    per-file sizes and ratio, run summary
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfsqueeze::{run, Preset, RunConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::builder("slides.pdf")
//!         .output("slides-small.pdf")
//!         .preset(Preset::Ebook)
//!         .build()?;
//!     let summary = run(&config)?;
//!     for report in summary.reports() {
//!         println!("{report}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Presets
//!
//! | Level | Preset | Images |
//! |-------|--------|--------|
//! | 0 | `default`  | general purpose |
//! | 1 | `prepress` | 300 dpi, colour preserving |
//! | 2 | `printer`  | 300 dpi (default) |
//! | 3 | `ebook`    | 150 dpi |
//! | 4 | `screen`   | 72 dpi |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfsqueeze` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod compress;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compress::{compress_file, run};
pub use config::{Mode, Preset, RunConfig, RunConfigBuilder, DEFAULT_COMPATIBILITY_LEVEL};
pub use error::{FileError, SqueezeError};
pub use output::{FileOutcome, FileReport, RunStats, RunSummary};
pub use pipeline::engine::{CompressionEngine, Ghostscript, InvocationRequest};
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
