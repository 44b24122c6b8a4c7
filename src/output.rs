//! Result types produced by a compression run.

use crate::config::{Mode, Preset};
use crate::error::{FileError, SqueezeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Size accounting for one compressed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    /// File the engine read.
    pub input: PathBuf,
    /// Where the compressed file ended up (equal to `input` when replaced in place).
    pub output: PathBuf,
    /// Input size in bytes.
    pub initial_size: u64,
    /// Output size in bytes.
    pub final_size: u64,
}

impl FileReport {
    /// `1 - final/initial`. Negative when the output grew; 0 for an empty input.
    pub fn ratio(&self) -> f64 {
        if self.initial_size == 0 {
            return 0.0;
        }
        1.0 - (self.final_size as f64 / self.initial_size as f64)
    }

    /// Ratio as a whole percentage, e.g. `"60%"`.
    pub fn ratio_percent(&self) -> String {
        format!("{:.0}%", self.ratio() * 100.0)
    }

    /// Output size in megabytes (10^6 bytes).
    pub fn final_megabytes(&self) -> f64 {
        self.final_size as f64 / 1_000_000.0
    }
}

impl fmt::Display for FileReport {
    /// Multi-line report in the tool's traditional wording.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Input File Name : {}", self.input.display())?;
        writeln!(f, "Output File Name : {}", self.output.display())?;
        writeln!(f, "Initial size of file : {}", self.initial_size)?;
        writeln!(f, "Final size of file : {}", self.final_size)?;
        writeln!(f, "Compression by {}.", self.ratio_percent())?;
        write!(f, "Final file size is {:.1}MB", self.final_megabytes())
    }
}

/// What happened to one discovered file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Compressed and measured.
    Compressed(FileReport),
    /// Passed over because it is not a PDF.
    Skipped { input: PathBuf },
    /// Attempted and failed; the run continued.
    Failed {
        input: PathBuf,
        output: PathBuf,
        error: FileError,
    },
}

impl FileOutcome {
    pub fn report(&self) -> Option<&FileReport> {
        match self {
            FileOutcome::Compressed(r) => Some(r),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FileError> {
        match self {
            FileOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Aggregate counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Files discovered (PDF or not).
    pub total_files: usize,
    pub compressed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Sum of input sizes over compressed files.
    pub bytes_before: u64,
    /// Sum of output sizes over compressed files.
    pub bytes_after: u64,
    /// Wall-clock duration of the whole run.
    pub duration_ms: u64,
}

/// Everything a run produced, in discovery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: Mode,
    pub preset: Preset,
    pub files: Vec<FileOutcome>,
    pub stats: RunStats,
}

impl RunSummary {
    /// Build a summary and its counters from per-file outcomes.
    pub fn new(mode: Mode, preset: Preset, files: Vec<FileOutcome>, duration_ms: u64) -> Self {
        let mut stats = RunStats {
            total_files: files.len(),
            duration_ms,
            ..RunStats::default()
        };
        for outcome in &files {
            match outcome {
                FileOutcome::Compressed(r) => {
                    stats.compressed += 1;
                    stats.bytes_before += r.initial_size;
                    stats.bytes_after += r.final_size;
                }
                FileOutcome::Skipped { .. } => stats.skipped += 1,
                FileOutcome::Failed { .. } => stats.failed += 1,
            }
        }
        Self {
            mode,
            preset,
            files,
            stats,
        }
    }

    /// Reports of the files that compressed.
    pub fn reports(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter_map(FileOutcome::report)
    }

    /// Ratio over all compressed bytes, `1 - after/before`.
    pub fn overall_ratio(&self) -> f64 {
        if self.stats.bytes_before == 0 {
            return 0.0;
        }
        1.0 - (self.stats.bytes_after as f64 / self.stats.bytes_before as f64)
    }

    /// Treat any failed file as an error.
    pub fn into_result(self) -> Result<Self, SqueezeError> {
        let failed = self.stats.failed;
        if failed == 0 {
            return Ok(self);
        }
        if self.stats.compressed == 0 {
            let first_error = self
                .files
                .iter()
                .find_map(FileOutcome::error)
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(SqueezeError::AllFilesFailed {
                total: failed,
                first_error,
            });
        }
        Err(SqueezeError::PartialFailure {
            compressed: self.stats.compressed,
            failed,
            total: self.stats.compressed + failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(initial: u64, fin: u64) -> FileReport {
        FileReport {
            input: PathBuf::from("in.pdf"),
            output: PathBuf::from("out.pdf"),
            initial_size: initial,
            final_size: fin,
        }
    }

    #[test]
    fn ratio_matches_byte_counts() {
        let r = report(1_000_000, 400_000);
        assert!((r.ratio() - 0.6).abs() < 1e-12);
        assert_eq!(r.ratio_percent(), "60%");
        assert!((r.final_megabytes() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn ratio_negative_when_output_grows() {
        let r = report(100, 150);
        assert_eq!(r.ratio_percent(), "-50%");
    }

    #[test]
    fn ratio_zero_for_empty_input() {
        assert_eq!(report(0, 10).ratio(), 0.0);
    }

    #[test]
    fn display_uses_traditional_wording() {
        let text = report(1_000_000, 400_000).to_string();
        assert!(text.contains("Compression by 60%."), "got: {text}");
        assert!(text.contains("Final file size is 0.4MB"), "got: {text}");
        assert!(text.contains("Initial size of file : 1000000"));
    }

    #[test]
    fn summary_counts_outcomes() {
        let summary = RunSummary::new(
            Mode::Directory,
            Preset::Ebook,
            vec![
                FileOutcome::Compressed(report(1000, 400)),
                FileOutcome::Skipped {
                    input: PathBuf::from("notes.txt"),
                },
                FileOutcome::Compressed(report(1000, 600)),
            ],
            12,
        );
        assert_eq!(summary.stats.total_files, 3);
        assert_eq!(summary.stats.compressed, 2);
        assert_eq!(summary.stats.skipped, 1);
        assert_eq!(summary.stats.bytes_before, 2000);
        assert_eq!(summary.stats.bytes_after, 1000);
        assert!((summary.overall_ratio() - 0.5).abs() < 1e-12);
        assert_eq!(summary.reports().count(), 2);
        assert!(summary.into_result().is_ok());
    }

    #[test]
    fn into_result_partial_failure() {
        let summary = RunSummary::new(
            Mode::Directory,
            Preset::Printer,
            vec![
                FileOutcome::Compressed(report(10, 5)),
                FileOutcome::Failed {
                    input: PathBuf::from("bad.pdf"),
                    output: PathBuf::from("out/bad.pdf"),
                    error: FileError::EmptyOutput {
                        path: PathBuf::from("bad.pdf"),
                    },
                },
            ],
            0,
        );
        match summary.into_result() {
            Err(SqueezeError::PartialFailure {
                compressed,
                failed,
                total,
            }) => {
                assert_eq!((compressed, failed, total), (1, 1, 2));
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
    }

    #[test]
    fn into_result_all_failed() {
        let summary = RunSummary::new(
            Mode::Directory,
            Preset::Printer,
            vec![FileOutcome::Failed {
                input: PathBuf::from("bad.pdf"),
                output: PathBuf::from("out/bad.pdf"),
                error: FileError::Missing {
                    path: PathBuf::from("bad.pdf"),
                },
            }],
            0,
        );
        let err = summary.into_result().unwrap_err();
        assert!(matches!(err, SqueezeError::AllFilesFailed { total: 1, .. }));
        assert!(err.to_string().contains("vanished"));
    }

    #[test]
    fn outcome_serialises_with_status_tag() {
        let json = serde_json::to_string(&FileOutcome::Skipped {
            input: PathBuf::from("a.txt"),
        })
        .unwrap();
        assert!(json.contains("\"status\":\"skipped\""), "got: {json}");
    }
}
