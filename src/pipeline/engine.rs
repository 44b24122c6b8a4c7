//! Compression engine: one Ghostscript invocation per file.
//!
//! The engine sits behind the [`CompressionEngine`] trait so the driver can
//! run against something other than a real Ghostscript install (tests use
//! an in-process fake). [`Ghostscript`] is the production implementation.
//!
//! Ghostscript is a black box here: a readable PDF plus a preset name go
//! in, a PDF file comes out. Its exit status is checked before any sizes
//! are read, so a failed run surfaces as [`SqueezeError::EngineFailed`]
//! rather than as a confusing size or missing-file error later on.

use crate::config::{Preset, RunConfig};
use crate::error::SqueezeError;
use crate::output::FileReport;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{debug, info};

/// One file to compress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub preset: Preset,
    pub compatibility_level: String,
}

/// Something that can rewrite `request.input` into a smaller PDF at `request.output`.
pub trait CompressionEngine: Send + Sync {
    /// Short human-readable name used in logs.
    fn name(&self) -> &str;

    /// Write the compressed file. Must only return `Ok` once the output is complete.
    fn compress(&self, request: &InvocationRequest) -> Result<(), SqueezeError>;
}

/// Ghostscript driven through its command line interface.
#[derive(Debug, Clone)]
pub struct Ghostscript {
    program: String,
}

#[cfg(windows)]
const CANDIDATES: &[&str] = &["gswin64c", "gswin32c", "gs"];
#[cfg(not(windows))]
const CANDIDATES: &[&str] = &["gs"];

impl Ghostscript {
    /// Use the given executable name or path without probing it.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// First platform candidate that answers `--version`.
    pub fn detect() -> Result<Self, SqueezeError> {
        for candidate in CANDIDATES {
            let gs = Ghostscript::new(*candidate);
            if let Ok(version) = gs.version() {
                debug!("Found Ghostscript '{}' version {}", candidate, version);
                return Ok(gs);
            }
        }
        Err(SqueezeError::EngineNotFound {
            program: CANDIDATES.join(", "),
            detail: "none of the candidates could be run".to_string(),
        })
    }

    /// Output of `<program> --version`, trimmed.
    pub fn version(&self) -> Result<String, SqueezeError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;
        if !output.status.success() {
            return Err(SqueezeError::EngineNotFound {
                program: self.program.clone(),
                detail: format!("--version exited with {}", output.status),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Full argument vector for one request, program name excluded.
    pub fn args(request: &InvocationRequest) -> Vec<OsString> {
        let mut output_file = OsString::from("-sOutputFile=");
        output_file.push(escape_output_path(&request.output));

        vec![
            OsString::from("-sDEVICE=pdfwrite"),
            OsString::from(format!(
                "-dCompatibilityLevel={}",
                request.compatibility_level
            )),
            OsString::from(format!("-dPDFSETTINGS={}", request.preset.pdf_settings())),
            OsString::from("-dNOPAUSE"),
            OsString::from("-dQUIET"),
            OsString::from("-dBATCH"),
            output_file,
            input_operand(&request.input),
        ]
    }

    fn spawn_error(&self, e: io::Error) -> SqueezeError {
        SqueezeError::EngineNotFound {
            program: self.program.clone(),
            detail: e.to_string(),
        }
    }
}

impl CompressionEngine for Ghostscript {
    fn name(&self) -> &str {
        &self.program
    }

    fn compress(&self, request: &InvocationRequest) -> Result<(), SqueezeError> {
        let args = Self::args(request);
        debug!("Running {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.is_empty() {
                stderr = String::from_utf8_lossy(&output.stdout).trim().to_string();
            }
            return Err(SqueezeError::EngineFailed {
                input: request.input.clone(),
                code: output.status.code(),
                stderr,
            });
        }
        Ok(())
    }
}

/// Ghostscript reads `%d`-style page templates in `-sOutputFile`; a literal
/// percent sign has to be doubled.
fn escape_output_path(path: &Path) -> OsString {
    match path.to_str() {
        Some(s) if s.contains('%') => OsString::from(s.replace('%', "%%")),
        _ => path.as_os_str().to_os_string(),
    }
}

/// A relative input starting with `-` would be read as a switch.
fn input_operand(path: &Path) -> OsString {
    let starts_with_dash = path
        .to_str()
        .map(|s| s.starts_with('-'))
        .unwrap_or(false);
    if path.is_relative() && starts_with_dash {
        Path::new(".").join(path).into_os_string()
    } else {
        path.as_os_str().to_os_string()
    }
}

/// Pick the engine for a run, from most to least specific:
/// a pre-built engine, an explicit program, then auto-detection.
pub fn resolve_engine(config: &RunConfig) -> Result<Arc<dyn CompressionEngine>, SqueezeError> {
    if let Some(ref engine) = config.engine {
        return Ok(Arc::clone(engine));
    }
    if let Some(ref program) = config.engine_program {
        return Ok(Arc::new(Ghostscript::new(program.clone())));
    }
    Ok(Arc::new(Ghostscript::detect()?))
}

/// Read input and output sizes after a successful engine run.
pub fn measure(request: &InvocationRequest) -> Result<FileReport, SqueezeError> {
    let initial_size = fs::metadata(&request.input)
        .map_err(|_| SqueezeError::InputNotFound {
            path: request.input.clone(),
        })?
        .len();
    let final_size = match fs::metadata(&request.output) {
        Ok(meta) if meta.len() > 0 => meta.len(),
        _ => {
            return Err(SqueezeError::EmptyOutput {
                path: request.output.clone(),
            })
        }
    };

    Ok(FileReport {
        input: request.input.clone(),
        output: request.output.clone(),
        initial_size,
        final_size,
    })
}

/// Compress one file and measure the result.
///
/// The input must be an existing regular file.
pub fn invoke(
    engine: &dyn CompressionEngine,
    request: &InvocationRequest,
) -> Result<FileReport, SqueezeError> {
    if !request.input.is_file() {
        return Err(SqueezeError::InputNotFound {
            path: request.input.clone(),
        });
    }

    info!(
        "Compressing {} → {} ({})",
        request.input.display(),
        request.output.display(),
        request.preset
    );
    engine.compress(request)?;
    let report = measure(request)?;

    info!(
        "{}: {} → {} bytes ({})",
        request.input.display(),
        report.initial_size,
        report.final_size,
        report.ratio_percent()
    );
    Ok(report)
}
