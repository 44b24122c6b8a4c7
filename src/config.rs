//! Configuration types for a compression run.
//!
//! Everything a run needs is carried by one [`RunConfig`], built once via
//! [`RunConfigBuilder`] and then passed by reference into every pipeline
//! stage. No stage reads process-wide state.

use crate::error::SqueezeError;
use crate::pipeline::engine::CompressionEngine;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// `-dCompatibilityLevel` passed to Ghostscript unless overridden.
pub const DEFAULT_COMPATIBILITY_LEVEL: &str = "1.4";

/// Configuration for a compression run.
///
/// # Example
/// ```rust
/// use pdfsqueeze::{Mode, Preset, RunConfig};
///
/// let config = RunConfig::builder("scans/")
///     .mode(Mode::Directory)
///     .output("scans-small/")
///     .preset(Preset::Ebook)
///     .build()
///     .unwrap();
/// assert!(!config.in_place());
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// File (single mode) or directory root (directory mode) to compress.
    pub input: PathBuf,

    /// Where compressed output goes. `None` means in-place replacement.
    ///
    /// In single mode a value whose file name ends in `.pdf` is the output
    /// file itself; anything else is a directory that receives a file named
    /// like the input. In directory mode it is the root of the mirrored tree.
    pub output: Option<PathBuf>,

    /// Ghostscript quality preset. Default: [`Preset::Printer`].
    pub preset: Preset,

    /// Single file or whole directory tree. Default: [`Mode::Single`].
    pub mode: Mode,

    /// Keep a `<stem>_BACKUP.<ext>` copy of each original replaced in place.
    pub backup: bool,

    /// Open the result with the platform's default application afterwards.
    pub open_after: bool,

    /// Ghostscript executable name or path. If None, auto-detected.
    pub engine_program: Option<String>,

    /// Pre-constructed engine. Takes precedence over `engine_program`.
    pub engine: Option<Arc<dyn CompressionEngine>>,

    /// `-dCompatibilityLevel` value. Default: `1.4`.
    pub compatibility_level: String,

    /// Optional per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("preset", &self.preset)
            .field("mode", &self.mode)
            .field("backup", &self.backup)
            .field("open_after", &self.open_after)
            .field("engine_program", &self.engine_program)
            .field("engine", &self.engine.as_ref().map(|_| "<dyn CompressionEngine>"))
            .field("compatibility_level", &self.compatibility_level)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RunProgressCallback>"),
            )
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for the given input path.
    pub fn builder(input: impl Into<PathBuf>) -> RunConfigBuilder {
        RunConfigBuilder {
            config: RunConfig {
                input: input.into(),
                output: None,
                preset: Preset::default(),
                mode: Mode::default(),
                backup: false,
                open_after: false,
                engine_program: None,
                engine: None,
                compatibility_level: DEFAULT_COMPATIBILITY_LEVEL.to_string(),
                progress_callback: None,
            },
        }
    }

    /// True when compressed files replace their originals.
    pub fn in_place(&self) -> bool {
        self.output.is_none()
    }

    /// Check that the input path matches the selected mode.
    pub fn validate_input(&self) -> Result<(), SqueezeError> {
        let path = &self.input;
        if !path.exists() {
            return Err(SqueezeError::InputNotFound { path: path.clone() });
        }
        match self.mode {
            Mode::Single if !path.is_file() => Err(SqueezeError::NotAFile { path: path.clone() }),
            Mode::Directory if !path.is_dir() => {
                Err(SqueezeError::NotADirectory { path: path.clone() })
            }
            _ => Ok(()),
        }
    }

    /// Path handed to the platform opener once the run is done.
    pub fn open_target(&self, single_output: Option<&Path>) -> PathBuf {
        match (&self.output, single_output) {
            (None, _) => self.input.clone(),
            (Some(_), Some(out)) => out.to_path_buf(),
            (Some(root), None) => root.clone(),
        }
    }
}

/// Builder for [`RunConfig`].
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl fmt::Debug for RunConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RunConfigBuilder").field(&self.config).finish()
    }
}

impl RunConfigBuilder {
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output = Some(path.into());
        self
    }

    pub fn preset(mut self, preset: Preset) -> Self {
        self.config.preset = preset;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn backup(mut self, v: bool) -> Self {
        self.config.backup = v;
        self
    }

    pub fn open_after(mut self, v: bool) -> Self {
        self.config.open_after = v;
        self
    }

    pub fn engine_program(mut self, program: impl Into<String>) -> Self {
        self.config.engine_program = Some(program.into());
        self
    }

    pub fn engine(mut self, engine: Arc<dyn CompressionEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn compatibility_level(mut self, level: impl Into<String>) -> Self {
        self.config.compatibility_level = level.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Does not touch the filesystem; see [`RunConfig::validate_input`].
    pub fn build(self) -> Result<RunConfig, SqueezeError> {
        let c = &self.config;
        if c.input.as_os_str().is_empty() {
            return Err(SqueezeError::InvalidConfig("input path is empty".into()));
        }
        if matches!(&c.output, Some(p) if p.as_os_str().is_empty()) {
            return Err(SqueezeError::InvalidConfig("output path is empty".into()));
        }
        if !is_compatibility_level(&c.compatibility_level) {
            return Err(SqueezeError::InvalidConfig(format!(
                "compatibility level must look like 1.4, got '{}'",
                c.compatibility_level
            )));
        }
        Ok(self.config)
    }
}

fn is_compatibility_level(s: &str) -> bool {
    match s.split_once('.') {
        Some((major, minor)) => {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Ghostscript `-dPDFSETTINGS` preset, indexed by compression level 0–4.
///
/// | Level | Preset | Typical result |
/// |-------|--------|----------------|
/// | 0 | `/default`  | general purpose, close to `/screen` |
/// | 1 | `/prepress` | high quality, colour preserving, 300 dpi images |
/// | 2 | `/printer`  | high quality, 300 dpi images (default) |
/// | 3 | `/ebook`    | medium quality, 150 dpi images |
/// | 4 | `/screen`   | screen-only quality, 72 dpi images |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Default,
    Prepress,
    #[default]
    Printer,
    Ebook,
    Screen,
}

impl Preset {
    /// All presets in level order.
    pub const ALL: [Preset; 5] = [
        Preset::Default,
        Preset::Prepress,
        Preset::Printer,
        Preset::Ebook,
        Preset::Screen,
    ];

    /// Map a compression level to its preset.
    pub fn from_level(level: u8) -> Result<Self, SqueezeError> {
        Self::ALL
            .get(usize::from(level))
            .copied()
            .ok_or(SqueezeError::InvalidQuality(level))
    }

    /// Compression level of this preset.
    pub fn level(self) -> u8 {
        match self {
            Preset::Default => 0,
            Preset::Prepress => 1,
            Preset::Printer => 2,
            Preset::Ebook => 3,
            Preset::Screen => 4,
        }
    }

    /// Bare preset name, e.g. `ebook`.
    pub fn name(self) -> &'static str {
        match self {
            Preset::Default => "default",
            Preset::Prepress => "prepress",
            Preset::Printer => "printer",
            Preset::Ebook => "ebook",
            Preset::Screen => "screen",
        }
    }

    /// Value for `-dPDFSETTINGS`, e.g. `/ebook`.
    pub fn pdf_settings(self) -> String {
        format!("/{}", self.name())
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = SqueezeError;

    /// Accepts a level (`"3"`) or a name with or without slash (`"ebook"`, `"/ebook"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(level) = s.parse::<u8>() {
            return Preset::from_level(level);
        }
        let name = s.trim_start_matches('/').to_ascii_lowercase();
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| SqueezeError::InvalidConfig(format!("unknown preset '{s}'")))
    }
}

/// What the input path designates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One PDF file. (default)
    #[default]
    Single,
    /// Every PDF under a directory tree.
    Directory,
}

impl Mode {
    /// Map the `--cm` selector: 0 is single-file, anything else is directory.
    pub fn from_selector(cm: u8) -> Self {
        if cm == 0 {
            Mode::Single
        } else {
            Mode::Directory
        }
    }
}
