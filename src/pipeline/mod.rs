//! Pipeline stages for a compression run.
//!
//! Each submodule implements exactly one step so it can be tested on its
//! own against a temporary directory.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ resolve ──▶ engine ──▶ finalize
//! (walk/mirror) (paths)  (Ghostscript) (backup/replace/open)
//! ```
//!
//! 1. [`discover`]: list files under the input root and, when an output
//!    root is given, create the mirrored directory skeleton
//! 2. [`resolve`]: decide the output path for each input file
//! 3. [`engine`]: run Ghostscript for one file and measure the result;
//!    the only stage that spawns a process
//! 4. [`finalize`]: back up and replace originals in in-place mode, open
//!    the result on request

pub mod discover;
pub mod engine;
pub mod finalize;
pub mod resolve;
