//! Configuration for trace analysis.
//!
//! The only configuration input is the traced project's path-alias setup
//! (see [`PathMappings`]). It is loaded once, before any trace is read, and
//! never changes afterwards.

use std::path::PathBuf;

mod project;

pub use project::{PathMappings, parse_fragments};

/// Errors loading project configuration.
///
/// Callers treat these as warnings: analysis still runs, just without
/// path-alias annotations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
