//! Errors that abort a widget build.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure classes for the build pipeline. Every variant is fatal to
/// the run it occurs in; the pipeline writes nothing once one is hit.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No `build.config.json` in the widget directory or the fallback
    /// directory above it.
    #[error("no build config in {widget_dir} or {fallback_dir}")]
    ConfigNotFound {
        widget_dir: PathBuf,
        fallback_dir: PathBuf,
    },

    /// A config file exists but cannot be used.
    #[error("invalid build config {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    /// A declared input file could not be read.
    #[error("failed to read {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The entry module could not be bundled.
    #[error("failed to bundle {entry}: {message}")]
    Bundle { entry: PathBuf, message: String },

    /// The artifact or its directory could not be written.
    #[error("failed to write {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn config_not_found_names_both_directories() {
        let err = BuildError::ConfigNotFound {
            widget_dir: PathBuf::from("widgets/chart"),
            fallback_dir: PathBuf::from("widgets"),
        };
        assert_eq!(
            err.to_string(),
            "no build config in widgets/chart or widgets"
        );
    }

    #[test]
    fn bundle_error_carries_diagnostic() {
        let err = BuildError::Bundle {
            entry: PathBuf::from("widgets/chart/index.js"),
            message: "failed to resolve import \"./missing.js\"".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("widgets/chart/index.js"));
        assert!(text.contains("./missing.js"));
    }
}
