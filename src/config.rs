//! Widget build configuration.
//!
//! Each widget directory carries a `build.config.json` describing the
//! HTML shell, the script entry point and the stylesheets. A widget
//! without its own config falls back to one in the directory above it,
//! in which case relative input paths resolve against that directory.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{BuildError, BuildResult};

/// File name of the per-widget build configuration.
pub const CONFIG_FILE_NAME: &str = "build.config.json";

/// Stylesheet inputs, either a single path or an ordered list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CssInput {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

impl CssInput {
    /// Flatten to an ordered list of paths.
    pub fn to_vec(&self) -> Vec<PathBuf> {
        match self {
            CssInput::One(path) => vec![path.clone()],
            CssInput::Many(paths) => paths.clone(),
        }
    }
}

/// The `input` section of the build config.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// HTML shell containing the placeholder tags.
    pub html: PathBuf,
    /// Script entry point for the bundle.
    pub js_entry: PathBuf,
    /// Stylesheets in inclusion order.
    pub css: CssInput,
}

/// Parsed build configuration plus the directory it was loaded from.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    pub input: InputConfig,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl BuildConfig {
    /// Directory that relative input paths resolve against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn html_path(&self) -> PathBuf {
        self.base_dir.join(&self.input.html)
    }

    pub fn js_entry_path(&self) -> PathBuf {
        self.base_dir.join(&self.input.js_entry)
    }

    pub fn css_paths(&self) -> Vec<PathBuf> {
        self.input
            .css
            .to_vec()
            .iter()
            .map(|path| self.base_dir.join(path))
            .collect()
    }
}

/// Locate and load the config for a widget directory, falling back to
/// the directory above it when the widget has no config of its own.
pub fn resolve_config(widget_dir: &Path) -> BuildResult<BuildConfig> {
    let local = widget_dir.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return load_config(&local);
    }

    let fallback_dir = widget_dir
        .parent()
        .unwrap_or(widget_dir)
        .to_path_buf();
    let fallback = fallback_dir.join(CONFIG_FILE_NAME);
    if fallback.is_file() {
        log::warn!(
            "no {} in {}, using {}",
            CONFIG_FILE_NAME,
            widget_dir.display(),
            fallback.display()
        );
        return load_config(&fallback);
    }

    Err(BuildError::ConfigNotFound {
        widget_dir: widget_dir.to_path_buf(),
        fallback_dir,
    })
}

/// Load a config file directly.
pub fn load_config(path: &Path) -> BuildResult<BuildConfig> {
    let file = File::open(path).map_err(|e| BuildError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let reader = BufReader::new(file);
    let mut config: BuildConfig =
        serde_json::from_reader(reader).map_err(|e| BuildError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    config.base_dir = path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> serde_json::Result<BuildConfig> {
        serde_json::from_str(source)
    }

    #[test]
    fn css_accepts_single_path() {
        let config = parse(
            r#"{"input": {"html": "w.html", "js_entry": "w.js", "css": "w.css"}}"#,
        )
        .unwrap();
        assert_eq!(config.input.css.to_vec(), vec![PathBuf::from("w.css")]);
    }

    #[test]
    fn css_accepts_path_list_in_order() {
        let config = parse(
            r#"{"input": {"html": "w.html", "js_entry": "w.js", "css": ["a.css", "b.css"]}}"#,
        )
        .unwrap();
        assert_eq!(
            config.input.css.to_vec(),
            vec![PathBuf::from("a.css"), PathBuf::from("b.css")]
        );
    }

    #[test]
    fn missing_field_is_rejected() {
        let result = parse(r#"{"input": {"html": "w.html", "css": "w.css"}}"#);
        let message = result.err().unwrap().to_string();
        assert!(message.contains("js_entry"));
    }

    #[test]
    fn input_paths_resolve_against_base_dir() {
        let mut config = parse(
            r#"{"input": {"html": "shell.html", "js_entry": "entry.js", "css": "w.css"}}"#,
        )
        .unwrap();
        config.base_dir = PathBuf::from("widgets/chart");
        assert_eq!(config.html_path(), PathBuf::from("widgets/chart/shell.html"));
        assert_eq!(
            config.js_entry_path(),
            PathBuf::from("widgets/chart/entry.js")
        );
        assert_eq!(config.css_paths(), vec![PathBuf::from("widgets/chart/w.css")]);
    }
}
