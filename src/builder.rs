//! The widget build pipeline.
//!
//! One strict linear pass per widget: resolve the config, bundle the
//! script entry, concatenate the stylesheets, splice both into the
//! HTML shell, stamp provenance and write a single artifact. The
//! first failure aborts before anything touches the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::bundler;
use crate::config;
use crate::error::{BuildError, BuildResult};
use crate::html;
use crate::stamp::{self, BuildMetadata};

/// Suffix appended to the widget directory name for the artifact.
const DEPLOY_SUFFIX: &str = "-deploy.html";
/// Default output directory inside the widget directory.
const DEPLOY_DIR: &str = "deploy";

/// Options for a single build run.
#[derive(Debug, Default)]
pub struct BuildOptions {
    /// Where to write the artifact; defaults to `<widget_dir>/deploy`.
    pub out_dir: Option<PathBuf>,
    /// Fixed build date for reproducible output. Defaults to now.
    pub build_date: Option<String>,
}

/// What one successful build produced.
#[derive(Debug)]
pub struct BuildArtifact {
    /// Full artifact content, provenance comment included.
    pub html: String,
    /// Digest of the content before the comment was prepended.
    pub checksum: String,
    /// Metadata recorded in the comment.
    pub metadata: BuildMetadata,
    /// Where the artifact was written.
    pub output_path: PathBuf,
}

/// Build the widget in `widget_dir` and write its deploy artifact.
pub fn build(widget_dir: &Path, options: &BuildOptions) -> BuildResult<BuildArtifact> {
    let widget_dir =
        widget_dir
            .canonicalize()
            .map_err(|e| BuildError::FileRead {
                path: widget_dir.to_path_buf(),
                source: e,
            })?;
    log::info!("building widget {}", widget_dir.display());

    let config = config::resolve_config(&widget_dir)?;

    // Bundle the script entry first; it is the most likely stage to
    // fail and nothing before it is expensive.
    let entry = config.js_entry_path();
    if !entry.is_file() {
        return Err(BuildError::FileRead {
            path: entry,
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    }
    let bundle = bundler::bundle(&entry).map_err(|e| BuildError::Bundle {
        entry: entry.clone(),
        message: format!("{:#}", e),
    })?;
    log::info!("bundled {} ({} bytes)", entry.display(), bundle.len());

    let css_paths = config.css_paths();
    let mut combined_css = String::new();
    for path in css_paths.iter() {
        let content = fs::read_to_string(path).map_err(|e| BuildError::FileRead {
            path: path.clone(),
            source: e,
        })?;
        combined_css.push_str(&content);
        combined_css.push('\n');
    }

    let html_path = config.html_path();
    let shell = fs::read_to_string(&html_path).map_err(|e| BuildError::FileRead {
        path: html_path.clone(),
        source: e,
    })?;

    let spliced = html::inline_stylesheets(&shell, &css_paths, &combined_css)
        .map_err(|e| BuildError::ConfigInvalid {
            path: html_path.clone(),
            reason: format!("{:#}", e),
        })?;
    let spliced = html::inline_entry_script(&spliced, &config.input.js_entry, &bundle)
        .map_err(|e| BuildError::ConfigInvalid {
            path: html_path.clone(),
            reason: format!("{:#}", e),
        })?;

    // The checksum covers the content as spliced, never the stamp,
    // so rebuilding unchanged inputs reports the same digest.
    let checksum = stamp::checksum(&spliced);
    let metadata = BuildMetadata {
        version: stamp::read_version(&widget_dir),
        build_date: options
            .build_date
            .clone()
            .unwrap_or_else(stamp::build_date_now),
        checksum: checksum.clone(),
    };
    let html = format!("{}\n{}", stamp::provenance_comment(&metadata), spliced);

    let widget_name = widget_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "widget".to_string());
    let out_dir = options
        .out_dir
        .clone()
        .unwrap_or_else(|| widget_dir.join(DEPLOY_DIR));
    fs::create_dir_all(&out_dir).map_err(|e| BuildError::FileWrite {
        path: out_dir.clone(),
        source: e,
    })?;
    let output_path = out_dir.join(format!("{}{}", widget_name, DEPLOY_SUFFIX));
    fs::write(&output_path, &html).map_err(|e| BuildError::FileWrite {
        path: output_path.clone(),
        source: e,
    })?;
    log::info!("wrote {}", output_path.display());

    Ok(BuildArtifact {
        html,
        checksum,
        metadata,
        output_path,
    })
}
