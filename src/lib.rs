//! Bundle custom HTML widgets into single-file deploy artifacts.
//!
//! A widget directory holds an HTML shell, a script entry point and
//! one or more stylesheets, declared by a `build.config.json`. The
//! build inlines everything into one stamped HTML file ready to paste
//! into a hosting page.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};

use swc_common::SourceMap;

pub mod builder;
pub mod bundler;
pub mod config;
pub mod error;
pub mod html;
pub mod stamp;

mod printer;
mod swc_utils;

pub use builder::{build, BuildArtifact, BuildOptions};
pub use error::{BuildError, BuildResult};
pub use printer::PrintOptions;

/// Print the resolved module graph for a script entry point.
pub fn tree(entry: PathBuf, options: PrintOptions) -> Result<()> {
    if !entry.is_file() {
        bail!("entry point {:?} does not exist", entry);
    }
    let source_map: Arc<SourceMap> = Arc::new(Default::default());
    let mut graph = bundler::graph::ModuleGraph::new(Arc::clone(&source_map));
    graph.load(&entry)?;
    let printer = printer::Printer::new(options);
    printer.print(&graph, &entry)
}
