//! Module graph construction.
//!
//! Parses the entry module, analyzes its dependencies and resolves
//! them depth first into an insertion-ordered graph. Graph state
//! lives for a single bundle invocation so repeated builds never see
//! stale modules.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexMap;

use swc_common::{comments::SingleThreadedComments, FileName, SourceMap};
use swc_ecma_ast::{Module, ModuleDecl, ModuleItem, TargetEnv};
use swc_ecma_dep_graph::analyze_dependencies;
use swc_ecma_loader::{resolve::Resolve, resolvers::node::NodeModulesResolver};

use super::transform;
use crate::swc_utils;

/// How a module body was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// Parsed EcmaScript module.
    Esm,
    /// JSON file converted to a default export.
    Json,
}

/// A parsed module and its resolved dependency edges.
#[derive(Debug)]
pub struct ModuleRecord {
    /// Position in the graph; doubles as the registry index in the
    /// emitted bundle.
    pub id: usize,
    /// Resolved path of the module source.
    pub path: PathBuf,
    pub kind: ModuleKind,
    /// The module AST.
    pub module: Module,
    /// Resolved edges in source order, specifier to target path.
    pub resolved: Vec<(String, PathBuf)>,
}

/// Insertion-ordered module graph rooted at an entry module.
pub struct ModuleGraph {
    source_map: Arc<SourceMap>,
    resolver: Box<dyn Resolve>,
    modules: IndexMap<PathBuf, ModuleRecord>,
    /// Edges that close a cycle, kept for diagnostics.
    cycles: Vec<(PathBuf, PathBuf)>,
}

impl ModuleGraph {
    pub fn new(source_map: Arc<SourceMap>) -> Self {
        ModuleGraph {
            source_map,
            resolver: Box::new(NodeModulesResolver::new(
                TargetEnv::Browser,
                Default::default(),
            )),
            modules: IndexMap::new(),
            cycles: Vec::new(),
        }
    }

    /// Load the graph rooted at the entry module. The entry always
    /// gets id zero.
    pub fn load<P: AsRef<Path>>(&mut self, entry: P) -> Result<()> {
        let entry = entry.as_ref();
        let entry = entry
            .canonicalize()
            .unwrap_or_else(|_| entry.to_path_buf());
        let mut parents: Vec<PathBuf> = Vec::new();
        self.visit(&entry, &mut parents)
    }

    fn visit(&mut self, file: &PathBuf, parents: &mut Vec<PathBuf>) -> Result<()> {
        if self.modules.contains_key(file) {
            return Ok(());
        }

        let record = self.parse_file(file)?;
        let edges: Vec<PathBuf> = record
            .resolved
            .iter()
            .map(|(_, target)| target.clone())
            .collect();
        self.modules.insert(file.clone(), record);

        parents.push(file.clone());
        for target in edges {
            if parents.contains(&target) {
                log::debug!(
                    "import cycle {} -> {}",
                    file.display(),
                    target.display()
                );
                self.cycles.push((file.clone(), target));
                continue;
            }
            self.visit(&target, parents)?;
        }
        parents.pop();
        Ok(())
    }

    /// Parse a file, analyze dependencies and resolve dependency
    /// file paths.
    fn parse_file(&self, file: &Path) -> Result<ModuleRecord> {
        let id = self.modules.len();
        let extension = file.extension().map(|s| s.to_string_lossy().to_string());
        match extension.as_deref() {
            Some("json") => self.parse_json(file, id),
            _ => self.parse_module(file, id),
        }
    }

    fn parse_module(&self, file: &Path, id: usize) -> Result<ModuleRecord> {
        let fm = self
            .source_map
            .load_file(file)
            .with_context(|| format!("failed to read module {}", file.display()))?;
        let module = swc_utils::parse_module(&self.source_map, &fm)?;

        // Specifiers from import and export declarations only; the
        // dependency analyzer also sees dynamic forms.
        let static_specs = static_specifiers(&module);

        let comments: SingleThreadedComments = Default::default();
        for dep in analyze_dependencies(&module, &comments) {
            let spec = format!("{}", dep.specifier);
            if !static_specs.contains(&spec) {
                bail!(
                    "unsupported dynamic import or require of {:?} in {}",
                    spec,
                    file.display()
                );
            }
        }

        let base = FileName::Real(file.to_path_buf());
        let mut resolved = Vec::with_capacity(static_specs.len());
        for spec in static_specs {
            let file_name = self
                .resolver
                .resolve(&base, &spec)
                .context(format!("failed to resolve import {:?}", &spec))?;
            match file_name {
                FileName::Real(target) => {
                    let target =
                        target.canonicalize().unwrap_or(target);
                    resolved.push((spec, target));
                }
                other => bail!(
                    "import {:?} resolved to unsupported target {}",
                    spec,
                    other
                ),
            }
        }

        Ok(ModuleRecord {
            id,
            path: file.to_path_buf(),
            kind: ModuleKind::Esm,
            module,
            resolved,
        })
    }

    /// Parse a JSON file as a module.
    fn parse_json(&self, file: &Path, id: usize) -> Result<ModuleRecord> {
        let fm = self
            .source_map
            .load_file(file)
            .with_context(|| format!("failed to read module {}", file.display()))?;
        let handler = swc_utils::get_handler(Arc::clone(&self.source_map));
        let mut parser = swc_utils::get_parser(&*fm);
        let expr = parser.parse_expr().map_err(|e| {
            anyhow!(
                "failed to parse json module {}: {}",
                file.display(),
                swc_utils::emit_diagnostic(&handler, e)
            )
        })?;

        Ok(ModuleRecord {
            id,
            path: file.to_path_buf(),
            kind: ModuleKind::Json,
            module: transform::json_module(expr),
            resolved: Vec::new(),
        })
    }

    /// Number of modules in the graph.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Look up a module by path.
    pub fn get(&self, path: &Path) -> Option<&ModuleRecord> {
        self.modules.get(path)
    }

    /// Modules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.values()
    }

    /// Edges that closed an import cycle.
    pub fn cycles(&self) -> &[(PathBuf, PathBuf)] {
        &self.cycles
    }

    /// Consume the graph in insertion order.
    pub fn into_records(self) -> Vec<ModuleRecord> {
        self.modules.into_iter().map(|(_, record)| record).collect()
    }
}

/// Import specifiers declared by top-level module syntax, in source
/// order.
fn static_specifiers(module: &Module) -> Vec<String> {
    let mut specs = Vec::new();
    for item in module.body.iter() {
        if let ModuleItem::ModuleDecl(decl) = item {
            match decl {
                ModuleDecl::Import(import) => {
                    specs.push(import.src.value.to_string());
                }
                ModuleDecl::ExportNamed(export) => {
                    if let Some(src) = &export.src {
                        specs.push(src.value.to_string());
                    }
                }
                ModuleDecl::ExportAll(export) => {
                    specs.push(export.src.value.to_string());
                }
                _ => {}
            }
        }
    }
    specs
}
