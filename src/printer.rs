//! Print a module graph as a tree of import specifiers.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::bundler::graph::ModuleGraph;

const TREE_BAR: &str = "│";
const TREE_BRANCH: &str = "├──";
const TREE_CORNER: &str = "└──";

#[derive(Debug, Default)]
pub struct PrintOptions {
    pub include_id: bool,
    pub include_file: bool,
}

#[derive(Debug)]
struct PrintBranchState {
    last: bool,
}

#[derive(Debug)]
struct PrintState {
    open: Vec<PrintBranchState>,
    parents: Vec<PathBuf>,
}

pub(crate) struct Printer {
    options: PrintOptions,
}

impl Printer {
    pub fn new(options: PrintOptions) -> Self {
        Printer { options }
    }

    /// List module imports for an entry point.
    pub fn print<P: AsRef<Path>>(
        &self,
        graph: &ModuleGraph,
        entry: P,
    ) -> Result<()> {
        let given = entry.as_ref();
        let resolved = given
            .canonicalize()
            .unwrap_or_else(|_| given.to_path_buf());
        let record = graph
            .get(&resolved)
            .ok_or_else(|| anyhow!("no module loaded for {}", given.display()))?;

        println!("{}", given.display());
        let mut state = PrintState {
            open: Vec::new(),
            parents: Vec::new(),
        };
        self.print_imports(graph, record, &mut state)
    }

    fn print_imports(
        &self,
        graph: &ModuleGraph,
        record: &crate::bundler::graph::ModuleRecord,
        state: &mut PrintState,
    ) -> Result<()> {
        state.open.push(PrintBranchState { last: false });
        for (i, (spec, target)) in record.resolved.iter().enumerate() {
            let last = i == (record.resolved.len() - 1);
            let cycle = state.parents.iter().any(|p| p == target);

            state.open.last_mut().unwrap().last = last;

            let child = graph.get(target).ok_or_else(|| {
                anyhow!("no module loaded for {}", target.display())
            })?;

            let mark = if last { TREE_CORNER } else { TREE_BRANCH };
            for (j, iter_state) in state.open.iter().enumerate() {
                let end = j == (state.open.len() - 1);
                if !end {
                    if !iter_state.last {
                        print!("{}   ", TREE_BAR);
                    } else {
                        print!("    ");
                    }
                } else {
                    print!("{} ", mark);
                }
            }

            print!("{}", spec);

            if self.options.include_id {
                print!(" ({})", child.id);
            }

            if self.options.include_file {
                print!(" {}", child.path.display());
            }

            if cycle {
                print!(" (∞ -> {})", child.id);
            }

            print!("\n");

            if cycle {
                continue;
            }

            if !child.resolved.is_empty() {
                state.parents.push(target.clone());
                self.print_imports(graph, child, state)?;
                state.parents.pop();
            }
        }
        state.open.pop();
        Ok(())
    }
}
