use anyhow::Result;
use std::sync::Arc;

use swc_common::SourceMap;

use breccia::bundler::{bundle, graph::ModuleGraph};

#[test]
fn bundle_import_forms() -> Result<()> {
    let code = bundle("tests/fixtures/bundle/imports/main.js")?;
    //println!("{}", code);

    // Named, default, namespace and side effect imports all survive
    // the rewrite.
    assert!(code.contains("__WIDGET_BANNER"));
    assert!(code.contains("good morning"));
    assert!(code.contains("__SIDE_EFFECT_LOADED"));
    assert!(code.contains("exports.default"));

    // No module syntax is left in the output.
    assert!(!code.contains("import"));
    assert!(!code.contains("export "));
    Ok(())
}

#[test]
fn bundle_wrapped_in_iife() -> Result<()> {
    let code = bundle("tests/fixtures/bundle/imports/main.js")?;
    assert!(code.contains("void function"));
    assert!(code.contains(".call(this)"));
    assert!(code.contains("use strict"));

    // The entry module boots the program.
    assert!(code.contains("__require(0)"));
    Ok(())
}

#[test]
fn bundle_export_forms() -> Result<()> {
    let code = bundle("tests/fixtures/bundle/exports/main.js")?;
    //println!("{}", code);
    assert!(code.contains("exports.gris"));
    assert!(code.contains("exports.size"));
    assert!(code.contains("exports.Widget"));
    assert!(code.contains("exports.default"));

    // `export *` pulls in the copy helper.
    assert!(code.contains("__star("));
    assert!(code.contains("exports.helperOne"));
    Ok(())
}

#[test]
fn bundle_json_module() -> Result<()> {
    let code = bundle("tests/fixtures/bundle/json/main.js")?;
    assert!(code.contains("My Widget"));
    assert!(code.contains("42"));
    assert!(code.contains("exports.default"));
    Ok(())
}

#[test]
fn bundle_shared_module_once() -> Result<()> {
    let code = bundle("tests/fixtures/bundle/shared/main.js")?;
    assert_eq!(1, code.matches("only-once").count());
    Ok(())
}

#[test]
fn bundle_cycle_completes() -> Result<()> {
    let code = bundle("tests/fixtures/bundle/cycle/a.js")?;
    assert!(code.contains("__CYCLE_RESULT"));
    Ok(())
}

#[test]
fn bundle_rejects_dynamic_import() {
    let result = bundle("tests/fixtures/bundle/dynamic/main.js");
    assert!(result.is_err());
    let message = format!("{:#}", result.err().unwrap());
    assert!(message.contains("unsupported dynamic import"));
}

#[test]
fn bundle_reports_unresolved_import() {
    let result = bundle("tests/fixtures/bundle/missing/main.js");
    assert!(result.is_err());
    let message = format!("{:#}", result.err().unwrap());
    assert!(message.contains("failed to resolve import"));
}

#[test]
fn graph_entry_gets_id_zero() -> Result<()> {
    let source_map: Arc<SourceMap> = Arc::new(Default::default());
    let mut graph = ModuleGraph::new(Arc::clone(&source_map));
    graph.load("tests/fixtures/bundle/imports/main.js")?;

    assert_eq!(4, graph.len());

    let entry =
        std::fs::canonicalize("tests/fixtures/bundle/imports/main.js")?;
    let record = graph.get(&entry).unwrap();
    assert_eq!(0, record.id);
    Ok(())
}

#[test]
fn graph_records_cycle_edges() -> Result<()> {
    let source_map: Arc<SourceMap> = Arc::new(Default::default());
    let mut graph = ModuleGraph::new(Arc::clone(&source_map));
    graph.load("tests/fixtures/bundle/cycle/a.js")?;

    assert_eq!(2, graph.len());
    assert_eq!(1, graph.cycles().len());
    Ok(())
}

#[test]
fn graph_deduplicates_shared_imports() -> Result<()> {
    let source_map: Arc<SourceMap> = Arc::new(Default::default());
    let mut graph = ModuleGraph::new(Arc::clone(&source_map));
    graph.load("tests/fixtures/bundle/shared/main.js")?;

    // main, a, b and common exactly once each.
    assert_eq!(4, graph.len());
    assert!(graph.cycles().is_empty());
    Ok(())
}

#[test]
fn tree_prints_entry_graph() -> Result<()> {
    breccia::tree(
        "tests/fixtures/bundle/imports/main.js".into(),
        Default::default(),
    )?;
    Ok(())
}
