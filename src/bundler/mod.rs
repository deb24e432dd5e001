//! Bundle a module graph into a single self-executing script.
//!
//! Every module in the graph becomes a `function (module, exports)`
//! entry in a registry array; a small prelude provides the lookup
//! function with its result cache. The whole program is wrapped in
//! `void function() {...}.call(this)` so nothing leaks into the scope
//! of the page that ends up hosting it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};

use swc::{
    config::{JscTarget, SourceMapsConfig},
    Compiler,
};
use swc_common::{SourceMap, DUMMY_SP};
use swc_ecma_ast::*;

pub mod graph;
pub(crate) mod transform;

use crate::swc_utils;
use graph::ModuleGraph;
use transform::ModuleRewriter;

/// Registry runtime: a result cache plus the lookup function that
/// instantiates a module on first use.
const PRELUDE: &str = r#"
"use strict";
var __cache = {};
function __require(id) {
    var cached = __cache[id];
    if (cached) return cached.exports;
    var module = __cache[id] = { exports: {} };
    __modules[id](module, module.exports);
    return module.exports;
}
"#;

/// Copy helper backing `export *`; the default export never
/// propagates.
const STAR_HELPER: &str = r#"
function __star(from, to) {
    Object.keys(from).forEach(function (key) {
        if (key !== "default") to[key] = from[key];
    });
    return to;
}
"#;

/// Bundle the entry module and every statically reachable import
/// into one self-executing script.
pub fn bundle<P: AsRef<Path>>(entry: P) -> Result<String> {
    let source_map: Arc<SourceMap> = Arc::new(Default::default());
    let mut graph = ModuleGraph::new(Arc::clone(&source_map));
    graph.load(entry.as_ref())?;
    for (from, to) in graph.cycles() {
        log::warn!(
            "import cycle between {} and {}",
            from.display(),
            to.display()
        );
    }
    log::debug!("bundling {} modules", graph.len());
    emit(graph, source_map)
}

fn emit(graph: ModuleGraph, source_map: Arc<SourceMap>) -> Result<String> {
    let ids: HashMap<PathBuf, usize> = graph
        .iter()
        .map(|record| (record.path.clone(), record.id))
        .collect();

    let mut elems: Vec<Option<ExprOrSpread>> = Vec::with_capacity(graph.len());
    let mut needs_star = false;
    for record in graph.into_records() {
        let mut spec_ids: HashMap<String, usize> = HashMap::new();
        for (spec, target) in record.resolved.iter() {
            let id = ids.get(target).copied().ok_or_else(|| {
                anyhow!("unresolved module {}", target.display())
            })?;
            spec_ids.insert(spec.clone(), id);
        }

        let mut rewriter = ModuleRewriter::new(&spec_ids);
        let stmts = rewriter.rewrite(record.module)?;
        needs_star = needs_star || rewriter.needs_star;
        elems.push(Some(ExprOrSpread {
            spread: None,
            expr: Box::new(Expr::Fn(module_function(stmts))),
        }));
    }

    let mut body =
        swc_utils::parse_script(&source_map, "prelude.js", PRELUDE)?.body;
    if needs_star {
        let star =
            swc_utils::parse_script(&source_map, "star.js", STAR_HELPER)?;
        body.extend(star.body);
    }
    body.push(registry_decl(elems));
    body.push(transform::expr_stmt(transform::require_call(0)));

    let program = Program::Script(Script {
        span: DUMMY_SP,
        body: vec![inject_iife(body)],
        shebang: None,
    });

    let compiler = Compiler::new(source_map);
    let result = compiler.print(
        &program,
        None,
        None,
        false,
        JscTarget::Es2020,
        SourceMapsConfig::Bool(false),
        &[],
        None,
        false,
        None,
    )?;

    Ok(result.code)
}

/// `function (module, exports) { <stmts> }`
fn module_function(stmts: Vec<Stmt>) -> FnExpr {
    FnExpr {
        ident: None,
        function: Function {
            params: vec![param(transform::MODULE), param(transform::EXPORTS)],
            body: Some(BlockStmt {
                span: DUMMY_SP,
                stmts,
            }),
            decorators: vec![],
            span: DUMMY_SP,
            is_generator: false,
            is_async: false,
            type_params: None,
            return_type: None,
        },
    }
}

fn param(name: &str) -> Param {
    Param {
        span: DUMMY_SP,
        decorators: vec![],
        pat: Pat::Ident(BindingIdent {
            id: transform::ident(name),
            type_ann: None,
        }),
    }
}

/// `var __modules = [<functions>];`
fn registry_decl(elems: Vec<Option<ExprOrSpread>>) -> Stmt {
    Stmt::Decl(Decl::Var(VarDecl {
        span: DUMMY_SP,
        kind: VarDeclKind::Var,
        declare: false,
        decls: vec![VarDeclarator {
            span: DUMMY_SP,
            name: Pat::Ident(BindingIdent {
                id: transform::ident(transform::MODULES),
                type_ann: None,
            }),
            init: Some(Box::new(Expr::Array(ArrayLit {
                span: DUMMY_SP,
                elems,
            }))),
            definite: false,
        }],
    }))
}

/// Wrap the program in `void function() {...}.call(this);`.
fn inject_iife(stmts: Vec<Stmt>) -> Stmt {
    Stmt::Expr(ExprStmt {
        span: DUMMY_SP,
        expr: Box::new(Expr::Unary(UnaryExpr {
            span: DUMMY_SP,
            op: UnaryOp::Void,
            arg: Box::new(Expr::Call(CallExpr {
                span: DUMMY_SP,
                callee: ExprOrSuper::Expr(Box::new(Expr::Member(MemberExpr {
                    span: DUMMY_SP,
                    computed: false,
                    obj: ExprOrSuper::Expr(Box::new(Expr::Fn(FnExpr {
                        ident: None,
                        function: Function {
                            params: vec![],
                            body: Some(BlockStmt {
                                span: DUMMY_SP,
                                stmts,
                            }),
                            decorators: vec![],
                            span: DUMMY_SP,
                            is_generator: false,
                            is_async: false,
                            type_params: None,
                            return_type: None,
                        },
                    }))),
                    prop: Box::new(Expr::Ident(transform::ident("call"))),
                }))),
                args: vec![ExprOrSpread {
                    spread: None,
                    expr: Box::new(Expr::This(ThisExpr { span: DUMMY_SP })),
                }],
                type_args: None,
            })),
        })),
    })
}
