//! Rewrite parsed modules into registry functions.
//!
//! Import and export declarations are the only module-level syntax;
//! every other statement passes through untouched. Imports become
//! `const` bindings against the registry lookup so later statements
//! observe a snapshot of the dependency's exports rather than live
//! bindings.

use std::collections::HashMap;

use anyhow::{anyhow, Result};

use swc_atoms::JsWord;
use swc_common::DUMMY_SP;
use swc_ecma_ast::*;

/// Registry lookup function declared by the prelude.
pub(crate) const REQUIRE: &str = "__require";
/// Module registry array declared by the prelude.
pub(crate) const MODULES: &str = "__modules";
/// Copy helper for `export *`, declared on demand.
pub(crate) const STAR: &str = "__star";
/// First registry function parameter.
pub(crate) const MODULE: &str = "module";
/// Second registry function parameter.
pub(crate) const EXPORTS: &str = "exports";

const DEFAULT_EXPORT: &str = "default";

/// Rewrites the top-level items of one module.
///
/// Imports are hoisted ahead of the module body, which is how ES
/// module instantiation orders them anyway; export declarations stay
/// in place followed by the assignments that publish them.
pub(crate) struct ModuleRewriter<'a> {
    /// Import specifier to registry id, for this module only.
    spec_ids: &'a HashMap<String, usize>,
    /// Set when a rewritten item needs the `export *` helper.
    pub needs_star: bool,
}

impl<'a> ModuleRewriter<'a> {
    pub fn new(spec_ids: &'a HashMap<String, usize>) -> Self {
        ModuleRewriter {
            spec_ids,
            needs_star: false,
        }
    }

    /// Rewrite a module into the statement list for its registry
    /// function.
    pub fn rewrite(&mut self, module: Module) -> Result<Vec<Stmt>> {
        let mut imports = Vec::new();
        let mut body = Vec::new();
        for item in module.body {
            match item {
                ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                    self.rewrite_import(import, &mut imports)?;
                }
                ModuleItem::ModuleDecl(decl) => {
                    self.rewrite_module_decl(decl, &mut body)?;
                }
                ModuleItem::Stmt(stmt) => body.push(stmt),
            }
        }
        imports.extend(body);
        Ok(imports)
    }

    fn rewrite_import(
        &mut self,
        import: ImportDecl,
        out: &mut Vec<Stmt>,
    ) -> Result<()> {
        let id = self.module_id(import.src.value.as_ref())?;

        // import "./effects.js";
        if import.specifiers.is_empty() {
            out.push(expr_stmt(self.require_call(id)));
            return Ok(());
        }

        let mut props: Vec<ObjectPatProp> = Vec::new();
        for spec in import.specifiers {
            match spec {
                ImportSpecifier::Named(item) => match item.imported {
                    Some(imported) if imported.sym != item.local.sym => {
                        props.push(ObjectPatProp::KeyValue(KeyValuePatProp {
                            key: PropName::Ident(imported),
                            value: Box::new(Pat::Ident(BindingIdent {
                                id: item.local,
                                type_ann: None,
                            })),
                        }));
                    }
                    _ => {
                        props.push(ObjectPatProp::Assign(AssignPatProp {
                            span: DUMMY_SP,
                            key: item.local,
                            value: None,
                        }));
                    }
                },
                ImportSpecifier::Default(item) => {
                    out.push(const_decl(
                        Pat::Ident(BindingIdent {
                            id: item.local,
                            type_ann: None,
                        }),
                        member(self.require_call(id), DEFAULT_EXPORT),
                    ));
                }
                ImportSpecifier::Namespace(item) => {
                    out.push(const_decl(
                        Pat::Ident(BindingIdent {
                            id: item.local,
                            type_ann: None,
                        }),
                        self.require_call(id),
                    ));
                }
            }
        }

        if !props.is_empty() {
            out.push(const_decl(
                Pat::Object(ObjectPat {
                    span: DUMMY_SP,
                    props,
                    optional: false,
                    type_ann: None,
                }),
                self.require_call(id),
            ));
        }
        Ok(())
    }

    fn rewrite_module_decl(
        &mut self,
        decl: ModuleDecl,
        out: &mut Vec<Stmt>,
    ) -> Result<()> {
        match decl {
            ModuleDecl::ExportDecl(export) => {
                let names = decl_names(&export.decl);
                out.push(Stmt::Decl(export.decl));
                for name in names {
                    out.push(assign_stmt(
                        exports_member(name.as_ref()),
                        Expr::Ident(Ident::new(name.clone(), DUMMY_SP)),
                    ));
                }
            }
            ModuleDecl::ExportNamed(export) => {
                self.rewrite_export_named(export, out)?;
            }
            ModuleDecl::ExportDefaultDecl(export) => {
                rewrite_export_default_decl(export, out);
            }
            ModuleDecl::ExportDefaultExpr(export) => {
                out.push(assign_stmt(
                    exports_member(DEFAULT_EXPORT),
                    *export.expr,
                ));
            }
            ModuleDecl::ExportAll(export) => {
                self.needs_star = true;
                let id = self.module_id(export.src.value.as_ref())?;
                // __star(__require(id), exports);
                out.push(expr_stmt(Expr::Call(CallExpr {
                    span: DUMMY_SP,
                    callee: ExprOrSuper::Expr(Box::new(Expr::Ident(ident(
                        STAR,
                    )))),
                    args: vec![
                        ExprOrSpread {
                            spread: None,
                            expr: Box::new(self.require_call(id)),
                        },
                        ExprOrSpread {
                            spread: None,
                            expr: Box::new(Expr::Ident(ident(EXPORTS))),
                        },
                    ],
                    type_args: None,
                })));
            }
            // Imports are split off before this point.
            ModuleDecl::Import(_) => {}
            _ => {}
        }
        Ok(())
    }

    fn rewrite_export_named(
        &mut self,
        export: NamedExport,
        out: &mut Vec<Stmt>,
    ) -> Result<()> {
        match export.src {
            // export { a, b as c } from "./dep.js";
            Some(src) => {
                let id = self.module_id(src.value.as_ref())?;
                for spec in export.specifiers {
                    match spec {
                        ExportSpecifier::Named(item) => {
                            let exported = item
                                .exported
                                .clone()
                                .unwrap_or_else(|| item.orig.clone());
                            out.push(assign_stmt(
                                exports_member(exported.sym.as_ref()),
                                member(
                                    self.require_call(id),
                                    item.orig.sym.as_ref(),
                                ),
                            ));
                        }
                        ExportSpecifier::Namespace(item) => {
                            out.push(assign_stmt(
                                exports_member(item.name.sym.as_ref()),
                                self.require_call(id),
                            ));
                        }
                        ExportSpecifier::Default(item) => {
                            out.push(assign_stmt(
                                exports_member(item.exported.sym.as_ref()),
                                member(self.require_call(id), DEFAULT_EXPORT),
                            ));
                        }
                    }
                }
            }
            // export { a, b as c };
            None => {
                for spec in export.specifiers {
                    if let ExportSpecifier::Named(item) = spec {
                        let exported = item
                            .exported
                            .clone()
                            .unwrap_or_else(|| item.orig.clone());
                        out.push(assign_stmt(
                            exports_member(exported.sym.as_ref()),
                            Expr::Ident(item.orig),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn module_id(&self, spec: &str) -> Result<usize> {
        self.spec_ids
            .get(spec)
            .copied()
            .ok_or_else(|| anyhow!("no module registered for import {:?}", spec))
    }

    fn require_call(&self, id: usize) -> Expr {
        require_call(id)
    }
}

fn rewrite_export_default_decl(export: ExportDefaultDecl, out: &mut Vec<Stmt>) {
    match export.decl {
        DefaultDecl::Fn(expr) => match expr.ident.clone() {
            // Keep the declaration so self-references keep working.
            Some(id) => {
                out.push(Stmt::Decl(Decl::Fn(FnDecl {
                    ident: id.clone(),
                    declare: false,
                    function: expr.function,
                })));
                out.push(assign_stmt(
                    exports_member(DEFAULT_EXPORT),
                    Expr::Ident(id),
                ));
            }
            None => {
                out.push(assign_stmt(
                    exports_member(DEFAULT_EXPORT),
                    Expr::Fn(expr),
                ));
            }
        },
        DefaultDecl::Class(expr) => match expr.ident.clone() {
            Some(id) => {
                out.push(Stmt::Decl(Decl::Class(ClassDecl {
                    ident: id.clone(),
                    declare: false,
                    class: expr.class,
                })));
                out.push(assign_stmt(
                    exports_member(DEFAULT_EXPORT),
                    Expr::Ident(id),
                ));
            }
            None => {
                out.push(assign_stmt(
                    exports_member(DEFAULT_EXPORT),
                    Expr::Class(expr),
                ));
            }
        },
        DefaultDecl::TsInterfaceDecl(_) => {}
    }
}

/// Names bound by an exported declaration, in declaration order.
fn decl_names(decl: &Decl) -> Vec<JsWord> {
    let mut names = Vec::new();
    match decl {
        Decl::Fn(func) => names.push(func.ident.sym.clone()),
        Decl::Class(class) => names.push(class.ident.sym.clone()),
        Decl::Var(var) => {
            for entry in var.decls.iter() {
                pattern_names(&entry.name, &mut names);
            }
        }
        _ => {}
    }
    names
}

/// Collect the identifiers bound by a destructuring pattern.
fn pattern_names(pat: &Pat, names: &mut Vec<JsWord>) {
    match pat {
        Pat::Ident(binding) => names.push(binding.id.sym.clone()),
        Pat::Object(obj) => {
            for prop in obj.props.iter() {
                match prop {
                    ObjectPatProp::Assign(entry) => {
                        names.push(entry.key.sym.clone());
                    }
                    ObjectPatProp::KeyValue(entry) => {
                        pattern_names(&entry.value, names);
                    }
                    ObjectPatProp::Rest(entry) => {
                        pattern_names(&entry.arg, names);
                    }
                }
            }
        }
        Pat::Array(arr) => {
            for elem in arr.elems.iter().flatten() {
                pattern_names(elem, names);
            }
        }
        Pat::Rest(rest) => pattern_names(&rest.arg, names),
        Pat::Assign(assign) => pattern_names(&assign.left, names),
        _ => {}
    }
}

/// Convert a parsed JSON expression into a module whose single
/// statement publishes the value as the default export.
pub(crate) fn json_module(expr: Box<Expr>) -> Module {
    Module {
        span: DUMMY_SP,
        body: vec![ModuleItem::Stmt(assign_stmt(
            exports_member(DEFAULT_EXPORT),
            *expr,
        ))],
        shebang: None,
    }
}

pub(crate) fn ident(sym: &str) -> Ident {
    Ident::new(sym.into(), DUMMY_SP)
}

pub(crate) fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expr(ExprStmt {
        span: DUMMY_SP,
        expr: Box::new(expr),
    })
}

/// `__require(<id>)`
pub(crate) fn require_call(id: usize) -> Expr {
    Expr::Call(CallExpr {
        span: DUMMY_SP,
        callee: ExprOrSuper::Expr(Box::new(Expr::Ident(ident(REQUIRE)))),
        args: vec![ExprOrSpread {
            spread: None,
            expr: Box::new(Expr::Lit(Lit::Num(Number {
                span: DUMMY_SP,
                value: id as f64,
            }))),
        }],
        type_args: None,
    })
}

/// `<obj>.<prop>`
fn member(obj: Expr, prop: &str) -> Expr {
    Expr::Member(MemberExpr {
        span: DUMMY_SP,
        obj: ExprOrSuper::Expr(Box::new(obj)),
        prop: Box::new(Expr::Ident(ident(prop))),
        computed: false,
    })
}

/// `exports.<name>`
fn exports_member(name: &str) -> Expr {
    member(Expr::Ident(ident(EXPORTS)), name)
}

/// `<target> = <value>;`
fn assign_stmt(target: Expr, value: Expr) -> Stmt {
    expr_stmt(Expr::Assign(AssignExpr {
        span: DUMMY_SP,
        op: AssignOp::Assign,
        left: PatOrExpr::Expr(Box::new(target)),
        right: Box::new(value),
    }))
}

/// `const <name> = <init>;`
fn const_decl(name: Pat, init: Expr) -> Stmt {
    Stmt::Decl(Decl::Var(VarDecl {
        span: DUMMY_SP,
        kind: VarDeclKind::Const,
        declare: false,
        decls: vec![VarDeclarator {
            span: DUMMY_SP,
            name,
            init: Some(Box::new(init)),
            definite: false,
        }],
    }))
}
