//! Helpers to get a handler, parser or parsed source.
use std::sync::Arc;

use anyhow::{anyhow, Result};

use swc_common::{
    errors::{emitter::ColorConfig, Handler},
    FileName, SourceFile, SourceMap,
};
use swc_ecma_ast::{Module, Script};
use swc_ecma_parser::{
    error::Error as ParseError, lexer::Lexer, Parser, StringInput, Syntax,
};

pub(crate) fn get_handler(sm: Arc<SourceMap>) -> Handler {
    Handler::with_tty_emitter(ColorConfig::Auto, true, false, Some(sm))
}

pub(crate) fn get_parser<'a>(
    fm: &'a SourceFile,
) -> Parser<Lexer<'a, StringInput<'a>>> {
    let lexer = Lexer::new(
        // We want to parse ecmascript
        Syntax::Es(Default::default()),
        // JscTarget defaults to es5
        Default::default(),
        StringInput::from(fm),
        None,
    );
    Parser::new_from(lexer)
}

/// Emit a parse diagnostic and keep its message for the error chain.
pub(crate) fn emit_diagnostic(handler: &Handler, e: ParseError) -> String {
    let mut diagnostic = e.into_diagnostic(handler);
    let message = diagnostic.message();
    diagnostic.emit();
    message
}

/// Parse a module from a file registered with the source map.
pub(crate) fn parse_module(
    sm: &Arc<SourceMap>,
    fm: &SourceFile,
) -> Result<Module> {
    let handler = get_handler(Arc::clone(sm));
    let mut parser = get_parser(fm);
    let module = parser.parse_module().map_err(|e| {
        anyhow!(
            "failed to parse {}: {}",
            fm.name,
            emit_diagnostic(&handler, e)
        )
    })?;
    if let Some(e) = parser.take_errors().into_iter().next() {
        return Err(anyhow!(
            "failed to parse {}: {}",
            fm.name,
            emit_diagnostic(&handler, e)
        ));
    }
    Ok(module)
}

/// Parse a synthetic script source, registering it with the
/// source map under the given name.
pub(crate) fn parse_script(
    sm: &Arc<SourceMap>,
    name: &str,
    source: &str,
) -> Result<Script> {
    let fm = sm.new_source_file(FileName::Custom(name.into()), source.into());
    let handler = get_handler(Arc::clone(sm));
    let mut parser = get_parser(&*fm);
    let script = parser.parse_script().map_err(|e| {
        anyhow!("failed to parse {}: {}", name, emit_diagnostic(&handler, e))
    })?;
    if let Some(e) = parser.take_errors().into_iter().next() {
        return Err(anyhow!(
            "failed to parse {}: {}",
            name,
            emit_diagnostic(&handler, e)
        ));
    }
    Ok(script)
}
