//! Rewrites dynamic JSX attribute expressions into zero-parameter thunks.
//!
//! A fine-grained reactive runtime re-runs an attribute binding when the
//! accessors it reads change. That only works if the binding is a closure the
//! runtime can call again, so this pass turns `disabled={isDisabled()}` into
//! `disabled={() => isDisabled()}`. Attributes whose expressions contain no
//! invocation, event-handler props, `ref`, and values that are already
//! functions are left untouched. Each [`transform_file`] call is a pure
//! function of its inputs; nothing is shared between invocations.

use std::path::Path;

use serde::Deserialize;
use swc_core::{
    common::{source_map::SourceMapGenConfig, sync::Lrc, FileName, SourceMap, SyntaxContext, DUMMY_SP},
    ecma::{
        ast::*,
        codegen::{self, text_writer::JsWriter, Emitter},
        parser::{lexer::Lexer, Parser, StringInput, Syntax, TsSyntax},
        visit::{VisitMut, VisitMutWith},
    },
};
use tracing::debug;

// -----------------------------------------------------------------------------
// Options & results
// -----------------------------------------------------------------------------

/// Host-supplied configuration, deserialized from the build pipeline's JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// File extensions routed through the transform.
    pub extensions: Vec<String>,
    /// Emit a source map alongside the rewritten text.
    pub source_map: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            extensions: vec!["jsx".into(), "tsx".into()],
            source_map: true,
        }
    }
}

impl Options {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    fn applies_to(&self, file: &str) -> bool {
        Path::new(file)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|known| known == ext))
    }
}

/// Outcome of one file transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutput {
    /// Nothing to do: wrong file kind, unparseable source (the host's own
    /// syntax-error path will report it), or no attribute qualified. The
    /// caller keeps the original text.
    NotApplicable,
    /// At least one attribute was thunked.
    Transformed { code: String, map: Option<String> },
}

/// Failures past the rewrite itself. Malformed input is never an error here;
/// these only occur once a mutated tree could not be written back out.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to emit rewritten module: {0}")]
    Emit(#[from] std::io::Error),
    #[error("emitter produced invalid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("failed to serialize source map: {0}")]
    SourceMap(String),
}

// -----------------------------------------------------------------------------
// Call detector
// -----------------------------------------------------------------------------

/// Does this expression syntactically contain an invocation?
///
/// Recursion is a fixed allow-list of transparent container kinds, not
/// best-effort reachability: function bodies, `new`, sequence/assignment
/// expressions, optional chains, parenthesized expressions, and computed
/// member keys are all opaque and count as call-free.
fn contains_call(expr: &Expr) -> bool {
    match expr {
        Expr::Call(_) => true,
        Expr::Tpl(t) => t.exprs.iter().any(|e| contains_call(e)),
        Expr::Cond(c) => {
            contains_call(&c.test) || contains_call(&c.cons) || contains_call(&c.alt)
        }
        // Logical operators are `Bin` in swc, so one arm covers both.
        Expr::Bin(b) => contains_call(&b.left) || contains_call(&b.right),
        Expr::Unary(u) => contains_call(&u.arg),
        // Object side only; `a[f()]` stays unflagged.
        Expr::Member(m) => contains_call(&m.obj),
        Expr::Array(a) => a
            .elems
            .iter()
            .flatten()
            .any(|el| el.spread.is_none() && contains_call(&el.expr)),
        // Shorthand, spread, getters/setters and methods are not inspected.
        Expr::Object(o) => o.props.iter().any(|prop| match prop {
            PropOrSpread::Prop(p) => match &**p {
                Prop::KeyValue(kv) => contains_call(&kv.value),
                _ => false,
            },
            PropOrSpread::Spread(_) => false,
        }),
        _ => false,
    }
}

// -----------------------------------------------------------------------------
// Skip classifier
// -----------------------------------------------------------------------------

/// Is this attribute exempt from wrapping regardless of content?
///
/// The `on` prefix check deliberately over-matches names like `online`; the
/// event-handler naming heuristic is broad by intent.
fn should_skip(name: &str, expr: &Expr) -> bool {
    if name.starts_with("on") && name.len() > 2 {
        return true;
    }
    if name == "ref" {
        return true;
    }
    // Already a closure; leaving it alone is what makes the transform
    // idempotent over its own output.
    matches!(expr, Expr::Arrow(_) | Expr::Fn(_))
}

fn attr_name(name: &JSXAttrName) -> String {
    match name {
        JSXAttrName::Ident(id) => id.sym.to_string(),
        JSXAttrName::JSXNamespacedName(n) => format!("{}:{}", n.ns.sym, n.name.sym),
    }
}

// -----------------------------------------------------------------------------
// Attribute rewrite driver
// -----------------------------------------------------------------------------

fn wrap_in_thunk(body: Box<Expr>) -> Expr {
    Expr::Arrow(ArrowExpr {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        params: vec![],
        body: Box::new(BlockStmtOrExpr::Expr(body)),
        is_async: false,
        is_generator: false,
        type_params: None,
        return_type: None,
    })
}

#[derive(Default)]
struct AttrRewriter {
    wrapped: usize,
}

impl AttrRewriter {
    fn thunk_attr(&mut self, attr: &mut JSXAttr) {
        let name = attr_name(&attr.name);
        let Some(JSXAttrValue::JSXExprContainer(container)) = &mut attr.value else {
            // Absent or static value (literal, element, fragment).
            return;
        };
        let JSXExpr::Expr(expr) = &container.expr else {
            // Empty placeholder slot.
            return;
        };
        if should_skip(&name, expr) || !contains_call(expr) {
            return;
        }
        let JSXExpr::Expr(body) = std::mem::replace(
            &mut container.expr,
            JSXExpr::JSXEmptyExpr(JSXEmptyExpr { span: DUMMY_SP }),
        ) else {
            unreachable!("attribute expression matched above");
        };
        container.expr = JSXExpr::Expr(Box::new(wrap_in_thunk(body)));
        self.wrapped += 1;
    }
}

impl VisitMut for AttrRewriter {
    fn visit_mut_jsx_attr(&mut self, attr: &mut JSXAttr) {
        self.thunk_attr(attr);
        // Attributes do not nest directly, but attribute expressions can hold
        // further JSX whose own attributes must be classified too.
        attr.visit_mut_children_with(self);
    }
}

// -----------------------------------------------------------------------------
// File transform orchestrator
// -----------------------------------------------------------------------------

/// Transforms one file, returning either the rewritten text (plus source map)
/// or [`TransformOutput::NotApplicable`] when the original should be used.
///
/// Parse failures are swallowed on purpose: the host compiler already has a
/// syntax-error path for this file and must be the one to surface it.
pub fn transform_file(
    source: &str,
    file: &str,
    options: &Options,
) -> Result<TransformOutput, Error> {
    if !options.applies_to(file) {
        return Ok(TransformOutput::NotApplicable);
    }

    let cm: Lrc<SourceMap> = Default::default();
    let Some(mut program) = parse(source, file, &cm) else {
        debug!(file, "parse failed; deferring to the host's syntax error reporting");
        return Ok(TransformOutput::NotApplicable);
    };

    let mut rewriter = AttrRewriter::default();
    program.visit_mut_with(&mut rewriter);
    if rewriter.wrapped == 0 {
        debug!(file, "no dynamic attribute expressions");
        return Ok(TransformOutput::NotApplicable);
    }
    debug!(file, wrapped = rewriter.wrapped, "thunked attribute expressions");

    emit(&program, &cm, file, options.source_map)
}

fn parse(source: &str, file: &str, cm: &Lrc<SourceMap>) -> Option<Program> {
    let fm = cm.new_source_file(FileName::Real(file.into()).into(), source.to_string());
    // One grammar for both extensions: JSX plus type annotations.
    let syntax = Syntax::Typescript(TsSyntax {
        tsx: true,
        ..Default::default()
    });
    let lexer = Lexer::new(syntax, EsVersion::EsNext, StringInput::from(&*fm), None);
    let mut parser = Parser::new_from(lexer);
    let program = parser.parse_program().ok()?;
    if !parser.take_errors().is_empty() {
        return None;
    }
    Some(program)
}

struct MapConfig<'a> {
    source: &'a str,
}

impl SourceMapGenConfig for MapConfig<'_> {
    fn file_name_to_source(&self, _f: &FileName) -> String {
        self.source.to_string()
    }

    fn inline_sources_content(&self, _f: &FileName) -> bool {
        true
    }
}

fn emit(
    program: &Program,
    cm: &Lrc<SourceMap>,
    file: &str,
    with_map: bool,
) -> Result<TransformOutput, Error> {
    let mut buf = Vec::new();
    let mut mappings = Vec::new();
    {
        let srcmap = with_map.then_some(&mut mappings);
        let mut emitter = Emitter {
            cfg: codegen::Config::default(),
            cm: cm.clone(),
            comments: None,
            wr: JsWriter::new(cm.clone(), "\n", &mut buf, srcmap),
        };
        emitter.emit_program(program)?;
    }
    let code = String::from_utf8(buf)?;

    let map = if with_map {
        let map = cm.build_source_map(&mappings, None, MapConfig { source: file });
        let mut out = Vec::new();
        map.to_writer(&mut out)
            .map_err(|e| Error::SourceMap(e.to_string()))?;
        Some(String::from_utf8(out)?)
    } else {
        None
    };

    Ok(TransformOutput::Transformed { code, map })
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
