//! Expression frontend built on `syn`
//!
//! Parses expression source with `syn` and lowers the resulting AST into
//! a node [`Tree`] made of the reference [`nodes`](crate::nodes):
//!
//! ```text
//! Source → [syn] → syn::Expr → [TreeBuilder] → Tree
//! ```
//!
//! | Source                 | Tree                                   |
//! |------------------------|----------------------------------------|
//! | `1`, `2.5`, `"s"`, `true`, `null` | [`Const`]                   |
//! | `name`                 | [`Property`]                           |
//! | `a.b`                  | [`Chain`] of `a` and `b`               |
//! | `a.f(x)` / `f(x)`      | [`Chain`] ending in / bare [`MethodCall`] |
//! | `Type::f(x)`           | [`StaticMethodCall`]                   |
//! | `a + b`, `a - b`, `a * b`, `a / b`, `-a` | arithmetic nodes     |
//! | `[a, b]`               | [`List`]                               |
//!
//! Nested chains, sums and products flatten as their nodes close, so
//! `a.b.c` becomes one chain with three links.

use std::fmt;

use quote::ToTokens;
use syn::spanned::Spanned;
use syn::{BinOp, Expr, Lit, UnOp};
use tracing::trace;

use crate::error::BuildError;
use crate::eval::NodeBody;
use crate::nodes::{
    Add, Chain, Const, Divide, List, MethodCall, Multiply, Negate, Property, StaticMethodCall,
    Subtract,
};
use crate::tree::{NodeId, Tree, TreeBuilder};
use crate::Value;

// ═══════════════════════════════════════════════════════════════════════
// ERROR TYPES
// ═══════════════════════════════════════════════════════════════════════

/// Error that occurred while parsing or lowering an expression.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Human-readable error message
    pub message: String,

    /// Optional source location
    pub location: Option<SourceLocation>,

    /// Optional source snippet for context
    pub snippet: Option<String>,
}

impl ParseError {
    /// Create a new parse error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            snippet: None,
        }
    }

    /// Add location information to the error.
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Add a source snippet for context.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// An error pointing at an unsupported piece of syntax.
    fn unsupported(what: &str, node: &impl ToTokens) -> Self {
        ParseError::new(format!("unsupported {}", what))
            .with_location(SourceLocation::of(node.span()))
            .with_snippet(node.to_token_stream().to_string())
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error: {}", self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " at {}", loc)?;
        }
        if let Some(snippet) = &self.snippet {
            write!(f, "\n{}", snippet)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<syn::Error> for ParseError {
    fn from(err: syn::Error) -> Self {
        ParseError::new(format!("syntax error: {}", err))
            .with_location(SourceLocation::of(err.span()))
    }
}

impl From<BuildError> for ParseError {
    fn from(err: BuildError) -> Self {
        ParseError::new(format!("tree construction failed: {}", err))
    }
}

/// Position in the expression source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,

    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    fn of(span: proc_macro2::Span) -> Self {
        let start = span.start();
        Self::new(start.line, start.column + 1)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// LOWERING
// ═══════════════════════════════════════════════════════════════════════

/// Parse `source` and build its node tree.
///
/// # Example
///
/// ```
/// use quickbeam::value::ObjectValue;
/// use quickbeam::{parse_expression, EvalContext, Value};
///
/// let tree = parse_expression("x + y * 2").unwrap();
/// let point = Value::object(ObjectValue::new("Point").with_field("x", 1).with_field("y", 3));
///
/// let mut ctx = EvalContext::new();
/// assert_eq!(tree.get_value(&mut ctx, &point).unwrap(), Value::Int(7));
/// ```
pub fn parse_expression(source: &str) -> Result<Tree, ParseError> {
    let expr: Expr = syn::parse_str(source)?;
    let mut lowering = Lowering::default();
    let root = lowering.lower(&expr)?;
    let tree = lowering.builder.finish(root)?;
    trace!(source, nodes = tree.len(), "parsed expression");
    Ok(tree)
}

#[derive(Default)]
struct Lowering {
    builder: TreeBuilder,
}

impl Lowering {
    fn lower(&mut self, expr: &Expr) -> Result<NodeId, ParseError> {
        match expr {
            Expr::Lit(lit) => self.leaf(Const::new(literal(&lit.lit)?)),
            Expr::Path(path) => {
                let ident = path
                    .path
                    .get_ident()
                    .ok_or_else(|| ParseError::unsupported("path", path))?;
                if ident == "null" {
                    self.leaf(Const::new(Value::Null))
                } else {
                    self.leaf(Property::new(ident.to_string()))
                }
            }
            Expr::Field(field) => {
                let name = match &field.member {
                    syn::Member::Named(ident) => ident.to_string(),
                    syn::Member::Unnamed(index) => index.index.to_string(),
                };
                let base = self.lower(&field.base)?;
                let property = self.leaf(Property::new(name))?;
                self.branch(Chain, vec![base, property])
            }
            Expr::MethodCall(call) => {
                let receiver = self.lower(&call.receiver)?;
                let args = self.lower_all(call.args.iter())?;
                let method = self.branch(MethodCall::new(call.method.to_string()), args)?;
                self.branch(Chain, vec![receiver, method])
            }
            Expr::Call(call) => {
                let Expr::Path(func) = call.func.as_ref() else {
                    return Err(ParseError::unsupported("call target", &call.func));
                };
                let mut segments: Vec<String> = func
                    .path
                    .segments
                    .iter()
                    .map(|segment| segment.ident.to_string())
                    .collect();
                let Some(name) = segments.pop() else {
                    return Err(ParseError::unsupported("call target", func));
                };
                let args = self.lower_all(call.args.iter())?;
                if segments.is_empty() {
                    self.branch(MethodCall::new(name), args)
                } else {
                    self.branch(StaticMethodCall::new(segments.join("."), name), args)
                }
            }
            Expr::Binary(binary) => {
                let left = self.lower(&binary.left)?;
                let right = self.lower(&binary.right)?;
                let children = vec![left, right];
                match binary.op {
                    BinOp::Add(_) => self.branch(Add, children),
                    BinOp::Sub(_) => self.branch(Subtract, children),
                    BinOp::Mul(_) => self.branch(Multiply, children),
                    BinOp::Div(_) => self.branch(Divide, children),
                    _ => Err(ParseError::unsupported("operator", &binary.op)),
                }
            }
            Expr::Unary(unary) => match unary.op {
                UnOp::Neg(_) => {
                    let operand = self.lower(&unary.expr)?;
                    self.branch(Negate, vec![operand])
                }
                _ => Err(ParseError::unsupported("operator", &unary.op)),
            },
            Expr::Array(array) => {
                let items = self.lower_all(array.elems.iter())?;
                self.branch(List, items)
            }
            Expr::Paren(paren) => self.lower(&paren.expr),
            Expr::Group(group) => self.lower(&group.expr),
            other => Err(ParseError::unsupported("expression", other)),
        }
    }

    fn lower_all<'e>(
        &mut self,
        exprs: impl Iterator<Item = &'e Expr>,
    ) -> Result<Vec<NodeId>, ParseError> {
        exprs.map(|expr| self.lower(expr)).collect()
    }

    fn leaf(&mut self, body: impl NodeBody + 'static) -> Result<NodeId, ParseError> {
        Ok(self.builder.leaf(body)?)
    }

    fn branch(
        &mut self,
        body: impl NodeBody + 'static,
        children: Vec<NodeId>,
    ) -> Result<NodeId, ParseError> {
        let id = self.builder.node(body);
        self.builder.open(id)?;
        for (index, child) in children.into_iter().enumerate() {
            self.builder.add_child(id, child, index)?;
        }
        self.builder.close(id)?;
        Ok(id)
    }
}

fn literal(lit: &Lit) -> Result<Value, ParseError> {
    match lit {
        Lit::Int(n) => Ok(Value::Int(n.base10_parse()?)),
        Lit::Float(n) => Ok(Value::Float(n.base10_parse()?)),
        Lit::Str(s) => Ok(Value::string(s.value())),
        Lit::Char(c) => Ok(Value::string(c.value().to_string())),
        Lit::Bool(b) => Ok(Value::Bool(b.value)),
        other => Err(ParseError::unsupported("literal", other)),
    }
}
