//! Static-analysis models.
//!
//! [`AstNode`] / [`AstExpr`] are the tagged-union syntax tree the source
//! parser collaborator hands over; [`CodePatternGraph`] is the simplified
//! binding/call-site view the normalizer derives from it and the static
//! heuristics read.

use serde::{Serialize, Deserialize};

/// Statement-level syntax node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AstNode {
    /// `let name = init` / `const name = init`
    Declaration {
        name: String,
        line: usize,
        #[serde(default)]
        init: Option<AstExpr>,
    },
    /// `target = value`, where target may be a member path (`tx.feePayer`)
    Assignment {
        target: String,
        line: usize,
        value: AstExpr,
    },
    /// Any looping construct (`for`, `while`, `forEach` callback, ...)
    Loop {
        line: usize,
        #[serde(default)]
        body: Vec<AstNode>,
    },
    /// A lexical block
    Block {
        #[serde(default)]
        line: usize,
        #[serde(default)]
        body: Vec<AstNode>,
    },
    /// Function or method definition
    Function {
        name: String,
        line: usize,
        #[serde(default)]
        params: Vec<String>,
        #[serde(default)]
        body: Vec<AstNode>,
    },
    /// Expression statement
    Expression { line: usize, expr: AstExpr },
}

/// Expression-level syntax node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AstExpr {
    /// Call or constructor invocation; `callee` is the dotted path
    Call {
        callee: String,
        line: usize,
        #[serde(default)]
        args: Vec<AstExpr>,
    },
    /// String literal
    Literal { value: String, line: usize },
    /// Identifier reference
    Identifier { name: String, line: usize },
    /// `object.property`
    Member {
        object: Box<AstExpr>,
        property: String,
        line: usize,
    },
    /// Array literal
    Array {
        line: usize,
        #[serde(default)]
        elements: Vec<AstExpr>,
    },
    /// Object literal; only values matter
    Object {
        line: usize,
        #[serde(default)]
        values: Vec<AstExpr>,
    },
    /// `await expr`
    Await { line: usize, expr: Box<AstExpr> },
    /// Anything the parser chose not to model
    Other { line: usize },
}

impl AstExpr {
    pub fn line(&self) -> usize {
        match self {
            Self::Call { line, .. }
            | Self::Literal { line, .. }
            | Self::Identifier { line, .. }
            | Self::Member { line, .. }
            | Self::Array { line, .. }
            | Self::Object { line, .. }
            | Self::Await { line, .. }
            | Self::Other { line } => *line,
        }
    }
}

/// Index of a binding in [`CodePatternGraph::bindings`]
pub type BindingId = usize;
/// Index of a loop in [`CodePatternGraph::loops`]
pub type LoopId = usize;

/// What produced a binding's value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingOrigin {
    /// A signing key created or loaded by a key constructor
    KeyGeneration { callee: String },
    /// A string literal
    Literal(String),
    /// A function parameter
    Parameter,
    /// Anything else
    Value,
}

/// A declared variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub id: BindingId,
    pub name: String,
    pub line: usize,
    /// Loops enclosing the declaration, outermost first
    pub loops: Vec<LoopId>,
    /// Enclosing function, if any
    pub function: Option<String>,
    pub origin: BindingOrigin,
    /// Bindings whose values flow into this one (init and assignments), sorted
    pub derived_from: Vec<BindingId>,
}

/// A name reference after scope resolution
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Reference {
    Resolved(BindingId),
    /// No declaration in the analyzed unit (imports, globals, ...)
    External(String),
}

/// Recognised call-site role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    SendTransaction,
    MemoInstruction,
    KeyGeneration,
    Other,
}

/// One argument of a call site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    /// Names referenced anywhere inside the argument expression
    pub references: Vec<Reference>,
    /// String literals directly in the argument (not inside nested calls)
    pub literals: Vec<String>,
}

/// A call expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub callee: String,
    pub kind: CallKind,
    pub line: usize,
    /// Loops enclosing the call, outermost first
    pub loops: Vec<LoopId>,
    pub function: Option<String>,
    pub args: Vec<Argument>,
}

/// A loop construct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopInfo {
    pub id: LoopId,
    pub line: usize,
    /// Enclosing loop, if nested
    pub parent: Option<LoopId>,
}

/// Simplified control/data-flow view of one source unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePatternGraph {
    pub file: String,
    /// Declaration order
    pub bindings: Vec<Binding>,
    /// Traversal order (outer call before its nested argument calls)
    pub calls: Vec<CallSite>,
    pub loops: Vec<LoopInfo>,
    /// Source text lines, when the collaborator supplied the text
    pub source_lines: Vec<String>,
}

impl CodePatternGraph {
    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id]
    }

    /// The source line (1-based), trimmed
    pub fn snippet(&self, line: usize) -> Option<String> {
        line.checked_sub(1)
            .and_then(|i| self.source_lines.get(i))
            .map(|text| text.trim().to_string())
    }

    /// `id` plus every binding it transitively derives from, sorted
    pub fn flow_closure(&self, id: BindingId) -> Vec<BindingId> {
        let mut seen = vec![false; self.bindings.len()];
        let mut stack = vec![id];
        let mut out = Vec::new();
        while let Some(current) = stack.pop() {
            if current >= seen.len() || seen[current] {
                continue;
            }
            seen[current] = true;
            out.push(current);
            stack.extend(self.bindings[current].derived_from.iter().copied());
        }
        out.sort_unstable();
        out
    }

    /// Bindings whose values reach the argument, through data flow
    pub fn argument_sources(&self, arg: &Argument) -> Vec<BindingId> {
        let mut sources: Vec<BindingId> = arg
            .references
            .iter()
            .filter_map(|r| match r {
                Reference::Resolved(id) => Some(*id),
                Reference::External(_) => None,
            })
            .flat_map(|id| self.flow_closure(id))
            .collect();
        sources.sort_unstable();
        sources.dedup();
        sources
    }
}
