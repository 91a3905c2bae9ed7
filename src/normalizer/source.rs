//! Source unit normalization.
//!
//! Walks the syntax tree once, resolving every identifier against a lexical
//! scope stack. A name with no declaration in the unit becomes
//! [`Reference::External`]; it is never guessed. Assignments and method
//! calls on a binding (`tx.feePayer = payer`, `tx.add(ix)`) record data flow
//! into that binding.

use log::{debug, warn};

use crate::constants::patterns::{KEY_CONSTRUCTORS, MEMO_CONSTRUCTORS, SEND_CALLS};
use crate::errors::{ScanError, ScanResult, ScanStage};
use crate::models::code::{
    Argument, AstExpr, AstNode, Binding, BindingId, BindingOrigin, CallKind, CallSite, CodePatternGraph,
    LoopId, LoopInfo, Reference,
};
use crate::models::raw::RawSourceUnit;
use crate::models::report::SkippedRecord;
use crate::utils::control::{Interrupt, ScanControl};

/// Build a [`CodePatternGraph`] from a source unit
pub fn normalize_source(
    unit: &RawSourceUnit,
    control: &ScanControl,
) -> ScanResult<(CodePatternGraph, Vec<SkippedRecord>)> {
    if unit.file.trim().is_empty() {
        return Err(ScanError::MalformedInput("source unit has no file name".to_string()));
    }

    let mut builder = GraphBuilder::new(&unit.file, control);
    for node in &unit.ast {
        if let Some(interrupt) = control.interrupted() {
            return Err(ScanError::interrupted(interrupt, ScanStage::Normalize, None));
        }
        builder.visit_node(node);
    }
    if let Some(interrupt) = builder.interrupt {
        return Err(ScanError::interrupted(interrupt, ScanStage::Normalize, None));
    }

    let source_lines = unit
        .source
        .as_deref()
        .map(|text| text.lines().map(str::to_string).collect())
        .unwrap_or_default();

    debug!(
        "Normalized {}: {} bindings, {} calls, {} loops",
        unit.file,
        builder.bindings.len(),
        builder.calls.len(),
        builder.loops.len()
    );

    let graph = CodePatternGraph {
        file: unit.file.clone(),
        bindings: builder.bindings,
        calls: builder.calls,
        loops: builder.loops,
        source_lines,
    };
    Ok((graph, builder.warnings))
}

/// Classify a callee path by its last segments
pub fn classify_callee(callee: &str) -> CallKind {
    let normalized = callee.replace("::", ".");
    let mut segments = normalized.rsplit('.');
    let method = segments.next().unwrap_or_default();
    let owner = segments.next();

    let matches = |entry: &&str| match entry.split_once('.') {
        Some((entry_owner, entry_method)) => owner == Some(entry_owner) && method == entry_method,
        None => method == *entry,
    };

    if KEY_CONSTRUCTORS.iter().any(matches) {
        CallKind::KeyGeneration
    } else if SEND_CALLS.iter().any(matches) {
        CallKind::SendTransaction
    } else if MEMO_CONSTRUCTORS.iter().any(matches) {
        CallKind::MemoInstruction
    } else {
        CallKind::Other
    }
}

struct GraphBuilder<'a> {
    file: &'a str,
    control: &'a ScanControl,
    bindings: Vec<Binding>,
    calls: Vec<CallSite>,
    loops: Vec<LoopInfo>,
    scopes: Vec<Vec<(String, BindingId)>>,
    loop_stack: Vec<LoopId>,
    function: Option<String>,
    warnings: Vec<SkippedRecord>,
    interrupt: Option<Interrupt>,
}

impl<'a> GraphBuilder<'a> {
    fn new(file: &'a str, control: &'a ScanControl) -> Self {
        Self {
            file,
            control,
            bindings: Vec::new(),
            calls: Vec::new(),
            loops: Vec::new(),
            scopes: vec![Vec::new()],
            loop_stack: Vec::new(),
            function: None,
            warnings: Vec::new(),
            interrupt: None,
        }
    }

    fn skip(&mut self, line: usize, reason: &str) {
        warn!("Skipping syntax node at {}:{}: {}", self.file, line, reason);
        self.warnings.push(SkippedRecord {
            index: line,
            identifier: Some(format!("{}:{}", self.file, line)),
            reason: reason.to_string(),
        });
    }

    fn resolve(&self, name: &str) -> Reference {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(declared, _)| declared == name)
            .map(|(_, id)| Reference::Resolved(*id))
            .unwrap_or_else(|| Reference::External(name.to_string()))
    }

    fn declare(&mut self, name: &str, line: usize, origin: BindingOrigin, derived_from: Vec<BindingId>) -> BindingId {
        let id = self.bindings.len();
        self.bindings.push(Binding {
            id,
            name: name.to_string(),
            line,
            loops: self.loop_stack.clone(),
            function: self.function.clone(),
            origin,
            derived_from: sorted(derived_from),
        });
        if let Some(scope) = self.scopes.last_mut() {
            scope.push((name.to_string(), id));
        }
        id
    }

    fn add_flow(&mut self, target: BindingId, sources: &[Reference]) {
        let binding = &mut self.bindings[target];
        binding.derived_from.extend(resolved(sources).into_iter().filter(|id| *id != target));
        binding.derived_from.sort_unstable();
        binding.derived_from.dedup();
    }

    fn visit_block(&mut self, body: &[AstNode]) {
        self.scopes.push(Vec::new());
        for node in body {
            self.visit_node(node);
        }
        self.scopes.pop();
    }

    fn visit_node(&mut self, node: &AstNode) {
        if self.interrupt.is_some() {
            return;
        }
        if let Some(interrupt) = self.control.interrupted() {
            self.interrupt = Some(interrupt);
            return;
        }

        match node {
            AstNode::Declaration { name, line, init } => {
                let references = init.as_ref().map(|expr| self.visit_expr(expr)).unwrap_or_default();
                if name.trim().is_empty() {
                    self.skip(*line, "declaration without a name");
                    return;
                }
                let origin = init.as_ref().map(|expr| self.origin_of(expr)).unwrap_or(BindingOrigin::Value);
                self.declare(name, *line, origin, resolved(&references));
            }
            AstNode::Assignment { target, line, value } => {
                let references = self.visit_expr(value);
                let root = target.split('.').next().unwrap_or_default().trim();
                if root.is_empty() {
                    self.skip(*line, "assignment without a target");
                    return;
                }
                if let Reference::Resolved(id) = self.resolve(root) {
                    self.add_flow(id, &references);
                }
            }
            AstNode::Loop { line, body } => {
                let id = self.loops.len();
                self.loops.push(LoopInfo {
                    id,
                    line: *line,
                    parent: self.loop_stack.last().copied(),
                });
                self.loop_stack.push(id);
                self.visit_block(body);
                self.loop_stack.pop();
            }
            AstNode::Block { body, .. } => self.visit_block(body),
            AstNode::Function { name, line, params, body } => {
                let outer = self.function.replace(name.clone());
                // Loops do not enclose a function body's execution
                let outer_loops = std::mem::take(&mut self.loop_stack);
                self.scopes.push(Vec::new());
                for param in params {
                    self.declare(param, *line, BindingOrigin::Parameter, Vec::new());
                }
                self.visit_block(body);
                self.scopes.pop();
                self.loop_stack = outer_loops;
                self.function = outer;
            }
            AstNode::Expression { expr, .. } => {
                self.visit_expr(expr);
            }
        }
    }

    /// Visit an expression, recording its call sites. Returns every name it
    /// references.
    fn visit_expr(&mut self, expr: &AstExpr) -> Vec<Reference> {
        match expr {
            AstExpr::Call { callee, line, args } => self.visit_call(callee, *line, args),
            AstExpr::Literal { .. } | AstExpr::Other { .. } => Vec::new(),
            AstExpr::Identifier { name, .. } => vec![self.resolve(name)],
            AstExpr::Member { object, .. } => self.visit_expr(object),
            AstExpr::Array { elements: items, .. } | AstExpr::Object { values: items, .. } => {
                items.iter().flat_map(|item| self.visit_expr(item)).collect()
            }
            AstExpr::Await { expr, .. } => self.visit_expr(expr),
        }
    }

    fn visit_call(&mut self, callee: &str, line: usize, args: &[AstExpr]) -> Vec<Reference> {
        let receiver = callee
            .replace("::", ".")
            .split('.')
            .next()
            .filter(|root| !root.is_empty() && callee.contains('.'))
            .map(|root| self.resolve(root));

        let slot = if callee.trim().is_empty() {
            self.skip(line, "call without a callee");
            None
        } else {
            self.calls.push(CallSite {
                callee: callee.to_string(),
                kind: classify_callee(callee),
                line,
                loops: self.loop_stack.clone(),
                function: self.function.clone(),
                args: Vec::new(),
            });
            Some(self.calls.len() - 1)
        };

        let mut arguments = Vec::with_capacity(args.len());
        let mut references = Vec::new();
        for arg in args {
            let mut arg_refs = self.visit_expr(arg);
            arg_refs.sort();
            arg_refs.dedup();
            references.extend(arg_refs.iter().cloned());
            arguments.push(Argument {
                references: arg_refs,
                literals: direct_literals(arg),
            });
        }

        if let Some(slot) = slot {
            self.calls[slot].args = arguments;
        }
        if let Some(receiver) = receiver {
            if let Reference::Resolved(id) = &receiver {
                self.add_flow(*id, &references);
            }
            references.push(receiver);
        }
        references
    }

    fn origin_of(&self, expr: &AstExpr) -> BindingOrigin {
        match expr {
            AstExpr::Call { callee, .. } if classify_callee(callee) == CallKind::KeyGeneration => {
                BindingOrigin::KeyGeneration { callee: callee.clone() }
            }
            AstExpr::Await { expr, .. } => self.origin_of(expr),
            AstExpr::Literal { value, .. } => BindingOrigin::Literal(value.clone()),
            _ => BindingOrigin::Value,
        }
    }
}

/// String literals of an argument, not descending into nested calls
fn direct_literals(expr: &AstExpr) -> Vec<String> {
    match expr {
        AstExpr::Literal { value, .. } => vec![value.clone()],
        AstExpr::Array { elements: items, .. } | AstExpr::Object { values: items, .. } => {
            items.iter().flat_map(direct_literals).collect()
        }
        AstExpr::Await { expr, .. } => direct_literals(expr),
        _ => Vec::new(),
    }
}

fn resolved(references: &[Reference]) -> Vec<BindingId> {
    references
        .iter()
        .filter_map(|r| match r {
            Reference::Resolved(id) => Some(*id),
            Reference::External(_) => None,
        })
        .collect()
}

fn sorted(mut ids: Vec<BindingId>) -> Vec<BindingId> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(callee: &str, line: usize, args: Vec<AstExpr>) -> AstExpr {
        AstExpr::Call { callee: callee.to_string(), line, args }
    }

    fn ident(name: &str, line: usize) -> AstExpr {
        AstExpr::Identifier { name: name.to_string(), line }
    }

    fn unit(ast: Vec<AstNode>) -> RawSourceUnit {
        RawSourceUnit { file: "app.ts".to_string(), source: None, ast }
    }

    #[test]
    fn test_classify_callee() {
        assert_eq!(classify_callee("web3.Keypair.generate"), CallKind::KeyGeneration);
        assert_eq!(classify_callee("Keypair::new"), CallKind::KeyGeneration);
        assert_eq!(classify_callee("Other.generate"), CallKind::Other);
        assert_eq!(classify_callee("connection.sendTransaction"), CallKind::SendTransaction);
        assert_eq!(classify_callee("createMemoInstruction"), CallKind::MemoInstruction);
        assert_eq!(classify_callee("console.log"), CallKind::Other);
    }

    #[test]
    fn test_declaration_in_loop_and_flow() {
        let ast = vec![
            AstNode::Declaration {
                name: "payer".to_string(),
                line: 1,
                init: Some(call("Keypair.generate", 1, vec![])),
            },
            AstNode::Loop {
                line: 2,
                body: vec![
                    AstNode::Declaration {
                        name: "tx".to_string(),
                        line: 3,
                        init: Some(call("Transaction", 3, vec![])),
                    },
                    AstNode::Assignment { target: "tx.feePayer".to_string(), line: 4, value: ident("payer", 4) },
                    AstNode::Expression {
                        line: 5,
                        expr: call("connection.sendTransaction", 5, vec![ident("tx", 5)]),
                    },
                ],
            },
        ];

        let (graph, warnings) = normalize_source(&unit(ast), &ScanControl::default()).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(graph.bindings.len(), 2);
        assert_eq!(graph.bindings[0].origin, BindingOrigin::KeyGeneration { callee: "Keypair.generate".to_string() });
        assert!(graph.bindings[0].loops.is_empty());
        assert_eq!(graph.bindings[1].loops, vec![0]);
        assert_eq!(graph.bindings[1].derived_from, vec![0]);

        let send = graph.calls.iter().find(|c| c.kind == CallKind::SendTransaction).unwrap();
        assert_eq!(send.loops, vec![0]);
        assert_eq!(graph.argument_sources(&send.args[0]), vec![0, 1]);
    }

    #[test]
    fn test_unresolved_names_are_external() {
        let ast = vec![AstNode::Expression {
            line: 1,
            expr: call("sendAndConfirmTransaction", 1, vec![ident("connection", 1), ident("tx", 1)]),
        }];
        let (graph, _) = normalize_source(&unit(ast), &ScanControl::default()).unwrap();
        assert_eq!(graph.calls[0].args[0].references, vec![Reference::External("connection".to_string())]);
    }

    #[test]
    fn test_shadowing_resolves_innermost() {
        let ast = vec![
            AstNode::Declaration { name: "k".to_string(), line: 1, init: None },
            AstNode::Block {
                line: 2,
                body: vec![
                    AstNode::Declaration { name: "k".to_string(), line: 3, init: None },
                    AstNode::Expression { line: 4, expr: call("use", 4, vec![ident("k", 4)]) },
                ],
            },
            AstNode::Expression { line: 5, expr: call("use", 5, vec![ident("k", 5)]) },
        ];
        let (graph, _) = normalize_source(&unit(ast), &ScanControl::default()).unwrap();
        assert_eq!(graph.calls[0].args[0].references, vec![Reference::Resolved(1)]);
        assert_eq!(graph.calls[1].args[0].references, vec![Reference::Resolved(0)]);
    }

    #[test]
    fn test_nameless_declaration_is_skipped() {
        let ast = vec![AstNode::Declaration { name: String::new(), line: 7, init: None }];
        let (graph, warnings) = normalize_source(&unit(ast), &ScanControl::default()).unwrap();
        assert!(graph.bindings.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].identifier.as_deref(), Some("app.ts:7"));
    }

    #[test]
    fn test_memo_literals_captured() {
        let ast = vec![AstNode::Expression {
            line: 3,
            expr: call(
                "tx.add",
                3,
                vec![call(
                    "createMemoInstruction",
                    3,
                    vec![AstExpr::Literal { value: "hi bob@example.com".to_string(), line: 3 }],
                )],
            ),
        }];
        let (graph, _) = normalize_source(&unit(ast), &ScanControl::default()).unwrap();
        assert_eq!(graph.calls.len(), 2);
        assert_eq!(graph.calls[0].callee, "tx.add");
        assert!(graph.calls[0].args[0].literals.is_empty());
        assert_eq!(graph.calls[1].kind, CallKind::MemoInstruction);
        assert_eq!(graph.calls[1].args[0].literals, vec!["hi bob@example.com".to_string()]);
    }
}
