// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor tables.
//!
//! A [`Visitor`] maps node kinds to ordered enter and exit callbacks. Selectors
//! are pipe-separated lists of node kinds (`Identifier`), alias groups
//! (`Function`, `Statement`) and virtual types (`ReferencedIdentifier`). They
//! are expanded to concrete kinds when the callback is registered, so
//! dispatch during a walk is a single map lookup. A virtual type contributes
//! a guard that is checked against the path before the callback runs.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::str::FromStr;

use scopewalk_ast::{AstError, NodeKind, TypeName};

use crate::error::TraverseError;
use crate::path::PathId;
use crate::session::Session;

// ============================================================================
// Callback results
// ============================================================================

/// What a callback asks the walk to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitResult {
    /// Keep going: descend into children, then run exit callbacks.
    #[default]
    Continue,
    /// Do not descend into this node's children. Exit callbacks still run.
    SkipChildren,
    /// Stop the whole traversal.
    Stop,
}

/// Which half of a node's visit a callback runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Enter,
    Exit,
}

/// A visitor callback.
pub type VisitFn<S> = Rc<dyn Fn(&mut Session, PathId, &mut S) -> Result<VisitResult, TraverseError>>;

// ============================================================================
// Virtual types
// ============================================================================

/// Selector names that match a node by position rather than by kind alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualType {
    /// An identifier read as a value.
    ReferencedIdentifier,
    /// An identifier that introduces a binding.
    BindingIdentifier,
    /// Any node read as a value.
    Referenced,
    /// A node that introduces a scope in its position.
    Scope,
    /// A class declaration or a `let`/`const` declaration.
    BlockScoped,
    /// A `var` declaration.
    Var,
}

impl VirtualType {
    pub fn as_str(self) -> &'static str {
        match self {
            VirtualType::ReferencedIdentifier => "ReferencedIdentifier",
            VirtualType::BindingIdentifier => "BindingIdentifier",
            VirtualType::Referenced => "Referenced",
            VirtualType::Scope => "Scope",
            VirtualType::BlockScoped => "BlockScoped",
            VirtualType::Var => "Var",
        }
    }

    /// Concrete kinds the virtual type can ever match.
    pub fn kinds(self) -> Vec<NodeKind> {
        match self {
            VirtualType::ReferencedIdentifier | VirtualType::BindingIdentifier => {
                vec![NodeKind::Identifier]
            }
            VirtualType::Referenced => NodeKind::ALL.to_vec(),
            VirtualType::Scope => scopewalk_ast::Alias::Scopable.kinds().collect(),
            VirtualType::BlockScoped => {
                vec![NodeKind::ClassDeclaration, NodeKind::VariableDeclaration]
            }
            VirtualType::Var => vec![NodeKind::VariableDeclaration],
        }
    }

    /// Returns true if the node at `path` matches in its current position.
    pub fn matches(self, session: &Session, path: PathId) -> bool {
        match self {
            VirtualType::ReferencedIdentifier => session.is_referenced_identifier(path),
            VirtualType::BindingIdentifier => session.is_binding_identifier(path),
            VirtualType::Referenced => session.is_referenced(path),
            VirtualType::Scope => session.is_scope(path),
            VirtualType::BlockScoped => session.is_block_scoped(path),
            VirtualType::Var => session.is_var(path),
        }
    }
}

impl FromStr for VirtualType {
    type Err = AstError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ReferencedIdentifier" => Ok(VirtualType::ReferencedIdentifier),
            "BindingIdentifier" => Ok(VirtualType::BindingIdentifier),
            "Referenced" => Ok(VirtualType::Referenced),
            "Scope" => Ok(VirtualType::Scope),
            "BlockScoped" => Ok(VirtualType::BlockScoped),
            "Var" => Ok(VirtualType::Var),
            _ => Err(AstError::UnknownNodeType(s.to_string())),
        }
    }
}

/// Expand a selector into `(kind, guard)` pairs.
fn explode(selector: &str) -> Result<Vec<(NodeKind, Option<VirtualType>)>, TraverseError> {
    let mut out = Vec::new();
    for part in selector.split('|').map(str::trim) {
        if let Ok(virtual_type) = part.parse::<VirtualType>() {
            out.extend(
                virtual_type
                    .kinds()
                    .into_iter()
                    .map(|kind| (kind, Some(virtual_type))),
            );
            continue;
        }
        match part.parse::<TypeName>()? {
            TypeName::Kind(kind) => out.push((kind, None)),
            TypeName::Alias(alias) => out.extend(alias.kinds().map(|kind| (kind, None))),
        }
    }
    Ok(out)
}

// ============================================================================
// Visitor
// ============================================================================

pub(crate) struct Handler<S> {
    pub(crate) guard: Option<VirtualType>,
    pub(crate) func: VisitFn<S>,
}

impl<S> Clone for Handler<S> {
    fn clone(&self) -> Self {
        Handler {
            guard: self.guard,
            func: Rc::clone(&self.func),
        }
    }
}

/// A table of enter and exit callbacks keyed by node kind.
///
/// Built once and reused across traversals. Callbacks for one kind run in
/// registration order, after any catch-all callbacks.
pub struct Visitor<S> {
    enter_any: Vec<Handler<S>>,
    exit_any: Vec<Handler<S>>,
    enter: HashMap<NodeKind, Vec<Handler<S>>>,
    exit: HashMap<NodeKind, Vec<Handler<S>>>,
    denied: HashSet<NodeKind>,
    no_scope: bool,
}

impl<S> Default for Visitor<S> {
    fn default() -> Self {
        Visitor {
            enter_any: Vec::new(),
            exit_any: Vec::new(),
            enter: HashMap::new(),
            exit: HashMap::new(),
            denied: HashSet::new(),
            no_scope: false,
        }
    }
}

impl<S> Visitor<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `func` when entering nodes matched by `selector`.
    pub fn enter<F>(self, selector: &str, func: F) -> Result<Self, TraverseError>
    where
        F: Fn(&mut Session, PathId, &mut S) -> Result<VisitResult, TraverseError> + 'static,
    {
        self.on(Phase::Enter, selector, Rc::new(func))
    }

    /// Run `func` when leaving nodes matched by `selector`.
    pub fn exit<F>(self, selector: &str, func: F) -> Result<Self, TraverseError>
    where
        F: Fn(&mut Session, PathId, &mut S) -> Result<VisitResult, TraverseError> + 'static,
    {
        self.on(Phase::Exit, selector, Rc::new(func))
    }

    /// Register an already-shared callback.
    pub fn on(mut self, phase: Phase, selector: &str, func: VisitFn<S>) -> Result<Self, TraverseError> {
        let table = match phase {
            Phase::Enter => &mut self.enter,
            Phase::Exit => &mut self.exit,
        };
        for (kind, guard) in explode(selector)? {
            table.entry(kind).or_default().push(Handler {
                guard,
                func: Rc::clone(&func),
            });
        }
        Ok(self)
    }

    /// Run `func` when entering every node.
    pub fn enter_all<F>(mut self, func: F) -> Self
    where
        F: Fn(&mut Session, PathId, &mut S) -> Result<VisitResult, TraverseError> + 'static,
    {
        self.enter_any.push(Handler {
            guard: None,
            func: Rc::new(func),
        });
        self
    }

    /// Run `func` when leaving every node.
    pub fn exit_all<F>(mut self, func: F) -> Self
    where
        F: Fn(&mut Session, PathId, &mut S) -> Result<VisitResult, TraverseError> + 'static,
    {
        self.exit_any.push(Handler {
            guard: None,
            func: Rc::new(func),
        });
        self
    }

    /// Append every callback of `other` after this visitor's own.
    pub fn merge(mut self, other: Visitor<S>) -> Self {
        self.enter_any.extend(other.enter_any);
        self.exit_any.extend(other.exit_any);
        for (kind, handlers) in other.enter {
            self.enter.entry(kind).or_default().extend(handlers);
        }
        for (kind, handlers) in other.exit {
            self.exit.entry(kind).or_default().extend(handlers);
        }
        self.denied.extend(other.denied);
        self.no_scope |= other.no_scope;
        self
    }

    /// Never visit nodes matched by `selector`, nor anything below them.
    pub fn denylist(mut self, selector: &str) -> Result<Self, TraverseError> {
        for (kind, _) in explode(selector)? {
            self.denied.insert(kind);
        }
        Ok(self)
    }

    /// Do not compute scopes for visited paths.
    pub fn no_scope(mut self) -> Self {
        self.no_scope = true;
        self
    }

    pub fn is_no_scope(&self) -> bool {
        self.no_scope
    }

    pub(crate) fn is_denied(&self, kind: NodeKind) -> bool {
        self.denied.contains(&kind)
    }

    /// Returns true if any callback could fire for `kind`.
    pub(crate) fn handles(&self, kind: NodeKind) -> bool {
        !self.enter_any.is_empty()
            || !self.exit_any.is_empty()
            || self.enter.contains_key(&kind)
            || self.exit.contains_key(&kind)
    }

    /// Callbacks for `kind` in `phase`, catch-alls first.
    pub(crate) fn handlers(&self, phase: Phase, kind: NodeKind) -> Vec<Handler<S>> {
        let (any, table) = match phase {
            Phase::Enter => (&self.enter_any, &self.enter),
            Phase::Exit => (&self.exit_any, &self.exit),
        };
        let mut out = any.clone();
        if let Some(handlers) = table.get(&kind) {
            out.extend(handlers.iter().cloned());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_and_pipes_expand_to_kinds() {
        let kinds: HashSet<NodeKind> = explode("Function | ReturnStatement")
            .unwrap()
            .into_iter()
            .map(|(kind, _)| kind)
            .collect();
        assert!(kinds.contains(&NodeKind::ArrowFunctionExpression));
        assert!(kinds.contains(&NodeKind::ClassMethod));
        assert!(kinds.contains(&NodeKind::ReturnStatement));
        assert!(!kinds.contains(&NodeKind::BlockStatement));
    }

    #[test]
    fn virtual_types_carry_guards() {
        let exploded = explode("ReferencedIdentifier").unwrap();
        assert_eq!(
            exploded,
            vec![(NodeKind::Identifier, Some(VirtualType::ReferencedIdentifier))]
        );
    }

    #[test]
    fn unknown_selectors_fail_at_construction() {
        let result = Visitor::<()>::new().enter("Identifer", |_, _, _| Ok(VisitResult::Continue));
        assert!(matches!(
            result,
            Err(TraverseError::Ast(AstError::UnknownNodeType(name))) if name == "Identifer"
        ));
    }

    #[test]
    fn catch_all_callbacks_come_first() {
        let visitor = Visitor::<Vec<&'static str>>::new()
            .enter("Identifier", |_, _, log| {
                log.push("kind");
                Ok(VisitResult::Continue)
            })
            .unwrap()
            .enter_all(|_, _, log| {
                log.push("any");
                Ok(VisitResult::Continue)
            });
        assert_eq!(visitor.handlers(Phase::Enter, NodeKind::Identifier).len(), 2);
        assert!(visitor.handlers(Phase::Enter, NodeKind::Identifier)[0]
            .guard
            .is_none());
        assert!(visitor.handles(NodeKind::ReturnStatement));
    }
}
