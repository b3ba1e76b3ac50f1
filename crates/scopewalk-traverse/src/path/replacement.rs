// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Replacing the node at a path with one node, several nodes, or a list of
//! statements standing in for an expression.

use scopewalk_ast::validators;
use scopewalk_ast::{
    build, validate_element, validate_slot, Alias, Child, DeclarationKind, Field, NodeId, NodeKind, TypeName,
};
use tracing::debug;

use crate::error::TraverseError;
use crate::path::comments::{
    inherit_comments, inherit_leading_comments, inherit_trailing_comments, remove_node_comments,
};
use crate::path::{Location, PathId};
use crate::scope::{PushOptions, ScopeId};
use crate::session::Session;

const FUNCTION_TYPES: &[TypeName] = &[TypeName::Alias(Alias::Function)];

impl Session {
    // ========================================================================
    // Single replacement
    // ========================================================================

    /// Replace the node at `path` with `replacement`.
    ///
    /// An expression put in a statement slot is wrapped in an expression
    /// statement; a statement put in an expression slot goes through
    /// [`replace_expression_with_statements`](Session::replace_expression_with_statements).
    /// Comments move to the replacement and the path is queued again so the
    /// new node is visited. Returns the path of the replacement (the inner
    /// expression when it was wrapped).
    pub fn replace_with(&mut self, path: PathId, replacement: NodeId) -> Result<Vec<PathId>, TraverseError> {
        self.resync(path);
        self.assert_unremoved(path)?;
        let current = self.path_node(path);
        if current == Some(replacement) {
            return Ok(vec![path]);
        }
        if self.is_program(path) && self.arena.kind(replacement) != NodeKind::Program {
            return Err(TraverseError::InvalidOperation(
                "a Program can only be replaced with another Program".to_string(),
            ));
        }

        let mut replacement = replacement;
        let mut wrapped = false;
        if self.is_statement(path)
            && self.arena.is(replacement, Alias::Expression)
            && !self.can_have_variable_declaration_or_expression(path)
            && !self.can_swap_between_expression_and_statement(path, replacement)
            && !self
                .parent_path(path)
                .is_some_and(|parent| self.is_export_default_declaration(parent))
        {
            replacement = build::expression_statement(&mut self.arena, replacement)?;
            wrapped = true;
        }
        if self.is_expression(path)
            && self.arena.is(replacement, Alias::Statement)
            && !self.can_have_variable_declaration_or_expression(path)
            && !self.can_swap_between_expression_and_statement(path, replacement)
        {
            return self.replace_expression_with_statements(path, vec![replacement]);
        }

        if let Some(old) = current {
            inherit_comments(&mut self.arena, replacement, old);
            remove_node_comments(&mut self.arena, old);
        }
        self.replace_node(path, replacement)?;
        self.requeue(path)?;
        if wrapped {
            Ok(vec![self.get_field(path, Field::Expression)?])
        } else {
            Ok(vec![path])
        }
    }

    /// Swap the node in the slot of `path`, validated by the catalog.
    ///
    /// Bindings owned by the old node are released and those of the new node
    /// registered.
    pub(crate) fn replace_node(&mut self, path: PathId, node: NodeId) -> Result<(), TraverseError> {
        let location = self.location(path);
        match location {
            Location::Root => {}
            Location::Field { parent, field } => {
                validate_slot(&self.arena, self.arena.kind(parent), field, &Child::Node(node))?
            }
            Location::Element { parent, field, .. } => {
                validate_element(&self.arena, self.arena.kind(parent), field, node)?
            }
        }
        let old: Vec<NodeId> = self.path_node(path).into_iter().collect();
        let orphans = self.release_subtrees(&old);
        match location {
            Location::Root => self.root = node,
            Location::Field { parent, field } => {
                self.arena.set_child(parent, field, node)?;
            }
            Location::Element {
                parent,
                field,
                index,
            } => {
                self.arena.set_element(parent, field, index, node)?;
            }
        }
        debug!(%path, kind = %self.arena.kind(node), "replaced");
        self.rekey(path, Some(node));
        self.adopt_subtree(path)?;
        self.settle_orphans(orphans)
    }

    // ========================================================================
    // Multiple replacement
    // ========================================================================

    /// Replace the list element at `path` with `nodes`.
    ///
    /// The first node inherits the leading comments and the last node the
    /// trailing comments of the old one. `path` is marked removed; the new
    /// paths are returned.
    ///
    /// During a walk the new paths join the end of the main queue of the
    /// contexts `path` was queued in, not the priority queue: siblings that
    /// were already queued after `path` are visited before them.
    pub fn replace_with_multiple(&mut self, path: PathId, nodes: Vec<NodeId>) -> Result<Vec<PathId>, TraverseError> {
        self.resync(path);
        self.assert_unremoved(path)?;
        let Location::Element { parent, field, index } = self.location(path) else {
            return Err(TraverseError::NoContainer {
                kind: self.describe(path),
                location: self.location(path).to_string(),
            });
        };
        if nodes.is_empty() {
            self.remove(path)?;
            return Ok(Vec::new());
        }
        let owner = self.require_parent_path(path)?;
        let kind = self.arena.kind(parent);
        for node in &nodes {
            validate_element(&self.arena, kind, field, *node)?;
        }

        let old = self.path_node(path);
        if let Some(old) = old {
            if let Some(first) = nodes.first() {
                inherit_leading_comments(&mut self.arena, *first, old);
            }
            if let Some(last) = nodes.last() {
                inherit_trailing_comments(&mut self.arena, *last, old);
            }
        }
        let orphans = self.release_subtrees(&old.into_iter().collect::<Vec<_>>());
        self.arena.splice(parent, field, index, 1, Vec::new())?;
        self.update_sibling_keys(parent, field, index + 1, -1);
        self.mark_removed(path);
        debug!(%path, count = nodes.len(), "replaced with multiple");
        let paths = self.container_insert(owner, field, index, nodes, path)?;
        self.settle_orphans(orphans)?;
        Ok(paths)
    }

    // ========================================================================
    // Statements in expression position
    // ========================================================================

    /// Put `nodes` (statements or expressions) where the expression at `path`
    /// is.
    ///
    /// When the statements can be written as a sequence expression they are,
    /// with `var` declarations hoisted into the enclosing scope. Otherwise
    /// they are wrapped in an immediately invoked function whose completion
    /// records return their value; inside loops the value goes through a
    /// `_ret` temporary returned after the body.
    pub fn replace_expression_with_statements(
        &mut self,
        path: PathId,
        nodes: Vec<NodeId>,
    ) -> Result<Vec<PathId>, TraverseError> {
        self.resync(path);
        self.assert_unremoved(path)?;
        let scope = self.scope_of(path)?;

        let mut declared = Vec::new();
        if let Some(expression) = self.gather_sequence_expressions(&nodes, &mut declared)? {
            for id in declared {
                self.push(scope, PushOptions::new(id))?;
            }
            let replaced = self.replace_with(path, expression)?;
            return match replaced.first() {
                Some(first) if self.is_sequence_expression(*first) => self.get_list(*first, Field::Expressions),
                _ => Ok(replaced),
            };
        }

        let (parent_async, parent_generator) = self
            .get_function_parent(path)
            .and_then(|function| self.path_node(function))
            .map(|function| {
                let flags = self.arena.get(function).flags;
                (flags.is_async, flags.generator)
            })
            .unwrap_or_default();

        let mut statements = Vec::with_capacity(nodes.len());
        for node in nodes {
            if self.arena.is(node, Alias::Statement) {
                statements.push(node);
            } else {
                statements.push(build::expression_statement(&mut self.arena, node)?);
            }
        }
        let body = build::block_statement(&mut self.arena, statements)?;
        let needs_await =
            parent_async && self.arena.has_type(body, NodeKind::AwaitExpression.into(), FUNCTION_TYPES);
        let needs_yield =
            parent_generator && self.arena.has_type(body, NodeKind::YieldExpression.into(), FUNCTION_TYPES);
        let container = if needs_yield {
            let function = build::function_expression(&mut self.arena, None, Vec::new(), body)?;
            self.arena.get_mut(function).flags.generator = true;
            function
        } else {
            build::arrow_function_expression(&mut self.arena, Vec::new(), body)?
        };
        self.arena.get_mut(container).flags.is_async = needs_await;
        let call = build::call_expression(&mut self.arena, container, Vec::new())?;

        self.replace_with(path, call)?;
        let callee = self.get_field(path, Field::Callee)?;
        let callee_body = self.get_field(callee, Field::Body)?;
        let inner = self.scope_of(callee_body)?;
        self.hoist_variables(inner, scope)?;
        self.return_completions(callee, callee_body, inner)?;

        let mut call_path = path;
        if needs_await && !needs_yield {
            let awaited = build::await_expression(&mut self.arena, call)?;
            self.replace_with(path, awaited)?;
            call_path = self.get_field(path, Field::Argument)?;
        }
        if needs_yield {
            let yielded = build::yield_expression(&mut self.arena, Some(call), true)?;
            self.replace_with(path, yielded)?;
            call_path = self.get_field(path, Field::Argument)?;
        }
        debug!(%path, async = needs_await, generator = needs_yield, "wrapped statements in a function");
        let callee = self.get_field(call_path, Field::Callee)?;
        let body = self.get_field(callee, Field::Body)?;
        self.get_list(body, Field::Body)
    }

    /// Make every completion record of the wrapper at `callee` return its
    /// value.
    fn return_completions(&mut self, callee: PathId, body: PathId, inner: ScopeId) -> Result<(), TraverseError> {
        let mut ret: Option<String> = None;
        for record in self.get_completion_records(callee)? {
            if !self.is_expression_statement(record) {
                continue;
            }
            let statement = self.require_node(record)?;
            let Some(value) = self.arena.child(statement, Field::Expression) else {
                continue;
            };
            if self.inside_loop_of(record, callee) {
                let name = match &ret {
                    Some(name) => name.clone(),
                    None => {
                        let uid = self.generate_declared_uid_identifier(inner, "ret")?;
                        let name = self.arena.name(uid).unwrap_or_default().to_string();
                        let read = build::identifier(&mut self.arena, &name);
                        let statement = build::return_statement(&mut self.arena, Some(read))?;
                        self.push_container(body, Field::Body, vec![statement])?;
                        ret = Some(name.clone());
                        name
                    }
                };
                let expression = self.get_field(record, Field::Expression)?;
                let target = build::identifier(&mut self.arena, &name);
                let assign = build::assignment_expression(&mut self.arena, "=", target, value)?;
                self.replace_with(expression, assign)?;
            } else {
                let statement = build::return_statement(&mut self.arena, Some(value))?;
                self.replace_with(record, statement)?;
            }
        }
        Ok(())
    }

    /// A loop sits between `path` and the function at `boundary`.
    fn inside_loop_of(&self, path: PathId, boundary: PathId) -> bool {
        let mut current = self.parent_path(path);
        while let Some(candidate) = current {
            if candidate == boundary {
                return false;
            }
            if self.is_loop(candidate) {
                return true;
            }
            current = self.parent_path(candidate);
        }
        false
    }

    /// Fold `nodes` into one expression, collecting the names `var`
    /// declarations introduce into `declared`. `None` when some statement has
    /// no expression form.
    fn gather_sequence_expressions(
        &mut self,
        nodes: &[NodeId],
        declared: &mut Vec<NodeId>,
    ) -> Result<Option<NodeId>, TraverseError> {
        let mut expressions = Vec::new();
        let mut ensure_last_undefined = true;
        for (position, &node) in nodes.iter().enumerate() {
            let kind = self.arena.kind(node);
            if kind != NodeKind::EmptyStatement {
                ensure_last_undefined = false;
            }
            if self.arena.is(node, Alias::Expression) {
                expressions.push(node);
                continue;
            }
            match kind {
                NodeKind::ExpressionStatement => {
                    expressions.extend(self.arena.child(node, Field::Expression));
                }
                NodeKind::VariableDeclaration => {
                    if self.arena.get(node).declaration_kind() != Some(DeclarationKind::Var) {
                        return Ok(None);
                    }
                    for declarator in self.arena.list(node, Field::Declarations).to_vec() {
                        let names: Vec<String> = validators::binding_identifiers(&self.arena, declarator, false, false)
                            .into_keys()
                            .collect();
                        for name in names {
                            declared.push(build::identifier(&mut self.arena, &name));
                        }
                        let id = self.arena.child(declarator, Field::Id);
                        let init = self.arena.child(declarator, Field::Init);
                        if let (Some(id), Some(init)) = (id, init) {
                            expressions.push(build::assignment_expression(&mut self.arena, "=", id, init)?);
                        }
                    }
                    ensure_last_undefined = true;
                }
                NodeKind::IfStatement => {
                    let Some(test) = self.arena.child(node, Field::Test) else {
                        return Ok(None);
                    };
                    let consequent = self.gather_branch(node, Field::Consequent, declared)?;
                    let alternate = self.gather_branch(node, Field::Alternate, declared)?;
                    let (Some(consequent), Some(alternate)) = (consequent, alternate) else {
                        return Ok(None);
                    };
                    expressions.push(build::conditional_expression(&mut self.arena, test, consequent, alternate)?);
                }
                NodeKind::BlockStatement => {
                    let body = self.arena.list(node, Field::Body).to_vec();
                    match self.gather_sequence_expressions(&body, declared)? {
                        Some(expression) => expressions.push(expression),
                        None => return Ok(None),
                    }
                }
                NodeKind::EmptyStatement => {
                    if position == 0 {
                        ensure_last_undefined = true;
                    }
                }
                _ => return Ok(None),
            }
        }
        if ensure_last_undefined {
            expressions.push(build::undefined(&mut self.arena)?);
        }
        if expressions.len() == 1 {
            Ok(expressions.pop())
        } else {
            Ok(Some(build::sequence_expression(&mut self.arena, expressions)?))
        }
    }

    fn gather_branch(
        &mut self,
        node: NodeId,
        field: Field,
        declared: &mut Vec<NodeId>,
    ) -> Result<Option<NodeId>, TraverseError> {
        match self.arena.child(node, field) {
            Some(branch) => self.gather_sequence_expressions(&[branch], declared),
            None => Ok(Some(build::undefined(&mut self.arena)?)),
        }
    }
}
