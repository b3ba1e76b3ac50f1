// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Questions about a path that depend on where its node sits.

use scopewalk_ast::validators;
use scopewalk_ast::{Alias, Field, NodeKind, TypeName};

use crate::path::PathId;
use crate::session::Session;

impl Session {
    /// Returns true if the node at `path` is of type `name` (kind or alias).
    pub fn is_type(&self, path: PathId, name: impl Into<TypeName>) -> bool {
        let name = name.into();
        self.path_node(path)
            .is_some_and(|node| self.arena.is(node, name))
    }

    fn grandparent(&self, path: PathId) -> Option<scopewalk_ast::NodeId> {
        self.parent_path(path).and_then(|parent| self.parent_node(parent))
    }

    /// The node at `path` is read as a value in its position.
    pub fn is_referenced(&self, path: PathId) -> bool {
        let Some(node) = self.path_node(path) else {
            return false;
        };
        match self.parent_node(path) {
            Some(parent) => validators::is_referenced(&self.arena, node, parent, self.grandparent(path)),
            None => true,
        }
    }

    /// The node at `path` is an identifier read as a value.
    pub fn is_referenced_identifier(&self, path: PathId) -> bool {
        self.is_type(path, NodeKind::Identifier) && self.is_referenced(path)
    }

    /// The node at `path` is an identifier that introduces a binding.
    pub fn is_binding_identifier(&self, path: PathId) -> bool {
        let (Some(node), Some(parent)) = (self.path_node(path), self.parent_node(path)) else {
            return false;
        };
        self.arena.kind(node) == NodeKind::Identifier
            && validators::is_binding(&self.arena, node, parent, self.grandparent(path))
    }

    /// The node at `path` introduces a scope in its position.
    pub fn is_scope(&self, path: PathId) -> bool {
        self.path_node(path)
            .is_some_and(|node| validators::is_scope(&self.arena, node, self.parent_node(path)))
    }

    pub fn is_block_scoped(&self, path: PathId) -> bool {
        self.path_node(path)
            .is_some_and(|node| validators::is_block_scoped(&self.arena, node))
    }

    pub fn is_var(&self, path: PathId) -> bool {
        self.path_node(path)
            .is_some_and(|node| validators::is_var(&self.arena, node))
    }

    /// The slot holds a single statement that could be a block: an `if`
    /// branch or a loop body, but not a labeled statement's body.
    pub fn is_statement_or_block(&self, path: PathId) -> bool {
        if self.in_list(path) {
            return false;
        }
        if self
            .parent_path(path)
            .is_some_and(|parent| self.is_type(parent, NodeKind::LabeledStatement))
        {
            return false;
        }
        matches!(
            self.key(path),
            Some(Field::Consequent | Field::Body | Field::Alternate)
        )
    }

    /// The slot is a `for` head that accepts a declaration or an expression.
    pub fn can_have_variable_declaration_or_expression(&self, path: PathId) -> bool {
        matches!(self.key(path), Some(Field::Init | Field::Left))
            && self
                .parent_path(path)
                .is_some_and(|parent| self.is_type(parent, Alias::For))
    }

    /// The slot is an arrow body, where a block and an expression can stand
    /// in for each other.
    pub fn can_swap_between_expression_and_statement(
        &self,
        path: PathId,
        replacement: scopewalk_ast::NodeId,
    ) -> bool {
        if self.key(path) != Some(Field::Body)
            || !self
                .parent_path(path)
                .is_some_and(|parent| self.is_type(parent, NodeKind::ArrowFunctionExpression))
        {
            return false;
        }
        if self.is_type(path, Alias::Expression) {
            self.arena.kind(replacement) == NodeKind::BlockStatement
        } else if self.is_type(path, NodeKind::BlockStatement) {
            self.arena.is(replacement, Alias::Expression)
        } else {
            false
        }
    }

    /// The node at `path` is a member expression matching `pattern`
    /// (`"module.exports"`).
    pub fn matches_pattern(&self, path: PathId, pattern: &str, allow_partial: bool) -> bool {
        self.path_node(path)
            .is_some_and(|node| validators::matches_pattern(&self.arena, node, pattern, allow_partial))
    }

    /// The value of the node at `path` can be the completion value of the
    /// enclosing program or function body: every list it sits in along the
    /// way, it sits last.
    pub fn is_completion_record(&self, path: PathId, allow_inside_function: bool) -> bool {
        let mut current = path;
        let mut first = true;
        loop {
            if !first && self.is_type(current, Alias::Function) {
                return allow_inside_function;
            }
            first = false;
            if let (Some(index), Some(len)) = (self.list_index(current), self.container_len(current)) {
                if index + 1 != len {
                    return false;
                }
            }
            match self.parent_path(current) {
                Some(parent) if !self.is_type(parent, NodeKind::Program) => current = parent,
                _ => return true,
            }
        }
    }
}
