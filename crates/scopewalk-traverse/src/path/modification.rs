// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Insertion before, after and into a path.
//!
//! Inserted nodes are registered with the enclosing scope and queued in the
//! traversal contexts of the insertion point, so a running walk visits them.

use scopewalk_ast::{build, validate_element, Alias, Field, NodeId, NodeKind};
use tracing::debug;

use crate::error::TraverseError;
use crate::path::{Location, PathId};
use crate::session::Session;

impl Session {
    // ========================================================================
    // List containers
    // ========================================================================

    /// Shift the index of every live path in `parent.field` at or after
    /// `from` by `delta`.
    pub(crate) fn update_sibling_keys(&mut self, parent: NodeId, field: Field, from: usize, delta: isize) {
        let Some(siblings) = self.paths_by_parent.get(&parent) else {
            return;
        };
        for path in siblings.clone() {
            let data = &mut self.paths[path.index()];
            if data.removed || data.node.is_none() {
                continue;
            }
            if let Location::Element {
                field: slot,
                index,
                ..
            } = &mut data.location
            {
                if *slot == field && *index >= from {
                    *index = index.saturating_add_signed(delta);
                }
            }
        }
    }

    /// Splice `nodes` into list `field` of the node at `owner`, at `from`.
    ///
    /// The new paths are queued (after the current level) in the contexts of
    /// `anchor`, or of its nearest ancestor that has any.
    pub(crate) fn container_insert(
        &mut self,
        owner: PathId,
        field: Field,
        from: usize,
        nodes: Vec<NodeId>,
        anchor: PathId,
    ) -> Result<Vec<PathId>, TraverseError> {
        let parent = self.require_node(owner)?;
        let kind = self.arena.kind(parent);
        for node in &nodes {
            validate_element(&self.arena, kind, field, *node)?;
        }
        let count = nodes.len();
        self.arena.splice(parent, field, from, 0, nodes)?;
        self.update_sibling_keys(parent, field, from, count as isize);

        let paths: Vec<PathId> = (from..from + count)
            .map(|index| {
                self.path_at(
                    Some(owner),
                    Location::Element {
                        parent,
                        field,
                        index,
                    },
                )
            })
            .collect();
        let contexts = self.queue_contexts(anchor);
        for path in &paths {
            self.adopt_subtree(*path)?;
            debug!(%path, kind = %self.describe(*path), "inserted");
            for context in &contexts {
                self.maybe_queue(*context, *path, true)?;
            }
        }
        Ok(paths)
    }

    /// Insert `nodes` at the start of list `field` of the node at `path`.
    pub fn unshift_container(
        &mut self,
        path: PathId,
        field: Field,
        nodes: Vec<NodeId>,
    ) -> Result<Vec<PathId>, TraverseError> {
        self.resync(path);
        self.assert_unremoved(path)?;
        self.require_list(path, field)?;
        self.container_insert(path, field, 0, nodes, path)
    }

    /// Append `nodes` to list `field` of the node at `path`.
    pub fn push_container(
        &mut self,
        path: PathId,
        field: Field,
        nodes: Vec<NodeId>,
    ) -> Result<Vec<PathId>, TraverseError> {
        self.resync(path);
        self.assert_unremoved(path)?;
        let len = self.require_list(path, field)?;
        self.container_insert(path, field, len, nodes, path)
    }

    fn require_list(&self, path: PathId, field: Field) -> Result<usize, TraverseError> {
        let node = self.require_node(path)?;
        let kind = self.arena.kind(node);
        match kind.field_spec(field) {
            Some(spec) if spec.list => Ok(self.arena.list(node, field).len()),
            Some(_) => Err(TraverseError::WrongSlotShape {
                kind,
                field,
                expected: "list",
            }),
            None => Err(scopewalk_ast::AstError::UnknownField { kind, field }.into()),
        }
    }

    // ========================================================================
    // Siblings
    // ========================================================================

    /// The construct that stands in for `path` when inserting siblings:
    /// the statement wrapping an expression, a label, or an export.
    fn insertion_delegate(&self, path: PathId) -> Option<PathId> {
        let parent = self.parent_path(path)?;
        let delegate = self.is_expression_statement(parent)
            || self.is_labeled_statement(parent)
            || self.is_export_named_declaration(parent)
            || (self.is_export_default_declaration(parent) && self.is_declaration(path));
        delegate.then_some(parent)
    }

    fn is_expression_slot(&self, path: PathId) -> bool {
        self.is_expression(path)
            || (self.key(path) == Some(Field::Init)
                && self
                    .parent_path(path)
                    .is_some_and(|parent| self.is_for_statement(parent)))
    }

    /// Insert `nodes` before the node at `path`.
    ///
    /// Expressions become a sequence (or a wrapping function when the nodes
    /// are statements), a single-statement slot becomes a block, and list
    /// elements get real siblings.
    pub fn insert_before(&mut self, path: PathId, nodes: Vec<NodeId>) -> Result<Vec<PathId>, TraverseError> {
        self.resync(path);
        self.assert_unremoved(path)?;
        if let Some(parent) = self.insertion_delegate(path) {
            return self.insert_before(parent, nodes);
        }
        if self.is_expression_slot(path) {
            let mut nodes = nodes;
            nodes.extend(self.path_node(path));
            return self.replace_expression_with_statements(path, nodes);
        }
        match self.location(path) {
            Location::Element { field, index, .. } => {
                let owner = self.require_parent_path(path)?;
                self.container_insert(owner, field, index, nodes, path)
            }
            _ if self.is_statement_or_block(path) => {
                let block = self.wrap_in_block(path)?;
                self.unshift_container(block, Field::Body, nodes)
            }
            _ => Err(self.no_sibling_slot(path)),
        }
    }

    /// Insert `nodes` after the node at `path`.
    ///
    /// When `path` is an expression, its value is saved in a temporary so the
    /// expression still evaluates to it after the inserted nodes run.
    pub fn insert_after(&mut self, path: PathId, nodes: Vec<NodeId>) -> Result<Vec<PathId>, TraverseError> {
        self.resync(path);
        self.assert_unremoved(path)?;
        if self.is_sequence_expression(path) {
            if let Some(last) = self.get_list(path, Field::Expressions)?.last().copied() {
                return self.insert_after(last, nodes);
            }
        }
        if let Some(parent) = self.insertion_delegate(path) {
            let mut wrapped = Vec::with_capacity(nodes.len());
            for node in nodes {
                if self.arena.is(node, Alias::Expression) {
                    wrapped.push(build::expression_statement(&mut self.arena, node)?);
                } else {
                    wrapped.push(node);
                }
            }
            return self.insert_after(parent, wrapped);
        }
        if self.is_expression_slot(path) {
            let mut nodes = nodes;
            if let Some(current) = self.path_node(path) {
                let mut scope = self.scope_of(path)?;
                if self.is_pattern(self.scope_path(scope)) {
                    scope = self.scope_parent(scope).unwrap_or(scope);
                }
                let temp = self.generate_declared_uid_identifier(scope, "temp")?;
                let name = self.arena.name(temp).unwrap_or_default().to_string();
                let target = build::identifier(&mut self.arena, &name);
                let save = build::assignment_expression(&mut self.arena, "=", target, current)?;
                let save = build::expression_statement(&mut self.arena, save)?;
                let read = build::identifier(&mut self.arena, &name);
                let read = build::expression_statement(&mut self.arena, read)?;
                nodes.insert(0, save);
                nodes.push(read);
            }
            return self.replace_expression_with_statements(path, nodes);
        }
        match self.location(path) {
            Location::Element { field, index, .. } => {
                let owner = self.require_parent_path(path)?;
                self.container_insert(owner, field, index + 1, nodes, path)
            }
            _ if self.is_statement_or_block(path) => {
                let block = self.wrap_in_block(path)?;
                self.push_container(block, Field::Body, nodes)
            }
            _ => Err(self.no_sibling_slot(path)),
        }
    }

    /// Replace a lone statement with a block holding it, returning the
    /// block's path. An empty expression statement is dropped.
    fn wrap_in_block(&mut self, path: PathId) -> Result<PathId, TraverseError> {
        let keep = match self.path_node(path) {
            Some(node) if self.arena.kind(node) == NodeKind::ExpressionStatement => {
                self.arena.child(node, Field::Expression).is_some().then_some(node)
            }
            other => other,
        };
        let block = build::block_statement(&mut self.arena, keep.into_iter().collect())?;
        let replaced = self.replace_with(path, block)?;
        replaced.first().copied().ok_or_else(|| {
            TraverseError::InvalidOperation("block was not inserted".to_string())
        })
    }

    pub(crate) fn require_parent_path(&self, path: PathId) -> Result<PathId, TraverseError> {
        self.parent_path(path).ok_or_else(|| TraverseError::NoContainer {
            kind: self.describe(path),
            location: self.location(path).to_string(),
        })
    }

    fn no_sibling_slot(&self, path: PathId) -> TraverseError {
        TraverseError::InvalidOperation(format!(
            "cannot insert siblings next to `{}` at {}",
            self.describe(path),
            self.location(path)
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::options::TraverseOptions;
    use crate::session::Session;
    use crate::visitor::{VisitResult, Visitor};
    use scopewalk_ast::{build, Field};
    use serde_json::json;

    fn statement(name: &str) -> serde_json::Value {
        json!({
            "type": "ExpressionStatement",
            "expression": { "type": "Identifier", "name": name }
        })
    }

    fn names(session: &Session) -> Vec<String> {
        let program = session.root();
        session
            .arena()
            .list(program, Field::Body)
            .iter()
            .filter_map(|statement| session.arena().child(*statement, Field::Expression))
            .filter_map(|expression| session.arena().name(expression).map(str::to_string))
            .collect()
    }

    #[test]
    fn siblings_keep_their_paths_across_insertion() {
        let tree = json!({ "type": "Program", "body": [statement("a"), statement("c")] });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let a = session.get(root, "body.0").unwrap().one().unwrap();
        let c = session.get(root, "body.1").unwrap().one().unwrap();

        let b = build::identifier(session.arena_mut(), "b");
        let b = build::expression_statement(session.arena_mut(), b).unwrap();
        let inserted = session.insert_after(a, vec![b]).unwrap();

        assert_eq!(names(&session), vec!["a", "b", "c"]);
        assert_eq!(session.list_index(inserted[0]), Some(1));
        assert_eq!(session.list_index(c), Some(2));
        assert_eq!(session.get(root, "body.2").unwrap().one(), Some(c));
    }

    #[test]
    fn inserting_before_an_if_branch_makes_a_block() {
        let tree = json!({
            "type": "Program",
            "body": [{
                "type": "IfStatement",
                "test": { "type": "Identifier", "name": "x" },
                "consequent": statement("a"),
                "alternate": null
            }]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let consequent = session.get(root, "body.0.consequent").unwrap().one().unwrap();
        let b = build::identifier(session.arena_mut(), "b");
        let b = build::expression_statement(session.arena_mut(), b).unwrap();
        session.insert_before(consequent, vec![b]).unwrap();

        let json = session.to_json();
        let body = &json["body"][0]["consequent"];
        assert_eq!(body["type"], "BlockStatement");
        assert_eq!(body["body"][0]["expression"]["name"], "b");
        assert_eq!(body["body"][1]["expression"]["name"], "a");
    }

    #[test]
    fn inserted_statements_are_visited_by_the_running_walk() {
        let tree = json!({ "type": "Program", "body": [statement("a"), statement("c")] });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let visitor: Visitor<Vec<String>> = Visitor::new()
            .enter("ExpressionStatement", |session: &mut Session, path, _| {
                let expression = session.get_field(path, Field::Expression)?;
                if session.node_name(expression).as_deref() == Some("a") {
                    let b = build::identifier(session.arena_mut(), "b");
                    let b = build::expression_statement(session.arena_mut(), b)?;
                    session.insert_after(path, vec![b])?;
                }
                Ok(VisitResult::Continue)
            })
            .unwrap()
            .enter("Identifier", |session: &mut Session, path, seen: &mut Vec<String>| {
                seen.extend(session.node_name(path));
                Ok(VisitResult::Continue)
            })
            .unwrap();
        let mut seen = Vec::new();
        session.traverse(&visitor, &mut seen).unwrap();
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c"]);
    }
}
