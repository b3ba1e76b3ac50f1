// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Binding collection.
//!
//! A crawl walks a scope's subtree once with the collector visitor. Bindings
//! are registered as their declarations are entered; reads and writes are
//! gathered into [`CrawlState`] and resolved after the walk, when every
//! declaration (hoisted ones included) is known.
//!
//! The same visitor keeps the registries current under mutation: a subtree
//! leaving the tree releases what it declared and referenced
//! ([`release_subtrees`](Session::release_subtrees)), and a subtree entering
//! it is collected on its own ([`adopt_subtree`](Session::adopt_subtree)).

use std::collections::HashSet;

use scopewalk_ast::validators;
use scopewalk_ast::{Field, NodeId, NodeKind};
use tracing::{debug, trace};

use crate::error::TraverseError;
use crate::path::PathId;
use crate::scope::{BindingId, BindingKind, ScopeId};
use crate::session::Session;
use crate::visitor::{VisitResult, Visitor};

/// Reads and writes seen during a crawl, resolved once the walk ends.
#[derive(Debug, Default)]
pub(crate) struct CrawlState {
    references: Vec<PathId>,
    constant_violations: Vec<PathId>,
    assignments: Vec<PathId>,
}

/// Reads and writes of a binding whose declaration left the tree.
#[derive(Debug)]
pub(crate) struct Orphan {
    scope: ScopeId,
    name: String,
    references: Vec<PathId>,
    violations: Vec<PathId>,
}

type Step = Result<VisitResult, TraverseError>;

/// The collector visitor. Handler order matters: scopes are reset before
/// anything registers into them.
pub(crate) fn build() -> Result<Visitor<CrawlState>, TraverseError> {
    Visitor::new()
        .enter("Scope", |session: &mut Session, path, _: &mut CrawlState| -> Step {
            let scope = session.scope_of(path)?;
            session.scopes[scope.index()].reset();
            Ok(VisitResult::Continue)
        })?
        .enter("ForStatement", |session: &mut Session, path, _: &mut CrawlState| -> Step {
            let init = session.get_field(path, Field::Init)?;
            if session.is_var(init) {
                let scope = session.scope_of(path)?;
                let target = session.scope_hoist_target(scope);
                session.register_binding(target, BindingKind::Var, init, init)?;
            }
            Ok(VisitResult::Continue)
        })?
        .enter("Declaration", |session: &mut Session, path, _: &mut CrawlState| -> Step {
            if session.is_block_scoped(path)
                || session.is_import_declaration(path)
                || session.is_export_declaration(path)
            {
                return Ok(VisitResult::Continue);
            }
            let mut scope = session.scope_of(path)?;
            // A function declaration's own scope is its body, not where it is declared.
            if session.scope_path(scope) == path {
                scope = session.scope_parent(scope).unwrap_or(scope);
            }
            let target = session.scope_hoist_target(scope);
            session.register_declaration(target, path)?;
            Ok(VisitResult::Continue)
        })?
        .enter("ImportDeclaration", |session: &mut Session, path, _: &mut CrawlState| -> Step {
            let scope = session.scope_of(path)?;
            let target = session.scope_block_parent(scope);
            session.register_declaration(target, path)?;
            Ok(VisitResult::Continue)
        })?
        .enter("ReferencedIdentifier", |_: &mut Session, path, state: &mut CrawlState| -> Step {
            state.references.push(path);
            Ok(VisitResult::Continue)
        })?
        .enter("ForXStatement", |session: &mut Session, path, state: &mut CrawlState| -> Step {
            let left = session.get_field(path, Field::Left)?;
            if session.is_pattern(left) || session.is_identifier(left) {
                state.constant_violations.push(path);
            } else if session.is_var(left) {
                let scope = session.scope_of(path)?;
                let target = session.scope_hoist_target(scope);
                session.register_binding(target, BindingKind::Var, left, left)?;
            }
            Ok(VisitResult::Continue)
        })?
        .exit("ExportDeclaration", |session: &mut Session, path, _: &mut CrawlState| -> Step {
            session.reference_exported(path)?;
            Ok(VisitResult::Continue)
        })?
        .enter("LabeledStatement", |session: &mut Session, path, _: &mut CrawlState| -> Step {
            let scope = session.scope_of(path)?;
            let target = session.scope_block_parent(scope);
            session.register_declaration(target, path)?;
            Ok(VisitResult::Continue)
        })?
        .enter("AssignmentExpression", |_: &mut Session, path, state: &mut CrawlState| -> Step {
            state.assignments.push(path);
            Ok(VisitResult::Continue)
        })?
        .enter("UpdateExpression", |_: &mut Session, path, state: &mut CrawlState| -> Step {
            state.constant_violations.push(path);
            Ok(VisitResult::Continue)
        })?
        .enter("UnaryExpression", |session: &mut Session, path, state: &mut CrawlState| -> Step {
            let is_delete = session
                .path_node(path)
                .is_some_and(|node| session.arena.get(node).operator() == Some("delete"));
            if is_delete {
                state.constant_violations.push(path);
            }
            Ok(VisitResult::Continue)
        })?
        .enter("BlockScoped", |session: &mut Session, path, _: &mut CrawlState| -> Step {
            let own = session.scope_of(path)?;
            let mut scope = own;
            if session.scope_path(scope) == path {
                scope = session.scope_parent(scope).unwrap_or(scope);
            }
            let target = session.scope_block_parent(scope);
            session.register_declaration(target, path)?;
            // The class name is also visible inside the class's own scope.
            if session.is_class_declaration(path) && own != scope {
                if let Some(name) = session
                    .node_child(path, Field::Id)
                    .and_then(|id| session.arena.name(id))
                    .map(str::to_string)
                {
                    if let Some(binding) = session.get_binding(scope, &name) {
                        session.scopes[own.index()].bindings.insert(name, binding);
                    }
                }
            }
            Ok(VisitResult::Continue)
        })?
        .enter("CatchClause", |session: &mut Session, path, _: &mut CrawlState| -> Step {
            let scope = session.scope_of(path)?;
            session.register_binding(scope, BindingKind::Catch, path, path)?;
            Ok(VisitResult::Continue)
        })?
        .enter("Function", |session: &mut Session, path, _: &mut CrawlState| -> Step {
            let scope = session.scope_of(path)?;
            for param in session.get_list(path, Field::Params)? {
                session.register_binding(scope, BindingKind::Param, param, param)?;
            }
            if session.is_function_expression(path) && session.node_child(path, Field::Id).is_some() {
                let id = session.get_field(path, Field::Id)?;
                session.register_binding(scope, BindingKind::Local, id, path)?;
            }
            Ok(VisitResult::Continue)
        })?
        .enter("ClassExpression", |session: &mut Session, path, _: &mut CrawlState| -> Step {
            if session.node_child(path, Field::Id).is_some() {
                let scope = session.scope_of(path)?;
                let id = session.get_field(path, Field::Id)?;
                session.register_binding(scope, BindingKind::Local, id, path)?;
            }
            Ok(VisitResult::Continue)
        })
}

/// Reads and writes only, for re-resolving uses of names that were free.
fn uses() -> Result<Visitor<CrawlState>, TraverseError> {
    Visitor::new()
        .enter("ReferencedIdentifier", |_: &mut Session, path, state: &mut CrawlState| -> Step {
            state.references.push(path);
            Ok(VisitResult::Continue)
        })?
        .enter("AssignmentExpression", |_: &mut Session, path, state: &mut CrawlState| -> Step {
            state.assignments.push(path);
            Ok(VisitResult::Continue)
        })?
        .enter("UpdateExpression", |_: &mut Session, path, state: &mut CrawlState| -> Step {
            state.assignments.push(path);
            Ok(VisitResult::Continue)
        })
}

impl Session {
    // ========================================================================
    // Crawl
    // ========================================================================

    /// Rebuild the bindings of `scope` and every scope nested in it.
    ///
    /// Does nothing while an enclosing scope is being crawled: that crawl
    /// covers this scope too.
    pub fn crawl(&mut self, scope: ScopeId) -> Result<(), TraverseError> {
        let path = self.scope_path(scope);
        self.scopes[scope.index()].reset();

        let mut program = scope;
        let mut current = Some(scope);
        while let Some(candidate) = current {
            if self.scopes[candidate.index()].crawling {
                return Ok(());
            }
            program = candidate;
            if self.arena.kind(self.scope_block(candidate)) == NodeKind::Program {
                break;
            }
            current = self.scope_parent(candidate);
        }

        debug!(%scope, kind = %self.describe(path), "crawling scope");
        let collector = self.collector()?;
        let mut state = CrawlState::default();
        self.scopes[scope.index()].crawling = true;
        let walked = self.crawl_owner(path, &collector, &mut state);
        self.scopes[scope.index()].crawling = false;
        walked?;
        self.resolve_crawl(program, state)
    }

    fn crawl_owner(
        &mut self,
        path: PathId,
        collector: &Visitor<CrawlState>,
        state: &mut CrawlState,
    ) -> Result<(), TraverseError> {
        let node = self.require_node(path)?;
        if self.arena.kind(node) != NodeKind::Program {
            self.enter_only(path, collector, state)?;
        }
        self.walk_children(node, collector, state, path, &[])?;
        Ok(())
    }

    /// Attach gathered reads and writes to their bindings. Unresolved names
    /// become globals of `program`.
    fn resolve_crawl(&mut self, program: ScopeId, state: CrawlState) -> Result<(), TraverseError> {
        for path in state.assignments {
            let Some(node) = self.path_node(path) else {
                continue;
            };
            let scope = self.scope_of(path)?;
            let ids = validators::assignment_identifiers(&self.arena, node);
            for (name, id) in ids {
                if self.get_binding(scope, &name).is_none() {
                    self.add_global(program, id);
                }
            }
            self.register_constant_violation(scope, path);
        }
        for path in state.references {
            let Some(node) = self.path_node(path) else {
                continue;
            };
            let Some(name) = self.arena.name(node).map(str::to_string) else {
                continue;
            };
            let scope = self.scope_of(path)?;
            match self.get_binding(scope, &name) {
                Some(binding) => self.bindings[binding.index()].reference(path),
                None => self.add_global(program, node),
            }
        }
        for path in state.constant_violations {
            let scope = self.scope_of(path)?;
            self.register_constant_violation(scope, path);
        }
        Ok(())
    }

    /// An exported declaration counts as a read of the names it declares.
    fn reference_exported(&mut self, path: PathId) -> Result<(), TraverseError> {
        let Some(node) = self.path_node(path) else {
            return Ok(());
        };
        if self.arena.kind(node) == NodeKind::ExportAllDeclaration {
            return Ok(());
        }
        let Some(declaration) = self.arena.child(node, Field::Declaration) else {
            return Ok(());
        };
        let names: Vec<String> = match self.arena.kind(declaration) {
            NodeKind::ClassDeclaration | NodeKind::FunctionDeclaration => self
                .arena
                .child(declaration, Field::Id)
                .and_then(|id| self.arena.name(id))
                .map(str::to_string)
                .into_iter()
                .collect(),
            NodeKind::VariableDeclaration => self
                .arena
                .list(declaration, Field::Declarations)
                .iter()
                .flat_map(|declarator| {
                    validators::binding_identifiers(&self.arena, *declarator, false, false).into_keys()
                })
                .collect(),
            _ => Vec::new(),
        };
        let scope = self.scope_of(path)?;
        for name in names {
            if let Some(binding) = self.get_binding(scope, &name) {
                self.bindings[binding.index()].reference(path);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Incremental maintenance
    // ========================================================================

    /// Forget everything the subtrees under `roots` declared, read or wrote.
    ///
    /// Returns the reads and writes outside the subtrees that pointed at a
    /// dropped binding; [`settle_orphans`](Session::settle_orphans) re-resolves
    /// them once the replacement is in place.
    pub(crate) fn release_subtrees(&mut self, roots: &[NodeId]) -> Vec<Orphan> {
        if !self.options.track_bindings || roots.is_empty() || self.scopes.is_empty() {
            return Vec::new();
        }
        let gone: HashSet<NodeId> = roots
            .iter()
            .flat_map(|root| self.arena.descendants(*root))
            .collect();
        let paths = &self.paths;
        let inside = |path: &PathId| {
            paths[path.index()]
                .node
                .is_some_and(|node| gone.contains(&node))
        };

        let mut orphans = Vec::new();
        let mut survivors: HashSet<BindingId> = HashSet::new();
        for (index, scope) in self.scopes.iter_mut().enumerate() {
            let scope_id = ScopeId(index as u32);
            let mut dropped = Vec::new();
            scope.bindings.retain(|name, binding| {
                let record = &self.bindings[binding.index()];
                if gone.contains(&record.identifier) {
                    if record.scope == scope_id {
                        dropped.push((name.clone(), *binding));
                    }
                    false
                } else {
                    survivors.insert(*binding);
                    true
                }
            });
            scope.labels.retain(|_, label| !inside(label));
            for (name, binding) in dropped {
                let record = &self.bindings[binding.index()];
                let references: Vec<PathId> = record
                    .reference_paths
                    .iter()
                    .filter(|path| !inside(path))
                    .copied()
                    .collect();
                let violations: Vec<PathId> = record
                    .constant_violations
                    .iter()
                    .filter(|path| !inside(path) && **path != record.path)
                    .copied()
                    .collect();
                trace!(%name, refs = references.len(), "binding released");
                if !references.is_empty() || !violations.is_empty() {
                    orphans.push(Orphan {
                        scope: scope_id,
                        name,
                        references,
                        violations,
                    });
                }
            }
        }
        for binding in survivors {
            let record = &mut self.bindings[binding.index()];
            record.reference_paths.retain(|path| !inside(path));
            record.references = record.reference_paths.len();
            record.referenced = record.references > 0;
            let before = record.constant_violations.len();
            record.constant_violations.retain(|path| !inside(path));
            if record.constant_violations.len() != before {
                record.constant = record.constant_violations.is_empty();
            }
        }
        self.scope_cache.retain(|node, _| !gone.contains(node));
        for data in self.paths.iter_mut() {
            if data.node.is_some_and(|node| gone.contains(&node)) {
                data.scope = None;
            }
        }
        orphans
    }

    /// Collect the bindings, reads and writes of a subtree that just entered
    /// the tree at `path`.
    pub(crate) fn adopt_subtree(&mut self, path: PathId) -> Result<(), TraverseError> {
        if !self.options.track_bindings || self.path_node(path).is_none() {
            return Ok(());
        }
        let Some(parent) = self.parent_path(path) else {
            // A new root: start over.
            self.paths[path.index()].scope = None;
            return self.scope_of(path).map(|_| ());
        };
        let outer = self.scope_of(parent)?;
        let program = self.scope_program_parent(outer);
        trace!(%path, %outer, "adopting subtree");

        let first = self.bindings.len();
        let was_crawling = self.scopes[outer.index()].crawling;
        self.scopes[outer.index()].crawling = true;
        self.paths[path.index()].scope = None;
        let collected = self.collect_subtree(path);
        self.scopes[outer.index()].crawling = was_crawling;
        let state = collected?;
        self.resolve_crawl(program, state)?;
        self.claim_globals(program, first)
    }

    /// Hand the free reads and writes of a name to a binding registered at
    /// index `first` or later. The name stays global while any use of it is
    /// still unresolved.
    fn claim_globals(&mut self, program: ScopeId, first: usize) -> Result<(), TraverseError> {
        let globals = &self.scopes[program.index()].globals;
        let claimed: HashSet<String> = self.bindings[first..]
            .iter()
            .filter_map(|record| self.arena.name(record.identifier))
            .filter(|name| globals.contains_key(*name))
            .map(str::to_string)
            .collect();
        if claimed.is_empty() {
            return Ok(());
        }
        debug!(names = claimed.len(), "new bindings shadow globals");

        let visitor = uses()?;
        let mut state = CrawlState::default();
        let root = self.scope_path(program);
        let node = self.scope_block(program);
        self.walk_children(node, &visitor, &mut state, root, &[])?;

        let mut free: HashSet<String> = HashSet::new();
        for path in state.references {
            let Some(node) = self.path_node(path) else {
                continue;
            };
            let Some(name) = self.arena.name(node).map(str::to_string) else {
                continue;
            };
            if !claimed.contains(&name) {
                continue;
            }
            let scope = self.scope_of(path)?;
            match self.get_binding(scope, &name) {
                Some(binding) => self.bindings[binding.index()].reference(path),
                None => {
                    free.insert(name);
                }
            }
        }
        for path in state.assignments {
            let Some(node) = self.path_node(path) else {
                continue;
            };
            let scope = self.scope_of(path)?;
            for name in validators::assignment_identifiers(&self.arena, node).into_keys() {
                if !claimed.contains(&name) {
                    continue;
                }
                match self.get_binding(scope, &name) {
                    Some(binding) => self.bindings[binding.index()].reassign(path),
                    None => {
                        free.insert(name);
                    }
                }
            }
        }

        for name in claimed.difference(&free) {
            trace!(%name, "global claimed by new binding");
            self.scopes[program.index()].globals.shift_remove(name);
        }
        Ok(())
    }

    fn collect_subtree(&mut self, path: PathId) -> Result<CrawlState, TraverseError> {
        let collector = self.collector()?;
        let mut state = CrawlState::default();
        self.visit_single(path, &collector, &mut state)?;
        Ok(state)
    }

    /// Re-resolve reads and writes whose binding was released.
    pub(crate) fn settle_orphans(&mut self, orphans: Vec<Orphan>) -> Result<(), TraverseError> {
        for orphan in orphans {
            let program = self.scope_program_parent(orphan.scope);
            match self.get_binding(orphan.scope, &orphan.name) {
                Some(binding) => {
                    for path in orphan.references {
                        self.bindings[binding.index()].reference(path);
                    }
                    for path in orphan.violations {
                        self.bindings[binding.index()].reassign(path);
                    }
                }
                None => {
                    for path in orphan.references {
                        if let Some(node) = self.path_node(path) {
                            self.add_global(program, node);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::options::TraverseOptions;
    use crate::scope::BindingKind;
    use crate::session::Session;
    use serde_json::json;

    fn ident(name: &str) -> serde_json::Value {
        json!({ "type": "Identifier", "name": name })
    }

    #[test]
    fn function_declarations_hoist_out_of_blocks() {
        let tree = json!({
            "type": "Program",
            "body": [{
                "type": "BlockStatement",
                "body": [{
                    "type": "FunctionDeclaration",
                    "id": ident("f"),
                    "params": [ident("a")],
                    "body": { "type": "BlockStatement", "body": [] }
                }]
            }]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let program = session.scope_of(root).unwrap();
        let f = session.get_own_binding(program, "f").unwrap();
        assert_eq!(session.binding(f).kind(), BindingKind::Hoisted);

        let function = session.get(root, "body.0.body.0").unwrap().one().unwrap();
        let own = session.scope_of(function).unwrap();
        let a = session.get_own_binding(own, "a").unwrap();
        assert_eq!(session.binding(a).kind(), BindingKind::Param);
        assert!(session.get_own_binding(program, "a").is_none());
    }

    #[test]
    fn unresolved_reads_and_writes_become_globals() {
        let tree = json!({
            "type": "Program",
            "body": [
                {
                    "type": "ExpressionStatement",
                    "expression": {
                        "type": "AssignmentExpression",
                        "operator": "=",
                        "left": ident("g"),
                        "right": ident("h")
                    }
                }
            ]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let program = session.scope_of(root).unwrap();
        assert!(session.has_global(program, "g"));
        assert!(session.has_global(program, "h"));
        assert!(session.get_binding(program, "g").is_none());
    }

    #[test]
    fn class_name_is_visible_inside_the_class() {
        let tree = json!({
            "type": "Program",
            "body": [{
                "type": "ClassDeclaration",
                "id": ident("C"),
                "superClass": null,
                "body": { "type": "ClassBody", "body": [] }
            }]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let program = session.scope_of(root).unwrap();
        let class = session.get(root, "body.0").unwrap().one().unwrap();
        let own = session.scope_of(class).unwrap();
        let outer = session.get_own_binding(program, "C").unwrap();
        assert_eq!(session.get_own_binding(own, "C"), Some(outer));
        assert_eq!(session.binding(outer).kind(), BindingKind::Let);
    }

    #[test]
    fn exported_declarations_count_as_references() {
        let tree = json!({
            "type": "Program",
            "body": [{
                "type": "ExportNamedDeclaration",
                "declaration": {
                    "type": "VariableDeclaration",
                    "kind": "const",
                    "declarations": [{
                        "type": "VariableDeclarator",
                        "id": ident("answer"),
                        "init": { "type": "NumericLiteral", "value": 42 }
                    }]
                },
                "specifiers": [],
                "source": null
            }]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let program = session.scope_of(root).unwrap();
        let answer = session.get_binding(program, "answer").unwrap();
        assert_eq!(session.binding(answer).references(), 1);
        assert!(session.binding(answer).is_constant());
    }
}
