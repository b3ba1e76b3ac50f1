// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The session: one tree plus every registry the engine keeps about it.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use scopewalk_ast::{Field, NodeArena, NodeId, NodeKind};
use serde_json::Value;
use tracing::debug;

use crate::context::{ContextData, ContextId};
use crate::error::TraverseError;
use crate::options::TraverseOptions;
use crate::path::{Location, PathData, PathId};
use crate::scope::binding::Binding;
use crate::scope::collector::CrawlState;
use crate::scope::{ScopeData, ScopeId};
use crate::visitor::Visitor;

/// Owner of a tree and of the path, scope, binding and context registries
/// built over it.
///
/// All identifiers handed out by a session ([`PathId`], [`ScopeId`],
/// [`BindingId`](crate::BindingId)) index into these registries and are only
/// meaningful for the session that produced them.
pub struct Session {
    pub(crate) arena: NodeArena,
    pub(crate) root: NodeId,
    pub(crate) options: TraverseOptions,

    pub(crate) paths: Vec<PathData>,
    /// Canonical paths keyed by `(parent node, node)`; the root has no parent.
    pub(crate) path_cache: HashMap<(Option<NodeId>, NodeId), PathId>,
    /// Paths to empty slots, keyed by where they point.
    pub(crate) absent_paths: HashMap<Location, PathId>,
    /// Paths grouped by the node whose slot they point into.
    pub(crate) paths_by_parent: HashMap<NodeId, Vec<PathId>>,

    pub(crate) scopes: Vec<ScopeData>,
    pub(crate) scope_cache: HashMap<NodeId, ScopeId>,
    pub(crate) bindings: Vec<Binding>,

    pub(crate) contexts: HashMap<ContextId, ContextData>,
    pub(crate) next_context: u32,
    pub(crate) collector: Option<Rc<Visitor<CrawlState>>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("root", &self.root)
            .field("options", &self.options)
            .field("paths", &self.paths.len())
            .field("scopes", &self.scopes.len())
            .field("bindings", &self.bindings.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start a session over `root`, which must live in `arena`.
    pub fn new(arena: NodeArena, root: NodeId, options: TraverseOptions) -> Self {
        Session {
            arena,
            root,
            options,
            paths: Vec::new(),
            path_cache: HashMap::new(),
            absent_paths: HashMap::new(),
            paths_by_parent: HashMap::new(),
            scopes: Vec::new(),
            scope_cache: HashMap::new(),
            bindings: Vec::new(),
            contexts: HashMap::new(),
            next_context: 0,
            collector: None,
        }
    }

    /// Import a Babel/ESTree JSON tree and start a session over it.
    pub fn from_json(value: &Value, options: TraverseOptions) -> Result<Self, TraverseError> {
        let mut arena = NodeArena::new();
        let root = arena.import_json(value)?;
        Ok(Session::new(arena, root, options))
    }

    /// Export the current tree as Babel JSON.
    pub fn to_json(&self) -> Value {
        self.arena.export_json(self.root)
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Mutable access to the raw nodes.
    ///
    /// Edits made here bypass the path and scope registries. Call
    /// [`resync`](Session::resync) on affected paths, or
    /// [`clear_caches`](Session::clear_caches), afterwards.
    pub fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    pub fn into_arena(self) -> NodeArena {
        self.arena
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn options(&self) -> &TraverseOptions {
        &self.options
    }

    /// Drop every path, scope, binding and traversal context.
    ///
    /// Identifiers obtained before the call must not be used afterwards.
    pub fn clear_caches(&mut self) {
        debug!(
            paths = self.paths.len(),
            scopes = self.scopes.len(),
            "clearing session caches"
        );
        self.paths.clear();
        self.path_cache.clear();
        self.absent_paths.clear();
        self.paths_by_parent.clear();
        self.scopes.clear();
        self.scope_cache.clear();
        self.bindings.clear();
        self.contexts.clear();
    }

    /// The canonical path to the root node.
    pub fn root_path(&mut self) -> PathId {
        self.path_at(None, Location::Root)
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Walk the whole tree, visiting the root node itself first.
    pub fn traverse<S>(&mut self, visitor: &Visitor<S>, state: &mut S) -> Result<(), TraverseError> {
        let root = self.root_path();
        if !visitor.is_no_scope() {
            self.scope_of(root)?;
        }
        debug!(root = %self.root, "traversal started");
        self.visit_single(root, visitor, state)?;
        Ok(())
    }

    /// Visit the children of `node`.
    ///
    /// `parent_path` is the path of `node` itself; it may only be omitted when
    /// `node` is a Program. Returns true if a callback stopped the walk.
    pub fn traverse_node<S>(
        &mut self,
        node: NodeId,
        visitor: &Visitor<S>,
        state: &mut S,
        parent_path: Option<PathId>,
    ) -> Result<bool, TraverseError> {
        let kind = self.arena.kind(node);
        let path = match parent_path {
            Some(path) => path,
            None if kind == NodeKind::Program && node == self.root => self.root_path(),
            None => return Err(TraverseError::MissingParentPath { kind }),
        };
        self.walk_children(node, visitor, state, path, &[])
    }

    /// Visit the children of the node at `path`.
    pub fn traverse_path<S>(
        &mut self,
        path: PathId,
        visitor: &Visitor<S>,
        state: &mut S,
    ) -> Result<bool, TraverseError> {
        let Some(node) = self.path_node(path) else {
            return Ok(false);
        };
        self.walk_children(node, visitor, state, path, &[])
    }

    pub(crate) fn collector(&mut self) -> Result<Rc<Visitor<CrawlState>>, TraverseError> {
        if let Some(collector) = &self.collector {
            return Ok(Rc::clone(collector));
        }
        let collector = Rc::new(crate::scope::collector::build()?);
        self.collector = Some(Rc::clone(&collector));
        Ok(collector)
    }

    /// Name of the identifier (or other named node) at `path`.
    pub fn node_name(&self, path: PathId) -> Option<String> {
        self.path_node(path)
            .and_then(|node| self.arena.name(node))
            .map(str::to_string)
    }

    /// Kind of the node at `path`, if the slot is filled.
    pub fn node_kind(&self, path: PathId) -> Option<NodeKind> {
        self.path_node(path).map(|node| self.arena.kind(node))
    }

    /// Child node in `field` of the node at `path`.
    pub fn node_child(&self, path: PathId, field: Field) -> Option<NodeId> {
        self.path_node(path)
            .and_then(|node| self.arena.child(node, field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn traverse_node_requires_parent_path_below_program() {
        let tree = json!({
            "type": "Program",
            "body": [{ "type": "EmptyStatement" }]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let statement = session.arena().list(session.root(), Field::Body)[0];
        let visitor: Visitor<()> = Visitor::new();
        let err = session
            .traverse_node(statement, &visitor, &mut (), None)
            .unwrap_err();
        assert!(matches!(err, TraverseError::MissingParentPath { .. }));

        let root = session.root();
        assert!(!session.traverse_node(root, &visitor, &mut (), None).unwrap());
    }

    #[test]
    fn debug_output_summarizes_registries() {
        let tree = json!({ "type": "Program", "body": [] });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        session.scope_of(root).unwrap();
        let text = format!("{:?}", session);
        assert!(text.starts_with("Session {"));
        assert!(text.contains("scopes: 1"));
        assert!(text.ends_with(".. }"));
    }

    #[test]
    fn clear_caches_forgets_paths() {
        let tree = json!({ "type": "Program", "body": [] });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        session.scope_of(root).unwrap();
        session.clear_caches();
        assert!(session.paths.is_empty());
        assert!(session.scopes.is_empty());
        assert_eq!(session.root_path(), root);
    }
}
