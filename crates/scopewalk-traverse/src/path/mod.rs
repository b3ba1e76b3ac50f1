// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Paths: stable cursors to one child slot of the tree.
//!
//! A path records where a node sits (its [`Location`]), the path of its parent,
//! and per-visit state (skip flags, traversal contexts, cached scope). The
//! session keeps exactly one live path per `(parent node, node)` pair, so two
//! lookups of the same position return the same [`PathId`].
//!
//! The operations on paths are inherent methods on [`Session`], grouped by
//! concern in the submodules:
//!
//! - [`ancestry`]: walking up the tree.
//! - [`family`]: children, siblings and dotted `get`.
//! - [`predicates`]: one `is_*` / `assert_*` pair per node kind and alias.
//! - [`introspection`]: position-dependent questions (is this a reference?).
//! - [`modification`]: insertion around and into a path.
//! - [`replacement`]: replacing a node with one or more others.
//! - [`removal`]: removing a node, with parent-collapsing hooks.
//! - [`conversion`]: `ensure_block`.
//! - [`comments`]: attaching and sharing comments.
//! - [`evaluation`]: constant evaluation.

use std::collections::{HashMap, HashSet};
use std::fmt;

use scopewalk_ast::{Child, Field, NodeId};
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::context::ContextId;
use crate::error::TraverseError;
use crate::scope::ScopeId;
use crate::session::Session;

pub mod ancestry;
pub mod comments;
pub mod conversion;
pub mod evaluation;
pub mod family;
pub mod introspection;
pub mod modification;
pub mod predicates;
pub mod removal;
pub mod replacement;

// ============================================================================
// Identifiers and locations
// ============================================================================

/// Handle to a path in a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PathId(pub(crate) u32);

impl PathId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "path_{}", self.0)
    }
}

/// Where a path points: the root, a single slot, or one element of a list slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Root,
    Field { parent: NodeId, field: Field },
    Element {
        parent: NodeId,
        field: Field,
        index: usize,
    },
}

impl Location {
    /// The node owning the slot.
    pub fn parent(&self) -> Option<NodeId> {
        match self {
            Location::Root => None,
            Location::Field { parent, .. } | Location::Element { parent, .. } => Some(*parent),
        }
    }

    /// The slot name (the list name for list elements).
    pub fn field(&self) -> Option<Field> {
        match self {
            Location::Root => None,
            Location::Field { field, .. } | Location::Element { field, .. } => Some(*field),
        }
    }

    /// Position inside the list, for list elements.
    pub fn index(&self) -> Option<usize> {
        match self {
            Location::Element { index, .. } => Some(*index),
            _ => None,
        }
    }

    fn with_parent(self, parent: NodeId) -> Location {
        match self {
            Location::Root => Location::Root,
            Location::Field { field, .. } => Location::Field { parent, field },
            Location::Element { field, index, .. } => Location::Element {
                parent,
                field,
                index,
            },
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Root => f.write_str("root"),
            Location::Field { parent, field } => write!(f, "{}.{}", parent, field),
            Location::Element {
                parent,
                field,
                index,
            } => write!(f, "{}.{}[{}]", parent, field, index),
        }
    }
}

/// Registry record for one path.
#[derive(Debug, Clone)]
pub(crate) struct PathData {
    pub(crate) location: Location,
    pub(crate) parent_path: Option<PathId>,
    pub(crate) node: Option<NodeId>,
    pub(crate) removed: bool,
    /// The node is no longer found in its container.
    pub(crate) detached: bool,
    pub(crate) should_skip: bool,
    pub(crate) should_stop: bool,
    pub(crate) skip_keys: HashSet<Field>,
    pub(crate) data: HashMap<String, Value>,
    /// Traversal contexts this path is queued in, innermost last.
    pub(crate) contexts: Vec<ContextId>,
    pub(crate) scope: Option<ScopeId>,
}

impl PathData {
    fn new(location: Location, parent_path: Option<PathId>, node: Option<NodeId>) -> Self {
        PathData {
            location,
            parent_path,
            node,
            removed: false,
            detached: false,
            should_skip: false,
            should_stop: false,
            skip_keys: HashSet::new(),
            data: HashMap::new(),
            contexts: Vec::new(),
            scope: None,
        }
    }
}

// ============================================================================
// Canonical path lookup
// ============================================================================

impl Session {
    /// The node currently stored at `location`.
    pub fn read_location(&self, location: Location) -> Option<NodeId> {
        match location {
            Location::Root => Some(self.root),
            Location::Field { parent, field } => self.arena.child(parent, field),
            Location::Element {
                parent,
                field,
                index,
            } => self.arena.element(parent, field, index),
        }
    }

    /// Return the canonical path for `location`, creating it on first use.
    ///
    /// An existing path for the same node under the same parent is re-homed to
    /// `location` (list splicing shifts indices).
    pub(crate) fn path_at(&mut self, parent_path: Option<PathId>, location: Location) -> PathId {
        let node = self.read_location(location);
        let existing = match node {
            Some(node) => self.path_cache.get(&(location.parent(), node)).copied(),
            None => self.absent_paths.get(&location).copied(),
        };
        if let Some(id) = existing {
            let data = &mut self.paths[id.index()];
            data.location = location;
            data.parent_path = parent_path;
            data.node = node;
            data.detached = false;
            return id;
        }

        let id = PathId(self.paths.len() as u32);
        self.paths.push(PathData::new(location, parent_path, node));
        match node {
            Some(node) => {
                self.path_cache.insert((location.parent(), node), id);
            }
            None => {
                self.absent_paths.insert(location, id);
            }
        }
        if let Some(parent) = location.parent() {
            self.paths_by_parent.entry(parent).or_default().push(id);
        }
        id
    }

    /// Point `path` at `node`, moving its cache entry.
    pub(crate) fn rekey(&mut self, path: PathId, node: Option<NodeId>) {
        let data = &self.paths[path.index()];
        let location = data.location;
        let parent = location.parent();
        match data.node {
            Some(old) => {
                if self.path_cache.get(&(parent, old)) == Some(&path) {
                    self.path_cache.remove(&(parent, old));
                }
            }
            None => {
                if self.absent_paths.get(&location) == Some(&path) {
                    self.absent_paths.remove(&location);
                }
            }
        }
        self.paths[path.index()].node = node;
        match node {
            Some(node) => {
                self.path_cache.insert((parent, node), path);
            }
            None => {
                self.absent_paths.insert(location, path);
            }
        }
    }

    /// Move `path` under a new parent node, keeping its slot name and index.
    pub(crate) fn rehome(&mut self, path: PathId, parent_path: PathId, location: Location) {
        let data = &self.paths[path.index()];
        let old_parent = data.location.parent();
        if let Some(node) = data.node {
            if self.path_cache.get(&(old_parent, node)) == Some(&path) {
                self.path_cache.remove(&(old_parent, node));
            }
            self.path_cache.insert((location.parent(), node), path);
        }
        if let Some(old) = old_parent {
            if let Some(siblings) = self.paths_by_parent.get_mut(&old) {
                siblings.retain(|p| *p != path);
            }
        }
        if let Some(parent) = location.parent() {
            self.paths_by_parent.entry(parent).or_default().push(path);
        }
        let data = &mut self.paths[path.index()];
        data.location = location;
        data.parent_path = Some(parent_path);
        data.detached = false;
    }

    /// Drop the cache entry of a path that no longer points anywhere.
    pub(crate) fn uncache(&mut self, path: PathId) {
        let data = &self.paths[path.index()];
        if let Some(node) = data.node {
            let key = (data.location.parent(), node);
            if self.path_cache.get(&key) == Some(&path) {
                self.path_cache.remove(&key);
            }
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The node at `path`, or `None` for an absent or removed path.
    pub fn path_node(&self, path: PathId) -> Option<NodeId> {
        self.paths[path.index()].node
    }

    pub fn parent_path(&self, path: PathId) -> Option<PathId> {
        self.paths[path.index()].parent_path
    }

    /// The node owning the slot `path` points into.
    pub fn parent_node(&self, path: PathId) -> Option<NodeId> {
        self.paths[path.index()].location.parent()
    }

    pub fn location(&self, path: PathId) -> Location {
        self.paths[path.index()].location
    }

    /// Slot name of `path` (the list name for list elements).
    pub fn key(&self, path: PathId) -> Option<Field> {
        self.location(path).field()
    }

    /// Index of `path` in its list container.
    pub fn list_index(&self, path: PathId) -> Option<usize> {
        self.location(path).index()
    }

    /// Returns true if `path` is an element of a list slot.
    pub fn in_list(&self, path: PathId) -> bool {
        matches!(self.location(path), Location::Element { .. })
    }

    /// Length of the list `path` belongs to.
    pub fn container_len(&self, path: PathId) -> Option<usize> {
        match self.location(path) {
            Location::Element { parent, field, .. } => Some(self.arena.list(parent, field).len()),
            _ => None,
        }
    }

    pub fn is_removed(&self, path: PathId) -> bool {
        self.paths[path.index()].removed
    }

    /// Returns true if resync could no longer find the node in its container.
    pub fn is_detached(&self, path: PathId) -> bool {
        self.paths[path.index()].detached
    }

    /// The node at `path`, failing if the path was removed or is empty.
    pub(crate) fn require_node(&self, path: PathId) -> Result<NodeId, TraverseError> {
        let data = &self.paths[path.index()];
        if data.removed {
            return Err(TraverseError::PathRemoved {
                kind: self.describe(path),
            });
        }
        data.node.ok_or_else(|| TraverseError::NoContainer {
            kind: "<empty>".to_string(),
            location: data.location.to_string(),
        })
    }

    pub(crate) fn assert_unremoved(&self, path: PathId) -> Result<(), TraverseError> {
        if self.is_removed(path) {
            return Err(TraverseError::PathRemoved {
                kind: self.describe(path),
            });
        }
        Ok(())
    }

    /// Node kind (or `<empty>`) for error messages.
    pub(crate) fn describe(&self, path: PathId) -> String {
        match self.path_node(path) {
            Some(node) => self.arena.kind(node).to_string(),
            None => "<empty>".to_string(),
        }
    }

    // ========================================================================
    // Resync
    // ========================================================================

    /// Bring `path` back in line with the tree.
    ///
    /// The parent node is re-read from the parent path, and the node is looked
    /// up again in its container: if it moved within a list the index follows
    /// it, and if it left the container the path is marked detached. An empty
    /// path re-reads its slot.
    pub fn resync(&mut self, path: PathId) {
        if self.is_removed(path) {
            return;
        }
        self.resync_parent(path);
        self.resync_key(path);
    }

    fn resync_parent(&mut self, path: PathId) {
        let data = &self.paths[path.index()];
        let Some(parent_path) = data.parent_path else {
            return;
        };
        let Some(parent_node) = self.paths[parent_path.index()].node else {
            return;
        };
        let location = data.location;
        if location.parent() != Some(parent_node) {
            trace!(%path, %parent_node, "resync: parent changed");
            self.rehome(path, parent_path, location.with_parent(parent_node));
        }
    }

    fn resync_key(&mut self, path: PathId) {
        let data = &self.paths[path.index()];
        let location = data.location;
        let current = self.read_location(location);
        let Some(node) = data.node else {
            if current.is_some() {
                self.rekey(path, current);
            }
            return;
        };
        if current == Some(node) {
            return;
        }
        let found = match location {
            Location::Root => None,
            Location::Element { parent, field, .. } => self
                .arena
                .list(parent, field)
                .iter()
                .position(|id| *id == node)
                .map(|index| Location::Element {
                    parent,
                    field,
                    index,
                }),
            Location::Field { parent, .. } => {
                self.arena
                    .position_of(parent, node)
                    .map(|(field, index)| match index {
                        Some(index) => Location::Element {
                            parent,
                            field,
                            index,
                        },
                        None => Location::Field { parent, field },
                    })
            }
        };
        let data = &mut self.paths[path.index()];
        match found {
            Some(location) => {
                data.location = location;
                data.detached = false;
            }
            None => data.detached = true,
        }
    }

    // ========================================================================
    // Direct slot assignment
    // ========================================================================

    /// Assign slot `field` of the node at `path`, validated by the catalog.
    ///
    /// Bindings owned by the old contents are released and the new contents
    /// are registered with the enclosing scope.
    pub fn set(
        &mut self,
        path: PathId,
        field: Field,
        value: impl Into<Child>,
    ) -> Result<(), TraverseError> {
        self.resync(path);
        let node = self.require_node(path)?;
        let value = value.into();
        scopewalk_ast::validate_slot(&self.arena, self.arena.kind(node), field, &value)?;

        let old: Vec<NodeId> = self.arena.slot(node, field)?.nodes().collect();
        let gone: Vec<NodeId> = old
            .iter()
            .copied()
            .filter(|id| !value.nodes().any(|new| new == *id))
            .collect();
        let orphans = self.release_subtrees(&gone);
        self.arena.set_child(node, field, value.clone())?;
        for id in gone {
            if let Some(stale) = self.path_cache.remove(&(Some(node), id)) {
                self.paths[stale.index()].detached = true;
            }
        }

        let locations: Vec<Location> = match &value {
            Child::None | Child::Node(_) => vec![Location::Field {
                parent: node,
                field,
            }],
            Child::List(ids) => (0..ids.len())
                .map(|index| Location::Element {
                    parent: node,
                    field,
                    index,
                })
                .collect(),
        };
        for location in locations {
            let child = self.path_at(Some(path), location);
            if let Some(id) = self.path_node(child) {
                if !old.contains(&id) {
                    self.adopt_subtree(child)?;
                }
            }
        }
        self.settle_orphans(orphans)
    }

    // ========================================================================
    // Per-path data and flags
    // ========================================================================

    pub fn set_data(&mut self, path: PathId, key: &str, value: Value) {
        self.paths[path.index()].data.insert(key.to_string(), value);
    }

    pub fn get_data(&self, path: PathId, key: &str) -> Option<&Value> {
        self.paths[path.index()].data.get(key)
    }

    pub fn has_data(&self, path: PathId, key: &str) -> bool {
        self.paths[path.index()].data.contains_key(key)
    }

    /// Do not descend into the node at `path` (its exit callbacks still run).
    pub fn skip(&mut self, path: PathId) {
        self.paths[path.index()].should_skip = true;
    }

    /// Stop the traversal after the current callback.
    pub fn stop(&mut self, path: PathId) {
        let data = &mut self.paths[path.index()];
        data.should_skip = true;
        data.should_stop = true;
    }

    /// Do not descend into slot `field` of the node at `path`.
    pub fn skip_key(&mut self, path: PathId, field: Field) {
        self.paths[path.index()].skip_keys.insert(field);
    }

    pub fn should_skip(&self, path: PathId) -> bool {
        self.paths[path.index()].should_skip
    }

    pub fn should_stop(&self, path: PathId) -> bool {
        self.paths[path.index()].should_stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TraverseOptions;
    use serde_json::json;

    fn session() -> Session {
        let tree = json!({
            "type": "Program",
            "body": [
                { "type": "EmptyStatement" },
                { "type": "DebuggerStatement" },
                { "type": "ReturnStatement", "argument": null }
            ]
        });
        Session::from_json(&tree, TraverseOptions::default()).unwrap()
    }

    #[test]
    fn same_location_same_path() {
        let mut session = session();
        let root = session.root_path();
        let location = Location::Element {
            parent: session.root(),
            field: Field::Body,
            index: 1,
        };
        let first = session.path_at(Some(root), location);
        let second = session.path_at(Some(root), location);
        assert_eq!(first, second);
        assert_eq!(session.parent_path(first), Some(root));
    }

    #[test]
    fn resync_follows_node_after_splice() {
        let mut session = session();
        let root = session.root_path();
        let program = session.root();
        let debugger = session.path_at(
            Some(root),
            Location::Element {
                parent: program,
                field: Field::Body,
                index: 1,
            },
        );
        let node = session.path_node(debugger).unwrap();
        session
            .arena_mut()
            .splice(program, Field::Body, 0, 1, vec![])
            .unwrap();
        session.resync(debugger);
        assert_eq!(session.list_index(debugger), Some(0));
        assert_eq!(session.read_location(session.location(debugger)), Some(node));
        assert!(!session.is_detached(debugger));
    }

    #[test]
    fn resync_detaches_when_node_leaves() {
        let mut session = session();
        let root = session.root_path();
        let program = session.root();
        let first = session.path_at(
            Some(root),
            Location::Element {
                parent: program,
                field: Field::Body,
                index: 0,
            },
        );
        session
            .arena_mut()
            .splice(program, Field::Body, 0, 1, vec![])
            .unwrap();
        session.resync(first);
        assert!(session.is_detached(first));
    }

    #[test]
    fn empty_slot_paths_are_cached_by_location() {
        let mut session = session();
        let root = session.root_path();
        let program = session.root();
        let ret = session.path_at(
            Some(root),
            Location::Element {
                parent: program,
                field: Field::Body,
                index: 2,
            },
        );
        let ret_node = session.path_node(ret).unwrap();
        let location = Location::Field {
            parent: ret_node,
            field: Field::Argument,
        };
        let argument = session.path_at(Some(ret), location);
        assert_eq!(session.path_node(argument), None);
        assert_eq!(session.path_at(Some(ret), location), argument);
    }
}
