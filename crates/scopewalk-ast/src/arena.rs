// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Arena storage for syntax trees.
//!
//! Every node lives in a single [`NodeArena`] and is addressed by its
//! [`NodeId`]. Structural edits go through the arena so they can be checked
//! against the catalog before they land.

use crate::catalog::{is_of_type, validate_element, validate_slot, Field, NodeKind, TypeName};
use crate::error::AstError;
use crate::node::{Child, Node, NodeId};

/// Owner of all nodes of one or more trees.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its id.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Number of nodes ever allocated.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.get(id).kind()
    }

    /// Returns true if the node is `name` or belongs to alias `name`.
    pub fn is(&self, id: NodeId, name: impl Into<TypeName>) -> bool {
        is_of_type(self.kind(id), name.into())
    }

    /// `Identifier.name` of `id`, if it is an identifier.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        if self.kind(id) == NodeKind::Identifier {
            self.get(id).name()
        } else {
            None
        }
    }

    /// Rename an identifier in place. No-op for other kinds.
    pub fn set_name(&mut self, id: NodeId, name: &str) {
        let node = self.get_mut(id);
        if node.kind() == NodeKind::Identifier {
            node.value = crate::node::NodeValue::Name(name.to_string());
        }
    }

    /// The slot `field` of `id`.
    pub fn slot(&self, id: NodeId, field: Field) -> Result<&Child, AstError> {
        let node = self.get(id);
        node.slot(field).ok_or(AstError::UnknownField {
            kind: node.kind(),
            field,
        })
    }

    /// The node in single slot `field`, or `None` when empty or not a field.
    pub fn child(&self, id: NodeId, field: Field) -> Option<NodeId> {
        self.get(id).slot(field).and_then(Child::as_node)
    }

    /// The elements of list slot `field`; empty when not a list field.
    pub fn list(&self, id: NodeId, field: Field) -> &[NodeId] {
        self.get(id).slot(field).map(Child::as_list).unwrap_or(&[])
    }

    /// Element `index` of list slot `field`.
    pub fn element(&self, id: NodeId, field: Field, index: usize) -> Option<NodeId> {
        self.list(id, field).get(index).copied()
    }

    fn slot_mut(&mut self, id: NodeId, field: Field) -> Result<&mut Child, AstError> {
        let kind = self.kind(id);
        let index = kind
            .field_index(field)
            .ok_or(AstError::UnknownField { kind, field })?;
        Ok(&mut self.get_mut(id).children[index])
    }

    /// Replace slot `field` of `id` after validating `value` against the catalog.
    ///
    /// Returns the previous contents of the slot.
    pub fn set_child(
        &mut self,
        id: NodeId,
        field: Field,
        value: impl Into<Child>,
    ) -> Result<Child, AstError> {
        let value = value.into();
        validate_slot(self, self.kind(id), field, &value)?;
        let slot = self.slot_mut(id, field)?;
        Ok(std::mem::replace(slot, value))
    }

    /// Overwrite element `index` of list slot `field`, returning the old element.
    pub fn set_element(
        &mut self,
        id: NodeId,
        field: Field,
        index: usize,
        value: NodeId,
    ) -> Result<NodeId, AstError> {
        validate_element(self, self.kind(id), field, value)?;
        match self.slot_mut(id, field)? {
            Child::List(ids) if index < ids.len() => Ok(std::mem::replace(&mut ids[index], value)),
            _ => Err(AstError::IndexOutOfBounds {
                parent: id,
                field,
                index,
            }),
        }
    }

    /// Remove `remove` elements starting at `start` from list slot `field`
    /// and insert `insert` in their place. Returns the removed elements.
    pub fn splice(
        &mut self,
        id: NodeId,
        field: Field,
        start: usize,
        remove: usize,
        insert: Vec<NodeId>,
    ) -> Result<Vec<NodeId>, AstError> {
        for candidate in &insert {
            validate_element(self, self.kind(id), field, *candidate)?;
        }
        match self.slot_mut(id, field)? {
            Child::List(ids) if start + remove <= ids.len() => {
                Ok(ids.splice(start..start + remove, insert).collect())
            }
            _ => Err(AstError::IndexOutOfBounds {
                parent: id,
                field,
                index: start + remove,
            }),
        }
    }

    /// Direct children of `id`, in visitor-key order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id)
            .slots()
            .flat_map(|(_, child)| child.nodes().collect::<Vec<_>>())
            .collect()
    }

    /// Where `child` sits inside `parent`: the field and, for lists, the index.
    pub fn position_of(&self, parent: NodeId, child: NodeId) -> Option<(Field, Option<usize>)> {
        for (field, slot) in self.get(parent).slots() {
            match slot {
                Child::Node(id) if *id == child => return Some((field, None)),
                Child::List(ids) => {
                    if let Some(index) = ids.iter().position(|id| *id == child) {
                        return Some((field, Some(index)));
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// `id` and all nodes below it, pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            let children = self.children(next);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Deep-copy the subtree rooted at `id` (comments and spans included).
    pub fn clone_deep(&mut self, id: NodeId) -> NodeId {
        let mut copy = self.get(id).clone();
        let children = std::mem::take(&mut copy.children);
        let mut cloned = Vec::with_capacity(children.len());
        for child in children {
            cloned.push(match child {
                Child::None => Child::None,
                Child::Node(inner) => Child::Node(self.clone_deep(inner)),
                Child::List(ids) => {
                    let mut copies = Vec::with_capacity(ids.len());
                    for inner in ids {
                        copies.push(self.clone_deep(inner));
                    }
                    Child::List(copies)
                }
            });
        }
        copy.children = cloned;
        self.alloc(copy)
    }

    /// Returns true if `id` or any descendant is of type `name`, without
    /// descending into nodes matching one of `denylist`.
    pub fn has_type(&self, id: NodeId, name: TypeName, denylist: &[TypeName]) -> bool {
        let kind = self.kind(id);
        if denylist.iter().any(|deny| is_of_type(kind, *deny)) {
            return false;
        }
        if is_of_type(kind, name) {
            return true;
        }
        self.children(id)
            .into_iter()
            .any(|child| self.has_type(child, name, denylist))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build;

    fn statement(arena: &mut NodeArena, name: &str) -> NodeId {
        let ident = build::identifier(arena, name);
        build::expression_statement(arena, ident).unwrap()
    }

    #[test]
    fn set_child_validates_against_catalog() {
        let mut arena = NodeArena::new();
        let stmt = build::empty_statement(&mut arena);
        let ident = build::identifier(&mut arena, "x");
        let ret = build::return_statement(&mut arena, None).unwrap();

        assert!(arena.set_child(ret, Field::Argument, ident).is_ok());
        let err = arena.set_child(ret, Field::Argument, stmt).unwrap_err();
        assert!(matches!(err, AstError::InvalidSlot { field: Field::Argument, .. }));
        let err = arena.set_child(ret, Field::Body, ident).unwrap_err();
        assert!(matches!(err, AstError::UnknownField { .. }));
    }

    #[test]
    fn splice_shifts_elements() {
        let mut arena = NodeArena::new();
        let a = statement(&mut arena, "a");
        let b = statement(&mut arena, "b");
        let c = statement(&mut arena, "c");
        let program = build::program(&mut arena, vec![a, c]).unwrap();

        let removed = arena.splice(program, Field::Body, 1, 0, vec![b]).unwrap();
        assert!(removed.is_empty());
        assert_eq!(arena.list(program, Field::Body), &[a, b, c]);
        assert_eq!(arena.position_of(program, c), Some((Field::Body, Some(2))));
    }

    #[test]
    fn splice_rejects_out_of_range() {
        let mut arena = NodeArena::new();
        let program = build::program(&mut arena, vec![]).unwrap();
        let err = arena.splice(program, Field::Body, 1, 0, vec![]).unwrap_err();
        assert!(matches!(err, AstError::IndexOutOfBounds { index: 1, .. }));
    }

    #[test]
    fn clone_deep_copies_every_node() {
        let mut arena = NodeArena::new();
        let stmt = statement(&mut arena, "a");
        let copy = arena.clone_deep(stmt);
        assert_ne!(copy, stmt);
        let inner = arena.child(copy, Field::Expression).unwrap();
        assert_eq!(arena.name(inner), Some("a"));
        assert_ne!(Some(inner), arena.child(stmt, Field::Expression));
    }

    #[test]
    fn has_type_respects_denylist() {
        let mut arena = NodeArena::new();
        let body = statement(&mut arena, "a");
        let block = build::block_statement(&mut arena, vec![body]).unwrap();
        let func = build::function_expression(&mut arena, None, vec![], block).unwrap();
        let name = TypeName::Kind(NodeKind::Identifier);
        assert!(arena.has_type(func, name, &[]));
        assert!(!arena.has_type(
            func,
            name,
            &[TypeName::Alias(crate::catalog::Alias::Function)]
        ));
    }
}
