// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Node storage types.
//!
//! A [`Node`] is a tagged record: its [`NodeKind`], a scalar payload
//! ([`NodeValue`]), a handful of boolean flags, comments, and one [`Child`]
//! entry per catalog field, stored in catalog order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{Field, NodeKind};

/// Stable identity of a node inside a [`NodeArena`](crate::NodeArena).
///
/// Ids are never reused: a node that is detached from the tree keeps its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId.
    pub fn new(id: u32) -> Self {
        NodeId(id)
    }

    /// Index into the arena's node vector.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// The contents of one child slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Child {
    /// Empty single slot.
    #[default]
    None,
    /// Single slot holding a node.
    Node(NodeId),
    /// List slot.
    List(Vec<NodeId>),
}

impl Child {
    /// The node in a single slot, if any.
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Child::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// The elements of a list slot; empty for single slots.
    pub fn as_list(&self) -> &[NodeId] {
        match self {
            Child::List(ids) => ids,
            _ => &[],
        }
    }

    /// Returns true if this is a list slot.
    pub fn is_list(&self) -> bool {
        matches!(self, Child::List(_))
    }

    /// Returns true for an empty single slot or an empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            Child::None => true,
            Child::Node(_) => false,
            Child::List(ids) => ids.is_empty(),
        }
    }

    /// Every node held by this slot, in order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        let single = self.as_node();
        single.into_iter().chain(self.as_list().iter().copied())
    }
}

impl From<NodeId> for Child {
    fn from(id: NodeId) -> Self {
        Child::Node(id)
    }
}

impl From<Option<NodeId>> for Child {
    fn from(id: Option<NodeId>) -> Self {
        match id {
            Some(id) => Child::Node(id),
            None => Child::None,
        }
    }
}

impl From<Vec<NodeId>> for Child {
    fn from(ids: Vec<NodeId>) -> Self {
        Child::List(ids)
    }
}

/// `var`, `let` or `const`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Var,
    Let,
    Const,
}

impl DeclarationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclarationKind::Var => "var",
            DeclarationKind::Let => "let",
            DeclarationKind::Const => "const",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "var" => Some(DeclarationKind::Var),
            "let" => Some(DeclarationKind::Let),
            "const" => Some(DeclarationKind::Const),
            _ => None,
        }
    }
}

/// The `kind` of a class or object method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Constructor,
    Method,
    Get,
    Set,
}

impl MethodKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MethodKind::Constructor => "constructor",
            MethodKind::Method => "method",
            MethodKind::Get => "get",
            MethodKind::Set => "set",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "constructor" => Some(MethodKind::Constructor),
            "method" => Some(MethodKind::Method),
            "get" => Some(MethodKind::Get),
            "set" => Some(MethodKind::Set),
            _ => None,
        }
    }
}

/// Scalar payload of a node.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodeValue {
    #[default]
    None,
    /// `Identifier.name`.
    Name(String),
    /// `StringLiteral.value`.
    String(String),
    /// `NumericLiteral.value`.
    Number(f64),
    /// `BooleanLiteral.value`.
    Boolean(bool),
    /// `RegExpLiteral` pattern and flags.
    Regex { pattern: String, flags: String },
    /// `BigIntLiteral.value`, digits only.
    BigInt(String),
    /// Operator of unary, update, binary, logical and assignment expressions.
    Operator(String),
    /// `VariableDeclaration.kind`.
    Declaration(DeclarationKind),
    /// `ClassMethod.kind` / `ObjectMethod.kind`.
    Method(MethodKind),
    /// `TemplateElement.value`.
    Template { raw: String, cooked: Option<String> },
}

/// Boolean attributes carried by some node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeFlags {
    pub computed: bool,
    pub shorthand: bool,
    pub is_static: bool,
    pub is_async: bool,
    pub generator: bool,
    pub prefix: bool,
    pub delegate: bool,
    pub tail: bool,
    pub optional: bool,
}

/// Comment flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentKind {
    Line,
    Block,
}

/// A comment attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comment {
    pub kind: CommentKind,
    pub value: String,
}

impl Comment {
    pub fn line(value: impl Into<String>) -> Self {
        Comment {
            kind: CommentKind::Line,
            value: value.into(),
        }
    }

    pub fn block(value: impl Into<String>) -> Self {
        Comment {
            kind: CommentKind::Block,
            value: value.into(),
        }
    }
}

/// Source byte range, when the tree came from a parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    pub value: NodeValue,
    pub flags: NodeFlags,
    pub(crate) children: Vec<Child>,
    pub leading_comments: Vec<Comment>,
    pub trailing_comments: Vec<Comment>,
    pub span: Option<Span>,
}

impl Node {
    /// Create a node of `kind` with every slot empty.
    pub fn new(kind: NodeKind) -> Self {
        let children = kind
            .fields()
            .iter()
            .map(|spec| {
                if spec.list {
                    Child::List(Vec::new())
                } else {
                    Child::None
                }
            })
            .collect();
        Node {
            kind,
            value: NodeValue::None,
            flags: NodeFlags::default(),
            children,
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
            span: None,
        }
    }

    /// Create a node with a scalar payload.
    pub fn with_value(kind: NodeKind, value: NodeValue) -> Self {
        let mut node = Node::new(kind);
        node.value = value;
        node
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The slot for `field`, or `None` if this kind has no such field.
    pub fn slot(&self, field: Field) -> Option<&Child> {
        self.kind
            .field_index(field)
            .and_then(|index| self.children.get(index))
    }

    /// Every slot paired with its field, in visitor-key order.
    pub fn slots(&self) -> impl Iterator<Item = (Field, &Child)> {
        self.kind
            .fields()
            .iter()
            .map(|spec| spec.field)
            .zip(self.children.iter())
    }

    /// `Identifier.name`, if this is an identifier.
    pub fn name(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Operator string for operator-carrying expressions.
    pub fn operator(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Operator(op) => Some(op),
            _ => None,
        }
    }

    /// `VariableDeclaration.kind`.
    pub fn declaration_kind(&self) -> Option<DeclarationKind> {
        match self.value {
            NodeValue::Declaration(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn has_comments(&self) -> bool {
        !self.leading_comments.is_empty() || !self.trailing_comments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_has_one_slot_per_field() {
        let node = Node::new(NodeKind::ForStatement);
        let fields: Vec<Field> = node.slots().map(|(field, _)| field).collect();
        assert_eq!(
            fields,
            vec![Field::Init, Field::Test, Field::Update, Field::Body]
        );
        assert!(node.slots().all(|(_, child)| child.is_empty()));
    }

    #[test]
    fn list_fields_start_as_empty_lists() {
        let node = Node::new(NodeKind::Program);
        assert_eq!(node.slot(Field::Body), Some(&Child::List(Vec::new())));
        assert_eq!(node.slot(Field::Id), None);
    }

    #[test]
    fn child_nodes_iterates_single_and_list() {
        let single = Child::Node(NodeId(3));
        let list = Child::List(vec![NodeId(1), NodeId(2)]);
        assert_eq!(single.nodes().collect::<Vec<_>>(), vec![NodeId(3)]);
        assert_eq!(list.nodes().collect::<Vec<_>>(), vec![NodeId(1), NodeId(2)]);
        assert_eq!(Child::None.nodes().count(), 0);
    }
}
