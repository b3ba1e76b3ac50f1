// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Node builders.
//!
//! Leaf builders cannot fail and return the new [`NodeId`] directly. Builders
//! that take children validate every slot and return `Result`.

use crate::arena::NodeArena;
use crate::catalog::{Field, NodeKind};
use crate::error::AstError;
use crate::node::{Child, DeclarationKind, Node, NodeId, NodeValue};

fn compose(
    arena: &mut NodeArena,
    node: Node,
    slots: Vec<(Field, Child)>,
) -> Result<NodeId, AstError> {
    let id = arena.alloc(node);
    for (field, child) in slots {
        arena.set_child(id, field, child)?;
    }
    Ok(id)
}

pub fn identifier(arena: &mut NodeArena, name: &str) -> NodeId {
    arena.alloc(Node::with_value(
        NodeKind::Identifier,
        NodeValue::Name(name.to_string()),
    ))
}

pub fn string_literal(arena: &mut NodeArena, value: &str) -> NodeId {
    arena.alloc(Node::with_value(
        NodeKind::StringLiteral,
        NodeValue::String(value.to_string()),
    ))
}

pub fn numeric_literal(arena: &mut NodeArena, value: f64) -> NodeId {
    arena.alloc(Node::with_value(
        NodeKind::NumericLiteral,
        NodeValue::Number(value),
    ))
}

pub fn boolean_literal(arena: &mut NodeArena, value: bool) -> NodeId {
    arena.alloc(Node::with_value(
        NodeKind::BooleanLiteral,
        NodeValue::Boolean(value),
    ))
}

pub fn null_literal(arena: &mut NodeArena) -> NodeId {
    arena.alloc(Node::new(NodeKind::NullLiteral))
}

pub fn this_expression(arena: &mut NodeArena) -> NodeId {
    arena.alloc(Node::new(NodeKind::ThisExpression))
}

pub fn empty_statement(arena: &mut NodeArena) -> NodeId {
    arena.alloc(Node::new(NodeKind::EmptyStatement))
}

/// `void 0`, the canonical `undefined`.
pub fn undefined(arena: &mut NodeArena) -> Result<NodeId, AstError> {
    let zero = numeric_literal(arena, 0.0);
    unary_expression(arena, "void", zero)
}

pub fn program(arena: &mut NodeArena, body: Vec<NodeId>) -> Result<NodeId, AstError> {
    compose(
        arena,
        Node::new(NodeKind::Program),
        vec![(Field::Body, Child::List(body))],
    )
}

pub fn expression_statement(arena: &mut NodeArena, expression: NodeId) -> Result<NodeId, AstError> {
    compose(
        arena,
        Node::new(NodeKind::ExpressionStatement),
        vec![(Field::Expression, Child::Node(expression))],
    )
}

pub fn block_statement(arena: &mut NodeArena, body: Vec<NodeId>) -> Result<NodeId, AstError> {
    compose(
        arena,
        Node::new(NodeKind::BlockStatement),
        vec![(Field::Body, Child::List(body))],
    )
}

pub fn return_statement(
    arena: &mut NodeArena,
    argument: Option<NodeId>,
) -> Result<NodeId, AstError> {
    compose(
        arena,
        Node::new(NodeKind::ReturnStatement),
        vec![(Field::Argument, argument.into())],
    )
}

pub fn variable_declaration(
    arena: &mut NodeArena,
    kind: DeclarationKind,
    declarations: Vec<NodeId>,
) -> Result<NodeId, AstError> {
    compose(
        arena,
        Node::with_value(NodeKind::VariableDeclaration, NodeValue::Declaration(kind)),
        vec![(Field::Declarations, Child::List(declarations))],
    )
}

pub fn variable_declarator(
    arena: &mut NodeArena,
    id: NodeId,
    init: Option<NodeId>,
) -> Result<NodeId, AstError> {
    compose(
        arena,
        Node::new(NodeKind::VariableDeclarator),
        vec![(Field::Id, Child::Node(id)), (Field::Init, init.into())],
    )
}

pub fn call_expression(
    arena: &mut NodeArena,
    callee: NodeId,
    arguments: Vec<NodeId>,
) -> Result<NodeId, AstError> {
    compose(
        arena,
        Node::new(NodeKind::CallExpression),
        vec![
            (Field::Callee, Child::Node(callee)),
            (Field::Arguments, Child::List(arguments)),
        ],
    )
}

pub fn member_expression(
    arena: &mut NodeArena,
    object: NodeId,
    property: NodeId,
    computed: bool,
) -> Result<NodeId, AstError> {
    let mut node = Node::new(NodeKind::MemberExpression);
    node.flags.computed = computed;
    compose(
        arena,
        node,
        vec![
            (Field::Object, Child::Node(object)),
            (Field::Property, Child::Node(property)),
        ],
    )
}

pub fn arrow_function_expression(
    arena: &mut NodeArena,
    params: Vec<NodeId>,
    body: NodeId,
) -> Result<NodeId, AstError> {
    compose(
        arena,
        Node::new(NodeKind::ArrowFunctionExpression),
        vec![
            (Field::Params, Child::List(params)),
            (Field::Body, Child::Node(body)),
        ],
    )
}

pub fn function_expression(
    arena: &mut NodeArena,
    id: Option<NodeId>,
    params: Vec<NodeId>,
    body: NodeId,
) -> Result<NodeId, AstError> {
    compose(
        arena,
        Node::new(NodeKind::FunctionExpression),
        vec![
            (Field::Id, id.into()),
            (Field::Params, Child::List(params)),
            (Field::Body, Child::Node(body)),
        ],
    )
}

pub fn assignment_expression(
    arena: &mut NodeArena,
    operator: &str,
    left: NodeId,
    right: NodeId,
) -> Result<NodeId, AstError> {
    compose(
        arena,
        Node::with_value(
            NodeKind::AssignmentExpression,
            NodeValue::Operator(operator.to_string()),
        ),
        vec![
            (Field::Left, Child::Node(left)),
            (Field::Right, Child::Node(right)),
        ],
    )
}

pub fn sequence_expression(
    arena: &mut NodeArena,
    expressions: Vec<NodeId>,
) -> Result<NodeId, AstError> {
    compose(
        arena,
        Node::new(NodeKind::SequenceExpression),
        vec![(Field::Expressions, Child::List(expressions))],
    )
}

pub fn conditional_expression(
    arena: &mut NodeArena,
    test: NodeId,
    consequent: NodeId,
    alternate: NodeId,
) -> Result<NodeId, AstError> {
    compose(
        arena,
        Node::new(NodeKind::ConditionalExpression),
        vec![
            (Field::Test, Child::Node(test)),
            (Field::Consequent, Child::Node(consequent)),
            (Field::Alternate, Child::Node(alternate)),
        ],
    )
}

pub fn unary_expression(
    arena: &mut NodeArena,
    operator: &str,
    argument: NodeId,
) -> Result<NodeId, AstError> {
    let mut node = Node::with_value(
        NodeKind::UnaryExpression,
        NodeValue::Operator(operator.to_string()),
    );
    node.flags.prefix = true;
    compose(arena, node, vec![(Field::Argument, Child::Node(argument))])
}

pub fn array_expression(
    arena: &mut NodeArena,
    elements: Vec<NodeId>,
) -> Result<NodeId, AstError> {
    compose(
        arena,
        Node::new(NodeKind::ArrayExpression),
        vec![(Field::Elements, Child::List(elements))],
    )
}

pub fn await_expression(arena: &mut NodeArena, argument: NodeId) -> Result<NodeId, AstError> {
    compose(
        arena,
        Node::new(NodeKind::AwaitExpression),
        vec![(Field::Argument, Child::Node(argument))],
    )
}

pub fn yield_expression(
    arena: &mut NodeArena,
    argument: Option<NodeId>,
    delegate: bool,
) -> Result<NodeId, AstError> {
    let mut node = Node::new(NodeKind::YieldExpression);
    node.flags.delegate = delegate;
    compose(arena, node, vec![(Field::Argument, argument.into())])
}

pub fn export_specifier(
    arena: &mut NodeArena,
    local: NodeId,
    exported: NodeId,
) -> Result<NodeId, AstError> {
    compose(
        arena,
        Node::new(NodeKind::ExportSpecifier),
        vec![
            (Field::Local, Child::Node(local)),
            (Field::Exported, Child::Node(exported)),
        ],
    )
}

pub fn export_named_declaration(
    arena: &mut NodeArena,
    declaration: Option<NodeId>,
    specifiers: Vec<NodeId>,
) -> Result<NodeId, AstError> {
    compose(
        arena,
        Node::new(NodeKind::ExportNamedDeclaration),
        vec![
            (Field::Declaration, declaration.into()),
            (Field::Specifiers, Child::List(specifiers)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_fill_slots() {
        let mut arena = NodeArena::new();
        let id = identifier(&mut arena, "x");
        let init = numeric_literal(&mut arena, 1.0);
        let declarator = variable_declarator(&mut arena, id, Some(init)).unwrap();
        let declaration =
            variable_declaration(&mut arena, DeclarationKind::Let, vec![declarator]).unwrap();

        assert_eq!(arena.list(declaration, Field::Declarations), &[declarator]);
        assert_eq!(arena.child(declarator, Field::Init), Some(init));
        assert_eq!(
            arena.get(declaration).declaration_kind(),
            Some(DeclarationKind::Let)
        );
    }

    #[test]
    fn builders_reject_misplaced_children() {
        let mut arena = NodeArena::new();
        let stmt = empty_statement(&mut arena);
        let err = call_expression(&mut arena, stmt, vec![]).unwrap_err();
        assert!(matches!(
            err,
            AstError::InvalidSlot {
                parent: NodeKind::CallExpression,
                field: Field::Callee,
                ..
            }
        ));
    }

    #[test]
    fn undefined_is_void_zero() {
        let mut arena = NodeArena::new();
        let node = undefined(&mut arena).unwrap();
        assert_eq!(arena.kind(node), NodeKind::UnaryExpression);
        assert_eq!(arena.get(node).operator(), Some("void"));
        let zero = arena.child(node, Field::Argument).unwrap();
        assert_eq!(arena.kind(zero), NodeKind::NumericLiteral);
    }
}
