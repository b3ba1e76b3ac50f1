// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Side-effect questions: can an expression be repeated or dropped?

use scopewalk_ast::validators;
use scopewalk_ast::{Alias, Field, NodeId, NodeKind};

use crate::scope::{HasBindingOptions, ScopeId};
use crate::session::Session;

const NO_GLOBALS: HasBindingOptions = HasBindingOptions {
    no_globals: true,
    no_uids: false,
};

impl Session {
    /// `this`, `super`, an identifier bound to a constant binding, or an
    /// unbound identifier (an opaque global).
    pub fn is_static(&self, scope: ScopeId, node: NodeId) -> bool {
        match self.arena.kind(node) {
            NodeKind::ThisExpression | NodeKind::Super => true,
            NodeKind::Identifier => {
                let Some(name) = self.arena.name(node) else {
                    return false;
                };
                match self.get_binding(scope, name) {
                    Some(binding) => self.binding(binding).is_constant(),
                    None => true,
                }
            }
            _ => false,
        }
    }

    /// Evaluating `node` has no side effects.
    ///
    /// With `constants_only`, identifiers count only when their binding is
    /// never reassigned.
    pub fn is_pure(&self, scope: ScopeId, node: NodeId, constants_only: bool) -> bool {
        let arena = &self.arena;
        let record = arena.get(node);
        let pure = |child: Option<NodeId>| child.map_or(true, |child| self.is_pure(scope, child, constants_only));
        let all_pure = |field: Field| {
            arena
                .list(node, field)
                .iter()
                .all(|child| self.is_pure(scope, *child, constants_only))
        };
        let kind = record.kind();
        match kind {
            NodeKind::Identifier => {
                let Some(binding) = record.name().and_then(|name| self.get_binding(scope, name)) else {
                    return false;
                };
                !constants_only || self.binding(binding).is_constant()
            }
            NodeKind::ThisExpression | NodeKind::MetaProperty => true,
            NodeKind::ClassDeclaration | NodeKind::ClassExpression => {
                pure(arena.child(node, Field::SuperClass)) && pure(arena.child(node, Field::Body))
            }
            NodeKind::ClassBody => all_pure(Field::Body),
            NodeKind::ArrayExpression => all_pure(Field::Elements),
            NodeKind::ObjectExpression => all_pure(Field::Properties),
            NodeKind::TemplateLiteral => all_pure(Field::Expressions),
            NodeKind::UnaryExpression => pure(arena.child(node, Field::Argument)),
            NodeKind::TaggedTemplateExpression => {
                arena
                    .child(node, Field::Tag)
                    .is_some_and(|tag| validators::matches_pattern(arena, tag, "String.raw", false))
                    && !self.has_binding(scope, "String", NO_GLOBALS)
                    && pure(arena.child(node, Field::Quasi))
            }
            NodeKind::MemberExpression => {
                let object = arena.child(node, Field::Object);
                let property = arena.child(node, Field::Property);
                !record.flags.computed
                    && object.and_then(|object| arena.name(object)) == Some("Symbol")
                    && property
                        .and_then(|property| arena.name(property))
                        .is_some_and(|name| name != "for")
                    && !self.has_binding(scope, "Symbol", NO_GLOBALS)
            }
            NodeKind::CallExpression => {
                let arguments = arena.list(node, Field::Arguments);
                arena
                    .child(node, Field::Callee)
                    .is_some_and(|callee| validators::matches_pattern(arena, callee, "Symbol.for", false))
                    && !self.has_binding(scope, "Symbol", NO_GLOBALS)
                    && arguments.len() == 1
                    && arena.kind(arguments[0]) == NodeKind::StringLiteral
            }
            _ if kind.has_alias(Alias::Binary) => {
                pure(arena.child(node, Field::Left)) && pure(arena.child(node, Field::Right))
            }
            _ if kind.has_alias(Alias::Method) => {
                !record.flags.computed || pure(arena.child(node, Field::Key))
            }
            _ if kind.has_alias(Alias::Property) => {
                if record.flags.computed && !pure(arena.child(node, Field::Key)) {
                    return false;
                }
                if kind == NodeKind::ObjectProperty || record.flags.is_static {
                    return pure(arena.child(node, Field::Value));
                }
                true
            }
            _ => validators::is_pureish(arena, node),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::options::TraverseOptions;
    use crate::session::Session;
    use serde_json::json;

    fn declare(kind: &str, name: &str) -> serde_json::Value {
        json!({
            "type": "VariableDeclaration",
            "kind": kind,
            "declarations": [{
                "type": "VariableDeclarator",
                "id": { "type": "Identifier", "name": name },
                "init": { "type": "NumericLiteral", "value": 1 }
            }]
        })
    }

    fn expression(value: serde_json::Value) -> serde_json::Value {
        json!({ "type": "ExpressionStatement", "expression": value })
    }

    #[test]
    fn static_and_pure_follow_bindings() {
        let tree = json!({
            "type": "Program",
            "body": [
                declare("const", "a"),
                declare("let", "b"),
                expression(json!({
                    "type": "AssignmentExpression",
                    "operator": "=",
                    "left": { "type": "Identifier", "name": "b" },
                    "right": { "type": "NumericLiteral", "value": 2 }
                })),
                expression(json!({
                    "type": "ArrayExpression",
                    "elements": [
                        { "type": "Identifier", "name": "a" },
                        {
                            "type": "BinaryExpression",
                            "operator": "+",
                            "left": { "type": "Identifier", "name": "b" },
                            "right": { "type": "StringLiteral", "value": "x" }
                        }
                    ]
                })),
                expression(json!({
                    "type": "CallExpression",
                    "callee": { "type": "Identifier", "name": "f" },
                    "arguments": []
                }))
            ]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let scope = session.scope_of(root).unwrap();
        let array = session.get(root, "body.3.expression").unwrap().one().unwrap();
        let array = session.path_node(array).unwrap();
        let elements = session.arena().list(array, scopewalk_ast::Field::Elements).to_vec();
        let call = session.get(root, "body.4.expression").unwrap().one().unwrap();
        let call = session.path_node(call).unwrap();
        let callee = session.arena().child(call, scopewalk_ast::Field::Callee).unwrap();

        assert!(session.is_static(scope, elements[0]));
        assert!(session.is_static(scope, callee));
        assert!(session.is_pure(scope, array, false));
        assert!(!session.is_pure(scope, array, true));
        assert!(!session.is_pure(scope, call, false));
    }
}
