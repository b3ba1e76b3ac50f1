// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Structural queries over nodes: reference/binding position checks, binding
//! identifier discovery, scope boundaries, and identifier helpers.
//!
//! These look only at a node and its immediate parents; they know nothing
//! about scopes or paths.

use indexmap::IndexMap;

use crate::arena::NodeArena;
use crate::catalog::{Alias, Field, NodeKind};
use crate::node::{DeclarationKind, NodeId, NodeValue};

/// Names introduced by a construct, each with every identifier node that
/// introduces it, in discovery order.
pub type BindingIdentifiers = IndexMap<String, Vec<NodeId>>;

fn field_of(arena: &NodeArena, parent: NodeId, node: NodeId) -> Option<Field> {
    arena.position_of(parent, node).map(|(field, _)| field)
}

/// Returns true if `node`, sitting inside `parent`, is read as a value.
///
/// `grandparent` is needed to tell object-literal properties apart from
/// destructuring patterns and to recognise re-exports.
pub fn is_referenced(
    arena: &NodeArena,
    node: NodeId,
    parent: NodeId,
    grandparent: Option<NodeId>,
) -> bool {
    let field = field_of(arena, parent, node);
    let computed = arena.get(parent).flags.computed;
    match arena.kind(parent) {
        NodeKind::MemberExpression => match field {
            Some(Field::Property) => computed,
            Some(Field::Object) => true,
            _ => false,
        },
        NodeKind::VariableDeclarator => field == Some(Field::Init),
        NodeKind::ArrowFunctionExpression => field == Some(Field::Body),
        NodeKind::ClassMethod | NodeKind::ObjectMethod => {
            field == Some(Field::Key) && computed
        }
        NodeKind::ObjectProperty => {
            if field == Some(Field::Key) {
                return computed;
            }
            !grandparent.is_some_and(|gp| arena.kind(gp) == NodeKind::ObjectPattern)
        }
        NodeKind::ClassProperty => {
            if field == Some(Field::Key) {
                computed
            } else {
                true
            }
        }
        NodeKind::ClassDeclaration | NodeKind::ClassExpression => {
            field == Some(Field::SuperClass)
        }
        NodeKind::AssignmentExpression | NodeKind::AssignmentPattern => {
            field == Some(Field::Right)
        }
        NodeKind::LabeledStatement
        | NodeKind::CatchClause
        | NodeKind::RestElement
        | NodeKind::BreakStatement
        | NodeKind::ContinueStatement
        | NodeKind::FunctionDeclaration
        | NodeKind::FunctionExpression
        | NodeKind::ImportDefaultSpecifier
        | NodeKind::ImportNamespaceSpecifier
        | NodeKind::ImportSpecifier
        | NodeKind::ObjectPattern
        | NodeKind::ArrayPattern
        | NodeKind::MetaProperty => false,
        NodeKind::ExportSpecifier => {
            let reexport = grandparent
                .is_some_and(|gp| arena.child(gp, Field::Source).is_some());
            !reexport && field == Some(Field::Local)
        }
        _ => true,
    }
}

/// Returns true if `node` is in a position that introduces a binding.
pub fn is_binding(
    arena: &NodeArena,
    node: NodeId,
    parent: NodeId,
    grandparent: Option<NodeId>,
) -> bool {
    if arena.kind(node) == NodeKind::Identifier
        && arena.kind(parent) == NodeKind::ObjectProperty
        && grandparent.is_some_and(|gp| arena.kind(gp) == NodeKind::ObjectExpression)
    {
        return false;
    }
    arena
        .kind(parent)
        .binding_keys()
        .iter()
        .any(|field| match arena.get(parent).slot(*field) {
            Some(slot) => slot.nodes().any(|child| child == node),
            None => false,
        })
}

/// `var` declarations.
pub fn is_var(arena: &NodeArena, node: NodeId) -> bool {
    arena.kind(node) == NodeKind::VariableDeclaration
        && arena.get(node).declaration_kind() == Some(DeclarationKind::Var)
}

/// `let` and `const` declarations.
pub fn is_let(arena: &NodeArena, node: NodeId) -> bool {
    arena.kind(node) == NodeKind::VariableDeclaration
        && arena.get(node).declaration_kind() != Some(DeclarationKind::Var)
}

/// Declarations that bind in the nearest block: classes and `let`/`const`.
///
/// Function declarations are hoisted to the enclosing function instead.
pub fn is_block_scoped(arena: &NodeArena, node: NodeId) -> bool {
    arena.kind(node) == NodeKind::ClassDeclaration || is_let(arena, node)
}

/// Returns true if `node` introduces a scope when it sits under `parent`.
///
/// A function's (or catch clause's) own body block shares the function's scope.
pub fn is_scope(arena: &NodeArena, node: NodeId, parent: Option<NodeId>) -> bool {
    let kind = arena.kind(node);
    if kind == NodeKind::BlockStatement {
        if let Some(parent) = parent {
            let parent_kind = arena.kind(parent);
            if parent_kind.has_alias(Alias::Function) || parent_kind == NodeKind::CatchClause {
                return false;
            }
        }
    }
    kind.has_alias(Alias::Scopable)
}

/// Node kinds that can be duplicated without side effects on their own.
pub fn is_pureish(arena: &NodeArena, node: NodeId) -> bool {
    arena.kind(node).has_alias(Alias::Pureish)
}

/// Collect the identifiers a construct binds.
///
/// With `outer_only`, a function declaration contributes only its name and
/// function expressions contribute nothing. With `new_bindings_only`,
/// assignments, updates and `delete` are ignored.
pub fn binding_identifiers(
    arena: &NodeArena,
    node: NodeId,
    outer_only: bool,
    new_bindings_only: bool,
) -> BindingIdentifiers {
    let mut ids = BindingIdentifiers::new();
    let mut search = std::collections::VecDeque::from([node]);
    while let Some(id) = search.pop_front() {
        let kind = arena.kind(id);
        if new_bindings_only
            && matches!(
                kind,
                NodeKind::AssignmentExpression
                    | NodeKind::UnaryExpression
                    | NodeKind::UpdateExpression
            )
        {
            continue;
        }
        if kind == NodeKind::Identifier {
            if let Some(name) = arena.name(id) {
                ids.entry(name.to_string()).or_default().push(id);
            }
            continue;
        }
        if kind.has_alias(Alias::ExportDeclaration) && kind != NodeKind::ExportAllDeclaration {
            if let Some(declaration) = arena.child(id, Field::Declaration) {
                if arena.is(declaration, Alias::Declaration) {
                    search.push_back(declaration);
                }
            }
            continue;
        }
        if outer_only {
            if kind == NodeKind::FunctionDeclaration {
                if let Some(name) = arena.child(id, Field::Id) {
                    search.push_back(name);
                }
                continue;
            }
            if kind == NodeKind::FunctionExpression {
                continue;
            }
        }
        for field in kind.binding_keys() {
            if let Some(slot) = arena.get(id).slot(*field) {
                search.extend(slot.nodes());
            }
        }
    }
    ids
}

/// Identifiers written by an assignment, update, `delete` or `for-in/of` head.
pub fn assignment_identifiers(arena: &NodeArena, node: NodeId) -> IndexMap<String, NodeId> {
    let mut ids = IndexMap::new();
    let mut search = vec![node];
    while let Some(id) = search.pop() {
        let node = arena.get(id);
        match node.kind() {
            NodeKind::ArrayPattern => search.extend(arena.list(id, Field::Elements)),
            NodeKind::AssignmentExpression
            | NodeKind::AssignmentPattern
            | NodeKind::ForInStatement
            | NodeKind::ForOfStatement => search.extend(arena.child(id, Field::Left)),
            NodeKind::ObjectPattern => search.extend(arena.list(id, Field::Properties)),
            NodeKind::ObjectProperty => search.extend(arena.child(id, Field::Value)),
            NodeKind::RestElement | NodeKind::UpdateExpression => {
                search.extend(arena.child(id, Field::Argument))
            }
            NodeKind::UnaryExpression if node.operator() == Some("delete") => {
                search.extend(arena.child(id, Field::Argument))
            }
            NodeKind::Identifier => {
                if let Some(name) = node.name() {
                    ids.insert(name.to_string(), id);
                }
            }
            _ => {}
        }
    }
    ids
}

/// Match a member expression chain against a dotted pattern like `Symbol.for`.
///
/// With `allow_partial`, the chain may be longer than the pattern.
pub fn matches_pattern(arena: &NodeArena, member: NodeId, pattern: &str, allow_partial: bool) -> bool {
    if arena.kind(member) != NodeKind::MemberExpression {
        return false;
    }
    let parts: Vec<&str> = pattern.split('.').collect();
    let mut nodes = Vec::new();
    let mut current = member;
    while arena.kind(current) == NodeKind::MemberExpression {
        match (
            arena.child(current, Field::Property),
            arena.child(current, Field::Object),
        ) {
            (Some(property), Some(object)) => {
                nodes.push(property);
                current = object;
            }
            _ => return false,
        }
    }
    nodes.push(current);
    if nodes.len() < parts.len() || (!allow_partial && nodes.len() > parts.len()) {
        return false;
    }
    for (part, node) in parts.iter().zip(nodes.iter().rev()) {
        let value = match &arena.get(*node).value {
            NodeValue::Name(name) => name.as_str(),
            NodeValue::String(value) => value.as_str(),
            _ if arena.kind(*node) == NodeKind::ThisExpression => "this",
            _ => return false,
        };
        if *part != value {
            return false;
        }
    }
    true
}

const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "implements",
    "import", "in", "instanceof", "interface", "let", "new", "null", "package", "private",
    "protected", "public", "return", "static", "super", "switch", "this", "throw", "true", "try",
    "typeof", "var", "void", "while", "with", "yield", "await", "arguments", "eval",
];

fn is_identifier_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

fn is_identifier_char(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphanumeric()
}

/// Returns true for names usable as identifiers (reserved words excluded).
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => {}
        _ => return false,
    }
    chars.all(is_identifier_char) && !RESERVED_WORDS.contains(&name)
}

/// Turn an arbitrary string into a valid identifier: invalid characters become
/// word breaks, words are camel-cased, and a leading `_` is added if needed.
pub fn to_identifier(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if is_identifier_char(c) { c } else { '-' })
        .collect();
    let trimmed = replaced.trim_start_matches(|c: char| c == '-' || c.is_ascii_digit());

    let mut out = String::with_capacity(trimmed.len());
    let mut upper_next = false;
    for c in trimmed.chars() {
        if c == '-' || c.is_whitespace() {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    if !is_valid_identifier(&out) {
        out = format!("_{}", out);
    }
    if out.is_empty() {
        "_".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build;

    #[test]
    fn member_property_is_referenced_only_when_computed() {
        let mut arena = NodeArena::new();
        let object = build::identifier(&mut arena, "a");
        let property = build::identifier(&mut arena, "b");
        let member = build::member_expression(&mut arena, object, property, false).unwrap();
        assert!(is_referenced(&arena, object, member, None));
        assert!(!is_referenced(&arena, property, member, None));
        arena.get_mut(member).flags.computed = true;
        assert!(is_referenced(&arena, property, member, None));
    }

    #[test]
    fn declarator_id_is_binding_not_reference() {
        let mut arena = NodeArena::new();
        let id = build::identifier(&mut arena, "x");
        let init = build::identifier(&mut arena, "y");
        let declarator = build::variable_declarator(&mut arena, id, Some(init)).unwrap();
        assert!(is_binding(&arena, id, declarator, None));
        assert!(!is_referenced(&arena, id, declarator, None));
        assert!(is_referenced(&arena, init, declarator, None));
    }

    #[test]
    fn binding_identifiers_of_declaration() {
        let mut arena = NodeArena::new();
        let a = build::identifier(&mut arena, "a");
        let b = build::identifier(&mut arena, "b");
        let first = build::variable_declarator(&mut arena, a, None).unwrap();
        let second = build::variable_declarator(&mut arena, b, None).unwrap();
        let declaration =
            build::variable_declaration(&mut arena, DeclarationKind::Var, vec![first, second])
                .unwrap();
        let ids = binding_identifiers(&arena, declaration, false, false);
        assert_eq!(ids.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(ids["a"], vec![a]);
    }

    #[test]
    fn outer_only_skips_function_params() {
        let mut arena = NodeArena::new();
        let param = build::identifier(&mut arena, "p");
        let body = build::block_statement(&mut arena, vec![]).unwrap();
        let func = build::function_expression(&mut arena, None, vec![param], body).unwrap();
        assert_eq!(binding_identifiers(&arena, func, false, false).len(), 1);
        assert!(binding_identifiers(&arena, func, true, false).is_empty());
    }

    #[test]
    fn assignment_identifiers_of_compound_assignment() {
        let mut arena = NodeArena::new();
        let left = build::identifier(&mut arena, "n");
        let right = build::numeric_literal(&mut arena, 1.0);
        let assign = build::assignment_expression(&mut arena, "+=", left, right).unwrap();
        let ids = assignment_identifiers(&arena, assign);
        assert_eq!(ids.get("n"), Some(&left));
    }

    #[test]
    fn function_body_block_is_not_a_scope() {
        let mut arena = NodeArena::new();
        let body = build::block_statement(&mut arena, vec![]).unwrap();
        let func = build::function_expression(&mut arena, None, vec![], body).unwrap();
        assert!(is_scope(&arena, func, None));
        assert!(!is_scope(&arena, body, Some(func)));
        assert!(is_scope(&arena, body, None));
    }

    #[test]
    fn matches_member_chains() {
        let mut arena = NodeArena::new();
        let symbol = build::identifier(&mut arena, "Symbol");
        let property = build::identifier(&mut arena, "for");
        let member = build::member_expression(&mut arena, symbol, property, false).unwrap();
        assert!(matches_pattern(&arena, member, "Symbol.for", false));
        assert!(!matches_pattern(&arena, member, "Symbol.iterator", false));
        assert!(matches_pattern(&arena, member, "Symbol", true));
        assert!(!matches_pattern(&arena, member, "Symbol", false));
    }

    #[test]
    fn identifier_helpers() {
        assert_eq!(to_identifier("foo-bar"), "fooBar");
        assert_eq!(to_identifier("123abc"), "abc");
        assert_eq!(to_identifier("class"), "_class");
        assert_eq!(to_identifier(""), "_");
        assert!(is_valid_identifier("$ok_1"));
        assert!(!is_valid_identifier("1bad"));
    }
}
