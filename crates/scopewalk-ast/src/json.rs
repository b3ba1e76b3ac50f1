// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! ESTree / Babel JSON import and export.
//!
//! Import accepts Babel's AST JSON (optionally wrapped in a `File`) and the
//! common ESTree spellings (`Literal`, `Property`, `MethodDefinition`,
//! `PropertyDefinition`). Export always produces Babel node types.

use serde_json::{json, Map, Number, Value};

use crate::arena::NodeArena;
use crate::catalog::NodeKind;
use crate::error::AstError;
use crate::node::{
    Child, Comment, CommentKind, DeclarationKind, MethodKind, Node, NodeFlags, NodeId, NodeValue,
    Span,
};

fn flag_slot<'a>(flags: &'a mut NodeFlags, name: &str) -> Option<&'a mut bool> {
    match name {
        "computed" => Some(&mut flags.computed),
        "shorthand" => Some(&mut flags.shorthand),
        "static" => Some(&mut flags.is_static),
        "async" => Some(&mut flags.is_async),
        "generator" => Some(&mut flags.generator),
        "prefix" => Some(&mut flags.prefix),
        "delegate" => Some(&mut flags.delegate),
        "tail" => Some(&mut flags.tail),
        "optional" => Some(&mut flags.optional),
        _ => None,
    }
}

/// Flags that are meaningful for `kind` and appear in its JSON.
fn flags_for(kind: NodeKind) -> &'static [&'static str] {
    match kind {
        NodeKind::MemberExpression => &["computed", "optional"],
        NodeKind::CallExpression => &["optional"],
        NodeKind::ObjectProperty => &["computed", "shorthand"],
        NodeKind::ClassProperty => &["computed", "static"],
        NodeKind::ObjectMethod => &["computed", "async", "generator"],
        NodeKind::ClassMethod => &["computed", "static", "async", "generator"],
        NodeKind::FunctionDeclaration | NodeKind::FunctionExpression => &["async", "generator"],
        NodeKind::ArrowFunctionExpression => &["async"],
        NodeKind::UnaryExpression | NodeKind::UpdateExpression => &["prefix"],
        NodeKind::YieldExpression => &["delegate"],
        NodeKind::TemplateElement => &["tail"],
        _ => &[],
    }
}

impl NodeArena {
    /// Import a tree from Babel/ESTree JSON, returning the root node.
    pub fn import_json(&mut self, value: &Value) -> Result<NodeId, AstError> {
        import_node(self, value, "$")
    }

    /// Export the subtree rooted at `id` as Babel JSON.
    pub fn export_json(&self, id: NodeId) -> Value {
        export_node(self, id)
    }
}

fn type_of<'a>(object: &'a Map<String, Value>, location: &str) -> Result<&'a str, AstError> {
    object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| AstError::malformed(location, "missing `type`"))
}

fn import_node(arena: &mut NodeArena, value: &Value, location: &str) -> Result<NodeId, AstError> {
    let object = value
        .as_object()
        .ok_or_else(|| AstError::malformed(location, "expected a node object"))?;
    let tag = type_of(object, location)?;
    match tag {
        "File" => {
            let program = object
                .get("program")
                .ok_or_else(|| AstError::malformed(location, "`File` without `program`"))?;
            return import_node(arena, program, &format!("{}.program", location));
        }
        "Property" => return import_node(arena, &estree_property(object), location),
        "MethodDefinition" => return import_node(arena, &estree_method(object), location),
        "PropertyDefinition" => {
            let mut renamed = object.clone();
            renamed.insert("type".to_string(), json!("ClassProperty"));
            return import_node(arena, &Value::Object(renamed), location);
        }
        _ => {}
    }
    let kind = if tag == "Literal" {
        literal_kind(object)
    } else {
        tag.parse::<NodeKind>()?
    };

    let mut node = Node::new(kind);
    node.value = import_value(kind, object, location)?;
    for name in flags_for(kind) {
        if let (Some(flag), Some(value)) = (
            flag_slot(&mut node.flags, name),
            object.get(*name).and_then(Value::as_bool),
        ) {
            *flag = value;
        }
    }
    node.leading_comments = import_comments(object.get("leadingComments"));
    node.trailing_comments = import_comments(object.get("trailingComments"));
    if let (Some(start), Some(end)) = (
        object.get("start").and_then(Value::as_u64),
        object.get("end").and_then(Value::as_u64),
    ) {
        node.span = Some(Span {
            start: start as u32,
            end: end as u32,
        });
    }
    let id = arena.alloc(node);

    for spec in kind.fields() {
        let key = spec.field.as_str();
        let child_location = format!("{}.{}", location, key);
        let child = match object.get(key) {
            None | Some(Value::Null) if spec.list => Child::List(Vec::new()),
            None | Some(Value::Null) => Child::None,
            Some(Value::Array(items)) if spec.list => {
                let mut ids = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let item_location = format!("{}[{}]", child_location, index);
                    if item.is_null() {
                        return Err(AstError::malformed(
                            &item_location,
                            "holes in node lists are not supported",
                        ));
                    }
                    ids.push(import_node(arena, item, &item_location)?);
                }
                Child::List(ids)
            }
            Some(item) if !spec.list => Child::Node(import_node(arena, item, &child_location)?),
            Some(_) => {
                return Err(AstError::malformed(
                    &child_location,
                    if spec.list {
                        "expected an array"
                    } else {
                        "expected a node"
                    },
                ))
            }
        };
        arena.set_child(id, spec.field, child)?;
    }
    Ok(id)
}

fn literal_kind(object: &Map<String, Value>) -> NodeKind {
    if object.contains_key("regex") {
        return NodeKind::RegExpLiteral;
    }
    if object.contains_key("bigint") {
        return NodeKind::BigIntLiteral;
    }
    match object.get("value") {
        Some(Value::String(_)) => NodeKind::StringLiteral,
        Some(Value::Number(_)) => NodeKind::NumericLiteral,
        Some(Value::Bool(_)) => NodeKind::BooleanLiteral,
        _ => NodeKind::NullLiteral,
    }
}

/// ESTree `Property` to Babel `ObjectProperty` / `ObjectMethod`.
fn estree_property(object: &Map<String, Value>) -> Value {
    let is_method = object.get("method").and_then(Value::as_bool) == Some(true)
        || matches!(
            object.get("kind").and_then(Value::as_str),
            Some("get") | Some("set")
        );
    if !is_method {
        let mut property = object.clone();
        property.insert("type".to_string(), json!("ObjectProperty"));
        return Value::Object(property);
    }
    let function = object.get("value").cloned().unwrap_or(Value::Null);
    let kind = match object.get("kind").and_then(Value::as_str) {
        Some("get") => "get",
        Some("set") => "set",
        _ => "method",
    };
    json!({
        "type": "ObjectMethod",
        "kind": kind,
        "key": object.get("key").cloned().unwrap_or(Value::Null),
        "computed": object.get("computed").cloned().unwrap_or(json!(false)),
        "params": function.get("params").cloned().unwrap_or(json!([])),
        "body": function.get("body").cloned().unwrap_or(Value::Null),
        "async": function.get("async").cloned().unwrap_or(json!(false)),
        "generator": function.get("generator").cloned().unwrap_or(json!(false)),
    })
}

/// ESTree `MethodDefinition` to Babel `ClassMethod`.
fn estree_method(object: &Map<String, Value>) -> Value {
    let function = object.get("value").cloned().unwrap_or(Value::Null);
    json!({
        "type": "ClassMethod",
        "kind": object.get("kind").cloned().unwrap_or(json!("method")),
        "key": object.get("key").cloned().unwrap_or(Value::Null),
        "computed": object.get("computed").cloned().unwrap_or(json!(false)),
        "static": object.get("static").cloned().unwrap_or(json!(false)),
        "params": function.get("params").cloned().unwrap_or(json!([])),
        "body": function.get("body").cloned().unwrap_or(Value::Null),
        "async": function.get("async").cloned().unwrap_or(json!(false)),
        "generator": function.get("generator").cloned().unwrap_or(json!(false)),
    })
}

fn string_field(
    object: &Map<String, Value>,
    key: &str,
    location: &str,
) -> Result<String, AstError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AstError::malformed(location, format!("missing string `{}`", key)))
}

fn import_value(
    kind: NodeKind,
    object: &Map<String, Value>,
    location: &str,
) -> Result<NodeValue, AstError> {
    let value = match kind {
        NodeKind::Identifier => NodeValue::Name(string_field(object, "name", location)?),
        NodeKind::StringLiteral => NodeValue::String(string_field(object, "value", location)?),
        NodeKind::NumericLiteral => NodeValue::Number(
            object
                .get("value")
                .and_then(Value::as_f64)
                .ok_or_else(|| AstError::malformed(location, "missing number `value`"))?,
        ),
        NodeKind::BooleanLiteral => NodeValue::Boolean(
            object
                .get("value")
                .and_then(Value::as_bool)
                .ok_or_else(|| AstError::malformed(location, "missing boolean `value`"))?,
        ),
        NodeKind::RegExpLiteral => {
            let source = object
                .get("regex")
                .and_then(Value::as_object)
                .unwrap_or(object);
            NodeValue::Regex {
                pattern: string_field(source, "pattern", location)?,
                flags: source
                    .get("flags")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            }
        }
        NodeKind::BigIntLiteral => {
            let digits = object
                .get("bigint")
                .or_else(|| object.get("value"))
                .and_then(Value::as_str)
                .ok_or_else(|| AstError::malformed(location, "missing bigint digits"))?;
            NodeValue::BigInt(digits.to_string())
        }
        NodeKind::TemplateElement => {
            let value = object
                .get("value")
                .and_then(Value::as_object)
                .ok_or_else(|| AstError::malformed(location, "missing template `value`"))?;
            NodeValue::Template {
                raw: string_field(value, "raw", location)?,
                cooked: value.get("cooked").and_then(Value::as_str).map(str::to_string),
            }
        }
        NodeKind::UnaryExpression
        | NodeKind::UpdateExpression
        | NodeKind::BinaryExpression
        | NodeKind::LogicalExpression
        | NodeKind::AssignmentExpression => {
            NodeValue::Operator(string_field(object, "operator", location)?)
        }
        NodeKind::VariableDeclaration => {
            let text = string_field(object, "kind", location)?;
            NodeValue::Declaration(DeclarationKind::parse(&text).ok_or_else(|| {
                AstError::malformed(location, format!("unsupported declaration kind `{}`", text))
            })?)
        }
        NodeKind::ClassMethod | NodeKind::ObjectMethod => {
            let text = object
                .get("kind")
                .and_then(Value::as_str)
                .unwrap_or("method");
            NodeValue::Method(MethodKind::parse(text).ok_or_else(|| {
                AstError::malformed(location, format!("unsupported method kind `{}`", text))
            })?)
        }
        _ => NodeValue::None,
    };
    Ok(value)
}

fn import_comments(value: Option<&Value>) -> Vec<Comment> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let kind = match item.get("type").and_then(Value::as_str)? {
                "CommentLine" | "Line" => CommentKind::Line,
                "CommentBlock" | "Block" => CommentKind::Block,
                _ => return None,
            };
            let value = item.get("value").and_then(Value::as_str)?.to_string();
            Some(Comment { kind, value })
        })
        .collect()
}

fn export_comments(comments: &[Comment]) -> Value {
    Value::Array(
        comments
            .iter()
            .map(|comment| {
                json!({
                    "type": match comment.kind {
                        CommentKind::Line => "CommentLine",
                        CommentKind::Block => "CommentBlock",
                    },
                    "value": comment.value,
                })
            })
            .collect(),
    )
}

fn export_node(arena: &NodeArena, id: NodeId) -> Value {
    let node = arena.get(id);
    let kind = node.kind();
    let mut object = Map::new();
    object.insert("type".to_string(), json!(kind.as_str()));

    match &node.value {
        NodeValue::None => {}
        NodeValue::Name(name) => {
            object.insert("name".to_string(), json!(name));
        }
        NodeValue::String(value) => {
            object.insert("value".to_string(), json!(value));
        }
        NodeValue::Number(value) => {
            let number = Number::from_f64(*value).map_or(Value::Null, Value::Number);
            object.insert("value".to_string(), number);
        }
        NodeValue::Boolean(value) => {
            object.insert("value".to_string(), json!(value));
        }
        NodeValue::Regex { pattern, flags } => {
            object.insert("pattern".to_string(), json!(pattern));
            object.insert("flags".to_string(), json!(flags));
        }
        NodeValue::BigInt(digits) => {
            object.insert("value".to_string(), json!(digits));
        }
        NodeValue::Operator(op) => {
            object.insert("operator".to_string(), json!(op));
        }
        NodeValue::Declaration(kind) => {
            object.insert("kind".to_string(), json!(kind.as_str()));
        }
        NodeValue::Method(kind) => {
            object.insert("kind".to_string(), json!(kind.as_str()));
        }
        NodeValue::Template { raw, cooked } => {
            object.insert("value".to_string(), json!({ "raw": raw, "cooked": cooked }));
        }
    }

    let mut flags = node.flags;
    for name in flags_for(kind) {
        if let Some(flag) = flag_slot(&mut flags, name) {
            object.insert(name.to_string(), json!(*flag));
        }
    }

    for (field, child) in node.slots() {
        let value = match child {
            Child::None => Value::Null,
            Child::Node(inner) => export_node(arena, *inner),
            Child::List(ids) => Value::Array(ids.iter().map(|i| export_node(arena, *i)).collect()),
        };
        object.insert(field.as_str().to_string(), value);
    }

    if !node.leading_comments.is_empty() {
        object.insert(
            "leadingComments".to_string(),
            export_comments(&node.leading_comments),
        );
    }
    if !node.trailing_comments.is_empty() {
        object.insert(
            "trailingComments".to_string(),
            export_comments(&node.trailing_comments),
        );
    }
    if let Some(span) = node.span {
        object.insert("start".to_string(), json!(span.start));
        object.insert("end".to_string(), json!(span.end));
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Field;

    const FLAG_NAMES: &[&str] = &[
        "computed",
        "shorthand",
        "static",
        "async",
        "generator",
        "prefix",
        "delegate",
        "tail",
        "optional",
    ];

    #[test]
    fn flag_names_all_resolve() {
        let mut flags = NodeFlags::default();
        for name in FLAG_NAMES {
            assert!(flag_slot(&mut flags, name).is_some(), "{}", name);
        }
    }

    #[test]
    fn imports_babel_program() {
        let mut arena = NodeArena::new();
        let program = arena
            .import_json(&json!({
                "type": "File",
                "program": {
                    "type": "Program",
                    "body": [{
                        "type": "VariableDeclaration",
                        "kind": "let",
                        "declarations": [{
                            "type": "VariableDeclarator",
                            "id": { "type": "Identifier", "name": "x" },
                            "init": { "type": "NumericLiteral", "value": 1 }
                        }]
                    }]
                }
            }))
            .unwrap();
        assert_eq!(arena.kind(program), NodeKind::Program);
        let declaration = arena.list(program, Field::Body)[0];
        assert_eq!(
            arena.get(declaration).declaration_kind(),
            Some(DeclarationKind::Let)
        );
    }

    #[test]
    fn imports_estree_literals_and_properties() {
        let mut arena = NodeArena::new();
        let object = arena
            .import_json(&json!({
                "type": "ObjectExpression",
                "properties": [{
                    "type": "Property",
                    "kind": "init",
                    "key": { "type": "Identifier", "name": "a" },
                    "value": { "type": "Literal", "value": "s" },
                    "computed": false,
                    "shorthand": false
                }]
            }))
            .unwrap();
        let property = arena.list(object, Field::Properties)[0];
        assert_eq!(arena.kind(property), NodeKind::ObjectProperty);
        let value = arena.child(property, Field::Value).unwrap();
        assert_eq!(arena.kind(value), NodeKind::StringLiteral);
    }

    #[test]
    fn rejects_unknown_types_and_bad_slots() {
        let mut arena = NodeArena::new();
        let err = arena
            .import_json(&json!({ "type": "JSXElement" }))
            .unwrap_err();
        assert_eq!(err, AstError::UnknownNodeType("JSXElement".to_string()));

        let err = arena
            .import_json(&json!({
                "type": "ReturnStatement",
                "argument": { "type": "EmptyStatement" }
            }))
            .unwrap_err();
        assert!(matches!(err, AstError::InvalidSlot { .. }));
    }

    #[test]
    fn export_mirrors_import() {
        let source = json!({
            "type": "ExpressionStatement",
            "expression": {
                "type": "UnaryExpression",
                "operator": "!",
                "prefix": true,
                "argument": { "type": "Identifier", "name": "x" }
            },
            "leadingComments": [{ "type": "CommentLine", "value": " hi" }]
        });
        let mut arena = NodeArena::new();
        let id = arena.import_json(&source).unwrap();
        let exported = arena.export_json(id);
        assert_eq!(exported["expression"]["operator"], "!");
        assert_eq!(exported["expression"]["argument"]["name"], "x");
        assert_eq!(exported["leadingComments"][0]["value"], " hi");
    }
}
