// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Catalog and arena behavior over imported trees.

use scopewalk_ast::validators::{binding_identifiers, is_binding, is_referenced};
use scopewalk_ast::{AstError, Child, Field, NodeArena, NodeKind, TypeName};
use serde_json::json;

fn ident(name: &str) -> serde_json::Value {
    json!({ "type": "Identifier", "name": name })
}

#[test]
fn alias_and_kind_names_resolve() {
    for name in ["Statement", "Expression", "Scopable", "Loop", "Function", "LVal"] {
        assert!(matches!(name.parse::<TypeName>(), Ok(TypeName::Alias(_))), "{}", name);
    }
    assert!(matches!(
        "BlockStatement".parse::<TypeName>(),
        Ok(TypeName::Kind(NodeKind::BlockStatement))
    ));
    assert!(matches!(
        "Blockish".parse::<TypeName>(),
        Err(AstError::UnknownNodeType(_))
    ));
}

#[test]
fn visitor_keys_follow_evaluation_order() {
    let keys: Vec<&str> = NodeKind::DoWhileStatement
        .fields()
        .iter()
        .map(|spec| spec.field.as_str())
        .collect();
    assert_eq!(keys, vec!["body", "test"]);

    let keys: Vec<&str> = NodeKind::ImportDeclaration
        .fields()
        .iter()
        .map(|spec| spec.field.as_str())
        .collect();
    assert_eq!(keys, vec!["specifiers", "source"]);
}

#[test]
fn object_pattern_values_are_bindings_not_references() {
    let mut arena = NodeArena::new();
    let declarator = arena
        .import_json(&json!({
            "type": "VariableDeclarator",
            "id": {
                "type": "ObjectPattern",
                "properties": [{
                    "type": "ObjectProperty",
                    "key": ident("a"),
                    "value": ident("b"),
                    "computed": false,
                    "shorthand": false
                }]
            },
            "init": ident("source")
        }))
        .unwrap();
    let pattern = arena.child(declarator, Field::Id).unwrap();
    let property = arena.list(pattern, Field::Properties)[0];
    let value = arena.child(property, Field::Value).unwrap();

    assert!(!is_referenced(&arena, value, property, Some(pattern)));
    assert!(is_binding(&arena, value, property, Some(pattern)));

    let ids = binding_identifiers(&arena, declarator, false, false);
    assert_eq!(ids.keys().collect::<Vec<_>>(), vec!["b"]);
}

#[test]
fn export_specifier_local_is_referenced_unless_reexported() {
    let mut arena = NodeArena::new();
    let local_export = arena
        .import_json(&json!({
            "type": "ExportNamedDeclaration",
            "declaration": null,
            "specifiers": [{
                "type": "ExportSpecifier",
                "local": ident("a"),
                "exported": ident("b")
            }],
            "source": null
        }))
        .unwrap();
    let specifier = arena.list(local_export, Field::Specifiers)[0];
    let local = arena.child(specifier, Field::Local).unwrap();
    assert!(is_referenced(&arena, local, specifier, Some(local_export)));

    let source = scopewalk_ast::build::string_literal(&mut arena, "./other");
    arena
        .set_child(local_export, Field::Source, Child::Node(source))
        .unwrap();
    assert!(!is_referenced(&arena, local, specifier, Some(local_export)));
}

#[test]
fn lists_reject_single_nodes() {
    let mut arena = NodeArena::new();
    let program = scopewalk_ast::build::program(&mut arena, vec![]).unwrap();
    let stmt = scopewalk_ast::build::empty_statement(&mut arena);
    let err = arena
        .set_child(program, Field::Body, Child::Node(stmt))
        .unwrap_err();
    assert!(matches!(err, AstError::InvalidSlot { field: Field::Body, .. }));
}

#[test]
fn export_round_trips_through_import() {
    let source = json!({
        "type": "Program",
        "body": [{
            "type": "FunctionDeclaration",
            "id": ident("f"),
            "params": [ident("a")],
            "async": false,
            "generator": false,
            "body": {
                "type": "BlockStatement",
                "body": [{
                    "type": "ReturnStatement",
                    "argument": {
                        "type": "BinaryExpression",
                        "operator": "+",
                        "left": ident("a"),
                        "right": { "type": "NumericLiteral", "value": 1.0 }
                    }
                }]
            }
        }]
    });
    let mut arena = NodeArena::new();
    let program = arena.import_json(&source).unwrap();
    let exported = arena.export_json(program);

    let mut second = NodeArena::new();
    let again = second.import_json(&exported).unwrap();
    assert_eq!(second.export_json(again), exported);
    assert_eq!(
        exported["body"][0]["body"]["body"][0]["argument"]["operator"],
        "+"
    );
}
