//! Command-level tests: write a tree to a temp file, run a command function,
//! and check the response.

use std::fs;
use std::path::PathBuf;

use serde_json::{json, Value};
use tempfile::TempDir;

use scopewalk::cli::{load_session, run_evaluate, run_rename, run_scopes, run_uid};
use scopewalk::error::{CliError, OutputErrorCode};
use scopewalk::output::emit_response;
use scopewalk_traverse::{BindingKind, JsValue, Session, TraverseOptions};

// ============================================================================
// Fixtures
// ============================================================================

fn ident(name: &str) -> Value {
    json!({ "type": "Identifier", "name": name })
}

fn statement(expression: Value) -> Value {
    json!({ "type": "ExpressionStatement", "expression": expression })
}

fn declare(kind: &str, name: &str, init: Value) -> Value {
    json!({
        "type": "VariableDeclaration",
        "kind": kind,
        "declarations": [{ "type": "VariableDeclarator", "id": ident(name), "init": init }]
    })
}

/// `const a = 2; function f(p) { let q = p; return q; } a; log(a);`
fn sample() -> Value {
    json!({
        "type": "Program",
        "body": [
            declare("const", "a", json!({ "type": "NumericLiteral", "value": 2 })),
            {
                "type": "FunctionDeclaration",
                "id": ident("f"),
                "params": [ident("p")],
                "body": {
                    "type": "BlockStatement",
                    "body": [
                        declare("let", "q", ident("p")),
                        { "type": "ReturnStatement", "argument": ident("q") }
                    ]
                }
            },
            statement(ident("a")),
            statement(json!({
                "type": "CallExpression",
                "callee": ident("log"),
                "arguments": [ident("a")]
            }))
        ]
    })
}

fn write_tree(dir: &TempDir, tree: &Value) -> PathBuf {
    let path = dir.path().join("tree.json");
    fs::write(&path, serde_json::to_string_pretty(tree).unwrap()).unwrap();
    path
}

fn open(tree: &Value) -> (TempDir, Session) {
    let dir = TempDir::new().unwrap();
    let path = write_tree(&dir, tree);
    let session = load_session(&path, TraverseOptions::default()).unwrap();
    (dir, session)
}

// ============================================================================
// Loading
// ============================================================================

mod loading {
    use super::*;

    #[test]
    fn missing_file_is_a_resolution_error() {
        let dir = TempDir::new().unwrap();
        let err = load_session(&dir.path().join("absent.json"), TraverseOptions::default())
            .unwrap_err();
        assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
    }

    #[test]
    fn malformed_json_is_invalid_arguments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tree.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_session(&path, TraverseOptions::default()).unwrap_err();
        assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
    }

    #[test]
    fn unknown_node_types_are_transform_errors() {
        let dir = TempDir::new().unwrap();
        let path = write_tree(&dir, &json!({ "type": "Program", "body": [{ "type": "Bogus" }] }));
        let err = load_session(&path, TraverseOptions::default()).unwrap_err();
        assert!(matches!(err, CliError::Ast(_) | CliError::Traverse(_)));
        assert_eq!(err.error_code(), OutputErrorCode::TransformError);
    }
}

// ============================================================================
// Commands
// ============================================================================

mod commands {
    use super::*;

    #[test]
    fn scopes_lists_bindings_in_preorder() {
        let (_dir, mut session) = open(&sample());
        let response = run_scopes(&mut session).unwrap();
        assert_eq!(response.status, "ok");
        assert_eq!(response.globals, vec!["log".to_string()]);

        let kinds: Vec<&str> = response.scopes.iter().map(|scope| scope.kind).collect();
        assert_eq!(kinds, vec!["program", "function"]);

        let program = &response.scopes[0];
        assert!(program.parent.is_none());
        let a = program.bindings.iter().find(|b| b.name == "a").unwrap();
        assert_eq!(a.kind, BindingKind::Const);
        assert!(a.constant);
        assert_eq!(a.references, 2);

        let function = &response.scopes[1];
        assert_eq!(function.parent, Some(program.id));
        assert_eq!(function.block, "FunctionDeclaration");
        let names: Vec<&str> = function.bindings.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["p", "q"]);
    }

    #[test]
    fn rename_rewrites_declaration_and_references() {
        let (_dir, mut session) = open(&sample());
        let response = run_rename(&mut session, "a", "answer", None).unwrap();
        assert!(response.renamed);
        let body = &response.tree["body"];
        assert_eq!(body[0]["declarations"][0]["id"]["name"], "answer");
        assert_eq!(body[2]["expression"]["name"], "answer");
        assert_eq!(body[3]["expression"]["arguments"][0]["name"], "answer");
        assert_eq!(body[3]["expression"]["callee"]["name"], "log");
    }

    #[test]
    fn rename_from_a_nested_scope() {
        let (_dir, mut session) = open(&sample());
        let response = run_rename(&mut session, "q", "result", Some("body.1.body")).unwrap();
        assert!(response.renamed);
        let inner = &response.tree["body"][1]["body"]["body"];
        assert_eq!(inner[0]["declarations"][0]["id"]["name"], "result");
        assert_eq!(inner[1]["argument"]["name"], "result");
    }

    #[test]
    fn rename_rejects_bad_targets() {
        let (_dir, mut session) = open(&sample());
        let err = run_rename(&mut session, "a", "not valid", None).unwrap_err();
        assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
        let err = run_rename(&mut session, "a", "b", Some("body.9")).unwrap_err();
        assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
    }

    #[test]
    fn rename_of_an_unbound_name_changes_nothing() {
        let (_dir, mut session) = open(&sample());
        let before = session.to_json();
        let response = run_rename(&mut session, "log", "print", None).unwrap();
        assert!(!response.renamed);
        assert_eq!(response.tree, before);
    }

    #[test]
    fn uids_avoid_existing_names_and_each_other() {
        let tree = json!({
            "type": "Program",
            "body": [declare("var", "_ref", Value::Null), statement(ident("_ref2"))]
        });
        let (_dir, mut session) = open(&tree);
        let response = run_uid(&mut session, "ref", 2).unwrap();
        assert_eq!(response.uids, vec!["_ref3".to_string(), "_ref4".to_string()]);

        let err = run_uid(&mut session, "ref", 0).unwrap_err();
        assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
    }

    #[test]
    fn evaluate_reports_constants_and_deopts() {
        let (_dir, mut session) = open(&sample());
        let response = run_evaluate(&mut session).unwrap();
        assert_eq!(response.results.len(), 2);

        let first = &response.results[0];
        assert_eq!(first.index, 2);
        assert!(first.confident);
        assert_eq!(first.value, Some(JsValue::Number(2.0)));
        assert_eq!(first.type_of, Some("number"));

        let second = &response.results[1];
        assert_eq!(second.index, 3);
        assert!(!second.confident);
        assert!(second.value.is_none());
    }

    #[test]
    fn responses_emit_as_json() {
        let (_dir, mut session) = open(&sample());
        let response = run_scopes(&mut session).unwrap();
        let mut out = Vec::new();
        emit_response(&response, &mut out).unwrap();
        let json: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["schema_version"], "1");
        assert_eq!(json["scopes"][0]["bindings"][0]["kind"], "const");
    }
}
