// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Shared helpers for the traversal integration tests.
//!
//! Trees are written as ESTree JSON. The helpers below keep the fixtures
//! short enough to read next to the assertions that use them.

#![allow(dead_code)]

use scopewalk_traverse::{Session, TraverseOptions};
use serde_json::{json, Value};

pub fn ident(name: &str) -> Value {
    json!({ "type": "Identifier", "name": name })
}

pub fn num(value: f64) -> Value {
    json!({ "type": "NumericLiteral", "value": value })
}

pub fn statement(expression: Value) -> Value {
    json!({ "type": "ExpressionStatement", "expression": expression })
}

pub fn declare(kind: &str, name: &str, init: Option<Value>) -> Value {
    json!({
        "type": "VariableDeclaration",
        "kind": kind,
        "declarations": [{
            "type": "VariableDeclarator",
            "id": ident(name),
            "init": init.unwrap_or(Value::Null)
        }]
    })
}

pub fn assign(operator: &str, name: &str, right: Value) -> Value {
    statement(json!({
        "type": "AssignmentExpression",
        "operator": operator,
        "left": ident(name),
        "right": right
    }))
}

pub fn block(body: Vec<Value>) -> Value {
    json!({ "type": "BlockStatement", "body": body })
}

pub fn function(name: &str, params: &[&str], body: Vec<Value>) -> Value {
    let params: Vec<Value> = params.iter().map(|param| ident(param)).collect();
    json!({
        "type": "FunctionDeclaration",
        "id": ident(name),
        "params": params,
        "body": block(body),
        "generator": false,
        "async": false
    })
}

pub fn program(body: Vec<Value>) -> Value {
    json!({ "type": "Program", "sourceType": "script", "body": body })
}

/// Load `tree` with default options.
pub fn session(tree: &Value) -> Session {
    Session::from_json(tree, TraverseOptions::default()).expect("fixture should load")
}
