// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Integration tests for scope analysis and binding maintenance.
//!
//! Each test loads a small program, checks what the crawl recorded, and for
//! the editing cases checks that bindings stay correct without a re-crawl.

mod support;

use std::collections::HashSet;

use scopewalk_ast::{build, DeclarationKind};
use scopewalk_traverse::{BindingKind, Session, TraverseError, VisitResult, Visitor};
use support::*;

// ============================================================================
// Declarations
// ============================================================================

mod declarations {
    use super::*;

    #[test]
    fn kinds_follow_the_declaring_syntax() {
        let tree = program(vec![
            declare("var", "v", None),
            declare("let", "l", None),
            declare("const", "c", Some(num(1.0))),
            function("f", &["p"], vec![]),
        ]);
        let mut session = session(&tree);
        let root = session.root_path();
        let scope = session.scope_of(root).unwrap();
        let kind = |session: &Session, name: &str| {
            let binding = session.get_binding(scope, name).unwrap();
            session.binding(binding).kind()
        };
        assert_eq!(kind(&session, "v"), BindingKind::Var);
        assert_eq!(kind(&session, "l"), BindingKind::Let);
        assert_eq!(kind(&session, "c"), BindingKind::Const);
        assert_eq!(kind(&session, "f"), BindingKind::Hoisted);

        let function = session.get(root, "body.3").unwrap().one().unwrap();
        let inner = session.scope_of(function).unwrap();
        let p = session.get_own_binding(inner, "p").unwrap();
        assert_eq!(session.binding(p).kind(), BindingKind::Param);
        assert!(session.get_own_binding(scope, "p").is_none());
    }

    #[test]
    fn var_in_a_block_belongs_to_the_function() {
        let tree = program(vec![function(
            "f",
            &[],
            vec![block(vec![declare("var", "hoisted", None), declare("let", "local", None)])],
        )]);
        let mut session = session(&tree);
        let root = session.root_path();
        let function = session.get(root, "body.0").unwrap().one().unwrap();
        let inner_block = session.get(root, "body.0.body.body.0").unwrap().one().unwrap();
        let function_scope = session.scope_of(function).unwrap();
        let block_scope = session.scope_of(inner_block).unwrap();

        assert_ne!(function_scope, block_scope);
        assert!(session.has_own_binding(function_scope, "hoisted"));
        assert!(!session.has_own_binding(function_scope, "local"));
        assert!(session.has_own_binding(block_scope, "local"));
        assert!(!session.has_own_binding(block_scope, "hoisted"));
    }

    #[test]
    fn block_bindings_shadow_outer_ones() {
        let tree = program(vec![
            declare("let", "x", None),
            block(vec![declare("let", "x", None), statement(ident("x"))]),
            statement(ident("x")),
            statement(ident("x")),
        ]);
        let mut session = session(&tree);
        let root = session.root_path();
        let program_scope = session.scope_of(root).unwrap();
        let inner_block = session.get(root, "body.1").unwrap().one().unwrap();
        let block_scope = session.scope_of(inner_block).unwrap();

        let outer = session.get_binding(program_scope, "x").unwrap();
        let inner = session.get_binding(block_scope, "x").unwrap();
        assert_ne!(outer, inner);
        assert_eq!(session.binding(inner).references(), 1);
        assert_eq!(session.binding(outer).references(), 2);
    }

    #[test]
    fn let_after_var_is_a_duplicate() {
        let tree = program(vec![declare("var", "x", None), declare("let", "x", None)]);
        let mut session = session(&tree);
        let root = session.root_path();
        let error = session.scope_of(root).unwrap_err();
        assert!(matches!(
            error,
            TraverseError::DuplicateDeclaration { ref name, .. } if name == "x"
        ));
    }

    #[test]
    fn repeated_var_is_allowed() {
        let tree = program(vec![declare("var", "x", None), declare("var", "x", Some(num(2.0)))]);
        let mut session = session(&tree);
        let root = session.root_path();
        let scope = session.scope_of(root).unwrap();
        let binding = session.get_binding(scope, "x").unwrap();
        assert_eq!(session.binding(binding).kind(), BindingKind::Var);
    }
}

// ============================================================================
// References and violations
// ============================================================================

mod references {
    use super::*;

    #[test]
    fn reassignment_makes_a_binding_non_constant() {
        let tree = program(vec![
            declare("let", "n", Some(num(1.0))),
            assign("=", "n", num(2.0)),
            assign("+=", "n", num(1.0)),
        ]);
        let mut session = session(&tree);
        let root = session.root_path();
        let scope = session.scope_of(root).unwrap();
        let n = session.get_binding(scope, "n").unwrap();
        assert!(!session.binding(n).is_constant());
        assert_eq!(session.binding(n).constant_violations().len(), 2);
    }

    #[test]
    fn unbound_names_are_globals() {
        let tree = program(vec![declare("var", "a", None), statement(ident("a")), statement(ident("console"))]);
        let mut session = session(&tree);
        let root = session.root_path();
        let scope = session.scope_of(root).unwrap();
        assert!(session.has_global(scope, "console"));
        assert!(!session.has_global(scope, "a"));
        let a = session.get_binding(scope, "a").unwrap();
        assert!(session.binding(a).is_referenced());
        assert_eq!(session.binding(a).references(), 1);
    }

    fn var_declaration(session: &mut Session, kind: DeclarationKind, name: &str) -> scopewalk_ast::NodeId {
        let id = build::identifier(session.arena_mut(), name);
        let declarator = build::variable_declarator(session.arena_mut(), id, None).unwrap();
        build::variable_declaration(session.arena_mut(), kind, vec![declarator]).unwrap()
    }

    #[test]
    fn inserted_declaration_claims_free_reads() {
        let tree = program(vec![statement(ident("a")), statement(ident("a")), assign("=", "a", num(1.0))]);
        let mut session = session(&tree);
        let root = session.root_path();
        let scope = session.scope_of(root).unwrap();
        assert!(session.has_global(scope, "a"));

        let first = session.get(root, "body.0").unwrap().one().unwrap();
        let declaration = var_declaration(&mut session, DeclarationKind::Var, "a");
        session.insert_before(first, vec![declaration]).unwrap();

        let a = session.get_binding(scope, "a").unwrap();
        assert_eq!(session.binding(a).references(), 2);
        assert_eq!(session.binding(a).constant_violations().len(), 1);
        assert!(!session.binding(a).is_constant());
        assert!(!session.has_global(scope, "a"));
    }

    #[test]
    fn block_declaration_leaves_outer_reads_global() {
        let tree = program(vec![statement(ident("a")), block(vec![statement(ident("a"))])]);
        let mut session = session(&tree);
        let root = session.root_path();
        let scope = session.scope_of(root).unwrap();

        let inner = session.get(root, "body.1.body.0").unwrap().one().unwrap();
        let declaration = var_declaration(&mut session, DeclarationKind::Let, "a");
        session.insert_before(inner, vec![declaration]).unwrap();

        let block_path = session.get(root, "body.1").unwrap().one().unwrap();
        let block_scope = session.scope_of(block_path).unwrap();
        let a = session.get_own_binding(block_scope, "a").unwrap();
        assert_eq!(session.binding(a).references(), 1);
        assert!(session.get_binding(scope, "a").is_none());
        assert!(session.has_global(scope, "a"));
    }
}

// ============================================================================
// Function scenario
// ============================================================================

mod scenario {
    use super::*;

    fn referenced_names() -> Visitor<Vec<String>> {
        Visitor::new()
            .enter("ReferencedIdentifier", |session, path, names: &mut Vec<String>| {
                names.push(session.node_name(path).unwrap_or_default());
                Ok(VisitResult::Continue)
            })
            .unwrap()
    }

    fn fixture() -> Session {
        // function f(a) { var b = a; return [a, b]; }
        let tree = program(vec![function(
            "f",
            &["a"],
            vec![
                declare("var", "b", Some(ident("a"))),
                serde_json::json!({
                    "type": "ReturnStatement",
                    "argument": { "type": "ArrayExpression", "elements": [ident("a"), ident("b")] }
                }),
            ],
        )]);
        session(&tree)
    }

    #[test]
    fn references_params_and_globals() {
        let mut session = fixture();
        let mut names = Vec::new();
        session.traverse(&referenced_names(), &mut names).unwrap();
        assert_eq!(names, vec!["a", "a", "b"]);

        let root = session.root_path();
        let program_scope = session.scope_of(root).unwrap();
        assert!(session.globals(program_scope).is_empty());

        let function = session.get(root, "body.0").unwrap().one().unwrap();
        let scope = session.scope_of(function).unwrap();
        let a = session.get_own_binding(scope, "a").unwrap();
        assert_eq!(session.binding(a).kind(), BindingKind::Param);
    }

    #[test]
    fn replacement_updates_references_without_a_crawl() {
        let mut session = fixture();
        let root = session.root_path();
        let function = session.get(root, "body.0").unwrap().one().unwrap();
        let scope = session.scope_of(function).unwrap();
        let argument = session.get(root, "body.0.body.body.1.argument").unwrap().one().unwrap();

        let elements = ["a", "b", "b"]
            .iter()
            .map(|name| build::identifier(session.arena_mut(), name))
            .collect();
        let array = build::array_expression(session.arena_mut(), elements).unwrap();
        session.replace_with(argument, array).unwrap();

        let a = session.get_own_binding(scope, "a").unwrap();
        let b = session.get_own_binding(scope, "b").unwrap();
        assert_eq!(session.binding(a).references(), 2);
        assert_eq!(session.binding(b).references(), 2);

        let mut names = Vec::new();
        session.traverse(&referenced_names(), &mut names).unwrap();
        assert_eq!(names.len(), 4);
    }
}

// ============================================================================
// Renaming and unique names
// ============================================================================

mod naming {
    use super::*;

    #[test]
    fn rename_round_trip_restores_the_tree() {
        let tree = program(vec![
            declare("let", "a", Some(num(1.0))),
            function("g", &[], vec![declare("let", "a", None), statement(ident("a"))]),
            statement(ident("a")),
        ]);
        let mut session = session(&tree);
        let before = session.to_json();
        let root = session.root_path();
        let scope = session.scope_of(root).unwrap();

        session.rename(scope, "a", "renamed").unwrap();
        let renamed = session.to_json();
        assert_eq!(renamed["body"][0]["declarations"][0]["id"]["name"], "renamed");
        assert_eq!(renamed["body"][2]["expression"]["name"], "renamed");
        assert_eq!(renamed["body"][1]["body"]["body"][1]["expression"]["name"], "a");

        session.rename(scope, "renamed", "a").unwrap();
        assert_eq!(session.to_json(), before);
    }

    #[test]
    fn uids_are_unique_across_nested_scopes() {
        let tree = program(vec![
            declare("var", "_tmp", None),
            function("f", &["_tmp2"], vec![block(vec![statement(ident("_tmp3"))])]),
        ]);
        let mut session = session(&tree);
        let root = session.root_path();
        let program_scope = session.scope_of(root).unwrap();
        let inner_block = session.get(root, "body.1.body.body.0").unwrap().one().unwrap();
        let block_scope = session.scope_of(inner_block).unwrap();

        let mut seen = HashSet::new();
        for scope in [block_scope, program_scope, block_scope, program_scope] {
            let uid = session.generate_uid(scope, "tmp");
            assert!(!["_tmp", "_tmp2", "_tmp3"].contains(&uid.as_str()), "{uid} collides");
            assert!(seen.insert(uid));
        }
        assert!(session.has_uid(program_scope, "_tmp4"));
    }
}
