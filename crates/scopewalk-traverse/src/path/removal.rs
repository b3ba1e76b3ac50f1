// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Removing the node at a path.
//!
//! Some slots cannot be left empty. Removing their contents removes or
//! collapses the parent instead:
//!
//! - the test of a `while` or `case`, the declaration of an export, the body
//!   of a label, the sole declarator of a declaration and the expression of an
//!   expression statement take their parent with them;
//! - a sequence left with one expression becomes that expression;
//! - removing one operand of a binary expression leaves the other;
//! - an `if` consequent, a loop body or an arrow body becomes `{}`.

use scopewalk_ast::{build, validate_slot, Child, Field};
use tracing::debug;

use crate::error::TraverseError;
use crate::path::{Location, PathId};
use crate::session::Session;

impl Session {
    /// Remove the node at `path` and forget the bindings it declared.
    pub fn remove(&mut self, path: PathId) -> Result<(), TraverseError> {
        self.assert_unremoved(path)?;
        self.resync(path);
        if !self.options.track_bindings {
            self.remove_declared_names(path)?;
        }
        if self.call_removal_hooks(path)? {
            self.mark_removed(path);
            return Ok(());
        }
        self.share_comments_with_siblings(path);
        self.remove_node(path)?;
        self.mark_removed(path);
        Ok(())
    }

    /// Without incremental tracking, drop the scope entries for every name
    /// the node declares.
    fn remove_declared_names(&mut self, path: PathId) -> Result<(), TraverseError> {
        let names: Vec<String> = self.get_binding_identifiers(path).into_keys().collect();
        if names.is_empty() {
            return Ok(());
        }
        let scope = self.scope_of(path)?;
        for name in names {
            self.remove_binding(scope, &name);
        }
        Ok(())
    }

    fn call_removal_hooks(&mut self, path: PathId) -> Result<bool, TraverseError> {
        let Some(parent) = self.parent_path(path) else {
            return Ok(false);
        };
        let key = self.key(path);
        let parent_node = self.require_node(parent)?;

        let remove_parent = match key {
            Some(Field::Test) => self.is_while(parent) || self.is_switch_case(parent),
            Some(Field::Declaration) => self.is_export_declaration(parent),
            Some(Field::Body) if !self.in_list(path) => self.is_labeled_statement(parent),
            Some(Field::Declarations) => {
                self.is_variable_declaration(parent)
                    && self.arena.list(parent_node, Field::Declarations).len() == 1
            }
            Some(Field::Expression) => self.is_expression_statement(parent),
            _ => false,
        };
        if remove_parent {
            self.remove(parent)?;
            return Ok(true);
        }

        if self.is_sequence_expression(parent) {
            let expressions = self.arena.list(parent_node, Field::Expressions);
            if expressions.len() == 2 {
                let current = self.path_node(path);
                if let Some(other) = expressions.iter().copied().find(|node| Some(*node) != current) {
                    self.replace_with(parent, other)?;
                    return Ok(true);
                }
            }
        }

        if self.is_binary(parent) {
            let other = match key {
                Some(Field::Left) => self.arena.child(parent_node, Field::Right),
                _ => self.arena.child(parent_node, Field::Left),
            };
            if let Some(other) = other {
                self.replace_with(parent, other)?;
                return Ok(true);
            }
        }

        let empty_block = match key {
            Some(Field::Consequent) => self.is_if_statement(parent),
            Some(Field::Body) if !self.in_list(path) => {
                self.is_loop(parent) || self.is_arrow_function_expression(parent)
            }
            _ => false,
        };
        if empty_block {
            let block = build::block_statement(&mut self.arena, Vec::new())?;
            self.replace_with(path, block)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Take the node out of its slot.
    fn remove_node(&mut self, path: PathId) -> Result<(), TraverseError> {
        let location = self.location(path);
        if let Location::Field { parent, field } = location {
            validate_slot(&self.arena, self.arena.kind(parent), field, &Child::None)?;
        }
        let old: Vec<_> = self.path_node(path).into_iter().collect();
        let orphans = self.release_subtrees(&old);
        match location {
            Location::Root => {
                return Err(TraverseError::InvalidOperation(
                    "the root cannot be removed".to_string(),
                ))
            }
            Location::Field { parent, field } => {
                self.arena.set_child(parent, field, Child::None)?;
            }
            Location::Element {
                parent,
                field,
                index,
            } => {
                self.arena.splice(parent, field, index, 1, Vec::new())?;
                self.update_sibling_keys(parent, field, index + 1, -1);
            }
        }
        debug!(%path, kind = %self.describe(path), "removed");
        self.settle_orphans(orphans)
    }

    /// Flag `path` as removed and forget its node.
    pub(crate) fn mark_removed(&mut self, path: PathId) {
        self.uncache(path);
        let data = &mut self.paths[path.index()];
        data.removed = true;
        data.should_skip = true;
        data.node = None;
    }
}

#[cfg(test)]
mod tests {
    use crate::options::TraverseOptions;
    use crate::session::Session;
    use serde_json::json;

    fn ident(name: &str) -> serde_json::Value {
        json!({ "type": "Identifier", "name": name })
    }

    #[test]
    fn removing_the_sole_declarator_removes_the_declaration() {
        let tree = json!({
            "type": "Program",
            "body": [
                {
                    "type": "VariableDeclaration",
                    "kind": "var",
                    "declarations": [{ "type": "VariableDeclarator", "id": ident("a"), "init": null }]
                },
                { "type": "ExpressionStatement", "expression": ident("a") }
            ]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let program = session.scope_of(root).unwrap();
        let declarator = session.get(root, "body.0.declarations.0").unwrap().one().unwrap();
        let declaration = session.get(root, "body.0").unwrap().one().unwrap();
        session.remove(declarator).unwrap();

        assert!(session.is_removed(declarator));
        assert!(session.is_removed(declaration));
        assert!(session.get_binding(program, "a").is_none());
        assert!(session.has_global(program, "a"));
        let json = session.to_json();
        assert_eq!(json["body"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn removing_a_binary_operand_keeps_the_other() {
        let tree = json!({
            "type": "Program",
            "body": [{
                "type": "ExpressionStatement",
                "expression": {
                    "type": "BinaryExpression",
                    "operator": "+",
                    "left": ident("a"),
                    "right": ident("b")
                }
            }]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let left = session.get(root, "body.0.expression.left").unwrap().one().unwrap();
        session.remove(left).unwrap();
        let json = session.to_json();
        assert_eq!(json["body"][0]["expression"], ident("b"));
    }

    #[test]
    fn removing_a_loop_body_leaves_an_empty_block() {
        let tree = json!({
            "type": "Program",
            "body": [{
                "type": "WhileStatement",
                "test": ident("x"),
                "body": { "type": "ExpressionStatement", "expression": ident("y") }
            }]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let body = session.get(root, "body.0.body").unwrap().one().unwrap();
        session.remove(body).unwrap();
        assert!(session.is_removed(body));
        let json = session.to_json();
        assert_eq!(json["body"][0]["body"]["type"], "BlockStatement");
        assert!(session.remove(body).is_err());
    }

    #[test]
    fn removed_siblings_shift_later_paths() {
        let tree = json!({
            "type": "Program",
            "body": [
                { "type": "EmptyStatement" },
                { "type": "DebuggerStatement" }
            ]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let first = session.get(root, "body.0").unwrap().one().unwrap();
        let second = session.get(root, "body.1").unwrap().one().unwrap();
        session.remove(first).unwrap();
        assert_eq!(session.list_index(second), Some(0));
        assert_eq!(session.get(root, "body.0").unwrap().one(), Some(second));
    }
}
