// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Turning single-statement and expression bodies into blocks.

use scopewalk_ast::{build, Field, NodeId};
use tracing::debug;

use crate::error::TraverseError;
use crate::path::{Location, PathId};
use crate::session::Session;

impl Session {
    /// Make the `body` of the node at `path` a block statement and return it.
    ///
    /// A statement body becomes the block's only statement; an expression
    /// body becomes `return <expr>;` in functions and `<expr>;` elsewhere.
    /// The path of the old body follows it into the block.
    pub fn ensure_block(&mut self, path: PathId) -> Result<NodeId, TraverseError> {
        self.resync(path);
        let node = self.require_node(path)?;
        let body = self.get_field(path, Field::Body)?;
        let Some(body_node) = self.path_node(body) else {
            return Err(TraverseError::InvalidOperation(format!(
                "`{}` has no body to convert",
                self.describe(path)
            )));
        };
        if self.is_block_statement(body) {
            return Ok(body_node);
        }

        let (statement, inner) = if self.is_statement(body) {
            (body_node, None)
        } else if self.is_function(path) {
            let statement = build::return_statement(&mut self.arena, Some(body_node))?;
            (statement, Some(Field::Argument))
        } else {
            let statement = build::expression_statement(&mut self.arena, body_node)?;
            (statement, Some(Field::Expression))
        };
        let block = build::block_statement(&mut self.arena, vec![statement])?;

        let orphans = self.release_subtrees(&[body_node]);
        self.arena.set_child(node, Field::Body, block)?;
        let block_path = self.path_at(
            Some(path),
            Location::Field {
                parent: node,
                field: Field::Body,
            },
        );
        let first = Location::Element {
            parent: block,
            field: Field::Body,
            index: 0,
        };
        match inner {
            None => self.rehome(body, block_path, first),
            Some(field) => {
                let statement_path = self.path_at(Some(block_path), first);
                self.rehome(
                    body,
                    statement_path,
                    Location::Field {
                        parent: statement,
                        field,
                    },
                );
            }
        }
        debug!(%path, kind = %self.describe(path), "body converted to a block");
        self.adopt_subtree(block_path)?;
        self.settle_orphans(orphans)?;
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use crate::options::TraverseOptions;
    use crate::session::Session;
    use serde_json::json;

    #[test]
    fn arrow_expression_body_becomes_a_return() {
        let tree = json!({
            "type": "Program",
            "body": [{
                "type": "ExpressionStatement",
                "expression": {
                    "type": "ArrowFunctionExpression",
                    "params": [{ "type": "Identifier", "name": "a" }],
                    "body": { "type": "Identifier", "name": "a" }
                }
            }]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let arrow = session.get(root, "body.0.expression").unwrap().one().unwrap();
        let body = session.get(arrow, "body").unwrap().one().unwrap();
        let scope = session.scope_of(arrow).unwrap();
        session.ensure_block(arrow).unwrap();

        let json = session.to_json();
        let block = &json["body"][0]["expression"]["body"];
        assert_eq!(block["type"], "BlockStatement");
        assert_eq!(block["body"][0]["type"], "ReturnStatement");
        assert_eq!(block["body"][0]["argument"]["name"], "a");

        assert_eq!(session.get(arrow, "body.body.0.argument").unwrap().one(), Some(body));
        let a = session.get_binding(scope, "a").unwrap();
        assert_eq!(session.binding(a).references(), 1);
    }

    #[test]
    fn loop_statement_body_is_wrapped() {
        let tree = json!({
            "type": "Program",
            "body": [{
                "type": "WhileStatement",
                "test": { "type": "Identifier", "name": "x" },
                "body": { "type": "EmptyStatement" }
            }]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let loop_path = session.get(root, "body.0").unwrap().one().unwrap();
        let block = session.ensure_block(loop_path).unwrap();
        assert_eq!(session.ensure_block(loop_path).unwrap(), block);
        let json = session.to_json();
        assert_eq!(json["body"][0]["body"]["body"][0]["type"], "EmptyStatement");
    }
}
