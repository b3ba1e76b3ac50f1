// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Typed predicates: `is_<kind>` / `assert_<kind>` for every node kind and
//! `is_<alias>` / `assert_<alias>` for every alias group.
//!
//! Generated from the catalog's kind and alias lists, so adding a kind to the
//! catalog adds its predicates here.

use scopewalk_ast::{Alias, NodeKind, TypeName};

use crate::error::TraverseError;
use crate::path::PathId;
use crate::session::Session;

impl Session {
    fn assert_type(&self, path: PathId, name: TypeName) -> Result<(), TraverseError> {
        if self.is_type(path, name) {
            Ok(())
        } else {
            Err(TraverseError::InvalidOperation(format!(
                "expected `{}`, found `{}` at {}",
                name,
                self.describe(path),
                self.location(path)
            )))
        }
    }
}

macro_rules! kind_predicates {
    ($($kind:ident),* $(,)?) => {
        paste::paste! {
            impl Session {
                $(
                    #[doc = concat!("Returns true if the node at `path` is a `", stringify!($kind), "`.")]
                    pub fn [<is_ $kind:snake>](&self, path: PathId) -> bool {
                        self.is_type(path, NodeKind::$kind)
                    }

                    #[doc = concat!("Fails unless the node at `path` is a `", stringify!($kind), "`.")]
                    pub fn [<assert_ $kind:snake>](&self, path: PathId) -> Result<(), TraverseError> {
                        self.assert_type(path, TypeName::Kind(NodeKind::$kind))
                    }
                )*
            }
        }
    };
}

macro_rules! alias_predicates {
    ($($alias:ident),* $(,)?) => {
        paste::paste! {
            impl Session {
                $(
                    #[doc = concat!("Returns true if the node at `path` belongs to `", stringify!($alias), "`.")]
                    pub fn [<is_ $alias:snake>](&self, path: PathId) -> bool {
                        self.is_type(path, Alias::$alias)
                    }

                    #[doc = concat!("Fails unless the node at `path` belongs to `", stringify!($alias), "`.")]
                    pub fn [<assert_ $alias:snake>](&self, path: PathId) -> Result<(), TraverseError> {
                        self.assert_type(path, TypeName::Alias(Alias::$alias))
                    }
                )*
            }
        }
    };
}

scopewalk_ast::for_each_node_kind!(kind_predicates);
scopewalk_ast::for_each_alias!(alias_predicates);

#[cfg(test)]
mod tests {
    use crate::options::TraverseOptions;
    use crate::session::Session;
    use serde_json::json;

    #[test]
    fn generated_predicates_cover_kinds_and_aliases() {
        let tree = json!({
            "type": "Program",
            "body": [{
                "type": "ForOfStatement",
                "left": { "type": "Identifier", "name": "x" },
                "right": { "type": "Identifier", "name": "xs" },
                "body": { "type": "EmptyStatement" }
            }]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let loop_path = session.get(root, "body.0").unwrap().one().unwrap();
        assert!(session.is_for_of_statement(loop_path));
        assert!(session.is_for_x_statement(loop_path));
        assert!(session.is_loop(loop_path));
        assert!(session.is_scopable(loop_path));
        assert!(!session.is_while(loop_path));
        assert!(session.assert_statement(loop_path).is_ok());
        assert!(session.assert_expression(loop_path).is_err());
        assert!(session.is_program(root));
    }
}
