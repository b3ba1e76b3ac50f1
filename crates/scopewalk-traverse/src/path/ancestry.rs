// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Walking up from a path.

use scopewalk_ast::{Alias, NodeKind, TypeName};

use crate::error::TraverseError;
use crate::path::PathId;
use crate::session::Session;

impl Session {
    /// The first of `path` and its ancestors for which `predicate` holds.
    pub fn find(&self, path: PathId, mut predicate: impl FnMut(&Session, PathId) -> bool) -> Option<PathId> {
        let mut current = Some(path);
        while let Some(candidate) = current {
            if predicate(self, candidate) {
                return Some(candidate);
            }
            current = self.parent_path(candidate);
        }
        None
    }

    /// Like [`find`](Session::find), starting from the parent.
    pub fn find_parent(
        &self,
        path: PathId,
        predicate: impl FnMut(&Session, PathId) -> bool,
    ) -> Option<PathId> {
        self.parent_path(path)
            .and_then(|parent| self.find(parent, predicate))
    }

    /// Nearest enclosing function.
    pub fn get_function_parent(&self, path: PathId) -> Option<PathId> {
        self.find_parent(path, |session, candidate| session.is_type(candidate, Alias::Function))
    }

    /// Nearest path (itself included) that is a statement in a list.
    pub fn get_statement_parent(&self, path: PathId) -> Result<PathId, TraverseError> {
        let mut current = path;
        loop {
            if self.in_list(current) && self.is_type(current, Alias::Statement) {
                break;
            }
            match self.parent_path(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        if self.is_type(current, NodeKind::Program) {
            return Err(TraverseError::InvalidOperation(
                "a Program has no statement parent".to_string(),
            ));
        }
        Ok(current)
    }

    /// `path` followed by every ancestor, innermost first.
    pub fn get_ancestry(&self, path: PathId) -> Vec<PathId> {
        let mut out = vec![path];
        let mut current = path;
        while let Some(parent) = self.parent_path(current) {
            out.push(parent);
            current = parent;
        }
        out
    }

    /// Returns true if `ancestor` is a strict ancestor of `path`.
    pub fn is_ancestor(&self, ancestor: PathId, path: PathId) -> bool {
        self.find_parent(path, |_, candidate| candidate == ancestor)
            .is_some()
    }

    /// Returns true if `path` is a strict descendant of `ancestor`.
    pub fn is_descendant(&self, path: PathId, ancestor: PathId) -> bool {
        self.is_ancestor(ancestor, path)
    }

    /// Returns true if `path` or an ancestor is one of `names`.
    pub fn in_type(&self, path: PathId, names: &[TypeName]) -> bool {
        self.find(path, |session, candidate| {
            names.iter().any(|name| session.is_type(candidate, *name))
        })
        .is_some()
    }
}

#[cfg(test)]
mod tests {
    use crate::options::TraverseOptions;
    use crate::session::Session;
    use scopewalk_ast::{NodeKind, TypeName};
    use serde_json::json;

    #[test]
    fn ancestry_walks_to_the_root() {
        let tree = json!({
            "type": "Program",
            "body": [{
                "type": "FunctionDeclaration",
                "id": { "type": "Identifier", "name": "f" },
                "params": [],
                "body": { "type": "BlockStatement", "body": [{
                    "type": "ReturnStatement",
                    "argument": { "type": "Identifier", "name": "x" }
                }]}
            }]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let function = session.get(root, "body.0").unwrap().one().unwrap();
        let argument = session
            .get(root, "body.0.body.body.0.argument")
            .unwrap()
            .one()
            .unwrap();

        assert_eq!(session.get_function_parent(argument), Some(function));
        assert_eq!(session.get_ancestry(argument).len(), 5);
        assert!(session.is_ancestor(function, argument));
        assert!(session.is_descendant(argument, root));
        assert!(session.in_type(argument, &[TypeName::Kind(NodeKind::FunctionDeclaration)]));

        let statement = session.get_statement_parent(argument).unwrap();
        assert!(session.is_return_statement(statement));
        assert!(session.get_statement_parent(root).is_err());
    }
}
