// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Error types for traversal, scope analysis and tree mutation.
//!
//! Every failure here is a programming error in the calling visitor: placing a
//! node where the catalog forbids it, mutating a path that was already removed,
//! declaring a name twice, or re-queueing without end. Soft conditions (a name
//! with no binding, a missing list index) are not errors.

use scopewalk_ast::{AstError, Field, NodeKind};
use thiserror::Error;

use crate::scope::BindingKind;

/// Errors raised while traversing or editing a tree.
#[derive(Debug, Error, PartialEq)]
pub enum TraverseError {
    /// Catalog, arena or JSON failure.
    #[error(transparent)]
    Ast(#[from] AstError),

    /// The path was removed and can no longer be edited.
    #[error("path for `{kind}` was already removed")]
    PathRemoved { kind: String },

    /// The path has no parent slot to write into.
    #[error("no container for `{kind}` at {location}")]
    NoContainer { kind: String, location: String },

    /// A name was declared twice in one scope with incompatible kinds.
    #[error("duplicate declaration \"{name}\" ({existing} then {kind})")]
    DuplicateDeclaration {
        name: String,
        existing: BindingKind,
        kind: BindingKind,
    },

    /// The cycle guard tripped and another path was queued.
    #[error("infinite cycle detected: more than {limit} paths queued in one traversal context")]
    InfiniteCycle { limit: usize },

    /// No scope could be computed for the path.
    #[error("no scope for `{kind}`")]
    NoScope { kind: String },

    /// A `traverse_node` call without a parent path on a non-Program node.
    #[error("traversing a `{kind}` requires a parent path unless it is a Program")]
    MissingParentPath { kind: NodeKind },

    /// A list-only operation on a single slot, or the reverse.
    #[error("`{field}` of `{kind}` is not a {expected}")]
    WrongSlotShape {
        kind: NodeKind,
        field: Field,
        expected: &'static str,
    },

    /// The operation does not apply to this path.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}
