// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Errors raised by the node catalog and arena.

use thiserror::Error;

use crate::catalog::{Field, NodeKind};
use crate::node::NodeId;

/// Errors from catalog lookups, slot validation and JSON import.
#[derive(Debug, Error, PartialEq)]
pub enum AstError {
    /// A `type` tag (or alias name) the catalog does not know.
    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),

    /// A property name that is not a child slot of any node type.
    #[error("unknown field name `{0}`")]
    UnknownFieldName(String),

    /// The node type has no such child slot.
    #[error("`{kind}` has no field `{field}`")]
    UnknownField { kind: NodeKind, field: Field },

    /// The candidate value is not allowed in the slot.
    #[error("`{parent}.{field}` expects {expected}, found {found}")]
    InvalidSlot {
        parent: NodeKind,
        field: Field,
        expected: String,
        found: String,
    },

    /// A list index past the end of the list.
    #[error("`{parent}.{field}` has no index {index}")]
    IndexOutOfBounds {
        parent: NodeId,
        field: Field,
        index: usize,
    },

    /// Structurally invalid JSON input.
    #[error("malformed node at {location}: {message}")]
    MalformedJson { location: String, message: String },
}

impl AstError {
    pub(crate) fn malformed(location: &str, message: impl Into<String>) -> Self {
        AstError::MalformedJson {
            location: location.to_string(),
            message: message.into(),
        }
    }
}
