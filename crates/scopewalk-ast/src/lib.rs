// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! JavaScript syntax trees for scopewalk.
//!
//! This crate is the node catalog and the tree storage the traversal engine
//! works on:
//!
//! - **Catalog**: node kinds, their ordered child slots, alias groups and slot
//!   validation ([`catalog`]).
//! - **Arena**: nodes addressed by stable [`NodeId`]s ([`NodeArena`]).
//! - **Builders**: constructors for the nodes the engine synthesises ([`build`]).
//! - **Validators**: reference/binding position checks and binding
//!   identifier discovery ([`validators`]).
//! - **JSON**: Babel / ESTree import and export, the boundary to external
//!   parsers and code generators.
//!
//! # Quick Start
//!
//! ```
//! use scopewalk_ast::{Field, NodeArena, NodeKind};
//! use serde_json::json;
//!
//! let mut arena = NodeArena::new();
//! let program = arena
//!     .import_json(&json!({
//!         "type": "Program",
//!         "body": [{
//!             "type": "ExpressionStatement",
//!             "expression": { "type": "Identifier", "name": "x" }
//!         }]
//!     }))
//!     .expect("valid tree");
//! let statement = arena.list(program, Field::Body)[0];
//! assert_eq!(arena.kind(statement), NodeKind::ExpressionStatement);
//! ```

// ============================================================================
// Public modules and re-exports
// ============================================================================

pub mod arena;
pub mod build;
pub mod catalog;
pub mod error;
mod json;
pub mod node;
pub mod validators;

pub use arena::NodeArena;
pub use catalog::{
    is_of_type, validate_element, validate_slot, Alias, Field, FieldSpec, NodeKind, TypeName,
};
pub use error::AstError;
pub use node::{
    Child, Comment, CommentKind, DeclarationKind, MethodKind, Node, NodeFlags, NodeId, NodeValue,
    Span,
};
