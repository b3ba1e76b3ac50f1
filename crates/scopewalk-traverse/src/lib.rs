// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Path-based traversal, lexical scope analysis and tree mutation.
//!
//! Everything hangs off a [`Session`], which owns the node arena together
//! with the registries the engine keeps about it:
//!
//! - **Paths** ([`PathId`]): stable cursors to one child slot. A path for a
//!   given `(parent, node)` pair is created once and reused, so two lookups of
//!   the same position compare equal.
//! - **Scopes** ([`ScopeId`]) and **bindings** ([`BindingId`]): built by a
//!   single crawl of the program and kept current as the tree is edited
//!   through the path API.
//! - **Traversal contexts**: the queues driving a [`Visitor`] walk. Callbacks
//!   may mutate the tree they are being driven over; replacements and
//!   insertions are queued and visited in the same walk.
//!
//! # Example
//!
//! ```
//! use scopewalk_traverse::{BindingKind, Session, TraverseOptions, VisitResult, Visitor};
//! use serde_json::json;
//!
//! let tree = json!({
//!     "type": "Program",
//!     "body": [{
//!         "type": "VariableDeclaration",
//!         "kind": "let",
//!         "declarations": [{
//!             "type": "VariableDeclarator",
//!             "id": { "type": "Identifier", "name": "n" },
//!             "init": { "type": "NumericLiteral", "value": 1 }
//!         }]
//!     }]
//! });
//! let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
//! let program = session.root_path();
//! let scope = session.scope_of(program).unwrap();
//! let binding = session.get_binding(scope, "n").unwrap();
//! assert_eq!(session.binding(binding).kind(), BindingKind::Let);
//!
//! let visitor = Visitor::new()
//!     .enter("BindingIdentifier", |session: &mut Session, path, names: &mut Vec<String>| {
//!         names.extend(session.node_name(path));
//!         Ok(VisitResult::Continue)
//!     })
//!     .unwrap();
//! let mut names = Vec::new();
//! session.traverse(&visitor, &mut names).unwrap();
//! assert_eq!(names, vec!["n".to_string()]);
//! ```

// ============================================================================
// Public modules and re-exports
// ============================================================================

mod context;
mod error;
pub mod options;
pub mod path;
pub mod scope;
mod session;
pub mod visitor;

pub use error::TraverseError;
pub use options::{CyclePolicy, TraverseOptions};
pub use path::evaluation::{JsValue, NotConstant};
pub use path::family::Got;
pub use path::{Location, PathId};
pub use scope::binding::{Binding, BindingId, BindingKind};
pub use scope::{PushOptions, ScopeId};
pub use session::Session;
pub use visitor::{Phase, VirtualType, VisitFn, VisitResult, Visitor};
