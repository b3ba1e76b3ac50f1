//! Compile-only test to verify public API surface.
//!
//! If this file fails to compile, the public API has regressed.

// Allow unused imports - this test is about compile-time verification, not runtime usage
#![allow(unused_imports)]

// ============================================================================
// Node catalog and arena
// ============================================================================

use scopewalk_ast::validators::{binding_identifiers, is_binding, is_referenced, is_valid_identifier};
use scopewalk_ast::{build, AstError, Alias, Child, Field, NodeArena, NodeId, NodeKind, TypeName};

// ============================================================================
// Traversal, paths and scopes
// ============================================================================

use scopewalk_traverse::scope::HasBindingOptions;
use scopewalk_traverse::{
    Binding, BindingId, BindingKind, CyclePolicy, Got, JsValue, Location, NotConstant, PathId,
    Phase, PushOptions, ScopeId, Session, TraverseError, TraverseOptions, VirtualType, VisitFn,
    VisitResult, Visitor,
};

// ============================================================================
// CLI front door
// ============================================================================

use scopewalk::cli::{load_session, run_evaluate, run_rename, run_scopes, run_uid};
use scopewalk::config::{Config, DEFAULT_CONFIG_FILE};
use scopewalk::error::{CliError, OutputErrorCode};
use scopewalk::output::{
    emit_response, BindingInfo, ErrorInfo, ErrorResponse, EvaluateResponse, EvaluationInfo,
    RenameResponse, ScopeInfo, ScopesResponse, UidResponse, SCHEMA_VERSION,
};

#[test]
fn api_surface_compiles() {
    // Only needs to compile.
}
