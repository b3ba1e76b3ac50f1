//! JSON output types for CLI responses.
//!
//! Every response carries `status` first and `schema_version` second, so a
//! caller can check both before looking at the payload. Field order and
//! array order are deterministic for a given input.

use std::io::{self, Write};

use serde::Serialize;

use scopewalk_traverse::{BindingKind, JsValue};

use crate::error::{CliError, OutputErrorCode};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Scopes
// ============================================================================

/// One binding in a scope.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BindingInfo {
    pub name: String,
    pub kind: BindingKind,
    pub constant: bool,
    pub references: usize,
    pub violations: usize,
}

/// One scope with the bindings it owns.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScopeInfo {
    /// Index of the scope in creation order.
    pub id: u32,
    /// `program`, `function` or `block`.
    pub kind: &'static str,
    /// Node type of the scope owner.
    pub block: String,
    /// Enclosing scope, absent for the program.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    pub bindings: Vec<BindingInfo>,
}

/// Response for `scopes`.
#[derive(Debug, Clone, Serialize)]
pub struct ScopesResponse {
    pub status: String,
    pub schema_version: String,
    pub scopes: Vec<ScopeInfo>,
    /// Free names of the program, sorted.
    pub globals: Vec<String>,
}

impl ScopesResponse {
    pub fn new(scopes: Vec<ScopeInfo>, globals: Vec<String>) -> Self {
        ScopesResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            scopes,
            globals,
        }
    }
}

// ============================================================================
// Rename
// ============================================================================

/// Response for `rename`.
#[derive(Debug, Clone, Serialize)]
pub struct RenameResponse {
    pub status: String,
    pub schema_version: String,
    pub from: String,
    pub to: String,
    /// False when no binding named `from` was visible.
    pub renamed: bool,
    /// The tree after the rename.
    pub tree: serde_json::Value,
}

impl RenameResponse {
    pub fn new(from: &str, to: &str, renamed: bool, tree: serde_json::Value) -> Self {
        RenameResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            renamed,
            tree,
        }
    }
}

// ============================================================================
// Uid
// ============================================================================

/// Response for `uid`.
#[derive(Debug, Clone, Serialize)]
pub struct UidResponse {
    pub status: String,
    pub schema_version: String,
    pub seed: String,
    pub uids: Vec<String>,
}

impl UidResponse {
    pub fn new(seed: &str, uids: Vec<String>) -> Self {
        UidResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            seed: seed.to_string(),
            uids,
        }
    }
}

// ============================================================================
// Evaluate
// ============================================================================

/// The outcome for one top-level expression statement.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EvaluationInfo {
    /// Index of the statement in the program body.
    pub index: usize,
    pub confident: bool,
    /// The value, `null` when not constant. `undefined` also prints as `null`;
    /// check `type_of` to tell them apart.
    pub value: Option<JsValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_of: Option<&'static str>,
}

/// Response for `evaluate`.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluateResponse {
    pub status: String,
    pub schema_version: String,
    pub results: Vec<EvaluationInfo>,
}

impl EvaluateResponse {
    pub fn new(results: Vec<EvaluationInfo>) -> Self {
        EvaluateResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            results,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error information for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    /// Numeric error code, also the exit code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
}

impl ErrorInfo {
    pub fn from_error(err: &CliError) -> Self {
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &CliError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_version_come_first() {
        let response = UidResponse::new("tmp", vec!["_tmp".to_string()]);
        let mut out = Vec::new();
        emit_response(&response, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let status = text.find("\"status\"").unwrap();
        let version = text.find("\"schema_version\"").unwrap();
        let uids = text.find("\"uids\"").unwrap();
        assert!(status < version && version < uids);
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn error_response_carries_the_exit_code() {
        let err = CliError::invalid_args("count must be positive");
        let json = serde_json::to_value(ErrorResponse::from_error(&err)).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["code"], 2);
        assert_eq!(json["error"]["message"], "invalid arguments: count must be positive");
    }

    #[test]
    fn non_constant_values_print_as_null() {
        let info = EvaluationInfo {
            index: 0,
            confident: false,
            value: None,
            type_of: None,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert!(json["value"].is_null());
        assert!(json.get("type_of").is_none());
    }
}
