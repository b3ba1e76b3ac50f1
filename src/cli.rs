//! Command implementations behind the `scopewalk` binary.
//!
//! Each `run_*` function takes an open [`Session`] and returns a response
//! value; `main.rs` owns argument parsing, tracing and emission. Keeping the
//! commands here lets tests drive them without spawning the binary.

use std::fs;
use std::path::Path;

use tracing::info;

use scopewalk_ast::validators::is_valid_identifier;
use scopewalk_ast::{Alias, Field, NodeKind};
use scopewalk_traverse::{PathId, ScopeId, Session, TraverseOptions, VisitResult, Visitor};

use crate::error::CliError;
use crate::output::{
    BindingInfo, EvaluateResponse, EvaluationInfo, RenameResponse, ScopeInfo, ScopesResponse,
    UidResponse,
};

/// Read an ESTree JSON file and open a session over it.
pub fn load_session(input: &Path, options: TraverseOptions) -> Result<Session, CliError> {
    let text = fs::read_to_string(input).map_err(|e| CliError::FileNotFound {
        path: input.display().to_string(),
        message: e.to_string(),
    })?;
    let tree: serde_json::Value = serde_json::from_str(&text)?;
    let session = Session::from_json(&tree, options)?;
    info!(input = %input.display(), "tree loaded");
    Ok(session)
}

/// Resolve a dotted path such as `body.0.body` from the root, or the root
/// itself when `at` is absent.
fn resolve(session: &mut Session, at: Option<&str>) -> Result<PathId, CliError> {
    let root = session.root_path();
    let Some(at) = at else {
        return Ok(root);
    };
    session
        .get(root, at)?
        .one()
        .filter(|path| session.path_node(*path).is_some())
        .ok_or_else(|| CliError::NodeNotFound { at: at.to_string() })
}

// ============================================================================
// scopes
// ============================================================================

/// Crawl the program and describe every scope in pre-order.
pub fn run_scopes(session: &mut Session) -> Result<ScopesResponse, CliError> {
    let root = session.root_path();
    let program = session.scope_of(root)?;

    let visitor = Visitor::new().enter("Scope", |session, path, found: &mut Vec<ScopeId>| {
        let scope = session.scope_of(path)?;
        if !found.contains(&scope) {
            found.push(scope);
        }
        Ok(VisitResult::Continue)
    })?;
    let mut found = Vec::new();
    session.traverse(&visitor, &mut found)?;

    let scopes = found
        .into_iter()
        .map(|scope| describe_scope(session, scope))
        .collect();
    let mut globals: Vec<String> = session.globals(program).keys().cloned().collect();
    globals.sort();
    Ok(ScopesResponse::new(scopes, globals))
}

fn describe_scope(session: &Session, scope: ScopeId) -> ScopeInfo {
    let block = session.scope_block(scope);
    let arena = session.arena();
    let kind = if arena.kind(block) == NodeKind::Program {
        "program"
    } else if arena.is(block, Alias::Function) {
        "function"
    } else {
        "block"
    };
    let bindings = session
        .own_bindings(scope)
        .iter()
        .map(|(name, id)| {
            let binding = session.binding(*id);
            BindingInfo {
                name: name.clone(),
                kind: binding.kind(),
                constant: binding.is_constant(),
                references: binding.references(),
                violations: binding.constant_violations().len(),
            }
        })
        .collect();
    ScopeInfo {
        id: scope.index() as u32,
        kind,
        block: arena.kind(block).to_string(),
        parent: session.scope_parent(scope).map(|parent| parent.index() as u32),
        bindings,
    }
}

// ============================================================================
// rename
// ============================================================================

/// Rename the binding `from` visible at `at` (the program by default).
pub fn run_rename(
    session: &mut Session,
    from: &str,
    to: &str,
    at: Option<&str>,
) -> Result<RenameResponse, CliError> {
    if !is_valid_identifier(to) {
        return Err(CliError::invalid_args(format!("`{}` is not a valid identifier", to)));
    }
    let path = resolve(session, at)?;
    let scope = session.scope_of(path)?;
    let renamed = from != to && session.get_binding(scope, from).is_some();
    session.rename(scope, from, to)?;
    info!(from, to, renamed, "rename finished");
    Ok(RenameResponse::new(from, to, renamed, session.to_json()))
}

// ============================================================================
// uid
// ============================================================================

/// Mint `count` fresh names from `seed` in the program scope.
pub fn run_uid(session: &mut Session, seed: &str, count: usize) -> Result<UidResponse, CliError> {
    if count == 0 {
        return Err(CliError::invalid_args("--count must be at least 1"));
    }
    let root = session.root_path();
    let program = session.scope_of(root)?;
    let uids = (0..count)
        .map(|_| session.generate_uid(program, seed))
        .collect();
    Ok(UidResponse::new(seed, uids))
}

// ============================================================================
// evaluate
// ============================================================================

/// Evaluate each top-level expression statement.
pub fn run_evaluate(session: &mut Session) -> Result<EvaluateResponse, CliError> {
    let root = session.root_path();
    session.scope_of(root)?;
    let statements = session.get_list(root, Field::Body)?;
    let mut results = Vec::new();
    for (index, statement) in statements.into_iter().enumerate() {
        if !session.is_expression_statement(statement) {
            continue;
        }
        let expression = session.get_field(statement, Field::Expression)?;
        let info = match session.evaluate(expression) {
            Ok(value) => EvaluationInfo {
                index,
                confident: true,
                type_of: Some(value.type_of()),
                value: Some(value),
            },
            Err(_) => EvaluationInfo {
                index,
                confident: false,
                value: None,
                type_of: None,
            },
        };
        results.push(info);
    }
    Ok(EvaluateResponse::new(results))
}
