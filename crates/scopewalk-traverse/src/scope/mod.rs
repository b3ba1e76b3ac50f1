// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Lexical scopes.
//!
//! A scope is created for every path whose node introduces one (program,
//! functions, blocks, loops, catch clauses, classes, switch statements) and is
//! cached by node. Scopes do not store their parent: it is found by walking
//! up the path tree to the nearest scope-introducing path, so a scope that is
//! moved with its node follows it.
//!
//! The first time a scope is needed it is initialised by a crawl
//! ([`collector`]), which fills the bindings of that scope and of every scope
//! nested inside it in one pass.

use std::collections::{HashMap, HashSet};
use std::fmt;

use indexmap::IndexMap;
use scopewalk_ast::{Alias, DeclarationKind, Field, NodeId, NodeKind};
use serde::Serialize;
use serde_json::Value;

use crate::error::TraverseError;
use crate::path::PathId;
use crate::session::Session;

pub mod binding;
pub(crate) mod collector;
mod purity;
mod rename;
mod uid;

pub use binding::{Binding, BindingId, BindingKind};
pub use uid::PushOptions;

/// Handle to a scope in a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScopeId(pub(crate) u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope_{}", self.0)
    }
}

/// Names that always resolve, even without a declaration.
const CONTEXT_VARIABLES: &[&str] = &["arguments", "undefined", "Infinity", "NaN"];

/// Standard built-in globals.
const BUILTIN_GLOBALS: &[&str] = &[
    "Array", "ArrayBuffer", "Atomics", "BigInt", "BigInt64Array", "BigUint64Array", "Boolean",
    "DataView", "Date", "Error", "EvalError", "FinalizationRegistry", "Float32Array",
    "Float64Array", "Function", "Infinity", "Int16Array", "Int32Array", "Int8Array", "Intl",
    "JSON", "Map", "Math", "NaN", "Number", "Object", "Promise", "Proxy", "RangeError",
    "ReferenceError", "Reflect", "RegExp", "Set", "SharedArrayBuffer", "String", "Symbol",
    "SyntaxError", "TypeError", "URIError", "Uint16Array", "Uint32Array", "Uint8Array",
    "Uint8ClampedArray", "WeakMap", "WeakRef", "WeakSet", "decodeURI", "decodeURIComponent",
    "encodeURI", "encodeURIComponent", "escape", "eval", "globalThis", "isFinite", "isNaN",
    "parseFloat", "parseInt", "undefined", "unescape",
];

/// Registry record for one scope.
#[derive(Debug, Clone)]
pub(crate) struct ScopeData {
    pub(crate) path: PathId,
    pub(crate) block: NodeId,
    pub(crate) bindings: IndexMap<String, BindingId>,
    pub(crate) labels: IndexMap<String, PathId>,
    /// Every name declared or minted anywhere below (program scope only).
    pub(crate) references: HashSet<String>,
    /// Names used without a declaration (program scope only).
    pub(crate) globals: IndexMap<String, NodeId>,
    /// Names handed out by uid generation (program scope only).
    pub(crate) uids: HashSet<String>,
    pub(crate) data: HashMap<String, Value>,
    pub(crate) inited: bool,
    pub(crate) crawling: bool,
}

impl ScopeData {
    fn new(path: PathId, block: NodeId) -> Self {
        ScopeData {
            path,
            block,
            bindings: IndexMap::new(),
            labels: IndexMap::new(),
            references: HashSet::new(),
            globals: IndexMap::new(),
            uids: HashSet::new(),
            data: HashMap::new(),
            inited: false,
            crawling: false,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.bindings.clear();
        self.labels.clear();
        self.references.clear();
        self.globals.clear();
        self.uids.clear();
        self.data.clear();
    }
}

/// Options for [`has_binding`](Session::has_binding).
#[derive(Debug, Clone, Copy, Default)]
pub struct HasBindingOptions {
    /// Do not count built-in globals and context variables.
    pub no_globals: bool,
    /// Do not count generated uids.
    pub no_uids: bool,
}

impl Session {
    // ========================================================================
    // Scope creation
    // ========================================================================

    /// Compute the scope of `path` unless its context disables scopes.
    pub(crate) fn set_scope(&mut self, path: PathId) -> Result<(), TraverseError> {
        if self.context_no_scope(path) {
            return Ok(());
        }
        self.compute_scope(path).map(|_| ())
    }

    fn compute_scope(&mut self, path: PathId) -> Result<Option<ScopeId>, TraverseError> {
        let mut parent = self.parent_path(path);
        // A method key is evaluated outside the method's scope.
        if self.key(path) == Some(Field::Key) {
            if let Some(method) = parent {
                if self.is_type(method, Alias::Method) {
                    parent = self.parent_path(method);
                }
            }
        }
        let target = match parent {
            Some(parent) => Some(self.scope_of(parent)?),
            None => None,
        };
        let scope = self.get_scope(path, target);
        self.paths[path.index()].scope = scope;
        if let Some(scope) = scope {
            self.init_scope(scope)?;
        }
        Ok(scope)
    }

    /// Own scope of `path` if its node introduces one, else `target`.
    fn get_scope(&mut self, path: PathId, target: Option<ScopeId>) -> Option<ScopeId> {
        if !self.is_scope(path) {
            return target;
        }
        let node = self.path_node(path)?;
        if let Some(&scope) = self.scope_cache.get(&node) {
            if self.scopes[scope.index()].path == path {
                return Some(scope);
            }
        }
        let scope = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeData::new(path, node));
        self.scope_cache.insert(node, scope);
        Some(scope)
    }

    fn init_scope(&mut self, scope: ScopeId) -> Result<(), TraverseError> {
        if self.scopes[scope.index()].inited {
            return Ok(());
        }
        self.scopes[scope.index()].inited = true;
        self.crawl(scope)
    }

    /// The scope `path` belongs to, computing (and crawling) it on first use.
    pub fn scope_of(&mut self, path: PathId) -> Result<ScopeId, TraverseError> {
        if let Some(scope) = self.paths[path.index()].scope {
            return Ok(scope);
        }
        self.compute_scope(path)?.ok_or_else(|| TraverseError::NoScope {
            kind: self.describe(path),
        })
    }

    /// The scope already computed for `path`, if any.
    pub fn path_scope(&self, path: PathId) -> Option<ScopeId> {
        self.paths[path.index()].scope
    }

    // ========================================================================
    // Scope structure
    // ========================================================================

    /// Path of the node that introduces `scope`.
    pub fn scope_path(&self, scope: ScopeId) -> PathId {
        self.scopes[scope.index()].path
    }

    /// The node that introduces `scope`.
    pub fn scope_block(&self, scope: ScopeId) -> NodeId {
        self.scopes[scope.index()].block
    }

    /// All scopes created so far, in creation order.
    pub fn scopes(&self) -> impl Iterator<Item = ScopeId> + '_ {
        (0..self.scopes.len() as u32).map(ScopeId)
    }

    /// Nearest enclosing scope.
    pub fn scope_parent(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut path = self.scope_path(scope);
        loop {
            let is_key = self.key(path) == Some(Field::Key);
            path = self.parent_path(path)?;
            if is_key && self.is_type(path, Alias::Method) {
                path = self.parent_path(path)?;
            }
            if !self.is_scope(path) {
                continue;
            }
            if let Some(node) = self.path_node(path) {
                if let Some(&parent) = self.scope_cache.get(&node) {
                    return Some(parent);
                }
            }
        }
    }

    /// `scope` and its ancestors, innermost first.
    pub fn scope_chain(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![scope];
        let mut current = scope;
        while let Some(parent) = self.scope_parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    fn scope_kind_is(&self, scope: ScopeId, alias: Alias) -> bool {
        self.arena.is(self.scope_block(scope), alias)
    }

    /// The program scope (or the outermost scope of a tree without one).
    pub fn scope_program_parent(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        loop {
            if self.arena.kind(self.scope_block(current)) == NodeKind::Program {
                return current;
            }
            match self.scope_parent(current) {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// Nearest function-like scope, `scope` included.
    pub fn scope_function_parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scope_chain(scope)
            .into_iter()
            .find(|candidate| self.scope_kind_is(*candidate, Alias::FunctionParent))
    }

    /// Nearest function-like scope, falling back to the program scope.
    pub(crate) fn scope_hoist_target(&self, scope: ScopeId) -> ScopeId {
        self.scope_function_parent(scope)
            .unwrap_or_else(|| self.scope_program_parent(scope))
    }

    /// Nearest block-like scope, `scope` included.
    pub fn scope_block_parent(&self, scope: ScopeId) -> ScopeId {
        self.scope_chain(scope)
            .into_iter()
            .find(|candidate| self.scope_kind_is(*candidate, Alias::BlockParent))
            .unwrap_or_else(|| self.scope_program_parent(scope))
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn binding(&self, binding: BindingId) -> &Binding {
        &self.bindings[binding.index()]
    }

    pub fn binding_mut(&mut self, binding: BindingId) -> &mut Binding {
        &mut self.bindings[binding.index()]
    }

    /// Current name of a binding (its identifier's name).
    pub fn binding_name(&self, binding: BindingId) -> Option<&str> {
        self.arena.name(self.binding(binding).identifier)
    }

    /// Own bindings of `scope`, in declaration order.
    pub fn own_bindings(&self, scope: ScopeId) -> &IndexMap<String, BindingId> {
        &self.scopes[scope.index()].bindings
    }

    pub fn get_own_binding(&self, scope: ScopeId, name: &str) -> Option<BindingId> {
        self.scopes[scope.index()].bindings.get(name).copied()
    }

    pub fn has_own_binding(&self, scope: ScopeId, name: &str) -> bool {
        self.get_own_binding(scope, name).is_some()
    }

    /// Resolve `name` from `scope` outward. `None` means the name is free.
    pub fn get_binding(&self, scope: ScopeId, name: &str) -> Option<BindingId> {
        let mut current = Some(scope);
        while let Some(candidate) = current {
            if let Some(binding) = self.get_own_binding(candidate, name) {
                return Some(binding);
            }
            current = self.scope_parent(candidate);
        }
        None
    }

    /// Declaring identifier of the binding `name` resolves to.
    pub fn get_binding_identifier(&self, scope: ScopeId, name: &str) -> Option<NodeId> {
        self.get_binding(scope, name)
            .map(|binding| self.binding(binding).identifier)
    }

    pub fn get_own_binding_identifier(&self, scope: ScopeId, name: &str) -> Option<NodeId> {
        self.get_own_binding(scope, name)
            .map(|binding| self.binding(binding).identifier)
    }

    /// Returns true if `name` resolves to a binding whose identifier is `node`.
    pub fn binding_identifier_equals(&self, scope: ScopeId, name: &str, node: NodeId) -> bool {
        self.get_binding_identifier(scope, name) == Some(node)
    }

    /// Returns true if `name` is declared in the chain, was minted as a uid,
    /// or is a built-in global.
    pub fn has_binding(&self, scope: ScopeId, name: &str, options: HasBindingOptions) -> bool {
        if name.is_empty() {
            return false;
        }
        if self.get_binding(scope, name).is_some() {
            return true;
        }
        if !options.no_uids && self.has_uid(scope, name) {
            return true;
        }
        if !options.no_globals
            && (BUILTIN_GLOBALS.contains(&name) || CONTEXT_VARIABLES.contains(&name))
        {
            return true;
        }
        false
    }

    /// Returns true if an enclosing scope (not `scope` itself) declares `name`.
    pub fn parent_has_binding(&self, scope: ScopeId, name: &str, options: HasBindingOptions) -> bool {
        self.scope_parent(scope)
            .is_some_and(|parent| self.has_binding(parent, name, options))
    }

    pub fn has_global(&self, scope: ScopeId, name: &str) -> bool {
        self.scope_chain(scope)
            .into_iter()
            .any(|candidate| self.scopes[candidate.index()].globals.contains_key(name))
    }

    pub fn has_uid(&self, scope: ScopeId, name: &str) -> bool {
        self.scope_chain(scope)
            .into_iter()
            .any(|candidate| self.scopes[candidate.index()].uids.contains(name))
    }

    /// Returns true if `name` was declared or minted anywhere in the program.
    pub fn has_reference(&self, scope: ScopeId, name: &str) -> bool {
        let program = self.scope_program_parent(scope);
        self.scopes[program.index()].references.contains(name)
    }

    /// Free names used in the program, with one identifier for each.
    pub fn globals(&self, scope: ScopeId) -> &IndexMap<String, NodeId> {
        let program = self.scope_program_parent(scope);
        &self.scopes[program.index()].globals
    }

    /// Every binding visible from `scope`; inner declarations win.
    pub fn get_all_bindings(&self, scope: ScopeId) -> IndexMap<String, BindingId> {
        let mut all = IndexMap::new();
        for candidate in self.scope_chain(scope) {
            for (name, binding) in &self.scopes[candidate.index()].bindings {
                all.entry(name.clone()).or_insert(*binding);
            }
        }
        all
    }

    /// Visible bindings of the given kinds.
    pub fn get_all_bindings_of_kind(
        &self,
        scope: ScopeId,
        kinds: &[BindingKind],
    ) -> IndexMap<String, BindingId> {
        self.get_all_bindings(scope)
            .into_iter()
            .filter(|(_, binding)| kinds.contains(&self.binding(*binding).kind))
            .collect()
    }

    // ========================================================================
    // Binding maintenance
    // ========================================================================

    /// Move the binding `name` resolves to into `target`.
    pub fn move_binding_to(&mut self, scope: ScopeId, name: &str, target: ScopeId) {
        let Some(binding) = self.get_binding(scope, name) else {
            return;
        };
        let owner = self.binding(binding).scope;
        self.scopes[owner.index()].bindings.shift_remove(name);
        self.bindings[binding.index()].scope = target;
        self.scopes[target.index()]
            .bindings
            .insert(name.to_string(), binding);
    }

    pub fn remove_own_binding(&mut self, scope: ScopeId, name: &str) {
        self.scopes[scope.index()].bindings.shift_remove(name);
    }

    /// Remove the binding `name` resolves to and forget `name` as a uid.
    pub fn remove_binding(&mut self, scope: ScopeId, name: &str) {
        if let Some(binding) = self.get_binding(scope, name) {
            let owner = self.binding(binding).scope;
            self.remove_own_binding(owner, name);
        }
        for candidate in self.scope_chain(scope) {
            self.scopes[candidate.index()].uids.remove(name);
        }
    }

    /// Record `node` (an identifier) as a free name of the program.
    pub fn add_global(&mut self, scope: ScopeId, node: NodeId) {
        let Some(name) = self.arena.name(node).map(str::to_string) else {
            return;
        };
        let program = self.scope_program_parent(scope);
        self.scopes[program.index()].globals.insert(name, node);
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register the names declared by the construct at `path` in `scope`.
    pub fn register_declaration(&mut self, scope: ScopeId, path: PathId) -> Result<(), TraverseError> {
        let Some(node) = self.path_node(path) else {
            return Ok(());
        };
        match self.arena.kind(node) {
            NodeKind::LabeledStatement => self.register_label(scope, path),
            NodeKind::FunctionDeclaration => {
                let id = self.get_field(path, Field::Id)?;
                self.register_binding(scope, BindingKind::Hoisted, id, path)?;
            }
            NodeKind::VariableDeclaration => {
                let kind = match self.arena.get(node).declaration_kind() {
                    Some(DeclarationKind::Let) => BindingKind::Let,
                    Some(DeclarationKind::Const) => BindingKind::Const,
                    _ => BindingKind::Var,
                };
                for declarator in self.get_list(path, Field::Declarations)? {
                    self.register_binding(scope, kind, declarator, declarator)?;
                }
            }
            NodeKind::ClassDeclaration => {
                self.register_binding(scope, BindingKind::Let, path, path)?;
            }
            NodeKind::ImportDeclaration => {
                for specifier in self.get_list(path, Field::Specifiers)? {
                    self.register_binding(scope, BindingKind::Module, specifier, specifier)?;
                }
            }
            kind if kind.has_alias(Alias::ExportDeclaration) => {
                if kind == NodeKind::ExportAllDeclaration {
                    return Ok(());
                }
                let declaration = self.get_field(path, Field::Declaration)?;
                let registrable = self.is_class_declaration(declaration)
                    || self.is_function_declaration(declaration)
                    || self.is_variable_declaration(declaration);
                if registrable {
                    self.register_declaration(scope, declaration)?;
                }
            }
            _ => {
                self.register_binding(scope, BindingKind::Unknown, path, path)?;
            }
        }
        Ok(())
    }

    /// Register every outer binding identifier of `path` as `kind` in `scope`.
    ///
    /// `binding_path` becomes the binding's declaration path. A name already
    /// bound in `scope` either raises [`TraverseError::DuplicateDeclaration`]
    /// or is recorded as a reassignment of the existing binding.
    pub fn register_binding(
        &mut self,
        scope: ScopeId,
        kind: BindingKind,
        path: PathId,
        binding_path: PathId,
    ) -> Result<(), TraverseError> {
        if self.is_variable_declaration(path) {
            for declarator in self.get_list(path, Field::Declarations)? {
                self.register_binding(scope, kind, declarator, declarator)?;
            }
            return Ok(());
        }
        let program = self.scope_program_parent(scope);
        let ids = self.get_outer_binding_identifiers(path);
        for (name, nodes) in ids {
            self.scopes[program.index()].references.insert(name.clone());
            for id in nodes {
                match self.get_own_binding(scope, &name) {
                    Some(local) => {
                        if self.binding(local).identifier == id {
                            continue;
                        }
                        check_block_scoped_collisions(self.binding(local).kind, kind, &name)?;
                        self.bindings[local.index()].reassign(binding_path);
                    }
                    None => {
                        let binding = BindingId(self.bindings.len() as u32);
                        let mut record = Binding::new(id, scope, binding_path, kind);
                        if matches!(kind, BindingKind::Var | BindingKind::Hoisted)
                            && self.is_declared_in_loop(binding_path)
                        {
                            record.reassign(binding_path);
                        }
                        self.bindings.push(record);
                        self.scopes[scope.index()]
                            .bindings
                            .insert(name.clone(), binding);
                    }
                }
            }
        }
        Ok(())
    }

    /// A `var` or function declared inside a loop body is rebound on every
    /// iteration, so it is never constant.
    fn is_declared_in_loop(&self, path: PathId) -> bool {
        let mut current = path;
        while let Some(parent) = self.parent_path(current) {
            if self.is_type(parent, Alias::FunctionParent) {
                return false;
            }
            if self.is_type(parent, Alias::While)
                || self.is_type(parent, Alias::ForXStatement)
                || (self.is_type(parent, NodeKind::ForStatement) && self.key(current) == Some(Field::Body))
            {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Reassign every binding the assignment-like node at `path` writes.
    pub fn register_constant_violation(&mut self, scope: ScopeId, path: PathId) {
        let Some(node) = self.path_node(path) else {
            return;
        };
        let names: Vec<String> = scopewalk_ast::validators::assignment_identifiers(&self.arena, node)
            .into_keys()
            .collect();
        for name in names {
            if let Some(binding) = self.get_binding(scope, &name) {
                self.bindings[binding.index()].reassign(path);
            }
        }
    }

    // ========================================================================
    // Labels and data
    // ========================================================================

    pub fn register_label(&mut self, scope: ScopeId, path: PathId) {
        let label = self
            .node_child(path, Field::Label)
            .and_then(|label| self.arena.name(label))
            .map(str::to_string);
        if let Some(name) = label {
            self.scopes[scope.index()].labels.insert(name, path);
        }
    }

    /// The labeled statement `name` refers to, searching outward.
    pub fn get_label(&self, scope: ScopeId, name: &str) -> Option<PathId> {
        self.scope_chain(scope)
            .into_iter()
            .find_map(|candidate| self.scopes[candidate.index()].labels.get(name).copied())
    }

    pub fn has_label(&self, scope: ScopeId, name: &str) -> bool {
        self.get_label(scope, name).is_some()
    }

    pub fn set_scope_data(&mut self, scope: ScopeId, key: &str, value: Value) {
        self.scopes[scope.index()].data.insert(key.to_string(), value);
    }

    /// Data stored under `key` on `scope` or the nearest ancestor that has it.
    pub fn get_scope_data(&self, scope: ScopeId, key: &str) -> Option<&Value> {
        self.scope_chain(scope)
            .into_iter()
            .find_map(|candidate| self.scopes[candidate.index()].data.get(key))
    }

    /// Remove `key` from `scope` and every ancestor.
    pub fn remove_scope_data(&mut self, scope: ScopeId, key: &str) {
        for candidate in self.scope_chain(scope) {
            self.scopes[candidate.index()].data.remove(key);
        }
    }
}

/// Declaring `kind` over an existing `existing` binding of the same name.
fn check_block_scoped_collisions(
    existing: BindingKind,
    kind: BindingKind,
    name: &str,
) -> Result<(), TraverseError> {
    if kind == BindingKind::Param || existing == BindingKind::Local {
        return Ok(());
    }
    let duplicate = matches!(kind, BindingKind::Let | BindingKind::Catch)
        || matches!(
            existing,
            BindingKind::Let | BindingKind::Const | BindingKind::Module | BindingKind::Catch
        )
        || (existing == BindingKind::Param && kind == BindingKind::Const);
    if duplicate {
        return Err(TraverseError::DuplicateDeclaration {
            name: name.to_string(),
            existing,
            kind,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn let_over_var_is_a_duplicate() {
        assert!(check_block_scoped_collisions(BindingKind::Var, BindingKind::Let, "x").is_err());
        assert!(check_block_scoped_collisions(BindingKind::Const, BindingKind::Var, "x").is_err());
        assert!(check_block_scoped_collisions(BindingKind::Param, BindingKind::Const, "x").is_err());
        assert!(check_block_scoped_collisions(BindingKind::Catch, BindingKind::Var, "x").is_err());
    }

    #[test]
    fn var_over_var_and_param_is_a_reassignment() {
        assert!(check_block_scoped_collisions(BindingKind::Var, BindingKind::Var, "x").is_ok());
        assert!(check_block_scoped_collisions(BindingKind::Param, BindingKind::Var, "x").is_ok());
        assert!(check_block_scoped_collisions(BindingKind::Hoisted, BindingKind::Hoisted, "f").is_ok());
        assert!(check_block_scoped_collisions(BindingKind::Local, BindingKind::Let, "f").is_ok());
    }
}
