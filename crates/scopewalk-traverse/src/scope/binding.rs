// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Bindings: one declared name, where it is declared, read and written.

use std::fmt;

use scopewalk_ast::NodeId;
use serde::Serialize;

use crate::path::evaluation::JsValue;
use crate::path::PathId;
use crate::scope::ScopeId;

/// Handle to a binding in a [`Session`](crate::Session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BindingId(pub(crate) u32);

impl BindingId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a name was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    /// Function declaration, hoisted to the enclosing function.
    Hoisted,
    Var,
    Let,
    Const,
    /// Function parameter.
    Param,
    /// Catch clause parameter; collides like `let`.
    Catch,
    /// Import specifier.
    Module,
    /// Name of a function or class expression, visible only inside it.
    Local,
    Unknown,
}

impl BindingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BindingKind::Hoisted => "hoisted",
            BindingKind::Var => "var",
            BindingKind::Let => "let",
            BindingKind::Const => "const",
            BindingKind::Param => "param",
            BindingKind::Catch => "catch",
            BindingKind::Module => "module",
            BindingKind::Local => "local",
            BindingKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared name and every place it is read or written.
#[derive(Debug, Clone)]
pub struct Binding {
    pub(crate) identifier: NodeId,
    pub(crate) scope: ScopeId,
    pub(crate) path: PathId,
    pub(crate) kind: BindingKind,
    pub(crate) constant: bool,
    pub(crate) referenced: bool,
    pub(crate) references: usize,
    pub(crate) reference_paths: Vec<PathId>,
    pub(crate) constant_violations: Vec<PathId>,
    pub(crate) value: Option<JsValue>,
    pub(crate) has_deopted_value: bool,
}

impl Binding {
    pub(crate) fn new(identifier: NodeId, scope: ScopeId, path: PathId, kind: BindingKind) -> Self {
        Binding {
            identifier,
            scope,
            path,
            kind,
            constant: true,
            referenced: false,
            references: 0,
            reference_paths: Vec::new(),
            constant_violations: Vec::new(),
            value: None,
            has_deopted_value: false,
        }
    }

    /// The declaring identifier node.
    pub fn identifier(&self) -> NodeId {
        self.identifier
    }

    /// The scope the binding belongs to.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Path to the declaring construct (declarator, function, parameter...).
    pub fn path(&self) -> PathId {
        self.path
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    /// True until the name is written after its declaration.
    pub fn is_constant(&self) -> bool {
        self.constant
    }

    pub fn is_referenced(&self) -> bool {
        self.referenced
    }

    pub fn references(&self) -> usize {
        self.references
    }

    pub fn reference_paths(&self) -> &[PathId] {
        &self.reference_paths
    }

    pub fn constant_violations(&self) -> &[PathId] {
        &self.constant_violations
    }

    /// Cached constant value, if one was computed and never invalidated.
    pub fn value(&self) -> Option<&JsValue> {
        self.value.as_ref()
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Record a read at `path`.
    pub fn reference(&mut self, path: PathId) {
        if self.reference_paths.contains(&path) {
            return;
        }
        self.referenced = true;
        self.references += 1;
        self.reference_paths.push(path);
    }

    /// Record a write at `path`. The binding stops being constant.
    pub fn reassign(&mut self, path: PathId) {
        self.constant = false;
        if self.constant_violations.contains(&path) {
            return;
        }
        self.constant_violations.push(path);
        self.value = None;
    }

    /// Cache a constant value, unless the binding was already deopted.
    pub fn set_value(&mut self, value: JsValue) {
        if self.has_deopted_value {
            return;
        }
        self.value = Some(value);
    }

    /// Permanently refuse a cached value.
    pub fn deopt_value(&mut self) {
        self.clear_value();
        self.has_deopted_value = true;
    }

    pub fn clear_value(&mut self) {
        self.value = None;
        self.has_deopted_value = false;
    }
}
