// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Unique names and hoisted temporaries.

use scopewalk_ast::validators::to_identifier;
use scopewalk_ast::{build, Alias, DeclarationKind, Field, NodeId, NodeKind, NodeValue};
use serde_json::Value;
use tracing::debug;

use crate::error::TraverseError;
use crate::path::PathId;
use crate::scope::{BindingId, BindingKind, HasBindingOptions, ScopeId};
use crate::session::Session;

/// Longest seed taken from a node when naming a temporary after it.
const MAX_NODE_SEED: usize = 20;

/// A declarator to add at the top of a scope's block.
#[derive(Debug, Clone)]
pub struct PushOptions {
    pub id: NodeId,
    pub init: Option<NodeId>,
    pub kind: DeclarationKind,
    /// Always start a new declaration instead of reusing the block's shared one.
    pub unique: bool,
}

impl PushOptions {
    /// `var <id>;`
    pub fn new(id: NodeId) -> Self {
        PushOptions {
            id,
            init: None,
            kind: DeclarationKind::Var,
            unique: false,
        }
    }

    pub fn init(mut self, init: NodeId) -> Self {
        self.init = Some(init);
        self
    }

    pub fn kind(mut self, kind: DeclarationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

impl Session {
    // ========================================================================
    // Unique names
    // ========================================================================

    /// Mint a name no label, binding, global or reference in the program uses.
    ///
    /// The seed is normalised to an identifier with leading underscores and
    /// trailing digits stripped; candidates are `_seed`, `_seed2`, `_seed3`...
    /// The result is recorded on the program scope, so later calls from any
    /// scope never return it again.
    pub fn generate_uid(&mut self, scope: ScopeId, seed: &str) -> String {
        let seed = to_identifier(seed);
        let seed = seed
            .trim_start_matches('_')
            .trim_end_matches(|c: char| c.is_ascii_digit())
            .to_string();
        let mut attempt = 1;
        let uid = loop {
            let candidate = if attempt > 1 {
                format!("_{}{}", seed, attempt)
            } else {
                format!("_{}", seed)
            };
            attempt += 1;
            let taken = self.has_label(scope, &candidate)
                || self.has_binding(scope, &candidate, HasBindingOptions::default())
                || self.has_global(scope, &candidate)
                || self.has_reference(scope, &candidate);
            if !taken {
                break candidate;
            }
        };
        let program = self.scope_program_parent(scope);
        let data = &mut self.scopes[program.index()];
        data.references.insert(uid.clone());
        data.uids.insert(uid.clone());
        uid
    }

    /// [`generate_uid`](Session::generate_uid) wrapped in a fresh identifier node.
    pub fn generate_uid_identifier(&mut self, scope: ScopeId, seed: &str) -> NodeId {
        let name = self.generate_uid(scope, seed);
        build::identifier(&mut self.arena, &name)
    }

    /// A uid seeded from the names found in `node` (`a.b.c` gives `_a$b$c`).
    pub fn generate_uid_based_on_node(&mut self, scope: ScopeId, node: NodeId, default_name: Option<&str>) -> String {
        let mut parts = Vec::new();
        gather_node_parts(&self.arena, node, &mut parts);
        let joined = parts.join("$");
        let trimmed = joined.strip_prefix('_').unwrap_or(&joined);
        let seed = if trimmed.is_empty() {
            default_name.unwrap_or("ref").to_string()
        } else {
            trimmed.chars().take(MAX_NODE_SEED).collect()
        };
        self.generate_uid(scope, &seed)
    }

    pub fn generate_uid_identifier_based_on_node(
        &mut self,
        scope: ScopeId,
        node: NodeId,
        default_name: Option<&str>,
    ) -> NodeId {
        let name = self.generate_uid_based_on_node(scope, node, default_name);
        build::identifier(&mut self.arena, &name)
    }

    /// Mint a uid, declare it with `var` at the top of `scope`'s block and
    /// return a new identifier for it.
    pub fn generate_declared_uid_identifier(&mut self, scope: ScopeId, seed: &str) -> Result<NodeId, TraverseError> {
        let name = self.generate_uid(scope, seed);
        let id = build::identifier(&mut self.arena, &name);
        self.push(scope, PushOptions::new(id))?;
        Ok(build::identifier(&mut self.arena, &name))
    }

    /// A temporary for `node` unless it is static and can be repeated as is.
    ///
    /// With `dont_push` the temporary is returned without being declared.
    pub fn maybe_generate_memoised(
        &mut self,
        scope: ScopeId,
        node: NodeId,
        dont_push: bool,
    ) -> Result<Option<NodeId>, TraverseError> {
        if self.is_static(scope, node) {
            return Ok(None);
        }
        let id = self.generate_uid_identifier_based_on_node(scope, node, None);
        if dont_push {
            return Ok(Some(id));
        }
        self.push(scope, PushOptions::new(id))?;
        let name = self.arena.name(id).unwrap_or_default().to_string();
        Ok(Some(build::identifier(&mut self.arena, &name)))
    }

    // ========================================================================
    // Push
    // ========================================================================

    /// Declare `options.id` in a variable declaration at the top of the block
    /// `scope` hoists into.
    ///
    /// Declarations of one kind share a single `var`/`let`/`const` statement
    /// per block unless `unique` is set. Loop, catch and function bodies are
    /// turned into blocks first when needed.
    pub fn push(&mut self, scope: ScopeId, options: PushOptions) -> Result<PathId, TraverseError> {
        let mut target = self.scope_path(scope);
        if !self.is_block_statement(target) && !self.is_program(target) {
            let block = self.scope_block_parent(scope);
            target = self.scope_path(block);
        }
        if self.is_switch_statement(target) {
            let hoist = self.scope_hoist_target(scope);
            target = self.scope_path(hoist);
        }
        if self.is_loop(target) || self.is_catch_clause(target) || self.is_function(target) {
            self.ensure_block(target)?;
            target = self.get_field(target, Field::Body)?;
        }

        let key = format!("declaration:{}:2", options.kind.as_str());
        let cached = if options.unique {
            None
        } else {
            self.cached_declaration(target, &key, options.kind)
        };
        let declaration = match cached {
            Some(path) => path,
            None => {
                let node = build::variable_declaration(&mut self.arena, options.kind, Vec::new())?;
                let inserted = self.unshift_container(target, Field::Body, vec![node])?;
                let path = inserted.first().copied().ok_or_else(|| {
                    TraverseError::InvalidOperation("declaration was not inserted".to_string())
                })?;
                if !options.unique {
                    self.set_data(target, &key, Value::from(path.0));
                }
                path
            }
        };

        let declarator = build::variable_declarator(&mut self.arena, options.id, options.init)?;
        let added = self.push_container(declaration, Field::Declarations, vec![declarator])?;
        let declarator_path = added.first().copied().ok_or_else(|| {
            TraverseError::InvalidOperation("declarator was not inserted".to_string())
        })?;
        let kind = match options.kind {
            DeclarationKind::Var => BindingKind::Var,
            DeclarationKind::Let => BindingKind::Let,
            DeclarationKind::Const => BindingKind::Const,
        };
        let owner = self.scope_of(target)?;
        self.register_binding(owner, kind, declarator_path, declarator_path)?;
        debug!(
            name = self.arena.name(options.id).unwrap_or_default(),
            kind = options.kind.as_str(),
            "pushed declaration"
        );
        Ok(declarator_path)
    }

    /// The shared declaration recorded under `key`, if it is still in place.
    fn cached_declaration(&mut self, target: PathId, key: &str, kind: DeclarationKind) -> Option<PathId> {
        let index = self.get_data(target, key)?.as_u64()?;
        let path = PathId(u32::try_from(index).ok()?);
        if path.index() >= self.paths.len() {
            return None;
        }
        self.resync(path);
        let node = self.path_node(path)?;
        let in_place = !self.is_removed(path)
            && !self.is_detached(path)
            && self.parent_node(path) == self.path_node(target)
            && self.arena.get(node).declaration_kind() == Some(kind);
        in_place.then_some(path)
    }

    // ========================================================================
    // Hoisting
    // ========================================================================

    /// Move the `var` declarations of `scope` up into `into`.
    ///
    /// Every declared name becomes a `var` of `into`. Declarators with an
    /// initialiser turn into assignments and the rest disappear; a declaration
    /// on the left of a `for`-`in`/`of` leaves its identifier behind.
    pub(crate) fn hoist_variables(&mut self, scope: ScopeId, into: ScopeId) -> Result<(), TraverseError> {
        let mut declarations: Vec<PathId> = Vec::new();
        let bindings: Vec<BindingId> = self.own_bindings(scope).values().copied().collect();
        for binding in bindings {
            let record = self.binding(binding);
            if record.kind() != BindingKind::Var {
                continue;
            }
            let Some(parent) = self.parent_path(record.path()) else {
                continue;
            };
            if self.is_variable_declaration(parent) && !declarations.contains(&parent) {
                declarations.push(parent);
            }
        }
        if declarations.is_empty() {
            return Ok(());
        }

        let mut names: Vec<String> = Vec::new();
        let mut rewrites = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            let mut first_id = None;
            let mut assignments = Vec::new();
            for declarator in self.get_list(declaration, Field::Declarations)? {
                let node = self.require_node(declarator)?;
                let Some(id) = self.arena.child(node, Field::Id) else {
                    continue;
                };
                first_id.get_or_insert(id);
                for name in self.get_binding_identifiers(declarator).into_keys() {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
                if let Some(init) = self.arena.child(node, Field::Init) {
                    assignments.push((id, init));
                }
            }
            rewrites.push((declaration, first_id, assignments));
        }

        // Declared outside first, so references released below re-resolve to
        // the hoisted bindings.
        for name in &names {
            let id = build::identifier(&mut self.arena, name);
            self.push(into, PushOptions::new(id))?;
        }

        for (declaration, first_id, assignments) in rewrites {
            self.resync(declaration);
            let in_for_head = self.key(declaration) == Some(Field::Left)
                && self
                    .parent_path(declaration)
                    .is_some_and(|parent| self.is_type(parent, Alias::ForXStatement));
            if in_for_head {
                if let Some(id) = first_id {
                    self.replace_with(declaration, id)?;
                }
                continue;
            }
            let mut expressions = Vec::with_capacity(assignments.len());
            for (id, init) in assignments {
                expressions.push(build::assignment_expression(&mut self.arena, "=", id, init)?);
            }
            match expressions.len() {
                0 => self.remove(declaration)?,
                1 => {
                    self.replace_with(declaration, expressions[0])?;
                }
                _ if self.in_list(declaration) => {
                    let mut statements = Vec::with_capacity(expressions.len());
                    for expression in expressions {
                        statements.push(build::expression_statement(&mut self.arena, expression)?);
                    }
                    self.replace_with_multiple(declaration, statements)?;
                }
                _ => {
                    let sequence = build::sequence_expression(&mut self.arena, expressions)?;
                    self.replace_with(declaration, sequence)?;
                }
            }
        }
        debug!(count = names.len(), "hoisted var declarations");
        Ok(())
    }
}

/// Collect name fragments of `node` for
/// [`generate_uid_based_on_node`](Session::generate_uid_based_on_node).
fn gather_node_parts(arena: &scopewalk_ast::NodeArena, node: NodeId, parts: &mut Vec<String>) {
    let record = arena.get(node);
    let recurse = |field: Field, parts: &mut Vec<String>| {
        if let Some(child) = arena.child(node, field) {
            gather_node_parts(arena, child, parts);
        }
    };
    match record.kind() {
        NodeKind::ImportDeclaration | NodeKind::ExportNamedDeclaration | NodeKind::ExportAllDeclaration => {
            recurse(Field::Source, parts);
        }
        NodeKind::ExportDefaultDeclaration => recurse(Field::Declaration, parts),
        NodeKind::ImportSpecifier
        | NodeKind::ImportDefaultSpecifier
        | NodeKind::ImportNamespaceSpecifier
        | NodeKind::ExportSpecifier => recurse(Field::Local, parts),
        NodeKind::Identifier => parts.extend(record.name().map(str::to_string)),
        NodeKind::StringLiteral | NodeKind::NumericLiteral | NodeKind::BooleanLiteral | NodeKind::BigIntLiteral => {
            match &record.value {
                NodeValue::String(value) | NodeValue::BigInt(value) => parts.push(value.clone()),
                NodeValue::Number(value) => {
                    parts.push(crate::path::evaluation::number_to_string(*value));
                }
                NodeValue::Boolean(value) => parts.push(value.to_string()),
                _ => {}
            }
        }
        NodeKind::MemberExpression => {
            recurse(Field::Object, parts);
            recurse(Field::Property, parts);
        }
        NodeKind::CallExpression | NodeKind::NewExpression => recurse(Field::Callee, parts),
        NodeKind::ObjectExpression | NodeKind::ObjectPattern => {
            for property in arena.list(node, Field::Properties) {
                gather_node_parts(arena, *property, parts);
            }
        }
        NodeKind::ObjectProperty | NodeKind::ObjectMethod | NodeKind::ClassMethod | NodeKind::ClassProperty => {
            recurse(Field::Key, parts);
        }
        NodeKind::ThisExpression => parts.push("this".to_string()),
        NodeKind::Super => parts.push("super".to_string()),
        NodeKind::FunctionExpression
        | NodeKind::FunctionDeclaration
        | NodeKind::ClassExpression
        | NodeKind::ClassDeclaration => recurse(Field::Id, parts),
        NodeKind::AssignmentExpression | NodeKind::AssignmentPattern => recurse(Field::Left, parts),
        NodeKind::VariableDeclarator => recurse(Field::Id, parts),
        NodeKind::AwaitExpression => {
            parts.push("await".to_string());
            recurse(Field::Argument, parts);
        }
        NodeKind::YieldExpression => {
            parts.push("yield".to_string());
            recurse(Field::Argument, parts);
        }
        NodeKind::UnaryExpression
        | NodeKind::UpdateExpression
        | NodeKind::SpreadElement
        | NodeKind::RestElement => recurse(Field::Argument, parts),
        NodeKind::ParenthesizedExpression => recurse(Field::Expression, parts),
        NodeKind::MetaProperty => {
            recurse(Field::Meta, parts);
            recurse(Field::Property, parts);
        }
        NodeKind::TaggedTemplateExpression => recurse(Field::Tag, parts),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use crate::options::TraverseOptions;
    use crate::session::Session;
    use serde_json::json;

    fn session() -> Session {
        let tree = json!({
            "type": "Program",
            "body": [{
                "type": "VariableDeclaration",
                "kind": "var",
                "declarations": [{
                    "type": "VariableDeclarator",
                    "id": { "type": "Identifier", "name": "_temp" },
                    "init": null
                }]
            }]
        });
        Session::from_json(&tree, TraverseOptions::default()).unwrap()
    }

    #[test]
    fn uids_skip_taken_names() {
        let mut session = session();
        let root = session.root_path();
        let scope = session.scope_of(root).unwrap();
        assert_eq!(session.generate_uid(scope, "temp"), "_temp2");
        assert_eq!(session.generate_uid(scope, "temp"), "_temp3");
        assert_eq!(session.generate_uid(scope, "__temp7"), "_temp4");
        assert!(session.has_uid(scope, "_temp2"));
    }

    #[test]
    fn uid_based_on_member_chain() {
        let tree = json!({
            "type": "Program",
            "body": [{
                "type": "ExpressionStatement",
                "expression": {
                    "type": "MemberExpression",
                    "object": { "type": "Identifier", "name": "foo" },
                    "property": { "type": "Identifier", "name": "bar" },
                    "computed": false
                }
            }]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let scope = session.scope_of(root).unwrap();
        let member = session.get(root, "body.0.expression").unwrap().one().unwrap();
        let node = session.path_node(member).unwrap();
        assert_eq!(session.generate_uid_based_on_node(scope, node, None), "_foo$bar");
    }

    #[test]
    fn push_reuses_one_declaration_per_kind() {
        let mut session = session();
        let root = session.root_path();
        let scope = session.scope_of(root).unwrap();
        let first = session.generate_declared_uid_identifier(scope, "a").unwrap();
        let second = session.generate_declared_uid_identifier(scope, "b").unwrap();
        assert_ne!(first, second);

        let body = session.get(root, "body").unwrap().many().unwrap();
        assert_eq!(body.len(), 2);
        let declarations = session.get(body[0], "declarations").unwrap().many().unwrap();
        assert_eq!(declarations.len(), 2);
        let a = session.get_own_binding(scope, "_a").unwrap();
        assert_eq!(session.binding(a).kind(), crate::scope::BindingKind::Var);
        assert!(session.get_own_binding(scope, "_b").is_some());
    }
}
