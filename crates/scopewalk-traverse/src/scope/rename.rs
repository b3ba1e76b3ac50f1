// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Renaming a binding everywhere it is visible.

use scopewalk_ast::{build, validators, Field, NodeId};
use tracing::debug;

use crate::error::TraverseError;
use crate::path::PathId;
use crate::scope::ScopeId;
use crate::session::Session;
use crate::visitor::{VisitResult, Visitor};

/// What the rename walk is looking for.
struct RenameState {
    old: String,
    new: String,
    /// Declaring identifier of the binding being renamed.
    identifier: NodeId,
}

type Step = Result<VisitResult, TraverseError>;

fn renamer() -> Result<Visitor<RenameState>, TraverseError> {
    Visitor::new()
        .enter("ReferencedIdentifier", |session: &mut Session, path, state: &mut RenameState| -> Step {
            if let Some(node) = session.path_node(path) {
                if session.arena.name(node) == Some(state.old.as_str()) {
                    session.arena.set_name(node, &state.new);
                }
            }
            Ok(VisitResult::Continue)
        })?
        .enter("Scope", |session: &mut Session, path, state: &mut RenameState| -> Step {
            let scope = session.scope_of(path)?;
            if session.binding_identifier_equals(scope, &state.old, state.identifier) {
                return Ok(VisitResult::Continue);
            }
            // A computed method key is outside the shadowing method scope.
            let computed = session
                .path_node(path)
                .is_some_and(|node| session.arena.get(node).flags.computed);
            if session.is_method(path) && computed {
                let key = session.get_field(path, Field::Key)?;
                if let Some(context) = session.current_context(path) {
                    session.maybe_queue(context, key, true)?;
                }
            }
            Ok(VisitResult::SkipChildren)
        })?
        .enter("ObjectProperty", |session: &mut Session, path, state: &mut RenameState| -> Step {
            let node = session.require_node(path)?;
            if !session.arena.get(node).flags.shorthand {
                return Ok(VisitResult::Continue);
            }
            let Some(name) = session
                .arena
                .child(node, Field::Key)
                .and_then(|key| session.arena.name(key))
                .map(str::to_string)
            else {
                return Ok(VisitResult::Continue);
            };
            if name == state.old || name == state.new {
                let scope = session.scope_of(path)?;
                if session.get_binding_identifier(scope, &name) == Some(state.identifier) {
                    session.arena.get_mut(node).flags.shorthand = false;
                }
            }
            Ok(VisitResult::Continue)
        })?
        .enter(
            "AssignmentExpression|Declaration|VariableDeclarator",
            |session: &mut Session, path, state: &mut RenameState| -> Step {
                if session.is_variable_declaration(path) {
                    return Ok(VisitResult::Continue);
                }
                let node = session.require_node(path)?;
                let ids: Vec<NodeId> = if session.is_assignment_expression(path) {
                    validators::assignment_identifiers(&session.arena, node)
                        .into_iter()
                        .filter(|(name, _)| *name == state.old)
                        .map(|(_, id)| id)
                        .collect()
                } else {
                    session
                        .get_outer_binding_identifiers(path)
                        .swap_remove(&state.old)
                        .unwrap_or_default()
                };
                for id in ids {
                    session.arena.set_name(id, &state.new);
                }
                Ok(VisitResult::Continue)
            },
        )
}

impl Session {
    /// Rename the binding `old` resolves to from `scope`, with every
    /// reference and write it can see. Nested scopes that shadow `old` are
    /// left alone. Does nothing when `old` is unbound.
    ///
    /// An exported declaration keeps its public name: `export function f`
    /// becomes `function g` followed by `export { g as f }`.
    pub fn rename(&mut self, scope: ScopeId, old: &str, new: &str) -> Result<(), TraverseError> {
        let Some(mut binding) = self.get_binding(scope, old) else {
            return Ok(());
        };
        if old == new {
            return Ok(());
        }
        let identifier = self.binding(binding).identifier;
        let declared_at = self.binding(binding).path;

        let declaration = self.find(declared_at, |session, path| {
            session.is_declaration(path) || session.is_function_expression(path) || session.is_class_expression(path)
        });
        if let Some(declaration) = declaration {
            let declares_it = self
                .get_outer_binding_identifiers(declaration)
                .get(old)
                .is_some_and(|ids| ids.contains(&identifier));
            if declares_it && self.maybe_split_export(declaration)? {
                binding = self.get_binding(scope, old).ok_or_else(|| {
                    TraverseError::InvalidOperation(format!("binding `{}` lost while splitting its export", old))
                })?;
            }
        }

        let owner = self.binding(binding).scope;
        let owner_path = self.scope_path(owner);
        let block = self.scope_block(owner);
        let mut skip_keys = vec![Field::Discriminant];
        if self.is_method(owner_path) && self.arena.get(block).flags.computed {
            skip_keys.push(Field::Key);
        }
        let visitor = renamer()?;
        let mut state = RenameState {
            old: old.to_string(),
            new: new.to_string(),
            identifier,
        };
        self.walk_children(block, &visitor, &mut state, owner_path, &skip_keys)?;

        // Class declarations also file their binding under their own scope.
        for data in self.scopes.iter_mut() {
            if data.bindings.get(old) == Some(&binding) {
                data.bindings = data
                    .bindings
                    .drain(..)
                    .map(|(name, id)| if name == old { (new.to_string(), id) } else { (name, id) })
                    .collect();
            }
        }
        let program = self.scope_program_parent(owner);
        self.scopes[program.index()].references.insert(new.to_string());
        self.arena.set_name(identifier, new);
        debug!(%owner, old, new, "renamed binding");
        Ok(())
    }

    /// Pull a declaration out of its `export` so it can be renamed while the
    /// exported name stays the same. Returns true if the tree changed.
    fn maybe_split_export(&mut self, declaration: PathId) -> Result<bool, TraverseError> {
        let Some(export) = self.parent_path(declaration) else {
            return Ok(false);
        };
        if !self.is_export_declaration(export) || self.is_export_all_declaration(export) {
            return Ok(false);
        }
        let declaration_node = self.require_node(declaration)?;

        let alias = if self.is_export_default_declaration(export) {
            let standalone = self.is_function_declaration(declaration) || self.is_class_declaration(declaration);
            let Some(id) = self.arena.child(declaration_node, Field::Id) else {
                return Ok(false);
            };
            if !standalone {
                return Ok(false);
            }
            let name = self.arena.name(id).unwrap_or_default().to_string();
            let local = build::identifier(&mut self.arena, &name);
            let exported = build::identifier(&mut self.arena, "default");
            let specifier = build::export_specifier(&mut self.arena, local, exported)?;
            build::export_named_declaration(&mut self.arena, None, vec![specifier])?
        } else {
            if !self.get_list(export, Field::Specifiers)?.is_empty() {
                return Err(TraverseError::InvalidOperation(
                    "an export with specifiers cannot be split".to_string(),
                ));
            }
            let names: Vec<String> = self.get_outer_binding_identifiers(declaration).into_keys().collect();
            let mut specifiers = Vec::with_capacity(names.len());
            for name in names {
                let local = build::identifier(&mut self.arena, &name);
                let exported = build::identifier(&mut self.arena, &name);
                specifiers.push(build::export_specifier(&mut self.arena, local, exported)?);
            }
            build::export_named_declaration(&mut self.arena, None, specifiers)?
        };

        self.insert_after(export, vec![alias])?;
        self.replace_with(export, declaration_node)?;
        debug!(%export, "split export declaration");
        Ok(true)
    }
}
