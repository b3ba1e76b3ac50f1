// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Children, siblings, binding identifiers and completion records.

use scopewalk_ast::validators::{self, BindingIdentifiers};
use scopewalk_ast::{Alias, AstError, Field, NodeId, NodeKind};

use crate::error::TraverseError;
use crate::path::{Location, PathId};
use crate::session::Session;

/// Result of a dotted [`get`](Session::get): one path, or the paths of a list slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Got {
    One(PathId),
    Many(Vec<PathId>),
}

impl Got {
    pub fn one(self) -> Option<PathId> {
        match self {
            Got::One(path) => Some(path),
            Got::Many(_) => None,
        }
    }

    pub fn many(self) -> Option<Vec<PathId>> {
        match self {
            Got::One(_) => None,
            Got::Many(paths) => Some(paths),
        }
    }
}

impl Session {
    // ========================================================================
    // Children
    // ========================================================================

    fn slot_spec(&self, node: NodeId, field: Field) -> Result<&'static scopewalk_ast::FieldSpec, TraverseError> {
        let kind = self.arena.kind(node);
        kind.field_spec(field)
            .ok_or(TraverseError::Ast(AstError::UnknownField { kind, field }))
    }

    fn require_container(&self, path: PathId) -> Result<NodeId, TraverseError> {
        self.path_node(path).ok_or_else(|| TraverseError::NoContainer {
            kind: self.describe(path),
            location: self.location(path).to_string(),
        })
    }

    /// Path to the single slot `field` of the node at `path`.
    ///
    /// An empty slot yields an absent path.
    pub fn get_field(&mut self, path: PathId, field: Field) -> Result<PathId, TraverseError> {
        let node = self.require_container(path)?;
        let spec = self.slot_spec(node, field)?;
        if spec.list {
            return Err(TraverseError::WrongSlotShape {
                kind: self.arena.kind(node),
                field,
                expected: "single slot",
            });
        }
        Ok(self.path_at(Some(path), Location::Field { parent: node, field }))
    }

    /// Paths to every element of the list slot `field` of the node at `path`.
    pub fn get_list(&mut self, path: PathId, field: Field) -> Result<Vec<PathId>, TraverseError> {
        let node = self.require_container(path)?;
        let spec = self.slot_spec(node, field)?;
        if !spec.list {
            return Err(TraverseError::WrongSlotShape {
                kind: self.arena.kind(node),
                field,
                expected: "list",
            });
        }
        let len = self.arena.list(node, field).len();
        Ok((0..len)
            .map(|index| {
                self.path_at(
                    Some(path),
                    Location::Element {
                        parent: node,
                        field,
                        index,
                    },
                )
            })
            .collect())
    }

    /// Path to element `index` of list `field`; absent when out of range.
    pub fn get_element(&mut self, path: PathId, field: Field, index: usize) -> Result<PathId, TraverseError> {
        let node = self.require_container(path)?;
        let spec = self.slot_spec(node, field)?;
        if !spec.list {
            return Err(TraverseError::WrongSlotShape {
                kind: self.arena.kind(node),
                field,
                expected: "list",
            });
        }
        Ok(self.path_at(
            Some(path),
            Location::Element {
                parent: node,
                field,
                index,
            },
        ))
    }

    /// Dotted access: `"body.0.declarations"` walks slot names and list
    /// indices from `path`.
    pub fn get(&mut self, path: PathId, key: &str) -> Result<Got, TraverseError> {
        let mut current = Got::One(path);
        let mut list_owner: Option<(PathId, Field)> = None;
        for part in key.split('.') {
            current = match current {
                Got::One(path) => {
                    let field: Field = part.parse()?;
                    let node = self.require_container(path)?;
                    if self.slot_spec(node, field)?.list {
                        list_owner = Some((path, field));
                        Got::Many(self.get_list(path, field)?)
                    } else {
                        Got::One(self.get_field(path, field)?)
                    }
                }
                Got::Many(paths) => {
                    let index: usize = part.parse().map_err(|_| {
                        TraverseError::InvalidOperation(format!(
                            "`{}` in `{}` is not a list index",
                            part, key
                        ))
                    })?;
                    match paths.get(index) {
                        Some(element) => Got::One(*element),
                        None => match list_owner {
                            Some((owner, field)) => Got::One(self.get_element(owner, field, index)?),
                            None => {
                                return Err(TraverseError::InvalidOperation(format!(
                                    "no list before `{}` in `{}`",
                                    part, key
                                )))
                            }
                        },
                    }
                }
            };
        }
        Ok(current)
    }

    // ========================================================================
    // Siblings
    // ========================================================================

    /// Path to element `index` of the list `path` belongs to.
    ///
    /// `None` when `path` is not a list element; an absent path when
    /// `index` is past the end.
    pub fn get_sibling(&mut self, path: PathId, index: usize) -> Option<PathId> {
        match self.location(path) {
            Location::Element { parent, field, .. } => Some(self.path_at(
                self.parent_path(path),
                Location::Element {
                    parent,
                    field,
                    index,
                },
            )),
            _ => None,
        }
    }

    pub fn get_prev_sibling(&mut self, path: PathId) -> Option<PathId> {
        let index = self.list_index(path)?.checked_sub(1)?;
        self.get_sibling(path, index)
    }

    pub fn get_next_sibling(&mut self, path: PathId) -> Option<PathId> {
        let index = self.list_index(path)? + 1;
        self.get_sibling(path, index)
    }

    /// Every later sibling, nearest first.
    pub fn get_all_next_siblings(&mut self, path: PathId) -> Vec<PathId> {
        let (Some(index), Some(len)) = (self.list_index(path), self.container_len(path)) else {
            return Vec::new();
        };
        (index + 1..len)
            .filter_map(|index| self.get_sibling(path, index))
            .collect()
    }

    /// Every earlier sibling, nearest first.
    pub fn get_all_prev_siblings(&mut self, path: PathId) -> Vec<PathId> {
        let Some(index) = self.list_index(path) else {
            return Vec::new();
        };
        (0..index)
            .rev()
            .filter_map(|index| self.get_sibling(path, index))
            .collect()
    }

    // ========================================================================
    // Binding identifiers
    // ========================================================================

    /// Names the node at `path` introduces, with every identifier node for each.
    pub fn get_binding_identifiers(&self, path: PathId) -> BindingIdentifiers {
        match self.path_node(path) {
            Some(node) => validators::binding_identifiers(&self.arena, node, false, false),
            None => BindingIdentifiers::new(),
        }
    }

    /// Like [`get_binding_identifiers`](Session::get_binding_identifiers) but
    /// without looking inside function declarations and expressions.
    pub fn get_outer_binding_identifiers(&self, path: PathId) -> BindingIdentifiers {
        match self.path_node(path) {
            Some(node) => validators::binding_identifiers(&self.arena, node, true, false),
            None => BindingIdentifiers::new(),
        }
    }

    // ========================================================================
    // Completion records
    // ========================================================================

    /// Paths whose value can become the completion value of the node at
    /// `path`: the last meaningful statement of each branch.
    ///
    /// `break` statements do not produce records.
    pub fn get_completion_records(&mut self, path: PathId) -> Result<Vec<PathId>, TraverseError> {
        let mut records = Vec::new();
        self.collect_completions(path, &mut records)?;
        Ok(records)
    }

    fn collect_completions(&mut self, path: PathId, records: &mut Vec<PathId>) -> Result<(), TraverseError> {
        let Some(node) = self.path_node(path) else {
            return Ok(());
        };
        let kind = self.arena.kind(node);
        match kind {
            NodeKind::IfStatement => {
                let consequent = self.get_field(path, Field::Consequent)?;
                self.collect_completions(consequent, records)?;
                let alternate = self.get_field(path, Field::Alternate)?;
                self.collect_completions(alternate, records)?;
            }
            NodeKind::LabeledStatement => {
                let body = self.get_field(path, Field::Body)?;
                self.collect_completions(body, records)?;
            }
            _ if kind.has_alias(Alias::Loop) => {
                let body = self.get_field(path, Field::Body)?;
                self.collect_completions(body, records)?;
            }
            NodeKind::Program | NodeKind::BlockStatement => {
                let body = self.get_list(path, Field::Body)?;
                self.statement_list_completions(body, records)?;
            }
            _ if kind.has_alias(Alias::Function) => {
                let body = self.get_field(path, Field::Body)?;
                self.collect_completions(body, records)?;
            }
            NodeKind::TryStatement => {
                let block = self.get_field(path, Field::Block)?;
                self.collect_completions(block, records)?;
                let handler = self.get_field(path, Field::Handler)?;
                self.collect_completions(handler, records)?;
            }
            NodeKind::CatchClause => {
                let body = self.get_field(path, Field::Body)?;
                self.collect_completions(body, records)?;
            }
            NodeKind::SwitchStatement => {
                for case in self.get_list(path, Field::Cases)? {
                    let consequent = self.get_list(case, Field::Consequent)?;
                    self.statement_list_completions(consequent, records)?;
                }
            }
            NodeKind::SwitchCase => {
                let consequent = self.get_list(path, Field::Consequent)?;
                self.statement_list_completions(consequent, records)?;
            }
            NodeKind::BreakStatement => {}
            _ => records.push(path),
        }
        Ok(())
    }

    /// Completion of a statement list: the records of the last statement
    /// that produces something other than a declaration or an empty statement.
    fn statement_list_completions(
        &mut self,
        statements: Vec<PathId>,
        records: &mut Vec<PathId>,
    ) -> Result<(), TraverseError> {
        for statement in statements.into_iter().rev() {
            let mut found = Vec::new();
            self.collect_completions(statement, &mut found)?;
            let trivial = found.len() == 1
                && (self.is_type(found[0], NodeKind::VariableDeclaration)
                    || self.is_type(found[0], NodeKind::EmptyStatement));
            if !found.is_empty() && !trivial {
                records.extend(found);
                return Ok(());
            }
        }
        Ok(())
    }
}
