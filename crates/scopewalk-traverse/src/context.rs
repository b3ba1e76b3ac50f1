// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Traversal contexts: the queues that drive a visitor over the tree.
//!
//! Every call that walks the children of one node opens a context holding the
//! queue of sibling paths being visited and a priority queue for paths
//! inserted by callbacks. Contexts are registered in the session by id and
//! dropped when their walk ends, so a path that still lists a finished
//! context can tell that it is stale.
//!
//! Walks are re-entrant: a callback may start another walk (a scope crawl, a
//! rename) while the outer queue is paused in that callback.

use std::collections::HashSet;
use std::mem;

use scopewalk_ast::{Field, NodeId};
use tracing::{trace, warn};

use crate::error::TraverseError;
use crate::options::CyclePolicy;
use crate::path::{Location, PathId};
use crate::session::Session;
use crate::visitor::{Handler, Phase, VisitResult, Visitor};

/// Identifier of a live traversal context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ContextId(u32);

#[derive(Debug, Default)]
pub(crate) struct ContextData {
    /// Queue currently being drained, if any.
    pub(crate) queue: Option<Vec<PathId>>,
    pub(crate) priority_queue: Vec<PathId>,
    /// Set once the cycle guard trips.
    pub(crate) trap: bool,
    pub(crate) no_scope: bool,
}

/// How the callbacks of one phase ended.
enum Outcome {
    Continue,
    SkipChildren,
    Stop,
    /// The node was replaced or removed: its visit is over.
    Ended,
}

impl Session {
    // ========================================================================
    // Context registry
    // ========================================================================

    fn open_context(&mut self, no_scope: bool) -> ContextId {
        let id = ContextId(self.next_context);
        self.next_context = self.next_context.wrapping_add(1);
        self.contexts.insert(
            id,
            ContextData {
                no_scope,
                ..ContextData::default()
            },
        );
        id
    }

    /// The innermost live context of `path`.
    pub(crate) fn current_context(&self, path: PathId) -> Option<ContextId> {
        self.paths[path.index()]
            .contexts
            .iter()
            .rev()
            .find(|id| self.contexts.contains_key(id))
            .copied()
    }

    pub(crate) fn context_no_scope(&self, path: PathId) -> bool {
        self.current_context(path)
            .and_then(|id| self.contexts.get(&id))
            .is_some_and(|context| context.no_scope)
    }

    /// Make `context` the innermost context of `path`, resetting visit flags.
    pub(crate) fn push_context(&mut self, path: PathId, context: ContextId) -> Result<(), TraverseError> {
        let data = &mut self.paths[path.index()];
        data.contexts.push(context);
        data.should_skip = false;
        data.should_stop = false;
        data.skip_keys.clear();
        if !self.context_no_scope(path) {
            self.set_scope(path)?;
        }
        Ok(())
    }

    fn pop_context(&mut self, path: PathId, context: ContextId) {
        let data = &mut self.paths[path.index()];
        if let Some(position) = data.contexts.iter().rposition(|id| *id == context) {
            data.contexts.remove(position);
        }
        data.should_skip = false;
        data.should_stop = false;
        data.skip_keys.clear();
    }

    // ========================================================================
    // Queueing
    // ========================================================================

    /// Queue `path` in `context`: on the main queue when `not_priority`,
    /// otherwise on the priority queue drained right after the current path.
    pub(crate) fn maybe_queue(
        &mut self,
        context: ContextId,
        path: PathId,
        not_priority: bool,
    ) -> Result<(), TraverseError> {
        let limit = self.options.cycle_limit;
        let policy = self.options.cycle_policy;
        let Some(data) = self.contexts.get_mut(&context) else {
            return Ok(());
        };
        if data.trap {
            return match policy {
                CyclePolicy::Error => Err(TraverseError::InfiniteCycle { limit }),
                CyclePolicy::Warn => Ok(()),
            };
        }
        if let Some(queue) = data.queue.as_mut() {
            if not_priority {
                queue.push(path);
            } else {
                data.priority_queue.push(path);
            }
        }
        Ok(())
    }

    /// Queue `path` again in every context it belongs to.
    pub fn requeue(&mut self, path: PathId) -> Result<(), TraverseError> {
        if self.is_removed(path) {
            return Ok(());
        }
        let contexts = self.paths[path.index()].contexts.clone();
        for context in contexts {
            self.maybe_queue(context, path, false)?;
        }
        Ok(())
    }

    /// Contexts new siblings of `path` should be queued in: those of the
    /// nearest path (itself or an ancestor) that has any.
    pub(crate) fn queue_contexts(&self, path: PathId) -> Vec<ContextId> {
        let mut current = Some(path);
        while let Some(path) = current {
            let live: Vec<ContextId> = self.paths[path.index()]
                .contexts
                .iter()
                .copied()
                .filter(|id| self.contexts.contains_key(id))
                .collect();
            if !live.is_empty() {
                return live;
            }
            current = self.parent_path(path);
        }
        Vec::new()
    }

    // ========================================================================
    // Walking
    // ========================================================================

    /// Cheap pre-check: could visiting this node reach any callback?
    fn should_visit<S>(&self, node: NodeId, visitor: &Visitor<S>) -> bool {
        let kind = self.arena.kind(node);
        if visitor.handles(kind) {
            return true;
        }
        let record = self.arena.get(node);
        kind.fields().iter().any(|spec| {
            spec.list || record.slot(spec.field).is_some_and(|child| !child.is_empty())
        })
    }

    /// Visit `path` itself (enter, children, exit) in a fresh context.
    pub(crate) fn visit_single<S>(
        &mut self,
        path: PathId,
        visitor: &Visitor<S>,
        state: &mut S,
    ) -> Result<bool, TraverseError> {
        let context = self.open_context(visitor.is_no_scope());
        let result = self.visit_queue(context, visitor, state, vec![path], false);
        self.contexts.remove(&context);
        result
    }

    /// Visit the children of `node` (whose path is `path`), slot by slot.
    pub(crate) fn walk_children<S>(
        &mut self,
        node: NodeId,
        visitor: &Visitor<S>,
        state: &mut S,
        path: PathId,
        skip_keys: &[Field],
    ) -> Result<bool, TraverseError> {
        let kind = self.arena.kind(node);
        if kind.fields().is_empty() {
            return Ok(false);
        }
        let context = self.open_context(visitor.is_no_scope());
        let result = self.walk_fields(context, node, visitor, state, path, skip_keys);
        self.contexts.remove(&context);
        result
    }

    fn walk_fields<S>(
        &mut self,
        context: ContextId,
        node: NodeId,
        visitor: &Visitor<S>,
        state: &mut S,
        path: PathId,
        skip_keys: &[Field],
    ) -> Result<bool, TraverseError> {
        for spec in self.arena.kind(node).fields() {
            if skip_keys.contains(&spec.field) {
                continue;
            }
            let mut queue = Vec::new();
            if spec.list {
                let elements = self.arena.list(node, spec.field).to_vec();
                for (index, element) in elements.into_iter().enumerate() {
                    if self.should_visit(element, visitor) {
                        queue.push(self.path_at(
                            Some(path),
                            Location::Element {
                                parent: node,
                                field: spec.field,
                                index,
                            },
                        ));
                    }
                }
            } else if let Some(child) = self.arena.child(node, spec.field) {
                if self.should_visit(child, visitor) {
                    queue.push(self.path_at(
                        Some(path),
                        Location::Field {
                            parent: node,
                            field: spec.field,
                        },
                    ));
                }
            }
            if queue.is_empty() {
                continue;
            }
            if self.visit_queue(context, visitor, state, queue, false)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Drain `queue` in `context`. Returns true if the walk was stopped.
    fn visit_queue<S>(
        &mut self,
        context: ContextId,
        visitor: &Visitor<S>,
        state: &mut S,
        queue: Vec<PathId>,
        priority: bool,
    ) -> Result<bool, TraverseError> {
        let (saved_queue, saved_priority) = match self.contexts.get_mut(&context) {
            Some(data) => (
                data.queue.replace(queue),
                mem::take(&mut data.priority_queue),
            ),
            None => return Ok(false),
        };

        let mut visited_count = 0;
        let result = self.drain(context, visitor, state, priority, &mut visited_count);

        let drained = match self.contexts.get_mut(&context) {
            Some(data) => {
                let drained = mem::replace(&mut data.queue, saved_queue).unwrap_or_default();
                data.priority_queue = saved_priority;
                drained
            }
            None => Vec::new(),
        };
        for path in drained.into_iter().take(visited_count) {
            self.pop_context(path, context);
        }
        result
    }

    fn drain<S>(
        &mut self,
        context: ContextId,
        visitor: &Visitor<S>,
        state: &mut S,
        priority: bool,
        index: &mut usize,
    ) -> Result<bool, TraverseError> {
        let limit = self.options.cycle_limit;
        let mut visited: HashSet<NodeId> = HashSet::new();
        loop {
            let (path, queued) = match self.contexts.get(&context).and_then(|data| data.queue.as_ref()) {
                Some(queue) => match queue.get(*index) {
                    Some(path) => (*path, queue.len()),
                    None => break,
                },
                None => break,
            };
            *index += 1;

            if queued >= limit {
                if let Some(data) = self.contexts.get_mut(&context) {
                    if !data.trap {
                        data.trap = true;
                        if self.options.cycle_policy == CyclePolicy::Warn {
                            warn!(limit, "cycle guard tripped; further re-queues are dropped");
                        }
                    }
                }
            }

            self.resync(path);
            if self.paths[path.index()].contexts.last() != Some(&context) {
                self.push_context(path, context)?;
            }
            if self.is_detached(path) || self.is_removed(path) {
                continue;
            }
            let Some(node) = self.path_node(path) else {
                continue;
            };
            if !visited.insert(node) {
                continue;
            }
            trace!(%path, kind = %self.arena.kind(node), "visit");
            if self.visit(path, visitor, state)? {
                return Ok(true);
            }

            let batch = match self.contexts.get_mut(&context) {
                Some(data) if !data.priority_queue.is_empty() => mem::take(&mut data.priority_queue),
                _ => continue,
            };
            if priority {
                if let Some(queue) = self.contexts.get_mut(&context).and_then(|data| data.queue.as_mut()) {
                    queue.extend(batch);
                }
            } else if self.visit_queue(context, visitor, state, batch, true)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ========================================================================
    // Visiting one path
    // ========================================================================

    /// Enter callbacks, children, exit callbacks. Returns true to stop.
    fn visit<S>(&mut self, path: PathId, visitor: &Visitor<S>, state: &mut S) -> Result<bool, TraverseError> {
        let Some(node) = self.path_node(path) else {
            return Ok(false);
        };
        let kind = self.arena.kind(node);
        if visitor.is_denied(kind) {
            return Ok(false);
        }
        if self.should_skip(path) {
            return Ok(self.should_stop(path));
        }

        let handlers = visitor.handlers(Phase::Enter, kind);
        let skip_children = match self.call(path, node, &handlers, state)? {
            Outcome::Stop => return Ok(true),
            Outcome::Ended => return Ok(self.should_stop(path)),
            Outcome::SkipChildren => true,
            Outcome::Continue => false,
        };

        if !skip_children {
            let skip_keys: Vec<Field> = self.paths[path.index()].skip_keys.iter().copied().collect();
            if self.walk_children(node, visitor, state, path, &skip_keys)? {
                self.paths[path.index()].should_stop = true;
                return Ok(true);
            }
        }

        let handlers = visitor.handlers(Phase::Exit, kind);
        match self.call(path, node, &handlers, state)? {
            Outcome::Stop => Ok(true),
            _ => Ok(self.should_stop(path)),
        }
    }

    /// Run `handlers` on `path`, stopping early when one asks to or when the
    /// node is replaced or removed.
    fn call<S>(
        &mut self,
        path: PathId,
        node: NodeId,
        handlers: &[Handler<S>],
        state: &mut S,
    ) -> Result<Outcome, TraverseError> {
        for handler in handlers {
            if let Some(guard) = handler.guard {
                if !guard.matches(self, path) {
                    continue;
                }
            }
            let result = (handler.func)(self, path, state)?;
            if self.path_node(path) != Some(node) || self.is_removed(path) {
                return Ok(Outcome::Ended);
            }
            if self.should_stop(path) {
                return Ok(Outcome::Stop);
            }
            match result {
                VisitResult::Stop => {
                    self.paths[path.index()].should_stop = true;
                    return Ok(Outcome::Stop);
                }
                VisitResult::SkipChildren => return Ok(Outcome::SkipChildren),
                VisitResult::Continue if self.should_skip(path) => {
                    return Ok(Outcome::SkipChildren)
                }
                VisitResult::Continue => {}
            }
        }
        Ok(Outcome::Continue)
    }

    /// Run the enter callbacks of `visitor` on `path` alone, without walking.
    pub(crate) fn enter_only<S>(
        &mut self,
        path: PathId,
        visitor: &Visitor<S>,
        state: &mut S,
    ) -> Result<(), TraverseError> {
        let Some(node) = self.path_node(path) else {
            return Ok(());
        };
        let handlers = visitor.handlers(Phase::Enter, self.arena.kind(node));
        self.call(path, node, &handlers, state)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TraverseOptions;
    use serde_json::json;

    fn session() -> Session {
        let tree = json!({
            "type": "Program",
            "body": [
                { "type": "ExpressionStatement", "expression": { "type": "Identifier", "name": "a" } },
                { "type": "ExpressionStatement", "expression": { "type": "Identifier", "name": "b" } }
            ]
        });
        Session::from_json(&tree, TraverseOptions::default()).unwrap()
    }

    #[test]
    fn contexts_are_dropped_after_a_walk() {
        let mut session = session();
        let visitor: Visitor<()> = Visitor::new()
            .enter("Identifier", |_, _, _| Ok(VisitResult::Continue))
            .unwrap();
        session.traverse(&visitor, &mut ()).unwrap();
        assert!(session.contexts.is_empty());
        for data in &session.paths {
            assert!(data.contexts.is_empty());
        }
    }

    #[test]
    fn requeue_into_finished_context_is_ignored() {
        let mut session = session();
        let visitor: Visitor<Vec<PathId>> = Visitor::new()
            .enter("Identifier", |_, path, seen: &mut Vec<PathId>| {
                seen.push(path);
                Ok(VisitResult::Continue)
            })
            .unwrap();
        let mut seen = Vec::new();
        session.traverse(&visitor, &mut seen).unwrap();
        session.paths[seen[0].index()].contexts.push(ContextId(999));
        assert!(session.requeue(seen[0]).is_ok());
        assert_eq!(session.current_context(seen[0]), None);
    }

    #[test]
    fn skip_children_still_runs_exit() {
        let mut session = session();
        let visitor: Visitor<Vec<String>> = Visitor::new()
            .enter("ExpressionStatement", |_, _, _| Ok(VisitResult::SkipChildren))
            .unwrap()
            .exit("ExpressionStatement", |_, _, log: &mut Vec<String>| {
                log.push("exit".to_string());
                Ok(VisitResult::Continue)
            })
            .unwrap()
            .enter("Identifier", |_, _, log: &mut Vec<String>| {
                log.push("identifier".to_string());
                Ok(VisitResult::Continue)
            })
            .unwrap();
        let mut log = Vec::new();
        session.traverse(&visitor, &mut log).unwrap();
        assert_eq!(log, vec!["exit", "exit"]);
    }
}
