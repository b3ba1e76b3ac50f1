// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Comment attachment.

use scopewalk_ast::{Comment, NodeArena, NodeId};

use crate::path::PathId;
use crate::session::Session;

/// Which side of a node a comment sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentPlacement {
    Leading,
    Trailing,
}

fn comments_mut(arena: &mut NodeArena, node: NodeId, placement: CommentPlacement) -> &mut Vec<Comment> {
    let record = arena.get_mut(node);
    match placement {
        CommentPlacement::Leading => &mut record.leading_comments,
        CommentPlacement::Trailing => &mut record.trailing_comments,
    }
}

/// Attach `comments` to `node`. Leading comments go in front of existing ones.
pub(crate) fn add_comments(arena: &mut NodeArena, node: NodeId, placement: CommentPlacement, comments: Vec<Comment>) {
    let existing = comments_mut(arena, node, placement);
    match placement {
        CommentPlacement::Leading => {
            let rest = std::mem::replace(existing, comments);
            existing.extend(rest);
        }
        CommentPlacement::Trailing => existing.extend(comments),
    }
}

fn inherit(arena: &mut NodeArena, child: NodeId, parent: NodeId, placement: CommentPlacement) {
    if child == parent {
        return;
    }
    let inherited = comments_mut(arena, parent, placement).clone();
    let target = comments_mut(arena, child, placement);
    for comment in inherited {
        if !target.contains(&comment) {
            target.push(comment);
        }
    }
}

pub(crate) fn inherit_leading_comments(arena: &mut NodeArena, child: NodeId, parent: NodeId) {
    inherit(arena, child, parent, CommentPlacement::Leading);
}

pub(crate) fn inherit_trailing_comments(arena: &mut NodeArena, child: NodeId, parent: NodeId) {
    inherit(arena, child, parent, CommentPlacement::Trailing);
}

/// Copy the comments of `parent` onto `child`, skipping duplicates.
pub(crate) fn inherit_comments(arena: &mut NodeArena, child: NodeId, parent: NodeId) {
    inherit_trailing_comments(arena, child, parent);
    inherit_leading_comments(arena, child, parent);
}

pub(crate) fn remove_node_comments(arena: &mut NodeArena, node: NodeId) {
    let record = arena.get_mut(node);
    record.leading_comments.clear();
    record.trailing_comments.clear();
}

impl Session {
    /// Attach one comment to the node at `path`.
    pub fn add_comment(&mut self, path: PathId, placement: CommentPlacement, content: &str, line: bool) {
        let comment = if line {
            Comment::line(content)
        } else {
            Comment::block(content)
        };
        self.add_comments(path, placement, vec![comment]);
    }

    pub fn add_comments(&mut self, path: PathId, placement: CommentPlacement, comments: Vec<Comment>) {
        if let Some(node) = self.path_node(path) {
            add_comments(&mut self.arena, node, placement, comments);
        }
    }

    /// Drop every comment attached to the node at `path`.
    pub fn remove_comments(&mut self, path: PathId) {
        if let Some(node) = self.path_node(path) {
            remove_node_comments(&mut self.arena, node);
        }
    }

    /// Hand the comments of a list element to its neighbours before it goes
    /// away: leading comments trail the previous sibling, trailing comments
    /// lead the next one.
    pub fn share_comments_with_siblings(&mut self, path: PathId) {
        let Some(index) = self.list_index(path) else {
            return;
        };
        let Some(node) = self.path_node(path) else {
            return;
        };
        let record = self.arena.get(node);
        let leading = record.leading_comments.clone();
        let trailing = record.trailing_comments.clone();
        if leading.is_empty() && trailing.is_empty() {
            return;
        }
        let prev = index
            .checked_sub(1)
            .and_then(|index| self.get_sibling(path, index))
            .and_then(|sibling| self.path_node(sibling));
        let next = self
            .get_sibling(path, index + 1)
            .and_then(|sibling| self.path_node(sibling));

        if let Some(prev) = prev {
            if !leading.is_empty() {
                let fresh = without_existing(&leading, &self.arena.get(prev).trailing_comments);
                add_comments(&mut self.arena, prev, CommentPlacement::Trailing, fresh);
            }
            if !trailing.is_empty() && next.is_none() {
                add_comments(&mut self.arena, prev, CommentPlacement::Trailing, trailing.clone());
            }
        }
        if let Some(next) = next {
            if !trailing.is_empty() {
                let fresh = without_existing(&trailing, &self.arena.get(next).leading_comments);
                add_comments(&mut self.arena, next, CommentPlacement::Leading, fresh);
            }
            if !leading.is_empty() && prev.is_none() {
                add_comments(&mut self.arena, next, CommentPlacement::Leading, leading);
            }
        }
    }
}

fn without_existing(comments: &[Comment], existing: &[Comment]) -> Vec<Comment> {
    comments
        .iter()
        .filter(|comment| !existing.contains(comment))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TraverseOptions;
    use serde_json::json;

    #[test]
    fn removed_statement_comments_move_to_neighbours() {
        let tree = json!({
            "type": "Program",
            "body": [
                { "type": "EmptyStatement" },
                { "type": "DebuggerStatement" },
                { "type": "EmptyStatement" }
            ]
        });
        let mut session = Session::from_json(&tree, TraverseOptions::default()).unwrap();
        let root = session.root_path();
        let middle = session.get(root, "body.1").unwrap().one().unwrap();
        session.add_comment(middle, CommentPlacement::Leading, " before", true);
        session.add_comment(middle, CommentPlacement::Trailing, " after", false);
        session.remove(middle).unwrap();

        let program = session.root();
        let body = session.arena().list(program, scopewalk_ast::Field::Body).to_vec();
        assert_eq!(body.len(), 2);
        assert_eq!(session.arena().get(body[0]).trailing_comments, vec![Comment::line(" before")]);
        assert_eq!(session.arena().get(body[1]).leading_comments, vec![Comment::block(" after")]);
    }

    #[test]
    fn leading_comments_are_prepended() {
        let mut arena = NodeArena::new();
        let node = scopewalk_ast::build::empty_statement(&mut arena);
        add_comments(&mut arena, node, CommentPlacement::Leading, vec![Comment::line("b")]);
        add_comments(&mut arena, node, CommentPlacement::Leading, vec![Comment::line("a")]);
        assert_eq!(
            arena.get(node).leading_comments,
            vec![Comment::line("a"), Comment::line("b")]
        );
    }
}
