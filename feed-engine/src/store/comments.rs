/// Comment tree for a single post
///
/// An id-keyed arena with parent back-references and ordered child lists:
/// O(1) lookup through the index, no deep clones on mutation. Reply depth
/// is structurally unbounded in the data model, so rendering cost is bounded
/// here instead: replies that would land deeper than the configured maximum
/// are attached at the bound (flattened), never dropped.
use crate::error::{EngineError, Result};
use crate::models::{Comment, CommentId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CommentNode {
    comment: Comment,
    children: Vec<CommentId>,
    depth: u32,
}

/// Ordered forest of comments, arena-backed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentForest {
    nodes: HashMap<CommentId, CommentNode>,
    roots: Vec<CommentId>,
}

/// One row of a rendered thread
#[derive(Debug)]
pub struct ThreadEntry<'a> {
    pub comment: &'a Comment,
    pub depth: u32,
}

impl CommentForest {
    /// Append a root comment, preserving insertion order
    pub fn insert_root(&mut self, comment: Comment) -> CommentId {
        let id = comment.id.clone();
        self.nodes.insert(
            id.clone(),
            CommentNode {
                comment,
                children: Vec::new(),
                depth: 0,
            },
        );
        self.roots.push(id.clone());
        id
    }

    /// Append a reply to `parent_id`'s ordered reply list.
    ///
    /// When the reply would exceed `max_depth`, it is re-parented to the
    /// ancestor sitting at `max_depth - 1` so threads flatten at the bound.
    pub fn insert_reply(
        &mut self,
        parent_id: &CommentId,
        mut comment: Comment,
        max_depth: u32,
    ) -> Result<CommentId> {
        let mut anchor = parent_id.clone();
        let mut anchor_depth = self
            .nodes
            .get(&anchor)
            .ok_or_else(|| EngineError::NotFound(format!("comment {}", parent_id)))?
            .depth;

        while anchor_depth + 1 > max_depth.max(1) {
            let above = self
                .nodes
                .get(&anchor)
                .and_then(|n| n.comment.parent_comment_id.clone())
                .ok_or_else(|| {
                    EngineError::Internal(format!("comment {} has no ancestor chain", anchor))
                })?;
            anchor = above;
            anchor_depth = self
                .nodes
                .get(&anchor)
                .ok_or_else(|| EngineError::NotFound(format!("comment {}", anchor)))?
                .depth;
        }

        comment.parent_comment_id = Some(anchor.clone());
        let id = comment.id.clone();
        let depth = anchor_depth + 1;

        self.nodes.insert(
            id.clone(),
            CommentNode {
                comment,
                children: Vec::new(),
                depth,
            },
        );
        if let Some(parent) = self.nodes.get_mut(&anchor) {
            parent.children.push(id.clone());
        }
        Ok(id)
    }

    /// O(1) lookup through the index
    pub fn find(&self, id: &CommentId) -> Option<&Comment> {
        self.nodes.get(id).map(|n| &n.comment)
    }

    pub fn depth_of(&self, id: &CommentId) -> Option<u32> {
        self.nodes.get(id).map(|n| n.depth)
    }

    pub fn roots(&self) -> Vec<&Comment> {
        self.roots
            .iter()
            .filter_map(|id| self.find(id))
            .collect()
    }

    pub fn replies(&self, id: &CommentId) -> Vec<&Comment> {
        self.nodes
            .get(id)
            .map(|n| n.children.iter().filter_map(|c| self.find(c)).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first thread in render order
    pub fn thread(&self) -> Vec<ThreadEntry<'_>> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<&CommentId> = self.roots.iter().rev().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(id) {
                out.push(ThreadEntry {
                    comment: &node.comment,
                    depth: node.depth,
                });
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// Replace a temporary id with the backend-confirmed one, fixing the
    /// index, the parent's child list, and every reply's back-reference.
    pub fn rekey(&mut self, old: &CommentId, new: CommentId) -> bool {
        let Some(mut node) = self.nodes.remove(old) else {
            return false;
        };
        node.comment.id = new.clone();

        for child_id in &node.children {
            if let Some(child) = self.nodes.get_mut(child_id) {
                child.comment.parent_comment_id = Some(new.clone());
            }
        }
        match &node.comment.parent_comment_id {
            Some(parent_id) => {
                if let Some(parent) = self.nodes.get_mut(parent_id) {
                    for slot in parent.children.iter_mut() {
                        if slot == old {
                            *slot = new.clone();
                        }
                    }
                }
            }
            None => {
                for slot in self.roots.iter_mut() {
                    if slot == old {
                        *slot = new.clone();
                    }
                }
            }
        }
        self.nodes.insert(new, node);
        true
    }

    /// Remove a leaf comment (rollback of an optimistic insert). Comments
    /// with replies are kept; there is no user-facing delete.
    pub fn remove_leaf(&mut self, id: &CommentId) -> Option<Comment> {
        let node = self.nodes.get(id)?;
        if !node.children.is_empty() {
            return None;
        }
        let node = self.nodes.remove(id)?;
        match &node.comment.parent_comment_id {
            Some(parent_id) => {
                if let Some(parent) = self.nodes.get_mut(parent_id) {
                    parent.children.retain(|c| c != id);
                }
            }
            None => self.roots.retain(|c| c != id),
        }
        Some(node.comment)
    }

    /// Session-local like toggle; returns the new like count
    pub fn toggle_like(&mut self, id: &CommentId) -> Result<u32> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(format!("comment {}", id)))?;
        let c = &mut node.comment;
        if c.user_liked {
            c.like_count = c.like_count.saturating_sub(1);
        } else {
            c.like_count += 1;
        }
        c.user_liked = !c.user_liked;
        Ok(c.like_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostId, Session};

    fn session() -> Session {
        Session {
            user_id: "user-1".into(),
            user_name: "Alice".into(),
            avatar: None,
            access_token: None,
        }
    }

    fn comment(text: &str, parent: Option<CommentId>) -> Comment {
        Comment::local(&session(), PostId::from("post-1"), parent, text)
    }

    #[test]
    fn roots_keep_insertion_order() {
        let mut forest = CommentForest::default();
        forest.insert_root(comment("first", None));
        forest.insert_root(comment("second", None));

        let roots = forest.roots();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].text, "first");
        assert_eq!(roots[1].text, "second");
    }

    #[test]
    fn reply_lands_in_parent_reply_list() {
        let mut forest = CommentForest::default();
        let root = forest.insert_root(comment("nice", None));
        let reply = forest
            .insert_reply(&root, comment("thanks", None), 8)
            .unwrap();

        assert_eq!(forest.replies(&root).len(), 1);
        assert_eq!(forest.roots().len(), 1);
        assert_eq!(forest.find(&reply).unwrap().text, "thanks");
        assert_eq!(
            forest.find(&reply).unwrap().parent_comment_id,
            Some(root.clone())
        );
        assert_eq!(forest.depth_of(&reply), Some(1));
    }

    #[test]
    fn replies_flatten_at_the_depth_bound() {
        let mut forest = CommentForest::default();
        let root = forest.insert_root(comment("root", None));
        let mut parent = root.clone();
        for i in 0..5 {
            parent = forest
                .insert_reply(&parent, comment(&format!("level {}", i), None), 2)
                .unwrap();
        }

        // Nothing sits deeper than the bound, and nothing was dropped
        assert_eq!(forest.len(), 6);
        let max_depth = forest.thread().iter().map(|e| e.depth).max().unwrap();
        assert_eq!(max_depth, 2);
    }

    #[test]
    fn thread_walks_depth_first_in_order() {
        let mut forest = CommentForest::default();
        let a = forest.insert_root(comment("a", None));
        forest.insert_root(comment("b", None));
        forest.insert_reply(&a, comment("a1", None), 8).unwrap();

        let texts: Vec<&str> = forest
            .thread()
            .iter()
            .map(|e| e.comment.text.as_str())
            .collect();
        assert_eq!(texts, vec!["a", "a1", "b"]);
    }

    #[test]
    fn rekey_fixes_index_and_back_references() {
        let mut forest = CommentForest::default();
        let tmp = forest.insert_root(comment("pending", None));
        assert!(tmp.is_local());
        forest.insert_reply(&tmp, comment("child", None), 8).unwrap();

        let confirmed = CommentId::from("comment-77");
        assert!(forest.rekey(&tmp, confirmed.clone()));

        assert!(forest.find(&tmp).is_none());
        let parent = forest.find(&confirmed).unwrap();
        assert_eq!(parent.text, "pending");
        let replies = forest.replies(&confirmed);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].parent_comment_id, Some(confirmed));
    }

    #[test]
    fn remove_leaf_only_removes_childless_comments() {
        let mut forest = CommentForest::default();
        let root = forest.insert_root(comment("root", None));
        let leaf = forest
            .insert_reply(&root, comment("leaf", None), 8)
            .unwrap();

        assert!(forest.remove_leaf(&root).is_none());
        assert!(forest.remove_leaf(&leaf).is_some());
        assert_eq!(forest.len(), 1);
        assert!(forest.replies(&root).is_empty());
    }

    #[test]
    fn like_toggle_round_trips() {
        let mut forest = CommentForest::default();
        let id = forest.insert_root(comment("likeable", None));

        assert_eq!(forest.toggle_like(&id).unwrap(), 1);
        assert!(forest.find(&id).unwrap().user_liked);
        assert_eq!(forest.toggle_like(&id).unwrap(), 0);
        assert!(!forest.find(&id).unwrap().user_liked);
    }
}
