/// Client-side overlay over the server-confirmed collection
///
/// Saved, hidden, pending-reaction and expanded-thread state never touch
/// the canonical snapshots; they are merged at render time so the source
/// of truth stays unambiguous. Hidden is one-way for the session.
use crate::models::{CommentId, PostId, ReactionType};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct OverlayEntry {
    pub is_saved: bool,
    pub is_hidden: bool,
    pub pending_reaction: Option<ReactionType>,
}

#[derive(Debug, Default)]
pub struct Overlay {
    entries: HashMap<PostId, OverlayEntry>,
    expanded: HashSet<CommentId>,
}

impl Overlay {
    pub fn entry(&self, id: &PostId) -> OverlayEntry {
        self.entries.get(id).cloned().unwrap_or_default()
    }

    pub fn is_saved(&self, id: &PostId) -> bool {
        self.entries.get(id).map(|e| e.is_saved).unwrap_or(false)
    }

    pub fn is_hidden(&self, id: &PostId) -> bool {
        self.entries.get(id).map(|e| e.is_hidden).unwrap_or(false)
    }

    pub fn set_saved(&mut self, id: &PostId, saved: bool) {
        self.entries.entry(id.clone()).or_default().is_saved = saved;
    }

    /// One-way for the session; there is no unhide
    pub fn hide(&mut self, id: &PostId) -> bool {
        let entry = self.entries.entry(id.clone()).or_default();
        let newly = !entry.is_hidden;
        entry.is_hidden = true;
        newly
    }

    pub fn set_pending_reaction(&mut self, id: &PostId, reaction: Option<ReactionType>) {
        self.entries.entry(id.clone()).or_default().pending_reaction = reaction;
    }

    /// Expand/collapse is O(1) regardless of tree depth
    pub fn toggle_expanded(&mut self, id: &CommentId) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.clone());
            true
        }
    }

    pub fn is_expanded(&self, id: &CommentId) -> bool {
        self.expanded.contains(id)
    }

    /// Move overlay state to a confirmed id once the backend replaces a
    /// temporary one
    pub fn rekey(&mut self, old: &PostId, new: &PostId) {
        if let Some(entry) = self.entries.remove(old) {
            self.entries.insert(new.clone(), entry);
        }
    }

    /// Engine reload is the only thing allowed to reset hidden state
    pub fn reset(&mut self) {
        self.entries.clear();
        self.expanded.clear();
    }
}
