/// Post side-effect actions: save, hide, share, report
///
/// Save toggles an overlay flag both ways; hide is one-way for the
/// session; share mints a provenance-stamped copy; report is
/// fire-and-forget. All optimistic flag updates survive transient
/// failures uncorrupted: either the flag rolls back to its snapshot or
/// the failure is deliberately swallowed for fire-and-forget paths.
use crate::api::FeedBackend;
use crate::error::{EngineError, Result};
use crate::models::{CommentId, Post, PostId, PostStats, Session};
use crate::store::FeedStore;
use std::sync::Arc;
use tracing::debug;

pub struct ActionRegistry {
    store: Arc<FeedStore>,
    backend: Arc<dyn FeedBackend>,
    session: Session,
}

impl ActionRegistry {
    pub fn new(store: Arc<FeedStore>, backend: Arc<dyn FeedBackend>, session: Session) -> Self {
        ActionRegistry {
            store,
            backend,
            session,
        }
    }

    /// Flip the saved flag; returns the new state. Saving an already-saved
    /// post unsaves it.
    pub async fn toggle_save(&self, post_id: &PostId) -> Result<bool> {
        if self.store.get_post(post_id).is_none() {
            return Err(EngineError::NotFound(format!("post {}", post_id)));
        }
        let was_saved = self.store.is_saved(post_id);
        let now_saved = !was_saved;
        self.store.set_saved(post_id, now_saved);
        let version = self.store.bump_version(post_id);

        match self.backend.save_post(post_id, now_saved).await {
            Ok(()) => Ok(now_saved),
            Err(e) => {
                if self.store.is_current(post_id, version) {
                    self.store.set_saved(post_id, was_saved);
                    self.store.flag_error(format!("save failed: {}", e));
                }
                Err(e)
            }
        }
    }

    /// Hide a post for the rest of the session. One-way: hiding twice is a
    /// no-op, and the flag never rolls back even if the backend ack fails.
    pub async fn hide(&self, post_id: &PostId) -> Result<bool> {
        if self.store.get_post(post_id).is_none() {
            return Err(EngineError::NotFound(format!("post {}", post_id)));
        }
        let newly_hidden = self.store.hide(post_id);
        if newly_hidden {
            if let Err(e) = self.backend.hide_post(post_id).await {
                debug!("hide ack for {} failed, kept hidden locally: {}", post_id, e);
            }
        }
        Ok(newly_hidden)
    }

    /// Share-as-copy: a new post owned by the caller, content prefixed
    /// with the original author's provenance, counters zeroed. The
    /// original's share count moves by exactly one per invocation.
    pub async fn share(&self, post_id: &PostId) -> Result<PostId> {
        let original = self
            .store
            .get_post(post_id)
            .ok_or_else(|| EngineError::NotFound(format!("post {}", post_id)))?;

        let content = format!("(Shared from {}): {}", original.author_name, original.content);
        let mut copy = Post::draft(&self.session, content, original.kind.clone());
        copy.resolve_moderation(true)?;
        copy.is_shared = true;
        let copy_id = copy.id.clone();

        self.store.insert_post_front(copy);
        self.store
            .update_post(post_id, |post| post.counters.shares += 1)?;
        let version = self.store.bump_version(&copy_id);

        match self.backend.share_post(post_id).await {
            Ok(()) => Ok(copy_id),
            Err(e) => {
                if self.store.is_current(&copy_id, version) {
                    self.store.remove_post(&copy_id);
                    let _ = self.store.update_post(post_id, |post| {
                        post.counters.shares = post.counters.shares.saturating_sub(1);
                    });
                    self.store.flag_error(format!("share failed: {}", e));
                }
                Err(e)
            }
        }
    }

    /// Report a post. Delivery is fire-and-forget: a lost report never
    /// surfaces to the caller. The local hide only happens on request.
    pub async fn report(
        &self,
        post_id: &PostId,
        report_type: &str,
        reason: &str,
        hide_after: bool,
    ) -> Result<()> {
        if self.store.get_post(post_id).is_none() {
            return Err(EngineError::NotFound(format!("post {}", post_id)));
        }
        if hide_after {
            self.store.hide(post_id);
        }
        if let Err(e) = self.backend.report_post(post_id, report_type, reason).await {
            debug!("report delivery for {} failed: {}", post_id, e);
        }
        Ok(())
    }

    /// Session-local comment like toggle; returns the new like count.
    pub fn toggle_comment_like(&self, post_id: &PostId, comment_id: &CommentId) -> Result<u32> {
        self.store
            .update_post(post_id, |post| post.comments.toggle_like(comment_id))?
    }

    /// Local aggregation over a post's confirmed counters.
    pub fn post_stats(&self, post_id: &PostId) -> Result<PostStats> {
        let post = self
            .store
            .get_post(post_id)
            .ok_or_else(|| EngineError::NotFound(format!("post {}", post_id)))?;
        Ok(PostStats::of(&post))
    }
}
