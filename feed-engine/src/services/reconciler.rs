/// Optimistic/confirmed reconciliation
///
/// Every mutation follows the same protocol: apply to local state and
/// render immediately, take a pre-mutation snapshot and a fresh entity
/// version, then await the backend. A confirmation replaces temporary ids
/// and adopts server values; a failure rolls back to the snapshot and
/// surfaces a non-blocking error flag. Any confirmation arriving for a
/// version older than the one currently applied is discarded, never
/// merged.
use crate::api::types::CreatePostRequest;
use crate::api::FeedBackend;
use crate::error::{EngineError, Result};
use crate::models::{Comment, CommentId, Post, PostDraft, PostId, ReactionType, Session};
use crate::services::moderation::{ModerationGateway, Verdict};
use crate::services::reactions;
use crate::store::FeedStore;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct SyncReconciler {
    store: Arc<FeedStore>,
    backend: Arc<dyn FeedBackend>,
    moderation: Arc<ModerationGateway>,
    session: Session,
    max_comment_depth: u32,
}

impl SyncReconciler {
    pub fn new(
        store: Arc<FeedStore>,
        backend: Arc<dyn FeedBackend>,
        moderation: Arc<ModerationGateway>,
        session: Session,
        max_comment_depth: u32,
    ) -> Self {
        SyncReconciler {
            store,
            backend,
            moderation,
            session,
            max_comment_depth,
        }
    }

    // ========== Reactions ==========

    /// Toggle/switch the caller's reaction on a post. The optimistic step
    /// is derived once from the pre-mutation state; the backend's
    /// acknowledgement either confirms it or wins over it.
    pub async fn react(&self, post_id: &PostId, reaction: ReactionType) -> Result<()> {
        let snapshot = self
            .store
            .snapshot(post_id)
            .ok_or_else(|| EngineError::NotFound(format!("post {}", post_id)))?;

        let step = reactions::transition(snapshot.user_reaction, reaction);
        self.store
            .update_post(post_id, |post| reactions::apply(post, step))?;
        self.store.set_pending_reaction(
            post_id,
            match step {
                reactions::ReactionStep::Removed(_) => None,
                reactions::ReactionStep::Added(r)
                | reactions::ReactionStep::Switched { to: r, .. } => Some(r),
            },
        );
        let version = self.store.bump_version(post_id);

        match self.backend.react(post_id, reaction).await {
            Ok(outcome) => {
                if !self.store.is_current(post_id, version) {
                    debug!("discarding stale reaction confirmation for {}", post_id);
                    self.store.set_pending_reaction(post_id, None);
                    return Ok(());
                }
                self.store.set_pending_reaction(post_id, None);
                if outcome != reactions::expected_outcome(step) {
                    warn!(
                        "reaction reconciliation on {}: expected {:?}, backend reported {:?}",
                        post_id,
                        reactions::expected_outcome(step),
                        outcome
                    );
                    let previous = snapshot.user_reaction;
                    self.store.restore(snapshot);
                    if let Some(correction) =
                        reactions::confirmed_step(previous, reaction, outcome)
                    {
                        self.store
                            .update_post(post_id, |post| reactions::apply(post, correction))?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                if self.store.is_current(post_id, version) {
                    self.store.restore(snapshot);
                    self.store.flag_error(format!("reaction failed: {}", e));
                }
                self.store.set_pending_reaction(post_id, None);
                Err(e)
            }
        }
    }

    // ========== Comments ==========

    /// Add a root comment or a reply. The comment renders immediately
    /// under a temporary id; confirmation rekeys it in place.
    pub async fn add_comment(
        &self,
        post_id: &PostId,
        parent: Option<&CommentId>,
        text: &str,
    ) -> Result<CommentId> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::Validation(
                "comment text must not be empty".to_string(),
            ));
        }

        let comment = Comment::local(&self.session, post_id.clone(), parent.cloned(), text);
        let max_depth = self.max_comment_depth;
        let local_id = self
            .store
            .update_post(post_id, |post| -> Result<CommentId> {
                let id = match parent {
                    None => post.comments.insert_root(comment),
                    Some(parent_id) => {
                        post.comments.insert_reply(parent_id, comment, max_depth)?
                    }
                };
                post.counters.comments += 1;
                Ok(id)
            })??;
        let version = self.store.bump_version(post_id);

        match self
            .backend
            .create_comment(post_id, text, parent.map(|p| p.0.as_str()))
            .await
        {
            Ok(dto) => {
                let confirmed = CommentId::from(dto.id.as_str());
                if !self.store.is_current(post_id, version) {
                    debug!("discarding stale comment confirmation for {}", post_id);
                    return Ok(local_id);
                }
                self.store.update_post(post_id, |post| {
                    if !post.comments.rekey(&local_id, confirmed.clone()) {
                        debug!("local comment {} vanished before confirmation", local_id);
                    }
                })?;
                Ok(confirmed)
            }
            Err(e) => {
                if self.store.is_current(post_id, version) {
                    self.store.update_post(post_id, |post| {
                        post.comments.remove_leaf(&local_id);
                        post.counters.comments = post.counters.comments.saturating_sub(1);
                    })?;
                    self.store.flag_error(format!("comment failed: {}", e));
                }
                Err(e)
            }
        }
    }

    // ========== Post lifecycle ==========

    /// Publish a draft. The moderation gate runs BEFORE the post touches
    /// the canonical list; a rejected draft never renders and stays with
    /// the caller for editing.
    pub async fn create_post(&self, draft: &PostDraft) -> Result<PostId> {
        let content = draft.content.trim();
        if content.is_empty() {
            return Err(EngineError::Validation(
                "post content must not be empty".to_string(),
            ));
        }

        if self.moderation.classify(content).await == Verdict::Unsafe {
            return Err(EngineError::ModerationRejected(
                "content does not meet community guidelines".to_string(),
            ));
        }

        let mut post = Post::draft(&self.session, content, draft.kind.clone());
        post.resolve_moderation(true)?;
        let local_id = post.id.clone();
        self.store.insert_post_front(post);
        let version = self.store.bump_version(&local_id);

        match self
            .backend
            .create_post(&CreatePostRequest::from_draft(draft))
            .await
        {
            Ok(dto) => {
                let confirmed = PostId::from(dto.id.as_str());
                if !self.store.is_current(&local_id, version) {
                    debug!("discarding stale create confirmation for {}", local_id);
                    return Ok(local_id);
                }
                let created_at = dto.created_at;
                self.store.replace_post_id(&local_id, &confirmed)?;
                self.store.update_post(&confirmed, |post| {
                    post.created_at = created_at;
                })?;
                Ok(confirmed)
            }
            Err(e) => {
                if self.store.is_current(&local_id, version) {
                    self.store.remove_post(&local_id);
                    self.store.flag_error(format!("publish failed: {}", e));
                }
                Err(e)
            }
        }
    }

    /// Remove a post optimistically; failure puts it back where it was.
    pub async fn delete_post(&self, post_id: &PostId) -> Result<()> {
        let (post, index) = self
            .store
            .remove_post(post_id)
            .ok_or_else(|| EngineError::NotFound(format!("post {}", post_id)))?;
        let version = self.store.bump_version(post_id);

        match self.backend.delete_post(post_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if self.store.is_current(post_id, version) {
                    self.store.insert_post_at(index, post);
                    self.store.flag_error(format!("delete failed: {}", e));
                }
                Err(e)
            }
        }
    }
}
