//! Social feed interaction engine
//!
//! The stateful core behind a community feed: paginated post loading,
//! per-user single-choice reactions, nested comment threads,
//! save/hide/share/report actions, a pre-publish moderation gate, and
//! optimistic mutations reconciled against backend confirmations.
//!
//! Rendering, routing, and credential issuance live elsewhere; consumers
//! hold a [`FeedEngine`], call its operations, and re-render from
//! [`FeedEngine::visible_posts`]. Without a bearer credential the engine
//! serves a built-in fixture dataset through the same contract.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod retry;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{EngineError, Result};

use api::{ApiClient, FeedBackend, FixtureRepository};
use models::{
    CommentId, FeedKind, PostDraft, PostId, PostStats, PostView, ReactionType, Session,
};
use services::{ActionRegistry, ModerationGateway, SyncReconciler};
use std::sync::Arc;
use store::{FeedFilter, FeedStore};
use tracing::info;

/// Facade over the store and services, wired per session.
pub struct FeedEngine {
    store: Arc<FeedStore>,
    reconciler: SyncReconciler,
    actions: ActionRegistry,
}

impl FeedEngine {
    /// Wire up an engine for a session. A session carrying a bearer
    /// credential talks to the REST backend; an anonymous one is served
    /// the fixture dataset through the identical contract.
    pub fn new(config: Config, session: Session) -> Result<Self> {
        let fixture = Arc::new(FixtureRepository::seeded(session.clone()));
        let backend: Arc<dyn FeedBackend> = match &session.access_token {
            Some(token) => {
                Arc::new(ApiClient::new(&config.api, Some(token.clone()))?)
            }
            None => {
                info!("no credential in session, serving fixture dataset");
                fixture.clone()
            }
        };
        Self::with_backend(config, session, backend, fixture)
    }

    /// Same wiring with an explicit backend, for tests and embedding.
    pub fn with_backend(
        config: Config,
        session: Session,
        backend: Arc<dyn FeedBackend>,
        fixture: Arc<FixtureRepository>,
    ) -> Result<Self> {
        let moderation = Arc::new(ModerationGateway::new(
            &config.moderation,
            config.moderation_retry(),
        )?);
        let store = Arc::new(FeedStore::new(
            backend.clone(),
            fixture,
            config.feed.clone(),
        ));
        let reconciler = SyncReconciler::new(
            store.clone(),
            backend.clone(),
            moderation,
            session.clone(),
            config.feed.max_comment_depth,
        );
        let actions = ActionRegistry::new(store.clone(), backend, session);
        Ok(FeedEngine {
            store,
            reconciler,
            actions,
        })
    }

    // ========== Feed ==========

    pub async fn switch_kind(&self, kind: FeedKind) -> Result<()> {
        self.store.switch_kind(kind).await
    }

    pub async fn load_more(&self) -> Result<models::Page> {
        self.store.load_more().await
    }

    pub async fn load_comments(&self, post_id: &PostId) -> Result<()> {
        self.store.load_comments(post_id).await
    }

    pub fn visible_posts(&self, filter: &FeedFilter) -> Vec<PostView> {
        self.store.visible_posts(filter)
    }

    pub fn kind(&self) -> FeedKind {
        self.store.kind()
    }

    pub fn has_more(&self) -> bool {
        self.store.has_more()
    }

    pub fn degraded(&self) -> bool {
        self.store.degraded()
    }

    pub fn last_error(&self) -> Option<String> {
        self.store.last_error()
    }

    pub fn clear_error(&self) {
        self.store.clear_error()
    }

    /// Full reload; the only path that resets session-hidden posts.
    pub fn reset(&self) {
        self.store.reset()
    }

    // ========== Mutations ==========

    pub async fn react(&self, post_id: &PostId, reaction: ReactionType) -> Result<()> {
        self.reconciler.react(post_id, reaction).await
    }

    pub async fn add_comment(
        &self,
        post_id: &PostId,
        parent: Option<&CommentId>,
        text: &str,
    ) -> Result<CommentId> {
        self.reconciler.add_comment(post_id, parent, text).await
    }

    pub async fn create_post(&self, draft: &PostDraft) -> Result<PostId> {
        self.reconciler.create_post(draft).await
    }

    pub async fn delete_post(&self, post_id: &PostId) -> Result<()> {
        self.reconciler.delete_post(post_id).await
    }

    // ========== Actions ==========

    pub async fn toggle_save(&self, post_id: &PostId) -> Result<bool> {
        self.actions.toggle_save(post_id).await
    }

    pub async fn hide(&self, post_id: &PostId) -> Result<bool> {
        self.actions.hide(post_id).await
    }

    pub async fn share(&self, post_id: &PostId) -> Result<PostId> {
        self.actions.share(post_id).await
    }

    pub async fn report(
        &self,
        post_id: &PostId,
        report_type: &str,
        reason: &str,
        hide_after: bool,
    ) -> Result<()> {
        self.actions.report(post_id, report_type, reason, hide_after).await
    }

    pub fn toggle_comment_like(&self, post_id: &PostId, comment_id: &CommentId) -> Result<u32> {
        self.actions.toggle_comment_like(post_id, comment_id)
    }

    pub fn post_stats(&self, post_id: &PostId) -> Result<PostStats> {
        self.actions.post_stats(post_id)
    }

    pub fn toggle_expanded(&self, comment_id: &CommentId) -> bool {
        self.store.toggle_expanded(comment_id)
    }

    pub fn is_expanded(&self, comment_id: &CommentId) -> bool {
        self.store.is_expanded(comment_id)
    }
}
