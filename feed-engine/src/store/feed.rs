/// FeedStore — owner of the canonical post collection
///
/// Single-writer discipline: reaction, comment and action logic mutate
/// posts only through `update_post`. Pagination is generation-counted so a
/// page resolving after a feed-kind switch is discarded silently, and
/// fetches are single-flight per kind. Filters and search are pure view
/// transforms over the one canonical list.
use crate::api::{FeedBackend, FixtureRepository};
use crate::config::FeedConfig;
use crate::error::{EngineError, Result};
use crate::models::{
    CommentId, FeedKind, ModerationStatus, Page, Post, PostId, PostView, ReactionType,
};
use crate::store::comments::CommentForest;
use crate::store::overlay::Overlay;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// View transform over the canonical list; never a separate store
#[derive(Debug, Clone, Default)]
pub struct FeedFilter {
    pub saved_only: bool,
    pub search: Option<String>,
}

struct FeedState {
    kind: FeedKind,
    posts: Vec<Post>,
    next_page: u32,
    has_more: bool,
    /// Bumped on every kind switch; stale page resolutions are discarded
    generation: u64,
    /// Generation of the fetch currently in flight, if any
    in_flight: Option<u64>,
    /// True while pages come from the fixture dataset
    degraded: bool,
    last_error: Option<String>,
    overlay: Overlay,
    versions: HashMap<PostId, u64>,
}

pub struct FeedStore {
    backend: Arc<dyn FeedBackend>,
    fixture: Arc<FixtureRepository>,
    config: FeedConfig,
    state: Mutex<FeedState>,
}

impl FeedStore {
    pub fn new(
        backend: Arc<dyn FeedBackend>,
        fixture: Arc<FixtureRepository>,
        config: FeedConfig,
    ) -> Self {
        FeedStore {
            backend,
            fixture,
            config,
            state: Mutex::new(FeedState {
                kind: FeedKind::Personalized,
                posts: Vec::new(),
                next_page: 0,
                has_more: true,
                generation: 0,
                in_flight: None,
                degraded: false,
                last_error: None,
                overlay: Overlay::default(),
                versions: HashMap::new(),
            }),
        }
    }

    // ========== Pagination ==========

    /// Switch the active feed kind: cursor resets, rendered items clear,
    /// and any in-flight fetch for the abandoned view is invalidated.
    pub async fn switch_kind(&self, kind: FeedKind) -> Result<()> {
        {
            let mut s = self.state.lock();
            s.kind = kind;
            s.posts.clear();
            s.next_page = 0;
            s.has_more = true;
            s.generation += 1;
            s.in_flight = None;
            s.last_error = None;
        }
        self.load_more().await.map(|_| ())
    }

    /// Fetch the next page. Single-flight: a call while a fetch for the
    /// same kind is already in flight is a no-op and returns an empty
    /// page, as does a page resolving under an abandoned generation.
    pub async fn load_more(&self) -> Result<Page> {
        let (generation, kind, page, size) = {
            let mut s = self.state.lock();
            if !s.has_more {
                return Ok(Page {
                    items: Vec::new(),
                    next_cursor: None,
                    has_more: false,
                });
            }
            if s.in_flight == Some(s.generation) {
                debug!("load_more: fetch already in flight for {:?}", s.kind);
                return Ok(Page {
                    items: Vec::new(),
                    next_cursor: Some(s.next_page),
                    has_more: true,
                });
            }
            s.in_flight = Some(s.generation);
            (s.generation, s.kind, s.next_page, self.config.page_size)
        };

        let already_degraded = self.state.lock().degraded;
        let fetched = if already_degraded {
            self.fixture
                .fetch_page(kind, page, size)
                .await
                .map(|env| (env, true))
        } else {
            match self.backend.fetch_page(kind, page, size).await {
                Ok(env) => Ok((env, false)),
                Err(EngineError::Transport(msg)) => {
                    let nothing_loaded = {
                        let s = self.state.lock();
                        s.generation == generation && s.posts.is_empty()
                    };
                    if nothing_loaded {
                        warn!(
                            "feed backend unreachable, serving fixture dataset: {}",
                            msg
                        );
                        self.fixture
                            .fetch_page(kind, page, size)
                            .await
                            .map(|env| (env, true))
                    } else {
                        Err(EngineError::Transport(msg))
                    }
                }
                Err(e) => Err(e),
            }
        };

        let (envelope, from_fixture) = match fetched {
            Ok(ok) => ok,
            Err(e) => {
                // Keep already-loaded items and has_more so a retry works
                let mut s = self.state.lock();
                if s.generation == generation {
                    s.in_flight = None;
                    s.last_error = Some(e.to_string());
                }
                return Err(e);
            }
        };

        let mut s = self.state.lock();
        if s.generation != generation {
            debug!("discarding stale page for abandoned generation {}", generation);
            return Ok(Page {
                items: Vec::new(),
                next_cursor: Some(s.next_page),
                has_more: s.has_more,
            });
        }
        s.in_flight = None;
        s.last_error = None;
        s.degraded = from_fixture;

        let total_pages = envelope.total_pages;
        let mut applied = Vec::new();
        for dto in envelope.items {
            let saved = dto.is_saved;
            let post = dto.into_post();
            if saved {
                s.overlay.set_saved(&post.id, true);
            }
            if !s.posts.iter().any(|p| p.id == post.id) {
                applied.push(post.clone());
                s.posts.push(post);
            }
        }
        s.next_page = page + 1;
        s.has_more = s.next_page < total_pages;
        Ok(Page {
            items: applied,
            next_cursor: s.has_more.then_some(s.next_page),
            has_more: s.has_more,
        })
    }

    /// Populate a post's comment thread from the backend (or the fixture
    /// while degraded), grafting nested replies into the arena.
    pub async fn load_comments(&self, post_id: &PostId) -> Result<()> {
        let degraded = self.state.lock().degraded;
        let envelope = if degraded {
            self.fixture
                .fetch_comments(post_id, 0, self.config.comment_page_size)
                .await?
        } else {
            self.backend
                .fetch_comments(post_id, 0, self.config.comment_page_size)
                .await?
        };

        let max_depth = self.config.max_comment_depth;
        self.update_post(post_id, |post| {
            let mut forest = CommentForest::default();
            let post_id = post.id.clone();
            // (parent in the arena, dto subtree)
            let mut queue: Vec<(Option<CommentId>, _)> = envelope
                .data
                .into_iter()
                .map(|dto| (None, dto))
                .collect();
            queue.reverse();
            while let Some((parent, dto)) = queue.pop() {
                let (comment, replies) = dto.into_comment(&post_id);
                let inserted = match parent {
                    None => Some(forest.insert_root(comment)),
                    Some(parent_id) => forest
                        .insert_reply(&parent_id, comment, max_depth)
                        .ok(),
                };
                if let Some(id) = inserted {
                    for reply in replies.into_iter().rev() {
                        queue.push((Some(id.clone()), reply));
                    }
                }
            }
            post.comments = forest;
        })
    }

    // ========== Canonical collection access ==========

    pub fn get_post(&self, id: &PostId) -> Option<Post> {
        self.state.lock().posts.iter().find(|p| &p.id == id).cloned()
    }

    /// Pre-mutation snapshot for rollback
    pub fn snapshot(&self, id: &PostId) -> Option<Post> {
        self.get_post(id)
    }

    /// The single mutation entry point for every other component
    pub fn update_post<R>(&self, id: &PostId, f: impl FnOnce(&mut Post) -> R) -> Result<R> {
        let mut s = self.state.lock();
        let post = s
            .posts
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("post {}", id)))?;
        Ok(f(post))
    }

    pub fn insert_post_front(&self, post: Post) {
        self.state.lock().posts.insert(0, post);
    }

    pub fn insert_post_at(&self, index: usize, post: Post) {
        let mut s = self.state.lock();
        let index = index.min(s.posts.len());
        s.posts.insert(index, post);
    }

    pub fn remove_post(&self, id: &PostId) -> Option<(Post, usize)> {
        let mut s = self.state.lock();
        let index = s.posts.iter().position(|p| &p.id == id)?;
        Some((s.posts.remove(index), index))
    }

    /// Swap a temporary id for the backend-confirmed one, carrying overlay
    /// state and the version counter along.
    pub fn replace_post_id(&self, old: &PostId, new: &PostId) -> Result<()> {
        let mut s = self.state.lock();
        let post = s
            .posts
            .iter_mut()
            .find(|p| &p.id == old)
            .ok_or_else(|| EngineError::NotFound(format!("post {}", old)))?;
        post.id = new.clone();
        s.overlay.rekey(old, new);
        if let Some(version) = s.versions.remove(old) {
            s.versions.insert(new.clone(), version);
        }
        Ok(())
    }

    /// Roll a post back to its pre-mutation snapshot
    pub fn restore(&self, snapshot: Post) {
        let mut s = self.state.lock();
        if let Some(post) = s.posts.iter_mut().find(|p| p.id == snapshot.id) {
            *post = snapshot;
        }
    }

    // ========== Per-entity versions ==========

    /// Attach a new monotonic version to an optimistic update
    pub fn bump_version(&self, id: &PostId) -> u64 {
        let mut s = self.state.lock();
        let version = s.versions.entry(id.clone()).or_insert(0);
        *version += 1;
        *version
    }

    /// A confirmation older than the applied version must be discarded
    pub fn is_current(&self, id: &PostId, version: u64) -> bool {
        self.state
            .lock()
            .versions
            .get(id)
            .map(|v| *v == version)
            .unwrap_or(false)
    }

    // ========== Overlay ==========

    pub fn is_saved(&self, id: &PostId) -> bool {
        self.state.lock().overlay.is_saved(id)
    }

    pub fn is_hidden(&self, id: &PostId) -> bool {
        self.state.lock().overlay.is_hidden(id)
    }

    pub fn set_saved(&self, id: &PostId, saved: bool) {
        self.state.lock().overlay.set_saved(id, saved);
    }

    /// One-way for the session; returns whether the post was newly hidden
    pub fn hide(&self, id: &PostId) -> bool {
        self.state.lock().overlay.hide(id)
    }

    pub fn set_pending_reaction(&self, id: &PostId, reaction: Option<ReactionType>) {
        self.state.lock().overlay.set_pending_reaction(id, reaction);
    }

    pub fn toggle_expanded(&self, id: &CommentId) -> bool {
        self.state.lock().overlay.toggle_expanded(id)
    }

    pub fn is_expanded(&self, id: &CommentId) -> bool {
        self.state.lock().overlay.is_expanded(id)
    }

    // ========== Views ==========

    pub fn kind(&self) -> FeedKind {
        self.state.lock().kind
    }

    pub fn has_more(&self) -> bool {
        self.state.lock().has_more
    }

    pub fn degraded(&self) -> bool {
        self.state.lock().degraded
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    pub fn flag_error(&self, message: impl Into<String>) {
        self.state.lock().last_error = Some(message.into());
    }

    pub fn clear_error(&self) {
        self.state.lock().last_error = None;
    }

    pub fn len(&self) -> usize {
        self.state.lock().posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().posts.is_empty()
    }

    /// Render view: hidden posts suppressed, overlay merged, filters and
    /// free-text search applied against the one canonical list.
    pub fn visible_posts(&self, filter: &FeedFilter) -> Vec<PostView> {
        let s = self.state.lock();
        s.posts
            .iter()
            .filter(|p| match p.moderation_status {
                ModerationStatus::Approved => true,
                ModerationStatus::Pending | ModerationStatus::Rejected => false,
            })
            .filter(|p| !s.overlay.is_hidden(&p.id))
            .filter(|p| !filter.saved_only || s.overlay.is_saved(&p.id))
            .filter(|p| match &filter.search {
                Some(query) => {
                    let q = query.to_lowercase();
                    p.content.to_lowercase().contains(&q)
                        || p.author_name.to_lowercase().contains(&q)
                }
                None => true,
            })
            .map(|p| {
                let entry = s.overlay.entry(&p.id);
                PostView {
                    post: p.clone(),
                    is_saved: entry.is_saved,
                    pending_reaction: entry.pending_reaction,
                }
            })
            .collect()
    }

    /// Engine reload: the only way session-scoped hidden state resets
    pub fn reset(&self) {
        let mut s = self.state.lock();
        s.posts.clear();
        s.next_page = 0;
        s.has_more = true;
        s.generation += 1;
        s.in_flight = None;
        s.degraded = false;
        s.last_error = None;
        s.overlay.reset();
        s.versions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Session;

    fn store_over_fixture() -> FeedStore {
        let fixture = Arc::new(FixtureRepository::seeded(Session::anonymous()));
        FeedStore::new(fixture.clone(), fixture, FeedConfig {
            page_size: 3,
            comment_page_size: 5,
            max_comment_depth: 8,
        })
    }

    #[tokio::test]
    async fn load_more_pages_through_the_feed() {
        let store = store_over_fixture();

        let page = store.load_more().await.unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.next_cursor, Some(1));
        assert!(page.has_more);
        assert_eq!(store.len(), 3);

        let page = store.load_more().await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(!page.has_more);
        assert_eq!(store.len(), 5);

        // Exhausted feed: further calls are no-ops
        let page = store.load_more().await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn switch_kind_clears_items_and_resets_cursor() {
        let store = store_over_fixture();
        store.load_more().await.unwrap();
        assert_eq!(store.len(), 3);

        store.switch_kind(FeedKind::Saved).await.unwrap();
        assert_eq!(store.kind(), FeedKind::Saved);
        let views = store.visible_posts(&FeedFilter::default());
        assert!(!views.is_empty());
        assert!(views.iter().all(|v| v.is_saved));
    }

    #[tokio::test]
    async fn hidden_posts_drop_out_of_every_render() {
        let store = store_over_fixture();
        store.load_more().await.unwrap();
        let first = store.visible_posts(&FeedFilter::default())[0].post.id.clone();

        assert!(store.hide(&first));
        assert!(!store.hide(&first));

        let views = store.visible_posts(&FeedFilter::default());
        assert!(views.iter().all(|v| v.post.id != first));
    }

    #[tokio::test]
    async fn search_matches_content_and_author() {
        let store = store_over_fixture();
        store.load_more().await.unwrap();
        store.load_more().await.unwrap();

        let by_content = store.visible_posts(&FeedFilter {
            search: Some("css grid".into()),
            ..Default::default()
        });
        assert_eq!(by_content.len(), 1);

        let by_author = store.visible_posts(&FeedFilter {
            search: Some("le thao".into()),
            ..Default::default()
        });
        assert_eq!(by_author.len(), 1);
    }

    #[tokio::test]
    async fn comments_graft_with_nested_replies() {
        let store = store_over_fixture();
        store.load_more().await.unwrap();
        let id = PostId::from("1");

        store.load_comments(&id).await.unwrap();
        let post = store.get_post(&id).unwrap();
        assert_eq!(post.comments.roots().len(), 2);
        assert_eq!(post.comments.len(), 3);

        let thread = post.comments.thread();
        assert_eq!(thread.iter().filter(|e| e.depth == 1).count(), 1);
    }

    #[tokio::test]
    async fn overlay_state_merges_into_the_rendered_view() {
        let store = store_over_fixture();
        store.load_more().await.unwrap();
        let id = PostId::from("1");

        store.set_saved(&id, true);
        store.set_pending_reaction(&id, Some(ReactionType::Love));

        let views = store.visible_posts(&FeedFilter::default());
        let view = views.iter().find(|v| v.post.id == id).unwrap();
        assert!(view.is_saved);
        assert_eq!(view.pending_reaction, Some(ReactionType::Love));

        store.set_pending_reaction(&id, None);
        let views = store.visible_posts(&FeedFilter::default());
        let view = views.iter().find(|v| v.post.id == id).unwrap();
        assert_eq!(view.pending_reaction, None);
    }

    #[tokio::test]
    async fn versions_are_monotonic_per_entity() {
        let store = store_over_fixture();
        store.load_more().await.unwrap();
        let id = PostId::from("1");

        let v1 = store.bump_version(&id);
        let v2 = store.bump_version(&id);
        assert!(v2 > v1);
        assert!(store.is_current(&id, v2));
        assert!(!store.is_current(&id, v1));
    }
}
