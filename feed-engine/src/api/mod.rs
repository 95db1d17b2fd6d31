/// Backend access layer
///
/// `FeedBackend` is the seam between the engine and the network: the real
/// REST client and the in-memory fixture repository implement the same
/// contract and are selected by dependency injection, never by scattered
/// flags.
pub mod client;
pub mod fixture;
pub mod types;

pub use client::ApiClient;
pub use fixture::FixtureRepository;

use crate::error::Result;
use crate::models::{FeedKind, PostId, ReactionType};
use async_trait::async_trait;
use types::{CommentDto, CommentsEnvelope, CreatePostRequest, FeedEnvelope, PostDto, ReactionOutcome};

#[async_trait]
pub trait FeedBackend: Send + Sync {
    /// `GET feed?kind&page&size`
    async fn fetch_page(&self, kind: FeedKind, page: u32, size: u32) -> Result<FeedEnvelope>;

    /// `POST post/{id}/react` — backend reports added/removed/updated
    async fn react(&self, post_id: &PostId, reaction: ReactionType) -> Result<ReactionOutcome>;

    /// `GET post/{id}/comments?page&size`
    async fn fetch_comments(
        &self,
        post_id: &PostId,
        page: u32,
        size: u32,
    ) -> Result<CommentsEnvelope>;

    /// `POST post/{id}/comments`
    async fn create_comment(
        &self,
        post_id: &PostId,
        content: &str,
        parent_comment_id: Option<&str>,
    ) -> Result<CommentDto>;

    /// `POST`/`DELETE post/{id}/save`
    async fn save_post(&self, post_id: &PostId, saved: bool) -> Result<()>;

    /// `POST post/{id}/hide`
    async fn hide_post(&self, post_id: &PostId) -> Result<()>;

    /// `POST post/{id}/share`
    async fn share_post(&self, post_id: &PostId) -> Result<()>;

    /// `POST post/{id}/report`
    async fn report_post(&self, post_id: &PostId, report_type: &str, reason: &str) -> Result<()>;

    /// `POST post/create` — returns the canonical post
    async fn create_post(&self, req: &CreatePostRequest) -> Result<PostDto>;

    /// `DELETE post/{id}`
    async fn delete_post(&self, post_id: &PostId) -> Result<()>;
}
