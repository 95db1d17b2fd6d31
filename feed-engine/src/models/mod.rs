/// Domain model for the social feed engine
///
/// Server-confirmed state lives here; client-only flags (saved, hidden,
/// pending reaction, expanded threads) live in the overlay and are merged
/// only at render time.
use crate::error::{EngineError, Result};
use crate::store::comments::CommentForest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

const LOCAL_ID_PREFIX: &str = "local-";

/// Post identifier. Locally-minted ids carry a `local-` prefix until the
/// backend confirms a canonical id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub String);

impl PostId {
    /// Mint a temporary id for an optimistically-created post
    pub fn local() -> Self {
        PostId(format!("{}{}", LOCAL_ID_PREFIX, Uuid::new_v4()))
    }

    /// True while the id is still awaiting backend confirmation
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> Self {
        PostId(s.to_string())
    }
}

/// Comment identifier with the same temporary-until-confirmed scheme
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub String);

impl CommentId {
    pub fn local() -> Self {
        CommentId(format!("{}{}", LOCAL_ID_PREFIX, Uuid::new_v4()))
    }

    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CommentId {
    fn from(s: &str) -> Self {
        CommentId(s.to_string())
    }
}

/// Fixed reaction-type set. A user holds at most one at a time per post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactionType {
    Like,
    Love,
    Haha,
    Wow,
    Sad,
    Angry,
}

impl ReactionType {
    pub const ALL: [ReactionType; 6] = [
        ReactionType::Like,
        ReactionType::Love,
        ReactionType::Haha,
        ReactionType::Wow,
        ReactionType::Sad,
        ReactionType::Angry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionType::Like => "LIKE",
            ReactionType::Love => "LOVE",
            ReactionType::Haha => "HAHA",
            ReactionType::Wow => "WOW",
            ReactionType::Sad => "SAD",
            ReactionType::Angry => "ANGRY",
        }
    }

    pub fn parse(s: &str) -> Option<ReactionType> {
        match s.to_ascii_uppercase().as_str() {
            "LIKE" => Some(ReactionType::Like),
            "LOVE" => Some(ReactionType::Love),
            "HAHA" => Some(ReactionType::Haha),
            "WOW" => Some(ReactionType::Wow),
            "SAD" => Some(ReactionType::Sad),
            "ANGRY" => Some(ReactionType::Angry),
            _ => None,
        }
    }
}

/// Named view over the post collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Personalized,
    Trending,
    Saved,
    Activity,
}

impl FeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Personalized => "personalized",
            FeedKind::Trending => "trending",
            FeedKind::Saved => "saved",
            FeedKind::Activity => "activity",
        }
    }
}

/// Post content kind, handled exhaustively at every consumption site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostKind {
    Text,
    Image {
        url: String,
    },
    Video {
        url: String,
        thumbnail: Option<String>,
    },
}

impl PostKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            PostKind::Text => "TEXT",
            PostKind::Image { .. } => "IMAGE",
            PostKind::Video { .. } => "VIDEO",
        }
    }

    pub fn media_refs(&self) -> Vec<String> {
        match self {
            PostKind::Text => Vec::new(),
            PostKind::Image { url } => vec![url.clone()],
            PostKind::Video { url, thumbnail } => {
                let mut refs = vec![url.clone()];
                refs.extend(thumbnail.clone());
                refs
            }
        }
    }
}

/// Moderation lifecycle: PENDING resolves to APPROVED or REJECTED exactly
/// once and never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Server-confirmed counters for a post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counters {
    pub reactions: HashMap<ReactionType, u32>,
    pub comments: u32,
    pub shares: u32,
    pub views: u32,
}

impl Counters {
    pub fn reaction_count(&self, kind: ReactionType) -> u32 {
        self.reactions.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_reactions(&self) -> u32 {
        self.reactions.values().sum()
    }

    pub fn bump_reaction(&mut self, kind: ReactionType) {
        *self.reactions.entry(kind).or_insert(0) += 1;
    }

    /// Floored at zero; a stray decrement never produces a negative count
    pub fn drop_reaction(&mut self, kind: ReactionType) {
        if let Some(count) = self.reactions.get_mut(&kind) {
            *count = count.saturating_sub(1);
        }
    }
}

/// A post in the canonical collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub content: String,
    pub kind: PostKind,
    pub created_at: DateTime<Utc>,
    pub counters: Counters,
    pub user_reaction: Option<ReactionType>,
    pub moderation_status: ModerationStatus,
    pub is_shared: bool,
    pub comments: CommentForest,
}

impl Post {
    /// Build a locally-created post awaiting the moderation gate
    pub fn draft(session: &Session, content: impl Into<String>, kind: PostKind) -> Self {
        Post {
            id: PostId::local(),
            author_id: session.user_id.clone(),
            author_name: session.user_name.clone(),
            author_avatar: session.avatar.clone(),
            content: content.into(),
            kind,
            created_at: Utc::now(),
            counters: Counters::default(),
            user_reaction: None,
            moderation_status: ModerationStatus::Pending,
            is_shared: false,
            comments: CommentForest::default(),
        }
    }

    /// Resolve the moderation gate. Valid exactly once from PENDING.
    pub fn resolve_moderation(&mut self, approved: bool) -> Result<()> {
        if self.moderation_status != ModerationStatus::Pending {
            return Err(EngineError::Internal(format!(
                "moderation status for {} already resolved",
                self.id
            )));
        }
        self.moderation_status = if approved {
            ModerationStatus::Approved
        } else {
            ModerationStatus::Rejected
        };
        Ok(())
    }
}

/// A comment; replies nest through `parent_comment_id` back-references
/// inside the owning post's `CommentForest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub parent_comment_id: Option<CommentId>,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub like_count: u32,
    pub user_liked: bool,
}

impl Comment {
    /// Build a locally-created comment awaiting backend confirmation
    pub fn local(
        session: &Session,
        post_id: PostId,
        parent_comment_id: Option<CommentId>,
        text: impl Into<String>,
    ) -> Self {
        Comment {
            id: CommentId::local(),
            post_id,
            parent_comment_id,
            author_id: session.user_id.clone(),
            author_name: session.user_name.clone(),
            text: text.into(),
            created_at: Utc::now(),
            like_count: 0,
            user_liked: false,
        }
    }
}

/// One page of the feed
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Post>,
    pub next_cursor: Option<u32>,
    pub has_more: bool,
}

/// Draft text plus content kind submitted through the moderation gate
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub content: String,
    pub kind: PostKind,
}

impl PostDraft {
    pub fn text(content: impl Into<String>) -> Self {
        PostDraft {
            content: content.into(),
            kind: PostKind::Text,
        }
    }
}

/// Aggregated statistics for a post
#[derive(Debug, Clone, Serialize)]
pub struct PostStats {
    pub post_id: PostId,
    pub likes: u32,
    pub comments: u32,
    pub shares: u32,
    pub views: u32,
    pub reaction_breakdown: HashMap<ReactionType, u32>,
}

impl PostStats {
    pub fn of(post: &Post) -> Self {
        PostStats {
            post_id: post.id.clone(),
            likes: post.counters.total_reactions(),
            comments: post.counters.comments,
            shares: post.counters.shares,
            views: post.counters.views,
            reaction_breakdown: post.counters.reactions.clone(),
        }
    }
}

/// Client session identity. Credential issuance is out of scope; absence of
/// a token downgrades reads to the fixture dataset.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub user_name: String,
    pub avatar: Option<String>,
    pub access_token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Session {
            user_id: "anonymous".to_string(),
            user_name: "Guest".to_string(),
            avatar: None,
            access_token: None,
        }
    }
}

/// A post merged with its client-side overlay, ready to render
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: Post,
    pub is_saved: bool,
    /// Reaction applied optimistically and still awaiting confirmation
    pub pending_reaction: Option<ReactionType>,
}
