/// Wire DTOs for the social REST API
///
/// camelCase envelopes as served by the backend. Conversions into domain
/// types happen here so every consumption site sees tagged `PostKind`
/// variants instead of ad-hoc optional media fields.
use crate::models::{
    Comment, CommentId, Counters, ModerationStatus, Post, PostDraft, PostId, PostKind,
    ReactionType,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================
// Feed
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEnvelope {
    pub items: Vec<PostDto>,
    pub total_pages: u32,
    pub total_elements: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    #[serde(default)]
    pub author_avatar: Option<String>,
    pub content: String,
    #[serde(default = "default_post_type")]
    pub post_type: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub video_thumbnail: Option<String>,
    #[serde(default)]
    pub reaction_counts: HashMap<ReactionType, u32>,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub share_count: u32,
    #[serde(default)]
    pub view_count: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user_reaction_type: Option<ReactionType>,
    #[serde(default)]
    pub is_saved: bool,
    #[serde(default)]
    pub is_shared: bool,
}

fn default_post_type() -> String {
    "TEXT".to_string()
}

impl PostDto {
    /// Server snapshot into domain post. Media fields collapse into the
    /// tagged `PostKind`; a feed only ever returns approved posts.
    pub fn into_post(self) -> Post {
        let kind = match self.post_type.as_str() {
            "IMAGE" => match self.image_url {
                Some(url) => PostKind::Image { url },
                None => PostKind::Text,
            },
            "VIDEO" => match self.video_url {
                Some(url) => PostKind::Video {
                    url,
                    thumbnail: self.video_thumbnail,
                },
                None => PostKind::Text,
            },
            _ => PostKind::Text,
        };

        let mut reactions = self.reaction_counts;
        if reactions.is_empty() && self.like_count > 0 {
            reactions.insert(ReactionType::Like, self.like_count);
        }

        Post {
            id: PostId(self.id),
            author_id: self.author_id,
            author_name: self.author_name,
            author_avatar: self.author_avatar,
            content: self.content,
            kind,
            created_at: self.created_at,
            counters: Counters {
                reactions,
                comments: self.comment_count,
                shares: self.share_count,
                views: self.view_count,
            },
            user_reaction: self.user_reaction_type,
            moderation_status: ModerationStatus::Approved,
            is_shared: self.is_shared,
            comments: Default::default(),
        }
    }
}

// ============================================
// Comments
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsEnvelope {
    pub data: Vec<CommentDto>,
    pub total_pages: u32,
    pub total_elements: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: String,
    #[serde(default)]
    pub parent_comment_id: Option<String>,
    pub user_id: String,
    pub user_name: String,
    pub content: String,
    #[serde(default)]
    pub like_count: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub replies: Vec<CommentDto>,
}

impl CommentDto {
    /// Convert one node; nested replies are returned for the caller to
    /// insert in order under the converted comment's id.
    pub fn into_comment(self, post_id: &PostId) -> (Comment, Vec<CommentDto>) {
        let comment = Comment {
            id: CommentId(self.id),
            post_id: post_id.clone(),
            parent_comment_id: self.parent_comment_id.map(CommentId),
            author_id: self.user_id,
            author_name: self.user_name,
            text: self.content,
            created_at: self.created_at,
            like_count: self.like_count,
            user_liked: false,
        };
        (comment, self.replies)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<String>,
}

// ============================================
// Mutations
// ============================================

/// Backend-reported outcome of a reaction toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionOutcome {
    Added,
    Removed,
    Updated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactEnvelope {
    #[serde(default = "default_true")]
    pub success: bool,
    pub action: ReactionOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactRequest {
    pub reaction_type: ReactionType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub content: String,
    pub post_type: String,
    pub media_refs: Vec<String>,
}

impl CreatePostRequest {
    pub fn from_draft(draft: &PostDraft) -> Self {
        CreatePostRequest {
            content: draft.content.clone(),
            post_type: draft.kind.type_name().to_string(),
            media_refs: draft.kind.media_refs(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub report_type: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModerateRequest {
    pub text: String,
}

/// Success/failure envelope shared by the simple mutation endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckEnvelope {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_dto_collapses_media_into_kind() {
        let json = serde_json::json!({
            "id": "7",
            "authorId": "user-2",
            "authorName": "Binh",
            "content": "walkthrough video",
            "postType": "VIDEO",
            "videoUrl": "https://cdn.test/v.mp4",
            "videoThumbnail": "https://cdn.test/t.png",
            "likeCount": 3,
            "createdAt": "2026-01-10T08:30:00Z"
        });
        let dto: PostDto = serde_json::from_value(json).unwrap();
        let post = dto.into_post();

        match &post.kind {
            PostKind::Video { url, thumbnail } => {
                assert_eq!(url, "https://cdn.test/v.mp4");
                assert_eq!(thumbnail.as_deref(), Some("https://cdn.test/t.png"));
            }
            other => panic!("expected video kind, got {:?}", other),
        }
        // Scalar likeCount backfills the reaction map when it is absent
        assert_eq!(post.counters.reaction_count(ReactionType::Like), 3);
    }

    #[test]
    fn react_envelope_parses_all_actions() {
        for (raw, expected) in [
            ("added", ReactionOutcome::Added),
            ("removed", ReactionOutcome::Removed),
            ("updated", ReactionOutcome::Updated),
        ] {
            let env: ReactEnvelope =
                serde_json::from_str(&format!(r#"{{"success":true,"action":"{}"}}"#, raw))
                    .unwrap();
            assert_eq!(env.action, expected);
        }
    }

    #[test]
    fn comment_request_omits_parent_for_roots() {
        let req = CommentRequest {
            content: "nice".into(),
            parent_comment_id: None,
        };
        let raw = serde_json::to_string(&req).unwrap();
        assert!(!raw.contains("parentCommentId"));
    }
}
