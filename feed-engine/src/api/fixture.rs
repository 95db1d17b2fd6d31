/// Fixture repository
///
/// A static substitute backend serving the identical contract as the REST
/// client, used when the network is unreachable or no bearer credential
/// exists. The feed stays interactive: mutations are applied to the
/// in-memory dataset with the same semantics the real backend reports.
use crate::api::types::{
    CommentDto, CommentsEnvelope, CreatePostRequest, FeedEnvelope, PostDto, ReactionOutcome,
};
use crate::api::FeedBackend;
use crate::error::{EngineError, Result};
use crate::models::{FeedKind, PostId, ReactionType, Session};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

struct FixtureState {
    posts: Vec<PostDto>,
    comments: HashMap<String, Vec<CommentDto>>,
}

pub struct FixtureRepository {
    session: Session,
    state: Mutex<FixtureState>,
}

impl FixtureRepository {
    /// Empty dataset, useful for tests
    pub fn empty(session: Session) -> Self {
        FixtureRepository {
            session,
            state: Mutex::new(FixtureState {
                posts: Vec::new(),
                comments: HashMap::new(),
            }),
        }
    }

    /// The degraded-but-functional demo feed
    pub fn seeded(session: Session) -> Self {
        let repo = Self::empty(session);
        {
            let mut state = repo.state.lock();
            state.posts = seed_posts();
            state.comments = seed_comments();
        }
        repo
    }

    fn reaction_total(post: &PostDto) -> u32 {
        let mapped: u32 = post.reaction_counts.values().sum();
        if mapped > 0 {
            mapped
        } else {
            post.like_count
        }
    }
}

fn paginate<T: Clone>(items: &[T], page: u32, size: u32) -> (Vec<T>, u32, u64) {
    let size = size.max(1) as usize;
    let total = items.len();
    let total_pages = total.div_ceil(size) as u32;
    let start = (page as usize) * size;
    let slice = if start >= total {
        Vec::new()
    } else {
        items[start..(start + size).min(total)].to_vec()
    };
    (slice, total_pages, total as u64)
}

fn attach_reply(comments: &mut [CommentDto], parent_id: &str, reply: CommentDto) -> bool {
    for comment in comments.iter_mut() {
        if comment.id == parent_id {
            comment.replies.push(reply);
            return true;
        }
        if attach_reply(&mut comment.replies, parent_id, reply.clone()) {
            return true;
        }
    }
    false
}

#[async_trait]
impl FeedBackend for FixtureRepository {
    async fn fetch_page(&self, kind: FeedKind, page: u32, size: u32) -> Result<FeedEnvelope> {
        let state = self.state.lock();
        let filtered: Vec<PostDto> = match kind {
            FeedKind::Personalized => state.posts.clone(),
            FeedKind::Trending => {
                let mut sorted = state.posts.clone();
                sorted.sort_by(|a, b| Self::reaction_total(b).cmp(&Self::reaction_total(a)));
                sorted
            }
            FeedKind::Saved => state.posts.iter().filter(|p| p.is_saved).cloned().collect(),
            FeedKind::Activity => state
                .posts
                .iter()
                .filter(|p| p.user_reaction_type.is_some())
                .cloned()
                .collect(),
        };
        let (items, total_pages, total_elements) = paginate(&filtered, page, size);
        Ok(FeedEnvelope {
            items,
            total_pages,
            total_elements,
        })
    }

    async fn react(&self, post_id: &PostId, reaction: ReactionType) -> Result<ReactionOutcome> {
        let mut state = self.state.lock();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == post_id.0)
            .ok_or_else(|| EngineError::NotFound(format!("post {}", post_id)))?;

        match post.user_reaction_type {
            Some(current) if current == reaction => {
                if let Some(count) = post.reaction_counts.get_mut(&reaction) {
                    *count = count.saturating_sub(1);
                }
                post.user_reaction_type = None;
                Ok(ReactionOutcome::Removed)
            }
            Some(current) => {
                if let Some(count) = post.reaction_counts.get_mut(&current) {
                    *count = count.saturating_sub(1);
                }
                *post.reaction_counts.entry(reaction).or_insert(0) += 1;
                post.user_reaction_type = Some(reaction);
                Ok(ReactionOutcome::Updated)
            }
            None => {
                *post.reaction_counts.entry(reaction).or_insert(0) += 1;
                post.user_reaction_type = Some(reaction);
                Ok(ReactionOutcome::Added)
            }
        }
    }

    async fn fetch_comments(
        &self,
        post_id: &PostId,
        page: u32,
        size: u32,
    ) -> Result<CommentsEnvelope> {
        let state = self.state.lock();
        let comments = state
            .comments
            .get(&post_id.0)
            .cloned()
            .unwrap_or_default();
        let (data, total_pages, total_elements) = paginate(&comments, page, size);
        Ok(CommentsEnvelope {
            data,
            total_pages,
            total_elements,
        })
    }

    async fn create_comment(
        &self,
        post_id: &PostId,
        content: &str,
        parent_comment_id: Option<&str>,
    ) -> Result<CommentDto> {
        let mut state = self.state.lock();
        let post_exists = state.posts.iter().any(|p| p.id == post_id.0);
        if !post_exists {
            return Err(EngineError::NotFound(format!("post {}", post_id)));
        }

        let comment = CommentDto {
            id: format!("comment-{}", Uuid::new_v4()),
            parent_comment_id: parent_comment_id.map(str::to_string),
            user_id: self.session.user_id.clone(),
            user_name: self.session.user_name.clone(),
            content: content.to_string(),
            like_count: 0,
            created_at: Utc::now(),
            replies: Vec::new(),
        };

        let bucket = state.comments.entry(post_id.0.clone()).or_default();
        match parent_comment_id {
            Some(parent) => {
                if !attach_reply(bucket, parent, comment.clone()) {
                    return Err(EngineError::NotFound(format!("comment {}", parent)));
                }
            }
            None => bucket.push(comment.clone()),
        }

        if let Some(post) = state.posts.iter_mut().find(|p| p.id == post_id.0) {
            post.comment_count += 1;
        }
        Ok(comment)
    }

    async fn save_post(&self, post_id: &PostId, saved: bool) -> Result<()> {
        let mut state = self.state.lock();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == post_id.0)
            .ok_or_else(|| EngineError::NotFound(format!("post {}", post_id)))?;
        post.is_saved = saved;
        Ok(())
    }

    async fn hide_post(&self, _post_id: &PostId) -> Result<()> {
        // Hidden state is session-scoped on the client; nothing to persist
        Ok(())
    }

    async fn share_post(&self, post_id: &PostId) -> Result<()> {
        let mut state = self.state.lock();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == post_id.0)
            .ok_or_else(|| EngineError::NotFound(format!("post {}", post_id)))?;
        post.share_count += 1;
        Ok(())
    }

    async fn report_post(&self, _post_id: &PostId, _report_type: &str, _reason: &str) -> Result<()> {
        Ok(())
    }

    async fn create_post(&self, req: &CreatePostRequest) -> Result<PostDto> {
        let mut state = self.state.lock();
        let post = PostDto {
            id: format!("post-{}", Uuid::new_v4()),
            author_id: self.session.user_id.clone(),
            author_name: self.session.user_name.clone(),
            author_avatar: None,
            content: req.content.clone(),
            post_type: req.post_type.clone(),
            image_url: (req.post_type == "IMAGE")
                .then(|| req.media_refs.first().cloned())
                .flatten(),
            video_url: (req.post_type == "VIDEO")
                .then(|| req.media_refs.first().cloned())
                .flatten(),
            video_thumbnail: None,
            reaction_counts: HashMap::new(),
            like_count: 0,
            comment_count: 0,
            share_count: 0,
            view_count: 1,
            created_at: Utc::now(),
            user_reaction_type: None,
            is_saved: false,
            is_shared: false,
        };
        state.posts.insert(0, post.clone());
        Ok(post)
    }

    async fn delete_post(&self, post_id: &PostId) -> Result<()> {
        let mut state = self.state.lock();
        let before = state.posts.len();
        state.posts.retain(|p| p.id != post_id.0);
        if state.posts.len() == before {
            return Err(EngineError::NotFound(format!("post {}", post_id)));
        }
        state.comments.remove(&post_id.0);
        Ok(())
    }
}

fn reactions(pairs: &[(ReactionType, u32)]) -> HashMap<ReactionType, u32> {
    pairs.iter().copied().collect()
}

fn seed_posts() -> Vec<PostDto> {
    let now = Utc::now();
    vec![
        PostDto {
            id: "1".into(),
            author_id: "user-2".into(),
            author_name: "Nguyen Anh".into(),
            author_avatar: Some("https://i.pravatar.cc/150?img=1".into()),
            content: "Just finished my CSS Grid project! Really happy with how it turned out. \
                      Thanks everyone for the help!"
                .into(),
            post_type: "TEXT".into(),
            image_url: None,
            video_url: None,
            video_thumbnail: None,
            reaction_counts: reactions(&[(ReactionType::Like, 20), (ReactionType::Love, 4)]),
            like_count: 24,
            comment_count: 2,
            share_count: 2,
            view_count: 145,
            created_at: now - Duration::hours(2),
            user_reaction_type: None,
            is_saved: false,
            is_shared: false,
        },
        PostDto {
            id: "2".into(),
            author_id: "user-3".into(),
            author_name: "Le Thao".into(),
            author_avatar: Some("https://i.pravatar.cc/150?img=2".into()),
            content: "Can anyone explain how JavaScript async/await works? I'm stuck on \
                      chained promises."
                .into(),
            post_type: "TEXT".into(),
            image_url: None,
            video_url: None,
            video_thumbnail: None,
            reaction_counts: reactions(&[(ReactionType::Like, 12)]),
            like_count: 12,
            comment_count: 8,
            share_count: 0,
            view_count: 89,
            created_at: now - Duration::hours(4),
            user_reaction_type: None,
            is_saved: false,
            is_shared: false,
        },
        PostDto {
            id: "3".into(),
            author_id: "user-4".into(),
            author_name: "Tran Nhung".into(),
            author_avatar: Some("https://i.pravatar.cc/150?img=3".into()),
            content: "We just kicked off a new React study group! Excited to build together. \
                      #ReactJS #WebDevelopment"
                .into(),
            post_type: "IMAGE".into(),
            image_url: Some("https://images.unsplash.com/photo-1633356122544?w=500".into()),
            video_url: None,
            video_thumbnail: None,
            reaction_counts: reactions(&[
                (ReactionType::Like, 40),
                (ReactionType::Love, 13),
                (ReactionType::Wow, 5),
            ]),
            like_count: 58,
            comment_count: 12,
            share_count: 5,
            view_count: 234,
            created_at: now - Duration::hours(6),
            user_reaction_type: None,
            is_saved: true,
            is_shared: false,
        },
        PostDto {
            id: "4".into(),
            author_id: "user-5".into(),
            author_name: "Pham Linh".into(),
            author_avatar: Some("https://i.pravatar.cc/150?img=4".into()),
            content: "Tutorial: building a todo list with React Hooks. The first step into \
                      React!"
                .into(),
            post_type: "VIDEO".into(),
            image_url: None,
            video_url: Some("https://videos.test/todo-hooks.mp4".into()),
            video_thumbnail: Some("https://images.test/todo-hooks-thumb.jpg".into()),
            reaction_counts: reactions(&[
                (ReactionType::Like, 70),
                (ReactionType::Love, 12),
                (ReactionType::Haha, 7),
            ]),
            like_count: 89,
            comment_count: 23,
            share_count: 15,
            view_count: 456,
            created_at: now - Duration::hours(8),
            user_reaction_type: Some(ReactionType::Like),
            is_saved: false,
            is_shared: false,
        },
        PostDto {
            id: "5".into(),
            author_id: "user-6".into(),
            author_name: "Do Minh".into(),
            author_avatar: Some("https://i.pravatar.cc/150?img=5".into()),
            content: "My study plan for this month:\n1. HTML5\n2. CSS3\n3. JavaScript\n\
                      4. React\n5. Build a portfolio"
                .into(),
            post_type: "TEXT".into(),
            image_url: None,
            video_url: None,
            video_thumbnail: None,
            reaction_counts: reactions(&[(ReactionType::Like, 30), (ReactionType::Wow, 12)]),
            like_count: 42,
            comment_count: 7,
            share_count: 8,
            view_count: 178,
            created_at: now - Duration::hours(10),
            user_reaction_type: None,
            is_saved: false,
            is_shared: false,
        },
    ]
}

fn seed_comments() -> HashMap<String, Vec<CommentDto>> {
    let now = Utc::now();
    let mut comments = HashMap::new();
    comments.insert(
        "1".to_string(),
        vec![
            CommentDto {
                id: "comment-101".into(),
                parent_comment_id: None,
                user_id: "user-3".into(),
                user_name: "Le Thao".into(),
                content: "This looks great!".into(),
                like_count: 3,
                created_at: now - Duration::minutes(60),
                replies: Vec::new(),
            },
            CommentDto {
                id: "comment-102".into(),
                parent_comment_id: None,
                user_id: "user-4".into(),
                user_name: "Tran Nhung".into(),
                content: "Which tool did you use? I want to learn CSS Grid too.".into(),
                like_count: 1,
                created_at: now - Duration::minutes(45),
                replies: vec![CommentDto {
                    id: "comment-103".into(),
                    parent_comment_id: Some("comment-102".into()),
                    user_id: "user-2".into(),
                    user_name: "Nguyen Anh".into(),
                    content: "VS Code with the Live Server extension. Super handy!".into(),
                    like_count: 2,
                    created_at: now - Duration::minutes(30),
                    replies: Vec::new(),
                }],
            },
        ],
    );
    comments
}
