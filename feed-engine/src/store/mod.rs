pub mod comments;
pub mod feed;
pub mod overlay;

pub use comments::{CommentForest, ThreadEntry};
pub use feed::{FeedFilter, FeedStore};
pub use overlay::Overlay;
