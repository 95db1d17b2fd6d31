pub mod actions;
pub mod moderation;
pub mod reactions;
pub mod reconciler;

pub use actions::ActionRegistry;
pub use moderation::{KeywordScreen, ModerationGateway, Verdict};
pub use reconciler::SyncReconciler;
