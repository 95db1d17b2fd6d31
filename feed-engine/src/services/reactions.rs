/// Reaction state machine
///
/// Each user holds at most one reaction per post. Choosing the held
/// reaction removes it, choosing a different one switches atomically, and
/// choosing with none held adds. The transition is computed once from the
/// pre-mutation state and then applied to counters and the per-user slot
/// together, so a switch can never be observed as a bare add or remove.
use crate::api::types::ReactionOutcome;
use crate::models::{Post, ReactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionStep {
    Added(ReactionType),
    Removed(ReactionType),
    Switched {
        from: ReactionType,
        to: ReactionType,
    },
}

/// Derive the step from what the user currently holds
pub fn transition(current: Option<ReactionType>, chosen: ReactionType) -> ReactionStep {
    match current {
        None => ReactionStep::Added(chosen),
        Some(held) if held == chosen => ReactionStep::Removed(held),
        Some(held) => ReactionStep::Switched {
            from: held,
            to: chosen,
        },
    }
}

/// Apply a step to a post: per-type counter and the user's slot move in
/// the same call. Counters never go below zero.
pub fn apply(post: &mut Post, step: ReactionStep) {
    match step {
        ReactionStep::Added(r) => {
            post.counters.bump_reaction(r);
            post.user_reaction = Some(r);
        }
        ReactionStep::Removed(r) => {
            post.counters.drop_reaction(r);
            post.user_reaction = None;
        }
        ReactionStep::Switched { from, to } => {
            post.counters.drop_reaction(from);
            post.counters.bump_reaction(to);
            post.user_reaction = Some(to);
        }
    }
}

/// The backend acknowledgement the optimistic step expects
pub fn expected_outcome(step: ReactionStep) -> ReactionOutcome {
    match step {
        ReactionStep::Added(_) => ReactionOutcome::Added,
        ReactionStep::Removed(_) => ReactionOutcome::Removed,
        ReactionStep::Switched { .. } => ReactionOutcome::Updated,
    }
}

/// When the backend acknowledges something other than the optimistic step,
/// the confirmed value wins. Given the pre-mutation state and the outcome
/// the backend actually reported, this is the corrective step to apply on
/// top of the restored snapshot (None when the snapshot already agrees).
pub fn confirmed_step(
    previous: Option<ReactionType>,
    chosen: ReactionType,
    outcome: ReactionOutcome,
) -> Option<ReactionStep> {
    match outcome {
        ReactionOutcome::Added => match previous {
            None => Some(ReactionStep::Added(chosen)),
            Some(held) if held == chosen => None,
            Some(held) => Some(ReactionStep::Switched {
                from: held,
                to: chosen,
            }),
        },
        ReactionOutcome::Removed => previous.map(ReactionStep::Removed),
        ReactionOutcome::Updated => match previous {
            None => Some(ReactionStep::Added(chosen)),
            Some(held) if held == chosen => None,
            Some(held) => Some(ReactionStep::Switched {
                from: held,
                to: chosen,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Session;

    fn fresh_post() -> Post {
        Post::draft(&Session::anonymous(), "hello", crate::models::PostKind::Text)
    }

    #[test]
    fn add_then_remove_round_trips() {
        let mut post = fresh_post();

        let step = transition(post.user_reaction, ReactionType::Like);
        assert_eq!(step, ReactionStep::Added(ReactionType::Like));
        apply(&mut post, step);
        assert_eq!(post.user_reaction, Some(ReactionType::Like));
        assert_eq!(post.counters.reaction_count(ReactionType::Like), 1);

        let step = transition(post.user_reaction, ReactionType::Like);
        assert_eq!(step, ReactionStep::Removed(ReactionType::Like));
        apply(&mut post, step);
        assert_eq!(post.user_reaction, None);
        assert_eq!(post.counters.reaction_count(ReactionType::Like), 0);
    }

    #[test]
    fn switch_moves_exactly_one_count() {
        let mut post = fresh_post();
        apply(&mut post, ReactionStep::Added(ReactionType::Like));

        let step = transition(post.user_reaction, ReactionType::Love);
        assert_eq!(
            step,
            ReactionStep::Switched {
                from: ReactionType::Like,
                to: ReactionType::Love
            }
        );
        apply(&mut post, step);

        assert_eq!(post.counters.reaction_count(ReactionType::Like), 0);
        assert_eq!(post.counters.reaction_count(ReactionType::Love), 1);
        assert_eq!(post.counters.total_reactions(), 1);
        assert_eq!(post.user_reaction, Some(ReactionType::Love));
    }

    #[test]
    fn expected_outcomes_match_steps() {
        assert_eq!(
            expected_outcome(ReactionStep::Added(ReactionType::Wow)),
            ReactionOutcome::Added
        );
        assert_eq!(
            expected_outcome(ReactionStep::Removed(ReactionType::Wow)),
            ReactionOutcome::Removed
        );
        assert_eq!(
            expected_outcome(ReactionStep::Switched {
                from: ReactionType::Sad,
                to: ReactionType::Haha
            }),
            ReactionOutcome::Updated
        );
    }

    #[test]
    fn confirmed_outcome_overrides_the_optimistic_step() {
        // Client expected an add, backend says the reaction was removed:
        // the restored snapshot (Like held) needs a remove on top.
        assert_eq!(
            confirmed_step(
                Some(ReactionType::Like),
                ReactionType::Like,
                ReactionOutcome::Removed
            ),
            Some(ReactionStep::Removed(ReactionType::Like))
        );
        // Backend says added while the snapshot held nothing
        assert_eq!(
            confirmed_step(None, ReactionType::Love, ReactionOutcome::Added),
            Some(ReactionStep::Added(ReactionType::Love))
        );
        // Snapshot already agrees with the confirmation
        assert_eq!(
            confirmed_step(
                Some(ReactionType::Wow),
                ReactionType::Wow,
                ReactionOutcome::Added
            ),
            None
        );
        // Updated against an empty snapshot degrades to a plain add
        assert_eq!(
            confirmed_step(None, ReactionType::Haha, ReactionOutcome::Updated),
            Some(ReactionStep::Added(ReactionType::Haha))
        );
    }
}
