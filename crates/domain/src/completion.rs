use chrono::{DateTime, Local};

use crate::{
    CreateError, NewSessionHistory, Performance, ScheduledSessionID, SessionHistory, StatsUpdate,
    UpdateError,
};

#[allow(async_fn_in_trait)]
pub trait CompletionService {
    /// Scores a finished session, applies the rewards to the profile and appends the session to
    /// the history.
    async fn complete_session(
        &self,
        session_id: Option<ScheduledSessionID>,
        performance: Performance,
        now: DateTime<Local>,
    ) -> Result<Completion, CompletionError>;

    /// Appends the history entry of a completion whose rewards have already been stored.
    ///
    /// Retrying a failed completion with the [`PendingHistory`] of its error does not grant the
    /// rewards a second time.
    async fn store_history(&self, pending: PendingHistory) -> Result<Completion, CompletionError>;
}

/// Rewards granted for a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub xp_gained: u32,
    pub variety_bonus: u32,
    pub update: StatsUpdate,
    pub history: SessionHistory,
}

impl Completion {
    #[must_use]
    pub fn leveled_up(&self, previous_level: u32) -> bool {
        self.update.profile.level > previous_level
    }
}

/// A completion whose rewards are stored in the profile but whose history entry is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHistory {
    pub xp_gained: u32,
    pub variety_bonus: u32,
    pub update: StatsUpdate,
    pub history: NewSessionHistory,
}

impl PendingHistory {
    #[must_use]
    pub fn complete(self, history: SessionHistory) -> Completion {
        Completion {
            xp_gained: self.xp_gained,
            variety_bonus: self.variety_bonus,
            update: self.update,
            history,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CompletionError {
    /// Nothing has been stored.
    #[error("failed to update profile: {0}")]
    Stats(UpdateError),
    /// The rewards are stored. Only the history entry has to be retried.
    #[error("failed to store session history: {error}")]
    History {
        pending: Box<PendingHistory>,
        error: CreateError,
    },
}

impl CompletionError {
    #[must_use]
    pub fn pending(&self) -> Option<&PendingHistory> {
        match self {
            CompletionError::Stats(_) => None,
            CompletionError::History { pending, .. } => Some(pending.as_ref()),
        }
    }
}
