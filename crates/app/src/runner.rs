use chrono::{DateTime, Local};
use log::{info, warn};
use repwise_domain::{
    Completion, CompletionError, CompletionService, LiveSession, PendingHistory, ScheduledSession,
    SessionExercise,
};

use crate::{Settings, clock::SessionClock};

/// A live session together with its clock.
///
/// Nothing is persisted before [`Runner::finish`].
#[derive(Debug)]
pub struct Runner {
    session: LiveSession,
    clock: SessionClock,
    pending: Option<PendingHistory>,
}

/// A session that could not be recorded. The runner is handed back, so the session can be
/// finished again or cancelled.
#[derive(thiserror::Error, Debug)]
#[error("failed to record session: {error}")]
pub struct FinishError {
    pub runner: Box<Runner>,
    #[source]
    pub error: CompletionError,
}

impl Runner {
    #[must_use]
    pub fn new(session: LiveSession) -> Self {
        Self {
            session,
            clock: SessionClock::new(),
            pending: None,
        }
    }

    #[must_use]
    pub fn from_scheduled(session: &ScheduledSession, settings: &Settings) -> Self {
        Self::new(LiveSession::from_scheduled(session, settings.linked_sides))
    }

    /// A session that is not part of the schedule.
    #[must_use]
    pub fn quick_start(exercises: Vec<SessionExercise>, settings: &Settings) -> Self {
        Self::new(LiveSession::new(None, exercises, settings.linked_sides))
    }

    #[must_use]
    pub fn session(&self) -> &LiveSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut LiveSession {
        &mut self.session
    }

    #[must_use]
    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    /// Whether the rewards of this session are already stored and only its history entry is
    /// missing.
    #[must_use]
    pub fn has_pending_history(&self) -> bool {
        self.pending.is_some()
    }

    pub fn start(&mut self) {
        self.clock.start();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn resume(&mut self) {
        self.clock.resume();
    }

    /// Discards the session.
    pub fn cancel(mut self) {
        let elapsed = self.clock.stop();
        if self.pending.is_some() {
            warn!("discarding history entry of a session whose rewards are stored");
        }
        info!(
            "cancelled session after {}s with {} completed sets",
            elapsed.as_secs(),
            self.session.total_sets()
        );
    }

    /// Stops the clock and records the performance through `service`.
    ///
    /// If only the history entry failed to be stored, finishing the returned runner again stores
    /// just that entry.
    pub async fn finish<S: CompletionService>(
        mut self,
        service: &S,
        now: DateTime<Local>,
    ) -> Result<Completion, FinishError> {
        let elapsed = self.clock.stop();
        let result = match self.pending.take() {
            Some(pending) => service.store_history(pending).await,
            None => {
                service
                    .complete_session(
                        self.session.session_id(),
                        self.session.performance(elapsed.as_secs()),
                        now,
                    )
                    .await
            }
        };
        match result {
            Ok(completion) => {
                info!(
                    "finished session with {} XP ({} variety bonus)",
                    completion.xp_gained, completion.variety_bonus
                );
                Ok(completion)
            }
            Err(error) => {
                warn!("failed to record session: {error}");
                self.pending = error.pending().cloned();
                Err(FinishError {
                    runner: Box::new(self),
                    error,
                })
            }
        }
    }
}
