use std::collections::BTreeSet;

use chrono::{DateTime, Local, NaiveDate, Utc};
use derive_more::Deref;
use uuid::Uuid;

use crate::{CreateError, ExerciseID, ReadError, ScheduledSessionID, SessionExercise, StepKey};

#[allow(async_fn_in_trait)]
pub trait HistoryService {
    async fn get_history(&self) -> Result<Vec<SessionHistory>, ReadError>;
    async fn append_history(
        &self,
        history: NewSessionHistory,
    ) -> Result<SessionHistory, CreateError>;

    async fn get_last_history(&self) -> Result<SessionHistory, ReadError> {
        last_history(self.get_history().await?).ok_or(ReadError::NotFound)
    }

    async fn get_history_or_empty(&self) -> Vec<SessionHistory> {
        self.get_history().await.unwrap_or_default()
    }
}

#[allow(async_fn_in_trait)]
pub trait HistoryRepository {
    async fn read_history(&self) -> Result<Vec<SessionHistory>, ReadError>;
    async fn append_history(
        &self,
        history: NewSessionHistory,
    ) -> Result<SessionHistory, CreateError>;
}

/// Record of a completed session. Never modified after it has been appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHistory {
    pub id: SessionHistoryID,
    pub session_id: Option<ScheduledSessionID>,
    pub completed_at: DateTime<Utc>,
    pub performance: Performance,
}

impl SessionHistory {
    #[must_use]
    pub fn local_date(&self) -> NaiveDate {
        self.completed_at.with_timezone(&Local).date_naive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSessionHistory {
    pub session_id: Option<ScheduledSessionID>,
    pub completed_at: DateTime<Utc>,
    pub performance: Performance,
}

impl NewSessionHistory {
    #[must_use]
    pub fn with_id(self, id: SessionHistoryID) -> SessionHistory {
        SessionHistory {
            id,
            session_id: self.session_id,
            completed_at: self.completed_at,
            performance: self.performance,
        }
    }
}

/// What was actually done in a session: the exercises as executed and the completed sets.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Performance {
    pub elapsed_seconds: u64,
    pub exercises: Vec<SessionExercise>,
    pub completed_sets: BTreeSet<StepKey>,
}

impl Performance {
    #[must_use]
    pub fn exercise_ids(&self) -> BTreeSet<ExerciseID> {
        self.exercises.iter().map(|e| e.exercise_id).collect()
    }

    #[must_use]
    pub fn total_sets(&self) -> u32 {
        u32::try_from(self.completed_sets.len()).unwrap_or(u32::MAX)
    }

    /// Sum of the targets of all completed sets.
    #[must_use]
    pub fn total_reps(&self) -> u32 {
        self.completed_sets
            .iter()
            .filter_map(|key| {
                self.exercises
                    .get(key.exercise_idx)
                    .map(|e| e.target(key.set_idx, key.side))
            })
            .sum()
    }
}

#[derive(Deref, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionHistoryID(Uuid);

impl SessionHistoryID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for SessionHistoryID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for SessionHistoryID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

/// Most recently completed entry.
#[must_use]
pub fn last_history(history: Vec<SessionHistory>) -> Option<SessionHistory> {
    history.into_iter().max_by_key(|h| h.completed_at)
}
