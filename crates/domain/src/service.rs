use chrono::{DateTime, Local, NaiveDate};
use log::{debug, error, warn};

use crate::{
    Completion, CompletionError, CompletionService, CreateError, DeleteError, Exercise, ExerciseID,
    ExerciseRepository, ExerciseService, HistoryRepository, HistoryService, NewExercise,
    NewScheduledSession, NewSessionHistory, PendingHistory, Performance, ProfileRepository,
    ProfileService, ReadError, ScheduledSession, ScheduledSessionID, ScheduledSessionRepository,
    ScheduledSessionService, SessionHistory, StatsUpdate, UpdateError, UserProfile, apply_stats,
    last_history, reset_streak, score_session, variety_bonus,
};

pub struct Service<R> {
    repository: R,
}

impl<R> Service<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }
}

macro_rules! log_on_error {
    ($func: expr, $error: ident, $action: literal, $entity: literal) => {{
        let result = $func.await;
        match result {
            Ok(_) => {}
            Err(ref err) => match err {
                $error::Storage(crate::StorageError::NoConnection) => {
                    debug!("failed to {} {}: {err}", $action, $entity);
                }
                _ => {
                    error!("failed to {} {}: {err}", $action, $entity);
                }
            },
        }
        result
    }};
}

impl<R: ExerciseRepository> ExerciseService for Service<R> {
    async fn get_exercises(&self) -> Result<Vec<Exercise>, ReadError> {
        log_on_error!(
            self.repository.read_exercises(),
            ReadError,
            "get",
            "exercises"
        )
    }

    async fn get_exercise(&self, id: ExerciseID) -> Result<Exercise, ReadError> {
        log_on_error!(
            self.repository.read_exercise(id),
            ReadError,
            "get",
            "exercise"
        )?
        .ok_or(ReadError::NotFound)
    }

    async fn create_exercise(&self, exercise: NewExercise) -> Result<Exercise, CreateError> {
        log_on_error!(
            self.repository.create_exercise(exercise),
            CreateError,
            "create",
            "exercise"
        )
    }

    async fn replace_exercise(&self, exercise: Exercise) -> Result<Exercise, UpdateError> {
        log_on_error!(
            self.repository.replace_exercise(exercise),
            UpdateError,
            "replace",
            "exercise"
        )
    }

    async fn delete_exercise(&self, id: ExerciseID) -> Result<ExerciseID, DeleteError> {
        log_on_error!(
            self.repository.delete_exercise(id),
            DeleteError,
            "delete",
            "exercise"
        )
    }
}

impl<R: ScheduledSessionRepository> ScheduledSessionService for Service<R> {
    async fn get_scheduled_sessions(&self) -> Result<Vec<ScheduledSession>, ReadError> {
        log_on_error!(
            self.repository.read_scheduled_sessions(),
            ReadError,
            "get",
            "scheduled sessions"
        )
    }

    async fn create_scheduled_session(
        &self,
        session: NewScheduledSession,
    ) -> Result<ScheduledSession, CreateError> {
        log_on_error!(
            self.repository.create_scheduled_session(session),
            CreateError,
            "create",
            "scheduled session"
        )
    }

    async fn replace_scheduled_session(
        &self,
        session: ScheduledSession,
    ) -> Result<ScheduledSession, UpdateError> {
        log_on_error!(
            self.repository.replace_scheduled_session(session),
            UpdateError,
            "replace",
            "scheduled session"
        )
    }

    async fn delete_scheduled_session(
        &self,
        id: ScheduledSessionID,
    ) -> Result<ScheduledSessionID, DeleteError> {
        log_on_error!(
            self.repository.delete_scheduled_session(id),
            DeleteError,
            "delete",
            "scheduled session"
        )
    }
}

impl<R: HistoryRepository> HistoryService for Service<R> {
    async fn get_history(&self) -> Result<Vec<SessionHistory>, ReadError> {
        log_on_error!(
            self.repository.read_history(),
            ReadError,
            "get",
            "session history"
        )
    }

    async fn append_history(
        &self,
        history: NewSessionHistory,
    ) -> Result<SessionHistory, CreateError> {
        log_on_error!(
            self.repository.append_history(history),
            CreateError,
            "append",
            "session history"
        )
    }
}

impl<R: ProfileRepository> ProfileService for Service<R> {
    async fn get_profile(&self) -> Result<UserProfile, ReadError> {
        log_on_error!(
            self.repository.read_profile(),
            ReadError,
            "get",
            "profile"
        )
    }

    async fn apply_stats(
        &self,
        xp_gained: u32,
        reps_gained: u32,
        today: NaiveDate,
    ) -> Result<StatsUpdate, UpdateError> {
        let profile = self.get_profile().await?;
        let update = apply_stats(&profile, xp_gained, reps_gained, today);
        let profile = log_on_error!(
            self.repository.write_profile(update.profile),
            UpdateError,
            "update",
            "profile"
        )?;
        Ok(StatsUpdate { profile, ..update })
    }

    async fn reset_streak(&self, today: NaiveDate) -> Result<UserProfile, UpdateError> {
        let profile = self.get_profile().await?;
        log_on_error!(
            self.repository.write_profile(reset_streak(&profile, today)),
            UpdateError,
            "reset",
            "streak"
        )
    }
}

impl<R: ProfileRepository + HistoryRepository> Service<R> {
    /// Variety bonus of a performance compared to the last stored session.
    ///
    /// Failing reads yield no bonus rather than preventing the completion.
    async fn variety_bonus_for(&self, performance: &Performance) -> u32 {
        let profile = match self.get_profile().await {
            Ok(profile) => profile,
            Err(err) => {
                warn!("skipping variety bonus: {err}");
                return 0;
            }
        };
        let previous = match self.get_history().await {
            Ok(history) => last_history(history)
                .map(|h| h.performance.exercise_ids())
                .unwrap_or_default(),
            Err(err) => {
                warn!("skipping variety bonus: {err}");
                return 0;
            }
        };
        variety_bonus(
            &performance.exercise_ids(),
            &previous,
            profile.current_streak,
        )
    }
}

impl<R: ProfileRepository + HistoryRepository> CompletionService for Service<R> {
    async fn complete_session(
        &self,
        session_id: Option<ScheduledSessionID>,
        performance: Performance,
        now: DateTime<Local>,
    ) -> Result<Completion, CompletionError> {
        let variety_bonus = self.variety_bonus_for(&performance).await;
        let xp_gained = score_session(performance.total_sets(), variety_bonus);
        let update = ProfileService::apply_stats(
            self,
            xp_gained,
            performance.total_reps(),
            now.date_naive(),
        )
        .await
        .map_err(CompletionError::Stats)?;
        self.store_history(PendingHistory {
            xp_gained,
            variety_bonus,
            update,
            history: NewSessionHistory {
                session_id,
                completed_at: now.to_utc(),
                performance,
            },
        })
        .await
    }

    async fn store_history(&self, pending: PendingHistory) -> Result<Completion, CompletionError> {
        match HistoryService::append_history(self, pending.history.clone()).await {
            Ok(history) => Ok(pending.complete(history)),
            Err(error) => Err(CompletionError::History {
                pending: Box::new(pending),
                error,
            }),
        }
    }
}
