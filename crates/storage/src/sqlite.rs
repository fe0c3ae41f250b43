//! On-device storage in a SQLite database.
//!
//! Nested structures (muscles, session exercises, performances) are kept as JSON text columns in
//! the format of [`crate::model`].

use std::{error::Error, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, warn};
use repwise_domain as domain;
use sqlx::{
    Row, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
};
use strum::AsRefStr;
use uuid::Uuid;

use crate::model;

#[derive(Clone)]
pub struct Sqlite {
    pool: SqlitePool,
}

#[derive(AsRefStr, Debug, Clone, Copy)]
pub enum Table {
    #[strum(serialize = "exercises")]
    Exercises,
    #[strum(serialize = "scheduled_sessions")]
    ScheduledSessions,
    #[strum(serialize = "session_history")]
    SessionHistory,
    #[strum(serialize = "user_profile")]
    UserProfile,
}

const DATE_FORMAT: &str = "%Y-%m-%d";

impl Sqlite {
    /// Opens the database at `url` and creates missing tables.
    pub async fn open(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // A single connection keeps in-memory databases alive and serializes all writes.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.migrate().await?;
        debug!("opened database {url}");
        Ok(db)
    }

    /// Closes all connections. Subsequent operations fail with a connection error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS exercises (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                category TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                equipment TEXT NOT NULL,
                unit TEXT NOT NULL,
                default_target INTEGER NOT NULL,
                unilateral INTEGER NOT NULL,
                description TEXT NOT NULL,
                muscles TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS scheduled_sessions (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                date TEXT NOT NULL,
                frequency TEXT NOT NULL,
                color TEXT NOT NULL,
                exercises TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS session_history (
                id TEXT PRIMARY KEY,
                session_id TEXT,
                completed_at TEXT NOT NULL,
                performance TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                level INTEGER NOT NULL,
                xp INTEGER NOT NULL,
                total_xp INTEGER NOT NULL,
                current_streak INTEGER NOT NULL,
                best_streak INTEGER NOT NULL,
                streak_start TEXT,
                last_activity TEXT,
                total_reps INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), domain::DeleteError> {
        sqlx::query(&format!("DELETE FROM {} WHERE id = ?1", table.as_ref()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}

fn storage_error(err: sqlx::Error) -> domain::StorageError {
    match err {
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            domain::StorageError::NoConnection
        }
        err => domain::StorageError::Other(Box::new(err)),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn json_value(text: &str) -> serde_json::Value {
    serde_json::from_str(text).unwrap_or(serde_json::Value::Null)
}

fn uuid_column(row: &SqliteRow, column: &str) -> Result<Uuid, Box<dyn Error>> {
    Ok(Uuid::parse_str(&row.try_get::<String, _>(column)?)?)
}

fn date_column(row: &SqliteRow, column: &str) -> Result<Option<NaiveDate>, Box<dyn Error>> {
    Ok(row
        .try_get::<Option<String>, _>(column)?
        .and_then(|date| match NaiveDate::parse_from_str(&date, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(err) => {
                warn!("ignoring invalid date \"{date}\" in column {column}: {err}");
                None
            }
        }))
}

fn exercise_from_row(row: &SqliteRow) -> Result<domain::Exercise, Box<dyn Error>> {
    let muscles = row.try_get::<String, _>("muscles")?;
    let muscles = serde_json::from_str::<Vec<model::TargetedMuscle>>(&muscles)
        .unwrap_or_else(|err| {
            warn!("ignoring malformed muscles: {err}");
            vec![]
        });
    Ok(domain::Exercise::try_from(model::Exercise {
        id: uuid_column(row, "id")?,
        content: model::NewExercise {
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            difficulty: row.try_get("difficulty")?,
            equipment: row.try_get("equipment")?,
            unit: row.try_get("unit")?,
            default_target: row.try_get("default_target")?,
            unilateral: row.try_get("unilateral")?,
            description: row.try_get("description")?,
            muscles,
        },
    })?)
}

fn scheduled_session_from_row(row: &SqliteRow) -> Result<domain::ScheduledSession, Box<dyn Error>> {
    Ok(domain::ScheduledSession::try_from(model::ScheduledSession {
        id: uuid_column(row, "id")?,
        content: model::NewScheduledSession {
            title: row.try_get("title")?,
            date: row.try_get("date")?,
            frequency: row.try_get("frequency")?,
            color: row.try_get("color")?,
            exercises: json_value(&row.try_get::<String, _>("exercises")?),
        },
    })?)
}

fn history_from_row(row: &SqliteRow) -> Result<domain::SessionHistory, Box<dyn Error>> {
    let session_id = row
        .try_get::<Option<String>, _>("session_id")?
        .map(|id| Uuid::parse_str(&id))
        .transpose()?;
    let completed_at = DateTime::parse_from_rfc3339(&row.try_get::<String, _>("completed_at")?)?
        .with_timezone(&Utc);
    Ok(domain::SessionHistory::from(model::SessionHistory {
        id: uuid_column(row, "id")?,
        content: model::NewSessionHistory {
            session_id,
            completed_at,
            performance: json_value(&row.try_get::<String, _>("performance")?),
        },
    }))
}

fn profile_from_row(row: &SqliteRow) -> Result<domain::UserProfile, Box<dyn Error>> {
    Ok(domain::UserProfile::from(model::UserProfile {
        level: row.try_get("level")?,
        xp: row.try_get("xp")?,
        total_xp: row.try_get("total_xp")?,
        current_streak: row.try_get("current_streak")?,
        best_streak: row.try_get("best_streak")?,
        streak_start: date_column(row, "streak_start")?,
        last_activity: date_column(row, "last_activity")?,
        total_reps: row.try_get("total_reps")?,
    }))
}

impl domain::ExerciseRepository for Sqlite {
    async fn read_exercises(&self) -> Result<Vec<domain::Exercise>, domain::ReadError> {
        let rows = sqlx::query("SELECT * FROM exercises ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(rows
            .iter()
            .map(exercise_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn read_exercise(
        &self,
        id: domain::ExerciseID,
    ) -> Result<Option<domain::Exercise>, domain::ReadError> {
        let row = sqlx::query("SELECT * FROM exercises WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(row.as_ref().map(exercise_from_row).transpose()?)
    }

    async fn create_exercise(
        &self,
        exercise: domain::NewExercise,
    ) -> Result<domain::Exercise, domain::CreateError> {
        let exercise = exercise.with_id(Uuid::new_v4().into());
        let model = model::Exercise::from(&exercise);
        let muscles = serde_json::to_string(&model.content.muscles)
            .map_err(|err| domain::CreateError::Other(Box::new(err)))?;
        sqlx::query(
            r"
            INSERT INTO exercises (
                id, name, category, difficulty, equipment, unit, default_target, unilateral,
                description, muscles
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(model.id.to_string())
        .bind(&model.content.name)
        .bind(&model.content.category)
        .bind(&model.content.difficulty)
        .bind(&model.content.equipment)
        .bind(&model.content.unit)
        .bind(model.content.default_target)
        .bind(model.content.unilateral)
        .bind(&model.content.description)
        .bind(muscles)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                domain::CreateError::Conflict
            } else {
                domain::CreateError::Storage(storage_error(err))
            }
        })?;
        Ok(exercise)
    }

    async fn replace_exercise(
        &self,
        exercise: domain::Exercise,
    ) -> Result<domain::Exercise, domain::UpdateError> {
        let model = model::Exercise::from(&exercise);
        let muscles = serde_json::to_string(&model.content.muscles)
            .map_err(|err| domain::UpdateError::Other(Box::new(err)))?;
        let result = sqlx::query(
            r"
            UPDATE exercises
            SET name = ?2, category = ?3, difficulty = ?4, equipment = ?5, unit = ?6,
                default_target = ?7, unilateral = ?8, description = ?9, muscles = ?10
            WHERE id = ?1
            ",
        )
        .bind(model.id.to_string())
        .bind(&model.content.name)
        .bind(&model.content.category)
        .bind(&model.content.difficulty)
        .bind(&model.content.equipment)
        .bind(&model.content.unit)
        .bind(model.content.default_target)
        .bind(model.content.unilateral)
        .bind(&model.content.description)
        .bind(muscles)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                domain::UpdateError::Conflict
            } else {
                domain::UpdateError::Storage(storage_error(err))
            }
        })?;
        if result.rows_affected() == 0 {
            return Err(domain::UpdateError::Other("exercise not found".into()));
        }
        Ok(exercise)
    }

    async fn delete_exercise(
        &self,
        id: domain::ExerciseID,
    ) -> Result<domain::ExerciseID, domain::DeleteError> {
        self.delete(Table::Exercises, *id).await?;
        Ok(id)
    }
}

impl domain::ScheduledSessionRepository for Sqlite {
    async fn read_scheduled_sessions(
        &self,
    ) -> Result<Vec<domain::ScheduledSession>, domain::ReadError> {
        let rows = sqlx::query("SELECT * FROM scheduled_sessions ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(rows
            .iter()
            .map(scheduled_session_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn create_scheduled_session(
        &self,
        session: domain::NewScheduledSession,
    ) -> Result<domain::ScheduledSession, domain::CreateError> {
        let session = session.with_id(Uuid::new_v4().into());
        let model = model::ScheduledSession::from(&session);
        sqlx::query(
            r"
            INSERT INTO scheduled_sessions (id, title, date, frequency, color, exercises)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(model.id.to_string())
        .bind(&model.content.title)
        .bind(&model.content.date)
        .bind(&model.content.frequency)
        .bind(&model.content.color)
        .bind(model.content.exercises.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(session)
    }

    async fn replace_scheduled_session(
        &self,
        session: domain::ScheduledSession,
    ) -> Result<domain::ScheduledSession, domain::UpdateError> {
        let model = model::ScheduledSession::from(&session);
        let result = sqlx::query(
            r"
            UPDATE scheduled_sessions
            SET title = ?2, date = ?3, frequency = ?4, color = ?5, exercises = ?6
            WHERE id = ?1
            ",
        )
        .bind(model.id.to_string())
        .bind(&model.content.title)
        .bind(&model.content.date)
        .bind(&model.content.frequency)
        .bind(&model.content.color)
        .bind(model.content.exercises.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        if result.rows_affected() == 0 {
            return Err(domain::UpdateError::Other(
                "scheduled session not found".into(),
            ));
        }
        Ok(session)
    }

    async fn delete_scheduled_session(
        &self,
        id: domain::ScheduledSessionID,
    ) -> Result<domain::ScheduledSessionID, domain::DeleteError> {
        self.delete(Table::ScheduledSessions, *id).await?;
        Ok(id)
    }
}

impl domain::HistoryRepository for Sqlite {
    async fn read_history(&self) -> Result<Vec<domain::SessionHistory>, domain::ReadError> {
        let rows = sqlx::query("SELECT * FROM session_history ORDER BY completed_at, rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(rows
            .iter()
            .map(history_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn append_history(
        &self,
        history: domain::NewSessionHistory,
    ) -> Result<domain::SessionHistory, domain::CreateError> {
        let history = history.with_id(Uuid::new_v4().into());
        let model = model::SessionHistory::from(&history);
        sqlx::query(
            r"
            INSERT INTO session_history (id, session_id, completed_at, performance)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(model.id.to_string())
        .bind(model.content.session_id.map(|id| id.to_string()))
        .bind(model.content.completed_at.to_rfc3339())
        .bind(model.content.performance.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(history)
    }
}

impl domain::ProfileRepository for Sqlite {
    async fn read_profile(&self) -> Result<domain::UserProfile, domain::ReadError> {
        let row = sqlx::query("SELECT * FROM user_profile WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        match row {
            Some(row) => Ok(profile_from_row(&row)?),
            None => Ok(domain::UserProfile::default()),
        }
    }

    async fn write_profile(
        &self,
        profile: domain::UserProfile,
    ) -> Result<domain::UserProfile, domain::UpdateError> {
        sqlx::query(
            r"
            INSERT INTO user_profile (
                id, level, xp, total_xp, current_streak, best_streak, streak_start,
                last_activity, total_reps
            )
            VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                level = ?1,
                xp = ?2,
                total_xp = ?3,
                current_streak = ?4,
                best_streak = ?5,
                streak_start = ?6,
                last_activity = ?7,
                total_reps = ?8
            ",
        )
        .bind(profile.level)
        .bind(profile.xp)
        .bind(profile.total_xp)
        .bind(profile.current_streak)
        .bind(profile.best_streak)
        .bind(profile.streak_start.map(|d| d.format(DATE_FORMAT).to_string()))
        .bind(profile.last_activity.map(|d| d.format(DATE_FORMAT).to_string()))
        .bind(profile.total_reps)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(profile)
    }
}
