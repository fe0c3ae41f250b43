//! Serialized representation of the domain entities.
//!
//! The same structures are used for the JSON columns of the SQLite backend and for the bodies of
//! the REST API.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use log::warn;
use repwise_domain as domain;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub id: Uuid,
    #[serde(flatten)]
    pub content: NewExercise,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewExercise {
    pub name: String,
    pub category: String,
    pub difficulty: String,
    pub equipment: String,
    pub unit: String,
    pub default_target: u32,
    pub unilateral: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub muscles: Vec<TargetedMuscle>,
}

impl From<&domain::Exercise> for Exercise {
    fn from(value: &domain::Exercise) -> Self {
        Self {
            id: *value.id,
            content: NewExercise {
                name: value.name.to_string(),
                category: value.category.as_str().to_string(),
                difficulty: value.difficulty.as_str().to_string(),
                equipment: value.equipment.as_str().to_string(),
                unit: value.unit.as_str().to_string(),
                default_target: value.default_target,
                unilateral: value.unilateral,
                description: value.description.clone(),
                muscles: value.muscles.iter().map(TargetedMuscle::from).collect(),
            },
        }
    }
}

impl From<&domain::NewExercise> for NewExercise {
    fn from(value: &domain::NewExercise) -> Self {
        Exercise::from(&value.clone().with_id(domain::ExerciseID::nil())).content
    }
}

impl TryFrom<Exercise> for domain::Exercise {
    type Error = ExerciseError;

    fn try_from(value: Exercise) -> Result<Self, Self::Error> {
        Ok(domain::NewExercise::try_from(value.content)?.with_id(value.id.into()))
    }
}

impl TryFrom<NewExercise> for domain::NewExercise {
    type Error = ExerciseError;

    fn try_from(value: NewExercise) -> Result<Self, Self::Error> {
        Ok(Self {
            name: domain::Name::new(&value.name)?,
            category: domain::Category::try_from(value.category.as_str())?,
            difficulty: domain::Difficulty::try_from(value.difficulty.as_str())?,
            equipment: domain::Equipment::try_from(value.equipment.as_str())?,
            unit: domain::Unit::try_from(value.unit.as_str())?,
            default_target: value.default_target,
            unilateral: value.unilateral,
            description: value.description,
            muscles: value
                .muscles
                .into_iter()
                .map(domain::TargetedMuscle::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ExerciseError {
    #[error(transparent)]
    InvalidName(#[from] domain::NameError),
    #[error(transparent)]
    InvalidProperty(#[from] domain::PropertyError),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TargetedMuscle {
    pub muscle_id: String,
    pub impact: String,
    pub effect: String,
}

impl From<&domain::TargetedMuscle> for TargetedMuscle {
    fn from(value: &domain::TargetedMuscle) -> Self {
        Self {
            muscle_id: value.muscle_id.as_str().to_string(),
            impact: value.impact.as_str().to_string(),
            effect: value.effect.as_str().to_string(),
        }
    }
}

impl TryFrom<TargetedMuscle> for domain::TargetedMuscle {
    type Error = domain::PropertyError;

    fn try_from(value: TargetedMuscle) -> Result<Self, Self::Error> {
        Ok(Self {
            muscle_id: domain::MuscleID::try_from(value.muscle_id.as_str())?,
            impact: domain::Impact::try_from(value.impact.as_str())?,
            effect: domain::Effect::try_from(value.effect.as_str())?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionExercise {
    pub exercise_id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unilateral: bool,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub sets: u32,
    pub reps: Reps,
}

fn default_unit() -> String {
    domain::Unit::Reps.as_str().to_string()
}

/// A single target for all sets or one target per set (per side for unilateral exercises).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Reps {
    Uniform(u32),
    PerSet(Vec<u32>),
}

impl From<&domain::SessionExercise> for SessionExercise {
    fn from(value: &domain::SessionExercise) -> Self {
        Self {
            exercise_id: *value.exercise_id,
            name: value.name.clone(),
            unilateral: value.unilateral,
            unit: value.unit.as_str().to_string(),
            sets: value.sets,
            reps: match &value.reps {
                domain::Reps::Uniform(reps) => Reps::Uniform(*reps),
                domain::Reps::PerSet(reps) => Reps::PerSet(reps.clone()),
            },
        }
    }
}

impl TryFrom<SessionExercise> for domain::SessionExercise {
    type Error = SessionExerciseError;

    fn try_from(value: SessionExercise) -> Result<Self, Self::Error> {
        Ok(domain::SessionExercise::new(
            value.exercise_id.into(),
            value.name,
            value.unilateral,
            domain::Unit::try_from(value.unit.as_str())?,
            value.sets,
            match value.reps {
                Reps::Uniform(reps) => domain::Reps::Uniform(reps),
                Reps::PerSet(reps) => domain::Reps::PerSet(reps),
            },
        )?)
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SessionExerciseError {
    #[error(transparent)]
    InvalidUnit(#[from] domain::PropertyError),
    #[error(transparent)]
    InvalidSets(#[from] domain::SetError),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScheduledSession {
    pub id: Uuid,
    #[serde(flatten)]
    pub content: NewScheduledSession,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewScheduledSession {
    pub title: String,
    pub date: String,
    pub frequency: String,
    #[serde(default)]
    pub color: Option<String>,
    pub exercises: serde_json::Value,
}

impl From<&domain::ScheduledSession> for ScheduledSession {
    fn from(value: &domain::ScheduledSession) -> Self {
        Self {
            id: *value.id,
            content: NewScheduledSession {
                title: value.title.to_string(),
                date: value.date.format("%Y-%m-%d").to_string(),
                frequency: value.frequency.as_str().to_string(),
                color: Some(value.color.to_string()),
                exercises: session_exercises_to_value(&value.exercises),
            },
        }
    }
}

impl From<&domain::NewScheduledSession> for NewScheduledSession {
    fn from(value: &domain::NewScheduledSession) -> Self {
        ScheduledSession::from(&value.clone().with_id(domain::ScheduledSessionID::nil())).content
    }
}

impl TryFrom<ScheduledSession> for domain::ScheduledSession {
    type Error = ScheduledSessionError;

    fn try_from(value: ScheduledSession) -> Result<Self, Self::Error> {
        Ok(domain::NewScheduledSession::try_from(value.content)?.with_id(value.id.into()))
    }
}

impl TryFrom<NewScheduledSession> for domain::NewScheduledSession {
    type Error = ScheduledSessionError;

    fn try_from(value: NewScheduledSession) -> Result<Self, Self::Error> {
        Ok(Self {
            title: domain::Name::new(&value.title)?,
            date: parse_anchor_date(&value.date)?,
            frequency: domain::Frequency::from(value.frequency.as_str()),
            color: match value.color {
                Some(color) => domain::Color::new(&color)?,
                None => domain::Color::default(),
            },
            exercises: session_exercises_from_value(value.exercises),
        })
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ScheduledSessionError {
    #[error(transparent)]
    InvalidTitle(#[from] domain::NameError),
    #[error("Invalid date \"{0}\"")]
    InvalidDate(String),
    #[error(transparent)]
    InvalidColor(#[from] domain::ColorError),
}

/// Parses an anchor date given either as a plain date or as a date and time.
///
/// The time of day is discarded. A time with an offset is converted to the local zone first.
pub fn parse_anchor_date(value: &str) -> Result<NaiveDate, ScheduledSessionError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| {
            DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Local).date_naive())
        })
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date())
        })
        .map_err(|_| ScheduledSessionError::InvalidDate(value.to_string()))
}

#[must_use]
pub fn session_exercises_to_value(exercises: &[domain::SessionExercise]) -> serde_json::Value {
    serde_json::Value::Array(
        exercises
            .iter()
            .map(|e| serde_json::json!(SessionExercise::from(e)))
            .collect(),
    )
}

/// Malformed exercise lists are read as empty.
#[must_use]
pub fn session_exercises_from_value(value: serde_json::Value) -> Vec<domain::SessionExercise> {
    let exercises = serde_json::from_value::<Vec<SessionExercise>>(value)
        .map_err(|err| err.to_string())
        .and_then(|exercises| {
            exercises
                .into_iter()
                .map(domain::SessionExercise::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| err.to_string())
        });
    match exercises {
        Ok(exercises) => exercises,
        Err(err) => {
            warn!("ignoring malformed session exercises: {err}");
            vec![]
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionHistory {
    pub id: Uuid,
    #[serde(flatten)]
    pub content: NewSessionHistory,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewSessionHistory {
    pub session_id: Option<Uuid>,
    pub completed_at: DateTime<Utc>,
    pub performance: serde_json::Value,
}

impl From<&domain::SessionHistory> for SessionHistory {
    fn from(value: &domain::SessionHistory) -> Self {
        Self {
            id: *value.id,
            content: NewSessionHistory {
                session_id: value.session_id.map(|id| *id),
                completed_at: value.completed_at,
                performance: performance_to_value(&value.performance),
            },
        }
    }
}

impl From<&domain::NewSessionHistory> for NewSessionHistory {
    fn from(value: &domain::NewSessionHistory) -> Self {
        SessionHistory::from(&value.clone().with_id(domain::SessionHistoryID::nil())).content
    }
}

impl From<SessionHistory> for domain::SessionHistory {
    fn from(value: SessionHistory) -> Self {
        domain::NewSessionHistory::from(value.content).with_id(value.id.into())
    }
}

impl From<NewSessionHistory> for domain::NewSessionHistory {
    fn from(value: NewSessionHistory) -> Self {
        Self {
            session_id: value.session_id.map(domain::ScheduledSessionID::from),
            completed_at: value.completed_at,
            performance: performance_from_value(value.performance),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Performance {
    #[serde(default)]
    pub elapsed_seconds: u64,
    #[serde(default)]
    pub exercises: Vec<SessionExercise>,
    #[serde(default)]
    pub completed_sets: Vec<String>,
}

#[must_use]
pub fn performance_to_value(performance: &domain::Performance) -> serde_json::Value {
    serde_json::json!(Performance {
        elapsed_seconds: performance.elapsed_seconds,
        exercises: performance
            .exercises
            .iter()
            .map(SessionExercise::from)
            .collect(),
        completed_sets: performance
            .completed_sets
            .iter()
            .map(ToString::to_string)
            .collect(),
    })
}

/// Malformed performances are read as empty.
#[must_use]
pub fn performance_from_value(value: serde_json::Value) -> domain::Performance {
    let performance = serde_json::from_value::<Performance>(value)
        .map_err(|err| err.to_string())
        .and_then(|performance| {
            Ok(domain::Performance {
                elapsed_seconds: performance.elapsed_seconds,
                exercises: performance
                    .exercises
                    .into_iter()
                    .map(domain::SessionExercise::try_from)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|err| err.to_string())?,
                completed_sets: performance
                    .completed_sets
                    .iter()
                    .map(|key| domain::StepKey::try_from(key.as_str()))
                    .collect::<Result<_, _>>()
                    .map_err(|err| err.to_string())?,
            })
        });
    match performance {
        Ok(performance) => performance,
        Err(err) => {
            warn!("ignoring malformed performance: {err}");
            domain::Performance::default()
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub level: u32,
    pub xp: u32,
    pub total_xp: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub streak_start: Option<NaiveDate>,
    pub last_activity: Option<NaiveDate>,
    pub total_reps: u32,
}

impl From<&domain::UserProfile> for UserProfile {
    fn from(value: &domain::UserProfile) -> Self {
        Self {
            level: value.level,
            xp: value.xp,
            total_xp: value.total_xp,
            current_streak: value.current_streak,
            best_streak: value.best_streak,
            streak_start: value.streak_start,
            last_activity: value.last_activity,
            total_reps: value.total_reps,
        }
    }
}

impl From<UserProfile> for domain::UserProfile {
    fn from(value: UserProfile) -> Self {
        Self {
            level: value.level.max(1),
            xp: value.xp,
            total_xp: value.total_xp,
            current_streak: value.current_streak,
            best_streak: value.best_streak,
            streak_start: value.streak_start,
            last_activity: value.last_activity,
            total_reps: value.total_reps,
        }
    }
}
