#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

use log::info;
use repwise_domain::{
    self as domain, ExerciseRepository, HistoryRepository, ProfileRepository,
    ScheduledSessionRepository,
};
use reqwest::Url;

#[allow(clippy::module_name_repetitions)]
pub mod local_storage;
pub mod model;
pub mod rest;
pub mod sqlite;

use rest::{REST, ReqwestSendRequest};
use sqlite::Sqlite;

pub const ENV_API_URL: &str = "REPWISE_API_URL";
pub const ENV_DATABASE_URL: &str = "REPWISE_DATABASE_URL";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://repwise.db";

/// Selection of the storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Config {
    Sqlite { url: String },
    Rest { base_url: Url },
}

impl Config {
    /// A remote API configured by `REPWISE_API_URL` takes precedence over the database given by
    /// `REPWISE_DATABASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| var(key).filter(|value: &String| !value.trim().is_empty());
        if let Some(url) = non_empty(ENV_API_URL) {
            return Url::parse(url.trim())
                .map(|base_url| Config::Rest { base_url })
                .map_err(|err| ConfigError::InvalidApiUrl {
                    url,
                    reason: err.to_string(),
                });
        }
        Ok(Config::Sqlite {
            url: non_empty(ENV_DATABASE_URL).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::Sqlite {
            url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API URL \"{url}\": {reason}")]
    InvalidApiUrl { url: String, reason: String },
}

/// One of the interchangeable storage backends.
pub enum Backend {
    Sqlite(Sqlite),
    Rest(REST<ReqwestSendRequest>),
}

impl Backend {
    pub async fn open(config: &Config) -> Result<Self, sqlx::Error> {
        match config {
            Config::Sqlite { url } => Ok(Backend::Sqlite(Sqlite::open(url).await?)),
            Config::Rest { base_url } => {
                info!("using remote storage at {base_url}");
                Ok(Backend::Rest(REST::new(base_url.clone())))
            }
        }
    }

    pub async fn close(&self) {
        if let Backend::Sqlite(db) = self {
            db.close().await;
        }
    }
}

macro_rules! delegate {
    ($self: ident, $method: ident($($arg: expr),*)) => {
        match $self {
            Backend::Sqlite(db) => db.$method($($arg),*).await,
            Backend::Rest(rest) => rest.$method($($arg),*).await,
        }
    };
}

impl domain::ExerciseRepository for Backend {
    async fn read_exercises(&self) -> Result<Vec<domain::Exercise>, domain::ReadError> {
        delegate!(self, read_exercises())
    }

    async fn read_exercise(
        &self,
        id: domain::ExerciseID,
    ) -> Result<Option<domain::Exercise>, domain::ReadError> {
        delegate!(self, read_exercise(id))
    }

    async fn create_exercise(
        &self,
        exercise: domain::NewExercise,
    ) -> Result<domain::Exercise, domain::CreateError> {
        delegate!(self, create_exercise(exercise))
    }

    async fn replace_exercise(
        &self,
        exercise: domain::Exercise,
    ) -> Result<domain::Exercise, domain::UpdateError> {
        delegate!(self, replace_exercise(exercise))
    }

    async fn delete_exercise(
        &self,
        id: domain::ExerciseID,
    ) -> Result<domain::ExerciseID, domain::DeleteError> {
        delegate!(self, delete_exercise(id))
    }
}

impl domain::ScheduledSessionRepository for Backend {
    async fn read_scheduled_sessions(
        &self,
    ) -> Result<Vec<domain::ScheduledSession>, domain::ReadError> {
        delegate!(self, read_scheduled_sessions())
    }

    async fn create_scheduled_session(
        &self,
        session: domain::NewScheduledSession,
    ) -> Result<domain::ScheduledSession, domain::CreateError> {
        delegate!(self, create_scheduled_session(session))
    }

    async fn replace_scheduled_session(
        &self,
        session: domain::ScheduledSession,
    ) -> Result<domain::ScheduledSession, domain::UpdateError> {
        delegate!(self, replace_scheduled_session(session))
    }

    async fn delete_scheduled_session(
        &self,
        id: domain::ScheduledSessionID,
    ) -> Result<domain::ScheduledSessionID, domain::DeleteError> {
        delegate!(self, delete_scheduled_session(id))
    }
}

impl domain::HistoryRepository for Backend {
    async fn read_history(&self) -> Result<Vec<domain::SessionHistory>, domain::ReadError> {
        delegate!(self, read_history())
    }

    async fn append_history(
        &self,
        history: domain::NewSessionHistory,
    ) -> Result<domain::SessionHistory, domain::CreateError> {
        delegate!(self, append_history(history))
    }
}

impl domain::ProfileRepository for Backend {
    async fn read_profile(&self) -> Result<domain::UserProfile, domain::ReadError> {
        delegate!(self, read_profile())
    }

    async fn write_profile(
        &self,
        profile: domain::UserProfile,
    ) -> Result<domain::UserProfile, domain::UpdateError> {
        delegate!(self, write_profile(profile))
    }
}
