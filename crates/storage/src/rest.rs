use std::error::Error;

use log::debug;
use repwise_domain as domain;
use reqwest::{
    Method, Request, Response, StatusCode, Url,
    header::{CONTENT_TYPE, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::model;

#[allow(async_fn_in_trait)]
pub trait SendRequest {
    async fn send_request(&self, request: Request) -> Result<Response, Box<dyn Error>>;
}

#[derive(Default)]
pub struct ReqwestSendRequest {
    client: reqwest::Client,
}

impl SendRequest for ReqwestSendRequest {
    async fn send_request(&self, request: Request) -> Result<Response, Box<dyn Error>> {
        Ok(self.client.execute(request).await?)
    }
}

pub struct REST<S: SendRequest> {
    base_url: Url,
    sender: S,
}

impl REST<ReqwestSendRequest> {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self::with_sender(base_url, ReqwestSendRequest::default())
    }
}

impl<S: SendRequest> REST<S> {
    /// Paths are resolved relative to `base_url`, which is treated as a directory.
    pub fn with_sender(mut base_url: Url, sender: S) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { base_url, sender }
    }

    fn request(&self, method: Method, path: &str) -> Result<Request, FetchError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| FetchError::Request(err.to_string()))?;
        Ok(Request::new(method, url))
    }

    fn request_with_body(
        &self,
        method: Method,
        path: &str,
        body: &impl Serialize,
    ) -> Result<Request, FetchError> {
        let mut request = self.request(method, path)?;
        let body =
            serde_json::to_vec(body).map_err(|err| FetchError::Request(err.to_string()))?;
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *request.body_mut() = Some(body.into());
        Ok(request)
    }

    async fn send(&self, request: Request) -> Result<Response, FetchError> {
        let method = request.method().clone();
        let url = request.url().clone();
        match self.sender.send_request(request).await {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(FetchError::Status(response.status())),
            Err(err) => {
                debug!("{method} {url} failed: {err}");
                Err(FetchError::NoConnection)
            }
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: Request) -> Result<T, FetchError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|err| FetchError::Deserialization(err.to_string()))
    }

    async fn fetch_no_content<T>(&self, request: Request, result: T) -> Result<T, FetchError> {
        self.send(request).await?;
        Ok(result)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("no connection")]
    NoConnection,
    #[error("{0}")]
    Status(StatusCode),
    #[error("invalid request: {0}")]
    Request(String),
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

fn invalid<E: Error + 'static>(err: E) -> Box<dyn Error> {
    Box::new(err)
}

impl From<FetchError> for domain::ReadError {
    fn from(value: FetchError) -> Self {
        match value {
            FetchError::NoConnection => domain::StorageError::NoConnection.into(),
            FetchError::Status(StatusCode::NOT_FOUND) => domain::ReadError::NotFound,
            err => domain::ReadError::Other(Box::new(err)),
        }
    }
}

impl From<FetchError> for domain::CreateError {
    fn from(value: FetchError) -> Self {
        match value {
            FetchError::NoConnection => domain::StorageError::NoConnection.into(),
            FetchError::Status(StatusCode::CONFLICT) => domain::CreateError::Conflict,
            err => domain::CreateError::Other(Box::new(err)),
        }
    }
}

impl From<FetchError> for domain::UpdateError {
    fn from(value: FetchError) -> Self {
        match value {
            FetchError::NoConnection => domain::StorageError::NoConnection.into(),
            FetchError::Status(StatusCode::CONFLICT) => domain::UpdateError::Conflict,
            err => domain::UpdateError::Other(Box::new(err)),
        }
    }
}

impl From<FetchError> for domain::DeleteError {
    fn from(value: FetchError) -> Self {
        match value {
            FetchError::NoConnection => domain::StorageError::NoConnection.into(),
            err => domain::DeleteError::Other(Box::new(err)),
        }
    }
}

impl<S: SendRequest> domain::ExerciseRepository for REST<S> {
    async fn read_exercises(&self) -> Result<Vec<domain::Exercise>, domain::ReadError> {
        let exercises: Vec<model::Exercise> =
            self.fetch(self.request(Method::GET, "api/exercises")?).await?;
        Ok(exercises
            .into_iter()
            .map(domain::Exercise::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?)
    }

    async fn read_exercise(
        &self,
        id: domain::ExerciseID,
    ) -> Result<Option<domain::Exercise>, domain::ReadError> {
        let request = self.request(Method::GET, &format!("api/exercises/{}", *id))?;
        match self.fetch::<model::Exercise>(request).await {
            Ok(exercise) => Ok(Some(
                domain::Exercise::try_from(exercise).map_err(invalid)?,
            )),
            Err(FetchError::Status(StatusCode::NOT_FOUND)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn create_exercise(
        &self,
        exercise: domain::NewExercise,
    ) -> Result<domain::Exercise, domain::CreateError> {
        let request = self.request_with_body(
            Method::POST,
            "api/exercises",
            &model::NewExercise::from(&exercise),
        )?;
        let exercise: model::Exercise = self.fetch(request).await?;
        Ok(domain::Exercise::try_from(exercise).map_err(invalid)?)
    }

    async fn replace_exercise(
        &self,
        exercise: domain::Exercise,
    ) -> Result<domain::Exercise, domain::UpdateError> {
        let request = self.request_with_body(
            Method::PUT,
            &format!("api/exercises/{}", *exercise.id),
            &model::Exercise::from(&exercise),
        )?;
        let exercise: model::Exercise = self.fetch(request).await?;
        Ok(domain::Exercise::try_from(exercise).map_err(invalid)?)
    }

    async fn delete_exercise(
        &self,
        id: domain::ExerciseID,
    ) -> Result<domain::ExerciseID, domain::DeleteError> {
        let request = self.request(Method::DELETE, &format!("api/exercises/{}", *id))?;
        Ok(self.fetch_no_content(request, id).await?)
    }
}

impl<S: SendRequest> domain::ScheduledSessionRepository for REST<S> {
    async fn read_scheduled_sessions(
        &self,
    ) -> Result<Vec<domain::ScheduledSession>, domain::ReadError> {
        let sessions: Vec<model::ScheduledSession> =
            self.fetch(self.request(Method::GET, "api/sessions")?).await?;
        Ok(sessions
            .into_iter()
            .map(domain::ScheduledSession::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?)
    }

    async fn create_scheduled_session(
        &self,
        session: domain::NewScheduledSession,
    ) -> Result<domain::ScheduledSession, domain::CreateError> {
        let request = self.request_with_body(
            Method::POST,
            "api/sessions",
            &model::NewScheduledSession::from(&session),
        )?;
        let session: model::ScheduledSession = self.fetch(request).await?;
        Ok(domain::ScheduledSession::try_from(session).map_err(invalid)?)
    }

    async fn replace_scheduled_session(
        &self,
        session: domain::ScheduledSession,
    ) -> Result<domain::ScheduledSession, domain::UpdateError> {
        let request = self.request_with_body(
            Method::PUT,
            &format!("api/sessions/{}", *session.id),
            &model::ScheduledSession::from(&session),
        )?;
        let session: model::ScheduledSession = self.fetch(request).await?;
        Ok(domain::ScheduledSession::try_from(session).map_err(invalid)?)
    }

    async fn delete_scheduled_session(
        &self,
        id: domain::ScheduledSessionID,
    ) -> Result<domain::ScheduledSessionID, domain::DeleteError> {
        let request = self.request(Method::DELETE, &format!("api/sessions/{}", *id))?;
        Ok(self.fetch_no_content(request, id).await?)
    }
}

impl<S: SendRequest> domain::HistoryRepository for REST<S> {
    async fn read_history(&self) -> Result<Vec<domain::SessionHistory>, domain::ReadError> {
        let history: Vec<model::SessionHistory> =
            self.fetch(self.request(Method::GET, "api/history")?).await?;
        Ok(history
            .into_iter()
            .map(domain::SessionHistory::from)
            .collect())
    }

    async fn append_history(
        &self,
        history: domain::NewSessionHistory,
    ) -> Result<domain::SessionHistory, domain::CreateError> {
        let request = self.request_with_body(
            Method::POST,
            "api/history",
            &model::NewSessionHistory::from(&history),
        )?;
        let history: model::SessionHistory = self.fetch(request).await?;
        Ok(history.into())
    }
}

impl<S: SendRequest> domain::ProfileRepository for REST<S> {
    async fn read_profile(&self) -> Result<domain::UserProfile, domain::ReadError> {
        match self
            .fetch::<model::UserProfile>(self.request(Method::GET, "api/profile")?)
            .await
        {
            Ok(profile) => Ok(profile.into()),
            Err(FetchError::Status(StatusCode::NOT_FOUND)) => Ok(domain::UserProfile::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_profile(
        &self,
        profile: domain::UserProfile,
    ) -> Result<domain::UserProfile, domain::UpdateError> {
        let request = self.request_with_body(
            Method::PUT,
            "api/profile",
            &model::UserProfile::from(&profile),
        )?;
        let profile: model::UserProfile = self.fetch(request).await?;
        Ok(profile.into())
    }
}
