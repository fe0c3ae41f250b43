use std::fmt;

use chrono::{DateTime, Datelike, Local, NaiveDate};
use derive_more::{AsRef, Deref, Display};
use uuid::Uuid;

use crate::{
    CreateError, DeleteError, ExerciseID, Name, ReadError, SessionExercise, UpdateError,
    ValidationError,
};

#[allow(async_fn_in_trait)]
pub trait ScheduledSessionService {
    async fn get_scheduled_sessions(&self) -> Result<Vec<ScheduledSession>, ReadError>;
    async fn create_scheduled_session(
        &self,
        session: NewScheduledSession,
    ) -> Result<ScheduledSession, CreateError>;
    async fn replace_scheduled_session(
        &self,
        session: ScheduledSession,
    ) -> Result<ScheduledSession, UpdateError>;
    async fn delete_scheduled_session(
        &self,
        id: ScheduledSessionID,
    ) -> Result<ScheduledSessionID, DeleteError>;

    async fn get_sessions_on(&self, date: NaiveDate) -> Result<Vec<ScheduledSession>, ReadError> {
        Ok(sessions_on(&self.get_scheduled_sessions().await?, date))
    }

    fn validate_scheduled_session_title(&self, title: &str) -> Result<Name, ValidationError> {
        Name::new(title).map_err(|err| ValidationError::Other(err.into()))
    }

    fn validate_scheduled_session_exercises(
        &self,
        exercises: Vec<SessionExercise>,
    ) -> Result<Vec<SessionExercise>, ValidationError> {
        if exercises.is_empty() {
            return Err(ValidationError::Other(
                "A session needs at least one exercise".into(),
            ));
        }
        Ok(exercises)
    }

    fn validate_scheduled_session_color(&self, color: &str) -> Result<Color, ValidationError> {
        Color::new(color).map_err(|err| ValidationError::Other(err.into()))
    }
}

#[allow(async_fn_in_trait)]
pub trait ScheduledSessionRepository {
    async fn read_scheduled_sessions(&self) -> Result<Vec<ScheduledSession>, ReadError>;
    async fn create_scheduled_session(
        &self,
        session: NewScheduledSession,
    ) -> Result<ScheduledSession, CreateError>;
    async fn replace_scheduled_session(
        &self,
        session: ScheduledSession,
    ) -> Result<ScheduledSession, UpdateError>;
    async fn delete_scheduled_session(
        &self,
        id: ScheduledSessionID,
    ) -> Result<ScheduledSessionID, DeleteError>;
}

/// A planned workout that recurs on the calendar from its anchor date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledSession {
    pub id: ScheduledSessionID,
    pub title: Name,
    pub date: NaiveDate,
    pub frequency: Frequency,
    pub color: Color,
    pub exercises: Vec<SessionExercise>,
}

impl ScheduledSession {
    #[must_use]
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.frequency.is_active(self.date, date)
    }

    /// Recurrence ignores the time of day, only the local calendar date counts.
    #[must_use]
    pub fn is_active_at(&self, time: DateTime<Local>) -> bool {
        self.is_active_on(time.date_naive())
    }

    #[must_use]
    pub fn exercise_ids(&self) -> Vec<ExerciseID> {
        self.exercises.iter().map(|e| e.exercise_id).collect()
    }

    #[must_use]
    pub fn num_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.sets).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScheduledSession {
    pub title: Name,
    pub date: NaiveDate,
    pub frequency: Frequency,
    pub color: Color,
    pub exercises: Vec<SessionExercise>,
}

impl NewScheduledSession {
    #[must_use]
    pub fn with_id(self, id: ScheduledSessionID) -> ScheduledSession {
        ScheduledSession {
            id,
            title: self.title,
            date: self.date,
            frequency: self.frequency,
            color: self.color,
            exercises: self.exercises,
        }
    }
}

#[derive(Deref, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScheduledSessionID(Uuid);

impl ScheduledSessionID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for ScheduledSessionID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for ScheduledSessionID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Frequency {
    Once,
    Daily,
    Weekly,
    Every2Days,
    /// A literal this version does not know. Never active.
    Unknown(String),
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Once,
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Every2Days,
    ];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Frequency::Once => "ONCE",
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Every2Days => "EVERY_2_DAYS",
            Frequency::Unknown(value) => value,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Frequency::Once => "Once",
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Every2Days => "Every 2 days",
            Frequency::Unknown(value) => value,
        }
    }

    #[must_use]
    pub fn is_active(&self, anchor: NaiveDate, date: NaiveDate) -> bool {
        if date < anchor {
            return false;
        }
        match self {
            Frequency::Once => date == anchor,
            Frequency::Daily => true,
            Frequency::Weekly => date.weekday() == anchor.weekday(),
            Frequency::Every2Days => (date - anchor).num_days() % 2 == 0,
            Frequency::Unknown(_) => false,
        }
    }
}

impl From<&str> for Frequency {
    fn from(value: &str) -> Self {
        match value {
            "ONCE" => Frequency::Once,
            "DAILY" => Frequency::Daily,
            "WEEKLY" => Frequency::Weekly,
            // "EVERY 2 DAYS" was written by older versions
            "EVERY_2_DAYS" | "EVERY 2 DAYS" => Frequency::Every2Days,
            other => Frequency::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display color of a session in `#RRGGBB` notation.
#[derive(AsRef, Debug, Display, Clone, PartialEq, Eq, Hash)]
pub struct Color(String);

impl Color {
    pub fn new(value: &str) -> Result<Self, ColorError> {
        let value = value.trim();
        match value.strip_prefix('#') {
            Some(hex) if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
                Ok(Self(value.to_ascii_uppercase()))
            }
            _ => Err(ColorError::Invalid(value.to_string())),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self("#4F46E5".to_string())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("Invalid color \"{0}\" (expected #RRGGBB)")]
    Invalid(String),
}

/// Planned sessions that take place on `date`, in their original order.
#[must_use]
pub fn sessions_on(sessions: &[ScheduledSession], date: NaiveDate) -> Vec<ScheduledSession> {
    sessions
        .iter()
        .filter(|s| s.is_active_on(date))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveTime, TimeZone};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::{Reps, Unit};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn session(id: u128, anchor: NaiveDate, frequency: Frequency) -> ScheduledSession {
        ScheduledSession {
            id: id.into(),
            title: Name::new("Full Body").unwrap(),
            date: anchor,
            frequency,
            color: Color::default(),
            exercises: vec![
                SessionExercise::new(
                    1.into(),
                    "Squat".to_string(),
                    false,
                    Unit::Reps,
                    3,
                    Reps::Uniform(10),
                )
                .unwrap(),
            ],
        }
    }

    #[test]
    fn test_once_is_active_on_anchor_only() {
        let anchor = date(2024, 3, 10);
        let once = session(1, anchor, Frequency::Once);
        for offset in 1..=60 {
            assert!(!once.is_active_on(anchor + Days::new(offset)));
            assert!(!once.is_active_on(anchor - Days::new(offset)));
        }
        assert!(once.is_active_on(anchor));
    }

    #[rstest]
    #[case(NaiveTime::from_hms_opt(0, 0, 0).unwrap())]
    #[case(NaiveTime::from_hms_opt(12, 30, 0).unwrap())]
    #[case(NaiveTime::from_hms_opt(23, 59, 59).unwrap())]
    fn test_is_active_at_ignores_time_of_day(#[case] time: NaiveTime) {
        let anchor = date(2024, 3, 10);
        let once = session(1, anchor, Frequency::Once);
        let at = |d: NaiveDate| Local.from_local_datetime(&d.and_time(time)).earliest().unwrap();
        assert!(once.is_active_at(at(anchor)));
        assert!(!once.is_active_at(at(anchor + Days::new(1))));
    }

    #[test]
    fn test_every_2_days_alternates() {
        let anchor = date(2024, 2, 27);
        let every_2_days = session(1, anchor, Frequency::Every2Days);
        for k in 0..50 {
            assert!(every_2_days.is_active_on(anchor + Days::new(2 * k)));
            assert!(!every_2_days.is_active_on(anchor + Days::new(2 * k + 1)));
        }
        assert!(!every_2_days.is_active_on(anchor - Days::new(2)));
    }

    #[rstest]
    #[case(date(2024, 1, 1), true)]
    #[case(date(2024, 1, 2), true)]
    #[case(date(2024, 6, 15), true)]
    #[case(date(2023, 12, 31), false)]
    fn test_daily(#[case] query: NaiveDate, #[case] expected: bool) {
        let daily = session(1, date(2024, 1, 1), Frequency::Daily);
        assert_eq!(daily.is_active_on(query), expected);
    }

    #[rstest]
    #[case(date(2024, 1, 1), true)]
    #[case(date(2024, 1, 8), true)]
    #[case(date(2024, 12, 30), true)]
    #[case(date(2024, 1, 3), false)]
    #[case(date(2023, 12, 25), false)]
    fn test_weekly(#[case] query: NaiveDate, #[case] expected: bool) {
        let weekly = session(1, date(2024, 1, 1), Frequency::Weekly);
        assert_eq!(weekly.is_active_on(query), expected);
    }

    #[test]
    fn test_unknown_frequency_is_never_active() {
        let anchor = date(2024, 1, 1);
        let unknown = session(1, anchor, Frequency::from("MONTHLY"));
        assert_eq!(unknown.frequency, Frequency::Unknown("MONTHLY".to_string()));
        assert!(!unknown.is_active_on(anchor));
        assert!(!unknown.is_active_on(anchor + Days::new(30)));
    }

    #[rstest]
    #[case("ONCE", Frequency::Once, "ONCE")]
    #[case("DAILY", Frequency::Daily, "DAILY")]
    #[case("WEEKLY", Frequency::Weekly, "WEEKLY")]
    #[case("EVERY_2_DAYS", Frequency::Every2Days, "EVERY_2_DAYS")]
    #[case("EVERY 2 DAYS", Frequency::Every2Days, "EVERY_2_DAYS")]
    #[case("daily", Frequency::Unknown("daily".to_string()), "daily")]
    fn test_frequency_literals(
        #[case] literal: &str,
        #[case] frequency: Frequency,
        #[case] canonical: &str,
    ) {
        assert_eq!(Frequency::from(literal), frequency);
        assert_eq!(frequency.to_string(), canonical);
    }

    #[test]
    fn test_sessions_on() {
        let sessions = vec![
            session(1, date(2024, 1, 1), Frequency::Daily),
            session(2, date(2024, 1, 1), Frequency::Once),
            session(3, date(2024, 1, 2), Frequency::Weekly),
            session(4, date(2024, 1, 1), Frequency::Every2Days),
        ];
        let ids = |d| {
            sessions_on(&sessions, d)
                .iter()
                .map(|s| s.id)
                .collect::<Vec<ScheduledSessionID>>()
        };
        let expected = |ids: &[u128]| {
            ids.iter()
                .map(|id| ScheduledSessionID::from(*id))
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(date(2024, 1, 1)), expected(&[1, 2, 4]));
        assert_eq!(ids(date(2024, 1, 2)), expected(&[1, 3]));
        assert_eq!(ids(date(2024, 1, 9)), expected(&[1, 3, 4]));
        assert_eq!(ids(date(2024, 1, 11)), expected(&[1, 4]));
        assert!(ids(date(2023, 12, 31)).is_empty());
    }

    #[rstest]
    #[case("#4f46e5", Ok(Color("#4F46E5".to_string())))]
    #[case(" #00FF00 ", Ok(Color("#00FF00".to_string())))]
    #[case("4F46E5", Err(ColorError::Invalid("4F46E5".to_string())))]
    #[case("#FFF", Err(ColorError::Invalid("#FFF".to_string())))]
    #[case("#GGGGGG", Err(ColorError::Invalid("#GGGGGG".to_string())))]
    fn test_color_new(#[case] value: &str, #[case] expected: Result<Color, ColorError>) {
        assert_eq!(Color::new(value), expected);
    }

    #[test]
    fn test_scheduled_session_num_sets() {
        let mut s = session(1, date(2024, 1, 1), Frequency::Once);
        s.exercises.push(
            SessionExercise::new(
                2.into(),
                "Lunge".to_string(),
                true,
                Unit::Reps,
                2,
                Reps::Uniform(8),
            )
            .unwrap(),
        );
        assert_eq!(s.num_sets(), 5);
        assert_eq!(s.exercise_ids(), vec![ExerciseID::from(1), ExerciseID::from(2)]);
    }

    #[test]
    fn test_scheduled_session_id_nil() {
        assert!(ScheduledSessionID::nil().is_nil());
        assert_eq!(ScheduledSessionID::nil(), ScheduledSessionID::default());
    }
}
