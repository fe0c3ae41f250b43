use chrono::NaiveDate;

use crate::{ReadError, StatsUpdate, UpdateError};

#[allow(async_fn_in_trait)]
pub trait ProfileService {
    async fn get_profile(&self) -> Result<UserProfile, ReadError>;
    async fn apply_stats(
        &self,
        xp_gained: u32,
        reps_gained: u32,
        today: NaiveDate,
    ) -> Result<StatsUpdate, UpdateError>;
    async fn reset_streak(&self, today: NaiveDate) -> Result<UserProfile, UpdateError>;

    async fn get_profile_or_default(&self) -> UserProfile {
        self.get_profile().await.unwrap_or_default()
    }
}

#[allow(async_fn_in_trait)]
pub trait ProfileRepository {
    /// Returns the default profile if none has been stored yet.
    async fn read_profile(&self) -> Result<UserProfile, ReadError>;
    async fn write_profile(&self, profile: UserProfile) -> Result<UserProfile, UpdateError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub level: u32,
    /// Progress into the current level.
    pub xp: u32,
    pub total_xp: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub streak_start: Option<NaiveDate>,
    pub last_activity: Option<NaiveDate>,
    pub total_reps: u32,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            total_xp: 0,
            current_streak: 0,
            best_streak: 0,
            streak_start: None,
            last_activity: None,
            total_reps: 0,
        }
    }
}

impl UserProfile {
    #[must_use]
    pub fn days_since_last_activity(&self, today: NaiveDate) -> Option<i64> {
        self.last_activity.map(|last| (today - last).num_days())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = UserProfile::default();
        assert_eq!(profile.level, 1);
        assert_eq!(profile.xp, 0);
        assert_eq!(profile.current_streak, 0);
        assert_eq!(profile.streak_start, None);
    }

    #[rstest]
    #[case(None, None)]
    #[case(NaiveDate::from_ymd_opt(2024, 4, 30), Some(0))]
    #[case(NaiveDate::from_ymd_opt(2024, 4, 29), Some(1))]
    #[case(NaiveDate::from_ymd_opt(2024, 3, 31), Some(30))]
    fn test_days_since_last_activity(
        #[case] last_activity: Option<NaiveDate>,
        #[case] expected: Option<i64>,
    ) {
        let profile = UserProfile {
            last_activity,
            ..UserProfile::default()
        };
        assert_eq!(
            profile.days_since_last_activity(NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()),
            expected
        );
    }
}
