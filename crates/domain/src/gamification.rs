use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::{ExerciseID, UserProfile};

pub const XP_PER_SET: u32 = 10;
pub const VARIETY_BONUS: u32 = 5;

const BASE_XP_REQUIRED: u32 = 500;
const XP_REQUIRED_INCREMENT: u32 = 250;

/// XP needed to advance from `level` to the next level.
#[must_use]
pub fn xp_required(level: u32) -> u32 {
    BASE_XP_REQUIRED.saturating_add(XP_REQUIRED_INCREMENT.saturating_mul(level.saturating_sub(1)))
}

#[must_use]
pub fn score_session(completed_sets: u32, variety_bonus: u32) -> u32 {
    completed_sets
        .saturating_mul(XP_PER_SET)
        .saturating_add(variety_bonus)
}

/// Bonus for a session containing at least two exercises absent from the previous session.
///
/// Only granted while a streak is running.
#[must_use]
pub fn variety_bonus(
    current: &BTreeSet<ExerciseID>,
    previous: &BTreeSet<ExerciseID>,
    current_streak: u32,
) -> u32 {
    if current_streak >= 1 && current.difference(previous).count() >= 2 {
        VARIETY_BONUS
    } else {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsUpdate {
    pub profile: UserProfile,
    /// The streak was not extended because at least two days have passed since the last
    /// activity. The user decides whether to reset it.
    pub streak_break_suggested: bool,
    pub days_since_last_activity: Option<i64>,
}

/// Adds the rewards of a completed session to a profile.
///
/// Levels cascade, so a single large gain can advance several levels. The streak grows by one
/// for a session on the day after the last activity and stays unchanged for further sessions on
/// the same day. A gap of two or more days leaves the streak untouched and suggests a reset.
#[must_use]
pub fn apply_stats(
    profile: &UserProfile,
    xp_gained: u32,
    reps_gained: u32,
    today: NaiveDate,
) -> StatsUpdate {
    let mut profile = profile.clone();

    profile.xp = profile.xp.saturating_add(xp_gained);
    profile.total_xp = profile.total_xp.saturating_add(xp_gained);
    profile.total_reps = profile.total_reps.saturating_add(reps_gained);
    while profile.xp >= xp_required(profile.level) {
        profile.xp -= xp_required(profile.level);
        profile.level += 1;
    }

    let days_since_last_activity = profile.days_since_last_activity(today);
    let streak_break_suggested = match days_since_last_activity {
        Some(days) if profile.current_streak > 0 && days <= 0 => false,
        Some(1) if profile.current_streak > 0 => {
            profile.current_streak += 1;
            false
        }
        Some(_) if profile.current_streak > 0 => true,
        _ => {
            profile.current_streak = 1;
            profile.streak_start = Some(today);
            false
        }
    };
    profile.best_streak = profile.best_streak.max(profile.current_streak);
    profile.last_activity = profile.last_activity.max(Some(today));

    StatsUpdate {
        profile,
        streak_break_suggested,
        days_since_last_activity,
    }
}

/// Restarts the streak at one, beginning today.
#[must_use]
pub fn reset_streak(profile: &UserProfile, today: NaiveDate) -> UserProfile {
    let mut profile = profile.clone();
    profile.current_streak = 1;
    profile.streak_start = Some(today);
    profile.best_streak = profile.best_streak.max(1);
    profile
}
