use std::collections::BTreeSet;

use chrono::{NaiveDate, TimeZone, Utc};
use repwise_domain as domain;

pub static EXERCISES: std::sync::LazyLock<Vec<domain::Exercise>> =
    std::sync::LazyLock::new(|| vec![EXERCISE.clone(), EXERCISE_2.clone()]);

pub static EXERCISE: std::sync::LazyLock<domain::Exercise> =
    std::sync::LazyLock::new(|| domain::Exercise {
        id: 1.into(),
        name: domain::Name::new("Bulgarian Split Squat").unwrap(),
        category: domain::Category::Strength,
        difficulty: domain::Difficulty::Intermediate,
        equipment: domain::Equipment::Dumbbell,
        unit: domain::Unit::Reps,
        default_target: 10,
        unilateral: true,
        description: String::from("Rear foot elevated"),
        muscles: vec![
            domain::TargetedMuscle {
                muscle_id: domain::MuscleID::Quads,
                impact: domain::Impact::Primary,
                effect: domain::Effect::Train,
            },
            domain::TargetedMuscle {
                muscle_id: domain::MuscleID::Glutes,
                impact: domain::Impact::Secondary,
                effect: domain::Effect::Train,
            },
        ],
    });

pub static EXERCISE_2: std::sync::LazyLock<domain::Exercise> =
    std::sync::LazyLock::new(|| domain::Exercise {
        id: 2.into(),
        name: domain::Name::new("Plank").unwrap(),
        category: domain::Category::Core,
        difficulty: domain::Difficulty::Beginner,
        equipment: domain::Equipment::Mat,
        unit: domain::Unit::Seconds,
        default_target: 45,
        unilateral: false,
        description: String::new(),
        muscles: vec![domain::TargetedMuscle {
            muscle_id: domain::MuscleID::Abs,
            impact: domain::Impact::Primary,
            effect: domain::Effect::Isometric,
        }],
    });

pub static SESSION_EXERCISE: std::sync::LazyLock<domain::SessionExercise> =
    std::sync::LazyLock::new(|| {
        domain::SessionExercise::new(
            1.into(),
            String::from("Bulgarian Split Squat"),
            true,
            domain::Unit::Reps,
            2,
            domain::Reps::PerSet(vec![10, 10, 8, 8]),
        )
        .unwrap()
    });

pub static SESSION_EXERCISE_2: std::sync::LazyLock<domain::SessionExercise> =
    std::sync::LazyLock::new(|| {
        domain::SessionExercise::new(
            2.into(),
            String::from("Plank"),
            false,
            domain::Unit::Seconds,
            3,
            domain::Reps::Uniform(45),
        )
        .unwrap()
    });

pub static SCHEDULED_SESSIONS: std::sync::LazyLock<Vec<domain::ScheduledSession>> =
    std::sync::LazyLock::new(|| vec![SCHEDULED_SESSION.clone(), SCHEDULED_SESSION_2.clone()]);

pub static SCHEDULED_SESSION: std::sync::LazyLock<domain::ScheduledSession> =
    std::sync::LazyLock::new(|| domain::ScheduledSession {
        id: 1.into(),
        title: domain::Name::new("Leg Day").unwrap(),
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        frequency: domain::Frequency::Every2Days,
        color: domain::Color::new("#22C55E").unwrap(),
        exercises: vec![SESSION_EXERCISE.clone(), SESSION_EXERCISE_2.clone()],
    });

pub static SCHEDULED_SESSION_2: std::sync::LazyLock<domain::ScheduledSession> =
    std::sync::LazyLock::new(|| domain::ScheduledSession {
        id: 2.into(),
        title: domain::Name::new("Core").unwrap(),
        date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        frequency: domain::Frequency::Weekly,
        color: domain::Color::default(),
        exercises: vec![SESSION_EXERCISE_2.clone()],
    });

pub static HISTORY: std::sync::LazyLock<domain::SessionHistory> =
    std::sync::LazyLock::new(|| domain::SessionHistory {
        id: 1.into(),
        session_id: Some(1.into()),
        completed_at: Utc.with_ymd_and_hms(2024, 1, 1, 18, 30, 0).unwrap(),
        performance: domain::Performance {
            elapsed_seconds: 1500,
            exercises: vec![SESSION_EXERCISE.clone(), SESSION_EXERCISE_2.clone()],
            completed_sets: BTreeSet::from([
                domain::StepKey {
                    exercise_idx: 0,
                    set_idx: 0,
                    side: Some(domain::Side::Left),
                },
                domain::StepKey {
                    exercise_idx: 0,
                    set_idx: 0,
                    side: Some(domain::Side::Right),
                },
                domain::StepKey {
                    exercise_idx: 1,
                    set_idx: 0,
                    side: None,
                },
            ]),
        },
    });

pub static HISTORY_2: std::sync::LazyLock<domain::SessionHistory> =
    std::sync::LazyLock::new(|| domain::SessionHistory {
        id: 2.into(),
        session_id: None,
        completed_at: Utc.with_ymd_and_hms(2024, 1, 3, 7, 0, 0).unwrap(),
        performance: domain::Performance {
            elapsed_seconds: 300,
            exercises: vec![SESSION_EXERCISE_2.clone()],
            completed_sets: BTreeSet::from([
                domain::StepKey {
                    exercise_idx: 0,
                    set_idx: 0,
                    side: None,
                },
                domain::StepKey {
                    exercise_idx: 0,
                    set_idx: 1,
                    side: None,
                },
            ]),
        },
    });

pub static PROFILE: std::sync::LazyLock<domain::UserProfile> =
    std::sync::LazyLock::new(|| domain::UserProfile {
        level: 2,
        xp: 120,
        total_xp: 620,
        current_streak: 3,
        best_streak: 5,
        streak_start: NaiveDate::from_ymd_opt(2024, 1, 1),
        last_activity: NaiveDate::from_ymd_opt(2024, 1, 3),
        total_reps: 410,
    });
