use std::slice::Iter;

use derive_more::Deref;
use uuid::Uuid;

use crate::{CreateError, DeleteError, Name, ReadError, UpdateError, ValidationError};

#[allow(async_fn_in_trait)]
pub trait ExerciseService {
    async fn get_exercises(&self) -> Result<Vec<Exercise>, ReadError>;
    async fn get_exercise(&self, id: ExerciseID) -> Result<Exercise, ReadError>;
    async fn create_exercise(&self, exercise: NewExercise) -> Result<Exercise, CreateError>;
    async fn replace_exercise(&self, exercise: Exercise) -> Result<Exercise, UpdateError>;
    async fn delete_exercise(&self, id: ExerciseID) -> Result<ExerciseID, DeleteError>;

    async fn get_exercises_or_empty(&self) -> Vec<Exercise> {
        self.get_exercises().await.unwrap_or_default()
    }

    async fn validate_exercise_name(
        &self,
        name: &str,
        id: ExerciseID,
    ) -> Result<Name, ValidationError> {
        match Name::new(name) {
            Ok(name) => match self.get_exercises().await {
                Ok(exercises) => {
                    if exercises.iter().all(|e| e.id == id || e.name != name) {
                        Ok(name)
                    } else {
                        Err(ValidationError::Conflict("name".to_string()))
                    }
                }
                Err(err) => Err(ValidationError::Other(err.into())),
            },
            Err(err) => Err(ValidationError::Other(err.into())),
        }
    }

    fn validate_exercise_default_target(&self, value: &str) -> Result<u32, ValidationError> {
        match value.trim().parse::<u32>() {
            Ok(target) if target > 0 => Ok(target),
            _ => Err(ValidationError::Other(
                "Target must be a positive whole number".into(),
            )),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait ExerciseRepository {
    async fn read_exercises(&self) -> Result<Vec<Exercise>, ReadError>;
    async fn read_exercise(&self, id: ExerciseID) -> Result<Option<Exercise>, ReadError>;
    async fn create_exercise(&self, exercise: NewExercise) -> Result<Exercise, CreateError>;
    async fn replace_exercise(&self, exercise: Exercise) -> Result<Exercise, UpdateError>;
    async fn delete_exercise(&self, id: ExerciseID) -> Result<ExerciseID, DeleteError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub id: ExerciseID,
    pub name: Name,
    pub category: Category,
    pub difficulty: Difficulty,
    pub equipment: Equipment,
    pub unit: Unit,
    pub default_target: u32,
    pub unilateral: bool,
    pub description: String,
    pub muscles: Vec<TargetedMuscle>,
}

impl Exercise {
    #[must_use]
    pub fn muscles_with_impact(&self, impact: Impact) -> Vec<MuscleID> {
        self.muscles
            .iter()
            .filter(|m| m.impact == impact)
            .map(|m| m.muscle_id)
            .collect()
    }

    #[must_use]
    pub fn trains(&self, muscle_id: MuscleID) -> bool {
        self.muscles
            .iter()
            .any(|m| m.muscle_id == muscle_id && m.effect == Effect::Train)
    }
}

/// Exercise as entered in the creation form, before storage has assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExercise {
    pub name: Name,
    pub category: Category,
    pub difficulty: Difficulty,
    pub equipment: Equipment,
    pub unit: Unit,
    pub default_target: u32,
    pub unilateral: bool,
    pub description: String,
    pub muscles: Vec<TargetedMuscle>,
}

impl NewExercise {
    #[must_use]
    pub fn with_id(self, id: ExerciseID) -> Exercise {
        Exercise {
            id,
            name: self.name,
            category: self.category,
            difficulty: self.difficulty,
            equipment: self.equipment,
            unit: self.unit,
            default_target: self.default_target,
            unilateral: self.unilateral,
            description: self.description,
            muscles: self.muscles,
        }
    }
}

#[derive(Deref, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExerciseID(Uuid);

impl ExerciseID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for ExerciseID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for ExerciseID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetedMuscle {
    pub muscle_id: MuscleID,
    pub impact: Impact,
    pub effect: Effect,
}

pub trait Property: Clone + Copy + Sized {
    fn iter() -> Iter<'static, Self>;
    fn name(self) -> &'static str;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    #[error("Unknown {kind} \"{value}\"")]
    Unknown { kind: &'static str, value: String },
}

/// Defines an enumerated exercise tag together with its persisted literal and display name.
macro_rules! property {
    ($kind: literal, $type: ident { $($variant: ident => $literal: literal, $name: literal),+ $(,)? }) => {
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
        pub enum $type {
            $($variant),+
        }

        impl Property for $type {
            fn iter() -> Iter<'static, $type> {
                static VALUES: &[$type] = &[$($type::$variant),+];
                VALUES.iter()
            }

            fn name(self) -> &'static str {
                match self {
                    $($type::$variant => $name),+
                }
            }
        }

        impl $type {
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($type::$variant => $literal),+
                }
            }
        }

        impl TryFrom<&str> for $type {
            type Error = PropertyError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                match value {
                    $($literal => Ok($type::$variant),)+
                    _ => Err(PropertyError::Unknown {
                        kind: $kind,
                        value: value.to_string(),
                    }),
                }
            }
        }
    };
}

property!("category", Category {
    Strength => "STRENGTH", "Strength",
    Cardio => "CARDIO", "Cardio",
    Core => "CORE", "Core",
    Mobility => "MOBILITY", "Mobility",
    Stretching => "STRETCHING", "Stretching",
});

property!("difficulty", Difficulty {
    Beginner => "BEGINNER", "Beginner",
    Intermediate => "INTERMEDIATE", "Intermediate",
    Advanced => "ADVANCED", "Advanced",
});

property!("equipment", Equipment {
    Bodyweight => "BODYWEIGHT", "Bodyweight",
    Barbell => "BARBELL", "Barbell",
    Dumbbell => "DUMBBELL", "Dumbbell",
    Kettlebell => "KETTLEBELL", "Kettlebell",
    Machine => "MACHINE", "Machine",
    PullUpBar => "PULL_UP_BAR", "Pull-up Bar",
    ResistanceBand => "RESISTANCE_BAND", "Resistance Band",
    Mat => "MAT", "Mat",
});

property!("unit", Unit {
    Reps => "reps", "Reps",
    Seconds => "seconds", "Seconds",
});

property!("impact", Impact {
    Primary => "PRIMARY", "Primary",
    Secondary => "SECONDARY", "Secondary",
    Stabilizer => "STABILIZER", "Stabilizer",
});

property!("effect", Effect {
    Train => "TRAIN", "Train",
    Stretch => "STRETCH", "Stretch",
    Mobility => "MOBILITY", "Mobility",
    Isometric => "ISOMETRIC", "Isometric",
});

property!("muscle", MuscleID {
    Neck => "neck", "Neck",
    Pecs => "pecs", "Pecs",
    Traps => "traps", "Traps",
    Lats => "lats", "Lats",
    FrontDelts => "front_delts", "Front Delts",
    SideDelts => "side_delts", "Side Delts",
    RearDelts => "rear_delts", "Rear Delts",
    Biceps => "biceps", "Biceps",
    Triceps => "triceps", "Triceps",
    Forearms => "forearms", "Forearms",
    Abs => "abs", "Abs",
    Obliques => "obliques", "Obliques",
    ErectorSpinae => "erector_spinae", "Erector Spinae",
    Glutes => "glutes", "Glutes",
    HipFlexors => "hip_flexors", "Hip Flexors",
    Abductors => "abductors", "Abductors",
    Quads => "quads", "Quads",
    Hamstrings => "hamstrings", "Hamstrings",
    Adductors => "adductors", "Adductors",
    Calves => "calves", "Calves",
});

impl MuscleID {
    #[must_use]
    pub fn description(self) -> &'static str {
        #[allow(clippy::match_same_arms)]
        match self {
            MuscleID::Neck => "",
            MuscleID::Pecs => "Chest",
            MuscleID::Traps => "Upper back",
            MuscleID::Lats => "Sides of back",
            MuscleID::FrontDelts => "Anterior shoulders",
            MuscleID::SideDelts => "Mid shoulders",
            MuscleID::RearDelts => "Posterior shoulders",
            MuscleID::Biceps => "Front of upper arms",
            MuscleID::Triceps => "Back of upper arms",
            MuscleID::Forearms => "",
            MuscleID::Abs => "Belly",
            MuscleID::Obliques => "Sides of the waist",
            MuscleID::ErectorSpinae => "Lower back and spine",
            MuscleID::Glutes => "Buttocks",
            MuscleID::HipFlexors => "Front of hips",
            MuscleID::Abductors => "Outside of hips",
            MuscleID::Quads => "Front of thighs",
            MuscleID::Hamstrings => "Back of thighs",
            MuscleID::Adductors => "Inner thighs",
            MuscleID::Calves => "Back of lower legs",
        }
    }
}
