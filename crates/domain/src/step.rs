use std::fmt;

use crate::{Exercise, ExerciseID, Unit};

/// An exercise as embedded in a planned session.
///
/// Name, laterality and unit are snapshots of the catalog exercise taken when the session was
/// planned, so a session stays runnable after the catalog entry has been edited or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionExercise {
    pub exercise_id: ExerciseID,
    pub name: String,
    pub unilateral: bool,
    pub unit: Unit,
    pub sets: u32,
    pub reps: Reps,
}

/// Target repetitions (or seconds) of a session exercise.
///
/// For unilateral exercises a per-set list holds LEFT/RIGHT pairs, so set `n` uses the values at
/// `2n` and `2n + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reps {
    Uniform(u32),
    PerSet(Vec<u32>),
}

impl Reps {
    /// Target at `idx`; indices past the end of a per-set list resolve to its last value.
    #[must_use]
    pub fn at(&self, idx: usize) -> u32 {
        match self {
            Reps::Uniform(value) => *value,
            Reps::PerSet(values) => values.get(idx).or(values.last()).copied().unwrap_or(0),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetError {
    #[error("An exercise needs at least one set")]
    NoSets,
    #[error("The last remaining set cannot be deleted")]
    LastSet,
    #[error("Index {0} is out of range")]
    OutOfRange(usize),
}

impl SessionExercise {
    pub fn new(
        exercise_id: ExerciseID,
        name: String,
        unilateral: bool,
        unit: Unit,
        sets: u32,
        reps: Reps,
    ) -> Result<Self, SetError> {
        if sets == 0 {
            return Err(SetError::NoSets);
        }
        let reps = match reps {
            Reps::PerSet(mut values) if unilateral && values.len() % 2 == 1 => {
                if let Some(last) = values.last().copied() {
                    values.push(last);
                }
                Reps::PerSet(values)
            }
            reps => reps,
        };
        Ok(Self {
            exercise_id,
            name,
            unilateral,
            unit,
            sets,
            reps,
        })
    }

    /// Snapshot of a catalog exercise with its default target applied to every set.
    pub fn from_exercise(exercise: &Exercise, sets: u32) -> Result<Self, SetError> {
        Self::new(
            exercise.id,
            exercise.name.to_string(),
            exercise.unilateral,
            exercise.unit,
            sets,
            Reps::Uniform(exercise.default_target),
        )
    }

    fn sides(&self) -> usize {
        if self.unilateral { 2 } else { 1 }
    }

    /// Number of rep values addressed by the sets of this exercise.
    #[must_use]
    pub fn rep_count(&self) -> usize {
        self.sets as usize * self.sides()
    }

    #[must_use]
    pub fn target(&self, set_idx: usize, side: Option<Side>) -> u32 {
        self.reps.at(set_idx * self.sides() + side.map_or(0, Side::offset))
    }

    /// Sum of all targets, both sides included.
    #[must_use]
    pub fn total_target(&self) -> u32 {
        (0..self.rep_count()).map(|idx| self.reps.at(idx)).sum()
    }

    fn rep_values(&self) -> Vec<u32> {
        (0..self.rep_count()).map(|idx| self.reps.at(idx)).collect()
    }

    /// Changes the value at `rep_idx` by `delta`, saturating at zero.
    ///
    /// In linked mode the paired side of a unilateral set receives the same new value.
    pub fn update_rep(
        &mut self,
        rep_idx: usize,
        delta: i32,
        linked: bool,
    ) -> Result<u32, SetError> {
        if rep_idx >= self.rep_count() {
            return Err(SetError::OutOfRange(rep_idx));
        }
        let value = self.reps.at(rep_idx).saturating_add_signed(delta);
        self.write_rep(rep_idx, value, linked);
        Ok(value)
    }

    /// Replaces the value at `rep_idx`, with the same pairing rules as [`Self::update_rep`].
    pub fn set_rep(&mut self, rep_idx: usize, value: u32, linked: bool) -> Result<(), SetError> {
        if rep_idx >= self.rep_count() {
            return Err(SetError::OutOfRange(rep_idx));
        }
        self.write_rep(rep_idx, value, linked);
        Ok(())
    }

    fn write_rep(&mut self, rep_idx: usize, value: u32, linked: bool) {
        let mut values = self.rep_values();
        values[rep_idx] = value;
        if self.unilateral && linked {
            if let Some(paired) = values.get_mut(rep_idx ^ 1) {
                *paired = value;
            }
        }
        self.reps = Reps::PerSet(values);
    }

    /// Removes one set. The last remaining set is never removed.
    pub fn remove_set(&mut self, set_idx: usize) -> Result<(), SetError> {
        if self.sets <= 1 {
            return Err(SetError::LastSet);
        }
        if set_idx >= self.sets as usize {
            return Err(SetError::OutOfRange(set_idx));
        }
        let sides = self.sides();
        if let Reps::PerSet(values) = &mut self.reps {
            let start = set_idx * sides;
            if start < values.len() {
                let end = (start + sides).min(values.len());
                values.drain(start..end);
            }
        }
        self.sets -= 1;
        Ok(())
    }

    /// Appends a set repeating the targets of the most recent one.
    ///
    /// A unilateral set copies the previous RIGHT value to both sides.
    pub fn add_set(&mut self) {
        if let Reps::PerSet(_) = self.reps {
            let mut values = self.rep_values();
            let last = self.reps.at(self.rep_count() - 1);
            values.push(last);
            if self.unilateral {
                values.push(last);
            }
            self.reps = Reps::PerSet(values);
        }
        self.sets += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[must_use]
    pub fn offset(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// One set (or one side of a unilateral set) to perform in a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStep {
    pub exercise_idx: usize,
    pub set_idx: usize,
    pub side: Option<Side>,
    pub target: u32,
    pub total_sets: u32,
}

impl SessionStep {
    #[must_use]
    pub fn key(&self) -> StepKey {
        StepKey {
            exercise_idx: self.exercise_idx,
            set_idx: self.set_idx,
            side: self.side,
        }
    }

    /// Index of this step's value in the exercise's rep list.
    #[must_use]
    pub fn rep_idx(&self) -> usize {
        match self.side {
            Some(side) => 2 * self.set_idx + side.offset(),
            None => self.set_idx,
        }
    }
}

/// Identity of a performed set within one session, stable across rep edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StepKey {
    pub exercise_idx: usize,
    pub set_idx: usize,
    pub side: Option<Side>,
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.exercise_idx, self.set_idx)?;
        match self.side {
            Some(Side::Left) => write!(f, "-L"),
            Some(Side::Right) => write!(f, "-R"),
            None => Ok(()),
        }
    }
}

impl TryFrom<&str> for StepKey {
    type Error = StepKeyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut parts = value.split('-');
        let mut index = || {
            parts
                .next()
                .and_then(|p| p.parse::<usize>().ok())
                .ok_or_else(|| StepKeyError::Invalid(value.to_string()))
        };
        let exercise_idx = index()?;
        let set_idx = index()?;
        let side = match parts.next() {
            None => None,
            Some("L") => Some(Side::Left),
            Some("R") => Some(Side::Right),
            Some(_) => return Err(StepKeyError::Invalid(value.to_string())),
        };
        if parts.next().is_some() {
            return Err(StepKeyError::Invalid(value.to_string()));
        }
        Ok(Self {
            exercise_idx,
            set_idx,
            side,
        })
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StepKeyError {
    #[error("Invalid step key \"{0}\"")]
    Invalid(String),
}

/// Flattens the exercises of a session into the ordered steps of a live session.
#[must_use]
pub fn build_steps(exercises: &[SessionExercise]) -> Vec<SessionStep> {
    let mut steps = Vec::new();
    for (exercise_idx, exercise) in exercises.iter().enumerate() {
        for set_idx in 0..exercise.sets as usize {
            let sides: &[Option<Side>] = if exercise.unilateral {
                &[Some(Side::Left), Some(Side::Right)]
            } else {
                &[None]
            };
            for side in sides {
                steps.push(SessionStep {
                    exercise_idx,
                    set_idx,
                    side: *side,
                    target: exercise.target(set_idx, *side),
                    total_sets: exercise.sets,
                });
            }
        }
    }
    steps
}

/// Keeps an active step index valid after the step list has shrunk.
#[must_use]
pub fn clamp_step_index(current: usize, step_count: usize) -> usize {
    if current >= step_count {
        step_count.saturating_sub(1)
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn bilateral(sets: u32, reps: Reps) -> SessionExercise {
        SessionExercise::new(1.into(), "Squat".to_string(), false, Unit::Reps, sets, reps).unwrap()
    }

    fn unilateral(sets: u32, reps: Reps) -> SessionExercise {
        SessionExercise::new(2.into(), "Lunge".to_string(), true, Unit::Reps, sets, reps).unwrap()
    }

    fn sides(steps: &[SessionStep]) -> Vec<Option<Side>> {
        steps.iter().map(|s| s.side).collect()
    }

    #[test]
    fn test_session_exercise_new_pads_odd_unilateral_list() {
        assert_eq!(
            unilateral(2, Reps::PerSet(vec![8, 10, 12])).reps,
            Reps::PerSet(vec![8, 10, 12, 12])
        );
        assert_eq!(
            bilateral(3, Reps::PerSet(vec![8, 10, 12])).reps,
            Reps::PerSet(vec![8, 10, 12])
        );
    }

    #[test]
    fn test_session_exercise_new_without_sets() {
        assert_eq!(
            SessionExercise::new(1.into(), "A".to_string(), false, Unit::Reps, 0, Reps::Uniform(5)),
            Err(SetError::NoSets)
        );
    }

    #[rstest]
    #[case(Reps::Uniform(7), 3, 7)]
    #[case(Reps::PerSet(vec![1, 2, 3]), 1, 2)]
    #[case(Reps::PerSet(vec![1, 2, 3]), 5, 3)]
    #[case(Reps::PerSet(vec![]), 0, 0)]
    fn test_reps_at(#[case] reps: Reps, #[case] idx: usize, #[case] expected: u32) {
        assert_eq!(reps.at(idx), expected);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(5)]
    fn test_build_steps_unilateral(#[case] sets: u32) {
        let steps = build_steps(&[unilateral(sets, Reps::Uniform(10))]);
        assert_eq!(steps.len(), 2 * sets as usize);
        for (i, pair) in steps.chunks(2).enumerate() {
            assert_eq!(sides(pair), vec![Some(Side::Left), Some(Side::Right)]);
            assert!(pair.iter().all(|s| s.set_idx == i && s.total_sets == sets));
        }
    }

    #[rstest]
    #[case(1)]
    #[case(4)]
    fn test_build_steps_bilateral(#[case] sets: u32) {
        let steps = build_steps(&[bilateral(sets, Reps::Uniform(10))]);
        assert_eq!(steps.len(), sets as usize);
        assert!(steps.iter().all(|s| s.side.is_none()));
        assert_eq!(
            steps.iter().map(|s| s.set_idx).collect::<Vec<_>>(),
            (0..sets as usize).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_build_steps_resolves_targets() {
        let steps = build_steps(&[
            bilateral(2, Reps::PerSet(vec![12, 8])),
            unilateral(2, Reps::PerSet(vec![10, 11, 6, 7])),
        ]);
        assert_eq!(
            steps,
            vec![
                SessionStep {
                    exercise_idx: 0,
                    set_idx: 0,
                    side: None,
                    target: 12,
                    total_sets: 2,
                },
                SessionStep {
                    exercise_idx: 0,
                    set_idx: 1,
                    side: None,
                    target: 8,
                    total_sets: 2,
                },
                SessionStep {
                    exercise_idx: 1,
                    set_idx: 0,
                    side: Some(Side::Left),
                    target: 10,
                    total_sets: 2,
                },
                SessionStep {
                    exercise_idx: 1,
                    set_idx: 0,
                    side: Some(Side::Right),
                    target: 11,
                    total_sets: 2,
                },
                SessionStep {
                    exercise_idx: 1,
                    set_idx: 1,
                    side: Some(Side::Left),
                    target: 6,
                    total_sets: 2,
                },
                SessionStep {
                    exercise_idx: 1,
                    set_idx: 1,
                    side: Some(Side::Right),
                    target: 7,
                    total_sets: 2,
                },
            ]
        );
    }

    #[test]
    fn test_build_steps_is_deterministic() {
        let exercises = vec![
            unilateral(3, Reps::PerSet(vec![5, 6])),
            bilateral(2, Reps::Uniform(9)),
        ];
        assert_eq!(build_steps(&exercises), build_steps(&exercises));
        assert!(build_steps(&[]).is_empty());
    }

    #[rstest]
    #[case(true, vec![12, 12])]
    #[case(false, vec![12, 10])]
    fn test_update_rep_even_index(#[case] linked: bool, #[case] expected: Vec<u32>) {
        let mut exercise = unilateral(1, Reps::PerSet(vec![10, 10]));
        assert_eq!(exercise.update_rep(0, 2, linked), Ok(12));
        assert_eq!(exercise.reps, Reps::PerSet(expected));
    }

    #[rstest]
    #[case(true, vec![10, 10, 7, 7])]
    #[case(false, vec![10, 10, 9, 7])]
    fn test_update_rep_odd_index(#[case] linked: bool, #[case] expected: Vec<u32>) {
        let mut exercise = unilateral(2, Reps::PerSet(vec![10, 10, 9, 9]));
        assert_eq!(exercise.update_rep(3, -2, linked), Ok(7));
        assert_eq!(exercise.reps, Reps::PerSet(expected));
    }

    #[test]
    fn test_update_rep_bilateral_ignores_linked() {
        let mut exercise = bilateral(2, Reps::Uniform(10));
        exercise.update_rep(0, 1, true).unwrap();
        assert_eq!(exercise.reps, Reps::PerSet(vec![11, 10]));
    }

    #[test]
    fn test_update_rep_saturates_at_zero() {
        let mut exercise = bilateral(1, Reps::Uniform(3));
        assert_eq!(exercise.update_rep(0, -5, false), Ok(0));
    }

    #[test]
    fn test_update_rep_out_of_range() {
        let mut exercise = unilateral(1, Reps::Uniform(3));
        assert_eq!(exercise.update_rep(2, 1, true), Err(SetError::OutOfRange(2)));
        assert_eq!(exercise.reps, Reps::Uniform(3));
    }

    #[test]
    fn test_set_rep_linked() {
        let mut exercise = unilateral(2, Reps::Uniform(8));
        exercise.set_rep(2, 15, true).unwrap();
        assert_eq!(exercise.reps, Reps::PerSet(vec![8, 8, 15, 15]));
    }

    #[test]
    fn test_remove_set_refuses_last_set() {
        let mut exercise = bilateral(1, Reps::PerSet(vec![10]));
        assert_eq!(exercise.remove_set(0), Err(SetError::LastSet));
        assert_eq!(exercise.sets, 1);
        assert_eq!(exercise.reps, Reps::PerSet(vec![10]));
    }

    #[test]
    fn test_remove_set_out_of_range() {
        let mut exercise = bilateral(2, Reps::Uniform(10));
        assert_eq!(exercise.remove_set(2), Err(SetError::OutOfRange(2)));
        assert_eq!(exercise.sets, 2);
    }

    #[rstest]
    #[case(bilateral(3, Reps::PerSet(vec![1, 2, 3])), 1, Reps::PerSet(vec![1, 3]))]
    #[case(bilateral(3, Reps::Uniform(4)), 0, Reps::Uniform(4))]
    #[case(unilateral(2, Reps::PerSet(vec![1, 2, 3, 4])), 0, Reps::PerSet(vec![3, 4]))]
    #[case(unilateral(3, Reps::PerSet(vec![1, 2])), 2, Reps::PerSet(vec![1, 2]))]
    fn test_remove_set(
        #[case] exercise: SessionExercise,
        #[case] set_idx: usize,
        #[case] expected: Reps,
    ) {
        let mut exercise = exercise;
        let sets = exercise.sets;
        exercise.remove_set(set_idx).unwrap();
        assert_eq!(exercise.sets, sets - 1);
        assert_eq!(exercise.reps, expected);
    }

    #[rstest]
    #[case(bilateral(2, Reps::PerSet(vec![10, 8])), Reps::PerSet(vec![10, 8, 8]))]
    #[case(bilateral(2, Reps::Uniform(10)), Reps::Uniform(10))]
    #[case(unilateral(1, Reps::PerSet(vec![10, 12])), Reps::PerSet(vec![10, 12, 12, 12]))]
    #[case(unilateral(2, Reps::PerSet(vec![10, 12])), Reps::PerSet(vec![10, 12, 12, 12, 12, 12]))]
    fn test_add_set(#[case] exercise: SessionExercise, #[case] expected: Reps) {
        let mut exercise = exercise;
        let sets = exercise.sets;
        exercise.add_set();
        assert_eq!(exercise.sets, sets + 1);
        assert_eq!(exercise.reps, expected);
        assert_eq!(build_steps(&[exercise.clone()]).len(), exercise.rep_count());
    }

    #[test]
    fn test_total_target() {
        assert_eq!(unilateral(2, Reps::PerSet(vec![10, 11, 6, 7])).total_target(), 34);
        assert_eq!(bilateral(3, Reps::Uniform(5)).total_target(), 15);
    }

    #[rstest]
    #[case(3, 5, 3)]
    #[case(5, 5, 4)]
    #[case(9, 2, 1)]
    #[case(0, 0, 0)]
    #[case(4, 0, 0)]
    fn test_clamp_step_index(
        #[case] current: usize,
        #[case] count: usize,
        #[case] expected: usize,
    ) {
        assert_eq!(clamp_step_index(current, count), expected);
    }

    #[rstest]
    #[case(StepKey { exercise_idx: 0, set_idx: 2, side: None }, "0-2")]
    #[case(StepKey { exercise_idx: 3, set_idx: 1, side: Some(Side::Left) }, "3-1-L")]
    #[case(StepKey { exercise_idx: 1, set_idx: 0, side: Some(Side::Right) }, "1-0-R")]
    fn test_step_key_string(#[case] key: StepKey, #[case] string: &str) {
        assert_eq!(key.to_string(), string);
        assert_eq!(StepKey::try_from(string), Ok(key));
    }

    #[rstest]
    #[case("")]
    #[case("1")]
    #[case("1-x")]
    #[case("1-2-X")]
    #[case("1-2-L-3")]
    fn test_step_key_invalid(#[case] string: &str) {
        assert_eq!(
            StepKey::try_from(string),
            Err(StepKeyError::Invalid(string.to_string()))
        );
    }

    #[test]
    fn test_step_rep_idx() {
        let steps = build_steps(&[unilateral(2, Reps::Uniform(1))]);
        assert_eq!(
            steps.iter().map(SessionStep::rep_idx).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }
}
