use std::collections::BTreeSet;

use crate::{
    ExerciseID, Performance, ScheduledSession, ScheduledSessionID, SessionExercise, SessionStep,
    SetError, StepKey, build_steps, clamp_step_index,
};

/// State of a session while it is being performed.
///
/// The step list is derived from the exercises and rebuilt after every edit. Completed sets are
/// tracked by [`StepKey`], so editing targets does not affect completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSession {
    session_id: Option<ScheduledSessionID>,
    exercises: Vec<SessionExercise>,
    steps: Vec<SessionStep>,
    current: usize,
    completed: BTreeSet<StepKey>,
    linked: bool,
}

impl LiveSession {
    #[must_use]
    pub fn new(
        session_id: Option<ScheduledSessionID>,
        exercises: Vec<SessionExercise>,
        linked: bool,
    ) -> Self {
        let steps = build_steps(&exercises);
        Self {
            session_id,
            exercises,
            steps,
            current: 0,
            completed: BTreeSet::new(),
            linked,
        }
    }

    #[must_use]
    pub fn from_scheduled(session: &ScheduledSession, linked: bool) -> Self {
        Self::new(Some(session.id), session.exercises.clone(), linked)
    }

    #[must_use]
    pub fn session_id(&self) -> Option<ScheduledSessionID> {
        self.session_id
    }

    #[must_use]
    pub fn exercises(&self) -> &[SessionExercise] {
        &self.exercises
    }

    #[must_use]
    pub fn steps(&self) -> &[SessionStep] {
        &self.steps
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_step(&self) -> Option<&SessionStep> {
        self.steps.get(self.current)
    }

    #[must_use]
    pub fn linked(&self) -> bool {
        self.linked
    }

    pub fn toggle_linked(&mut self) -> bool {
        self.linked = !self.linked;
        self.linked
    }

    #[must_use]
    pub fn completed(&self) -> &BTreeSet<StepKey> {
        &self.completed
    }

    #[must_use]
    pub fn is_completed(&self, key: &StepKey) -> bool {
        self.completed.contains(key)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| self.completed.contains(&s.key()))
    }

    /// Marks the active step as done and moves to the next open step.
    pub fn complete_current(&mut self) -> Option<SessionStep> {
        let step = *self.steps.get(self.current)?;
        self.completed.insert(step.key());
        if let Some(next) = self.next_open_step() {
            self.current = next;
        }
        Some(step)
    }

    fn next_open_step(&self) -> Option<usize> {
        let count = self.steps.len();
        (1..count)
            .map(|offset| (self.current + offset) % count)
            .find(|idx| !self.completed.contains(&self.steps[*idx].key()))
    }

    /// Toggles the completion of any step. Returns whether the step is now completed.
    pub fn toggle_completed(&mut self, step_idx: usize) -> Result<bool, SetError> {
        let key = self
            .steps
            .get(step_idx)
            .ok_or(SetError::OutOfRange(step_idx))?
            .key();
        if self.completed.remove(&key) {
            Ok(false)
        } else {
            self.completed.insert(key);
            Ok(true)
        }
    }

    pub fn go_to(&mut self, step_idx: usize) -> Result<(), SetError> {
        if step_idx >= self.steps.len() {
            return Err(SetError::OutOfRange(step_idx));
        }
        self.current = step_idx;
        Ok(())
    }

    pub fn next(&mut self) {
        self.current = clamp_step_index(self.current + 1, self.steps.len());
    }

    pub fn previous(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    /// Changes a target of an exercise, honoring the linked mode of the session.
    pub fn update_rep(
        &mut self,
        exercise_idx: usize,
        rep_idx: usize,
        delta: i32,
    ) -> Result<u32, SetError> {
        let linked = self.linked;
        let value = self
            .exercise_mut(exercise_idx)?
            .update_rep(rep_idx, delta, linked)?;
        self.rebuild();
        Ok(value)
    }

    pub fn set_rep(
        &mut self,
        exercise_idx: usize,
        rep_idx: usize,
        value: u32,
    ) -> Result<(), SetError> {
        let linked = self.linked;
        self.exercise_mut(exercise_idx)?.set_rep(rep_idx, value, linked)?;
        self.rebuild();
        Ok(())
    }

    pub fn add_set(&mut self, exercise_idx: usize) -> Result<(), SetError> {
        self.exercise_mut(exercise_idx)?.add_set();
        self.rebuild();
        Ok(())
    }

    /// Removes a set. Completion of later sets of the same exercise moves along with them.
    pub fn remove_set(&mut self, exercise_idx: usize, set_idx: usize) -> Result<(), SetError> {
        self.exercise_mut(exercise_idx)?.remove_set(set_idx)?;
        self.completed = std::mem::take(&mut self.completed)
            .into_iter()
            .filter_map(|key| {
                if key.exercise_idx != exercise_idx || key.set_idx < set_idx {
                    Some(key)
                } else if key.set_idx == set_idx {
                    None
                } else {
                    Some(StepKey {
                        set_idx: key.set_idx - 1,
                        ..key
                    })
                }
            })
            .collect();
        self.rebuild();
        Ok(())
    }

    fn exercise_mut(&mut self, exercise_idx: usize) -> Result<&mut SessionExercise, SetError> {
        self.exercises
            .get_mut(exercise_idx)
            .ok_or(SetError::OutOfRange(exercise_idx))
    }

    fn rebuild(&mut self) {
        self.steps = build_steps(&self.exercises);
        self.current = clamp_step_index(self.current, self.steps.len());
    }

    #[must_use]
    pub fn total_sets(&self) -> u32 {
        u32::try_from(self.completed.len()).unwrap_or(u32::MAX)
    }

    /// Sum of the targets of the completed steps.
    #[must_use]
    pub fn total_reps(&self) -> u32 {
        self.steps
            .iter()
            .filter(|s| self.completed.contains(&s.key()))
            .map(|s| s.target)
            .sum()
    }

    #[must_use]
    pub fn exercise_ids(&self) -> BTreeSet<ExerciseID> {
        self.exercises.iter().map(|e| e.exercise_id).collect()
    }

    /// Snapshot of what has been done so far. The session stays usable.
    #[must_use]
    pub fn performance(&self, elapsed_seconds: u64) -> Performance {
        Performance {
            elapsed_seconds,
            exercises: self.exercises.clone(),
            completed_sets: self.completed.clone(),
        }
    }

    #[must_use]
    pub fn finish(self, elapsed_seconds: u64) -> Performance {
        Performance {
            elapsed_seconds,
            exercises: self.exercises,
            completed_sets: self.completed,
        }
    }
}
