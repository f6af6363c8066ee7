//! Workout session - per-set progress, completion and the saved summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};
use crate::timer::CardioOption;

/// Exercise definition as handed over by a program source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSpec {
    pub name: String,
    pub sets: u32,
    pub reps: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub media_ref: Option<String>,
}

impl ExerciseSpec {
    pub fn new(name: &str, sets: u32, reps: &str) -> Self {
        Self {
            name: name.to_string(),
            sets,
            reps: reps.to_string(),
            description: String::new(),
            media_ref: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

/// Live state of one exercise in the active session
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseProgress {
    pub exercise_id: u32,
    pub name: String,
    pub reps: String,
    pub description: String,
    pub media_ref: Option<String>,
    /// Index = set number, length == target sets
    completed_set_flags: Vec<bool>,
}

impl ExerciseProgress {
    pub fn new(exercise_id: u32, spec: ExerciseSpec) -> Self {
        Self {
            exercise_id,
            completed_set_flags: vec![false; spec.sets as usize],
            name: spec.name,
            reps: spec.reps,
            description: spec.description,
            media_ref: spec.media_ref,
        }
    }

    pub fn target_sets(&self) -> u32 {
        self.completed_set_flags.len() as u32
    }

    pub fn flags(&self) -> &[bool] {
        &self.completed_set_flags
    }

    pub fn completed_count(&self) -> u32 {
        self.completed_set_flags.iter().filter(|done| **done).count() as u32
    }

    pub fn is_done(&self) -> bool {
        !self.completed_set_flags.is_empty() && self.completed_set_flags.iter().all(|d| *d)
    }

    /// Flip one set. Returns the new value of that set.
    pub fn toggle(&mut self, set_index: usize) -> Result<bool> {
        let target = self.completed_set_flags.len();
        let flag = self.completed_set_flags.get_mut(set_index).ok_or_else(|| {
            CoreError::invalid(format!("set index {} out of range (0..{})", set_index, target))
        })?;
        *flag = !*flag;
        Ok(*flag)
    }

    /// Change the set count, dropping flags past the new end
    fn resize(&mut self, sets: u32) {
        self.completed_set_flags.resize(sets as usize, false);
    }
}

/// Partial update for an exercise in the session
#[derive(Debug, Clone, Default)]
pub struct ExercisePatch {
    pub name: Option<String>,
    pub sets: Option<u32>,
    pub reps: Option<String>,
    pub description: Option<String>,
    pub media_ref: Option<Option<String>>,
}

/// Per-exercise line of a saved session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSummary {
    pub exercise_name: String,
    pub sets: u32,
    pub reps: String,
    pub description: Option<String>,
    pub media_url: Option<String>,
    pub completed_sets: u32,
}

/// Finalized record of a session, handed to the persistence sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub title: String,
    pub workout_type: String,
    pub notes: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub exercises: Vec<ExerciseSummary>,
}

impl SessionSummary {
    pub fn completed_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.completed_sets).sum()
    }

    pub fn total_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.sets).sum()
    }

    /// Share of sets completed, 0-100
    pub fn completion_percent(&self) -> f32 {
        completion_percent(self.completed_sets(), self.total_sets())
    }
}

/// Descriptive data of a session, fixed at construction
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMeta {
    pub title: String,
    pub workout_type: String,
    pub notes: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl SessionMeta {
    pub fn new(title: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            title: title.to_string(),
            workout_type: workout_type_tag(title),
            notes: None,
            started_at,
        }
    }
}

/// Where completed sessions go
pub trait SessionSink {
    fn save_session(&self, summary: &SessionSummary, user_id: &str) -> Result<i64>;
}

/// A workout ready to be executed, as loaded from a program source
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedWorkout {
    pub title: String,
    pub workout_type: String,
    pub exercises: Vec<ExerciseSpec>,
}

/// Where session exercises come from
pub trait ProgramSource {
    /// Ordered exercises of one program workout
    fn load_workout(&self, workout_id: i64) -> Result<LoadedWorkout>;
}

/// Whole minutes between two instants, rounded, never negative
pub fn duration_minutes(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> i64 {
    let ms = (ended_at - started_at).num_milliseconds().max(0);
    (ms as f64 / 60_000.0).round() as i64
}

pub fn completion_percent(done: u32, total: u32) -> f32 {
    if total == 0 {
        return 0.0;
    }
    done as f32 / total as f32 * 100.0
}

/// Derive the stored type tag from a title: "PUSH WORKOUT" -> "push-workout"
pub fn workout_type_tag(title: &str) -> String {
    let lower = title.to_lowercase();
    let dashed = lower.split_whitespace().collect::<Vec<_>>().join("-");
    dashed.replacen('&', "", 1)
}

/// Reduce live progress into a summary. Pure.
pub fn build_summary(meta: &SessionMeta, exercises: &[ExerciseProgress], ended_at: DateTime<Utc>) -> SessionSummary {
    let exercises = exercises
        .iter()
        .map(|ex| ExerciseSummary {
            exercise_name: ex.name.clone(),
            sets: ex.target_sets(),
            reps: ex.reps.clone(),
            description: Some(ex.description.clone()).filter(|d| !d.is_empty()),
            media_url: ex.media_ref.clone().filter(|m| !m.is_empty()),
            completed_sets: ex.completed_count(),
        })
        .collect();

    SessionSummary {
        title: meta.title.clone(),
        workout_type: meta.workout_type.clone(),
        notes: meta.notes.clone().filter(|n| !n.trim().is_empty()),
        started_at: meta.started_at,
        ended_at,
        duration_minutes: duration_minutes(meta.started_at, ended_at),
        exercises,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Completed,
}

/// Result of `WorkoutSession::finish`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishOutcome {
    Saved(i64),
    /// Session was already completed; nothing was sent
    AlreadyCompleted,
}

/// One user's execution of a workout
#[derive(Debug, Clone)]
pub struct WorkoutSession {
    meta: SessionMeta,
    exercises: Vec<ExerciseProgress>,
    state: SessionState,
    summary: Option<SessionSummary>,
}

impl WorkoutSession {
    /// Exercise ids are assigned 1..=n in source order
    pub fn new(title: &str, specs: Vec<ExerciseSpec>, started_at: DateTime<Utc>) -> Self {
        let exercises = specs
            .into_iter()
            .enumerate()
            .map(|(i, spec)| ExerciseProgress::new(i as u32 + 1, spec))
            .collect();

        Self {
            meta: SessionMeta::new(title, started_at),
            exercises,
            state: SessionState::NotStarted,
            summary: None,
        }
    }

    pub fn from_loaded(loaded: LoadedWorkout, started_at: DateTime<Utc>) -> Self {
        let mut session = Self::new(&loaded.title, loaded.exercises, started_at);
        session.meta.workout_type = loaded.workout_type;
        session
    }

    /// Cardio session: one exercise, one set, already checked off
    pub fn cardio(option: CardioOption, minutes: u32, started_at: DateTime<Utc>) -> Self {
        let spec = ExerciseSpec::new(option.exercise_name(), 1, &format!("{} minutes", minutes))
            .with_description(&option.description(minutes));

        let mut session = Self::new("CARDIO WORKOUT", vec![spec], started_at);
        session.meta.workout_type = "cardio".to_string();
        if let Some(ex) = session.exercises.first_mut() {
            ex.completed_set_flags[0] = true;
        }
        session
    }

    pub fn meta(&self) -> &SessionMeta {
        &self.meta
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn exercises(&self) -> &[ExerciseProgress] {
        &self.exercises
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.meta.notes = Some(notes.to_string());
    }

    /// Any user interaction moves a fresh session to in-progress
    pub fn touch(&mut self) {
        if self.state == SessionState::NotStarted {
            debug!("Session '{}' in progress", self.meta.title);
            self.state = SessionState::InProgress;
        }
    }

    fn exercise(&self, exercise_id: u32) -> Result<&ExerciseProgress> {
        self.exercises
            .iter()
            .find(|e| e.exercise_id == exercise_id)
            .ok_or(CoreError::UnknownExercise(exercise_id))
    }

    fn exercise_mut(&mut self, exercise_id: u32) -> Result<&mut ExerciseProgress> {
        self.exercises
            .iter_mut()
            .find(|e| e.exercise_id == exercise_id)
            .ok_or(CoreError::UnknownExercise(exercise_id))
    }

    /// Flip one set checkbox. After completion the flip is kept but the
    /// produced summary does not change.
    pub fn toggle_set(&mut self, exercise_id: u32, set_index: usize) -> Result<bool> {
        let value = self.exercise_mut(exercise_id)?.toggle(set_index)?;
        if self.state == SessionState::Completed {
            debug!("Set toggled after completion, summary unchanged");
        }
        self.touch();
        Ok(value)
    }

    pub fn completed_count(&self, exercise_id: u32) -> Result<u32> {
        Ok(self.exercise(exercise_id)?.completed_count())
    }

    /// Append an exercise. Returns its id (max existing id + 1).
    pub fn add_exercise(&mut self, spec: ExerciseSpec) -> Result<u32> {
        if spec.name.trim().is_empty() {
            return Err(CoreError::invalid("exercise name is required"));
        }
        if spec.sets == 0 {
            return Err(CoreError::invalid("exercise needs at least one set"));
        }
        let id = self.exercises.iter().map(|e| e.exercise_id).max().unwrap_or(0) + 1;
        self.exercises.push(ExerciseProgress::new(id, spec));
        self.touch();
        Ok(id)
    }

    pub fn update_exercise(&mut self, exercise_id: u32, patch: ExercisePatch) -> Result<()> {
        if patch.sets == Some(0) {
            return Err(CoreError::invalid("exercise needs at least one set"));
        }
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(CoreError::invalid("exercise name is required"));
        }

        let ex = self.exercise_mut(exercise_id)?;
        if let Some(name) = patch.name {
            ex.name = name;
        }
        if let Some(sets) = patch.sets {
            ex.resize(sets);
        }
        if let Some(reps) = patch.reps {
            ex.reps = reps;
        }
        if let Some(description) = patch.description {
            ex.description = description;
        }
        if let Some(media) = patch.media_ref {
            ex.media_ref = media;
        }
        self.touch();
        Ok(())
    }

    /// Remove an exercise together with its completion flags
    pub fn delete_exercise(&mut self, exercise_id: u32) -> Result<()> {
        let before = self.exercises.len();
        self.exercises.retain(|e| e.exercise_id != exercise_id);
        if self.exercises.len() == before {
            return Err(CoreError::UnknownExercise(exercise_id));
        }
        self.touch();
        Ok(())
    }

    /// Summary as it would be saved right now. Does not change state; once
    /// completed, this is the saved summary.
    pub fn preview_summary(&self, ended_at: DateTime<Utc>) -> SessionSummary {
        match &self.summary {
            Some(existing) => existing.clone(),
            None => build_summary(&self.meta, &self.exercises, ended_at),
        }
    }

    /// Produce the summary. Once completed, later calls return the same summary.
    /// Only `finish` moves a session to completed, so the summary always
    /// reaches the sink.
    fn complete(&mut self, ended_at: DateTime<Utc>) -> &SessionSummary {
        let summary = match self.summary.take() {
            Some(existing) => existing,
            None => {
                let summary = build_summary(&self.meta, &self.exercises, ended_at);
                info!(
                    "Session '{}' completed: {}/{} sets in {} min",
                    summary.title,
                    summary.completed_sets(),
                    summary.total_sets(),
                    summary.duration_minutes
                );
                summary
            }
        };
        self.state = SessionState::Completed;
        self.summary.insert(summary)
    }

    /// Complete the session and hand the summary to `sink`.
    ///
    /// A failed save is reported once and not retried. The session stays
    /// completed unless `rollback_on_failure` is set, in which case it returns
    /// to in-progress and the summary is discarded.
    pub fn finish<S: SessionSink + ?Sized>(
        &mut self,
        sink: &S,
        user_id: &str,
        ended_at: DateTime<Utc>,
        rollback_on_failure: bool,
    ) -> Result<FinishOutcome> {
        if self.state == SessionState::Completed {
            debug!("Finish requested on completed session, ignoring");
            return Ok(FinishOutcome::AlreadyCompleted);
        }

        let summary = self.complete(ended_at).clone();
        match sink.save_session(&summary, user_id) {
            Ok(id) => {
                info!("Session saved (id: {})", id);
                Ok(FinishOutcome::Saved(id))
            }
            Err(e) => {
                warn!("Failed to save session: {}", e);
                if rollback_on_failure {
                    self.summary = None;
                    self.state = SessionState::InProgress;
                }
                Err(match e {
                    CoreError::PersistenceFailure(msg) => CoreError::PersistenceFailure(msg),
                    other => CoreError::PersistenceFailure(other.to_string()),
                })
            }
        }
    }
}
