// src/session.rs
use crate::model::{CardioSpec, ExerciseSet, ExerciseTemplate, SetEntry, WorkoutSession, WorkoutTemplate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const ACTIVE_WORKOUT_FILE: &str = "active_workout.json";
pub const CUSTOM_PROGRAM_NAME: &str = "Custom workout";

#[derive(Error, Debug)]
pub enum Error {
    #[error("No workout in progress. Start one with 'start'.")]
    NoActiveWorkout,
    #[error("A workout is already in progress: '{0}'. Finish or discard it first.")]
    AlreadyActive(String),
    #[error("Exercise name cannot be empty.")]
    EmptyExerciseName,
    #[error("Reps must be greater than zero.")]
    InvalidReps,
    #[error("Weight cannot be negative: {0}")]
    InvalidWeight(f64),
    #[error("No exercise '{0}' has been logged in this workout.")]
    ExerciseNotLogged(String),
    #[error("I/O error accessing active workout file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read active workout file (JSON): {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CardioPhase {
    Warmup,
    Cooldown,
}

/// A set as typed by the user. The rest time falls back to the plan, then to
/// the configured default.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SetInput {
    pub weight: f64,
    pub reps: u32,
    pub rpe: Option<u8>,
    pub heart_rate: Option<u32>,
    pub rest_seconds: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanProgress {
    pub position: usize, // 1-based
    pub exercise: ExerciseTemplate,
    pub completed_sets: usize,
}

impl PlanProgress {
    pub fn is_complete(&self) -> bool {
        self.completed_sets >= self.exercise.sets as usize
    }
}

/// The workout currently being tracked, kept between CLI invocations.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActiveWorkout {
    pub session: WorkoutSession,
    pub template_id: Option<String>,
    pub plan: Vec<ExerciseTemplate>,
    pub started_at: DateTime<Utc>,
}

impl ActiveWorkout {
    pub fn from_template(template: &WorkoutTemplate, date: &str, started_at: DateTime<Utc>) -> Self {
        let mut session = WorkoutSession::new(date, &template.name);
        session.warmup.clone_from(&template.warmup);
        session.cooldown.clone_from(&template.cooldown);
        Self {
            session,
            template_id: Some(template.id.clone()),
            plan: template.exercises.clone(),
            started_at,
        }
    }

    pub fn custom(date: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            session: WorkoutSession::new(date, CUSTOM_PROGRAM_NAME),
            template_id: None,
            plan: Vec::new(),
            started_at,
        }
    }

    /// Maps a user identifier to an exercise name: a 1-based plan position,
    /// a plan exercise name (case-insensitive) or, failing both, the trimmed
    /// input as a free-form exercise.
    pub fn resolve_exercise(&self, identifier: &str) -> Result<String, Error> {
        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyExerciseName);
        }
        if let Ok(position) = trimmed.parse::<usize>() {
            if let Some(planned) = position.checked_sub(1).and_then(|i| self.plan.get(i)) {
                return Ok(planned.name.clone());
            }
        }
        if let Some(planned) = self.plan.iter().find(|e| e.name.eq_ignore_ascii_case(trimmed)) {
            return Ok(planned.name.clone());
        }
        // Already-logged free-form exercises match case-insensitively as well.
        if let Some(logged) = self
            .session
            .exercises
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(trimmed))
        {
            return Ok(logged.name.clone());
        }
        Ok(trimmed.to_string())
    }

    pub fn planned(&self, name: &str) -> Option<&ExerciseTemplate> {
        self.plan.iter().find(|e| e.name == name)
    }

    pub fn log_set(
        &mut self,
        identifier: &str,
        input: SetInput,
        default_rest_seconds: u32,
    ) -> Result<(String, ExerciseSet), Error> {
        if input.reps == 0 {
            return Err(Error::InvalidReps);
        }
        if input.weight < 0.0 || !input.weight.is_finite() {
            return Err(Error::InvalidWeight(input.weight));
        }
        let name = self.resolve_exercise(identifier)?;
        let rest = input
            .rest_seconds
            .or_else(|| self.planned(&name).map(|e| e.rest_seconds))
            .unwrap_or(default_rest_seconds);

        let set = self
            .session
            .record_set(
                &name,
                SetEntry {
                    weight: input.weight,
                    reps: input.reps,
                    rpe: input.rpe,
                    heart_rate: input.heart_rate,
                    rest_time: Some(rest),
                },
            )
            .clone();
        Ok((name, set))
    }

    pub fn plan_progress(&self) -> Vec<PlanProgress> {
        self.plan
            .iter()
            .enumerate()
            .map(|(i, planned)| PlanProgress {
                position: i + 1,
                exercise: planned.clone(),
                completed_sets: self
                    .session
                    .exercise(&planned.name)
                    .map_or(0, |e| e.sets.len()),
            })
            .collect()
    }

    pub fn set_cardio(&mut self, phase: CardioPhase, cardio: Option<CardioSpec>) {
        match phase {
            CardioPhase::Warmup => self.session.warmup = cardio,
            CardioPhase::Cooldown => self.session.cooldown = cardio,
        }
    }

    pub fn set_exercise_notes(&mut self, identifier: &str, notes: &str) -> Result<(), Error> {
        let name = self.resolve_exercise(identifier)?;
        let exercise = self
            .session
            .exercises
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or(Error::ExerciseNotLogged(name))?;
        exercise.notes = non_empty(notes);
        Ok(())
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.session.notes = non_empty(notes);
    }

    /// Whole minutes since the workout started.
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> u32 {
        let minutes = (now - self.started_at).num_minutes().max(0);
        u32::try_from(minutes).unwrap_or(u32::MAX)
    }

    /// Fixes the duration and hands the session over for formatting.
    pub fn finish(mut self, duration_override: Option<u32>, now: DateTime<Utc>) -> WorkoutSession {
        self.session.duration = duration_override.unwrap_or_else(|| self.elapsed_minutes(now));
        self.session
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// JSON file holding the in-progress workout.
pub struct ActiveWorkoutFile {
    path: PathBuf,
}

impl ActiveWorkoutFile {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(ACTIVE_WORKOUT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<ActiveWorkout>, Error> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn require(&self) -> Result<ActiveWorkout, Error> {
        self.load()?.ok_or(Error::NoActiveWorkout)
    }

    pub fn save(&self, workout: &ActiveWorkout) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(workout)?)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<bool, Error> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            return Ok(true);
        }
        Ok(false)
    }
}
