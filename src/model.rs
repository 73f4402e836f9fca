// src/model.rs
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// One prescribed exercise inside a workout template.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExerciseTemplate {
    pub name: String,
    pub sets: u32,
    pub reps_min: u32,
    pub reps_max: u32, // Not validated against reps_min
    pub rest_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<f64>,
}

impl ExerciseTemplate {
    pub fn new(name: &str, sets: u32, reps_min: u32, reps_max: u32, rest_seconds: u32) -> Self {
        Self {
            name: name.to_string(),
            sets,
            reps_min,
            reps_max,
            rest_seconds,
            notes: None,
            target_weight: None,
        }
    }

    #[must_use]
    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    /// `3×8-10 • 90s`
    pub fn prescription(&self) -> String {
        format!(
            "{}×{}-{} • {}s",
            self.sets, self.reps_min, self.reps_max, self.rest_seconds
        )
    }
}

/// Warmup or cooldown cardio block.
///
/// `activity` is free text. [`CardioActivity`] only lists suggestions, any
/// string is accepted here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CardioSpec {
    pub activity: String,
    pub duration: u32, // minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resistance: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incline: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_heart_rate: Option<u32>,
    // Only recorded during a session, templates leave these empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
}

impl CardioSpec {
    pub fn new(activity: &str, duration: u32) -> Self {
        Self {
            activity: activity.to_string(),
            duration,
            resistance: None,
            incline: None,
            avg_heart_rate: None,
            distance: None,
            calories: None,
        }
    }

    #[must_use]
    pub const fn with_levels(mut self, resistance: u32, incline: u32) -> Self {
        self.resistance = Some(resistance);
        self.incline = Some(incline);
        self
    }
}

/// Suggested warmup/cooldown activities offered by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum CardioActivity {
    Elliptical,
    Treadmill,
    Rowing,
    Bike,
    Stairmaster,
    Walk,
    Jog,
    #[strum(serialize = "Jump rope")]
    JumpRope,
    Swimming,
    #[strum(serialize = "Dynamic stretching")]
    DynamicStretching,
    #[strum(serialize = "Joint mobility")]
    JointMobility,
    #[strum(serialize = "Activation exercises")]
    ActivationExercises,
    #[strum(serialize = "Band work")]
    BandWork,
    #[strum(serialize = "Foam rolling")]
    FoamRolling,
    #[strum(serialize = "Massage gun")]
    MassageGun,
    #[strum(serialize = "Shadow boxing")]
    ShadowBoxing,
    #[strum(serialize = "Sport drills")]
    SportDrills,
    #[strum(serialize = "Agility ladder")]
    AgilityLadder,
}

impl CardioActivity {
    /// Machines that have resistance/incline settings.
    pub const fn uses_machine_levels(self) -> bool {
        matches!(
            self,
            Self::Elliptical | Self::Treadmill | Self::Rowing | Self::Bike | Self::Stairmaster
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkoutTemplate {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub estimated_duration: u32, // minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup: Option<CardioSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<CardioSpec>,
    #[serde(default)]
    pub exercises: Vec<ExerciseTemplate>,
}

impl WorkoutTemplate {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            estimated_duration: 60,
            tags: None,
            warmup: None,
            cooldown: None,
            exercises: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExerciseSet {
    pub set_number: u32,
    pub weight: f64,
    pub reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpe: Option<u8>, // 1-10, advisory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_time: Option<u32>,
    pub completed: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Exercise {
    pub name: String,
    pub sets: Vec<ExerciseSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Values supplied when a set is logged; numbering and completion are assigned
/// by [`WorkoutSession::record_set`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SetEntry {
    pub weight: f64,
    pub reps: u32,
    pub rpe: Option<u8>,
    pub heart_rate: Option<u32>,
    pub rest_time: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkoutSession {
    pub date: String, // YYYY-MM-DD
    pub program: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup: Option<CardioSpec>,
    pub exercises: Vec<Exercise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<CardioSpec>,
    pub duration: u32, // minutes, fixed on finish
    pub total_sets: u32,
    pub total_volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl WorkoutSession {
    pub fn new(date: &str, program: &str) -> Self {
        Self {
            date: date.to_string(),
            program: program.to_string(),
            warmup: None,
            exercises: Vec::new(),
            cooldown: None,
            duration: 0,
            total_sets: 0,
            total_volume: 0.0,
            notes: None,
        }
    }

    pub fn exercise(&self, name: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.name == name)
    }

    /// Appends a completed set to `exercise_name`, creating the exercise on
    /// first use, and updates the running totals in the same step.
    pub fn record_set(&mut self, exercise_name: &str, entry: SetEntry) -> &ExerciseSet {
        let index = match self.exercises.iter().position(|e| e.name == exercise_name) {
            Some(i) => i,
            None => {
                self.exercises.push(Exercise {
                    name: exercise_name.to_string(),
                    sets: Vec::new(),
                    notes: None,
                });
                self.exercises.len() - 1
            }
        };

        let exercise = &mut self.exercises[index];
        let set_number = u32::try_from(exercise.sets.len()).unwrap_or(u32::MAX - 1) + 1;
        exercise.sets.push(ExerciseSet {
            set_number,
            weight: entry.weight,
            reps: entry.reps,
            rpe: entry.rpe,
            heart_rate: entry.heart_rate,
            rest_time: entry.rest_time,
            completed: true,
        });

        self.total_sets += 1;
        self.total_volume += entry.weight * f64::from(entry.reps);

        &self.exercises[index].sets[self.exercises[index].sets.len() - 1]
    }
}
