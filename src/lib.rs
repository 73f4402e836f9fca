use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};

// --- Declare modules ---
pub mod analysis;
pub mod catalog;
mod config;
pub mod history;
pub mod model;
pub mod note;
pub mod session;
pub mod templates;
pub mod timer;
pub mod vault;

// --- Expose public types ---
pub use analysis::{AnthropicClient, Error as AnalysisError, GenerationRequest, TextGenerator};
pub use catalog::builtin_templates;
pub use config::{
    get_config_path as get_config_path_util, get_data_dir as get_data_dir_util,
    load_config as load_config_util, parse_color, save_config as save_config_util,
    AnalysisConfig, Config, Error as ConfigError, StandardColor, Theme, Units,
};
pub use model::{
    CardioActivity, CardioSpec, Exercise, ExerciseSet, ExerciseTemplate, SetEntry,
    WorkoutSession, WorkoutTemplate,
};
pub use session::{
    ActiveWorkout, ActiveWorkoutFile, CardioPhase, Error as SessionError, PlanProgress, SetInput,
};
pub use templates::{
    InMemoryOverrides, OverrideRepository, SettingsOverrideStore, StoreError, TemplateDraft,
    TemplateError, TemplateManager, TemplateOrigin, TemplatePatch,
};
pub use timer::{format_countdown, RestTimer, TimerOutcome};
pub use vault::{DocumentStore, Error as VaultError, FsVault};

/// Result of logging one set.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedSet {
    pub exercise: String,
    pub set: ExerciseSet,
    pub total_sets: u32,
    pub total_volume: f64,
    /// Prescribed set count when the exercise is part of the template.
    pub planned_sets: Option<u32>,
}

/// A workout written to the vault.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedWorkout {
    pub path: String,
    pub session: WorkoutSession,
}

pub struct AppService {
    pub config: Config,
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
    pub templates: TemplateManager<SettingsOverrideStore>,
    pub vault: FsVault,
    active: ActiveWorkoutFile,
}

impl AppService {
    /// Initializes the application service from the default locations.
    /// # Errors
    /// Returns `anyhow::Error` if config/data path determination or loading fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let data_dir = config::get_data_dir().context("Failed to determine data directory")?;
        Self::open(config_path, data_dir)
    }

    /// Opens the service over an explicit config file and data directory.
    /// # Errors
    /// Returns `anyhow::Error` if the config or the template overrides cannot be loaded.
    pub fn open(config_path: PathBuf, data_dir: PathBuf) -> Result<Self> {
        let mut config = config::load_config(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;
        let templates = TemplateManager::load(SettingsOverrideStore::new(config_path.clone()))
            .context("Failed to load workout templates")?;
        // The template manager owns the override list from here on.
        config.custom_templates.clear();

        let vault_dir = match &config.vault_dir {
            Some(dir) => dir.clone(),
            None => data_dir.join("vault"),
        };

        Ok(Self {
            config,
            config_path,
            active: ActiveWorkoutFile::in_dir(&data_dir),
            data_dir,
            templates,
            vault: FsVault::new(vault_dir),
        })
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn vault_dir(&self) -> &Path {
        self.vault.root()
    }

    /// Saves the current configuration state together with the committed
    /// template overrides.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        let mut snapshot = self.config.clone();
        snapshot.custom_templates = self.templates.overrides().to_vec();
        config::save_config(&self.config_path, &snapshot)
    }

    // --- Settings ---

    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_api_key(&mut self, key: Option<String>) -> Result<(), ConfigError> {
        self.config.api_key = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
        self.save_config()
    }

    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_vault_dir(&mut self, dir: PathBuf) -> Result<(), ConfigError> {
        self.vault = FsVault::new(dir.clone());
        self.config.vault_dir = Some(dir);
        self.save_config()
    }

    /// # Errors
    /// - `ConfigError::EmptyWorkoutsFolder` if the folder is blank.
    /// - `ConfigError` variants if saving fails.
    pub fn set_workouts_folder(&mut self, folder: &str) -> Result<(), ConfigError> {
        let trimmed = folder.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyWorkoutsFolder);
        }
        self.config.workouts_folder = trimmed.to_string();
        self.save_config()
    }

    /// # Errors
    /// - `ConfigError::InvalidRestTime` outside 1..=3600 seconds.
    /// - `ConfigError` variants if saving fails.
    pub fn set_default_rest(&mut self, seconds: u32) -> Result<(), ConfigError> {
        self.config.default_rest_seconds = config::validate_rest_seconds(seconds)?;
        self.save_config()
    }

    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_notifications(&mut self, enabled: bool) -> Result<(), ConfigError> {
        self.config.enable_notifications = enabled;
        self.save_config()
    }

    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_auto_analyze(&mut self, enabled: bool) -> Result<(), ConfigError> {
        self.config.auto_analyze = enabled;
        self.save_config()
    }

    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_units(&mut self, units: Units) -> Result<(), ConfigError> {
        self.config.units = units;
        self.save_config()
    }

    /// # Errors
    /// - `ConfigError::InvalidColor` for unknown color names.
    /// - `ConfigError` variants if saving fails.
    pub fn set_header_color(&mut self, color: &str) -> Result<(), ConfigError> {
        let parsed = parse_color(color)?;
        self.config.theme.header_color = format!("{parsed:?}");
        self.save_config()
    }

    // --- Templates ---

    /// Effective templates with their relation to the built-in catalog.
    pub fn list_templates(&self) -> Vec<(WorkoutTemplate, TemplateOrigin)> {
        self.templates
            .all_templates()
            .into_iter()
            .map(|t| {
                let origin = self.templates.origin(&t.id).unwrap_or(TemplateOrigin::Custom);
                (t, origin)
            })
            .collect()
    }

    /// Resolves a template by id, or by name (case-insensitive) as a fallback.
    pub fn find_template(&self, identifier: &str) -> Option<WorkoutTemplate> {
        let trimmed = identifier.trim();
        self.templates.get_template(trimmed).or_else(|| {
            self.templates
                .all_templates()
                .into_iter()
                .find(|t| t.name.eq_ignore_ascii_case(trimmed))
        })
    }

    /// Opens a draft of an existing template.
    /// # Errors
    /// Returns `anyhow::Error` if the template does not exist.
    pub fn edit_template_draft(&self, identifier: &str) -> Result<TemplateDraft> {
        self.find_template(identifier)
            .map(|t| TemplateDraft::edit(&t))
            .with_context(|| format!("Template '{identifier}' not found"))
    }

    /// Validates and stores a draft.
    /// # Errors
    /// Returns `TemplateError::Validation` for invalid drafts, `TemplateError::Store` if saving fails.
    pub fn save_template(&mut self, draft: &TemplateDraft) -> Result<WorkoutTemplate, TemplateError> {
        self.templates.save_draft(draft)
    }

    /// # Errors
    /// Returns `anyhow::Error` if the template is unknown or saving fails.
    pub fn duplicate_template(&mut self, identifier: &str) -> Result<WorkoutTemplate> {
        let id = self.resolve_template_id(identifier)?;
        self.templates
            .duplicate_template(&id)
            .with_context(|| format!("Failed to duplicate template '{id}'"))?
            .with_context(|| format!("Template '{identifier}' not found"))
    }

    /// Deletes a custom template. Built-ins are reset instead of deleted.
    /// # Errors
    /// Returns `anyhow::Error` if the template is unknown, is an unmodified built-in, or saving fails.
    pub fn delete_template(&mut self, identifier: &str) -> Result<WorkoutTemplate> {
        let id = self.resolve_template_id(identifier)?;
        let template = self
            .templates
            .get_template(&id)
            .with_context(|| format!("Template '{identifier}' not found"))?;
        if self.templates.is_default_template(&id) && !self.templates.is_modified_default(&id) {
            bail!("'{}' is a built-in template and cannot be deleted.", template.name);
        }
        self.templates
            .delete_template(&id)
            .with_context(|| format!("Failed to delete template '{id}'"))?;
        Ok(template)
    }

    /// # Errors
    /// Returns `anyhow::Error` if saving fails.
    pub fn reset_template(&mut self, identifier: &str) -> Result<bool> {
        let id = self
            .resolve_template_id(identifier)
            .unwrap_or_else(|_| identifier.trim().to_string());
        self.templates
            .reset_to_default(&id)
            .with_context(|| format!("Failed to reset template '{id}'"))
    }

    fn resolve_template_id(&self, identifier: &str) -> Result<String> {
        self.find_template(identifier)
            .map(|t| t.id)
            .with_context(|| format!("Template '{identifier}' not found"))
    }

    // --- Workout session ---

    /// # Errors
    /// Returns `anyhow::Error` if the active workout file cannot be read.
    pub fn active_workout(&self) -> Result<Option<ActiveWorkout>> {
        self.active
            .load()
            .context("Failed to read the workout in progress")
    }

    /// Starts a workout from a template (or an empty one) and stores it as
    /// the workout in progress.
    /// # Errors
    /// Returns `anyhow::Error` if a workout is already active, the template is unknown or saving fails.
    pub fn start_workout(
        &mut self,
        template: Option<&str>,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<ActiveWorkout> {
        if let Some(current) = self.active_workout()? {
            bail!(SessionError::AlreadyActive(current.session.program));
        }
        let date = date.format("%Y-%m-%d").to_string();

        let workout = match template {
            Some(identifier) => {
                let template = self
                    .find_template(identifier)
                    .with_context(|| format!("Template '{identifier}' not found"))?;
                let mut workout = ActiveWorkout::from_template(&template, &date, now);
                self.prefill_target_weights(&mut workout.plan);
                workout
            }
            None => ActiveWorkout::custom(&date, now),
        };

        self.active
            .save(&workout)
            .context("Failed to save the workout in progress")?;
        tracing::info!("Started workout '{}'", workout.session.program);
        Ok(workout)
    }

    /// Fills missing target weights with the last weight logged in earlier notes.
    fn prefill_target_weights(&self, plan: &mut [ExerciseTemplate]) {
        let documents = match analysis::gather_workouts(&self.vault, &self.config.workouts_folder) {
            Ok(docs) => docs,
            Err(e) => {
                tracing::debug!("Skipping target weight lookup: {e}");
                return;
            }
        };
        let last = history::last_weights(documents.iter().map(String::as_str));
        for exercise in plan.iter_mut().filter(|e| e.target_weight.is_none()) {
            exercise.target_weight = last.get(&exercise.name).copied();
        }
    }

    /// Records a completed set in the workout in progress.
    /// # Errors
    /// Returns `anyhow::Error` if no workout is active, the input is invalid or saving fails.
    pub fn log_set(&mut self, exercise: &str, input: SetInput) -> Result<LoggedSet> {
        let mut workout = self.active.require()?;
        let (name, set) = workout.log_set(exercise, input, self.config.default_rest_seconds)?;
        self.active
            .save(&workout)
            .context("Failed to save the workout in progress")?;
        Ok(LoggedSet {
            planned_sets: workout.planned(&name).map(|e| e.sets),
            exercise: name,
            set,
            total_sets: workout.session.total_sets,
            total_volume: workout.session.total_volume,
        })
    }

    /// Sets or clears the warmup/cooldown of the workout in progress.
    /// # Errors
    /// Returns `anyhow::Error` if no workout is active or saving fails.
    pub fn set_cardio(&mut self, phase: CardioPhase, cardio: Option<CardioSpec>) -> Result<()> {
        self.update_active(|w| {
            w.set_cardio(phase, cardio);
            Ok(())
        })
    }

    /// # Errors
    /// Returns `anyhow::Error` if no workout is active, the exercise has no sets yet or saving fails.
    pub fn set_exercise_notes(&mut self, exercise: &str, notes: &str) -> Result<()> {
        self.update_active(|w| w.set_exercise_notes(exercise, notes))
    }

    /// # Errors
    /// Returns `anyhow::Error` if no workout is active or saving fails.
    pub fn set_workout_notes(&mut self, notes: &str) -> Result<()> {
        self.update_active(|w| {
            w.set_notes(notes);
            Ok(())
        })
    }

    fn update_active(
        &mut self,
        change: impl FnOnce(&mut ActiveWorkout) -> Result<(), SessionError>,
    ) -> Result<()> {
        let mut workout = self.active.require()?;
        change(&mut workout)?;
        self.active
            .save(&workout)
            .context("Failed to save the workout in progress")
    }

    /// Writes the workout in progress as a note and clears it.
    /// # Errors
    /// Returns `anyhow::Error` if no workout is active or the note cannot be written.
    /// The workout stays in progress when writing fails.
    pub fn finish_workout(
        &mut self,
        duration: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<FinishedWorkout> {
        let workout = self.active.require()?;
        let session = workout.finish(duration, now);
        let text = note::format_note(&session, self.config.units);

        let folder = self.config.workouts_folder.clone();
        if !self.vault.folder_exists(&folder) {
            self.vault
                .create_folder(&folder)
                .with_context(|| format!("Failed to create folder '{folder}'"))?;
        }

        let mut n = 1;
        let path = loop {
            let candidate = format!("{folder}/{}", note::numbered_file_name(&session, n));
            if !self.vault.exists(&candidate) {
                break candidate;
            }
            n += 1;
        };
        self.vault
            .create(&path, &text)
            .with_context(|| format!("Failed to write workout note '{path}'"))?;
        self.active
            .clear()
            .context("Workout saved, but the in-progress file could not be removed")?;

        Ok(FinishedWorkout { path, session })
    }

    /// Drops the workout in progress without writing it.
    /// # Errors
    /// Returns `anyhow::Error` if the file cannot be removed.
    pub fn discard_workout(&mut self) -> Result<bool> {
        self.active
            .clear()
            .context("Failed to discard the workout in progress")
    }

    // --- Analysis ---

    /// Analyzes past workout notes with the configured service.
    /// # Errors
    /// Returns `AnalysisError` for a missing key, no notes, or a failed request.
    pub fn analyze_workouts(&self, into: Option<&str>) -> Result<String, AnalysisError> {
        let key = self.config.api_key().ok_or(AnalysisError::MissingApiKey)?;
        let client = AnthropicClient::new(&self.config.analysis.endpoint, key)?;
        self.analyze_workouts_with(&client, into)
    }

    /// Same as [`Self::analyze_workouts`] with an explicit generator. When
    /// `into` names a note, the analysis is appended to it.
    /// # Errors
    /// Returns `AnalysisError` for a missing key, no notes, a failed request, or a failed append.
    pub fn analyze_workouts_with(
        &self,
        generator: &dyn TextGenerator,
        into: Option<&str>,
    ) -> Result<String, AnalysisError> {
        if self.config.api_key().is_none() {
            return Err(AnalysisError::MissingApiKey);
        }
        if let Some(target) = into {
            // Fail before the remote call rather than after it.
            if !self.vault.exists(target) {
                return Err(VaultError::NotFound(target.to_string()).into());
            }
        }
        let analysis = analysis::analyze(
            &self.vault,
            &self.config.workouts_folder,
            self.config.api_key(),
            &self.config.analysis,
            generator,
        )?;
        if let Some(target) = into {
            self.vault
                .append(target, &note::analysis_section(&analysis))?;
        }
        Ok(analysis)
    }
}
