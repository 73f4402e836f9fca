// src/templates.rs
//! Effective template set: the built-in catalog with user overrides layered on
//! top. Overrides share the catalog's identifier space, so an override whose
//! id matches a built-in replaces it in place and any other override is a
//! custom template appended after the built-ins.
//!
//! The catalog is never mutated. All writes go to the override list and are
//! committed through an [`OverrideRepository`] before the manager's in-memory
//! copy changes.
use crate::catalog;
use crate::config::{self, Error as ConfigError};
use crate::model::{CardioSpec, ExerciseTemplate, WorkoutTemplate};
use chrono::Utc;
use std::cell::RefCell;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access settings: {0}")]
    Config(#[from] ConfigError),
    #[error("Override store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Invalid template: {0}")]
    Validation(String),
    #[error("Failed to persist templates: {0}")]
    Store(#[from] StoreError),
}

/// Where the override list lives.
pub trait OverrideRepository {
    fn load(&self) -> Result<Vec<WorkoutTemplate>, StoreError>;
    fn commit(&mut self, overrides: &[WorkoutTemplate]) -> Result<(), StoreError>;
}

/// Overrides stored as `custom_templates` inside the settings file.
pub struct SettingsOverrideStore {
    config_path: PathBuf,
}

impl SettingsOverrideStore {
    pub const fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }
}

impl OverrideRepository for SettingsOverrideStore {
    fn load(&self) -> Result<Vec<WorkoutTemplate>, StoreError> {
        Ok(config::load_config(&self.config_path)?.custom_templates)
    }

    fn commit(&mut self, overrides: &[WorkoutTemplate]) -> Result<(), StoreError> {
        // Re-read so scalar preferences written elsewhere are kept.
        let mut settings = config::load_config(&self.config_path)?;
        settings.custom_templates = overrides.to_vec();
        config::save_config(&self.config_path, &settings)?;
        Ok(())
    }
}

/// Override list held in memory. Commits can be made to fail to exercise
/// persistence error paths.
#[derive(Debug, Default)]
pub struct InMemoryOverrides {
    saved: Vec<WorkoutTemplate>,
    commits: usize,
    fail_commits: bool,
}

impl InMemoryOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(saved: Vec<WorkoutTemplate>) -> Self {
        Self {
            saved,
            ..Self::default()
        }
    }

    /// Every later commit returns [`StoreError::Unavailable`].
    pub fn failing(self) -> Self {
        Self {
            fail_commits: true,
            ..self
        }
    }

    pub fn saved(&self) -> &[WorkoutTemplate] {
        &self.saved
    }

    /// Number of successful commits.
    pub fn commits(&self) -> usize {
        self.commits
    }
}

impl OverrideRepository for InMemoryOverrides {
    fn load(&self) -> Result<Vec<WorkoutTemplate>, StoreError> {
        Ok(self.saved.clone())
    }

    fn commit(&mut self, overrides: &[WorkoutTemplate]) -> Result<(), StoreError> {
        if self.fail_commits {
            return Err(StoreError::Unavailable("commit rejected".to_string()));
        }
        self.saved = overrides.to_vec();
        self.commits += 1;
        Ok(())
    }
}

/// How a template in the effective set relates to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateOrigin {
    BuiltIn,
    ModifiedBuiltIn,
    Custom,
}

/// Field-wise replacement for [`TemplateManager::update_template`]. Every
/// `Some` replaces the stored value wholesale; nested values are not merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub warmup: Option<Option<CardioSpec>>,
    pub cooldown: Option<Option<CardioSpec>>,
    pub exercises: Option<Vec<ExerciseTemplate>>,
    pub estimated_duration: Option<u32>,
    pub tags: Option<Option<Vec<String>>>,
}

impl TemplatePatch {
    pub fn apply(self, template: &mut WorkoutTemplate) {
        if let Some(name) = self.name {
            template.name = name;
        }
        if let Some(description) = self.description {
            template.description = description;
        }
        if let Some(warmup) = self.warmup {
            template.warmup = warmup;
        }
        if let Some(cooldown) = self.cooldown {
            template.cooldown = cooldown;
        }
        if let Some(exercises) = self.exercises {
            template.exercises = exercises;
        }
        if let Some(minutes) = self.estimated_duration {
            template.estimated_duration = minutes;
        }
        if let Some(tags) = self.tags {
            template.tags = tags;
        }
    }
}

impl From<WorkoutTemplate> for TemplatePatch {
    /// Patch that overwrites every field except the identifier.
    fn from(t: WorkoutTemplate) -> Self {
        Self {
            name: Some(t.name),
            description: Some(t.description),
            warmup: Some(t.warmup),
            cooldown: Some(t.cooldown),
            exercises: Some(t.exercises),
            estimated_duration: Some(t.estimated_duration),
            tags: Some(t.tags),
        }
    }
}

/// A working copy of a template being edited. Nothing reaches the override
/// store until the draft is passed to [`TemplateManager::save_draft`].
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDraft {
    pub template: WorkoutTemplate,
}

impl TemplateDraft {
    pub fn edit(template: &WorkoutTemplate) -> Self {
        Self {
            template: template.clone(),
        }
    }

    /// Empty custom template with an id derived from `epoch_millis`.
    pub fn blank(epoch_millis: i64) -> Self {
        let mut template = WorkoutTemplate::new(&format!("custom-{epoch_millis}"), "New template");
        template.description = Some(String::new());
        template.tags = Some(Vec::new());
        Self { template }
    }

    pub fn id(&self) -> &str {
        &self.template.id
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.template.name.trim().is_empty() {
            return Err(TemplateError::Validation(
                "Name cannot be empty".to_string(),
            ));
        }
        if self.template.exercises.is_empty() {
            return Err(TemplateError::Validation(
                "Add at least one exercise".to_string(),
            ));
        }
        Ok(())
    }

    pub fn add_exercise(&mut self, exercise: ExerciseTemplate) {
        self.template.exercises.push(exercise);
    }

    /// Removes the exercise at 1-based `position`.
    pub fn remove_exercise(&mut self, position: usize) -> Option<ExerciseTemplate> {
        if position == 0 || position > self.template.exercises.len() {
            return None;
        }
        Some(self.template.exercises.remove(position - 1))
    }
}

type Clock = Box<dyn Fn() -> i64>;

pub struct TemplateManager<R: OverrideRepository> {
    catalog: Vec<WorkoutTemplate>,
    overrides: Vec<WorkoutTemplate>,
    repo: R,
    clock: Clock,
    last_stamp: RefCell<i64>,
}

impl<R: OverrideRepository> TemplateManager<R> {
    /// Manager over the built-in catalog.
    pub fn load(repo: R) -> Result<Self, TemplateError> {
        Self::with_catalog(catalog::builtin_templates().to_vec(), repo)
    }

    pub fn with_catalog(catalog: Vec<WorkoutTemplate>, repo: R) -> Result<Self, TemplateError> {
        let overrides = repo.load()?;
        tracing::debug!(
            "Loaded {} template override(s) over {} built-in(s)",
            overrides.len(),
            catalog.len()
        );
        Ok(Self {
            catalog,
            overrides,
            repo,
            clock: Box::new(|| Utc::now().timestamp_millis()),
            last_stamp: RefCell::new(i64::MIN),
        })
    }

    /// Replaces the millisecond clock used for synthetic identifiers.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn overrides(&self) -> &[WorkoutTemplate] {
        &self.overrides
    }

    pub const fn repository(&self) -> &R {
        &self.repo
    }

    /// Catalog order with overrides replacing built-ins in place, followed by
    /// custom templates in the order they were added. Computed on every call.
    pub fn all_templates(&self) -> Vec<WorkoutTemplate> {
        merge(&self.catalog, &self.overrides)
    }

    pub fn get_template(&self, id: &str) -> Option<WorkoutTemplate> {
        find_effective(&self.catalog, &self.overrides, id).cloned()
    }

    pub fn is_default_template(&self, id: &str) -> bool {
        self.catalog.iter().any(|t| t.id == id)
    }

    pub fn is_modified_default(&self, id: &str) -> bool {
        self.is_default_template(id) && self.override_index(id).is_some()
    }

    pub fn origin(&self, id: &str) -> Option<TemplateOrigin> {
        if self.is_modified_default(id) {
            Some(TemplateOrigin::ModifiedBuiltIn)
        } else if self.is_default_template(id) {
            Some(TemplateOrigin::BuiltIn)
        } else if self.override_index(id).is_some() {
            Some(TemplateOrigin::Custom)
        } else {
            None
        }
    }

    /// Stores `template` as an override and returns it as stored.
    ///
    /// An existing override with the same id is replaced in place. A built-in
    /// id becomes an override of that built-in. Any other id is made unique
    /// against the effective set before it is appended.
    pub fn add_template(
        &mut self,
        mut template: WorkoutTemplate,
    ) -> Result<WorkoutTemplate, TemplateError> {
        let mut next = self.overrides.clone();
        if let Some(index) = self.override_index(&template.id) {
            next[index] = template.clone();
        } else if self.is_default_template(&template.id) {
            next.push(template.clone());
        } else {
            template.id = self.unique_id(&template.id);
            next.push(template.clone());
        }
        self.commit(next)?;
        tracing::info!("Saved template '{}' ({})", template.name, template.id);
        Ok(template)
    }

    /// Applies `patch` to the override for `id`, creating the override from
    /// the built-in when none exists yet. Returns `false` for unknown ids.
    pub fn update_template(&mut self, id: &str, patch: TemplatePatch) -> Result<bool, TemplateError> {
        let mut next = self.overrides.clone();
        if let Some(index) = self.override_index(id) {
            patch.apply(&mut next[index]);
        } else if let Some(builtin) = self.catalog.iter().find(|t| t.id == id) {
            let mut copy = builtin.clone();
            patch.apply(&mut copy);
            copy.id = id.to_string();
            next.push(copy);
        } else {
            tracing::debug!("update_template: unknown id '{id}'");
            return Ok(false);
        }
        self.commit(next)?;
        Ok(true)
    }

    /// Removes the override for `id`. For a built-in this restores the
    /// catalog version, for a custom template it removes it entirely.
    pub fn delete_template(&mut self, id: &str) -> Result<bool, TemplateError> {
        let Some(index) = self.override_index(id) else {
            return Ok(false);
        };
        let mut next = self.overrides.clone();
        next.remove(index);
        self.commit(next)?;
        Ok(true)
    }

    /// Drops the override of a built-in. `false` when `id` is not a built-in
    /// or has no override.
    pub fn reset_to_default(&mut self, id: &str) -> Result<bool, TemplateError> {
        if !self.is_default_template(id) {
            return Ok(false);
        }
        self.delete_template(id)
    }

    /// Copies the effective template `id` under a fresh identifier and a
    /// "(Copy)" name, stored through [`Self::add_template`].
    pub fn duplicate_template(&mut self, id: &str) -> Result<Option<WorkoutTemplate>, TemplateError> {
        let Some(original) = self.get_template(id) else {
            return Ok(None);
        };
        let mut duplicate = original.clone();
        duplicate.id = format!("{}-copy-{}", original.id, self.next_stamp());
        duplicate.name = format!("{} (Copy)", original.name);
        self.add_template(duplicate).map(Some)
    }

    /// Validates and commits an edited draft. On failure the caller still
    /// owns the draft and can correct it.
    pub fn save_draft(&mut self, draft: &TemplateDraft) -> Result<WorkoutTemplate, TemplateError> {
        draft.validate()?;
        let id = draft.id().to_string();
        if self.get_template(&id).is_some() {
            self.update_template(&id, TemplatePatch::from(draft.template.clone()))?;
            self.get_template(&id).ok_or_else(|| {
                TemplateError::Validation(format!("Template '{id}' disappeared during save"))
            })
        } else {
            self.add_template(draft.template.clone())
        }
    }

    fn override_index(&self, id: &str) -> Option<usize> {
        self.overrides.iter().position(|t| t.id == id)
    }

    /// `base` if free, otherwise `<base>-<epoch millis>`, re-checked against
    /// the current effective set until free.
    fn unique_id(&self, base: &str) -> String {
        let mut candidate = base.to_string();
        while find_effective(&self.catalog, &self.overrides, &candidate).is_some() {
            candidate = format!("{base}-{}", self.next_stamp());
        }
        candidate
    }

    fn next_stamp(&self) -> i64 {
        let mut last = self.last_stamp.borrow_mut();
        let now = (self.clock)();
        // A clock that repeats itself must not stall the uniqueness loop.
        let stamp = if now > *last { now } else { *last + 1 };
        *last = stamp;
        stamp
    }

    fn commit(&mut self, next: Vec<WorkoutTemplate>) -> Result<(), TemplateError> {
        self.repo.commit(&next)?;
        tracing::debug!("Committed {} template override(s)", next.len());
        self.overrides = next;
        Ok(())
    }
}

fn merge(catalog: &[WorkoutTemplate], overrides: &[WorkoutTemplate]) -> Vec<WorkoutTemplate> {
    let mut templates = catalog.to_vec();
    for custom in overrides {
        match templates.iter().position(|t| t.id == custom.id) {
            Some(index) => templates[index] = custom.clone(),
            None => templates.push(custom.clone()),
        }
    }
    templates
}

fn find_effective<'a>(
    catalog: &'a [WorkoutTemplate],
    overrides: &'a [WorkoutTemplate],
    id: &str,
) -> Option<&'a WorkoutTemplate> {
    overrides
        .iter()
        .find(|t| t.id == id)
        .or_else(|| catalog.iter().find(|t| t.id == id))
}
