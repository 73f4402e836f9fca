use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use std::path::PathBuf;
use tempfile::TempDir;
use workout_notes_lib::{
    AnalysisError, AppService, ConfigError, DocumentStore, ExerciseTemplate, GenerationRequest,
    SetInput, TemplateDraft, TemplateError, TemplateOrigin, TextGenerator, Units, VaultError,
};

struct CannedGenerator(&'static str);

impl TextGenerator for CannedGenerator {
    fn generate(&self, _request: &GenerationRequest) -> Result<String, AnalysisError> {
        Ok(self.0.to_string())
    }
}

fn paths(dir: &TempDir) -> (PathBuf, PathBuf) {
    (
        dir.path().join("config").join("config.toml"),
        dir.path().join("data"),
    )
}

// Helper function to create a service over temporary config and data directories
fn create_test_service() -> Result<(TempDir, AppService)> {
    let dir = tempfile::tempdir()?;
    let (config_path, data_dir) = paths(&dir);
    let service = AppService::open(config_path, data_dir)?;
    Ok((dir, service))
}

fn reopen(dir: &TempDir) -> Result<AppService> {
    let (config_path, data_dir) = paths(dir);
    AppService::open(config_path, data_dir)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn set(weight: f64, reps: u32) -> SetInput {
    SetInput {
        weight,
        reps,
        ..SetInput::default()
    }
}

#[test]
fn test_defaults_written_on_first_open() -> Result<()> {
    let (dir, service) = create_test_service()?;

    assert!(service.get_config_path().exists());
    assert_eq!(service.config.workouts_folder, "Workouts");
    assert_eq!(service.config.default_rest_seconds, 90);
    assert!(service.config.enable_notifications);
    assert!(!service.config.auto_analyze);
    assert_eq!(service.config.units, Units::Metric);
    assert_eq!(service.vault_dir(), dir.path().join("data").join("vault"));
    assert_eq!(service.list_templates().len(), 5);
    assert!(service
        .list_templates()
        .iter()
        .all(|(_, origin)| *origin == TemplateOrigin::BuiltIn));
    Ok(())
}

#[test]
fn test_full_workout_writes_note() -> Result<()> {
    let (_dir, mut service) = create_test_service()?;
    let started = Utc::now();

    // Template names resolve case-insensitively
    let workout = service.start_workout(Some("day 1 - back and biceps"), day(1), started)?;
    assert_eq!(workout.session.program, "Day 1 - Back and Biceps");
    assert!(service.active_workout()?.is_some());

    let first = service.log_set("1", set(60.0, 10))?;
    assert_eq!(first.exercise, "Bent Over Row (Barbell)");
    assert_eq!(first.planned_sets, Some(3));
    assert_eq!(first.set.rest_time, Some(90));
    let second = service.log_set("Bent Over Row (Barbell)", set(62.5, 8))?;
    assert_eq!(second.set.set_number, 2);
    assert_eq!(second.total_sets, 2);
    assert!((second.total_volume - 1100.0).abs() < f64::EPSILON);

    service.set_exercise_notes("1", "Strict form")?;
    service.set_workout_notes("Felt strong")?;

    let finished = service.finish_workout(Some(55), started + Duration::minutes(70))?;
    assert_eq!(
        finished.path,
        "Workouts/2024-03-01 - Day 1 - Back and Biceps.md"
    );
    assert_eq!(finished.session.duration, 55);
    assert!(service.active_workout()?.is_none());

    let note = service.vault.read(&finished.path)?;
    assert!(note.contains("totalSets: 2\n"));
    assert!(note.contains("totalVolume: 1100\n"));
    assert!(note.contains("## 🏃 Warmup"));
    assert!(note.contains("| 2 | 62.5 | 8 | - | - | 90 |"));
    assert!(note.contains("*Notes:* Strict form"));
    assert!(note.contains("## 📝 Notes\n\nFelt strong"));
    Ok(())
}

#[test]
fn test_only_one_active_workout() -> Result<()> {
    let (_dir, mut service) = create_test_service()?;
    service.start_workout(None, day(1), Utc::now())?;

    let err = service
        .start_workout(Some("quick-upper"), day(1), Utc::now())
        .unwrap_err();
    assert!(err.to_string().contains("already in progress"));

    assert!(service.discard_workout()?);
    assert!(!service.discard_workout()?);
    service.start_workout(Some("quick-upper"), day(1), Utc::now())?;
    Ok(())
}

#[test]
fn test_session_commands_need_active_workout() -> Result<()> {
    let (_dir, mut service) = create_test_service()?;

    assert!(service.log_set("Squat", set(100.0, 5)).is_err());
    assert!(service.set_workout_notes("x").is_err());
    assert!(service.finish_workout(None, Utc::now()).is_err());
    assert!(service.start_workout(Some("no such template"), day(1), Utc::now()).is_err());
    assert!(service.active_workout()?.is_none());
    Ok(())
}

#[test]
fn test_same_day_notes_are_numbered() -> Result<()> {
    let (_dir, mut service) = create_test_service()?;

    let mut written = Vec::new();
    for _ in 0..3 {
        service.start_workout(None, day(2), Utc::now())?;
        service.log_set("Dips", set(0.0, 12))?;
        written.push(service.finish_workout(Some(10), Utc::now())?.path);
    }

    assert_eq!(
        written,
        vec![
            "Workouts/2024-03-02 - Custom workout.md",
            "Workouts/2024-03-02 - Custom workout (2).md",
            "Workouts/2024-03-02 - Custom workout (3).md",
        ]
    );
    Ok(())
}

#[test]
fn test_target_weights_prefilled_from_history() -> Result<()> {
    let (_dir, mut service) = create_test_service()?;

    service.start_workout(Some("quick-upper"), day(1), Utc::now())?;
    service.log_set("Dumbbell Row", set(20.0, 12))?;
    service.log_set("Dumbbell Row", set(22.5, 12))?;
    service.finish_workout(Some(30), Utc::now())?;

    let workout = service.start_workout(Some("quick-upper"), day(3), Utc::now())?;
    let row = workout
        .plan
        .iter()
        .find(|e| e.name == "Dumbbell Row")
        .expect("planned exercise");
    assert_eq!(row.target_weight, Some(22.5));
    let push_ups = workout
        .plan
        .iter()
        .find(|e| e.name == "Push-ups")
        .expect("planned exercise");
    assert_eq!(push_ups.target_weight, None);
    Ok(())
}

#[test]
fn test_later_same_day_workout_wins_prefill() -> Result<()> {
    let (_dir, mut service) = create_test_service()?;

    for weight in [20.0, 25.0] {
        service.start_workout(Some("quick-upper"), day(1), Utc::now())?;
        service.log_set("Dumbbell Row", set(weight, 12))?;
        service.finish_workout(Some(30), Utc::now())?;
    }

    let workout = service.start_workout(Some("quick-upper"), day(2), Utc::now())?;
    let row = workout
        .plan
        .iter()
        .find(|e| e.name == "Dumbbell Row")
        .expect("planned exercise");
    assert_eq!(row.target_weight, Some(25.0));
    Ok(())
}

#[test]
fn test_custom_template_survives_reopen() -> Result<()> {
    let (dir, mut service) = create_test_service()?;

    let mut draft = TemplateDraft::blank(1_700_000_000_000);
    draft.template.name = "Arms".to_string();
    draft.add_exercise(ExerciseTemplate::new("Curl", 3, 10, 12, 60));
    let saved = service.save_template(&draft)?;
    assert_eq!(saved.id, "custom-1700000000000");

    // Scalar settings written afterwards must not drop the template
    service.set_default_rest(120)?;
    service.set_units(Units::Imperial)?;

    let reopened = reopen(&dir)?;
    assert_eq!(reopened.config.default_rest_seconds, 120);
    assert_eq!(reopened.config.units, Units::Imperial);
    let (template, origin) = reopened
        .list_templates()
        .into_iter()
        .last()
        .expect("templates listed");
    assert_eq!(template.name, "Arms");
    assert_eq!(origin, TemplateOrigin::Custom);
    Ok(())
}

#[test]
fn test_invalid_draft_is_rejected() -> Result<()> {
    let (dir, mut service) = create_test_service()?;

    let mut draft = service.edit_template_draft("quick-lower")?;
    draft.template.exercises.clear();
    let result = service.save_template(&draft);
    assert!(matches!(result, Err(TemplateError::Validation(_))));
    assert_eq!(
        service
            .find_template("quick-lower")
            .map(|t| t.exercises.len()),
        Some(4)
    );
    assert!(reopen(&dir)?.templates.overrides().is_empty());
    Ok(())
}

#[test]
fn test_modify_delete_and_reset_builtins() -> Result<()> {
    let (dir, mut service) = create_test_service()?;

    let err = service.delete_template("quick-lower").unwrap_err();
    assert!(err.to_string().contains("built-in"));

    let mut draft = service.edit_template_draft("Quick Lower Body")?;
    assert_eq!(draft.id(), "quick-lower");
    draft.template.name = "Lower (mine)".to_string();
    service.save_template(&draft)?;
    assert!(service.templates.is_modified_default("quick-lower"));
    assert!(reopen(&dir)?.templates.is_modified_default("quick-lower"));

    // Deleting a modified built-in restores it
    let deleted = service.delete_template("Lower (mine)")?;
    assert_eq!(deleted.id, "quick-lower");
    assert!(!service.templates.is_modified_default("quick-lower"));

    service.save_template(&draft)?;
    assert!(service.reset_template("quick-lower")?);
    assert!(!service.reset_template("quick-lower")?);
    assert!(!reopen(&dir)?.templates.is_modified_default("quick-lower"));
    Ok(())
}

#[test]
fn test_duplicate_and_delete_custom() -> Result<()> {
    let (_dir, mut service) = create_test_service()?;

    let copy = service.duplicate_template("quick-upper")?;
    assert!(copy.id.starts_with("quick-upper-copy-"));
    assert!(copy.name.ends_with(" (Copy)"));
    assert_eq!(service.list_templates().len(), 6);

    let deleted = service.delete_template(&copy.id)?;
    assert_eq!(deleted.id, copy.id);
    assert_eq!(service.list_templates().len(), 5);
    assert!(service.duplicate_template("missing").is_err());
    Ok(())
}

#[test]
fn test_config_validation() -> Result<()> {
    let (_dir, mut service) = create_test_service()?;

    assert!(matches!(
        service.set_default_rest(0),
        Err(ConfigError::InvalidRestTime(0))
    ));
    assert!(matches!(
        service.set_default_rest(4000),
        Err(ConfigError::InvalidRestTime(4000))
    ));
    assert!(matches!(
        service.set_workouts_folder(" / "),
        Err(ConfigError::EmptyWorkoutsFolder)
    ));
    assert!(matches!(
        service.set_header_color("Purple"),
        Err(ConfigError::InvalidColor(_))
    ));

    service.set_workouts_folder("/Training/")?;
    assert_eq!(service.config.workouts_folder, "Training");
    service.set_header_color("darkcyan")?;
    assert_eq!(service.config.theme.header_color, "DarkCyan");
    service.set_api_key(Some("  sk-test  ".to_string()))?;
    assert_eq!(service.config.api_key(), Some("sk-test"));
    service.set_api_key(Some("   ".to_string()))?;
    assert_eq!(service.config.api_key(), None);
    Ok(())
}

#[test]
fn test_analysis_preconditions() -> Result<()> {
    let (_dir, mut service) = create_test_service()?;
    let generator = CannedGenerator("Looking good.");

    assert!(matches!(
        service.analyze_workouts_with(&generator, None),
        Err(AnalysisError::MissingApiKey)
    ));
    assert!(matches!(
        service.analyze_workouts(None),
        Err(AnalysisError::MissingApiKey)
    ));

    service.set_api_key(Some("sk-test".to_string()))?;
    assert!(matches!(
        service.analyze_workouts_with(&generator, None),
        Err(AnalysisError::NoWorkouts(_))
    ));
    assert!(matches!(
        service.analyze_workouts_with(&generator, Some("Workouts/missing.md")),
        Err(AnalysisError::Vault(VaultError::NotFound(_)))
    ));
    Ok(())
}

#[test]
fn test_analysis_appended_to_note() -> Result<()> {
    let (_dir, mut service) = create_test_service()?;
    service.set_api_key(Some("sk-test".to_string()))?;
    service.start_workout(None, day(4), Utc::now())?;
    service.log_set("Squat", set(100.0, 5))?;
    let finished = service.finish_workout(Some(40), Utc::now())?;

    let generator = CannedGenerator("Add more volume.");
    let analysis = service.analyze_workouts_with(&generator, Some(finished.path.as_str()))?;
    assert_eq!(analysis, "Add more volume.");

    let note = service.vault.read(&finished.path)?;
    assert!(note.ends_with("\n\n## 🤖 AI Analysis\n\nAdd more volume.\n\n"));
    Ok(())
}
