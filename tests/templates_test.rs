use anyhow::Result;
use workout_notes_lib::{
    builtin_templates, CardioSpec, ExerciseTemplate, InMemoryOverrides, TemplateDraft,
    TemplateError, TemplateManager, TemplateOrigin, TemplatePatch, WorkoutTemplate,
};

fn template(id: &str, name: &str) -> WorkoutTemplate {
    let mut t = WorkoutTemplate::new(id, name);
    t.exercises.push(ExerciseTemplate::new("Squat", 3, 8, 10, 90));
    t
}

fn ids(templates: &[WorkoutTemplate]) -> Vec<&str> {
    templates.iter().map(|t| t.id.as_str()).collect()
}

// Manager over a small catalog with a fixed clock.
fn create_test_manager(
    catalog: Vec<WorkoutTemplate>,
) -> Result<TemplateManager<InMemoryOverrides>> {
    Ok(TemplateManager::with_catalog(catalog, InMemoryOverrides::new())?.with_clock(|| 1_000))
}

#[test]
fn test_catalog_only_when_no_overrides() -> Result<()> {
    let manager = create_test_manager(vec![template("a", "A")])?;

    let all = manager.all_templates();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, "a");
    assert_eq!(all[0].name, "A");
    assert_eq!(manager.origin("a"), Some(TemplateOrigin::BuiltIn));
    assert_eq!(manager.origin("missing"), None);
    Ok(())
}

#[test]
fn test_override_then_reset_scenario() -> Result<()> {
    let mut manager = create_test_manager(vec![template("a", "A")])?;

    manager.add_template(template("a", "A2"))?;
    let all = manager.all_templates();
    assert_eq!(ids(&all), vec!["a"]);
    assert_eq!(all[0].name, "A2");
    assert!(manager.is_modified_default("a"));
    assert_eq!(manager.origin("a"), Some(TemplateOrigin::ModifiedBuiltIn));

    assert!(manager.reset_to_default("a")?);
    let all = manager.all_templates();
    assert_eq!(ids(&all), vec!["a"]);
    assert_eq!(all[0].name, "A");
    assert!(!manager.is_modified_default("a"));
    Ok(())
}

#[test]
fn test_add_same_id_twice_is_upsert() -> Result<()> {
    let mut manager = create_test_manager(Vec::new())?;

    manager.add_template(template("x", "X"))?;
    manager.add_template(template("x", "X2"))?;

    let all = manager.all_templates();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, "x");
    assert_eq!(all[0].name, "X2");
    assert_eq!(manager.repository().saved().len(), 1);
    Ok(())
}

#[test]
fn test_override_keeps_catalog_position() -> Result<()> {
    let mut manager =
        create_test_manager(vec![template("a", "A"), template("b", "B"), template("c", "C")])?;

    manager.add_template(template("custom", "Mine"))?;
    manager.add_template(template("b", "B override"))?;

    let all = manager.all_templates();
    assert_eq!(ids(&all), vec!["a", "b", "c", "custom"]);
    assert_eq!(all[1].name, "B override");
    // Catalog itself is untouched
    assert!(manager.is_default_template("b"));
    assert!(!manager.is_default_template("custom"));
    Ok(())
}

#[test]
fn test_new_custom_is_appended() -> Result<()> {
    let mut manager = create_test_manager(vec![template("a", "A"), template("b", "B")])?;
    let before = manager.all_templates();

    let stored = manager.add_template(template("new", "New"))?;
    assert_eq!(stored.id, "new");

    let after = manager.all_templates();
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(&after[..before.len()], &before[..]);
    assert_eq!(after[before.len()].id, "new");
    assert_eq!(manager.origin("new"), Some(TemplateOrigin::Custom));
    Ok(())
}

#[test]
fn test_reset_twice_succeeds_once() -> Result<()> {
    let mut manager = create_test_manager(vec![template("a", "A")])?;
    manager.add_template(template("a", "A2"))?;

    assert!(manager.reset_to_default("a")?);
    assert!(!manager.reset_to_default("a")?);
    Ok(())
}

#[test]
fn test_reset_of_custom_or_unknown_is_soft_failure() -> Result<()> {
    let mut manager = create_test_manager(vec![template("a", "A")])?;
    manager.add_template(template("mine", "Mine"))?;
    let commits = manager.repository().commits();

    assert!(!manager.reset_to_default("mine")?);
    assert!(!manager.reset_to_default("nope")?);
    assert!(manager.get_template("mine").is_some());
    assert_eq!(manager.repository().commits(), commits);
    Ok(())
}

#[test]
fn test_delete_and_reset_agree_for_builtins() -> Result<()> {
    let catalog = vec![template("a", "A"), template("b", "B")];
    let mut deleted = create_test_manager(catalog.clone())?;
    let mut reset = create_test_manager(catalog)?;
    for manager in [&mut deleted, &mut reset] {
        manager.add_template(template("b", "B changed"))?;
        manager.add_template(template("extra", "Extra"))?;
    }

    assert!(deleted.delete_template("b")?);
    assert!(reset.reset_to_default("b")?);
    assert_eq!(deleted.all_templates(), reset.all_templates());
    Ok(())
}

#[test]
fn test_delete_only_persists_on_removal() -> Result<()> {
    let mut manager = create_test_manager(vec![template("a", "A")])?;
    manager.add_template(template("mine", "Mine"))?;
    let commits = manager.repository().commits();

    assert!(!manager.delete_template("a")?);
    assert!(!manager.delete_template("unknown")?);
    assert_eq!(manager.repository().commits(), commits);

    assert!(manager.delete_template("mine")?);
    assert_eq!(manager.repository().commits(), commits + 1);
    assert!(manager.get_template("mine").is_none());
    Ok(())
}

#[test]
fn test_duplicate_gets_fresh_id_and_copy_name() -> Result<()> {
    let mut original = template("a", "A");
    original.description = Some("desc".to_string());
    original.tags = Some(vec!["push".to_string()]);
    original.warmup = Some(CardioSpec::new("Bike", 5));
    let mut manager = create_test_manager(vec![original.clone()])?;

    let before: Vec<String> = manager.all_templates().into_iter().map(|t| t.id).collect();
    let copy = manager.duplicate_template("a")?.expect("template exists");

    assert!(!before.contains(&copy.id));
    assert!(copy.id.starts_with("a-copy"));
    assert_eq!(copy.name, "A (Copy)");
    assert_eq!(copy.description, original.description);
    assert_eq!(copy.tags, original.tags);
    assert_eq!(copy.warmup, original.warmup);
    assert_eq!(copy.exercises, original.exercises);
    assert_eq!(copy.estimated_duration, original.estimated_duration);

    // The original is untouched and the copy is a custom template.
    assert_eq!(manager.get_template("a"), Some(original));
    assert_eq!(manager.origin(&copy.id), Some(TemplateOrigin::Custom));
    Ok(())
}

#[test]
fn test_duplicates_with_repeating_clock_stay_unique() -> Result<()> {
    let mut manager = create_test_manager(vec![template("a", "A")])?;

    let first = manager.duplicate_template("a")?.expect("template exists");
    let second = manager.duplicate_template("a")?.expect("template exists");
    let third = manager.duplicate_template(&first.id)?.expect("copy exists");

    assert_ne!(first.id, second.id);
    assert_ne!(third.id, first.id);
    assert_eq!(third.name, "A (Copy) (Copy)");
    assert_eq!(manager.all_templates().len(), 4);
    Ok(())
}

#[test]
fn test_duplicate_unknown_is_none() -> Result<()> {
    let mut manager = create_test_manager(vec![template("a", "A")])?;
    assert!(manager.duplicate_template("zzz")?.is_none());
    assert_eq!(manager.repository().commits(), 0);
    Ok(())
}

#[test]
fn test_update_builtin_creates_override() -> Result<()> {
    let mut manager = create_test_manager(vec![template("a", "A")])?;

    let patch = TemplatePatch {
        name: Some("Renamed".to_string()),
        estimated_duration: Some(45),
        ..TemplatePatch::default()
    };
    assert!(manager.update_template("a", patch)?);

    let updated = manager.get_template("a").expect("template exists");
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.estimated_duration, 45);
    assert_eq!(updated.exercises.len(), 1);
    assert!(manager.is_modified_default("a"));

    assert!(!manager.update_template("unknown", TemplatePatch::default())?);
    Ok(())
}

#[test]
fn test_update_patch_replaces_nested_values() -> Result<()> {
    let mut manager = create_test_manager(Vec::new())?;
    let mut custom = template("mine", "Mine");
    custom.warmup = Some(CardioSpec::new("Elliptical", 10).with_levels(7, 8));
    manager.add_template(custom)?;

    let patch = TemplatePatch {
        warmup: Some(Some(CardioSpec::new("Rowing", 5))),
        ..TemplatePatch::default()
    };
    manager.update_template("mine", patch)?;

    let warmup = manager
        .get_template("mine")
        .and_then(|t| t.warmup)
        .expect("warmup set");
    assert_eq!(warmup.activity, "Rowing");
    assert_eq!(warmup.resistance, None);
    Ok(())
}

#[test]
fn test_failed_commit_leaves_state_unchanged() -> Result<()> {
    let repo = InMemoryOverrides::with_overrides(vec![template("mine", "Mine")]).failing();
    let mut manager = TemplateManager::with_catalog(vec![template("a", "A")], repo)?;
    let before = manager.all_templates();

    let result = manager.add_template(template("other", "Other"));
    assert!(matches!(result, Err(TemplateError::Store(_))));
    assert!(manager.delete_template("mine").is_err());
    assert!(manager
        .update_template("a", TemplatePatch::from(template("a", "A2")))
        .is_err());

    assert_eq!(manager.all_templates(), before);
    assert_eq!(manager.overrides().len(), 1);
    assert_eq!(manager.repository().commits(), 0);
    assert_eq!(manager.repository().saved().len(), 1);
    Ok(())
}

#[test]
fn test_loads_saved_overrides() -> Result<()> {
    let repo = InMemoryOverrides::with_overrides(vec![template("a", "Saved A"), template("z", "Z")]);
    let manager = TemplateManager::with_catalog(vec![template("a", "A")], repo)?;

    let all = manager.all_templates();
    assert_eq!(ids(&all), vec!["a", "z"]);
    assert_eq!(all[0].name, "Saved A");
    Ok(())
}

#[test]
fn test_draft_validation_keeps_draft() -> Result<()> {
    let mut manager = create_test_manager(Vec::new())?;

    let mut draft = TemplateDraft::blank(42);
    assert_eq!(draft.id(), "custom-42");
    assert_eq!(draft.template.name, "New template");
    assert_eq!(draft.template.estimated_duration, 60);

    let err = manager.save_draft(&draft).unwrap_err();
    assert!(matches!(err, TemplateError::Validation(ref m) if m.contains("at least one exercise")));

    draft.template.name = "   ".to_string();
    draft.add_exercise(ExerciseTemplate::new("Row", 3, 10, 12, 60));
    let err = manager.save_draft(&draft).unwrap_err();
    assert!(matches!(err, TemplateError::Validation(ref m) if m.contains("Name")));
    assert!(manager.all_templates().is_empty());
    assert_eq!(manager.repository().commits(), 0);

    // The rejected draft can be corrected and saved.
    draft.template.name = "Pull day".to_string();
    let saved = manager.save_draft(&draft)?;
    assert_eq!(saved.id, "custom-42");
    assert_eq!(manager.all_templates().len(), 1);
    Ok(())
}

#[test]
fn test_draft_edits_do_not_touch_manager() -> Result<()> {
    let mut manager = create_test_manager(vec![template("a", "A")])?;
    let mut draft = TemplateDraft::edit(&manager.get_template("a").expect("exists"));

    draft.template.name = "Edited".to_string();
    draft.add_exercise(ExerciseTemplate::new("Curl", 3, 10, 12, 60));
    assert_eq!(draft.remove_exercise(1).map(|e| e.name), Some("Squat".to_string()));
    assert!(draft.remove_exercise(0).is_none());
    assert!(draft.remove_exercise(5).is_none());
    assert_eq!(manager.get_template("a").map(|t| t.name), Some("A".to_string()));

    let saved = manager.save_draft(&draft)?;
    assert_eq!(saved.id, "a");
    assert_eq!(saved.name, "Edited");
    assert_eq!(saved.exercises[0].name, "Curl");
    assert!(manager.is_modified_default("a"));
    Ok(())
}

#[test]
fn test_builtin_catalog_contents() {
    let catalog = builtin_templates();
    let ids: Vec<&str> = catalog.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "day-1-back-biceps",
            "day-2-chest-shoulders-triceps",
            "day-3-legs-abs",
            "quick-upper",
            "quick-lower"
        ]
    );
    assert!(catalog.iter().all(|t| !t.exercises.is_empty()));
    let warmup = catalog[0].warmup.as_ref().expect("day 1 has a warmup");
    assert_eq!(warmup.activity, "Elliptical");
    assert_eq!(warmup.duration, 10);
}
