//src/main.rs
mod cli;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use std::io::{stdin, stdout, Write};
use std::str::FromStr;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use workout_notes_lib::{
    format_countdown, parse_color, ActiveWorkout, AppService, CardioActivity, CardioPhase,
    CardioSpec, ExerciseTemplate, RestTimer, SetInput, TemplateDraft, TemplateOrigin,
    TimerOutcome, Units, WorkoutTemplate,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // --- Check for completion generation request FIRST ---
    let cli_args = cli::parse_args();

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();

        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    // Initialize the application service (loads config and template overrides)
    let mut service =
        AppService::initialize().context("Failed to initialize application service")?;
    let header_color: Color = parse_color(&service.config.theme.header_color)
        .map(Color::from)
        .unwrap_or(Color::Green);

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            unreachable!("Completion generation should have exited already");
        }

        // --- Template Commands ---
        cli::Commands::Templates(command) => run_template_command(&mut service, command, header_color)?,

        // --- Workout Session Commands ---
        cli::Commands::Start { template, date } => {
            let workout = service.start_workout(template.as_deref(), date, Utc::now())?;
            println!(
                "Started '{}' on {}.",
                workout.session.program, workout.session.date
            );
            if workout.plan.is_empty() {
                println!("Log sets with 'log <exercise> --weight <w> --reps <r>'.");
            } else {
                print_workout_status(&workout, service.config.units, header_color);
            }
        }
        cli::Commands::Status => match service.active_workout()? {
            Some(workout) => print_workout_status(&workout, service.config.units, header_color),
            None => println!("No workout in progress. Start one with 'start [template]'."),
        },
        cli::Commands::Log {
            exercise,
            weight,
            reps,
            rpe,
            hr,
            rest,
        } => {
            let input = SetInput {
                weight,
                reps,
                rpe,
                heart_rate: hr,
                rest_seconds: rest,
            };
            let logged = service.log_set(&exercise, input)?;
            let unit = service.config.units.weight_label();
            if service.config.enable_notifications {
                println!(
                    "✅ {}: {}{} × {}",
                    logged.exercise, logged.set.weight, unit, logged.set.reps
                );
            }
            match logged.planned_sets {
                Some(planned) => println!("Set {}/{} done.", logged.set.set_number, planned),
                None => println!("Set {} done.", logged.set.set_number),
            }
            println!(
                "Workout total: {} sets, {:.0} {} volume.",
                logged.total_sets, logged.total_volume, unit
            );
            if let Some(rest) = logged.set.rest_time {
                println!("Rest {} ('rest {rest}' starts the timer).", format_countdown(rest));
            }
        }
        cli::Commands::Cardio {
            phase,
            cardio,
            hr,
            distance,
            calories,
            clear,
        } => {
            let phase = cli_phase(phase);
            if clear {
                service.set_cardio(phase, None)?;
                println!("Removed {}.", phase_label(phase));
            } else {
                let Some(mut spec) = cardio_from_args(&cardio) else {
                    bail!("Both --activity and --minutes are required (or use --clear).");
                };
                spec.avg_heart_rate = hr;
                spec.distance = distance;
                spec.calories = calories;
                let summary = cardio_summary(&spec);
                service.set_cardio(phase, Some(spec))?;
                println!("Recorded {}: {summary}", phase_label(phase));
            }
        }
        cli::Commands::Note { text, exercise } => match exercise {
            Some(exercise) => {
                service.set_exercise_notes(&exercise, &text)?;
                println!("Notes saved for '{exercise}'.");
            }
            None => {
                service.set_workout_notes(&text)?;
                println!("Workout notes saved.");
            }
        },
        cli::Commands::Finish { duration } => {
            let finished = service.finish_workout(duration, Utc::now())?;
            let session = &finished.session;
            println!("Workout saved to '{}'.", finished.path);
            println!(
                "⏱️ {} min • 💪 {} sets • 📊 {:.0} {} volume",
                session.duration,
                session.total_sets,
                session.total_volume,
                service.config.units.weight_label()
            );
            if service.config.auto_analyze {
                if service.config.api_key().is_none() {
                    println!("Skipping analysis: no API key configured.");
                } else {
                    println!("🤖 Analyzing your workouts...");
                    match service.analyze_workouts(Some(finished.path.as_str())) {
                        Ok(_) => println!("Analysis added to '{}'.", finished.path),
                        Err(e) => eprintln!("Analysis failed: {e}"),
                    }
                }
            }
        }
        cli::Commands::Discard => {
            if service.discard_workout()? {
                println!("Workout in progress discarded.");
            } else {
                println!("No workout in progress.");
            }
        }
        cli::Commands::Rest { seconds } => {
            let seconds = seconds.unwrap_or(service.config.default_rest_seconds);
            if seconds == 0 {
                bail!("Rest time must be greater than zero.");
            }
            run_rest_timer(seconds, service.config.enable_notifications)?;
        }
        cli::Commands::Analyze { into } => {
            println!("🤖 Analyzing your workouts...");
            match service.analyze_workouts(into.as_deref()) {
                Ok(analysis) => {
                    println!("\n{analysis}");
                    if let Some(target) = into {
                        println!("\nAnalysis added to '{target}'.");
                    }
                }
                Err(e) => bail!("Analysis failed: {e}"),
            }
        }

        // --- Config/Path Commands ---
        cli::Commands::Config(command) => run_config_command(&mut service, command)?,
        cli::Commands::ConfigPath => {
            println!("Config file is located at: {:?}", service.get_config_path());
        }
    }

    Ok(())
}

fn run_template_command(
    service: &mut AppService,
    command: cli::TemplateCommands,
    header_color: Color,
) -> Result<()> {
    match command {
        cli::TemplateCommands::List => {
            let templates = service.list_templates();
            print_template_table(&templates, header_color);
        }
        cli::TemplateCommands::Show { identifier } => {
            let template = service
                .find_template(&identifier)
                .with_context(|| format!("Template '{identifier}' not found"))?;
            print_template_details(&template, header_color);
        }
        cli::TemplateCommands::Create {
            name,
            description,
            duration,
            tags,
            exercises,
        } => {
            let mut draft = TemplateDraft::blank(Utc::now().timestamp_millis());
            draft.template.name = name.trim().to_string();
            draft.template.description = description.map(|d| d.trim().to_string());
            draft.template.estimated_duration = duration;
            draft.template.tags = tags.as_deref().and_then(parse_tags);
            for (name, sets, reps_min, reps_max, rest) in exercises {
                draft.add_exercise(ExerciseTemplate::new(&name, sets, reps_min, reps_max, rest));
            }
            let saved = service
                .save_template(&draft)
                .map_err(|e| anyhow::anyhow!("Error creating template: {e}"))?;
            println!(
                "Successfully created template '{}' (ID: {}) with {} exercise(s).",
                saved.name,
                saved.id,
                saved.exercises.len()
            );
        }
        cli::TemplateCommands::Edit {
            identifier,
            name,
            description,
            duration,
            tags,
            phase,
            cardio,
            remove_cardio,
        } => {
            let mut draft = service.edit_template_draft(&identifier)?;
            if let Some(name) = name {
                draft.template.name = name.trim().to_string();
            }
            if let Some(description) = description {
                let trimmed = description.trim();
                draft.template.description = (!trimmed.is_empty()).then(|| trimmed.to_string());
            }
            if let Some(minutes) = duration {
                draft.template.estimated_duration = minutes;
            }
            if let Some(tags) = tags {
                draft.template.tags = parse_tags(&tags);
            }
            if let Some(phase) = phase {
                let spec = cardio_from_args(&cardio)
                    .context("Both --activity and --minutes are required with --phase")?;
                match cli_phase(phase) {
                    CardioPhase::Warmup => draft.template.warmup = Some(spec),
                    CardioPhase::Cooldown => draft.template.cooldown = Some(spec),
                }
            }
            if let Some(phase) = remove_cardio {
                match cli_phase(phase) {
                    CardioPhase::Warmup => draft.template.warmup = None,
                    CardioPhase::Cooldown => draft.template.cooldown = None,
                }
            }
            let saved = service
                .save_template(&draft)
                .map_err(|e| anyhow::anyhow!("Error editing template '{identifier}': {e}"))?;
            println!("Successfully updated template '{}' (ID: {}).", saved.name, saved.id);
        }
        cli::TemplateCommands::AddExercise {
            identifier,
            exercise,
            notes,
            weight,
        } => {
            let mut draft = service.edit_template_draft(&identifier)?;
            let (name, sets, reps_min, reps_max, rest) = exercise;
            let mut planned = ExerciseTemplate::new(&name, sets, reps_min, reps_max, rest);
            planned.notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
            planned.target_weight = weight;
            draft.add_exercise(planned);
            let saved = service
                .save_template(&draft)
                .map_err(|e| anyhow::anyhow!("Error adding exercise: {e}"))?;
            println!(
                "Added '{name}' to '{}' ({} exercise(s)).",
                saved.name,
                saved.exercises.len()
            );
        }
        cli::TemplateCommands::RemoveExercise {
            identifier,
            position,
        } => {
            let mut draft = service.edit_template_draft(&identifier)?;
            let Some(removed) = draft.remove_exercise(position) else {
                bail!(
                    "Template '{}' has no exercise #{position} (it has {}).",
                    draft.template.name,
                    draft.template.exercises.len()
                );
            };
            let saved = service
                .save_template(&draft)
                .map_err(|e| anyhow::anyhow!("Error removing exercise: {e}"))?;
            println!("Removed '{}' from '{}'.", removed.name, saved.name);
        }
        cli::TemplateCommands::Duplicate { identifier } => {
            let copy = service.duplicate_template(&identifier)?;
            println!("Created '{}' (ID: {}).", copy.name, copy.id);
        }
        cli::TemplateCommands::Delete { identifier } => {
            let deleted = service.delete_template(&identifier)?;
            if service.templates.is_default_template(&deleted.id) {
                println!("Restored built-in template '{}'.", deleted.name);
            } else {
                println!("Deleted template '{}' (ID: {}).", deleted.name, deleted.id);
            }
        }
        cli::TemplateCommands::Reset { identifier } => {
            if service.reset_template(&identifier)? {
                println!("Template '{identifier}' reset to its built-in version.");
            } else {
                println!("Template '{identifier}' is not a modified built-in, nothing to reset.");
            }
        }
    }
    Ok(())
}

fn run_config_command(service: &mut AppService, command: cli::ConfigCommands) -> Result<()> {
    match command {
        cli::ConfigCommands::Show => print_config(service),
        cli::ConfigCommands::SetApiKey { key } => {
            let clearing = key.as_deref().map_or(true, |k| k.trim().is_empty());
            service.set_api_key(key)?;
            if clearing {
                println!("API key cleared.");
            } else {
                println!("API key saved.");
            }
            println!("Config file updated: {:?}", service.get_config_path());
        }
        cli::ConfigCommands::SetVault { path } => {
            service.set_vault_dir(path)?;
            println!("Vault set to {:?}.", service.vault_dir());
        }
        cli::ConfigCommands::SetFolder { folder } => {
            service.set_workouts_folder(&folder)?;
            println!(
                "Workout notes will be saved in '{}'.",
                service.config.workouts_folder
            );
        }
        cli::ConfigCommands::SetRest { seconds } => {
            service.set_default_rest(seconds)?;
            println!("Default rest time set to {}.", format_countdown(seconds));
        }
        cli::ConfigCommands::SetNotifications { enabled } => {
            service.set_notifications(enabled)?;
            println!("Set notifications to: {enabled}. Config updated.");
        }
        cli::ConfigCommands::SetAutoAnalyze { enabled } => {
            service.set_auto_analyze(enabled)?;
            println!("Set automatic analysis to: {enabled}. Config updated.");
        }
        cli::ConfigCommands::SetUnits { units } => {
            let units = match units {
                cli::UnitsCli::Metric => Units::Metric,
                cli::UnitsCli::Imperial => Units::Imperial,
            };
            service.set_units(units)?;
            println!("Successfully set units to: {units:?}");
            println!("Config file updated: {:?}", service.get_config_path());
        }
        cli::ConfigCommands::SetHeaderColor { color } => {
            service.set_header_color(&color)?;
            println!(
                "Header color set to {}. Config updated.",
                service.config.theme.header_color
            );
        }
    }
    Ok(())
}

/// Counts down on one line. Enter skips the rest.
fn run_rest_timer(seconds: u32, notify: bool) -> Result<()> {
    println!("Rest: {} (press Enter to skip)", format_countdown(seconds));
    let timer = RestTimer::start(seconds, Duration::from_secs(1), |remaining| {
        print!("\r⏳ {}   ", format_countdown(remaining));
        let _ = stdout().flush();
    });

    // Detached: a reader still blocked on stdin ends with the process.
    let (skip_tx, skip_rx) = mpsc::channel();
    thread::spawn(move || {
        let mut line = String::new();
        // EOF (no terminal) must not count as a skip.
        if matches!(stdin().read_line(&mut line), Ok(n) if n > 0) {
            let _ = skip_tx.send(());
        }
    });

    let outcome = loop {
        if timer.is_finished() {
            break timer.wait();
        }
        if skip_rx.recv_timeout(Duration::from_millis(200)).is_ok() {
            break timer.cancel();
        }
    };
    drop(skip_rx);

    println!();
    match outcome {
        TimerOutcome::Finished => {
            if notify {
                print!("\x07");
            }
            println!("⏰ Rest time is over!");
        }
        TimerOutcome::Cancelled => println!("Rest skipped."),
    }
    stdout().flush().context("Failed to flush output")?;
    Ok(())
}

const fn cli_phase(phase: cli::PhaseCli) -> CardioPhase {
    match phase {
        cli::PhaseCli::Warmup => CardioPhase::Warmup,
        cli::PhaseCli::Cooldown => CardioPhase::Cooldown,
    }
}

const fn phase_label(phase: CardioPhase) -> &'static str {
    match phase {
        CardioPhase::Warmup => "warmup",
        CardioPhase::Cooldown => "cooldown",
    }
}

/// Known activities are normalized to their usual spelling, anything else is kept as typed.
fn cardio_from_args(args: &cli::CardioArgs) -> Option<CardioSpec> {
    let activity = args.activity.as_deref()?.trim();
    let minutes = args.minutes?;
    if activity.is_empty() {
        return None;
    }
    let activity = CardioActivity::from_str(activity)
        .map_or_else(|_| activity.to_string(), |known| known.to_string());
    let mut spec = CardioSpec::new(&activity, minutes);
    spec.resistance = args.resistance;
    spec.incline = args.incline;
    Some(spec)
}

fn cardio_summary(spec: &CardioSpec) -> String {
    let mut parts = vec![format!("{} - {} min", spec.activity, spec.duration)];
    if let Some(r) = spec.resistance {
        parts.push(format!("resistance {r}"));
    }
    if let Some(i) = spec.incline {
        parts.push(format!("incline {i}"));
    }
    if let Some(hr) = spec.avg_heart_rate {
        parts.push(format!("{hr} bpm"));
    }
    parts.join(", ")
}

fn parse_tags(raw: &str) -> Option<Vec<String>> {
    let tags: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    (!tags.is_empty()).then_some(tags)
}

fn print_template_table(templates: &[(WorkoutTemplate, TemplateOrigin)], header_color: Color) {
    if templates.is_empty() {
        println!("No templates found.");
        return;
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Name").fg(header_color),
            Cell::new("Exercises").fg(header_color),
            Cell::new("Duration").fg(header_color),
            Cell::new("Tags").fg(header_color),
            Cell::new("Type").fg(header_color),
        ]);

    for (template, origin) in templates {
        let origin = match origin {
            TemplateOrigin::BuiltIn => "Built-in",
            TemplateOrigin::ModifiedBuiltIn => "Built-in (modified)",
            TemplateOrigin::Custom => "Custom",
        };
        table.add_row(vec![
            Cell::new(&template.id),
            Cell::new(&template.name),
            Cell::new(template.exercises.len()),
            Cell::new(format!("{} min", template.estimated_duration)),
            Cell::new(template.tags.as_ref().map_or(String::new(), |t| t.join(", "))),
            Cell::new(origin),
        ]);
    }
    println!("{table}");
}

fn print_template_details(template: &WorkoutTemplate, header_color: Color) {
    println!("\n--- {} ({}) ---", template.name, template.id);
    if let Some(description) = template.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{description}");
    }
    println!("~{} min", template.estimated_duration);
    if let Some(warmup) = &template.warmup {
        println!("Warmup: {}", cardio_summary(warmup));
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").fg(header_color),
            Cell::new("Exercise").fg(header_color),
            Cell::new("Sets×Reps").fg(header_color),
            Cell::new("Rest").fg(header_color),
            Cell::new("Notes").fg(header_color),
        ]);
    for (i, exercise) in template.exercises.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&exercise.name),
            Cell::new(format!(
                "{}×{}-{}",
                exercise.sets, exercise.reps_min, exercise.reps_max
            )),
            Cell::new(format_countdown(exercise.rest_seconds)),
            Cell::new(exercise.notes.as_deref().unwrap_or("")),
        ]);
    }
    println!("{table}");

    if let Some(cooldown) = &template.cooldown {
        println!("Cooldown: {}", cardio_summary(cooldown));
    }
}

fn print_workout_status(workout: &ActiveWorkout, units: Units, header_color: Color) {
    let session = &workout.session;
    let unit = units.weight_label();
    println!(
        "\n--- {} ({}) • {} sets • {:.0} {unit} volume ---",
        session.program, session.date, session.total_sets, session.total_volume
    );
    if let Some(warmup) = &session.warmup {
        println!("Warmup: {}", cardio_summary(warmup));
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").fg(header_color),
            Cell::new("Exercise").fg(header_color),
            Cell::new("Target").fg(header_color),
            Cell::new("Done").fg(header_color),
            Cell::new(format!("Weight ({unit})")).fg(header_color),
        ]);

    for progress in workout.plan_progress() {
        let planned = &progress.exercise;
        let done = format!("{}/{}", progress.completed_sets, planned.sets);
        let done_cell = if progress.is_complete() {
            Cell::new(done).add_attribute(Attribute::Bold)
        } else {
            Cell::new(done)
        };
        let weights = session.exercise(&planned.name).map_or_else(
            || planned.target_weight.map_or(String::new(), |w| format!("({w})")),
            |e| {
                e.sets
                    .iter()
                    .map(|s| s.weight.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        );
        table.add_row(vec![
            Cell::new(progress.position),
            Cell::new(&planned.name),
            Cell::new(planned.prescription()),
            done_cell,
            Cell::new(weights),
        ]);
    }

    // Exercises logged outside the plan
    for exercise in session
        .exercises
        .iter()
        .filter(|e| workout.planned(&e.name).is_none())
    {
        table.add_row(vec![
            Cell::new("-"),
            Cell::new(&exercise.name),
            Cell::new(""),
            Cell::new(exercise.sets.len()),
            Cell::new(
                exercise
                    .sets
                    .iter()
                    .map(|s| s.weight.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        ]);
    }

    if workout.plan.is_empty() && session.exercises.is_empty() {
        println!("No sets logged yet.");
    } else {
        println!("{table}");
    }
    if let Some(cooldown) = &session.cooldown {
        println!("Cooldown: {}", cardio_summary(cooldown));
    }
}

fn print_config(service: &AppService) {
    let config = &service.config;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let api_key = config.api_key().map_or_else(
        || "Not set".to_string(),
        |key| {
            let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
            format!("…{tail}")
        },
    );
    let rows = [
        ("Config File", format!("{}", service.get_config_path().display())),
        ("Vault", format!("{}", service.vault_dir().display())),
        ("Workouts Folder", config.workouts_folder.clone()),
        ("Default Rest", format_countdown(config.default_rest_seconds)),
        ("Notifications", config.enable_notifications.to_string()),
        ("Auto Analyze", config.auto_analyze.to_string()),
        ("Units", format!("{:?}", config.units)),
        ("API Key", api_key),
        ("Analysis Model", config.analysis.model.clone()),
        ("Header Color", config.theme.header_color.clone()),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    println!("{table}");
}
