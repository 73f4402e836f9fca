// src/note.rs
//! Markdown rendering of a finished workout.
use crate::config::Units;
use crate::model::{CardioSpec, Exercise, WorkoutSession};
use std::fmt::{Display, Write};

const MISSING_CELL: &str = "-";

/// Renders `session` as a note: a front-matter block followed by the
/// human-readable body. Output depends only on the arguments.
pub fn format_note(session: &WorkoutSession, units: Units) -> String {
    let unit = units.weight_label();
    let mut md = String::new();

    md.push_str("---\n");
    let properties: [(&str, &dyn Display); 6] = [
        ("date", &session.date),
        ("program", &session.program),
        ("duration", &session.duration),
        ("totalSets", &session.total_sets),
        ("totalVolume", &session.total_volume),
        ("type", &"workout"),
    ];
    for (key, value) in properties {
        let _ = writeln!(md, "{key}: {value}");
    }
    md.push_str("---\n\n");

    let _ = writeln!(md, "# {}\n", session.program);
    let _ = writeln!(
        md,
        "📅 {}  |  ⏱️ {} min  |  💪 {} sets  |  📊 {} {unit} volume\n",
        session.date, session.duration, session.total_sets, session.total_volume
    );

    if let Some(warmup) = &session.warmup {
        push_cardio(&mut md, "Warmup", warmup);
    }

    md.push_str("## 💪 Exercises\n\n");
    for exercise in &session.exercises {
        push_exercise(&mut md, exercise, unit);
    }

    if let Some(cooldown) = &session.cooldown {
        push_cardio(&mut md, "Cooldown", cooldown);
    }

    if let Some(notes) = &session.notes {
        let _ = write!(md, "## 📝 Notes\n\n{notes}\n\n");
    }

    md
}

fn push_cardio(md: &mut String, title: &str, cardio: &CardioSpec) {
    let _ = writeln!(md, "## 🏃 {title}\n");
    let _ = writeln!(md, "- **Type:** {}", cardio.activity);
    let _ = writeln!(md, "- **Duration:** {} min", cardio.duration);
    if let Some(resistance) = cardio.resistance {
        let _ = writeln!(md, "- **Resistance:** {resistance}");
    }
    if let Some(incline) = cardio.incline {
        let _ = writeln!(md, "- **Incline:** {incline}");
    }
    if let Some(hr) = cardio.avg_heart_rate {
        let _ = writeln!(md, "- **Average Heart Rate:** {hr} bpm");
    }
    if let Some(distance) = cardio.distance {
        let _ = writeln!(md, "- **Distance:** {distance} km");
    }
    if let Some(calories) = cardio.calories {
        let _ = writeln!(md, "- **Calories:** {calories} kcal");
    }
    md.push('\n');
}

fn push_exercise(md: &mut String, exercise: &Exercise, unit: &str) {
    let _ = writeln!(md, "### {}\n", exercise.name);
    let _ = writeln!(
        md,
        "| Set | Weight ({unit}) | Reps | RPE | Heart Rate | Rest (sec) |"
    );
    md.push_str("|--------|----------|------------|-----|-------|-------------|\n");
    for set in &exercise.sets {
        let _ = writeln!(
            md,
            "| {} | {} | {} | {} | {} | {} |",
            set.set_number,
            set.weight,
            set.reps,
            cell(set.rpe),
            cell(set.heart_rate),
            cell(set.rest_time)
        );
    }
    if let Some(notes) = &exercise.notes {
        let _ = writeln!(md, "\n*Notes:* {notes}");
    }
    md.push('\n');
}

fn cell<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING_CELL.to_string(), |v| v.to_string())
}

/// `<folder>/<date> - <program>.md`
pub fn note_file_name(session: &WorkoutSession) -> String {
    format!("{} - {}.md", session.date, sanitize_file_component(&session.program))
}

/// Same as [`note_file_name`] with ` (n)` appended for the n-th clash.
pub fn numbered_file_name(session: &WorkoutSession, n: u32) -> String {
    if n <= 1 {
        return note_file_name(session);
    }
    format!(
        "{} - {} ({n}).md",
        session.date,
        sanitize_file_component(&session.program)
    )
}

// Characters that are not allowed in file names on common platforms.
fn sanitize_file_component(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            other => other,
        })
        .collect()
}

/// Section appended to a note when an analysis comes back.
pub fn analysis_section(analysis: &str) -> String {
    format!("\n\n## 🤖 AI Analysis\n\n{analysis}\n\n")
}
