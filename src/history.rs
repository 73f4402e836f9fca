// src/history.rs
//! Reads previously written workout notes back into summaries.
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct NoteSummary {
    pub properties: BTreeMap<String, String>,
    /// Exercise name -> set weights in table order.
    pub exercises: Vec<(String, Vec<f64>)>,
}

impl NoteSummary {
    pub fn date(&self) -> Option<&str> {
        self.properties.get("date").map(String::as_str)
    }

    pub fn is_workout(&self) -> bool {
        self.properties.get("type").is_some_and(|t| t == "workout")
    }
}

/// Parses a note produced by [`crate::note::format_note`]. Returns `None`
/// when the text has no front-matter block or is not tagged as a workout.
pub fn parse_note(text: &str) -> Option<NoteSummary> {
    let mut lines = text.lines();
    if lines.next()?.trim() != "---" {
        return None;
    }

    let mut properties = BTreeMap::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim() == "---" {
            closed = true;
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            properties.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    if !closed {
        return None;
    }

    // Only `### ` headings and set rows under `## 💪 Exercises` count.
    let mut exercises: Vec<(String, Vec<f64>)> = Vec::new();
    let mut in_exercises = false;
    for line in lines {
        if let Some(name) = line.strip_prefix("### ") {
            if in_exercises {
                exercises.push((name.trim().to_string(), Vec::new()));
            }
        } else if let Some(heading) = line.strip_prefix("## ") {
            in_exercises = heading.trim_start_matches("💪").trim() == "Exercises";
        } else if !in_exercises {
            continue;
        } else if let Some(weight) = set_row_weight(line) {
            if let Some((_, weights)) = exercises.last_mut() {
                weights.push(weight);
            }
        }
    }

    let summary = NoteSummary {
        properties,
        exercises,
    };
    summary.is_workout().then_some(summary)
}

// `| 1 | 60 | 10 | - | - | 90 |` -> Some(60.0)
fn set_row_weight(line: &str) -> Option<f64> {
    let mut cells = line.trim().strip_prefix('|')?.split('|').map(str::trim);
    cells.next()?.parse::<u32>().ok()?;
    cells.next()?.parse::<f64>().ok()
}

/// For each exercise name, the weight of its last set in the most recent
/// note that contains it. Notes are ordered by their `date` property; notes
/// sharing a date keep input order, later wins.
pub fn last_weights<'a>(documents: impl IntoIterator<Item = &'a str>) -> HashMap<String, f64> {
    let mut notes: Vec<NoteSummary> = documents.into_iter().filter_map(parse_note).collect();
    notes.sort_by(|a, b| a.date().unwrap_or("").cmp(b.date().unwrap_or("")));

    let mut weights = HashMap::new();
    for note in notes {
        for (name, sets) in note.exercises {
            if let Some(last) = sets.last() {
                weights.insert(name, *last);
            }
        }
    }
    weights
}
