// src/catalog.rs
//! Built-in workout templates shipped with the tool.
use crate::model::{CardioSpec, ExerciseTemplate, WorkoutTemplate};
use std::sync::OnceLock;

static BUILTIN_TEMPLATES: OnceLock<Vec<WorkoutTemplate>> = OnceLock::new();

/// The built-in catalog, in its fixed display order.
pub fn builtin_templates() -> &'static [WorkoutTemplate] {
    BUILTIN_TEMPLATES.get_or_init(build_catalog)
}

fn elliptical() -> CardioSpec {
    CardioSpec::new("Elliptical", 10).with_levels(7, 8)
}

fn tags(values: &[&str]) -> Option<Vec<String>> {
    Some(values.iter().map(|t| (*t).to_string()).collect())
}

fn build_catalog() -> Vec<WorkoutTemplate> {
    vec![
        WorkoutTemplate {
            id: "day-1-back-biceps".to_string(),
            name: "Day 1 - Back and Biceps".to_string(),
            description: Some("Back and biceps workout".to_string()),
            estimated_duration: 60,
            tags: tags(&["back", "biceps", "pull"]),
            warmup: Some(elliptical()),
            cooldown: Some(elliptical()),
            exercises: vec![
                ExerciseTemplate::new("Bent Over Row (Barbell)", 3, 8, 10, 90)
                    .with_notes("Pull to lower abdomen, focus on technique"),
                ExerciseTemplate::new("Lat Pulldown (Machine)", 3, 10, 12, 90),
                ExerciseTemplate::new("Seated Row (Machine)", 3, 10, 12, 90),
                ExerciseTemplate::new("Face Pull (Cable)", 3, 12, 15, 60)
                    .with_notes("Pull to nose, focus on rear delts"),
                ExerciseTemplate::new("Hammer Curl (Dumbbell)", 3, 10, 12, 60),
                ExerciseTemplate::new("Cable Curl", 3, 12, 15, 60),
                ExerciseTemplate::new("Back Extension", 3, 15, 20, 60),
            ],
        },
        WorkoutTemplate {
            id: "day-2-chest-shoulders-triceps".to_string(),
            name: "Day 2 - Chest, Shoulders and Triceps".to_string(),
            description: Some("Chest, shoulders and triceps workout".to_string()),
            estimated_duration: 65,
            tags: tags(&["chest", "shoulders", "triceps", "push"]),
            warmup: Some(elliptical()),
            cooldown: Some(elliptical()),
            exercises: vec![
                ExerciseTemplate::new("Bench Press (Dumbbell)", 3, 8, 10, 120),
                ExerciseTemplate::new("Incline Bench Press (Dumbbell)", 3, 10, 12, 120),
                ExerciseTemplate::new("Chest Press (Machine)", 3, 12, 15, 90),
                ExerciseTemplate::new("Seated Overhead Press (Dumbbell)", 3, 8, 10, 120),
                ExerciseTemplate::new("Lateral Raise (Dumbbell)", 3, 12, 15, 60),
                ExerciseTemplate::new("Reverse Fly (Dumbbell)", 3, 12, 15, 60)
                    .with_notes("Important for shoulder health and posture"),
                ExerciseTemplate::new("Cable Pushdown (Triceps)", 3, 12, 15, 60)
                    .with_notes("Critical for arm growth (2/3 of volume)"),
                ExerciseTemplate::new("Back Extension", 3, 15, 20, 60),
            ],
        },
        WorkoutTemplate {
            id: "day-3-legs-abs".to_string(),
            name: "Day 3 - Legs and Abs".to_string(),
            description: Some("Legs and abs workout".to_string()),
            estimated_duration: 70,
            tags: tags(&["legs", "abs", "core"]),
            warmup: Some(elliptical()),
            cooldown: Some(elliptical()),
            exercises: vec![
                ExerciseTemplate::new("Goblet Squat (Kettlebell)", 3, 10, 12, 90),
                ExerciseTemplate::new("Leg Press", 4, 10, 12, 120)
                    .with_notes("Increase weight to 120-150 kg"),
                ExerciseTemplate::new("Romanian Deadlift (Dumbbell)", 3, 10, 12, 90),
                ExerciseTemplate::new("Bulgarian Split Squat (Dumbbell)", 3, 10, 12, 90)
                    .with_notes("Great exercise for glutes and quads"),
                ExerciseTemplate::new("Leg Curl (Machine)", 3, 12, 15, 60)
                    .with_notes("Important for balance"),
                ExerciseTemplate::new("Standing Calf Raise (Dumbbell)", 3, 15, 20, 60),
                ExerciseTemplate::new("Crunch (Machine)", 3, 15, 20, 45),
                ExerciseTemplate::new("Knee Raise (Captain's Chair)", 3, 12, 15, 45),
                ExerciseTemplate::new("Plank", 3, 45, 60, 45)
                    .with_notes("For core stability (in seconds)"),
            ],
        },
        WorkoutTemplate {
            id: "quick-upper".to_string(),
            name: "Quick Upper Body".to_string(),
            description: Some("Quick upper body workout (30 min)".to_string()),
            estimated_duration: 30,
            tags: tags(&["quick", "upper", "minimal-equipment"]),
            warmup: None,
            cooldown: None,
            exercises: vec![
                ExerciseTemplate::new("Push-ups", 3, 15, 20, 60),
                ExerciseTemplate::new("Pull-ups / Assisted Pull-ups", 3, 8, 12, 90),
                ExerciseTemplate::new("Dumbbell Overhead Press", 3, 10, 12, 60),
                ExerciseTemplate::new("Dumbbell Row", 3, 12, 15, 60),
            ],
        },
        WorkoutTemplate {
            id: "quick-lower".to_string(),
            name: "Quick Lower Body".to_string(),
            description: Some("Quick lower body workout (30 min)".to_string()),
            estimated_duration: 30,
            tags: tags(&["quick", "lower", "minimal-equipment"]),
            warmup: None,
            cooldown: None,
            exercises: vec![
                ExerciseTemplate::new("Goblet Squat", 3, 12, 15, 60),
                ExerciseTemplate::new("Lunges (Bodyweight or Weighted)", 3, 10, 12, 60),
                ExerciseTemplate::new("Romanian Deadlift", 3, 12, 15, 60),
                ExerciseTemplate::new("Calf Raises", 3, 20, 25, 45),
            ],
        },
    ]
}
