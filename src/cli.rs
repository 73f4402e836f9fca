// src/cli.rs
use chrono::{Duration, Local, NaiveDate};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "A CLI tool to log workouts as markdown notes", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitsCli {
    Metric,
    Imperial,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseCli {
    Warmup,
    Cooldown,
}

// Custom parser for date strings and shorthands
pub fn parse_date_shorthand(s: &str) -> Result<NaiveDate, String> {
    match s.to_lowercase().as_str() {
        "today" => Ok(Local::now().date_naive()),
        "yesterday" => Ok((Local::now() - Duration::days(1)).date_naive()),
        _ => {
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                Ok(date)
            } else if let Ok(date) = NaiveDate::parse_from_str(s, "%d.%m.%Y") {
                Ok(date)
            } else if let Ok(date) = NaiveDate::parse_from_str(s, "%Y/%m/%d") {
                Ok(date)
            } else {
                Err(format!(
                    "Invalid date format: '{s}'. Use 'today', 'yesterday', YYYY-MM-DD, DD.MM.YYYY, or YYYY/MM/DD."
                ))
            }
        }
    }
}

/// Parses an exercise prescription `Name:SETSxMIN-MAX@REST`, e.g.
/// `Bench Press:3x8-10@90`. Rest defaults to 90 seconds and a single rep
/// count (`3x10`) sets both bounds.
pub fn parse_exercise_spec(s: &str) -> Result<(String, u32, u32, u32, u32), String> {
    let err = || format!("Invalid exercise '{s}'. Expected NAME:SETSxMIN-MAX[@REST], e.g. 'Bench Press:3x8-10@90'.");
    let (name, prescription) = s.rsplit_once(':').ok_or_else(err)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(err());
    }
    let (volume, rest) = match prescription.split_once('@') {
        Some((v, r)) => (v, r.trim().parse::<u32>().map_err(|_| err())?),
        None => (prescription, 90),
    };
    let (sets, reps) = volume.split_once(['x', 'X']).ok_or_else(err)?;
    let sets = sets.trim().parse::<u32>().map_err(|_| err())?;
    let (reps_min, reps_max) = match reps.split_once('-') {
        Some((lo, hi)) => (
            lo.trim().parse::<u32>().map_err(|_| err())?,
            hi.trim().parse::<u32>().map_err(|_| err())?,
        ),
        None => {
            let n = reps.trim().parse::<u32>().map_err(|_| err())?;
            (n, n)
        }
    };
    Ok((name.to_string(), sets, reps_min, reps_max, rest))
}

/// Cardio options shared by template editing and session logging.
#[derive(Args, Debug, Clone, Default)]
pub struct CardioArgs {
    /// Activity, e.g. Elliptical, Treadmill, Rowing (any text is accepted)
    #[arg(long = "activity")]
    pub activity: Option<String>,
    /// Duration in minutes
    #[arg(long = "minutes")]
    pub minutes: Option<u32>,
    /// Resistance level (machines)
    #[arg(long)]
    pub resistance: Option<u32>,
    /// Incline level (machines)
    #[arg(long)]
    pub incline: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// List all templates (built-in, modified and custom)
    List,
    /// Show the exercises of a template
    Show { identifier: String },
    /// Create a new custom template
    Create {
        /// Template name
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Estimated duration in minutes
        #[arg(long, default_value_t = 60)]
        duration: u32,
        /// Comma-separated tags (e.g. "push,upper")
        #[arg(long)]
        tags: Option<String>,
        /// Exercise as NAME:SETSxMIN-MAX[@REST]; repeat for more
        #[arg(short, long = "exercise", value_parser = parse_exercise_spec, required = true)]
        exercises: Vec<(String, u32, u32, u32, u32)>,
    },
    /// Edit name, description, duration, tags or cardio of a template
    Edit {
        identifier: String,
        #[arg(short, long)]
        name: Option<String>,
        /// New description (empty string clears it)
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        duration: Option<u32>,
        /// Comma-separated tags (empty string clears them)
        #[arg(long)]
        tags: Option<String>,
        /// Which cardio block the cardio options apply to
        #[arg(long, value_enum, requires = "activity")]
        phase: Option<PhaseCli>,
        #[command(flatten)]
        cardio: CardioArgs,
        /// Remove the warmup or cooldown block
        #[arg(long, value_enum, conflicts_with = "phase")]
        remove_cardio: Option<PhaseCli>,
    },
    /// Append an exercise to a template
    AddExercise {
        identifier: String,
        /// Exercise as NAME:SETSxMIN-MAX[@REST]
        #[arg(value_parser = parse_exercise_spec)]
        exercise: (String, u32, u32, u32, u32),
        #[arg(short, long)]
        notes: Option<String>,
        /// Suggested working weight
        #[arg(short, long)]
        weight: Option<f64>,
    },
    /// Remove an exercise from a template by its 1-based position
    RemoveExercise { identifier: String, position: usize },
    /// Copy a template under a new id
    Duplicate { identifier: String },
    /// Delete a custom template (or the changes to a built-in)
    Delete { identifier: String },
    /// Restore a modified built-in template
    Reset { identifier: String },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current settings
    Show,
    /// Set the API key used for analysis (omit to clear)
    SetApiKey { key: Option<String> },
    /// Set the vault directory notes are written to
    SetVault { path: PathBuf },
    /// Set the folder (inside the vault) for workout notes
    SetFolder { folder: String },
    /// Set the default rest time between sets in seconds
    SetRest { seconds: u32 },
    /// Enable or disable notifications
    SetNotifications {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Run an analysis into each note when a workout finishes
    SetAutoAnalyze {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Set weight units
    SetUnits {
        #[arg(value_enum)]
        units: UnitsCli,
    },
    /// Set the table header color (e.g. Green, Cyan, DarkGrey)
    SetHeaderColor { color: String },
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage workout templates
    #[command(subcommand)]
    Templates(TemplateCommands),
    /// Start a workout from a template, or an empty one
    Start {
        /// Template id or name
        template: Option<String>,
        #[arg(long, value_parser = parse_date_shorthand, default_value = "today")]
        date: NaiveDate,
    },
    /// Show the workout in progress
    Status,
    /// Log a completed set
    Log {
        /// Exercise name, or its number in the template
        exercise: String,
        #[arg(short, long)]
        weight: f64,
        #[arg(short, long)]
        reps: u32,
        /// Rate of perceived exertion (1-10)
        #[arg(long)]
        rpe: Option<u8>,
        /// Heart rate in bpm
        #[arg(long)]
        hr: Option<u32>,
        /// Rest after this set in seconds
        #[arg(long)]
        rest: Option<u32>,
    },
    /// Record warmup or cooldown cardio for the workout in progress
    Cardio {
        #[arg(value_enum)]
        phase: PhaseCli,
        #[command(flatten)]
        cardio: CardioArgs,
        /// Average heart rate in bpm
        #[arg(long)]
        hr: Option<u32>,
        /// Distance in km
        #[arg(long)]
        distance: Option<f64>,
        #[arg(long)]
        calories: Option<u32>,
        /// Remove the block instead
        #[arg(long, conflicts_with_all = ["activity", "minutes"])]
        clear: bool,
    },
    /// Add notes to the workout in progress, or to one exercise
    Note {
        text: String,
        #[arg(short, long)]
        exercise: Option<String>,
    },
    /// Finish the workout in progress and write its note
    Finish {
        /// Duration in minutes (default: time since start)
        #[arg(short, long)]
        duration: Option<u32>,
    },
    /// Throw away the workout in progress
    Discard,
    /// Count down a rest period
    Rest {
        /// Seconds (default: configured rest time)
        seconds: Option<u32>,
    },
    /// Ask the AI for an analysis of past workouts
    Analyze {
        /// Note (path inside the vault) to append the analysis to
        #[arg(long)]
        into: Option<String>,
    },
    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Show the path to the config file
    ConfigPath,
    /// Generate shell completion script
    GenerateCompletion {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
