use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use timetable_engine::{
    DayOfWeek, LectureSlotRepository, Scheduler, SlotDraft, SlotPatch, TimetableError, WallTime,
};
use tracing_subscriber::EnvFilter;

mod store;

#[derive(Parser)]
#[command(name = "timetable", version, about = "Check and schedule lecture slots without double-booking")]
struct Cli {
    /// JSON file holding the stored lecture slots
    #[arg(long, global = true, default_value = "timetable.json")]
    store: PathBuf,

    /// JSON file with scheduler options (teacherScope, opensAt, closesAt)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report conflicts for a candidate slot without storing it (exit 1 on conflict)
    Check {
        /// Candidate slot JSON file (use - for stdin)
        input: String,
        /// Id of the stored slot being edited, excluded from the check
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Schedule a new slot
    Create {
        /// Slot JSON file (use - for stdin)
        input: String,
    },
    /// Change fields of a stored slot
    Update {
        id: String,
        /// Patch JSON file (use - for stdin)
        patch: String,
    },
    /// Move a stored slot to another day/start time, keeping its duration
    Move {
        id: String,
        /// Day number (1 = Monday .. 6 = Saturday) or weekday name
        #[arg(long)]
        day: DayOfWeek,
        /// New start time, HH:MM
        #[arg(long)]
        start: WallTime,
        /// Only report conflicts, do not move
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove a stored slot
    Delete { id: String },
    /// Print stored slots
    List {
        /// Only slots of this timetable
        #[arg(long)]
        timetable: Option<String>,
    },
    /// Report every conflicting pair of stored slots in a timetable
    Audit { timetable: String },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let options = store::load_options(cli.config.as_deref())?;
    let repo = store::load_store(&cli.store)?;
    let mut scheduler = Scheduler::with_options(repo, options);

    match cli.command {
        Command::Check { input, exclude } => {
            let candidate: SlotDraft = store::read_json(&input)?;
            let report = scheduler.evaluate(&candidate, exclude.as_deref())?;
            print_json(&report)?;
            return Ok(if report.is_clear() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }
        Command::Create { input } => {
            let candidate: SlotDraft = store::read_json(&input)?;
            let slot = report_conflict(scheduler.create(candidate))?;
            print_json(&slot)?;
        }
        Command::Update { id, patch } => {
            let patch: SlotPatch = store::read_json(&patch)?;
            let slot = report_conflict(scheduler.update(&id, &patch))?;
            print_json(&slot)?;
        }
        Command::Move {
            id,
            day,
            start,
            dry_run: true,
        } => {
            let report = scheduler.preview_move(&id, day, start)?;
            print_json(&report)?;
            return Ok(if report.is_clear() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }
        Command::Move {
            id,
            day,
            start,
            dry_run: false,
        } => {
            let slot = report_conflict(scheduler.move_slot(&id, day, start))?;
            print_json(&slot)?;
        }
        Command::Delete { id } => {
            let slot = scheduler.delete(&id)?;
            print_json(&slot)?;
        }
        Command::List { timetable } => {
            let slots = match timetable {
                Some(tt) => scheduler.repository().find_by_timetable(&tt)?,
                None => scheduler.repository().slots().cloned().collect(),
            };
            print_json(&slots)?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Audit { timetable } => {
            let conflicts = scheduler.audit(&timetable)?;
            print_json(&conflicts)?;
            return Ok(if conflicts.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }
    }

    store::save_store(&cli.store, scheduler.into_repository())?;
    Ok(ExitCode::SUCCESS)
}

/// On a conflict, print the report on stdout before failing so callers can
/// show which slot blocks the change.
fn report_conflict<T>(result: std::result::Result<T, TimetableError>) -> Result<T> {
    match result {
        Err(TimetableError::Conflict(report)) => {
            print_json(&report)?;
            Err(TimetableError::Conflict(report).into())
        }
        other => Ok(other?),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
