use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::{Child, Command as ProcessCommand};
use stride_core::config::CueConfig;
use stride_core::*;
use uuid::Uuid;

type Scheduler = SessionScheduler<JsonPlanStore, Box<dyn ReminderSink>, SystemClock>;

#[derive(Parser)]
#[command(name = "stride")]
#[command(about = "Run/walk training plan and interval timer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new nine week plan
    Init {
        /// First workout date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        start: Option<NaiveDate>,
    },

    /// Show the plan grouped by week (default)
    Plan,

    /// Mark a session complete, or incomplete again
    Toggle {
        /// Position in the plan (1-27) or session id
        session: String,
    },

    /// Move every remaining session by a number of days
    Shift {
        /// Days to move; negative moves sessions earlier
        #[arg(allow_hyphen_values = true)]
        days: i64,
    },

    /// Delete the plan and its start date
    Reset {
        /// Confirm that progress should be discarded
        #[arg(long)]
        yes: bool,
    },

    /// Run a workout with a live interval countdown
    Run {
        /// Position in the plan or session id; defaults to the next incomplete session
        session: Option<String>,
    },
}

fn main() -> Result<()> {
    // Progress goes to stdout; keep logs to warnings unless RUST_LOG says otherwise
    stride_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let mut scheduler = open_scheduler(data_dir, &config)?;

    match cli.command {
        Some(Commands::Init { start }) => cmd_init(&mut scheduler, start),
        Some(Commands::Plan) | None => cmd_plan(&scheduler),
        Some(Commands::Toggle { session }) => cmd_toggle(&mut scheduler, &session),
        Some(Commands::Shift { days }) => cmd_shift(&mut scheduler, days),
        Some(Commands::Reset { yes }) => cmd_reset(&mut scheduler, yes),
        Some(Commands::Run { session }) => cmd_run(&mut scheduler, session.as_deref(), &config),
    }
}

fn open_scheduler(data_dir: PathBuf, config: &Config) -> Result<Scheduler> {
    std::fs::create_dir_all(&data_dir)?;

    let reminders: Box<dyn ReminderSink> = if config.reminders.enabled {
        Box::new(JsonReminderSink::new(
            data_dir.clone(),
            config.reminders.hour,
            SystemClock,
        )?)
    } else {
        Box::new(NoReminders)
    };

    Ok(SessionScheduler::open(
        JsonPlanStore::new(data_dir),
        reminders,
        SystemClock,
    ))
}

/// Accept a 1-based plan position or a session UUID
fn resolve_session(scheduler: &Scheduler, arg: &str) -> Result<Uuid> {
    if let Ok(position) = arg.parse::<usize>() {
        return scheduler
            .sessions()
            .get(position.wrapping_sub(1))
            .map(|s| s.id)
            .ok_or_else(|| {
                Error::Other(format!(
                    "No session #{} (plan has {} sessions)",
                    position,
                    scheduler.sessions().len()
                ))
            });
    }

    let id = Uuid::parse_str(arg)
        .map_err(|_| Error::Other(format!("Not a session number or id: {}", arg)))?;
    scheduler
        .session(id)
        .map(|s| s.id)
        .ok_or(Error::SessionNotFound(id))
}

fn cmd_init(scheduler: &mut Scheduler, start: Option<NaiveDate>) -> Result<()> {
    let start = start.unwrap_or_else(|| SystemClock.today());
    scheduler.initialise(start)?;

    println!(
        "✓ Created {} sessions starting {}",
        scheduler.sessions().len(),
        start.format("%a %d %b %Y")
    );
    Ok(())
}

fn cmd_plan(scheduler: &Scheduler) -> Result<()> {
    if scheduler.is_empty() {
        println!("No training plan yet. Run `stride init` to create one.");
        return Ok(());
    }

    let next = scheduler.next_session().map(|s| s.id);
    let mut position = 0;

    for week in scheduler.weeks() {
        println!();
        if week.done {
            println!("{} ✓", week.title());
        } else {
            println!("{}", week.title());
        }

        for session in &week.sessions {
            position += 1;
            let marker = if session.completed {
                "✓"
            } else if Some(session.id) == next {
                "→"
            } else {
                " "
            };
            println!(
                "  {} {:>2}. Day {}  {}  ({} min)",
                marker,
                position,
                session.day,
                session.date.format("%a %d %b"),
                session.total_seconds() / 60
            );
        }
    }

    let streak = scheduler.current_streak();
    if streak >= 3 {
        println!();
        println!("🔥 {} day streak", streak);
    }
    Ok(())
}

fn cmd_toggle(scheduler: &mut Scheduler, session: &str) -> Result<()> {
    let id = resolve_session(scheduler, session)?;
    let completed = scheduler.toggle(id).ok_or(Error::SessionNotFound(id))?;

    let title = scheduler
        .session(id)
        .map(|s| s.title())
        .unwrap_or_default();
    if completed {
        println!("✓ {} marked complete", title);
    } else {
        println!("✓ {} marked incomplete", title);
    }

    if let Some(next) = scheduler.next_session() {
        println!("  Next: {} on {}", next.title(), next.date.format("%a %d %b"));
    }
    Ok(())
}

fn cmd_shift(scheduler: &mut Scheduler, days: i64) -> Result<()> {
    if scheduler.is_empty() {
        println!("No training plan yet - nothing to shift.");
        return Ok(());
    }

    if !scheduler.shift_plan(days) {
        return Err(Error::Other(format!(
            "shifting by {} days moves sessions out of the supported date range",
            days
        )));
    }
    if days == 0 {
        println!("Plan unchanged.");
    } else {
        println!("✓ Shifted remaining sessions by {} days", days);
    }
    Ok(())
}

fn cmd_reset(scheduler: &mut Scheduler, yes: bool) -> Result<()> {
    if !yes {
        eprintln!("This deletes the plan and all progress. Re-run with --yes to confirm.");
        return Err(Error::Other("reset not confirmed".into()));
    }

    scheduler.reset();
    if let Err(e) = scheduler.flush() {
        return Err(Error::Other(format!("plan could not be removed: {}", e)));
    }
    println!("✓ Plan reset");
    Ok(())
}

fn cmd_run(scheduler: &mut Scheduler, session: Option<&str>, config: &Config) -> Result<()> {
    let id = match session {
        Some(arg) => resolve_session(scheduler, arg)?,
        None => match scheduler.next_session() {
            Some(s) => s.id,
            None if scheduler.is_empty() => {
                println!("No training plan yet. Run `stride init` to create one.");
                return Ok(());
            }
            None => {
                println!("All sessions completed!");
                return Ok(());
            }
        },
    };

    let workout = scheduler
        .session(id)
        .cloned()
        .ok_or(Error::SessionNotFound(id))?;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", workout.title());
    println!("╰─────────────────────────────────────────╯");
    println!(
        "  {} intervals, {} min",
        workout.intervals.len(),
        workout.total_seconds() / 60
    );
    println!("  'p' + Enter to pause/resume, 'q' + Enter to cancel\n");

    scheduler.begin_workout(id)?;

    let mut cues = CueDispatcher::new(TerminalCues::new(&config.cues), workout.intervals.clone());
    let runner = WorkoutRunner::spawn(
        SystemClock,
        workout.intervals.clone(),
        config.timer.cadence(),
        move |event| {
            cues.handle(event);
            if let TimerEvent::Tick { remaining, .. } = event {
                print!("\r  {:02}:{:02} ", remaining / 60, remaining % 60);
                let _ = io::stdout().flush();
            }
        },
    )?;

    let controller = runner.controller();
    std::thread::spawn(move || {
        let mut paused = false;
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let request = match line.trim().to_lowercase().as_str() {
                "p" if paused => WorkoutControl::Resume,
                "p" => WorkoutControl::Pause,
                "q" => WorkoutControl::Abandon,
                _ => continue,
            };
            paused = request == WorkoutControl::Pause;
            let abandon = request == WorkoutControl::Abandon;
            if controller.send(request).is_err() || abandon {
                break;
            }
            if paused {
                println!("  Paused - 'p' + Enter to resume");
            }
        }
    });

    match runner.join()? {
        WorkoutOutcome::Finished => {
            scheduler.complete_workout(id)?;
            println!("\n\n✓ Workout complete!");
            if let Some(next) = scheduler.next_session() {
                println!("  Next: {} on {}", next.title(), next.date.format("%a %d %b"));
            }
        }
        WorkoutOutcome::Abandoned => {
            scheduler.end_workout();
            println!("\n\nWorkout cancelled.");
        }
    }

    if let Err(e) = scheduler.flush() {
        eprintln!("Warning: progress could not be saved: {}", e);
    }
    Ok(())
}

/// Announces cues on the terminal, optionally through a speech program
struct TerminalCues {
    play_ding: bool,
    speech_command: Option<String>,
    speaking: Vec<Child>,
}

impl TerminalCues {
    fn new(config: &CueConfig) -> Self {
        Self {
            play_ding: config.play_ding,
            speech_command: config.speech_command.clone(),
            speaking: Vec::new(),
        }
    }

    /// Drop speech processes that have exited
    fn reap(&mut self) {
        self.speaking.retain_mut(|child| match child.try_wait() {
            Ok(Some(_)) => false,
            Ok(None) => true,
            Err(e) => {
                tracing::warn!("Failed to poll speech command: {}", e);
                false
            }
        });
    }
}

impl Drop for TerminalCues {
    fn drop(&mut self) {
        for mut child in self.speaking.drain(..) {
            let _ = child.wait();
        }
    }
}

impl CueSink for TerminalCues {
    fn speak(&mut self, label: &str) {
        let bell = if self.play_ding { "\x07" } else { "" };
        println!("\n{}🔔 {}", bell, label);

        self.reap();
        if let Some(command) = &self.speech_command {
            match ProcessCommand::new(command).arg(label).spawn() {
                Ok(child) => self.speaking.push(child),
                Err(e) => tracing::warn!("Failed to run speech command {:?}: {}", command, e),
            }
        }
    }
}
