mod calendar;
mod config;
mod date;
mod engine;
mod error;
mod levels;
mod model;
mod output;
mod quests;
mod status;
mod store;
mod timer;
mod ts;

use crate::calendar::{month_calendar, DayCell};
use crate::config::{init_logging, Settings};
use crate::date::{calendar_day, fmt_date, parse_month, Month};
use crate::engine::Engine;
use crate::error::CliError;
use crate::levels::{level_info, CAT_LEVELS, MAX_LEVEL};
use crate::model::Timestamp;
use crate::output::{render_progress_bar, render_simple_table, Styler};
use crate::quests::{quest_for, GlucoseRange, MAX_GLUCOSE, QUESTS};
use crate::status::build_status;
use crate::store::FileStore;
use crate::timer::{next_due_time, time_left, TimeLeft};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::time::{Duration, Instant};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "diabuddy", version, about = "Care for your cat by logging injections and glucose")]
struct Cli {
    /// Directory holding the four state files.
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Overrides the current instant (RFC3339 with offset) for deterministic output/testing.
    #[arg(long, global = true)]
    now: Option<String>,

    #[arg(long, global = true, value_enum, default_value = "table")]
    format: Format,

    /// Disables ANSI color output.
    #[arg(long, global = true)]
    no_color: bool,

    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log an insulin injection and feed the cat.
    Inject(InjectArgs),
    /// Log a blood glucose reading (mg/dL).
    Glucose(GlucoseArgs),
    Status,
    /// Run the hunger check once.
    Check,
    /// Run the hunger check on an interval.
    Watch(WatchArgs),
    /// Countdown to the next dose.
    Timer,
    Badges,
    Levels,
    Calendar(CalendarArgs),
    History(HistoryArgs),
    /// Wipe all state back to a fresh mystery box.
    Reset(ResetArgs),
}

#[derive(Args, Debug)]
struct InjectArgs {
    /// Dose in units; each unit pushes the next dose 30 minutes out (default interval 5h).
    #[arg(long, allow_negative_numbers = true)]
    dose: Option<f64>,
}

#[derive(Args, Debug)]
struct GlucoseArgs {
    /// Integer 0..=500
    #[arg(allow_negative_numbers = true)]
    value: i64,
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Seconds between checks.
    #[arg(long, default_value_t = 60)]
    interval: u64,

    /// Stop after this many checks (runs until interrupted otherwise).
    #[arg(long)]
    iterations: Option<u64>,
}

#[derive(Args, Debug)]
struct CalendarArgs {
    /// YYYY-MM (defaults to the current month)
    #[arg(long)]
    month: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum HistoryKind {
    Injections,
    Glucose,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    #[arg(value_enum, default_value = "injections")]
    kind: HistoryKind,

    /// Show only the most recent N entries.
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args, Debug)]
struct ResetArgs {
    /// Required; there is no undo.
    #[arg(long)]
    yes: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(c) => c,
        Err(e) => {
            let code = if e.use_stderr() { 2 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_logging(cli.verbose);

    let exit = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code
        }
    };

    std::process::exit(exit);
}

fn print_line(s: &str) {
    println!("{}", s);
}

fn print_json<T: serde::Serialize>(obj: &T) -> Result<(), CliError> {
    // Round-trip through Value so object keys come out sorted.
    let v = serde_json::to_value(obj).map_err(|_| CliError::io("Failed to encode output"))?;
    let s = serde_json::to_string_pretty(&v).map_err(|_| CliError::io("Failed to encode output"))?;
    println!("{}", s);
    Ok(())
}

fn fmt_clock(t: &Timestamp) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

fn fmt_days(n: u32) -> String {
    if n == 1 {
        "1 day".to_string()
    } else {
        format!("{} days", n)
    }
}

fn fmt_time_left(left: &TimeLeft) -> String {
    format!("{:02}:{:02}:{:02}", left.hours, left.minutes, left.seconds)
}

fn validate_dose(dose: Option<f64>, now: Timestamp) -> Result<Option<f64>, CliError> {
    match dose {
        Some(d) if !d.is_finite() || d < 0.0 => {
            Err(CliError::usage(format!("Invalid dose: {} (expected a number >= 0)", d)))
        }
        Some(d) if next_due_time(now, dose).is_none() => Err(CliError::usage(format!(
            "Invalid dose: {} (next dose would fall outside the calendar)",
            d
        ))),
        other => Ok(other),
    }
}

fn validate_glucose(value: i64) -> Result<u16, CliError> {
    if !(0..=MAX_GLUCOSE as i64).contains(&value) {
        return Err(CliError::usage(format!(
            "Invalid glucose: {} (expected 0-{} mg/dL)",
            value, MAX_GLUCOSE
        )));
    }
    Ok(value as u16)
}

fn render_timer_line(engine: &Engine<FileStore>, now: Timestamp, styler: &Styler) -> String {
    let timer = engine.timer();
    match (timer.next_due_time, time_left(timer, now)) {
        (Some(due), Some(left)) if !left.overdue => format!(
            "Next injection: due {} ({} left)",
            fmt_clock(&due),
            fmt_time_left(&left)
        ),
        (Some(_), Some(_)) => styler.yellow("Time for Injection! Your cat is getting hungry!"),
        _ => styler.gray("Next injection: log an injection to start the timer"),
    }
}

/// Three columns per day; injected days keep their number and gain a `*`.
fn fmt_day_cell(cell: Option<&DayCell>, styler: &Styler) -> String {
    match cell {
        None => "   ".to_string(),
        Some(c) if c.injected => styler.green(&format!("{:>2}*", c.day)),
        Some(c) if c.today => styler.bold(&format!("{:>2} ", c.day)),
        Some(c) => format!("{:>2} ", c.day),
    }
}

fn badge_marks(badges: &crate::model::Badges, styler: &Styler) -> String {
    QUESTS
        .iter()
        .map(|q| {
            let mark = if badges.has(q.badge) {
                styler.green("[x]")
            } else {
                "[ ]".to_string()
            };
            format!("{} {}", mark, q.badge.as_str())
        })
        .collect::<Vec<String>>()
        .join("  ")
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = Settings::resolve(cli.data_dir.as_deref(), cli.now.as_deref(), cli.no_color)?;
    let styler = Styler::new(settings.color);
    let now = settings.now;

    let mut engine = Engine::load(FileStore::new(&settings.data_dir), now);
    tracing::debug!(dir = %engine.store().dir().display(), now = %now, "session loaded");

    // Same as opening the app: a missed day is noticed before anything else happens.
    if !matches!(cli.command, Command::Reset(_)) {
        engine.compute_hunger_state(now);
    }

    match cli.command {
        Command::Inject(args) => {
            let dose = validate_dose(args.dose, now)?;
            let outcome = engine.log_injection(dose, now);
            let pet = engine.pet().clone();
            let info = level_info(outcome.new_level);

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Streak {
                    current: u32,
                    longest: u32,
                }

                #[derive(serde::Serialize)]
                struct Out {
                    injection: Option<crate::model::InjectionLog>,
                    leveled_up: bool,
                    new_level: u8,
                    level_name: String,
                    mood: crate::engine::PetMood,
                    total_injections: u32,
                    streak: Streak,
                    timer: crate::model::TimerState,
                }

                print_json(&Out {
                    injection: engine.injection_logs().last().cloned(),
                    leveled_up: outcome.leveled_up,
                    new_level: outcome.new_level,
                    level_name: info.name.to_string(),
                    mood: engine.mood(outcome.leveled_up),
                    total_injections: pet.total_injections,
                    streak: Streak {
                        current: pet.current_streak,
                        longest: pet.longest_streak,
                    },
                    timer: engine.timer().clone(),
                })?;
            } else {
                print_line(&format!(
                    "Injection logged! {} {} (Lv. {})",
                    info.emoji, info.name, info.level
                ));
                if outcome.leveled_up {
                    print_line(&styler.bold(&format!(
                        "Level up! {} {}",
                        info.name, info.description
                    )));
                }
                print_line(&format!(
                    "Streak: {} (longest {})",
                    fmt_days(pet.current_streak),
                    fmt_days(pet.longest_streak)
                ));
                print_line(&render_timer_line(&engine, now, &styler));
            }

            Ok(())
        }

        Command::Glucose(args) => {
            let value = validate_glucose(args.value)?;
            let outcome = engine.log_glucose(value, now);
            let range = GlucoseRange::classify(value);
            let count = engine.pet().glucose_log_count;

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    reading: Option<crate::model::GlucoseLog>,
                    range: GlucoseRange,
                    count: u32,
                    new_badge: Option<crate::model::Badge>,
                }

                print_json(&Out {
                    reading: engine.glucose_logs().last().cloned(),
                    range,
                    count,
                    new_badge: outcome.new_badge,
                })?;
            } else {
                let reading = format!("{} mg/dL - {}", value, range.label());
                let reading = match range {
                    GlucoseRange::Target => styler.green(&reading),
                    GlucoseRange::Low => styler.red(&reading),
                    GlucoseRange::High => styler.yellow(&reading),
                };
                print_line(&format!("Logged {}", reading));
                if let Some(badge) = outcome.new_badge {
                    let quest = quest_for(badge);
                    print_line(&styler.bold(&format!(
                        "New badge unlocked: {} ({}: {})",
                        badge.as_str(),
                        quest.name,
                        quest.description
                    )));
                }
            }

            Ok(())
        }

        Command::Status => {
            let data = build_status(&engine, now);

            if cli.format == Format::Json {
                print_json(&data)?;
            } else {
                let pet = engine.pet();
                print_line(&format!(
                    "{} {} (Lv. {})",
                    data.pet.emoji, data.pet.name, data.pet.progress.level
                ));
                if pet.is_hungry {
                    print_line(&styler.yellow(&data.pet.message));
                } else {
                    print_line(&data.pet.message);
                }

                match data.pet.progress.next_level_needs {
                    Some(needs) => print_line(&format!(
                        "Progress to Level {}: {} {}/{} injections",
                        data.pet.progress.level + 1,
                        render_progress_bar(data.pet.progress.percent, 10),
                        data.pet.total_injections,
                        needs
                    )),
                    None => print_line(&styler.bold("Max Level Reached!")),
                }

                print_line(&format!(
                    "Streak: {} (longest {})",
                    fmt_days(data.streak.current),
                    fmt_days(data.streak.longest)
                ));
                print_line(&render_timer_line(&engine, now, &styler));

                let quest_line = match data.glucose.next_quest.as_ref() {
                    Some(q) => format!("Glucose: {}/{} to {}", data.glucose.count, q.target, q.name),
                    None => "Glucose: all badges earned!".to_string(),
                };
                print_line(&quest_line);
                print_line(&format!("Badges: {}", badge_marks(&data.glucose.badges, &styler)));
                if let Some(r) = data.glucose.last_reading.as_ref() {
                    print_line(&format!("Last reading: {} mg/dL - {}", r.value, r.label));
                }
            }

            Ok(())
        }

        Command::Check => {
            let hungry = engine.pet().is_hungry;

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    hungry: bool,
                    current_streak: u32,
                    last_injection: Option<String>,
                }
                print_json(&Out {
                    hungry,
                    current_streak: engine.pet().current_streak,
                    last_injection: engine.pet().last_injection_date.map(|t| t.to_rfc3339()),
                })?;
            } else if engine.pet().last_injection_date.is_none() {
                print_line(&styler.gray("(no injections logged yet)"));
            } else if hungry {
                print_line(&styler.yellow("Your cat is hungry! Streak reset to 0."));
            } else {
                print_line(&styler.green("Your cat is fed."));
            }

            Ok(())
        }

        Command::Watch(args) => {
            let started = Instant::now();
            let mut tick = 0u64;

            loop {
                tick += 1;
                let elapsed = chrono::Duration::from_std(started.elapsed())
                    .unwrap_or_else(|_| chrono::Duration::zero());
                let at = now + elapsed;
                let hungry = engine.compute_hunger_state(at);

                if cli.format == Format::Json {
                    let line = serde_json::json!({
                        "tick": tick,
                        "at": at.to_rfc3339(),
                        "hungry": hungry,
                    });
                    print_line(&line.to_string());
                } else {
                    let state = if hungry {
                        styler.yellow("hungry")
                    } else {
                        styler.green("fed")
                    };
                    print_line(&format!("[{}] {}", fmt_clock(&at), state));
                }

                if args.iterations.is_some_and(|n| tick >= n) {
                    break;
                }
                std::thread::sleep(Duration::from_secs(args.interval));
            }

            Ok(())
        }

        Command::Timer => {
            let timer = engine.timer().clone();
            let left = time_left(&timer, now);

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    next_due_time: Option<String>,
                    last_dose_amount: Option<f64>,
                    time_left: Option<TimeLeft>,
                }
                print_json(&Out {
                    next_due_time: timer.next_due_time.map(|t| t.to_rfc3339()),
                    last_dose_amount: timer.last_dose_amount,
                    time_left: left,
                })?;
            } else {
                print_line(&render_timer_line(&engine, now, &styler));
                if let Some(d) = timer.last_dose_amount {
                    print_line(&format!("Last dose: {} units", d));
                }
            }

            Ok(())
        }

        Command::Badges => {
            let pet = engine.pet();

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Row {
                    badge: crate::model::Badge,
                    name: String,
                    description: String,
                    count: u32,
                    earned: bool,
                }

                #[derive(serde::Serialize)]
                struct Out {
                    glucose_log_count: u32,
                    quests: Vec<Row>,
                }

                print_json(&Out {
                    glucose_log_count: pet.glucose_log_count,
                    quests: QUESTS
                        .iter()
                        .map(|q| Row {
                            badge: q.badge,
                            name: q.name.to_string(),
                            description: q.description.to_string(),
                            count: q.count,
                            earned: pet.badges.has(q.badge),
                        })
                        .collect(),
                })?;
            } else {
                let rows: Vec<Vec<String>> = QUESTS
                    .iter()
                    .map(|q| {
                        let earned = pet.badges.has(q.badge);
                        vec![
                            q.badge.as_str().to_string(),
                            q.name.to_string(),
                            format!("{}/{}", pet.glucose_log_count.min(q.count), q.count),
                            if earned { "yes".to_string() } else { "no".to_string() },
                            q.description.to_string(),
                        ]
                    })
                    .collect();
                print_line(&render_simple_table(
                    &["badge", "quest", "progress", "earned", "description"],
                    &rows,
                ));
            }

            Ok(())
        }

        Command::Levels => {
            let current = engine.pet().level;

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    current_level: u8,
                    max_level: u8,
                    levels: Vec<crate::levels::CatLevel>,
                }
                print_json(&Out {
                    current_level: current,
                    max_level: MAX_LEVEL,
                    levels: CAT_LEVELS.to_vec(),
                })?;
            } else {
                let rows: Vec<Vec<String>> = CAT_LEVELS
                    .iter()
                    .map(|l| {
                        vec![
                            if l.level == current { "*".to_string() } else { String::new() },
                            l.level.to_string(),
                            l.emoji.to_string(),
                            l.name.to_string(),
                            l.injections_needed.to_string(),
                        ]
                    })
                    .collect();
                print_line(&render_simple_table(
                    &["", "level", "cat", "name", "injections"],
                    &rows,
                ));
            }

            Ok(())
        }

        Command::Calendar(args) => {
            let today = calendar_day(&now);
            let month = match args.month.as_deref() {
                Some(m) => parse_month(m, "month")?,
                None => Month::of(today),
            };
            let days = engine.streak_calendar_days(now.offset());
            let cal = month_calendar(&days, month, today);

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    calendar: crate::calendar::MonthCalendar,
                    injected_dates: Vec<String>,
                    current_streak: u32,
                    longest_streak: u32,
                }
                let injected_dates = days
                    .iter()
                    .filter(|d| Month::of(**d) == month)
                    .map(|d| fmt_date(*d))
                    .collect();
                print_json(&Out {
                    calendar: cal,
                    injected_dates,
                    current_streak: engine.pet().current_streak,
                    longest_streak: engine.pet().longest_streak,
                })?;
            } else {
                print_line(&cal.label);
                print_line(" Su  Mo  Tu  We  Th  Fr  Sa");
                for week in cal.weeks.iter() {
                    let line = week
                        .iter()
                        .map(|cell| fmt_day_cell(cell.as_ref(), &styler))
                        .collect::<Vec<String>>()
                        .join(" ");
                    print_line(line.trim_end());
                }
                print_line("");
                print_line(&format!(
                    "{} with injections. Current streak {}, longest {}.",
                    fmt_days(cal.injected_days),
                    engine.pet().current_streak,
                    engine.pet().longest_streak
                ));
            }

            Ok(())
        }

        Command::History(args) => {
            fn tail<T: Clone>(items: &[T], limit: Option<usize>) -> Vec<T> {
                let skip = limit.map(|n| items.len().saturating_sub(n)).unwrap_or(0);
                items[skip..].to_vec()
            }

            match args.kind {
                HistoryKind::Injections => {
                    let logs = tail(engine.injection_logs(), args.limit);
                    if cli.format == Format::Json {
                        #[derive(serde::Serialize)]
                        struct Out {
                            injections: Vec<crate::model::InjectionLog>,
                        }
                        print_json(&Out { injections: logs })?;
                    } else if logs.is_empty() {
                        print_line(&styler.gray("(no injections logged yet)"));
                    } else {
                        let rows: Vec<Vec<String>> = logs
                            .iter()
                            .map(|l| {
                                vec![
                                    fmt_clock(&l.timestamp),
                                    l.dose_amount.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
                                    l.id.clone(),
                                ]
                            })
                            .collect();
                        print_line(&render_simple_table(&["time", "dose", "id"], &rows));
                    }
                }
                HistoryKind::Glucose => {
                    let logs = tail(engine.glucose_logs(), args.limit);
                    if cli.format == Format::Json {
                        #[derive(serde::Serialize)]
                        struct Out {
                            glucose: Vec<crate::model::GlucoseLog>,
                        }
                        print_json(&Out { glucose: logs })?;
                    } else if logs.is_empty() {
                        print_line(&styler.gray("(no glucose readings logged yet)"));
                    } else {
                        let rows: Vec<Vec<String>> = logs
                            .iter()
                            .map(|l| {
                                vec![
                                    fmt_clock(&l.timestamp),
                                    l.value.to_string(),
                                    GlucoseRange::classify(l.value).label().to_string(),
                                    l.id.clone(),
                                ]
                            })
                            .collect();
                        print_line(&render_simple_table(&["time", "mg/dL", "range", "id"], &rows));
                    }
                }
            }

            Ok(())
        }

        Command::Reset(args) => {
            if !args.yes {
                return Err(CliError::usage("Refusing to reset without --yes"));
            }
            engine.reset(now);

            if cli.format == Format::Json {
                print_json(&serde_json::json!({ "reset": true }))?;
            } else {
                print_line("All data reset. A new mystery box awaits!");
            }

            Ok(())
        }
    }
}
