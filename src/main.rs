use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod aggregate;
mod config;
mod dates;
mod db;
mod logging;
mod models;
mod report;
mod store;
mod suggest;

use models::{PracticeRecord, Student};
use store::PracticeStore;

#[derive(Parser)]
#[command(name = "practice-coach")]
#[command(
    about = "Music practice tracker with dashboard stats and coaching suggestions",
    long_about = None
)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Create the default student accounts and a sample history
    Seed,
    /// Upsert practice records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Record (or overwrite) a day's practice
    Log {
        #[arg(long)]
        student: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        hours: f64,
        #[arg(long, default_value = "")]
        technique: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Remove a day's practice record
    Delete {
        #[arg(long)]
        student: String,
        #[arg(long)]
        date: NaiveDate,
    },
    /// Add a special note dated today
    Note {
        #[arg(long)]
        student: String,
        #[arg(long)]
        text: String,
    },
    /// List special notes, newest first
    Notes {
        #[arg(long)]
        student: String,
    },
    /// List practice records, newest first
    History {
        #[arg(long)]
        student: String,
        #[arg(long, default_value_t = 30)]
        limit: usize,
    },
    /// Today's hours, month total and notes this week
    Dashboard {
        #[arg(long)]
        student: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Zero-filled daily hours for the trailing window
    Chart {
        #[arg(long)]
        student: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(
            long,
            default_value_t = aggregate::CHART_WINDOW_DAYS,
            value_parser = RangedU64ValueParser::<usize>::new()
                .range(1..=aggregate::MAX_WINDOW_DAYS as u64)
        )]
        days: usize,
        #[arg(long)]
        json: bool,
    },
    /// Coaching suggestions from the most recent sessions
    Suggest {
        #[arg(long)]
        student: String,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        student: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

async fn require_student(pool: &PgPool, username: &str) -> anyhow::Result<Student> {
    db::find_student(pool, username)
        .await?
        .with_context(|| format!("no student with username {username}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let settings = config::Settings::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let upserted = db::import_csv(&pool, &csv).await?;
            println!("Upserted {upserted} practice records from {}.", csv.display());
        }
        Commands::Log {
            student,
            date,
            hours,
            technique,
            notes,
        } => {
            let student = require_student(&pool, &student).await?;
            let day = date.unwrap_or_else(dates::today);
            let record = PracticeRecord::new(student.id, day, hours, technique, notes)?;
            pool.upsert_record(&record).await?;
            println!("Saved {hours:.2} h for {} on {day}.", student.full_name);
        }
        Commands::Delete { student, date } => {
            let student = require_student(&pool, &student).await?;
            if pool.delete_record(student.id, date).await? {
                println!("Deleted practice for {} on {date}.", student.full_name);
            } else {
                println!("No practice recorded for {} on {date}.", student.full_name);
            }
        }
        Commands::Note { student, text } => {
            let student = require_student(&pool, &student).await?;
            pool.add_special_note(student.id, dates::today(), &text).await?;
            println!("Note saved for {}.", student.full_name);
        }
        Commands::Notes { student } => {
            let student = require_student(&pool, &student).await?;
            let notes = db::list_special_notes(&pool, student.id).await?;
            if notes.is_empty() {
                println!("No notes yet.");
            }
            for note in notes {
                println!("- {}: {}", note.day, note.text);
            }
        }
        Commands::History { student, limit } => {
            let student = require_student(&pool, &student).await?;
            let records = pool.fetch_recent(student.id, limit).await?;
            if records.is_empty() {
                println!("No practice recorded yet.");
            }
            for record in records {
                println!(
                    "- {}: {:.2} h [{}] {}",
                    record.day, record.hours, record.technique, record.notes
                );
            }
        }
        Commands::Dashboard {
            student,
            date,
            json,
        } => {
            let student = require_student(&pool, &student).await?;
            let reference = date.unwrap_or_else(dates::today);
            let summary = aggregate::dashboard_summary(&pool, student.id, reference).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Dashboard for {} on {reference}:", student.full_name);
                println!("- Today: {:.2} h", summary.today_hours);
                println!("- This month: {:.2} h", summary.month_hours);
                println!("- Notes this week: {}", summary.notes_this_week);
            }
        }
        Commands::Chart {
            student,
            date,
            days,
            json,
        } => {
            let student = require_student(&pool, &student).await?;
            let reference = date.unwrap_or_else(dates::today);
            let series =
                aggregate::trailing_daily_series(&pool, student.id, reference, days).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else {
                for point in series {
                    println!("{} {:>6.2}", point.day, point.hours);
                }
            }
        }
        Commands::Suggest { student, json } => {
            let student = require_student(&pool, &student).await?;
            let suggestions = suggest::suggestions_for(&pool, student.id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&suggestions)?);
            } else if suggestions.is_empty() {
                println!("No suggestions right now.");
            } else {
                for suggestion in suggestions {
                    println!("- {}: {}", suggestion.title, suggestion.message);
                }
            }
        }
        Commands::Report { student, date, out } => {
            let student = require_student(&pool, &student).await?;
            let reference = date.unwrap_or_else(dates::today);
            let summary = aggregate::dashboard_summary(&pool, student.id, reference).await?;
            let series = aggregate::trailing_daily_series(
                &pool,
                student.id,
                reference,
                aggregate::CHART_WINDOW_DAYS,
            )
            .await?;
            let recent = pool
                .fetch_recent(student.id, suggest::RECENT_RECORD_LIMIT)
                .await?;
            let suggestions = suggest::suggest(&recent);
            let label = format!("{} ({})", student.full_name, student.username);

            let report = report::build_report(&report::ReportInput {
                student_label: &label,
                reference,
                summary,
                recent: &recent,
                series: &series,
                suggestions: &suggestions,
            });
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
