//! Command-line tool for attendance records.
//!
//! Records, corrects and deletes attendance, and prints statistics and
//! monthly calendars, directly against PostgreSQL.
//!
//! # Usage
//!
//! ```bash
//! # Apply migrations
//! cargo run --bin attendance -- db migrate
//!
//! # Record a presence
//! cargo run --bin attendance -- --role preceptor create --student 42 --date 2024-03-10 --presence present
//!
//! # Correct it
//! cargo run --bin attendance -- --role preceptor update 1 --presence late
//!
//! # List a student's records for March
//! cargo run --bin attendance -- list --student 42 --from 2024-03-01 --to 2024-03-31
//!
//! # Statistics per student for an academic year
//! cargo run --bin attendance -- stats --academic-year 7 --by-student
//!
//! # Calendar
//! cargo run --bin attendance -- calendar --student 42 --month 2024-03
//! ```
//!
//! # Environment Variables
//!
//! See [`attendance_core::config`]. A `.env` file is loaded if present.

use attendance_core::application::services::{AttendanceService, ReportService};
use attendance_core::config::{self, Config};
use attendance_core::domain::calendar::{CalendarGrid, CalendarMonth};
use attendance_core::domain::entities::{Actor, AttendanceRecord, Presence, Role};
use attendance_core::domain::repositories::AttendanceFilter;
use attendance_core::domain::stats::AttendanceStats;
use attendance_core::dto::{
    AttendanceQueryParams, CalendarResponse, CreateAttendanceRequest, PageResponse,
    PaginationParams, StatsResponse, UpdateAttendanceRequest,
};
use attendance_core::error::AppError;
use attendance_core::infrastructure::persistence::PgAttendanceRepository;
use attendance_core::logging;
use attendance_core::utils::date_normalizer::normalize_date;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// CLI tool for managing attendance records.
#[derive(Parser)]
#[command(name = "attendance")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Role of the person running the command. Required for changes.
    #[arg(short, long, global = true, value_enum)]
    role: Option<RoleArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Administrator,
    Preceptor,
    Teacher,
    Student,
    Guardian,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Administrator => Role::Administrator,
            RoleArg::Preceptor => Role::Preceptor,
            RoleArg::Teacher => Role::Teacher,
            RoleArg::Student => Role::Student,
            RoleArg::Guardian => Role::Guardian,
        }
    }
}

/// Top-level commands.
#[derive(Subcommand)]
enum Commands {
    /// Record a student's presence for one day
    Create {
        #[arg(short, long)]
        student: i64,

        /// `YYYY-MM-DD` or a timestamp; only its calendar date is kept
        #[arg(short, long)]
        date: String,

        /// present, absent, late or justified
        #[arg(short, long)]
        presence: String,

        #[arg(long)]
        academic_year: Option<i64>,
    },

    /// Change the date or presence of a record
    Update {
        id: i64,

        #[arg(short, long)]
        date: Option<String>,

        #[arg(short, long)]
        presence: Option<String>,
    },

    /// Delete a record
    Delete {
        id: i64,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List records
    List {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        limit: Option<u32>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show presence counts and percentages
    Stats {
        #[command(flatten)]
        filter: FilterArgs,

        /// Break the numbers down per student
        #[arg(long)]
        by_student: bool,

        /// Decimal places for percentages
        #[arg(long, default_value_t = 1)]
        decimals: u32,

        #[arg(long)]
        json: bool,
    },

    /// Show a student's month calendar
    Calendar {
        #[arg(short, long)]
        student: i64,

        /// `YYYY-MM`, defaults to the current month
        #[arg(short, long)]
        month: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(clap::Args)]
struct FilterArgs {
    #[arg(short, long)]
    student: Option<i64>,

    #[arg(short, long)]
    presence: Option<String>,

    #[arg(short, long)]
    date: Option<String>,

    #[arg(long)]
    academic_year: Option<i64>,

    #[arg(long)]
    from: Option<String>,

    #[arg(long)]
    to: Option<String>,
}

impl FilterArgs {
    fn into_params(self, pagination: PaginationParams) -> AttendanceQueryParams {
        AttendanceQueryParams {
            student_id: self.student,
            presence: self.presence,
            date: self.date,
            academic_year_id: self.academic_year,
            from: self.from,
            to: self.to,
            pagination,
        }
    }

    fn into_filter(self) -> Result<AttendanceFilter, AppError> {
        let parse_date = |value: Option<String>| -> Result<Option<NaiveDate>, AppError> {
            Ok(value.as_deref().map(normalize_date).transpose()?)
        };

        Ok(AttendanceFilter {
            student_id: self.student,
            presence: self
                .presence
                .as_deref()
                .map(str::parse::<Presence>)
                .transpose()?,
            date: parse_date(self.date)?,
            academic_year_id: self.academic_year,
            from: parse_date(self.from)?,
            to: parse_date(self.to)?,
        })
    }
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;
    logging::init(&config)?;

    let pool = connect(&config).await?;
    let actor = cli.role.map(|r| Actor::new(r.into())).unwrap_or_default();

    let result = run(cli.command, actor, &config, pool).await;

    if let Err(e) = &result
        && let Some(app_error) = e.downcast_ref::<AppError>()
    {
        eprintln!(
            "{} {}",
            format!("[{}]", app_error.code()).red().bold(),
            app_error.to_string().red()
        );
        if !app_error.details().is_null() {
            eprintln!("  {}", app_error.details().to_string().bright_black());
        }
    }

    result
}

async fn connect(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Some(Duration::from_secs(config.db_idle_timeout)))
        .max_lifetime(Some(Duration::from_secs(config.db_max_lifetime)))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

async fn run(command: Commands, actor: Actor, config: &Config, pool: PgPool) -> Result<()> {
    let repository = Arc::new(PgAttendanceRepository::new(Arc::new(pool.clone())));
    let attendance =
        AttendanceService::new(Arc::clone(&repository)).with_page_limits(config.page_limits());
    let reports = ReportService::new(repository)
        .with_retry_policy(config.read_retry_policy())
        .with_page_size(config.page_limit_max);

    match command {
        Commands::Create {
            student,
            date,
            presence,
            academic_year,
        } => {
            let mut request = CreateAttendanceRequest::new(student, date, presence);
            if let Some(year) = academic_year {
                request = request.with_academic_year(year);
            }

            let record = attendance.create(&actor, request).await?;

            println!("{}", "✅ Attendance recorded".green().bold());
            print_record(&record);
        }
        Commands::Update { id, date, presence } => {
            let record = attendance
                .update(&actor, id, UpdateAttendanceRequest { date, presence })
                .await?;

            println!("{}", "✅ Attendance updated".green().bold());
            print_record(&record);
        }
        Commands::Delete { id, yes } => {
            actor.ensure_can_manage()?;

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete attendance record {id}?"))
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "❌ Cancelled".red());
                    return Ok(());
                }
            }

            attendance.delete(&actor, id).await?;
            println!("{}", "✅ Attendance deleted".green().bold());
        }
        Commands::List {
            filter,
            page,
            limit,
            json,
        } => {
            let params = filter.into_params(PaginationParams { page, limit });
            let page = PageResponse::from(attendance.list_params(params).await?);

            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                print_page(&page);
            }
        }
        Commands::Stats {
            filter,
            by_student,
            decimals,
            json,
        } => {
            let report = reports.cohort_report(filter.into_filter()?).await?;

            if json {
                let body = serde_json::json!({
                    "overall": StatsResponse::new(&report.overall, decimals),
                    "by_student": report
                        .by_student
                        .iter()
                        .map(|(id, stats)| (id.to_string(), StatsResponse::new(stats, decimals)))
                        .collect::<BTreeMap<_, _>>(),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("{}", "📊 Attendance statistics".bright_blue().bold());
                println!();
                print_stats("All", &report.overall, decimals);
                if by_student {
                    for (student_id, stats) in &report.by_student {
                        print_stats(&format!("Student {student_id}"), stats, decimals);
                    }
                }
            }
        }
        Commands::Calendar {
            student,
            month,
            json,
        } => {
            let month = match month {
                Some(value) => parse_month(&value)?,
                None => CalendarMonth::of(Local::now().date_naive()),
            };
            let today = Local::now().date_naive();
            let grid = reports.student_calendar(student, month, Some(today)).await?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&CalendarResponse::from(&grid))?
                );
            } else {
                print_calendar(student, &grid);
            }
        }
        Commands::Db { action } => handle_db_action(action, config, &pool).await?,
    }

    Ok(())
}

fn parse_month(value: &str) -> Result<CalendarMonth, AppError> {
    let invalid = || {
        AppError::bad_request(
            "Month must be written as YYYY-MM",
            serde_json::json!({ "field": "month", "value": value }),
        )
    };

    let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;

    CalendarMonth::new(year, month)
}

fn presence_label(presence: Presence) -> ColoredString {
    match presence {
        Presence::Present => presence.as_str().green(),
        Presence::Absent => presence.as_str().red(),
        Presence::Late => presence.as_str().yellow(),
        Presence::Justified => presence.as_str().cyan(),
    }
}

fn presence_mark(presence: Presence) -> ColoredString {
    match presence {
        Presence::Present => "P".green(),
        Presence::Absent => "A".red(),
        Presence::Late => "L".yellow(),
        Presence::Justified => "J".cyan(),
    }
}

fn print_record(record: &AttendanceRecord) {
    println!("  ID:       {}", record.id.to_string().bright_black());
    println!("  Student:  {}", record.student_id.to_string().cyan());
    println!("  Date:     {}", record.date);
    println!("  Presence: {}", presence_label(record.presence));
    if let Some(year) = record.academic_year_id {
        println!("  Year:     {}", year);
    }
}

/// Prints a page of records as a table.
///
/// ```text
///   ID     Student  Date         Presence
///   ──────────────────────────────────────────
///   1      42       2024-03-10   present
/// ```
fn print_page(page: &PageResponse) {
    if page.data.is_empty() {
        println!("{}", "  No attendance records found".yellow());
        return;
    }

    println!(
        "  {:<6} {:<8} {:<12} {}",
        "ID".bright_white().bold(),
        "Student".bright_white().bold(),
        "Date".bright_white().bold(),
        "Presence".bright_white().bold()
    );
    println!("  {}", "─".repeat(42).bright_black());

    for record in &page.data {
        println!(
            "  {:<6} {:<8} {:<12} {}",
            record.id.to_string().bright_black(),
            record.student_id.to_string().cyan(),
            record.date.to_string(),
            presence_label(record.presence)
        );
    }

    println!();
    println!(
        "  Page {} of {} ({} records)",
        page.page.to_string().bright_white().bold(),
        page.total_pages.max(1),
        page.total
    );
}

fn print_stats(label: &str, stats: &AttendanceStats, decimals: u32) {
    println!("  {}", label.bright_white().bold());

    let Some(rates) = stats.rates().map(|r| r.rounded(decimals)) else {
        println!("    {}", "No data".bright_black());
        println!();
        return;
    };

    let precision = decimals as usize;
    for (presence, count) in stats.counts.iter() {
        println!(
            "    {:<10} {:>5}  {:>6.precision$}%",
            presence_label(presence),
            count,
            rates.get(presence),
        );
    }
    println!("    {:<10} {:>5}", "total", stats.total);
    println!();
}

/// Prints the six-week grid, Sunday first.
fn print_calendar(student_id: i64, grid: &CalendarGrid) {
    println!(
        "{}",
        format!(
            "📅 Student {} · {}-{:02}",
            student_id,
            grid.month.year(),
            grid.month.month()
        )
        .bright_blue()
        .bold()
    );
    println!();
    println!("  {}", " Su   Mo   Tu   We   Th   Fr   Sa".bright_white().bold());

    for week in grid.weeks() {
        let mut line = String::from("  ");
        for cell in week {
            let day = format!("{:>2}", cell.date.day());
            let day = if !cell.is_current_month {
                day.bright_black()
            } else if cell.is_today {
                day.bold().underline()
            } else {
                day.normal()
            };
            let mark = match &cell.record {
                Some(record) => presence_mark(record.presence),
                None => " ".normal(),
            };
            line.push_str(&format!("{day}{mark}  "));
        }
        println!("{}", line.trim_end());
    }

    println!();
    println!(
        "  {} present  {} absent  {} late  {} justified",
        "P".green(),
        "A".red(),
        "L".yellow(),
        "J".cyan()
    );
}

/// Handles database maintenance commands.
async fn handle_db_action(action: DbAction, config: &Config, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            config.print_summary();
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Migrate => {
            println!("{}", "🔧 Applying migrations...".bright_blue());

            sqlx::migrate!("./migrations")
                .run(pool)
                .await
                .context("Failed to apply migrations")?;

            println!("{}", "✅ Migrations applied".green().bold());
        }
    }

    Ok(())
}
