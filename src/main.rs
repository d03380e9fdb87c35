mod board;
mod errors;
mod filter;
mod logging;
mod models;
mod repository;
mod storage;
mod tui;

use anyhow::{anyhow, Context, Result};
use board::Board;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use models::{Application, ApplicationDraft, COLUMNS, Status, column_for};
use std::path::{Path, PathBuf};
use storage::{KeyValueStore, SqliteStore};

#[derive(Parser)]
#[command(name = "jobboard")]
#[command(about = "Job application tracker - a kanban board for your job hunt")]
struct Cli {
    /// Path to the board's store (defaults to the XDG data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive board (default)
    Board,

    /// Add an application
    Add {
        /// Company name
        company: String,

        /// Position title
        position: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Edit an application; only the given fields change
    Edit {
        /// Application ID
        id: String,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        position: Option<String>,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// List applications by column
    List {
        /// Case-insensitive match on company or position
        #[arg(short, long, default_value = "")]
        search: String,

        /// Only show one column (wishlist, applied, interviewing, offer, rejected)
        #[arg(long)]
        status: Option<String>,
    },

    /// Show application details
    Show {
        /// Application ID
        id: String,
    },

    /// Move an application to another column
    Move {
        /// Application ID
        id: String,

        /// Destination column (wishlist, applied, interviewing, offer, rejected)
        status: String,
    },

    /// Delete an application
    Delete {
        /// Application ID
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List the board's columns
    Columns,
}

#[derive(clap::Args)]
struct FieldArgs {
    #[arg(short, long)]
    location: Option<String>,

    /// Column to file it under (wishlist, applied, interviewing, offer, rejected)
    #[arg(short, long)]
    status: Option<String>,

    /// Application date as YYYY-MM-DD (defaults to today)
    #[arg(short, long)]
    date: Option<String>,

    #[arg(short, long)]
    url: Option<String>,

    #[arg(long)]
    salary: Option<String>,

    #[arg(short, long)]
    notes: Option<String>,
}

impl FieldArgs {
    fn apply(self, draft: &mut ApplicationDraft) -> Result<()> {
        if let Some(status) = self.status {
            draft.status = status.parse::<Status>()?;
        }
        if let Some(date) = self.date {
            draft.application_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", date))?;
        }
        if let Some(location) = self.location {
            draft.location = location;
        }
        if let Some(url) = self.url {
            draft.job_url = url;
        }
        if let Some(salary) = self.salary {
            draft.salary_range = salary;
        }
        if let Some(notes) = self.notes {
            draft.notes = notes;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = cli.db.clone().unwrap_or_else(SqliteStore::default_path);
    let store = SqliteStore::open(&path)?;
    let command = cli.command.unwrap_or(Commands::Board);

    let _guard = if matches!(command, Commands::Board) {
        Some(logging::init_file(log_dir(&path), cli.verbose))
    } else {
        logging::init_stderr(cli.verbose);
        None
    };

    let mut board = Board::new(store);
    tracing::debug!(path = ?board.storage().store().path(), "Opened store");
    board.load_initial();

    match command {
        Commands::Board => {
            tui::run_board(&mut board)?;
        }

        Commands::Add {
            company,
            position,
            fields,
        } => {
            let mut draft = board.new_draft(Status::Wishlist);
            draft.company = company;
            draft.position = position;
            fields.apply(&mut draft)?;
            let id = board.create_or_update(draft, None)?;
            println!("Added application {}", id);
        }

        Commands::Edit {
            id,
            company,
            position,
            fields,
        } => {
            let mut draft = board
                .edit_draft(&id)
                .ok_or_else(|| anyhow!("Application {} not found", id))?;
            if let Some(company) = company {
                draft.company = company;
            }
            if let Some(position) = position {
                draft.position = position;
            }
            fields.apply(&mut draft)?;
            board.create_or_update(draft, Some(&id))?;
            println!("Updated application {}", id);
        }

        Commands::List { search, status } => {
            let only = status.map(|s| s.parse::<Status>()).transpose()?;
            let view = board.view(&search);
            if view.iter().all(|col| col.applications.is_empty()) {
                println!("No applications found.");
            }
            for col in view {
                if only.is_some_and(|s| s != col.column.id) || col.applications.is_empty() {
                    continue;
                }
                println!("{} ({})", col.column.title, col.count());
                println!("{:<16} {:<22} {:<26} {:<14}", "ID", "COMPANY", "POSITION", "DATE");
                println!("{}", "-".repeat(80));
                for app in &col.applications {
                    println!(
                        "{:<16} {:<22} {:<26} {:<14}",
                        app.id,
                        truncate(&app.company, 20),
                        truncate(&app.position, 24),
                        app.display_date()
                    );
                }
                println!();
            }
        }

        Commands::Show { id } => {
            print_application(require(&board, &id)?);
        }

        Commands::Move { id, status } => {
            require(&board, &id)?;
            board.change_status(&id, &status)?;
            let title = status.parse::<Status>().map(|s| column_for(s).title)?;
            println!("Moved {} to {}", id, title);
        }

        Commands::Delete { id, yes } => {
            let app = require(&board, &id)?;
            if !yes {
                let confirm = Confirm::new()
                    .with_prompt(format!(
                        "Delete {} at {}? Are you sure?",
                        app.position, app.company
                    ))
                    .default(false)
                    .interact()
                    .unwrap_or(false);

                if !confirm {
                    println!("Delete cancelled");
                    return Ok(());
                }
            }
            board.delete_record(&id);
            println!("Deleted application {}", id);
        }

        Commands::Columns => {
            for column in &COLUMNS {
                println!("{:<14} {}", column.id, column.title);
            }
        }
    }

    Ok(())
}

fn require<'a, S: KeyValueStore>(board: &'a Board<S>, id: &str) -> Result<&'a Application> {
    board
        .get(id)
        .ok_or_else(|| anyhow!("Application {} not found", id))
}

fn log_dir(db_path: &Path) -> &Path {
    match db_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

fn print_application(app: &Application) {
    println!("Application {}", app.id);
    println!("Company: {}", app.company);
    println!("Position: {}", app.position);
    println!("Status: {}", column_for(app.status).title);
    if let Some(location) = &app.location {
        println!("Location: {}", location);
    }
    println!("Applied: {}", app.display_date());
    if let Some(salary) = &app.salary_range {
        println!("Salary: {}", salary);
    }
    if let Some(url) = &app.job_url {
        println!("URL: {}", url);
    }
    println!("Created: {}", app.created_at.to_rfc3339());
    println!("Updated: {}", app.updated_at.to_rfc3339());
    if let Some(notes) = &app.notes {
        println!("\n--- Notes ---\n{}", textwrap::fill(notes, 80));
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
