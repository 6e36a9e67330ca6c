mod models;
mod roster;
mod sheets;
mod store;
mod tui;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use models::EXPECTED_HEADERS;
use roster::FilterSet;
use sheets::{ServiceAccountKey, SheetsSession};
use store::{RosterStore, StoreError};

#[derive(Parser)]
#[command(name = "talent")]
#[command(about = "Talent pool roster - view, filter, and edit applicant records")]
struct Cli {
    /// Path to the service account key file (falls back to
    /// TALENT_CREDENTIALS, then the user config dir)
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Spreadsheet id of the talent pool database (falls back to
    /// TALENT_SPREADSHEET_ID)
    #[arg(long)]
    spreadsheet: Option<String>,

    /// Sheet name within the spreadsheet
    #[arg(long, default_value = "Sheet1")]
    sheet: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Only records with this exact name
    #[arg(long)]
    name: Option<String>,

    /// Only records with this exact code
    #[arg(long)]
    code: Option<String>,

    /// Only records from this university
    #[arg(long)]
    universitas: Option<String>,

    /// Only records with this major
    #[arg(long)]
    major: Option<String>,
}

impl FilterArgs {
    fn into_filters(self) -> FilterSet {
        let mut filters = FilterSet::default();
        filters.set("name", self.name);
        filters.set("code", self.code);
        filters.set("universitas", self.universitas);
        filters.set("major", self.major);
        filters
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List applicants, one page at a time
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Page number (10 records per page)
        #[arg(short, long, default_value = "1")]
        page: usize,
    },

    /// Show one applicant in full
    Show {
        /// Row number as printed by `list`
        row: usize,
    },

    /// Write one cell: row, column name, new value
    Set {
        row: usize,
        column: String,
        value: String,
    },

    /// Export the filtered roster as CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Count applicants per code / university / major
    Summary {
        /// Single grouping field; all of them if omitted
        #[arg(short, long)]
        by: Option<String>,
    },

    /// Interactive roster screen
    Browse {
        #[command(flatten)]
        filters: FilterArgs,
    },
}

fn credentials_path(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    if let Ok(path) = std::env::var("TALENT_CREDENTIALS") {
        return Ok(PathBuf::from(path));
    }
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "talent") {
        return Ok(proj_dirs.config_dir().join("credentials.json"));
    }
    bail!("No credentials file. Pass --credentials or set TALENT_CREDENTIALS.")
}

fn spreadsheet_id(flag: Option<String>) -> Result<String> {
    flag.or_else(|| std::env::var("TALENT_SPREADSHEET_ID").ok())
        .ok_or_else(|| anyhow!("No spreadsheet id. Pass --spreadsheet or set TALENT_SPREADSHEET_ID."))
}

/// EmptyData degrades to an empty roster with a visible notice; every
/// other fetch failure aborts the command.
fn fetch_or_empty(store: &RosterStore<SheetsSession>) -> Result<models::RosterSnapshot> {
    match store.fetch_all() {
        Ok(snapshot) => Ok(snapshot),
        Err(StoreError::EmptyData) => {
            eprintln!("No data found in the sheet.");
            Ok(Vec::new())
        }
        Err(e) => Err(e).context("Failed to fetch the roster"),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let key_path = credentials_path(cli.credentials)?;
    let key = ServiceAccountKey::from_file(&key_path)?;
    let spreadsheet = spreadsheet_id(cli.spreadsheet)?;

    // One authenticated session for the whole process; every command
    // borrows it.
    let session = SheetsSession::connect(&key, &spreadsheet, &cli.sheet)
        .context("Could not open a session against the talent pool sheet")?;
    let store = RosterStore::new(&session);

    match cli.command {
        Commands::List { filters, page } => {
            let snapshot = fetch_or_empty(&store)?;
            let filters = filters.into_filters();
            let filtered = roster::apply_filters(&snapshot, &filters);
            let total_pages = roster::total_pages(filtered.len());
            let page_records = roster::page(&filtered, page);

            if page_records.is_empty() {
                println!("No applicants found.");
            } else {
                println!(
                    "{:<5} {:<22} {:<6} {:<18} {:<14} {:<16} {:<8} {:<12}",
                    "ROW", "NAME", "CODE", "UNIVERSITAS", "MAJOR", "STATUS", "UNIT", "USER"
                );
                println!("{}", "-".repeat(108));
                for record in page_records {
                    let descriptor = roster::row_descriptor(record);
                    let unit = descriptor
                        .cell("select_unit")
                        .map(|c| c.display().to_string())
                        .unwrap_or_default();
                    println!(
                        "{:<5} {:<22} {:<6} {:<18} {:<14} {:<16} {:<8} {:<12}",
                        record.row,
                        truncate(&record.name, 20),
                        truncate(&record.code, 5),
                        truncate(&record.universitas, 16),
                        truncate(&record.major, 12),
                        record.status_display().label(),
                        truncate(&unit, 7),
                        truncate(&record.user, 11),
                    );
                }
                println!(
                    "\nPage {}/{} ({} of {} records match)",
                    page.clamp(1, total_pages.max(1)),
                    total_pages.max(1),
                    filtered.len(),
                    snapshot.len()
                );
            }
        }

        Commands::Show { row } => {
            let snapshot = fetch_or_empty(&store)?;
            let record = snapshot
                .get(row)
                .ok_or_else(|| anyhow!("No record at row {row} (roster has {} rows)", snapshot.len()))?;
            let descriptor = roster::row_descriptor(record);
            println!("Row {}", record.row);
            for cell in &descriptor.cells {
                let marker = if cell.is_editable() { "*" } else { " " };
                println!("{} {:<12} {}", marker, cell.column, cell.display());
            }
            println!("\n* editable via `talent set` or the browse screen");
        }

        Commands::Set { row, column, value } => {
            match store.write_cell(row, &column, &value) {
                Ok(()) => println!("Updated {column} for row {row}."),
                Err(StoreError::UnknownColumn(column)) => {
                    // the edit is dropped; the next fetch reconciles
                    eprintln!("No column named '{column}' in the sheet header; nothing was written.");
                    std::process::exit(1);
                }
                Err(e) => return Err(e).context("Failed to write the cell"),
            }
        }

        Commands::Export { filters, output } => {
            let snapshot = fetch_or_empty(&store)?;
            let filters = filters.into_filters();
            let filtered = roster::apply_filters(&snapshot, &filters);
            let columns: Vec<&str> = EXPECTED_HEADERS.to_vec();
            let csv = roster::export_csv(&filtered, &columns)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, csv)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported {} records to {}", filtered.len(), path.display());
                }
                None => print!("{csv}"),
            }
        }

        Commands::Summary { by } => {
            let snapshot = fetch_or_empty(&store)?;
            let fields: Vec<&str> = match &by {
                Some(field) => {
                    if !roster::SUMMARY_FIELDS.contains(&field.as_str()) {
                        bail!(
                            "Cannot group by '{}'. Available: {}",
                            field,
                            roster::SUMMARY_FIELDS.join(", ")
                        );
                    }
                    vec![field.as_str()]
                }
                None => roster::SUMMARY_FIELDS.to_vec(),
            };
            for field in fields {
                println!("By {field}:");
                let counts = roster::summary(&snapshot, field);
                if counts.is_empty() {
                    println!("  (no records)");
                }
                for (value, count) in counts {
                    let label = if value.is_empty() { "(blank)" } else { &value };
                    println!("  {:<24} {}", truncate(label, 22), count);
                }
                println!();
            }
        }

        Commands::Browse { filters } => {
            tui::run_browse(&store, filters.into_filters())?;
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
