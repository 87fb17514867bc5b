pub mod backup;
pub mod export;
pub mod import;
pub mod init;
pub mod load;
pub mod merge;
pub mod models;
pub mod notifications;
pub mod payments;
pub mod restore;
pub mod stats;
pub mod status;

use std::sync::OnceLock;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use regex::Regex;

use crate::error::{AtelierError, Result};
use crate::settings::db_path;
use crate::store::Store;

/// Open the store in the configured data directory. Refuses to create a
/// database implicitly; `atelier init` does that.
pub(crate) fn open_store() -> Result<Store> {
    let path = db_path();
    if !path.exists() {
        return Err(AtelierError::Settings(format!(
            "No database found at {}\nRun `atelier init` to set up.",
            path.display()
        )));
    }
    Store::open(&path)
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub(crate) fn current_month() -> String {
    today().format("%Y-%m").to_string()
}

/// Validate a `YYYY-MM` argument.
pub(crate) fn parse_month(month: &str) -> Result<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").expect("valid month regex"));
    let month = month.trim();
    if re.is_match(month) {
        Ok(month.to_string())
    } else {
        Err(AtelierError::InvalidDate(format!("{month} (expected YYYY-MM)")))
    }
}

/// Amounts must survive a JSON round trip, which rules out NaN and infinities.
pub(crate) fn check_amount(amount: f64) -> Result<f64> {
    if amount.is_finite() {
        Ok(amount)
    } else {
        Err(AtelierError::InvalidAmount(format!("{amount} (expected a number of euros)")))
    }
}

/// Validate a `YYYY-MM-DD` argument.
pub(crate) fn parse_day(day: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(day.trim(), "%Y-%m-%d")
        .map_err(|_| AtelierError::InvalidDate(format!("{day} (expected YYYY-MM-DD)")))
}

#[derive(Parser)]
#[command(
    name = "atelier",
    version,
    about = "Monthly payment ledger reconciliation for a modeling agency."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up atelier: choose a data directory and initialize the database.
    Init {
        /// Path for atelier data (default: ~/Documents/atelier)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Agency name shown in reports
        #[arg(long)]
        agency: Option<String>,
    },
    /// Switch to an existing atelier data directory.
    Load {
        /// Path to data directory containing atelier.db
        path: String,
    },
    /// Show current database and collection sizes.
    Status,
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/atelier-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
    /// Replace all collections with a full data export (JSON).
    Restore {
        /// Path to the export file
        file: String,
    },
    /// Write every collection as one JSON document.
    Export {
        /// Output path (default: stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Inspect model records.
    Models {
        #[command(subcommand)]
        command: ModelsCommands,
    },
    /// Record, list and delete monthly payments.
    Payments {
        #[command(subcommand)]
        command: PaymentsCommands,
    },
    /// Import payments from a JSON array or a full data export.
    Import {
        /// Path to the JSON file
        file: String,
        /// Show what would be added without saving
        #[arg(long = "dry-run")]
        dry_run: bool,
        /// Import even if this exact file was imported before
        #[arg(long)]
        force: bool,
    },
    /// Fold duplicate model records together and drop duplicate payments.
    Merge {
        /// Report what would change without saving
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Per-model payment summary.
    Stats {
        /// Month that counts as current: YYYY-MM (default: this month)
        #[arg(long)]
        month: Option<String>,
        /// Only show models whose name matches
        #[arg(long)]
        model: Option<String>,
    },
    /// Show pending casting applications, bookings, messages and reservations.
    Notifications {
        /// Mark a notification as read for this session (repeatable)
        #[arg(long = "mark-read")]
        mark_read: Vec<String>,
        /// Mark everything as read for this session
        #[arg(long = "all-read")]
        all_read: bool,
    },
}

#[derive(Subcommand)]
pub enum ModelsCommands {
    /// List models grouped by normalized name.
    List {
        /// Only show names shared by several records
        #[arg(long)]
        duplicates: bool,
    },
}

#[derive(Subcommand)]
pub enum PaymentsCommands {
    /// List payments, newest first.
    List {
        /// Filter by model name
        #[arg(long)]
        model: Option<String>,
        /// Filter by month: YYYY-MM
        #[arg(long)]
        month: Option<String>,
    },
    /// Record a payment.
    Add {
        /// Model name
        #[arg(long)]
        model: String,
        /// Amount in euros
        #[arg(long)]
        amount: f64,
        /// Payment date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Month the payment covers: YYYY-MM (default: month of --date)
        #[arg(long)]
        month: Option<String>,
        /// Method: especes, virement, autre
        #[arg(long, default_value = "virement")]
        method: String,
        /// Status: paye, en-attente, en-retard
        #[arg(long, default_value = "paye")]
        status: String,
        #[arg(long)]
        notes: Option<String>,
        /// Record it even if it looks like a duplicate
        #[arg(long)]
        force: bool,
    },
    /// Delete a payment by ID.
    Delete {
        /// Payment ID (shown in `atelier payments list`)
        id: String,
    },
}
