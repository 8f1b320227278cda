//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::views::ReportPeriod;

/// Roster management commands.
#[derive(Debug, Subcommand)]
pub enum StudentCommand {
    /// Add a student to the roster
    Add {
        /// Unique student ID
        id: String,

        /// Full name
        name: String,

        /// Class or section
        #[arg(long)]
        class: String,

        /// Contact email
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Remove a student and all of their attendance
    Remove {
        /// Student ID
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List roster students
    List {
        /// Only show cards containing this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print the check-in QR payload for a student
    Qr {
        /// Student ID
        id: String,
    },
}

/// Mark command arguments.
#[derive(Debug, Args)]
pub struct MarkCommand {
    /// Student ID to mark present
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Dashboard command arguments.
#[derive(Debug, Args)]
pub struct DashboardCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Attendance command arguments.
#[derive(Debug, Args)]
pub struct AttendanceCommand {
    /// Day to show (YYYY-MM-DD, defaults to today)
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Write the day's attendance to a CSV file
    #[arg(long)]
    pub export: bool,

    /// Directory for the exported file
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Report command arguments.
#[derive(Debug, Args)]
pub struct ReportCommand {
    /// Period to summarise
    #[arg(short, long, value_enum, default_value = "today")]
    pub period: PeriodArg,

    /// Write the report records to a CSV file
    #[arg(long)]
    pub export: bool,

    /// Directory for the exported file
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// The search query (matches students and attendance)
    pub query: String,

    /// Show name/ID suggestions instead of full results
    #[arg(short, long)]
    pub suggest: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Scan command arguments.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Pause after a successful mark, in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Report period argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PeriodArg {
    /// Today only
    Today,
    /// Since Sunday
    Week,
    /// Since the first of the month
    Month,
    /// All records
    All,
}

impl From<PeriodArg> for ReportPeriod {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Today => Self::Today,
            PeriodArg::Week => Self::Week,
            PeriodArg::Month => Self::Month,
            PeriodArg::All => Self::All,
        }
    }
}
