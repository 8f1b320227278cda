//! Command-line interface for rollcall.
//!
//! This module provides the CLI structure for the `rollcall` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AttendanceCommand, ConfigCommand, DashboardCommand, MarkCommand, PeriodArg, ReportCommand,
    ScanCommand, SearchCommand, StatusCommand, StudentCommand,
};

/// rollcall - Offline roster and QR check-in attendance
///
/// Keeps a student roster and a daily attendance log on this machine, marks
/// students present from scanned QR payloads, and exports CSV reports.
#[derive(Debug, Parser)]
#[command(name = "rollcall")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the roster
    #[command(subcommand)]
    Student(StudentCommand),

    /// Mark a student present now
    Mark(MarkCommand),

    /// Show today's counts and recent activity
    Dashboard(DashboardCommand),

    /// Show or export one day of attendance
    Attendance(AttendanceCommand),

    /// Summarise attendance over a period
    Report(ReportCommand),

    /// Search students and attendance
    Search(SearchCommand),

    /// Read scanned QR payloads from stdin and mark the first valid one
    Scan(ScanCommand),

    /// Show database status
    Status(StatusCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clap::CommandFactory;

    fn cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "rollcall");
    }

    #[test]
    fn test_verbosity() {
        use crate::logging::Verbosity;

        assert_eq!(cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli(2, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_student_add() {
        let args = [
            "rollcall", "student", "add", "S1", "Ann Lee", "--class", "10A", "-e", "a@x.test",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Student(StudentCommand::Add {
            id,
            name,
            class,
            email,
        }) = cli.command
        else {
            panic!("expected student add");
        };
        assert_eq!(id, "S1");
        assert_eq!(name, "Ann Lee");
        assert_eq!(class, "10A");
        assert_eq!(email.as_deref(), Some("a@x.test"));
    }

    #[test]
    fn test_student_add_requires_class() {
        let args = ["rollcall", "student", "add", "S1", "Ann"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_attendance_date() {
        let args = ["rollcall", "attendance", "--date", "2024-03-14", "--export"];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Attendance(cmd) = cli.command else {
            panic!("expected attendance");
        };
        assert_eq!(cmd.date, NaiveDate::from_ymd_opt(2024, 3, 14));
        assert!(cmd.export);
    }

    #[test]
    fn test_parse_report_period() {
        let args = ["rollcall", "report", "--period", "week"];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Report(cmd) = cli.command else {
            panic!("expected report");
        };
        assert_eq!(cmd.period, PeriodArg::Week);

        let cli = Cli::try_parse_from(["rollcall", "report"]).unwrap();
        assert!(matches!(cli.command, Command::Report(ReportCommand { period: PeriodArg::Today, .. })));
    }

    #[test]
    fn test_parse_search() {
        let args = ["rollcall", "search", "ann", "--suggest"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Command::Search(SearchCommand { suggest: true, .. })));
    }

    #[test]
    fn test_parse_with_config() {
        let args = ["rollcall", "-c", "/custom/config.toml", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose_and_quiet() {
        let cli = Cli::try_parse_from(["rollcall", "-vv", "dashboard"]).unwrap();
        assert_eq!(cli.verbose, 2);

        let cli = Cli::try_parse_from(["rollcall", "-q", "dashboard"]).unwrap();
        assert!(cli.quiet);
    }
}
