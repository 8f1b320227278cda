//! `rollcall` - CLI for the roll call tracker
//!
//! This binary manages the roster, marks attendance by hand or from scanned
//! QR payloads, and prints dashboards, reports and CSV exports.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;

use rollcall::cli::{
    AttendanceCommand, Cli, Command, ConfigCommand, ReportCommand, ScanCommand, SearchCommand,
    StudentCommand,
};
use rollcall::export::{daily_csv, report_csv, ExportFile};
use rollcall::scan::{
    FrameSource, LineFrameSource, ScanHandle, ScanLoop, ScanObserver, ScanOutcome, ScanStatus,
    TextDecoder,
};
use rollcall::search::{search, suggestions, Highlighted};
use rollcall::views::{
    attendance_for, dashboard, display_date, report, roster, AttendanceSheet, Dashboard, Report,
};
use rollcall::{init_logging, AttendanceStatus, Config, Error, QrPayload, Registry, Storage};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Student(cmd) => handle_student(&config, cmd),
        Command::Mark(cmd) => handle_mark(&config, &cmd.id, cmd.json),
        Command::Dashboard(cmd) => handle_dashboard(&config, cmd.json),
        Command::Attendance(cmd) => handle_attendance(&config, &cmd),
        Command::Report(cmd) => handle_report(&config, &cmd),
        Command::Search(cmd) => handle_search(&config, &cmd),
        Command::Scan(cmd) => handle_scan(&config, &cmd),
        Command::Status(cmd) => handle_status(&config, cli.config.as_deref(), cmd.json),
        Command::Config(cmd) => handle_config(&config, cli.config, cmd),
    }
}

fn open_registry(config: &Config) -> Result<Registry> {
    let path = config.database_path();
    let storage = Storage::open(&path)
        .with_context(|| format!("failed to open database {}", path.display()))?;
    Ok(Registry::load(storage))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn emph(text: &Highlighted) -> String {
    text.wrap("[", "]")
}

fn handle_student(config: &Config, cmd: StudentCommand) -> Result<()> {
    let mut registry = open_registry(config)?;
    match cmd {
        StudentCommand::Add {
            id,
            name,
            class,
            email,
        } => {
            let student = registry.add_student(&id, &name, email.as_deref(), &class)?;
            println!("Added {} ({}) to {}", student.name, student.id, student.class);
        }
        StudentCommand::Remove { id, yes } => {
            if !yes {
                println!("This will remove {id} and all of their attendance records.");
                println!("Use --yes to confirm.");
                return Ok(());
            }
            let removal = registry.delete_student(&id)?;
            match removal.student {
                Some(student) => println!(
                    "Removed {} ({}) and {} attendance record(s)",
                    student.name, student.id, removal.records_removed
                ),
                None => println!("No student with ID {id}"),
            }
        }
        StudentCommand::List { filter, json } => {
            let view = roster(&registry, filter.as_deref());
            if json {
                return print_json(&view);
            }
            if view.cards.is_empty() {
                println!("No students yet. Add one with `rollcall student add`.");
                return Ok(());
            }
            for card in view.visible() {
                println!("{}", emph(&card.text));
            }
            if view.filter.is_some() {
                println!();
                println!("{} of {} students", view.visible_count(), view.cards.len());
            }
        }
        StudentCommand::Qr { id } => {
            let student = registry
                .find_student(&id)
                .ok_or_else(|| Error::student_not_found(&id))?;
            println!("{}", QrPayload::for_student(student).to_json()?);
        }
    }
    Ok(())
}

fn handle_mark(config: &Config, id: &str, json: bool) -> Result<()> {
    let mut registry = open_registry(config)?;
    let outcome = registry.mark_attendance(id, AttendanceStatus::Present)?;
    if json {
        return print_json(outcome.record());
    }

    let record = outcome.record();
    let name = registry
        .find_student(id)
        .map_or("Unknown", |s| s.name.as_str());
    let verb = if outcome.was_update() {
        "Updated"
    } else {
        "Marked"
    };
    println!(
        "{verb} {name} ({id}) {} at {} on {}",
        record.status,
        record.time_label(),
        record.date_label()
    );
    Ok(())
}

fn handle_dashboard(config: &Config, json: bool) -> Result<()> {
    let registry = open_registry(config)?;
    let board = dashboard(&registry, today(), config.views.recent_limit);
    if json {
        return print_json(&board);
    }
    print_dashboard(&board);
    Ok(())
}

fn print_dashboard(board: &Dashboard) {
    println!("Dashboard for {}", display_date(board.date));
    println!("-----------------------------");
    println!("Students:      {}", board.total_students);
    println!("Present today: {}", board.present_today);
    println!("Absent today:  {}", board.absent_today);
    println!("Rate:          {}%", board.attendance_rate);
    println!();
    println!("Recent activity");
    if board.recent.is_empty() {
        println!("  No attendance recorded yet");
    }
    for entry in &board.recent {
        println!(
            "  {:<24} {:<10} {} {}  {}",
            entry.student_name.as_deref().unwrap_or("Unknown"),
            entry.student_id,
            entry.record.date_label(),
            entry.record.time_label(),
            entry.record.status.label()
        );
    }
}

fn export_dir(config: &Config, out: Option<&Path>) -> PathBuf {
    out.map_or_else(|| config.export_dir(), Path::to_path_buf)
}

fn write_export(file: &ExportFile, dir: &Path) -> Result<()> {
    let path = file.write_to(dir)?;
    println!("Exported {}", path.display());
    Ok(())
}

fn handle_attendance(config: &Config, cmd: &AttendanceCommand) -> Result<()> {
    let registry = open_registry(config)?;
    let date = cmd.date.unwrap_or_else(today);

    if cmd.export {
        let file = daily_csv(&registry, date)?;
        return write_export(&file, &export_dir(config, cmd.out.as_deref()));
    }

    let sheet = attendance_for(&registry, date);
    if cmd.json {
        return print_json(&sheet);
    }
    print_sheet(&sheet);
    Ok(())
}

fn print_sheet(sheet: &AttendanceSheet) {
    println!("Attendance for {}", display_date(sheet.date));
    if sheet.rows.is_empty() {
        println!("  No attendance records for this date");
        return;
    }
    for row in &sheet.rows {
        println!(
            "  {:<24} {:<10} {:<8} {}  {}",
            row.student_name,
            row.student_id,
            row.class,
            row.time,
            row.status.label()
        );
    }
}

fn handle_report(config: &Config, cmd: &ReportCommand) -> Result<()> {
    let registry = open_registry(config)?;
    let report = report(&registry, cmd.period.into(), today());

    if cmd.export {
        let file = report_csv(&report)?;
        return write_export(&file, &export_dir(config, cmd.out.as_deref()));
    }
    if cmd.json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &Report) {
    println!(
        "Report ({}): {} to {}",
        report.period,
        display_date(report.range.start),
        display_date(report.range.end)
    );
    println!("-----------------------------");
    println!("Records:          {}", report.total_records);
    println!("Present:          {}", report.present_count);
    println!("Students tracked: {}", report.students_tracked);
    match report.overall_rate {
        Some(rate) => println!("Overall rate:     {rate}%"),
        None => println!("Overall rate:     n/a"),
    }
    println!();
    for line in &report.students {
        println!(
            "  {:<24} {:<10} {:<8} {:>3}/{:<3} {:>3}%",
            line.name, line.student_id, line.class, line.present_days, line.total_days, line.rate
        );
    }
}

fn handle_search(config: &Config, cmd: &SearchCommand) -> Result<()> {
    let registry = open_registry(config)?;

    if cmd.suggest {
        let picks = suggestions(&registry, &cmd.query, &config.search);
        if cmd.json {
            return print_json(&picks);
        }
        for pick in &picks {
            println!("{}  {}", pick.id, emph(&pick.name));
        }
        return Ok(());
    }

    let Some(results) = search(&registry, &cmd.query) else {
        println!("Enter a search query.");
        return Ok(());
    };
    if cmd.json {
        return print_json(&results);
    }

    println!("Search results for \"{}\" ({} found)", results.query, results.total());
    if results.is_empty() {
        println!("  No results found");
        return Ok(());
    }
    if !results.students.is_empty() {
        println!();
        println!("Students ({})", results.students.len());
        for hit in &results.students {
            let email = hit.email.as_ref().map(emph).unwrap_or_default();
            println!(
                "  {}  ID: {}  Class: {}  {}",
                emph(&hit.name),
                emph(&hit.id),
                emph(&hit.class),
                email
            );
        }
    }
    if !results.attendance.is_empty() {
        println!();
        println!("Attendance ({})", results.attendance.len());
        for hit in &results.attendance {
            println!(
                "  {} ({})  {}  {}  {}",
                emph(&hit.name),
                emph(&hit.id),
                emph(&hit.date),
                emph(&hit.time),
                hit.record.status.label()
            );
        }
    }
    Ok(())
}

/// Prints scan progress to the terminal.
#[derive(Debug)]
struct TerminalObserver;

impl ScanObserver for TerminalObserver {
    fn status(&mut self, status: &ScanStatus) {
        match status {
            ScanStatus::Marked { .. } | ScanStatus::InvalidCode { .. } => println!("{status}"),
            ScanStatus::DeviceError { .. } => eprintln!("{status}"),
            ScanStatus::PointCamera => {}
        }
    }
}

fn handle_scan(config: &Config, cmd: &ScanCommand) -> Result<()> {
    let mut registry = open_registry(config)?;
    let delay = cmd
        .delay_ms
        .map_or_else(|| config.success_delay(), std::time::Duration::from_millis);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let outcome = runtime.block_on(async {
        let mut source = LineFrameSource::stdin();
        let mut decoder = TextDecoder;
        let handle = ScanHandle::new();
        let mut observer = TerminalObserver;
        let mut scan = ScanLoop::new(delay);

        println!("Waiting for a QR code (Ctrl-C to stop)...");
        let finished = {
            let run = scan.run(
                &mut registry,
                &mut source,
                &mut decoder,
                &handle,
                &mut observer,
            );
            tokio::select! {
                outcome = run => Some(outcome),
                _ = tokio::signal::ctrl_c() => None,
            }
        };
        match finished {
            Some(outcome) => outcome,
            None => {
                handle.stop();
                source.release();
                Ok(ScanOutcome::Cancelled)
            }
        }
    });
    // A stdin read blocks a runtime thread until the next line arrives;
    // dropping the runtime normally would wait for it after Ctrl-C.
    runtime.shutdown_background();
    let outcome = outcome?;

    match outcome {
        ScanOutcome::Marked(_) => {}
        ScanOutcome::Cancelled => println!("Scan cancelled"),
        ScanOutcome::SourceClosed => println!("No valid QR code scanned"),
        ScanOutcome::DeviceUnavailable(message) => {
            anyhow::bail!("frame source unavailable: {message}")
        }
    }
    Ok(())
}

fn handle_status(config: &Config, config_path: Option<&Path>, json: bool) -> Result<()> {
    let registry = open_registry(config)?;
    let stats = registry.storage().stats()?;
    let config_path = config_path.map_or_else(Config::default_config_path, Path::to_path_buf);

    if json {
        let status = serde_json::json!({
            "database_path": registry.storage().path(),
            "config_path": config_path,
            "students": registry.students().len(),
            "attendance_records": registry.attendance().len(),
            "slots_written": stats.slots_written,
            "last_write": stats.last_write,
            "db_size_bytes": stats.db_size_bytes,
        });
        return print_json(&status);
    }

    println!("rollcall status");
    println!("---------------");
    println!("Database:      {}", registry.storage().path().display());
    println!("Config:        {}", config_path.display());
    println!("Students:      {}", registry.students().len());
    println!("Records:       {}", registry.attendance().len());
    println!(
        "Last write:    {}",
        stats.last_write.as_deref().unwrap_or("never")
    );
    println!("Size:          {} bytes", stats.db_size_bytes);
    Ok(())
}

fn handle_config(config: &Config, config_path: Option<PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                return print_json(config);
            }
            println!("Current Configuration");
            println!("=====================");
            println!();
            println!("[Storage]");
            println!("  Database path:      {}", config.database_path().display());
            println!();
            println!("[Scan]");
            println!("  Success delay (ms): {}", config.scan.success_delay_ms);
            println!();
            println!("[Views]");
            println!("  Recent limit:       {}", config.views.recent_limit);
            println!();
            println!("[Search]");
            println!("  Suggestion limit:   {}", config.search.suggestion_limit);
            println!("  Suggestion min:     {}", config.search.suggestion_min_chars);
            println!();
            println!("[Export]");
            println!("  Directory:          {}", config.export_dir().display());
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
