//! CSV exports of attendance.
//!
//! Headers are written bare; every data field is double-quoted.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{QuoteStyle, WriterBuilder};

use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::views::{attendance_for, AttendanceRow, Report};

const DAILY_HEADER: &str = "Student Name,Student ID,Class,Time,Status";
const REPORT_HEADER: &str = "Student Name,Student ID,Class,Date,Time,Status";

/// A rendered CSV document and the name it should be saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    /// Suggested file name.
    pub file_name: String,
    /// CSV text.
    pub contents: String,
}

impl ExportFile {
    /// Write the document into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryCreate`] if `dir` cannot be created, or an
    /// I/O error if the file cannot be written.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| Error::DirectoryCreate {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.contents)?;
        tracing::info!(path = %path.display(), "Wrote export");
        Ok(path)
    }
}

/// Export the attendance for `date`.
///
/// Only roster students get a row, so a day whose marks all belong to
/// removed students exports as a header-only document.
///
/// # Errors
///
/// Returns [`Error::NothingToExport`] when nothing at all was recorded that
/// day, or an error if the CSV cannot be rendered.
pub fn daily_csv(registry: &Registry, date: NaiveDate) -> Result<ExportFile> {
    if !registry.attendance().iter().any(|a| a.date == date) {
        return Err(Error::NothingToExport { date });
    }
    let sheet = attendance_for(registry, date);

    let contents = render(DAILY_HEADER, &sheet.rows, |row| {
        vec![
            row.student_name.clone(),
            row.student_id.clone(),
            row.class.clone(),
            row.time.clone(),
            row.status.to_string(),
        ]
    })?;

    Ok(ExportFile {
        file_name: format!("attendance_{}.csv", date.format("%Y-%m-%d")),
        contents,
    })
}

/// Export the records of a period report. An empty report yields a
/// header-only document.
///
/// # Errors
///
/// Returns an error if the CSV cannot be rendered.
pub fn report_csv(report: &Report) -> Result<ExportFile> {
    let contents = render(REPORT_HEADER, &report.rows, |row| {
        vec![
            row.student_name.clone(),
            row.student_id.clone(),
            row.class.clone(),
            row.date.format("%Y-%m-%d").to_string(),
            row.time.clone(),
            row.status.to_string(),
        ]
    })?;

    Ok(ExportFile {
        file_name: format!(
            "attendance_report_{}_{}_{}.csv",
            report.period,
            report.range.start.format("%Y-%m-%d"),
            report.range.end.format("%Y-%m-%d")
        ),
        contents,
    })
}

fn render<F>(header: &str, rows: &[AttendanceRow], fields: F) -> Result<String>
where
    F: Fn(&AttendanceRow) -> Vec<String>,
{
    let mut buf = format!("{header}\n").into_bytes();
    {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut buf);
        for row in rows {
            writer.write_record(fields(row))?;
        }
        writer.flush()?;
    }
    String::from_utf8(buf).map_err(|e| Error::internal(format!("export is not UTF-8: {e}")))
}
