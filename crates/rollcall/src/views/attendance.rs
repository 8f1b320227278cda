//! Attendance for a single calendar day, joined to the roster.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{AttendanceRecord, AttendanceStatus};
use crate::registry::Registry;

/// A log record joined to its student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceRow {
    /// Student name.
    pub student_name: String,
    /// Student ID.
    pub student_id: String,
    /// Student class.
    pub class: String,
    /// Day of the mark.
    pub date: NaiveDate,
    /// Time of the mark (`HH:MM:SS`).
    pub time: String,
    /// Mark status.
    pub status: AttendanceStatus,
}

/// The table for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceSheet {
    /// The selected day.
    pub date: NaiveDate,
    /// One row per record whose student is on the roster.
    pub rows: Vec<AttendanceRow>,
}

/// Build the table for `date`.
#[must_use]
pub fn attendance_for(registry: &Registry, date: NaiveDate) -> AttendanceSheet {
    let rows = join(registry, registry.attendance().iter().filter(|a| a.date == date));
    AttendanceSheet { date, rows }
}

/// Join records to their students, dropping records with no student.
pub(crate) fn join<'a>(
    registry: &Registry,
    records: impl Iterator<Item = &'a AttendanceRecord>,
) -> Vec<AttendanceRow> {
    records
        .filter_map(|record| {
            registry
                .find_student(&record.student_id)
                .map(|student| AttendanceRow {
                    student_name: student.name.clone(),
                    student_id: student.id.clone(),
                    class: student.class.clone(),
                    date: record.date,
                    time: record.time_label(),
                    status: record.status,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use chrono::{Local, TimeZone};

    #[test]
    fn test_attendance_for_day_joins_and_drops_orphans() {
        let mut registry = Registry::load(Storage::open_in_memory().unwrap());
        registry.add_student("S1", "Ann", None, "10A").unwrap();
        registry.add_student("S2", "Bob", None, "10B").unwrap();

        let day14 = Local.with_ymd_and_hms(2024, 3, 14, 8, 5, 9).single().unwrap();
        let day15 = Local.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).single().unwrap();
        registry
            .mark_attendance_at("S2", AttendanceStatus::Present, day14)
            .unwrap();
        registry
            .mark_attendance_at("ghost", AttendanceStatus::Present, day14)
            .unwrap();
        registry
            .mark_attendance_at("S1", AttendanceStatus::Present, day14)
            .unwrap();
        registry
            .mark_attendance_at("S1", AttendanceStatus::Present, day15)
            .unwrap();

        let sheet = attendance_for(&registry, day14.date_naive());
        let ids: Vec<_> = sheet.rows.iter().map(|r| r.student_id.as_str()).collect();
        assert_eq!(ids, ["S2", "S1"]);
        assert_eq!(sheet.rows[0].student_name, "Bob");
        assert_eq!(sheet.rows[0].time, "08:05:09");
    }

    #[test]
    fn test_attendance_for_empty_day() {
        let registry = Registry::load(Storage::open_in_memory().unwrap());
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(attendance_for(&registry, date).rows.is_empty());
    }
}
