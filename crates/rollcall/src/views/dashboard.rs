//! Dashboard projection: today's counts and the most recent marks.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{AttendanceRecord, AttendanceStatus};
use crate::registry::Registry;

use super::percent;

/// Today's summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    /// The day the counts refer to.
    pub date: NaiveDate,
    /// Roster size.
    pub total_students: usize,
    /// Present marks recorded for the day.
    pub present_today: usize,
    /// Roster size minus present marks. Negative only when marks exist for
    /// IDs that are not on the roster.
    pub absent_today: i64,
    /// Present marks as a rounded percentage of the roster.
    pub attendance_rate: u32,
    /// Latest log entries, newest (by storage order) first.
    pub recent: Vec<RecentEntry>,
}

/// One line of the recent-activity list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentEntry {
    /// The marked student's ID.
    pub student_id: String,
    /// The student's name, `None` if the ID is not on the roster.
    pub student_name: Option<String>,
    /// The underlying record.
    pub record: AttendanceRecord,
}

/// Build the dashboard for `today`.
#[must_use]
pub fn dashboard(registry: &Registry, today: NaiveDate, recent_limit: usize) -> Dashboard {
    let total_students = registry.students().len();
    let present_today = registry
        .attendance()
        .iter()
        .filter(|a| a.date == today && a.status == AttendanceStatus::Present)
        .count();
    let absent_today = to_i64(total_students) - to_i64(present_today);

    let recent = registry
        .attendance()
        .iter()
        .rev()
        .take(recent_limit)
        .map(|record| RecentEntry {
            student_id: record.student_id.clone(),
            student_name: registry
                .find_student(&record.student_id)
                .map(|s| s.name.clone()),
            record: record.clone(),
        })
        .collect();

    Dashboard {
        date: today,
        total_students,
        present_today,
        absent_today,
        attendance_rate: percent(present_today, total_students),
        recent,
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use chrono::{DateTime, Local, TimeZone};

    fn at(day: u32, minute: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, day, 9, minute, 0)
            .single()
            .unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_empty_dashboard() {
        let registry = Registry::load(Storage::open_in_memory().unwrap());
        let board = dashboard(&registry, day(14), 10);

        assert_eq!(board.total_students, 0);
        assert_eq!(board.present_today, 0);
        assert_eq!(board.absent_today, 0);
        assert_eq!(board.attendance_rate, 0);
        assert!(board.recent.is_empty());
    }

    #[test]
    fn test_counts_only_today() {
        let mut registry = Registry::load(Storage::open_in_memory().unwrap());
        for id in ["S1", "S2", "S3"] {
            registry.add_student(id, id, None, "10A").unwrap();
        }
        registry
            .mark_attendance_at("S1", AttendanceStatus::Present, at(13, 0))
            .unwrap();
        registry
            .mark_attendance_at("S1", AttendanceStatus::Present, at(14, 0))
            .unwrap();
        registry
            .mark_attendance_at("S2", AttendanceStatus::Present, at(14, 1))
            .unwrap();

        let board = dashboard(&registry, day(14), 10);
        assert_eq!(board.present_today, 2);
        assert_eq!(board.absent_today, 1);
        assert_eq!(board.attendance_rate, 67);
        assert_eq!(
            i64::try_from(board.present_today).unwrap() + board.absent_today,
            3
        );
    }

    #[test]
    fn test_present_plus_absent_is_roster_size_with_orphans() {
        let mut registry = Registry::load(Storage::open_in_memory().unwrap());
        registry.add_student("S1", "Ann", None, "10A").unwrap();
        registry
            .mark_attendance_at("S1", AttendanceStatus::Present, at(14, 0))
            .unwrap();
        registry
            .mark_attendance_at("ghost", AttendanceStatus::Present, at(14, 1))
            .unwrap();

        let board = dashboard(&registry, day(14), 10);
        assert_eq!(board.present_today, 2);
        assert_eq!(board.absent_today, -1);
        assert_eq!(
            i64::try_from(board.present_today).unwrap() + board.absent_today,
            1
        );
    }

    #[test]
    fn test_recent_is_reverse_storage_order() {
        let mut registry = Registry::load(Storage::open_in_memory().unwrap());
        registry.add_student("S1", "Ann", None, "10A").unwrap();
        for d in 1..=12 {
            registry
                .mark_attendance_at("S1", AttendanceStatus::Present, at(d, 0))
                .unwrap();
        }
        registry
            .mark_attendance_at("ghost", AttendanceStatus::Present, at(2, 0))
            .unwrap();

        let board = dashboard(&registry, day(14), 10);
        assert_eq!(board.recent.len(), 10);
        // Storage order wins over timestamps: the back-dated mark is newest.
        assert_eq!(board.recent[0].student_id, "ghost");
        assert!(board.recent[0].student_name.is_none());
        assert_eq!(board.recent[1].record.date, day(12));
        assert_eq!(board.recent[1].student_name.as_deref(), Some("Ann"));
    }
}
