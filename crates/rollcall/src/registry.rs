//! The roster and attendance log service.
//!
//! [`Registry`] owns both collections for the lifetime of the process. It is
//! loaded once from [`Storage`] and writes the affected slot back after every
//! mutation. Mutations are not grouped into transactions: a student delete
//! persists the roster and then the log as two independent writes.

use chrono::{DateTime, Local, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{AttendanceRecord, AttendanceStatus, Student};
use crate::storage::{Slot, Storage};

/// Result of marking attendance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    /// First mark for this student today; appended to the log.
    Inserted(AttendanceRecord),
    /// The student was already marked today; the record was replaced in place.
    Updated {
        /// The record that was replaced.
        previous: AttendanceRecord,
        /// The record now in the log.
        record: AttendanceRecord,
    },
}

impl MarkOutcome {
    /// The record now stored in the log.
    #[must_use]
    pub fn record(&self) -> &AttendanceRecord {
        match self {
            Self::Inserted(record) | Self::Updated { record, .. } => record,
        }
    }

    /// Whether an existing same-day record was overwritten.
    #[must_use]
    pub fn was_update(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

/// What a student deletion removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// The removed student, if one matched.
    pub student: Option<Student>,
    /// Number of attendance records removed with the student.
    pub records_removed: usize,
}

/// Roster and attendance log, mirrored to storage.
#[derive(Debug)]
pub struct Registry {
    storage: Storage,
    students: Vec<Student>,
    attendance: Vec<AttendanceRecord>,
}

impl Registry {
    /// Load both collections from storage.
    ///
    /// A slot that is missing, unreadable, or does not parse loads as an
    /// empty collection.
    #[must_use]
    pub fn load(storage: Storage) -> Self {
        let students = load_slot(&storage, Slot::Students);
        let attendance = load_slot(&storage, Slot::Attendance);
        info!(
            "Loaded {} students and {} attendance records",
            students.len(),
            attendance.len()
        );
        Self {
            storage,
            students,
            attendance,
        }
    }

    /// The underlying storage.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The roster, in insertion order.
    #[must_use]
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    /// The attendance log, in storage order.
    #[must_use]
    pub fn attendance(&self) -> &[AttendanceRecord] {
        &self.attendance
    }

    /// Look up a student by ID.
    #[must_use]
    pub fn find_student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    /// Add a student, stamped with the current time.
    ///
    /// # Errors
    ///
    /// See [`Registry::add_student_at`].
    pub fn add_student(
        &mut self,
        id: &str,
        name: &str,
        email: Option<&str>,
        class: &str,
    ) -> Result<&Student> {
        self.add_student_at(id, name, email, class, Utc::now())
    }

    /// Add a student with an explicit creation time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] for empty required fields,
    /// [`Error::DuplicateId`] if the ID is taken (the roster is left
    /// unchanged), or a storage error if persisting fails.
    pub fn add_student_at(
        &mut self,
        id: &str,
        name: &str,
        email: Option<&str>,
        class: &str,
        created_at: DateTime<Utc>,
    ) -> Result<&Student> {
        let student = Student::new(id, name, email, class, created_at)?;
        if self.find_student(&student.id).is_some() {
            return Err(Error::duplicate_id(student.id));
        }

        info!("Adding student {} ({})", student.id, student.name);
        self.students.push(student);
        self.persist(Slot::Students)?;

        self.students
            .last()
            .ok_or_else(|| Error::internal("roster empty after insert"))
    }

    /// Delete a student and every attendance record that references it.
    ///
    /// Deleting an unknown ID is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a storage error if persisting fails.
    pub fn delete_student(&mut self, id: &str) -> Result<Removal> {
        let student = self
            .students
            .iter()
            .position(|s| s.id == id)
            .map(|index| self.students.remove(index));

        let before = self.attendance.len();
        self.attendance.retain(|a| a.student_id != id);
        let records_removed = before - self.attendance.len();

        if student.is_none() && records_removed == 0 {
            debug!("Delete of unknown student {} ignored", id);
            return Ok(Removal {
                student,
                records_removed,
            });
        }

        info!(
            "Deleted student {} and {} attendance records",
            id, records_removed
        );
        self.persist(Slot::Students)?;
        self.persist(Slot::Attendance)?;

        Ok(Removal {
            student,
            records_removed,
        })
    }

    /// Mark a student at the current local time.
    ///
    /// # Errors
    ///
    /// See [`Registry::mark_attendance_at`].
    pub fn mark_attendance(
        &mut self,
        student_id: &str,
        status: AttendanceStatus,
    ) -> Result<MarkOutcome> {
        self.mark_attendance_at(student_id, status, Local::now())
    }

    /// Mark a student at the local instant `now`.
    ///
    /// If the student already has a record for that day it is overwritten in
    /// place, keeping its position in the log; otherwise a record is appended.
    ///
    /// # Errors
    ///
    /// Returns a storage error if persisting fails.
    pub fn mark_attendance_at(
        &mut self,
        student_id: &str,
        status: AttendanceStatus,
        now: DateTime<Local>,
    ) -> Result<MarkOutcome> {
        if self.find_student(student_id).is_none() {
            warn!("Marking attendance for unknown student {}", student_id);
        }

        let record = AttendanceRecord::at(student_id, status, now);
        let existing = self
            .attendance
            .iter()
            .position(|a| a.is_for(student_id, record.date));

        let outcome = if let Some(index) = existing {
            let previous = std::mem::replace(&mut self.attendance[index], record.clone());
            debug!("Updated attendance for {} on {}", student_id, record.date);
            MarkOutcome::Updated { previous, record }
        } else {
            self.attendance.push(record.clone());
            debug!("Recorded attendance for {} on {}", student_id, record.date);
            MarkOutcome::Inserted(record)
        };

        self.persist(Slot::Attendance)?;
        Ok(outcome)
    }

    fn persist(&self, slot: Slot) -> Result<()> {
        let text = match slot {
            Slot::Students => serialize(&self.students)?,
            Slot::Attendance => serialize(&self.attendance)?,
        };
        self.storage.save(slot, &text)
    }
}

fn serialize<T: Serialize>(items: &[T]) -> Result<String> {
    Ok(serde_json::to_string(items)?)
}

fn load_slot<T: DeserializeOwned>(storage: &Storage, slot: Slot) -> Vec<T> {
    let text = match storage.load(slot) {
        Ok(Some(text)) => text,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("Could not read {} slot, starting empty: {}", slot, e);
            return Vec::new();
        }
    };

    serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!("Could not parse {} slot, starting empty: {}", slot, e);
        Vec::new()
    })
}
