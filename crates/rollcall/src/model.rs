//! Core record types for rollcall.
//!
//! This module defines the two persisted record types (students and
//! attendance marks) and the QR payload that links a printed code to a
//! student. Field names serialize in camelCase so stored documents keep the
//! `studentId`/`createdAt` layout.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Status of an attendance mark.
///
/// Only presence is ever recorded; absence is derived at read time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    /// The student checked in.
    #[default]
    Present,
}

impl AttendanceStatus {
    /// Upper-case badge label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Present => "PRESENT",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
        }
    }
}

/// A student on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// User-assigned identifier, unique across the roster.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Optional contact address.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_string_as_none"
    )]
    pub email: Option<String>,

    /// Class or group label.
    pub class: String,

    /// When the student was added.
    pub created_at: DateTime<Utc>,
}

impl Student {
    /// Build a student from raw form input.
    ///
    /// Every field is trimmed; an empty email is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if `id`, `name` or `class` is empty
    /// after trimming.
    pub fn new(
        id: &str,
        name: &str,
        email: Option<&str>,
        class: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let id = required("id", id)?;
        let name = required("name", name)?;
        let class = required("class", class)?;
        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);

        Ok(Self {
            id,
            name,
            email,
            class,
            created_at,
        })
    }

    /// Text shown on the student's roster card.
    ///
    /// Free-text roster filtering matches against exactly this text.
    #[must_use]
    pub fn card_text(&self) -> String {
        let mut text = format!("{} ID: {} Class: {}", self.name, self.id, self.class);
        if let Some(email) = &self.email {
            text.push_str(" Email: ");
            text.push_str(email);
        }
        text
    }
}

fn required(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::MissingField { field });
    }
    Ok(trimmed.to_string())
}

fn empty_string_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// One attendance mark for a student on a calendar day.
///
/// At most one record exists per `(student_id, date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    /// The marked student. Not checked against the roster.
    pub student_id: String,

    /// Local calendar day of the mark.
    pub date: NaiveDate,

    /// Local wall-clock time of the mark, whole seconds.
    pub time: NaiveTime,

    /// Mark status.
    pub status: AttendanceStatus,

    /// Exact instant of the mark.
    pub timestamp: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Create a record for `student_id` marked at the local instant `now`.
    #[must_use]
    pub fn at(student_id: &str, status: AttendanceStatus, now: DateTime<Local>) -> Self {
        let time = now.time();
        Self {
            student_id: student_id.to_string(),
            date: now.date_naive(),
            time: time.with_nanosecond(0).unwrap_or(time),
            status,
            timestamp: now.with_timezone(&Utc),
        }
    }

    /// Check whether this record is the mark for `student_id` on `date`.
    #[must_use]
    pub fn is_for(&self, student_id: &str, date: NaiveDate) -> bool {
        self.student_id == student_id && self.date == date
    }

    /// The mark time as `HH:MM:SS`.
    #[must_use]
    pub fn time_label(&self) -> String {
        self.time.format("%H:%M:%S").to_string()
    }

    /// The mark date as `YYYY-MM-DD`.
    #[must_use]
    pub fn date_label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// The data encoded into a student's check-in QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    /// The student to mark.
    pub student_id: String,

    /// Display name at the time the code was generated.
    #[serde(default)]
    pub name: String,

    /// Class at the time the code was generated.
    #[serde(default)]
    pub class: String,
}

impl QrPayload {
    /// Build the payload for a roster student.
    #[must_use]
    pub fn for_student(student: &Student) -> Self {
        Self {
            student_id: student.id.clone(),
            name: student.name.clone(),
            class: student.class.clone(),
        }
    }

    /// Serialize to the compact JSON text that goes into the QR symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse decoded QR text.
    ///
    /// Only `studentId` is required. It may be a string or a number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeFormat`] if the text is not a JSON object or its
    /// `studentId` is missing, blank or zero.
    pub fn parse(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| Error::decode_format(format!("not a payload object: {e}")))?;
        let serde_json::Value::Object(mut fields) = value else {
            return Err(Error::decode_format("not a payload object"));
        };

        let student_id = fields
            .remove("studentId")
            .and_then(id_text)
            .ok_or_else(|| Error::decode_format("missing studentId"))?;
        let text_field = |key: &str| {
            fields
                .get(key)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Ok(Self {
            student_id,
            name: text_field("name"),
            class: text_field("class"),
        })
    }
}

/// Printed codes may carry numeric IDs; zero and blanks count as missing.
fn id_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(id) if !id.trim().is_empty() => Some(id),
        serde_json::Value::Number(n) if n.as_f64().is_some_and(|v| v.abs() > 0.0) => {
            Some(n.to_string())
        }
        _ => None,
    }
}
