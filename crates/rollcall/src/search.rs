//! Global search across the roster and the attendance log.
//!
//! Matching is a case-insensitive substring scan over both collections in
//! storage order; results are not ranked. The same [`Highlighter`] marks
//! matched text in search results, roster cards and suggestions.

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::config::SearchConfig;
use crate::model::{AttendanceRecord, Student};
use crate::registry::Registry;
use crate::views::display_date;

/// A run of text that either matched the query or did not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    /// The text of this run.
    pub text: String,
    /// Whether this run matched the query.
    pub matched: bool,
}

/// Text split into matched and unmatched fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Highlighted(pub Vec<Fragment>);

impl Highlighted {
    /// Text with no emphasis.
    #[must_use]
    pub fn plain(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        Self(vec![Fragment {
            text: text.to_string(),
            matched: false,
        }])
    }

    /// Whether any fragment matched.
    #[must_use]
    pub fn has_match(&self) -> bool {
        self.0.iter().any(|f| f.matched)
    }

    /// The original text with emphasis dropped.
    #[must_use]
    pub fn to_plain(&self) -> String {
        self.0.iter().map(|f| f.text.as_str()).collect()
    }

    /// Render with each matched run wrapped in `open`/`close`.
    #[must_use]
    pub fn wrap(&self, open: &str, close: &str) -> String {
        let mut out = String::new();
        for fragment in &self.0 {
            if fragment.matched {
                out.push_str(open);
                out.push_str(&fragment.text);
                out.push_str(close);
            } else {
                out.push_str(&fragment.text);
            }
        }
        out
    }
}

/// Case-insensitive literal matcher for one query.
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Option<Regex>,
}

impl Highlighter {
    /// Build a highlighter for `query`. Regex metacharacters match literally.
    #[must_use]
    pub fn new(query: &str) -> Self {
        let query = query.trim();
        let pattern = if query.is_empty() {
            None
        } else {
            RegexBuilder::new(&regex::escape(query))
                .case_insensitive(true)
                .build()
                .ok()
        };
        Self { pattern }
    }

    /// Whether `text` contains the query.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(text))
    }

    /// Split `text` around every occurrence of the query.
    #[must_use]
    pub fn highlight(&self, text: &str) -> Highlighted {
        let Some(pattern) = &self.pattern else {
            return Highlighted::plain(text);
        };

        let mut fragments = Vec::new();
        let mut last = 0;
        for m in pattern.find_iter(text) {
            if m.start() > last {
                fragments.push(Fragment {
                    text: text[last..m.start()].to_string(),
                    matched: false,
                });
            }
            fragments.push(Fragment {
                text: m.as_str().to_string(),
                matched: true,
            });
            last = m.end();
        }
        if last < text.len() {
            fragments.push(Fragment {
                text: text[last..].to_string(),
                matched: false,
            });
        }
        Highlighted(fragments)
    }
}

/// A roster match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentHit {
    /// The matched student.
    pub student: Student,
    /// Highlighted name.
    pub name: Highlighted,
    /// Highlighted ID.
    pub id: Highlighted,
    /// Highlighted class.
    pub class: Highlighted,
    /// Highlighted email, if the student has one.
    pub email: Option<Highlighted>,
}

/// An attendance log match, joined to its student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceHit {
    /// The matched record.
    pub record: AttendanceRecord,
    /// The record's student.
    pub student: Student,
    /// Highlighted student name.
    pub name: Highlighted,
    /// Highlighted student ID.
    pub id: Highlighted,
    /// Highlighted class.
    pub class: Highlighted,
    /// Highlighted display date (`Mar 14, 2024`).
    pub date: Highlighted,
    /// Highlighted time.
    pub time: Highlighted,
}

/// Matches for one query, in collection order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    /// The normalized (trimmed, lower-cased) query.
    pub query: String,
    /// Matching students.
    pub students: Vec<StudentHit>,
    /// Matching attendance records.
    pub attendance: Vec<AttendanceHit>,
}

impl SearchResults {
    /// Total number of matches across both lists.
    #[must_use]
    pub fn total(&self) -> usize {
        self.students.len() + self.attendance.len()
    }

    /// Whether nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// A quick-pick suggestion for a partially typed query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    /// The suggested student's ID.
    pub id: String,
    /// The suggested student's name, highlighted.
    pub name: Highlighted,
}

/// Trim and lower-case a query; `None` if nothing is left.
#[must_use]
pub fn normalize_query(query: &str) -> Option<String> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        None
    } else {
        Some(query)
    }
}

/// Search both collections.
///
/// Returns `None` for an empty query, meaning no result view should be shown.
#[must_use]
pub fn search(registry: &Registry, query: &str) -> Option<SearchResults> {
    let query = normalize_query(query)?;
    let highlighter = Highlighter::new(&query);

    let students = registry
        .students()
        .iter()
        .filter(|s| student_text(s).contains(&query))
        .map(|s| StudentHit {
            student: s.clone(),
            name: highlighter.highlight(&s.name),
            id: highlighter.highlight(&s.id),
            class: highlighter.highlight(&s.class),
            email: s.email.as_deref().map(|e| highlighter.highlight(e)),
        })
        .collect();

    let attendance = registry
        .attendance()
        .iter()
        .filter_map(|r| registry.find_student(&r.student_id).map(|s| (r, s)))
        .filter(|(r, s)| record_text(r, s).contains(&query))
        .map(|(r, s)| AttendanceHit {
            record: r.clone(),
            student: s.clone(),
            name: highlighter.highlight(&s.name),
            id: highlighter.highlight(&s.id),
            class: highlighter.highlight(&s.class),
            date: highlighter.highlight(&display_date(r.date)),
            time: highlighter.highlight(&r.time_label()),
        })
        .collect();

    Some(SearchResults {
        query,
        students,
        attendance,
    })
}

/// Students whose name or ID contains `query`, for type-ahead.
///
/// Queries shorter than the configured minimum yield nothing.
#[must_use]
pub fn suggestions(registry: &Registry, query: &str, config: &SearchConfig) -> Vec<Suggestion> {
    let Some(query) = normalize_query(query) else {
        return Vec::new();
    };
    if query.chars().count() < config.suggestion_min_chars {
        return Vec::new();
    }

    let highlighter = Highlighter::new(&query);
    registry
        .students()
        .iter()
        .filter(|s| s.name.to_lowercase().contains(&query) || s.id.to_lowercase().contains(&query))
        .take(config.suggestion_limit)
        .map(|s| Suggestion {
            id: s.id.clone(),
            name: highlighter.highlight(&s.name),
        })
        .collect()
}

fn student_text(student: &Student) -> String {
    format!(
        "{} {} {} {}",
        student.name,
        student.id,
        student.email.as_deref().unwrap_or_default(),
        student.class
    )
    .to_lowercase()
}

fn record_text(record: &AttendanceRecord, student: &Student) -> String {
    format!(
        "{} {} {} {} {} {}",
        student.name,
        student.id,
        student.class,
        record.date_label(),
        record.time_label(),
        record.status
    )
    .to_lowercase()
}
