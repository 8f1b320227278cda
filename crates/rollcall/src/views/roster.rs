//! Roster projection with free-text card filtering.

use serde::Serialize;

use crate::model::Student;
use crate::registry::Registry;
use crate::search::{Highlighted, Highlighter};

/// One student card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentCard {
    /// The student.
    pub student: Student,
    /// The card's text, highlighted against the filter.
    pub text: Highlighted,
    /// Whether the card passes the filter.
    pub visible: bool,
}

/// Every roster student as a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterView {
    /// The active filter, if any.
    pub filter: Option<String>,
    /// All cards in roster order, hidden ones included.
    pub cards: Vec<StudentCard>,
}

impl RosterView {
    /// Cards that pass the filter.
    pub fn visible(&self) -> impl Iterator<Item = &StudentCard> {
        self.cards.iter().filter(|c| c.visible)
    }

    /// Number of cards that pass the filter.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }
}

/// Build the roster view. Filtering hides cards; it never drops them.
#[must_use]
pub fn roster(registry: &Registry, filter: Option<&str>) -> RosterView {
    let filter = filter
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_lowercase);
    let highlighter = filter.as_deref().map(Highlighter::new);

    let cards = registry
        .students()
        .iter()
        .map(|student| {
            let text = student.card_text();
            match (&filter, &highlighter) {
                (Some(f), Some(h)) => {
                    let visible = text.to_lowercase().contains(f.as_str());
                    StudentCard {
                        student: student.clone(),
                        text: if visible {
                            h.highlight(&text)
                        } else {
                            Highlighted::plain(&text)
                        },
                        visible,
                    }
                }
                _ => StudentCard {
                    student: student.clone(),
                    text: Highlighted::plain(&text),
                    visible: true,
                },
            }
        })
        .collect();

    RosterView { filter, cards }
}
