// File: ./src/model/sort.rs
//! Swappable orderings for the task list.
use crate::model::{Task, TaskHandle};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum SortStrategy {
    /// Earliest due date first, undated tasks last.
    #[default]
    #[strum(to_string = "due_date", serialize = "due")]
    DueDate,
    /// HIGH, then MEDIUM, then LOW.
    #[strum(to_string = "priority", serialize = "prio")]
    Priority,
    /// Newest first.
    #[strum(to_string = "created", serialize = "newest")]
    Created,
    /// Case-insensitive A to Z.
    #[strum(to_string = "title", serialize = "alpha")]
    Title,
}

/// `None` sorts after every `Some`, whatever the direction of the inner ordering.
fn nulls_last<T>(a: Option<T>, b: Option<T>, cmp: impl FnOnce(T, T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl SortStrategy {
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortStrategy::DueDate => nulls_last(a.due(), b.due(), |x, y| x.cmp(&y)),
            SortStrategy::Priority => a.priority().rank().cmp(&b.priority().rank()),
            SortStrategy::Created => {
                nulls_last(Some(a.created_at()), Some(b.created_at()), |x, y| y.cmp(&x))
            }
            SortStrategy::Title => nulls_last(
                Some(a.title()).filter(|t| !t.is_empty()),
                Some(b.title()).filter(|t| !t.is_empty()),
                |x, y| x.to_lowercase().cmp(&y.to_lowercase()),
            ),
        }
    }

    /// Returns a sorted copy; the input slice is left untouched.
    ///
    /// The sort is stable, so ties keep their insertion order.
    pub fn sort(&self, tasks: &[TaskHandle]) -> Vec<TaskHandle> {
        let mut sorted = tasks.to_vec();
        sorted.sort_by(|a, b| self.compare(&a.borrow(), &b.borrow()));
        sorted
    }
}
