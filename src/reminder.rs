// Scans the task list for reminders that are due.
//
// Read-only: nothing here mutates a task. Clearing a reminder goes through
// `TaskController::set_reminder` like any other direct change.
use crate::model::TaskStatus;
use crate::store::TaskStore;
use chrono::NaiveDateTime;
use std::collections::HashSet;

/// A reminder ready to be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub task_id: String,
    pub task_title: String,
    pub remind_at: NaiveDateTime,
    pub due: Option<NaiveDateTime>,
}

impl Reminder {
    /// One-line notification text.
    pub fn message(&self) -> String {
        match self.due {
            Some(due) => format!(
                "Reminder: {} is due soon! (due {})",
                self.task_title,
                due.format("%Y-%m-%d %H:%M")
            ),
            None => format!("Reminder: {} is due soon!", self.task_title),
        }
    }
}

// Active tasks whose reminder satisfies `fired`, in the store's current order.
fn scan(store: &TaskStore, fired: impl Fn(NaiveDateTime) -> bool) -> Vec<Reminder> {
    store
        .query()
        .iter()
        .filter_map(|handle| {
            let t = handle.borrow();
            let remind_at = t.reminder()?;
            if t.status() != TaskStatus::Pending || !fired(remind_at) {
                return None;
            }
            Some(Reminder {
                task_id: t.id().to_string(),
                task_title: t.title().to_string(),
                remind_at,
                due: t.due(),
            })
        })
        .collect()
}

/// Reminders strictly in the past on tasks that are neither completed nor trashed.
pub fn missed_reminders(store: &TaskStore, now: NaiveDateTime) -> Vec<Reminder> {
    scan(store, |at| at < now)
}

/// Earliest reminder still in the future, if any.
pub fn next_reminder(store: &TaskStore, now: NaiveDateTime) -> Option<Reminder> {
    scan(store, |at| at > now)
        .into_iter()
        .min_by_key(|r| r.remind_at)
}

/// Remembers which reminders were already reported so each fires once.
///
/// A reminder is identified by task id and reminder time, so moving a
/// reminder to a new time makes it eligible again. Entries are dropped once
/// their task stops being pending or its reminder changes.
#[derive(Debug, Default)]
pub struct ReminderTracker {
    shown: HashSet<(String, NaiveDateTime)>,
}

impl ReminderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns reminders due at or before `now` that were not reported before,
    /// and marks them as reported.
    pub fn poll(&mut self, store: &TaskStore, now: NaiveDateTime) -> Vec<Reminder> {
        let live: HashSet<(String, NaiveDateTime)> = scan(store, |_| true)
            .into_iter()
            .map(|r| (r.task_id, r.remind_at))
            .collect();
        self.shown.retain(|key| live.contains(key));

        let fresh: Vec<Reminder> = scan(store, |at| at <= now)
            .into_iter()
            .filter(|r| !self.shown.contains(&(r.task_id.clone(), r.remind_at)))
            .collect();
        for r in &fresh {
            log::info!("Reminder fired for task {}", r.task_id);
            self.shown.insert((r.task_id.clone(), r.remind_at));
        }
        fresh
    }

    /// Marks every currently due reminder as reported without returning it.
    pub fn mark_all_seen(&mut self, store: &TaskStore, now: NaiveDateTime) {
        self.poll(store, now);
    }

    pub fn shown_count(&self) -> usize {
        self.shown.len()
    }
}
