// File: ./src/model/item.rs
use crate::error::{ValidationError, require_id};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

/// Shared, mutable handle to a task owned by the store.
///
/// Commands hold clones of the same handle, so a mutation made through one of
/// them is immediately visible everywhere else.
pub type TaskHandle = Rc<RefCell<Task>>;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Display precedence: HIGH sorts first, LOW last.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
    Trashed,
}

impl TaskStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Completed | Self::Trashed)
    }

    pub fn checkbox_symbol(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "[ ]",
            TaskStatus::Completed => "[✔]",
            TaskStatus::Trashed => "[✘]",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

/// Frozen copy of the fields an edit can be rolled back to.
///
/// Due-date text, category, tags, dependencies, recurrence and reminder are
/// not captured; restoring leaves them as they are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSnapshot {
    title: String,
    description: Option<String>,
    due: Option<NaiveDateTime>,
    priority: Priority,
    status: TaskStatus,
}

impl EditSnapshot {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn due(&self) -> Option<NaiveDateTime> {
        self.due
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: String,
    title: String,
    description: Option<String>,
    due: Option<NaiveDateTime>,
    /// Raw due date as the user typed it, kept even when it did not parse.
    due_text: Option<String>,
    priority: Priority,
    status: TaskStatus,
    tags: Vec<String>,
    category: Option<String>,
    dependencies: Vec<String>,
    recurrence: Recurrence,
    reminder: Option<NaiveDateTime>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::BlankTitle);
    }
    Ok(())
}

impl Task {
    /// Creates a fresh PENDING task with a new identity.
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        due: Option<NaiveDateTime>,
        priority: Priority,
    ) -> Result<Self, ValidationError> {
        Self::build(
            Uuid::new_v4().to_string(),
            title.into(),
            description,
            due,
            priority,
            TaskStatus::Pending,
            Vec::new(),
            None,
        )
    }

    /// Rebuilds a task with a known identity (used when loading from storage).
    ///
    /// Timestamps are stamped to now; the persisted ones are not carried over.
    #[allow(clippy::too_many_arguments)]
    pub fn with_id(
        id: impl Into<String>,
        title: impl Into<String>,
        description: Option<String>,
        due: Option<NaiveDateTime>,
        priority: Priority,
        status: TaskStatus,
        tags: Vec<String>,
        reminder: Option<NaiveDateTime>,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        require_id(&id)?;
        Self::build(
            id,
            title.into(),
            description,
            due,
            priority,
            status,
            tags,
            reminder,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        id: String,
        title: String,
        description: Option<String>,
        due: Option<NaiveDateTime>,
        priority: Priority,
        status: TaskStatus,
        tags: Vec<String>,
        reminder: Option<NaiveDateTime>,
    ) -> Result<Self, ValidationError> {
        validate_title(&title)?;
        let now = Utc::now();
        Ok(Self {
            id,
            title,
            description,
            due,
            due_text: None,
            priority,
            status,
            tags,
            category: None,
            dependencies: Vec::new(),
            recurrence: Recurrence::None,
            reminder,
            created_at: now,
            updated_at: now,
        })
    }

    /// Wraps the task into a shareable handle.
    pub fn into_handle(self) -> TaskHandle {
        Rc::new(RefCell::new(self))
    }

    // --- Accessors ---

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn due(&self) -> Option<NaiveDateTime> {
        self.due
    }

    pub fn due_text(&self) -> Option<&str> {
        self.due_text.as_deref()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn recurrence(&self) -> Recurrence {
        self.recurrence
    }

    pub fn reminder(&self) -> Option<NaiveDateTime> {
        self.reminder
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Due date for display: the parsed timestamp if any, else the raw text.
    pub fn due_display(&self) -> Option<String> {
        if let Some(text) = self.due_text.as_deref()
            && !text.is_empty()
        {
            return Some(text.to_string());
        }
        self.due.map(|d| d.format("%Y-%m-%d %H:%M").to_string())
    }

    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        self.status == TaskStatus::Pending && self.due.is_some_and(|d| d < now)
    }

    // --- Setters (every one of them touches updated_at) ---

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), ValidationError> {
        let title = title.into();
        validate_title(&title)?;
        self.title = title;
        self.touch();
        Ok(())
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.touch();
    }

    pub fn set_due(&mut self, due: Option<NaiveDateTime>) {
        self.due = due;
        self.touch();
    }

    pub fn set_due_text(&mut self, due_text: Option<String>) {
        self.due_text = due_text;
        self.touch();
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
        self.touch();
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.touch();
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = tags;
        self.touch();
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category;
        self.touch();
    }

    pub fn set_dependencies(&mut self, dependencies: Vec<String>) {
        self.dependencies = dependencies;
        self.touch();
    }

    /// Adds a dependency once. Returns whether the list changed.
    pub fn add_dependency(&mut self, task_id: &str) -> Result<bool, ValidationError> {
        require_id(task_id)?;
        if self.dependencies.iter().any(|d| d == task_id) {
            return Ok(false);
        }
        self.dependencies.push(task_id.to_string());
        self.touch();
        Ok(true)
    }

    /// Removes a dependency if present. Returns whether the list changed.
    pub fn remove_dependency(&mut self, task_id: &str) -> bool {
        if let Some(pos) = self.dependencies.iter().position(|d| d == task_id) {
            self.dependencies.remove(pos);
            self.touch();
            return true;
        }
        false
    }

    pub fn set_recurrence(&mut self, recurrence: Recurrence) {
        self.recurrence = recurrence;
        self.touch();
    }

    pub fn set_reminder(&mut self, reminder: Option<NaiveDateTime>) {
        self.reminder = reminder;
        self.touch();
    }

    // Never moves backwards, even if the wall clock does.
    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }

    // --- Snapshot / restore ---

    pub fn snapshot(&self) -> EditSnapshot {
        EditSnapshot {
            title: self.title.clone(),
            description: self.description.clone(),
            due: self.due,
            priority: self.priority,
            status: self.status,
        }
    }

    pub fn restore(&mut self, snapshot: &EditSnapshot) {
        self.title = snapshot.title.clone();
        self.description = snapshot.description.clone();
        self.due = snapshot.due;
        self.priority = snapshot.priority;
        self.status = snapshot.status;
        self.touch();
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}
