// File: src/controller.rs
//! Central logic controller for task operations.
//! Every user mutation that should be undoable is expressed here as a reversible
//! operation and submitted through the shared command history. UI layers (the
//! shell, the CLI) must delegate to this controller instead of touching the store.
use crate::command::{AddTask, CompleteTask, DeleteTask, EditTask, TaskEdit};
use crate::config::Config;
use crate::context::AppContext;
use crate::error::{ValidationError, require_id};
use crate::history::CommandHistory;
use crate::model::parser::SmartInput;
use crate::model::{Priority, Recurrence, Task, TaskHandle};
use crate::storage::LocalStorage;
use crate::store::TaskStore;
use chrono::NaiveDateTime;
use std::rc::Rc;

/// Everything needed to create a task in one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due: Option<NaiveDateTime>,
    pub due_text: Option<String>,
    pub priority: Priority,
    pub category: Option<String>,
    pub recurrence: Recurrence,
    pub tags: Vec<String>,
    pub reminder: Option<NaiveDateTime>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, priority: Priority) -> Self {
        Self {
            title: title.into(),
            priority,
            ..Default::default()
        }
    }

    /// Builds a request from parsed smart input; `default_priority` fills a missing `!prio`.
    pub fn from_smart(input: SmartInput, default_priority: Priority) -> Self {
        Self {
            title: input.title,
            description: input.description,
            due: input.due,
            due_text: input.due_text,
            priority: input.priority.unwrap_or(default_priority),
            category: input.category,
            recurrence: input.recurrence.unwrap_or_default(),
            tags: input.tags,
            reminder: input.reminder,
        }
    }
}

/// Facade over the store and the shared undo/redo timeline.
#[derive(Clone)]
pub struct TaskController {
    pub store: Rc<TaskStore>,
    pub history: Rc<CommandHistory>,
}

impl TaskController {
    pub fn new(store: Rc<TaskStore>, history: Rc<CommandHistory>) -> Self {
        Self { store, history }
    }

    /// Builds a controller over the tasks saved for `ctx`, honouring the
    /// configured sort order and history depth. Loaded tasks are not undoable.
    pub fn from_storage(ctx: &dyn AppContext, config: &Config) -> anyhow::Result<Self> {
        let store = TaskStore::with_sort_strategy(config.default_sort);
        store.extend(LocalStorage::load(ctx)?);
        let history = CommandHistory::with_limit(config.max_history);
        Ok(Self::new(Rc::new(store), Rc::new(history)))
    }

    // --- Undoable operations ---

    /// Create a task and return its id.
    pub fn add_task(&self, new: NewTask) -> Result<String, ValidationError> {
        let mut task = Task::new(new.title, new.description, new.due, new.priority)?;
        if let Some(text) = new.due_text.filter(|s| !s.is_empty()) {
            task.set_due_text(Some(text));
        }
        if let Some(category) = new.category.filter(|s| !s.is_empty()) {
            task.set_category(Some(category));
        }
        if new.recurrence != Recurrence::None {
            task.set_recurrence(new.recurrence);
        }
        if !new.tags.is_empty() {
            task.set_tags(new.tags);
        }
        if new.reminder.is_some() {
            task.set_reminder(new.reminder);
        }
        let cmd = AddTask::new(self.store.clone(), task);
        let id = cmd.task_id().to_string();
        self.history.run(cmd);
        Ok(id)
    }

    /// Edit an existing task. A missing task makes the edit a recorded no-op.
    pub fn edit_task(&self, id: &str, edit: TaskEdit) -> Result<(), ValidationError> {
        let cmd = EditTask::new(self.store.clone(), id, edit)?;
        self.history.run(cmd);
        Ok(())
    }

    pub fn complete_task(&self, id: &str) -> Result<(), ValidationError> {
        let cmd = CompleteTask::new(self.store.clone(), id)?;
        self.history.run(cmd);
        Ok(())
    }

    /// Move a task to the trash.
    pub fn delete_task(&self, id: &str) -> Result<(), ValidationError> {
        let cmd = DeleteTask::new(self.store.clone(), id)?;
        self.history.run(cmd);
        Ok(())
    }

    /// Duplicate a task under a new id, with " (Copy)" appended to the title.
    pub fn clone_task(&self, id: &str) -> Result<String, ValidationError> {
        let source = self.require_task(id)?;
        let new = {
            let s = source.borrow();
            NewTask {
                title: format!("{} (Copy)", s.title()),
                description: s.description().map(str::to_string),
                due: s.due(),
                due_text: s.due_text().map(str::to_string),
                priority: s.priority(),
                category: s.category().map(str::to_string),
                recurrence: s.recurrence(),
                tags: s.tags().to_vec(),
                reminder: None,
            }
        };
        self.add_task(new)
    }

    /// Completes each id in order; blank ids are skipped.
    pub fn bulk_complete<S: AsRef<str>>(&self, ids: &[S]) -> Result<(), ValidationError> {
        for id in ids {
            let id: &str = id.as_ref();
            if !id.trim().is_empty() {
                self.complete_task(id)?;
            }
        }
        Ok(())
    }

    /// Trashes each id in order; blank ids are skipped.
    pub fn bulk_delete<S: AsRef<str>>(&self, ids: &[S]) -> Result<(), ValidationError> {
        for id in ids {
            let id: &str = id.as_ref();
            if !id.trim().is_empty() {
                self.delete_task(id)?;
            }
        }
        Ok(())
    }

    pub fn undo(&self) {
        self.history.undo();
    }

    pub fn redo(&self) {
        self.history.redo();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Direct, non-undoable actions ---

    /// Bring a trashed task back as PENDING. Not recorded in the history.
    pub fn restore_from_trash(&self, id: &str) -> Result<(), ValidationError> {
        self.require_task(id)?;
        self.store.reopen_task(id)?;
        Ok(())
    }

    /// Permanently remove a task. Not recorded in the history.
    pub fn purge_task(&self, id: &str) -> Result<(), ValidationError> {
        self.require_task(id)?;
        log::info!("Purging task {}", id);
        self.store.delete_task(id)?;
        Ok(())
    }

    pub fn set_reminder(
        &self,
        id: &str,
        reminder: Option<NaiveDateTime>,
    ) -> Result<(), ValidationError> {
        let task = self.require_task(id)?;
        self.store.update_handle(&task, |t| t.set_reminder(reminder));
        Ok(())
    }

    pub fn set_tags(&self, id: &str, tags: Vec<String>) -> Result<(), ValidationError> {
        let task = self.require_task(id)?;
        self.store.update_handle(&task, |t| t.set_tags(tags));
        Ok(())
    }

    /// Returns whether the dependency list changed. Both tasks must exist.
    pub fn add_dependency(&self, id: &str, depends_on: &str) -> Result<bool, ValidationError> {
        let task = self.require_task(id)?;
        self.require_task(depends_on)?;
        self.store
            .update_handle(&task, |t| t.add_dependency(depends_on))
    }

    pub fn remove_dependency(&self, id: &str, depends_on: &str) -> Result<bool, ValidationError> {
        require_id(depends_on)?;
        let task = self.require_task(id)?;
        Ok(self
            .store
            .update_handle(&task, |t| t.remove_dependency(depends_on)))
    }

    // --- Lookups ---

    pub fn resolve_id(&self, prefix: &str) -> Result<String, ValidationError> {
        self.store.resolve_id(prefix)
    }

    fn require_task(&self, id: &str) -> Result<TaskHandle, ValidationError> {
        self.store
            .find_by_id(id)?
            .ok_or_else(|| ValidationError::TaskNotFound {
                task_id: id.to_string(),
            })
    }
}
