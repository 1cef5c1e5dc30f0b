// File: ./src/command.rs
//! Reversible operations over the task store.
//!
//! Each operation knows how to apply one logical change and how to take it back.
//! Operations never fail once built: a target that no longer resolves turns the
//! call into a silent no-op and leaves nothing captured, so the matching inverse
//! is a no-op too.
use crate::error::{ValidationError, require_id};
use crate::model::{EditSnapshot, Recurrence, Task, TaskHandle, TaskStatus};
use crate::store::TaskStore;
use chrono::NaiveDateTime;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Two-method contract shared by every undoable operation.
pub trait Reversible {
    fn execute(&mut self);
    fn undo(&mut self);
}

/// Inserts a task. The same handle is re-inserted on redo, so identity survives.
#[derive(Debug)]
pub struct AddTask {
    store: Rc<TaskStore>,
    task: TaskHandle,
    task_id: String,
}

impl AddTask {
    pub fn new(store: Rc<TaskStore>, task: Task) -> Self {
        let task_id = task.id().to_string();
        Self {
            store,
            task: task.into_handle(),
            task_id,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}

impl Reversible for AddTask {
    fn execute(&mut self) {
        log::debug!("Adding task {}", self.task_id);
        self.store.add_task(self.task.clone());
    }

    fn undo(&mut self) {
        log::debug!("Removing added task {}", self.task_id);
        if let Err(e) = self.store.delete_task(&self.task_id) {
            log::warn!("Undo of add skipped: {}", e);
        }
    }
}

/// Marks a task COMPLETED and remembers the status it had before.
#[derive(Debug)]
pub struct CompleteTask {
    store: Rc<TaskStore>,
    task_id: String,
    previous: Option<TaskStatus>,
}

impl CompleteTask {
    pub fn new(store: Rc<TaskStore>, task_id: impl Into<String>) -> Result<Self, ValidationError> {
        let task_id = task_id.into();
        require_id(&task_id)?;
        Ok(Self {
            store,
            task_id,
            previous: None,
        })
    }
}

impl Reversible for CompleteTask {
    fn execute(&mut self) {
        self.previous = None;
        let Some(task) = resolve(&self.store, &self.task_id) else {
            log::debug!("Complete: task {} is gone, nothing to do", self.task_id);
            return;
        };
        self.previous = Some(task.borrow().status());
        self.store
            .update_handle(&task, |t| t.set_status(TaskStatus::Completed));
    }

    fn undo(&mut self) {
        let Some(previous) = self.previous else {
            return;
        };
        if let Some(task) = resolve(&self.store, &self.task_id) {
            self.store.update_handle(&task, |t| t.set_status(previous));
        }
    }
}

/// Moves a task to the trash. Undo always brings it back as PENDING.
#[derive(Debug)]
pub struct DeleteTask {
    store: Rc<TaskStore>,
    task_id: String,
    target: Weak<RefCell<Task>>,
}

impl DeleteTask {
    pub fn new(store: Rc<TaskStore>, task_id: impl Into<String>) -> Result<Self, ValidationError> {
        let task_id = task_id.into();
        require_id(&task_id)?;
        Ok(Self {
            store,
            task_id,
            target: Weak::new(),
        })
    }
}

impl Reversible for DeleteTask {
    fn execute(&mut self) {
        self.target = Weak::new();
        let Some(task) = resolve(&self.store, &self.task_id) else {
            log::debug!("Delete: task {} is gone, nothing to do", self.task_id);
            return;
        };
        self.target = Rc::downgrade(&task);
        self.store
            .update_handle(&task, |t| t.set_status(TaskStatus::Trashed));
    }

    fn undo(&mut self) {
        // Acts on the captured instance even if it has left the store since;
        // an add redone later re-inserts that same instance.
        if let Some(task) = self.target.upgrade() {
            self.store
                .update_handle(&task, |t| t.set_status(TaskStatus::Pending));
        }
    }
}

/// New values for an edit.
///
/// Title, description, due date and due-date text always overwrite. Category and
/// recurrence are only applied when supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub title: String,
    pub description: Option<String>,
    pub due: Option<NaiveDateTime>,
    pub due_text: Option<String>,
    pub category: Option<String>,
    pub recurrence: Option<Recurrence>,
}

impl TaskEdit {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
struct EditBackup {
    snapshot: EditSnapshot,
    category: Option<String>,
    recurrence: Recurrence,
}

#[derive(Debug)]
pub struct EditTask {
    store: Rc<TaskStore>,
    task_id: String,
    edit: TaskEdit,
    backup: Option<EditBackup>,
}

impl EditTask {
    pub fn new(
        store: Rc<TaskStore>,
        task_id: impl Into<String>,
        edit: TaskEdit,
    ) -> Result<Self, ValidationError> {
        let task_id = task_id.into();
        require_id(&task_id)?;
        if edit.title.trim().is_empty() {
            return Err(ValidationError::BlankTitle);
        }
        Ok(Self {
            store,
            task_id,
            edit,
            backup: None,
        })
    }
}

impl Reversible for EditTask {
    fn execute(&mut self) {
        // Recaptured on every run so a redo rolls back to the state it overwrote.
        self.backup = None;
        let Some(task) = resolve(&self.store, &self.task_id) else {
            log::debug!("Edit: task {} is gone, nothing to do", self.task_id);
            return;
        };
        {
            let t = task.borrow();
            self.backup = Some(EditBackup {
                snapshot: t.snapshot(),
                category: t.category().map(str::to_string),
                recurrence: t.recurrence(),
            });
        }
        let edit = &self.edit;
        self.store.update_handle(&task, |t| {
            if let Err(e) = t.set_title(edit.title.clone()) {
                log::warn!("Edit kept old title of {}: {}", t.id(), e);
            }
            t.set_description(edit.description.clone());
            t.set_due(edit.due);
            t.set_due_text(edit.due_text.clone());
            if let Some(category) = &edit.category {
                t.set_category(Some(category.clone()));
            }
            if let Some(recurrence) = edit.recurrence {
                t.set_recurrence(recurrence);
            }
        });
    }

    fn undo(&mut self) {
        let Some(backup) = &self.backup else {
            return;
        };
        if let Some(task) = resolve(&self.store, &self.task_id) {
            self.store.update_handle(&task, |t| {
                t.restore(&backup.snapshot);
                t.set_category(backup.category.clone());
                t.set_recurrence(backup.recurrence);
            });
        }
    }
}

// Ids are validated at construction, so a lookup error cannot happen here.
fn resolve(store: &TaskStore, task_id: &str) -> Option<TaskHandle> {
    store.find_by_id(task_id).ok().flatten()
}

/// Closed set of undoable operations accepted by the command history.
#[derive(Debug)]
pub enum Command {
    Add(AddTask),
    Complete(CompleteTask),
    Delete(DeleteTask),
    Edit(EditTask),
}

impl Command {
    /// Short human-readable name, used for logging and the shell prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Command::Add(_) => "add",
            Command::Complete(_) => "complete",
            Command::Delete(_) => "delete",
            Command::Edit(_) => "edit",
        }
    }

    pub fn task_id(&self) -> &str {
        match self {
            Command::Add(c) => &c.task_id,
            Command::Complete(c) => &c.task_id,
            Command::Delete(c) => &c.task_id,
            Command::Edit(c) => &c.task_id,
        }
    }
}

impl Reversible for Command {
    fn execute(&mut self) {
        match self {
            Command::Add(c) => c.execute(),
            Command::Complete(c) => c.execute(),
            Command::Delete(c) => c.execute(),
            Command::Edit(c) => c.execute(),
        }
    }

    fn undo(&mut self) {
        match self {
            Command::Add(c) => c.undo(),
            Command::Complete(c) => c.undo(),
            Command::Delete(c) => c.undo(),
            Command::Edit(c) => c.undo(),
        }
    }
}

impl From<AddTask> for Command {
    fn from(c: AddTask) -> Self {
        Command::Add(c)
    }
}

impl From<CompleteTask> for Command {
    fn from(c: CompleteTask) -> Self {
        Command::Complete(c)
    }
}

impl From<DeleteTask> for Command {
    fn from(c: DeleteTask) -> Self {
        Command::Delete(c)
    }
}

impl From<EditTask> for Command {
    fn from(c: EditTask) -> Self {
        Command::Edit(c)
    }
}
