// File: src/store.rs
//! The authoritative, observable collection of tasks.
//!
//! `TaskStore` is the only owner of the task list. Every mutation goes through
//! it and every mutation notifies the registered listeners synchronously, in
//! registration order. Methods take `&self` so a listener may query the store
//! (or unregister itself) while it is being notified.
use crate::error::{ValidationError, require_id};
use crate::model::{SortStrategy, Task, TaskHandle, TaskStatus};
use chrono::NaiveDateTime;
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

pub type ListenerId = u64;

/// Observer notified after every store mutation.
pub trait StoreListener {
    fn store_changed(&self, store: &TaskStore);
}

impl<F> StoreListener for F
where
    F: Fn(&TaskStore),
{
    fn store_changed(&self, store: &TaskStore) {
        self(store)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterOptions<'a> {
    pub status: Option<TaskStatus>,
    pub category: Option<&'a str>,
    pub tag: Option<&'a str>,
    pub search_term: &'a str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub trashed: usize,
    pub overdue: usize,
}

#[derive(Default)]
pub struct TaskStore {
    tasks: RefCell<Vec<TaskHandle>>,
    sort_strategy: Cell<SortStrategy>,
    listeners: RefCell<Vec<(ListenerId, Rc<dyn StoreListener>)>>,
    next_listener_id: Cell<ListenerId>,
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("tasks", &self.tasks.borrow().len())
            .field("sort_strategy", &self.sort_strategy.get())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sort_strategy(strategy: SortStrategy) -> Self {
        let store = Self::default();
        store.sort_strategy.set(strategy);
        store
    }

    // --- Listeners ---

    pub fn add_listener(&self, listener: impl StoreListener + 'static) -> ListenerId {
        self.add_shared_listener(Rc::new(listener))
    }

    pub fn add_shared_listener(&self, listener: Rc<dyn StoreListener>) -> ListenerId {
        let id = self.next_listener_id.get();
        self.next_listener_id.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.listeners.borrow().iter().any(|(lid, _)| *lid == id)
    }

    // Iterates over a copy so listeners may register or unregister freely.
    // One removed before its turn is skipped for the rest of the round.
    fn notify_listeners(&self) {
        let round: Vec<(ListenerId, Rc<dyn StoreListener>)> = self.listeners.borrow().clone();
        for (id, listener) in round {
            if self.is_registered(id) {
                listener.store_changed(self);
            }
        }
    }

    // --- Sorting ---

    pub fn sort_strategy(&self) -> SortStrategy {
        self.sort_strategy.get()
    }

    pub fn set_sort_strategy(&self, strategy: SortStrategy) {
        log::debug!("Sort strategy set to {}", strategy);
        self.sort_strategy.set(strategy);
        self.notify_listeners();
    }

    // --- Mutations ---

    /// Appends an existing handle (used by commands so identity survives undo/redo).
    pub fn add_task(&self, task: TaskHandle) {
        self.tasks.borrow_mut().push(task);
        self.notify_listeners();
    }

    /// Wraps and appends a task. This bypasses the command history.
    pub fn append(&self, task: Task) -> TaskHandle {
        let handle = task.into_handle();
        self.add_task(handle.clone());
        handle
    }

    /// Appends many tasks at once with a single notification (used on load).
    pub fn extend(&self, tasks: impl IntoIterator<Item = Task>) {
        self.tasks
            .borrow_mut()
            .extend(tasks.into_iter().map(Task::into_handle));
        self.notify_listeners();
    }

    /// Permanently removes a task. Listeners are notified even if nothing matched.
    pub fn delete_task(&self, id: &str) -> Result<Option<TaskHandle>, ValidationError> {
        require_id(id)?;
        let removed = {
            let mut tasks = self.tasks.borrow_mut();
            tasks
                .iter()
                .position(|t| t.borrow().id() == id)
                .map(|idx| tasks.remove(idx))
        };
        self.notify_listeners();
        Ok(removed)
    }

    /// Sets the status of a task; any status may move to any other.
    /// Returns whether the task was found. Always notifies.
    pub fn set_status(&self, id: &str, status: TaskStatus) -> Result<bool, ValidationError> {
        let found = self.find_by_id(id)?;
        if let Some(task) = &found {
            task.borrow_mut().set_status(status);
        }
        self.notify_listeners();
        Ok(found.is_some())
    }

    pub fn move_to_trash(&self, id: &str) -> Result<bool, ValidationError> {
        self.set_status(id, TaskStatus::Trashed)
    }

    pub fn mark_completed(&self, id: &str) -> Result<bool, ValidationError> {
        self.set_status(id, TaskStatus::Completed)
    }

    pub fn reopen_task(&self, id: &str) -> Result<bool, ValidationError> {
        self.set_status(id, TaskStatus::Pending)
    }

    /// Applies `f` to the task with `id`, then notifies.
    /// Returns `None` if no such task exists.
    pub fn update_task<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Task) -> R,
    ) -> Result<Option<R>, ValidationError> {
        let found = self.find_by_id(id)?;
        let result = found.map(|task| f(&mut task.borrow_mut()));
        self.notify_listeners();
        Ok(result)
    }

    /// Applies `f` to an already resolved handle, then notifies.
    pub fn update_handle<R>(&self, task: &TaskHandle, f: impl FnOnce(&mut Task) -> R) -> R {
        let result = f(&mut task.borrow_mut());
        self.notify_listeners();
        result
    }

    // --- Queries ---

    pub fn find_by_id(&self, id: &str) -> Result<Option<TaskHandle>, ValidationError> {
        require_id(id)?;
        Ok(self
            .tasks
            .borrow()
            .iter()
            .find(|t| t.borrow().id() == id)
            .cloned())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.borrow().iter().any(|t| t.borrow().id() == id)
    }

    /// Resolves a full id or a unique id prefix.
    pub fn resolve_id(&self, prefix: &str) -> Result<String, ValidationError> {
        require_id(prefix)?;
        let prefix = prefix.trim();
        if self.contains(prefix) {
            return Ok(prefix.to_string());
        }
        let matches: Vec<String> = self
            .tasks
            .borrow()
            .iter()
            .map(|t| t.borrow().id().to_string())
            .filter(|id| id.starts_with(prefix))
            .collect();
        match matches.len() {
            0 => Err(ValidationError::TaskNotFound {
                task_id: prefix.to_string(),
            }),
            1 => Ok(matches.into_iter().next().unwrap_or_default()),
            n => Err(ValidationError::AmbiguousId {
                prefix: prefix.to_string(),
                matches: n,
            }),
        }
    }

    /// Tasks ordered by the current strategy. The returned list is a fresh copy.
    pub fn query(&self) -> Vec<TaskHandle> {
        self.sort_strategy.get().sort(&self.tasks.borrow())
    }

    /// Tasks in insertion order (copy of the list).
    pub fn all_tasks(&self) -> Vec<TaskHandle> {
        self.tasks.borrow().clone()
    }

    /// Unordered filter by status.
    pub fn query_by_status(&self, status: TaskStatus) -> Vec<TaskHandle> {
        self.tasks
            .borrow()
            .iter()
            .filter(|t| t.borrow().status() == status)
            .cloned()
            .collect()
    }

    /// Owned copies of every task in insertion order, for persistence.
    pub fn snapshot_tasks(&self) -> Vec<Task> {
        self.tasks.borrow().iter().map(|t| t.borrow().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Sorted by the current strategy after filtering.
    pub fn filter(&self, options: &FilterOptions) -> Vec<TaskHandle> {
        let search_lower = options.search_term.trim().to_lowercase();
        let filtered: Vec<TaskHandle> = self
            .tasks
            .borrow()
            .iter()
            .filter(|handle| {
                let t = handle.borrow();
                if let Some(status) = options.status
                    && t.status() != status
                {
                    return false;
                }
                if let Some(cat) = options.category
                    && !t.category().is_some_and(|c| c.eq_ignore_ascii_case(cat))
                {
                    return false;
                }
                if let Some(tag) = options.tag
                    && !t.tags().iter().any(|x| x.eq_ignore_ascii_case(tag))
                {
                    return false;
                }
                if !search_lower.is_empty() {
                    let in_title = t.title().to_lowercase().contains(&search_lower);
                    let in_desc = t
                        .description()
                        .is_some_and(|d| d.to_lowercase().contains(&search_lower));
                    if !in_title && !in_desc {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();
        self.sort_strategy.get().sort(&filtered)
    }

    pub fn stats(&self, now: NaiveDateTime) -> TaskStats {
        let mut stats = TaskStats::default();
        for handle in self.tasks.borrow().iter() {
            let t = handle.borrow();
            stats.total += 1;
            match t.status() {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Trashed => stats.trashed += 1,
            }
            if t.is_overdue(now) {
                stats.overdue += 1;
            }
        }
        stats
    }

    pub fn categories(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .tasks
            .borrow()
            .iter()
            .filter_map(|t| t.borrow().category().map(str::to_string))
            .collect();
        set.into_iter().collect()
    }

    pub fn tags(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .tasks
            .borrow()
            .iter()
            .flat_map(|t| t.borrow().tags().to_vec())
            .collect();
        set.into_iter().collect()
    }
}
