// File: ./src/history.rs
//! Undo/redo engine.
//!
//! One `CommandHistory` is built at startup and shared by handle with every
//! component that issues mutations, so all features share a single linear
//! timeline. `run` is the only way an operation enters that timeline.
use crate::command::{Command, Reversible};
use std::cell::RefCell;
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct CommandHistory {
    executed: RefCell<VecDeque<Command>>,
    undone: RefCell<Vec<Command>>,
    // 0 means unlimited
    limit: usize,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `limit` undoable entries, dropping the oldest first.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Executes the operation, records it and invalidates every redoable entry.
    pub fn run(&self, command: impl Into<Command>) {
        let mut command = command.into();
        log::info!("Running {} on {}", command.label(), command.task_id());
        // Not borrowed while executing: listeners may inspect the history.
        command.execute();
        self.executed.borrow_mut().push_back(command);
        self.undone.borrow_mut().clear();
        self.enforce_limit();
    }

    /// Reverses the most recent operation. Does nothing if there is none.
    pub fn undo(&self) {
        let Some(mut command) = self.executed.borrow_mut().pop_back() else {
            return;
        };
        log::info!("Undoing {} on {}", command.label(), command.task_id());
        command.undo();
        self.undone.borrow_mut().push(command);
    }

    /// Re-applies the most recently undone operation. Does nothing if there is none.
    pub fn redo(&self) {
        let Some(mut command) = self.undone.borrow_mut().pop() else {
            return;
        };
        log::info!("Redoing {} on {}", command.label(), command.task_id());
        command.execute();
        self.executed.borrow_mut().push_back(command);
        self.enforce_limit();
    }

    pub fn can_undo(&self) -> bool {
        !self.executed.borrow().is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.borrow().is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.executed.borrow().len()
    }

    pub fn redo_len(&self) -> usize {
        self.undone.borrow().len()
    }

    /// Label of the operation `undo` would reverse next.
    pub fn next_undo_label(&self) -> Option<&'static str> {
        self.executed.borrow().back().map(Command::label)
    }

    /// Label of the operation `redo` would re-apply next.
    pub fn next_redo_label(&self) -> Option<&'static str> {
        self.undone.borrow().last().map(Command::label)
    }

    fn enforce_limit(&self) {
        let limit = self.limit;
        if limit == 0 {
            return;
        }
        let mut executed = self.executed.borrow_mut();
        while executed.len() > limit {
            if let Some(dropped) = executed.pop_front() {
                log::debug!("History full, forgetting {}", dropped.label());
            }
        }
    }
}
