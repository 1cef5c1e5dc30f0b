// File: ./src/shell.rs
//! Line-oriented interactive shell over the task controller.
//!
//! Each input line is one command. Undoable changes go through the controller
//! so they land on the shared history; `restore`, `purge`, `tag`, `remind` and
//! the dependency commands change the store directly.
use crate::cli;
use crate::command::TaskEdit;
use crate::config::Config;
use crate::context::SharedContext;
use crate::controller::{NewTask, TaskController};
use crate::error::ValidationError;
use crate::model::parser::{parse_smart_input_at, strip_quotes};
use crate::model::{SortStrategy, TaskHandle, TaskStatus};
use crate::reminder::{ReminderTracker, missed_reminders, next_reminder};
use crate::storage::LocalStorage;
use crate::store::{FilterOptions, ListenerId, TaskStore};
use anyhow::{Result, anyhow};
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::io::{BufRead, Write};

/// Result of handling one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

/// Saves the whole store after every change.
pub fn install_autosave(store: &TaskStore, ctx: SharedContext) -> ListenerId {
    store.add_listener(move |s: &TaskStore| {
        if let Err(e) = LocalStorage::save(ctx.as_ref(), &s.snapshot_tasks()) {
            log::error!("Autosave failed: {:#}", e);
        }
    })
}

type Clock = Box<dyn Fn() -> NaiveDateTime>;

pub struct Shell {
    controller: TaskController,
    config: Config,
    ctx: Option<SharedContext>,
    tracker: ReminderTracker,
    clock: Clock,
}

fn split_first(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (s, ""),
    }
}

impl Shell {
    /// `ctx` is needed only by `save`; without it the shell works purely in memory.
    pub fn new(controller: TaskController, config: Config, ctx: Option<SharedContext>) -> Self {
        Self {
            controller,
            config,
            ctx,
            tracker: ReminderTracker::new(),
            clock: Box::new(|| Local::now().naive_local()),
        }
    }

    /// Replaces the wall clock, for deterministic dates.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Starts from an existing tracker so reminders reported elsewhere stay quiet.
    pub fn with_tracker(mut self, tracker: ReminderTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn controller(&self) -> &TaskController {
        &self.controller
    }

    fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    fn store(&self) -> &TaskStore {
        &self.controller.store
    }

    /// Reads commands until end of input or `quit`.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> Result<()> {
        writeln!(output, "Type 'help' for commands.")?;
        let mut line = String::new();
        loop {
            let now = self.now();
            for reminder in self.tracker.poll(&self.controller.store, now) {
                writeln!(output, "{}", reminder.message())?;
            }
            write!(output, "taskflow> ")?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                break;
            }
            match self.handle(&line) {
                Ok(Reply::Quit) => break,
                Ok(Reply::Text(text)) => {
                    if !text.is_empty() {
                        writeln!(output, "{}", text)?;
                    }
                }
                Err(e) => {
                    log::debug!("Command failed: {:#}", e);
                    writeln!(output, "Error: {}", e)?;
                }
            }
        }
        Ok(())
    }

    /// Handles one command line.
    pub fn handle(&mut self, line: &str) -> Result<Reply> {
        let (cmd, rest) = split_first(line);
        if cmd.is_empty() {
            return Ok(Reply::Text(String::new()));
        }
        let text = match cmd.to_lowercase().as_str() {
            "add" | "a" => self.add(rest)?,
            "edit" | "e" => self.edit(rest)?,
            "done" | "complete" => self.complete(rest)?,
            "rm" | "delete" | "del" => self.trash(rest)?,
            "clone" => self.clone_task(rest)?,
            "undo" | "u" => self.undo(),
            "redo" => self.redo(),
            "restore" => self.restore(rest)?,
            "purge" => self.purge(rest)?,
            "tag" => self.tag(rest)?,
            "remind" => self.remind(rest)?,
            "dep" => self.dependency(rest, true)?,
            "undep" => self.dependency(rest, false)?,
            "list" | "ls" => self.list(rest)?,
            "find" | "search" => self.find(rest),
            "sort" => self.sort(rest)?,
            "show" => self.show(rest)?,
            "stats" => cli::format_stats(&self.store().stats(self.now())),
            "reminders" => self.reminders(),
            "save" => self.save()?,
            "help" | "?" => cli::shell_help(),
            "quit" | "exit" | "q" => return Ok(Reply::Quit),
            other => return Err(anyhow!("Unknown command '{}'. Type 'help'.", other)),
        };
        Ok(Reply::Text(text))
    }

    fn resolve(&self, token: &str) -> Result<String, ValidationError> {
        self.controller.resolve_id(token)
    }

    fn resolve_all(&self, rest: &str) -> Result<Vec<String>, ValidationError> {
        if rest.is_empty() {
            return Err(ValidationError::BlankId);
        }
        rest.split_whitespace().map(|t| self.resolve(t)).collect()
    }

    fn title_of(&self, id: &str) -> String {
        self.store()
            .find_by_id(id)
            .ok()
            .flatten()
            .map(|t| t.borrow().title().to_string())
            .unwrap_or_default()
    }

    fn add(&self, rest: &str) -> Result<String> {
        let input = parse_smart_input_at(rest, self.today(), self.config.reminder_time());
        let new = NewTask::from_smart(input, self.config.default_priority);
        let id = self.controller.add_task(new)?;
        Ok(format!("Added {}: {}", cli::short_id(&id), self.title_of(&id)))
    }

    fn edit(&self, rest: &str) -> Result<String> {
        let (token, input) = split_first(rest);
        let id = self.resolve(token)?;
        let task = self
            .store()
            .find_by_id(&id)?
            .ok_or_else(|| ValidationError::TaskNotFound { task_id: id.clone() })?;
        let parsed = parse_smart_input_at(input, self.today(), self.config.reminder_time());

        // Anything not given keeps its current value.
        let edit = {
            let current = task.borrow();
            let (due, due_text) = if parsed.has_due() {
                (parsed.due, parsed.due_text.clone())
            } else {
                (current.due(), current.due_text().map(str::to_string))
            };
            TaskEdit {
                title: if parsed.title.trim().is_empty() {
                    current.title().to_string()
                } else {
                    parsed.title.clone()
                },
                description: parsed
                    .description
                    .clone()
                    .or_else(|| current.description().map(str::to_string)),
                due,
                due_text,
                category: parsed.category.clone(),
                recurrence: parsed.recurrence,
            }
        };
        self.controller.edit_task(&id, edit)?;

        let mut reply = format!("Edited {}: {}", cli::short_id(&id), self.title_of(&id));
        if parsed.priority.is_some() || !parsed.tags.is_empty() || parsed.reminder.is_some() {
            reply.push_str("\n(priority, tags and reminders are not changed by edit; see 'tag' and 'remind')");
        }
        Ok(reply)
    }

    fn complete(&self, rest: &str) -> Result<String> {
        let ids = self.resolve_all(rest)?;
        self.controller.bulk_complete(&ids)?;
        Ok(format!("Completed {} task(s).", ids.len()))
    }

    fn trash(&self, rest: &str) -> Result<String> {
        let ids = self.resolve_all(rest)?;
        self.controller.bulk_delete(&ids)?;
        Ok(format!("Moved {} task(s) to the trash.", ids.len()))
    }

    fn clone_task(&self, rest: &str) -> Result<String> {
        let id = self.resolve(rest)?;
        let copy = self.controller.clone_task(&id)?;
        Ok(format!("Cloned as {}: {}", cli::short_id(&copy), self.title_of(&copy)))
    }

    fn undo(&self) -> String {
        match self.controller.history.next_undo_label() {
            Some(label) => {
                self.controller.undo();
                format!("Undid {}.", label)
            }
            None => "Nothing to undo.".to_string(),
        }
    }

    fn redo(&self) -> String {
        match self.controller.history.next_redo_label() {
            Some(label) => {
                self.controller.redo();
                format!("Redid {}.", label)
            }
            None => "Nothing to redo.".to_string(),
        }
    }

    fn restore(&self, rest: &str) -> Result<String> {
        let id = self.resolve(rest)?;
        self.controller.restore_from_trash(&id)?;
        Ok(format!("Restored {}.", self.title_of(&id)))
    }

    fn purge(&self, rest: &str) -> Result<String> {
        let id = self.resolve(rest)?;
        let title = self.title_of(&id);
        self.controller.purge_task(&id)?;
        Ok(format!("Permanently deleted {}.", title))
    }

    fn tag(&self, rest: &str) -> Result<String> {
        let (token, tail) = split_first(rest);
        let id = self.resolve(token)?;
        let mut tags: Vec<String> = Vec::new();
        for raw in tail.split_whitespace() {
            let tag = strip_quotes(raw.trim_start_matches('#'));
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        let count = tags.len();
        self.controller.set_tags(&id, tags)?;
        Ok(format!("{} tag(s) on {}.", count, self.title_of(&id)))
    }

    fn remind(&self, rest: &str) -> Result<String> {
        let (token, when) = split_first(rest);
        let id = self.resolve(token)?;
        if when.eq_ignore_ascii_case("clear") || when.eq_ignore_ascii_case("none") {
            self.controller.set_reminder(&id, None)?;
            return Ok("Reminder cleared.".to_string());
        }
        let parsed = parse_smart_input_at(
            &format!("rem:{}", when),
            self.today(),
            self.config.reminder_time(),
        );
        let at = parsed.reminder.ok_or_else(|| ValidationError::UnknownValue {
            kind: "reminder",
            value: when.to_string(),
        })?;
        self.controller.set_reminder(&id, Some(at))?;
        Ok(format!("Reminder set for {}.", at.format("%Y-%m-%d %H:%M")))
    }

    fn dependency(&self, rest: &str, add: bool) -> Result<String> {
        let (a, b) = split_first(rest);
        let id = self.resolve(a)?;
        let other = self.resolve(b)?;
        let changed = if add {
            self.controller.add_dependency(&id, &other)?
        } else {
            self.controller.remove_dependency(&id, &other)?
        };
        let reply = if changed { "Dependencies updated." } else { "No change." };
        Ok(reply.to_string())
    }

    fn render(tasks: &[TaskHandle]) -> String {
        if tasks.is_empty() {
            return "No tasks.".to_string();
        }
        tasks
            .iter()
            .map(|t| cli::format_task_line(&t.borrow()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn list(&self, rest: &str) -> Result<String> {
        let tasks: Vec<TaskHandle> = match rest.to_lowercase().as_str() {
            "" => self
                .store()
                .query()
                .into_iter()
                .filter(|t| t.borrow().status() != TaskStatus::Trashed)
                .collect(),
            "all" => self.store().query(),
            other => {
                let status = other
                    .parse::<TaskStatus>()
                    .map_err(|_| ValidationError::UnknownValue {
                        kind: "status",
                        value: other.to_string(),
                    })?;
                self.store().filter(&FilterOptions {
                    status: Some(status),
                    ..Default::default()
                })
            }
        };
        Ok(Self::render(&tasks))
    }

    fn find(&self, rest: &str) -> String {
        let (category, tag, term) = match rest.split_once(':') {
            Some(("cat", value)) => (Some(value.trim()), None, ""),
            _ => match rest.strip_prefix('#') {
                Some(tag) => (None, Some(tag.trim()), ""),
                None => (None, None, rest),
            },
        };
        let tasks = self.store().filter(&FilterOptions {
            status: None,
            category,
            tag,
            search_term: term,
        });
        Self::render(&tasks)
    }

    fn sort(&self, rest: &str) -> Result<String> {
        let strategy = rest
            .parse::<SortStrategy>()
            .map_err(|_| ValidationError::UnknownValue {
                kind: "sort order",
                value: rest.to_string(),
            })?;
        self.store().set_sort_strategy(strategy);
        Ok(format!("Sorting by {}.", strategy))
    }

    fn show(&self, rest: &str) -> Result<String> {
        let id = self.resolve(rest)?;
        let task = self
            .store()
            .find_by_id(&id)?
            .ok_or(ValidationError::TaskNotFound { task_id: id })?;
        let details = cli::format_task_details(&task.borrow());
        Ok(details)
    }

    fn reminders(&self) -> String {
        let now = self.now();
        let mut lines: Vec<String> = missed_reminders(self.store(), now)
            .iter()
            .map(|r| r.message())
            .collect();
        if let Some(next) = next_reminder(self.store(), now) {
            lines.push(format!(
                "Next reminder: {} at {}",
                next.task_title,
                next.remind_at.format("%Y-%m-%d %H:%M")
            ));
        }
        if lines.is_empty() {
            return "No reminders due.".to_string();
        }
        lines.join("\n")
    }

    fn save(&self) -> Result<String> {
        let ctx = self
            .ctx
            .as_ref()
            .ok_or_else(|| anyhow!("No storage location configured"))?;
        let tasks = self.store().snapshot_tasks();
        LocalStorage::save(ctx.as_ref(), &tasks)?;
        Ok(format!("Saved {} task(s).", tasks.len()))
    }
}
