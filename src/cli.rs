// File: ./src/cli.rs
//! Shared command-line interface logic: help text and task rendering.
use crate::model::{Priority, Task};
use crate::store::TaskStats;
use std::fmt::Write;

/// Number of id characters shown in listings; any unique prefix is accepted back.
pub const SHORT_ID_LEN: usize = 8;

pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

pub fn print_help(binary_name: &str) {
    println!(
        "Taskflow v{} - personal task tracker with undo/redo",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [--root <path>]                Start the interactive shell", binary_name);
    println!("    {} list [--sort <order>]          Print tasks and exit", binary_name);
    println!("    {} export                         Print stored tasks as JSON", binary_name);
    println!("    {} --help", binary_name);
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -s, --sort <order>    due, priority, created or title.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("EXPORT COMMAND:");
    println!("    {} export > backup.json           Save tasks to file", binary_name);
    println!();
    print!("{}", smart_input_help());
}

pub fn smart_input_help() -> String {
    let mut s = String::new();
    let _ = writeln!(s, "SMART INPUT SYNTAX:");
    let _ = writeln!(s, "    !high !medium !low  Priority (also !1 !2 !3, 1=highest)");
    let _ = writeln!(s, "    @date [HH:MM]       Due date (@2030-01-31, @today, @tomorrow, @3d, @2w)");
    let _ = writeln!(s, "    @\"free text\"        Kept as display text when it is not a date");
    let _ = writeln!(s, "    #tag                Add a tag");
    let _ = writeln!(s, "    cat:name            Category");
    let _ = writeln!(s, "    rec:weekly          Recurrence (none, daily, weekly, monthly)");
    let _ = writeln!(s, "    rem:date [HH:MM]    Reminder (default time from config)");
    let _ = writeln!(s, "    desc:\"text\"         Description");
    let _ = writeln!(s, "    \\#text              Escape special characters");
    let _ = writeln!(s);
    let _ = writeln!(s, "EXAMPLES:");
    let _ = writeln!(s, "    Buy cookies !1 @tomorrow 17:00 #shopping rem:tomorrow 08:00");
    let _ = writeln!(s, "    Quarterly report @2030-03-31 cat:Work rec:monthly desc:\"Q1 numbers\"");
    s
}

pub fn shell_help() -> String {
    let mut s = String::new();
    let _ = writeln!(s, "COMMANDS:");
    let _ = writeln!(s, "    add <smart input>         Create a task");
    let _ = writeln!(s, "    edit <id> <smart input>   Change title, description, due, category, recurrence");
    let _ = writeln!(s, "    done <id>...              Mark tasks completed");
    let _ = writeln!(s, "    rm <id>...                Move tasks to the trash");
    let _ = writeln!(s, "    clone <id>                Duplicate a task");
    let _ = writeln!(s, "    undo / redo               Step through the history");
    let _ = writeln!(s, "    restore <id>              Take a task out of the trash (not undoable)");
    let _ = writeln!(s, "    purge <id>                Delete a task for good (not undoable)");
    let _ = writeln!(s, "    tag <id> [#tag...]        Replace tags (not undoable)");
    let _ = writeln!(s, "    remind <id> <date> [time] Set a reminder, or 'remind <id> clear'");
    let _ = writeln!(s, "    dep <id> <other-id>       Record that a task depends on another");
    let _ = writeln!(s, "    undep <id> <other-id>     Remove a dependency");
    let _ = writeln!(s, "    list [pending|completed|trashed|all]");
    let _ = writeln!(s, "    find <text>               Search titles and descriptions");
    let _ = writeln!(s, "    sort <due|priority|created|title>");
    let _ = writeln!(s, "    show <id>                 Full details");
    let _ = writeln!(s, "    stats                     Counts per status");
    let _ = writeln!(s, "    reminders                 Missed reminders and the next one");
    let _ = writeln!(s, "    save                      Write tasks to disk");
    let _ = writeln!(s, "    help / quit");
    let _ = writeln!(s);
    s.push_str(&smart_input_help());
    s
}

fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "!!",
        Priority::Medium => "! ",
        Priority::Low => "  ",
    }
}

/// One line per task, as used by `list`.
pub fn format_task_line(task: &Task) -> String {
    let mut line = format!(
        "{} {} {} {}",
        task.status().checkbox_symbol(),
        short_id(task.id()),
        priority_marker(task.priority()),
        task.title()
    );
    if let Some(due) = task.due_display() {
        let _ = write!(line, " (due {})", due);
    }
    if let Some(cat) = task.category() {
        let _ = write!(line, " [{}]", cat);
    }
    for tag in task.tags() {
        let _ = write!(line, " #{}", tag);
    }
    line
}

pub fn format_task_details(task: &Task) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "{}", task.title());
    let _ = writeln!(s, "  id:          {}", task.id());
    let _ = writeln!(s, "  status:      {}", task.status());
    let _ = writeln!(s, "  priority:    {}", task.priority());
    if let Some(desc) = task.description() {
        let _ = writeln!(s, "  description: {}", desc);
    }
    if let Some(due) = task.due_display() {
        let _ = writeln!(s, "  due:         {}", due);
    }
    if let Some(cat) = task.category() {
        let _ = writeln!(s, "  category:    {}", cat);
    }
    if !task.tags().is_empty() {
        let _ = writeln!(s, "  tags:        {}", task.tags().join(", "));
    }
    if !task.dependencies().is_empty() {
        let deps: Vec<&str> = task.dependencies().iter().map(|d| short_id(d)).collect();
        let _ = writeln!(s, "  depends on:  {}", deps.join(", "));
    }
    let _ = writeln!(s, "  recurrence:  {}", task.recurrence());
    if let Some(rem) = task.reminder() {
        let _ = writeln!(s, "  reminder:    {}", rem.format("%Y-%m-%d %H:%M"));
    }
    let _ = writeln!(s, "  created:     {}", task.created_at().format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = write!(s, "  updated:     {}", task.updated_at().format("%Y-%m-%d %H:%M:%S UTC"));
    s
}

pub fn format_stats(stats: &TaskStats) -> String {
    format!(
        "{} tasks: {} pending, {} completed, {} trashed, {} overdue",
        stats.total, stats.pending, stats.completed, stats.trashed, stats.overdue
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskStatus;

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_task_line() {
        let mut task = Task::with_id(
            "abcdef123456",
            "Water plants",
            None,
            None,
            Priority::High,
            TaskStatus::Completed,
            vec!["home".to_string()],
            None,
        )
        .unwrap();
        task.set_due_text(Some("weekend".to_string()));
        task.set_category(Some("Garden".to_string()));
        assert_eq!(
            format_task_line(&task),
            "[✔] abcdef12 !! Water plants (due weekend) [Garden] #home"
        );
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = shell_help();
        for cmd in ["add", "edit", "done", "rm", "undo", "redo", "restore", "purge", "save"] {
            assert!(help.contains(cmd), "missing {}", cmd);
        }
    }
}
