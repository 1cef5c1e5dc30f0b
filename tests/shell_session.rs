// File: tests/shell_session.rs
// Drives the interactive shell the way a user would, one line at a time.
use chrono::{NaiveDate, NaiveDateTime};
use std::io::Cursor;
use std::rc::Rc;
use taskflow::config::Config;
use taskflow::context::{SharedContext, TestContext};
use taskflow::controller::TaskController;
use taskflow::history::CommandHistory;
use taskflow::model::{Priority, TaskStatus};
use taskflow::shell::{Reply, Shell};
use taskflow::storage::LocalStorage;
use taskflow::store::TaskStore;

fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2030, 6, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn shell_with(ctx: Option<SharedContext>) -> Shell {
    let controller =
        TaskController::new(Rc::new(TaskStore::new()), Rc::new(CommandHistory::new()));
    Shell::new(controller, Config::default(), ctx).with_clock(noon)
}

fn say(sh: &mut Shell, line: &str) -> String {
    match sh.handle(line).unwrap() {
        Reply::Text(t) => t,
        Reply::Quit => panic!("unexpected quit on '{}'", line),
    }
}

fn session(sh: &mut Shell, script: &str) -> String {
    let mut out = Vec::new();
    sh.run(Cursor::new(script.as_bytes()), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn only_id(sh: &Shell) -> String {
    let tasks = sh.controller().store.all_tasks();
    assert_eq!(tasks.len(), 1);
    let id = tasks[0].borrow().id().to_string();
    id
}

#[test]
fn test_add_list_undo_session() {
    let mut sh = shell_with(None);
    let out = session(&mut sh, "add Buy milk !high\nlist\nundo\nlist\nquit\n");

    assert!(out.starts_with("Type 'help' for commands."));
    assert!(out.contains("Added "));
    assert!(out.contains("!! Buy milk"));
    assert!(out.contains("Undid add."));
    assert!(out.contains("No tasks."));
    assert!(sh.controller().store.is_empty());
}

#[test]
fn test_errors_do_not_end_session() {
    let mut sh = shell_with(None);
    let out = session(&mut sh, "done\nbogus\nadd  \nadd Still works\n");
    assert_eq!(out.matches("Error: ").count(), 3);
    assert!(out.contains("Still works"));
    // End of input without `quit` also stops cleanly.
    assert!(out.ends_with("taskflow> \n"));
}

#[test]
fn test_reminder_is_printed_once() {
    let mut sh = shell_with(None);
    let out = session(&mut sh, "add Call mom rem:2030-06-10 09:00\nlist\nlist\n");
    assert_eq!(out.matches("Reminder: Call mom is due soon!").count(), 1);
}

#[test]
fn test_done_then_undo_restores_pending() {
    let mut sh = shell_with(None);
    say(&mut sh, "add Water plants");
    let id = only_id(&sh);

    assert_eq!(say(&mut sh, &format!("done {}", &id[..8])), "Completed 1 task(s).");
    assert!(say(&mut sh, "list completed").contains("Water plants"));
    assert_eq!(say(&mut sh, "list pending"), "No tasks.");

    assert_eq!(say(&mut sh, "undo"), "Undid complete.");
    let status = sh.controller().store.find_by_id(&id).unwrap().unwrap().borrow().status();
    assert_eq!(status, TaskStatus::Pending);
}

#[test]
fn test_rm_hides_from_default_list_and_restore() {
    let mut sh = shell_with(None);
    say(&mut sh, "add Old idea");
    let id = only_id(&sh);
    let short = &id[..8];

    say(&mut sh, &format!("rm {}", short));
    assert_eq!(say(&mut sh, "list"), "No tasks.");
    assert!(say(&mut sh, "list all").contains("Old idea"));

    assert_eq!(say(&mut sh, &format!("restore {}", short)), "Restored Old idea.");
    assert!(say(&mut sh, "list").contains("Old idea"));

    say(&mut sh, &format!("purge {}", short));
    assert!(sh.controller().store.is_empty());
}

#[test]
fn test_edit_keeps_unspecified_fields() {
    let mut sh = shell_with(None);
    say(&mut sh, "add Draft report cat:Work @2030-06-20 desc:\"first pass\"");
    let id = only_id(&sh);

    let reply = say(&mut sh, &format!("edit {} Final report !high", &id[..8]));
    assert!(reply.starts_with("Edited "));
    assert!(reply.contains("not changed by edit"));

    {
        let task = sh.controller().store.find_by_id(&id).unwrap().unwrap();
        let t = task.borrow();
        assert_eq!(t.title(), "Final report");
        assert_eq!(t.category(), Some("Work"));
        assert_eq!(t.description(), Some("first pass"));
        assert_eq!(t.due().map(|d| d.date()), NaiveDate::from_ymd_opt(2030, 6, 20));
        assert_eq!(t.priority(), Priority::Medium);
    }

    say(&mut sh, "undo");
    let task = sh.controller().store.find_by_id(&id).unwrap().unwrap();
    assert_eq!(task.borrow().title(), "Draft report");
}

#[test]
fn test_find_tag_and_category() {
    let mut sh = shell_with(None);
    say(&mut sh, "add Buy paint #diy cat:Home");
    say(&mut sh, "add Pay rent cat:Home");
    say(&mut sh, "add Write memo cat:Work");

    let home = say(&mut sh, "find cat:home");
    assert!(home.contains("Buy paint") && home.contains("Pay rent"));
    assert!(!home.contains("Write memo"));

    let diy = say(&mut sh, "find #diy");
    assert!(diy.contains("Buy paint") && !diy.contains("Pay rent"));

    assert!(say(&mut sh, "find MEMO").contains("Write memo"));
    assert_eq!(say(&mut sh, "find nothing-matches"), "No tasks.");
}

#[test]
fn test_tag_and_remind_are_direct() {
    let mut sh = shell_with(None);
    say(&mut sh, "add Gym");
    let id = only_id(&sh);
    let short = &id[..8];
    let before = sh.controller().history.undo_len();

    assert_eq!(say(&mut sh, &format!("tag {} #health #health #fit", short)), "2 tag(s) on Gym.");
    assert_eq!(
        say(&mut sh, &format!("remind {} tomorrow 06:30", short)),
        "Reminder set for 2030-06-11 06:30."
    );
    assert!(sh.handle(&format!("remind {} whenever", short)).is_err());
    assert_eq!(say(&mut sh, &format!("remind {} clear", short)), "Reminder cleared.");
    assert_eq!(sh.controller().history.undo_len(), before);

    let task = sh.controller().store.find_by_id(&id).unwrap().unwrap();
    assert_eq!(task.borrow().tags(), ["health".to_string(), "fit".to_string()]);
    assert_eq!(task.borrow().reminder(), None);
}

#[test]
fn test_stats_and_reminders() {
    let mut sh = shell_with(None);
    assert_eq!(say(&mut sh, "reminders"), "No reminders due.");
    say(&mut sh, "add Late thing @2030-06-01 rem:2030-06-01 08:00");
    assert_eq!(
        say(&mut sh, "stats"),
        "1 tasks: 1 pending, 0 completed, 0 trashed, 1 overdue"
    );
    assert!(say(&mut sh, "reminders").contains("Reminder: Late thing is due soon!"));
}

#[test]
fn test_reminders_show_next_upcoming() {
    let mut sh = shell_with(None);
    say(&mut sh, "add Dentist rem:2030-06-12 08:00");
    say(&mut sh, "add Standup rem:2030-06-11 09:15");
    assert_eq!(
        say(&mut sh, "reminders"),
        "Next reminder: Standup at 2030-06-11 09:15"
    );

    say(&mut sh, "add Overdue call rem:2030-06-09 17:00");
    let reply = say(&mut sh, "reminders");
    let lines: Vec<&str> = reply.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Reminder: Overdue call is due soon!"));
    assert_eq!(lines[1], "Next reminder: Standup at 2030-06-11 09:15");
}

#[test]
fn test_save_writes_task_file() {
    let ctx = Rc::new(TestContext::new());
    let shared: SharedContext = ctx.clone();
    let mut sh = shell_with(Some(shared));
    say(&mut sh, "add One");
    say(&mut sh, "add Two");
    assert_eq!(say(&mut sh, "save"), "Saved 2 task(s).");
    assert_eq!(LocalStorage::load(&*ctx).unwrap().len(), 2);
}
