// File: tests/controller_behavior.rs
// The controller is the only entry point the shell uses; these tests pin down
// which of its actions land on the shared history and which do not.
use std::rc::Rc;
use taskflow::command::TaskEdit;
use taskflow::controller::{NewTask, TaskController};
use taskflow::error::ValidationError;
use taskflow::history::CommandHistory;
use taskflow::model::{Priority, Recurrence, TaskStatus};
use taskflow::store::TaskStore;

fn controller() -> TaskController {
    TaskController::new(Rc::new(TaskStore::new()), Rc::new(CommandHistory::new()))
}

fn status(c: &TaskController, id: &str) -> TaskStatus {
    c.store.find_by_id(id).unwrap().unwrap().borrow().status()
}

#[test]
fn test_shared_history_orders_all_features() {
    let store = Rc::new(TaskStore::new());
    let history = Rc::new(CommandHistory::new());
    // Two front-ends over the same timeline.
    let first = TaskController::new(store.clone(), history.clone());
    let second = TaskController::new(store.clone(), history.clone());

    let id = first.add_task(NewTask::new("Shared", Priority::Medium)).unwrap();
    second.complete_task(&id).unwrap();
    assert_eq!(history.undo_len(), 2);

    first.undo();
    assert_eq!(status(&second, &id), TaskStatus::Pending);
    second.undo();
    assert!(store.is_empty());
}

#[test]
fn test_edit_validation() {
    let c = controller();
    assert_eq!(
        c.edit_task("", TaskEdit::new("t")).unwrap_err(),
        ValidationError::BlankId
    );
    assert_eq!(
        c.edit_task("some-id", TaskEdit::new(" ")).unwrap_err(),
        ValidationError::BlankTitle
    );
    assert!(!c.can_undo());
}

#[test]
fn test_clone_copies_fields_and_is_undoable() {
    let c = controller();
    let id = c
        .add_task(NewTask {
            title: "Weekly review".to_string(),
            description: Some("inbox zero".to_string()),
            category: Some("Work".to_string()),
            recurrence: Recurrence::Weekly,
            tags: vec!["gtd".to_string()],
            ..NewTask::new("", Priority::High)
        })
        .unwrap();

    let copy = c.clone_task(&id).unwrap();
    assert_ne!(copy, id);
    {
        let task = c.store.find_by_id(&copy).unwrap().unwrap();
        let t = task.borrow();
        assert_eq!(t.title(), "Weekly review (Copy)");
        assert_eq!(t.description(), Some("inbox zero"));
        assert_eq!(t.priority(), Priority::High);
        assert_eq!(t.category(), Some("Work"));
        assert_eq!(t.recurrence(), Recurrence::Weekly);
        assert_eq!(t.tags(), ["gtd".to_string()]);
    }

    c.undo();
    assert!(c.store.find_by_id(&copy).unwrap().is_none());
    assert_eq!(c.store.len(), 1);
}

#[test]
fn test_bulk_operations_skip_blank_ids() {
    let c = controller();
    let a = c.add_task(NewTask::new("a", Priority::Low)).unwrap();
    let b = c.add_task(NewTask::new("b", Priority::Low)).unwrap();

    c.bulk_complete(&[a.as_str(), "  ", b.as_str()]).unwrap();
    assert_eq!(c.history.undo_len(), 4);
    assert_eq!(status(&c, &a), TaskStatus::Completed);
    assert_eq!(status(&c, &b), TaskStatus::Completed);

    c.bulk_delete(&[a.clone()]).unwrap();
    assert_eq!(status(&c, &a), TaskStatus::Trashed);

    // One undo per id.
    c.undo();
    c.undo();
    assert_eq!(status(&c, &a), TaskStatus::Pending);
    assert_eq!(status(&c, &b), TaskStatus::Pending);
}

#[test]
fn test_direct_actions_bypass_history() {
    let c = controller();
    let id = c.add_task(NewTask::new("Direct", Priority::Low)).unwrap();
    c.delete_task(&id).unwrap();
    let before = c.history.undo_len();

    c.restore_from_trash(&id).unwrap();
    c.set_tags(&id, vec!["x".to_string()]).unwrap();
    c.set_reminder(&id, None).unwrap();
    assert_eq!(c.history.undo_len(), before);

    c.purge_task(&id).unwrap();
    assert!(c.store.is_empty());
    assert!(matches!(
        c.purge_task(&id),
        Err(ValidationError::TaskNotFound { .. })
    ));
}

#[test]
fn test_undo_after_purge_does_not_restore_into_store() {
    let c = controller();
    let id = c.add_task(NewTask::new("Gone", Priority::Low)).unwrap();
    c.delete_task(&id).unwrap();
    c.purge_task(&id).unwrap();
    c.undo();
    assert!(c.store.is_empty());
    // the add's undo has nothing left to remove
    c.undo();
    assert!(c.store.is_empty());
    assert!(!c.can_undo());
    assert!(c.can_redo());

    c.redo();
    assert_eq!(status(&c, &id), TaskStatus::Pending);
}

#[test]
fn test_resolve_id_prefix() {
    let c = controller();
    let id = c.add_task(NewTask::new("Prefix", Priority::Low)).unwrap();
    assert_eq!(c.resolve_id(&id[..6]).unwrap(), id);
    assert_eq!(c.resolve_id("").unwrap_err(), ValidationError::BlankId);
}
