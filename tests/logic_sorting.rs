// Tests for task sorting logic.
use chrono::{NaiveDate, NaiveDateTime};
use std::thread::sleep;
use std::time::Duration;
use taskflow::model::{Priority, SortStrategy, Task, TaskHandle};
use taskflow::store::TaskStore;

fn task(title: &str, priority: Priority, due: Option<NaiveDateTime>) -> Task {
    Task::new(title, None, due, priority).unwrap()
}

fn day(d: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2031, 2, d).and_then(|date| date.and_hms_opt(10, 0, 0))
}

fn titles(tasks: &[TaskHandle]) -> Vec<String> {
    tasks.iter().map(|t| t.borrow().title().to_string()).collect()
}

#[test]
fn test_sorting_priority_basic() {
    let high = task("A", Priority::High, None);
    let low = task("B", Priority::Low, None);
    assert_eq!(
        SortStrategy::Priority.compare(&high, &low),
        std::cmp::Ordering::Less
    );
    assert_eq!(
        SortStrategy::Priority.compare(&low, &low),
        std::cmp::Ordering::Equal
    );
}

#[test]
fn test_store_query_follows_strategy_swaps() {
    let store = TaskStore::new();
    store.append(task("banana", Priority::Low, day(3)));
    store.append(task("Apple", Priority::High, None));
    store.append(task("cherry", Priority::Medium, day(1)));

    assert_eq!(titles(&store.query()), ["cherry", "banana", "Apple"]);

    store.set_sort_strategy(SortStrategy::Priority);
    assert_eq!(titles(&store.query()), ["Apple", "cherry", "banana"]);

    store.set_sort_strategy(SortStrategy::Title);
    assert_eq!(titles(&store.query()), ["Apple", "banana", "cherry"]);
}

#[test]
fn test_sorting_created_newest_first() {
    let store = TaskStore::with_sort_strategy(SortStrategy::Created);
    store.append(task("old", Priority::Low, None));
    sleep(Duration::from_millis(3));
    store.append(task("new", Priority::Low, None));
    assert_eq!(titles(&store.query()), ["new", "old"]);
}

#[test]
fn test_undated_tasks_always_last() {
    let store = TaskStore::new();
    store.append(task("undated 1", Priority::High, None));
    store.append(task("dated", Priority::Low, day(20)));
    store.append(task("undated 2", Priority::High, None));
    assert_eq!(titles(&store.query()), ["dated", "undated 1", "undated 2"]);
}

#[test]
fn test_query_does_not_reorder_storage() {
    let store = TaskStore::with_sort_strategy(SortStrategy::Title);
    store.append(task("z", Priority::Low, None));
    store.append(task("a", Priority::Low, None));
    assert_eq!(titles(&store.query()), ["a", "z"]);
    assert_eq!(titles(&store.all_tasks()), ["z", "a"]);
}
