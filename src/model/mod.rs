// File: ./src/model/mod.rs
pub mod item;
pub mod parser;
pub mod sort;

pub use item::{EditSnapshot, Priority, Recurrence, Task, TaskHandle, TaskStatus};
pub use sort::SortStrategy;
