// Crate root library declaration and module exports.
pub mod cli;
pub mod command;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod history;
pub mod model;
pub mod reminder;
pub mod shell;
pub mod storage;
pub mod store;
