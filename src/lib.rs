//! Terminal task board: tasks with deadlines, synced from a remote task store
//! and grouped into ongoing, completed-on-time and failed.

pub mod api;
pub mod app;
pub mod classify;
pub mod config;
pub mod deadline;
pub mod error;
pub mod models;
pub mod parser;
pub mod poll;
pub mod sync;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_utils;
