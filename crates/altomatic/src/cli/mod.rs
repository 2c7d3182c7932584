//! Command handlers.

pub mod catalog;
pub mod check;
pub mod config;
pub mod context;
pub mod generate;
pub mod logs;
pub mod progress;
pub mod queue;
pub mod stats;
