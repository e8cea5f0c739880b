//! A personal fuel-expense tracker: a transaction store persisted to a local key-value file,
//! report aggregation over day, week, month and year windows, CSV and Markdown export, and an
//! optional remote metadata API for registered users.

pub mod api;
mod app;
pub mod args;
mod backup;
pub mod commands;
mod config;
mod document;
mod error;
pub mod model;
pub mod report;
mod spreadsheet;
pub mod store;
mod utils;


pub use api::Mode;
pub use app::{App, Services};
pub use backup::Backup;
pub use config::{Config, UserMode};
pub use error::{Error, ErrorType, Result};
