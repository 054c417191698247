#![forbid(unsafe_code)]

pub mod analysis;
pub mod cli;
pub mod config;
pub mod models;
pub mod report;
pub mod sqlite;
pub mod store;
pub mod utils;

pub use cli::app::{Cli, Command};
pub use store::{DataSource, MemorySource};
