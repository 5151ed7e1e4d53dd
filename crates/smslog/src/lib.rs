#![forbid(unsafe_code)]

pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod config;
pub mod correlate;
pub mod discovery;
pub mod extract;
pub mod models;
pub mod parser;
pub mod sqlite;
pub mod summarize;
pub mod utils;

pub use cli::app::{Cli, Command};
