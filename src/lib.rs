pub mod browser;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod poll;
pub mod prompts;
pub mod runner;

pub use config::Config;
pub use error::{AppError, Result};
