//! mothdev - developer workflow launcher for the moth calibre plugin

pub mod bridge;
pub mod config;
pub mod error;
pub mod project;
pub mod runner;
pub mod workflow;

pub use config::DevConfig;
pub use error::{DevError, Result};
