//! CLI module for the bgcutout library
//!
//! This module is only available when the "cli" feature is enabled.

mod config;
#[path = "main.rs"]
mod main_impl;
mod sink;

pub use main_impl::{main, Cli, CliFallback, CliLocale};
pub use sink::FileSink;
