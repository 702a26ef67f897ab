//! CLI module
//!
//! Command-line interface for browsing the communities API.
//!
//! # Commands
//!
//! - `list` - Page through communities
//! - `members` - Page through the members of a community
//! - `events` - Page through the events of a community
//! - `join` / `leave` - Change membership
//! - `config` - Show the effective configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, PagingArgs};
pub use runner::{PagingSummary, Runner};
