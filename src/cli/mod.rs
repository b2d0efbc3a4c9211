//! CLI module for quill - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
