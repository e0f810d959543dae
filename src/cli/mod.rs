//! CLI module for feedsweep - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
