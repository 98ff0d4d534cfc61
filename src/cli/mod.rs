//! Command line interface

pub mod args;
pub mod commands;
pub mod factory;

pub use args::{Cli, Commands};
