//! hopperctl - command-line shell around the Hopper ledger

pub mod commands;
pub mod logging;
pub mod repl;
