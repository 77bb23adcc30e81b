//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Includes defining commands, parsing arguments, the interactive menu, and
//! rendering run reports for the terminal.

mod commands;

pub use commands::*;
