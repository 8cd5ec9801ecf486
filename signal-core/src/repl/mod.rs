//! Bench REPL tooling shared with the host emulator.
//!
//! The command grammar lives in [`grammar`]; [`status`] renders the
//! controller state for the `status` command.

pub mod grammar;
pub mod status;
