//! Command-line interface for pyprobe
//!
//! This module contains CLI argument parsing and the version banner

pub mod args;

pub use args::Args;

/// Printed by `-v/--version`, after the binary name
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\n\n",
    "Build: CPython 2.7 frame layout, 64-bit Linux (ptrace)"
);
