//! Pre-flight checks for pyprobe
//!
//! Validates that the target exists and that the kernel is likely to let us
//! trace it, before attempting to attach. Provides clear, actionable error
//! messages when requirements aren't met.

#![allow(unsafe_code)] // geteuid() requires unsafe

use anyhow::{bail, Result};
use log::warn;
use std::path::Path;

use crate::domain::Pid;

const PTRACE_SCOPE_PATH: &str = "/proc/sys/kernel/yama/ptrace_scope";

/// Run all pre-flight checks before the first attach
///
/// # Errors
/// Returns an error if the target process does not exist
pub fn run_preflight_checks(pid: Pid) -> Result<()> {
    check_process_exists(pid)?;
    check_ptrace_scope();
    Ok(())
}

/// Check if the target process exists
///
/// # Errors
/// Returns an error if `/proc/<pid>` is missing
pub fn check_process_exists(pid: Pid) -> Result<()> {
    let proc_path = format!("/proc/{pid}");
    if !Path::new(&proc_path).exists() {
        bail!(
            "Process {pid} not found.\n\n\
             Is the process still running? Check with: ps -p {pid}"
        );
    }
    Ok(())
}

/// Warn when Yama will likely refuse to let us attach to a non-child
fn check_ptrace_scope() {
    let Ok(content) = std::fs::read_to_string(PTRACE_SCOPE_PATH) else {
        // No Yama LSM: classic ptrace permission rules apply
        return;
    };
    let Some(scope) = parse_ptrace_scope(&content) else {
        return;
    };

    if scope > 0 && unsafe { libc::geteuid() } != 0 {
        warn!(
            "{PTRACE_SCOPE_PATH} is {scope}; attaching to a non-child process needs root or \
             CAP_SYS_PTRACE (run with sudo, or set ptrace_scope to 0)"
        );
    }
}

fn parse_ptrace_scope(content: &str) -> Option<u32> {
    content.trim().parse().ok()
}
