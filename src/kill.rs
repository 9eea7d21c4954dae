//! Process-tree termination.
//!
//! Tasks are spawned through a shell, so the pid on the task record is the
//! interpreter's; signaling it alone would leave the actual script (and
//! anything it spawned) running. This module snapshots the process table,
//! walks the descendants of the root pid, and sends a forceful signal to
//! every process collected.

use std::collections::{HashMap, HashSet};

use sysinfo::{Pid, ProcessesToUpdate, System};
use thiserror::Error;

/// Descendant enumeration could not locate the root process.
#[derive(Debug, Error)]
pub enum TerminationError {
    /// The root pid was not present in the process table; whatever pids
    /// were collected are still signaled.
    #[error("process {0} not found in process table")]
    RootNotFound(u32),
}

/// Sends a forceful termination signal to `root_pid` and every process
/// descending from it.
///
/// Fire-and-forget: the call returns once the signals are dispatched,
/// without waiting for the processes to be reaped. Descendants spawned
/// after the table snapshot was taken are missed.
pub fn terminate_tree(root_pid: u32) -> Result<(), TerminationError> {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);

    let root = Pid::from_u32(root_pid);
    let root_known = system.process(root).is_some();

    let mut children: HashMap<Pid, Vec<Pid>> = HashMap::new();
    for (pid, process) in system.processes() {
        if let Some(parent) = process.parent() {
            children.entry(parent).or_default().push(*pid);
        }
    }

    let mut stack = vec![root];
    let mut collected: HashSet<Pid> = HashSet::new();
    while let Some(current) = stack.pop() {
        if !collected.insert(current) {
            continue;
        }
        if let Some(kids) = children.get(&current) {
            stack.extend(kids.iter().copied());
        }
    }

    for pid in &collected {
        kill_pid(&system, *pid);
    }

    if root_known {
        Ok(())
    } else {
        Err(TerminationError::RootNotFound(root_pid))
    }
}

#[cfg(unix)]
fn kill_pid(_system: &System, pid: Pid) {
    unsafe {
        let _ = libc::kill(pid.as_u32() as i32, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_pid(system: &System, pid: Pid) {
    if let Some(process) = system.process(pid) {
        process.kill();
    }
}
