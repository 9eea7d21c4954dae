//! Data structures for tracking task state.
//!
//! This module defines the identity of a task run (`TaskKey`), its lifecycle
//! status (`TaskStatus`), the bounded log of classified output (`TaskLog`),
//! and the full record (`Task`) the supervisor owns while the task's process
//! is alive.

use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Kind of project a task belongs to.
///
/// The kind feeds argument augmentation when a task is launched; kinds the
/// policy table does not know about are carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ProjectType {
    CreateReactApp,
    Gatsby,
    Other(String),
}

impl From<String> for ProjectType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "create-react-app" => Self::CreateReactApp,
            "gatsby" => Self::Gatsby,
            _ => Self::Other(value),
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateReactApp => f.write_str("create-react-app"),
            Self::Gatsby => f.write_str("gatsby"),
            Self::Other(kind) => f.write_str(kind),
        }
    }
}

/// A project known to the supervisor.
///
/// Read-only here: discovery and persistence of projects live outside this
/// crate, the supervisor only looks entries up by id.
#[derive(Debug, Clone)]
pub struct Project {
    /// Unique project identifier, also its directory name under the root.
    pub id: String,
    /// Project kind.
    pub kind: ProjectType,
    /// Directory tasks are spawned in.
    pub path: PathBuf,
}

/// Identity of one task run: a project may have at most one live task per
/// name at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub project_id: String,
    pub name: String,
}

impl TaskKey {
    pub fn new(project_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project_id, self.name)
    }
}

/// Whether a task is expected to run indefinitely and bind a network port.
///
/// Dev servers are started through the conventional `start` script; every
/// other script is a one-shot job that exits on its own.
pub fn is_server_task(name: &str) -> bool {
    name == "start"
}

/// The current lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Accepted but not yet attached to an OS process.
    Pending,
    /// Process spawned and being supervised.
    Running,
    /// Natural exit with code 0.
    Success,
    /// Natural exit with a nonzero code or by signal.
    Error,
    /// Explicitly aborted; the process tree was signaled.
    Aborted,
}

impl TaskStatus {
    /// Returns true once the status can never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Aborted)
    }
}

/// A single classified chunk of task output.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Decoded text of the chunk.
    pub text: String,
    /// Whether the chunk signals an error.
    pub is_error: bool,
    /// When the chunk was observed.
    pub timestamp: DateTime<Utc>,
}

/// A fixed-capacity ring buffer of `LogEntry`s.
#[derive(Debug, Clone)]
pub struct TaskLog {
    max_entries: usize,
    entries: VecDeque<LogEntry>,
}

impl TaskLog {
    /// Creates a new `TaskLog` with the specified maximum capacity.
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            entries: VecDeque::with_capacity(max_entries.min(1024)),
        }
    }

    /// Appends an entry.
    ///
    /// Returns `true` if an old entry was dropped to make room.
    pub fn push(&mut self, entry: LogEntry) -> bool {
        let mut dropped = false;
        self.entries.push_back(entry);
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
            dropped = true;
        }
        dropped
    }

    /// Returns the number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over the retained entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Returns the most recently appended entry.
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }
}

/// One run of a named project script, tracked to a terminal status.
///
/// The supervisor owns the record while the process is alive; once terminal
/// it is read-only data. `pid` names the interpreter the task was spawned
/// through, which is the id to hand to tree-based termination.
#[derive(Debug)]
pub struct Task {
    pub key: TaskKey,
    pub status: TaskStatus,
    /// Present exactly when the status has moved past `Pending`.
    pub pid: Option<u32>,
    /// Port bound into the environment, for server tasks.
    pub port: Option<u16>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub log: TaskLog,
}

impl Task {
    /// Creates a new `Pending` record for `key`.
    pub fn new(key: TaskKey, max_log_entries: usize) -> Self {
        Self {
            key,
            status: TaskStatus::Pending,
            pid: None,
            port: None,
            started_at: None,
            completed_at: None,
            log: TaskLog::new(max_log_entries),
        }
    }

    /// Attaches the spawned process and moves the task to `Running`.
    pub fn attach_process(&mut self, pid: u32) {
        if self.status != TaskStatus::Pending {
            return;
        }
        self.pid = Some(pid);
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Records a natural exit. Terminal states are entered once, from
    /// `Running` only.
    pub fn complete(&mut self, timestamp: DateTime<Utc>, success: bool) {
        if self.status != TaskStatus::Running {
            return;
        }
        self.status = if success {
            TaskStatus::Success
        } else {
            TaskStatus::Error
        };
        self.completed_at = Some(timestamp);
    }

    /// Records a user-initiated abort. Terminal states are entered once,
    /// from `Running` only.
    pub fn abort(&mut self, timestamp: DateTime<Utc>) {
        if self.status != TaskStatus::Running {
            return;
        }
        self.status = TaskStatus::Aborted;
        self.completed_at = Some(timestamp);
    }
}
