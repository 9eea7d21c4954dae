//! Event definitions for the supervision loop.
//!
//! Two layers of events exist: `TaskEvent`s are the supervisor's outbound
//! interface, consumed by the state store or UI driving it; `ExecEvent`s are
//! the raw per-process notifications the spawned stream readers and exit
//! waiter feed back into the supervisor.

use chrono::{DateTime, Utc};

use crate::output::StreamKind;
use crate::task::TaskKey;

/// A lifecycle event emitted by the supervisor.
#[derive(Debug, Clone)]
pub enum TaskEvent {
    /// The OS process handle became available. `pid` is the id an abort
    /// will target for tree-based termination.
    ProcessAttached { key: TaskKey, pid: u32 },
    /// A classified chunk of output was appended to the task log.
    OutputReceived {
        key: TaskKey,
        text: String,
        is_error: bool,
    },
    /// The task exited naturally and reached `Success` or `Error`.
    Completed {
        key: TaskKey,
        timestamp: DateTime<Utc>,
        success: bool,
    },
}

/// A raw notification from a supervised process.
///
/// stdout chunks, stderr chunks, and the exit notice arrive as three
/// independent event sources; no ordering holds between them. In
/// particular the exit notice can be observed before the streams' final
/// buffered chunks.
/// `seq` discriminates runs: a superseding run reuses the key, and events
/// from the previous process must not reach the new record.
#[derive(Debug)]
pub(crate) enum ExecEvent {
    /// A chunk was read from one of the process's output streams.
    Output {
        key: TaskKey,
        seq: u64,
        chunk: Vec<u8>,
        stream: StreamKind,
    },
    /// The process exited; `None` means it was terminated by a signal.
    Exited {
        key: TaskKey,
        seq: u64,
        code: Option<i32>,
    },
}
