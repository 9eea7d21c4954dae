//! Task supervision: run intents, lifecycle transitions, abort.
//!
//! `TaskSupervisor` owns the authoritative task records while their
//! processes are alive. It resolves a port for server tasks, spawns through
//! the shell, fans stream chunks and exit notices into classified log
//! events, and tears whole process trees down on abort.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::events::{ExecEvent, TaskEvent};
use crate::kill;
use crate::output::{classify, colorize, AnsiColor, StreamKind};
use crate::ports::{self, NoPortAvailable};
use crate::spawn::{self, ProcessHandle, TaskCommand};
use crate::task::{is_server_task, LogEntry, Project, Task, TaskKey, TaskStatus};

/// Synthetic entry appended when a server task is aborted.
pub const SERVER_STOPPED_MESSAGE: &str = "Server stopped";
/// Synthetic entry appended when any other task is aborted.
pub const TASK_ABORTED_MESSAGE: &str = "Task aborted";
/// Synthetic entry appended when a task exits on its own.
pub const TASK_COMPLETED_MESSAGE: &str = "Task completed";

/// Errors surfaced synchronously to the issuer of an intent.
///
/// Runtime failures are not in here: a nonzero exit is the normal `Error`
/// terminal state, reported through the completion event.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("unknown project: {0}")]
    UnknownProject(String),
    #[error("task {0} is already running")]
    TaskAlreadyRunning(TaskKey),
    #[error("no such task: {0}")]
    TaskNotFound(TaskKey),
    #[error("task {0} is not running")]
    TaskNotRunning(TaskKey),
    #[error(transparent)]
    NoPortAvailable(#[from] NoPortAvailable),
    #[error("failed to spawn {key}")]
    SpawnFailure {
        key: TaskKey,
        #[source]
        source: std::io::Error,
    },
}

/// Construction-time settings for the supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Program used to run project scripts (`npm run <name>` style).
    pub runner: String,
    /// First port probed for server tasks.
    pub base_port: u16,
    /// Consecutive ports probed before a scan gives up.
    pub max_port_attempts: u32,
    /// Retained log entries per task.
    pub max_log_entries: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            runner: "npm".to_string(),
            base_port: ports::DEFAULT_BASE_PORT,
            max_port_attempts: ports::DEFAULT_MAX_ATTEMPTS,
            max_log_entries: 10_000,
        }
    }
}

/// Read-only project lookup handed to the supervisor at construction.
#[derive(Debug, Clone, Default)]
pub struct ProjectRegistry {
    projects: HashMap<String, Project>,
}

impl ProjectRegistry {
    pub fn new(projects: impl IntoIterator<Item = Project>) -> Self {
        Self {
            projects: projects
                .into_iter()
                .map(|project| (project.id.clone(), project))
                .collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.get(id)
    }
}

/// A task record plus the run discriminator its process events carry.
///
/// The discriminator keeps a superseding run from being corrupted by
/// stragglers of the previous process: an aborted run's exit notice can
/// still be in flight when a new run reuses the same key.
struct Supervised {
    task: Task,
    seq: u64,
}

/// Orchestrates task runs: spawn, monitor, abort, complete.
///
/// Drive it by awaiting [`TaskSupervisor::handle_next`] in a loop from a
/// single control task; classified output and lifecycle events come out on
/// the event channel passed at construction.
pub struct TaskSupervisor {
    config: SupervisorConfig,
    registry: ProjectRegistry,
    tasks: HashMap<TaskKey, Supervised>,
    next_seq: u64,
    event_tx: mpsc::Sender<TaskEvent>,
    exec_tx: mpsc::Sender<ExecEvent>,
    exec_rx: mpsc::Receiver<ExecEvent>,
}

impl TaskSupervisor {
    /// Creates a supervisor that emits lifecycle events on `event_tx`.
    pub fn new(
        config: SupervisorConfig,
        registry: ProjectRegistry,
        event_tx: mpsc::Sender<TaskEvent>,
    ) -> Self {
        let (exec_tx, exec_rx) = mpsc::channel(256);
        Self {
            config,
            registry,
            tasks: HashMap::new(),
            next_seq: 0,
            event_tx,
            exec_tx,
            exec_rx,
        }
    }

    /// Accepts a run intent for `(project_id, name)`.
    ///
    /// A second intent for a key whose record is still live is a caller
    /// error; a terminal record is superseded by the new run. Server tasks
    /// get a free port resolved before the spawn and bound into the child
    /// environment as `PORT`. On `NoPortAvailable` or `SpawnFailure` the
    /// record never leaves `Pending` and is removed again, so the intent can
    /// be retried.
    pub async fn run_task(&mut self, project_id: &str, name: &str) -> Result<TaskKey, TaskError> {
        let key = TaskKey::new(project_id, name);
        if self
            .tasks
            .get(&key)
            .is_some_and(|s| !s.task.status.is_terminal())
        {
            return Err(TaskError::TaskAlreadyRunning(key));
        }
        let project = self
            .registry
            .get(project_id)
            .ok_or_else(|| TaskError::UnknownProject(project_id.to_string()))?
            .clone();

        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.insert(
            key.clone(),
            Supervised {
                task: Task::new(key.clone(), self.config.max_log_entries),
                seq,
            },
        );

        let port = if is_server_task(name) {
            match ports::find_available_port(self.config.base_port, self.config.max_port_attempts)
                .await
            {
                Ok(port) => Some(port),
                Err(err) => {
                    self.tasks.remove(&key);
                    return Err(err.into());
                }
            }
        } else {
            None
        };

        let command = TaskCommand::resolve(&self.config.runner, &project, name, port);
        debug!(task = %key, command = %command.line, cwd = %command.cwd.display(), "spawning task");
        let handle = match spawn::spawn(&command) {
            Ok(handle) => handle,
            Err(source) => {
                self.tasks.remove(&key);
                return Err(TaskError::SpawnFailure { key, source });
            }
        };

        let ProcessHandle {
            pid,
            mut child,
            stdout,
            stderr,
        } = handle;
        if let Some(supervised) = self.tasks.get_mut(&key) {
            supervised.task.port = port;
            supervised.task.attach_process(pid);
        }
        self.send_event(TaskEvent::ProcessAttached {
            key: key.clone(),
            pid,
        })
        .await;

        spawn_stream_reader(key.clone(), seq, StreamKind::Stdout, stdout, self.exec_tx.clone());
        spawn_stream_reader(key.clone(), seq, StreamKind::Stderr, stderr, self.exec_tx.clone());

        let exec_tx = self.exec_tx.clone();
        let exit_key = key.clone();
        tokio::spawn(async move {
            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(err) => {
                    warn!(task = %exit_key, %err, "failed to wait on task process");
                    None
                }
            };
            let _ = exec_tx
                .send(ExecEvent::Exited {
                    key: exit_key,
                    seq,
                    code,
                })
                .await;
        });

        Ok(key)
    }

    /// Aborts a running task: signals its whole process tree, appends the
    /// synthetic status entry, and flips the record to `Aborted`.
    ///
    /// Termination is fire-and-forget; the call returns once the signals
    /// are dispatched. An enumeration failure is logged and the abort still
    /// completes with whatever was signaled.
    pub async fn abort_task(&mut self, key: &TaskKey) -> Result<(), TaskError> {
        let Some(supervised) = self.tasks.get_mut(key) else {
            return Err(TaskError::TaskNotFound(key.clone()));
        };
        if supervised.task.status != TaskStatus::Running {
            return Err(TaskError::TaskNotRunning(key.clone()));
        }

        if let Some(pid) = supervised.task.pid {
            if let Err(err) = kill::terminate_tree(pid) {
                warn!(task = %key, %err, "process tree enumeration failed");
            }
        }

        let message = if is_server_task(&key.name) {
            SERVER_STOPPED_MESSAGE
        } else {
            TASK_ABORTED_MESSAGE
        };
        let timestamp = Utc::now();
        supervised.task.log.push(LogEntry {
            text: message.to_string(),
            is_error: false,
            timestamp,
        });
        supervised.task.abort(timestamp);

        self.send_event(TaskEvent::OutputReceived {
            key: key.clone(),
            text: colorize(message, AnsiColor::Red),
            is_error: false,
        })
        .await;
        Ok(())
    }

    /// Waits for the next raw process notification and applies it.
    pub async fn handle_next(&mut self) {
        if let Some(event) = self.exec_rx.recv().await {
            self.apply_exec_event(event).await;
        }
    }

    /// Returns the record for `key`, if one exists.
    pub fn task(&self, key: &TaskKey) -> Option<&Task> {
        self.tasks.get(key).map(|s| &s.task)
    }

    /// Drops every record belonging to `project_id`, signaling the process
    /// trees of any still running.
    pub fn remove_project_tasks(&mut self, project_id: &str) {
        self.tasks.retain(|key, supervised| {
            if key.project_id != project_id {
                return true;
            }
            if supervised.task.status == TaskStatus::Running {
                if let Some(pid) = supervised.task.pid {
                    if let Err(err) = kill::terminate_tree(pid) {
                        warn!(task = %key, %err, "process tree enumeration failed");
                    }
                }
            }
            false
        });
    }

    async fn apply_exec_event(&mut self, event: ExecEvent) {
        match event {
            ExecEvent::Output {
                key,
                seq,
                chunk,
                stream,
            } => {
                let Some(supervised) = self.tasks.get_mut(&key) else {
                    debug!(task = %key, "output for unknown task dropped");
                    return;
                };
                if supervised.seq != seq || supervised.task.status != TaskStatus::Running {
                    // Streams can flush after the exit notice or after an
                    // abort; terminal records are frozen.
                    debug!(task = %key, "late output chunk dropped");
                    return;
                }
                let (text, is_error) = classify(&chunk, stream);
                supervised.task.log.push(LogEntry {
                    text: text.clone(),
                    is_error,
                    timestamp: Utc::now(),
                });
                self.send_event(TaskEvent::OutputReceived {
                    key,
                    text,
                    is_error,
                })
                .await;
            }
            ExecEvent::Exited { key, seq, code } => {
                let Some(supervised) = self.tasks.get_mut(&key) else {
                    return;
                };
                if supervised.seq != seq || supervised.task.status != TaskStatus::Running {
                    // The abort won the race; the record is already terminal.
                    return;
                }
                let timestamp = Utc::now();
                let success = code == Some(0);
                supervised.task.log.push(LogEntry {
                    text: TASK_COMPLETED_MESSAGE.to_string(),
                    is_error: false,
                    timestamp,
                });
                supervised.task.complete(timestamp, success);
                self.send_event(TaskEvent::OutputReceived {
                    key: key.clone(),
                    text: colorize(TASK_COMPLETED_MESSAGE, AnsiColor::Green),
                    is_error: false,
                })
                .await;
                self.send_event(TaskEvent::Completed {
                    key,
                    timestamp,
                    success,
                })
                .await;
            }
        }
    }

    async fn send_event(&self, event: TaskEvent) {
        let _ = self.event_tx.send(event).await;
    }
}

fn spawn_stream_reader<R>(
    key: TaskKey,
    seq: u64,
    stream: StreamKind,
    mut reader: R,
    tx: mpsc::Sender<ExecEvent>,
) where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    let event = ExecEvent::Output {
                        key: key.clone(),
                        seq,
                        chunk: buf[..n].to_vec(),
                        stream,
                    };
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    debug!(task = %key, %err, "stream read failed");
                    break;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::ProjectType;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    fn registry(dir: &Path) -> ProjectRegistry {
        ProjectRegistry::new([Project {
            id: "p1".to_string(),
            kind: ProjectType::CreateReactApp,
            path: dir.to_path_buf(),
        }])
    }

    fn supervisor(
        runner: &str,
        dir: &Path,
    ) -> (TaskSupervisor, mpsc::Receiver<TaskEvent>) {
        let (tx, rx) = mpsc::channel(64);
        let config = SupervisorConfig {
            runner: runner.to_string(),
            ..SupervisorConfig::default()
        };
        (TaskSupervisor::new(config, registry(dir), tx), rx)
    }

    #[cfg(unix)]
    fn write_runner_script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("runner.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    async fn drive_until_completed(
        sup: &mut TaskSupervisor,
        rx: &mut mpsc::Receiver<TaskEvent>,
    ) -> Vec<TaskEvent> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        let mut events = Vec::new();
        loop {
            tokio::select! {
                _ = sup.handle_next() => {}
                maybe = rx.recv() => {
                    let event = maybe.expect("event channel closed");
                    let done = matches!(event, TaskEvent::Completed { .. });
                    events.push(event);
                    if done {
                        return events;
                    }
                }
                _ = tokio::time::sleep_until(deadline) => panic!("task did not complete in time"),
            }
        }
    }

    async fn wait_for_attached(
        sup: &mut TaskSupervisor,
        rx: &mut mpsc::Receiver<TaskEvent>,
    ) -> u32 {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            tokio::select! {
                _ = sup.handle_next() => {}
                maybe = rx.recv() => {
                    if let Some(TaskEvent::ProcessAttached { pid, .. }) = maybe {
                        return pid;
                    }
                }
                _ = tokio::time::sleep_until(deadline) => panic!("process never attached"),
            }
        }
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn one_shot_task_completes_successfully() {
        let dir = tempfile::tempdir().unwrap();
        let (mut sup, mut rx) = supervisor("echo", dir.path());

        let key = sup.run_task("p1", "build").await.unwrap();
        let events = drive_until_completed(&mut sup, &mut rx).await;

        assert!(matches!(events.first(), Some(TaskEvent::ProcessAttached { .. })));
        assert!(events.iter().any(|event| matches!(
            event,
            TaskEvent::OutputReceived { text, is_error: false, .. } if text.contains("run build")
        )));
        assert!(matches!(
            events.last(),
            Some(TaskEvent::Completed { success: true, .. })
        ));

        let task = sup.task(&key).unwrap();
        assert_eq!(task.status, TaskStatus::Success);
        assert!(task.pid.is_some());
        assert!(task.started_at.is_some());
        assert!(task.completed_at.is_some());
        assert_eq!(task.log.last().unwrap().text, TASK_COMPLETED_MESSAGE);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn nonzero_exit_is_an_error_completion() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_runner_script(dir.path(), "exit 3");
        let (mut sup, mut rx) = supervisor(script.to_str().unwrap(), dir.path());

        let key = sup.run_task("p1", "build").await.unwrap();
        let events = drive_until_completed(&mut sup, &mut rx).await;

        assert!(matches!(
            events.last(),
            Some(TaskEvent::Completed { success: false, .. })
        ));
        assert_eq!(sup.task(&key).unwrap().status, TaskStatus::Error);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn aborting_a_server_task_says_server_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_runner_script(dir.path(), "sleep 30");
        let (mut sup, mut rx) = supervisor(script.to_str().unwrap(), dir.path());

        let key = sup.run_task("p1", "start").await.unwrap();
        wait_for_attached(&mut sup, &mut rx).await;

        sup.abort_task(&key).await.unwrap();
        let task = sup.task(&key).unwrap();
        assert_eq!(task.status, TaskStatus::Aborted);
        assert_eq!(task.log.last().unwrap().text, SERVER_STOPPED_MESSAGE);
        let completed_at = task.completed_at.unwrap();

        // A second abort is a caller error.
        assert!(matches!(
            sup.abort_task(&key).await,
            Err(TaskError::TaskNotRunning(_))
        ));

        // The killed process's exit notice must not disturb the terminal
        // record.
        let _ = tokio::time::timeout(Duration::from_secs(5), sup.handle_next()).await;
        let task = sup.task(&key).unwrap();
        assert_eq!(task.status, TaskStatus::Aborted);
        assert_eq!(task.completed_at, Some(completed_at));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn aborting_a_one_shot_task_says_task_aborted() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_runner_script(dir.path(), "sleep 30");
        let (mut sup, mut rx) = supervisor(script.to_str().unwrap(), dir.path());

        let key = sup.run_task("p1", "lint").await.unwrap();
        wait_for_attached(&mut sup, &mut rx).await;

        sup.abort_task(&key).await.unwrap();
        let task = sup.task(&key).unwrap();
        assert_eq!(task.status, TaskStatus::Aborted);
        assert_eq!(task.log.last().unwrap().text, TASK_ABORTED_MESSAGE);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn server_task_receives_an_allocated_port() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_runner_script(dir.path(), "echo \"PORT=${PORT:-unset}\"");
        let (mut sup, mut rx) = supervisor(script.to_str().unwrap(), dir.path());

        let key = sup.run_task("p1", "start").await.unwrap();
        let events = drive_until_completed(&mut sup, &mut rx).await;

        let task_port = sup.task(&key).unwrap().port.expect("no port recorded");
        assert!(task_port >= ports::DEFAULT_BASE_PORT);
        assert!(events.iter().any(|event| matches!(
            event,
            TaskEvent::OutputReceived { text, .. } if text.contains(&format!("PORT={task_port}"))
        )));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn occupied_ports_are_skipped_before_spawn() {
        // Hold three consecutive ports so the scan has to walk past them.
        let (base, _held) = occupy_consecutive(3);
        let dir = tempfile::tempdir().unwrap();
        let script = write_runner_script(dir.path(), "echo \"PORT=$PORT\"");
        let (tx, mut rx) = mpsc::channel(64);
        let config = SupervisorConfig {
            runner: script.to_str().unwrap().to_string(),
            base_port: base,
            max_port_attempts: 10,
            ..SupervisorConfig::default()
        };
        let mut sup = TaskSupervisor::new(config, registry(dir.path()), tx);

        let key = sup.run_task("p1", "start").await.unwrap();
        drive_until_completed(&mut sup, &mut rx).await;
        let port = sup.task(&key).unwrap().port.unwrap();
        assert!(port >= base + 3);
    }

    fn occupy_consecutive(count: u16) -> (u16, Vec<std::net::TcpListener>) {
        for base in (49152..64000).step_by(17) {
            let mut held = Vec::new();
            for offset in 0..count {
                match std::net::TcpListener::bind(("127.0.0.1", base + offset)) {
                    Ok(listener) => held.push(listener),
                    Err(_) => break,
                }
            }
            if held.len() == count as usize {
                return (base, held);
            }
        }
        panic!("no run of consecutive free ports found");
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn duplicate_run_intent_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_runner_script(dir.path(), "sleep 30");
        let (mut sup, mut rx) = supervisor(script.to_str().unwrap(), dir.path());

        let key = sup.run_task("p1", "start").await.unwrap();
        wait_for_attached(&mut sup, &mut rx).await;

        assert!(matches!(
            sup.run_task("p1", "start").await,
            Err(TaskError::TaskAlreadyRunning(_))
        ));
        // A different task name on the same project is independent.
        let other = sup.run_task("p1", "lint").await.unwrap();
        assert_ne!(key, other);

        sup.abort_task(&key).await.unwrap();
        sup.abort_task(&other).await.unwrap();
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn terminal_record_is_superseded_by_a_new_run() {
        let dir = tempfile::tempdir().unwrap();
        let (mut sup, mut rx) = supervisor("echo", dir.path());

        sup.run_task("p1", "build").await.unwrap();
        drive_until_completed(&mut sup, &mut rx).await;
        let key = sup.run_task("p1", "build").await.unwrap();
        drive_until_completed(&mut sup, &mut rx).await;
        assert_eq!(sup.task(&key).unwrap().status, TaskStatus::Success);
    }

    #[tokio::test]
    async fn unknown_project_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (mut sup, _rx) = supervisor("echo", dir.path());
        assert!(matches!(
            sup.run_task("nope", "build").await,
            Err(TaskError::UnknownProject(_))
        ));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn spawn_failure_leaves_no_record() {
        let dir = tempfile::tempdir().unwrap();
        // A working directory that does not exist makes the spawn itself
        // fail, not the script.
        let registry = ProjectRegistry::new([Project {
            id: "p1".to_string(),
            kind: ProjectType::CreateReactApp,
            path: dir.path().join("missing"),
        }]);
        let (tx, _rx) = mpsc::channel(64);
        let mut sup = TaskSupervisor::new(SupervisorConfig::default(), registry, tx);

        let err = sup.run_task("p1", "build").await.unwrap_err();
        assert!(matches!(err, TaskError::SpawnFailure { .. }));
        assert!(sup.task(&TaskKey::new("p1", "build")).is_none());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn late_chunks_after_terminal_status_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let (mut sup, mut rx) = supervisor("echo", dir.path());

        let key = sup.run_task("p1", "build").await.unwrap();
        drive_until_completed(&mut sup, &mut rx).await;
        let seq = sup.tasks.get(&key).unwrap().seq;
        let len_before = sup.task(&key).unwrap().log.len();

        sup.apply_exec_event(ExecEvent::Output {
            key: key.clone(),
            seq,
            chunk: b"straggler".to_vec(),
            stream: StreamKind::Stdout,
        })
        .await;

        assert_eq!(sup.task(&key).unwrap().log.len(), len_before);
        assert_eq!(sup.task(&key).unwrap().status, TaskStatus::Success);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn stderr_output_is_classified_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_runner_script(dir.path(), "echo boom >&2");
        let (mut sup, mut rx) = supervisor(script.to_str().unwrap(), dir.path());

        let key = sup.run_task("p1", "build").await.unwrap();
        let events = drive_until_completed(&mut sup, &mut rx).await;

        assert!(events.iter().any(|event| matches!(
            event,
            TaskEvent::OutputReceived { text, is_error: true, .. } if text.contains("boom")
        )));
        let task = sup.task(&key).unwrap();
        assert!(task.log.iter().any(|entry| entry.is_error));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn removing_a_project_drops_its_records() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_runner_script(dir.path(), "sleep 30");
        let (mut sup, mut rx) = supervisor(script.to_str().unwrap(), dir.path());

        let key = sup.run_task("p1", "start").await.unwrap();
        wait_for_attached(&mut sup, &mut rx).await;

        sup.remove_project_tasks("p1");
        assert!(sup.task(&key).is_none());
    }
}
