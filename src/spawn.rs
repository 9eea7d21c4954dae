//! Task command construction and shell-mode spawning.
//!
//! Commands are resolved from the runner program plus the script name, with
//! per-`(project kind, task name)` argument augmentation applied from a
//! policy table, then launched through the platform shell.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use crate::task::{Project, ProjectType};

/// Extra arguments forced onto specific `(project kind, task name)` pairs.
///
/// create-react-app runs its `test` script in an interactive watch mode that
/// never exits; `-- --coverage` turns it into a single pass. New rows are
/// additive, the spawn path never changes.
const ARG_AUGMENTATIONS: &[(ProjectType, &str, &[&str])] =
    &[(ProjectType::CreateReactApp, "test", &["--", "--coverage"])];

/// A fully resolved command for one task run.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskCommand {
    /// Joined shell line, e.g. `npm run build`.
    pub line: String,
    /// Directory the process is spawned in.
    pub cwd: PathBuf,
    /// Port bound into the child environment, for server tasks.
    pub port: Option<u16>,
}

impl TaskCommand {
    /// Builds the shell line for running `name` in `project`.
    pub fn resolve(runner: &str, project: &Project, name: &str, port: Option<u16>) -> Self {
        let mut parts = vec![runner.to_string(), "run".to_string(), name.to_string()];
        if let Some((_, _, extra)) = ARG_AUGMENTATIONS
            .iter()
            .find(|(kind, task, _)| *kind == project.kind && *task == name)
        {
            parts.extend(extra.iter().map(|arg| arg.to_string()));
        }
        Self {
            line: shell_words::join(&parts),
            cwd: project.path.clone(),
            port,
        }
    }
}

/// Handle to a spawned task process.
///
/// The command runs through an interpreter, so `pid` names the shell and the
/// script's own process is a descendant. Callers that need to stop the task
/// hand `pid` to tree-based termination and never signal it directly.
pub struct ProcessHandle {
    pub pid: u32,
    pub child: Child,
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

/// Spawns the command through the platform shell with piped output streams.
///
/// Shell mode keeps environment injection uniform across host platforms.
pub fn spawn(command: &TaskCommand) -> io::Result<ProcessHandle> {
    let mut cmd = shell_command(&command.line);
    cmd.current_dir(&command.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd.kill_on_drop(true);
    if let Some(port) = command.port {
        cmd.env("PORT", port.to_string());
    }

    let mut child = cmd.spawn()?;
    let pid = child
        .id()
        .ok_or_else(|| io::Error::other("spawned process exited before its pid was read"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("spawned process has no stdout pipe"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("spawned process has no stderr pipe"))?;

    Ok(ProcessHandle {
        pid,
        child,
        stdout,
        stderr,
    })
}

#[cfg(unix)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(line);
    cmd
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(line);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn project(kind: ProjectType) -> Project {
        Project {
            id: "p1".into(),
            kind,
            path: Path::new("/root/p1").to_path_buf(),
        }
    }

    #[test]
    fn resolves_plain_run_command() {
        let command = TaskCommand::resolve("npm", &project(ProjectType::CreateReactApp), "build", None);
        assert_eq!(command.line, "npm run build");
        assert_eq!(command.cwd, Path::new("/root/p1"));
        assert_eq!(command.port, None);
    }

    #[test]
    fn augments_create_react_app_test_once() {
        let command = TaskCommand::resolve("npm", &project(ProjectType::CreateReactApp), "test", None);
        assert_eq!(command.line, "npm run test -- --coverage");
        assert_eq!(command.line.matches("--coverage").count(), 1);
    }

    #[test]
    fn other_combinations_are_not_augmented() {
        let cra_start = TaskCommand::resolve("npm", &project(ProjectType::CreateReactApp), "start", None);
        assert_eq!(cra_start.line, "npm run start");
        let gatsby_test = TaskCommand::resolve("npm", &project(ProjectType::Gatsby), "test", None);
        assert_eq!(gatsby_test.line, "npm run test");
        let other_test =
            TaskCommand::resolve("npm", &project(ProjectType::Other("next".into())), "test", None);
        assert_eq!(other_test.line, "npm run test");
    }

    #[test]
    fn quotes_task_names_with_shell_characters() {
        let command =
            TaskCommand::resolve("npm", &project(ProjectType::CreateReactApp), "build all", None);
        assert_eq!(command.line, "npm run 'build all'");
    }

    #[test]
    fn carries_resolved_port() {
        let command =
            TaskCommand::resolve("yarn", &project(ProjectType::CreateReactApp), "start", Some(3003));
        assert_eq!(command.line, "yarn run start");
        assert_eq!(command.port, Some(3003));
    }
}
