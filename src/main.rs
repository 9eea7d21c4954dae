//! Devrack: run and supervise the tasks of local development projects.
//!
//! This is the entry point of the application. It parses command-line
//! arguments, loads configuration, builds the project registry, and drives
//! the requested task through the supervisor while printing its event
//! stream. Ctrl-C aborts the task together with its whole process tree.

mod config;
mod events;
mod kill;
mod output;
mod ports;
mod spawn;
mod supervisor;
mod task;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::events::TaskEvent;
use crate::supervisor::{ProjectRegistry, SupervisorConfig, TaskSupervisor};
use crate::task::Project;

/// Command-line interface definition.
#[derive(Debug, Parser)]
#[command(
    name = "devrack",
    version,
    about = "Run and supervise local dev project tasks"
)]
struct Cli {
    /// Path to devrack.toml configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Ignore any devrack.toml in the current directory.
    #[arg(long)]
    no_config: bool,
    /// Directory holding one subdirectory per project.
    #[arg(long)]
    projects_root: Option<PathBuf>,
    /// Program used to run project scripts.
    #[arg(long)]
    runner: Option<String>,
    /// First port probed for server tasks.
    #[arg(long)]
    base_port: Option<u16>,
    /// Ports probed before a scan gives up.
    #[arg(long)]
    max_port_attempts: Option<u32>,
    /// Max log entries retained per task.
    #[arg(long)]
    max_log_entries: Option<usize>,
    /// Project to run the task in.
    project: String,
    /// Task name (`start` launches a dev server on a free port).
    task: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file_config = load_file_config(&cli)?;
    let settings = Settings::from_cli(&cli, file_config);

    let (event_tx, mut event_rx) = mpsc::channel(256);
    let mut supervisor =
        TaskSupervisor::new(settings.supervisor_config(), settings.registry(), event_tx);

    let key = supervisor
        .run_task(&cli.project, &cli.task)
        .await
        .with_context(|| format!("failed to run {} for {}", cli.task, cli.project))?;
    if let Some(port) = supervisor.task(&key).and_then(|task| task.port) {
        tracing::info!(task = %key, port, "dev server port allocated");
    }

    let mut success = false;
    let mut aborted = false;
    loop {
        tokio::select! {
            _ = supervisor.handle_next() => {}
            maybe = event_rx.recv() => {
                let Some(event) = maybe else { break };
                let done = matches!(event, TaskEvent::Completed { .. });
                if let TaskEvent::Completed { success: ok, .. } = &event {
                    success = *ok;
                }
                print_event(&event);
                if done {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                // The task may have finished in the same instant; an abort
                // that finds it no longer running is not fatal.
                if let Err(err) = supervisor.abort_task(&key).await {
                    tracing::warn!(task = %key, %err, "abort failed");
                }
                // The synthetic abort entry is already queued; drain it
                // before leaving.
                while let Ok(event) = event_rx.try_recv() {
                    print_event(&event);
                }
                aborted = true;
                break;
            }
        }
    }

    if let Some(task) = supervisor.task(&key) {
        if let (Some(started), Some(completed)) = (task.started_at, task.completed_at) {
            let elapsed = completed - started;
            tracing::info!(task = %task.key, elapsed_ms = elapsed.num_milliseconds(), "run finished");
        }
    }

    if aborted {
        bail!("{key} aborted");
    }
    if !success {
        bail!("{key} exited with failure");
    }
    Ok(())
}

fn print_event(event: &TaskEvent) {
    match event {
        TaskEvent::ProcessAttached { key, pid } => {
            tracing::info!(task = %key, pid, "process attached");
        }
        TaskEvent::OutputReceived { text, is_error, .. } => {
            if *is_error {
                write_chunk(std::io::stderr().lock(), text);
            } else {
                write_chunk(std::io::stdout().lock(), text);
            }
        }
        TaskEvent::Completed {
            key,
            timestamp,
            success,
        } => {
            tracing::info!(task = %key, %timestamp, success, "task completed");
        }
    }
}

// Task chunks carry their own newlines; synthetic status messages do not.
fn write_chunk<W: Write>(mut writer: W, text: &str) {
    let _ = write!(writer, "{text}");
    if !text.ends_with('\n') {
        let _ = writeln!(writer);
    }
    let _ = writer.flush();
}

fn load_file_config(cli: &Cli) -> Result<Config> {
    if cli.no_config {
        return Ok(Config::default());
    }
    let path = cli.config.clone().or_else(default_config_path);
    match path {
        Some(path) => config::load_config(&path),
        None => Ok(Config::default()),
    }
}

fn default_config_path() -> Option<PathBuf> {
    let path = Path::new("devrack.toml");
    if path.exists() {
        Some(path.to_path_buf())
    } else {
        None
    }
}

/// Runtime configuration derived from CLI arguments and the config file.
#[derive(Debug, Clone)]
struct Settings {
    projects_root: PathBuf,
    runner: String,
    base_port: u16,
    max_port_attempts: u32,
    max_log_entries: usize,
    projects: Vec<config::ProjectConfig>,
}

impl Settings {
    fn from_cli(cli: &Cli, config: Config) -> Self {
        let defaults = SupervisorConfig::default();
        let projects_root = cli
            .projects_root
            .clone()
            .or(config.projects_root)
            .unwrap_or_else(|| PathBuf::from("."));
        let runner = cli
            .runner
            .clone()
            .or(config.runner)
            .unwrap_or(defaults.runner);
        let base_port = cli
            .base_port
            .or(config.base_port)
            .unwrap_or(defaults.base_port);
        let max_port_attempts = cli
            .max_port_attempts
            .or(config.max_port_attempts)
            .unwrap_or(defaults.max_port_attempts);
        let max_log_entries = cli
            .max_log_entries
            .or(config.max_log_entries)
            .unwrap_or(defaults.max_log_entries);
        Self {
            projects_root,
            runner,
            base_port,
            max_port_attempts,
            max_log_entries,
            projects: config.projects,
        }
    }

    fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            runner: self.runner.clone(),
            base_port: self.base_port,
            max_port_attempts: self.max_port_attempts,
            max_log_entries: self.max_log_entries,
        }
    }

    fn registry(&self) -> ProjectRegistry {
        ProjectRegistry::new(self.projects.iter().map(|project| Project {
            id: project.id.clone(),
            kind: project.kind.clone(),
            path: project
                .path
                .clone()
                .unwrap_or_else(|| self.projects_root.join(&project.id)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::ProjectType;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn flags_override_config_values() {
        let config: Config = toml::from_str(
            r#"
runner = "yarn"
base_port = 4000

[[project]]
id = "p1"
type = "create-react-app"
"#,
        )
        .unwrap();
        let cli = parse(&["devrack", "--runner", "pnpm", "p1", "build"]);
        let settings = Settings::from_cli(&cli, config);
        assert_eq!(settings.runner, "pnpm");
        assert_eq!(settings.base_port, 4000);

        let registry = settings.registry();
        let project = registry.get("p1").unwrap();
        assert_eq!(project.kind, ProjectType::CreateReactApp);
        assert_eq!(project.path, settings.projects_root.join("p1"));
    }

    #[test]
    fn explicit_project_path_wins_over_root() {
        let config: Config = toml::from_str(
            r#"
projects_root = "/srv/projects"

[[project]]
id = "blog"
type = "gatsby"
path = "/srv/elsewhere/blog"
"#,
        )
        .unwrap();
        let cli = parse(&["devrack", "blog", "develop"]);
        let settings = Settings::from_cli(&cli, config);
        let registry = settings.registry();
        assert_eq!(
            registry.get("blog").unwrap().path,
            Path::new("/srv/elsewhere/blog")
        );
    }

    #[test]
    fn defaults_apply_without_config() {
        let cli = parse(&["devrack", "p1", "build"]);
        let settings = Settings::from_cli(&cli, Config::default());
        assert_eq!(settings.runner, "npm");
        assert_eq!(settings.base_port, crate::ports::DEFAULT_BASE_PORT);
        assert_eq!(settings.max_port_attempts, crate::ports::DEFAULT_MAX_ATTEMPTS);
    }
}
