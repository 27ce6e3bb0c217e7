// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use log::info;
use tokio::time::{Duration, sleep};

use crate::builder::{Builder, DEFAULT_TOOLCHAIN};
use crate::error::{Error, Result};
use crate::health::HealthReport;
use crate::host::LocalHost;
use crate::inventory::ProcessTable;
use crate::layout::Workspace;
use crate::orchestrator::{DEFAULT_LOG_LEVEL, LaunchOptions, Orchestrator, StopMode};
use crate::state::Operation;
use crate::topology::ClusterTopology;
use crate::waiter::WaitPolicy;

pub const USAGE: &str = "\
Usage:
    gwctl status - show server status
    gwctl build engine|<game-name> - build server engine / game
    gwctl start <game-name> - start game server
    gwctl stop - stop game server
    gwctl kill - kill game server processes
    gwctl freeze - freeze game processes
    gwctl restore <game-name> - restore frozen game processes
    gwctl reload - freeze and restore the running game
    gwctl sleep <seconds> - pause between commands";

#[derive(Parser, Debug)]
#[command(name = "gwctl", version)]
#[command(about = "Supervisor for a goworld cluster of dispatcher, gates and games", long_about = None)]
pub struct Cli {
    /// Log level passed to gates and games; also sets this tool's verbosity
    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    pub log: String,

    /// Detach spawned processes from the terminal
    #[arg(long)]
    pub nohup: bool,

    /// Workspace root (defaults to the current directory)
    #[arg(long, env = "GOWORLD_ROOT")]
    pub root: Option<PathBuf>,

    /// Compiler invoked by `build`
    #[arg(long, env = "GOWORLD_GO", default_value = DEFAULT_TOOLCHAIN)]
    pub go: PathBuf,

    /// Give up waiting for processes to exit after this many seconds
    #[arg(long, value_name = "SECS")]
    pub wait_timeout: Option<u64>,

    /// Exit with failure when the post-operation status is BAD
    #[arg(long)]
    pub strict: bool,

    /// Commands to run in order, e.g. `freeze sleep 1 restore test_game`
    #[arg(value_name = "COMMAND")]
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Status,
    Start(String),
    Restore(String),
    Stop,
    Kill,
    Freeze,
    Reload,
    Build(Vec<String>),
    Sleep(Duration),
}

impl Command {
    /// Commands that need the engine binaries in place before running.
    fn needs_engine(&self) -> bool {
        !matches!(self, Command::Build(_) | Command::Sleep(_))
    }
}

/// Turn the positional words into an ordered command list.
pub fn parse_commands(words: &[String]) -> Result<Vec<Command>> {
    if words.is_empty() {
        return Err(Error::Usage("no command given".to_string()));
    }

    let mut commands = Vec::new();
    let mut words = words.iter();
    while let Some(word) = words.next() {
        let command = match word.to_ascii_lowercase().as_str() {
            "status" => Command::Status,
            "stop" => Command::Stop,
            "kill" => Command::Kill,
            "freeze" => Command::Freeze,
            "reload" => Command::Reload,
            "start" => Command::Start(operand(word, words.next())?),
            "restore" => Command::Restore(operand(word, words.next())?),
            "sleep" => {
                let secs = operand(word, words.next())?;
                let duration = secs
                    .parse::<f64>()
                    .ok()
                    .and_then(|s| Duration::try_from_secs_f64(s).ok())
                    .ok_or_else(|| Error::Usage(format!("invalid sleep duration: {secs}")))?;
                Command::Sleep(duration)
            }
            "build" => Command::Build(words.by_ref().cloned().collect()),
            _ => return Err(Error::Usage(format!("invalid command: {word}"))),
        };
        commands.push(command);
    }
    Ok(commands)
}

fn operand(command: &str, next: Option<&String>) -> Result<String> {
    next.cloned()
        .ok_or_else(|| Error::Usage(format!("{command} requires an argument")))
}

/// Supervisor verbosity for a child log level name.
pub fn verbosity(level: &str) -> Result<log::Level> {
    match level.to_ascii_lowercase().as_str() {
        "debug" => Ok(log::Level::Debug),
        "info" => Ok(log::Level::Info),
        "warn" | "warning" => Ok(log::Level::Warn),
        "error" | "panic" | "fatal" => Ok(log::Level::Error),
        _ => Err(Error::Usage(format!("invalid log level: {level}"))),
    }
}

/// Execute every command in order against the workspace, writing health
/// reports and the final confirmation line to `out`. Stops at the first
/// failure.
pub async fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let commands = parse_commands(&cli.commands)?;

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()
            .map_err(|e| Error::Environment(format!("reading current directory: {e}")))?,
    };
    let workspace = Workspace::open(root)?;
    let topology = ClusterTopology::load(&workspace.config_path())?;

    if cli.nohup {
        info!("Using nohup, output goes to {}", workspace.detached_output().display());
    }
    let launch = LaunchOptions {
        log_level: cli.log.clone(),
        detach: cli.nohup,
    };
    let wait = WaitPolicy {
        timeout: cli.wait_timeout.map(Duration::from_secs),
        ..WaitPolicy::default()
    };
    let host = LocalHost::new(ProcessTable::default(), workspace.detached_output());
    let mut orchestrator = Orchestrator::new(host, &topology, &workspace, launch, wait);
    let builder = Builder::new(&workspace, cli.go.clone());

    for command in &commands {
        if command.needs_engine() {
            workspace.verify_engine()?;
        }
        let outcome = match command {
            Command::Status => Some((Operation::Status, orchestrator.status())),
            Command::Start(game) => {
                let exe = workspace.resolve_built_game(game)?;
                Some((Operation::Start, orchestrator.start(&exe).await?))
            }
            Command::Restore(game) => {
                let exe = workspace.resolve_built_game(game)?;
                Some((Operation::Restore, orchestrator.restore(&exe).await?))
            }
            Command::Stop => Some((Operation::Stop, orchestrator.stop(StopMode::Graceful).await?)),
            Command::Kill => Some((Operation::Kill, orchestrator.stop(StopMode::Forced).await?)),
            Command::Freeze => Some((Operation::Freeze, orchestrator.freeze().await?)),
            Command::Reload => Some((Operation::Reload, orchestrator.reload().await?)),
            Command::Build(targets) => {
                builder.build_all(targets).await?;
                None
            }
            Command::Sleep(duration) => {
                info!("sleeping {duration:?} ...");
                sleep(*duration).await;
                None
            }
        };

        if let Some((op, report)) = outcome {
            write_report(out, &report)?;
            if cli.strict && !report.is_healthy() {
                return Err(Error::Mismatch(op));
            }
        }
    }

    writeln!(out, "> gwctl {} OK", cli.commands.join(" ")).map_err(output_error)
}

fn write_report(out: &mut impl Write, report: &HealthReport) -> Result<()> {
    write!(out, "{report}").map_err(output_error)?;
    out.flush().map_err(output_error)
}

fn output_error(e: std::io::Error) -> Error {
    Error::Environment(format!("writing output: {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_parse_sequence() {
        let commands = parse_commands(&words("freeze sleep 1.5 restore test_game status")).unwrap();
        assert_eq!(
            commands,
            vec![
                Command::Freeze,
                Command::Sleep(Duration::from_millis(1500)),
                Command::Restore("test_game".to_string()),
                Command::Status,
            ]
        );
    }

    #[test]
    fn test_build_consumes_remaining_words() {
        let commands = parse_commands(&words("stop build engine test_game start")).unwrap();
        assert_eq!(
            commands,
            vec![
                Command::Stop,
                Command::Build(words("engine test_game start")),
            ]
        );
        assert_eq!(parse_commands(&words("build")).unwrap(), vec![Command::Build(vec![])]);
    }

    #[test]
    fn test_commands_are_case_insensitive() {
        let commands = parse_commands(&words("STATUS Start test_game")).unwrap();
        assert_eq!(commands, vec![Command::Status, Command::Start("test_game".to_string())]);
    }

    #[test]
    fn test_usage_errors() {
        for input in ["", "start", "restore", "sleep", "sleep abc", "sleep -1", "bogus", "status frobnicate"] {
            let err = parse_commands(&words(input)).unwrap_err();
            assert!(matches!(err, Error::Usage(_)), "{input:?} gave {err}");
            assert_eq!(err.exit_code(), 1);
        }
    }

    #[test]
    fn test_engine_requirement() {
        assert!(Command::Status.needs_engine());
        assert!(Command::Reload.needs_engine());
        assert!(!Command::Build(vec![]).needs_engine());
        assert!(!Command::Sleep(Duration::ZERO).needs_engine());
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(verbosity("debug").unwrap(), log::Level::Debug);
        assert_eq!(verbosity("INFO").unwrap(), log::Level::Info);
        assert_eq!(verbosity("fatal").unwrap(), log::Level::Error);
        assert!(verbosity("loud").is_err());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "gwctl",
            "--log",
            "debug",
            "--nohup",
            "--strict",
            "--wait-timeout",
            "30",
            "--root",
            "/srv/goworld",
            "start",
            "test_game",
        ])
        .unwrap();
        assert_eq!(cli.log, "debug");
        assert!(cli.nohup);
        assert!(cli.strict);
        assert_eq!(cli.wait_timeout, Some(30));
        assert_eq!(cli.root, Some(PathBuf::from("/srv/goworld")));
        assert_eq!(cli.commands, words("start test_game"));
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["gwctl", "status"]).unwrap();
        assert_eq!(cli.log, "info");
        assert!(!cli.nohup);
        assert!(!cli.strict);
        assert_eq!(cli.wait_timeout, None);
    }

    #[tokio::test]
    async fn test_run_rejects_usage_before_touching_workspace() {
        let cli = Cli::try_parse_from(["gwctl", "--root", "/nonexistent/elsewhere", "bogus"]).unwrap();
        let mut out = Vec::new();
        let err = run(&cli, &mut out).await.unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_run_sleep_only() {
        let (_tmp, ws) = crate::layout::tests::fake_workspace();
        let cli = Cli::try_parse_from([
            "gwctl".to_string(),
            "--root".to_string(),
            ws.root().display().to_string(),
            "sleep".to_string(),
            "0.01".to_string(),
        ])
        .unwrap();
        let mut out = Vec::new();
        run(&cli, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "> gwctl sleep 0.01 OK\n");
    }
}
