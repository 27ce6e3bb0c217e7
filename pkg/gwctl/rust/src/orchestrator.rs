// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::Path;

use log::{error, info};
use nix::sys::signal::Signal;

use crate::error::{Error, Result};
use crate::health::{Expected, HealthReport, evaluate};
use crate::host::{Host, SpawnRequest};
use crate::inventory::Inventory;
use crate::layout::Workspace;
use crate::role::{ID_FLAG, RoleKind};
use crate::state::{ClusterState, Operation};
use crate::topology::ClusterTopology;
use crate::waiter::{WaitPolicy, wait_until_gone};

pub const DEFAULT_LOG_LEVEL: &str = "info";
const RESTORE_FLAG: &str = "-restore";
const LOG_FLAG: &str = "-log";

/// How spawned processes are launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Passed to gates and games as `-log <level>`.
    pub log_level: String,
    pub detach: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            detach: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// SIGTERM for games.
    Graceful,
    /// SIGKILL for games.
    Forced,
}

/// Runs the cluster lifecycle protocols. Every decision is taken on a fresh
/// scan; no inventory outlives a spawn or signal step.
pub struct Orchestrator<'a, H: Host> {
    host: H,
    topology: &'a ClusterTopology,
    workspace: &'a Workspace,
    launch: LaunchOptions,
    wait: WaitPolicy,
}

impl<'a, H: Host> Orchestrator<'a, H> {
    pub fn new(
        host: H,
        topology: &'a ClusterTopology,
        workspace: &'a Workspace,
        launch: LaunchOptions,
        wait: WaitPolicy,
    ) -> Self {
        Self {
            host,
            topology,
            workspace,
            launch,
            wait,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Health of the live cluster against the full configured topology.
    pub fn status(&self) -> HealthReport {
        self.report(Expected::full(self.topology))
    }

    /// Bring up dispatcher, then games, then gates on an empty host.
    pub async fn start(&mut self, game_exe: &Path) -> Result<HealthReport> {
        self.guard(Operation::Start)?;

        let dispatcher = SpawnRequest {
            label: "dispatcher".to_string(),
            program: self.workspace.dispatcher_exe(),
            args: Vec::new(),
            detach: self.launch.detach,
        };
        self.host.spawn(&dispatcher)?;
        self.spawn_games(game_exe, false)?;
        for &id in self.topology.gate_ids() {
            let request = self.instance_request(RoleKind::Gate, id, &self.workspace.gate_exe(), false);
            self.host.spawn(&request)?;
        }

        Ok(self.report(Expected::full(self.topology)))
    }

    /// Take the cluster down: gates, then games, then the dispatcher, each
    /// group fully gone before the next is signalled.
    pub async fn stop(&mut self, mode: StopMode) -> Result<HealthReport> {
        let op = match mode {
            StopMode::Graceful => Operation::Stop,
            StopMode::Forced => Operation::Kill,
        };
        self.guard(op)?;

        // Gates are always killed so clients drop immediately.
        self.signal_all(RoleKind::Gate, Signal::SIGKILL).await?;
        let game_signal = match mode {
            StopMode::Graceful => Signal::SIGTERM,
            StopMode::Forced => Signal::SIGKILL,
        };
        self.signal_all(RoleKind::Game, game_signal).await?;
        self.signal_all(RoleKind::Dispatcher, Signal::SIGKILL).await?;

        Ok(self.report(Expected::NONE))
    }

    /// Interrupt every game process and wait for them to save and exit,
    /// leaving dispatcher and gates running.
    pub async fn freeze(&mut self) -> Result<HealthReport> {
        self.guard(Operation::Freeze)?;
        self.signal_all(RoleKind::Game, Signal::SIGINT).await?;
        Ok(self.report(Expected::frozen(self.topology)))
    }

    /// Relaunch every configured game with the restore flag on a frozen
    /// cluster.
    pub async fn restore(&mut self, game_exe: &Path) -> Result<HealthReport> {
        self.guard(Operation::Restore)?;
        self.spawn_games(game_exe, true)?;
        Ok(self.report(Expected::full(self.topology)))
    }

    /// Freeze, then restore the game that is currently running. The game is
    /// identified from the live processes before anything is signalled.
    pub async fn reload(&mut self) -> Result<HealthReport> {
        let inventory = self.guard(Operation::Reload)?;
        let Some(game) = inventory.current_game(self.workspace.root()) else {
            return Err(self.reject(
                Operation::Reload,
                ClusterState::of(&inventory),
                &inventory,
            ));
        };
        info!("Detected game: {game} for reload");
        let game_exe = self.workspace.resolve_built_game(&game)?;

        self.freeze().await?;
        self.restore(&game_exe).await
    }

    fn spawn_games(&mut self, game_exe: &Path, restore: bool) -> Result<()> {
        for &id in self.topology.game_ids() {
            let request = self.instance_request(RoleKind::Game, id, game_exe, restore);
            self.host.spawn(&request)?;
        }
        Ok(())
    }

    fn instance_request(&self, kind: RoleKind, id: u32, program: &Path, restore: bool) -> SpawnRequest {
        let mut args = vec![
            format!("{ID_FLAG}{id}"),
            LOG_FLAG.to_string(),
            self.launch.log_level.clone(),
        ];
        if restore {
            args.push(RESTORE_FLAG.to_string());
        }
        SpawnRequest {
            label: format!("{kind}{id}"),
            program: program.to_path_buf(),
            args,
            detach: self.launch.detach,
        }
    }

    /// Signal every live process of `kind` from a fresh scan, then block
    /// until none is left.
    async fn signal_all(&mut self, kind: RoleKind, sig: Signal) -> Result<()> {
        let targets = self.host.scan();
        for proc in targets.of(kind) {
            info!("[{kind}:{}] sending {sig}", proc.pid);
            self.host.signal(proc.pid, sig);
        }
        wait_until_gone(&self.host, kind, self.wait).await
    }

    /// Scan and check that `op` may run from the observed state.
    fn guard(&self, op: Operation) -> Result<Inventory> {
        let inventory = self.host.scan();
        let state = ClusterState::of(&inventory);
        if !state.permits(op) {
            return Err(self.reject(op, state, &inventory));
        }
        info!("{op}: cluster is {state}");
        Ok(inventory)
    }

    fn reject(&self, op: Operation, state: ClusterState, inventory: &Inventory) -> Error {
        let (reason, expected) = match op {
            Operation::Start => ("goworld is already running", Expected::full(self.topology)),
            Operation::Stop | Operation::Kill => {
                ("goworld is not running", Expected::full(self.topology))
            }
            Operation::Freeze => ("game process is not found", Expected::full(self.topology)),
            Operation::Restore => ("wrong process status", Expected::frozen(self.topology)),
            Operation::Reload => (
                "can not detect current game, not running ?",
                Expected::full(self.topology),
            ),
            Operation::Status => ("unexpected status failure", Expected::full(self.topology)),
        };
        error!("{reason}");
        let current_game = inventory.current_game(self.workspace.root());
        Error::Precondition {
            operation: op,
            state,
            reason: reason.to_string(),
            report: Box::new(evaluate(expected, inventory, current_game.as_deref())),
        }
    }

    fn report(&self, expected: Expected) -> HealthReport {
        let inventory = self.host.scan();
        let current_game = inventory.current_game(self.workspace.root());
        evaluate(expected, &inventory, current_game.as_deref())
    }
}
