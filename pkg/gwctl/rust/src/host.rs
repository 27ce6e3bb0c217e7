// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::process::Stdio;

use log::{debug, info, warn};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::inventory::{Inventory, ProcessTable};

/// Everything needed to launch one cluster process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Short name used in log lines, e.g. `game1`.
    pub label: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Put the child in its own background process group with a null stdin
    /// and output appended to `nohup.out`. It stays in the supervisor's
    /// session but no longer receives the terminal's job-control signals.
    pub detach: bool,
}

/// The OS seen by the orchestrator: a process table to scan, a way to launch
/// processes and a way to signal them.
pub trait Host {
    fn scan(&self) -> Inventory;

    /// Launch a process and return its pid. Returns as soon as the OS
    /// accepted the request; readiness is never awaited.
    fn spawn(&mut self, request: &SpawnRequest) -> Result<u32>;

    /// Deliver `sig` to `pid`. A process that is already gone is not an error.
    fn signal(&mut self, pid: i32, sig: Signal);
}

/// The local machine: `/proc` for scanning, fork/exec for spawning and
/// `kill(2)` for signals.
pub struct LocalHost {
    table: ProcessTable,
    /// Where detached children write their output.
    detached_output: PathBuf,
}

impl LocalHost {
    pub fn new(table: ProcessTable, detached_output: PathBuf) -> Self {
        Self {
            table,
            detached_output,
        }
    }

    fn detached_stdio(&self) -> std::io::Result<(File, File)> {
        let out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.detached_output)?;
        let err = out.try_clone()?;
        Ok((out, err))
    }
}

impl Host for LocalHost {
    fn scan(&self) -> Inventory {
        self.table.scan()
    }

    fn spawn(&mut self, request: &SpawnRequest) -> Result<u32> {
        let spawn_error = |source| Error::Spawn {
            label: request.label.clone(),
            program: request.program.clone(),
            source,
        };

        let mut cmd = Command::new(&request.program);
        cmd.args(&request.args);

        if request.detach {
            let (out, err) = self.detached_stdio().map_err(spawn_error)?;
            cmd.stdin(Stdio::null())
                .stdout(Stdio::from(out))
                .stderr(Stdio::from(err))
                .process_group(0);
        }

        let child = cmd.spawn().map_err(spawn_error)?;
        let pid = child.id().unwrap_or(0);
        info!(
            "[{}] spawned (pid={pid}, cmd={} {})",
            request.label,
            request.program.display(),
            request.args.join(" ")
        );
        // Dropping the handle leaves the child running.
        drop(child);
        Ok(pid)
    }

    fn signal(&mut self, pid: i32, sig: Signal) {
        debug!("sending {sig} to pid {pid}");
        match signal::kill(Pid::from_raw(pid), sig) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => warn!("failed to send {sig} to pid {pid}: {e}"),
        }
    }
}
