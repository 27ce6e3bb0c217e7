// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::procfs::{self, Cmdline, Exe};
use crate::role::{Role, RoleKind, classify};

/// One live process as seen by a single scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedProcess {
    pub pid: i32,
    pub exe: PathBuf,
    pub name: String,
    pub args: Vec<String>,
    pub role: Role,
}

impl ObservedProcess {
    pub fn new(pid: i32, exe: PathBuf, args: Vec<String>) -> Self {
        let name = exe
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let role = classify(&exe, args.iter().map(String::as_str));
        Self {
            pid,
            exe,
            name,
            args,
            role,
        }
    }
}

/// Point-in-time partition of the process table. Never reuse one across a
/// spawn or signal step; take a new scan instead.
#[derive(Debug, Default, Clone)]
pub struct Inventory {
    pub dispatchers: Vec<ObservedProcess>,
    pub gates: Vec<ObservedProcess>,
    pub games: Vec<ObservedProcess>,
}

impl Inventory {
    pub fn from_processes(processes: impl IntoIterator<Item = ObservedProcess>) -> Self {
        let mut inventory = Inventory::default();
        for proc in processes {
            match proc.role.kind() {
                Some(RoleKind::Dispatcher) => inventory.dispatchers.push(proc),
                Some(RoleKind::Gate) => inventory.gates.push(proc),
                Some(RoleKind::Game) => inventory.games.push(proc),
                None => {}
            }
        }
        inventory
    }

    pub fn of(&self, kind: RoleKind) -> &[ObservedProcess] {
        match kind {
            RoleKind::Dispatcher => &self.dispatchers,
            RoleKind::Gate => &self.gates,
            RoleKind::Game => &self.games,
        }
    }

    pub fn count(&self, kind: RoleKind) -> usize {
        self.of(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        self.dispatchers.is_empty() && self.gates.is_empty() && self.games.is_empty()
    }

    /// Name of the game the live game processes run, e.g. `examples/test_game`.
    ///
    /// Defined only when every game process runs the same executable. The
    /// name is the executable's directory relative to `workspace_root`, or
    /// the bare directory name if the executable lives elsewhere.
    pub fn current_game(&self, workspace_root: &Path) -> Option<String> {
        let (first, rest) = self.games.split_first()?;
        if let Some(other) = rest.iter().find(|p| p.exe != first.exe) {
            warn!(
                "found multiple game processes with different exe: {} & {}",
                first.exe.display(),
                other.exe.display()
            );
            return None;
        }

        let dir = first.exe.parent()?;
        let name = match dir.strip_prefix(workspace_root) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().into_owned(),
            _ => dir.file_name()?.to_string_lossy().into_owned(),
        };
        debug!("found game exe {} ({name})", first.exe.display());
        Some(name)
    }
}

/// Scanner over a proc root.
#[derive(Debug, Clone)]
pub struct ProcessTable {
    root: PathBuf,
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new(procfs::root_path())
    }
}

impl ProcessTable {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// One pass over the proc root. Processes that cannot be inspected
    /// (permission denied, exited mid-scan, kernel threads) are skipped.
    pub fn scan(&self) -> Inventory {
        let pids = match procfs::pids(&self.root) {
            Ok(pids) => pids,
            Err(e) => {
                warn!("failed to list {}: {e}", self.root.display());
                return Inventory::default();
            }
        };
        Inventory::from_processes(pids.into_iter().filter_map(|pid| self.inspect(pid)))
    }

    fn inspect(&self, pid: i32) -> Option<ObservedProcess> {
        let exe = Exe::read(&self.root, pid).ok()?;
        let cmdline = Cmdline::read(&self.root, pid).ok()?;
        let args = cmdline.args().map(String::from).collect();
        Some(ObservedProcess::new(pid, exe.0, args))
    }
}
