// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! In-memory [`Host`] for exercising the lifecycle protocols without real
//! processes.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::PathBuf;

use nix::sys::signal::Signal;

use crate::error::Result;
use crate::host::{Host, SpawnRequest};
use crate::inventory::{Inventory, ObservedProcess};
use crate::role::RoleKind;

pub const DISPATCHER_PATH: &str = "/srv/goworld/components/dispatcher/dispatcher";
pub const GATE_PATH: &str = "/srv/goworld/components/gate/gate";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Spawn(SpawnRequest),
    Signal { kind: RoleKind, sig: Signal },
}

struct FakeProc {
    proc: ObservedProcess,
    /// Scans left before the process disappears, once signalled.
    dying: Option<usize>,
}

pub struct FakeHost {
    procs: RefCell<Vec<FakeProc>>,
    next_pid: i32,
    linger: usize,
    crashing: HashSet<String>,
    events: Vec<Event>,
    scans: Cell<usize>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            procs: RefCell::new(Vec::new()),
            next_pid: 1000,
            linger: 0,
            crashing: HashSet::new(),
            events: Vec::new(),
            scans: Cell::new(0),
        }
    }

    /// Number of scans a signalled process stays visible for.
    pub fn set_linger(&mut self, scans: usize) {
        self.linger = scans;
    }

    /// Spawns with this label exit before the next scan.
    pub fn crash_on_spawn(&mut self, label: &str) {
        self.crashing.insert(label.to_string());
    }

    fn add(&mut self, exe: &str, args: Vec<String>) -> i32 {
        self.next_pid += 1;
        let pid = self.next_pid;
        self.procs.borrow_mut().push(FakeProc {
            proc: ObservedProcess::new(pid, PathBuf::from(exe), args),
            dying: None,
        });
        pid
    }

    pub fn add_dispatcher(&mut self) -> i32 {
        self.add(DISPATCHER_PATH, vec![DISPATCHER_PATH.to_string()])
    }

    pub fn add_gate(&mut self, id: u32) -> i32 {
        self.add(GATE_PATH, vec![GATE_PATH.to_string(), format!("-gid={id}")])
    }

    pub fn add_game(&mut self, exe: &str, id: u32) -> i32 {
        self.add(exe, vec![exe.to_string(), format!("-gid={id}")])
    }

    pub fn terminate_all(&mut self, kind: RoleKind) {
        let pids: Vec<i32> = self.scan_quiet().of(kind).iter().map(|p| p.pid).collect();
        for pid in pids {
            self.signal(pid, Signal::SIGTERM);
        }
    }

    pub fn scans(&self) -> usize {
        self.scans.get()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn spawned_labels(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Spawn(req) => Some(req.label.as_str()),
                Event::Signal { .. } => None,
            })
            .collect()
    }

    pub fn signals(&self) -> Vec<(RoleKind, Signal)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Signal { kind, sig } => Some((*kind, *sig)),
                Event::Spawn(_) => None,
            })
            .collect()
    }

    fn scan_quiet(&self) -> Inventory {
        let procs = self.procs.borrow();
        Inventory::from_processes(procs.iter().map(|p| p.proc.clone()))
    }
}

impl Host for FakeHost {
    fn scan(&self) -> Inventory {
        self.scans.set(self.scans.get() + 1);
        let mut procs = self.procs.borrow_mut();
        procs.retain(|p| p.dying != Some(0));
        for p in procs.iter_mut() {
            if let Some(n) = p.dying.as_mut() {
                *n -= 1;
            }
        }
        Inventory::from_processes(procs.iter().map(|p| p.proc.clone()))
    }

    fn spawn(&mut self, request: &SpawnRequest) -> Result<u32> {
        self.events.push(Event::Spawn(request.clone()));
        let mut args = vec![request.program.to_string_lossy().into_owned()];
        args.extend(request.args.iter().cloned());
        let exe = request.program.to_string_lossy().into_owned();
        let pid = self.add(&exe, args);
        if self.crashing.contains(&request.label)
            && let Some(p) = self.procs.borrow_mut().iter_mut().find(|p| p.proc.pid == pid)
        {
            p.dying = Some(0);
        }
        Ok(pid as u32)
    }

    fn signal(&mut self, pid: i32, sig: Signal) {
        let linger = self.linger;
        let mut procs = self.procs.borrow_mut();
        let Some(p) = procs.iter_mut().find(|p| p.proc.pid == pid) else {
            return;
        };
        if let Some(kind) = p.proc.role.kind() {
            self.events.push(Event::Signal { kind, sig });
        }
        if p.dying.is_none() {
            p.dying = Some(linger);
        }
    }
}
