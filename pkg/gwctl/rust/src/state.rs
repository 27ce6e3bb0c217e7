// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fmt;

use crate::inventory::Inventory;
use crate::role::RoleKind;

/// Cluster state as inferred from one inventory. Nothing is stored between
/// invocations; the state is re-derived from every fresh scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterState {
    /// No dispatcher, gate or game process.
    Empty,
    /// At least one game process is alive.
    Running,
    /// Exactly one dispatcher and no game process.
    Frozen,
    /// Any other non-empty shape, e.g. gates without a dispatcher.
    Transitioning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Status,
    Start,
    Stop,
    Kill,
    Freeze,
    Restore,
    Reload,
}

impl ClusterState {
    pub fn of(inventory: &Inventory) -> Self {
        let dispatchers = inventory.count(RoleKind::Dispatcher);
        let games = inventory.count(RoleKind::Game);
        if inventory.is_empty() {
            ClusterState::Empty
        } else if games > 0 {
            ClusterState::Running
        } else if dispatchers == 1 {
            ClusterState::Frozen
        } else {
            ClusterState::Transitioning
        }
    }

    /// The single guard for every operation's precondition.
    pub fn permits(self, op: Operation) -> bool {
        use ClusterState::*;
        use Operation::*;
        match op {
            Status => true,
            Start => self == Empty,
            Stop | Kill => self != Empty,
            Freeze | Reload => self == Running,
            Restore => self == Frozen,
        }
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterState::Empty => write!(f, "empty"),
            ClusterState::Running => write!(f, "running"),
            ClusterState::Frozen => write!(f, "frozen"),
            ClusterState::Transitioning => write!(f, "transitioning"),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Status => write!(f, "status"),
            Operation::Start => write!(f, "start"),
            Operation::Stop => write!(f, "stop"),
            Operation::Kill => write!(f, "kill"),
            Operation::Freeze => write!(f, "freeze"),
            Operation::Restore => write!(f, "restore"),
            Operation::Reload => write!(f, "reload"),
        }
    }
}
