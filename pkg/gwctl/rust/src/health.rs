// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fmt;

use crate::inventory::Inventory;
use crate::role::RoleKind;
use crate::topology::ClusterTopology;

/// Expected process count per role for one phase of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expected {
    pub dispatcher: usize,
    pub gate: usize,
    pub game: usize,
}

impl Expected {
    pub const NONE: Expected = Expected {
        dispatcher: 0,
        gate: 0,
        game: 0,
    };

    /// Dispatcher, every configured gate and every configured game.
    pub fn full(topology: &ClusterTopology) -> Self {
        Self {
            dispatcher: 1,
            gate: topology.gate_ids().len(),
            game: topology.game_ids().len(),
        }
    }

    /// Dispatcher and gates up, games down.
    pub fn frozen(topology: &ClusterTopology) -> Self {
        Self {
            game: 0,
            ..Self::full(topology)
        }
    }

    fn of(&self, kind: RoleKind) -> usize {
        match kind {
            RoleKind::Dispatcher => self.dispatcher,
            RoleKind::Gate => self.gate,
            RoleKind::Game => self.game,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub kind: RoleKind,
    pub label: String,
    pub expected: usize,
    pub observed: usize,
}

impl Verdict {
    pub fn ok(&self) -> bool {
        self.expected == self.observed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub verdicts: Vec<Verdict>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.verdicts.iter().all(Verdict::ok)
    }

    pub fn verdict(&self, kind: RoleKind) -> Option<&Verdict> {
        self.verdicts.iter().find(|v| v.kind == kind)
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for v in &self.verdicts {
            writeln!(
                f,
                "{:<32} expect {} found {} {}",
                v.label,
                v.expected,
                v.observed,
                if v.ok() { "GOOD" } else { "BAD!" }
            )?;
        }
        Ok(())
    }
}

/// Compare an inventory against an expected shape.
pub fn evaluate(expected: Expected, observed: &Inventory, current_game: Option<&str>) -> HealthReport {
    let verdicts = [RoleKind::Dispatcher, RoleKind::Gate, RoleKind::Game]
        .into_iter()
        .map(|kind| Verdict {
            kind,
            label: label(kind, current_game),
            expected: expected.of(kind),
            observed: observed.count(kind),
        })
        .collect();
    HealthReport { verdicts }
}

fn label(kind: RoleKind, current_game: Option<&str>) -> String {
    match (kind, current_game) {
        (RoleKind::Game, Some(game)) => format!("game ({game})"),
        (RoleKind::Game, None) => "game (unknown)".to_string(),
        (kind, _) => kind.to_string(),
    }
}
