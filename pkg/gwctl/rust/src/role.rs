// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fmt;
use std::path::Path;

pub const DISPATCHER_EXE: &str = "dispatcher";
pub const GATE_EXE: &str = "gate";
/// Every gate and game binary lives under a path containing this marker.
pub const PRODUCT_MARKER: &str = "goworld";
pub const ID_FLAG: &str = "-gid=";

/// The role of one observed process. `None` ids mean the process carried the
/// id flag with a value that is not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Dispatcher,
    Gate(Option<u32>),
    Game(Option<u32>),
    Unrelated,
}

/// Role category without the id, used for counting and waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleKind {
    Dispatcher,
    Gate,
    Game,
}

impl Role {
    pub fn kind(self) -> Option<RoleKind> {
        match self {
            Role::Dispatcher => Some(RoleKind::Dispatcher),
            Role::Gate(_) => Some(RoleKind::Gate),
            Role::Game(_) => Some(RoleKind::Game),
            Role::Unrelated => None,
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleKind::Dispatcher => write!(f, "dispatcher"),
            RoleKind::Gate => write!(f, "gate"),
            RoleKind::Game => write!(f, "game"),
        }
    }
}

/// Classify a process from its executable path and argv.
///
/// Precedence: dispatcher by name; then gate (gate name, product marker in
/// the path, id flag on the command line); then game (same as gate but any
/// name other than the gate's). Name equality with the gate binary is the
/// only thing that separates a gate from a game.
pub fn classify<'a>(exe: &Path, args: impl IntoIterator<Item = &'a str>) -> Role {
    let name = exe.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if name == DISPATCHER_EXE {
        return Role::Dispatcher;
    }

    let in_product = exe.to_string_lossy().contains(PRODUCT_MARKER);
    if !in_product {
        return Role::Unrelated;
    }

    let Some(id) = find_id_flag(args) else {
        return Role::Unrelated;
    };

    if name == GATE_EXE {
        Role::Gate(id)
    } else {
        Role::Game(id)
    }
}

/// Returns `Some(id)` when any argument contains the id flag. The id is the
/// run of digits following the first occurrence.
fn find_id_flag<'a>(args: impl IntoIterator<Item = &'a str>) -> Option<Option<u32>> {
    let arg = args.into_iter().find(|a| a.contains(ID_FLAG))?;
    let (_, value) = arg.split_once(ID_FLAG)?;
    let digits_end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    Some(value.get(..digits_end).and_then(|d| d.parse().ok()))
}
