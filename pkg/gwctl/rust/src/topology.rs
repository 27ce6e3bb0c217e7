// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, bail};
use log::{info, warn};

use crate::error::{Error, Result};

const GAME_PREFIX: &str = "game";
const GATE_PREFIX: &str = "gate";
const GAME_COMMON: &str = "game_common";
const GATE_COMMON: &str = "gate_common";

/// Expected shape of the cluster: one dispatcher plus the configured gate and
/// game ids, both ascending and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterTopology {
    gate_ids: Vec<u32>,
    game_ids: Vec<u32>,
}

impl ClusterTopology {
    pub fn new(gate_ids: impl IntoIterator<Item = u32>, game_ids: impl IntoIterator<Item = u32>) -> Self {
        let gate_ids: BTreeSet<u32> = gate_ids.into_iter().collect();
        let game_ids: BTreeSet<u32> = game_ids.into_iter().collect();
        Self {
            gate_ids: gate_ids.into_iter().collect(),
            game_ids: game_ids.into_iter().collect(),
        }
    }

    pub fn gate_ids(&self) -> &[u32] {
        &self.gate_ids
    }

    pub fn game_ids(&self) -> &[u32] {
        &self.game_ids
    }

    /// Read the INI file at `path`. A missing file yields an empty topology.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("{} not found, assuming no gates and no games", path.display());
                String::new()
            }
            Err(e) => {
                return Err(Error::Config(
                    anyhow::Error::new(e).context(format!("reading {}", path.display())),
                ));
            }
        };

        let topology = Self::from_sections(section_names(&contents))
            .with_context(|| format!("parsing {}", path.display()))
            .map_err(Error::Config)?;
        info!(
            "Found {} games and {} gates in {}",
            topology.game_ids.len(),
            topology.gate_ids.len(),
            path.display()
        );
        Ok(topology)
    }

    /// Build from section names: `game<N>` and `gate<N>` sections, excluding
    /// the shared `game_common`/`gate_common` defaults.
    pub fn from_sections<'a>(sections: impl IntoIterator<Item = &'a str>) -> anyhow::Result<Self> {
        let mut gate_ids = BTreeSet::new();
        let mut game_ids = BTreeSet::new();
        for section in sections {
            let (ids, suffix) = if let Some(suffix) = section.strip_prefix(GAME_PREFIX)
                && section != GAME_COMMON
            {
                (&mut game_ids, suffix)
            } else if let Some(suffix) = section.strip_prefix(GATE_PREFIX)
                && section != GATE_COMMON
            {
                (&mut gate_ids, suffix)
            } else {
                continue;
            };

            let id: u32 = suffix
                .parse()
                .with_context(|| format!("section [{section}]: invalid id {suffix:?}"))?;
            if !ids.insert(id) {
                bail!("section [{section}]: duplicate id {id}");
            }
        }
        Ok(Self {
            gate_ids: gate_ids.into_iter().collect(),
            game_ids: game_ids.into_iter().collect(),
        })
    }
}

/// Section headers of an INI document, in file order. Keys, values,
/// comments (`#`, `;`) and blank lines are skipped. Text after the closing
/// `]` of a header is ignored.
fn section_names(contents: &str) -> impl Iterator<Item = &str> {
    contents.lines().filter_map(|line| {
        let trimmed = line.trim();
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            return None;
        }
        trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.split_once(']'))
            .map(|(name, _)| name.trim())
    })
}
