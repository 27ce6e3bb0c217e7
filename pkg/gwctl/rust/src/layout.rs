// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{Error, Result};
use crate::role::{DISPATCHER_EXE, GATE_EXE};

/// Required base name of the workspace root.
pub const WORKSPACE_DIR_NAME: &str = "goworld";
pub const CONFIG_FILE: &str = "goworld.ini";
pub const DETACHED_OUTPUT_FILE: &str = "nohup.out";
const COMPONENTS_DIR: &str = "components";
/// Top-level directories never searched for games.
const NON_GAME_DIRS: [&str; 2] = [COMPONENTS_DIR, "engine"];

/// On-disk conventions of a goworld checkout.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Accept `root` as a workspace if its base name is `goworld`. The root
    /// is canonicalized first so it compares equal to the absolute
    /// executable paths seen in `/proc`.
    pub fn open(root: PathBuf) -> Result<Self> {
        let root = std::fs::canonicalize(&root).map_err(|e| {
            Error::Environment(format!("workspace root {}: {e}", root.display()))
        })?;
        info!("Detected goworld path: {}", root.display());
        if root.file_name().and_then(|n| n.to_str()) != Some(WORKSPACE_DIR_NAME) {
            return Err(Error::Environment(format!(
                "must run in {WORKSPACE_DIR_NAME} directory (got {})",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn detached_output(&self) -> PathBuf {
        self.root.join(DETACHED_OUTPUT_FILE)
    }

    pub fn component_dir(&self, component: &str) -> PathBuf {
        self.root.join(COMPONENTS_DIR).join(component)
    }

    pub fn dispatcher_exe(&self) -> PathBuf {
        self.component_dir(DISPATCHER_EXE).join(DISPATCHER_EXE)
    }

    pub fn gate_exe(&self) -> PathBuf {
        self.component_dir(GATE_EXE).join(GATE_EXE)
    }

    /// Both engine binaries must have been built.
    pub fn verify_engine(&self) -> Result<()> {
        for exe in [self.dispatcher_exe(), self.gate_exe()] {
            if !exe.exists() {
                return Err(Error::Environment(format!(
                    "{} is not found, build engine first",
                    exe.display()
                )));
            }
        }
        Ok(())
    }

    /// Locate a game's executable. `name` is either `dir/game` or a bare
    /// `game`, in which case every top-level directory is searched for a
    /// `game/` subdirectory. The executable itself need not exist yet.
    pub fn resolve_game(&self, name: &str) -> Result<PathBuf> {
        let path = Path::new(name);
        let not_found = || Error::Environment(format!("game {name} is not found, wrong name?"));
        let game = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(not_found)?;

        let dirs = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => vec![self.root.join(parent)],
            _ => self.search_dirs().map_err(|e| {
                Error::Environment(format!("listing {}: {e}", self.root.display()))
            })?,
        };

        for dir in dirs {
            let game_dir = dir.join(game);
            if game_dir.is_dir() {
                let exe = game_dir.join(game);
                debug!("resolved game {name} to {}", exe.display());
                return Ok(exe);
            }
        }
        Err(not_found())
    }

    /// Like [`Workspace::resolve_game`] but the executable must exist.
    pub fn resolve_built_game(&self, name: &str) -> Result<PathBuf> {
        let exe = self.resolve_game(name)?;
        if !exe.exists() {
            return Err(Error::Environment(format!(
                "{} is not found, build {name} first",
                exe.display()
            )));
        }
        Ok(exe)
    }

    fn search_dirs(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            if NON_GAME_DIRS.iter().any(|d| name == *d) {
                continue;
            }
            if entry.path().is_dir() {
                dirs.push(entry.path());
            }
        }
        dirs.sort();
        Ok(dirs)
    }
}
