// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::{Path, PathBuf};

use log::info;
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::layout::Workspace;
use crate::role::{DISPATCHER_EXE, GATE_EXE};

pub const DEFAULT_TOOLCHAIN: &str = "go";
pub const ENGINE_TARGET: &str = "engine";

/// Invokes the external compiler in a target's source directory.
pub struct Builder<'a> {
    workspace: &'a Workspace,
    toolchain: PathBuf,
}

impl<'a> Builder<'a> {
    pub fn new(workspace: &'a Workspace, toolchain: PathBuf) -> Self {
        Self {
            workspace,
            toolchain,
        }
    }

    /// Build every target in order, stopping at the first failure. An empty
    /// list builds the engine.
    pub async fn build_all(&self, targets: &[String]) -> Result<()> {
        if targets.is_empty() {
            return self.build(ENGINE_TARGET).await;
        }
        for target in targets {
            self.build(target).await?;
        }
        Ok(())
    }

    pub async fn build(&self, target: &str) -> Result<()> {
        match target {
            ENGINE_TARGET => {
                self.build_component(DISPATCHER_EXE).await?;
                self.build_component(GATE_EXE).await
            }
            DISPATCHER_EXE | GATE_EXE => self.build_component(target).await,
            game => {
                let exe = self.workspace.resolve_game(game)?;
                let dir = exe.parent().ok_or_else(|| Error::Build {
                    target: game.to_string(),
                    reason: format!("{} has no parent directory", exe.display()),
                })?;
                self.run(game, dir).await
            }
        }
    }

    async fn build_component(&self, component: &str) -> Result<()> {
        self.run(component, &self.workspace.component_dir(component))
            .await
    }

    async fn run(&self, target: &str, dir: &Path) -> Result<()> {
        info!("building {target} in {} ...", dir.display());
        let status = Command::new(&self.toolchain)
            .arg("build")
            .current_dir(dir)
            .status()
            .await
            .map_err(|e| Error::Build {
                target: target.to_string(),
                reason: format!("failed to run {}: {e}", self.toolchain.display()),
            })?;
        if !status.success() {
            return Err(Error::Build {
                target: target.to_string(),
                reason: status.to_string(),
            });
        }
        info!("building {target} OK");
        Ok(())
    }
}
