// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// A throwaway `<tmp>/goworld` checkout to run gwctl in.
pub struct Checkout {
    _tmp: tempfile::TempDir,
    root: PathBuf,
}

impl Checkout {
    /// An empty checkout: no engine binaries, no games, no config.
    pub fn bare() -> Self {
        let tmp = tempfile::tempdir().expect("failed to create tempdir");
        let root = tmp.path().join("goworld");
        std::fs::create_dir_all(&root).expect("failed to create checkout root");
        Self { _tmp: tmp, root }
    }

    /// A checkout with placeholder dispatcher and gate binaries and one
    /// unbuilt game directory `examples/test_game`.
    pub fn with_engine() -> Self {
        let checkout = Self::bare();
        for component in ["dispatcher", "gate"] {
            let dir = checkout.component_dir(component);
            std::fs::create_dir_all(&dir).expect("failed to create component dir");
            std::fs::write(dir.join(component), "").expect("failed to write component binary");
        }
        std::fs::create_dir_all(checkout.root.join("examples/test_game"))
            .expect("failed to create game dir");
        checkout
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn component_dir(&self, component: &str) -> PathBuf {
        self.root.join("components").join(component)
    }

    pub fn write_config(&self, ini: &str) {
        let path = self.root.join("goworld.ini");
        std::fs::write(&path, ini)
            .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    }

    /// Run gwctl with `args` from the checkout root.
    pub fn gwctl(&self, args: &[&str]) -> Output {
        run_gwctl(&self.root, args)
    }
}

/// Run the gwctl binary in `dir` and collect its output.
pub fn run_gwctl(dir: &Path, args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_gwctl");
    let output = Command::new(bin)
        .args(args)
        .current_dir(dir)
        .env_remove("GOWORLD_ROOT")
        .env_remove("GOWORLD_GO")
        .stdin(Stdio::null())
        .output()
        .expect("failed to run gwctl");
    eprintln!("[gwctl:err] {}", String::from_utf8_lossy(&output.stderr));
    output
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn exit_code(output: &Output) -> i32 {
    output.status.code().expect("gwctl was killed by a signal")
}
