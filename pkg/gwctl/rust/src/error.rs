// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::health::HealthReport;
use crate::role::RoleKind;
use crate::state::{ClusterState, Operation};

pub const EXIT_USAGE: u8 = 1;
pub const EXIT_FAILURE: u8 = 2;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Environment(String),

    #[error("configuration error: {0:#}")]
    Config(anyhow::Error),

    /// The cluster is not in a state the operation can start from. Carries
    /// the snapshot that was rejected so the caller can print it.
    #[error("{reason} ({operation} refused while cluster is {state})")]
    Precondition {
        operation: Operation,
        state: ClusterState,
        reason: String,
        report: Box<HealthReport>,
    },

    #[error("failed to spawn {label} ({}): {source}", .program.display())]
    Spawn {
        label: String,
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {}s waiting for {role} processes to terminate", .elapsed.as_secs())]
    WaitTimeout { role: RoleKind, elapsed: Duration },

    #[error("building {target} failed: {reason}")]
    Build { target: String, reason: String },

    /// Post-operation verdict was BAD and strict checking was requested.
    #[error("process status mismatch after {0}")]
    Mismatch(Operation),
}

impl Error {
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Usage(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }

    /// The health snapshot attached to a refused operation, if any.
    pub fn report(&self) -> Option<&HealthReport> {
        match self {
            Error::Precondition { report, .. } => Some(report.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
