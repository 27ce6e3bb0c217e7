// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::{debug, info};
use tokio::time::{Duration, Instant, sleep};

use crate::error::{Error, Result};
use crate::host::Host;
use crate::role::RoleKind;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub initial: Duration,
    pub max_interval: Duration,
    /// `None` waits for as long as it takes.
    pub timeout: Option<Duration>,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            initial: DEFAULT_POLL_INTERVAL,
            max_interval: DEFAULT_MAX_POLL_INTERVAL,
            timeout: None,
        }
    }
}

/// Block until a fresh scan observes no process of `kind`.
///
/// Polling backs off from `policy.initial` to `policy.max_interval`. Fails
/// with [`Error::WaitTimeout`] once `policy.timeout` has elapsed.
pub async fn wait_until_gone<H: Host>(host: &H, kind: RoleKind, policy: WaitPolicy) -> Result<()> {
    info!("Waiting for {kind} processes to terminate ...");
    let started = Instant::now();
    let mut interval = policy.initial;
    loop {
        let remaining = host.scan().count(kind);
        if remaining == 0 {
            info!("{kind} processes terminated");
            return Ok(());
        }

        let elapsed = started.elapsed();
        if let Some(timeout) = policy.timeout
            && elapsed >= timeout
        {
            return Err(Error::WaitTimeout {
                role: kind,
                elapsed,
            });
        }

        debug!("{remaining} {kind} process(es) still alive, retrying in {interval:?}");
        sleep(interval).await;
        interval = (interval * 2).min(policy.max_interval);
    }
}
