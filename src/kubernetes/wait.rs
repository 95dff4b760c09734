// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Poll an object until it reports ready or a deadline passes.
//!
//! The waiter is a small state machine: it starts in `Polling` and ends in
//! `Ready`, `TimedOut`, `Cancelled` or `StoreError`. Fetch failures are
//! retried by default (the object may simply not exist yet), so only the
//! deadline bounds the loop. An in-flight fetch is cut short by the deadline
//! and by the cancellation token; during a pause both are only checked once
//! the pause ends.

use crate::constants::{readiness, DEFAULT_REPLICAS};
use crate::error::{Error, Result};
use crate::kubernetes::store::{ManagedObject, ObjectStore};
use crate::types::{ResourceKey, StorageCluster};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::Pod;
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Kinds that expose a terminal "safe to proceed" condition
pub trait Readiness {
    fn is_ready(&self) -> bool;
}

impl Readiness for Pod {
    fn is_ready(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .is_some_and(|phase| phase == readiness::POD_RUNNING)
    }
}

impl Readiness for StatefulSet {
    fn is_ready(&self) -> bool {
        let desired = self
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or(DEFAULT_REPLICAS);
        self.status
            .as_ref()
            .is_some_and(|s| s.ready_replicas.unwrap_or(0) >= desired)
    }
}

impl Readiness for StorageCluster {
    fn is_ready(&self) -> bool {
        StorageCluster::is_ready(self)
    }
}

/// What to do when fetching the watched object fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchErrorPolicy {
    /// Treat every fetch error as transient and keep polling until the deadline
    #[default]
    Retry,
    /// Stop with the fetch error
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaitConfig {
    pub poll_interval: Duration,
    /// Pause after a failed fetch. Zero retries immediately.
    ///
    /// With zero, a retry loop against a store that fails without delay
    /// never registers a timer, so under tokio's paused test clock time does
    /// not advance and the deadline is never reached. Tests that pause the
    /// clock and expect fetch failures need a non-zero backoff.
    pub error_backoff: Duration,
    pub fetch_error_policy: FetchErrorPolicy,
    /// Timeout used by `ReadinessWaiter::wait_until_ready_default`
    pub default_timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        WaitConfig {
            poll_interval: Duration::from_secs(readiness::POLL_INTERVAL_SECS),
            error_backoff: Duration::ZERO,
            fetch_error_policy: FetchErrorPolicy::Retry,
            default_timeout: Duration::from_secs(readiness::TIMEOUT_SECS),
        }
    }
}

#[derive(Debug)]
enum WaitState {
    Polling,
    Ready,
    TimedOut,
    Cancelled,
    StoreError(Error),
}

/// Terminal result of a wait
#[derive(Debug)]
pub enum WaitOutcome {
    Ready,
    TimedOut,
    Cancelled,
    StoreError(Error),
}

impl WaitOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, WaitOutcome::Ready)
    }

    fn into_result(self, key: &ResourceKey, timeout: Duration) -> Result<()> {
        match self {
            WaitOutcome::Ready => Ok(()),
            WaitOutcome::TimedOut => Err(Error::DeadlineExceeded {
                key: key.clone(),
                timeout,
            }),
            WaitOutcome::Cancelled => Err(Error::Cancelled { key: key.clone() }),
            WaitOutcome::StoreError(e) => Err(e),
        }
    }
}

pub struct ReadinessWaiter<'a> {
    store: &'a ObjectStore,
    config: WaitConfig,
}

impl<'a> ReadinessWaiter<'a> {
    pub fn new(store: &'a ObjectStore, config: WaitConfig) -> Self {
        Self { store, config }
    }

    /// Block until the object at `key` is ready, or fail with
    /// `Error::DeadlineExceeded` once `timeout` has elapsed
    pub async fn wait_until_ready<K>(&self, key: &ResourceKey, timeout: Duration) -> Result<()>
    where
        K: ManagedObject + Readiness,
    {
        self.run::<K>(key, timeout, None)
            .await
            .into_result(key, timeout)
    }

    /// `wait_until_ready` with the configured default timeout
    pub async fn wait_until_ready_default<K>(&self, key: &ResourceKey) -> Result<()>
    where
        K: ManagedObject + Readiness,
    {
        self.wait_until_ready::<K>(key, self.config.default_timeout)
            .await
    }

    /// Like `wait_until_ready`, but also stops with `Error::Cancelled` once
    /// `cancel` fires. A pending fetch is abandoned at once; a pause runs to
    /// its end before the token is observed.
    pub async fn wait_until_ready_or_cancelled<K>(
        &self,
        key: &ResourceKey,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        K: ManagedObject + Readiness,
    {
        self.run::<K>(key, timeout, Some(cancel))
            .await
            .into_result(key, timeout)
    }

    #[instrument(skip(self, cancel), fields(kind = %K::kind_name()))]
    pub async fn run<K>(
        &self,
        key: &ResourceKey,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> WaitOutcome
    where
        K: ManagedObject + Readiness,
    {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut state = WaitState::Polling;

        loop {
            state = match state {
                WaitState::Polling => self.step::<K>(key, deadline, cancel).await,
                WaitState::Ready => {
                    info!("{} {} ready after {:?}", K::kind_name(), key, started.elapsed());
                    return WaitOutcome::Ready;
                }
                WaitState::TimedOut => {
                    warn!("{} {} not ready within {:?}", K::kind_name(), key, timeout);
                    return WaitOutcome::TimedOut;
                }
                WaitState::Cancelled => return WaitOutcome::Cancelled,
                WaitState::StoreError(e) => return WaitOutcome::StoreError(e),
            };
        }
    }

    async fn step<K>(
        &self,
        key: &ResourceKey,
        deadline: Instant,
        cancel: Option<&CancellationToken>,
    ) -> WaitState
    where
        K: ManagedObject + Readiness,
    {
        let fetch = timeout_at(deadline, self.store.get::<K>(key));
        let fetched = match cancel {
            Some(cancel) => tokio::select! {
                _ = cancel.cancelled() => return WaitState::Cancelled,
                fetched = fetch => fetched,
            },
            None => fetch.await,
        };
        let Ok(fetched) = fetched else {
            debug!("Fetching {} {} did not finish before the deadline", K::kind_name(), key);
            return WaitState::TimedOut;
        };

        match fetched {
            Ok(obj) if obj.is_ready() => return WaitState::Ready,
            Ok(_) => {
                debug!("{} {} not ready yet", K::kind_name(), key);
                sleep(self.config.poll_interval).await;
            }
            Err(e) => match self.config.fetch_error_policy {
                FetchErrorPolicy::Fail => return WaitState::StoreError(e),
                FetchErrorPolicy::Retry => {
                    debug!("Fetching {} {} failed, retrying: {}", K::kind_name(), key, e);
                    if !self.config.error_backoff.is_zero() {
                        sleep(self.config.error_backoff).await;
                    }
                }
            },
        }

        if cancel.is_some_and(|c| c.is_cancelled()) {
            WaitState::Cancelled
        } else if Instant::now() >= deadline {
            WaitState::TimedOut
        } else {
            WaitState::Polling
        }
    }
}
