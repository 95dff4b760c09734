// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::readiness;
use crate::kubernetes::wait::{FetchErrorPolicy, WaitConfig};

/// Client layer configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Pause between two readiness checks
    pub poll_interval: Duration,
    /// Timeout for `ReadinessWaiter::wait_until_ready_default`
    pub ready_timeout: Duration,
    /// Pause after a failed readiness fetch before retrying
    pub fetch_error_backoff: Duration,
    /// Abort a readiness wait on the first fetch error instead of retrying
    pub fail_on_fetch_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            poll_interval: Duration::from_secs(readiness::POLL_INTERVAL_SECS),
            ready_timeout: Duration::from_secs(readiness::TIMEOUT_SECS),
            fetch_error_backoff: Duration::ZERO,
            fail_on_fetch_error: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source; unset variables keep their default
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let poll_interval = parse_var(&lookup, "STEWARD_POLL_INTERVAL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);
        let ready_timeout = parse_var(&lookup, "STEWARD_READY_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.ready_timeout);
        let fetch_error_backoff = parse_var(&lookup, "STEWARD_FETCH_ERROR_BACKOFF_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.fetch_error_backoff);
        let fail_on_fetch_error = parse_var(&lookup, "STEWARD_FAIL_ON_FETCH_ERROR")?
            .unwrap_or(defaults.fail_on_fetch_error);

        Ok(Config {
            poll_interval,
            ready_timeout,
            fetch_error_backoff,
            fail_on_fetch_error,
        })
    }

    pub fn wait_config(&self) -> WaitConfig {
        WaitConfig {
            poll_interval: self.poll_interval,
            error_backoff: self.fetch_error_backoff,
            fetch_error_policy: if self.fail_on_fetch_error {
                FetchErrorPolicy::Fail
            } else {
                FetchErrorPolicy::Retry
            },
            default_timeout: self.ready_timeout,
        }
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{} has invalid value {:?}", name, raw))
        })
        .transpose()
}
