// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::expansion::SelectorScope;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ERROR_REQUEUE_SECS: u64 = 60;
const DEFAULT_PROVIDER_NOT_FOUND_REQUEUE_SECS: u64 = 300;
const DEFAULT_RESYNC_SECS: u64 = 300;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace to watch; `None` watches every namespace
    pub watch_namespace: Option<String>,
    /// Deadline applied to each provider and cluster store call
    pub call_timeout: Duration,
    pub error_requeue: Duration,
    /// Requeue interval after a provider type lookup miss, which only resolves once
    /// the backend is registered
    pub provider_not_found_requeue: Duration,
    /// Interval at which converged objects are reconciled again and orphaned
    /// IngressMonitors are swept
    pub resync: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            error_requeue: Duration::from_secs(DEFAULT_ERROR_REQUEUE_SECS),
            provider_not_found_requeue: Duration::from_secs(DEFAULT_PROVIDER_NOT_FOUND_REQUEUE_SECS),
            resync: Duration::from_secs(DEFAULT_RESYNC_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let watch_namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.is_empty());

        Ok(Config {
            watch_namespace,
            call_timeout: secs(&lookup, "CALL_TIMEOUT_SECS", DEFAULT_CALL_TIMEOUT_SECS)?,
            error_requeue: secs(&lookup, "ERROR_REQUEUE_SECS", DEFAULT_ERROR_REQUEUE_SECS)?,
            provider_not_found_requeue: secs(
                &lookup,
                "PROVIDER_NOT_FOUND_REQUEUE_SECS",
                DEFAULT_PROVIDER_NOT_FOUND_REQUEUE_SECS,
            )?,
            resync: secs(&lookup, "RESYNC_SECS", DEFAULT_RESYNC_SECS)?,
        })
    }

    /// Scope every watch is restricted to
    pub fn scope(&self) -> SelectorScope {
        match &self.watch_namespace {
            Some(ns) => SelectorScope::Namespace(ns.clone()),
            None => SelectorScope::AllNamespaces,
        }
    }
}

fn secs(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<Duration> {
    match lookup(key) {
        Some(raw) => {
            let value: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds, got '{}'", key, raw))?;
            Ok(Duration::from_secs(value))
        }
        None => Ok(Duration::from_secs(default)),
    }
}
