// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes reconcilers that react to watch events.

pub mod ingress_monitor;
pub mod monitor;

pub use ingress_monitor::IngressMonitorReconciler;
pub use monitor::MonitorReconciler;

use crate::config::Config;
use crate::error::{MonitorError, Result};
use crate::kubernetes::ClusterStore;
use crate::provider::ProviderRegistry;
use futures::StreamExt;
use kube::{Api, Resource};
use kube_runtime::watcher::{watcher, Config as WatcherConfig, Event};
use kube_runtime::{controller::Action, WatchStreamExt};
use serde::de::DeserializeOwned;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// State shared by both controllers
pub struct Context {
    pub store: Arc<dyn ClusterStore>,
    pub registry: Arc<ProviderRegistry>,
    pub config: Config,
}

impl Context {
    pub fn new(store: Arc<dyn ClusterStore>, registry: Arc<ProviderRegistry>, config: Config) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }
}

/// Run `fut`, failing with [`MonitorError::Timeout`] once `timeout` has passed
pub(crate) async fn with_deadline<T, F>(timeout: Duration, what: impl Display, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(res) => res,
        Err(_) => Err(MonitorError::Timeout(timeout, what.to_string())),
    }
}

/// Requeue policy shared by both controllers
pub(crate) fn error_action(error: &MonitorError, config: &Config) -> Action {
    match error {
        MonitorError::ProviderNotFound(_) => Action::requeue(config.provider_not_found_requeue),
        e if !e.is_retryable() => Action::await_change(),
        _ => Action::requeue(config.error_requeue),
    }
}

/// Call `on_delete` with the last known state of every deleted object.
///
/// The controller runtime only hands out objects that still exist, so deletions are
/// consumed from a separate watch. Handlers run inline and are not retried.
pub(crate) async fn for_each_deletion<K, F, Fut>(api: Api<K>, on_delete: F) -> anyhow::Result<()>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + 'static,
    F: Fn(K) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut events = watcher(api, WatcherConfig::default())
        .default_backoff()
        .boxed();

    while let Some(event) = events.next().await {
        match event {
            Ok(Event::Delete(obj)) => on_delete(obj).await,
            Ok(_) => {}
            Err(e) => warn!("Deletion watch error: {}", e),
        }
    }

    Ok(())
}
