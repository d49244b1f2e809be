// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context as _, Result};
use kube::Client;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ingress_monitor::config::Config;
use ingress_monitor::kubernetes::{wait_for_crds, KubeStore};
use ingress_monitor::provider::{logging, LogProvider, ProviderRegistry};
use ingress_monitor::reconcilers::{Context, IngressMonitorReconciler, MonitorReconciler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting ingress-monitor operator");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: watch_namespace={}, call_timeout={:?}, resync={:?}",
        config.watch_namespace.as_deref().unwrap_or("<all>"),
        config.call_timeout,
        config.resync
    );

    // Create Kubernetes client
    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    info!("Connected to Kubernetes cluster");

    info!("Waiting for ingress-monitor CRDs to become available...");
    wait_for_crds(&client).await?;

    let mut registry = ProviderRegistry::new();
    registry.register(logging::PROVIDER_TYPE, LogProvider::from_spec)?;
    info!("Provider registry ready: {:?}", registry);

    let ctx = Arc::new(Context::new(
        Arc::new(KubeStore::new(client.clone())),
        Arc::new(registry),
        config,
    ));

    let monitor_reconciler = MonitorReconciler::new(client.clone(), ctx.clone());
    let ingress_monitor_reconciler = IngressMonitorReconciler::new(client, ctx);

    info!("Starting reconcilers...");

    // Run both controllers, their deletion watchers and the orphan sweep concurrently
    tokio::try_join!(
        monitor_reconciler.clone().run(),
        monitor_reconciler.clone().watch_deletions(),
        monitor_reconciler.sweep_orphans(),
        ingress_monitor_reconciler.clone().run(),
        ingress_monitor_reconciler.watch_deletions()
    )?;

    // This should never be reached as reconcilers run forever
    warn!("All reconcilers stopped unexpectedly");
    Ok(())
}
