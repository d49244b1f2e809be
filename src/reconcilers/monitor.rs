// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Monitor reconciler - expands Monitors into one IngressMonitor per matched Ingress host.

use crate::error::{MonitorError, Result};
use crate::expansion::{compute_desired, diff, SelectorScope};
use crate::reconcilers::{error_action, for_each_deletion, with_deadline, Context};
use crate::types::{IngressMonitor, Monitor, MonitorTemplate, Provider};
use futures::StreamExt;
use k8s_openapi::api::networking::v1::Ingress;
use kube::{Api, Client, ResourceExt};
use kube_runtime::watcher::Config as WatcherConfig;
use kube_runtime::{controller::Action, reflector::ObjectRef, Controller};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

#[derive(Clone)]
pub struct MonitorReconciler {
    client: Client,
    ctx: Arc<Context>,
}

impl MonitorReconciler {
    pub fn new(client: Client, ctx: Arc<Context>) -> Self {
        Self { client, ctx }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let scope = self.ctx.config.scope();
        let monitors: Api<Monitor> = scope.api(self.client.clone());
        let controller = Controller::new(monitors, WatcherConfig::default());

        let by_ingress = controller.store();
        let by_provider = controller.store();
        let by_template = controller.store();

        controller
            .watches(
                scope.api::<Ingress>(self.client.clone()),
                WatcherConfig::default(),
                move |ingress| {
                    let monitors = by_ingress.state();
                    monitors_in_namespace(monitors.iter().map(Arc::as_ref), ingress.namespace().as_deref())
                },
            )
            .watches(
                scope.api::<Provider>(self.client.clone()),
                WatcherConfig::default(),
                move |provider| {
                    let monitors = by_provider.state();
                    monitors_referencing(monitors.iter().map(Arc::as_ref), &provider, |m| m.spec.provider.name.as_str())
                },
            )
            .watches(
                scope.api::<MonitorTemplate>(self.client.clone()),
                WatcherConfig::default(),
                move |template| {
                    let monitors = by_template.state();
                    monitors_referencing(monitors.iter().map(Arc::as_ref), &template, |m| m.spec.template.name.as_str())
                },
            )
            .watches(
                scope.api::<IngressMonitor>(self.client.clone()),
                WatcherConfig::default(),
                |im| owning_monitor(&im),
            )
            .run(reconcile, error_policy, self.ctx)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled monitor: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }

    /// Remove the children of every deleted Monitor
    pub async fn watch_deletions(self) -> anyhow::Result<()> {
        let monitors: Api<Monitor> = self.ctx.config.scope().api(self.client.clone());
        let ctx = self.ctx;

        for_each_deletion(monitors, |monitor| {
            let ctx = ctx.clone();
            async move { delete_children(&monitor, &ctx).await }
        })
        .await
    }

    /// Periodically delete IngressMonitors whose Monitor no longer exists. Covers
    /// deletions missed while the operator was down and children re-applied by a
    /// reconcile that raced the deletion.
    pub async fn sweep_orphans(self) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(self.ctx.config.resync.max(Duration::from_secs(1)));

        loop {
            ticker.tick().await;
            match delete_orphans(&self.ctx).await {
                Ok(0) => debug!("No orphaned IngressMonitors found"),
                Ok(n) => info!("Removed {} orphaned IngressMonitors", n),
                Err(e) => warn!("Orphaned IngressMonitor sweep failed: {}", e),
            }
        }
    }
}

/// The Monitor an IngressMonitor was expanded from
fn owning_monitor(im: &IngressMonitor) -> Option<ObjectRef<Monitor>> {
    let namespace = im.namespace()?;
    im.monitor_name()
        .map(|name| ObjectRef::new(name).within(&namespace))
}

/// Every Monitor in the Ingress' namespace. The Ingress' previous labels are unknown,
/// so any of them may have selected it before this change.
fn monitors_in_namespace<'a>(
    monitors: impl Iterator<Item = &'a Monitor>,
    namespace: Option<&str>,
) -> Vec<ObjectRef<Monitor>> {
    monitors
        .filter(|m| m.namespace().as_deref() == namespace)
        .map(ObjectRef::from_obj)
        .collect()
}

/// Monitors in the same namespace whose `reference` names `obj`
fn monitors_referencing<'a, K: ResourceExt>(
    monitors: impl Iterator<Item = &'a Monitor>,
    obj: &K,
    reference: impl Fn(&Monitor) -> &str,
) -> Vec<ObjectRef<Monitor>> {
    let name = obj.name_any();
    let namespace = obj.namespace();

    monitors
        .filter(|m| m.namespace() == namespace && reference(m) == name)
        .map(ObjectRef::from_obj)
        .collect()
}

#[instrument(skip(monitor, ctx), fields(monitor = %monitor.name_any(), namespace = %monitor.namespace().unwrap_or_default()))]
async fn reconcile(monitor: Arc<Monitor>, ctx: Arc<Context>) -> Result<Action> {
    let namespace = monitor
        .namespace()
        .ok_or_else(|| MonitorError::MissingField("metadata.namespace".to_string()))?;
    let name = monitor.name_any();
    let timeout = ctx.config.call_timeout;

    debug!("Reconciling monitor: {}/{}", namespace, name);

    let provider_name = &monitor.spec.provider.name;
    let provider = with_deadline(
        timeout,
        format!("Provider {}/{}", namespace, provider_name),
        ctx.store.get_provider(&namespace, provider_name),
    )
    .await?
    .ok_or_else(|| MonitorError::ResourceNotFound {
        kind: "Provider",
        namespace: namespace.clone(),
        name: provider_name.clone(),
    })?;

    let template_name = &monitor.spec.template.name;
    let template = with_deadline(
        timeout,
        format!("MonitorTemplate {}/{}", namespace, template_name),
        ctx.store.get_template(&namespace, template_name),
    )
    .await?
    .ok_or_else(|| MonitorError::ResourceNotFound {
        kind: "MonitorTemplate",
        namespace: namespace.clone(),
        name: template_name.clone(),
    })?;

    let ingresses = with_deadline(
        timeout,
        format!("Ingresses in {}", namespace),
        ctx.store.list_ingresses(&SelectorScope::Namespace(namespace.clone())),
    )
    .await?;

    let desired = compute_desired(&monitor, &ingresses, &provider, &template)?;
    let actual = with_deadline(
        timeout,
        format!("IngressMonitors of {}/{}", namespace, name),
        ctx.store.list_children(&namespace, &name),
    )
    .await?;

    let plan = diff(&desired, &actual);
    if plan.is_empty() {
        debug!("Monitor {}/{} is up to date with {} IngressMonitors", namespace, name, desired.len());
        return Ok(Action::requeue(ctx.config.resync));
    }

    for child in plan.create.iter().chain(plan.update.iter()) {
        let child_name = child.name_any();
        with_deadline(
            timeout,
            format!("apply IngressMonitor {}/{}", namespace, child_name),
            ctx.store.apply_child(child),
        )
        .await?;
        debug!("Applied IngressMonitor {}/{}", namespace, child_name);
    }

    for child_name in &plan.delete {
        with_deadline(
            timeout,
            format!("delete IngressMonitor {}/{}", namespace, child_name),
            ctx.store.delete_child(&namespace, child_name),
        )
        .await?;
        debug!("Deleted IngressMonitor {}/{}", namespace, child_name);
    }

    info!(
        "Monitor {}/{}: {} IngressMonitors created, {} updated, {} deleted",
        namespace,
        name,
        plan.create.len(),
        plan.update.len(),
        plan.delete.len()
    );

    Ok(Action::requeue(ctx.config.resync))
}

fn error_policy(monitor: Arc<Monitor>, error: &MonitorError, ctx: Arc<Context>) -> Action {
    error!(
        "Reconciliation error for monitor {}/{}: {}",
        monitor.namespace().unwrap_or_default(),
        monitor.name_any(),
        error
    );
    error_action(error, &ctx.config)
}

/// Best effort: failures are logged and the remaining children are still deleted.
async fn delete_children(monitor: &Monitor, ctx: &Context) {
    let Some(namespace) = monitor.namespace() else {
        return;
    };
    let name = monitor.name_any();
    let timeout = ctx.config.call_timeout;

    let children = match with_deadline(
        timeout,
        format!("IngressMonitors of {}/{}", namespace, name),
        ctx.store.list_children(&namespace, &name),
    )
    .await
    {
        Ok(children) => children,
        Err(e) => {
            warn!("Failed to list IngressMonitors of deleted monitor {}/{}: {}", namespace, name, e);
            return;
        }
    };

    for child in &children {
        let child_name = child.name_any();
        match with_deadline(
            timeout,
            format!("delete IngressMonitor {}/{}", namespace, child_name),
            ctx.store.delete_child(&namespace, &child_name),
        )
        .await
        {
            Ok(()) => debug!("Deleted IngressMonitor {}/{}", namespace, child_name),
            Err(e) => warn!(
                "Failed to delete IngressMonitor {}/{} of deleted monitor {}: {}",
                namespace, child_name, name, e
            ),
        }
    }

    info!("Monitor {}/{} deleted, removed {} IngressMonitors", namespace, name, children.len());
}

/// Delete labelled IngressMonitors whose Monitor is gone and return how many were removed
async fn delete_orphans(ctx: &Context) -> Result<usize> {
    let scope = ctx.config.scope();
    let timeout = ctx.config.call_timeout;

    // Children first: a Monitor created after this list is still in the next one
    let children = with_deadline(timeout, "labelled IngressMonitors", ctx.store.list_all_children(&scope)).await?;
    let monitors = with_deadline(timeout, "Monitors", ctx.store.list_monitors(&scope)).await?;

    let existing: HashSet<(String, String)> = monitors
        .iter()
        .map(|m| (m.namespace().unwrap_or_default(), m.name_any()))
        .collect();

    let mut deleted = 0;
    for child in &children {
        let (Some(namespace), Some(monitor)) = (child.namespace(), child.monitor_name()) else {
            continue;
        };
        if existing.contains(&(namespace.clone(), monitor.to_string())) {
            continue;
        }

        let child_name = child.name_any();
        match with_deadline(
            timeout,
            format!("delete IngressMonitor {}/{}", namespace, child_name),
            ctx.store.delete_child(&namespace, &child_name),
        )
        .await
        {
            Ok(()) => {
                info!("Deleted IngressMonitor {}/{} of missing monitor {}", namespace, child_name, monitor);
                deleted += 1;
            }
            Err(e) => warn!("Failed to delete orphaned IngressMonitor {}/{}: {}", namespace, child_name, e),
        }
    }

    Ok(deleted)
}
