// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Access to the cluster resources the reconcilers read and write.

use crate::constants::{labels, OPERATOR_NAME};
use crate::error::{MonitorError, Result};
use crate::expansion::{monitor_label_value, SelectorScope};
use crate::types::{IngressMonitor, Monitor, MonitorTemplate, Provider};
use async_trait::async_trait;
use k8s_openapi::api::networking::v1::Ingress;
use kube::{
    api::{DeleteParams, ListParams, Patch, PatchParams},
    Api, Client, ResourceExt,
};
#[cfg(test)]
use mockall::automock;
use tracing::{debug, instrument};

/// Cluster store operations used by the reconcilers.
///
/// This trait allows mocking the Kubernetes API in reconciler tests while using
/// [`KubeStore`] in production.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// Fetch a Provider, `None` when it does not exist
    async fn get_provider(&self, namespace: &str, name: &str) -> Result<Option<Provider>>;

    /// Fetch a MonitorTemplate, `None` when it does not exist
    async fn get_template(&self, namespace: &str, name: &str) -> Result<Option<MonitorTemplate>>;

    async fn list_ingresses(&self, scope: &SelectorScope) -> Result<Vec<Ingress>>;

    async fn list_monitors(&self, scope: &SelectorScope) -> Result<Vec<Monitor>>;

    /// List the IngressMonitors expanded from the named Monitor
    async fn list_children(&self, namespace: &str, monitor: &str) -> Result<Vec<IngressMonitor>>;

    /// List every IngressMonitor carrying the monitor label
    async fn list_all_children(&self, scope: &SelectorScope) -> Result<Vec<IngressMonitor>>;

    /// Create or update an IngressMonitor's metadata and spec. Status is untouched.
    async fn apply_child(&self, child: &IngressMonitor) -> Result<()>;

    /// Delete an IngressMonitor. Deleting one that is already gone succeeds.
    async fn delete_child(&self, namespace: &str, name: &str) -> Result<()>;

    /// Record the external identifier in an IngressMonitor's status
    async fn patch_child_status(&self, namespace: &str, name: &str, id: &str) -> Result<()>;
}

/// [`ClusterStore`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn children(&self, namespace: &str) -> Api<IngressMonitor> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ClusterStore for KubeStore {
    async fn get_provider(&self, namespace: &str, name: &str) -> Result<Option<Provider>> {
        let providers: Api<Provider> = Api::namespaced(self.client.clone(), namespace);
        Ok(providers.get_opt(name).await?)
    }

    async fn get_template(&self, namespace: &str, name: &str) -> Result<Option<MonitorTemplate>> {
        let templates: Api<MonitorTemplate> = Api::namespaced(self.client.clone(), namespace);
        Ok(templates.get_opt(name).await?)
    }

    async fn list_ingresses(&self, scope: &SelectorScope) -> Result<Vec<Ingress>> {
        let ingresses: Api<Ingress> = scope.api(self.client.clone());
        Ok(ingresses.list(&ListParams::default()).await?.items)
    }

    async fn list_monitors(&self, scope: &SelectorScope) -> Result<Vec<Monitor>> {
        let monitors: Api<Monitor> = scope.api(self.client.clone());
        Ok(monitors.list(&ListParams::default()).await?.items)
    }

    async fn list_children(&self, namespace: &str, monitor: &str) -> Result<Vec<IngressMonitor>> {
        let lp = ListParams::default().labels(&format!("{}={}", labels::MONITOR, monitor_label_value(monitor)));
        Ok(self.children(namespace).list(&lp).await?.items)
    }

    async fn list_all_children(&self, scope: &SelectorScope) -> Result<Vec<IngressMonitor>> {
        let children: Api<IngressMonitor> = scope.api(self.client.clone());
        let lp = ListParams::default().labels(labels::MONITOR);
        Ok(children.list(&lp).await?.items)
    }

    #[instrument(skip(self, child), fields(child = %child.name_any()))]
    async fn apply_child(&self, child: &IngressMonitor) -> Result<()> {
        let namespace = child
            .namespace()
            .ok_or_else(|| MonitorError::MissingField("metadata.namespace".to_string()))?;

        // Server-side apply makes a repeated create of the same child a no-op
        let pp = PatchParams::apply(OPERATOR_NAME).force();
        self.children(&namespace)
            .patch(&child.name_any(), &pp, &Patch::Apply(child))
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_child(&self, namespace: &str, name: &str) -> Result<()> {
        match self.children(namespace).delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(err)) if err.code == 404 => {
                debug!("IngressMonitor {}/{} already deleted", namespace, name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn patch_child_status(&self, namespace: &str, name: &str, id: &str) -> Result<()> {
        let patch = serde_json::json!({
            "status": { "id": id }
        });

        self.children(namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;

        Ok(())
    }
}
