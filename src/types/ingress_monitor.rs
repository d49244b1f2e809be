// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{annotations, labels};
use crate::types::{MonitorTemplateSpec, ProviderSpec};
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

/// One fully resolved monitor for a single Ingress host. Created by the Monitor
/// controller, synced to the external backend by the IngressMonitor controller.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(group = "ingressmonitor.sphc.io", version = "v1alpha1", kind = "IngressMonitor")]
#[kube(namespaced)]
#[kube(status = "IngressMonitorStatus")]
#[kube(shortname = "im")]
#[serde(rename_all = "camelCase")]
pub struct IngressMonitorSpec {
    pub provider: NamespacedProvider,
    pub template: MonitorTemplateSpec,
}

/// Snapshot of the Provider the monitor was rendered with
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamespacedProvider {
    pub namespace: String,
    #[serde(flatten)]
    pub spec: ProviderSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressMonitorStatus {
    /// Identifier assigned by the provider, empty until the external monitor exists
    #[serde(default)]
    pub id: String,
}

impl IngressMonitor {
    /// The external monitor identifier, empty when nothing has been created yet
    pub fn external_id(&self) -> &str {
        self.status.as_ref().map(|s| s.id.as_str()).unwrap_or("")
    }

    pub fn provider_type(&self) -> &str {
        &self.spec.provider.spec.provider_type
    }

    /// Name of the Monitor this object was expanded from. Objects without the
    /// name annotation fall back to the monitor label.
    pub fn monitor_name(&self) -> Option<&str> {
        self.annotations()
            .get(annotations::MONITOR_NAME)
            .or_else(|| self.labels().get(labels::MONITOR))
            .map(String::as_str)
    }
}
