// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Reusable monitor configuration shared by every IngressMonitor expanded from a
/// Monitor. The same shape is stored, fully resolved, on each IngressMonitor.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(group = "ingressmonitor.sphc.io", version = "v1alpha1", kind = "MonitorTemplate")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct MonitorTemplateSpec {
    /// Name pattern for the external monitor, e.g. `{{ResourceName}}-{{ResourceNamespace}}`.
    /// Holds the rendered name once resolved onto an IngressMonitor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub monitor_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpTemplate>,
    /// Seconds between checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_rate: Option<u32>,
    /// Seconds before a check is considered failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    /// Failed checks required before alerting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpTemplate {
    /// Path appended to the endpoint host, defaults to `/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Resolved URL, only set on IngressMonitors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_contain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_redirects: Option<bool>,
}

impl MonitorTemplateSpec {
    /// The resolved URL of an expanded template
    pub fn url(&self) -> Option<&str> {
        self.http.as_ref().and_then(|h| h.url.as_deref())
    }
}
