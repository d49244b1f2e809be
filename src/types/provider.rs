// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Credentials and settings for one monitoring backend instance.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(group = "ingressmonitor.sphc.io", version = "v1alpha1", kind = "Provider")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpec {
    /// Type tag selecting the backend implementation
    #[serde(rename = "type")]
    pub provider_type: String,
    /// Backend specific settings
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, String>,
}

impl ProviderSpec {
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }
}
