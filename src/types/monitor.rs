// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Declares that every Ingress matching `selector` should be monitored with the
/// referenced template through the referenced provider.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(group = "ingressmonitor.sphc.io", version = "v1alpha1", kind = "Monitor")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSpec {
    #[serde(default)]
    pub selector: LabelSelector,
    pub provider: ObjectReference,
    pub template: ObjectReference,
}

/// Reference to an object in the Monitor's own namespace
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
pub struct ObjectReference {
    pub name: String,
}

impl ObjectReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
