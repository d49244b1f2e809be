// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{annotations, labels};
use crate::error::{MonitorError, Result};
use crate::expansion::{expand_endpoints, render_template, select_resources, RenderContext, SelectorScope};
use crate::types::{IngressMonitor, IngressMonitorSpec, Monitor, MonitorTemplate, NamespacedProvider, Provider};
use k8s_openapi::api::networking::v1::Ingress;
use kube::{Resource, ResourceExt};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

/// Longest Monitor name prefix kept in a child name
const MAX_NAME_PREFIX_LEN: usize = 50;
/// Bytes of the digest appended to shortened names
const NAME_HASH_BYTES: usize = 5;
/// Longest value Kubernetes accepts for a label
const MAX_LABEL_VALUE_LEN: usize = 63;

/// Changes needed to move the actual children of a Monitor to the desired set
#[derive(Debug, Default, Clone)]
pub struct Plan {
    pub create: Vec<IngressMonitor>,
    /// Children whose key is unchanged but whose rendered spec or owner moved
    pub update: Vec<IngressMonitor>,
    /// Names of children that are no longer desired
    pub delete: Vec<String>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// Object name of the IngressMonitor for one endpoint. Only depends on the Monitor
/// name and the endpoint's identity, so it survives template and provider edits.
pub fn child_name(monitor: &str, namespace: &str, resource: &str, host: &str) -> String {
    let hash = short_digest(&format!("{}/{}/{}/{}", namespace, monitor, resource, host));
    format!("{}-{}", name_prefix(monitor, MAX_NAME_PREFIX_LEN), hash)
}

/// Value of the monitor label for `monitor`. Names longer than a label value allows
/// are shortened and suffixed with a digest of the full name.
pub fn monitor_label_value(monitor: &str) -> String {
    if monitor.len() <= MAX_LABEL_VALUE_LEN {
        return monitor.to_string();
    }

    let prefix_len = MAX_LABEL_VALUE_LEN - 1 - NAME_HASH_BYTES * 2;
    format!("{}-{}", name_prefix(monitor, prefix_len), short_digest(monitor))
}

fn name_prefix(name: &str, max_len: usize) -> &str {
    let end = name
        .char_indices()
        .nth(max_len)
        .map(|(i, _)| i)
        .unwrap_or(name.len());
    name[..end].trim_end_matches(|c: char| c == '-' || c == '.')
}

fn short_digest(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .take(NAME_HASH_BYTES)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Compute the IngressMonitors `monitor` should own given the Ingresses in its
/// namespace. The result is sorted by object name and only depends on its inputs.
pub fn compute_desired(
    monitor: &Monitor,
    ingresses: &[Ingress],
    provider: &Provider,
    template: &MonitorTemplate,
) -> Result<Vec<IngressMonitor>> {
    let namespace = monitor
        .namespace()
        .ok_or_else(|| MonitorError::MissingField("metadata.namespace".to_string()))?;
    let monitor_name = monitor.name_any();

    let matched = select_resources(
        &monitor.spec.selector,
        &SelectorScope::Namespace(namespace.clone()),
        ingresses,
    )?;

    let provider_snapshot = NamespacedProvider {
        namespace: provider.namespace().unwrap_or_else(|| namespace.clone()),
        spec: provider.spec.clone(),
    };

    let mut desired = Vec::new();
    for ingress in &matched {
        let ingress_name = ingress.name_any();
        let owner = ingress.controller_owner_ref(&()).ok_or_else(|| {
            MonitorError::MissingField(format!("metadata.uid of Ingress {}/{}", namespace, ingress_name))
        })?;

        let ctx = RenderContext {
            monitor_name: &monitor_name,
            resource_name: &ingress_name,
            resource_namespace: &namespace,
        };

        for endpoint in expand_endpoints(ingress) {
            let spec = IngressMonitorSpec {
                provider: provider_snapshot.clone(),
                template: render_template(&template.spec, &ctx, &endpoint)?,
            };

            let name = child_name(&monitor_name, &namespace, &ingress_name, &endpoint.host);
            let mut child = IngressMonitor::new(&name, spec);
            child.metadata.namespace = Some(namespace.clone());
            child.metadata.labels = Some(BTreeMap::from([(
                labels::MONITOR.to_string(),
                monitor_label_value(&monitor_name),
            )]));
            child.metadata.annotations = Some(BTreeMap::from([(
                annotations::MONITOR_NAME.to_string(),
                monitor_name.clone(),
            )]));
            child.metadata.owner_references = Some(vec![owner.clone()]);

            desired.push(child);
        }
    }

    desired.sort_by_key(|c| c.name_any());
    desired.dedup_by_key(|c| c.name_any());

    Ok(desired)
}

/// Diff desired against actual children by object name. Children present on both
/// sides with the same spec and owner are left alone so their status survives.
pub fn diff(desired: &[IngressMonitor], actual: &[IngressMonitor]) -> Plan {
    let actual_by_name: BTreeMap<String, &IngressMonitor> =
        actual.iter().map(|a| (a.name_any(), a)).collect();
    let desired_names: BTreeSet<String> = desired.iter().map(|d| d.name_any()).collect();

    let mut plan = Plan::default();

    for child in desired {
        match actual_by_name.get(&child.name_any()) {
            None => plan.create.push(child.clone()),
            Some(existing) if needs_update(child, existing) => plan.update.push(child.clone()),
            Some(_) => {}
        }
    }

    plan.delete = actual_by_name
        .keys()
        .filter(|name| !desired_names.contains(*name))
        .cloned()
        .collect();

    plan
}

fn needs_update(desired: &IngressMonitor, actual: &IngressMonitor) -> bool {
    desired.spec != actual.spec
        || owner_uids(desired) != owner_uids(actual)
        || desired.monitor_name() != actual.monitor_name()
        || desired.labels().get(labels::MONITOR) != actual.labels().get(labels::MONITOR)
}

fn owner_uids(im: &IngressMonitor) -> Vec<&str> {
    im.owner_references().iter().map(|o| o.uid.as_str()).collect()
}
