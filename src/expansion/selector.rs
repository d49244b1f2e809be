// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::error::{MonitorError, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::NamespaceResourceScope;
use kube::core::{Selector, SelectorExt};
use kube::{Api, Client, Resource, ResourceExt};

/// Set of namespaces a selector is evaluated against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorScope {
    Namespace(String),
    AllNamespaces,
}

impl SelectorScope {
    pub fn contains<K: ResourceExt>(&self, obj: &K) -> bool {
        match self {
            SelectorScope::Namespace(ns) => obj.namespace().as_deref() == Some(ns.as_str()),
            SelectorScope::AllNamespaces => true,
        }
    }

    /// Api handle restricted to this scope
    pub fn api<K>(&self, client: Client) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        match self {
            SelectorScope::Namespace(ns) => Api::namespaced(client, ns),
            SelectorScope::AllNamespaces => Api::all(client),
        }
    }
}

/// Return the candidates inside `scope` whose labels satisfy `selector`, sorted by
/// namespace and name.
///
/// A selector without any requirement matches nothing: an empty `Monitor.spec.selector`
/// would otherwise put a monitor on every Ingress in the namespace.
pub fn select_resources<K>(selector: &LabelSelector, scope: &SelectorScope, candidates: &[K]) -> Result<Vec<K>>
where
    K: ResourceExt + Clone,
{
    let selector = Selector::try_from(selector.clone())
        .map_err(|e| MonitorError::InvalidSelector(e.to_string()))?;

    if selector.selects_all() {
        return Ok(Vec::new());
    }

    let mut matched: Vec<K> = candidates
        .iter()
        .filter(|c| scope.contains(*c) && selector.matches(c.labels()))
        .cloned()
        .collect();

    matched.sort_by(|a, b| {
        (a.namespace(), a.name_any()).cmp(&(b.namespace(), b.name_any()))
    });

    Ok(matched)
}
