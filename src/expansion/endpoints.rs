// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::networking::v1::Ingress;

/// A single monitorable host exposed by an Ingress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub is_secure: bool,
}

/// One endpoint per rule host, in rule order. Rules without a host (catch-all rules)
/// have no address to monitor and are skipped, repeated hosts are reported once.
pub fn expand_endpoints(ingress: &Ingress) -> Vec<Endpoint> {
    let Some(spec) = ingress.spec.as_ref() else {
        return Vec::new();
    };

    let tls_hosts: Vec<&str> = spec
        .tls
        .iter()
        .flatten()
        .flat_map(|tls| tls.hosts.iter().flatten())
        .map(String::as_str)
        .collect();

    let mut endpoints: Vec<Endpoint> = Vec::new();
    for host in spec.rules.iter().flatten().filter_map(|r| r.host.as_deref()) {
        if host.is_empty() || endpoints.iter().any(|e| e.host == host) {
            continue;
        }
        endpoints.push(Endpoint {
            host: host.to_string(),
            is_secure: tls_hosts.iter().any(|tls| tls_host_covers(tls, host)),
        });
    }

    endpoints
}

/// Whether a TLS host entry covers `host`. A `*.` entry covers exactly one extra label.
fn tls_host_covers(tls_host: &str, host: &str) -> bool {
    if tls_host.eq_ignore_ascii_case(host) {
        return true;
    }

    match tls_host.strip_prefix("*.") {
        Some(suffix) => host
            .split_once('.')
            .is_some_and(|(label, rest)| !label.is_empty() && rest.eq_ignore_ascii_case(suffix)),
        None => false,
    }
}
