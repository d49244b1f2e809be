// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mock Kubernetes API, a counting fake provider and fixtures.

use crate::constants::{annotations, labels};
use crate::provider::{MonitorProvider, ProviderError};
use crate::types::{
    HttpTemplate, IngressMonitor, IngressMonitorSpec, IngressMonitorStatus, Monitor, MonitorSpec,
    MonitorTemplate, MonitorTemplateSpec, NamespacedProvider, ObjectReference, Provider, ProviderSpec,
};
use async_trait::async_trait;
use http::{Request, Response};
use k8s_openapi::api::networking::v1::{Ingress, IngressRule, IngressSpec, IngressTLS};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::Client;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths
/// and records every request it receives.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.respond("GET", path, status, body)
    }

    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.respond("PATCH", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.respond("DELETE", path, status, body)
    }

    fn respond(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Requests received so far as (method, path and query)
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let path_and_query = req
            .uri()
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_else(|| path.clone());

        self.requests.lock().unwrap().push((method.clone(), path_and_query));
        let (status, body) = self
            .find_response(&method, &path)
            .unwrap_or_else(|| (404, not_found_json(&path)));

        Box::pin(async move {
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a 404 not found response
pub fn not_found_json(path: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} not found", path),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// Create a list response for the given items
pub fn list_json<K: Serialize>(kind: &str, items: &[K]) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": kind,
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}

type CreateFn = Box<dyn Fn(&MonitorTemplateSpec) -> Result<String, ProviderError> + Send + Sync>;
type UpdateFn = Box<dyn Fn(&str, &MonitorTemplateSpec) -> Result<String, ProviderError> + Send + Sync>;
type DeleteFn = Box<dyn Fn(&str) -> Result<(), ProviderError> + Send + Sync>;

/// Provider whose behaviour is set per test and which counts its calls.
/// Calls without a configured behaviour fail.
#[derive(Default)]
pub struct SimpleProvider {
    create_fn: Option<CreateFn>,
    update_fn: Option<UpdateFn>,
    delete_fn: Option<DeleteFn>,
    create_count: AtomicUsize,
    update_count: AtomicUsize,
    delete_count: AtomicUsize,
    ids: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl SimpleProvider {
    pub fn on_create(
        mut self,
        f: impl Fn(&MonitorTemplateSpec) -> Result<String, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        self.create_fn = Some(Box::new(f));
        self
    }

    pub fn on_update(
        mut self,
        f: impl Fn(&str, &MonitorTemplateSpec) -> Result<String, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        self.update_fn = Some(Box::new(f));
        self
    }

    pub fn on_delete(mut self, f: impl Fn(&str) -> Result<(), ProviderError> + Send + Sync + 'static) -> Self {
        self.delete_fn = Some(Box::new(f));
        self
    }

    /// Sleep this long before answering any call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn wait(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn create_count(&self) -> usize {
        self.create_count.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.update_count.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.delete_count.load(Ordering::SeqCst)
    }

    /// Identifiers passed to update and delete, in call order
    pub fn ids(&self) -> Vec<String> {
        self.ids.lock().unwrap().clone()
    }

    /// Registry constructor handing out this instance
    pub fn factory(
        self: &Arc<Self>,
    ) -> impl Fn(&ProviderSpec) -> Result<Arc<dyn MonitorProvider>, ProviderError> + Send + Sync + 'static {
        let provider = Arc::clone(self);
        move |_: &ProviderSpec| Ok(provider.clone() as Arc<dyn MonitorProvider>)
    }
}

#[async_trait]
impl MonitorProvider for SimpleProvider {
    async fn create(&self, template: &MonitorTemplateSpec) -> Result<String, ProviderError> {
        self.create_count.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        match &self.create_fn {
            Some(f) => f(template),
            None => Err(ProviderError::new("unexpected create")),
        }
    }

    async fn update(&self, id: &str, template: &MonitorTemplateSpec) -> Result<String, ProviderError> {
        self.update_count.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        self.ids.lock().unwrap().push(id.to_string());
        match &self.update_fn {
            Some(f) => f(id, template),
            None => Err(ProviderError::new("unexpected update")),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        self.delete_count.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        self.ids.lock().unwrap().push(id.to_string());
        match &self.delete_fn {
            Some(f) => f(id),
            None => Err(ProviderError::new("unexpected delete")),
        }
    }
}

fn string_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// An Ingress with uid `uid-<name>`, one rule per host and a single TLS entry
/// covering `tls_hosts`. Empty hosts become rules without a host.
pub fn make_ingress(
    name: &str,
    namespace: &str,
    labels: &[(&str, &str)],
    hosts: &[&str],
    tls_hosts: &[&str],
) -> Ingress {
    let rules = hosts
        .iter()
        .map(|h| IngressRule {
            host: (!h.is_empty()).then(|| h.to_string()),
            ..Default::default()
        })
        .collect();

    let tls = (!tls_hosts.is_empty()).then(|| {
        vec![IngressTLS {
            hosts: Some(tls_hosts.iter().map(|h| h.to_string()).collect()),
            secret_name: None,
        }]
    });

    Ingress {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(format!("uid-{}", name)),
            labels: Some(string_map(labels)),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(rules),
            tls,
            ..Default::default()
        }),
        status: None,
    }
}

/// A Monitor referencing `test-provider` and `test-template`
pub fn make_monitor(name: &str, namespace: &str, match_labels: &[(&str, &str)]) -> Monitor {
    let mut monitor = Monitor::new(
        name,
        MonitorSpec {
            selector: LabelSelector {
                match_labels: Some(string_map(match_labels)),
                match_expressions: None,
            },
            provider: ObjectReference::new("test-provider"),
            template: ObjectReference::new("test-template"),
        },
    );
    monitor.metadata.namespace = Some(namespace.to_string());
    monitor
}

pub fn make_provider(name: &str, namespace: &str, provider_type: &str) -> Provider {
    let mut provider = Provider::new(
        name,
        ProviderSpec {
            provider_type: provider_type.to_string(),
            config: BTreeMap::new(),
        },
    );
    provider.metadata.namespace = Some(namespace.to_string());
    provider
}

/// An HTTP MonitorTemplate
pub fn make_template(name: &str, namespace: &str, name_pattern: Option<&str>, path: Option<&str>) -> MonitorTemplate {
    let mut template = MonitorTemplate::new(
        name,
        MonitorTemplateSpec {
            name: name_pattern.map(str::to_string),
            monitor_type: "HTTP".to_string(),
            http: Some(HttpTemplate {
                endpoint: path.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        },
    );
    template.metadata.namespace = Some(namespace.to_string());
    template
}

/// An IngressMonitor expanded from `test-monitor`; an empty `id` leaves the status unset
pub fn make_ingress_monitor(name: &str, namespace: &str, provider_type: &str, id: &str) -> IngressMonitor {
    let mut im = IngressMonitor::new(
        name,
        IngressMonitorSpec {
            provider: NamespacedProvider {
                namespace: namespace.to_string(),
                spec: ProviderSpec {
                    provider_type: provider_type.to_string(),
                    config: BTreeMap::new(),
                },
            },
            template: MonitorTemplateSpec {
                name: Some("test-monitor-test-ingress-a.example.com".to_string()),
                monitor_type: "HTTP".to_string(),
                http: Some(HttpTemplate {
                    url: Some("http://a.example.com/".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        },
    );
    im.metadata.namespace = Some(namespace.to_string());
    im.metadata.labels = Some(string_map(&[(labels::MONITOR, "test-monitor")]));
    im.metadata.annotations = Some(string_map(&[(annotations::MONITOR_NAME, "test-monitor")]));
    if !id.is_empty() {
        im.status = Some(IngressMonitorStatus { id: id.to_string() });
    }
    im
}
