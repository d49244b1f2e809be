// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! IngressMonitor reconciler - keeps the external monitor in step with each IngressMonitor.

use crate::error::{MonitorError, Result};
use crate::reconcilers::{error_action, for_each_deletion, with_deadline, Context};
use crate::types::IngressMonitor;
use futures::{StreamExt, TryFutureExt};
use kube::{Api, Client, ResourceExt};
use kube_runtime::watcher::Config as WatcherConfig;
use kube_runtime::{controller::Action, Controller};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

#[derive(Clone)]
pub struct IngressMonitorReconciler {
    client: Client,
    ctx: Arc<Context>,
}

impl IngressMonitorReconciler {
    pub fn new(client: Client, ctx: Arc<Context>) -> Self {
        Self { client, ctx }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let ingress_monitors: Api<IngressMonitor> = self.ctx.config.scope().api(self.client.clone());

        Controller::new(ingress_monitors, WatcherConfig::default())
            .run(reconcile, error_policy, self.ctx)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled ingress monitor: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }

    /// Remove the external monitor of every deleted IngressMonitor
    pub async fn watch_deletions(self) -> anyhow::Result<()> {
        let ingress_monitors: Api<IngressMonitor> = self.ctx.config.scope().api(self.client.clone());
        let ctx = self.ctx;

        for_each_deletion(ingress_monitors, |im| {
            let ctx = ctx.clone();
            async move { delete_external(&im, &ctx).await }
        })
        .await
    }
}

#[instrument(skip(im, ctx), fields(ingress_monitor = %im.name_any(), namespace = %im.namespace().unwrap_or_default()))]
async fn reconcile(im: Arc<IngressMonitor>, ctx: Arc<Context>) -> Result<Action> {
    let namespace = im
        .namespace()
        .ok_or_else(|| MonitorError::MissingField("metadata.namespace".to_string()))?;
    let name = im.name_any();
    let timeout = ctx.config.call_timeout;

    let provider = ctx.registry.resolve(im.provider_type(), &im.spec.provider.spec)?;
    let template = &im.spec.template;

    let id = match im.external_id() {
        "" => {
            let created = with_deadline(
                timeout,
                format!("{} create for {}/{}", im.provider_type(), namespace, name),
                provider.create(template).map_err(MonitorError::from),
            )
            .await;
            let id = match created {
                Ok(id) => id,
                Err(e @ MonitorError::Timeout(..)) => {
                    // The retry cannot know whether the backend finished the abandoned call
                    warn!(
                        "Create for {}/{} timed out, the backend may hold an untracked external monitor",
                        namespace, name
                    );
                    return Err(e);
                }
                Err(e) => return Err(e),
            };
            info!("Created external monitor {} for {}/{}", id, namespace, name);
            id
        }
        existing => {
            let id = with_deadline(
                timeout,
                format!("{} update of {}", im.provider_type(), existing),
                provider.update(existing, template).map_err(MonitorError::from),
            )
            .await?;
            debug!("Updated external monitor {} for {}/{}", id, namespace, name);
            id
        }
    };

    // Patching an unchanged id is a no-op and does not trigger another reconcile
    with_deadline(
        timeout,
        format!("status of IngressMonitor {}/{}", namespace, name),
        ctx.store.patch_child_status(&namespace, &name, &id),
    )
    .await?;

    // Periodic updates push the desired state again after drift on the backend
    Ok(Action::requeue(ctx.config.resync))
}

fn error_policy(im: Arc<IngressMonitor>, error: &MonitorError, ctx: Arc<Context>) -> Action {
    error!(
        "Reconciliation error for ingress monitor {}/{}: {}",
        im.namespace().unwrap_or_default(),
        im.name_any(),
        error
    );
    error_action(error, &ctx.config)
}

/// Delete the external monitor recorded in the status. Failures are logged and
/// dropped since the object is already gone.
async fn delete_external(im: &IngressMonitor, ctx: &Context) {
    let namespace = im.namespace().unwrap_or_default();
    let name = im.name_any();

    let id = im.external_id();
    if id.is_empty() {
        debug!("IngressMonitor {}/{} has no external monitor, nothing to delete", namespace, name);
        return;
    }

    let provider = match ctx.registry.resolve(im.provider_type(), &im.spec.provider.spec) {
        Ok(provider) => provider,
        Err(e) => {
            warn!("Cannot delete external monitor {} of {}/{}: {}", id, namespace, name, e);
            return;
        }
    };

    match with_deadline(
        ctx.config.call_timeout,
        format!("{} delete of {}", im.provider_type(), id),
        provider.delete(id).map_err(MonitorError::from),
    )
    .await
    {
        Ok(()) => info!("Deleted external monitor {} of {}/{}", id, namespace, name),
        Err(e) => warn!("Failed to delete external monitor {} of {}/{}: {}", id, namespace, name, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::kubernetes::store::MockClusterStore;
    use crate::provider::{ProviderError, ProviderRegistry};
    use crate::test_utils::{make_ingress_monitor, SimpleProvider};
    use std::time::Duration;

    fn make_context(store: MockClusterStore, provider: &Arc<SimpleProvider>) -> Arc<Context> {
        let mut registry = ProviderRegistry::new();
        registry.register("simple", provider.factory()).unwrap();
        Arc::new(Context::new(Arc::new(store), Arc::new(registry), Config::default()))
    }

    fn ctx_resync() -> Duration {
        Config::default().resync
    }

    fn expect_status(store: &mut MockClusterStore, expected: &'static str) {
        store
            .expect_patch_child_status()
            .withf(move |ns, name, id| ns == "testing" && name == "test-im" && id == expected)
            .times(1)
            .returning(|_, _, _| Ok(()));
    }

    #[tokio::test]
    async fn test_unregistered_provider_type() {
        let provider = Arc::new(SimpleProvider::default());
        let mut store = MockClusterStore::new();
        store.expect_patch_child_status().never();
        let im = make_ingress_monitor("test-im", "testing", "test", "");

        let err = reconcile(Arc::new(im), make_context(store, &provider))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error fetching provider 'test': the specified provider can't be found"
        );
        assert_eq!(provider.create_count(), 0);
        assert_eq!(provider.update_count(), 0);
    }

    #[tokio::test]
    async fn test_create_failure_leaves_status_untouched() {
        let provider = Arc::new(SimpleProvider::default().on_create(|_| Err(ProviderError::new("my-provider-error"))));
        let mut store = MockClusterStore::new();
        store.expect_patch_child_status().never();
        let im = make_ingress_monitor("test-im", "testing", "simple", "");

        let err = reconcile(Arc::new(im), make_context(store, &provider))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "my-provider-error");
        assert_eq!(provider.create_count(), 1);
    }

    #[tokio::test]
    async fn test_create_stores_identifier() {
        let provider = Arc::new(SimpleProvider::default().on_create(|_| Ok("1234".to_string())));
        let mut store = MockClusterStore::new();
        expect_status(&mut store, "1234");
        let im = make_ingress_monitor("test-im", "testing", "simple", "");

        let action = reconcile(Arc::new(im), make_context(store, &provider))
            .await
            .unwrap();

        assert_eq!(action, Action::requeue(ctx_resync()));
        assert_eq!(provider.create_count(), 1);
        assert_eq!(provider.update_count(), 0);
    }

    #[tokio::test]
    async fn test_create_receives_rendered_template() {
        let provider = Arc::new(SimpleProvider::default().on_create(|template| {
            assert_eq!(template.url(), Some("http://a.example.com/"));
            Ok("1234".to_string())
        }));
        let mut store = MockClusterStore::new();
        expect_status(&mut store, "1234");
        let im = make_ingress_monitor("test-im", "testing", "simple", "");

        reconcile(Arc::new(im), make_context(store, &provider))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_timeout_leaves_status_untouched() {
        let provider = Arc::new(
            SimpleProvider::default()
                .with_delay(Duration::from_secs(3600))
                .on_create(|_| Ok("1234".to_string())),
        );
        let mut store = MockClusterStore::new();
        store.expect_patch_child_status().never();
        let im = make_ingress_monitor("test-im", "testing", "simple", "");

        let err = reconcile(Arc::new(im), make_context(store, &provider))
            .await
            .unwrap_err();

        assert!(matches!(err, MonitorError::Timeout(..)));
        assert_eq!(provider.create_count(), 1);
    }

    #[tokio::test]
    async fn test_update_failure_is_returned() {
        let provider = Arc::new(SimpleProvider::default().on_update(|_, _| Err(ProviderError::new("my-provider-error"))));
        let mut store = MockClusterStore::new();
        store.expect_patch_child_status().never();
        let im = make_ingress_monitor("test-im", "testing", "simple", "1234");

        let err = reconcile(Arc::new(im), make_context(store, &provider))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "my-provider-error");
        assert_eq!(provider.update_count(), 1);
        assert_eq!(provider.create_count(), 0);
    }

    #[tokio::test]
    async fn test_update_with_existing_identifier() {
        let provider = Arc::new(SimpleProvider::default().on_update(|id, _| Ok(id.to_string())));
        let mut store = MockClusterStore::new();
        expect_status(&mut store, "1234");
        let im = make_ingress_monitor("test-im", "testing", "simple", "1234");

        reconcile(Arc::new(im), make_context(store, &provider))
            .await
            .unwrap();

        assert_eq!(provider.update_count(), 1);
        assert_eq!(provider.create_count(), 0);
        assert_eq!(provider.ids(), vec!["1234"]);
    }

    #[tokio::test]
    async fn test_update_stores_replacement_identifier() {
        let provider = Arc::new(SimpleProvider::default().on_update(|_, _| Ok("5678".to_string())));
        let mut store = MockClusterStore::new();
        expect_status(&mut store, "5678");
        let im = make_ingress_monitor("test-im", "testing", "simple", "1234");

        reconcile(Arc::new(im), make_context(store, &provider))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_provider_error_is_requeued() {
        let provider = Arc::new(SimpleProvider::default().on_create(|_| Err(ProviderError::new("backend down"))));
        let ctx = make_context(MockClusterStore::new(), &provider);
        let im = Arc::new(make_ingress_monitor("test-im", "testing", "simple", ""));

        let err = reconcile(im.clone(), ctx.clone()).await.unwrap_err();

        assert_eq!(
            error_policy(im, &err, ctx.clone()),
            Action::requeue(ctx.config.error_requeue)
        );
    }

    #[tokio::test]
    async fn test_delete_without_identifier() {
        let provider = Arc::new(SimpleProvider::default());
        let im = make_ingress_monitor("test-im", "testing", "simple", "");

        delete_external(&im, &make_context(MockClusterStore::new(), &provider)).await;

        assert_eq!(provider.delete_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_with_identifier() {
        let provider = Arc::new(SimpleProvider::default().on_delete(|_| Ok(())));
        let im = make_ingress_monitor("test-im", "testing", "simple", "1234");

        delete_external(&im, &make_context(MockClusterStore::new(), &provider)).await;

        assert_eq!(provider.delete_count(), 1);
        assert_eq!(provider.ids(), vec!["1234"]);
    }

    #[tokio::test]
    async fn test_delete_failure_is_dropped() {
        let provider = Arc::new(SimpleProvider::default().on_delete(|_| Err(ProviderError::new("my-provider-error"))));
        let im = make_ingress_monitor("test-im", "testing", "simple", "1234");

        delete_external(&im, &make_context(MockClusterStore::new(), &provider)).await;

        assert_eq!(provider.delete_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_with_unregistered_provider_type() {
        let provider = Arc::new(SimpleProvider::default());
        let im = make_ingress_monitor("test-im", "testing", "test", "1234");

        delete_external(&im, &make_context(MockClusterStore::new(), &provider)).await;

        assert_eq!(provider.delete_count(), 0);
    }
}
