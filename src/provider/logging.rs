// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Dry-run backend that only logs what it would do.

use crate::provider::{MonitorProvider, ProviderError};
use crate::types::{MonitorTemplateSpec, ProviderSpec};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;

/// Type tag the dry-run backend is registered under
pub const PROVIDER_TYPE: &str = "log";

/// Setting used to prefix generated identifiers
const ID_PREFIX_SETTING: &str = "idPrefix";

#[derive(Debug, Clone, Default)]
pub struct LogProvider {
    id_prefix: String,
}

impl LogProvider {
    pub fn from_spec(spec: &ProviderSpec) -> Result<Arc<dyn MonitorProvider>, ProviderError> {
        Ok(Arc::new(Self {
            id_prefix: spec.setting(ID_PREFIX_SETTING).unwrap_or("log").to_string(),
        }))
    }

    /// Deterministic identifier, so repeated creates of the same monitor agree
    fn id_for(&self, template: &MonitorTemplateSpec) -> String {
        let mut hasher = Sha256::new();
        hasher.update(template.name.as_deref().unwrap_or_default());
        hasher.update(template.url().unwrap_or_default());
        let digest = hasher.finalize();
        let hex: String = digest.iter().take(6).map(|b| format!("{:02x}", b)).collect();
        format!("{}-{}", self.id_prefix, hex)
    }
}

#[async_trait]
impl MonitorProvider for LogProvider {
    async fn create(&self, template: &MonitorTemplateSpec) -> Result<String, ProviderError> {
        let id = self.id_for(template);
        info!(
            id = %id,
            name = template.name.as_deref().unwrap_or_default(),
            url = template.url().unwrap_or_default(),
            "Would create external monitor"
        );
        Ok(id)
    }

    async fn update(&self, id: &str, template: &MonitorTemplateSpec) -> Result<String, ProviderError> {
        info!(
            id = %id,
            name = template.name.as_deref().unwrap_or_default(),
            url = template.url().unwrap_or_default(),
            "Would update external monitor"
        );
        Ok(id.to_string())
    }

    async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        info!(id = %id, "Would delete external monitor");
        Ok(())
    }
}
