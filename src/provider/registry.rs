// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::error::{MonitorError, Result};
use crate::provider::{MonitorProvider, ProviderError};
use crate::types::ProviderSpec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Builds a backend instance from a Provider's configuration
pub type ProviderFactory =
    Box<dyn Fn(&ProviderSpec) -> std::result::Result<Arc<dyn MonitorProvider>, ProviderError> + Send + Sync>;

/// Maps provider type tags to backend constructors.
///
/// The registry is handed to the controllers through their context, so tests can
/// install fakes without touching process-wide state.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a type tag to a constructor. Registering the same tag twice is rejected.
    pub fn register<F>(&mut self, provider_type: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn(&ProviderSpec) -> std::result::Result<Arc<dyn MonitorProvider>, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        let provider_type = provider_type.into();
        if self.factories.contains_key(&provider_type) {
            return Err(MonitorError::ProviderAlreadyRegistered(provider_type));
        }

        debug!("Registering provider type '{}'", provider_type);
        self.factories.insert(provider_type, Box::new(factory));
        Ok(())
    }

    /// Construct the backend registered for `provider_type`
    pub fn resolve(&self, provider_type: &str, spec: &ProviderSpec) -> Result<Arc<dyn MonitorProvider>> {
        let factory = self
            .factories
            .get(provider_type)
            .ok_or_else(|| MonitorError::ProviderNotFound(provider_type.to_string()))?;

        Ok(factory(spec)?)
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.factories.keys().collect();
        types.sort();
        f.debug_struct("ProviderRegistry").field("types", &types).finish()
    }
}
