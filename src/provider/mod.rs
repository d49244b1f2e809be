// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Monitoring backend abstraction.
//!
//! Each backend implements [`MonitorProvider`] and is registered in a
//! [`ProviderRegistry`] under its type tag. IngressMonitors select their backend
//! through `spec.provider.type`.

pub mod logging;
pub mod registry;

pub use logging::LogProvider;
pub use registry::{ProviderFactory, ProviderRegistry};

use crate::types::MonitorTemplateSpec;
use async_trait::async_trait;
use thiserror::Error;

/// Error reported by a monitoring backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Operations every monitoring backend supports. Identifiers are opaque to the
/// operator and only ever round-tripped through `IngressMonitor.status.id`.
#[async_trait]
pub trait MonitorProvider: Send + Sync {
    /// Create an external monitor and return its identifier
    async fn create(&self, template: &MonitorTemplateSpec) -> Result<String, ProviderError>;

    /// Update the external monitor with the given identifier, returning the
    /// identifier that should be stored from now on
    async fn update(&self, id: &str, template: &MonitorTemplateSpec) -> Result<String, ProviderError>;

    /// Delete the external monitor with the given identifier
    async fn delete(&self, id: &str) -> Result<(), ProviderError>;
}
