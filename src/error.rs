// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::provider::ProviderError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// The provider type tag has no registered constructor.
    #[error("Error fetching provider '{0}': the specified provider can't be found")]
    ProviderNotFound(String),

    #[error("Provider type '{0}' is already registered")]
    ProviderAlreadyRegistered(String),

    /// Errors returned by a monitoring backend are passed through verbatim.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A referenced resource (Provider, MonitorTemplate) is missing from the cluster.
    #[error("{kind} {namespace}/{name} not found")]
    ResourceNotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("Failed to render monitor template: {0}")]
    TemplateRender(String),

    #[error("Invalid label selector: {0}")]
    InvalidSelector(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Timed out after {0:?} waiting for {1}")]
    Timeout(Duration, String),
}

impl MonitorError {
    /// Validation errors never succeed on redelivery, so they should wait for a change
    /// to the object instead of being requeued.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            MonitorError::TemplateRender(_)
                | MonitorError::InvalidSelector(_)
                | MonitorError::MissingField(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
