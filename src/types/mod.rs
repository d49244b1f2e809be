// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource definitions for the ingressmonitor.sphc.io API group.

pub mod ingress_monitor;
pub mod monitor;
pub mod provider;
pub mod template;

pub use ingress_monitor::{IngressMonitor, IngressMonitorSpec, IngressMonitorStatus, NamespacedProvider};
pub use monitor::{Monitor, MonitorSpec, ObjectReference};
pub use provider::{Provider, ProviderSpec};
pub use template::{HttpTemplate, MonitorTemplate, MonitorTemplateSpec};
