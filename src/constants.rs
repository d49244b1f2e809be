// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// API group shared by all ingress-monitor custom resources
pub const API_GROUP: &str = "ingressmonitor.sphc.io";
pub const API_VERSION: &str = "v1alpha1";

/// Kubernetes label keys used by ingress-monitor
pub mod labels {
    /// Monitor an IngressMonitor was expanded from, shortened to fit a label value
    pub const MONITOR: &str = "ingressmonitor.sphc.io/monitor";
}

/// Kubernetes annotation keys used by ingress-monitor
pub mod annotations {
    /// Full name of the Monitor an IngressMonitor was expanded from. The monitor
    /// label may hold a shortened form.
    pub const MONITOR_NAME: &str = "ingressmonitor.sphc.io/monitor-name";
}

/// The operator name used for server-side apply
pub const OPERATOR_NAME: &str = "ingress-monitor";

/// Monitor template types
pub mod template_types {
    pub const HTTP: &str = "HTTP";
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
