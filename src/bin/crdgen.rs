// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Print the CustomResourceDefinitions as a multi-document YAML stream.

use anyhow::Result;
use ingress_monitor::types::{IngressMonitor, Monitor, MonitorTemplate, Provider};
use kube::CustomResourceExt;

fn main() -> Result<()> {
    let crds = [
        Provider::crd(),
        MonitorTemplate::crd(),
        Monitor::crd(),
        IngressMonitor::crd(),
    ];

    for crd in &crds {
        print!("---\n{}", serde_yaml::to_string(crd)?);
    }

    Ok(())
}
