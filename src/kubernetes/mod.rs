// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery and access to the cluster store.

pub mod crd;
pub mod store;

pub use crd::wait_for_crds;
pub use store::{ClusterStore, KubeStore};
