// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Turns a Monitor into the set of IngressMonitors it should own.
//!
//! Everything in here is free of cluster and network access: the reconcilers fetch
//! the observed state and feed it through selector matching, endpoint expansion and
//! template rendering.

pub mod desired;
pub mod endpoints;
pub mod render;
pub mod selector;

pub use desired::{child_name, compute_desired, diff, monitor_label_value, Plan};
pub use endpoints::{expand_endpoints, Endpoint};
pub use render::{render_template, RenderContext};
pub use selector::{select_resources, SelectorScope};
