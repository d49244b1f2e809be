// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Monitor template rendering.
//!
//! Name patterns are rendered with minijinja in strict mode, so a misspelled
//! placeholder is reported instead of silently rendering as an empty string.
//! Supported placeholders:
//!
//! - `{{ResourceName}}` / `{{ResourceNamespace}}`: the matched Ingress
//! - `{{IngressName}}` / `{{IngressNamespace}}`: aliases of the above
//! - `{{MonitorName}}`: the Monitor being expanded
//! - `{{Host}}`: the endpoint host
//!
//! Go-template style placeholders (`{{.IngressName}}`) are accepted as well.

use crate::constants::template_types;
use crate::error::{MonitorError, Result};
use crate::expansion::Endpoint;
use crate::types::{HttpTemplate, MonitorTemplateSpec};
use minijinja::{context, Environment, UndefinedBehavior};
use url::Url;

/// Identity of the objects a template is rendered for
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub monitor_name: &'a str,
    pub resource_name: &'a str,
    pub resource_namespace: &'a str,
}

/// Resolve `template` for one endpoint: the returned spec carries the final monitor
/// name and URL, every other setting is passed through unchanged.
pub fn render_template(
    template: &MonitorTemplateSpec,
    ctx: &RenderContext<'_>,
    endpoint: &Endpoint,
) -> Result<MonitorTemplateSpec> {
    if !template.monitor_type.eq_ignore_ascii_case(template_types::HTTP) {
        return Err(MonitorError::TemplateRender(format!(
            "unsupported monitor type '{}'",
            template.monitor_type
        )));
    }

    let name = match template.name.as_deref() {
        Some(pattern) if !pattern.trim().is_empty() => render_name(pattern, ctx, endpoint)?,
        _ => default_name(ctx, endpoint),
    };

    let mut http = template.http.clone().unwrap_or_default();
    http.url = Some(resolve_url(endpoint, &http)?);

    Ok(MonitorTemplateSpec {
        name: Some(name),
        http: Some(http),
        ..template.clone()
    })
}

fn default_name(ctx: &RenderContext<'_>, endpoint: &Endpoint) -> String {
    format!("{}-{}-{}", ctx.monitor_name, ctx.resource_name, endpoint.host)
}

fn render_name(pattern: &str, ctx: &RenderContext<'_>, endpoint: &Endpoint) -> Result<String> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    let rendered = env
        .render_str(
            &strip_dotted_placeholders(pattern),
            context! {
                ResourceName => ctx.resource_name,
                ResourceNamespace => ctx.resource_namespace,
                IngressName => ctx.resource_name,
                IngressNamespace => ctx.resource_namespace,
                MonitorName => ctx.monitor_name,
                Host => endpoint.host.as_str(),
            },
        )
        .map_err(|e| MonitorError::TemplateRender(format!("name pattern '{}': {}", pattern, e)))?;

    let rendered = rendered.trim();
    if rendered.is_empty() {
        return Err(MonitorError::TemplateRender(format!(
            "name pattern '{}' rendered an empty name",
            pattern
        )));
    }

    Ok(rendered.to_string())
}

/// `{{.Name}}` is not valid minijinja; rewrite it to `{{Name}}`.
fn strip_dotted_placeholders(pattern: &str) -> String {
    pattern.replace("{{.", "{{").replace("{{ .", "{{ ")
}

fn resolve_url(endpoint: &Endpoint, http: &HttpTemplate) -> Result<String> {
    let scheme = if endpoint.is_secure { "https" } else { "http" };
    let path = http
        .endpoint
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or("/");

    let url = if path.starts_with('/') {
        format!("{}://{}{}", scheme, endpoint.host, path)
    } else {
        format!("{}://{}/{}", scheme, endpoint.host, path)
    };

    Url::parse(&url).map_err(|e| MonitorError::TemplateRender(format!("invalid URL '{}': {}", url, e)))?;

    Ok(url)
}
