//! Binding extraction from proto descriptors.

use std::collections::{BTreeMap, HashSet};

use httprule_core::descriptor::{
    self, FileDescriptorSet, HttpRule, MethodDescriptorProto, ServiceDescriptorProto,
};

use super::config::BindingConfig;
use super::fields::MessageIndex;
use super::types::Binding;
use crate::error::{Error, FieldPathError, Result};

/// Method-level context shared by all of a method's bindings.
struct MethodContext<'a> {
    package: &'a str,
    service: &'a str,
    method: &'a MethodDescriptorProto,
    rpc: String,
}

impl MethodContext<'_> {
    fn name(&self) -> &str {
        self.method.name.as_deref().unwrap_or("")
    }

    fn client_streaming(&self) -> bool {
        self.method.client_streaming.unwrap_or(false)
    }

    fn server_streaming(&self) -> bool {
        self.method.server_streaming.unwrap_or(false)
    }
}

/// Descriptor-wide lookups shared by every service.
struct Registry<'a> {
    config: &'a BindingConfig,
    messages: MessageIndex<'a>,
    external: BTreeMap<String, Vec<&'a HttpRule>>,
}

pub(crate) fn extract_bindings(
    fdset: &FileDescriptorSet,
    config: &BindingConfig,
) -> Result<Vec<Binding>> {
    let registry = Registry {
        config,
        messages: MessageIndex::collect(fdset),
        external: external_rules(config)?,
    };
    warn_unbound(fdset, &registry.external);

    let mut bindings = Vec::new();
    for file in &fdset.file {
        let package = file.package.as_deref().unwrap_or("");
        if !config.includes(package) {
            tracing::trace!(package, "package not registered, skipping");
            continue;
        }

        for service in &file.service {
            extract_service(package, service, &registry, &mut bindings)?;
        }
    }

    Ok(bindings)
}

/// Group configured rules by method, checking each selector names one method.
fn external_rules(config: &BindingConfig) -> Result<BTreeMap<String, Vec<&HttpRule>>> {
    let mut rules: BTreeMap<String, Vec<&HttpRule>> = BTreeMap::new();
    for rule in &config.http_rules {
        let selector = rule.selector.trim().trim_start_matches('.');
        if selector.is_empty() || selector.contains(['*', ',', ' ']) {
            return Err(Error::InvalidSelector {
                selector: rule.selector.clone(),
            });
        }
        rules.entry(selector.to_string()).or_default().push(rule);
    }
    Ok(rules)
}

fn warn_unbound(fdset: &FileDescriptorSet, external: &BTreeMap<String, Vec<&HttpRule>>) {
    if external.is_empty() {
        return;
    }
    let mut methods = HashSet::new();
    for file in &fdset.file {
        let package = file.package.as_deref().unwrap_or("");
        for service in &file.service {
            let qualified = qualified_service(package, service);
            for method in &service.method {
                methods.insert(format!("{qualified}.{}", method.name.as_deref().unwrap_or("")));
            }
        }
    }
    for selector in external.keys().filter(|s| !methods.contains(*s)) {
        tracing::warn!(selector = %selector, "HTTP rule selector matches no method");
    }
}

fn qualified_service(package: &str, service: &ServiceDescriptorProto) -> String {
    let service_name = service.name.as_deref().unwrap_or("");
    if package.is_empty() {
        service_name.to_string()
    } else {
        format!("{package}.{service_name}")
    }
}

fn extract_service(
    package: &str,
    service: &ServiceDescriptorProto,
    registry: &Registry<'_>,
    out: &mut Vec<Binding>,
) -> Result<()> {
    let qualified = qualified_service(package, service);

    for method in &service.method {
        let name = method.name.as_deref().unwrap_or("");
        let ctx = MethodContext {
            package,
            service: service.name.as_deref().unwrap_or(""),
            method,
            rpc: format!("/{qualified}/{name}"),
        };

        let external = registry
            .external
            .get(&format!("{qualified}.{name}"))
            .map_or(&[][..], Vec::as_slice);
        let rules: Vec<&HttpRule> = external.iter().copied().chain(method.http_rule()).collect();
        if rules.is_empty() {
            tracing::debug!(rpc = %ctx.rpc, "no google.api.http annotation");
            continue;
        }

        let mut index = 0;
        for rule in rules {
            for (i, binding_rule) in rule.bindings().enumerate() {
                if i > 0 && !binding_rule.additional_bindings.is_empty() {
                    return Err(Error::NestedAdditionalBindings { rpc: ctx.rpc });
                }
                if let Some(binding) = new_binding(&ctx, binding_rule, index + i, registry)? {
                    out.push(binding);
                }
            }
            index += 1 + rule.additional_bindings.len();
        }
    }

    Ok(())
}

fn new_binding(
    ctx: &MethodContext<'_>,
    rule: &HttpRule,
    index: usize,
    registry: &Registry<'_>,
) -> Result<Option<Binding>> {
    let config = registry.config;
    let Some((http_method, path)) =
        descriptor::extract_http_pattern(rule).filter(|(_, path)| !path.is_empty())
    else {
        tracing::debug!(rpc = %ctx.rpc, index, "no pattern specified in google.api.HttpRule");
        return Ok(None);
    };

    let body_forbidden = match http_method {
        "GET" => true,
        "DELETE" => !config.allow_delete_body,
        _ => false,
    };
    if body_forbidden && !rule.body.is_empty() {
        return Err(Error::BodyNotAllowed {
            rpc: ctx.rpc.clone(),
            http_method: http_method.to_string(),
        });
    }

    config
        .validator
        .validate(path)
        .map_err(|source| Error::Validation {
            rpc: ctx.rpc.clone(),
            source,
        })?;
    let template = httprule_core::compile(path).map_err(|source| Error::Template {
        rpc: ctx.rpc.clone(),
        source,
    })?;

    if ctx.client_streaming() && !template.fields().is_empty() {
        return Err(Error::StreamingPathParams {
            rpc: ctx.rpc.clone(),
        });
    }

    check_fields(ctx, rule, &template.fields(), registry)?;

    tracing::trace!(rpc = %ctx.rpc, index, http_method, path, "binding extracted");
    Ok(Some(Binding {
        package: ctx.package.to_string(),
        service: ctx.service.to_string(),
        method: ctx.name().to_string(),
        rpc: ctx.rpc.clone(),
        index,
        http_method: http_method.to_string(),
        path: path.to_string(),
        body: rule.body.clone(),
        response_body: rule.response_body.clone(),
        client_streaming: ctx.client_streaming(),
        server_streaming: ctx.server_streaming(),
        template,
    }))
}

/// Path variables must name scalar request fields; a field body selector
/// must name a request field.
fn check_fields(
    ctx: &MethodContext<'_>,
    rule: &HttpRule,
    params: &[&str],
    registry: &Registry<'_>,
) -> Result<()> {
    if params.is_empty() && matches!(rule.body.as_str(), "" | "*") {
        return Ok(());
    }

    let field_error = |source: FieldPathError| Error::FieldPath {
        rpc: ctx.rpc.clone(),
        source,
    };
    let input_type = ctx.method.input_type.as_deref().unwrap_or("");
    let request = registry
        .messages
        .lookup(ctx.package, input_type)
        .map_err(field_error)?;

    for param in params {
        registry
            .messages
            .check_param(request, param)
            .map_err(field_error)?;
    }
    registry
        .messages
        .check_body(request, &rule.body)
        .map_err(field_error)
}
