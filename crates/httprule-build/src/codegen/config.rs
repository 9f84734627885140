//! Configuration for binding extraction and route-table generation.

use std::collections::BTreeSet;

use httprule_core::descriptor::HttpRule;
use httprule_core::ValidatorConfig;

/// Configuration for [`extract_bindings`](super::extract_bindings) and
/// [`generate`](super::generate).
///
/// # Package filter
///
/// When no package is registered, every service with `google.api.http`
/// annotations is processed. Registering at least one package restricts
/// extraction to the listed packages.
///
/// # External rules
///
/// [`http_rule`](Self::http_rule) binds a method that has no
/// `google.api.http` annotation, or adds bindings to one that has. The rule's
/// `selector` is the method's fully qualified name, e.g.
/// `library.v1.LibraryService.GetBook`. External rules come before the
/// annotation in binding order.
///
/// # Examples
///
/// ```
/// use httprule_build::BindingConfig;
/// use httprule_core::ValidatorConfig;
///
/// let config = BindingConfig::new()
///     .package("library.v1")
///     .runtime_crate("crate::rest")
///     .validator(ValidatorConfig::default().max_static_segments_at_start(2))
///     .allow_delete_body(true);
/// # let _ = config;
/// ```
#[derive(Clone, Debug)]
pub struct BindingConfig {
    /// Proto packages to process (e.g. `"library.v1"`). Empty means all.
    pub(crate) packages: BTreeSet<String>,

    /// Path to the runtime crate/module (default: `"httprule"`).
    ///
    /// Generated code references `{runtime_crate}::RouteSpec`.
    pub(crate) runtime_crate: String,

    /// Routing-safety policy applied to every template before compiling.
    pub(crate) validator: ValidatorConfig,

    /// Accept a request body on `DELETE` bindings.
    pub(crate) allow_delete_body: bool,

    /// Rules keyed by `selector`, applied on top of annotations.
    pub(crate) http_rules: Vec<HttpRule>,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            packages: BTreeSet::new(),
            runtime_crate: "httprule".to_string(),
            validator: ValidatorConfig::default(),
            allow_delete_body: false,
            http_rules: Vec::new(),
        }
    }
}

impl BindingConfig {
    /// Create a new config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a proto package.
    ///
    /// Once a package is registered, unregistered packages are skipped.
    #[must_use]
    pub fn package(mut self, proto_package: &str) -> Self {
        self.packages.insert(proto_package.to_string());
        self
    }

    /// Register several proto packages at once.
    #[must_use]
    pub fn packages<S: AsRef<str>>(mut self, proto_packages: &[S]) -> Self {
        self.packages
            .extend(proto_packages.iter().map(|p| p.as_ref().to_string()));
        self
    }

    /// Set the runtime crate/module path used by generated code.
    ///
    /// Default: `"httprule"`. Set to `"crate::rest"` when the runtime types
    /// are re-exported in-crate.
    #[must_use]
    pub fn runtime_crate(mut self, path: &str) -> Self {
        self.runtime_crate = path.to_string();
        self
    }

    /// Set the URL pattern policy.
    #[must_use]
    pub const fn validator(mut self, validator: ValidatorConfig) -> Self {
        self.validator = validator;
        self
    }

    /// Accept or reject request bodies on `DELETE` bindings (default: reject).
    #[must_use]
    pub const fn allow_delete_body(mut self, allow: bool) -> Self {
        self.allow_delete_body = allow;
        self
    }

    /// Add an HTTP rule for the method named by `rule.selector`.
    #[must_use]
    pub fn http_rule(mut self, rule: HttpRule) -> Self {
        self.http_rules.push(rule);
        self
    }

    /// Add several selector-keyed HTTP rules.
    #[must_use]
    pub fn http_rules(mut self, rules: impl IntoIterator<Item = HttpRule>) -> Self {
        self.http_rules.extend(rules);
        self
    }

    /// Whether bindings of `proto_package` are extracted.
    pub(crate) fn includes(&self, proto_package: &str) -> bool {
        self.packages.is_empty() || self.packages.contains(proto_package)
    }
}
