//! Project configuration file.
//!
//! A YAML file that records the binding policy for a project, shared by the
//! CLI and `build.rs` scripts. Its `http` section has the layout of a gRPC API
//! service config, so unknown top-level keys such as `type` are ignored.
//!
//! # Example
//!
//! ```yaml
//! # Only these proto packages are processed (default: all).
//! packages:
//!   - library.v1
//!
//! # Path of the runtime crate in generated code (default: httprule).
//! runtime_crate: crate::rest
//!
//! # Accept request bodies on DELETE bindings (default: false).
//! allow_delete_body: false
//!
//! # URL pattern policy, every key optional.
//! validation:
//!   enabled: true
//!   max_static_segments_at_start: 4
//!   allow_consecutive_statics: false
//!
//! # Bindings for methods, keyed by fully qualified name.
//! http:
//!   rules:
//!     - selector: library.v1.LibraryService.GetBook
//!       get: /v1/{name=shelves/*/books/*}
//!       additional_bindings:
//!         - custom: { kind: HEAD, path: "/v1/{name=shelves/*/books/*}" }
//! ```

use std::path::Path;

use httprule_core::descriptor::{CustomHttpPattern, HttpPattern, HttpRule};
use httprule_core::ValidatorConfig;
use serde::Deserialize;

use crate::codegen::BindingConfig;

/// Project-level configuration loaded from YAML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Proto packages to process. Empty means every annotated package.
    pub packages: Vec<String>,

    /// Runtime crate path for generated code.
    pub runtime_crate: Option<String>,

    /// Accept request bodies on `DELETE` bindings.
    pub allow_delete_body: bool,

    /// URL pattern policy.
    pub validation: ValidatorConfig,

    /// Bindings declared outside the proto files.
    pub http: HttpConfig,
}

/// The `http` section: selector-keyed HTTP rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// One entry per bound method.
    pub rules: Vec<HttpRuleConfig>,
}

/// A `google.api.HttpRule` as written in YAML.
///
/// Exactly one of `get`, `put`, `post`, `delete`, `patch` and `custom` should
/// be set. When several are, the first in that order wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpRuleConfig {
    /// Fully qualified method name, e.g. `library.v1.LibraryService.GetBook`.
    pub selector: String,
    /// `GET` path template.
    pub get: Option<String>,
    /// `PUT` path template.
    pub put: Option<String>,
    /// `POST` path template.
    pub post: Option<String>,
    /// `DELETE` path template.
    pub delete: Option<String>,
    /// `PATCH` path template.
    pub patch: Option<String>,
    /// A method outside the five standard verbs.
    pub custom: Option<CustomPatternConfig>,
    /// Request body selector: `"*"` or a field path.
    pub body: String,
    /// Response body selector.
    #[serde(alias = "responseBody")]
    pub response_body: String,
    /// Extra bindings; these must not nest further.
    #[serde(alias = "additionalBindings")]
    pub additional_bindings: Vec<HttpRuleConfig>,
}

/// `custom: { kind, path }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomPatternConfig {
    /// HTTP method, e.g. `HEAD`.
    pub kind: String,
    /// Path template.
    pub path: String,
}

impl HttpRuleConfig {
    /// The rule as a descriptor message.
    #[must_use]
    pub fn to_rule(&self) -> HttpRule {
        let standard = [
            self.get.clone().map(HttpPattern::Get),
            self.put.clone().map(HttpPattern::Put),
            self.post.clone().map(HttpPattern::Post),
            self.delete.clone().map(HttpPattern::Delete),
            self.patch.clone().map(HttpPattern::Patch),
            self.custom.as_ref().map(|custom| {
                HttpPattern::Custom(CustomHttpPattern {
                    kind: custom.kind.clone(),
                    path: custom.path.clone(),
                })
            }),
        ];
        let mut patterns = standard.into_iter().flatten();
        let pattern = patterns.next();
        if patterns.next().is_some() {
            tracing::warn!(
                selector = %self.selector,
                "HTTP rule sets several patterns, using the first"
            );
        }

        HttpRule {
            selector: self.selector.clone(),
            pattern,
            body: self.body.clone(),
            additional_bindings: self.additional_bindings.iter().map(Self::to_rule).collect(),
            response_body: self.response_body.clone(),
        }
    }
}

impl ProjectConfig {
    /// Load config from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// The extraction settings this file describes.
    #[must_use]
    pub fn binding_config(&self) -> BindingConfig {
        let config = BindingConfig::new()
            .packages(self.packages.as_slice())
            .validator(self.validation)
            .allow_delete_body(self.allow_delete_body)
            .http_rules(self.http.rules.iter().map(HttpRuleConfig::to_rule));
        match &self.runtime_crate {
            Some(path) => config.runtime_crate(path),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserialize_defaults() {
        let config: ProjectConfig = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(config, ProjectConfig::default());
        assert!(config.validation.enabled);
        assert_eq!(config.validation.max_static_segments_at_start, 4);
    }

    #[test]
    fn deserialize_full() {
        let yaml = indoc::indoc! {"
            packages:
              - library.v1
              - echo.v1
            runtime_crate: crate::rest
            allow_delete_body: true
            validation:
              max_static_segments_at_start: 2
        "};
        let config: ProjectConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.packages, vec!["library.v1", "echo.v1"]);
        assert_eq!(config.runtime_crate.as_deref(), Some("crate::rest"));
        assert!(config.allow_delete_body);
        assert_eq!(config.validation.max_static_segments_at_start, 2);
        // Other policy keys keep defaults
        assert!(config.validation.enabled);
        assert!(!config.validation.allow_consecutive_statics);

        let binding = config.binding_config();
        assert!(binding.includes("echo.v1"));
        assert!(!binding.includes("other.v1"));
        assert_eq!(binding.runtime_crate, "crate::rest");
        assert_eq!(binding.validator, config.validation);
        assert!(binding.allow_delete_body);
    }

    #[test]
    fn deserialize_http_rules() {
        let yaml = indoc::indoc! {r#"
            type: google.api.Service
            config_version: 3
            http:
              rules:
                - selector: library.v1.LibraryService.GetBook
                  get: /v1/{name=shelves/*/books/*}
                  additionalBindings:
                    - custom: { kind: HEAD, path: "/v1/{name=shelves/*/books/*}" }
                - selector: library.v1.LibraryService.CreateBook
                  post: /v1/{parent=shelves/*}/books
                  body: book
        "#};
        let config: ProjectConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.http.rules.len(), 2);

        let get = config.http.rules[0].to_rule();
        assert_eq!(get.selector, "library.v1.LibraryService.GetBook");
        assert_eq!(get.pattern, Some(HttpPattern::Get("/v1/{name=shelves/*/books/*}".into())));
        assert_eq!(
            get.additional_bindings[0].pattern,
            Some(HttpPattern::Custom(CustomHttpPattern {
                kind: "HEAD".into(),
                path: "/v1/{name=shelves/*/books/*}".into(),
            }))
        );

        let create = config.http.rules[1].to_rule();
        assert_eq!(create.body, "book");
        assert!(create.additional_bindings.is_empty());

        assert_eq!(config.binding_config().http_rules.len(), 2);
    }

    #[test]
    fn first_pattern_wins() {
        let rule = HttpRuleConfig {
            selector: "a.B.C".into(),
            put: Some("/v1/put".into()),
            patch: Some("/v1/patch".into()),
            ..HttpRuleConfig::default()
        };
        assert_eq!(rule.to_rule().pattern, Some(HttpPattern::Put("/v1/put".into())));
        assert_eq!(HttpRuleConfig::default().to_rule().pattern, None);
    }

    #[test]
    fn load_from_file() {
        let dir = std::env::temp_dir().join("httprule-build-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("httprule.yaml");
        std::fs::write(&path, "validation:\n  enabled: false\n").unwrap();

        let config = ProjectConfig::load(&path).unwrap();
        assert!(!config.validation.enabled);
        assert!(config.packages.is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_nonexistent_file_returns_error() {
        let result = ProjectConfig::load(Path::new("/nonexistent/httprule.yaml"));
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }

    #[test]
    fn load_invalid_yaml_returns_error() {
        let dir = std::env::temp_dir().join("httprule-build-config-test-invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.yaml");
        std::fs::write(&path, "packages: [[[invalid").unwrap();

        let result = ProjectConfig::load(&path);
        assert!(matches!(result, Err(crate::Error::Yaml(_))));

        std::fs::remove_dir_all(&dir).ok();
    }
}
