//! Request multiplexer over compiled patterns.

use std::collections::HashMap;

use http::{Method, StatusCode};
use httprule_core::ValidatorConfig;

use super::error::RegisterError;
use super::params::PathParams;
use super::pattern::Pattern;
use super::route::RouteSpec;

/// Outcome of [`ServeMux::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch<'a, T> {
    /// First route registered for the method whose pattern matched.
    Matched {
        /// The registered handler value.
        handler: &'a T,
        /// Captured path variables.
        params: PathParams,
    },
    /// The path matches under other methods only.
    MethodNotAllowed {
        /// Methods that would have matched, sorted.
        allowed: Vec<Method>,
    },
    /// No route matches the path.
    NotFound,
    /// The path does not start with `/`.
    BadRequest,
}

impl<T> Dispatch<'_, T> {
    /// HTTP status for this outcome.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Matched { .. } => StatusCode::OK,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Clone)]
struct Route<T> {
    pattern: Pattern,
    handler: T,
}

/// Per-method route table.
///
/// Routes are tried in registration order and the first match wins. When
/// nothing matches under the request method but a route under another
/// method does, the outcome is [`Dispatch::MethodNotAllowed`].
///
/// # Examples
///
/// ```
/// use http::{Method, StatusCode};
/// use httprule::{ServeMux, ValidatorConfig};
///
/// let mut mux = ServeMux::new();
/// mux.handle_template(Method::GET, "/v1/{name=messages/*}", "get", &ValidatorConfig::default())?;
///
/// assert_eq!(mux.dispatch(&Method::GET, "/v1/messages/1").status_code(), StatusCode::OK);
/// assert_eq!(
///     mux.dispatch(&Method::POST, "/v1/messages/1").status_code(),
///     StatusCode::METHOD_NOT_ALLOWED
/// );
/// assert_eq!(mux.dispatch(&Method::GET, "/v2").status_code(), StatusCode::NOT_FOUND);
/// # Ok::<(), httprule::RegisterError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ServeMux<T> {
    routes: HashMap<Method, Vec<Route<T>>>,
}

impl<T> Default for ServeMux<T> {
    fn default() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }
}

impl<T> ServeMux<T> {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` and an already built pattern.
    pub fn handle(&mut self, method: Method, pattern: Pattern, handler: T) {
        tracing::debug!(%method, %pattern, "route registered");
        self.routes
            .entry(method)
            .or_default()
            .push(Route { pattern, handler });
    }

    /// Validate, compile and register a template.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError`] when `config` rejects the template, the
    /// template does not parse, or its program is malformed.
    pub fn handle_template(
        &mut self,
        method: Method,
        template: &str,
        handler: T,
        config: &ValidatorConfig,
    ) -> Result<(), RegisterError> {
        config.validate(template)?;
        let compiled = httprule_core::compile(template)?;
        let pattern = Pattern::from_template(&compiled).map_err(|source| RegisterError::Pattern {
            template: template.to_string(),
            source,
        })?;
        self.handle(method, pattern, handler);
        Ok(())
    }

    /// Build a table from generated routes, mapping each to a handler.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError`] for an invalid method or a malformed program.
    pub fn from_routes<F>(routes: &[RouteSpec], mut handler: F) -> Result<Self, RegisterError>
    where
        F: FnMut(&RouteSpec) -> T,
    {
        let mut mux = Self::new();
        for route in routes {
            let method = Method::from_bytes(route.method.as_bytes())
                .map_err(|_| RegisterError::Method(route.method.to_string()))?;
            let pattern = route.pattern().map_err(|source| RegisterError::Pattern {
                template: route.template.to_string(),
                source,
            })?;
            mux.handle(method, pattern, handler(route));
        }
        Ok(mux)
    }

    /// Number of registered routes across all methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    /// `true` when no route is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the handler for a request.
    #[must_use]
    pub fn dispatch(&self, method: &Method, path: &str) -> Dispatch<'_, T> {
        if !path.starts_with('/') {
            return Dispatch::BadRequest;
        }

        if let Some(routes) = self.routes.get(method) {
            for route in routes {
                if let Some(params) = route.pattern.match_path(path) {
                    return Dispatch::Matched {
                        handler: &route.handler,
                        params,
                    };
                }
                tracing::trace!(path, pattern = %route.pattern, "path mismatch");
            }
        }

        let mut allowed: Vec<Method> = self
            .routes
            .iter()
            .filter(|(m, _)| *m != method)
            .filter(|(_, routes)| routes.iter().any(|r| r.pattern.match_path(path).is_some()))
            .map(|(m, _)| m.clone())
            .collect();
        if allowed.is_empty() {
            return Dispatch::NotFound;
        }
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Dispatch::MethodNotAllowed { allowed }
    }

    /// [`dispatch`](Self::dispatch) on the method and path of a request.
    #[must_use]
    pub fn dispatch_request<B>(&self, request: &http::Request<B>) -> Dispatch<'_, T> {
        self.dispatch(request.method(), request.uri().path())
    }
}
