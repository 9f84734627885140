//! Routing-safety rules for raw template strings.
//!
//! Independent of the grammar: a template can parse fine and still be
//! rejected here, and this pass never looks at tokens. It enforces two rules:
//!
//! - at most [`ValidatorConfig::max_static_segments_at_start`] static
//!   segments before the first dynamic one;
//! - once a dynamic segment (`*`, `**` or `{...}`) has been seen, no two
//!   static segments in a row, unless
//!   [`ValidatorConfig::allow_consecutive_statics`] is set.
//!
//! [`ValidatorConfig`] is the explicit policy. The free functions read a
//! process-wide default held in atomics, so toggling it while routes are
//! being registered is race-free.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Default cap on leading static segments.
pub const DEFAULT_MAX_STATIC_SEGMENTS: usize = 4;

static VALIDATION_ENABLED: AtomicBool = AtomicBool::new(true);
static MAX_STATIC_SEGMENTS: AtomicUsize = AtomicUsize::new(DEFAULT_MAX_STATIC_SEGMENTS);

/// A template rejected by the routing-safety rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid URL pattern: {message} (pattern: {pattern})")]
pub struct ValidationError {
    /// Which rule failed.
    pub message: String,
    /// The rejected template.
    pub pattern: String,
}

impl ValidationError {
    fn new(message: impl Into<String>, pattern: &str) -> Self {
        Self {
            message: message.into(),
            pattern: pattern.to_string(),
        }
    }
}

/// Rule engine with a fixed policy. Always validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlPatternValidator {
    /// Leading static segments allowed before the first dynamic one.
    pub max_static_segments_at_start: usize,
    /// Accept adjacent static segments after a dynamic one.
    pub allow_consecutive_statics: bool,
}

impl Default for UrlPatternValidator {
    fn default() -> Self {
        Self {
            max_static_segments_at_start: DEFAULT_MAX_STATIC_SEGMENTS,
            allow_consecutive_statics: false,
        }
    }
}

impl UrlPatternValidator {
    /// Check `pattern` against both rules.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty pattern, a missing leading
    /// `/`, or a rule violation.
    pub fn validate_url_pattern(&self, pattern: &str) -> Result<(), ValidationError> {
        if pattern.is_empty() {
            return Err(ValidationError::new("empty URL template", pattern));
        }
        let Some(mut path) = pattern.strip_prefix('/') else {
            return Err(ValidationError::new(
                "URL template must start with '/'",
                pattern,
            ));
        };

        // a colon followed by `{` belongs to a variable, not a verb
        if let Some(idx) = path.rfind(':').filter(|&idx| idx > 0) {
            if !path[idx..].contains('{') {
                path = &path[..idx];
            }
        }
        if path.is_empty() {
            return Ok(());
        }

        self.check_segments(&split_top_level(path), pattern)
    }

    fn check_segments(&self, segments: &[&str], pattern: &str) -> Result<(), ValidationError> {
        let mut leading_statics = 0;
        let mut seen_dynamic = false;
        let mut last_was_static = false;

        for (i, segment) in segments.iter().enumerate() {
            if !is_static(segment) {
                seen_dynamic = true;
                last_was_static = false;
                continue;
            }
            if !seen_dynamic {
                leading_statics += 1;
            }
            if seen_dynamic && last_was_static && !self.allow_consecutive_statics {
                return Err(ValidationError::new(
                    format!(
                        "static segment '{}' followed by static segment '{segment}' at positions {i}-{}",
                        segments[i - 1],
                        i + 1
                    ),
                    pattern,
                ));
            }
            last_was_static = true;
        }

        if leading_statics > self.max_static_segments_at_start {
            return Err(ValidationError::new(
                format!(
                    "more than {} static segments at the beginning: found {leading_statics}",
                    self.max_static_segments_at_start
                ),
                pattern,
            ));
        }
        Ok(())
    }
}

/// Split on `/` outside braces, dropping empty pieces.
fn split_top_level(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0_i32;
    let mut start = 0;
    for (i, b) in path.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            b'/' if depth == 0 => {
                if i > start {
                    segments.push(&path[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < path.len() {
        segments.push(&path[start..]);
    }
    segments
}

fn is_static(segment: &str) -> bool {
    let wildcard = segment == "*" || segment == "**";
    let variable = segment.starts_with('{') && segment.ends_with('}');
    !(wildcard || variable)
}

/// Explicit validation policy.
///
/// Deserializes from config files with every field optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// When `false`, [`validate`](Self::validate) accepts everything.
    pub enabled: bool,
    /// Leading static segments allowed before the first dynamic one.
    pub max_static_segments_at_start: usize,
    /// Accept adjacent static segments after a dynamic one.
    pub allow_consecutive_statics: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_static_segments_at_start: DEFAULT_MAX_STATIC_SEGMENTS,
            allow_consecutive_statics: false,
        }
    }
}

impl ValidatorConfig {
    /// Turn validation on or off.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the leading static segment cap.
    #[must_use]
    pub const fn max_static_segments_at_start(mut self, max: usize) -> Self {
        self.max_static_segments_at_start = max;
        self
    }

    /// Accept or reject adjacent statics after a dynamic segment.
    #[must_use]
    pub const fn allow_consecutive_statics(mut self, allow: bool) -> Self {
        self.allow_consecutive_statics = allow;
        self
    }

    /// The rule engine for this policy.
    #[must_use]
    pub const fn validator(&self) -> UrlPatternValidator {
        UrlPatternValidator {
            max_static_segments_at_start: self.max_static_segments_at_start,
            allow_consecutive_statics: self.allow_consecutive_statics,
        }
    }

    /// Validate `pattern` under this policy.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when enabled and a rule fails.
    pub fn validate(&self, pattern: &str) -> Result<(), ValidationError> {
        if !self.enabled {
            tracing::debug!(pattern, "URL pattern validation disabled, accepting");
            return Ok(());
        }
        self.validator().validate_url_pattern(pattern)
    }
}

/// Enable or disable the process-wide validation.
///
/// Disabling is an escape hatch for exceptional templates.
pub fn set_url_validation_enabled(enabled: bool) {
    VALIDATION_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Change the process-wide leading static segment cap.
pub fn set_max_static_segments(max: usize) {
    MAX_STATIC_SEGMENTS.store(max, Ordering::Relaxed);
}

/// Snapshot of the process-wide policy.
#[must_use]
pub fn validation_config() -> ValidatorConfig {
    ValidatorConfig {
        enabled: VALIDATION_ENABLED.load(Ordering::Relaxed),
        max_static_segments_at_start: MAX_STATIC_SEGMENTS.load(Ordering::Relaxed),
        allow_consecutive_statics: false,
    }
}

/// Validate under the process-wide policy.
///
/// # Errors
///
/// See [`ValidatorConfig::validate`].
pub fn validate_template(template: &str) -> Result<(), ValidationError> {
    validation_config().validate(template)
}

/// `true` when [`validate_template`] accepts `pattern`.
#[must_use]
pub fn is_valid_url_pattern(pattern: &str) -> bool {
    validate_template(pattern).is_ok()
}
