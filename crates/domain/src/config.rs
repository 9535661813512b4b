//! Order configuration loaded from environment variables.

use std::sync::Arc;

use crate::policy::{ErrorPolicy, LenientPolicy, StrictPolicy};

/// How orders react to precondition violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    /// Violations abort the operation with an error.
    Strict,
    /// Violations are logged and the operation yields a neutral result.
    Lenient,
}

impl ErrorMode {
    /// Strict in debug builds, lenient in release builds.
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            ErrorMode::Strict
        } else {
            ErrorMode::Lenient
        }
    }
}

/// Order configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `SHOP_STRICT_ERRORS`: `true`/`1`/`yes` for strict, `false`/`0`/`no`
///   for lenient (default: strict in debug builds, lenient in release)
/// - `SHOP_TAX_CLASSES`: comma separated tax classes every new order's
///   ledgers start with (default: `"standard"`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct OrderConfig {
    pub error_mode: ErrorMode,
    pub tax_classes: Vec<String>,
    pub log_level: String,
}

impl OrderConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through a variable lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            error_mode: lookup("SHOP_STRICT_ERRORS")
                .and_then(|v| parse_flag(&v))
                .map(|strict| {
                    if strict {
                        ErrorMode::Strict
                    } else {
                        ErrorMode::Lenient
                    }
                })
                .unwrap_or(defaults.error_mode),
            tax_classes: lookup("SHOP_TAX_CLASSES")
                .map(|v| parse_classes(&v))
                .filter(|classes| !classes.is_empty())
                .unwrap_or(defaults.tax_classes),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Returns the error policy for the configured mode.
    pub fn policy(&self) -> Arc<dyn ErrorPolicy> {
        match self.error_mode {
            ErrorMode::Strict => Arc::new(StrictPolicy),
            ErrorMode::Lenient => Arc::new(LenientPolicy),
        }
    }
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::for_build(),
            tax_classes: vec!["standard".to_string()],
            log_level: "info".to_string(),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_classes(value: &str) -> Vec<String> {
    let mut classes: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|class| !class.is_empty())
        .map(str::to_string)
        .collect();
    classes.dedup();
    classes
}
