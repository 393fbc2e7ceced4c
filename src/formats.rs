//! String Format Registry
//!
//! Process-wide table of `format` name → predicate, consulted by the
//! checker for `String` schemas that carry a `format` option. The defaults
//! below are installed on first access; anything registered under the same
//! name before or after replaces them only through [`register`].

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;
use uuid::{Uuid, Variant};

use crate::error::{Result, SchemaError};

/// Format predicate
pub type FormatFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

static REGISTRY: Lazy<RwLock<HashMap<String, FormatFn>>> =
    Lazy::new(|| RwLock::new(default_formats()));

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.[A-Za-z]{2,}$",
    )
    .expect("static email pattern")
});

static COLOR_HEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("static color-hex pattern"));

/// Hyphenated RFC 4122 version 4 UUID, any case
fn is_uuid_v4(v: &str) -> bool {
    v.len() == 36
        && Uuid::parse_str(v)
            .map_or(false, |u| u.get_version_num() == 4 && u.get_variant() == Variant::RFC4122)
}

fn default_formats() -> HashMap<String, FormatFn> {
    let mut formats: HashMap<String, FormatFn> = HashMap::new();
    formats.insert(
        "date".into(),
        Arc::new(|v: &str| NaiveDate::parse_from_str(v, "%Y-%m-%d").is_ok()),
    );
    formats.insert(
        "date-time".into(),
        Arc::new(|v: &str| DateTime::parse_from_rfc3339(v).is_ok()),
    );
    formats.insert("email".into(), Arc::new(|v: &str| EMAIL.is_match(v)));
    formats.insert("uri".into(), Arc::new(|v: &str| Url::parse(v).is_ok()));
    formats.insert("uuid".into(), Arc::new(is_uuid_v4));
    formats.insert("color-hex".into(), Arc::new(|v: &str| COLOR_HEX.is_match(v)));
    formats
}

/// Register (or replace) a format
pub fn register<F>(name: impl Into<String>, predicate: F)
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(name.into(), Arc::new(predicate));
}

/// Register a format unless one with that name exists. Returns whether the
/// predicate was installed.
pub fn register_if_absent<F>(name: impl Into<String>, predicate: F) -> bool
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    let name = name.into();
    if registry.contains_key(&name) {
        return false;
    }
    registry.insert(name, Arc::new(predicate));
    true
}

/// Register a format backed by a regular expression
pub fn register_pattern(name: impl Into<String>, pattern: &str) -> Result<()> {
    let regex = Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    register(name, move |v| regex.is_match(v));
    Ok(())
}

pub fn has(name: &str) -> bool {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(name)
}

/// Run the named format against `value`; `None` when the format is unknown.
pub fn check(name: &str, value: &str) -> Option<bool> {
    // clone the predicate out so user code never runs under the lock
    let predicate = REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .cloned()?;
    Some(predicate(value))
}
