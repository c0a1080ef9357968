//! Branch/ref name validation
//!
//! Every ref name that ends up in a git invocation must pass this allow-list
//! first. Validation happens before any subprocess is constructed.

use std::sync::LazyLock;

use regex::Regex;

use crate::{Error, Result};

/// Allow-list for branch/ref names: word characters, hyphen, slash, plus, dot
static REF_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\-/+.]+$").expect("Invalid ref name regex"));

/// Stricter allow-list for single-component names: word characters and
/// hyphen only
///
/// Remote names and new-branch base names take this form; a slash or dot in
/// either would produce misleading composed branch names.
static NAME_COMPONENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]+$").expect("Invalid name component regex"));

/// Validate a branch/ref name against the syntax allow-list
///
/// Returns the name unchanged on success so call sites can validate inline.
pub fn validate_ref(name: &str) -> Result<&str> {
    if name.is_empty() || !REF_NAME_REGEX.is_match(name) {
        return Err(Error::InvalidRef {
            name: name.to_string(),
        });
    }
    Ok(name)
}

/// Validate a single-component name (remote, new-branch base name)
pub fn validate_name_component(name: &str) -> Result<&str> {
    if name.is_empty() || !NAME_COMPONENT_REGEX.is_match(name) {
        return Err(Error::InvalidRef {
            name: name.to_string(),
        });
    }
    Ok(name)
}
