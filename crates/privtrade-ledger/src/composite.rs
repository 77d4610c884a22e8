//! Composite keys: an object type plus ordered attributes in one storable key.
//!
//! Layout: `U+0000 objectType U+0000 (attr U+0000)*`. The leading namespace
//! byte keeps composite keys apart from plain keys, and the delimiter sorts
//! below every other code point so a partial key is a strict range prefix.

use privtrade_types::{PrivtradeError, Result};

const COMPOSITE_NAMESPACE: char = '\u{0}';
const MIN_UNICODE_RUNE: char = '\u{0}';
const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

fn validate_component(component: &str) -> Result<()> {
    if component.contains(MIN_UNICODE_RUNE) || component.contains(MAX_UNICODE_RUNE) {
        return Err(PrivtradeError::InvalidCompositeKey {
            reason: format!("component {component:?} contains a reserved code point"),
        });
    }
    Ok(())
}

/// Combine `object_type` and `attributes` into a composite key.
pub fn create_composite_key(object_type: &str, attributes: &[&str]) -> Result<String> {
    validate_component(object_type)?;
    let mut key = String::with_capacity(
        2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>(),
    );
    key.push(COMPOSITE_NAMESPACE);
    key.push_str(object_type);
    key.push(MIN_UNICODE_RUNE);
    for attribute in attributes {
        validate_component(attribute)?;
        key.push_str(attribute);
        key.push(MIN_UNICODE_RUNE);
    }
    Ok(key)
}

/// Split a composite key back into its object type and attributes.
pub fn split_composite_key(key: &str) -> Result<(String, Vec<String>)> {
    let rest = key
        .strip_prefix(COMPOSITE_NAMESPACE)
        .ok_or_else(|| PrivtradeError::InvalidCompositeKey {
            reason: "missing composite namespace".into(),
        })?;
    let rest = rest
        .strip_suffix(MIN_UNICODE_RUNE)
        .ok_or_else(|| PrivtradeError::InvalidCompositeKey {
            reason: "missing trailing delimiter".into(),
        })?;

    let mut parts = rest.split(MIN_UNICODE_RUNE);
    let object_type = parts.next().unwrap_or_default().to_string();
    let attributes = parts.map(ToString::to_string).collect();
    Ok((object_type, attributes))
}
