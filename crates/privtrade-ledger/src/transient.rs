//! Transient input: caller data delivered with an invocation but never
//! written to the ledger.

use std::collections::BTreeMap;

use privtrade_types::{PrivtradeError, Result};

/// Key/value bytes passed alongside a proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransientMap(BTreeMap<String, Vec<u8>>);

impl TransientMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// Fetch a field the operation cannot proceed without.
    ///
    /// # Errors
    /// Returns [`PrivtradeError::TransientKeyMissing`] if `key` is absent.
    pub fn require(&self, key: &str) -> Result<&[u8]> {
        self.get(key)
            .ok_or_else(|| PrivtradeError::TransientKeyMissing(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_present_and_missing() {
        let mut map = TransientMap::new();
        map.insert("asset_price", b"100".to_vec());
        assert_eq!(map.require("asset_price").unwrap(), b"100");
        let err = map.require("asset_owner").unwrap_err();
        assert!(matches!(err, PrivtradeError::TransientKeyMissing(k) if k == "asset_owner"));
    }
}
