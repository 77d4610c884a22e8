//! Price commitments and their content hashes.
//!
//! A commitment is an opaque price value stored in the writer's own
//! organization collection. Other organizations never read it; they can only
//! obtain its [`ContentHash`] from the ledger and compare hashes.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AssetId, constants};

/// Role tag under which a price is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceRole {
    /// Seller's asking price.
    ForSale,
    /// Buyer's bid price.
    Bid,
}

impl PriceRole {
    /// Composite-key object type for this role.
    #[must_use]
    pub fn object_type(self) -> &'static str {
        match self {
            Self::ForSale => constants::TYPE_ASSET_FOR_SALE,
            Self::Bid => constants::TYPE_ASSET_BID,
        }
    }
}

impl fmt::Display for PriceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForSale => write!(f, "FOR_SALE"),
            Self::Bid => write!(f, "BID"),
        }
    }
}

/// SHA-256 digest of a private value, as reported by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(#[serde(with = "hex::serde")] pub [u8; 32]);

impl ContentHash {
    /// Hash `value` the way the ledger hashes private data.
    #[must_use]
    pub fn of(value: &[u8]) -> Self {
        Self(Sha256::digest(value).into())
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Structured private details of an asset kept in an organization collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPrivateDetails {
    #[serde(rename = "assetID")]
    pub id: AssetId,
    pub price: u64,
}
