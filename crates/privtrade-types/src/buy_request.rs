//! Buy requests registered in shared collections.

use serde::{Deserialize, Serialize};

use crate::AssetId;

/// A buyer's registered intent to purchase an asset.
///
/// On the ledger only the buyer identity bytes are stored under the
/// `BuyRequest` composite key; the asset id is the key attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyRequest {
    #[serde(rename = "assetID")]
    pub id: AssetId,
    #[serde(rename = "buyerID")]
    pub buyer_id: String,
}

impl BuyRequest {
    /// Rebuild a request from its stored value.
    #[must_use]
    pub fn from_stored(id: AssetId, value: &[u8]) -> Self {
        Self {
            id,
            buyer_id: String::from_utf8_lossy(value).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_stored_bytes() {
        let req = BuyRequest::from_stored(AssetId::new("asset1"), b"RetailerA");
        assert_eq!(req.buyer_id, "RetailerA");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["assetID"], "asset1");
        assert_eq!(json["buyerID"], "RetailerA");
    }
}
