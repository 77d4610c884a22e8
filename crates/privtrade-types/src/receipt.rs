//! Sale receipts kept by the selling organization.
//!
//! After a successful settlement the seller's peer records what was sold, to
//! whom, at which price and when. The receipt lives in the seller's own
//! collection, so the plaintext price never leaves the seller organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AssetId, OrgId};

/// Record of a completed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReceipt {
    #[serde(rename = "assetID")]
    pub asset_id: AssetId,
    pub buyer: String,
    #[serde(rename = "buyerOrg")]
    pub buyer_org: OrgId,
    /// Ask price bytes exactly as committed.
    #[serde(with = "hex::serde")]
    pub price: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_is_hex_on_the_wire() {
        let receipt = SaleReceipt {
            asset_id: AssetId::new("asset1"),
            buyer: "RetailerA".into(),
            buyer_org: OrgId::new("Org2MSP"),
            price: b"100".to_vec(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["price"], "313030");
        let back: SaleReceipt = serde_json::from_value(json).unwrap();
        assert_eq!(back, receipt);
    }
}
