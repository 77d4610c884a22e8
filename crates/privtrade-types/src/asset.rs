//! The public asset record and transfer input.
//!
//! An [`Asset`] lives in the public world state under its own id. Its
//! `owner`/`owner_org` pair is the authoritative ownership record and is only
//! changed by settlement.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{AssetId, OrgId, constants};

/// A uniquely identified tradeable asset.
///
/// Field names on the wire follow the ledger's established JSON layout so
/// records written by earlier contract versions stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "assetType")]
    pub asset_type: String,
    #[serde(rename = "ID")]
    pub id: AssetId,
    pub color: String,
    pub weight: u32,
    /// Common name of the owning client.
    pub owner: String,
    #[serde(rename = "ownerOrg")]
    pub owner_org: OrgId,
    /// Ledger transaction time of creation.
    pub timestamp: DateTime<Utc>,
    /// Full distinguished name of the minting client (audit only).
    pub creator: String,
    #[serde(rename = "expirationDate")]
    pub expiration_date: DateTime<Utc>,
    #[serde(rename = "sensorData", default)]
    pub sensor_data: String,
}

impl Asset {
    /// Expiration date for an asset created at `timestamp`.
    #[must_use]
    pub fn expiration_for(timestamp: DateTime<Utc>) -> DateTime<Utc> {
        timestamp + Duration::days(constants::EXPIRATION_DAYS)
    }

    /// Whether `client`/`client_org` is the asset's current owner pair.
    #[must_use]
    pub fn is_owned_by(&self, client: &str, client_org: &OrgId) -> bool {
        !client.is_empty() && self.owner == client && &self.owner_org == client_org
    }
}

/// Transfer parameters passed through the `asset_owner` transient field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTransferInput {
    #[serde(rename = "assetID", default)]
    pub id: String,
    #[serde(rename = "buyerMSP", default)]
    pub buyer_msp: String,
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Asset {
    pub fn dummy(id: &str, owner: &str, owner_org: &str) -> Self {
        let timestamp = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default();
        Self {
            asset_type: "apples".to_string(),
            id: AssetId::new(id),
            color: "red".to_string(),
            weight: 10,
            owner: owner.to_string(),
            owner_org: OrgId::new(owner_org),
            timestamp,
            creator: format!("x509::CN={owner},OU=client::CN=ca"),
            expiration_date: Self::expiration_for(timestamp),
            sensor_data: String::new(),
        }
    }
}
