//! Configuration for the asset-transfer contract.
//!
//! The organization topology (who may mint, which shared collection connects
//! which seller to which buyer) is data, not code: adding an organization to
//! the chain means adding a [`TradeLane`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{CollectionName, OrgId, PrivtradeError, Result, constants};

/// A shared collection that carries buy requests from one buyer org to one
/// seller org.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeLane {
    pub collection: CollectionName,
    pub seller_org: OrgId,
    pub buyer_org: OrgId,
}

impl TradeLane {
    #[must_use]
    pub fn new(collection: &str, seller_org: &str, buyer_org: &str) -> Self {
        Self {
            collection: CollectionName::new(collection),
            seller_org: OrgId::new(seller_org),
            buyer_org: OrgId::new(buyer_org),
        }
    }
}

/// What settlement deletes once ownership has moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Delete only the seller's ask. The buyer's bid and the buy request stay.
    #[default]
    SellerAskOnly,
    /// Also delete the buyer's bid and the consumed buy request.
    Full,
}

/// Contract-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// The only organization whose clients may mint assets.
    pub minting_org: OrgId,
    /// Prefix of every organization's implicit collection.
    pub implicit_collection_prefix: String,
    /// Buyer/seller routing through shared collections.
    pub lanes: Vec<TradeLane>,
    /// Collection targeted by rich asset queries.
    pub query_collection: CollectionName,
    /// Post-settlement cleanup.
    pub cleanup: CleanupPolicy,
    /// Write a [`crate::SaleReceipt`] into the seller's collection on settlement.
    pub record_sale_receipts: bool,
}

impl Default for ContractConfig {
    /// The three-organization supply chain: Org1 (farmers) sells to Org2,
    /// Org2 sells to Org3.
    fn default() -> Self {
        Self {
            minting_org: OrgId::new(constants::DEFAULT_MINTING_ORG),
            implicit_collection_prefix: constants::IMPLICIT_COLLECTION_PREFIX.to_string(),
            lanes: vec![
                TradeLane::new(constants::DEFAULT_SHARED_COLLECTION, "Org1MSP", "Org2MSP"),
                TradeLane::new(constants::DEFAULT_SHARED_COLLECTION_23, "Org2MSP", "Org3MSP"),
            ],
            query_collection: CollectionName::new(constants::DEFAULT_SHARED_COLLECTION),
            cleanup: CleanupPolicy::default(),
            record_sale_receipts: true,
        }
    }
}

impl ContractConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PrivtradeError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the topology is unambiguous.
    ///
    /// # Errors
    /// Returns [`PrivtradeError::Configuration`] for empty ids, an empty
    /// prefix, or an org routed twice in the same role.
    pub fn validate(&self) -> Result<()> {
        if self.minting_org.is_empty() {
            return Err(PrivtradeError::Configuration(
                "minting_org must be non-empty".into(),
            ));
        }
        if self.implicit_collection_prefix.is_empty() {
            return Err(PrivtradeError::Configuration(
                "implicit_collection_prefix must be non-empty".into(),
            ));
        }

        let mut sellers = BTreeSet::new();
        let mut buyers = BTreeSet::new();
        for lane in &self.lanes {
            if lane.seller_org.is_empty() || lane.buyer_org.is_empty() {
                return Err(PrivtradeError::Configuration(format!(
                    "lane {} has an empty org",
                    lane.collection
                )));
            }
            if lane.seller_org == lane.buyer_org {
                return Err(PrivtradeError::Configuration(format!(
                    "lane {} routes {} to itself",
                    lane.collection, lane.seller_org
                )));
            }
            if lane
                .collection
                .as_str()
                .starts_with(&self.implicit_collection_prefix)
            {
                return Err(PrivtradeError::Configuration(format!(
                    "lane collection {} collides with implicit collections",
                    lane.collection
                )));
            }
            if !sellers.insert(lane.seller_org.clone()) {
                return Err(PrivtradeError::Configuration(format!(
                    "org {} is seller on more than one lane",
                    lane.seller_org
                )));
            }
            if !buyers.insert(lane.buyer_org.clone()) {
                return Err(PrivtradeError::Configuration(format!(
                    "org {} is buyer on more than one lane",
                    lane.buyer_org
                )));
            }
        }
        Ok(())
    }
}
