//! Collection routing.
//!
//! Maps organizations to where their data lives: each org's implicit
//! collection for its own prices, and the shared trade lane collection for
//! buy requests between a seller org and a buyer org.

use privtrade_ledger::ClientIdentity;
use privtrade_types::{CollectionName, ContractConfig, OrgId, PrivtradeError, Result, TradeLane};

#[derive(Debug, Clone)]
pub struct CollectionRouter {
    implicit_prefix: String,
    lanes: Vec<TradeLane>,
}

impl CollectionRouter {
    #[must_use]
    pub fn new(config: &ContractConfig) -> Self {
        Self {
            implicit_prefix: config.implicit_collection_prefix.clone(),
            lanes: config.lanes.clone(),
        }
    }

    /// Implicit collection of `org`.
    #[must_use]
    pub fn org_private_collection(&self, org: &OrgId) -> CollectionName {
        CollectionName::new(format!("{}{}", self.implicit_prefix, org))
    }

    /// Implicit collection of the calling client's org.
    ///
    /// # Errors
    /// Propagates failures reading the client's MSP id.
    pub fn caller_private_collection(&self, client: &dyn ClientIdentity) -> Result<CollectionName> {
        Ok(self.org_private_collection(&client.msp_id()?))
    }

    /// Lane on which `org` buys.
    ///
    /// # Errors
    /// Returns [`PrivtradeError::UnroutedOrg`] if no lane has `org` as buyer.
    pub fn lane_for_buyer(&self, org: &OrgId) -> Result<&TradeLane> {
        self.lanes
            .iter()
            .find(|lane| &lane.buyer_org == org)
            .ok_or_else(|| PrivtradeError::UnroutedOrg {
                org: org.clone(),
                role: "buyer",
            })
    }

    /// Lane on which `org` sells.
    ///
    /// # Errors
    /// Returns [`PrivtradeError::UnroutedOrg`] if no lane has `org` as seller.
    pub fn lane_for_seller(&self, org: &OrgId) -> Result<&TradeLane> {
        self.lanes
            .iter()
            .find(|lane| &lane.seller_org == org)
            .ok_or_else(|| PrivtradeError::UnroutedOrg {
                org: org.clone(),
                role: "seller",
            })
    }

    /// Lane whose shared collection is `collection`.
    ///
    /// # Errors
    /// Returns [`PrivtradeError::InvalidInput`] if `collection` is not a lane.
    pub fn lane_by_collection(&self, collection: &CollectionName) -> Result<&TradeLane> {
        self.lanes
            .iter()
            .find(|lane| &lane.collection == collection)
            .ok_or_else(|| PrivtradeError::InvalidInput {
                reason: format!("{collection} is not a trade lane collection"),
            })
    }

    /// Shared collection where `org` files buy requests.
    ///
    /// # Errors
    /// Returns [`PrivtradeError::UnroutedOrg`] if `org` never buys.
    pub fn shared_collection_for_buyer(&self, org: &OrgId) -> Result<CollectionName> {
        Ok(self.lane_for_buyer(org)?.collection.clone())
    }

    /// Shared collection where buy requests for `org`'s assets are found.
    ///
    /// # Errors
    /// Returns [`PrivtradeError::UnroutedOrg`] if `org` never sells.
    pub fn shared_collection_for_seller(&self, org: &OrgId) -> Result<CollectionName> {
        Ok(self.lane_for_seller(org)?.collection.clone())
    }
}
