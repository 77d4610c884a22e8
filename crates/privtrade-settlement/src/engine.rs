//! Trade settlement.
//!
//! A trade moves through these steps:
//! 1. Seller commits an ask in its own collection (`S`)
//! 2. Buyer commits a bid in its own collection (`B`)
//! 3. Buyer files a buy request in the lane's shared collection
//! 4. Seller settles: ask and bid hashes must match bit for bit, the buy
//!    request must name a buyer, and the lane must lead to the buyer's org
//! 5. Ownership flips to the buyer and the ask is consumed
//!
//! Every gate runs before the first write. A failed gate leaves the ledger
//! exactly as it was.

use privtrade_ledger::TxContext;
use privtrade_registry::{
    AssetRegistry, Caller, CollectionRouter, PriceCommitmentStore, authorize_owner,
    require_asset_id, verify_client_org_matches_peer_org,
};
use privtrade_types::{
    Asset, AssetId, AssetTransferInput, BuyRequest, CleanupPolicy, CollectionName, ContentHash,
    ContractConfig, OrgId, PriceRole, PrivtradeError, Result, SaleReceipt, TradeState, constants,
};
use serde::Serialize;

/// What a successful settlement changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    /// The asset as rewritten, now owned by the buyer.
    pub asset: Asset,
    #[serde(rename = "previousOwner")]
    pub previous_owner: String,
    #[serde(rename = "previousOwnerOrg")]
    pub previous_owner_org: OrgId,
    /// Hash both sides committed to.
    #[serde(rename = "priceHash")]
    pub price_hash: ContentHash,
    /// Receipt written to the seller's collection, if receipts are enabled.
    pub receipt: Option<SaleReceipt>,
}

/// Buy requests and settlement of agreed trades.
#[derive(Debug, Clone)]
pub struct TradeSettlementEngine {
    router: CollectionRouter,
    cleanup: CleanupPolicy,
    record_sale_receipts: bool,
}

impl TradeSettlementEngine {
    #[must_use]
    pub fn new(config: &ContractConfig) -> Self {
        Self {
            router: CollectionRouter::new(config),
            cleanup: config.cleanup,
            record_sale_receipts: config.record_sale_receipts,
        }
    }

    // -----------------------------------------------------------------
    // Buy requests
    // -----------------------------------------------------------------

    /// Record the caller as buyer of `asset_id` in its lane's shared collection.
    ///
    /// # Errors
    /// - [`PrivtradeError::UnresolvableIdentity`] for nameless callers
    /// - [`PrivtradeError::UnroutedOrg`] if the caller's org never buys
    /// - [`PrivtradeError::BuyRequestAlreadyExists`] if a request is present
    pub fn register_buy_request(
        &self,
        ctx: &mut TxContext<'_>,
        asset_id: &AssetId,
    ) -> Result<BuyRequest> {
        require_asset_id(asset_id)?;
        let caller = Caller::resolve(ctx.client())?;
        let buyer = caller.require_name()?.to_string();
        let collection = self.router.shared_collection_for_buyer(&caller.org)?;
        let key = buy_request_key(ctx, asset_id)?;

        if ctx.stub().get_private_data_hash(&collection, &key)?.is_some() {
            return Err(PrivtradeError::BuyRequestAlreadyExists {
                asset: asset_id.clone(),
                collection,
            });
        }
        ctx.stub_mut()
            .put_private_data(&collection, &key, buyer.clone().into_bytes())?;

        tracing::info!(
            asset = %asset_id,
            buyer = %buyer,
            collection = %collection,
            state = %TradeState::RequestRegistered,
            "Buy request registered"
        );
        Ok(BuyRequest {
            id: asset_id.clone(),
            buyer_id: buyer,
        })
    }

    /// The buy request for `asset_id` in `collection`, if any.
    ///
    /// # Errors
    /// Propagates collection access failures.
    pub fn read_buy_request(
        &self,
        ctx: &TxContext<'_>,
        asset_id: &AssetId,
        collection: &CollectionName,
    ) -> Result<Option<BuyRequest>> {
        let key = buy_request_key(ctx, asset_id)?;
        Ok(ctx
            .stub()
            .get_private_data(collection, &key)?
            .map(|value| BuyRequest::from_stored(asset_id.clone(), &value)))
    }

    /// Withdraw the caller's own buy request.
    ///
    /// # Errors
    /// - [`PrivtradeError::InvalidInput`] if `collection` is not a lane
    /// - [`PrivtradeError::BuyRequestNotFound`] if absent
    /// - [`PrivtradeError::NotBuyer`] unless the caller filed the request
    pub fn delete_buy_request(
        &self,
        ctx: &mut TxContext<'_>,
        asset_id: &AssetId,
        collection: &CollectionName,
    ) -> Result<()> {
        let lane = self.router.lane_by_collection(collection)?;
        let request = self
            .read_buy_request(ctx, asset_id, collection)?
            .ok_or_else(|| PrivtradeError::BuyRequestNotFound {
                asset: asset_id.clone(),
                collection: collection.clone(),
            })?;
        let caller = Caller::resolve(ctx.client())?;
        let name = caller.require_name()?;
        if name != request.buyer_id || caller.org != lane.buyer_org {
            tracing::warn!(asset = %asset_id, client = name, "Buy request delete refused");
            return Err(PrivtradeError::NotBuyer {
                client: name.to_string(),
                asset: asset_id.clone(),
            });
        }

        let key = buy_request_key(ctx, asset_id)?;
        ctx.stub_mut().del_private_data(collection, &key)?;
        tracing::info!(asset = %asset_id, buyer = name, "Buy request deleted");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Settlement
    // -----------------------------------------------------------------

    /// Transfer an asset to the buyer named in transient `asset_owner`.
    ///
    /// # Errors
    /// Any failed gate; nothing is written in that case:
    /// - [`PrivtradeError::TransientKeyMissing`] / [`PrivtradeError::InvalidInput`]
    ///   for absent or incomplete transfer input
    /// - [`PrivtradeError::AssetNotFound`]
    /// - [`PrivtradeError::PeerOrgMismatch`], [`PrivtradeError::NotOwner`],
    ///   [`PrivtradeError::OwnerOrgMismatch`]
    /// - [`PrivtradeError::CommitmentNotFound`] or
    ///   [`PrivtradeError::PriceHashMismatch`]
    /// - [`PrivtradeError::UnroutedOrg`], [`PrivtradeError::BuyerOrgMismatch`],
    ///   [`PrivtradeError::BuyRequestNotFound`]
    pub fn settle(
        &self,
        registry: &AssetRegistry,
        prices: &PriceCommitmentStore,
        ctx: &mut TxContext<'_>,
    ) -> Result<Settlement> {
        match self.try_settle(registry, prices, ctx) {
            Ok(settlement) => {
                tracing::info!(
                    asset = %settlement.asset.id,
                    from = %settlement.previous_owner,
                    from_org = %settlement.previous_owner_org,
                    to = %settlement.asset.owner,
                    to_org = %settlement.asset.owner_org,
                    price_hash = %settlement.price_hash,
                    state = %TradeState::Settled,
                    "Asset transferred"
                );
                Ok(settlement)
            }
            Err(err) => {
                tracing::warn!(error = %err, kind = %err.kind(), state = %TradeState::Rejected, "Settlement rejected");
                Err(err)
            }
        }
    }

    fn try_settle(
        &self,
        registry: &AssetRegistry,
        prices: &PriceCommitmentStore,
        ctx: &mut TxContext<'_>,
    ) -> Result<Settlement> {
        let input = transfer_input(ctx)?;
        let asset_id = AssetId::new(input.id);
        let buyer_org = OrgId::new(input.buyer_msp);

        let mut asset = registry.read(ctx, &asset_id)?;
        verify_client_org_matches_peer_org(ctx)?;
        let caller = Caller::resolve(ctx.client())?;
        authorize_owner(&caller, &asset)?;

        let price_hash = self.verify_agreement(prices, ctx, &asset, &buyer_org)?;

        let lane = self.router.lane_for_seller(&caller.org)?;
        if lane.buyer_org != buyer_org {
            return Err(PrivtradeError::BuyerOrgMismatch {
                requested: buyer_org,
                lane_buyer: lane.buyer_org.clone(),
            });
        }
        let request = self
            .read_buy_request(ctx, &asset_id, &lane.collection)?
            .filter(|r| !r.buyer_id.is_empty())
            .ok_or_else(|| PrivtradeError::BuyRequestNotFound {
                asset: asset_id.clone(),
                collection: lane.collection.clone(),
            })?;

        let seller_collection = self.router.org_private_collection(&caller.org);
        let ask_key = ctx
            .stub()
            .create_composite_key(PriceRole::ForSale.object_type(), &[asset_id.as_str()])?;
        let receipt = if self.record_sale_receipts {
            let price = ctx
                .stub()
                .get_private_data(&seller_collection, &ask_key)?
                .ok_or_else(|| PrivtradeError::CommitmentNotFound {
                    role: PriceRole::ForSale,
                    asset: asset_id.clone(),
                    collection: seller_collection.clone(),
                })?;
            Some(SaleReceipt {
                asset_id: asset_id.clone(),
                buyer: request.buyer_id.clone(),
                buyer_org: buyer_org.clone(),
                price,
                timestamp: ctx.stub().tx_timestamp(),
            })
        } else {
            None
        };

        // all gates passed; writes start here
        let previous_owner = std::mem::replace(&mut asset.owner, request.buyer_id);
        let previous_owner_org = std::mem::replace(&mut asset.owner_org, buyer_org.clone());
        registry.put(ctx, &asset)?;
        ctx.stub_mut().del_private_data(&seller_collection, &ask_key)?;

        if let Some(receipt) = &receipt {
            let key = ctx.stub().create_composite_key(
                constants::TYPE_ASSET_SALE_RECEIPT,
                &[asset_id.as_str()],
            )?;
            let bytes = serde_json::to_vec(receipt)?;
            ctx.stub_mut()
                .put_private_data(&seller_collection, &key, bytes)?;
        }

        if self.cleanup == CleanupPolicy::Full {
            let buyer_collection = self.router.org_private_collection(&buyer_org);
            let bid_key = ctx
                .stub()
                .create_composite_key(PriceRole::Bid.object_type(), &[asset_id.as_str()])?;
            let request_key = buy_request_key(ctx, &asset_id)?;
            ctx.stub_mut().del_private_data(&buyer_collection, &bid_key)?;
            ctx.stub_mut()
                .del_private_data(&lane.collection, &request_key)?;
            tracing::debug!(asset = %asset_id, "Bid and buy request cleaned up");
        }

        Ok(Settlement {
            asset,
            previous_owner,
            previous_owner_org,
            price_hash,
            receipt,
        })
    }

    /// Check that seller ask and buyer bid exist and hash identically.
    ///
    /// # Errors
    /// - [`PrivtradeError::CommitmentNotFound`] if either side is missing
    /// - [`PrivtradeError::PriceHashMismatch`] if the hashes differ
    pub fn verify_agreement(
        &self,
        prices: &PriceCommitmentStore,
        ctx: &TxContext<'_>,
        asset: &Asset,
        buyer_org: &OrgId,
    ) -> Result<ContentHash> {
        let seller_collection = self.router.org_private_collection(&asset.owner_org);
        let buyer_collection = self.router.org_private_collection(buyer_org);

        let ask = prices
            .price_hash(ctx, &seller_collection, PriceRole::ForSale, &asset.id)?
            .ok_or_else(|| PrivtradeError::CommitmentNotFound {
                role: PriceRole::ForSale,
                asset: asset.id.clone(),
                collection: seller_collection,
            })?;
        let bid = prices
            .price_hash(ctx, &buyer_collection, PriceRole::Bid, &asset.id)?
            .ok_or_else(|| PrivtradeError::CommitmentNotFound {
                role: PriceRole::Bid,
                asset: asset.id.clone(),
                collection: buyer_collection,
            })?;

        if ask != bid {
            return Err(PrivtradeError::PriceHashMismatch {
                seller: ask.to_hex(),
                buyer: bid.to_hex(),
            });
        }
        Ok(ask)
    }

    /// Pre-settlement state of `asset_id` toward `buyer_org`, from hashes only.
    ///
    /// # Errors
    /// [`PrivtradeError::AssetNotFound`] if the asset is absent.
    pub fn trade_state(
        &self,
        registry: &AssetRegistry,
        prices: &PriceCommitmentStore,
        ctx: &TxContext<'_>,
        asset_id: &AssetId,
        buyer_org: &OrgId,
    ) -> Result<TradeState> {
        let asset = registry.read(ctx, asset_id)?;
        let seller_collection = self.router.org_private_collection(&asset.owner_org);
        let buyer_collection = self.router.org_private_collection(buyer_org);

        let has_ask = prices
            .price_hash(ctx, &seller_collection, PriceRole::ForSale, asset_id)?
            .is_some();
        let has_bid = prices
            .price_hash(ctx, &buyer_collection, PriceRole::Bid, asset_id)?
            .is_some();
        let has_request = match (
            self.router.shared_collection_for_seller(&asset.owner_org),
            self.router.shared_collection_for_buyer(buyer_org),
        ) {
            (Ok(lane), Ok(buyer_lane)) if lane == buyer_lane => {
                let key = buy_request_key(ctx, asset_id)?;
                ctx.stub().get_private_data_hash(&lane, &key)?.is_some()
            }
            _ => false,
        };
        Ok(TradeState::infer(has_ask, has_bid, has_request))
    }
}

fn transfer_input(ctx: &TxContext<'_>) -> Result<AssetTransferInput> {
    let raw = ctx
        .stub()
        .transient()
        .require(constants::TRANSIENT_ASSET_OWNER)?;
    let input: AssetTransferInput = serde_json::from_slice(raw)?;
    if input.id.is_empty() {
        return Err(PrivtradeError::InvalidInput {
            reason: "assetID field must be a non-empty string".into(),
        });
    }
    if input.buyer_msp.is_empty() {
        return Err(PrivtradeError::InvalidInput {
            reason: "buyerMSP field must be a non-empty string".into(),
        });
    }
    Ok(input)
}

fn buy_request_key(ctx: &TxContext<'_>, asset_id: &AssetId) -> Result<String> {
    ctx.stub()
        .create_composite_key(constants::BUY_REQUEST_OBJECT_TYPE, &[asset_id.as_str()])
}
