//! The contract surface.
//!
//! [`AssetTransferContract`] wires the registry, the price store and the
//! settlement engine together behind one method per contract function.
//! [`AssetTransferContract::invoke`] dispatches by function name with string
//! arguments and returns the JSON-encoded result.

use privtrade_ledger::TxContext;
use privtrade_registry::{
    AssetRegistry, CollectionRouter, PriceCommitmentStore, resolve_caller_dn,
    resolve_caller_identity,
};
use privtrade_types::{
    Asset, AssetId, AssetPrivateDetails, BuyRequest, CollectionName, ContractConfig, OrgId,
    PriceRole, PrivtradeError, Result, TradeState, constants,
};
use serde::Serialize;

use crate::engine::{Settlement, TradeSettlementEngine};

pub struct AssetTransferContract {
    config: ContractConfig,
    registry: AssetRegistry,
    prices: PriceCommitmentStore,
    engine: TradeSettlementEngine,
}

impl AssetTransferContract {
    /// Build the contract from a validated configuration.
    ///
    /// # Errors
    /// Returns [`PrivtradeError::Configuration`] if `config` is inconsistent.
    pub fn new(config: ContractConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            contract = constants::CONTRACT_NAME,
            version = constants::VERSION,
            minting_org = %config.minting_org,
            lanes = config.lanes.len(),
            cleanup = ?config.cleanup,
            "Contract configured"
        );
        Ok(Self {
            registry: AssetRegistry::new(&config),
            prices: PriceCommitmentStore::new(CollectionRouter::new(&config)),
            engine: TradeSettlementEngine::new(&config),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    // --- identity ---

    /// Common name of the submitting client; empty if it carries none.
    pub fn get_submitting_client_identity(&self, ctx: &TxContext<'_>) -> Result<String> {
        resolve_caller_identity(ctx.client())
    }

    /// Decoded `x509::<subject>::<issuer>` string of the submitting client.
    pub fn get_submitting_client_dn(&self, ctx: &TxContext<'_>) -> Result<String> {
        resolve_caller_dn(ctx.client())
    }

    // --- assets ---

    pub fn init_ledger(&self, ctx: &mut TxContext<'_>) -> Result<Vec<Asset>> {
        self.registry.init_ledger(ctx)
    }

    pub fn create_asset(
        &self,
        ctx: &mut TxContext<'_>,
        id: &str,
        color: &str,
        weight: u32,
        asset_type: &str,
    ) -> Result<Asset> {
        self.registry
            .create(ctx, &AssetId::new(id), color, weight, asset_type)
    }

    pub fn update_asset(
        &self,
        ctx: &mut TxContext<'_>,
        id: &str,
        color: &str,
        weight: u32,
    ) -> Result<Asset> {
        self.registry.update(ctx, &AssetId::new(id), color, weight)
    }

    pub fn delete_asset(&self, ctx: &mut TxContext<'_>, id: &str) -> Result<()> {
        self.registry.delete(ctx, &AssetId::new(id))
    }

    pub fn asset_exists(&self, ctx: &TxContext<'_>, id: &str) -> Result<bool> {
        self.registry.exists(ctx, &AssetId::new(id))
    }

    pub fn read_asset(&self, ctx: &TxContext<'_>, id: &str) -> Result<Asset> {
        self.registry.read(ctx, &AssetId::new(id))
    }

    pub fn query_asset_by_owner(
        &self,
        ctx: &TxContext<'_>,
        asset_type: &str,
        owner: &str,
    ) -> Result<Vec<Asset>> {
        self.registry.query_by_owner_and_type(ctx, asset_type, owner)
    }

    pub fn query_assets(&self, ctx: &TxContext<'_>, query: &str) -> Result<Vec<Asset>> {
        self.registry.query(ctx, query)
    }

    // --- prices ---

    /// Seller's ask, from transient `asset_price`.
    pub fn set_price(&self, ctx: &mut TxContext<'_>, id: &str) -> Result<()> {
        self.prices.set_ask(&self.registry, ctx, &AssetId::new(id))
    }

    /// Buyer's bid, from transient `asset_price`.
    pub fn agree_to_buy(&self, ctx: &mut TxContext<'_>, id: &str) -> Result<()> {
        self.prices.set_bid(ctx, &AssetId::new(id))
    }

    pub fn get_asset_sales_price(&self, ctx: &TxContext<'_>, id: &str) -> Result<Vec<u8>> {
        self.prices
            .read_own_price(ctx, PriceRole::ForSale, &AssetId::new(id))
    }

    pub fn get_asset_bid_price(&self, ctx: &TxContext<'_>, id: &str) -> Result<Vec<u8>> {
        self.prices.read_own_price(ctx, PriceRole::Bid, &AssetId::new(id))
    }

    pub fn read_asset_private_details(
        &self,
        ctx: &TxContext<'_>,
        collection: &str,
        id: &str,
    ) -> Result<Option<AssetPrivateDetails>> {
        self.prices
            .read_private_details(ctx, &CollectionName::new(collection), &AssetId::new(id))
    }

    /// Asset ids carrying a `role` commitment in the caller's own collection.
    pub fn list_commitments(&self, ctx: &TxContext<'_>, role: PriceRole) -> Result<Vec<AssetId>> {
        self.prices.list_commitments(ctx, role)
    }

    // --- trading ---

    pub fn request_to_buy(&self, ctx: &mut TxContext<'_>, id: &str) -> Result<BuyRequest> {
        self.engine.register_buy_request(ctx, &AssetId::new(id))
    }

    pub fn read_request_to_buy(
        &self,
        ctx: &TxContext<'_>,
        id: &str,
        collection: &str,
    ) -> Result<Option<BuyRequest>> {
        self.engine
            .read_buy_request(ctx, &AssetId::new(id), &CollectionName::new(collection))
    }

    pub fn delete_buy_request(
        &self,
        ctx: &mut TxContext<'_>,
        id: &str,
        collection: &str,
    ) -> Result<()> {
        self.engine
            .delete_buy_request(ctx, &AssetId::new(id), &CollectionName::new(collection))
    }

    /// Settle, reading `{"assetID", "buyerMSP"}` from transient `asset_owner`.
    pub fn transfer_requested_asset(&self, ctx: &mut TxContext<'_>) -> Result<Settlement> {
        self.engine.settle(&self.registry, &self.prices, ctx)
    }

    pub fn get_trade_state(
        &self,
        ctx: &TxContext<'_>,
        id: &str,
        buyer_org: &str,
    ) -> Result<TradeState> {
        self.engine.trade_state(
            &self.registry,
            &self.prices,
            ctx,
            &AssetId::new(id),
            &OrgId::new(buyer_org),
        )
    }

    // --- dispatch ---

    /// Run contract function `function` with positional string arguments.
    ///
    /// Returns the JSON encoding of the function's result; functions without
    /// a result return an empty payload.
    ///
    /// # Errors
    /// - [`PrivtradeError::UnknownFunction`] for unrecognised names
    /// - [`PrivtradeError::InvalidInput`] for wrong argument counts or values
    /// - whatever the function itself returns
    pub fn invoke(&self, ctx: &mut TxContext<'_>, function: &str, args: &[&str]) -> Result<Vec<u8>> {
        tracing::debug!(function, args = args.len(), tx = %ctx.stub().tx_id(), "Invoke");
        match function {
            "GetSubmittingClientIdentity" => {
                arity(function, args, 0)?;
                encode(&self.get_submitting_client_identity(ctx)?)
            }
            "GetSubmittingClientDN" => {
                arity(function, args, 0)?;
                encode(&self.get_submitting_client_dn(ctx)?)
            }
            "InitLedger" => {
                arity(function, args, 0)?;
                encode(&self.init_ledger(ctx)?)
            }
            "CreateAsset" => {
                arity(function, args, 4)?;
                let weight = parse_weight(args[2])?;
                encode(&self.create_asset(ctx, args[0], args[1], weight, args[3])?)
            }
            "UpdateAsset" => {
                arity(function, args, 3)?;
                let weight = parse_weight(args[2])?;
                encode(&self.update_asset(ctx, args[0], args[1], weight)?)
            }
            "DeleteAsset" => {
                arity(function, args, 1)?;
                self.delete_asset(ctx, args[0])?;
                Ok(Vec::new())
            }
            "AssetExists" => {
                arity(function, args, 1)?;
                encode(&self.asset_exists(ctx, args[0])?)
            }
            "ReadAsset" => {
                arity(function, args, 1)?;
                encode(&self.read_asset(ctx, args[0])?)
            }
            "SetPrice" => {
                arity(function, args, 1)?;
                self.set_price(ctx, args[0])?;
                Ok(Vec::new())
            }
            "AgreeToBuy" => {
                arity(function, args, 1)?;
                self.agree_to_buy(ctx, args[0])?;
                Ok(Vec::new())
            }
            "RequestToBuy" => {
                arity(function, args, 1)?;
                self.request_to_buy(ctx, args[0])?;
                Ok(Vec::new())
            }
            "DeleteBuyRequest" => {
                arity(function, args, 2)?;
                self.delete_buy_request(ctx, args[0], args[1])?;
                Ok(Vec::new())
            }
            "TransferRequestedAsset" => {
                arity(function, args, 0)?;
                encode(&self.transfer_requested_asset(ctx)?)
            }
            "GetAssetSalesPrice" => {
                arity(function, args, 1)?;
                encode(&price_text(self.get_asset_sales_price(ctx, args[0])?)?)
            }
            "GetAssetBidPrice" => {
                arity(function, args, 1)?;
                encode(&price_text(self.get_asset_bid_price(ctx, args[0])?)?)
            }
            "QueryAssetByOwner" => {
                arity(function, args, 2)?;
                encode(&self.query_asset_by_owner(ctx, args[0], args[1])?)
            }
            "QueryAssets" => {
                arity(function, args, 1)?;
                encode(&self.query_assets(ctx, args[0])?)
            }
            "ReadRequestToBuy" => {
                arity(function, args, 2)?;
                encode(&self.read_request_to_buy(ctx, args[0], args[1])?)
            }
            "ReadAssetPrivateDetails" => {
                arity(function, args, 2)?;
                encode(&self.read_asset_private_details(ctx, args[0], args[1])?)
            }
            "GetTradeState" => {
                arity(function, args, 2)?;
                encode(&self.get_trade_state(ctx, args[0], args[1])?)
            }
            other => Err(PrivtradeError::UnknownFunction(other.to_string())),
        }
    }
}

fn arity(function: &str, args: &[&str], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(PrivtradeError::InvalidInput {
            reason: format!("{function} takes {expected} arguments, got {}", args.len()),
        });
    }
    Ok(())
}

fn parse_weight(raw: &str) -> Result<u32> {
    raw.parse().map_err(|_| PrivtradeError::InvalidInput {
        reason: format!("weight must be a non-negative integer, got {raw:?}"),
    })
}

/// Stored prices go back to the caller as text; bytes that are not UTF-8
/// are refused rather than altered.
fn price_text(price: Vec<u8>) -> Result<String> {
    String::from_utf8(price).map_err(|e| PrivtradeError::InvalidInput {
        reason: format!("stored price is not UTF-8 text: {e}"),
    })
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}
