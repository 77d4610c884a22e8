//! Public asset registry.
//!
//! Assets live in world state keyed by their id. Only the minting org's
//! farmers create them; only the owner pair (name + org) updates or deletes
//! them. Ownership changes go through settlement, which writes back with
//! [`AssetRegistry::put`].

use privtrade_ledger::{QueryIter, TxContext};
use privtrade_types::{
    Asset, AssetId, CollectionName, ContractConfig, OrgId, PrivtradeError, Result,
};
use serde_json::json;

use crate::identity::{Caller, verify_client_org_matches_peer_org};

/// Seed assets minted by `init_ledger`: (id, color, type, weight).
const SEED_ASSETS: [(&str, &str, &str, u32); 6] = [
    ("asset1", "blue", "berries", 5),
    ("asset2", "black", "berries", 5),
    ("asset3", "green", "apples", 10),
    ("asset4", "yellow", "apples", 10),
    ("asset5", "red", "apples", 15),
    ("asset6", "white", "grapes", 15),
];

/// Reads and writes the public asset records.
#[derive(Debug, Clone)]
pub struct AssetRegistry {
    minting_org: OrgId,
    query_collection: CollectionName,
}

impl AssetRegistry {
    #[must_use]
    pub fn new(config: &ContractConfig) -> Self {
        Self {
            minting_org: config.minting_org.clone(),
            query_collection: config.query_collection.clone(),
        }
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    /// Whether an asset with `id` is recorded.
    ///
    /// # Errors
    /// Propagates ledger failures; absence is `Ok(false)`.
    pub fn exists(&self, ctx: &TxContext<'_>, id: &AssetId) -> Result<bool> {
        Ok(ctx.stub().get_state(id.as_str())?.is_some())
    }

    /// Load the asset recorded under `id`.
    ///
    /// # Errors
    /// - [`PrivtradeError::AssetNotFound`] if absent
    /// - [`PrivtradeError::Serialization`] if the stored record is not an asset
    pub fn read(&self, ctx: &TxContext<'_>, id: &AssetId) -> Result<Asset> {
        let bytes = ctx
            .stub()
            .get_state(id.as_str())?
            .ok_or_else(|| PrivtradeError::AssetNotFound(id.clone()))?;
        tracing::debug!(asset = %id, bytes = bytes.len(), "Asset read");
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Assets of `asset_type` owned by `owner`, from the query collection.
    ///
    /// # Errors
    /// Fails on query errors or on any stored record that is not an asset.
    pub fn query_by_owner_and_type(
        &self,
        ctx: &TxContext<'_>,
        asset_type: &str,
        owner: &str,
    ) -> Result<Vec<Asset>> {
        let query = json!({
            "selector": {
                "assetType": asset_type,
                "owner": owner,
            }
        });
        self.query(ctx, &query.to_string())
    }

    /// Run an arbitrary selector query over the query collection.
    ///
    /// # Errors
    /// Fails on query errors or on any stored record that is not an asset.
    pub fn query(&self, ctx: &TxContext<'_>, query: &str) -> Result<Vec<Asset>> {
        let results = ctx
            .stub()
            .get_private_data_query_result(&self.query_collection, query)?;
        collect_assets(results)
    }

    // -----------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------

    /// Mint a new asset owned by the caller.
    ///
    /// # Errors
    /// - [`PrivtradeError::AssetAlreadyExists`] if `id` is taken
    /// - [`PrivtradeError::MintNotAuthorized`] unless the caller is a farmer,
    ///   not a retailer, of the minting org
    /// - [`PrivtradeError::PeerOrgMismatch`] if submitted through another org's peer
    pub fn create(
        &self,
        ctx: &mut TxContext<'_>,
        id: &AssetId,
        color: &str,
        weight: u32,
        asset_type: &str,
    ) -> Result<Asset> {
        require_asset_id(id)?;
        if self.exists(ctx, id)? {
            return Err(PrivtradeError::AssetAlreadyExists(id.clone()));
        }
        let caller = self.authorize_mint(ctx)?;

        let timestamp = ctx.stub().tx_timestamp();
        let asset = Asset {
            asset_type: asset_type.to_string(),
            id: id.clone(),
            color: color.to_string(),
            weight,
            owner: caller.name.clone(),
            owner_org: caller.org.clone(),
            timestamp,
            creator: caller.dn.clone(),
            expiration_date: Asset::expiration_for(timestamp),
            sensor_data: String::new(),
        };
        self.put(ctx, &asset)?;

        tracing::info!(
            asset = %asset.id,
            owner = %asset.owner,
            org = %asset.owner_org,
            expires = %asset.expiration_date,
            "Asset created"
        );
        Ok(asset)
    }

    /// Mint the six demo assets, all owned by the caller.
    ///
    /// # Errors
    /// Same gates as [`create`](Self::create); any seed id already present is
    /// a conflict and nothing is written.
    pub fn init_ledger(&self, ctx: &mut TxContext<'_>) -> Result<Vec<Asset>> {
        for (id, ..) in SEED_ASSETS {
            let id = AssetId::new(id);
            if self.exists(ctx, &id)? {
                return Err(PrivtradeError::AssetAlreadyExists(id));
            }
        }
        let caller = self.authorize_mint(ctx)?;

        let timestamp = ctx.stub().tx_timestamp();
        let mut minted = Vec::with_capacity(SEED_ASSETS.len());
        for (id, color, asset_type, weight) in SEED_ASSETS {
            let asset = Asset {
                asset_type: asset_type.to_string(),
                id: AssetId::new(id),
                color: color.to_string(),
                weight,
                owner: caller.name.clone(),
                owner_org: caller.org.clone(),
                timestamp,
                creator: caller.dn.clone(),
                expiration_date: Asset::expiration_for(timestamp),
                sensor_data: String::new(),
            };
            self.put(ctx, &asset)?;
            minted.push(asset);
        }

        tracing::info!(owner = %caller.name, org = %caller.org, count = minted.len(), "Ledger initialized");
        Ok(minted)
    }

    /// Change color and weight of an asset the caller owns.
    ///
    /// # Errors
    /// - [`PrivtradeError::AssetNotFound`] if absent
    /// - an authorization error unless the caller is the owner pair
    pub fn update(
        &self,
        ctx: &mut TxContext<'_>,
        id: &AssetId,
        color: &str,
        weight: u32,
    ) -> Result<Asset> {
        let mut asset = self.read(ctx, id)?;
        let caller = Caller::resolve(ctx.client())?;
        authorize_owner(&caller, &asset)?;

        asset.color = color.to_string();
        asset.weight = weight;
        self.put(ctx, &asset)?;

        tracing::info!(asset = %asset.id, color = %asset.color, weight = asset.weight, "Asset updated");
        Ok(asset)
    }

    /// Remove an asset the caller owns.
    ///
    /// # Errors
    /// - [`PrivtradeError::AssetNotFound`] if absent
    /// - an authorization error unless the caller is the owner pair
    pub fn delete(&self, ctx: &mut TxContext<'_>, id: &AssetId) -> Result<()> {
        let asset = self.read(ctx, id)?;
        let caller = Caller::resolve(ctx.client())?;
        authorize_owner(&caller, &asset)?;

        ctx.stub_mut().del_state(id.as_str())?;
        tracing::info!(asset = %id, owner = %asset.owner, "Asset deleted");
        Ok(())
    }

    /// Write `asset` under its id.
    ///
    /// # Errors
    /// Propagates ledger write failures.
    pub fn put(&self, ctx: &mut TxContext<'_>, asset: &Asset) -> Result<()> {
        let bytes = serde_json::to_vec(asset)?;
        ctx.stub_mut().put_state(asset.id.as_str(), bytes)
    }

    fn authorize_mint(&self, ctx: &TxContext<'_>) -> Result<Caller> {
        let caller = Caller::resolve(ctx.client())?;
        if caller.org != self.minting_org {
            tracing::warn!(org = %caller.org, minting_org = %self.minting_org, "Mint refused");
            return Err(PrivtradeError::MintNotAuthorized {
                reason: format!("not a member of {}", self.minting_org),
            });
        }
        if let Some(reason) = caller.capabilities.mint_refusal() {
            tracing::warn!(org = %caller.org, reason, "Mint refused");
            return Err(PrivtradeError::MintNotAuthorized {
                reason: reason.to_string(),
            });
        }
        verify_client_org_matches_peer_org(ctx)?;
        caller.require_name()?;
        Ok(caller)
    }
}

/// The caller must be the asset's owner by name and by org.
///
/// # Errors
/// - [`PrivtradeError::UnresolvableIdentity`] for nameless callers
/// - [`PrivtradeError::NotOwner`] on a name mismatch
/// - [`PrivtradeError::OwnerOrgMismatch`] on an org mismatch
pub fn authorize_owner(caller: &Caller, asset: &Asset) -> Result<()> {
    let name = caller.require_name()?;
    if name != asset.owner {
        tracing::warn!(asset = %asset.id, client = name, "Caller does not own asset");
        return Err(PrivtradeError::NotOwner {
            client: name.to_string(),
            asset: asset.id.clone(),
        });
    }
    if caller.org != asset.owner_org {
        tracing::warn!(asset = %asset.id, client_org = %caller.org, "Caller org does not own asset");
        return Err(PrivtradeError::OwnerOrgMismatch {
            client_org: caller.org.clone(),
            owner_org: asset.owner_org.clone(),
        });
    }
    debug_assert!(asset.is_owned_by(name, &caller.org));
    Ok(())
}

/// Refuse empty asset ids.
///
/// # Errors
/// Returns [`PrivtradeError::InvalidInput`] if `id` is empty.
pub fn require_asset_id(id: &AssetId) -> Result<()> {
    if id.is_empty() {
        return Err(PrivtradeError::InvalidInput {
            reason: "asset id must not be empty".into(),
        });
    }
    Ok(())
}

fn collect_assets(results: QueryIter<'_>) -> Result<Vec<Asset>> {
    results
        .map(|kv| {
            let kv = kv?;
            serde_json::from_slice::<Asset>(&kv.value).map_err(|e| {
                PrivtradeError::Serialization(format!("record {} is not an asset: {e}", kv.key))
            })
        })
        .collect()
}
