//! Private price commitments.
//!
//! Sellers commit an ask (`S`) and buyers commit a bid (`B`) into their own
//! org's implicit collection. The plaintext never leaves that org; settlement
//! compares the two by content hash only.

use privtrade_ledger::TxContext;
use privtrade_types::{
    AssetId, AssetPrivateDetails, CollectionName, ContentHash, PriceRole, PrivtradeError, Result,
    constants,
};

use crate::identity::{Caller, verify_client_org_matches_peer_org};
use crate::registry::{AssetRegistry, authorize_owner, require_asset_id};
use crate::router::CollectionRouter;

#[derive(Debug, Clone)]
pub struct PriceCommitmentStore {
    router: CollectionRouter,
}

impl PriceCommitmentStore {
    #[must_use]
    pub fn new(router: CollectionRouter) -> Self {
        Self { router }
    }

    /// Commit the owner's ask price for `asset_id` from transient `asset_price`.
    ///
    /// # Errors
    /// - [`PrivtradeError::AssetNotFound`] if the asset is absent
    /// - an authorization error unless the caller is the owner pair
    /// - [`PrivtradeError::PeerOrgMismatch`] on a foreign peer
    /// - [`PrivtradeError::TransientKeyMissing`] without a price
    pub fn set_ask(
        &self,
        registry: &AssetRegistry,
        ctx: &mut TxContext<'_>,
        asset_id: &AssetId,
    ) -> Result<()> {
        let asset = registry.read(ctx, asset_id)?;
        let caller = Caller::resolve(ctx.client())?;
        authorize_owner(&caller, &asset)?;
        self.commit(ctx, PriceRole::ForSale, asset_id)
    }

    /// Commit the caller's bid price for `asset_id` from transient `asset_price`.
    ///
    /// Anyone may bid; the bid only lands in the caller's own org collection.
    ///
    /// # Errors
    /// - [`PrivtradeError::PeerOrgMismatch`] on a foreign peer
    /// - [`PrivtradeError::TransientKeyMissing`] without a price
    pub fn set_bid(&self, ctx: &mut TxContext<'_>, asset_id: &AssetId) -> Result<()> {
        self.commit(ctx, PriceRole::Bid, asset_id)
    }

    /// Hash of the `role` commitment for `asset_id` in `collection`.
    ///
    /// # Errors
    /// Propagates ledger failures; absence is `Ok(None)`.
    pub fn price_hash(
        &self,
        ctx: &TxContext<'_>,
        collection: &CollectionName,
        role: PriceRole,
        asset_id: &AssetId,
    ) -> Result<Option<ContentHash>> {
        let key = commitment_key(ctx, role, asset_id)?;
        ctx.stub().get_private_data_hash(collection, &key)
    }

    /// Plaintext price the caller's own org committed.
    ///
    /// # Errors
    /// - [`PrivtradeError::PeerOrgMismatch`] on a foreign peer
    /// - [`PrivtradeError::CommitmentNotFound`] if nothing was committed
    pub fn read_own_price(
        &self,
        ctx: &TxContext<'_>,
        role: PriceRole,
        asset_id: &AssetId,
    ) -> Result<Vec<u8>> {
        verify_client_org_matches_peer_org(ctx)?;
        let collection = self.router.caller_private_collection(ctx.client())?;
        let key = commitment_key(ctx, role, asset_id)?;
        ctx.stub()
            .get_private_data(&collection, &key)?
            .ok_or_else(|| PrivtradeError::CommitmentNotFound {
                role,
                asset: asset_id.clone(),
                collection,
            })
    }

    /// Structured `{assetID, price}` details stored under the plain asset id.
    ///
    /// # Errors
    /// - [`PrivtradeError::Serialization`] if the stored value is malformed
    /// - collection access errors from the ledger
    pub fn read_private_details(
        &self,
        ctx: &TxContext<'_>,
        collection: &CollectionName,
        asset_id: &AssetId,
    ) -> Result<Option<AssetPrivateDetails>> {
        match ctx.stub().get_private_data(collection, asset_id.as_str())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Asset ids carrying a `role` commitment in the caller's own collection.
    ///
    /// # Errors
    /// - [`PrivtradeError::PeerOrgMismatch`] on a foreign peer
    /// - [`PrivtradeError::InvalidCompositeKey`] on a corrupt stored key
    pub fn list_commitments(&self, ctx: &TxContext<'_>, role: PriceRole) -> Result<Vec<AssetId>> {
        verify_client_org_matches_peer_org(ctx)?;
        let collection = self.router.caller_private_collection(ctx.client())?;
        let stub = ctx.stub();
        let mut ids = Vec::new();
        for entry in stub.get_private_data_by_partial_composite_key(&collection, role.object_type(), &[])? {
            let entry = entry?;
            let (_, attributes) = stub.split_composite_key(&entry.key)?;
            let id = attributes
                .into_iter()
                .next()
                .ok_or_else(|| PrivtradeError::InvalidCompositeKey {
                    reason: format!("{role} commitment key carries no asset id"),
                })?;
            ids.push(AssetId::new(id));
        }
        Ok(ids)
    }

    fn commit(&self, ctx: &mut TxContext<'_>, role: PriceRole, asset_id: &AssetId) -> Result<()> {
        require_asset_id(asset_id)?;
        verify_client_org_matches_peer_org(ctx)?;
        let price = ctx
            .stub()
            .transient()
            .require(constants::TRANSIENT_ASSET_PRICE)?
            .to_vec();
        let collection = self.router.caller_private_collection(ctx.client())?;
        let key = commitment_key(ctx, role, asset_id)?;

        tracing::info!(
            asset = %asset_id,
            role = %role,
            collection = %collection,
            hash = %ContentHash::of(&price),
            "Price committed"
        );
        ctx.stub_mut().put_private_data(&collection, &key, price)
    }
}

fn commitment_key(ctx: &TxContext<'_>, role: PriceRole, asset_id: &AssetId) -> Result<String> {
    ctx.stub()
        .create_composite_key(role.object_type(), &[asset_id.as_str()])
}

#[cfg(test)]
mod tests {
    use privtrade_ledger::{MemoryLedger, Proposal, X509Identity};
    use privtrade_types::ContractConfig;

    use super::*;

    struct Fixture {
        ledger: MemoryLedger,
        registry: AssetRegistry,
        prices: PriceCommitmentStore,
        farmer: X509Identity,
    }

    fn fixture() -> Fixture {
        let config = ContractConfig::default();
        let registry = AssetRegistry::new(&config);
        let prices = PriceCommitmentStore::new(CollectionRouter::new(&config));
        let farmer = X509Identity::farmer("FarmerO", "Org1MSP");
        let mut ledger = MemoryLedger::new();
        let proposal = Proposal::new(&farmer, "Org1MSP");
        ledger
            .submit(&proposal, |ctx| {
                registry.create(ctx, &AssetId::new("asset1"), "red", 10, "apples")
            })
            .unwrap();
        Fixture {
            ledger,
            registry,
            prices,
            farmer,
        }
    }

    fn asset1() -> AssetId {
        AssetId::new("asset1")
    }

    #[test]
    fn ask_stored_verbatim_in_owner_collection() {
        let mut f = fixture();
        let proposal = Proposal::new(&f.farmer, "Org1MSP").with_transient("asset_price", b"100".to_vec());
        f.ledger
            .submit(&proposal, |ctx| f.prices.set_ask(&f.registry, ctx, &asset1()))
            .unwrap();

        let key = privtrade_ledger::create_composite_key("S", &["asset1"]).unwrap();
        assert_eq!(f.ledger.private_state("_implicit_org_Org1MSP", &key), Some(&b"100"[..]));

        let price = f
            .ledger
            .evaluate(&proposal, |ctx| f.prices.read_own_price(ctx, PriceRole::ForSale, &asset1()))
            .unwrap();
        assert_eq!(price, b"100");
    }

    #[test]
    fn ask_requires_ownership() {
        let mut f = fixture();
        let stranger = X509Identity::new("Mallory", "Org1MSP");
        let proposal = Proposal::new(&stranger, "Org1MSP").with_transient("asset_price", b"1".to_vec());
        let err = f
            .ledger
            .submit(&proposal, |ctx| f.prices.set_ask(&f.registry, ctx, &asset1()))
            .unwrap_err();
        assert!(matches!(err, PrivtradeError::NotOwner { .. }));
    }

    #[test]
    fn ask_requires_transient_price_and_home_peer() {
        let mut f = fixture();
        let proposal = Proposal::new(&f.farmer, "Org1MSP");
        let err = f
            .ledger
            .submit(&proposal, |ctx| f.prices.set_ask(&f.registry, ctx, &asset1()))
            .unwrap_err();
        assert!(matches!(err, PrivtradeError::TransientKeyMissing(k) if k == "asset_price"));

        let proposal = Proposal::new(&f.farmer, "Org2MSP").with_transient("asset_price", b"1".to_vec());
        let err = f
            .ledger
            .submit(&proposal, |ctx| f.prices.set_ask(&f.registry, ctx, &asset1()))
            .unwrap_err();
        assert!(matches!(err, PrivtradeError::PeerOrgMismatch { .. }));
    }

    #[test]
    fn bid_requires_transient_price_and_home_peer() {
        let mut f = fixture();
        let buyer = X509Identity::retailer("RetailerA", "Org2MSP");
        let before = f.ledger.snapshot();

        let proposal = Proposal::new(&buyer, "Org2MSP");
        let err = f
            .ledger
            .submit(&proposal, |ctx| f.prices.set_bid(ctx, &asset1()))
            .unwrap_err();
        assert!(matches!(err, PrivtradeError::TransientKeyMissing(k) if k == "asset_price"));

        let proposal = Proposal::new(&buyer, "Org1MSP").with_transient("asset_price", b"100".to_vec());
        let err = f
            .ledger
            .submit(&proposal, |ctx| f.prices.set_bid(ctx, &asset1()))
            .unwrap_err();
        assert!(matches!(err, PrivtradeError::PeerOrgMismatch { .. }));
        assert_eq!(f.ledger.snapshot(), before);
    }

    #[test]
    fn bid_lands_in_bidder_org_and_hash_is_visible() {
        let mut f = fixture();
        let buyer = X509Identity::retailer("RetailerA", "Org2MSP");
        let proposal = Proposal::new(&buyer, "Org2MSP").with_transient("asset_price", b"100".to_vec());
        f.ledger
            .submit(&proposal, |ctx| f.prices.set_bid(ctx, &asset1()))
            .unwrap();

        // the seller's peer sees only the hash
        let seller = Proposal::new(&f.farmer, "Org1MSP");
        let collection = CollectionName::new("_implicit_org_Org2MSP");
        let hash = f
            .ledger
            .evaluate(&seller, |ctx| f.prices.price_hash(ctx, &collection, PriceRole::Bid, &asset1()))
            .unwrap();
        assert_eq!(hash, Some(ContentHash::of(b"100")));

        let missing = f
            .ledger
            .evaluate(&seller, |ctx| f.prices.price_hash(ctx, &collection, PriceRole::ForSale, &asset1()))
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn read_own_price_missing() {
        let f = fixture();
        let proposal = Proposal::new(&f.farmer, "Org1MSP");
        let err = f
            .ledger
            .evaluate(&proposal, |ctx| f.prices.read_own_price(ctx, PriceRole::Bid, &asset1()))
            .unwrap_err();
        assert!(matches!(
            err,
            PrivtradeError::CommitmentNotFound { role: PriceRole::Bid, .. }
        ));
    }

    #[test]
    fn list_commitments_by_role() {
        let mut f = fixture();
        let buyer = X509Identity::retailer("RetailerA", "Org2MSP");
        for id in ["asset1", "asset9"] {
            let proposal = Proposal::new(&buyer, "Org2MSP").with_transient("asset_price", b"5".to_vec());
            f.ledger
                .submit(&proposal, |ctx| f.prices.set_bid(ctx, &AssetId::new(id)))
                .unwrap();
        }
        let proposal = Proposal::new(&buyer, "Org2MSP");
        let bids = f
            .ledger
            .evaluate(&proposal, |ctx| f.prices.list_commitments(ctx, PriceRole::Bid))
            .unwrap();
        assert_eq!(bids, vec![AssetId::new("asset1"), AssetId::new("asset9")]);
        let asks = f
            .ledger
            .evaluate(&proposal, |ctx| f.prices.list_commitments(ctx, PriceRole::ForSale))
            .unwrap();
        assert!(asks.is_empty());
    }

    #[test]
    fn private_details() {
        let mut f = fixture();
        f.ledger.seed_private(
            "_implicit_org_Org1MSP",
            "asset1",
            br#"{"assetID":"asset1","price":100}"#.to_vec(),
        );
        let proposal = Proposal::new(&f.farmer, "Org1MSP");
        let collection = CollectionName::new("_implicit_org_Org1MSP");
        let details = f
            .ledger
            .evaluate(&proposal, |ctx| f.prices.read_private_details(ctx, &collection, &asset1()))
            .unwrap()
            .unwrap();
        assert_eq!(details.price, 100);

        let absent = f
            .ledger
            .evaluate(&proposal, |ctx| {
                f.prices.read_private_details(ctx, &collection, &AssetId::new("asset2"))
            })
            .unwrap();
        assert!(absent.is_none());
    }
}
