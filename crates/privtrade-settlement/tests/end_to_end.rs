//! End-to-end trade scenarios across the three organizations.
//!
//! Every step runs as its own transaction on the in-memory ledger, submitted
//! by a specific client through a specific org's peer:
//! mint (Org1) -> ask (Org1) -> bid (Org2) -> buy request (Org2) -> settle (Org1)
//! and then the second hop Org2 -> Org3 over `assetCollection23`.

use chrono::Duration;
use privtrade_ledger::{
    CollectionPolicy, MemoryLedger, Proposal, X509Identity, create_composite_key,
};
use privtrade_settlement::{AssetTransferContract, Settlement};
use privtrade_types::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Helper: three-org network with the default trade lanes.
struct Network {
    ledger: MemoryLedger,
    contract: AssetTransferContract,
    farmer: X509Identity,
    retailer: X509Identity,
    grocer: X509Identity,
}

impl Network {
    fn new() -> Self {
        Self::with_config(ContractConfig::default())
    }

    fn with_config(config: ContractConfig) -> Self {
        init_tracing();
        let mut ledger = MemoryLedger::new();
        ledger.define_collection("assetCollection", CollectionPolicy::shared(&["Org1MSP", "Org2MSP"]));
        ledger.define_collection("assetCollection23", CollectionPolicy::shared(&["Org2MSP", "Org3MSP"]));
        Self {
            ledger,
            contract: AssetTransferContract::new(config).expect("default config is valid"),
            farmer: X509Identity::farmer("FarmerO", "Org1MSP"),
            retailer: X509Identity::retailer("RetailerA", "Org2MSP"),
            grocer: X509Identity::retailer("GrocerZ", "Org3MSP"),
        }
    }

    fn mint(&mut self, id: &str) -> Asset {
        let proposal = Proposal::new(&self.farmer, "Org1MSP");
        let contract = &self.contract;
        self.ledger
            .submit(&proposal, |ctx| contract.create_asset(ctx, id, "red", 10, "apples"))
            .expect("mint should succeed")
    }

    fn ask(&mut self, seller: &X509Identity, peer: &str, id: &str, price: &[u8]) -> Result<()> {
        let proposal = Proposal::new(seller, peer).with_transient("asset_price", price.to_vec());
        let contract = &self.contract;
        self.ledger
            .submit(&proposal, |ctx| contract.set_price(ctx, id))
    }

    fn bid(&mut self, buyer: &X509Identity, peer: &str, id: &str, price: &[u8]) -> Result<()> {
        let proposal = Proposal::new(buyer, peer).with_transient("asset_price", price.to_vec());
        let contract = &self.contract;
        self.ledger
            .submit(&proposal, |ctx| contract.agree_to_buy(ctx, id))
    }

    fn request(&mut self, buyer: &X509Identity, peer: &str, id: &str) -> Result<BuyRequest> {
        let proposal = Proposal::new(buyer, peer);
        let contract = &self.contract;
        self.ledger
            .submit(&proposal, |ctx| contract.request_to_buy(ctx, id))
    }

    fn settle(
        &mut self,
        seller: &X509Identity,
        peer: &str,
        id: &str,
        buyer_msp: &str,
    ) -> Result<Settlement> {
        let input = format!(r#"{{"assetID":"{id}","buyerMSP":"{buyer_msp}"}}"#);
        let proposal = Proposal::new(seller, peer).with_transient("asset_owner", input.into_bytes());
        let contract = &self.contract;
        self.ledger
            .submit(&proposal, |ctx| contract.transfer_requested_asset(ctx))
    }

    fn read(&self, id: &str) -> Asset {
        serde_json::from_slice(self.ledger.state(id).expect("asset recorded")).unwrap()
    }

    /// Mint `id` and bring it to `RequestRegistered` toward Org2 at `price`.
    fn list_and_agree(&mut self, id: &str, ask: &[u8], bid: &[u8]) {
        self.mint(id);
        let (farmer, retailer) = (self.farmer.clone(), self.retailer.clone());
        self.ask(&farmer, "Org1MSP", id, ask).unwrap();
        self.bid(&retailer, "Org2MSP", id, bid).unwrap();
        self.request(&retailer, "Org2MSP", id).unwrap();
    }
}

fn key(object_type: &str, id: &str) -> String {
    create_composite_key(object_type, &[id]).unwrap()
}

// =========================================================================
// Happy path
// =========================================================================

#[test]
fn e2e_full_trade_transfers_ownership() {
    let mut net = Network::new();
    net.list_and_agree("asset1", b"100", b"100");
    let minted = net.read("asset1");

    let farmer = net.farmer.clone();
    let settlement = net.settle(&farmer, "Org1MSP", "asset1", "Org2MSP").unwrap();
    assert_eq!(settlement.previous_owner, "FarmerO");
    assert_eq!(settlement.previous_owner_org, OrgId::new("Org1MSP"));
    assert_eq!(settlement.price_hash, ContentHash::of(b"100"));

    let asset = net.read("asset1");
    assert_eq!(asset.owner, "RetailerA");
    assert_eq!(asset.owner_org, OrgId::new("Org2MSP"));
    // transfer does not touch timing or audit fields
    assert_eq!(asset.timestamp, minted.timestamp);
    assert_eq!(asset.expiration_date, minted.timestamp + Duration::days(7));
    assert_eq!(asset.creator, minted.creator);

    // ask consumed; bid and request kept under the default policy
    assert!(net.ledger.private_state("_implicit_org_Org1MSP", &key("S", "asset1")).is_none());
    assert!(net.ledger.private_state("_implicit_org_Org2MSP", &key("B", "asset1")).is_some());
    assert!(net.ledger.private_state("assetCollection", &key("BuyRequest", "asset1")).is_some());
}

#[test]
fn e2e_sale_receipt_recorded_for_seller() {
    let mut net = Network::new();
    net.list_and_agree("asset1", b"100", b"100");
    let farmer = net.farmer.clone();
    let settlement = net.settle(&farmer, "Org1MSP", "asset1", "Org2MSP").unwrap();

    let stored = net
        .ledger
        .private_state("_implicit_org_Org1MSP", &key("SR", "asset1"))
        .expect("receipt written");
    let receipt: SaleReceipt = serde_json::from_slice(stored).unwrap();
    assert_eq!(receipt.buyer, "RetailerA");
    assert_eq!(receipt.buyer_org, OrgId::new("Org2MSP"));
    assert_eq!(receipt.price, b"100");
    assert_eq!(Some(receipt), settlement.receipt);
}

#[test]
fn e2e_second_hop_over_second_lane() {
    let mut net = Network::new();
    net.list_and_agree("asset1", b"100", b"100");
    let (farmer, retailer, grocer) = (net.farmer.clone(), net.retailer.clone(), net.grocer.clone());
    net.settle(&farmer, "Org1MSP", "asset1", "Org2MSP").unwrap();

    net.ask(&retailer, "Org2MSP", "asset1", b"150").unwrap();
    net.bid(&grocer, "Org3MSP", "asset1", b"150").unwrap();
    let request = net.request(&grocer, "Org3MSP", "asset1").unwrap();
    assert_eq!(request.buyer_id, "GrocerZ");
    assert!(net.ledger.private_state("assetCollection23", &key("BuyRequest", "asset1")).is_some());

    net.settle(&retailer, "Org2MSP", "asset1", "Org3MSP").unwrap();
    let asset = net.read("asset1");
    assert_eq!((asset.owner.as_str(), asset.owner_org.as_str()), ("GrocerZ", "Org3MSP"));
}

#[test]
fn e2e_new_owner_controls_asset_after_transfer() {
    let mut net = Network::new();
    net.list_and_agree("asset1", b"100", b"100");
    let (farmer, retailer) = (net.farmer.clone(), net.retailer.clone());
    net.settle(&farmer, "Org1MSP", "asset1", "Org2MSP").unwrap();

    let contract = &net.contract;
    let old = Proposal::new(&farmer, "Org1MSP");
    let err = net
        .ledger
        .submit(&old, |ctx| contract.update_asset(ctx, "asset1", "green", 1))
        .unwrap_err();
    assert!(matches!(err, PrivtradeError::NotOwner { .. }));

    let new = Proposal::new(&retailer, "Org2MSP");
    let updated = net
        .ledger
        .submit(&new, |ctx| contract.update_asset(ctx, "asset1", "green", 1))
        .unwrap();
    assert_eq!(updated.color, "green");
}

// =========================================================================
// Rejections leave the ledger untouched
// =========================================================================

#[test]
fn e2e_price_mismatch_rejected_without_writes() {
    let mut net = Network::new();
    net.list_and_agree("asset1", b"100", b"99");
    let before = net.ledger.snapshot();

    let farmer = net.farmer.clone();
    let err = net.settle(&farmer, "Org1MSP", "asset1", "Org2MSP").unwrap_err();
    assert!(matches!(err, PrivtradeError::PriceHashMismatch { .. }));
    assert_eq!(err.kind(), ErrorKind::Integrity);
    assert_eq!(net.ledger.snapshot(), before);
}

#[test]
fn e2e_formatting_difference_is_a_mismatch() {
    let mut net = Network::new();
    net.list_and_agree("asset1", b"100", b"100.0");
    let farmer = net.farmer.clone();
    let err = net.settle(&farmer, "Org1MSP", "asset1", "Org2MSP").unwrap_err();
    assert!(matches!(err, PrivtradeError::PriceHashMismatch { .. }));
}

#[test]
fn e2e_settle_twice_fails_and_changes_nothing() {
    let mut net = Network::new();
    net.list_and_agree("asset1", b"100", b"100");
    let farmer = net.farmer.clone();
    net.settle(&farmer, "Org1MSP", "asset1", "Org2MSP").unwrap();
    let after_first = net.ledger.snapshot();

    // the farmer no longer owns the asset
    let err = net.settle(&farmer, "Org1MSP", "asset1", "Org2MSP").unwrap_err();
    assert!(matches!(err, PrivtradeError::NotOwner { .. }));
    assert_eq!(net.ledger.snapshot(), after_first);
}

#[test]
fn e2e_settle_requires_buy_request() {
    let mut net = Network::new();
    net.mint("asset1");
    let (farmer, retailer) = (net.farmer.clone(), net.retailer.clone());
    net.ask(&farmer, "Org1MSP", "asset1", b"100").unwrap();
    net.bid(&retailer, "Org2MSP", "asset1", b"100").unwrap();
    let before = net.ledger.snapshot();

    let err = net.settle(&farmer, "Org1MSP", "asset1", "Org2MSP").unwrap_err();
    assert!(matches!(err, PrivtradeError::BuyRequestNotFound { .. }));
    assert_eq!(net.ledger.snapshot(), before);
}

#[test]
fn e2e_settle_requires_both_commitments() {
    let mut net = Network::new();
    net.mint("asset1");
    let (farmer, retailer) = (net.farmer.clone(), net.retailer.clone());
    net.request(&retailer, "Org2MSP", "asset1").unwrap();

    let err = net.settle(&farmer, "Org1MSP", "asset1", "Org2MSP").unwrap_err();
    assert!(matches!(
        err,
        PrivtradeError::CommitmentNotFound { role: PriceRole::ForSale, .. }
    ));

    net.ask(&farmer, "Org1MSP", "asset1", b"100").unwrap();
    let err = net.settle(&farmer, "Org1MSP", "asset1", "Org2MSP").unwrap_err();
    assert!(matches!(
        err,
        PrivtradeError::CommitmentNotFound { role: PriceRole::Bid, .. }
    ));
}

#[test]
fn e2e_buyer_org_must_match_lane() {
    let mut net = Network::new();
    net.list_and_agree("asset1", b"100", b"100");
    let (farmer, grocer) = (net.farmer.clone(), net.grocer.clone());
    // Org3 bids the same price but Org1 only sells to Org2
    net.bid(&grocer, "Org3MSP", "asset1", b"100").unwrap();

    let err = net.settle(&farmer, "Org1MSP", "asset1", "Org3MSP").unwrap_err();
    assert!(matches!(err, PrivtradeError::BuyerOrgMismatch { .. }));
    assert_eq!(net.read("asset1").owner, "FarmerO");
}

#[test]
fn e2e_settle_from_foreign_peer_rejected() {
    let mut net = Network::new();
    net.list_and_agree("asset1", b"100", b"100");
    let farmer = net.farmer.clone();
    let err = net.settle(&farmer, "Org2MSP", "asset1", "Org2MSP").unwrap_err();
    assert!(matches!(err, PrivtradeError::PeerOrgMismatch { .. }));
}

#[test]
fn e2e_only_owner_may_settle() {
    let mut net = Network::new();
    net.list_and_agree("asset1", b"100", b"100");
    let colleague = X509Identity::farmer("FarmerP", "Org1MSP");
    let err = net.settle(&colleague, "Org1MSP", "asset1", "Org2MSP").unwrap_err();
    assert!(matches!(err, PrivtradeError::NotOwner { .. }));
}

#[test]
fn e2e_nameless_identity_cannot_act() {
    let mut net = Network::new();
    net.mint("asset1");
    let anonymous = X509Identity::from_dns("O=org2,C=US", "CN=ca.org2", "Org2MSP");
    let err = net.request(&anonymous, "Org2MSP", "asset1").unwrap_err();
    assert!(matches!(err, PrivtradeError::UnresolvableIdentity));
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

// =========================================================================
// Minting
// =========================================================================

#[test]
fn e2e_foreign_org_cannot_mint() {
    let mut net = Network::new();
    let contract = &net.contract;
    for (client, peer) in [
        (X509Identity::farmer("FarmerQ", "Org2MSP"), "Org2MSP"),
        (X509Identity::retailer("RetailerA", "Org2MSP"), "Org2MSP"),
    ] {
        let proposal = Proposal::new(&client, peer);
        let err = net
            .ledger
            .submit(&proposal, |ctx| contract.create_asset(ctx, "asset9", "red", 1, "apples"))
            .unwrap_err();
        assert!(matches!(err, PrivtradeError::MintNotAuthorized { .. }));
    }
    assert!(net.ledger.state("asset9").is_none());
}

#[test]
fn e2e_init_ledger_seeds_demo_assets() {
    let mut net = Network::new();
    let contract = &net.contract;
    let proposal = Proposal::new(&net.farmer, "Org1MSP");
    let payload = net
        .ledger
        .submit(&proposal, |ctx| contract.invoke(ctx, "InitLedger", &[]))
        .unwrap();
    let assets: Vec<Asset> = serde_json::from_slice(&payload).unwrap();
    assert_eq!(assets.len(), 6);
    assert_eq!(assets[5].asset_type, "grapes");
}

// =========================================================================
// Policy variants
// =========================================================================

#[test]
fn e2e_full_cleanup_clears_bid_and_request() {
    let config = ContractConfig {
        cleanup: CleanupPolicy::Full,
        ..ContractConfig::default()
    };
    let mut net = Network::with_config(config);
    net.list_and_agree("asset1", b"100", b"100");
    let farmer = net.farmer.clone();
    net.settle(&farmer, "Org1MSP", "asset1", "Org2MSP").unwrap();

    assert!(net.ledger.private_state("_implicit_org_Org1MSP", &key("S", "asset1")).is_none());
    assert!(net.ledger.private_state("_implicit_org_Org2MSP", &key("B", "asset1")).is_none());
    assert!(net.ledger.private_state("assetCollection", &key("BuyRequest", "asset1")).is_none());
}

#[test]
fn e2e_receipts_can_be_disabled() {
    let config = ContractConfig {
        record_sale_receipts: false,
        ..ContractConfig::default()
    };
    let mut net = Network::with_config(config);
    net.list_and_agree("asset1", b"100", b"100");
    let farmer = net.farmer.clone();
    let settlement = net.settle(&farmer, "Org1MSP", "asset1", "Org2MSP").unwrap();
    assert!(settlement.receipt.is_none());
    assert!(net.ledger.private_state("_implicit_org_Org1MSP", &key("SR", "asset1")).is_none());
}

// =========================================================================
// Queries through the dispatcher
// =========================================================================

#[test]
fn e2e_trade_state_and_prices_via_invoke() {
    let mut net = Network::new();
    net.list_and_agree("asset1", b"100", b"100");
    let contract = &net.contract;

    let seller = Proposal::new(&net.farmer, "Org1MSP");
    let state = net
        .ledger
        .evaluate(&seller, |ctx| contract.invoke(ctx, "GetTradeState", &["asset1", "Org2MSP"]))
        .unwrap();
    let state: TradeState = serde_json::from_slice(&state).unwrap();
    assert_eq!(state, TradeState::RequestRegistered);

    let price = net
        .ledger
        .evaluate(&seller, |ctx| contract.invoke(ctx, "GetAssetSalesPrice", &["asset1"]))
        .unwrap();
    assert_eq!(price, br#""100""#);

    // the seller's peer cannot read the buyer's bid
    let err = net
        .ledger
        .evaluate(&seller, |ctx| {
            contract.read_asset_private_details(ctx, "_implicit_org_Org2MSP", "asset1")
        })
        .unwrap_err();
    assert!(matches!(err, PrivtradeError::CollectionAccessDenied { .. }));

    let buyer = Proposal::new(&net.retailer, "Org2MSP");
    let request = net
        .ledger
        .evaluate(&buyer, |ctx| contract.invoke(ctx, "ReadRequestToBuy", &["asset1", "assetCollection"]))
        .unwrap();
    let request: Option<BuyRequest> = serde_json::from_slice(&request).unwrap();
    assert_eq!(request.map(|r| r.buyer_id).as_deref(), Some("RetailerA"));

    let bids = net
        .ledger
        .evaluate(&buyer, |ctx| contract.list_commitments(ctx, PriceRole::Bid))
        .unwrap();
    assert_eq!(bids, vec![AssetId::new("asset1")]);
}
