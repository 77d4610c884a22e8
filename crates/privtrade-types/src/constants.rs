//! Protocol-wide constants for the privtrade contract.

/// Days added to the creation timestamp to form an asset's expiration date.
pub const EXPIRATION_DAYS: i64 = 7;

/// Transient field carrying the plaintext ask or bid price.
pub const TRANSIENT_ASSET_PRICE: &str = "asset_price";

/// Transient field carrying the JSON `{assetID, buyerMSP}` transfer input.
pub const TRANSIENT_ASSET_OWNER: &str = "asset_owner";

/// Prefix of every organization's implicit private collection.
pub const IMPLICIT_COLLECTION_PREFIX: &str = "_implicit_org_";

/// Composite-key object type of buy requests in shared collections.
pub const BUY_REQUEST_OBJECT_TYPE: &str = "BuyRequest";

/// Composite-key object type of an ask price.
pub const TYPE_ASSET_FOR_SALE: &str = "S";

/// Composite-key object type of a bid price.
pub const TYPE_ASSET_BID: &str = "B";

/// Composite-key object type of a seller's sale receipt.
pub const TYPE_ASSET_SALE_RECEIPT: &str = "SR";

/// Marker preceding the common name inside a decoded x509 identity.
pub const X509_CN_MARKER: &str = "x509::CN=";

/// Terminator of the common name inside a decoded x509 identity.
pub const X509_CN_TERMINATOR: &str = ",";

/// Certificate attribute granting the right to mint assets.
pub const FARMER_ATTRIBUTE: &str = "farmer";

/// Certificate attribute that revokes the right to mint assets.
pub const RETAILER_ATTRIBUTE: &str = "retailer";

/// Value an attribute must carry to count as asserted.
pub const ATTRIBUTE_TRUE: &str = "true";

/// Organization allowed to mint assets in the default topology.
pub const DEFAULT_MINTING_ORG: &str = "Org1MSP";

/// Shared collection between the first two organizations of the chain.
pub const DEFAULT_SHARED_COLLECTION: &str = "assetCollection";

/// Shared collection between the second and third organizations.
pub const DEFAULT_SHARED_COLLECTION_23: &str = "assetCollection23";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Contract name.
pub const CONTRACT_NAME: &str = "privtrade";
