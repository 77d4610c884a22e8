//! Error types for the privtrade contract.
//!
//! All errors use the `PT_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by kind:
//! - 1xx: Authorization errors
//! - 2xx: Not-found errors
//! - 3xx: Conflict errors
//! - 4xx: Malformed input
//! - 5xx: Integrity errors
//! - 9xx: Ledger / internal errors

use std::fmt;

use thiserror::Error;

use crate::{AssetId, CollectionName, OrgId, PriceRole};

/// Coarse classification of a [`PrivtradeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authorization,
    NotFound,
    Conflict,
    MalformedInput,
    Integrity,
    Ledger,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::MalformedInput => write!(f, "MALFORMED_INPUT"),
            Self::Integrity => write!(f, "INTEGRITY"),
            Self::Ledger => write!(f, "LEDGER"),
        }
    }
}

/// Central error enum for all privtrade operations.
#[derive(Debug, Error)]
pub enum PrivtradeError {
    // =================================================================
    // Authorization Errors (1xx)
    // =================================================================
    /// The caller is not allowed to mint assets.
    #[error("PT_ERR_100: Client not authorized to create asset: {reason}")]
    MintNotAuthorized { reason: String },

    /// The caller is not the current owner of the asset.
    #[error("PT_ERR_101: Client {client} does not own asset {asset}")]
    NotOwner { client: String, asset: AssetId },

    /// The caller's organization is not the asset's owner organization.
    #[error("PT_ERR_102: Client from org {client_org} cannot act on asset owned by org {owner_org}")]
    OwnerOrgMismatch { client_org: OrgId, owner_org: OrgId },

    /// The client is submitting to a peer of another organization.
    #[error("PT_ERR_103: Client from org {client_org} is not authorized to read or write private data from an org {peer_org} peer")]
    PeerOrgMismatch { client_org: OrgId, peer_org: OrgId },

    /// The caller is not the buyer recorded on the buy request.
    #[error("PT_ERR_104: Client {client} is not the buyer recorded for asset {asset}")]
    NotBuyer { client: String, asset: AssetId },

    /// The caller's identity resolved to an empty name.
    #[error("PT_ERR_105: Client identity could not be resolved to a name")]
    UnresolvableIdentity,

    /// The hosting peer is not allowed to access the collection.
    #[error("PT_ERR_106: Org {org} is not permitted to {operation} collection {collection}")]
    CollectionAccessDenied {
        org: OrgId,
        collection: CollectionName,
        operation: &'static str,
    },

    /// No trade lane routes this organization.
    #[error("PT_ERR_107: No trade lane routes org {org} as {role}")]
    UnroutedOrg { org: OrgId, role: &'static str },

    /// The buyer org named by the seller does not match the lane's buyer org.
    #[error("PT_ERR_108: Buyer org {requested} does not match lane buyer org {lane_buyer}")]
    BuyerOrgMismatch { requested: OrgId, lane_buyer: OrgId },

    // =================================================================
    // Not-Found Errors (2xx)
    // =================================================================
    /// The asset does not exist in world state.
    #[error("PT_ERR_200: Asset {0} does not exist")]
    AssetNotFound(AssetId),

    /// A price commitment is missing.
    #[error("PT_ERR_201: {role} price for {asset} does not exist in {collection}")]
    CommitmentNotFound {
        role: PriceRole,
        asset: AssetId,
        collection: CollectionName,
    },

    /// No buy request is registered for the asset.
    #[error("PT_ERR_202: Buy request for {asset} not found in {collection}")]
    BuyRequestNotFound {
        asset: AssetId,
        collection: CollectionName,
    },

    /// The named private collection is not defined.
    #[error("PT_ERR_203: Collection {0} is not defined")]
    CollectionNotFound(CollectionName),

    /// The requested contract function does not exist.
    #[error("PT_ERR_204: Unknown function {0}")]
    UnknownFunction(String),

    // =================================================================
    // Conflict Errors (3xx)
    // =================================================================
    /// An asset with this ID already exists.
    #[error("PT_ERR_300: Asset {0} already exists")]
    AssetAlreadyExists(AssetId),

    /// A buy request for this asset already exists.
    #[error("PT_ERR_301: Buy request for {asset} already exists in {collection}")]
    BuyRequestAlreadyExists {
        asset: AssetId,
        collection: CollectionName,
    },

    // =================================================================
    // Malformed Input (4xx)
    // =================================================================
    /// Input failed validation (empty fields, bad arguments, etc.).
    #[error("PT_ERR_400: Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A required transient field is absent.
    #[error("PT_ERR_406: {0} key not found in the transient map")]
    TransientKeyMissing(String),

    /// Stored or supplied bytes did not decode.
    #[error("PT_ERR_401: Serialization error: {0}")]
    Serialization(String),

    /// The identity blob was not valid base64 / UTF-8.
    #[error("PT_ERR_402: Malformed client identity: {reason}")]
    MalformedIdentity { reason: String },

    /// A composite key component contained a reserved code point.
    #[error("PT_ERR_403: Invalid composite key: {reason}")]
    InvalidCompositeKey { reason: String },

    /// The rich query string could not be interpreted.
    #[error("PT_ERR_404: Invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// Contract configuration is inconsistent.
    #[error("PT_ERR_405: Configuration error: {0}")]
    Configuration(String),

    // =================================================================
    // Integrity Errors (5xx)
    // =================================================================
    /// Seller's ask hash and buyer's bid hash differ.
    #[error("PT_ERR_500: Hash for ask price {seller} does not match bid price hash {buyer}")]
    PriceHashMismatch { seller: String, buyer: String },

    // =================================================================
    // Ledger / Internal (9xx)
    // =================================================================
    /// The ledger substrate reported a failure.
    #[error("PT_ERR_900: Ledger error: {0}")]
    Ledger(String),

    /// Unrecoverable internal error.
    #[error("PT_ERR_901: Internal error: {0}")]
    Internal(String),
}

impl PrivtradeError {
    /// Classify this error into one of the protocol's error kinds.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MintNotAuthorized { .. }
            | Self::NotOwner { .. }
            | Self::OwnerOrgMismatch { .. }
            | Self::PeerOrgMismatch { .. }
            | Self::NotBuyer { .. }
            | Self::UnresolvableIdentity
            | Self::CollectionAccessDenied { .. }
            | Self::UnroutedOrg { .. }
            | Self::BuyerOrgMismatch { .. } => ErrorKind::Authorization,
            Self::AssetNotFound(_)
            | Self::CommitmentNotFound { .. }
            | Self::BuyRequestNotFound { .. }
            | Self::CollectionNotFound(_)
            | Self::UnknownFunction(_) => ErrorKind::NotFound,
            Self::AssetAlreadyExists(_) | Self::BuyRequestAlreadyExists { .. } => {
                ErrorKind::Conflict
            }
            Self::TransientKeyMissing(_)
            | Self::InvalidInput { .. }
            | Self::Serialization(_)
            | Self::MalformedIdentity { .. }
            | Self::InvalidCompositeKey { .. }
            | Self::InvalidQuery { .. }
            | Self::Configuration(_) => ErrorKind::MalformedInput,
            Self::PriceHashMismatch { .. } => ErrorKind::Integrity,
            Self::Ledger(_) | Self::Internal(_) => ErrorKind::Ledger,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, PrivtradeError>;

impl From<serde_json::Error> for PrivtradeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
