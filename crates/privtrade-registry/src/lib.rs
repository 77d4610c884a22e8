//! # privtrade-registry
//!
//! **Ownership plane**: who the caller is, where each organization's private
//! data lives, the public asset record, and private price commitments.
//!
//! ## Architecture
//!
//! 1. **Caller**: identity name, DN, org and capability flags, resolved once
//! 2. **CollectionRouter**: org → implicit collection, org → shared lane
//! 3. **AssetRegistry**: create / update / delete / exists / query assets
//! 4. **PriceCommitmentStore**: ask and bid prices in the caller's own
//!    collection, content hashes for everyone else
//!
//! ## Authorization Flow
//!
//! ```text
//! ClientIdentity → Caller::resolve() → capability / ownership / peer-org gates
//!     → AssetRegistry or PriceCommitmentStore write
//! ```

pub mod identity;
pub mod pricing;
pub mod registry;
pub mod router;

pub use identity::{
    Caller, resolve_caller_dn, resolve_caller_identity, verify_client_org_matches_peer_org,
};
pub use pricing::PriceCommitmentStore;
pub use registry::{AssetRegistry, authorize_owner, require_asset_id};
pub use router::CollectionRouter;
