//! # privtrade-settlement
//!
//! **Finality Plane**: buy requests, hash-matched settlement, sale receipts,
//! and the public contract surface.
//!
//! ## Architecture
//!
//! [`TradeSettlementEngine`] runs the trade protocol on top of the ownership
//! plane (`privtrade-registry`):
//! 1. Registers write-once buy requests in the buyer's lane collection
//! 2. Verifies ask and bid agree by content hash, never by plaintext
//! 3. Transfers ownership and consumes the seller's ask
//! 4. Records a sale receipt in the seller's own collection
//! 5. Optionally clears the buyer's bid and the consumed request
//!
//! [`AssetTransferContract`] exposes every operation, by method or by name
//! through [`AssetTransferContract::invoke`].

pub mod contract;
pub mod engine;

pub use contract::AssetTransferContract;
pub use engine::{Settlement, TradeSettlementEngine};
