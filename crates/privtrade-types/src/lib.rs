//! # privtrade-types
//!
//! Shared types, errors, and configuration for the **privtrade** asset
//! transfer contract.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AssetId`], [`OrgId`], [`CollectionName`], [`TxId`]
//! - **Asset model**: [`Asset`], [`AssetTransferInput`]
//! - **Commitments**: [`PriceRole`], [`ContentHash`], [`AssetPrivateDetails`]
//! - **Buy requests**: [`BuyRequest`]
//! - **Receipts**: [`SaleReceipt`]
//! - **Trade lifecycle**: [`TradeState`]
//! - **Authorization**: [`Capabilities`]
//! - **Configuration**: [`ContractConfig`], [`TradeLane`], [`CleanupPolicy`]
//! - **Errors**: [`PrivtradeError`] with `PT_ERR_` prefix codes
//! - **Constants**: protocol tags, transient keys, and defaults

pub mod asset;
pub mod buy_request;
pub mod capability;
pub mod commitment;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod receipt;
pub mod state;

// Re-export all primary types at crate root for ergonomic imports:
//   use privtrade_types::{Asset, AssetId, OrgId, PrivtradeError, ...};

pub use asset::*;
pub use buy_request::*;
pub use capability::*;
pub use commitment::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use receipt::*;
pub use state::*;

// Constants are accessed via `privtrade_types::constants::FOO`
// (not re-exported to avoid name collisions).
