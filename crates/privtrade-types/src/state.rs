//! Trade lifecycle of a single asset.
//!
//! The ledger keeps no status field; the state is inferred from which keys
//! exist. [`TradeState`] names those states so they can be logged, returned
//! and tested.
//!
//! ```text
//!   ┌──────────┐ ask  ┌────────┐ bid  ┌─────┐ request ┌───────────────────┐ settle ┌─────────┐
//!   │ UNLISTED ├─────▶│ LISTED ├─────▶│ BID ├────────▶│ REQUEST_REGISTERED├───────▶│ SETTLED │
//!   └──────────┘      └────────┘      └─────┘         └─────────┬─────────┘        └─────────┘
//!                                                               │ verification fails
//!                                                               ▼
//!                                                          ┌──────────┐
//!                                                          │ REJECTED │
//!                                                          └──────────┘
//! ```
//!
//! Ask, bid and buy request may arrive in any order. A bid or request is not
//! counted until the commitments before it in the pipeline exist, so `UNLISTED` can jump
//! straight to `BID` or `REQUEST_REGISTERED`, and `LISTED` straight to
//! `REQUEST_REGISTERED`. `Rejected` leaves the ledger untouched, so the asset
//! stays in the state it was in before the failed settlement. A settled asset
//! has lost its ask and reads as `UNLISTED` again.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Observable state of one asset's trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeState {
    /// No ask price committed.
    Unlisted,
    /// The owner committed an ask price.
    Listed,
    /// Ask and bid are both committed.
    Bid,
    /// Ask, bid and a buy request are all present.
    RequestRegistered,
    /// Ownership transferred and the ask consumed.
    Settled,
    /// A settlement attempt failed verification.
    Rejected,
}

impl TradeState {
    /// Infer the pre-settlement state from which commitments exist.
    #[must_use]
    pub fn infer(has_ask: bool, has_bid: bool, has_request: bool) -> Self {
        match (has_ask, has_bid, has_request) {
            (false, _, _) => Self::Unlisted,
            (true, false, _) => Self::Listed,
            (true, true, false) => Self::Bid,
            (true, true, true) => Self::RequestRegistered,
        }
    }

    /// Can a settlement attempt start from this state?
    #[must_use]
    pub fn is_settleable(self) -> bool {
        self == Self::RequestRegistered
    }

    /// Can this state transition to the given target state?
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Unlisted, Self::Listed | Self::Bid | Self::RequestRegistered)
                | (Self::Listed, Self::Bid | Self::RequestRegistered | Self::Unlisted)
                | (Self::Bid, Self::RequestRegistered | Self::Listed)
                | (Self::RequestRegistered, Self::Settled | Self::Rejected | Self::Bid)
                | (Self::Rejected, Self::RequestRegistered)
                | (Self::Settled, Self::Unlisted)
        )
    }
}

impl fmt::Display for TradeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlisted => write!(f, "UNLISTED"),
            Self::Listed => write!(f, "LISTED"),
            Self::Bid => write!(f, "BID"),
            Self::RequestRegistered => write!(f, "REQUEST_REGISTERED"),
            Self::Settled => write!(f, "SETTLED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}
