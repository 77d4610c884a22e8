//! # privtrade-ledger
//!
//! **Substrate interface**: everything the contract consumes from the
//! replicated ledger, modelled as traits, plus an in-memory reference
//! substrate for tests and local simulation.
//!
//! ## Architecture
//!
//! 1. **ChaincodeStub**: world state, private collections, content hashes,
//!    composite-key iteration, rich queries, tx timestamp, transient input
//! 2. **ClientIdentity**: identity blob, MSP id, attribute assertions
//! 3. **TxContext**: the pair handed to every contract operation
//! 4. **MemoryLedger**: atomic per-invocation commit, collection access
//!    policies, SHA-256 private hashes, selector queries
//!
//! ## Invocation Flow
//!
//! ```text
//! Proposal → MemoryLedger.submit() → TxSimulator (reads: committed snapshot,
//!     writes: buffered) → contract op → Ok: commit write set / Err: discard
//! ```

pub mod composite;
pub mod identity;
pub mod memory;
pub mod stub;
pub mod transient;

pub use composite::{create_composite_key, split_composite_key};
pub use identity::{ClientIdentity, X509Identity};
pub use memory::{CollectionPolicy, LedgerSnapshot, MemoryLedger, Proposal};
pub use stub::{ChaincodeStub, KeyValue, QueryIter, TxContext};
pub use transient::TransientMap;
