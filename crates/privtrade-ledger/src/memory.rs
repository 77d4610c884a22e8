//! In-memory reference ledger.
//!
//! Models the substrate guarantees the contract relies on:
//! - each [`MemoryLedger::submit`] is atomic: the write set is committed only
//!   if the operation returns `Ok`, otherwise it is discarded
//! - reads observe the committed snapshot taken at the start of the
//!   invocation (writes are not visible to reads of the same invocation)
//! - private collections enforce membership: only member peers read values,
//!   any peer can read content hashes, writes honour `member_only_write`
//! - implicit `<prefix><org>` collections exist for every org without being
//!   declared

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use privtrade_types::{
    CollectionName, ContentHash, OrgId, PrivtradeError, Result, TxId, constants,
};
use serde_json::{Map, Value};

use crate::{ChaincodeStub, ClientIdentity, KeyValue, QueryIter, TransientMap, TxContext, composite};

// ---------------------------------------------------------------------------
// Collection policies
// ---------------------------------------------------------------------------

/// Dissemination and access rules of one private collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPolicy {
    pub members: BTreeSet<OrgId>,
    /// Only member peers may read plaintext values.
    pub member_only_read: bool,
    /// Only clients of member orgs may write.
    pub member_only_write: bool,
}

impl CollectionPolicy {
    /// Collection shared by `orgs`, readable and writable only by them.
    #[must_use]
    pub fn shared(orgs: &[&str]) -> Self {
        Self {
            members: orgs.iter().map(|o| OrgId::new(*o)).collect(),
            member_only_read: true,
            member_only_write: true,
        }
    }

    /// An org's implicit collection: only that org reads, anyone may write.
    #[must_use]
    pub fn implicit(org: OrgId) -> Self {
        Self {
            members: BTreeSet::from([org]),
            member_only_read: true,
            member_only_write: false,
        }
    }

    fn can_read(&self, peer_org: &OrgId) -> bool {
        !self.member_only_read || self.members.contains(peer_org)
    }

    fn can_write(&self, client_org: &OrgId) -> bool {
        !self.member_only_write || self.members.contains(client_org)
    }
}

// ---------------------------------------------------------------------------
// Proposal
// ---------------------------------------------------------------------------

/// A client's request to run one contract operation on one peer.
pub struct Proposal<'c> {
    pub client: &'c dyn ClientIdentity,
    /// Org of the endorsing peer.
    pub peer_org: OrgId,
    pub transient: TransientMap,
}

impl<'c> Proposal<'c> {
    #[must_use]
    pub fn new(client: &'c dyn ClientIdentity, peer_org: &str) -> Self {
        Self {
            client,
            peer_org: OrgId::new(peer_org),
            transient: TransientMap::new(),
        }
    }

    #[must_use]
    pub fn with_transient(mut self, key: &str, value: impl Into<Vec<u8>>) -> Self {
        self.transient.insert(key, value);
        self
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Full committed state, for before/after comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub world: BTreeMap<String, Vec<u8>>,
    pub private: BTreeMap<CollectionName, BTreeMap<String, Vec<u8>>>,
}

// ---------------------------------------------------------------------------
// MemoryLedger
// ---------------------------------------------------------------------------

/// Single-process ledger shared by all simulated peers.
pub struct MemoryLedger {
    world: BTreeMap<String, Vec<u8>>,
    private: BTreeMap<CollectionName, BTreeMap<String, Vec<u8>>>,
    policies: BTreeMap<CollectionName, CollectionPolicy>,
    implicit_prefix: String,
    /// Timestamp handed to the next invocation.
    clock: DateTime<Utc>,
    /// Clock advance per committed invocation.
    tick: Duration,
}

impl MemoryLedger {
    /// Empty ledger with the default implicit-collection prefix.
    #[must_use]
    pub fn new() -> Self {
        Self {
            world: BTreeMap::new(),
            private: BTreeMap::new(),
            policies: BTreeMap::new(),
            implicit_prefix: constants::IMPLICIT_COLLECTION_PREFIX.to_string(),
            clock: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
            tick: Duration::seconds(1),
        }
    }

    #[must_use]
    pub fn with_implicit_prefix(mut self, prefix: &str) -> Self {
        self.implicit_prefix = prefix.to_string();
        self
    }

    /// Declare a static collection.
    pub fn define_collection(&mut self, name: &str, policy: CollectionPolicy) {
        self.policies.insert(CollectionName::new(name), policy);
    }

    #[must_use]
    pub fn clock(&self) -> DateTime<Utc> {
        self.clock
    }

    /// Committed public value (bypasses access control).
    #[must_use]
    pub fn state(&self, key: &str) -> Option<&[u8]> {
        self.world.get(key).map(Vec::as_slice)
    }

    /// Committed private value (bypasses access control).
    #[must_use]
    pub fn private_state(&self, collection: &str, key: &str) -> Option<&[u8]> {
        self.private
            .get(&CollectionName::new(collection))
            .and_then(|c| c.get(key))
            .map(Vec::as_slice)
    }

    /// Load a private value directly, outside any invocation.
    pub fn seed_private(&mut self, collection: &str, key: &str, value: impl Into<Vec<u8>>) {
        self.private
            .entry(CollectionName::new(collection))
            .or_default()
            .insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            world: self.world.clone(),
            private: self.private.clone(),
        }
    }

    /// Execute `op` as one transaction and commit its writes if it succeeds.
    ///
    /// # Errors
    /// Returns the operation's error, in which case nothing is committed.
    pub fn submit<T, F>(&mut self, proposal: &Proposal<'_>, op: F) -> Result<T>
    where
        F: FnOnce(&mut TxContext<'_>) -> Result<T>,
    {
        let (result, writes, tx_id) = self.simulate(proposal, op)?;
        match result {
            Ok(value) => {
                let count = writes.len();
                self.apply(writes);
                self.clock += self.tick;
                tracing::debug!(tx = %tx_id, writes = count, "Transaction committed");
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(tx = %tx_id, error = %err, "Transaction rejected, write set discarded");
                Err(err)
            }
        }
    }

    /// Execute `op` without ever committing (a query).
    pub fn evaluate<T, F>(&self, proposal: &Proposal<'_>, op: F) -> Result<T>
    where
        F: FnOnce(&mut TxContext<'_>) -> Result<T>,
    {
        let (result, _, _) = self.simulate(proposal, op)?;
        result
    }

    fn simulate<T, F>(&self, proposal: &Proposal<'_>, op: F) -> Result<(Result<T>, WriteSet, TxId)>
    where
        F: FnOnce(&mut TxContext<'_>) -> Result<T>,
    {
        let mut sim = TxSimulator {
            ledger: self,
            tx_id: TxId::new(),
            timestamp: self.clock,
            peer_org: proposal.peer_org.clone(),
            client_org: proposal.client.msp_id()?,
            transient: proposal.transient.clone(),
            writes: WriteSet::default(),
        };
        let result = {
            let mut ctx = TxContext::new(&mut sim, proposal.client);
            op(&mut ctx)
        };
        Ok((result, sim.writes, sim.tx_id))
    }

    fn apply(&mut self, writes: WriteSet) {
        for (key, value) in writes.world {
            match value {
                Some(v) => {
                    self.world.insert(key, v);
                }
                None => {
                    self.world.remove(&key);
                }
            }
        }
        for ((collection, key), value) in writes.private {
            let data = self.private.entry(collection).or_default();
            match value {
                Some(v) => {
                    data.insert(key, v);
                }
                None => {
                    data.remove(&key);
                }
            }
        }
    }

    fn policy(&self, collection: &CollectionName) -> Result<CollectionPolicy> {
        if let Some(policy) = self.policies.get(collection) {
            return Ok(policy.clone());
        }
        match collection.as_str().strip_prefix(&self.implicit_prefix) {
            Some(org) if !org.is_empty() => Ok(CollectionPolicy::implicit(OrgId::new(org))),
            _ => Err(PrivtradeError::CollectionNotFound(collection.clone())),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Transaction simulation
// ---------------------------------------------------------------------------

/// Buffered writes of one invocation. `None` marks a deletion.
#[derive(Default)]
struct WriteSet {
    world: BTreeMap<String, Option<Vec<u8>>>,
    private: BTreeMap<(CollectionName, String), Option<Vec<u8>>>,
}

impl WriteSet {
    fn len(&self) -> usize {
        self.world.len() + self.private.len()
    }
}

struct TxSimulator<'l> {
    ledger: &'l MemoryLedger,
    tx_id: TxId,
    timestamp: DateTime<Utc>,
    peer_org: OrgId,
    client_org: OrgId,
    transient: TransientMap,
    writes: WriteSet,
}

impl TxSimulator<'_> {
    fn check_read(&self, collection: &CollectionName) -> Result<()> {
        let policy = self.ledger.policy(collection)?;
        if !policy.can_read(&self.peer_org) {
            tracing::warn!(
                peer_org = %self.peer_org,
                collection = %collection,
                "Private read denied"
            );
            return Err(PrivtradeError::CollectionAccessDenied {
                org: self.peer_org.clone(),
                collection: collection.clone(),
                operation: "read",
            });
        }
        Ok(())
    }

    fn check_write(&self, collection: &CollectionName) -> Result<()> {
        let policy = self.ledger.policy(collection)?;
        if !policy.can_write(&self.client_org) {
            tracing::warn!(
                client_org = %self.client_org,
                collection = %collection,
                "Private write denied"
            );
            return Err(PrivtradeError::CollectionAccessDenied {
                org: self.client_org.clone(),
                collection: collection.clone(),
                operation: "write",
            });
        }
        Ok(())
    }

    fn committed(&self, collection: &CollectionName, key: &str) -> Option<&[u8]> {
        self.ledger
            .private
            .get(collection)
            .and_then(|c| c.get(key))
            .map(Vec::as_slice)
    }
}

impl ChaincodeStub for TxSimulator<'_> {
    fn tx_id(&self) -> TxId {
        self.tx_id
    }

    fn tx_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn peer_org(&self) -> &OrgId {
        &self.peer_org
    }

    fn transient(&self) -> &TransientMap {
        &self.transient
    }

    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.ledger.world.get(key).cloned())
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        if key.is_empty() {
            return Err(PrivtradeError::InvalidInput {
                reason: "key must not be empty".into(),
            });
        }
        self.writes.world.insert(key.to_string(), Some(value));
        Ok(())
    }

    fn del_state(&mut self, key: &str) -> Result<()> {
        self.writes.world.insert(key.to_string(), None);
        Ok(())
    }

    fn get_private_data(&self, collection: &CollectionName, key: &str) -> Result<Option<Vec<u8>>> {
        self.check_read(collection)?;
        Ok(self.committed(collection, key).map(<[u8]>::to_vec))
    }

    fn get_private_data_hash(
        &self,
        collection: &CollectionName,
        key: &str,
    ) -> Result<Option<ContentHash>> {
        self.ledger.policy(collection)?;
        Ok(self.committed(collection, key).map(ContentHash::of))
    }

    fn put_private_data(
        &mut self,
        collection: &CollectionName,
        key: &str,
        value: Vec<u8>,
    ) -> Result<()> {
        self.check_write(collection)?;
        if key.is_empty() {
            return Err(PrivtradeError::InvalidInput {
                reason: "key must not be empty".into(),
            });
        }
        self.writes
            .private
            .insert((collection.clone(), key.to_string()), Some(value));
        Ok(())
    }

    fn del_private_data(&mut self, collection: &CollectionName, key: &str) -> Result<()> {
        self.check_write(collection)?;
        self.writes
            .private
            .insert((collection.clone(), key.to_string()), None);
        Ok(())
    }

    fn get_private_data_by_partial_composite_key(
        &self,
        collection: &CollectionName,
        object_type: &str,
        attributes: &[&str],
    ) -> Result<QueryIter<'_>> {
        self.check_read(collection)?;
        let prefix = composite::create_composite_key(object_type, attributes)?;
        let Some(data) = self.ledger.private.get(collection) else {
            return Ok(Box::new(std::iter::empty()));
        };
        Ok(Box::new(
            data.range(prefix.clone()..)
                .take_while(move |(k, _)| k.starts_with(&prefix))
                .map(|(k, v)| -> Result<KeyValue> {
                    Ok(KeyValue {
                        key: k.clone(),
                        value: v.clone(),
                    })
                }),
        ))
    }

    fn get_private_data_query_result(
        &self,
        collection: &CollectionName,
        query: &str,
    ) -> Result<QueryIter<'_>> {
        self.check_read(collection)?;
        let selector = parse_selector(query)?;
        let Some(data) = self.ledger.private.get(collection) else {
            return Ok(Box::new(std::iter::empty()));
        };
        Ok(Box::new(data.iter().filter_map(move |(k, v)| -> Option<Result<KeyValue>> {
            let doc: Value = serde_json::from_slice(v).ok()?;
            let fields = doc.as_object()?;
            selector
                .iter()
                .all(|(name, expected)| fields.get(name) == Some(expected))
                .then(|| {
                    Ok(KeyValue {
                        key: k.clone(),
                        value: v.clone(),
                    })
                })
        })))
    }
}

/// Extract the equality selector from `{"selector": {...}}`.
fn parse_selector(query: &str) -> Result<Map<String, Value>> {
    let parsed: Value = serde_json::from_str(query).map_err(|e| PrivtradeError::InvalidQuery {
        reason: e.to_string(),
    })?;
    let selector = parsed
        .get("selector")
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| PrivtradeError::InvalidQuery {
            reason: "query must contain a selector object".into(),
        })?;
    for value in selector.values() {
        reject_operators(value)?;
    }
    if let Some(op) = selector.keys().find(|k| k.starts_with('$')) {
        return Err(PrivtradeError::InvalidQuery {
            reason: format!("operator {op} is not supported"),
        });
    }
    Ok(selector)
}

/// Only plain equality is evaluated, so `$` keys are refused at any depth.
fn reject_operators(value: &Value) -> Result<()> {
    match value {
        Value::Object(map) => {
            if let Some(op) = map.keys().find(|k| k.starts_with('$')) {
                return Err(PrivtradeError::InvalidQuery {
                    reason: format!("operator {op} is not supported"),
                });
            }
            map.values().try_for_each(reject_operators)
        }
        Value::Array(items) => items.iter().try_for_each(reject_operators),
        _ => Ok(()),
    }
}
