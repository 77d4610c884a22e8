//! The chaincode stub: the contract's only window onto ledger state.
//!
//! Access control on collections is enforced by the implementation of this
//! trait (the substrate), never by contract code.

use chrono::{DateTime, Utc};
use privtrade_types::{CollectionName, ContentHash, OrgId, Result, TxId};

use crate::{ClientIdentity, TransientMap, composite};

/// One stored key/value pair yielded by iteration or query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// Lazy, finite, forward-only sequence of query results.
pub type QueryIter<'a> = Box<dyn Iterator<Item = Result<KeyValue>> + 'a>;

/// Ledger operations available to one invocation.
pub trait ChaincodeStub {
    /// Id of the running transaction.
    fn tx_id(&self) -> TxId;

    /// Ledger-synchronized timestamp of the running transaction.
    fn tx_timestamp(&self) -> DateTime<Utc>;

    /// Organization of the peer executing this invocation.
    fn peer_org(&self) -> &OrgId;

    /// Transient input delivered with the proposal.
    fn transient(&self) -> &TransientMap;

    // --- public world state ---

    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<()>;

    fn del_state(&mut self, key: &str) -> Result<()>;

    // --- private collections ---

    fn get_private_data(&self, collection: &CollectionName, key: &str) -> Result<Option<Vec<u8>>>;

    /// Hash of a private value, available without read access to the value.
    fn get_private_data_hash(
        &self,
        collection: &CollectionName,
        key: &str,
    ) -> Result<Option<ContentHash>>;

    fn put_private_data(
        &mut self,
        collection: &CollectionName,
        key: &str,
        value: Vec<u8>,
    ) -> Result<()>;

    fn del_private_data(&mut self, collection: &CollectionName, key: &str) -> Result<()>;

    /// Iterate private entries whose composite key starts with
    /// `object_type` + `attributes`.
    fn get_private_data_by_partial_composite_key(
        &self,
        collection: &CollectionName,
        object_type: &str,
        attributes: &[&str],
    ) -> Result<QueryIter<'_>>;

    /// Run a rich (selector) query over a private collection.
    fn get_private_data_query_result(
        &self,
        collection: &CollectionName,
        query: &str,
    ) -> Result<QueryIter<'_>>;

    // --- composite keys ---

    fn create_composite_key(&self, object_type: &str, attributes: &[&str]) -> Result<String> {
        composite::create_composite_key(object_type, attributes)
    }

    fn split_composite_key(&self, key: &str) -> Result<(String, Vec<String>)> {
        composite::split_composite_key(key)
    }
}

/// Everything a contract operation receives: the stub and the caller.
pub struct TxContext<'a> {
    stub: &'a mut dyn ChaincodeStub,
    client: &'a dyn ClientIdentity,
}

impl<'a> TxContext<'a> {
    pub fn new(stub: &'a mut dyn ChaincodeStub, client: &'a dyn ClientIdentity) -> Self {
        Self { stub, client }
    }

    #[must_use]
    pub fn stub(&self) -> &dyn ChaincodeStub {
        &*self.stub
    }

    pub fn stub_mut(&mut self) -> &mut dyn ChaincodeStub {
        &mut *self.stub
    }

    #[must_use]
    pub fn client(&self) -> &dyn ClientIdentity {
        self.client
    }
}
