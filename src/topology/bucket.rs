//! Bucket topology aggregate
//!
//! One immutable snapshot of a bucket's cluster view, built once per
//! config generation by the parser. Readers on any thread query the
//! snapshot without locking; a newer config produces an entirely new
//! instance that the owner publishes with an atomic reference swap.

use crate::core::ServiceKind;
use crate::topology::capability::{BucketCapability, CapabilitySet};
use crate::topology::node::NodeDescriptor;
use crate::topology::partition::{NOT_EXISTENT, PartitionMap};

/// Strategy used to locate the node owning a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// Partition map plus an external key-to-partition hash.
    Vbucket,
    /// Consistent-hash ring, used by simple cache-style buckets.
    Ketama,
}

/// Immutable cluster view of one bucket.
///
/// Everything except the two late-bound credential fields is fixed for
/// the object's lifetime. The credential setters are expected to run
/// once, before the snapshot is shared across readers; invoking them
/// after sharing is a caller bug and is not guarded here.
#[derive(Debug, Clone)]
pub struct BucketTopology {
    /// Bucket uuid; older servers omit it
    uuid: Option<String>,
    /// Bucket name
    name: String,
    /// Config revision pushed alongside the uuid
    rev: Option<u64>,
    uri: Option<String>,
    streaming_uri: Option<String>,
    locator: Locator,
    /// Index-stable node sequence; partition entries reference it by
    /// position, so it is never re-sorted
    nodes: Vec<NodeDescriptor>,
    partitions: Option<PartitionMap>,
    /// Fast-forward map pushed while the cluster rebalances
    forward_partitions: Option<PartitionMap>,
    replica_count: u32,
    /// OR of every node's plain and encrypted service bits
    enabled_services: u32,
    capabilities: CapabilitySet,
    username: Option<String>,
    password: Option<String>,
}

impl BucketTopology {
    /// Build the aggregate from already-reconciled parts.
    ///
    /// The enabled-services mask is computed here by folding every
    /// node's plain and encrypted service sets.
    pub fn new(
        name: impl Into<String>,
        locator: Locator,
        nodes: Vec<NodeDescriptor>,
        capabilities: CapabilitySet,
    ) -> Self {
        let mut enabled_services = 0u32;
        for node in &nodes {
            for kind in node.services().keys() {
                enabled_services |= kind.bit();
            }
            for kind in node.ssl_services().keys() {
                enabled_services |= kind.bit();
            }
        }

        Self {
            uuid: None,
            name: name.into(),
            rev: None,
            uri: None,
            streaming_uri: None,
            locator,
            nodes,
            partitions: None,
            forward_partitions: None,
            replica_count: 0,
            enabled_services,
            capabilities,
            username: None,
            password: None,
        }
    }

    /// Set the bucket uuid.
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Set the config revision.
    pub fn with_rev(mut self, rev: u64) -> Self {
        self.rev = Some(rev);
        self
    }

    /// Set the config uri.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the streaming config uri.
    pub fn with_streaming_uri(mut self, uri: impl Into<String>) -> Self {
        self.streaming_uri = Some(uri.into());
        self
    }

    /// Attach the partition map and the bucket's replica count.
    pub fn with_partitions(mut self, partitions: PartitionMap, replica_count: u32) -> Self {
        self.partitions = Some(partitions);
        self.replica_count = replica_count;
        self
    }

    /// Attach the fast-forward partition map.
    pub fn with_forward_partitions(mut self, partitions: PartitionMap) -> Self {
        self.forward_partitions = Some(partitions);
        self
    }

    // ------------------------------------------------------------------
    // Routing queries
    // ------------------------------------------------------------------

    /// Node index of the master for a partition, or [`NOT_EXISTENT`]
    /// when the partition is out of range or unassigned.
    ///
    /// With `use_forward` the lookup runs against the fast-forward map;
    /// when none was pushed the query degrades to [`NOT_EXISTENT`].
    pub fn master_index_of(&self, partition: usize, use_forward: bool) -> i32 {
        match self.partition_map(use_forward) {
            Some(map) => map.master_index_of(partition),
            None => NOT_EXISTENT,
        }
    }

    /// Node index of the replica in the given slot for a partition, or
    /// [`NOT_EXISTENT`] when the partition, the slot, or the assignment
    /// does not exist.
    pub fn replica_index_of(&self, partition: usize, slot: usize, use_forward: bool) -> i32 {
        match self.partition_map(use_forward) {
            Some(map) => map.replica_index_of(partition, slot),
            None => NOT_EXISTENT,
        }
    }

    /// Whether at least one node in the topology exposes the service,
    /// on either its plain or its encrypted port.
    pub fn service_enabled(&self, kind: ServiceKind) -> bool {
        self.enabled_services & kind.bit() != 0
    }

    /// Whether the node at the given address is the master of at least
    /// one partition. Used upstream to decide whether a node still
    /// holds primary data during rebalance and failover.
    pub fn has_primary_partitions_on(&self, hostname: &str) -> bool {
        let Some(map) = self.partitions.as_ref() else {
            return false;
        };
        map.entries().iter().any(|entry| {
            let master = entry.master();
            master >= 0
                && self
                    .nodes
                    .get(master as usize)
                    .is_some_and(|node| node.hostname() == hostname)
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rev(&self) -> Option<u64> {
        self.rev
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn streaming_uri(&self) -> Option<&str> {
        self.streaming_uri.as_deref()
    }

    pub fn locator(&self) -> Locator {
        self.locator
    }

    pub fn nodes(&self) -> &[NodeDescriptor] {
        &self.nodes
    }

    pub fn partitions(&self) -> Option<&PartitionMap> {
        self.partitions.as_ref()
    }

    pub fn forward_partitions(&self) -> Option<&PartitionMap> {
        self.forward_partitions.as_ref()
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.as_ref().map(PartitionMap::len).unwrap_or(0)
    }

    pub fn replica_count(&self) -> u32 {
        self.replica_count
    }

    /// True iff the bucket lacks the classic view indexing capability.
    pub fn ephemeral(&self) -> bool {
        !self.capabilities.has(BucketCapability::Couchapi)
    }

    /// True while a fast-forward map is present, i.e. the cluster is
    /// mid-rebalance and the pushed config carries both tables.
    pub fn tainted(&self) -> bool {
        self.forward_partitions.is_some()
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    // ------------------------------------------------------------------
    // Late-bound credentials
    // ------------------------------------------------------------------

    /// Set the bucket username. Call once, before the snapshot is
    /// shared across readers.
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = Some(username.into());
    }

    /// Set the bucket password. Call once, before the snapshot is
    /// shared across readers.
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = Some(password.into());
    }

    fn partition_map(&self, use_forward: bool) -> Option<&PartitionMap> {
        if use_forward {
            self.forward_partitions.as_ref()
        } else {
            self.partitions.as_ref()
        }
    }

    fn structural_eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.locator == other.locator
            && self.nodes == other.nodes
            && self.partitions == other.partitions
            && self.forward_partitions == other.forward_partitions
            && self.replica_count == other.replica_count
            && self.capabilities == other.capabilities
            && self.uri == other.uri
            && self.streaming_uri == other.streaming_uri
    }
}

/// Identity is uuid plus revision when both sides carry a uuid;
/// otherwise structural content is the only comparable signal (older
/// servers omit the uuid). Credentials never participate.
impl PartialEq for BucketTopology {
    fn eq(&self, other: &Self) -> bool {
        match (&self.uuid, &other.uuid) {
            (Some(a), Some(b)) => a == b && self.rev == other.rev,
            _ => self.structural_eq(other),
        }
    }
}

impl Eq for BucketTopology {}
