//! Partition map
//!
//! The ordered table mapping every partition of a bucket to the node
//! index of its master and of each replica. Entries are taken directly
//! from the wire payload; no hashing happens here. Queries never fault:
//! anything missing, unassigned, or out of range resolves to
//! [`NOT_EXISTENT`].

use crate::core::{ConfigError, Result};

/// Sentinel node index meaning "no owner".
///
/// Covers both "the assignment does not exist yet" (a valid state while
/// the cluster rebalances) and "the queried partition or replica slot is
/// out of range". Never a valid index into the node list.
pub const NOT_EXISTENT: i32 = -1;

/// Master and replica assignment of a single partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionEntry {
    master: i32,
    replicas: Vec<i32>,
}

impl PartitionEntry {
    pub fn new(master: i32, replicas: Vec<i32>) -> Self {
        Self { master, replicas }
    }

    /// Node index of the master, or [`NOT_EXISTENT`] while unassigned.
    pub fn master(&self) -> i32 {
        self.master
    }

    /// Node index of the replica in the given slot.
    ///
    /// Slots beyond the entry's assignment list resolve to
    /// [`NOT_EXISTENT`]; an entry may carry fewer slots than the
    /// bucket's replica count.
    pub fn replica(&self, slot: usize) -> i32 {
        self.replicas.get(slot).copied().unwrap_or(NOT_EXISTENT)
    }
}

/// Ordered table of partition assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionMap {
    entries: Vec<PartitionEntry>,
}

impl PartitionMap {
    /// Build the map from the wire payload's index lists.
    ///
    /// Each inner list holds the master index first, then one index per
    /// replica slot. The wire encodes "unassigned" as `-1`, which passes
    /// through untouched. Any index outside the node-list domain is a
    /// parse error here rather than a fault at query time.
    pub fn build(wire_map: Vec<Vec<i32>>, node_count: usize) -> Result<Self> {
        let mut entries = Vec::with_capacity(wire_map.len());

        for (partition, assignment) in wire_map.into_iter().enumerate() {
            let mut indices = assignment.into_iter();
            let master = indices.next().unwrap_or(NOT_EXISTENT);
            let replicas: Vec<i32> = indices.collect();

            for &index in std::iter::once(&master).chain(replicas.iter()) {
                if index < NOT_EXISTENT || index >= node_count as i32 {
                    return Err(ConfigError::Parse(format!(
                        "partition {} references node index {} but only {} nodes are known",
                        partition, index, node_count
                    )));
                }
            }

            entries.push(PartitionEntry::new(master, replicas));
        }

        Ok(Self { entries })
    }

    /// Number of partitions in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// An empty map is a valid degenerate state; every query on it
    /// resolves to [`NOT_EXISTENT`].
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Node index of the master for a partition, or [`NOT_EXISTENT`]
    /// when the partition is out of range or unassigned.
    pub fn master_index_of(&self, partition: usize) -> i32 {
        self.entries
            .get(partition)
            .map(PartitionEntry::master)
            .unwrap_or(NOT_EXISTENT)
    }

    /// Node index of the replica in the given slot for a partition, or
    /// [`NOT_EXISTENT`] when the partition, the slot, or the assignment
    /// does not exist.
    pub fn replica_index_of(&self, partition: usize, slot: usize) -> i32 {
        self.entries
            .get(partition)
            .map(|entry| entry.replica(slot))
            .unwrap_or(NOT_EXISTENT)
    }

    /// Whether the given node index is the master of at least one
    /// partition.
    pub fn has_primary_for(&self, node_index: usize) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.master() == node_index as i32)
    }

    pub fn entries(&self) -> &[PartitionEntry] {
        &self.entries
    }
}
