pub mod bucket;
pub mod capability;
pub mod node;
pub mod partition;

pub use bucket::{BucketTopology, Locator};
pub use capability::{BucketCapability, CapabilitySet};
pub use node::{ExtendedNodeInfo, NodeDescriptor, reconcile};
pub use partition::{NOT_EXISTENT, PartitionEntry, PartitionMap};
