// ============================================================================
// ClusterMap Library
// ============================================================================

//! Client-side cluster topology model for a distributed key-value store.
//!
//! The store pushes a raw configuration document describing the cluster;
//! [`parse`] turns it into an immutable [`BucketTopology`] snapshot that
//! answers "which node owns partition P, as master or as replica R?" and
//! "which services does node N expose?". Snapshots are plain data with
//! no interior locking: construct one on any thread, publish it behind
//! an atomic reference swap (e.g. an `Arc` the owner replaces wholesale)
//! and let any number of request-routing readers query it concurrently.
//!
//! Fetching the raw text, dispatching requests to the selected node and
//! hashing a key to its partition index are collaborators outside this
//! crate.
//!
//! # Examples
//!
//! ```
//! use clustermap::{parse, ParseContext, ServiceKind};
//!
//! let raw = r#"{
//!     "name": "default",
//!     "nodeLocator": "vbucket",
//!     "bucketCapabilities": ["couchapi", "cccp"],
//!     "nodesExt": [
//!         {"hostname": "192.168.1.101", "services": {"kv": 11210, "mgmt": 8091}},
//!         {"hostname": "192.168.1.102", "services": {"kv": 11210, "mgmt": 8091}}
//!     ],
//!     "vBucketServerMap": {
//!         "numReplicas": 1,
//!         "vBucketMap": [[0, 1], [1, 0]]
//!     }
//! }"#;
//!
//! let topology = parse(raw, &ParseContext::new())?;
//!
//! assert_eq!(topology.nodes().len(), 2);
//! assert_eq!(topology.master_index_of(0, false), 0);
//! assert_eq!(topology.replica_index_of(0, 0, false), 1);
//! assert!(topology.service_enabled(ServiceKind::Binary));
//! # Ok::<(), clustermap::ConfigError>(())
//! ```

pub mod core;
pub mod parser;
pub mod topology;

// Re-export main types for convenience
pub use crate::core::{ConfigError, Result, ServiceKind};
pub use crate::parser::{ParseContext, parse};
pub use crate::topology::bucket::{BucketTopology, Locator};
pub use crate::topology::capability::{BucketCapability, CapabilitySet};
pub use crate::topology::node::NodeDescriptor;
pub use crate::topology::partition::{NOT_EXISTENT, PartitionMap};
