//! Service enumeration for cluster nodes
//!
//! Every node advertises the network services it exposes together with
//! their ports. Service membership across a whole topology is summarized
//! as a bitmask over the stable ordinals defined here.

/// Network services a cluster node can expose.
///
/// Ordinals are stable within a process run because they index into the
/// enabled-services bitmask. The mask is never serialized, so ordinals
/// carry no cross-version meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceKind {
    /// Binary key-value data service
    Binary,
    /// Map/reduce view service
    View,
    /// Cluster configuration service
    Config,
    /// Query service
    Query,
    /// Full-text search service
    Search,
    /// Analytics service
    Analytics,
}

impl ServiceKind {
    /// Stable ordinal of this service.
    pub fn ordinal(self) -> u8 {
        match self {
            ServiceKind::Binary => 0,
            ServiceKind::View => 1,
            ServiceKind::Config => 2,
            ServiceKind::Query => 3,
            ServiceKind::Search => 4,
            ServiceKind::Analytics => 5,
        }
    }

    /// Bit for this service in an enabled-services mask.
    pub fn bit(self) -> u32 {
        1 << self.ordinal()
    }

    /// Decode an extended node listing's service key into a service kind
    /// and whether the port is the encrypted variant.
    ///
    /// Unknown keys decode to `None` so that configs pushed by newer
    /// servers keep parsing.
    pub fn from_wire(key: &str) -> Option<(ServiceKind, bool)> {
        let (base, ssl) = match key.strip_suffix("SSL") {
            Some(base) => (base, true),
            None => (key, false),
        };

        let kind = match base {
            "kv" => ServiceKind::Binary,
            "capi" => ServiceKind::View,
            "mgmt" => ServiceKind::Config,
            "n1ql" => ServiceKind::Query,
            "fts" => ServiceKind::Search,
            "cbas" => ServiceKind::Analytics,
            _ => return None,
        };

        Some((kind, ssl))
    }
}
