//! Node descriptors and node-info reconciliation
//!
//! A cluster config can carry two per-node representations: a legacy
//! list (hostname plus a couple of well-known ports) and an extended
//! list (full per-service port maps). [`reconcile`] merges the two into
//! the canonical node sequence the topology routes against.

use std::collections::BTreeMap;

use log::debug;

use crate::core::ServiceKind;
use crate::topology::capability::{BucketCapability, CapabilitySet};

/// Address used when a node entry carries no hostname at all.
///
/// Such an entry describes the locally-connected node, configured via
/// its link-local interface.
pub const LOOPBACK: &str = "127.0.0.1";

/// Immutable record of one cluster member's address and service ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    /// Network address of the node
    hostname: String,
    /// Plain service ports
    services: BTreeMap<ServiceKind, u16>,
    /// Encrypted service ports
    ssl_services: BTreeMap<ServiceKind, u16>,
}

impl NodeDescriptor {
    pub fn new(
        hostname: impl Into<String>,
        services: BTreeMap<ServiceKind, u16>,
        ssl_services: BTreeMap<ServiceKind, u16>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            services,
            ssl_services,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Plain port for a service, if the node exposes it.
    pub fn service_port(&self, kind: ServiceKind) -> Option<u16> {
        self.services.get(&kind).copied()
    }

    /// Encrypted port for a service, if the node exposes it.
    pub fn ssl_service_port(&self, kind: ServiceKind) -> Option<u16> {
        self.ssl_services.get(&kind).copied()
    }

    pub fn services(&self) -> &BTreeMap<ServiceKind, u16> {
        &self.services
    }

    pub fn ssl_services(&self) -> &BTreeMap<ServiceKind, u16> {
        &self.ssl_services
    }
}

/// One entry of the extended node listing, before reconciliation.
///
/// The hostname is optional here: servers predating the extended format's
/// hostname field push entries without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedNodeInfo {
    pub hostname: Option<String>,
    pub services: BTreeMap<ServiceKind, u16>,
    pub ssl_services: BTreeMap<ServiceKind, u16>,
}

/// Merge the legacy and extended node listings into the canonical node
/// sequence.
///
/// The extended list takes priority when present. An extended entry
/// without a hostname borrows the hostname at the same position from the
/// legacy list when both lists have the same length, and otherwise falls
/// back to [`LOOPBACK`].
///
/// When the bucket lacks the [`BucketCapability::Couchapi`] capability,
/// the view service is removed from every entry's port maps: an
/// ephemeral bucket never exposes a view endpoint, even when the payload
/// still lists a stale port for it.
///
/// Absence of data degrades instead of failing, so partial and
/// old-format configs still produce a usable node list.
pub fn reconcile(
    legacy: &[NodeDescriptor],
    extended: Option<Vec<ExtendedNodeInfo>>,
    capabilities: &CapabilitySet,
) -> Vec<NodeDescriptor> {
    let mut nodes = match extended {
        None => legacy.to_vec(),
        Some(entries) => {
            let borrow_legacy = legacy.len() == entries.len();
            entries
                .into_iter()
                .enumerate()
                .map(|(i, entry)| {
                    let hostname = match entry.hostname {
                        Some(hostname) => hostname,
                        None if borrow_legacy => legacy[i].hostname.clone(),
                        None => {
                            debug!(
                                "Hostname for extended node entry {} is not available, falling back to loopback",
                                i
                            );
                            LOOPBACK.to_string()
                        }
                    };
                    NodeDescriptor::new(hostname, entry.services, entry.ssl_services)
                })
                .collect()
        }
    };

    if !capabilities.has(BucketCapability::Couchapi) {
        for node in &mut nodes {
            node.services.remove(&ServiceKind::View);
            node.ssl_services.remove(&ServiceKind::View);
        }
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_node(hostname: &str) -> NodeDescriptor {
        let mut services = BTreeMap::new();
        services.insert(ServiceKind::Config, 8091);
        NodeDescriptor::new(hostname, services, BTreeMap::new())
    }

    fn extended_entry(hostname: Option<&str>) -> ExtendedNodeInfo {
        let mut services = BTreeMap::new();
        services.insert(ServiceKind::Binary, 11210);
        services.insert(ServiceKind::View, 8092);
        let mut ssl_services = BTreeMap::new();
        ssl_services.insert(ServiceKind::View, 18092);
        ExtendedNodeInfo {
            hostname: hostname.map(str::to_string),
            services,
            ssl_services,
        }
    }

    fn caps_with_couchapi() -> CapabilitySet {
        CapabilitySet::decode(&["couchapi".to_string()])
    }

    #[test]
    fn test_legacy_used_as_is_without_extended() {
        let legacy = vec![legacy_node("1.2.3.4"), legacy_node("5.6.7.8")];
        let nodes = reconcile(&legacy, None, &caps_with_couchapi());
        assert_eq!(nodes, legacy);
    }

    #[test]
    fn test_hostname_borrowed_from_legacy_at_same_position() {
        let legacy = vec![legacy_node("1.2.3.4"), legacy_node("5.6.7.8")];
        let extended = vec![extended_entry(None), extended_entry(None)];
        let nodes = reconcile(&legacy, Some(extended), &caps_with_couchapi());
        assert_eq!(nodes[0].hostname(), "1.2.3.4");
        assert_eq!(nodes[1].hostname(), "5.6.7.8");
    }

    #[test]
    fn test_loopback_fallback_on_length_mismatch() {
        let legacy = vec![legacy_node("1.2.3.4")];
        let extended = vec![extended_entry(None), extended_entry(Some("5.6.7.8"))];
        let nodes = reconcile(&legacy, Some(extended), &caps_with_couchapi());
        assert_eq!(nodes[0].hostname(), LOOPBACK);
        assert_eq!(nodes[1].hostname(), "5.6.7.8");
    }

    #[test]
    fn test_loopback_fallback_without_legacy() {
        let nodes = reconcile(&[], Some(vec![extended_entry(None)]), &caps_with_couchapi());
        assert_eq!(nodes[0].hostname(), LOOPBACK);
    }

    #[test]
    fn test_view_service_scrubbed_without_couchapi() {
        let extended = vec![extended_entry(Some("1.2.3.4"))];
        let nodes = reconcile(&[], Some(extended), &CapabilitySet::default());
        assert_eq!(nodes[0].service_port(ServiceKind::View), None);
        assert_eq!(nodes[0].ssl_service_port(ServiceKind::View), None);
        assert_eq!(nodes[0].service_port(ServiceKind::Binary), Some(11210));
    }

    #[test]
    fn test_view_service_kept_with_couchapi() {
        let extended = vec![extended_entry(Some("1.2.3.4"))];
        let nodes = reconcile(&[], Some(extended), &caps_with_couchapi());
        assert_eq!(nodes[0].service_port(ServiceKind::View), Some(8092));
        assert_eq!(nodes[0].ssl_service_port(ServiceKind::View), Some(18092));
    }

    #[test]
    fn test_inputs_not_mutated() {
        let legacy = vec![legacy_node("1.2.3.4")];
        let before = legacy.clone();
        let _ = reconcile(&legacy, Some(vec![extended_entry(None)]), &caps_with_couchapi());
        assert_eq!(legacy, before);
    }
}
