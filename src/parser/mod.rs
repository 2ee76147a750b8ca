//! Topology parser
//!
//! Entry point turning raw configuration text into a
//! [`BucketTopology`]. Parsing is synchronous and CPU-bound; it either
//! produces a fully valid topology or a [`ConfigError`], never a
//! partial one.

mod wire;

use log::trace;

use crate::core::{ConfigError, Result};
use crate::topology::bucket::{BucketTopology, Locator};
use crate::topology::capability::CapabilitySet;
use crate::topology::node::{NodeDescriptor, reconcile};
use crate::topology::partition::PartitionMap;
use wire::{RawBucketConfig, RawExtendedNode, RawLegacyNode};

/// Placeholder the store substitutes for the contacted node's own
/// hostname in configs served over the config service.
const HOST_PLACEHOLDER: &str = "$HOST";

/// Decode-time dependencies for [`parse`].
///
/// Carries the environment hints and credentials the surrounding
/// session injects into a parse: the origin hostname replaces the
/// server's literal `$HOST` placeholder, and credentials are applied to
/// the finished topology before it is published.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    /// Hostname the raw document was fetched from
    pub origin: Option<String>,
    /// Username applied to the parsed topology
    pub username: Option<String>,
    /// Password applied to the parsed topology
    pub password: Option<String>,
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the origin hostname used for `$HOST` substitution.
    pub fn origin(mut self, origin: &str) -> Self {
        self.origin = Some(origin.to_string());
        self
    }

    /// Set the credentials applied to the parsed topology.
    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }
}

/// Parse a raw configuration document into a [`BucketTopology`].
///
/// Any structural failure (malformed document, missing required field,
/// partition entry referencing an index outside the node domain) is
/// reported as [`ConfigError::Parse`] wrapping the underlying cause.
pub fn parse(raw: &str, ctx: &ParseContext) -> Result<BucketTopology> {
    let raw = match &ctx.origin {
        Some(origin) => raw.replace(HOST_PLACEHOLDER, origin),
        None => raw.to_string(),
    };

    let config: RawBucketConfig = serde_json::from_str(&raw)?;
    build_topology(config, ctx)
}

fn build_topology(config: RawBucketConfig, ctx: &ParseContext) -> Result<BucketTopology> {
    let locator = match config.node_locator.as_deref() {
        Some("vbucket") => Locator::Vbucket,
        Some("ketama") => Locator::Ketama,
        Some(other) => {
            return Err(ConfigError::Parse(format!("unknown node locator '{}'", other)));
        }
        None => return Err(ConfigError::Parse("missing node locator".to_string())),
    };

    let capabilities = CapabilitySet::decode(&config.bucket_capabilities);

    let legacy: Vec<NodeDescriptor> = config
        .nodes
        .into_iter()
        .map(RawLegacyNode::into_descriptor)
        .collect();
    let extended = config.nodes_ext.map(|entries| {
        entries
            .into_iter()
            .map(RawExtendedNode::into_node_info)
            .collect::<Vec<_>>()
    });
    let nodes = reconcile(&legacy, extended, &capabilities);
    let node_count = nodes.len();

    let mut topology = BucketTopology::new(config.name, locator, nodes, capabilities);

    if let Some(uuid) = config.uuid {
        topology = topology.with_uuid(uuid);
    }
    if let Some(rev) = config.rev {
        topology = topology.with_rev(rev);
    }
    if let Some(uri) = config.uri {
        topology = topology.with_uri(uri);
    }
    if let Some(uri) = config.streaming_uri {
        topology = topology.with_streaming_uri(uri);
    }

    // The partition table only applies to the vbucket locator; a ketama
    // bucket routes through its hash ring instead.
    if locator == Locator::Vbucket {
        if let Some(server_map) = config.vbucket_server_map {
            let partitions = PartitionMap::build(server_map.vbucket_map, node_count)?;
            trace!(
                "Parsed partition map with {} partitions, {} replicas",
                partitions.len(),
                server_map.num_replicas
            );
            topology = topology.with_partitions(partitions, server_map.num_replicas);

            if let Some(forward) = server_map.vbucket_map_forward {
                let forward = PartitionMap::build(forward, node_count)?;
                topology = topology.with_forward_partitions(forward);
            }
        }
    }

    if let Some(username) = &ctx.username {
        topology.set_username(username.as_str());
    }
    if let Some(password) = &ctx.password {
        topology.set_password(password.as_str());
    }

    Ok(topology)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_locator_is_parse_error() {
        let err = parse(r#"{"name": "default"}"#, &ParseContext::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("node locator"));
    }

    #[test]
    fn test_unknown_locator_is_parse_error() {
        let raw = r#"{"name": "default", "nodeLocator": "rendezvous"}"#;
        let err = parse(raw, &ParseContext::new()).unwrap_err();
        assert!(err.to_string().contains("rendezvous"));
    }

    #[test]
    fn test_malformed_document_is_parse_error() {
        assert!(parse("{not json", &ParseContext::new()).is_err());
        assert!(parse(r#"{"nodeLocator": "vbucket"}"#, &ParseContext::new()).is_err());
    }

    #[test]
    fn test_host_placeholder_substitution() {
        let raw = r#"{
            "name": "default",
            "nodeLocator": "vbucket",
            "nodesExt": [{"hostname": "$HOST", "services": {"kv": 11210}}]
        }"#;

        let ctx = ParseContext::new().origin("10.0.0.5");
        let topology = parse(raw, &ctx).unwrap();
        assert_eq!(topology.nodes()[0].hostname(), "10.0.0.5");

        // Without an origin the placeholder stays literal.
        let topology = parse(raw, &ParseContext::new()).unwrap();
        assert_eq!(topology.nodes()[0].hostname(), "$HOST");
    }

    #[test]
    fn test_credentials_applied_from_context() {
        let raw = r#"{"name": "default", "nodeLocator": "vbucket"}"#;
        let ctx = ParseContext::new().credentials("user", "pass");
        let topology = parse(raw, &ctx).unwrap();
        assert_eq!(topology.username(), Some("user"));
        assert_eq!(topology.password(), Some("pass"));
    }

    #[test]
    fn test_ketama_ignores_partition_block() {
        let raw = r#"{
            "name": "cache",
            "nodeLocator": "ketama",
            "vBucketServerMap": {"numReplicas": 1, "vBucketMap": [[0]]}
        }"#;
        let topology = parse(raw, &ParseContext::new()).unwrap();
        assert_eq!(topology.locator(), Locator::Ketama);
        assert_eq!(topology.partition_count(), 0);
    }
}
