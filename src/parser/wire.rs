//! Raw wire representation of the configuration document
//!
//! Serde mirror of the document the store pushes. Field coverage is
//! deliberately partial: unknown top-level fields, unknown service keys
//! and unknown capability tokens are ignored so that configs from newer
//! servers keep parsing. Conversion into the typed topology parts
//! happens here; assembling them is the parser's job.

use std::collections::BTreeMap;

use log::debug;
use serde::Deserialize;

use crate::core::ServiceKind;
use crate::topology::node::{ExtendedNodeInfo, LOOPBACK, NodeDescriptor};

#[derive(Debug, Deserialize)]
pub(crate) struct RawBucketConfig {
    pub name: String,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub rev: Option<u64>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(rename = "streamingUri", default)]
    pub streaming_uri: Option<String>,
    #[serde(rename = "nodeLocator", default)]
    pub node_locator: Option<String>,
    #[serde(default)]
    pub nodes: Vec<RawLegacyNode>,
    #[serde(rename = "nodesExt", default)]
    pub nodes_ext: Option<Vec<RawExtendedNode>>,
    #[serde(rename = "bucketCapabilities", default)]
    pub bucket_capabilities: Vec<String>,
    #[serde(rename = "vBucketServerMap", default)]
    pub vbucket_server_map: Option<RawVbucketServerMap>,
}

/// Legacy per-node entry: a `host:port` hostname (the port belongs to
/// the config service), an optional view base uri, and a small map of
/// well-known ports.
#[derive(Debug, Deserialize)]
pub(crate) struct RawLegacyNode {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(rename = "couchApiBase", default)]
    pub couch_api_base: Option<String>,
    #[serde(default)]
    pub ports: BTreeMap<String, u16>,
}

impl RawLegacyNode {
    pub(crate) fn into_descriptor(self) -> NodeDescriptor {
        let (hostname, config_port) = match &self.hostname {
            Some(raw) => split_host_port(raw),
            None => (LOOPBACK.to_string(), None),
        };

        let mut services = BTreeMap::new();
        if let Some(port) = config_port {
            services.insert(ServiceKind::Config, port);
        }
        if let Some(port) = self.ports.get("direct") {
            services.insert(ServiceKind::Binary, *port);
        }
        if let Some(base) = &self.couch_api_base {
            if let Some(port) = port_from_uri(base) {
                services.insert(ServiceKind::View, port);
            }
        }

        NodeDescriptor::new(hostname, services, BTreeMap::new())
    }
}

/// Extended per-node entry: a full per-service port map, hostname
/// optional on older servers.
#[derive(Debug, Deserialize)]
pub(crate) struct RawExtendedNode {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub services: BTreeMap<String, u16>,
}

impl RawExtendedNode {
    pub(crate) fn into_node_info(self) -> ExtendedNodeInfo {
        let mut services = BTreeMap::new();
        let mut ssl_services = BTreeMap::new();

        for (key, port) in self.services {
            match ServiceKind::from_wire(&key) {
                Some((kind, true)) => {
                    ssl_services.insert(kind, port);
                }
                Some((kind, false)) => {
                    services.insert(kind, port);
                }
                None => debug!("Ignoring unknown service '{}' in config", key),
            }
        }

        ExtendedNodeInfo {
            hostname: self.hostname,
            services,
            ssl_services,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawVbucketServerMap {
    #[serde(rename = "numReplicas", default)]
    pub num_replicas: u32,
    #[serde(rename = "vBucketMap", default)]
    pub vbucket_map: Vec<Vec<i32>>,
    #[serde(rename = "vBucketMapForward", default)]
    pub vbucket_map_forward: Option<Vec<Vec<i32>>>,
}

/// Split a `host:port` string, tolerating bare IPv6 addresses (which
/// carry colons but no port) and bracketed `[addr]:port` forms.
fn split_host_port(raw: &str) -> (String, Option<u16>) {
    if let Some(rest) = raw.strip_prefix('[') {
        if let Some((addr, port)) = rest.split_once(']') {
            let port = port.strip_prefix(':').and_then(|p| p.parse().ok());
            return (addr.to_string(), port);
        }
    }

    match raw.rsplit_once(':') {
        // A second colon means a bare IPv6 address without a port.
        Some((host, _)) if host.contains(':') => (raw.to_string(), None),
        Some((host, port)) => match port.parse() {
            Ok(port) => (host.to_string(), Some(port)),
            Err(_) => (raw.to_string(), None),
        },
        None => (raw.to_string(), None),
    }
}

/// Extract the authority port of a uri like `http://host:8092/bucket`.
fn port_from_uri(uri: &str) -> Option<u16> {
    let rest = uri.split_once("://").map(|(_, rest)| rest).unwrap_or(uri);
    let authority = rest.split('/').next()?;
    split_host_port(authority).1
}
