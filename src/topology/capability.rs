//! Bucket capability decoding
//!
//! Capabilities are negotiated feature flags advertised per bucket.
//! Decoding is permissive: a token the client does not know is retained
//! as unrecognized instead of failing the document, so the client keeps
//! working against newer servers.

use std::collections::HashSet;

use log::debug;

/// Optional features a bucket can advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketCapability {
    Cbhello,
    Touch,
    /// Classic map/reduce view indexing. Its absence marks the bucket
    /// as ephemeral: no node of the bucket truly exposes a view
    /// endpoint.
    Couchapi,
    Cccp,
    XdcrCheckpointing,
    NodesExt,
    Dcp,
    Xattr,
    Snappy,
    Collections,
}

impl BucketCapability {
    /// Decode a wire token. Unknown tokens decode to `None`.
    pub fn from_wire(token: &str) -> Option<Self> {
        match token {
            "cbhello" => Some(BucketCapability::Cbhello),
            "touch" => Some(BucketCapability::Touch),
            "couchapi" => Some(BucketCapability::Couchapi),
            "cccp" => Some(BucketCapability::Cccp),
            "xdcrCheckpointing" => Some(BucketCapability::XdcrCheckpointing),
            "nodesExt" => Some(BucketCapability::NodesExt),
            "dcp" => Some(BucketCapability::Dcp),
            "xattr" => Some(BucketCapability::Xattr),
            "snappy" => Some(BucketCapability::Snappy),
            "collections" => Some(BucketCapability::Collections),
            _ => None,
        }
    }
}

/// The decoded capability set of a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    known: HashSet<BucketCapability>,
    unrecognized: Vec<String>,
}

impl CapabilitySet {
    /// Decode a sequence of wire tokens.
    ///
    /// Tokens outside the known enumeration are kept verbatim in the
    /// unrecognized list and never fail the decode.
    pub fn decode(tokens: &[String]) -> Self {
        let mut known = HashSet::new();
        let mut unrecognized = Vec::new();

        for token in tokens {
            match BucketCapability::from_wire(token) {
                Some(capability) => {
                    known.insert(capability);
                }
                None => {
                    debug!("Ignoring unrecognized bucket capability '{}'", token);
                    unrecognized.push(token.clone());
                }
            }
        }

        Self { known, unrecognized }
    }

    /// Whether the bucket advertises the given capability.
    pub fn has(&self, capability: BucketCapability) -> bool {
        self.known.contains(&capability)
    }

    /// Tokens that were advertised but are unknown to this client.
    pub fn unrecognized(&self) -> &[String] {
        &self.unrecognized
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.unrecognized.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_known_tokens_decode() {
        let set = CapabilitySet::decode(&tokens(&["couchapi", "dcp", "xattr"]));
        assert!(set.has(BucketCapability::Couchapi));
        assert!(set.has(BucketCapability::Dcp));
        assert!(set.has(BucketCapability::Xattr));
        assert!(!set.has(BucketCapability::Collections));
        assert!(set.unrecognized().is_empty());
    }

    #[test]
    fn test_unknown_token_is_retained_not_fatal() {
        let set = CapabilitySet::decode(&tokens(&["couchapi", "somethingNewer"]));
        assert!(set.has(BucketCapability::Couchapi));
        assert_eq!(set.unrecognized(), ["somethingNewer".to_string()]);
    }

    #[test]
    fn test_empty_set() {
        let set = CapabilitySet::decode(&[]);
        assert!(set.is_empty());
        assert!(!set.has(BucketCapability::Couchapi));
    }
}
