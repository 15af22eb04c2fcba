use std::io;

use serde::{Deserialize, Serialize};

use crate::dns::Error;
use crate::zone::AUTHORITATIVE_MARKER;

/// Controls how [`NetworkTopology`](../topology/struct.NetworkTopology.html)
/// carves a global zone into server tiers
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TopologyConfig {
    /// TLD labels (without dot) that get a TLD tier
    #[serde(default = "default_known_tlds")]
    pub known_tlds: Vec<String>,
    /// Substring identifying authoritative server names
    #[serde(default = "default_authoritative_marker")]
    pub authoritative_marker: String,
}

fn default_known_tlds() -> Vec<String> {
    ["com", "org", "info", "net", "biz"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_authoritative_marker() -> String {
    AUTHORITATIVE_MARKER.to_owned()
}

impl Default for TopologyConfig {
    fn default() -> Self {
        TopologyConfig {
            known_tlds: default_known_tlds(),
            authoritative_marker: default_authoritative_marker(),
        }
    }
}

impl TopologyConfig {
    pub fn from_reader<R: io::Read>(reader: R) -> Result<TopologyConfig, Error> {
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TopologyConfig::default();
        assert_eq!(config.known_tlds, vec!["com", "org", "info", "net", "biz"]);
        assert_eq!(config.authoritative_marker, "auth-server.net");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = TopologyConfig::from_reader(&br#"{"known_tlds": ["org"]}"#[..]).unwrap();
        assert_eq!(config.known_tlds, vec!["org"]);
        assert_eq!(config.authoritative_marker, "auth-server.net");

        let config = TopologyConfig::from_reader(&b"{}"[..]).unwrap();
        assert_eq!(config, TopologyConfig::default());
    }

    #[test]
    fn malformed_config_is_rejected() {
        match TopologyConfig::from_reader(&b"{\"known_tlds\": 3}"[..]) {
            Err(Error::Serialization(_)) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
