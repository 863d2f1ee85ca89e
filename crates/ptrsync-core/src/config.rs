//! Configuration types for the synchronization engine
//!
//! The reverse-zone table is a TOML file listing which reverse hosted zone
//! covers which network:
//!
//! ```toml
//! [[ReverseHostedZone]]
//! NetworkCIDR = "10.0.0.0/8"
//! ZoneName = "10.in-addr.arpa."
//!
//! [[ReverseHostedZone]]
//! NetworkCIDR = "192.168.0.0/16"
//! ZoneName = "168.192.in-addr.arpa."
//! ```
//!
//! Entry order is significant: the first network containing an address wins.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reverse-zone coverage table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseZonesConfig {
    /// Networks and their reverse zones, in precedence order
    #[serde(rename = "ReverseHostedZone", default)]
    pub reverse_hosted_zones: Vec<ReverseHostedZone>,
}

impl ReverseZonesConfig {
    pub fn new(reverse_hosted_zones: Vec<ReverseHostedZone>) -> Self {
        Self {
            reverse_hosted_zones,
        }
    }

    /// Parse the table from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, crate::Error> {
        toml::from_str(contents)
            .map_err(|e| crate::Error::config(format!("invalid reverse zone config: {e}")))
    }

    /// Load the table from a TOML file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            crate::Error::config(format!("failed to read {}: {e}", path.display()))
        })?;

        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(
            "Loaded {} reverse zone(s) from {}",
            config.reverse_hosted_zones.len(),
            path.display()
        );
        Ok(config)
    }
}

/// One network → reverse zone entry
///
/// The CIDR is kept as text here; it is validated when the reverse zone
/// index is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseHostedZone {
    /// Network in `address/prefix` notation
    #[serde(rename = "NetworkCIDR")]
    pub network_cidr: String,

    /// Name of the reverse hosted zone
    #[serde(rename = "ZoneName")]
    pub zone_name: String,
}

impl ReverseHostedZone {
    pub fn new(network_cidr: impl Into<String>, zone_name: impl Into<String>) -> Self {
        Self {
            network_cidr: network_cidr.into(),
            zone_name: zone_name.into(),
        }
    }
}
