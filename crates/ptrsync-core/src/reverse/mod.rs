//! Reverse (PTR) zone selection
//!
//! The index maps configured networks to reverse hosted zones. Lookup is
//! first-match in configuration order: with `10.0.0.0/8` listed before
//! `10.1.0.0/16`, the address `10.1.2.3` lands in the `/8` zone even though
//! the `/16` is more specific.

use crate::config::ReverseHostedZone;
use crate::error::{Error, Result};
use crate::zone::ZoneResolver;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use tracing::debug;

/// Suffix of IPv4 reverse-DNS names
pub const IN_ADDR_ARPA: &str = "in-addr.arpa.";

/// Reverse-DNS name of an IPv4 address: octets reversed, dot-terminated
///
/// `192.168.0.1` becomes `1.0.168.192.in-addr.arpa.`.
pub fn reverse_name(ip: Ipv4Addr) -> String {
    let [a, b, c, d] = ip.octets();
    format!("{d}.{c}.{b}.{a}.{IN_ADDR_ARPA}")
}

/// An IP network in `address/prefix` notation
///
/// Host bits of the address are cleared on parse, so `10.1.2.3/8` and
/// `10.0.0.0/8` describe the same network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cidr {
    network: IpAddr,
    prefix_len: u8,
}

impl Cidr {
    pub fn new(addr: IpAddr, prefix_len: u8) -> Result<Self> {
        let max = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix_len > max {
            return Err(Error::config(format!(
                "invalid CIDR prefix length /{prefix_len} for {addr}"
            )));
        }

        let network = match addr {
            IpAddr::V4(v4) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(prefix_len)).unwrap_or(0);
                IpAddr::V4(Ipv4Addr::from(u32::from(v4) & mask))
            }
            IpAddr::V6(v6) => {
                let mask = u128::MAX.checked_shl(128 - u32::from(prefix_len)).unwrap_or(0);
                IpAddr::V6((u128::from(v6) & mask).into())
            }
        };

        Ok(Self {
            network,
            prefix_len,
        })
    }

    pub fn network(&self) -> IpAddr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Whether `ip` lies inside this network (never across address families)
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(self.prefix_len)).unwrap_or(0);
                u32::from(ip) & mask == u32::from(net)
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = u128::MAX.checked_shl(128 - u32::from(self.prefix_len)).unwrap_or(0);
                u128::from(ip) & mask == u128::from(net)
            }
            _ => false,
        }
    }
}

impl FromStr for Cidr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (addr, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| Error::config(format!("invalid CIDR address: {s}")))?;

        let addr: IpAddr = addr
            .parse()
            .map_err(|_| Error::config(format!("invalid CIDR address: {s}")))?;
        let prefix_len: u8 = prefix
            .parse()
            .map_err(|_| Error::config(format!("invalid CIDR address: {s}")))?;

        Cidr::new(addr, prefix_len)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// A configured network with its resolved reverse zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseZoneEntry {
    pub network: Cidr,
    pub zone_name: String,
    pub zone_id: String,
}

/// Ordered CIDR → reverse zone mapping
///
/// Built once per invocation and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct ReverseZoneIndex {
    entries: Vec<ReverseZoneEntry>,
}

impl ReverseZoneIndex {
    /// Build the index from configuration, resolving every zone name
    ///
    /// All CIDRs are parsed before any zone is resolved, so a malformed
    /// network fails the build without touching the provider. Any failure
    /// fails the whole build.
    pub async fn build(
        zones: &[ReverseHostedZone],
        resolver: &ZoneResolver<'_>,
    ) -> Result<Self> {
        let networks = zones
            .iter()
            .map(|zone| zone.network_cidr.parse::<Cidr>())
            .collect::<Result<Vec<_>>>()?;

        let mut entries = Vec::with_capacity(zones.len());
        for (zone, network) in zones.iter().zip(networks) {
            let zone_id = resolver.resolve(&zone.zone_name).await?;
            debug!("Reverse zone {} ({}) covers {}", zone.zone_name, zone_id, network);
            entries.push(ReverseZoneEntry {
                network,
                zone_name: zone.zone_name.clone(),
                zone_id,
            });
        }

        Ok(Self { entries })
    }

    /// Build an index from already-resolved entries, keeping their order
    pub fn from_entries(entries: Vec<ReverseZoneEntry>) -> Self {
        Self { entries }
    }

    /// Zone ID of the first entry whose network contains `ip`
    pub fn lookup(&self, ip: IpAddr) -> Result<&str> {
        self.entries
            .iter()
            .find(|entry| entry.network.contains(ip))
            .map(|entry| entry.zone_id.as_str())
            .ok_or(Error::ReverseZoneNotFound { ip })
    }

    pub fn entries(&self) -> &[ReverseZoneEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
