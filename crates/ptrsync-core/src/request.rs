//! Change requests
//!
//! A [`ChangeRequest`] describes what the caller wants changed. Argument
//! parsing and canonicalization happen before a request is built; the
//! engine only re-checks the shape with [`ChangeRequest::validate`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Requested operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Remove,
}

/// Forward record kind; the caller decides, the engine never infers it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordKind {
    A,
    Cname,
}

/// Caller intent for one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub operation: Operation,
    pub kind: RecordKind,
    pub hostname: String,
    /// Address of an A record
    pub ip: Option<Ipv4Addr>,
    /// Target of a CNAME record
    pub cname: Option<String>,
    /// Forward zone name, with or without trailing dot
    pub zone_name: String,
}

impl ChangeRequest {
    pub fn add_a(hostname: impl Into<String>, ip: Ipv4Addr, zone_name: impl Into<String>) -> Self {
        Self {
            operation: Operation::Add,
            kind: RecordKind::A,
            hostname: hostname.into(),
            ip: Some(ip),
            cname: None,
            zone_name: zone_name.into(),
        }
    }

    pub fn remove_a(
        hostname: impl Into<String>,
        ip: Ipv4Addr,
        zone_name: impl Into<String>,
    ) -> Self {
        Self {
            operation: Operation::Remove,
            ..Self::add_a(hostname, ip, zone_name)
        }
    }

    pub fn add_cname(
        hostname: impl Into<String>,
        cname: impl Into<String>,
        zone_name: impl Into<String>,
    ) -> Self {
        Self {
            operation: Operation::Add,
            kind: RecordKind::Cname,
            hostname: hostname.into(),
            ip: None,
            cname: Some(cname.into()),
            zone_name: zone_name.into(),
        }
    }

    pub fn remove_cname(
        hostname: impl Into<String>,
        cname: impl Into<String>,
        zone_name: impl Into<String>,
    ) -> Self {
        Self {
            operation: Operation::Remove,
            ..Self::add_cname(hostname, cname, zone_name)
        }
    }

    /// Check that exactly one of `ip`/`cname` is set and that it matches `kind`
    pub fn validate(&self) -> Result<()> {
        if self.hostname.is_empty() {
            return Err(Error::invalid_input("hostname is required"));
        }
        if self.zone_name.is_empty() {
            return Err(Error::invalid_input("zone is required"));
        }

        match (self.kind, &self.ip, &self.cname) {
            (_, Some(_), Some(_)) => Err(Error::invalid_input("choose ip or cname")),
            (_, None, None) => Err(Error::invalid_input("choose ip or cname")),
            (RecordKind::A, None, Some(_)) => {
                Err(Error::invalid_input("an A record needs an ip, not a cname"))
            }
            (RecordKind::Cname, Some(_), None) => {
                Err(Error::invalid_input("a CNAME record needs a cname, not an ip"))
            }
            (RecordKind::Cname, None, Some(target)) if target.is_empty() => {
                Err(Error::invalid_input("cname target is empty"))
            }
            _ => Ok(()),
        }
    }
}
