//! Error types for the record synchronization engine
//!
//! Every component returns the first error it encounters. Only the
//! orchestrator performs remediation before propagating, and when that
//! remediation itself fails it reports both causes through [`Error::Rollback`].

use std::net::IpAddr;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the synchronization engine
///
/// Variants are comparable so callers (and tests) can match on kind and
/// fields instead of formatted text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The provider reported no zone for the name, or the lookup failed
    #[error("hosted zone not found: {zone_name} ({reason})")]
    ZoneNotFound {
        /// Zone name as requested by the caller
        zone_name: String,
        /// Provider-side detail
        reason: String,
    },

    /// The provider's closest match is a different zone
    #[error("unexpected hosted zone name: expected {expected}, actual {actual}")]
    ZoneNameMismatch {
        /// Zone name as requested by the caller
        expected: String,
        /// Zone name the provider returned
        actual: String,
    },

    /// No configured network covers the address
    #[error("no reverse zone covers {ip}")]
    ReverseZoneNotFound {
        /// Address that needed a PTR zone
        ip: IpAddr,
    },

    /// The provider paginated a lookup that must be answered in one record
    #[error("ambiguous result for {name} in zone {zone_id}: response is truncated")]
    AmbiguousResult {
        /// Record name that was looked up
        name: String,
        /// Zone the lookup ran against
        zone_id: String,
    },

    /// The zone holds no record at or after the name
    #[error("record not found: {name} in zone {zone_id}")]
    RecordNotFound {
        /// Record name that was looked up
        name: String,
        /// Zone the lookup ran against
        zone_id: String,
    },

    /// The first record at or after the name is a different record
    #[error("hostname mismatch: input {expected}, response {actual}")]
    NameMismatch {
        /// Record name that was looked up
        expected: String,
        /// Record name the provider returned
        actual: String,
    },

    /// Transport or remote error from the zone provider
    #[error("provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// A compensating mutation failed after a primary mutation failed
    #[error("rollback failed: original error: {original}; compensation error: {compensation}")]
    Rollback {
        /// The failure that triggered compensation
        original: Box<Error>,
        /// The failure of the compensating mutation
        compensation: Box<Error>,
    },

    /// Configuration errors (malformed CIDR, unreadable config file)
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid caller input
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a zone-not-found error
    pub fn zone_not_found(zone_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ZoneNotFound {
            zone_name: zone_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a provider error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Combine a primary failure with the failure of its compensation
    pub fn rollback(original: Error, compensation: Error) -> Self {
        Self::Rollback {
            original: Box::new(original),
            compensation: Box::new(compensation),
        }
    }

    /// True when a compensating mutation failed and provider state may be
    /// inconsistent
    pub fn is_rollback(&self) -> bool {
        matches!(self, Self::Rollback { .. })
    }

    /// The error of the failed compensating mutation, if any
    pub fn compensation_failed(&self) -> Option<&Error> {
        match self {
            Self::Rollback { compensation, .. } => Some(&**compensation),
            _ => None,
        }
    }

    /// The error that started the operation's failure, looking through
    /// rollback wrapping
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Rollback { original, .. } => original.root_cause(),
            other => other,
        }
    }
}
