//! Built-in known-entity catalog.
//!
//! Extended at runtime through `ScanConfig::known_entities`. Exchange hot
//! wallets rotate, so none are built in; configure them there.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a catalogued entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Custodial exchange (KYC on the other side)
    Exchange,
    /// Cross-chain bridge
    Bridge,
    /// Mixer or privacy pool
    Mixer,
    /// Anything else worth naming
    Service,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exchange => write!(f, "exchange"),
            Self::Bridge => write!(f, "bridge"),
            Self::Mixer => write!(f, "mixer"),
            Self::Service => write!(f, "service"),
        }
    }
}

/// (address, label, kind)
pub const DEFAULT_ENTITIES: &[(&str, &str, EntityKind)] = &[
    ("worm2ZoG2kUd4vFXhvjh93UUH596ayRfgQ2MgjNMTth", "Wormhole Core Bridge", EntityKind::Bridge),
    ("wormDTUJ6AWPNvk59vGQbDvGJmqbDTdgWgAqcLBCgUb", "Wormhole Token Bridge", EntityKind::Bridge),
];
