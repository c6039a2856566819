//! Hashed snapshot of the effective configuration.
//!
//! Logged at startup and reported by `/health` so operators can tell which
//! configuration a running instance picked up.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::ResolvedConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Where the base configuration came from.
    pub source: String,
    /// SHA-256 hex digest of the compact JSON form of the effective config.
    pub config_hash: String,
}

impl ConfigSnapshot {
    pub fn capture(resolved: &ResolvedConfig) -> Self {
        let json = serde_json::to_string(&resolved.config).unwrap_or_default();
        Self {
            source: resolved.source.to_string(),
            config_hash: sha256_hex(json.as_bytes()),
        }
    }

    /// First 12 hex characters, for log lines.
    pub fn short_hash(&self) -> &str {
        &self.config_hash[..self.config_hash.len().min(12)]
    }
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::resolve::ConfigSource;

    fn resolved(config: DashboardConfig) -> ResolvedConfig {
        ResolvedConfig {
            config,
            source: ConfigSource::Defaults,
        }
    }

    #[test]
    fn hash_is_deterministic() {
        let a = ConfigSnapshot::capture(&resolved(DashboardConfig::default()));
        let b = ConfigSnapshot::capture(&resolved(DashboardConfig::default()));
        assert_eq!(a, b);
        assert_eq!(a.config_hash.len(), 64);
        assert_eq!(a.short_hash().len(), 12);
        assert_eq!(a.source, "defaults");
    }

    #[test]
    fn hash_tracks_changes() {
        let mut changed = DashboardConfig::default();
        changed.database.pool_size = 3;
        let a = ConfigSnapshot::capture(&resolved(DashboardConfig::default()));
        let b = ConfigSnapshot::capture(&resolved(changed));
        assert_ne!(a.config_hash, b.config_hash);
    }
}
