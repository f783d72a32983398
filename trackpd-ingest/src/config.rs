//! trackpd-ingest configuration
//!
//! Reads `[store]`, `[logging]` and `[ingest]` from the shared TOML file.

use serde::{Deserialize, Serialize};
use trackpd_common::config::{LoggingConfig, StoreSection};

pub const DEFAULT_PORT: u16 = 8880;
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Collection new samples are appended to
pub const DEFAULT_COLLECTION: &str = "tremorstest";

/// Sections of the config file this service reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestFileConfig {
    pub store: StoreSection,
    pub logging: LoggingConfig,
    pub ingest: IngestSection,
}

/// `[ingest]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    pub host: String,
    pub port: u16,
    pub collection: String,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl IngestSection {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let section = IngestSection::default();
        assert_eq!(section.bind_address(), "0.0.0.0:8880");
        assert_eq!(section.collection, "tremorstest");
    }

    #[test]
    fn test_partial_section() {
        let config: IngestFileConfig =
            toml::from_str("[ingest]\ncollection = \"tremors\"\n").unwrap();
        assert_eq!(config.ingest.collection, "tremors");
        assert_eq!(config.ingest.port, 8880);
        assert_eq!(config.logging.level, "info");
    }
}
