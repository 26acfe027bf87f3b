//! Node configuration for the rent node.
//!
//! Provides [`NodeConfig`] with defaults for the data directory, logging and
//! the rent schedule. Values can be overridden from an optional TOML file and
//! from `RENT__*` environment variables, nested with a double underscore
//! (e.g. `RENT__RENT__UPGRADE_BLOCK=1000`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use rent_core::error::Error;
use rent_core::params::RentParams;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "RENT";

/// Configuration for a rent node instance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct NodeConfig {
    /// Root directory for all persistent data.
    pub data_dir: PathBuf,
    /// Log level filter string (e.g. "info", "debug", "rent_node_lib=trace").
    pub log_level: String,
    /// Log output format ("text" or "json").
    pub log_format: String,
    /// Write each finished block to RocksDB.
    pub persist: bool,
    /// Migrate every pre-existing account when the upgrade block begins,
    /// rather than on first touch.
    pub eager_migration: bool,
    /// Rent schedule.
    pub rent: RentParams,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rent");

        Self {
            data_dir,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            persist: true,
            eager_migration: false,
            rent: RentParams::default(),
        }
    }
}

impl NodeConfig {
    /// Path to the RocksDB state directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("rentdata")
    }

    /// Load defaults, then `file` (if given), then environment overrides.
    pub fn load(file: Option<&Path>) -> Result<Self, Error> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        self.rent.validate()?;
        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(Error::Config(format!(
                "unknown log format: {}",
                self.log_format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use rent_core::types::EvictionBoundary;

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn default_log_level_is_info() {
        let cfg = NodeConfig::default();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.log_format, "text");
    }

    #[test]
    fn default_data_dir_ends_with_rent() {
        let cfg = NodeConfig::default();
        assert!(
            cfg.data_dir.ends_with("rent"),
            "data_dir should end with 'rent': {:?}",
            cfg.data_dir
        );
    }

    #[test]
    fn db_path_appends_rentdata() {
        let cfg = NodeConfig {
            data_dir: PathBuf::from("/tmp/rent-test"),
            ..NodeConfig::default()
        };
        assert_eq!(cfg.db_path(), PathBuf::from("/tmp/rent-test/rentdata"));
    }

    #[test]
    fn defaults_validate() {
        assert!(NodeConfig::default().validate().is_ok());
    }

    #[test]
    fn load_from_file_overrides_fields() {
        let f = write_toml(
            r#"
            log_level = "debug"
            eager_migration = true

            [rent]
            upgrade_block = 1000
            eviction_boundary = "strict"
            "#,
        );
        let cfg = NodeConfig::load(Some(f.path())).unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert!(cfg.eager_migration);
        assert_eq!(cfg.rent.upgrade_block, 1000);
        assert_eq!(cfg.rent.eviction_boundary, EvictionBoundary::Strict);
        // Untouched fields keep their defaults.
        assert_eq!(cfg.rent.account_cost, RentParams::default().account_cost);
        assert!(cfg.persist);
    }

    #[test]
    fn load_rejects_invalid_params() {
        let f = write_toml(
            r#"
            [rent]
            upgrade_block = 0
            "#,
        );
        assert!(matches!(
            NodeConfig::load(Some(f.path())),
            Err(Error::Params(_))
        ));
    }

    #[test]
    fn load_rejects_unknown_log_format() {
        let f = write_toml(r#"log_format = "xml""#);
        assert!(matches!(
            NodeConfig::load(Some(f.path())),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            NodeConfig::load(Some(&missing)),
            Err(Error::Config(_))
        ));
    }
}
