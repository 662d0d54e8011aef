use std::path::Path;

use alloy::primitives::U256;
use error_stack::{Report, ResultExt};
use url::Url;

use crate::codec::conversion::to_base_units;
use crate::constants::{
    CONFIG_PATH_ENV, DEFAULT_RPC_URL, DEFAULT_STORAGE_FROM, DEFAULT_STORAGE_TO,
    DEFAULT_TOLERANCE, DEFAULT_TOLERANCE_CEILING, RPC_URL_ENV, TOLERANCE_CEILING_ENV,
    TOLERANCE_ENV,
};
use crate::errors::{ChestError, ChestResult, ConfigError};

/// Defaults applied by the [`crate::TestChest`] helpers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChestConfig {
    pub rpc_url: String,
    /// Wei added to the drift of native balance checks
    pub tolerance: U256,
    /// Highest drift accepted by native balance checks, in wei
    pub tolerance_ceiling: U256,
    pub storage_from: u64,
    pub storage_to: u64,
}

impl Default for ChestConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            tolerance: DEFAULT_TOLERANCE,
            tolerance_ceiling: DEFAULT_TOLERANCE_CEILING,
            storage_from: DEFAULT_STORAGE_FROM,
            storage_to: DEFAULT_STORAGE_TO,
        }
    }
}

/// Layout of a config file, every key is optional
///
/// ```toml
/// rpc_url = "http://127.0.0.1:8545"
/// tolerance = "0.01 ether"
/// tolerance_ceiling = "10000000000000000"
///
/// [storage]
/// from = 0
/// to = 20
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChestConfigFile {
    pub rpc_url: Option<String>,
    pub tolerance: Option<String>,
    pub tolerance_ceiling: Option<String>,
    pub storage: Option<StorageRangeFile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageRangeFile {
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl ChestConfig {
    /// Defaults, then the file named by `TXTX_TEST_CHEST_CONFIG`, then the
    /// `TXTX_TEST_CHEST_*` variables.
    pub fn load() -> ChestResult<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file_unchecked(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ChestResult<Self> {
        let config = Self::from_file_unchecked(path)?;
        config.validate()?;
        Ok(config)
    }

    fn from_file_unchecked(path: impl AsRef<Path>) -> ChestResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Report::new(ChestError::Config(ConfigError::Unreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            }))
        })?;
        let mut config = Self::default();
        config
            .apply_toml(&content)
            .attach_printable(format!("Loading config file {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> ChestResult<Self> {
        let mut config = Self::default();
        config.apply_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_toml(&mut self, content: &str) -> ChestResult<()> {
        let file: ChestConfigFile = toml::from_str(content)
            .map_err(|e| Report::new(ChestError::Config(ConfigError::Malformed(e.to_string()))))?;

        if let Some(rpc_url) = file.rpc_url {
            self.rpc_url = rpc_url;
        }
        if let Some(tolerance) = file.tolerance {
            self.tolerance = parse_config_amount("tolerance", &tolerance)?;
        }
        if let Some(ceiling) = file.tolerance_ceiling {
            self.tolerance_ceiling = parse_config_amount("tolerance_ceiling", &ceiling)?;
        }
        if let Some(storage) = file.storage {
            if let Some(from) = storage.from {
                self.storage_from = from;
            }
            if let Some(to) = storage.to {
                self.storage_to = to;
            }
        }
        Ok(())
    }

    /// Overrides fields with the values `lookup` returns for the
    /// `TXTX_TEST_CHEST_*` keys
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ChestResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rpc_url) = lookup(RPC_URL_ENV) {
            self.rpc_url = rpc_url;
        }
        if let Some(tolerance) = lookup(TOLERANCE_ENV) {
            self.tolerance = parse_config_amount(TOLERANCE_ENV, &tolerance)?;
        }
        if let Some(ceiling) = lookup(TOLERANCE_CEILING_ENV) {
            self.tolerance_ceiling = parse_config_amount(TOLERANCE_CEILING_ENV, &ceiling)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> ChestResult<()> {
        Url::parse(&self.rpc_url).map_err(|e| {
            invalid_value("rpc_url", format!("{}: {}", self.rpc_url, e))
        })?;
        if self.tolerance.is_zero() {
            return Err(invalid_value("tolerance", "must be positive"));
        }
        if self.tolerance_ceiling.is_zero() {
            return Err(invalid_value("tolerance_ceiling", "must be positive"));
        }
        if self.storage_from > self.storage_to {
            return Err(invalid_value(
                "storage",
                format!("from ({}) is greater than to ({})", self.storage_from, self.storage_to),
            ));
        }
        Ok(())
    }
}

/// Accepts a plain wei amount or a quantity followed by its unit
fn parse_config_amount(field: &str, value: &str) -> ChestResult<U256> {
    let mut parts = value.split_whitespace();
    let (amount, unit) = match (parts.next(), parts.next(), parts.next()) {
        (Some(amount), None, None) => (amount, "wei"),
        (Some(amount), Some(unit), None) => (amount, unit),
        _ => return Err(invalid_value(field, value)),
    };
    to_base_units(amount, unit)
        .change_context(ChestError::Config(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        }))
}

fn invalid_value(field: &str, value: impl ToString) -> Report<ChestError> {
    Report::new(ChestError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_error(error: &Report<ChestError>) -> &ConfigError {
        match error.current_context() {
            ChestError::Config(config) => config,
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let config = ChestConfig::default();
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.tolerance, U256::from(10_000_000_000_000_000u64));
        assert_eq!(config.tolerance_ceiling, U256::from(10_000_000_000_000_000u64));
        assert_eq!((config.storage_from, config.storage_to), (0, 20));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_str() {
        let config = ChestConfig::from_toml_str(
            r#"
            rpc_url = "http://localhost:9545"
            tolerance = "0.02 ether"
            tolerance_ceiling = "5 gwei"

            [storage]
            to = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.rpc_url, "http://localhost:9545");
        assert_eq!(config.tolerance, U256::from(20_000_000_000_000_000u64));
        assert_eq!(config.tolerance_ceiling, U256::from(5_000_000_000u64));
        assert_eq!((config.storage_from, config.storage_to), (0, 8));
    }

    #[test]
    fn test_malformed_toml() {
        let error = ChestConfig::from_toml_str("rpc_url = ").unwrap_err();
        assert!(matches!(config_error(&error), ConfigError::Malformed(_)));

        let error = ChestConfig::from_toml_str("retries = 3").unwrap_err();
        assert!(matches!(config_error(&error), ConfigError::Malformed(_)));
    }

    #[test]
    fn test_invalid_values() {
        let error = ChestConfig::from_toml_str("tolerance = \"a lot\"").unwrap_err();
        assert!(matches!(
            config_error(&error),
            ConfigError::InvalidValue { field, .. } if field == "tolerance"
        ));

        let error = ChestConfig::from_toml_str("tolerance = \"0\"").unwrap_err();
        assert!(matches!(
            config_error(&error),
            ConfigError::InvalidValue { field, .. } if field == "tolerance"
        ));

        let error = ChestConfig::from_toml_str("rpc_url = \"not a url\"").unwrap_err();
        assert!(matches!(
            config_error(&error),
            ConfigError::InvalidValue { field, .. } if field == "rpc_url"
        ));

        let error =
            ChestConfig::from_toml_str("[storage]\nfrom = 10\nto = 2").unwrap_err();
        assert!(matches!(
            config_error(&error),
            ConfigError::InvalidValue { field, .. } if field == "storage"
        ));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut config =
            ChestConfig::from_toml_str("rpc_url = \"http://localhost:9545\"").unwrap();
        let env: HashMap<&str, &str> = [
            (RPC_URL_ENV, "http://127.0.0.1:8546"),
            (TOLERANCE_ENV, "1000"),
        ]
        .into_iter()
        .collect();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.rpc_url, "http://127.0.0.1:8546");
        assert_eq!(config.tolerance, U256::from(1000u64));
        assert_eq!(config.tolerance_ceiling, DEFAULT_TOLERANCE_CEILING);
    }

    #[test]
    fn test_unreadable_file() {
        let error = ChestConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(config_error(&error), ConfigError::Unreadable { .. }));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("test-chest-{}.toml", std::process::id()));
        std::fs::write(&path, "tolerance = \"0.5 ether\"\n").unwrap();
        let config = ChestConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.tolerance, U256::from(500_000_000_000_000_000u64));
    }
}
