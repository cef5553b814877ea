//! Ledger configuration
//!
//! Layered the usual way: built-in defaults, then an optional config file,
//! then `TENURE_*` environment variables (nested keys joined with `__`, e.g.
//! `TENURE_POOL__STABLE_RATE_BPS=800`).

use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tenure_common::{
    types::amount::MAX_DECIMALS, AccountId, AssetUnit, BasisPoints, PoolConfig, Result,
    TenureError,
};

/// Default config file stem, resolved as `tenure.toml`, `tenure.json`, ...
pub const DEFAULT_CONFIG_FILE: &str = "tenure";

/// Pool settings as written by operators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Annualized stable rate in basis points
    pub stable_rate_bps: BasisPoints,
    /// Minimum deposit in whole asset units (e.g. `"100"` USDC)
    pub minimum_deposit: Decimal,
    /// Pooled asset
    pub asset: AssetUnit,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            stable_rate_bps: crate::DEFAULT_STABLE_RATE_BPS,
            minimum_deposit: Decimal::ZERO,
            asset: AssetUnit::default(),
        }
    }
}

/// Ledger service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Pool parameters
    pub pool: PoolSettings,
    /// Account allowed to change the minimum deposit
    pub admin: String,
    /// Buffered events per subscriber
    pub event_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            pool: PoolSettings::default(),
            admin: "admin".to_string(),
            event_capacity: crate::DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl LedgerConfig {
    /// Load configuration from `.env`, the config file and the environment.
    ///
    /// The file path comes from `TENURE_CONFIG`, falling back to
    /// [`DEFAULT_CONFIG_FILE`]; a missing file is not an error.
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let path =
            std::env::var("TENURE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    /// Load configuration using `path` as the config file
    pub fn load_from(path: &str) -> Result<Self> {
        let defaults = Config::try_from(&LedgerConfig::default()).map_err(config_error)?;

        let cfg: LedgerConfig = Config::builder()
            .add_source(defaults)
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("TENURE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Check values the type system cannot
    pub fn validate(&self) -> Result<()> {
        if self.pool.asset.decimals > MAX_DECIMALS {
            return Err(TenureError::Config(format!(
                "asset.decimals must be at most {}, got {}",
                MAX_DECIMALS, self.pool.asset.decimals
            )));
        }
        if self.event_capacity == 0 {
            return Err(TenureError::Config(
                "event_capacity must be positive".to_string(),
            ));
        }
        if self.admin.is_empty() {
            return Err(TenureError::Config("admin must not be empty".to_string()));
        }
        self.pool_config().map(|_| ())
    }

    /// Pool configuration in smallest units
    pub fn pool_config(&self) -> Result<PoolConfig> {
        let minimum = self
            .pool
            .asset
            .to_units(self.pool.minimum_deposit)
            .ok_or_else(|| {
                TenureError::Config(format!(
                    "minimum_deposit {} is not representable in {}",
                    self.pool.minimum_deposit, self.pool.asset.symbol
                ))
            })?;
        Ok(PoolConfig::new(self.pool.stable_rate_bps, self.pool.asset.clone())
            .with_minimum_deposit(minimum))
    }

    pub fn admin_account(&self) -> AccountId {
        AccountId::new(self.admin.clone())
    }
}

fn config_error(err: config::ConfigError) -> TenureError {
    TenureError::Config(err.to_string())
}
