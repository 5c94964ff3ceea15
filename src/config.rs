use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, anyhow};
use jsonschema::{JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::{
    desk::ExchangePolicy,
    types::{Coins, MILLIS_PER_HOUR},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    #[validate(nested)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    #[validate(nested)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    #[validate(nested)]
    pub store: StoreConfig,
}

fn default_enabled_true() -> bool {
    true
}

fn default_logging_dir() -> PathBuf {
    PathBuf::from("./logs/exchange")
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

fn default_logging_retention_days() -> usize {
    14
}

fn default_coin_balance() -> Coins {
    100
}

fn default_card_price() -> Coins {
    10
}

fn default_expiration_hours() -> i64 {
    72
}

fn default_notice_queue_capacity() -> usize {
    64
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./state/cache.json")
}

fn default_cache_ttl_secs() -> i64 {
    3_600
}

fn default_session_ttl_hours() -> i64 {
    168
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
    #[serde(default = "default_logging_retention_days")]
    pub retention_days: usize,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
    #[serde(default = "default_enabled_true")]
    pub audit_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_logging_dir(),
            filter: default_logging_filter(),
            rotation: default_logging_rotation(),
            retention_days: default_logging_retention_days(),
            stderr_warn_enabled: true,
            audit_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LedgerConfig {
    #[serde(default = "default_coin_balance")]
    #[validate(range(min = 0))]
    pub default_coin_balance: Coins,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_coin_balance: default_coin_balance(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExchangeConfig {
    #[serde(default = "default_expiration_hours")]
    #[validate(range(min = 1))]
    pub expiration_hours: i64,
    #[serde(default = "default_card_price")]
    #[validate(range(min = 0))]
    pub default_card_price: Coins,
    #[serde(default = "default_notice_queue_capacity")]
    #[validate(range(min = 1))]
    pub notice_queue_capacity: usize,
    #[serde(default = "default_sweep_interval_secs")]
    #[validate(range(min = 1))]
    pub sweep_interval_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            expiration_hours: default_expiration_hours(),
            default_card_price: default_card_price(),
            notice_queue_capacity: default_notice_queue_capacity(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_cache_ttl_secs")]
    #[validate(range(min = 1))]
    pub cache_ttl_secs: i64,
    #[serde(default = "default_session_ttl_hours")]
    #[validate(range(min = 1))]
    pub session_ttl_hours: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            cache_ttl_secs: default_cache_ttl_secs(),
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config_value: Value = json5::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
        let schema_path = resolve_schema_path(config_base, &config_value)?;
        validate_against_schema(&config_value, &schema_path)?;

        let mut config: Config = serde_json::from_value(config_value)
            .context("failed to deserialize exchange config")?;
        config
            .validate()
            .map_err(|err| anyhow!("config validation failed: {err}"))?;

        if !config.store.path.is_absolute() {
            config.store.path = config_base.join(&config.store.path);
        }

        Ok(config)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.exchange.sweep_interval_secs)
    }

    pub fn policy(&self) -> ExchangePolicy {
        ExchangePolicy {
            default_coin_balance: self.ledger.default_coin_balance,
            default_card_price: self.exchange.default_card_price,
            request_ttl_ms: self.exchange.expiration_hours.saturating_mul(MILLIS_PER_HOUR),
        }
    }
}

fn resolve_schema_path(config_base: &Path, config_value: &Value) -> Result<PathBuf> {
    if let Some(path_text) = config_value.get("$schema").and_then(|value| value.as_str()) {
        let configured = PathBuf::from(path_text);
        if configured.is_absolute() {
            return Ok(configured);
        }
        return Ok(config_base.join(&configured));
    }

    let local_default = config_base.join("lifecard.schema.json");
    if local_default.exists() {
        return Ok(local_default);
    }

    Err(anyhow!(
        "unable to resolve schema path: expected $schema in config or lifecard.schema.json next to it"
    ))
}

fn validate_against_schema(config_value: &Value, schema_path: &Path) -> Result<()> {
    let schema_content = fs::read_to_string(schema_path)
        .with_context(|| format!("failed to read schema {}", schema_path.display()))?;
    let schema: Value = serde_json::from_str(&schema_content)
        .with_context(|| format!("failed to parse schema {}", schema_path.display()))?;

    let compiled =
        JSONSchema::compile(&schema).map_err(|e| anyhow!("failed to compile schema: {e}"))?;

    match compiled.validate(config_value) {
        Ok(()) => Ok(()),
        Err(errors_iter) => {
            let validation_errors: Vec<ValidationError> = errors_iter.collect();
            let messages: Vec<String> = validation_errors
                .into_iter()
                .map(|error| error.to_string())
                .collect();
            Err(anyhow!("config validation failed: {}", messages.join("; ")))
        }
    }
}
