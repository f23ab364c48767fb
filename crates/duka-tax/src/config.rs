//! # Tax Submission Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     DUKA_TAX_URL=https://etims.example/api/invoices                    │
//! │     DUKA_KRA_PIN=P051234567X                                           │
//! │     DUKA_TAX_ENABLED=true                                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/dukapos/tax.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.duka.pos/tax.toml (macOS)        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     no URL, submission disabled                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [tax]
//! enabled = true
//! submission_url = "https://etims.example/api/invoices"
//! seller_pin = "P051234567X"
//! timeout_secs = 10
//! vat_rate_bps = 1600
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use duka_core::types::TaxRate;
use duka_core::DEFAULT_VAT_BPS;

use crate::error::{TaxError, TaxResult};

/// Tax submission settings, the `[tax]` table of `tax.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxConfig {
    /// Master switch. A disabled submitter accepts every receipt and sends
    /// nothing.
    #[serde(default)]
    pub enabled: bool,

    /// Invoice endpoint. Submission is skipped when unset.
    #[serde(default)]
    pub submission_url: Option<String>,

    /// The shop's own tax PIN.
    #[serde(default)]
    pub seller_pin: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// VAT rate used to split the VAT out of receipt totals.
    #[serde(default = "default_vat_rate_bps")]
    pub vat_rate_bps: u32,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_vat_rate_bps() -> u32 {
    DEFAULT_VAT_BPS
}

impl Default for TaxConfig {
    fn default() -> Self {
        TaxConfig {
            enabled: false,
            submission_url: None,
            seller_pin: String::new(),
            timeout_secs: default_timeout_secs(),
            vat_rate_bps: default_vat_rate_bps(),
        }
    }
}

/// On-disk layout: everything lives under `[tax]`.
#[derive(Debug, Default, Deserialize)]
struct TaxFile {
    #[serde(default)]
    tax: TaxConfig,
}

impl TaxConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (tax.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> TaxResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading tax config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Tax config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns a disabled default if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load tax config: {}. Submission disabled.", e);
            Self::default()
        })
    }

    /// Parses the contents of a `tax.toml` file.
    pub fn from_toml(contents: &str) -> TaxResult<Self> {
        let file: TaxFile = toml::from_str(contents)?;
        Ok(file.tax)
    }

    /// Validates the configuration.
    ///
    /// A disabled config is always valid.
    pub fn validate(&self) -> TaxResult<()> {
        if !self.enabled {
            return Ok(());
        }

        if let Some(url) = &self.submission_url {
            let parsed = url::Url::parse(url)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(TaxError::InvalidUrl(format!(
                    "unsupported scheme '{}'",
                    parsed.scheme()
                )));
            }
        }

        if self.seller_pin.trim().is_empty() {
            return Err(TaxError::Config(
                "seller_pin is required when tax submission is enabled".into(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(TaxError::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.vat_rate_bps > 10_000 {
            return Err(TaxError::Config(format!(
                "vat_rate_bps {} is above 100%",
                self.vat_rate_bps
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DUKA_TAX_URL") {
            let url = url.trim();
            debug!(url = %url, "Overriding tax submission URL from environment");
            self.submission_url = if url.is_empty() {
                None
            } else {
                Some(url.to_string())
            };
        }

        if let Ok(pin) = std::env::var("DUKA_KRA_PIN") {
            self.seller_pin = pin.trim().to_string();
        }

        if let Ok(enabled) = std::env::var("DUKA_TAX_ENABLED") {
            self.enabled = matches!(
                enabled.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "duka", "pos")
            .map(|dirs| dirs.config_dir().join("tax.toml"))
    }

    /// Whether receipts should actually be posted.
    pub fn is_active(&self) -> bool {
        self.enabled && self.submission_url.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn vat_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.vat_rate_bps)
    }
}
