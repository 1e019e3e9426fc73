//! # Console Configuration
//!
//! Loads `tally.toml` for the console.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command-line flags (`--transport`)
//! 2. Environment variables (`TALLY_*`)
//! 3. Config file (`--config <path>` or the platform config dir)
//! 4. Defaults (this file)
//!
//! ## Example
//! ```toml
//! [store]
//! name = "JOY LOVE CONSUMER GOODS"
//! header_lines = ["Purok 3, Poblacion"]
//!
//! [ledger]
//! seed_items = ["Coke", "Sprite", "Pepsi"]
//!
//! [receipt]
//! width = 32
//! footer_lines = ["Thank you!", "Come again"]
//!
//! [receipt.currency]
//! symbol = "PHP"
//!
//! [printer]
//! transport = "spool"
//! permission = "granted"
//!
//! [printer.spool]
//! paths = ["/tmp/tally-receipts.txt"]
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tally_core::{ReceiptLayout, DEFAULT_SEED_ITEMS};
use tally_printer::PrinterSettings;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Sections
// =============================================================================

/// `[store]`: who is printing the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// First centered line of every receipt.
    #[serde(default = "default_store_name")]
    pub name: String,

    /// Centered lines printed under the store name (address, phone...).
    #[serde(default)]
    pub header_lines: Vec<String>,
}

fn default_store_name() -> String {
    "JOY LOVE CONSUMER GOODS".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            header_lines: Vec::new(),
        }
    }
}

/// `[ledger]`: how a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Product names of the rows a fresh session starts with.
    #[serde(default = "default_seed_items")]
    pub seed_items: Vec<String>,
}

fn default_seed_items() -> Vec<String> {
    DEFAULT_SEED_ITEMS.iter().map(|s| s.to_string()).collect()
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            seed_items: default_seed_items(),
        }
    }
}

// =============================================================================
// App Config
// =============================================================================

/// Complete console configuration.
///
/// `[store]` owns the receipt header: whatever `receipt.store_lines` says is
/// replaced by the store name and header lines (see [`AppConfig::receipt_layout`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub ledger: LedgerSettings,

    #[serde(default)]
    pub receipt: ReceiptLayout,

    #[serde(default)]
    pub printer: PrinterSettings,
}

impl AppConfig {
    /// Loads configuration from file and environment.
    ///
    /// ## Loading Order
    /// 1. Start with defaults
    /// 2. Load from config file if it exists
    /// 3. Override with environment variables
    /// 4. Validate
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads configuration, falling back to defaults on error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Loads the config named by `--config`, or the platform one.
    ///
    /// A file the operator named must load cleanly. A broken platform file
    /// only costs a warning, so the shell still starts with defaults.
    pub fn load_from_flag(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        match config_path {
            Some(path) => Self::load(Some(path)),
            None => Ok(Self::load_or_default(None)),
        }
    }

    /// Parses a TOML document. Missing sections and fields take defaults.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Renders the effective configuration (for `--print-config`).
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.store.name.trim().is_empty() {
            return Err(ConfigError::Invalid("store.name cannot be empty".into()));
        }

        if self.ledger.seed_items.is_empty() {
            return Err(ConfigError::Invalid(
                "ledger.seed_items needs at least one item".into(),
            ));
        }

        self.receipt.validate()?;
        self.printer.validate()?;

        Ok(())
    }

    /// The receipt layout with the `[store]` header filled in.
    pub fn receipt_layout(&self) -> ReceiptLayout {
        let mut layout = self.receipt.clone();
        layout.store_lines = std::iter::once(self.store.name.clone())
            .chain(self.store.header_lines.iter().cloned())
            .collect();
        layout
    }

    /// Applies `TALLY_*` environment variables.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Store name
        if let Some(name) = var("TALLY_STORE_NAME") {
            debug!(store_name = %name, "Overriding store name from environment");
            self.store.name = name;
        }

        // Transport
        if let Some(transport) = var("TALLY_TRANSPORT") {
            match transport.parse() {
                Ok(parsed) => {
                    debug!(transport = %transport, "Overriding transport from environment");
                    self.printer.transport = parsed;
                }
                Err(e) => warn!(error = %e, "Ignoring TALLY_TRANSPORT"),
            }
        }

        // Receipt width
        if let Some(width) = var("TALLY_RECEIPT_WIDTH") {
            match width.parse::<usize>() {
                Ok(w) => {
                    debug!(width = w, "Overriding receipt width from environment");
                    self.receipt.width = w;
                }
                Err(_) => warn!(width = %width, "Ignoring non-numeric TALLY_RECEIPT_WIDTH"),
            }
        }

        // Currency symbol
        if let Some(symbol) = var("TALLY_CURRENCY_SYMBOL") {
            self.receipt.currency.symbol = symbol;
        }

        // Spool file
        if let Some(path) = var("TALLY_SPOOL_PATH") {
            debug!(path = %path, "Overriding spool path from environment");
            self.printer.spool.paths = vec![PathBuf::from(path)];
        }
    }

    /// `tally.toml` in the platform config directory.
    ///
    /// - **Linux**: `~/.config/pos/tally.toml`
    /// - **macOS**: `~/Library/Application Support/com.tally.pos/tally.toml`
    /// - **Windows**: `%APPDATA%\tally\pos\config\tally.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "pos")
            .map(|dirs| dirs.config_dir().join("tally.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tally_printer::{PermissionPolicy, TransportKind};

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.ledger.seed_items, vec!["Coke", "Sprite", "Pepsi"]);
        assert_eq!(config.printer.transport, TransportKind::Rfcomm);
        assert_eq!(config.receipt.width, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [store]
            name = "Sari-Sari Corner"

            [receipt]
            width = 42

            [printer]
            transport = "spool"
            permission = "granted"

            [printer.spool]
            paths = ["/tmp/receipts.txt"]
            "#,
        )
        .unwrap();

        assert_eq!(config.store.name, "Sari-Sari Corner");
        assert_eq!(config.receipt.width, 42);
        assert_eq!(config.receipt.name_width, 10);
        assert_eq!(config.ledger.seed_items.len(), 3);
        assert_eq!(config.printer.permission, PermissionPolicy::Granted);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_transport_fails_to_parse() {
        let result = AppConfig::from_toml("[printer]\ntransport = \"usb\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = AppConfig::default();
        config.ledger.seed_items.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.receipt.width = 8;
        assert!(matches!(config.validate(), Err(ConfigError::Receipt(_))));

        let mut config = AppConfig::default();
        config.printer.transport = TransportKind::Spool;
        assert!(matches!(config.validate(), Err(ConfigError::Printer(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_overrides(env(&[
            ("TALLY_STORE_NAME", "Night Market"),
            ("TALLY_TRANSPORT", "file"),
            ("TALLY_RECEIPT_WIDTH", "48"),
            ("TALLY_CURRENCY_SYMBOL", "₱"),
            ("TALLY_SPOOL_PATH", "/tmp/spool.txt"),
        ]));

        assert_eq!(config.store.name, "Night Market");
        assert_eq!(config.printer.transport, TransportKind::Spool);
        assert_eq!(config.receipt.width, 48);
        assert_eq!(config.receipt.currency.symbol, "₱");
        assert_eq!(config.printer.spool.paths, vec![PathBuf::from("/tmp/spool.txt")]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(env(&[
            ("TALLY_TRANSPORT", "carrier-pigeon"),
            ("TALLY_RECEIPT_WIDTH", "wide"),
        ]));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_store_owns_receipt_header() {
        let mut config = AppConfig::default();
        config.store.name = "Sari-Sari Corner".into();
        config.store.header_lines = vec!["Purok 3".into()];
        config.receipt.store_lines = vec!["ignored".into()];

        assert_eq!(
            config.receipt_layout().store_lines,
            vec!["Sari-Sari Corner".to_string(), "Purok 3".to_string()]
        );
    }

    #[test]
    fn test_round_trip_through_print_config() {
        let config = AppConfig::default();
        let rendered = config.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&rendered).unwrap(), config);
    }

    #[test]
    fn test_named_config_must_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.toml");
        std::fs::write(&path, "[receipt]\nwidth = \"wide\"\n").unwrap();

        assert!(matches!(
            AppConfig::load_from_flag(Some(path.clone())),
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(AppConfig::load_or_default(Some(path)).receipt.width, 32);
    }

    #[test]
    fn test_missing_explicit_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(Some(dir.path().join("tally.toml")));
        assert_eq!(config.ledger, LedgerSettings::default());
    }
}
