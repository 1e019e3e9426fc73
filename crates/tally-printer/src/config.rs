//! # Printer Settings
//!
//! The `[printer]` section of the app config.
//!
//! ## Example
//! ```toml
//! [printer]
//! transport = "rfcomm"
//! permission = "auto"
//!
//! [printer.rfcomm]
//! table_path = "/proc/net/rfcomm"
//! device_dir = "/dev"
//! chunk_size = 4096
//!
//! [printer.spool]
//! paths = ["/tmp/tally-receipts.txt"]
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

// =============================================================================
// Transport Kind
// =============================================================================

/// Which transport the app talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Bluetooth SPP printers bound with `rfcomm bind`.
    #[default]
    Rfcomm,

    /// Append receipts to local files.
    Spool,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Rfcomm => write!(f, "rfcomm"),
            TransportKind::Spool => write!(f, "spool"),
        }
    }
}

impl std::str::FromStr for TransportKind {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rfcomm" | "bluetooth" | "bt" => Ok(TransportKind::Rfcomm),
            "spool" | "file" => Ok(TransportKind::Spool),
            other => Err(SettingsError::UnknownTransport(other.to_string())),
        }
    }
}

// =============================================================================
// Permission Policy
// =============================================================================

/// How the permission gate answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionPolicy {
    /// Probe the system (RFCOMM table and device nodes readable).
    #[default]
    Auto,

    /// Always granted.
    Granted,

    /// Always denied (useful to rehearse the denied path).
    Denied,
}

impl std::fmt::Display for PermissionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionPolicy::Auto => write!(f, "auto"),
            PermissionPolicy::Granted => write!(f, "granted"),
            PermissionPolicy::Denied => write!(f, "denied"),
        }
    }
}

impl std::str::FromStr for PermissionPolicy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(PermissionPolicy::Auto),
            "granted" | "allow" => Ok(PermissionPolicy::Granted),
            "denied" | "deny" => Ok(PermissionPolicy::Denied),
            other => Err(SettingsError::UnknownPermission(other.to_string())),
        }
    }
}

// =============================================================================
// Transport Settings
// =============================================================================

/// Settings for [`crate::transport::rfcomm::RfcommTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfcommSettings {
    /// Kernel table of bound RFCOMM ttys.
    #[serde(default = "default_table_path")]
    pub table_path: PathBuf,

    /// Directory holding the `rfcommN` device nodes.
    #[serde(default = "default_device_dir")]
    pub device_dir: PathBuf,

    /// Largest single write, in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_table_path() -> PathBuf {
    PathBuf::from("/proc/net/rfcomm")
}

fn default_device_dir() -> PathBuf {
    PathBuf::from("/dev")
}

fn default_chunk_size() -> usize {
    4096
}

impl Default for RfcommSettings {
    fn default() -> Self {
        RfcommSettings {
            table_path: default_table_path(),
            device_dir: default_device_dir(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// Settings for [`crate::transport::spool::SpoolTransport`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpoolSettings {
    /// Each file shows up as one printer in a scan.
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

// =============================================================================
// Printer Settings
// =============================================================================

/// Complete `[printer]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterSettings {
    #[serde(default)]
    pub transport: TransportKind,

    #[serde(default)]
    pub permission: PermissionPolicy,

    #[serde(default)]
    pub rfcomm: RfcommSettings,

    #[serde(default)]
    pub spool: SpoolSettings,
}

impl PrinterSettings {
    /// Validates the settings for the selected transport.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.rfcomm.chunk_size == 0 {
            return Err(SettingsError::Invalid(
                "rfcomm.chunk_size must be greater than 0".into(),
            ));
        }

        if self.transport == TransportKind::Spool && self.spool.paths.is_empty() {
            return Err(SettingsError::Invalid(
                "spool transport selected but spool.paths is empty".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_kind_parsing() {
        assert_eq!("rfcomm".parse::<TransportKind>().unwrap(), TransportKind::Rfcomm);
        assert_eq!("Bluetooth".parse::<TransportKind>().unwrap(), TransportKind::Rfcomm);
        assert_eq!("spool".parse::<TransportKind>().unwrap(), TransportKind::Spool);
        assert!("usb".parse::<TransportKind>().is_err());
    }

    #[test]
    fn test_permission_policy_parsing() {
        assert_eq!("auto".parse::<PermissionPolicy>().unwrap(), PermissionPolicy::Auto);
        assert_eq!("deny".parse::<PermissionPolicy>().unwrap(), PermissionPolicy::Denied);
        assert!("maybe".parse::<PermissionPolicy>().is_err());
    }

    #[test]
    fn test_default_settings() {
        let settings = PrinterSettings::default();
        assert_eq!(settings.transport, TransportKind::Rfcomm);
        assert_eq!(settings.rfcomm.chunk_size, 4096);
        assert_eq!(settings.rfcomm.table_path, PathBuf::from("/proc/net/rfcomm"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = PrinterSettings {
            transport: TransportKind::Spool,
            ..PrinterSettings::default()
        };
        assert!(settings.validate().is_err());

        settings.spool.paths.push(PathBuf::from("/tmp/receipts.txt"));
        assert!(settings.validate().is_ok());

        settings.rfcomm.chunk_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let settings: PrinterSettings = toml::from_str(
            r#"
            transport = "spool"

            [spool]
            paths = ["/tmp/a.txt", "/tmp/b.txt"]
            "#,
        )
        .unwrap();
        assert_eq!(settings.transport, TransportKind::Spool);
        assert_eq!(settings.permission, PermissionPolicy::Auto);
        assert_eq!(settings.spool.paths.len(), 2);
        assert_eq!(settings.rfcomm.device_dir, PathBuf::from("/dev"));
    }
}
