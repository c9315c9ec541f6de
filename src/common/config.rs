//! # Configuration
//!
//! TOML configuration shared by the `upload` CLI and the `web_server` binary.
//!
//! ## Example
//!
//! ```toml
//! [wallet]
//! public_key = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"
//! auto_connect = true
//!
//! [network]
//! rpc_endpoint = "https://api.mainnet-beta.solana.com"
//! commitment = "confirmed"
//!
//! [storage]
//! root = "user-data/drive"
//! default_account = "Abc123"
//!
//! [picker]
//! max_size_bytes = 31457280
//!
//! [session]
//! reset_on_close = false
//!
//! [server]
//! address = "127.0.0.1:3000"
//! ```
//!
//! Only `[wallet]` and `[network]` are required, every other section falls
//! back to its defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Arguments
/// - `path`: Path to the TOML configuration file
///
/// # Returns
/// - `Ok(T)`: Successfully loaded and parsed configuration
/// - `Err`: File I/O or parsing error
///
/// # Example
/// ```ignore
/// let config: UploaderConfig = load_config("config/uploader.toml")?;
/// ```
pub fn load_config<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path))?;
    let config: T =
        toml::from_str(&content).with_context(|| format!("Failed to parse config file {}", path))?;
    Ok(config)
}

/// Complete uploader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploaderConfig {
    pub wallet: WalletConfig,
    pub network: NetworkConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub picker: PickerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl UploaderConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        load_config(path)
    }
}

/// Wallet identity used to sign for uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Base58 public key of the connected wallet
    pub public_key: String,
    /// Connect as soon as the process starts
    #[serde(default = "default_true")]
    pub auto_connect: bool,
}

/// RPC connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint (e.g. "https://api.mainnet-beta.solana.com")
    pub rpc_endpoint: String,
    #[serde(default = "default_commitment")]
    pub commitment: String,
}

/// Storage backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory used by the local development backend
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Public base URL under which uploaded files are reported
    #[serde(default = "default_cdn_base")]
    pub cdn_base: String,
    /// Account preselected for uploads when the caller does not provide one
    #[serde(default)]
    pub default_account: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            cdn_base: default_cdn_base(),
            default_account: None,
        }
    }
}

/// File picker limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickerConfig {
    #[serde(default = "default_max_size")]
    pub max_size_bytes: u64,
    /// Accepted MIME types; defaults to the built-in allow-list
    #[serde(default)]
    pub accepted_types: Option<Vec<String>>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size(),
            accepted_types: None,
        }
    }
}

/// Upload session behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Clear the selection and notification whenever the modal closes
    #[serde(default)]
    pub reset_on_close: bool,
}

/// HTTP front-end settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    /// Directory of static front-end assets
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            frontend_dir: default_frontend_dir(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("user-data/drive")
}

fn default_cdn_base() -> String {
    "https://shdw-drive.genesysgo.net".to_string()
}

fn default_max_size() -> u64 {
    30 * 1024 * 1024
}

fn default_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_frontend_dir() -> PathBuf {
    PathBuf::from("frontend/build")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn minimal_config_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[wallet]
public_key = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"

[network]
rpc_endpoint = "http://127.0.0.1:8899"
"#
        )
        .unwrap();

        let config = UploaderConfig::from_file(file.path().to_str().unwrap()).unwrap();

        assert!(config.wallet.auto_connect);
        assert_eq!(config.network.commitment, "confirmed");
        assert_eq!(config.picker.max_size_bytes, 30 * 1024 * 1024);
        assert!(config.picker.accepted_types.is_none());
        assert!(!config.session.reset_on_close);
        assert_eq!(config.server.address, "127.0.0.1:3000");
        assert_eq!(config.storage.cdn_base, "https://shdw-drive.genesysgo.net");
        assert!(config.storage.default_account.is_none());
    }

    #[test]
    fn missing_wallet_section_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[network]\nrpc_endpoint = \"http://127.0.0.1:8899\"\n").unwrap();

        assert!(UploaderConfig::from_file(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn load_errors_name_the_file() {
        let missing = "does/not/exist/uploader.toml";
        let err = UploaderConfig::from_file(missing).unwrap_err();
        assert!(err.to_string().contains(missing));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[wallet\n").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let err = UploaderConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config file"));
        assert!(err.to_string().contains(&path));
    }
}
