use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub toolkit: ToolkitSettings,
    #[serde(default)]
    pub certificate: CertificateSettings,
    #[serde(default)]
    pub output: OutputPaths,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Binaries used to mint and convert key material
#[derive(Debug, Deserialize, Clone)]
pub struct ToolkitSettings {
    #[serde(default = "default_openssl")]
    pub openssl: String,
    #[serde(default = "default_ssh_keygen")]
    pub ssh_keygen: String,
}

impl Default for ToolkitSettings {
    fn default() -> Self {
        Self {
            openssl: default_openssl(),
            ssh_keygen: default_ssh_keygen(),
        }
    }
}

fn default_openssl() -> String {
    "openssl".to_string()
}

fn default_ssh_keygen() -> String {
    "ssh-keygen".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CertificateSettings {
    #[serde(default = "default_curve")]
    pub curve: String,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default = "default_validity_days")]
    pub validity_days: u32,
    #[serde(default = "default_rsa_bits")]
    pub rsa_bits: u32,
}

impl Default for CertificateSettings {
    fn default() -> Self {
        Self {
            curve: default_curve(),
            subject: default_subject(),
            validity_days: default_validity_days(),
            rsa_bits: default_rsa_bits(),
        }
    }
}

fn default_curve() -> String {
    "prime256v1".to_string()
}

fn default_subject() -> String {
    "/CN=Keybox".to_string()
}

fn default_validity_days() -> u32 {
    3650 // 10 years
}

fn default_rsa_bits() -> u32 {
    2048
}

/// Where the intermediate PEM files and the finished keybox land
#[derive(Debug, Deserialize, Clone)]
pub struct OutputPaths {
    #[serde(default = "default_ec_private_key_path")]
    pub ec_private_key_path: PathBuf,
    #[serde(default = "default_certificate_path")]
    pub certificate_path: PathBuf,
    #[serde(default = "default_rsa_private_key_path")]
    pub rsa_private_key_path: PathBuf,
    #[serde(default = "default_keybox_path")]
    pub keybox_path: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            ec_private_key_path: default_ec_private_key_path(),
            certificate_path: default_certificate_path(),
            rsa_private_key_path: default_rsa_private_key_path(),
            keybox_path: default_keybox_path(),
        }
    }
}

fn default_ec_private_key_path() -> PathBuf {
    PathBuf::from("ecPrivateKey.pem")
}

fn default_certificate_path() -> PathBuf {
    PathBuf::from("certificate.pem")
}

fn default_rsa_private_key_path() -> PathBuf {
    PathBuf::from("rsaPrivateKey.pem")
}

fn default_keybox_path() -> PathBuf {
    PathBuf::from("keybox.xml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
    /// How long a connected client may take to send its request
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

fn default_socket_path() -> PathBuf {
    PathBuf::from("/tmp/keybox_socket")
}

fn default_read_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig =
            toml::from_str(&config_str).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load from `path` when given, otherwise fall back to built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
