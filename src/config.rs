//! Layered configuration.
//!
//! [`Settings`] holds what one source (flags, environment, config file) provides;
//! every field is optional. Sources are stacked with [`Settings::or`] and the
//! result is resolved once into a [`Config`], which applies defaults and rejects
//! unusable values before any backend call is made.

use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;

use crate::error::{Result, VaultOpenVpnError};
use crate::listing::{OutputFormat, SortKey};

/// Default values for configuration
mod defaults {
    use std::time::Duration;

    pub const VAULT_ADDRESS: &str = "https://127.0.0.1:8200";
    pub const PKI_MOUNTPOINT: &str = "/pki";
    pub const PKI_ROLE: &str = "openvpn";
    pub const AUTO_REVOKE: bool = true;
    pub const CERT_TTL: Duration = Duration::from_secs(8760 * 3600);
    pub const LOG_LEVEL: &str = "info";
    pub const TEMPLATE_PATH: &str = ".";
    pub const LIST_EXPIRED: bool = false;
}

/// File name searched for in the home and config directories.
pub const CONFIG_FILE_NAME: &str = "vault-openvpn.toml";

/// Dotfile holding a token written by `vault login`.
pub const TOKEN_FILE_NAME: &str = ".vault-token";

/// Options as provided by a single configuration source.
///
/// Keys in a config file use the same kebab-case names as the command-line flags.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    pub vault_addr: Option<String>,
    pub vault_token: Option<String>,
    pub pki_mountpoint: Option<String>,
    pub pki_role: Option<String>,
    pub auto_revoke: Option<bool>,
    pub ttl: Option<String>,
    pub ovpn_key: Option<String>,
    pub template_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub sort: Option<String>,
    pub format: Option<String>,
    pub list_expired: Option<bool>,
    pub vault_cacert: Option<PathBuf>,
    pub vault_capath: Option<PathBuf>,
    pub vault_skip_verify: Option<bool>,
}

impl Settings {
    /// Fills every unset field from `lower`, keeping the values already set.
    pub fn or(self, lower: Settings) -> Settings {
        Settings {
            vault_addr: self.vault_addr.or(lower.vault_addr),
            vault_token: self.vault_token.or(lower.vault_token),
            pki_mountpoint: self.pki_mountpoint.or(lower.pki_mountpoint),
            pki_role: self.pki_role.or(lower.pki_role),
            auto_revoke: self.auto_revoke.or(lower.auto_revoke),
            ttl: self.ttl.or(lower.ttl),
            ovpn_key: self.ovpn_key.or(lower.ovpn_key),
            template_path: self.template_path.or(lower.template_path),
            log_level: self.log_level.or(lower.log_level),
            sort: self.sort.or(lower.sort),
            format: self.format.or(lower.format),
            list_expired: self.list_expired.or(lower.list_expired),
            vault_cacert: self.vault_cacert.or(lower.vault_cacert),
            vault_capath: self.vault_capath.or(lower.vault_capath),
            vault_skip_verify: self.vault_skip_verify.or(lower.vault_skip_verify),
        }
    }

    /// Parses settings from TOML text.
    pub fn from_toml(source: &str) -> Result<Settings> {
        Ok(toml::from_str(source)?)
    }

    /// Loads the config file.
    ///
    /// An explicitly named file must exist. Without one the default locations are
    /// tried in order and a missing file yields empty settings. Returns the path of
    /// the file actually used.
    pub fn load_file(explicit: Option<&Path>) -> Result<(Settings, Option<PathBuf>)> {
        if let Some(path) = explicit {
            let settings = Self::read_file(path)?;
            return Ok((settings, Some(path.to_path_buf())));
        }

        for candidate in default_config_files() {
            if candidate.is_file() {
                let settings = Self::read_file(&candidate)?;
                return Ok((settings, Some(candidate)));
            }
        }

        Ok((Settings::default(), None))
    }

    fn read_file(path: &Path) -> Result<Settings> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            VaultOpenVpnError::ConfigurationError(format!(
                "Unable to read config file {}: {e}",
                path.display()
            ))
        })?;

        Self::from_toml(&source).map_err(|e| {
            VaultOpenVpnError::ConfigurationError(format!(
                "Unable to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Settings holding only the token stored in `~/.vault-token`, if any.
    pub fn from_token_file() -> Settings {
        Settings {
            vault_token: dirs::home_dir()
                .and_then(|home| read_token_file(&home.join(TOKEN_FILE_NAME))),
            ..Settings::default()
        }
    }
}

/// Candidate config files, in lookup order.
fn default_config_files() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".config").join(CONFIG_FILE_NAME));
        candidates.push(home.join(CONFIG_FILE_NAME));
    }
    candidates
}

/// Reads a token file, ignoring surrounding whitespace. Unreadable or empty files yield `None`.
pub fn read_token_file(path: &Path) -> Option<String> {
    let token = std::fs::read_to_string(path).ok()?;
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Fully resolved configuration, read once at startup.
///
/// # Fields
/// * `vault_address` - Base URL of the Vault API.
/// * `vault_token` - Token used for every request; checked when the client is built.
/// * `pki_mountpoint` - Path the PKI secrets engine is mounted to.
/// * `pki_role` - Role used to issue certificates.
/// * `auto_revoke` - Revoke older certificates for an FQDN before issuing a new one.
/// * `cert_ttl` - Requested lifetime of new certificates.
/// * `ovpn_key` - Secret holding the OpenVPN shared key, if any.
/// * `template_path` - Directory holding `client.conf` and `server.conf`.
/// * `log_level` - Maximum level of emitted log events.
/// * `sort` - Ordering of `list` output.
/// * `format` - Rendering of `list` output.
/// * `list_expired` - Whether `list` includes expired certificates.
/// * `tls` - Trust settings for the connection to Vault.
#[derive(Debug, Clone)]
pub struct Config {
    pub vault_address: String,
    pub vault_token: Option<String>,
    pub pki_mountpoint: String,
    pub pki_role: String,
    pub auto_revoke: bool,
    pub cert_ttl: Duration,
    pub ovpn_key: Option<String>,
    pub template_path: PathBuf,
    pub log_level: LevelFilter,
    pub sort: SortKey,
    pub format: OutputFormat,
    pub list_expired: bool,
    pub tls: TlsConfig,
}

/// How the Vault server certificate is verified.
///
/// A CA file takes precedence over a CA directory, both extend the built-in roots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    pub ca_cert: Option<PathBuf>,
    pub ca_path: Option<PathBuf>,
    pub skip_verify: bool,
}

impl TlsConfig {
    /// Reads the PEM bundles to trust, each paired with the file it came from.
    ///
    /// Every regular file of the CA directory is read, in name order.
    pub fn pem_bundles(&self) -> Result<Vec<(PathBuf, Vec<u8>)>> {
        let files = match (&self.ca_cert, &self.ca_path) {
            (Some(file), _) => vec![file.clone()],
            (None, Some(dir)) => ca_directory_files(dir)?,
            (None, None) => Vec::new(),
        };

        files
            .into_iter()
            .map(|path| {
                let pem = std::fs::read(&path).map_err(|e| {
                    VaultOpenVpnError::ConfigurationError(format!(
                        "Unable to read CA certificate {}: {e}",
                        path.display()
                    ))
                })?;
                Ok((path, pem))
            })
            .collect()
    }
}

fn ca_directory_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let unreadable = |e: std::io::Error| {
        VaultOpenVpnError::ConfigurationError(format!(
            "Unable to read CA directory {}: {e}",
            dir.display()
        ))
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

impl Config {
    /// Applies defaults to `settings` and validates every value.
    pub fn from_settings(settings: Settings) -> Result<Config> {
        let cert_ttl = match settings.ttl.as_deref() {
            Some(ttl) => parse_ttl(ttl)?,
            None => defaults::CERT_TTL,
        };

        Ok(Config {
            vault_address: settings
                .vault_addr
                .unwrap_or_else(|| defaults::VAULT_ADDRESS.to_string()),
            vault_token: settings
                .vault_token
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty()),
            pki_mountpoint: settings
                .pki_mountpoint
                .unwrap_or_else(|| defaults::PKI_MOUNTPOINT.to_string()),
            pki_role: settings
                .pki_role
                .unwrap_or_else(|| defaults::PKI_ROLE.to_string()),
            auto_revoke: settings.auto_revoke.unwrap_or(defaults::AUTO_REVOKE),
            cert_ttl,
            ovpn_key: settings.ovpn_key.filter(|key| !key.trim().is_empty()),
            template_path: settings
                .template_path
                .unwrap_or_else(|| PathBuf::from(defaults::TEMPLATE_PATH)),
            log_level: parse_log_level(
                settings.log_level.as_deref().unwrap_or(defaults::LOG_LEVEL),
            )?,
            sort: settings
                .sort
                .as_deref()
                .map(str::parse::<SortKey>)
                .transpose()?
                .unwrap_or_default(),
            format: settings
                .format
                .as_deref()
                .map(str::parse::<OutputFormat>)
                .transpose()?
                .unwrap_or_default(),
            list_expired: settings.list_expired.unwrap_or(defaults::LIST_EXPIRED),
            tls: TlsConfig {
                ca_cert: settings.vault_cacert,
                ca_path: settings.vault_capath,
                skip_verify: settings.vault_skip_verify.unwrap_or(false),
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            vault_address: defaults::VAULT_ADDRESS.to_string(),
            vault_token: None,
            pki_mountpoint: defaults::PKI_MOUNTPOINT.to_string(),
            pki_role: defaults::PKI_ROLE.to_string(),
            auto_revoke: defaults::AUTO_REVOKE,
            cert_ttl: defaults::CERT_TTL,
            ovpn_key: None,
            template_path: PathBuf::from(defaults::TEMPLATE_PATH),
            log_level: LevelFilter::INFO,
            sort: SortKey::default(),
            format: OutputFormat::default(),
            list_expired: defaults::LIST_EXPIRED,
            tls: TlsConfig::default(),
        }
    }
}

/// Parses a log level name. `warning` is accepted as an alias of `warn`.
pub fn parse_log_level(level: &str) -> Result<LevelFilter> {
    let normalized = match level.trim().to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        other => other.to_string(),
    };

    normalized.parse::<LevelFilter>().map_err(|_| {
        VaultOpenVpnError::ConfigurationError(format!("Unable to interpret log level {level:?}"))
    })
}

/// Parses a TTL such as `8760h`, `1h30m`, `1.5h` or `90d`. A bare number means seconds.
///
/// Fractions of a second are dropped, and a TTL below one second is rejected.
pub fn parse_ttl(input: &str) -> Result<Duration> {
    let input = input.trim();
    let invalid = || VaultOpenVpnError::ConfigurationError(format!("Invalid TTL {input:?}"));

    if input.is_empty() {
        return Err(invalid());
    }

    if let Ok(seconds) = input.parse::<u64>() {
        return match seconds {
            0 => Err(invalid()),
            seconds => Ok(Duration::from_secs(seconds)),
        };
    }

    let component = Regex::new(r"(\d+(?:\.\d+)?|\.\d+)([dhms])").map_err(|_| invalid())?;

    let mut consumed = 0;
    let mut total = 0f64;
    for caps in component.captures_iter(input) {
        let whole = caps.get(0).ok_or_else(invalid)?;
        if whole.start() != consumed {
            return Err(invalid());
        }
        consumed = whole.end();

        let amount: f64 = caps[1].parse().map_err(|_| invalid())?;
        let unit = match &caps[2] {
            "d" => 86_400.0,
            "h" => 3_600.0,
            "m" => 60.0,
            _ => 1.0,
        };
        total += amount * unit;
    }

    if consumed != input.len() || !total.is_finite() || total >= u64::MAX as f64 {
        return Err(invalid());
    }

    match total.trunc() as u64 {
        0 => Err(invalid()),
        seconds => Ok(Duration::from_secs(seconds)),
    }
}

/// Renders a TTL the way the backend expects it.
pub fn format_ttl(ttl: Duration) -> String {
    format!("{}s", ttl.as_secs())
}
