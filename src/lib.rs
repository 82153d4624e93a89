//! # vault-openvpn - OpenVPN configurations backed by the Vault PKI
//!
//! vault-openvpn issues, lists and revokes X.509 certificates through the PKI secrets
//! engine of a Vault server and renders them, together with the CA chain and an optional
//! shared TLS key, into ready-to-use OpenVPN client and server configurations.
//!
//! The backend is the single source of truth: nothing is stored locally and every
//! workflow reads the current state of the PKI mount before acting on it.
//!
//! ## Workflows
//!
//! - **Issue**: `client <fqdn>` / `server <fqdn>` optionally revoke older certificates for
//!   the same name, issue a new one and render `client.conf` / `server.conf`.
//! - **Revoke**: by common name (every match) or by serial. Already revoked or expired
//!   certificates are left alone.
//! - **List**: valid certificates as a table or JSON, sorted by name, issue or expiry date.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vault_openvpn::{
//!     backend::VaultClient,
//!     config::{Config, Settings},
//!     lifecycle::Lifecycle,
//!     template::ConfigKind,
//! };
//!
//! # fn main() -> Result<(), vault_openvpn::error::VaultOpenVpnError> {
//! let config = Config::from_settings(Settings {
//!     vault_addr: Some("https://vault.example.com:8200".to_string()),
//!     vault_token: Some("s.token".to_string()),
//!     ..Settings::default()
//! })?;
//!
//! let client = VaultClient::from_config(&config)?;
//! let lifecycle = Lifecycle::new(&client, &config);
//!
//! let mut stdout = std::io::stdout().lock();
//! lifecycle.issue_config(ConfigKind::Client, "laptop.vpn.example.com", &mut stdout)?;
//! lifecycle.list(&mut stdout)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`backend`]: the [`backend::Backend`] trait, typed responses and the HTTP client.
//! - [`cert`]: certificate decoding and revocation status.
//! - [`directory`]: enumeration and lookup of stored certificates.
//! - [`lifecycle`]: the issue, revoke and list workflows.
//! - [`listing`]: sorting and rendering of the inventory.
//! - [`template`]: configuration templates.
//! - [`config`]: layered settings.

pub mod backend;
pub mod cert;
pub mod config;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod listing;
pub mod pem_utils;
pub mod template;
