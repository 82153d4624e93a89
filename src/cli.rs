use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};

use vault_openvpn::config::Settings;

/// Manage OpenVPN configurations through the Vault PKI.
#[derive(Parser, Debug)]
#[command(name = "vault-openvpn", author, version, about)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Config file to read instead of the default locations
    #[arg(long, env = "VAULT_OPENVPN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Vault API address
    #[arg(long, env = "VAULT_ADDR", global = true)]
    pub vault_addr: Option<String>,

    /// Vault token (defaults to the content of ~/.vault-token)
    #[arg(long, env = "VAULT_TOKEN", global = true, hide_env_values = true)]
    pub vault_token: Option<String>,

    /// PEM file with the CA certificate of the Vault server
    #[arg(long, env = "VAULT_CACERT", global = true)]
    pub vault_cacert: Option<PathBuf>,

    /// Directory of PEM files with CA certificates of the Vault server
    #[arg(long, env = "VAULT_CAPATH", global = true)]
    pub vault_capath: Option<PathBuf>,

    /// Do not verify the certificate of the Vault server
    #[arg(
        long,
        env = "VAULT_SKIP_VERIFY",
        global = true,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub vault_skip_verify: Option<bool>,

    /// Mount point of the PKI secrets engine
    #[arg(long, env = "PKI_MOUNTPOINT", global = true)]
    pub pki_mountpoint: Option<String>,

    /// PKI role used to issue certificates
    #[arg(long, env = "PKI_ROLE", global = true)]
    pub pki_role: Option<String>,

    /// Log level (trace, debug, info, warning, error)
    #[arg(long, env = "LOG_LEVEL", global = true)]
    pub log_level: Option<String>,
}

/// Options of the `client` and `server` subcommands.
#[derive(Args, Debug, Default)]
pub struct IssueArgs {
    /// Revoke existing certificates for the FQDN before issuing a new one
    #[arg(
        long,
        env = "AUTO_REVOKE",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub auto_revoke: Option<bool>,

    /// Lifetime of the new certificate, e.g. 8760h, 1.5h or 90d (bare numbers are seconds)
    #[arg(long, env = "TTL")]
    pub ttl: Option<String>,

    /// Secret holding the OpenVPN TLS auth key in its 'key' entry
    #[arg(long, env = "OVPN_KEY")]
    pub ovpn_key: Option<String>,

    /// Directory holding client.conf and server.conf
    #[arg(long, env = "TEMPLATE_PATH")]
    pub template_path: Option<PathBuf>,
}

/// Options of the `list` subcommand.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Sort by fqdn, issuedate or expiredate
    #[arg(long, env = "SORT")]
    pub sort: Option<String>,

    /// Output as table or json
    #[arg(long, env = "FORMAT")]
    pub format: Option<String>,

    /// Include expired certificates
    #[arg(
        long,
        env = "LIST_EXPIRED",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub list_expired: Option<bool>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Issue a certificate and print a client configuration
    Client {
        /// Common name of the certificate
        fqdn: String,
        #[command(flatten)]
        issue: IssueArgs,
    },
    /// Issue a certificate and print a server configuration
    Server {
        /// Common name of the certificate
        fqdn: String,
        #[command(flatten)]
        issue: IssueArgs,
    },
    /// List valid certificates
    List(ListArgs),
    /// Revoke every valid certificate for an FQDN
    Revoke {
        /// Common name of the certificates
        fqdn: String,
    },
    /// Revoke a single certificate by serial
    RevokeSerial {
        /// Serial in colon-separated hex
        serial: String,
    },
    /// Print the version
    Version,
}

impl Cli {
    /// Settings given on the command line or through the environment.
    pub fn settings(&self) -> Settings {
        let global = &self.global;
        let mut settings = Settings {
            vault_addr: global.vault_addr.clone(),
            vault_token: global.vault_token.clone(),
            vault_cacert: global.vault_cacert.clone(),
            vault_capath: global.vault_capath.clone(),
            vault_skip_verify: global.vault_skip_verify,
            pki_mountpoint: global.pki_mountpoint.clone(),
            pki_role: global.pki_role.clone(),
            log_level: global.log_level.clone(),
            ..Settings::default()
        };

        match &self.command {
            Command::Client { issue, .. } | Command::Server { issue, .. } => {
                settings.auto_revoke = issue.auto_revoke;
                settings.ttl = issue.ttl.clone();
                settings.ovpn_key = issue.ovpn_key.clone();
                settings.template_path = issue.template_path.clone();
            }
            Command::List(list) => {
                settings.sort = list.sort.clone();
                settings.format = list.format.clone();
                settings.list_expired = list.list_expired;
            }
            Command::Revoke { .. } | Command::RevokeSerial { .. } | Command::Version => {}
        }

        settings
    }
}
