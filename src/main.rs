mod cli;

use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use vault_openvpn::backend::VaultClient;
use vault_openvpn::config::{Config, Settings};
use vault_openvpn::lifecycle::Lifecycle;
use vault_openvpn::template::ConfigKind;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Command::Version = cli.command {
        println!("vault-openvpn {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let (file_settings, config_file) = Settings::load_file(cli.global.config.as_deref())?;
    let settings = cli
        .settings()
        .or(file_settings)
        .or(Settings::from_token_file());
    let config = Config::from_settings(settings)?;

    init_tracing(config.log_level);
    if let Some(path) = &config_file {
        debug!(path = %path.display(), "Using config file");
    }

    let client = VaultClient::from_config(&config)?;
    let lifecycle = Lifecycle::new(&client, &config);

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Command::Client { fqdn, .. } => {
            lifecycle.issue_config(ConfigKind::Client, fqdn, &mut stdout)?
        }
        Command::Server { fqdn, .. } => {
            lifecycle.issue_config(ConfigKind::Server, fqdn, &mut stdout)?
        }
        Command::List(_) => lifecycle.list(&mut stdout)?,
        Command::Revoke { fqdn } => {
            lifecycle.revoke_by_name(fqdn)?;
        }
        Command::RevokeSerial { serial } => {
            lifecycle.revoke_by_serial(serial)?;
        }
        Command::Version => {}
    }
    stdout.flush()?;

    Ok(())
}

/// Logs go to stderr so stdout only carries configurations and listings.
fn init_tracing(level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
