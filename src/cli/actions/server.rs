use crate::{
    api,
    cli::{commands::vault::Options as VaultOptions, telemetry},
    token::TokenMinter,
    vault,
};
use anyhow::{Context, Result, anyhow};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub signing_secret: Option<SecretString>,
    pub access_token_ttl_seconds: u64,
    pub directory_timeout_seconds: u64,
    pub vault: Option<VaultOptions>,
}

/// Resolved startup material: the DSN to connect with and the signing secret.
struct Bootstrap {
    dsn: String,
    signing_secret: SecretString,
}

/// Log in to Vault, swap in dynamic DB credentials, resolve the signing secret
/// and start the renewal tasks.
async fn bootstrap_vault(
    opts: &VaultOptions,
    dsn: &str,
    signing_secret: Option<SecretString>,
    tx: mpsc::UnboundedSender<()>,
) -> Result<Bootstrap> {
    let mut globals = vault::login(
        &opts.url,
        &opts.role_id,
        opts.secret_id.as_ref().map(|s| s.expose_secret()),
        opts.wrapped_token.as_ref().map(|s| s.expose_secret()),
    )
    .await
    .context("Vault login failed")?;

    vault::database::database_creds(&mut globals)
        .await
        .context("Could not get database username and password")?;

    debug!("Global args: {:?}", globals);

    let dsn = vault::database::inject_credentials(dsn, &globals)?;

    let signing_secret = match signing_secret {
        Some(secret) => secret,
        None => vault::kv::read_signing_secret(&globals, &opts.kv_mount, &opts.kv_path)
            .await
            .context("Failed to load signing secret from Vault")?,
    };

    vault::renew::try_renew(&globals, tx).await?;

    Ok(Bootstrap {
        dsn,
        signing_secret,
    })
}

/// Execute the server action.
/// # Errors
/// Returns an error if Vault bootstrap fails, no signing secret is available,
/// or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    // Renewal tasks signal on `tx` when Vault can no longer be kept alive.
    // Holding `tx` here keeps the channel open when Vault is not used.
    let (tx, rx) = mpsc::unbounded_channel();

    let bootstrap = match &args.vault {
        Some(opts) => bootstrap_vault(opts, &args.dsn, args.signing_secret, tx.clone()).await?,
        None => Bootstrap {
            dsn: args.dsn,
            signing_secret: args
                .signing_secret
                .ok_or_else(|| anyhow!("A signing secret is required when Vault is not used"))?,
        },
    };

    let minter = TokenMinter::new(
        bootstrap.signing_secret,
        Duration::from_secs(args.access_token_ttl_seconds),
    );

    info!(
        access_token_ttl_seconds = minter.access_token_ttl_seconds(),
        directory_timeout_seconds = args.directory_timeout_seconds,
        vault = args.vault.is_some(),
        "Starting revolve"
    );

    let result = api::new(
        args.port,
        bootstrap.dsn,
        minter,
        Duration::from_secs(args.directory_timeout_seconds),
        rx,
    )
    .await;

    drop(tx);
    telemetry::shutdown_tracer();

    result
}
