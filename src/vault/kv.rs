use crate::{cli::globals::GlobalArgs, vault};
use anyhow::{Context, Result, anyhow};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{Instrument, info_span, instrument};

pub const SIGNING_SECRET_FIELD: &str = "signing_secret";

/// Read the access-token signing secret from a KV v2 secret.
///
/// # Errors
/// Returns an error if the Vault request fails or the field is missing or empty.
#[instrument(skip(globals))]
pub async fn read_signing_secret(
    globals: &GlobalArgs,
    kv_mount: &str,
    kv_path: &str,
) -> Result<SecretString> {
    let path = format!(
        "/v1/{}/data/{}",
        kv_mount.trim_matches('/'),
        kv_path.trim_matches('/')
    );
    let url = vault::endpoint_url(&globals.vault_url, &path)?;

    let span = info_span!("vault.kv.read", http.method = "GET", url = %url);
    let response = vault::client()?
        .get(&url)
        .header("X-Vault-Token", globals.vault_token.expose_secret())
        .send()
        .instrument(span)
        .await?;

    let json = vault::json_body(&url, response).await?;
    let secret = json
        .get("data")
        .and_then(|data| data.get("data"))
        .and_then(|data| data.get(SIGNING_SECRET_FIELD))
        .and_then(Value::as_str)
        .context("signing secret missing from vault response")?;

    if secret.is_empty() {
        return Err(anyhow!("signing secret in vault is empty"));
    }

    Ok(SecretString::from(secret.to_string()))
}
