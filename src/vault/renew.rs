use crate::{cli::globals::GlobalArgs, vault};
use anyhow::{Result, anyhow};
use rand::{Rng, SeedableRng, rngs::StdRng};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use std::future::Future;
use tokio::{
    sync::mpsc,
    time::{Duration, sleep},
};
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};

const MAX_ATTEMPTS: u32 = 3;

// Floor between renewal rounds; Vault reports 0 for non-expiring tokens.
const MIN_RENEW_INTERVAL_SECONDS: u64 = 5;

/// Time to wait before the next renewal: `factor` percent of the lease, never
/// less than [`MIN_RENEW_INTERVAL_SECONDS`].
fn next_renew_interval(lease_duration: u64, factor: u64) -> Duration {
    Duration::from_secs(
        (lease_duration.saturating_mul(factor) / 100).max(MIN_RENEW_INTERVAL_SECONDS),
    )
}

/// Renew the Vault token, returning the new lease duration in seconds.
#[instrument(skip(token))]
async fn renew_token(url: &str, token: &SecretString, increment: Option<u64>) -> Result<u64> {
    let renew_url = vault::endpoint_url(url, "/v1/auth/token/renew-self")?;

    let span = info_span!("vault.renew_token", http.method = "POST", url = %renew_url);
    let response = vault::client()?
        .post(&renew_url)
        .json(&json!({ "increment": increment.unwrap_or(0) }))
        .header("X-Vault-Token", token.expose_secret())
        .send()
        .instrument(span)
        .await?;

    vault::json_body(&renew_url, response)
        .await?
        .get("auth")
        .and_then(|v| v.get("lease_duration"))
        .and_then(Value::as_u64)
        .ok_or_else(|| anyhow!("Error parsing JSON response: no lease_duration found"))
}

/// Renew the database credentials lease, returning the new lease duration.
#[instrument(skip(token))]
async fn renew_db_token(
    url: &str,
    token: &SecretString,
    lease_id: &str,
    increment: u64,
) -> Result<u64> {
    let renew_url = vault::endpoint_url(url, "/v1/sys/leases/renew")?;

    let span = info_span!("vault.renew_db_token", http.method = "POST", url = %renew_url);
    let response = vault::client()?
        .post(&renew_url)
        .json(&json!({ "increment": increment, "lease_id": lease_id }))
        .header("X-Vault-Token", token.expose_secret())
        .send()
        .instrument(span)
        .await?;

    vault::json_body(&renew_url, response)
        .await?
        .get("lease_duration")
        .and_then(Value::as_u64)
        .ok_or_else(|| anyhow!("Error parsing JSON response: no lease_duration found"))
}

/// Run `renew` forever, sleeping 70-90% of each returned lease (at least
/// [`MIN_RENEW_INTERVAL_SECONDS`]) between rounds. Three consecutive failures within a round send on `tx` and stop.
fn spawn_renewal<F, Fut>(what: &'static str, tx: mpsc::UnboundedSender<()>, renew: F)
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<u64>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut rng = StdRng::from_entropy();

        loop {
            let mut next_renew = Duration::default();

            for attempt in 1..=MAX_ATTEMPTS {
                if attempt > 1 {
                    let backoff_time = 2u64.pow(attempt - 1);
                    warn!("Backing off for {} seconds", backoff_time);
                    sleep(Duration::from_secs(backoff_time)).await;
                }

                match renew().await {
                    Ok(lease_duration) => {
                        let factor = rng.gen_range(70..90);
                        next_renew = next_renew_interval(lease_duration, factor);
                        info!(
                            lease_duration,
                            next_renew_seconds = next_renew.as_secs(),
                            "Vault {what} renewed"
                        );
                        break;
                    }

                    Err(e) => {
                        error!("Failed to renew {what}: {e}");

                        if attempt == MAX_ATTEMPTS {
                            error!("Failed to renew {what} after {MAX_ATTEMPTS} attempts");
                            let _ = tx.send(());
                            return;
                        }
                    }
                }
            }

            debug!("Will renew {what} in {} seconds", next_renew.as_secs());

            sleep(next_renew).await;
        }
    });
}

/// Keep the Vault token and the database lease alive. Sends on `tx` when
/// either can no longer be renewed so the server can shut down.
#[instrument(skip(globals, tx))]
pub async fn try_renew(globals: &GlobalArgs, tx: mpsc::UnboundedSender<()>) -> Result<()> {
    let url = globals.vault_url.clone();
    let token = globals.vault_token.clone();
    spawn_renewal("token", tx.clone(), move || {
        let url = url.clone();
        let token = token.clone();
        async move { renew_token(&url, &token, None).await }
    });

    let url = globals.vault_url.clone();
    let token = globals.vault_token.clone();
    let lease_id = globals.vault_db_lease_id.clone();
    let lease_duration = globals.vault_db_lease_duration;
    spawn_renewal("DB lease", tx, move || {
        let url = url.clone();
        let token = token.clone();
        let lease_id = lease_id.clone();
        async move { renew_db_token(&url, &token, &lease_id, lease_duration).await }
    });

    Ok(())
}
