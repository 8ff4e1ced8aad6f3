//! Optional HashiCorp Vault integration.
//!
//! When `--vault-url` is set, revolve logs in with `AppRole`, pulls dynamic
//! database credentials and the access-token signing secret, and keeps both the
//! Vault token and the database lease alive in the background.

pub mod database;
pub mod kv;
pub mod renew;

use crate::{APP_USER_AGENT, cli::globals::GlobalArgs};
use anyhow::{Result, anyhow};
use reqwest::{Client, Response};
use secrecy::SecretString;
use serde_json::{Value, json};
use tracing::{Instrument, debug, info_span, instrument};
use url::Url;

fn vault_error_message(json_response: &Value) -> &str {
    json_response
        .get("errors")
        .and_then(|v| v.get(0))
        .and_then(Value::as_str)
        .unwrap_or("")
}

pub(crate) fn client() -> Result<Client> {
    Ok(Client::builder().user_agent(APP_USER_AGENT).build()?)
}

/// Turn a Vault response into its JSON body, or into an error carrying the
/// first message from Vault's `errors` array.
pub(crate) async fn json_body(url: &str, response: Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let json_response: Value = response.json().await.unwrap_or(Value::Null);
        return Err(anyhow!(
            "{} - {}, {}",
            url,
            status,
            vault_error_message(&json_response)
        ));
    }

    Ok(response.json().await?)
}

/// Build `scheme://host:port{path}` from the configured Vault URL, which is
/// usually the full `AppRole` login URL.
///
/// # Errors
/// Returns an error if `url` cannot be parsed, has no host, or uses an unsupported scheme.
#[instrument]
pub fn endpoint_url(url: &str, path: &str) -> Result<String> {
    let url = Url::parse(url)?;

    let scheme = url.scheme();
    let host = url
        .host()
        .ok_or_else(|| anyhow!("Error parsing URL: no host specified"))?
        .to_owned();

    let port = match (url.port(), scheme) {
        (Some(port), _) => port,
        (None, "http") => 80,
        (None, "https") => 443,
        (None, _) => return Err(anyhow!("Error parsing URL: unsupported scheme {scheme}")),
    };

    let endpoint_url = format!("{scheme}://{host}:{port}{path}");

    debug!("endpoint URL: {}", endpoint_url);

    Ok(endpoint_url)
}

/// Unwrap a response-wrapped `AppRole` secret id.
///
/// Create one with:
/// vault write -wrap-ttl=300s -f auth/approle/role/revolve/secret-id
///
/// # Errors
/// Returns an error if the request fails or the response has no `secret_id`.
#[instrument(skip(token))]
pub async fn unwrap(url: &str, token: &str) -> Result<String> {
    let unwrap_url = endpoint_url(url, "/v1/sys/wrapping/unwrap")?;

    let span = info_span!("vault.unwrap", http.method = "POST", url = %unwrap_url);
    let response = client()?
        .post(&unwrap_url)
        .header("X-Vault-Token", token)
        .send()
        .instrument(span)
        .await?;

    let json_response = json_body(&unwrap_url, response).await?;
    let sid = json_response
        .get("data")
        .and_then(|v| v.get("secret_id"))
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Error parsing JSON response: no secret_id found"))?;

    Ok(sid.to_string())
}

/// Log in with `AppRole`, returning the client token and its lease duration.
///
/// # Errors
/// Returns an error if the request fails or the response has no `client_token`.
#[instrument(skip(sid))]
pub async fn approle_login(url: &str, sid: &str, rid: &str) -> Result<(SecretString, u64)> {
    let login_payload = json!({
        "role_id": rid,
        "secret_id": sid
    });

    let span = info_span!("vault.approle_login", http.method = "POST", url = %url);
    let response = client()?
        .post(url)
        .json(&login_payload)
        .send()
        .instrument(span)
        .await?;

    let json_response = json_body(url, response).await?;
    let auth = json_response.get("auth");
    let token = auth
        .and_then(|v| v.get("client_token"))
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Error parsing JSON response: no client_token found"))?;
    let lease_duration = auth
        .and_then(|v| v.get("lease_duration"))
        .and_then(Value::as_u64)
        .unwrap_or(1800);

    Ok((SecretString::from(token.to_string()), lease_duration))
}

/// Log in with either a plain secret id or a wrapped one and return the
/// populated [`GlobalArgs`].
///
/// # Errors
/// Returns an error if neither credential is given or Vault rejects the login.
pub async fn login(
    url: &str,
    role_id: &str,
    secret_id: Option<&str>,
    wrapped_token: Option<&str>,
) -> Result<GlobalArgs> {
    let secret_id = match (wrapped_token, secret_id) {
        (Some(wrapped), _) => unwrap(url, wrapped).await?,
        (None, Some(secret_id)) => secret_id.to_string(),
        (None, None) => return Err(anyhow!("Vault secret-id or wrapped token is required")),
    };

    let (token, lease_duration) = approle_login(url, &secret_id, role_id).await?;
    debug!(lease_duration, "Vault login succeeded");

    let mut globals = GlobalArgs::new(url.to_string());
    globals.set_token(token);
    Ok(globals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn endpoint_url_defaults_port_from_scheme() -> Result<()> {
        assert_eq!(
            endpoint_url("https://vault.tld/v1/auth/approle/login", "/v1/sys/health")?,
            "https://vault.tld:443/v1/sys/health"
        );
        assert_eq!(
            endpoint_url("http://vault.tld/v1/auth/approle/login", "/v1/sys/health")?,
            "http://vault.tld:80/v1/sys/health"
        );
        assert_eq!(
            endpoint_url("http://127.0.0.1:8200/v1/auth/approle/login", "/x")?,
            "http://127.0.0.1:8200/x"
        );
        Ok(())
    }

    #[test]
    fn endpoint_url_rejects_unknown_scheme() {
        assert!(endpoint_url("ftp://vault.tld/login", "/x").is_err());
        assert!(endpoint_url("not a url", "/x").is_err());
    }

    #[tokio::test]
    async fn approle_login_returns_token() -> Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/auth/approle/login"))
            .and(body_json(json!({ "role_id": "role", "secret_id": "secret" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "auth": { "client_token": "s.token", "lease_duration": 60 }
            })))
            .mount(&server)
            .await;

        let url = format!("{}/v1/auth/approle/login", server.uri());
        let (token, lease_duration) = approle_login(&url, "secret", "role").await?;
        assert_eq!(token.expose_secret(), "s.token");
        assert_eq!(lease_duration, 60);
        Ok(())
    }

    #[tokio::test]
    async fn approle_login_surfaces_vault_errors() -> Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/auth/approle/login"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errors": ["invalid role or secret ID"]
            })))
            .mount(&server)
            .await;

        let url = format!("{}/v1/auth/approle/login", server.uri());
        let result = approle_login(&url, "secret", "role").await;
        assert!(result.is_err());
        if let Err(err) = result {
            assert!(err.to_string().contains("invalid role or secret ID"));
        }
        Ok(())
    }

    #[tokio::test]
    async fn login_unwraps_wrapped_secret_id() -> Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/sys/wrapping/unwrap"))
            .and(header("X-Vault-Token", "wrapped"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "secret_id": "unwrapped-secret" }
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/auth/approle/login"))
            .and(body_json(
                json!({ "role_id": "role", "secret_id": "unwrapped-secret" }),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "auth": { "client_token": "s.token", "lease_duration": 60 }
            })))
            .mount(&server)
            .await;

        let url = format!("{}/v1/auth/approle/login", server.uri());
        let globals = login(&url, "role", None, Some("wrapped")).await?;
        assert_eq!(globals.vault_url, url);
        assert_eq!(globals.vault_token.expose_secret(), "s.token");
        Ok(())
    }

    #[tokio::test]
    async fn login_requires_a_credential() {
        let result = login("http://127.0.0.1:1/v1/auth/approle/login", "role", None, None).await;
        assert!(result.is_err());
    }
}
