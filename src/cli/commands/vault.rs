use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_VAULT_URL: &str = "vault-url";
pub const ARG_VAULT_ROLE_ID: &str = "vault-role-id";
pub const ARG_VAULT_SECRET_ID: &str = "vault-secret-id";
pub const ARG_VAULT_WRAPPED_TOKEN: &str = "vault-wrapped-token";
pub const ARG_VAULT_KV_MOUNT: &str = "vault-kv-mount";
pub const ARG_VAULT_KV_PATH: &str = "vault-kv-path";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VAULT_URL)
                .long(ARG_VAULT_URL)
                .help("Vault AppRole login URL, e.g. https://vault.tld:8200/v1/auth/approle/login")
                .env("REVOLVE_VAULT_URL"),
        )
        .arg(
            Arg::new(ARG_VAULT_ROLE_ID)
                .long(ARG_VAULT_ROLE_ID)
                .help("Vault role id")
                .env("REVOLVE_VAULT_ROLE_ID")
                .requires(ARG_VAULT_URL),
        )
        .arg(
            Arg::new(ARG_VAULT_SECRET_ID)
                .long(ARG_VAULT_SECRET_ID)
                .help("Vault secret id")
                .env("REVOLVE_VAULT_SECRET_ID")
                .hide_env_values(true)
                .conflicts_with(ARG_VAULT_WRAPPED_TOKEN),
        )
        .arg(
            Arg::new(ARG_VAULT_WRAPPED_TOKEN)
                .long(ARG_VAULT_WRAPPED_TOKEN)
                .help("Vault wrapped token holding the secret id")
                .env("REVOLVE_VAULT_WRAPPED_TOKEN")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_VAULT_KV_MOUNT)
                .long(ARG_VAULT_KV_MOUNT)
                .help("Vault KV-v2 mount path for configuration secrets")
                .env("REVOLVE_VAULT_KV_MOUNT")
                .default_value("secret/revolve"),
        )
        .arg(
            Arg::new(ARG_VAULT_KV_PATH)
                .long(ARG_VAULT_KV_PATH)
                .help("Vault KV-v2 secret path for configuration secrets")
                .env("REVOLVE_VAULT_KV_PATH")
                .default_value("config"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub role_id: String,
    pub secret_id: Option<SecretString>,
    pub wrapped_token: Option<SecretString>,
    pub kv_mount: String,
    pub kv_path: String,
}

impl Options {
    /// `None` when Vault is not configured.
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Option<Self> {
        let url = matches.get_one::<String>(ARG_VAULT_URL)?.clone();
        let string = |id: &str| matches.get_one::<String>(id).cloned();
        let secret = |id: &str| string(id).map(SecretString::from);

        Some(Self {
            url,
            role_id: string(ARG_VAULT_ROLE_ID).unwrap_or_default(),
            secret_id: secret(ARG_VAULT_SECRET_ID),
            wrapped_token: secret(ARG_VAULT_WRAPPED_TOKEN),
            kv_mount: string(ARG_VAULT_KV_MOUNT).unwrap_or_else(|| "secret/revolve".to_string()),
            kv_path: string(ARG_VAULT_KV_PATH).unwrap_or_else(|| "config".to_string()),
        })
    }
}
