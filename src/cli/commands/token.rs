use crate::{rotation::DEFAULT_DIRECTORY_TIMEOUT_SECONDS, token::DEFAULT_ACCESS_TOKEN_TTL_SECONDS};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SIGNING_SECRET: &str = "signing-secret";
pub const ARG_ACCESS_TOKEN_TTL_SECONDS: &str = "access-token-ttl-seconds";
pub const ARG_DIRECTORY_TIMEOUT_SECONDS: &str = "directory-timeout-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SIGNING_SECRET)
                .long(ARG_SIGNING_SECRET)
                .help("Secret used to sign access tokens (HS256)")
                .long_help(
                    "Secret used to sign access tokens (HS256). Not needed when --vault-url is set; the secret is then read from the `signing_secret` field of the Vault KV secret.",
                )
                .env("REVOLVE_SIGNING_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_TTL_SECONDS)
                .long(ARG_ACCESS_TOKEN_TTL_SECONDS)
                .help("Access token validity window in seconds")
                .env("REVOLVE_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("600")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_DIRECTORY_TIMEOUT_SECONDS)
                .long(ARG_DIRECTORY_TIMEOUT_SECONDS)
                .help("Upper bound for every user directory call, in seconds")
                .env("REVOLVE_DIRECTORY_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub signing_secret: Option<SecretString>,
    pub access_token_ttl_seconds: u64,
    pub directory_timeout_seconds: u64,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            signing_secret: matches
                .get_one::<String>(ARG_SIGNING_SECRET)
                .filter(|secret| !secret.is_empty())
                .map(|secret| SecretString::from(secret.clone())),
            access_token_ttl_seconds: matches
                .get_one::<u64>(ARG_ACCESS_TOKEN_TTL_SECONDS)
                .copied()
                .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_SECONDS),
            directory_timeout_seconds: matches
                .get_one::<u64>(ARG_DIRECTORY_TIMEOUT_SECONDS)
                .copied()
                .unwrap_or(DEFAULT_DIRECTORY_TIMEOUT_SECONDS),
        }
    }
}
