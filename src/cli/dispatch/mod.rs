//! Map validated command-line arguments to an [`Action`].

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{token, vault};
use anyhow::{Context, Result, anyhow};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    crate::cli::commands::validate(matches).map_err(|e| anyhow!(e))?;

    let token_opts = token::Options::parse(matches);

    Ok(Action::Server(Args {
        port,
        dsn,
        signing_secret: token_opts.signing_secret,
        access_token_ttl_seconds: token_opts.access_token_ttl_seconds,
        directory_timeout_seconds: token_opts.directory_timeout_seconds,
        vault: vault::Options::parse(matches),
    }))
}
