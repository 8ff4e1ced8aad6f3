pub mod logging;
pub mod token;
pub mod vault;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

use self::token::ARG_SIGNING_SECRET;
use self::vault::{ARG_VAULT_ROLE_ID, ARG_VAULT_SECRET_ID, ARG_VAULT_URL, ARG_VAULT_WRAPPED_TOKEN};

/// Check the combinations clap cannot express on its own.
///
/// Without Vault a signing secret is mandatory. With Vault the URL must be
/// HTTP(S) and `AppRole` credentials must be present.
///
/// # Errors
/// Returns an error string naming the missing or invalid argument.
pub fn validate(matches: &clap::ArgMatches) -> Result<(), String> {
    let Some(url) = matches.get_one::<String>(ARG_VAULT_URL) else {
        if matches.contains_id(ARG_SIGNING_SECRET) {
            return Ok(());
        }
        return Err(format!(
            "Missing required argument: --{ARG_SIGNING_SECRET} (required unless --{ARG_VAULT_URL} is set)"
        ));
    };

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(format!("Invalid --{ARG_VAULT_URL}: expected http(s) URL"));
    }
    if !matches.contains_id(ARG_VAULT_ROLE_ID) {
        return Err(format!("Missing required argument: --{ARG_VAULT_ROLE_ID}"));
    }
    if !matches.contains_id(ARG_VAULT_SECRET_ID) && !matches.contains_id(ARG_VAULT_WRAPPED_TOKEN) {
        return Err(format!(
            "Missing required argument: --{ARG_VAULT_SECRET_ID} or --{ARG_VAULT_WRAPPED_TOKEN}"
        ));
    }
    Ok(())
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("revolve")
        .about("Access token issuance and refresh token rotation")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("REVOLVE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .long_help(
                    "Database connection string. With --vault-url, username and password are replaced by Vault dynamic credentials.",
                )
                .env("REVOLVE_DSN")
                .required(true),
        );

    let command = token::with_args(command);
    let command = vault::with_args(command);
    logging::with_args(command)
}
