//! Map parsed command-line arguments to an [`Action`].

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, http, ARG_DB_PASSWORD, ARG_DSN, ARG_PORT};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;
    let db_password = matches
        .get_one::<String>(ARG_DB_PASSWORD)
        .cloned()
        .map(SecretString::from);

    let auth_opts = auth::Options::parse(matches)?;
    let http_opts = http::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        db_password,
        token_expiration_seconds: auth_opts.token_expiration_seconds,
        bcrypt_cost: auth_opts.bcrypt_cost,
        cors_origins: http_opts.cors_origins,
        body_limit_bytes: http_opts.body_limit_bytes,
        secure_cookies: http_opts.secure_cookies,
    }))
}
