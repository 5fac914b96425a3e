use crate::cli::{
    actions::{server::Args, Action},
    commands::{self, challenge},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use url::Url;

/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(commands::ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;

    let db_username = matches.get_one::<String>(commands::ARG_DB_USERNAME).cloned();
    let db_password = matches
        .get_one::<String>(commands::ARG_DB_PASSWORD)
        .map(|password| SecretString::from(password.as_str()));

    let notify_url = matches.get_one::<Url>(challenge::ARG_NOTIFY_URL).cloned();
    let cipher_words = matches
        .get_one::<String>(challenge::ARG_CIPHER_WORDS)
        .map(String::as_str)
        .map(challenge::split_words)
        .unwrap_or_default();

    Ok(Action::Server(Args {
        port,
        dsn,
        db_username,
        db_password,
        notify_url,
        cipher_words,
    }))
}
