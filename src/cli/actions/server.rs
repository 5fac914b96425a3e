use anyhow::{anyhow, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};
use url::Url;

use crate::{
    challenge::{
        ChallengeCatalog, ChallengeConfig, LogNotifier, Notifier, Orchestrator,
        PgSecurityQuestionStore, SecurityQuestionStore, WebhookNotifier,
    },
    sfida,
};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub db_username: Option<String>,
    pub db_password: Option<SecretString>,
    pub notify_url: Option<Url>,
    pub cipher_words: Vec<String>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the DSN is invalid, the database is unreachable, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let dsn = database_url(&args)?;

    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(dsn.expose_secret())
        .await
        .context("Failed to connect to database")?;

    let store: Arc<dyn SecurityQuestionStore> = Arc::new(PgSecurityQuestionStore::new(pool));

    let config = ChallengeConfig::new().with_cipher_words(&args.cipher_words);
    debug!("Cipher words: {}", config.cipher_words().len());

    let notifier: Arc<dyn Notifier> = match args.notify_url {
        Some(url) => {
            info!("Login notifications sent to {}", url.host_str().unwrap_or("webhook"));
            Arc::new(WebhookNotifier::new(url)?)
        }
        None => Arc::new(LogNotifier),
    };

    let catalog = ChallengeCatalog::new(store.clone(), &config);
    let orchestrator = Arc::new(Orchestrator::new(catalog, notifier));

    sfida::new(args.port, orchestrator, store).await
}

/// Apply the optional username and password overrides to the DSN.
fn database_url(args: &Args) -> Result<SecretString> {
    let mut dsn = Url::parse(&args.dsn).context("Invalid DSN")?;

    if let Some(username) = &args.db_username {
        dsn.set_username(username)
            .map_err(|()| anyhow!("Error setting username"))?;
    }

    if let Some(password) = &args.db_password {
        dsn.set_password(Some(password.expose_secret()))
            .map_err(|()| anyhow!("Error setting password"))?;
    }

    Ok(SecretString::from(dsn.to_string()))
}
