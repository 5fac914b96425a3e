//! One-way notification fired after a successful login.
//!
//! Delivery runs on its own task. A failed delivery is logged and never
//! reaches the authentication decision that triggered it.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{future::Future, pin::Pin, sync::Arc};
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{error, info, info_span, Instrument};
use url::Url;

use super::error::ChallengeError;
use crate::APP_USER_AGENT;

pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

const LOGIN_SUBJECT: &str = "Login Notification";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginNotification {
    pub user_id: String,
    pub contact: String,
    pub subject: String,
    pub message: String,
}

impl LoginNotification {
    #[must_use]
    pub fn new(user_id: &str, contact: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            contact: contact.to_string(),
            subject: LOGIN_SUBJECT.to_string(),
            message: format!("Hello {contact}, your login was successful!"),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify<'a>(&'a self, notification: &'a LoginNotification) -> NotifyFuture<'a>;
}

/// Local dev notifier that logs instead of delivering.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify<'a>(&'a self, notification: &'a LoginNotification) -> NotifyFuture<'a> {
        Box::pin(async move {
            info!(
                user_id = %notification.user_id,
                contact = %notification.contact,
                subject = %notification.subject,
                "login notification stub"
            );
            Ok(())
        })
    }
}

/// Posts the notification as JSON to a downstream delivery service.
#[derive(Clone, Debug)]
pub struct WebhookNotifier {
    client: Client,
    url: Url,
}

impl WebhookNotifier {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: Url) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .context("Failed to build notifier HTTP client")?;

        Ok(Self { client, url })
    }
}

impl Notifier for WebhookNotifier {
    fn notify<'a>(&'a self, notification: &'a LoginNotification) -> NotifyFuture<'a> {
        Box::pin(async move {
            self.client
                .post(self.url.clone())
                .json(notification)
                .send()
                .await
                .context("notification request failed")?
                .error_for_status()
                .context("notification endpoint rejected the request")?;
            Ok(())
        })
    }
}

/// Deliver `notification` in the background.
///
/// Returns `None` without delivering when called outside a tokio runtime.
pub fn dispatch(
    notifier: Arc<dyn Notifier>,
    notification: LoginNotification,
) -> Option<JoinHandle<()>> {
    let handle = match Handle::try_current() {
        Ok(handle) => handle,
        Err(err) => {
            let err = ChallengeError::NotifierFailure(format!("no runtime to deliver on: {err}"));
            error!(user_id = %notification.user_id, "{err}");
            return None;
        }
    };

    let span = info_span!("notify.login", user_id = %notification.user_id);
    Some(
        handle.spawn(
            async move {
                if let Err(err) = notifier.notify(&notification).await {
                    let err = ChallengeError::NotifierFailure(format!("{err:#}"));
                    error!("{err}");
                }
            }
            .instrument(span),
        ),
    )
}
