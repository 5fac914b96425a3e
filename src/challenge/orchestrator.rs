//! Define/Create/Verify state machine.
//!
//! States: `Start -> Challenge1Issued -> Challenge2Issued -> {Succeeded | Failed}`.
//! The current state is never stored; every call derives it from the history
//! the identity provider resubmits, so each call is a pure function of
//! (phase, history, input) apart from the success notification.

use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, info, warn};

use super::{
    catalog::{ChallengeCatalog, ChallengeKind, ChallengePayload, PrivateParameters},
    error::ChallengeError,
    notify::{self, LoginNotification, Notifier},
    session::{self, ChallengeRecord, SessionPhase, Verdict},
};

/// Answer to a Define call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DefineDecision {
    pub issue_tokens: bool,
    pub fail_authentication: bool,
}

impl DefineDecision {
    /// Keep the conversation going with the next custom challenge.
    pub const CONTINUE: Self = Self {
        issue_tokens: false,
        fail_authentication: false,
    };
    pub const ISSUE_TOKENS: Self = Self {
        issue_tokens: true,
        fail_authentication: false,
    };
    pub const FAIL: Self = Self {
        issue_tokens: false,
        fail_authentication: true,
    };
}

#[derive(Clone)]
pub struct Orchestrator {
    catalog: ChallengeCatalog,
    notifier: Arc<dyn Notifier>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(catalog: ChallengeCatalog, notifier: Arc<dyn Notifier>) -> Self {
        Self { catalog, notifier }
    }

    /// Decide whether to continue, issue tokens or fail.
    ///
    /// On success the login notification for `contact` is spawned on the
    /// current tokio runtime and not awaited. Without a runtime the
    /// notification is dropped and the decision stands.
    pub fn define(
        &self,
        user_id: &str,
        contact: &str,
        history: &[ChallengeRecord],
    ) -> DefineDecision {
        match session::assess(history) {
            Ok(SessionPhase::Awaiting(kind)) => {
                debug!(user_id, next = %kind, "challenge pending");
                DefineDecision::CONTINUE
            }
            Ok(SessionPhase::Evaluate(Verdict::Succeed)) => {
                info!(user_id, "all challenges passed");
                notify::dispatch(
                    self.notifier.clone(),
                    LoginNotification::new(user_id, contact),
                );
                DefineDecision::ISSUE_TOKENS
            }
            Ok(SessionPhase::Evaluate(Verdict::Fail)) => {
                info!(user_id, "challenge sequence failed");
                DefineDecision::FAIL
            }
            Err(err) => {
                warn!(user_id, "{err}");
                DefineDecision::FAIL
            }
        }
    }

    /// Issue the challenge for the next position, or `None` once every
    /// challenge has been issued.
    ///
    /// # Errors
    /// Propagates `LookupFailure` and `Store` from the catalog; both abort the attempt.
    pub async fn create(
        &self,
        user_id: &str,
        history: &[ChallengeRecord],
    ) -> Result<Option<ChallengePayload>, ChallengeError> {
        let Some(kind) = ChallengeKind::at(history.len()) else {
            debug!(user_id, entries = history.len(), "no challenge left to issue");
            return Ok(None);
        };

        let payload = self.catalog.issue(kind, user_id).await?;
        info!(user_id, challenge = %kind, "challenge issued");

        Ok(Some(payload))
    }

    /// Score `answer` against the private half of the in-flight challenge.
    #[must_use]
    pub fn verify(&self, private: &PrivateParameters, answer: &str) -> bool {
        let correct = self.catalog.score(private, answer);
        debug!(
            challenge = private.kind().map_or("untagged", ChallengeKind::metadata),
            correct, "answer scored"
        );
        correct
    }

    /// [`Orchestrator::verify`] over the provider's string map; malformed maps score `false`.
    #[must_use]
    pub fn verify_wire(&self, private: &BTreeMap<String, String>, answer: &str) -> bool {
        match PrivateParameters::from_wire(private) {
            Ok(private) => self.verify(&private, answer),
            Err(err) => {
                warn!("{err}");
                false
            }
        }
    }
}
