//! Custom challenge sequence driven by an external identity provider.
//!
//! Flow Overview:
//! 1) Define: the provider sends the session history; the orchestrator answers
//!    continue, issue tokens, or fail.
//! 2) Create: the orchestrator issues the challenge for the next position
//!    (security question first, cipher puzzle second).
//! 3) Verify: the provider returns the private parameters with the user's
//!    answer; the orchestrator scores it and the result lands in the history.
//!
//! Security boundaries:
//! - Private parameters (answers) never appear in public parameters or logs.
//! - A missing security question aborts the attempt; nothing is defaulted.
//! - Malformed histories fail the attempt instead of erroring, so callers
//!   learn nothing about internal state.

pub mod catalog;
pub mod cipher;
pub mod config;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod session;
pub mod store;

pub use catalog::{ChallengeCatalog, ChallengeKind, ChallengePayload, PrivateParameters};
pub use config::ChallengeConfig;
pub use error::ChallengeError;
pub use notify::{LogNotifier, LoginNotification, Notifier, WebhookNotifier};
pub use orchestrator::{DefineDecision, Orchestrator};
pub use session::{ChallengeRecord, SessionPhase, Verdict, CUSTOM_CHALLENGE};
pub use store::{
    MemorySecurityQuestionStore, PgSecurityQuestionStore, SecurityQuestion, SecurityQuestionStore,
};
