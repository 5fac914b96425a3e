//! # Sfida (Custom Authentication Challenges)
//!
//! `sfida` answers the custom-challenge triggers of a managed identity
//! provider. Instead of a password check, a login is an ordered sequence of
//! challenges: a stored security question, then a shift-cipher puzzle.
//!
//! ## Protocol
//!
//! The provider calls the service three times per turn:
//!
//! - **Define** decides from the session history whether to pose another
//!   challenge, issue tokens, or fail the login.
//! - **Create** materializes the next challenge. The public half goes to the
//!   user; the private half (the answer) stays with the provider.
//! - **Verify** scores the user's answer against the private half.
//!
//! The provider owns the session history. The service keeps no per-session
//! state, so any instance can answer any call.
//!
//! ## Storage & Notifications
//!
//! Security questions live in `PostgreSQL` (`security_questions`). A successful
//! login fires a one-way notification (log or webhook) that never affects the
//! outcome of the login.

pub mod challenge;
pub mod cli;
pub mod sfida;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
