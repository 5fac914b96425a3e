//! Session history shape and the phase it implies.
//!
//! The identity provider owns the history and resubmits it on every call.
//! Position is derived from its length alone; no counter is kept here.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{catalog::ChallengeKind, error::ChallengeError};

/// Challenge name the identity provider uses for custom challenges.
pub const CUSTOM_CHALLENGE: &str = "CUSTOM_CHALLENGE";

fn custom_challenge() -> String {
    CUSTOM_CHALLENGE.to_string()
}

/// One round of challenge/response as reported by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRecord {
    #[serde(default = "custom_challenge")]
    pub challenge_name: String,
    #[serde(default)]
    pub challenge_result: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_metadata: Option<String>,
}

impl ChallengeRecord {
    /// Verified record for `kind`.
    #[must_use]
    pub fn new(kind: ChallengeKind, result: bool) -> Self {
        Self {
            challenge_name: custom_challenge(),
            challenge_result: Some(result),
            challenge_metadata: Some(kind.metadata().to_string()),
        }
    }

    fn passed(&self) -> bool {
        self.challenge_result == Some(true)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verdict {
    Succeed,
    Fail,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionPhase {
    /// The challenge of this kind is the next one to pose.
    Awaiting(ChallengeKind),
    /// Every challenge has been posed and verified.
    Evaluate(Verdict),
}

/// Map a session history to its phase.
///
/// # Errors
/// Returns `ProtocolViolation` for histories longer than the challenge
/// sequence, entries that are not custom challenges, or entries whose
/// metadata names a different kind than the one issued at that position.
pub fn assess(history: &[ChallengeRecord]) -> Result<SessionPhase, ChallengeError> {
    let expected = ChallengeKind::ORDER.len();
    if history.len() > expected {
        return Err(ChallengeError::ProtocolViolation(format!(
            "session holds {} entries, at most {expected} challenges are defined",
            history.len()
        )));
    }

    for (position, record) in history.iter().enumerate() {
        check_record(position, record)?;
    }

    if let Some(kind) = ChallengeKind::at(history.len()) {
        return Ok(SessionPhase::Awaiting(kind));
    }

    let verdict = if history.iter().all(ChallengeRecord::passed) {
        Verdict::Succeed
    } else {
        Verdict::Fail
    };

    Ok(SessionPhase::Evaluate(verdict))
}

fn check_record(position: usize, record: &ChallengeRecord) -> Result<(), ChallengeError> {
    if record.challenge_name != CUSTOM_CHALLENGE {
        return Err(ChallengeError::ProtocolViolation(format!(
            "entry {position} is a {} challenge",
            record.challenge_name
        )));
    }

    // Entries without metadata are attributed to the kind issued at their position.
    let (Some(metadata), Some(kind)) = (&record.challenge_metadata, ChallengeKind::at(position))
    else {
        return Ok(());
    };

    if ChallengeKind::from_metadata(metadata) == Some(kind) {
        Ok(())
    } else {
        Err(ChallengeError::ProtocolViolation(format!(
            "entry {position} is tagged {metadata:?}, expected {kind}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn qna(result: bool) -> ChallengeRecord {
        ChallengeRecord::new(ChallengeKind::SecurityQa, result)
    }

    fn cipher(result: bool) -> ChallengeRecord {
        ChallengeRecord::new(ChallengeKind::Cipher, result)
    }

    #[test]
    fn empty_history_awaits_security_question() -> Result<()> {
        assert_eq!(
            assess(&[])?,
            SessionPhase::Awaiting(ChallengeKind::SecurityQa)
        );
        Ok(())
    }

    #[test]
    fn one_entry_awaits_cipher_regardless_of_result() -> Result<()> {
        assert_eq!(
            assess(&[qna(true)])?,
            SessionPhase::Awaiting(ChallengeKind::Cipher)
        );
        assert_eq!(
            assess(&[qna(false)])?,
            SessionPhase::Awaiting(ChallengeKind::Cipher)
        );
        Ok(())
    }

    #[test]
    fn two_passed_entries_succeed() -> Result<()> {
        assert_eq!(
            assess(&[qna(true), cipher(true)])?,
            SessionPhase::Evaluate(Verdict::Succeed)
        );
        Ok(())
    }

    #[test]
    fn any_failed_or_missing_result_fails() -> Result<()> {
        assert_eq!(
            assess(&[qna(true), cipher(false)])?,
            SessionPhase::Evaluate(Verdict::Fail)
        );
        assert_eq!(
            assess(&[qna(false), cipher(true)])?,
            SessionPhase::Evaluate(Verdict::Fail)
        );

        let mut unverified = cipher(true);
        unverified.challenge_result = None;
        assert_eq!(
            assess(&[qna(true), unverified])?,
            SessionPhase::Evaluate(Verdict::Fail)
        );
        Ok(())
    }

    #[test]
    fn overlong_history_is_a_protocol_violation() {
        let result = assess(&[qna(true), cipher(true), cipher(true)]);
        assert!(matches!(result, Err(ChallengeError::ProtocolViolation(_))));
    }

    #[test]
    fn swapped_metadata_is_a_protocol_violation() {
        let result = assess(&[cipher(true), qna(true)]);
        assert!(matches!(result, Err(ChallengeError::ProtocolViolation(_))));
    }

    #[test]
    fn non_custom_entry_is_a_protocol_violation() {
        let mut record = qna(true);
        record.challenge_name = "SRP_A".to_string();
        assert!(matches!(
            assess(&[record]),
            Err(ChallengeError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn untagged_entries_take_their_positional_kind() -> Result<()> {
        let records: Vec<ChallengeRecord> =
            serde_json::from_str(r#"[{"challengeResult":true},{"challengeResult":true}]"#)?;
        assert_eq!(records[0].challenge_name, CUSTOM_CHALLENGE);
        assert_eq!(assess(&records)?, SessionPhase::Evaluate(Verdict::Succeed));
        Ok(())
    }

    #[test]
    fn provider_session_entry_deserializes() -> Result<()> {
        let record: ChallengeRecord = serde_json::from_str(
            r#"{"challengeName":"CUSTOM_CHALLENGE","challengeResult":false,"challengeMetadata":"QNA_CHALLENGE"}"#,
        )?;
        assert_eq!(record, qna(false));
        Ok(())
    }
}
