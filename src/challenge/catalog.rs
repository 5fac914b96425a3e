//! Challenge kinds and how each one is issued and scored.
//!
//! Every kind produces a public/private parameter pair. The public half is
//! shown to the person signing in; the private half stays with the identity
//! provider and comes back only when the answer is verified.

use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tracing::debug;

use super::{
    cipher::{self, SHIFT},
    config::ChallengeConfig,
    error::ChallengeError,
    store::SecurityQuestionStore,
};

pub const PARAM_QUESTION: &str = "question";
pub const PARAM_CIPHER_TEXT: &str = "cipherText";
pub const PARAM_ANSWER: &str = "answer";
pub const PARAM_CHALLENGE: &str = "challenge";

/// Closed set of challenges, in the order they are posed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChallengeKind {
    SecurityQa,
    Cipher,
}

impl ChallengeKind {
    pub const ORDER: [Self; 2] = [Self::SecurityQa, Self::Cipher];

    /// Kind issued at `position` in the session history.
    #[must_use]
    pub fn at(position: usize) -> Option<Self> {
        Self::ORDER.get(position).copied()
    }

    /// Tag attached to the provider session entry for this kind.
    #[must_use]
    pub const fn metadata(self) -> &'static str {
        match self {
            Self::SecurityQa => "QNA_CHALLENGE",
            Self::Cipher => "CIPHER_CHALLENGE",
        }
    }

    #[must_use]
    pub fn from_metadata(value: &str) -> Option<Self> {
        Self::ORDER
            .into_iter()
            .find(|kind| kind.metadata() == value.trim())
    }

    /// Trimmed, case-insensitive comparison of a candidate with the expected
    /// answer. Every kind shares this rule; a blank expected answer never matches.
    #[must_use]
    pub fn score(self, expected: &str, candidate: &str) -> bool {
        let expected = normalize(expected);
        !expected.is_empty() && expected == normalize(candidate)
    }
}

impl fmt::Display for ChallengeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.metadata())
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Secret half of a challenge.
#[derive(Clone, Debug)]
pub struct PrivateParameters {
    kind: Option<ChallengeKind>,
    answer: SecretString,
}

impl PrivateParameters {
    #[must_use]
    pub fn new(kind: ChallengeKind, answer: SecretString) -> Self {
        Self {
            kind: Some(kind),
            answer,
        }
    }

    #[must_use]
    pub fn kind(&self) -> Option<ChallengeKind> {
        self.kind
    }

    #[must_use]
    pub fn answer(&self) -> &SecretString {
        &self.answer
    }

    /// Flatten into the string map handed to the identity provider.
    #[must_use]
    pub fn to_wire(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert(
            PARAM_ANSWER.to_string(),
            self.answer.expose_secret().to_string(),
        );
        if let Some(kind) = self.kind {
            map.insert(PARAM_CHALLENGE.to_string(), kind.metadata().to_string());
        }
        map
    }

    /// Parse the map the identity provider hands back at verification time.
    ///
    /// # Errors
    /// Returns `ProtocolViolation` when the answer is absent or the challenge
    /// tag names no known kind.
    pub fn from_wire(map: &BTreeMap<String, String>) -> Result<Self, ChallengeError> {
        let answer = map.get(PARAM_ANSWER).ok_or_else(|| {
            ChallengeError::ProtocolViolation("private parameters carry no answer".to_string())
        })?;

        let kind = match map.get(PARAM_CHALLENGE) {
            Some(tag) => Some(ChallengeKind::from_metadata(tag).ok_or_else(|| {
                ChallengeError::ProtocolViolation(format!("unknown challenge tag {tag:?}"))
            })?),
            None => None,
        };

        Ok(Self {
            kind,
            answer: SecretString::from(answer.clone()),
        })
    }
}

/// A materialized challenge for one session position.
#[derive(Clone, Debug)]
pub struct ChallengePayload {
    pub kind: ChallengeKind,
    pub public_parameters: BTreeMap<String, String>,
    pub private_parameters: PrivateParameters,
}

impl ChallengePayload {
    #[must_use]
    pub fn metadata(&self) -> &'static str {
        self.kind.metadata()
    }
}

/// Source of the cipher plaintext index, swappable for a fixed sequence in tests.
pub trait WordPicker: Send + Sync {
    /// Return an index in `0..len`; `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RandomWordPicker;

impl WordPicker for RandomWordPicker {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Replays a fixed index sequence, wrapping around at the end.
#[derive(Debug)]
pub struct SequenceWordPicker {
    sequence: Vec<usize>,
    cursor: AtomicUsize,
}

impl SequenceWordPicker {
    #[must_use]
    pub fn new(sequence: Vec<usize>) -> Self {
        Self {
            sequence,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl WordPicker for SequenceWordPicker {
    fn pick(&self, len: usize) -> usize {
        if self.sequence.is_empty() {
            return 0;
        }
        let step = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.sequence[step % self.sequence.len()] % len
    }
}

#[derive(Clone)]
pub struct ChallengeCatalog {
    store: Arc<dyn SecurityQuestionStore>,
    picker: Arc<dyn WordPicker>,
    words: Arc<[String]>,
}

impl ChallengeCatalog {
    #[must_use]
    pub fn new(store: Arc<dyn SecurityQuestionStore>, config: &ChallengeConfig) -> Self {
        Self {
            store,
            picker: Arc::new(RandomWordPicker),
            words: config.cipher_words().into(),
        }
    }

    #[must_use]
    pub fn with_word_picker(mut self, picker: Arc<dyn WordPicker>) -> Self {
        self.picker = picker;
        self
    }

    /// Materialize the challenge of `kind` for `user_id`.
    ///
    /// # Errors
    /// `LookupFailure` when no security question exists for the principal,
    /// `Store` when the lookup itself fails.
    pub async fn issue(
        &self,
        kind: ChallengeKind,
        user_id: &str,
    ) -> Result<ChallengePayload, ChallengeError> {
        match kind {
            ChallengeKind::SecurityQa => self.issue_security_qa(user_id).await,
            ChallengeKind::Cipher => Ok(self.issue_cipher()),
        }
    }

    async fn issue_security_qa(&self, user_id: &str) -> Result<ChallengePayload, ChallengeError> {
        let record = match self.store.get(user_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return Err(ChallengeError::LookupFailure(user_id.to_string())),
            Err(err) => return Err(ChallengeError::Store(err)),
        };

        let mut public_parameters = BTreeMap::new();
        public_parameters.insert(PARAM_QUESTION.to_string(), record.question);

        Ok(ChallengePayload {
            kind: ChallengeKind::SecurityQa,
            public_parameters,
            private_parameters: PrivateParameters::new(ChallengeKind::SecurityQa, record.answer),
        })
    }

    fn issue_cipher(&self) -> ChallengePayload {
        let index = self.picker.pick(self.words.len()).min(self.words.len() - 1);
        let plaintext = &self.words[index];
        let cipher_text = cipher::encode(plaintext, SHIFT);

        debug!(word_index = index, "issued cipher challenge");

        let mut public_parameters = BTreeMap::new();
        public_parameters.insert(PARAM_CIPHER_TEXT.to_string(), cipher_text);

        ChallengePayload {
            kind: ChallengeKind::Cipher,
            public_parameters,
            private_parameters: PrivateParameters::new(
                ChallengeKind::Cipher,
                SecretString::from(plaintext.clone()),
            ),
        }
    }

    /// Score `candidate` against the private half of an issued challenge.
    /// Parameters without a kind tag fall back to the shared comparison rule.
    #[must_use]
    pub fn score(&self, private: &PrivateParameters, candidate: &str) -> bool {
        let kind = private.kind().unwrap_or(ChallengeKind::SecurityQa);
        kind.score(private.answer().expose_secret(), candidate)
    }
}
