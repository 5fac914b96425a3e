/// Plaintexts the cipher challenge draws from unless configured otherwise.
pub const DEFAULT_CIPHER_WORDS: [&str; 3] = ["delta", "train", "mouse"];

/// Challenge configuration loaded at startup.
#[derive(Clone, Debug)]
pub struct ChallengeConfig {
    cipher_words: Vec<String>,
}

impl ChallengeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cipher_words: DEFAULT_CIPHER_WORDS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Replace the cipher word set. Blank entries are dropped and words are
    /// lowercased; an empty result keeps the current set.
    #[must_use]
    pub fn with_cipher_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();

        if !words.is_empty() {
            self.cipher_words = words;
        }
        self
    }

    #[must_use]
    pub fn cipher_words(&self) -> &[String] {
        &self.cipher_words
    }
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self::new()
    }
}
