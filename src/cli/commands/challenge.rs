use clap::{builder::ValueParser, Arg, Command};
use regex::Regex;
use url::Url;

pub const ARG_NOTIFY_URL: &str = "notify-url";
pub const ARG_CIPHER_WORDS: &str = "cipher-words";

const DEFAULT_CIPHER_WORDS: &str = "delta,train,mouse";

/// Cipher words are lowercase ASCII letters, comma separated.
#[must_use]
pub fn validator_cipher_words() -> ValueParser {
    ValueParser::from(move |words: &str| -> std::result::Result<String, String> {
        let re = Regex::new(r"^[a-z]+(\s*,\s*[a-z]+)*$").map_err(|e| e.to_string())?;

        let words = words.trim();
        if re.is_match(words) {
            Ok(words.to_string())
        } else {
            Err("cipher words must be comma separated lowercase letters".to_string())
        }
    })
}

#[must_use]
pub fn validator_url() -> ValueParser {
    ValueParser::from(move |value: &str| -> std::result::Result<Url, String> {
        let url = Url::parse(value).map_err(|e| format!("invalid URL: {e}"))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(format!("unsupported URL scheme: {scheme}")),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_NOTIFY_URL)
                .long("notify-url")
                .help("Webhook receiving successful login notifications; logged when unset")
                .env("SFIDA_NOTIFY_URL")
                .value_parser(validator_url()),
        )
        .arg(
            Arg::new(ARG_CIPHER_WORDS)
                .long("cipher-words")
                .help("Comma separated words the cipher challenge picks from")
                .env("SFIDA_CIPHER_WORDS")
                .default_value(DEFAULT_CIPHER_WORDS)
                .value_parser(validator_cipher_words()),
        )
}

/// Split a validated `--cipher-words` value.
pub fn split_words(words: &str) -> Vec<String> {
    words
        .split(',')
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}
