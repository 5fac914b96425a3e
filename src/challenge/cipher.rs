//! Shift-substitution codec used to build cipher puzzles.

/// Rotation applied to every cipher challenge.
pub const SHIFT: i32 = 3;

const ALPHABET_LEN: i32 = 26;

/// Rotate every ASCII letter of `plaintext` by `shift` positions, preserving
/// case. Anything that is not an ASCII letter is copied unchanged.
#[must_use]
pub fn encode(plaintext: &str, shift: i32) -> String {
    let shift = shift.rem_euclid(ALPHABET_LEN);
    plaintext.chars().map(|c| rotate(c, shift)).collect()
}

/// Inverse of [`encode`] for the same `shift`.
#[must_use]
pub fn decode(ciphertext: &str, shift: i32) -> String {
    encode(ciphertext, -shift)
}

fn rotate(c: char, shift: i32) -> char {
    let base = if c.is_ascii_lowercase() {
        b'a'
    } else if c.is_ascii_uppercase() {
        b'A'
    } else {
        return c;
    };

    // `c` is ASCII here so the narrowing cannot truncate.
    let offset = (i32::from(c as u8 - base) + shift).rem_euclid(ALPHABET_LEN);
    char::from(base + offset as u8)
}
