//! Invite codes.
//!
//! Codes are short tokens drawn from an alphabet without visually ambiguous
//! characters (`0/O`, `1/I/L`). Uniqueness is enforced by the `books`
//! unique index; book creation retries with a fresh code on collision.

use std::fmt;

use rand::Rng;

/// Characters an invite code is drawn from.
pub const INVITE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Default invite code length.
pub const INVITE_CODE_LEN: usize = 8;

/// Source of candidate invite codes.
pub trait InviteCodes: fmt::Debug + Send + Sync {
    fn generate(&self) -> String;
}

/// Uniformly random codes from [`INVITE_ALPHABET`].
#[derive(Clone, Copy, Debug)]
pub struct RandomInviteCodes {
    length: usize,
}

impl RandomInviteCodes {
    #[must_use]
    pub fn with_length(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomInviteCodes {
    fn default() -> Self {
        Self::with_length(INVITE_CODE_LEN)
    }
}

impl InviteCodes for RandomInviteCodes {
    fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| char::from(INVITE_ALPHABET[rng.random_range(0..INVITE_ALPHABET.len())]))
            .collect()
    }
}

/// Canonical form used for lookups: trimmed and upper-cased.
pub fn normalize_invite_code(code: &str) -> Option<String> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_codes_use_the_unambiguous_alphabet() {
        let codes = RandomInviteCodes::default();
        for _ in 0..200 {
            let code = codes.generate();
            assert_eq!(code.len(), INVITE_CODE_LEN);
            assert!(code.bytes().all(|b| INVITE_ALPHABET.contains(&b)));
            assert!(!code.contains(['0', 'O', '1', 'I', 'L']));
        }
    }

    #[test]
    fn custom_length() {
        assert_eq!(RandomInviteCodes::with_length(12).generate().len(), 12);
    }

    #[test]
    fn codes_are_normalized_for_lookup() {
        assert_eq!(normalize_invite_code(" ab3k9xyz "), Some("AB3K9XYZ".to_string()));
        assert_eq!(normalize_invite_code("   "), None);
    }
}
