//! k-anonymity lookup keys for the password range API

use sha1::{Digest, Sha1};

/// Number of leading hex characters sent to the range endpoint
pub const PREFIX_LEN: usize = 5;

/// Hex length of a SHA-1 digest
pub const DIGEST_HEX_LEN: usize = 40;

/// Split SHA-1 of a password: the prefix goes on the wire, the suffix
/// stays local and is matched against the returned candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupKey {
    pub prefix: String,
    pub suffix: String,
}

impl LookupKey {
    pub fn derive(password: &str) -> Self {
        let digest = hex::encode(Sha1::digest(password.as_bytes()));
        let (prefix, suffix) = digest.split_at(PREFIX_LEN);

        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_ascii_uppercase(),
        }
    }
}
