//! Password policy and salted hashing.
//!
//! Stored hashes have the form `sha256$<salt>$<hex digest>`.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Minimum password policy: eight characters or more.
pub static PASSWORD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.{8,}$").expect("valid password regex"));

const HASH_SCHEME: &str = "sha256";

pub fn is_password_valid(password: &str) -> bool {
    PASSWORD_REGEX.is_match(password)
}

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = salted_digest(&salt, password);
    format!("{HASH_SCHEME}${salt}${digest}")
}

/// Checks `password` against a stored hash. Malformed hashes never match.
pub fn compare_hash(password: &str, stored_hash: &str) -> bool {
    let mut parts = stored_hash.splitn(3, '$');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(HASH_SCHEME), Some(salt), Some(digest)) if !salt.is_empty() => {
            constant_time_eq(salted_digest(salt, password).as_bytes(), digest.as_bytes())
        }
        _ => false,
    }
}

fn salted_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update([0u8]);
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (l, r)| acc | (l ^ r))
        == 0
}
