//! Admin password digests.
//!
//! Stored as `sha256$<salt>$<hex digest of salt + password>`. A bare hex
//! digest (no salt) is still accepted for accounts created before salting.

use rand::RngCore;
use sha2::{Digest, Sha256};

const SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = to_hex(&salt);
    format!("{}${}${}", SCHEME, salt, digest(&salt, password))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parts: Vec<&str> = password_hash.split('$').collect();
    let (salt, expected) = match parts.as_slice() {
        [scheme, salt, expected] if *scheme == SCHEME => (*salt, *expected),
        [expected] => ("", *expected),
        _ => return false,
    };
    constant_time_eq(
        digest(salt, password).as_bytes(),
        expected.to_ascii_lowercase().as_bytes(),
    )
}
