use argon2::Argon2;
use base64ct::{Base64, Encoding};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use tracing::error;

pub const SALT_LEN: usize = 6;
const HASH_LEN: usize = 32;
// argon2 needs at least 8 salt bytes; the stored salt is appended to this prefix
const SALT_PREFIX: &[u8] = b"userlog:";
const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Deterministic salted hash of `plain`, Base64 encoded.
pub fn hash_password(plain: &str, salt: &str) -> anyhow::Result<String> {
    let mut salted = Vec::with_capacity(SALT_PREFIX.len() + salt.len());
    salted.extend_from_slice(SALT_PREFIX);
    salted.extend_from_slice(salt.as_bytes());

    let mut out = [0u8; HASH_LEN];
    Argon2::default()
        .hash_password_into(plain.as_bytes(), &salted, &mut out)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password_into error");
            anyhow::anyhow!(e.to_string())
        })?;
    Ok(Base64::encode_string(&out))
}

pub fn verify_password(plain: &str, salt: &str, hash: &str) -> anyhow::Result<bool> {
    Ok(hash_password(plain, salt)? == hash)
}

/// Random string of `len` characters: letters and digits, or letters only.
pub fn random_string(len: usize, alphanumeric: bool) -> String {
    if alphanumeric {
        OsRng
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    } else {
        let mut rng = OsRng;
        (0..len)
            .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_per_salt() {
        let a = hash_password("Abc12345", "x1Y2z3").expect("hash");
        let b = hash_password("Abc12345", "x1Y2z3").expect("hash");
        assert_eq!(a, b);
        assert!(verify_password("Abc12345", "x1Y2z3", &a).expect("verify"));
    }

    #[test]
    fn one_changed_character_changes_hash() {
        let a = hash_password("Abc12345", "saltyy").expect("hash");
        let b = hash_password("Abc12346", "saltyy").expect("hash");
        assert_ne!(a, b);
        assert!(!verify_password("Abc12346", "saltyy", &a).expect("verify"));
    }

    #[test]
    fn salt_changes_hash() {
        let a = hash_password("Abc12345", "aaaaaa").expect("hash");
        let b = hash_password("Abc12345", "aaaaab").expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn random_string_respects_length_and_charset() {
        let s = random_string(SALT_LEN, true);
        assert_eq!(s.len(), SALT_LEN);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));

        let letters = random_string(32, false);
        assert_eq!(letters.len(), 32);
        assert!(letters.chars().all(|c| c.is_ascii_alphabetic()));
    }
}
