//! Password-based key derivation for key files.

use crate::symmetric::SecretKey;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;

/// Salt length for new key files.
pub const SALT_LENGTH: usize = 16;

/// Derive a 256-bit sealing key from a password with PBKDF2-HMAC-SHA512.
pub fn derive_sealing_key(password: &str, salt: &[u8], iterations: u32) -> SecretKey {
    let mut output = [0u8; 32];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt, iterations, &mut output);
    SecretKey::from_bytes(output)
}

/// Generate a random salt.
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    let mut salt = [0u8; SALT_LENGTH];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut salt);
    salt
}
