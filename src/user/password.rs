use tracing::warn;

/// Well-formed cost-12 bcrypt hash that matches no password. Checked against
/// when the email is unknown so both login failures cost one bcrypt run.
pub const UNKNOWN_USER_HASH: &str =
    "$2b$12$abcdefghijklmnopqrstueABCDEFGHIJKLMNOPQRSTUVWXYZabcde";

/// Salted one-way hash comparison
pub trait PasswordVerifier: Send + Sync {
    fn verify_password(&self, hash: &str, plaintext: &str) -> bool;
}

/// bcrypt-backed verifier
pub struct BcryptPasswordVerifier;

impl BcryptPasswordVerifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BcryptPasswordVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordVerifier for BcryptPasswordVerifier {
    fn verify_password(&self, hash: &str, plaintext: &str) -> bool {
        match bcrypt::verify(plaintext, hash) {
            Ok(valid) => valid,
            Err(e) => {
                // A corrupt stored hash is a mismatch, not a server error
                warn!(error = %e, "Stored password hash could not be parsed");
                false
            }
        }
    }
}
