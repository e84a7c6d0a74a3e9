//! Password Verification
//! Mission: Compare submitted passwords against bcrypt hashes without leaking why they fail

use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use tracing::debug;

/// Plaintext hashed at construction so unknown accounts still cost one bcrypt round
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

/// Checks credentials against stored bcrypt hashes and produces new ones
pub struct CredentialVerifier {
    cost: u32,
    decoy_hash: String,
}

impl CredentialVerifier {
    /// Create a verifier hashing with the given bcrypt cost
    pub fn new(cost: u32) -> Result<Self> {
        let decoy_hash = hash(DECOY_PASSWORD, cost).context("Failed to build decoy hash")?;
        Ok(Self { cost, decoy_hash })
    }

    pub fn with_default_cost() -> Result<Self> {
        Self::new(DEFAULT_COST)
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password for storage
    pub fn hash(&self, password: &str) -> Result<String> {
        hash(password, self.cost).context("Failed to hash password")
    }

    /// Returns true only if `submitted` matches `stored_hash`.
    ///
    /// An unparsable stored hash is treated as a mismatch.
    pub fn verify(&self, stored_hash: &str, submitted: &str) -> bool {
        match verify(submitted, stored_hash) {
            Ok(matches) => matches,
            Err(e) => {
                debug!("Stored password hash could not be checked: {}", e);
                false
            }
        }
    }

    /// Spend the same work as `verify` for an account that does not exist
    pub fn verify_decoy(&self, submitted: &str) {
        let _ = verify(submitted, &self.decoy_hash);
    }
}
