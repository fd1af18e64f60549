//! Encryption boundary for host sources.
//!
//! The [`Crypto`] trait hides how encrypted hosts files are opened, so the
//! sync pipeline can run against the real `age` CLI or a fake in tests.

pub mod age;

use crate::error::Result;
use std::path::Path;

/// Backend trait for encrypting and decrypting hosts files.
pub trait Crypto: Send + Sync {
    /// Check if the backend can be used.
    fn is_available(&self) -> bool;

    /// Decrypt `ciphertext` with the identity at `identity` and return the
    /// plaintext bytes.
    fn decrypt(&self, ciphertext: &Path, identity: &Path) -> Result<Vec<u8>>;

    /// Encrypt `plaintext` for every recipient, writing to `output`.
    fn encrypt(&self, plaintext: &Path, output: &Path, recipients: &[String]) -> Result<()>;
}

/// Get the default backend (real age CLI).
pub fn default_backend() -> age::AgeBackend {
    age::AgeBackend::new()
}
