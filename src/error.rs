//! Error types for session setup.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Voice service public key not configured")]
    MissingPublicKey,

    #[error("Session already {0}")]
    InvalidState(String),
}
