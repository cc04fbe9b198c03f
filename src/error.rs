//! Error types for the yggdrasil-client library.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, texture trust, and input validation errors.

use thiserror::Error;

/// The unified error type for yggdrasil-client operations.
///
/// This error type covers all possible failure modes in the library,
/// with explicit variants to allow callers to handle specific cases.
#[derive(Debug, Error)]
pub enum Error {
    /// The identity service could not be reached or answered nonsense.
    /// Safe to retry later.
    #[error("authentication service unavailable: {0}")]
    Unavailable(#[from] TransportError),

    /// The identity service reported an authentication failure.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// A texture property failed the secure-texture checks.
    #[error("insecure texture: {0}")]
    InsecureTexture(#[from] InsecureTextureError),

    /// An operation was called in a state that does not permit it.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An argument was rejected by the callee.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Input validation errors (malformed UUIDs, URLs, key material).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// The server answered with a body that could not be decoded.
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Unavailable(TransportError::from(err))
    }
}

/// Authentication failures reported by the identity service.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Blank or rejected username/password/token.
    #[error("invalid credentials: {message}")]
    InvalidCredentials { message: String },

    /// The account has been migrated; the user must log in with the
    /// migrated account instead.
    #[error("account migrated: {message}")]
    UserMigrated { message: String },

    /// The server answered with a client token different from the one we
    /// sent. A protocol violation we do not know how to recover from.
    #[error("server requested a client token change")]
    ClientTokenMismatch,

    /// Any other error the service reported.
    #[error("{message}")]
    Service { message: String },
}

/// Secure-texture verification failures.
#[derive(Debug, Error)]
pub enum InsecureTextureError {
    /// The textures property carries no signature at all.
    #[error("signature is missing from textures payload")]
    MissingSignature,

    /// The signature does not verify against the trusted public key.
    #[error("textures payload has been tampered with (signature invalid)")]
    InvalidSignature,
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid UUID text.
    #[error("invalid UUID '{value}': {reason}")]
    Uuid { value: String, reason: String },

    /// Invalid service base URL.
    #[error("invalid service URL '{value}': {reason}")]
    ServiceUrl { value: String, reason: String },

    /// Invalid public key material.
    #[error("invalid public key: {reason}")]
    PublicKey { reason: String },

    /// A stored credential snapshot missing its required fields.
    #[error("invalid credential snapshot: {reason}")]
    Storage { reason: String },
}
