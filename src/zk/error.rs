//! ZK protocol error types.

use std::io;
use thiserror::Error;

/// Errors that can occur during ZK protocol communication.
///
/// Variants map directly onto the kinds a caller needs to branch on: a
/// socket-level failure is always `Network`, a deadline miss is always
/// `Timeout`, and so on. The device's own ack codes surface as `Device`
/// or `Exists` rather than being folded into `Protocol`.
#[derive(Error, Debug)]
pub enum ZkError {
    /// Socket-level failure: refused, unreachable, reset, broken pipe, DNS.
    #[error("network error: {0}")]
    Network(String),

    /// Exceeded the per-operation receive deadline.
    #[error("timeout waiting for device response")]
    Timeout,

    /// Malformed outer frame, truncated payload, unexpected response code,
    /// or exhausted chunk retries.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Device responded CMD_ACK_UNAUTH to CMD_AUTH, or requires a password
    /// that was not configured.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Device responded CMD_ACK_ERROR to an otherwise well-formed request.
    #[error("device error: {0}")]
    Device(String),

    /// Device indicated a conflict (duplicate uid/user_id/card).
    #[error("already exists: {0}")]
    Exists(String),

    /// Caller attempted an operation other than connect/auth while not connected.
    #[error("invalid state: {0}")]
    State(String),
}

impl From<io::Error> for ZkError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ZkError::Timeout,
            _ => ZkError::Network(e.to_string()),
        }
    }
}

/// Result type for ZK protocol operations.
pub type Result<T> = std::result::Result<T, ZkError>;
