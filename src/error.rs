use thiserror::Error;

/// Errors produced by the capture-worker fabric.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported protocol command {0:#06x}")]
    UnsupportedProtocol(u16),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("worker spawn failed: {0}")]
    Spawn(String),

    #[error("payload length mismatch: expected {expected}, got {actual}")]
    PayloadSize { expected: usize, actual: usize },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("hardening unavailable: {0}")]
    Hardening(String),
}

pub type Result<T> = std::result::Result<T, Error>;
