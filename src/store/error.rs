//! Snapshot store error types
//!
//! - **`SledError`**: Errors from the embedded sled database
//! - **`DecodeError`** / **`EncodeError`**: bincode failures on the stored value

use thiserror::Error;

/// Errors raised by the durable hand-off slot
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    SledError(#[from] sled::Error),

    #[error("Error while decoding snapshot: {0}")]
    DecodeError(#[from] bincode::error::DecodeError),

    #[error("Error while encoding snapshot: {0}")]
    EncodeError(#[from] bincode::error::EncodeError),
}
