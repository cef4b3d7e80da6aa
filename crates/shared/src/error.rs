use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error payload carried on the wire when the server rejects a user intent
/// (bid out of turn, unknown room, ...). Display-only on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct GameError {
    pub message: String,
}

impl GameError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
