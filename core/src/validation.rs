use thiserror::Error;

/// A request field that failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub received: Option<serde_json::Value>,
}

impl ValidationError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            received: None,
        }
    }

    pub fn with_received(mut self, received: Option<serde_json::Value>) -> Self {
        self.received = received;
        self
    }
}
