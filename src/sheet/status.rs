use chrono::{DateTime, Utc};
use serde_json::Value;

/// Outcome written back to the row a table came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RowStatus {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl RowStatus {
    pub fn succeeded(timestamp: DateTime<Utc>) -> Self {
        Self {
            success: true,
            timestamp,
            message: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let message = message.into();
        let message = if message.is_empty() {
            String::from("unknown error")
        } else {
            message
        };
        Self {
            success: false,
            timestamp,
            message,
        }
    }

    /// `[success, timestamp, message]` as written to the status cells.
    pub fn to_cells(&self) -> Vec<Value> {
        vec![
            Value::Bool(self.success),
            Value::String(self.timestamp.to_rfc3339()),
            Value::String(self.message.clone()),
        ]
    }
}
