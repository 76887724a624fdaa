// file: src/task/mod.rs
// version: 1.1.0
// guid: 41b8d6e3-92fa-4c07-a5d1-6c3e0f87b294

//! Build task requests sent by the evaluation server

pub mod attachments;
pub mod notify;

pub use attachments::{decode_attachments, decode_data_uri, DecodedAttachment};
pub use notify::{HttpNotifier, Notification, Notifier};

use crate::error::AgentError;
use crate::Result;
use serde::{Deserialize, Deserializer, Serialize};

/// Round 1 builds a new app; round 2 revises an existing one
pub const ROUND_CREATE: i64 = 1;
pub const ROUND_REVISE: i64 = 2;

/// A task as received on the wire. Every field is optional there; the
/// pipeline decides what is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    /// Repository name for the generated app
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub round: Option<i64>,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub brief: Option<String>,
    #[serde(default)]
    pub evaluation_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
}

/// A file shipped with the brief as a data URI
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

/// Treat an explicit JSON `null` the same as a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl TaskRequest {
    /// Parse a request body; anything but a JSON object is rejected
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        if !value.is_object() {
            return Err(AgentError::validation("request body must be a JSON object"));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Round number, defaulting to 1 when absent
    pub fn round(&self) -> i64 {
        self.round.unwrap_or(ROUND_CREATE)
    }

    /// Repository name, when present and non-empty
    pub fn repo_name(&self) -> Option<&str> {
        self.task.as_deref().filter(|task| !task.trim().is_empty())
    }

    /// Brief, when present and non-empty
    pub fn brief(&self) -> Option<&str> {
        self.brief.as_deref().filter(|brief| !brief.trim().is_empty())
    }
}
