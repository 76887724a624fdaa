// file: src/task/attachments.rs
// version: 1.1.0
// guid: c8e05a2f-1b6d-47e9-8f3a-95d2b7c4e016

//! Data URI attachment decoding

use super::Attachment;
use crate::error::AgentError;
use crate::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

/// An attachment decoded to text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAttachment {
    pub name: String,
    pub content: String,
}

/// Decode the payload of a `data:<mime>[;base64],<payload>` URI as UTF-8.
///
/// The payload is always read as base64, whatever the header says.
pub fn decode_data_uri(uri: &str) -> Result<String> {
    let (_header, payload) = uri
        .split_once(',')
        .ok_or_else(|| AgentError::validation("data URI has no ',' separator"))?;

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| AgentError::validation(format!("invalid base64 payload: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| AgentError::validation(format!("attachment is not UTF-8 text: {}", e)))
}

/// Decode every attachment; ones that fail are logged and left out
pub fn decode_attachments(attachments: &[Attachment]) -> Vec<DecodedAttachment> {
    attachments
        .iter()
        .filter_map(|attachment| match decode_data_uri(&attachment.url) {
            Ok(content) => Some(DecodedAttachment {
                name: attachment.name.clone(),
                content,
            }),
            Err(e) => {
                warn!("Could not decode attachment {}: {}", attachment.name, e);
                None
            }
        })
        .collect()
}
