//! Host response field extraction
//!
//! The pairing endpoint answers every command with a small XML document of
//! named fields, e.g. `<root><paired>1</paired></root>`. The state machine
//! only ever needs single named fields out of it, so this module provides a
//! thin tag scanner rather than a full XML parser.
//!
//! Recognized fields: `paired`, `plaincert`, `challengeresponse`,
//! `pairingsecret`. Only `plaincert` is ever optional; its absence is how
//! the host signals that another client's pairing attempt is in flight.

use crate::{PairingError, Result};

/// Extract a named field from a pairing response document
///
/// # Arguments
///
/// * `text` - The raw response body
/// * `name` - The field (element) name to extract
/// * `required` - Whether absence of the field is a protocol error
///
/// # Errors
///
/// Returns `PairingError::MissingField` if `required` is set and the field
/// is absent, and `PairingError::InvalidResponse` if the element is opened
/// but never closed.
pub fn get_field(text: &str, name: &str, required: bool) -> Result<Option<String>> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);

    if let Some(start) = text.find(&open) {
        let value = &text[start + open.len()..];
        return match value.find(&close) {
            Some(end) => Ok(Some(value[..end].trim().to_string())),
            None => Err(PairingError::InvalidResponse(format!(
                "unterminated <{}> element",
                name
            ))),
        };
    }

    if required {
        Err(PairingError::MissingField(name.to_string()))
    } else {
        Ok(None)
    }
}

/// Extract a field that must be present
pub fn required_field(text: &str, name: &str) -> Result<String> {
    // get_field with required=true never returns Ok(None)
    get_field(text, name, true)?
        .ok_or_else(|| PairingError::MissingField(name.to_string()))
}

/// Check whether the host reported the step as accepted (`paired == "1"`)
pub fn is_paired(text: &str) -> Result<bool> {
    Ok(required_field(text, "paired")? == "1")
}
