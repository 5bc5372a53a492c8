//! # Diagnostic Command Codec
//!
//! Encodes PID query commands and decodes the adapter's hexadecimal
//! responses.
//!
//! Decoding never fails: a response without the expected marker resolves to
//! raw value 0 so the polling pipeline keeps running with degraded
//! precision instead of stalling on a garbled exchange.

use super::protocol::{Pid, COMMAND_TERMINATOR, RESPONSE_MARKER};

/// Encode a PID query command
///
/// The adapter expects the ASCII command followed by a carriage return.
///
/// # Arguments
///
/// * `pid` - Parameter identifier to query
///
/// # Returns
///
/// * `Vec<u8>` - Command bytes ready to write to the link
pub fn encode_command(pid: Pid) -> Vec<u8> {
    let command = pid.command();
    let mut frame = Vec::with_capacity(command.len() + 1);
    frame.extend_from_slice(command.as_bytes());
    frame.push(COMMAND_TERMINATOR);
    frame
}

/// Decode a raw adapter response into the unsigned raw value
///
/// Strips whitespace and the `>` prompt, locates the `41` marker followed
/// by the PID echo, and parses every hex digit after it as one unsigned
/// integer.
///
/// # Arguments
///
/// * `raw` - Response bytes as read from the link
/// * `pid` - The queried parameter, selecting the expected echo
///
/// # Returns
///
/// * `u32` - Decoded value, or 0 when the marker is absent or the payload
///   is empty or malformed. Never an error.
pub fn decode_response(raw: &[u8], pid: Pid) -> u32 {
    let text = String::from_utf8_lossy(raw);

    // Strip whitespace and the adapter prompt, then normalize case
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '>')
        .collect::<String>()
        .to_uppercase();

    let marker = format!("{}{}", RESPONSE_MARKER, pid.response_echo());
    let Some(pos) = cleaned.find(&marker) else {
        return 0;
    };

    let payload: String = cleaned[pos + marker.len()..]
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .collect();

    if payload.is_empty() {
        return 0;
    }

    u32::from_str_radix(&payload, 16).unwrap_or(0)
}
