//! Text line protocol spoken by the gamepad bridge.
//!
//! One event per line, whitespace separated:
//!
//! ```text
//!   A <axis_id> <value>     axis, value already normalised (float)
//!   B <button_id> <0|1>     button release / press
//!   # anything              comment
//! ```
//!
//! Blank lines and comments decode to `None`.

use crate::error::InputError;

use super::InputEvent;

/// Longest line the bridge is allowed to send.
pub const MAX_LINE_LEN: usize = 64;

pub fn parse_line(line: &str) -> Result<Option<InputEvent>, InputError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    if line.len() > MAX_LINE_LEN {
        return Err(InputError::Malformed);
    }

    let mut fields = line.split_ascii_whitespace();
    let kind = fields.next().ok_or(InputError::Malformed)?;
    let id: u8 = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or(InputError::Malformed)?;
    let value = fields.next().ok_or(InputError::Malformed)?;
    if fields.next().is_some() {
        return Err(InputError::Malformed);
    }

    let event = match kind {
        "A" => {
            let value: f32 = value.parse().map_err(|_| InputError::Malformed)?;
            if !value.is_finite() {
                return Err(InputError::Malformed);
            }
            InputEvent::Axis { id, value }
        }
        "B" => {
            let pressed = match value {
                "1" => true,
                "0" => false,
                _ => return Err(InputError::Malformed),
            };
            InputEvent::Button { id, pressed }
        }
        _ => return Err(InputError::Malformed),
    };
    Ok(Some(event))
}
