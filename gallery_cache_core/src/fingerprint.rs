//! Payload fingerprints for change detection
//!
//! A fingerprint is a 32-bit signed rolling hash (`h = h * 31 + unit`) over the
//! UTF-16 code units of the payload's compact JSON form, printed in base 36.
//! Collisions are possible; it is only used to decide whether a cached
//! payload looks different from what the origin advertises.

use serde::Serialize;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Fingerprint an already-serialized payload
pub fn fingerprint_str(serialized: &str) -> String {
    let hash = serialized.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });
    to_base36(hash)
}

/// Fingerprint any serializable payload
pub fn fingerprint<T: Serialize + ?Sized>(payload: &T) -> serde_json::Result<String> {
    let serialized = serde_json::to_string(payload)?;
    Ok(fingerprint_str(&serialized))
}

fn to_base36(value: i32) -> String {
    let negative = value < 0;
    let mut magnitude = i64::from(value).unsigned_abs();

    if magnitude == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while magnitude > 0 {
        digits.push(DIGITS[(magnitude % 36) as usize]);
        magnitude /= 36;
    }
    if negative {
        digits.push(b'-');
    }
    digits.reverse();

    // Only ASCII bytes were pushed
    String::from_utf8_lossy(&digits).into_owned()
}
