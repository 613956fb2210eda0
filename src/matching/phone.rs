// src/matching/phone.rs
use log::debug;

/// Normalizes a US/CA phone number to its 10-digit form.
///
/// Non-digits are stripped and a leading country code `1` on an 11-digit
/// number is dropped. Anything that does not end up with exactly 10 digits is
/// rejected with `None`.
pub fn normalize_phone_number(phone: &str) -> Option<String> {
    let digits_only: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits_only.len() == 11 && digits_only.starts_with('1') {
        return Some(digits_only[1..].to_string());
    }
    if digits_only.len() == 10 {
        return Some(digits_only);
    }
    if !digits_only.is_empty() {
        debug!(
            "Phone number '{}' normalized to '{}', considered invalid for matching.",
            phone, digits_only
        );
    }
    None
}
