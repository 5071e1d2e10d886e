//! Validation helpers shared by the decode boundary and the core.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::error::{BookingError, Result};
use crate::state::SeatId;

// The patterns are literals and always compile.
#[allow(clippy::unwrap_used)]
static SEAT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][1-9][0-9]?$").unwrap());

#[allow(clippy::unwrap_used)]
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

#[allow(clippy::unwrap_used)]
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[6-9][0-9]{9}$").unwrap());

/// Whether `s` is a well-formed seat identifier (`A1`..`Z99`, no leading
/// zero).
#[must_use]
pub fn is_valid_seat_id(s: &str) -> bool {
    SEAT_ID_RE.is_match(s)
}

/// Whether `email` looks like a deliverable address.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 255 && EMAIL_RE.is_match(email)
}

/// Whether `phone` is a valid mobile number.
///
/// Accepts a bare 10-digit number starting with 6-9, optionally prefixed
/// with `+91` and interspersed with spaces or dashes.
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    let normalized: String = phone
        .strip_prefix("+91")
        .unwrap_or(phone)
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect();
    PHONE_RE.is_match(&normalized)
}

/// Validate a caller-supplied user identifier.
///
/// User ids are embedded in coordinator lock values as `<userId>:<holdId>`,
/// so a colon inside the id would corrupt owner parsing.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] if the id is empty, longer than 128
/// characters, or contains a colon or whitespace.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() || user_id.len() > 128 {
        return Err(BookingError::Validation("Invalid user ID".into()));
    }
    if user_id.contains(':') || user_id.chars().any(char::is_whitespace) {
        return Err(BookingError::Validation("Invalid user ID".into()));
    }
    Ok(())
}

/// Validate the seat list of a hold request against the quantity field and
/// the per-booking ceiling.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] if the list is empty, contains
/// duplicates, disagrees with `quantity`, or exceeds `max_seats`.
pub fn validate_hold_seats(seat_ids: &[SeatId], quantity: usize, max_seats: usize) -> Result<()> {
    if seat_ids.is_empty() {
        return Err(BookingError::Validation(
            "seatIds must be a non-empty list".into(),
        ));
    }
    if quantity != seat_ids.len() {
        return Err(BookingError::Validation(
            "Quantity must match number of seat IDs".into(),
        ));
    }
    if seat_ids.len() > max_seats {
        return Err(BookingError::Validation(format!(
            "Cannot book more than {max_seats} seats"
        )));
    }
    let unique: BTreeSet<&SeatId> = seat_ids.iter().collect();
    if unique.len() != seat_ids.len() {
        return Err(BookingError::Validation(
            "seatIds contains duplicates".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn seat_id_pattern() {
        assert!(is_valid_seat_id("A1"));
        assert!(is_valid_seat_id("J10"));
        assert!(is_valid_seat_id("B99"));
        assert!(!is_valid_seat_id("A0"));
        assert!(!is_valid_seat_id("A01"));
        assert!(!is_valid_seat_id("a1"));
        assert!(!is_valid_seat_id("A100"));
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name+tag@sub.example.co"));
        assert!(!is_valid_email("invalid"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@example"));
    }

    #[test]
    fn phone_pattern() {
        assert!(is_valid_phone("9876543210"));
        assert!(is_valid_phone("+91 98765 43210"));
        assert!(is_valid_phone("98765-43210"));
        assert!(!is_valid_phone("1234567890"));
        assert!(!is_valid_phone("98765"));
        assert!(!is_valid_phone("phone"));
    }

    #[test]
    fn user_id_rules() {
        assert!(validate_user_id("user-42").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("user:42").is_err());
        assert!(validate_user_id("user 42").is_err());
        assert!(validate_user_id(&"x".repeat(129)).is_err());
    }

    #[test]
    fn hold_seat_rules() {
        let seats: Vec<SeatId> = ["A1", "A2"]
            .iter()
            .map(|s| SeatId::parse(s).unwrap())
            .collect();

        assert!(validate_hold_seats(&seats, 2, 10).is_ok());
        assert!(validate_hold_seats(&seats, 1, 10).is_err());
        assert!(validate_hold_seats(&[], 0, 10).is_err());
        assert!(validate_hold_seats(&seats, 2, 1).is_err());

        let dup: Vec<SeatId> = ["A1", "A1"]
            .iter()
            .map(|s| SeatId::parse(s).unwrap())
            .collect();
        assert!(validate_hold_seats(&dup, 2, 10).is_err());
    }
}
