//! Random identifiers handed out to customers.

use rand::prelude::RngExt;
use rand::rng;

const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const BOOKING_REFERENCE_LENGTH: usize = 8;

/// Generate a booking reference
/// Format: 8 characters from `[A-Z0-9]`
/// Example: "K7Q2ZP0M"
pub fn generate_booking_reference() -> String {
    let mut rng = rng();
    (0..BOOKING_REFERENCE_LENGTH)
        .map(|_| REFERENCE_ALPHABET[rng.random_range(0..REFERENCE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_booking_reference_format() {
        let reference = generate_booking_reference();

        assert_eq!(reference.len(), BOOKING_REFERENCE_LENGTH);
        assert!(
            reference.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
            "Unexpected character in {reference}"
        );
    }

    #[test]
    fn test_generate_booking_reference_randomness() {
        let references: std::collections::HashSet<_> = (0..20).map(|_| generate_booking_reference()).collect();

        // 36^8 possibilities; twenty draws colliding would mean a broken generator
        assert!(references.len() > 1);
    }
}
