//! Input format checks shared by the form-intake handlers.
//!
//! Every validator is a pure function returning `bool` so handlers can pick the
//! exact error message the client expects.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::Error;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex is valid"));
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?\d{7,15}$").expect("phone regex is valid"));
static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date regex is valid"));
static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([01]?[0-9]|2[0-3]):[0-5][0-9]$").expect("time regex is valid"));
static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").expect("slug regex is valid"));

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Separators (spaces, dots, dashes, parentheses) are ignored.
pub fn validate_phone(phone: &str) -> bool {
    let cleaned: String = phone.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect();
    PHONE_RE.is_match(&cleaned)
}

/// `YYYY-MM-DD` naming a real calendar day.
pub fn validate_date(date: &str) -> bool {
    DATE_RE.is_match(date) && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

/// 24-hour `H:MM` or `HH:MM`.
pub fn validate_time(time: &str) -> bool {
    TIME_RE.is_match(time)
}

pub fn validate_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

pub fn validate_rating(rating: i64) -> bool {
    (1..=5).contains(&rating)
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

pub fn validate_positive_integer(value: i64) -> bool {
    value > 0
}

/// Trim and cap at `max_length` characters (not bytes).
pub fn sanitize_string(text: &str, max_length: usize) -> String {
    text.trim().chars().take(max_length).collect()
}

/// Like [`sanitize_string`], but blank input becomes `None`.
pub fn sanitize_optional(text: Option<&str>, max_length: usize) -> Option<String> {
    text.map(|t| sanitize_string(t, max_length)).filter(|t| !t.is_empty())
}

/// Fails on the first field that is absent or blank, in the order given.
pub fn require_fields(fields: &[(&str, Option<&str>)]) -> Result<(), Error> {
    for (name, value) in fields {
        if value.is_none_or(|v| v.trim().is_empty()) {
            return Err(Error::bad_request(format!("Missing required field: {name}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_formats() {
        assert!(validate_email("a@b.co"));
        assert!(validate_email("  jane.doe+events@sobre.com "));
        assert!(!validate_email("not-an-email"));
        assert!(!validate_email("missing@tld"));
        assert!(!validate_email("two@@signs.com"));
        assert!(!validate_email(""));
    }

    #[test]
    fn phone_formats() {
        assert!(validate_phone("+33 5 56 83 01 69"));
        assert!(validate_phone("(555) 123-4567"));
        assert!(validate_phone("1234567"));
        assert!(!validate_phone("123456"));
        assert!(!validate_phone("+1234567890123456"));
        assert!(!validate_phone("call me"));
    }

    #[test]
    fn date_formats() {
        assert!(validate_date("2030-02-28"));
        assert!(!validate_date("2030-02-30"));
        assert!(!validate_date("2030-2-3"));
        assert!(!validate_date("28/02/2030"));
    }

    #[test]
    fn time_formats() {
        assert!(validate_time("09:30"));
        assert!(validate_time("9:30"));
        assert!(validate_time("23:59"));
        assert!(!validate_time("24:00"));
        assert!(!validate_time("12:60"));
        assert!(!validate_time("noon"));
    }

    #[test]
    fn slug_formats() {
        assert!(validate_slug("arcachon-beach-bar"));
        assert!(validate_slug("bar2"));
        assert!(!validate_slug("Arcachon"));
        assert!(!validate_slug("beach bar"));
        assert!(!validate_slug(""));
    }

    #[test]
    fn rating_bounds() {
        assert!(!validate_rating(0));
        for rating in 1..=5 {
            assert!(validate_rating(rating));
        }
        assert!(!validate_rating(6));
    }

    #[test]
    fn coordinate_bounds() {
        assert!(validate_coordinates(44.66, -1.17));
        assert!(validate_coordinates(-90.0, 180.0));
        assert!(!validate_coordinates(90.1, 0.0));
        assert!(!validate_coordinates(0.0, -180.5));
    }

    #[test]
    fn positive_integers() {
        assert!(validate_positive_integer(1));
        assert!(!validate_positive_integer(0));
        assert!(!validate_positive_integer(-4));
    }

    #[test]
    fn sanitize_trims_and_truncates_on_chars() {
        assert_eq!(sanitize_string("  hello  ", 10), "hello");
        assert_eq!(sanitize_string("crème brûlée", 5), "crème");
        assert_eq!(sanitize_optional(Some("   "), 10), None);
        assert_eq!(sanitize_optional(None, 10), None);
    }

    #[test]
    fn require_fields_reports_first_missing() {
        let ok = require_fields(&[("name", Some("Ana")), ("email", Some("a@b.co"))]);
        assert!(ok.is_ok());

        let err = require_fields(&[("name", Some("Ana")), ("email", Some("  ")), ("phone", None)]).unwrap_err();
        assert_eq!(err.user_message(), "Missing required field: email");
    }
}
