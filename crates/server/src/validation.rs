//! Input validation that reports every failing field at once.
//!
//! Handlers build a [`Validator`], run each check, then call
//! [`Validator::finish`]. Checks that also parse (email, price) return the
//! parsed value so the handler does not parse twice.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use vitrinex_core::{Email, Price};

use crate::error::AppError;

/// Store slugs: lowercase letters and digits, words joined by single hyphens.
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("Invalid regex"));

/// Slugs that collide with fixed routes.
const RESERVED_SLUGS: &[&str] = &["mine", "api", "admin", "health"];

pub const SLUG_MIN: usize = 3;
pub const SLUG_MAX: usize = 48;
pub const NAME_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 2000;
pub const NOTES_MAX: usize = 500;
pub const ADDRESS_MAX: usize = 300;

/// Collects field errors.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<String>,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error unless `ok` holds.
    pub fn check(&mut self, ok: bool, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(message.into());
        }
        self
    }

    /// Record several messages produced elsewhere.
    pub fn extend<I: IntoIterator<Item = String>>(&mut self, messages: I) -> &mut Self {
        self.errors.extend(messages);
        self
    }

    /// Required text, trimmed length within `1..=max`, no control characters.
    pub fn required_text(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.errors.push(format!("{field} is required"));
        } else {
            self.text_limits(field, trimmed, max);
        }
        self
    }

    /// Optional text; empty counts as absent.
    pub fn optional_text(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.text_limits(field, v, max);
        }
        self
    }

    fn text_limits(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.errors
                .push(format!("{field} must be at most {max} characters"));
        }
        if value.contains('\0') {
            self.errors.push(format!("{field} contains invalid characters"));
        }
    }

    /// Parse an email, recording a message on failure.
    pub fn email(&mut self, field: &str, value: &str) -> Option<Email> {
        match Email::parse(value) {
            Ok(email) => Some(email),
            Err(e) => {
                self.errors.push(format!("{field}: {e}"));
                None
            }
        }
    }

    /// Optional phone number: 7 to 15 digits, with `+ - ( )` and spaces allowed.
    pub fn phone(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        let Some(phone) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return self;
        };
        let allowed = phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '));
        let digits = phone.chars().filter(char::is_ascii_digit).count();
        if !allowed || !(7..=15).contains(&digits) {
            self.errors
                .push(format!("{field} must be a phone number with 7 to 15 digits"));
        }
        self
    }

    /// Validate a catalog price, returning it rounded to cents.
    pub fn price(&mut self, field: &str, value: Decimal) -> Option<Decimal> {
        match Price::validate_amount(value) {
            Ok(amount) => Some(amount),
            Err(e) => {
                self.errors.push(format!("{field}: {e}"));
                None
            }
        }
    }

    /// Integer within an inclusive range.
    pub fn range<T>(&mut self, field: &str, value: T, min: T, max: T) -> &mut Self
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            self.errors
                .push(format!("{field} must be between {min} and {max}"));
        }
        self
    }

    /// Store slug format and reserved words.
    pub fn slug(&mut self, field: &str, value: &str) -> &mut Self {
        let len = value.len();
        if !(SLUG_MIN..=SLUG_MAX).contains(&len) {
            self.errors.push(format!(
                "{field} must be between {SLUG_MIN} and {SLUG_MAX} characters"
            ));
        } else if !SLUG_RE.is_match(value) {
            self.errors.push(format!(
                "{field} may only contain lowercase letters, digits and single inner hyphens"
            ));
        } else if RESERVED_SLUGS.contains(&value) {
            self.errors.push(format!("{field} '{value}' is reserved"));
        }
        self
    }

    /// Optional absolute http(s) URL.
    pub fn url(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            let ok = url::Url::parse(v)
                .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some());
            if !ok {
                self.errors.push(format!("{field} must be an http(s) URL"));
            }
        }
        self
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fail with every collected message, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when at least one check failed.
    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

/// Trim an optional field, mapping blank to `None`.
#[must_use]
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(v: Validator) -> Vec<String> {
        match v.finish() {
            Err(AppError::Validation(m)) => m,
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_collects_all_errors() {
        let mut v = Validator::new();
        v.required_text("customer_name", "  ", NAME_MAX);
        let email = v.email("customer_email", "not-an-email");
        v.phone("customer_phone", Some("12"));
        v.range("quantity", 0u32, 1, 99);

        assert!(email.is_none());
        let errors = messages(v);
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0], "customer_name is required");
        assert!(errors[3].contains("between 1 and 99"));
    }

    #[test]
    fn test_valid_input_passes() {
        let mut v = Validator::new();
        v.required_text("name", "Ana", NAME_MAX)
            .phone("phone", Some("+52 (55) 1234-5678"))
            .optional_text("notes", None, NOTES_MAX)
            .url("banner_url", Some("https://cdn.example.com/b.png"));
        assert!(v.email("email", "ana@example.com").is_some());
        assert!(v.is_valid());
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_text_length_counts_chars() {
        let mut v = Validator::new();
        v.required_text("name", &"ñ".repeat(NAME_MAX), NAME_MAX);
        assert!(v.is_valid());
        v.required_text("name", &"ñ".repeat(NAME_MAX + 1), NAME_MAX);
        assert!(!v.is_valid());
    }

    #[test]
    fn test_slug_rules() {
        for ok in ["abc", "barberia-sol", "tienda24"] {
            let mut v = Validator::new();
            v.slug("slug", ok);
            assert!(v.is_valid(), "{ok}");
        }
        for bad in ["ab", "-abc", "abc-", "a--b", "Tienda", "tienda sol", "mine"] {
            let mut v = Validator::new();
            v.slug("slug", bad);
            assert!(!v.is_valid(), "{bad}");
        }
    }

    #[test]
    fn test_price_rounds_and_rejects() {
        let mut v = Validator::new();
        assert_eq!(
            v.price("price", Decimal::new(1250, 2)),
            Some(Decimal::new(1250, 2))
        );
        assert!(v.price("price", Decimal::new(-1, 0)).is_none());
        assert!(v.price("price", Decimal::new(1, 3)).is_none());
        assert_eq!(messages(v).len(), 2);
    }

    #[test]
    fn test_url_requires_http() {
        let mut v = Validator::new();
        v.url("logo_url", Some("javascript:alert(1)"));
        v.url("logo_url", Some("ftp://example.com/x"));
        v.url("logo_url", Some(""));
        assert_eq!(messages(v).len(), 2);
    }

    #[test]
    fn test_clean_optional() {
        assert_eq!(clean_optional(Some("  ".to_string())), None);
        assert_eq!(clean_optional(Some(" x ".to_string())), Some("x".to_string()));
        assert_eq!(clean_optional(None), None);
    }
}
