//! Phone and message text helpers.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d]").unwrap());
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strip everything but digits and turn a national leading `8` into `7`.
///
/// ```rust
/// use otp_gateway::utils::phone::format_phone;
///
/// assert_eq!(format_phone("+7 (999) 123-45-67"), "79991234567");
/// assert_eq!(format_phone("89991234567"), "79991234567");
/// ```
pub fn format_phone(phone: &str) -> String {
    let digits = NON_DIGITS.replace_all(phone, "");
    match digits.strip_prefix('8') {
        Some(rest) => format!("7{rest}"),
        None => digits.into_owned(),
    }
}

/// Collapse whitespace runs into single spaces and trim.
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RUNS.replace_all(text, " ").trim().to_string()
}

/// Mask a phone number for logs, keeping the last four characters.
///
/// Works on unvalidated input: counts characters, not bytes.
///
/// ```rust
/// use otp_gateway::utils::phone::mask_phone;
///
/// assert_eq!(mask_phone("+79991234567"), "+*******4567");
/// assert_eq!(mask_phone("aé123"), "*é123");
/// ```
pub fn mask_phone(phone: &str) -> String {
    let visible = 4;
    let (prefix, digits) = match phone.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", phone),
    };
    let count = digits.chars().count();
    if count <= visible {
        return format!("{prefix}{}", "*".repeat(count));
    }
    let hidden = count - visible;
    let tail: String = digits.chars().skip(hidden).collect();
    format!("{prefix}{}{tail}", "*".repeat(hidden))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("+79991234567"), "79991234567");
        assert_eq!(format_phone("8 999 123 45 67"), "79991234567");
        assert_eq!(format_phone("+1 (415) 555-0123"), "14155550123");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Your\n code   is\t4821 "), "Your code is 4821");
    }

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("+79991234567"), "+*******4567");
        assert_eq!(mask_phone("14155550123"), "*******0123");
        assert_eq!(mask_phone("+123"), "+***");
    }

    #[test]
    fn test_mask_phone_non_ascii() {
        assert_eq!(mask_phone("aé123"), "*é123");
        assert_eq!(mask_phone("+ééééé"), "+*éééé");
        assert_eq!(mask_phone("телефон"), "***ефон");
    }
}
