//! Field rules shared by the login form and the in-memory identity provider

use regex::Regex;
use std::sync::OnceLock;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const USERNAME_PATTERN: &str = r"^[a-zA-Z0-9_]+$";

fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// `local@domain.tld` with no whitespace
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&EMAIL, EMAIL_PATTERN).map_or(false, |re| re.is_match(email))
}

/// Letters, digits and underscores only; length is checked separately
pub fn is_valid_username_charset(username: &str) -> bool {
    static USERNAME: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&USERNAME, USERNAME_PATTERN).map_or(false, |re| re.is_match(username))
}

pub fn is_valid_username_length(username: &str) -> bool {
    let len = username.chars().count();
    (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len)
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@mail.example.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert!(!is_valid_email("@c.de"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_username() {
        assert!(is_valid_username_charset("alice_01"));
        assert!(!is_valid_username_charset("al ice"));
        assert!(!is_valid_username_charset("alice!"));
        assert!(!is_valid_username_charset(""));

        assert!(!is_valid_username_length("ab"));
        assert!(is_valid_username_length("abc"));
        assert!(is_valid_username_length(&"a".repeat(20)));
        assert!(!is_valid_username_length(&"a".repeat(21)));
    }

    #[test]
    fn test_password() {
        assert!(!is_valid_password("12345"));
        assert!(is_valid_password("123456"));
    }
}
