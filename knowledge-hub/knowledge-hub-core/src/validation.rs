//! Input checks shared by the services. All of them run before any write.

use crate::error::{Error, Result};

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Trimmed, non-empty document title.
pub fn title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(Error::validation("Title is required"));
    }
    Ok(title.to_string())
}

/// Document content is kept verbatim but must not be blank.
pub fn content(raw: &str) -> Result<&str> {
    if raw.trim().is_empty() {
        return Err(Error::validation("Content is required"));
    }
    Ok(raw)
}

pub fn name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.chars().count() < MIN_NAME_LEN {
        return Err(Error::validation("Name must be at least 2 characters"));
    }
    Ok(name.to_string())
}

/// Syntactic check plus normalization to lowercase.
pub fn email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split('.')
                    .all(|label| !label.is_empty() && !label.starts_with('-'))
                && domain.contains('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(Error::validation("Please enter a valid email"));
    }
    Ok(email)
}

pub fn password(raw: &str) -> Result<&str> {
    if raw.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation("Password must be at least 6 characters"));
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_trimmed_and_required() {
        assert_eq!(title("  Notes ").unwrap(), "Notes");
        assert!(title("   ").is_err());
    }

    #[test]
    fn content_must_not_be_blank() {
        assert_eq!(content(" <p>x</p>").unwrap(), " <p>x</p>");
        assert!(content("\n\t").is_err());
    }

    #[test]
    fn emails() {
        assert_eq!(email(" Ada@Example.COM ").unwrap(), "ada@example.com");
        for bad in ["", "ada", "ada@", "@example.com", "ada@example", "a b@example.com", "a@b@c.d", "ada@.com"] {
            assert!(email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn names_and_passwords_have_minimum_lengths() {
        assert!(name(" A ").is_err());
        assert_eq!(name(" Al ").unwrap(), "Al");
        assert!(password("12345").is_err());
        assert!(password("123456").is_ok());
    }
}
