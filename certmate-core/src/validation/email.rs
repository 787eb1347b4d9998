use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CoreError, CoreResult};
use crate::traits::Validator;

use super::validate_domain;

const MAX_EMAIL_LEN: usize = 254;
const MAX_LOCAL_PART_LEN: usize = 64;

/// Dot-separated atoms of RFC 5322 `atext`
static LOCAL_PART: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*$").ok()
});

/// Validate an ACME account email, returning it trimmed with a lowercased domain.
pub fn validate_email(input: &str) -> CoreResult<String> {
    let email = input.trim();
    if email.is_empty() {
        return Err(CoreError::ValidationError(
            "Email address is required".to_string(),
        ));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(CoreError::ValidationError(format!(
            "Email address exceeds maximum length of {MAX_EMAIL_LEN} characters"
        )));
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return Err(CoreError::ValidationError(format!(
            "Invalid email format: {email}"
        )));
    };
    let local_ok = local.len() <= MAX_LOCAL_PART_LEN
        && LOCAL_PART.as_ref().is_some_and(|re| re.is_match(local));
    if !local_ok {
        return Err(CoreError::ValidationError(format!(
            "Invalid email format: {email}"
        )));
    }
    if domain.starts_with("*.") || domain.ends_with('.') {
        return Err(CoreError::ValidationError(format!(
            "Invalid email domain: {email}"
        )));
    }
    let domain = validate_domain(domain)
        .map_err(|_| CoreError::ValidationError(format!("Invalid email domain: {email}")))?;

    Ok(format!("{local}@{domain}"))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EmailValidator;

impl Validator for EmailValidator {
    fn validate(&self, input: &str) -> CoreResult<String> {
        validate_email(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_normalises() {
        assert_eq!(
            validate_email("  Admin+certs@Example.COM ").unwrap(),
            "Admin+certs@example.com"
        );
    }

    #[test]
    fn rejects_invalid_addresses() {
        for bad in [
            "invalid-email",
            "@example.com",
            "user@",
            "user@localhost",
            "us..er@example.com",
            ".user@example.com",
            "user name@example.com",
            "user@*.example.com",
        ] {
            assert!(validate_email(bad).is_err(), "{bad} should be rejected");
        }
    }
}
