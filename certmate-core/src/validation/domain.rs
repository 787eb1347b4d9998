use crate::error::{CoreError, CoreResult};
use crate::traits::Validator;

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Validate and normalise a certificate domain name.
///
/// Trims whitespace and a trailing dot, lowercases, accepts a single leading
/// `*.` wildcard, and enforces RFC 1035 label rules. Bare IP addresses and
/// single-label names are rejected.
pub fn validate_domain(input: &str) -> CoreResult<String> {
    let domain = input.trim().trim_end_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return Err(CoreError::ValidationError(
            "Domain name is required".to_string(),
        ));
    }
    if domain.len() > MAX_DOMAIN_LEN {
        return Err(CoreError::ValidationError(format!(
            "Domain name exceeds maximum length of {MAX_DOMAIN_LEN} characters (got {})",
            domain.len()
        )));
    }

    let host = domain.strip_prefix("*.").unwrap_or(&domain);
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return Err(CoreError::ValidationError(format!(
            "Domain name must contain at least two labels: {domain}"
        )));
    }
    for label in &labels {
        check_label(label, &domain)?;
    }
    if labels
        .last()
        .is_some_and(|tld| tld.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(CoreError::ValidationError(format!(
            "Invalid top-level domain: {domain}"
        )));
    }

    Ok(domain)
}

fn check_label(label: &str, domain: &str) -> CoreResult<()> {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return Err(CoreError::ValidationError(format!(
            "Invalid label length in domain: {domain}"
        )));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(CoreError::ValidationError(format!(
            "Domain labels cannot start or end with a hyphen: {domain}"
        )));
    }
    if !label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(CoreError::ValidationError(format!(
            "Invalid characters in domain: {domain}"
        )));
    }
    Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DomainValidator;

impl Validator for DomainValidator {
    fn validate(&self, input: &str) -> CoreResult<String> {
        validate_domain(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_case_and_trailing_dot() {
        assert_eq!(validate_domain(" Example.COM. ").unwrap(), "example.com");
    }

    #[test]
    fn accepts_wildcard_prefix() {
        assert_eq!(validate_domain("*.example.com").unwrap(), "*.example.com");
        assert!(validate_domain("a.*.example.com").is_err());
    }

    #[test]
    fn rejects_malformed_names() {
        for bad in [
            "",
            "localhost",
            "-bad.example.com",
            "bad-.example.com",
            "under_score.example.com",
            "double..dot.com",
            "192.168.1.1",
        ] {
            assert!(validate_domain(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn rejects_overlong_label() {
        let domain = format!("{}.com", "a".repeat(64));
        assert!(validate_domain(&domain).is_err());
    }
}
