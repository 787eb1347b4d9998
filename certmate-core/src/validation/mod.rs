//! Default field validators
//!
//! Pure functions wrapped in `Validator` implementations so `SettingsService`
//! can depend on the trait and tests can substitute their own.

mod domain;
mod email;

use std::sync::Arc;

pub use domain::{validate_domain, DomainValidator};
pub use email::{validate_email, EmailValidator};

use crate::error::CoreResult;
use crate::traits::Validator;
use crate::types::TokenPolicy;

/// Validates API bearer tokens against a `TokenPolicy`
#[derive(Debug, Clone, Default)]
pub struct ApiTokenValidator {
    policy: TokenPolicy,
}

impl ApiTokenValidator {
    #[must_use]
    pub fn new(policy: TokenPolicy) -> Self {
        Self { policy }
    }
}

impl Validator for ApiTokenValidator {
    fn validate(&self, input: &str) -> CoreResult<String> {
        self.policy.check(input)?;
        Ok(input.to_string())
    }
}

/// The validators `SettingsService::save` runs, one per field type
#[derive(Clone)]
pub struct SettingsValidators {
    pub email: Arc<dyn Validator>,
    pub api_token: Arc<dyn Validator>,
    pub domain: Arc<dyn Validator>,
}

impl SettingsValidators {
    /// Built-in validators, with the token check driven by `policy`
    #[must_use]
    pub fn with_policy(policy: TokenPolicy) -> Self {
        Self {
            email: Arc::new(EmailValidator),
            api_token: Arc::new(ApiTokenValidator::new(policy)),
            domain: Arc::new(DomainValidator),
        }
    }
}

impl Default for SettingsValidators {
    fn default() -> Self {
        Self::with_policy(TokenPolicy::default())
    }
}
