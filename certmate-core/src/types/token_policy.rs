//! API token 安全策略

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// 默认拒绝的占位 token（大小写不敏感）
pub const DEFAULT_FORBIDDEN_TOKENS: &[&str] = &[
    "change-this-token",
    "change-me",
    "changeme",
    "your-token-here",
    "your-secret-token",
    "your_api_token_here",
    "api-token",
    "default",
    "token",
    "secret",
    "password",
    "admin",
    "test",
    "123456",
];

/// API bearer token 的强度要求
///
/// 作为配置数据存在，可以通过 `StoreConfig` 覆盖。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenPolicy {
    /// 禁止使用的占位 token
    pub forbidden_tokens: Vec<String>,
    /// 最小长度（字符数）
    pub min_length: usize,
    /// 最少不同字符数
    pub min_distinct_chars: usize,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            forbidden_tokens: DEFAULT_FORBIDDEN_TOKENS
                .iter()
                .map(ToString::to_string)
                .collect(),
            min_length: 32,
            min_distinct_chars: 8,
        }
    }
}

impl TokenPolicy {
    /// 检查 token，不满足时返回具体原因
    pub fn check(&self, token: &str) -> CoreResult<()> {
        if token.is_empty() {
            return Err(CoreError::ValidationError(
                "API token is required".to_string(),
            ));
        }
        if token.chars().any(char::is_whitespace) {
            return Err(CoreError::ValidationError(
                "API token must not contain whitespace".to_string(),
            ));
        }
        if self
            .forbidden_tokens
            .iter()
            .any(|forbidden| forbidden.eq_ignore_ascii_case(token))
        {
            return Err(CoreError::ValidationError(
                "API token is a known insecure placeholder".to_string(),
            ));
        }
        let length = token.chars().count();
        if length < self.min_length {
            return Err(CoreError::ValidationError(format!(
                "API token must be at least {} characters (got {length})",
                self.min_length
            )));
        }
        let distinct = token.chars().collect::<HashSet<_>>().len();
        if distinct < self.min_distinct_chars {
            return Err(CoreError::ValidationError(format!(
                "API token is too weak: needs at least {} distinct characters",
                self.min_distinct_chars
            )));
        }
        Ok(())
    }

    pub fn is_secure(&self, token: &str) -> bool {
        self.check(token).is_ok()
    }
}
