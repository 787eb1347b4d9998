//! 设置文档类型定义

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// 已知的顶层字段名
pub mod keys {
    pub const EMAIL: &str = "email";
    pub const API_BEARER_TOKEN: &str = "api_bearer_token";
    pub const DOMAINS: &str = "domains";
    pub const DNS_PROVIDERS: &str = "dns_providers";
    pub const DEFAULT_ACCOUNTS: &str = "default_accounts";
    pub const DNS_PROVIDER: &str = "dns_provider";
    /// 旧版单账户 Cloudflare 字段（保留以兼容）
    pub const CLOUDFLARE_TOKEN: &str = "cloudflare_token";
    pub const AUTO_RENEW: &str = "auto_renew";
    pub const RENEWAL_THRESHOLD_DAYS: &str = "renewal_threshold_days";
    pub const SETUP_COMPLETED: &str = "setup_completed";

    /// Provider 配置下的多账户容器
    pub const ACCOUNTS: &str = "accounts";
    /// 域名对象中的域名字段
    pub const DOMAIN: &str = "domain";
}

/// 设置文档
///
/// 顶层为 JSON 对象。已知字段通过访问器读取，其余字段（包括旧版 provider 字段）
/// 原样保留，写回时不丢失。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(Map<String, Value>);

impl Settings {
    /// 空文档
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// 默认文档
    ///
    /// `api_bearer_token` 由调用方传入，通常是新生成的安全 token。
    #[must_use]
    pub fn defaults(api_bearer_token: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(keys::CLOUDFLARE_TOKEN.into(), json!(""));
        map.insert(keys::DOMAINS.into(), json!([]));
        map.insert(keys::EMAIL.into(), json!(""));
        map.insert(keys::AUTO_RENEW.into(), json!(true));
        map.insert(keys::RENEWAL_THRESHOLD_DAYS.into(), json!(30));
        map.insert(
            keys::API_BEARER_TOKEN.into(),
            Value::String(api_bearer_token.into()),
        );
        map.insert(keys::SETUP_COMPLETED.into(), json!(false));
        map.insert(keys::DNS_PROVIDER.into(), json!("cloudflare"));
        map.insert(keys::DNS_PROVIDERS.into(), json!({}));
        map.insert(keys::DEFAULT_ACCOUNTS.into(), json!({}));
        Self(map)
    }

    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// ACME 账户邮箱
    pub fn email(&self) -> Option<&str> {
        self.str_field(keys::EMAIL)
    }

    /// API bearer token
    pub fn api_bearer_token(&self) -> Option<&str> {
        self.str_field(keys::API_BEARER_TOKEN)
    }

    /// 域名列表；字段缺失或类型不符时为空
    pub fn domains(&self) -> &[Value] {
        self.0
            .get(keys::DOMAINS)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// DNS provider 配置表
    pub fn dns_providers(&self) -> Option<&Map<String, Value>> {
        self.0.get(keys::DNS_PROVIDERS).and_then(Value::as_object)
    }

    /// 某个 provider 的默认账户 key
    pub fn default_account(&self, provider: &str) -> Option<&str> {
        self.0
            .get(keys::DEFAULT_ACCOUNTS)
            .and_then(Value::as_object)
            .and_then(|accounts| accounts.get(provider))
            .and_then(Value::as_str)
    }

    /// 某个 provider 下的指定账户配置（多账户结构）
    pub fn provider_account(&self, provider: &str, account: &str) -> Option<&Map<String, Value>> {
        self.dns_providers()?
            .get(provider)?
            .get(keys::ACCOUNTS)?
            .get(account)?
            .as_object()
    }

    /// 以 `defaults` 为底合并：已存储的顶层字段优先，缺失字段由默认值补齐
    #[must_use]
    pub fn merged_over(self, defaults: Settings) -> Settings {
        let mut merged = defaults.0;
        for (key, value) in self.0 {
            merged.insert(key, value);
        }
        Settings(merged)
    }
}

impl From<Map<String, Value>> for Settings {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_contain_required_keys() {
        let settings = Settings::defaults("tok");
        for key in [
            keys::CLOUDFLARE_TOKEN,
            keys::DOMAINS,
            keys::EMAIL,
            keys::API_BEARER_TOKEN,
            keys::DNS_PROVIDERS,
            keys::DEFAULT_ACCOUNTS,
        ] {
            assert!(settings.contains_key(key), "missing {key}");
        }
        assert_eq!(settings.api_bearer_token(), Some("tok"));
        assert!(settings.domains().is_empty());
    }

    #[test]
    fn stored_values_win_over_defaults() {
        let stored: Settings = serde_json::from_value(json!({
            "email": "ops@example.com",
            "legacy_field": 7
        }))
        .unwrap();

        let merged = stored.merged_over(Settings::defaults("tok"));

        assert_eq!(merged.email(), Some("ops@example.com"));
        assert_eq!(merged.get("legacy_field"), Some(&json!(7)));
        assert_eq!(merged.get(keys::AUTO_RENEW), Some(&json!(true)));
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert!(serde_json::from_value::<Settings>(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn accessors_tolerate_wrong_types() {
        let settings: Settings = serde_json::from_value(json!({
            "email": 42,
            "domains": "example.com",
            "dns_providers": []
        }))
        .unwrap();

        assert_eq!(settings.email(), None);
        assert!(settings.domains().is_empty());
        assert!(settings.dns_providers().is_none());
    }
}
