//! DNS provider 多账户迁移服务
//!
//! 将旧版单账户 provider 配置（凭证字段直接位于 provider 下）包装为
//! `accounts.default`，并在 `default_accounts` 中登记默认账户。

use serde_json::{Map, Value};

use crate::types::{keys, Settings};

/// Account key assigned to credentials migrated from the flat shape
pub const DEFAULT_ACCOUNT_KEY: &str = "default";

/// Description stamped on migrated accounts
pub const MIGRATED_DESCRIPTION: &str = "Migrated from single-account configuration";

/// Field names recognised as credentials regardless of naming heuristics
const KNOWN_CREDENTIAL_FIELDS: &[&str] = &[
    "api_token",
    "api_key",
    "api_secret",
    "api_url",
    "access_key_id",
    "secret_access_key",
    "region",
    "subscription_id",
    "resource_group",
    "tenant_id",
    "client_id",
    "client_secret",
    "project_id",
    "service_account_key",
    "endpoint",
    "application_key",
    "application_secret",
    "consumer_key",
    "nameserver",
    "tsig_key",
    "tsig_secret",
    "tsig_algorithm",
    "username",
    "password",
    "email",
];

/// Substrings marking a field as credential-like
const CREDENTIAL_MARKERS: &[&str] = &["token", "key", "secret", "password", "credential"];

/// 迁移结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationResult {
    /// 不需要迁移（无 provider 或均已是新格式）
    NotNeeded,

    /// 迁移成功
    Migrated {
        /// 被迁移的 provider 名称
        providers: Vec<String>,
    },
}

impl MigrationResult {
    pub fn is_migrated(&self) -> bool {
        matches!(self, Self::Migrated { .. })
    }
}

/// 迁移服务
///
/// 纯结构变换：幂等，各 provider 独立处理，不依赖 provider 类型。
#[derive(Debug, Default, Clone, Copy)]
pub struct MigrationService;

impl MigrationService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Upgrade legacy provider blocks, discarding the report
    #[must_use]
    pub fn migrate(&self, settings: Settings) -> Settings {
        self.migrate_with_report(settings).0
    }

    /// Upgrade legacy provider blocks and report which providers changed
    pub fn migrate_with_report(&self, settings: Settings) -> (Settings, MigrationResult) {
        let mut map = settings.into_map();

        let migrated = match map.get_mut(keys::DNS_PROVIDERS) {
            Some(Value::Object(providers)) => migrate_providers(providers),
            _ => Vec::new(),
        };

        if migrated.is_empty() {
            return (Settings::from(map), MigrationResult::NotNeeded);
        }

        let defaults = map
            .entry(keys::DEFAULT_ACCOUNTS)
            .or_insert_with(|| Value::Object(Map::new()));
        if !defaults.is_object() {
            log::warn!("Replacing non-object default_accounts during migration");
            *defaults = Value::Object(Map::new());
        }
        if let Value::Object(defaults) = defaults {
            for provider in &migrated {
                defaults.insert(
                    provider.clone(),
                    Value::String(DEFAULT_ACCOUNT_KEY.to_string()),
                );
            }
        }

        (
            Settings::from(map),
            MigrationResult::Migrated {
                providers: migrated,
            },
        )
    }
}

/// Wrap every legacy provider config in place, returning the migrated names
fn migrate_providers(providers: &mut Map<String, Value>) -> Vec<String> {
    let mut migrated = Vec::new();

    for (provider, config) in providers.iter_mut() {
        let Value::Object(fields) = config else {
            continue;
        };
        if !is_legacy_shape(fields) {
            continue;
        }

        let mut account = std::mem::take(fields);
        account.insert(
            "name".to_string(),
            Value::String(format!("Default {} Account", display_name(provider))),
        );
        account.insert(
            "description".to_string(),
            Value::String(MIGRATED_DESCRIPTION.to_string()),
        );

        let mut accounts = Map::new();
        accounts.insert(DEFAULT_ACCOUNT_KEY.to_string(), Value::Object(account));
        fields.insert(keys::ACCOUNTS.to_string(), Value::Object(accounts));

        log::info!("Migrated DNS provider '{provider}' to multi-account configuration");
        migrated.push(provider.clone());
    }

    migrated
}

/// Flat single-account config: no `accounts` key and at least one credential field
fn is_legacy_shape(fields: &Map<String, Value>) -> bool {
    !fields.is_empty()
        && !fields.contains_key(keys::ACCOUNTS)
        && fields
            .iter()
            .any(|(name, value)| !value.is_object() && is_credential_field(name))
}

fn is_credential_field(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    KNOWN_CREDENTIAL_FIELDS.contains(&name.as_str())
        || CREDENTIAL_MARKERS.iter().any(|marker| name.contains(marker))
}

/// `route53` -> `Route53`, `google-cloud` -> `Google-Cloud`
fn display_name(provider: &str) -> String {
    let mut out = String::with_capacity(provider.len());
    let mut capitalize = true;
    for c in provider.chars() {
        if c.is_alphabetic() {
            if capitalize {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            capitalize = false;
        } else {
            out.push(c);
            capitalize = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(value: Value) -> Settings {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn wraps_legacy_cloudflare_config() {
        let input = settings(json!({
            "dns_providers": { "cloudflare": { "api_token": "t1" } }
        }));

        let (out, result) = MigrationService::new().migrate_with_report(input);

        assert_eq!(
            result,
            MigrationResult::Migrated {
                providers: vec!["cloudflare".to_string()]
            }
        );
        let account = out.provider_account("cloudflare", "default").unwrap();
        assert_eq!(account["api_token"], "t1");
        assert_eq!(account["name"], "Default Cloudflare Account");
        assert_eq!(account["description"], MIGRATED_DESCRIPTION);
        assert_eq!(out.default_account("cloudflare"), Some("default"));
    }

    #[test]
    fn copies_all_route53_fields_verbatim() {
        let input = settings(json!({
            "dns_providers": {
                "route53": {
                    "access_key_id": "AKIATEST",
                    "secret_access_key": "secret-key",
                    "region": "us-east-1"
                }
            }
        }));

        let out = MigrationService::new().migrate(input);

        let account = out.provider_account("route53", "default").unwrap();
        assert_eq!(account["access_key_id"], "AKIATEST");
        assert_eq!(account["secret_access_key"], "secret-key");
        assert_eq!(account["region"], "us-east-1");
        assert_eq!(account["name"], "Default Route53 Account");
        assert_eq!(out.default_account("route53"), Some("default"));
    }

    #[test]
    fn migrates_every_legacy_provider() {
        let input = settings(json!({
            "dns_providers": {
                "cloudflare": { "api_token": "cf-token" },
                "route53": { "access_key_id": "AKIATEST", "secret_access_key": "secret" },
                "digitalocean": { "api_token": "do-token" }
            }
        }));

        let out = MigrationService::new().migrate(input);

        for provider in ["cloudflare", "route53", "digitalocean"] {
            assert!(out.provider_account(provider, "default").is_some());
            assert_eq!(out.default_account(provider), Some("default"));
        }
    }

    #[test]
    fn leaves_multi_account_provider_untouched() {
        let input = settings(json!({
            "dns_providers": {
                "cloudflare": {
                    "accounts": {
                        "production": { "name": "Production", "api_token": "prod-token" }
                    }
                }
            }
        }));

        let (out, result) = MigrationService::new().migrate_with_report(input.clone());

        assert_eq!(result, MigrationResult::NotNeeded);
        assert_eq!(out, input);
    }

    #[test]
    fn leaves_account_keyed_config_untouched() {
        let input = settings(json!({
            "dns_providers": {
                "cloudflare": {
                    "production": { "name": "Production", "api_token": "prod-token" }
                }
            }
        }));

        assert_eq!(MigrationService::new().migrate(input.clone()), input);
    }

    #[test]
    fn never_wraps_empty_or_credential_free_configs() {
        let input = settings(json!({
            "dns_providers": {
                "cloudflare": {},
                "route53": { "some_other_field": "value" }
            }
        }));

        let (out, result) = MigrationService::new().migrate_with_report(input.clone());

        assert_eq!(result, MigrationResult::NotNeeded);
        assert_eq!(out.dns_providers().unwrap()["cloudflare"], json!({}));
        assert_eq!(
            out.dns_providers().unwrap()["route53"],
            json!({ "some_other_field": "value" })
        );
        assert!(!out.contains_key(keys::DEFAULT_ACCOUNTS));
    }

    #[test]
    fn without_dns_providers_is_unchanged() {
        let input = settings(json!({ "email": "test@example.com" }));
        assert_eq!(MigrationService::new().migrate(input.clone()), input);
    }

    #[test]
    fn mixed_shapes_migrate_independently() {
        let route53 = json!({
            "accounts": {
                "production": { "name": "Production", "access_key_id": "AKIAPROD" }
            }
        });
        let input = settings(json!({
            "dns_providers": {
                "cloudflare": { "api_token": "old-token" },
                "route53": route53.clone()
            },
            "default_accounts": { "route53": "production" }
        }));

        let out = MigrationService::new().migrate(input);

        assert_eq!(
            out.provider_account("cloudflare", "default").unwrap()["api_token"],
            "old-token"
        );
        assert_eq!(out.dns_providers().unwrap()["route53"], route53);
        assert_eq!(out.default_account("route53"), Some("production"));
        assert_eq!(out.default_account("cloudflare"), Some("default"));
    }

    #[test]
    fn migration_is_idempotent() {
        let input = settings(json!({
            "email": "ops@example.com",
            "dns_providers": {
                "cloudflare": { "api_token": "t1" },
                "route53": { "accounts": { "prod": { "access_key_id": "A" } } },
                "powerdns": {},
                "rfc2136": { "note": "x" }
            }
        }));
        let service = MigrationService::new();

        let once = service.migrate(input);
        let (twice, result) = service.migrate_with_report(once.clone());

        assert_eq!(twice, once);
        assert_eq!(result, MigrationResult::NotNeeded);
    }

    #[test]
    fn replaces_malformed_default_accounts() {
        let input = settings(json!({
            "dns_providers": { "cloudflare": { "api_token": "t1" } },
            "default_accounts": "cloudflare"
        }));

        let out = MigrationService::new().migrate(input);

        assert_eq!(out.default_account("cloudflare"), Some("default"));
    }

    #[test]
    fn non_object_provider_entries_are_skipped() {
        let input = settings(json!({
            "dns_providers": { "cloudflare": "legacy-string", "route53": null }
        }));
        assert_eq!(MigrationService::new().migrate(input.clone()), input);
    }

    #[test]
    fn display_name_title_cases() {
        assert_eq!(display_name("cloudflare"), "Cloudflare");
        assert_eq!(display_name("route53"), "Route53");
        assert_eq!(display_name("google-cloud"), "Google-Cloud");
    }
}
