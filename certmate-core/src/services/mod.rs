//! 业务逻辑服务层

mod migration_service;
mod settings_service;

pub use migration_service::{
    MigrationResult, MigrationService, DEFAULT_ACCOUNT_KEY, MIGRATED_DESCRIPTION,
};
pub use settings_service::SettingsService;

use std::sync::Arc;

use crate::traits::{BackupHook, SettingsStorage, TokenGenerator};
use crate::types::TokenPolicy;
use crate::validation::SettingsValidators;

/// 服务上下文 - 持有所有依赖
///
/// 平台层需要创建此上下文，并注入平台特定的存储实现。
pub struct ServiceContext {
    /// 设置存储
    pub settings_storage: Arc<dyn SettingsStorage>,
    /// 覆盖写入前的备份回调
    pub backup_hook: Arc<dyn BackupHook>,
    /// API token 生成器
    pub token_generator: Arc<dyn TokenGenerator>,
    /// 保存前运行的字段校验器
    pub validators: SettingsValidators,
    /// 加载时判定 token 是否需要轮换的策略
    pub token_policy: TokenPolicy,
}

impl ServiceContext {
    /// 创建服务上下文
    #[must_use]
    pub fn new(
        settings_storage: Arc<dyn SettingsStorage>,
        backup_hook: Arc<dyn BackupHook>,
        token_generator: Arc<dyn TokenGenerator>,
        validators: SettingsValidators,
        token_policy: TokenPolicy,
    ) -> Self {
        Self {
            settings_storage,
            backup_hook,
            token_generator,
            validators,
            token_policy,
        }
    }

    pub fn settings_storage(&self) -> &Arc<dyn SettingsStorage> {
        &self.settings_storage
    }

    pub fn backup_hook(&self) -> &Arc<dyn BackupHook> {
        &self.backup_hook
    }

    pub fn token_generator(&self) -> &Arc<dyn TokenGenerator> {
        &self.token_generator
    }
}
