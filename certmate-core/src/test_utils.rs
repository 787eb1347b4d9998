//! 测试辅助模块
//!
//! 提供 mock 实现和便捷的测试工厂方法。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::services::{ServiceContext, SettingsService};
use crate::traits::{
    BackupHook, InMemorySettingsStorage, SettingsStorage, TokenGenerator, Validator,
};
use crate::types::{Settings, TokenPolicy};
use crate::validation::SettingsValidators;

/// Token returned by `FixedTokenGenerator`; satisfies the default policy
pub const STRONG_TOKEN: &str = "new-secure-token-123456789012345678901234567890";

// ===== MockSettingsStorage =====

/// In-memory storage that counts writes and can be told to fail them
pub struct MockSettingsStorage {
    inner: InMemorySettingsStorage,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MockSettingsStorage {
    pub fn new() -> Self {
        Self {
            inner: InMemorySettingsStorage::new(),
            writes: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn with_raw(raw: &str) -> Self {
        Self {
            inner: InMemorySettingsStorage::with_raw(raw),
            ..Self::new()
        }
    }

    pub fn with_document(doc: &Value) -> Self {
        Self::with_raw(&doc.to_string())
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl SettingsStorage for MockSettingsStorage {
    fn exists(&self) -> bool {
        self.inner.exists()
    }

    fn read_document(&self) -> Option<Settings> {
        self.inner.read_document()
    }

    fn read_raw(&self) -> Option<String> {
        self.inner.read_raw()
    }

    fn write_document(&self, settings: &Settings) -> bool {
        if self.fail_writes.load(Ordering::SeqCst) {
            return false;
        }
        let written = self.inner.write_document(settings);
        if written {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        written
    }
}

// ===== RecordingBackupHook =====

/// Records every `(raw, reason)` it is asked to back up
#[derive(Default)]
pub struct RecordingBackupHook {
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingBackupHook {
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BackupHook for RecordingBackupHook {
    fn backup(&self, raw: &str, reason: &str) -> Option<String> {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.push((raw.to_string(), reason.to_string()));
        Some(format!("backup-{}", calls.len()))
    }
}

// ===== Generators / validators =====

pub struct FixedTokenGenerator;

impl TokenGenerator for FixedTokenGenerator {
    fn generate(&self) -> String {
        STRONG_TOKEN.to_string()
    }
}

/// Only accepts addresses starting with `admin@`
pub struct StrictEmailValidator;

impl Validator for StrictEmailValidator {
    fn validate(&self, input: &str) -> CoreResult<String> {
        if input.starts_with("admin@") {
            Ok(input.to_string())
        } else {
            Err(CoreError::ValidationError(format!(
                "Only admin addresses allowed: {input}"
            )))
        }
    }
}

// ===== Factories =====

pub fn create_test_settings_service(
    storage: MockSettingsStorage,
) -> (
    SettingsService,
    Arc<MockSettingsStorage>,
    Arc<RecordingBackupHook>,
) {
    let validators = SettingsValidators::default();
    build(storage, validators)
}

pub fn create_test_settings_service_with(
    storage: MockSettingsStorage,
    email: Arc<dyn Validator>,
) -> (
    SettingsService,
    Arc<MockSettingsStorage>,
    Arc<RecordingBackupHook>,
) {
    let validators = SettingsValidators {
        email,
        ..SettingsValidators::default()
    };
    build(storage, validators)
}

fn build(
    storage: MockSettingsStorage,
    validators: SettingsValidators,
) -> (
    SettingsService,
    Arc<MockSettingsStorage>,
    Arc<RecordingBackupHook>,
) {
    let storage = Arc::new(storage);
    let backups = Arc::new(RecordingBackupHook::default());
    let ctx = Arc::new(ServiceContext::new(
        storage.clone(),
        backups.clone(),
        Arc::new(FixedTokenGenerator),
        validators,
        TokenPolicy::default(),
    ));
    (SettingsService::new(ctx), storage, backups)
}
