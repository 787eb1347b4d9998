//! Subcommand implementations

use anyhow::Context;
use certmate_app::AppState;
use certmate_core::services::{MigrationResult, MigrationService};
use certmate_core::types::{keys, Settings};
use serde_json::Value;

/// How a command finished when it did not error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The command ran but found something the operator must fix
    Problems,
}

pub fn show(state: &AppState, reveal: bool) -> anyhow::Result<Outcome> {
    let mut settings = state.load_settings();
    if !reveal {
        if let Some(token) = settings.api_bearer_token().map(mask_token) {
            settings.insert(keys::API_BEARER_TOKEN, Value::String(token));
        }
    }
    let json = serde_json::to_string_pretty(&settings).context("Failed to render settings")?;
    println!("{json}");
    Ok(Outcome::Success)
}

pub fn check(state: &AppState) -> Outcome {
    let problems = find_problems(state);
    if problems.is_empty() {
        println!("{}: ok", state.settings_path().display());
        return Outcome::Success;
    }
    for problem in &problems {
        println!("{problem}");
    }
    Outcome::Problems
}

pub fn migrate(state: &AppState) -> Outcome {
    let Some(MigrationResult::Migrated { providers }) = pending_migration(state) else {
        // Still load so a missing or damaged file gets healed
        state.load_settings();
        println!("No legacy provider configuration found");
        return Outcome::Success;
    };

    // Loading performs and persists the migration
    state.load_settings();

    if pending_migration(state).is_some_and(|pending| pending.is_migrated()) {
        println!(
            "Migration of {} could not be saved to {}",
            providers.join(", "),
            state.settings_path().display()
        );
        return Outcome::Problems;
    }
    println!("Migrated providers: {}", providers.join(", "));
    Outcome::Success
}

/// What migrating the stored document would change, without writing it
fn pending_migration(state: &AppState) -> Option<MigrationResult> {
    state
        .ctx
        .settings_storage()
        .read_document()
        .map(|stored| MigrationService::new().migrate_with_report(stored).1)
}

pub fn rotate_token(state: &AppState) -> anyhow::Result<Outcome> {
    let token = state
        .settings_service
        .rotate_api_token()
        .context("Failed to rotate API token")?;
    println!("{token}");
    Ok(Outcome::Success)
}

pub fn set_email(state: &AppState, email: &str) -> anyhow::Result<Outcome> {
    let settings = state
        .settings_service
        .update(|settings| {
            settings.insert(keys::EMAIL, Value::String(email.to_string()));
        })
        .context("Failed to update email")?;
    println!("email = {}", settings.email().unwrap_or_default());
    Ok(Outcome::Success)
}

pub fn add_domain(state: &AppState, domain: &str) -> anyhow::Result<Outcome> {
    let domain = state
        .ctx
        .validators
        .domain
        .validate(domain)
        .context("Invalid domain")?;

    if contains_domain(&state.load_settings(), &domain) {
        println!("{domain} is already managed");
        return Ok(Outcome::Success);
    }

    state
        .settings_service
        .update(|settings| {
            let mut domains = settings.domains().to_vec();
            domains.push(Value::String(domain.clone()));
            settings.insert(keys::DOMAINS, Value::Array(domains));
        })
        .context("Failed to add domain")?;
    println!("Added {domain}");
    Ok(Outcome::Success)
}

pub fn paths(state: &AppState) -> Outcome {
    let config = &state.config;
    println!("settings:     {}", config.settings_path().display());
    println!("data:         {}", config.data_dir.display());
    println!("certificates: {}", config.cert_dir.display());
    println!("backups:      {}", config.backup_dir.display());
    Outcome::Success
}

/// Problems in the stored document, without healing it
fn find_problems(state: &AppState) -> Vec<String> {
    let storage = state.ctx.settings_storage();
    if !storage.exists() {
        return vec!["settings file does not exist yet".to_string()];
    }
    let Some(stored) = storage.read_document() else {
        return vec!["settings file is unreadable or not a JSON object".to_string()];
    };

    let mut problems = Vec::new();
    if let Err(e) = state.settings_service.validate(&stored) {
        problems.push(e.to_string());
    }
    match stored.api_bearer_token() {
        None => problems.push("api_bearer_token is missing".to_string()),
        Some(token) => {
            if let Err(e) = state.ctx.token_policy.check(token) {
                let message = e.to_string();
                if !problems.contains(&message) {
                    problems.push(message);
                }
            }
        }
    }
    if let (_, MigrationResult::Migrated { providers }) =
        MigrationService::new().migrate_with_report(stored)
    {
        problems.push(format!(
            "legacy single-account config for: {}",
            providers.join(", ")
        ));
    }
    problems
}

fn contains_domain(settings: &Settings, domain: &str) -> bool {
    settings.domains().iter().any(|entry| match entry {
        Value::String(name) => name.eq_ignore_ascii_case(domain),
        Value::Object(fields) => fields
            .get(keys::DOMAIN)
            .and_then(Value::as_str)
            .is_some_and(|name| name.eq_ignore_ascii_case(domain)),
        _ => false,
    })
}

/// Keep the first four characters
fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{visible}****")
}
