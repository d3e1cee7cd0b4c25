use crate::infrastructure::error::InfraError;
use chrono_tz::Tz;
use crate::infrastructure::credential_store::NATIVE_KEYRING_AVAILABLE;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use url::Url;

const APP_JSON: &str = "app.json";
const DEFAULT_APP_NAME: &str = "Taskpilot";
const DEFAULT_BACKEND_URL: &str = "http://localhost:4000/api";
const DEFAULT_TIMEZONE: &str = "UTC";
const BACKEND_URL_KEYS: &[&str] = &["TASKPILOT_BACKEND_URL", "BACKEND_URL"];
const TIMEZONE_KEYS: &[&str] = &["TASKPILOT_TIMEZONE"];

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStoreKind {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub backend_url: Url,
    pub timezone: Tz,
    pub credential_store: CredentialStoreKind,
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([(
        APP_JSON,
        serde_json::json!({
            "schema": 1,
            "appName": DEFAULT_APP_NAME,
            "backendUrl": DEFAULT_BACKEND_URL,
            "timezone": DEFAULT_TIMEZONE,
            "credentialStore": "file"
        }),
    )])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

fn string_field<'a>(value: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Reads `config/app.json`, letting environment variables override the backend
/// URL and timezone.
pub fn load_app_config<F>(config_dir: &Path, lookup: F) -> Result<AppConfig, InfraError>
where
    F: Fn(&str) -> Option<String>,
{
    let app = read_config(&config_dir.join(APP_JSON))?;

    let app_name = string_field(&app, "appName")
        .unwrap_or(DEFAULT_APP_NAME)
        .to_string();
    let backend_url = optional_lookup_value(&lookup, BACKEND_URL_KEYS)
        .or_else(|| string_field(&app, "backendUrl").map(ToOwned::to_owned))
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
    let timezone = optional_lookup_value(&lookup, TIMEZONE_KEYS)
        .or_else(|| string_field(&app, "timezone").map(ToOwned::to_owned))
        .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    let credential_store = credential_store_kind(&app)?;

    Ok(AppConfig {
        app_name,
        backend_url: parse_backend_url(&backend_url)?,
        timezone: parse_timezone(&timezone)?,
        credential_store,
    })
}

fn credential_store_kind(app: &serde_json::Value) -> Result<CredentialStoreKind, InfraError> {
    let kind = match app.get("credentialStore") {
        None | Some(serde_json::Value::Null) => CredentialStoreKind::default(),
        Some(raw) => CredentialStoreKind::deserialize(raw).map_err(|error| {
            InfraError::InvalidConfig(format!(
                "credentialStore must be 'file' or 'keyring': {error}"
            ))
        })?,
    };
    // Without a native backend the keyring crate falls back to a store that
    // forgets secrets between entries.
    if kind == CredentialStoreKind::Keyring && !NATIVE_KEYRING_AVAILABLE {
        return Err(InfraError::InvalidConfig(
            "credentialStore 'keyring' is only supported on macOS and Windows; use 'file'"
                .to_string(),
        ));
    }
    Ok(kind)
}

pub fn parse_backend_url(raw: &str) -> Result<Url, InfraError> {
    let url = Url::parse(raw.trim())
        .map_err(|error| InfraError::InvalidConfig(format!("invalid backendUrl '{raw}': {error}")))?;
    if url.cannot_be_a_base() {
        return Err(InfraError::InvalidConfig(format!(
            "backendUrl cannot be a base: {raw}"
        )));
    }
    Ok(url)
}

pub fn parse_timezone(raw: &str) -> Result<Tz, InfraError> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|_| InfraError::InvalidConfig(format!("unknown timezone '{raw}'")))
}

pub fn optional_lookup_value<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    for key in keys {
        if let Some(value) = lookup(key) {
            let normalized = value.trim();
            if !normalized.is_empty() {
                return Some(normalized.to_string());
            }
        }
    }
    None
}
