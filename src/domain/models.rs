use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

const MIN_PASSWORD_LENGTH: usize = 8;
const OTP_LENGTH: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "task.id")?;
        validate_non_empty(&self.title, "task.title")?;
        Ok(())
    }
}

/// Payload sent to the backend on create and update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
}

impl TaskDraft {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.title, "title")?;
        validate_non_empty(&self.description, "description")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_account_verified: Option<bool>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() { "User" } else { name }
    }

    pub fn initial(&self) -> char {
        self.name
            .trim()
            .chars()
            .next()
            .map(|first| first.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

/// Session cookie captured from the backend on login or signup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionToken {
    pub cookie: String,
    pub stored_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn is_usable(&self) -> bool {
        !self.cookie.trim().is_empty()
    }
}

pub fn validate_password(value: &str, field_name: &str) -> Result<(), String> {
    let long_enough = value.chars().count() >= MIN_PASSWORD_LENGTH;
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    let has_lower = value.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = value.chars().any(|c| c.is_ascii_uppercase());
    if long_enough && has_digit && has_lower && has_upper {
        return Ok(());
    }
    Err(format!(
        "{field_name} must be at least {MIN_PASSWORD_LENGTH} characters and contain a digit, a lowercase and an uppercase letter"
    ))
}

pub fn validate_otp(value: &str) -> Result<(), String> {
    if value.len() == OTP_LENGTH && value.chars().all(|c| c.is_ascii_digit()) {
        return Ok(());
    }
    Err(format!("otp must be exactly {OTP_LENGTH} digits"))
}

pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

pub fn validate_hhmm(value: &str, field_name: &str) -> Result<(), String> {
    parse_hhmm(value)
        .map(|_| ())
        .ok_or_else(|| format!("{field_name} must be HH:MM"))
}

pub fn validate_date(value: &str, field_name: &str) -> Result<(), String> {
    parse_date(value)
        .map(|_| ())
        .ok_or_else(|| format!("{field_name} must be YYYY-MM-DD"))
}

pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    let mut split = value.trim().split(':');
    let hour = split.next()?.parse::<u32>().ok()?;
    let minute = split.next()?.parse::<u32>().ok()?;
    if split.next().is_some() {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}
