//! Record shapes and ingestion payloads.
//!
//! Every record is a flat map of strings stamped at ingestion time and
//! stored under `<kind>:<timestamp>:<uuid>`. Nothing references anything
//! else and nothing is ever mutated, so the whole data model is three
//! structs and a key builder.
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::error::AppError;

/// A stored record kind: its key prefix plus the ingestion timestamp
/// carried inside the record.
pub trait Record: Serialize + DeserializeOwned {
    const PREFIX: &'static str;

    fn timestamp(&self) -> &str;
}

/// Current UTC instant in the same shape the frontend produces,
/// e.g. `2026-08-04T09:30:00.000Z`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Unique storage key for one new record. The timestamp makes keys scan
/// roughly in insertion order, the uuid makes them collision-free.
pub fn storage_key(prefix: &str, timestamp: &str) -> String {
    format!("{prefix}{timestamp}:{}", Uuid::new_v4())
}

// Stored fields default to empty strings so a record written by an older
// revision still exports instead of failing the whole scan.

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
}

impl Record for ContactSubmission {
    const PREFIX: &'static str = "contact:";

    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmailSignup {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub timestamp: String,
}

impl Record for EmailSignup {
    const PREFIX: &'static str = "signup:";

    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteVisit {
    #[serde(default)]
    pub page: String,
    #[serde(default)]
    pub referrer: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub timestamp: String,
}

impl Record for SiteVisit {
    const PREFIX: &'static str = "visit:";

    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

#[derive(Deserialize)]
pub struct ContactPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

impl ContactPayload {
    pub fn into_record(self, timestamp: String) -> Result<ContactSubmission, AppError> {
        match (filled(self.name), filled(self.email), filled(self.message)) {
            (Some(name), Some(email), Some(message)) => Ok(ContactSubmission {
                name,
                email,
                message,
                timestamp,
            }),
            _ => Err(AppError::Validation("Missing required fields")),
        }
    }
}

#[derive(Deserialize)]
pub struct SignupPayload {
    pub email: Option<String>,
}

impl SignupPayload {
    pub fn into_record(self, timestamp: String) -> Result<EmailSignup, AppError> {
        match filled(self.email) {
            Some(email) => Ok(EmailSignup { email, timestamp }),
            None => Err(AppError::Validation("Email is required")),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitPayload {
    pub page: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

impl VisitPayload {
    /// Only the page is mandatory. Browsers legitimately send beacons with
    /// no referrer and privacy tooling strips the user agent, both default
    /// to empty strings.
    pub fn into_record(self, timestamp: String) -> Result<SiteVisit, AppError> {
        match filled(self.page) {
            Some(page) => Ok(SiteVisit {
                page,
                referrer: self.referrer.unwrap_or_default(),
                user_agent: self.user_agent.unwrap_or_default(),
                timestamp,
            }),
            None => Err(AppError::Validation("Page is required")),
        }
    }
}

fn filled(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}
