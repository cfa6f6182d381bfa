//! Domain services over the Record Store.
//!
//! # Responsibility
//! - Validate request shape before any store mutation.
//! - Check the acting session against the permission matrix.
//! - Delegate persistence to the injected `DocumentStore`.
//!
//! # Invariants
//! - A validation or permission failure never mutates the store.
//! - Services hold no state of their own beyond injected capabilities.

use crate::auth::permission::AccessDenied;
use crate::model::document::Fields;
use crate::store::StoreError;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod billing_service;
pub mod catalog_service;
pub mod member_dashboard;
pub mod member_service;
pub mod notification_service;
pub mod report_service;
pub mod user_dashboard;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error returned by every domain service.
#[derive(Debug)]
pub enum ServiceError {
    /// Input shape rejected before touching the store.
    Validation(String),
    NotFound {
        collection: String,
        id: String,
    },
    PermissionDenied(AccessDenied),
    /// Non-lookup store failure (persistence).
    Store(StoreError),
}

impl ServiceError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "{message}"),
            Self::NotFound { collection, id } => write!(f, "document {id} not found in {collection}"),
            Self::PermissionDenied(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PermissionDenied(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Validation(_) | Self::NotFound { .. } => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { collection, id } => Self::NotFound { collection, id },
            other => Self::Store(other),
        }
    }
}

impl From<AccessDenied> for ServiceError {
    fn from(value: AccessDenied) -> Self {
        Self::PermissionDenied(value)
    }
}

/// Current time as RFC 3339 with millisecond precision, UTC.
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub(crate) fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub(crate) fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Rejects blank or missing text, returning the trimmed value.
pub(crate) fn require_text(value: &str, message: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(message));
    }
    Ok(trimmed.to_string())
}

/// Rejects zero, negative and non-finite amounts.
pub(crate) fn require_positive(value: f64, message: &str) -> ServiceResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ServiceError::validation(message));
    }
    Ok(value)
}

/// Merges `extra` under `base`; keys in `base` win.
pub(crate) fn with_extra(mut base: Fields, extra: Fields) -> Fields {
    for (key, value) in extra {
        base.entry(key).or_insert(value);
    }
    base
}

/// `value` as a JSON number; whole numbers stay integers.
pub(crate) fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

/// Percentage `part / whole * 100` rounded to 2 decimals; 0 for empty wholes.
pub(crate) fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    round2(part / whole * 100.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
