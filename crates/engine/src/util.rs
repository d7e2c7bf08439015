//! Internal helpers for input validation and identifiers.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every mutation rejects malformed input before any I/O.

use chrono::Utc;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

/// NFC-normalized and trimmed text, `None` when nothing is left.
pub(crate) fn normalize_optional_text(value: &str) -> Option<String> {
    let normalized: String = value.nfc().collect();
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Like [`normalize_optional_text`] but rejects empty input.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    normalize_optional_text(value)
        .ok_or_else(|| EngineError::Validation(format!("{label} must not be empty")))
}

/// Identifier of an existing record. Empty means the record cannot be found.
pub(crate) fn require_record_id<'a>(value: &'a str, label: &str) -> ResultEngine<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::KeyNotFound(format!("{label} id")));
    }
    Ok(trimmed)
}

/// Identifier referenced by a new record. Empty is malformed input.
pub(crate) fn require_reference_id<'a>(value: &'a str, label: &str) -> ResultEngine<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{label} id must not be empty")));
    }
    Ok(trimmed)
}

pub(crate) fn validate_weight(weight: f64) -> ResultEngine<f64> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(EngineError::Validation(format!(
            "weight must be a non-negative number, got {weight}"
        )));
    }
    Ok(weight)
}

pub(crate) fn validate_amount(amount: MoneyCents, label: &str) -> ResultEngine<MoneyCents> {
    if amount.is_negative() {
        return Err(EngineError::Validation(format!(
            "{label} must not be negative, got {amount}"
        )));
    }
    Ok(amount)
}

pub(crate) fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
