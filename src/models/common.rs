//! Common types and helpers shared across resource models.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::ResourceKind;
use crate::api::ApiError;

/// Server-assigned record identifier
pub type RecordId = i64;

/// Whether a form is being submitted as a new record or an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Create,
    Update(RecordId),
}

impl EditMode {
    pub fn from_target(target: Option<RecordId>) -> Self {
        match target {
            Some(id) => EditMode::Update(id),
            None => EditMode::Create,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, EditMode::Create)
    }
}

/// Numbers arrive either as JSON numbers or as numeric strings
/// (decimal columns are serialized as strings by some drivers).
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(i64),
    Float(f64),
    Text(String),
}

pub fn flexible_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<NumberOrString> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrString::Int(i)) => Some(i as f64),
        Some(NumberOrString::Float(f)) => Some(f),
        Some(NumberOrString::Text(s)) => s.trim().replace(',', ".").parse().ok(),
        None => None,
    })
}

pub fn flexible_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<NumberOrString> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrString::Int(i)) => Some(i),
        Some(NumberOrString::Float(f)) if f.fract() == 0.0 => Some(f as i64),
        Some(NumberOrString::Float(_)) => None,
        Some(NumberOrString::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Extract the record list from a collection response.
///
/// The API returns either a bare array or an object holding the array under
/// the collection key. A wrapper without the key (or with `null`) is treated
/// as an empty collection.
pub fn records_from_payload<R>(kind: ResourceKind, payload: Value) -> Result<Vec<R>, ApiError>
where
    R: for<'de> Deserialize<'de>,
{
    let list = match payload {
        Value::Array(_) => payload,
        Value::Object(mut map) => match map.remove(kind.collection_key()) {
            Some(Value::Null) | None => return Ok(Vec::new()),
            Some(list) => list,
        },
        other => {
            return Err(ApiError::Decode(format!(
                "expected a list of {} but got {}",
                kind.collection_key(),
                other
            )))
        }
    };

    serde_json::from_value(list).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Empty strings become `None`
pub fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
