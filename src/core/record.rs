//! Persisted answers record
//!
//! The answers of a run are stored as a flat JSON object next to the rule file
//! so a later `load` run can show them again:
//!
//! ```json
//! {
//!     "blocked_ips": ["203.0.113.4"],
//!     "experienced": true,
//!     "server_exp": [1, 4]
//! }
//! ```
//!
//! Booleans map to JSON booleans, option selections to integer arrays,
//! addresses to string arrays and cancelled answers to `null`. Decoding is
//! guided by the registry, which is what keeps an empty option list and an
//! empty address list apart.

use crate::core::answers::{AnswerKind, AnswerValue, AnswersMap};
use crate::core::error::{Error, Result};
use crate::core::registry::Registry;
use crate::utils::write_atomic;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Encodes answers as a JSON object.
pub fn encode(answers: &AnswersMap) -> Value {
    let object: Map<String, Value> = answers
        .iter()
        .map(|(id, value)| {
            let json = match value {
                AnswerValue::Boolean(b) => Value::Bool(*b),
                AnswerValue::IntList(numbers) => {
                    Value::Array(numbers.iter().map(|&n| Value::from(n)).collect())
                }
                AnswerValue::AddressList(addresses) => {
                    Value::Array(addresses.iter().cloned().map(Value::String).collect())
                }
                AnswerValue::Cancelled => Value::Null,
            };
            (id.to_string(), json)
        })
        .collect();
    Value::Object(object)
}

/// Decodes a JSON record back into answers.
///
/// # Errors
///
/// - [`Error::PersistedRecordMalformed`] if `record` is not an object or a value
///   does not have the shape its question expects
/// - [`Error::UnknownQuestionId`] if a key is not in `registry`
pub fn decode(registry: &Registry, record: &Value) -> Result<AnswersMap> {
    let object = record
        .as_object()
        .ok_or_else(|| Error::PersistedRecordMalformed("expected a JSON object".into()))?;

    let mut answers = AnswersMap::new();
    for (id, json) in object {
        let spec = registry.lookup(id)?;
        let expected = AnswerKind::from(spec.kind);
        let value = decode_value(json, expected).ok_or_else(|| {
            Error::PersistedRecordMalformed(format!("'{id}' should be {expected}"))
        })?;
        answers.insert(id.clone(), value);
    }
    Ok(answers)
}

fn decode_value(json: &Value, expected: AnswerKind) -> Option<AnswerValue> {
    if json.is_null() {
        return Some(AnswerValue::Cancelled);
    }
    match expected {
        AnswerKind::Boolean => json.as_bool().map(AnswerValue::Boolean),
        AnswerKind::IntList => json
            .as_array()?
            .iter()
            .map(|n| n.as_u64().and_then(|n| u32::try_from(n).ok()))
            .collect::<Option<Vec<_>>>()
            .map(AnswerValue::IntList),
        AnswerKind::AddressList => json
            .as_array()?
            .iter()
            .map(|s| s.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(AnswerValue::AddressList),
    }
}

/// Pretty-printed JSON text of the record.
pub fn to_json_string(answers: &AnswersMap) -> Result<String> {
    Ok(serde_json::to_string_pretty(&encode(answers))?)
}

/// Parses record text.
pub fn from_json_str(registry: &Registry, json: &str) -> Result<AnswersMap> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| Error::PersistedRecordMalformed(format!("invalid JSON: {e}")))?;
    decode(registry, &value)
}

/// Hex SHA-256 of `contents`.
pub fn checksum(contents: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Path of the checksum sidecar for a record file.
pub fn checksum_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".sha256");
    PathBuf::from(name)
}

/// Saves the record atomically, optionally with a `.sha256` sidecar.
pub fn save(path: &Path, answers: &AnswersMap, with_checksum: bool) -> Result<()> {
    let json = to_json_string(answers)?;
    write_atomic(path, json.as_bytes())?;

    if with_checksum
        && let Err(e) = write_atomic(&checksum_path(path), checksum(&json).as_bytes())
    {
        tracing::error!(path = %path.display(), "failed to write checksum: {e}");
        let _ = std::fs::remove_file(path);
        return Err(e.into());
    }

    tracing::info!(path = %path.display(), answers = answers.len(), "saved answers record");
    Ok(())
}

/// Loads a record written by [`save`].
///
/// A checksum mismatch is logged but not fatal, since records may be edited by hand.
pub fn load(path: &Path, registry: &Registry) -> Result<AnswersMap> {
    let json = std::fs::read_to_string(path)?;

    if let Ok(expected) = std::fs::read_to_string(checksum_path(path)) {
        let actual = checksum(&json);
        if expected.trim() != actual {
            tracing::warn!(
                "Answers record '{}' checksum mismatch (expected: {}, got: {})",
                path.display(),
                expected.trim(),
                actual
            );
        }
    }

    from_json_str(registry, &json)
}
