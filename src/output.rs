//! Output types: one [`ExtractedRecord`] per document.
//!
//! A record is either a success carrying the five statement fields or a
//! failure carrying the error that stopped it. For display and export both
//! shapes flatten to a single key/value row (see [`ExtractedRecord::to_row`]):
//!
//! | outcome | keys |
//! |---------|------|
//! | success | `filename`, `issuer`, `total_balance`, `due_date`, `statement_date`, `account_last_4`, then any extra keys the model returned |
//! | failure | `filename`, `error`, `details` (when known), `raw_response` (malformed answers only) |

use crate::error::{DocumentError, FailureKind};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Preferred column order for tabular display and CSV.
pub const PREFERRED_COLUMNS: [&str; 6] = [
    "filename",
    "issuer",
    "total_balance",
    "due_date",
    "statement_date",
    "account_last_4",
];

/// The statement facts returned by the model, after issuer validation.
///
/// Values other than `issuer` are passed through exactly as the model wrote
/// them (string, number or null); only their presence is guaranteed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatementFields {
    /// `None` when the model explicitly answered `null`.
    pub issuer: Option<String>,
    pub account_last_4: Value,
    pub statement_date: Value,
    pub due_date: Value,
    pub total_balance: Value,
    /// Keys outside the five requested ones, sorted by name.
    pub extra: BTreeMap<String, Value>,
}

/// Why a document has no fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureRecord {
    pub kind: FailureKind,
    pub message: String,
    pub detail: Option<String>,
    pub raw_response: Option<String>,
}

impl From<&DocumentError> for FailureRecord {
    fn from(e: &DocumentError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
            detail: e.detail().map(str::to_string),
            raw_response: e.raw_response().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(StatementFields),
    Failure(FailureRecord),
}

/// Final, immutable result for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRecord {
    pub filename: String,
    pub outcome: Outcome,
}

impl ExtractedRecord {
    pub fn success(filename: impl Into<String>, fields: StatementFields) -> Self {
        Self {
            filename: filename.into(),
            outcome: Outcome::Success(fields),
        }
    }

    pub fn failure(filename: impl Into<String>, error: &DocumentError) -> Self {
        Self {
            filename: filename.into(),
            outcome: Outcome::Failure(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    pub fn fields(&self) -> Option<&StatementFields> {
        match &self.outcome {
            Outcome::Success(fields) => Some(fields),
            Outcome::Failure(_) => None,
        }
    }

    pub fn failure_record(&self) -> Option<&FailureRecord> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure(f) => Some(f),
        }
    }

    /// Flatten into ordered `(column, value)` pairs.
    pub fn to_row(&self) -> Vec<(String, Value)> {
        let mut row = vec![("filename".to_string(), Value::String(self.filename.clone()))];
        match &self.outcome {
            Outcome::Success(f) => {
                row.push((
                    "issuer".into(),
                    f.issuer.clone().map(Value::String).unwrap_or(Value::Null),
                ));
                row.push(("total_balance".into(), f.total_balance.clone()));
                row.push(("due_date".into(), f.due_date.clone()));
                row.push(("statement_date".into(), f.statement_date.clone()));
                row.push(("account_last_4".into(), f.account_last_4.clone()));
                row.extend(
                    f.extra
                        .iter()
                        .filter(|(k, _)| k.as_str() != "filename")
                        .map(|(k, v)| (k.clone(), v.clone())),
                );
            }
            Outcome::Failure(f) => {
                row.push(("error".into(), Value::String(f.message.clone())));
                if let Some(detail) = &f.detail {
                    row.push(("details".into(), Value::String(detail.clone())));
                }
                if let Some(raw) = &f.raw_response {
                    row.push(("raw_response".into(), Value::String(raw.clone())));
                }
            }
        }
        row
    }
}

impl Serialize for ExtractedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let row = self.to_row();
        let mut map = serializer.serialize_map(Some(row.len()))?;
        for (k, v) in &row {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
