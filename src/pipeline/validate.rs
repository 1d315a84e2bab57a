//! Response validation: raw service body → [`StatementFields`].
//!
//! Decoding happens in two layers. The service envelope is a JSON object
//! whose `response` member is itself a JSON document encoded as a string;
//! both layers must parse. Either failure is a
//! [`DocumentError::MalformedResponse`] carrying the text that did not parse.
//!
//! Only the issuer is cross-checked against the statement text. A small
//! model readily invents a plausible bank name; one that neither occurs in
//! the text nor looks like a bank ("Bank"/"Card") is replaced by
//! [`ISSUER_SENTINEL`]. The other four fields are taken as-is.

use crate::error::{DocumentError, ValidationWarning};
use crate::output::StatementFields;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Replaces an issuer that could not be found in the statement text.
pub const ISSUER_SENTINEL: &str = "Not Found in Text (AI Guess)";

/// Issuer assumed when the model omitted the key.
pub const UNKNOWN_ISSUER: &str = "Unknown";

/// Tokens that make an unmatched issuer plausible enough to keep.
pub const ISSUER_HINTS: [&str; 2] = ["Bank", "Card"];

/// Validated fields plus any non-fatal findings.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub fields: StatementFields,
    pub warnings: Vec<ValidationWarning>,
}

/// Decode `raw` and reconcile it with `source_text`.
pub fn validate(raw: &str, source_text: &str) -> Result<Validated, DocumentError> {
    let envelope: Value =
        serde_json::from_str(raw).map_err(|e| DocumentError::MalformedResponse {
            reason: format!("Invalid response envelope: {e}"),
            raw: raw.to_string(),
        })?;

    let inner = envelope
        .get("response")
        .and_then(Value::as_str)
        .ok_or_else(|| DocumentError::MalformedResponse {
            reason: "Response envelope has no 'response' string".into(),
            raw: raw.to_string(),
        })?;

    let payload: Value =
        serde_json::from_str(inner).map_err(|e| DocumentError::MalformedResponse {
            reason: format!("Model output is not JSON: {e}"),
            raw: inner.to_string(),
        })?;

    let mut map = match payload {
        Value::Object(map) => map,
        other => {
            return Err(DocumentError::MalformedResponse {
                reason: format!("Model output is {}, expected a JSON object", kind_of(&other)),
                raw: inner.to_string(),
            })
        }
    };

    let mut warnings = Vec::new();
    let issuer = match map.remove("issuer") {
        None => Some(check_issuer(UNKNOWN_ISSUER, source_text, &mut warnings)),
        Some(Value::Null) => None,
        Some(Value::String(s)) => Some(check_issuer(&s, source_text, &mut warnings)),
        Some(other) => {
            return Err(DocumentError::MalformedResponse {
                reason: format!("'issuer' is {}, expected a string", kind_of(&other)),
                raw: inner.to_string(),
            })
        }
    };

    let fields = StatementFields {
        issuer,
        account_last_4: take(&mut map, "account_last_4"),
        statement_date: take(&mut map, "statement_date"),
        due_date: take(&mut map, "due_date"),
        total_balance: take(&mut map, "total_balance"),
        extra: map.into_iter().collect(),
    };
    debug!("Validated response: {} extra keys", fields.extra.len());

    Ok(Validated { fields, warnings })
}

/// Apply the issuer plausibility rule, returning the value to keep.
///
/// An empty issuer is kept unchecked.
pub fn check_issuer(
    issuer: &str,
    source_text: &str,
    warnings: &mut Vec<ValidationWarning>,
) -> String {
    if issuer.is_empty()
        || source_text.contains(issuer)
        || ISSUER_HINTS.iter().any(|hint| issuer.contains(hint))
    {
        return issuer.to_string();
    }

    warn!("Issuer '{}' not found in statement text", issuer);
    warnings.push(ValidationWarning::IssuerNotInText {
        claimed: issuer.to_string(),
    });
    ISSUER_SENTINEL.to_string()
}

fn take(map: &mut Map<String, Value>, key: &str) -> Value {
    map.remove(key).unwrap_or(Value::Null)
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
