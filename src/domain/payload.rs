//! Raw provider payloads
//!
//! Provider responses are decoded once, according to the provider's
//! declared format, into a `RawPayload`. Everything downstream (address
//! extraction, normalization) works on this sum type instead of on
//! ad-hoc dictionaries.

use crate::domain::errors::ProviderError;
use crate::domain::value_objects::{PublicAddress, ResponseFormat};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A provider response body, decoded by format.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// Top-level JSON object
    Json(Map<String, Value>),
    /// Trimmed text body
    PlainText(String),
    /// `key=value` lines
    Trace(BTreeMap<String, String>),
}

impl RawPayload {
    /// Decode a body according to the provider's format tag.
    pub fn parse(format: ResponseFormat, body: &str) -> Result<Self, ProviderError> {
        match format {
            ResponseFormat::Json => match serde_json::from_str::<Value>(body) {
                Ok(Value::Object(map)) => Ok(RawPayload::Json(map)),
                Ok(other) => Err(ProviderError::Malformed(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                ))),
                Err(e) => Err(ProviderError::Malformed(format!("invalid JSON: {}", e))),
            },
            ResponseFormat::PlainText => {
                let text = body.trim();
                if text.is_empty() {
                    Err(ProviderError::Malformed("empty body".to_string()))
                } else {
                    Ok(RawPayload::PlainText(text.to_string()))
                }
            }
            ResponseFormat::StructuredTrace => {
                let fields: BTreeMap<String, String> = body
                    .lines()
                    .filter_map(|line| line.split_once('='))
                    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                    .filter(|(k, _)| !k.is_empty())
                    .collect();
                if fields.is_empty() {
                    Err(ProviderError::Malformed("no key=value lines".to_string()))
                } else {
                    Ok(RawPayload::Trace(fields))
                }
            }
        }
    }

    /// Look up a field as a non-empty string.
    ///
    /// JSON numbers are rendered in their textual form; other non-string
    /// JSON values and plain-text payloads never match.
    pub fn field(&self, name: &str) -> Option<String> {
        let value = match self {
            RawPayload::Json(map) => match map.get(name)? {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            },
            RawPayload::Trace(fields) => fields.get(name)?.clone(),
            RawPayload::PlainText(_) => return None,
        };

        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Extract and validate the caller's address.
    ///
    /// JSON providers report it under `ip` or `query`, trace providers
    /// under `ip`, and plain-text providers return it as the whole body.
    pub fn address(&self) -> Result<PublicAddress, ProviderError> {
        let candidate = match self {
            RawPayload::Json(_) => self.field("ip").or_else(|| self.field("query")),
            RawPayload::Trace(_) => self.field("ip"),
            RawPayload::PlainText(text) => Some(text.clone()),
        }
        .ok_or_else(|| ProviderError::Malformed("no address field".to_string()))?;

        PublicAddress::parse(&candidate).ok_or_else(|| {
            ProviderError::Malformed(format!("not an IP address: {:?}", truncate(&candidate)))
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn truncate(s: &str) -> String {
    s.chars().take(64).collect()
}
