//! Native attribute encoding used by the table's change log.
//!
//! Every attribute arrives as a single-key object whose key is a type tag:
//!
//! | Tag | Plain form |
//! |-----|------------|
//! | `S` | string |
//! | `N` | number (decimal text on the wire) |
//! | `B` | base64 text, passed through untouched |
//! | `BOOL` | bool |
//! | `NULL` | null |
//! | `M` | object |
//! | `L` | array |
//! | `SS` / `NS` / `BS` | array of the member's plain form |

use crate::error::AttributeError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};
use std::collections::BTreeMap;

/// A row image in the storage layer's native encoding (attribute name to tagged value).
pub type NativeImage = Map<String, Value>;

/// A row as plain JSON (attribute name to untagged value).
pub type PlainRow = Map<String, Value>;

/// One tagged attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    #[serde(rename = "S")]
    String(String),
    #[serde(rename = "N")]
    Number(String),
    #[serde(rename = "B")]
    Binary(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "M")]
    Map(BTreeMap<String, AttributeValue>),
    #[serde(rename = "L")]
    List(Vec<AttributeValue>),
    #[serde(rename = "SS")]
    StringSet(Vec<String>),
    #[serde(rename = "NS")]
    NumberSet(Vec<String>),
    #[serde(rename = "BS")]
    BinarySet(Vec<String>),
}

impl AttributeValue {
    /// Decodes one raw attribute. `path` is only used for error reporting.
    pub fn from_native(path: &str, raw: &Value) -> Result<Self, AttributeError> {
        Self::deserialize(raw).map_err(|e| AttributeError::Malformed {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Converts this attribute into its plain JSON form.
    pub fn to_plain(&self, path: &str) -> Result<Value, AttributeError> {
        Ok(match self {
            Self::String(s) | Self::Binary(s) => Value::String(s.clone()),
            Self::Number(text) => Value::Number(parse_number(path, text)?),
            Self::Bool(b) => Value::Bool(*b),
            Self::Null(_) => Value::Null,
            Self::Map(entries) => {
                let mut out = Map::with_capacity(entries.len());
                for (key, value) in entries {
                    out.insert(key.clone(), value.to_plain(&format!("{path}.{key}"))?);
                }
                Value::Object(out)
            }
            Self::List(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| item.to_plain(&format!("{path}[{i}]")))
                    .collect::<Result<_, _>>()?,
            ),
            Self::StringSet(items) | Self::BinarySet(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            Self::NumberSet(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, text)| parse_number(&format!("{path}[{i}]"), text).map(Value::Number))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Renders this attribute back into its tagged wire form.
    pub fn to_native(&self) -> Value {
        match self {
            Self::String(s) => json!({ "S": s }),
            Self::Number(n) => json!({ "N": n }),
            Self::Binary(b) => json!({ "B": b }),
            Self::Bool(b) => json!({ "BOOL": b }),
            Self::Null(n) => json!({ "NULL": n }),
            Self::Map(entries) => {
                let inner: Map<String, Value> = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_native()))
                    .collect();
                json!({ "M": inner })
            }
            Self::List(items) => {
                json!({ "L": items.iter().map(Self::to_native).collect::<Vec<_>>() })
            }
            Self::StringSet(items) => json!({ "SS": items }),
            Self::NumberSet(items) => json!({ "NS": items }),
            Self::BinarySet(items) => json!({ "BS": items }),
        }
    }

    /// Encodes a plain JSON value. Arrays always become `L`, never a set.
    pub fn from_plain(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null(true),
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.to_string()),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_plain).collect()),
            Value::Object(entries) => Self::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_plain(v)))
                    .collect(),
            ),
        }
    }
}

fn parse_number(path: &str, text: &str) -> Result<Number, AttributeError> {
    serde_json::from_str::<Number>(text.trim()).map_err(|_| AttributeError::InvalidNumber {
        path: path.to_string(),
        value: text.to_string(),
    })
}

/// Decodes a native-encoded row image into a plain JSON map.
///
/// Fails on the first attribute that is not a well-formed tagged value.
pub fn unmarshall(image: &NativeImage) -> Result<PlainRow, AttributeError> {
    image
        .iter()
        .map(|(name, raw)| {
            let plain = AttributeValue::from_native(name, raw)?.to_plain(name)?;
            Ok::<_, AttributeError>((name.clone(), plain))
        })
        .collect()
}

/// Path reported when the image itself is not an attribute map.
pub const IMAGE_PATH: &str = "NewImage";

/// Decodes a raw row image as it arrives on a change record.
///
/// Anything other than a JSON object is reported as
/// [`AttributeError::Malformed`] at [`IMAGE_PATH`].
pub fn unmarshall_value(image: &Value) -> Result<PlainRow, AttributeError> {
    match image {
        Value::Object(map) => unmarshall(map),
        other => Err(AttributeError::Malformed {
            path: IMAGE_PATH.to_string(),
            reason: format!("expected a map of attributes, found {}", json_kind(other)),
        }),
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

/// Encodes a plain JSON map into the native row encoding.
///
/// `unmarshall(&marshall(row))` yields `row` for every plain map.
pub fn marshall(row: &PlainRow) -> NativeImage {
    row.iter()
        .map(|(name, value)| (name.clone(), AttributeValue::from_plain(value).to_native()))
        .collect()
}
