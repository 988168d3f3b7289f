//! Raw survey records and their encoding into model-ready vectors.
//!
//! Encoding is a pure function of the record and the declared field table:
//! flags become 1/0 under the affirmative-label predicate, categorical
//! answers become one-hot indicator groups, numeric answers pass through
//! unchanged. An answer that matches nothing encodes as zero by design
//! (the form's "Selecione" placeholder depends on it); it is never an
//! error. The output order is the field-table order, which is exactly the
//! schema order the trained model expects.

use crate::fields::{FIELDS, Field, FieldKind};
use ndarray::Array1;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// One raw answer from the form. Numeric inputs arrive as numbers,
/// selector inputs as text labels; a field the user never touched is
/// `Unset`.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Unset,
    Text(String),
    Number(f64),
}

/// A single user interaction's worth of answers, keyed by field name.
/// Created fresh per request and discarded after encoding.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    values: HashMap<String, RawValue>,
}

/// Errors from reading a record file. These abort the request, unlike
/// unrecognized answer values, which are part of the encoding contract.
#[derive(Error, Debug)]
pub enum RecordParseError {
    #[error("Failed to read record file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML record file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error(
        "Record field '{field}' holds a {found}; answers must be text labels or numbers (write flags as \"Sim\"/\"Não\")."
    )]
    UnsupportedValue { field: String, found: &'static str },
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: impl Into<String>, value: RawValue) {
        self.values.insert(field.into(), value);
    }

    /// Looks up an answer; absent fields read as `Unset`.
    pub fn get(&self, field: &str) -> &RawValue {
        self.values.get(field).unwrap_or(&RawValue::Unset)
    }

    /// Parses a record from a TOML document (one `key = answer` pair per
    /// form field). Keys the field table does not know, such as the form's
    /// reference date, are carried along and simply never encoded.
    pub fn from_toml_str(text: &str) -> Result<Self, RecordParseError> {
        let table: toml::Table = text.parse()?;
        let mut record = RawRecord::new();
        for (key, value) in table {
            let raw = match value {
                toml::Value::String(s) => RawValue::Text(s),
                toml::Value::Integer(i) => RawValue::Number(i as f64),
                toml::Value::Float(f) => RawValue::Number(f),
                // The form's date input serializes as a TOML datetime; it
                // is not part of the feature space, so the label form is
                // enough.
                toml::Value::Datetime(d) => RawValue::Text(d.to_string()),
                toml::Value::Boolean(_) => {
                    return Err(RecordParseError::UnsupportedValue {
                        field: key,
                        found: "boolean",
                    });
                }
                toml::Value::Array(_) => {
                    return Err(RecordParseError::UnsupportedValue {
                        field: key,
                        found: "array",
                    });
                }
                toml::Value::Table(_) => {
                    return Err(RecordParseError::UnsupportedValue {
                        field: key,
                        found: "table",
                    });
                }
            };
            record.set(key, raw);
        }
        Ok(record)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, RecordParseError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

/// Deterministically transforms a `RawRecord` into the fixed-width vector
/// the model was trained on.
#[derive(Debug, Clone, Copy)]
pub struct RecordEncoder {
    fields: &'static [Field],
}

impl Default for RecordEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordEncoder {
    pub fn new() -> Self {
        RecordEncoder { fields: FIELDS }
    }

    /// Encodes a record. The result always has the declared schema width;
    /// position `i` corresponds to schema column `i`.
    pub fn encode(&self, record: &RawRecord) -> Array1<f64> {
        let width = self.fields.iter().map(Field::width).sum();
        let mut out = Vec::with_capacity(width);
        for field in self.fields {
            match field.kind {
                FieldKind::Flag { affirmative, .. } => {
                    let set = matches!(record.get(field.name), RawValue::Text(t) if t == affirmative);
                    out.push(if set { 1.0 } else { 0.0 });
                }
                FieldKind::Numeric { .. } => {
                    let value = match record.get(field.name) {
                        RawValue::Number(v) => *v,
                        // Unset and non-numeric answers become the NaN
                        // sentinel; 0 is a real answer for every numeric
                        // field here, so it cannot double as "missing".
                        _ => f64::NAN,
                    };
                    out.push(value);
                }
                FieldKind::Categorical { values } => {
                    let answer = record.get(field.name);
                    let mut matched = false;
                    for value in values {
                        let hit = matches!(answer, RawValue::Text(t) if t == value.label);
                        matched |= hit;
                        out.push(if hit { 1.0 } else { 0.0 });
                    }
                    if !matched {
                        log::debug!(
                            "field '{}' has no recognized answer; its indicator group encodes as all zeros",
                            field.name
                        );
                    }
                }
            }
        }
        Array1::from_vec(out)
    }
}
