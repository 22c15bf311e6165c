// Schema descriptor and record types.
//
// A `Record` is one input row: a stable index plus an ordered map of field
// name to scalar value. The `Schema` names which fields hold free text and
// which hold structured attributes (age, household size, a 1-5 rating...).

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Warning};

/// A single scalar cell from an input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Null,
}

impl FieldValue {
    /// Interpret a raw cell: blank is `Null`, anything that parses as a
    /// float is `Number`, the rest is `Text`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return FieldValue::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => FieldValue::Number(n),
            _ => FieldValue::Text(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The value as it would read in a free-text column. Numbers are
    /// rendered back to their shortest decimal form, so an answer of "10"
    /// that parsed as a number is kept as "10".
    pub fn to_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            FieldValue::Number(n) => Some(Cow::Owned(n.to_string())),
            FieldValue::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// One respondent row as delivered by the input collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub index: usize,
    pub fields: IndexMap<String, FieldValue>,
}

impl Record {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field insertion, mostly for tests and small inputs.
    pub fn with(mut self, name: &str, value: FieldValue) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// Which fields are free text and which are structured attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    pub text_fields: Vec<String>,
    pub attribute_fields: Vec<String>,
}

impl Schema {
    pub fn new<S: Into<String>>(text_fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            text_fields: text_fields.into_iter().map(Into::into).collect(),
            attribute_fields: Vec::new(),
        }
    }

    pub fn with_attributes<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.attribute_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Check every record against the schema once.
    ///
    /// A text field absent from *every* record is fatal (`InputShape`). A field
    /// absent from only some records, and any missing attribute field, yields
    /// one `MissingField` warning per field; callers fall back to empty text
    /// or skip the attribute.
    pub fn validate(&self, records: &[Record]) -> Result<Vec<Warning>, PipelineError> {
        if self.text_fields.is_empty() {
            return Err(PipelineError::invalid(
                "schema must name at least one free-text field",
            ));
        }

        let mut missing_everywhere = Vec::new();
        let mut warnings = Vec::new();

        for field in &self.text_fields {
            let absent = count_absent(records, field);
            if !records.is_empty() && absent == records.len() {
                missing_everywhere.push(field.clone());
            } else if absent > 0 {
                warnings.push(Warning::MissingField {
                    field: field.clone(),
                    records: absent,
                });
            }
        }

        if !missing_everywhere.is_empty() {
            return Err(PipelineError::InputShape {
                missing: missing_everywhere,
            });
        }

        for field in &self.attribute_fields {
            let absent = count_absent(records, field);
            if absent > 0 {
                warnings.push(Warning::MissingField {
                    field: field.clone(),
                    records: absent,
                });
            }
        }

        Ok(warnings)
    }
}

fn count_absent(records: &[Record], field: &str) -> usize {
    records.iter().filter(|r| r.get(field).is_none()).count()
}
