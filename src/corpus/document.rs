// Documents and the corpus they belong to.
//
// A `Document` is created once from a validated record and never mutated.
// Later stages return their own derived bundles keyed by document position
// rather than writing into the document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::schema::{FieldValue, Record, Schema};
use crate::error::{PipelineError, Warning};

/// One respondent: combined free text plus structured attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable index carried over from the input record
    pub index: usize,
    /// All text fields of the record, joined by newlines in schema order
    pub text: String,
    /// Structured attributes in schema order (`Null` when absent)
    pub attributes: IndexMap<String, FieldValue>,
}

impl Document {
    /// Numeric value of an attribute, if present and numeric.
    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).and_then(FieldValue::as_number)
    }
}

/// Ordered collection of documents sharing one schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corpus {
    pub schema: Schema,
    pub documents: Vec<Document>,
}

impl Corpus {
    /// Validate records against the schema and build the corpus.
    ///
    /// Returns the schema warnings alongside the corpus so they can be
    /// attached to the final report.
    pub fn from_records(
        schema: Schema,
        records: &[Record],
    ) -> Result<(Self, Vec<Warning>), PipelineError> {
        let warnings = schema.validate(records)?;

        let documents = records
            .iter()
            .map(|record| {
                let text = schema
                    .text_fields
                    .iter()
                    .filter_map(|f| record.get(f).and_then(FieldValue::to_text))
                    .filter(|t| !t.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");

                let attributes = schema
                    .attribute_fields
                    .iter()
                    .map(|f| {
                        let value = record.get(f).cloned().unwrap_or(FieldValue::Null);
                        (f.clone(), value)
                    })
                    .collect();

                Document {
                    index: record.index,
                    text,
                    attributes,
                }
            })
            .collect();

        Ok((Self { schema, documents }, warnings))
    }

    /// Build a text-only corpus, one document per string. Handy for tests and
    /// for callers that have no structured attributes.
    pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Self {
        let documents = texts
            .iter()
            .enumerate()
            .map(|(index, t)| Document {
                index,
                text: t.as_ref().to_string(),
                attributes: IndexMap::new(),
            })
            .collect();
        Self {
            schema: Schema::new(["text"]),
            documents,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.text.as_str())
    }
}
