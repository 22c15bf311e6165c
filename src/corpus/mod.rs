// Corpus ingestion: schema descriptor, typed field values, documents.
//
// Input arrives as rows of named fields. The caller says which fields are
// free text and which are structured attributes; the schema is validated
// once here, before any stage runs.

pub mod document;
pub mod schema;

pub use document::{Corpus, Document};
pub use schema::{FieldValue, Record, Schema};
