//! Stored form of a document.
//!
//! Documents are written as a versioned envelope and read back from either the
//! envelope or a bare list of top-level nodes, which is what hand-written
//! fixtures usually look like.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::core::{Document, Editor, Node};

pub const SCHEMA: &str = "plate-view";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum ValueError {
    #[error("malformed document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown document schema `{0}`")]
    UnknownSchema(String),

    #[error("document version {found} is newer than supported version {SCHEMA_VERSION}")]
    UnsupportedVersion { found: u32 },

    #[error("expected a document envelope or a node list, found {0}")]
    UnexpectedShape(&'static str),
}

#[derive(Serialize, Deserialize)]
struct Envelope<D> {
    schema: String,
    version: u32,
    document: D,
}

/// Parses a stored document.
pub fn document_from_json(s: &str) -> Result<Document, ValueError> {
    match serde_json::from_str::<Value>(s)? {
        Value::Array(_) => {
            let children: Vec<Node> = serde_json::from_str(s)?;
            Ok(Document { children })
        }
        Value::Object(_) => {
            let envelope: Envelope<Document> = serde_json::from_str(s)?;
            if envelope.schema != SCHEMA {
                return Err(ValueError::UnknownSchema(envelope.schema));
            }
            if envelope.version > SCHEMA_VERSION {
                return Err(ValueError::UnsupportedVersion {
                    found: envelope.version,
                });
            }
            Ok(envelope.document)
        }
        Value::Null => Err(ValueError::UnexpectedShape("null")),
        Value::Bool(_) => Err(ValueError::UnexpectedShape("a boolean")),
        Value::Number(_) => Err(ValueError::UnexpectedShape("a number")),
        Value::String(_) => Err(ValueError::UnexpectedShape("a string")),
    }
}

/// Writes `doc` as a pretty-printed envelope of the current version.
pub fn document_to_json(doc: &Document) -> Result<String, ValueError> {
    let envelope = Envelope {
        schema: SCHEMA.to_string(),
        version: SCHEMA_VERSION,
        document: doc,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

impl Editor {
    pub fn from_json(s: &str) -> Result<Self, ValueError> {
        document_from_json(s).map(Editor::new)
    }

    pub fn to_json(&self) -> Result<String, ValueError> {
        document_to_json(self.doc())
    }
}
