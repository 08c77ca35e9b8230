use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Document, Editor};

pub const DOCUMENT_SCHEMA: &str = "inkpress-plate";
pub const DOCUMENT_VERSION: u32 = 1;

fn default_schema() -> String {
    DOCUMENT_SCHEMA.to_string()
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

#[derive(Debug, Error)]
pub enum ValueError {
    #[error("invalid document json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported document schema {0:?}")]
    Schema(String),
    #[error("unsupported document version {found}")]
    Version { found: u32 },
}

/// Envelope a document is stored and exchanged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateValue {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub document: Document,
}

impl PlateValue {
    pub fn from_document(document: Document) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            document,
        }
    }

    pub fn from_editor(editor: &Editor) -> Self {
        Self::from_document(editor.doc().clone())
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn to_json_pretty(&self) -> Result<String, ValueError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses an envelope, rejecting foreign schemas and versions newer than this build.
    pub fn from_json_str(s: &str) -> Result<Self, ValueError> {
        let value: Self = serde_json::from_str(s)?;
        if value.schema != DOCUMENT_SCHEMA {
            return Err(ValueError::Schema(value.schema));
        }
        if value.version > DOCUMENT_VERSION {
            return Err(ValueError::Version {
                found: value.version,
            });
        }
        Ok(value)
    }
}
