//! Error types for markup scanning.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while scanning form markup.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MarkupError {
    /// Markup file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Markup is not well-formed.
    #[error("XML parse error at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// An attribute could not be decoded.
    #[error("bad attribute at byte {position}: {message}")]
    Attribute { position: u64, message: String },

    /// A name or id attribute is present but blank.
    #[error(transparent)]
    Model(#[from] formbar_model::ModelError),

    /// A conditional or computed element has no `expr` attribute.
    #[error("element '{element}' at byte {position} has no expr attribute")]
    MissingExpr { element: String, position: u64 },

    /// Two conditionals share the same id.
    #[error("duplicate conditional id: {0}")]
    DuplicateConditional(String),
}

pub type Result<T> = std::result::Result<T, MarkupError>;
