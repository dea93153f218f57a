use thiserror::Error;

use crate::enums::FieldKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ModelError {
    #[error("invalid field name: {0:?}")]
    InvalidFieldName(String),
    #[error("invalid conditional id: {0:?}")]
    InvalidConditionalId(String),
    #[error("unknown field type: {0}")]
    UnknownFieldKind(String),
    #[error("field '{field}' of type {kind} cannot hold a list value")]
    ValueShape { field: String, kind: FieldKind },
}

pub type Result<T> = std::result::Result<T, ModelError>;
