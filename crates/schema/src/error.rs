use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to parse schema: {0}")]
    Parse(#[from] parser::Error),

    #[error("Type '{type_name}' definition conflicted.")]
    DefinitionConflicted { type_name: String },

    #[error("Cannot extend unknown type '{type_name}'.")]
    ExtendUnknownType { type_name: String },

    #[error("Field '{type_name}.{field_name}' definition conflicted.")]
    FieldConflicted {
        type_name: String,
        field_name: String,
    },
}
