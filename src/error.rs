//! Validation diagnostics and the error type of the crate.
//!
//! Validation never fails loudly: a node that doesn't type check records an
//! [`ErrorKind`] and keeps going. Only when SQL is requested from such a
//! node does the kind become a [`VsqlError`], carrying the formatted
//! diagnostic of the node that caused the problem.

use std::fmt;

use thiserror::Error;

use crate::ast::Ast;
use crate::datatype::DataType;

/// Why a node failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A child node is invalid
    SubnodeError,
    /// The node doesn't support this number of operands
    Arity,
    /// No rule for this combination of operand types
    SubnodeTypes,
    /// A field reference can't be resolved
    Field,
    ConstBool,
    ConstInt,
    ConstNumber,
    ConstDate,
    ConstDateTime,
    ConstColor,
    /// Unknown attribute, function or method name
    Name,
    ListTypeUnknown,
    ListMixedTypes,
    ListUnsupportedTypes,
    SetTypeUnknown,
    SetMixedTypes,
    SetUnsupportedTypes,
    /// The node was required to have a specific type
    DataType(DataType),
}

impl ErrorKind {
    /// Formats the diagnostic for `ast`, which must be the node carrying
    /// this error.
    pub fn message(&self, ast: &Ast) -> String {
        let desc = ast.description();
        let source = ast.source();
        match self {
            ErrorKind::SubnodeError => {
                format!("Subexpressions of {} `{}` have errors", lower_first(desc), source)
            }
            ErrorKind::Arity => format!(
                "{} `{}` uses unsupported number of operands: {}",
                desc,
                source,
                ast.arity()
            ),
            ErrorKind::SubnodeTypes => format!(
                "{} `{}` uses unsupported types of operands: {}",
                desc,
                source,
                ast.type_signature()
            ),
            ErrorKind::Field => format!("Field unknown in {} `{}`", lower_first(desc), source),
            ErrorKind::ConstBool
            | ErrorKind::ConstInt
            | ErrorKind::ConstNumber
            | ErrorKind::ConstDate
            | ErrorKind::ConstDateTime
            | ErrorKind::ConstColor => format!("Malformed {} `{}`", lower_first(desc), source),
            ErrorKind::Name => format!(
                "Unknown attribute/function/method name in {} `{}`",
                lower_first(desc),
                source
            ),
            ErrorKind::ListTypeUnknown => format!(
                "List type can't be determined in {} `{}`: {}",
                lower_first(desc),
                source,
                ast.type_signature()
            ),
            ErrorKind::ListMixedTypes => format!(
                "List contains incompatible types in {} `{}`: {}",
                lower_first(desc),
                source,
                ast.type_signature()
            ),
            ErrorKind::ListUnsupportedTypes => format!(
                "List contains unsupported types in {} `{}`: {}",
                lower_first(desc),
                source,
                ast.type_signature()
            ),
            ErrorKind::SetTypeUnknown => format!(
                "Set type can't be determined in {} `{}`: {}",
                lower_first(desc),
                source,
                ast.type_signature()
            ),
            ErrorKind::SetMixedTypes => format!(
                "Set contains incompatible types in {} `{}`: {}",
                lower_first(desc),
                source,
                ast.type_signature()
            ),
            ErrorKind::SetUnsupportedTypes => format!(
                "Set contains unsupported types in {} `{}`: {}",
                lower_first(desc),
                source,
                ast.type_signature()
            ),
            ErrorKind::DataType(expected) => format!(
                "{} `{}` should be of type `{}` but is `{}`",
                desc,
                source,
                expected.signature_name(),
                ast.datatype().map(|dt| dt.signature_name()).unwrap_or_else(|| "?".to_string())
            ),
        }
    }

    /// Converts the diagnostic into the error raised when rendering `ast`.
    ///
    /// Unsupported operand types and unknown fields get their own
    /// variants; every other kind is [`VsqlError::Invalid`].
    pub fn to_error(&self, ast: &Ast) -> VsqlError {
        let message = self.message(ast);
        match self {
            ErrorKind::SubnodeTypes => VsqlError::UnsupportedOperation(message),
            ErrorKind::Field => VsqlError::FieldUnknown(message),
            _ => VsqlError::Invalid(message),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::SubnodeError => "subnodeerror",
            ErrorKind::Arity => "arity",
            ErrorKind::SubnodeTypes => "subnodetypes",
            ErrorKind::Field => "field",
            ErrorKind::ConstBool => "const_bool",
            ErrorKind::ConstInt => "const_int",
            ErrorKind::ConstNumber => "const_number",
            ErrorKind::ConstDate => "const_date",
            ErrorKind::ConstDateTime => "const_datetime",
            ErrorKind::ConstColor => "const_color",
            ErrorKind::Name => "name",
            ErrorKind::ListTypeUnknown => "listtypeunknown",
            ErrorKind::ListMixedTypes => "listmixedtypes",
            ErrorKind::ListUnsupportedTypes => "listunsupportedtypes",
            ErrorKind::SetTypeUnknown => "settypeunknown",
            ErrorKind::SetMixedTypes => "setmixedtypes",
            ErrorKind::SetUnsupportedTypes => "setunsupportedtypes",
            ErrorKind::DataType(dt) => return write!(f, "datatype_{}", dt.name()),
        };
        f.write_str(name)
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Errors produced while rendering expressions or assembling queries.
#[derive(Debug, Error)]
pub enum VsqlError {
    /// An operator was applied to operand types it doesn't support
    #[error("{0}")]
    UnsupportedOperation(String),

    /// A field reference or variable name is unknown
    #[error("{0}")]
    FieldUnknown(String),

    /// Any other invalid expression
    #[error("{0}")]
    Invalid(String),

    /// An aggregate expression isn't one of the supported calls
    #[error("{0}")]
    Aggregation(String),

    /// Aggregated and non-aggregated select expressions were combined
    #[error("Can't mix aggregated and non-aggregated expressions in one query")]
    MixedAggregation,

    /// A host value can't represent the requested type
    #[error("Can't conform {value} to type `{datatype}`")]
    Conform { datatype: DataType, value: String },

    /// A serialized expression or query is malformed
    #[error("Load error: {0}")]
    Load(String),

    /// A schema definition is malformed
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_first() {
        assert_eq!(lower_first("Field reference"), "field reference");
        assert_eq!(lower_first(""), "");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::SubnodeTypes.to_string(), "subnodetypes");
        assert_eq!(ErrorKind::ConstDateTime.to_string(), "const_datetime");
        assert_eq!(ErrorKind::DataType(DataType::IntList).to_string(), "datatype_intlist");
    }
}
