//! Validate serialized expressions

use super::{load_schema, CliError};
use crate::ast::Ast;
use crate::datatype::DataType;

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Serialized expression
    pub input: Option<String>,
    /// Schema definition the field references are resolved against
    pub schema: Option<String>,
    /// Required type of the expression
    pub expected: Option<DataType>,
}

/// Result of a check operation
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// The expression is valid and has this type
    Valid(DataType),
    /// The expression is invalid, with the diagnostic of the node that
    /// caused it
    Invalid(String),
}

/// Execute a vsql check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let input = options.input.as_deref().ok_or(CliError::NoInput)?;
    let schema = load_schema(options.schema.as_deref())?;
    let ast = Ast::from_json(input, schema.vars())?;

    let checked = match options.expected {
        Some(expected) => ast.check_datatype(expected),
        None => ast.check(),
    };
    match (checked, ast.datatype()) {
        (Ok(()), Some(datatype)) => Ok(CheckResult::Valid(datatype)),
        (Ok(()), None) => Ok(CheckResult::Invalid(format!("Type of `{}` is unknown", ast.source()))),
        (Err(e), _) => Ok(CheckResult::Invalid(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(input: &str, expected: Option<DataType>) -> CheckResult {
        let options = CheckOptions {
            input: Some(input.to_string()),
            schema: None,
            expected,
        };
        execute_check(&options).unwrap()
    }

    #[test]
    fn test_valid() {
        let input = r#"{"nodetype": "binop_add", "children": [
            {"nodetype": "const_int", "value": "1"},
            {"nodetype": "const_number", "value": "2.5"}
        ]}"#;
        assert_eq!(check(input, None), CheckResult::Valid(DataType::Number));
    }

    #[test]
    fn test_invalid() {
        let input = r#"{"nodetype": "binop_add", "children": [
            {"nodetype": "const_int", "value": "1"},
            {"nodetype": "const_str", "value": "x"}
        ]}"#;
        assert_eq!(
            check(input, None),
            CheckResult::Invalid("Addition `1 + 'x'` uses unsupported types of operands: INT + STR".to_string())
        );
    }

    #[test]
    fn test_expected_type() {
        let input = r#"{"nodetype": "const_int", "value": "1"}"#;
        assert_eq!(check(input, Some(DataType::Int)), CheckResult::Valid(DataType::Int));
        assert!(matches!(check(input, Some(DataType::Bool)), CheckResult::Invalid(_)));
    }

    #[test]
    fn test_no_input() {
        let result = execute_check(&CheckOptions::default());
        assert!(matches!(result, Err(CliError::NoInput)));
    }
}
