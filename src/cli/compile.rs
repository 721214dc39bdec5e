//! Compile query descriptions into SQL

use serde::Deserialize;

use super::{load_schema, CliError};
use crate::ast::{Ast, Dump};
use crate::query::{Direction, Nulls, Query};
use crate::schema::Vars;

/// Options for the compile command
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// JSON query description
    pub input: Option<String>,
    /// Schema definition the field references are resolved against
    pub schema: Option<String>,
    /// Indentation level of the output
    pub indent: usize,
}

/// An expression with an optional comment and alias.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExprEntry {
    pub expr: Dump,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderEntry {
    pub expr: Dump,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub nulls: Option<Nulls>,
}

/// A query as read by `vsql compile`.
///
/// `from` lists variables whose tables are selected from even when no
/// expression references them. Expressions are serialized trees.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryDescription {
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub from: Vec<String>,
    #[serde(default)]
    pub select: Vec<ExprEntry>,
    #[serde(default)]
    pub aggregate: Vec<ExprEntry>,
    #[serde(default, rename = "where")]
    pub wheres: Vec<ExprEntry>,
    #[serde(default)]
    pub group_by: Vec<ExprEntry>,
    #[serde(default)]
    pub order_by: Vec<OrderEntry>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl QueryDescription {
    /// Builds the query, resolving field references against `vars`.
    pub fn build(&self, vars: &Vars) -> Result<Query, CliError> {
        let mut query = Query::new(self.comment.as_deref(), vars.clone());

        for identifier in &self.from {
            query.from_vsql(identifier)?;
        }
        for entry in &self.select {
            let ast = Ast::load(&entry.expr, vars)?;
            query.select_vsql(&ast, entry.comment.as_deref(), entry.alias.as_deref())?;
        }
        for entry in &self.aggregate {
            let ast = Ast::load(&entry.expr, vars)?;
            query.aggregate_vsql(&ast, entry.comment.as_deref(), entry.alias.as_deref())?;
        }
        for entry in &self.group_by {
            let ast = Ast::load(&entry.expr, vars)?;
            query.group_by_vsql(&ast, entry.comment.as_deref())?;
        }
        for entry in &self.wheres {
            let ast = Ast::load(&entry.expr, vars)?;
            query.where_vsql(&ast, entry.comment.as_deref())?;
        }
        for entry in &self.order_by {
            let ast = Ast::load(&entry.expr, vars)?;
            query.order_by_vsql(&ast, entry.comment.as_deref(), entry.direction, entry.nulls)?;
        }
        if let Some(offset) = self.offset {
            query.offset(offset);
        }
        if let Some(limit) = self.limit {
            query.limit(limit);
        }
        Ok(query)
    }
}

/// Execute a vsql compile operation
pub fn execute_compile(options: &CompileOptions) -> Result<String, CliError> {
    let input = options.input.as_deref().ok_or(CliError::NoInput)?;
    let schema = load_schema(options.schema.as_deref())?;
    let description: QueryDescription = serde_json::from_str(input)?;
    tracing::debug!(
        select = description.select.len(),
        aggregate = description.aggregate.len(),
        wheres = description.wheres.len(),
        "compiling query"
    );
    let query = description.build(schema.vars())?;
    Ok(query.sql_indented(options.indent))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(input: &str) -> Result<String, CliError> {
        execute_compile(&CompileOptions {
            input: Some(input.to_string()),
            ..CompileOptions::default()
        })
    }

    #[test]
    fn test_constant_select() {
        let sql = compile(r#"{"select": [{"expr": {"nodetype": "const_int", "value": "42"}, "alias": "answer"}]}"#).unwrap();
        assert_eq!(sql, "select\n\t42 /* 42 */ as answer\nfrom\n\tdual\n");
    }

    #[test]
    fn test_unknown_key() {
        assert!(matches!(compile(r#"{"having": []}"#), Err(CliError::Json(_))));
    }

    #[test]
    fn test_unknown_from_variable() {
        let err = compile(r#"{"from": ["nobody"]}"#).unwrap_err();
        assert_eq!(err.to_string(), "Field `nobody` unknown!");
    }
}
