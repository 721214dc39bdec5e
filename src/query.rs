//! Assembling `select` statements from SQL and vSQL expressions.
//!
//! A [`Query`] collects the clauses of a statement. Every clause can be
//! given as literal SQL (the `*_sql` methods) or as a vSQL expression (the
//! `*_vsql` methods). Rendering a vSQL expression registers the field
//! references it contains: each path like `p.dept.name` needs the tables
//! for `p` and `p.dept` in the `from` clause and their join conditions in
//! the `where` clause. Registration is memoized per path, so every table is
//! joined once however often it is referenced.
//!
//! ```
//! use std::sync::Arc;
//! use vsql::{Ast, DataType, Field, Group, Query, Vars};
//!
//! let mut dept = Group::new(Some("dept"));
//! dept.add_field(Field::new("name", DataType::Str, "{a}.name"));
//! let mut vars = Vars::new();
//! vars.insert(
//!     "d".to_string(),
//!     Arc::new(Field::new("d", DataType::Int, "d_id").with_ref(Some("{d}.id = d_id"), Arc::new(dept))),
//! );
//!
//! let mut query = Query::new(None, vars.clone());
//! query.select_vsql(&Ast::field(&vars, "d.name"), None, Some("name")).unwrap();
//! assert_eq!(
//!     query.sql(),
//!     "select\n\tt1.name /* d.name */ as name\nfrom\n\tdept /* d */ t1\nwhere\n\tt1.id = d_id /* d */\n"
//! );
//! ```

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::ast::{Ast, FieldRef, Node};
use crate::datatype::{Aggregate, DataType};
use crate::error::VsqlError;
use crate::schema::Vars;

/// Sort direction of an `order by` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// Position of nulls in an `order by` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nulls {
    First,
    Last,
}

impl Nulls {
    fn keyword(self) -> &'static str {
        match self {
            Nulls::First => "nulls first",
            Nulls::Last => "nulls last",
        }
    }
}

/// Splits trailing ` asc`, ` desc`, ` nulls first` and ` nulls last`
/// suffixes off an `order by` expression.
///
/// Suffixes can appear in any order, but each kind is stripped only once:
/// in `x desc desc` the inner `desc` stays part of the expression.
///
/// ```
/// use vsql::query::{split_order_suffix, Direction, Nulls};
///
/// assert_eq!(
///     split_order_suffix("name desc nulls last"),
///     ("name", Some(Direction::Desc), Some(Nulls::Last))
/// );
/// assert_eq!(split_order_suffix("name"), ("name", None, None));
/// ```
pub fn split_order_suffix(expr: &str) -> (&str, Option<Direction>, Option<Nulls>) {
    let mut expr = expr.trim_end();
    let mut direction = None;
    let mut nulls = None;
    loop {
        if let (None, Some(rest)) = (nulls, expr.strip_suffix(" nulls first")) {
            nulls = Some(Nulls::First);
            expr = rest;
        } else if let (None, Some(rest)) = (nulls, expr.strip_suffix(" nulls last")) {
            nulls = Some(Nulls::Last);
            expr = rest;
        } else if let (None, Some(rest)) = (direction, expr.strip_suffix(" asc")) {
            direction = Some(Direction::Asc);
            expr = rest;
        } else if let (None, Some(rest)) = (direction, expr.strip_suffix(" desc")) {
            direction = Some(Direction::Desc);
            expr = rest;
        } else {
            break;
        }
        expr = expr.trim_end();
    }
    (expr, direction, nulls)
}

/// Formats `comment` as an SQL comment, defusing comment delimiters.
pub fn make_comment(comment: &str) -> String {
    format!("/* {} */", comment.replace("/*", "/ *").replace("*/", "* /"))
}

/// Appends `comment` to `expr`, unless `expr` already ends with it.
pub fn add_comment(expr: &str, comment: Option<&str>) -> String {
    match comment {
        None => expr.to_string(),
        Some(comment) => {
            let comment = make_comment(comment);
            if expr.ends_with(&comment) {
                expr.to_string()
            } else {
                format!("{} {}", expr, comment)
            }
        }
    }
}

/// Appends both comments to `expr`, skipping one that `expr` already ends
/// with and merging them into `/* first: second */` otherwise.
pub fn add_comment2(expr: &str, first: Option<&str>, second: Option<&str>) -> String {
    match (first, second) {
        (None, comment) | (comment, None) => add_comment(expr, comment),
        (Some(first), Some(second)) => {
            if expr.ends_with(&make_comment(first)) {
                add_comment(expr, Some(second))
            } else if expr.ends_with(&make_comment(second)) {
                add_comment(expr, Some(first))
            } else {
                format!("{} {}", expr, make_comment(&format!("{}: {}", first, second)))
            }
        }
    }
}

fn with_alias(sql: String, alias: Option<&str>) -> String {
    match alias {
        Some(alias) => format!("{} as {}", sql, alias),
        None => sql,
    }
}

/// A `select` statement under construction.
///
/// Clauses are rendered when they are added: the entries only hold the
/// final SQL. `from`, `where` and `group by` entries are deduplicated by
/// the SQL of the expression (without comments).
#[derive(Debug, Clone)]
pub struct Query {
    comment: Option<String>,
    vars: Vars,
    fields: Vec<String>,
    aggregated: Vec<String>,
    from: IndexMap<String, String>,
    wheres: IndexMap<String, String>,
    order_by: Vec<String>,
    group_by: IndexMap<String, String>,
    offset: Option<u64>,
    limit: Option<u64>,
    // Alias of the table registered for each field path
    aliases: HashMap<String, String>,
}

impl Query {
    pub fn new(comment: Option<&str>, vars: Vars) -> Self {
        Query {
            comment: comment.map(str::to_string),
            vars,
            fields: Vec::new(),
            aggregated: Vec::new(),
            from: IndexMap::new(),
            wheres: IndexMap::new(),
            order_by: Vec::new(),
            group_by: IndexMap::new(),
            offset: None,
            limit: None,
            aliases: HashMap::new(),
        }
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    fn next_alias(&self) -> String {
        format!("t{}", self.from.len() + 1)
    }

    fn add_from(&mut self, sql: String, comment: Option<&str>, alias: Option<&str>) {
        let key = match alias {
            Some(alias) => format!("{} {}", sql, alias),
            None => sql.clone(),
        };
        let mut text = add_comment(&sql, comment);
        if let Some(alias) = alias {
            text.push(' ');
            text.push_str(alias);
        }
        self.from.entry(key).or_insert(text);
    }

    fn add_join(&mut self, condition: String, comment: &str) {
        tracing::debug!(condition = %condition, path = %comment, "added join");
        let text = add_comment(&condition, Some(comment));
        self.wheres.insert(condition, text);
    }

    /// Registers the tables and joins needed to reach the field `field_ref`
    /// refers to, returning the alias of the table the field belongs to.
    ///
    /// Top level fields, broken references and groups without table SQL
    /// have no alias.
    pub fn register(&mut self, field_ref: &FieldRef) -> Option<String> {
        field_ref.field()?;
        let parent = field_ref.parent()?;
        let path = parent.full_identifier();
        if let Some(alias) = self.aliases.get(&path) {
            tracing::trace!(path = %path, alias = %alias, "table already registered");
            return Some(alias.clone());
        }

        let parent_alias = self.register(parent);
        let alias = self.next_alias();
        let field = parent.field()?;
        if let Some(join) = field.join_sql() {
            let mut condition = join.to_string();
            if let Some(parent_alias) = &parent_alias {
                condition = condition.replace("{m}", parent_alias);
            }
            condition = condition.replace("{d}", &alias);
            self.add_join(condition, &path);
        }

        let table = field.ref_group()?.table_sql()?.to_string();
        tracing::debug!(path = %path, alias = %alias, table = %table, "registered table");
        self.add_from(table, Some(&path), Some(&alias));
        self.aliases.insert(path, alias.clone());
        Some(alias)
    }

    fn register_all(&mut self, expr: &Ast) {
        for field_ref in expr.field_refs() {
            self.register(field_ref);
        }
    }

    /// Renders `expr` after registering all its field references in source
    /// order.
    fn render(&mut self, expr: &Ast) -> Result<String, VsqlError> {
        expr.check()?;
        self.register_all(expr);
        expr.sql(self)
    }

    fn check_plain(&self) -> Result<(), VsqlError> {
        if self.aggregated.is_empty() {
            Ok(())
        } else {
            Err(VsqlError::MixedAggregation)
        }
    }

    fn check_aggregated(&self) -> Result<(), VsqlError> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(VsqlError::MixedAggregation)
        }
    }

    /// Adds the table referenced by the variable `identifier` to the `from`
    /// clause and returns its alias.
    ///
    /// # Errors
    ///
    /// [`VsqlError::FieldUnknown`] if there is no such variable.
    pub fn from_vsql(&mut self, identifier: &str) -> Result<Option<String>, VsqlError> {
        if let Some(alias) = self.aliases.get(identifier) {
            return Ok(Some(alias.clone()));
        }
        let field = self
            .vars
            .get(identifier)
            .cloned()
            .ok_or_else(|| VsqlError::FieldUnknown(format!("Field `{}` unknown!", identifier)))?;

        let alias = self.next_alias();
        if let Some(join) = field.join_sql() {
            self.add_join(join.replace("{d}", &alias), identifier);
        }
        let table = match field.ref_group().and_then(|group| group.table_sql().map(str::to_string)) {
            Some(table) => table,
            None => return Ok(None),
        };
        self.add_from(table, Some(identifier), Some(&alias));
        self.aliases.insert(identifier.to_string(), alias.clone());
        Ok(Some(alias))
    }

    pub fn from_sql(&mut self, table: &str, comment: Option<&str>, alias: Option<&str>) -> &mut Self {
        self.add_from(table.to_string(), comment, alias);
        self
    }

    /// # Errors
    ///
    /// [`VsqlError::MixedAggregation`] if the query has aggregated fields.
    pub fn select_sql(&mut self, expr: &str, comment: Option<&str>, alias: Option<&str>) -> Result<&mut Self, VsqlError> {
        self.check_plain()?;
        self.fields.push(with_alias(add_comment(expr, comment), alias));
        Ok(self)
    }

    /// # Errors
    ///
    /// [`VsqlError::MixedAggregation`] if the query has aggregated fields,
    /// or the error of the expression if it is invalid.
    pub fn select_vsql(&mut self, expr: &Ast, comment: Option<&str>, alias: Option<&str>) -> Result<&mut Self, VsqlError> {
        self.check_plain()?;
        let sql = self.render(expr)?;
        let source = expr.source();
        self.fields.push(with_alias(add_comment2(&sql, comment, Some(&source)), alias));
        Ok(self)
    }

    /// Adds an SQL expression that already is an aggregate.
    ///
    /// # Errors
    ///
    /// [`VsqlError::MixedAggregation`] if the query has non-aggregated
    /// fields.
    pub fn aggregate_sql(&mut self, expr: &str, comment: Option<&str>, alias: Option<&str>) -> Result<&mut Self, VsqlError> {
        self.check_aggregated()?;
        self.aggregated.push(with_alias(add_comment(expr, comment), alias));
        Ok(self)
    }

    /// Adds an aggregate call: `count()`, `min(x)`, `max(x)`, `sum(x)` or
    /// `group(x)`. `group(x)` selects `x` and adds it to the `group by`
    /// clause.
    ///
    /// # Errors
    ///
    /// [`VsqlError::MixedAggregation`] if the query has non-aggregated
    /// fields, [`VsqlError::Aggregation`] if `expr` is not one of the
    /// supported calls, or the error of the expression if it is invalid.
    pub fn aggregate_vsql(&mut self, expr: &Ast, comment: Option<&str>, alias: Option<&str>) -> Result<&mut Self, VsqlError> {
        self.check_aggregated()?;
        let aggregate = match expr.node() {
            Node::Func(name) => Aggregate::from_name(name),
            _ => None,
        };
        let sql = match (aggregate, expr.children()) {
            (Some(Aggregate::Count), []) => add_comment("count(*)", comment),
            (Some(aggregate), [arg]) if aggregate != Aggregate::Count => {
                expr.check()?;
                let arg_sql = self.render(arg)?;
                let arg_source = arg.source();
                let commented = add_comment2(&arg_sql, comment, Some(&arg_source));
                if aggregate == Aggregate::Group {
                    self.group_by
                        .entry(arg_sql.clone())
                        .or_insert_with(|| add_comment(&arg_sql, Some(&arg_source)));
                    commented
                } else {
                    format!("{}({})", aggregate, commented)
                }
            }
            _ => return Err(VsqlError::Aggregation("Aggregation call is malformed.".to_string())),
        };
        tracing::debug!(aggregate = ?aggregate, source = %expr.source(), "added aggregate");
        self.aggregated.push(with_alias(sql, alias));
        Ok(self)
    }

    pub fn where_sql(&mut self, expr: &str, comment: Option<&str>) -> &mut Self {
        let text = add_comment(expr, comment);
        self.wheres.entry(expr.to_string()).or_insert(text);
        self
    }

    /// Adds a condition. Conditions that aren't of type `bool` are
    /// converted with `bool()` first.
    ///
    /// # Errors
    ///
    /// The error of the expression if it is invalid.
    pub fn where_vsql(&mut self, expr: &Ast, comment: Option<&str>) -> Result<&mut Self, VsqlError> {
        let key = self.render(expr)?;
        let sql = if expr.datatype() == Some(DataType::Bool) {
            key.clone()
        } else {
            Ast::func("bool", vec![expr.clone()]).sql(self)?
        };
        let source = expr.source();
        let text = add_comment2(&format!("{} = 1", sql), Some(&source), comment);
        self.wheres.entry(key).or_insert(text);
        Ok(self)
    }

    pub fn order_by_sql(
        &mut self,
        expr: &str,
        comment: Option<&str>,
        direction: Option<Direction>,
        nulls: Option<Nulls>,
    ) -> &mut Self {
        let text = add_comment(expr, comment);
        self.push_order_by(text, direction, nulls);
        self
    }

    /// Like [`order_by_sql`](Query::order_by_sql), but takes the direction
    /// and null position from suffixes of `expr`, e.g. `name desc nulls
    /// last`.
    pub fn order_by_sql_suffixed(&mut self, expr: &str, comment: Option<&str>) -> &mut Self {
        let (expr, direction, nulls) = split_order_suffix(expr);
        self.order_by_sql(expr, comment, direction, nulls)
    }

    /// Like [`order_by_vsql`](Query::order_by_vsql), with the direction and
    /// null position given as text, e.g. `desc nulls last`.
    ///
    /// # Errors
    ///
    /// [`VsqlError::Invalid`] if `suffix` contains anything else, or the
    /// error of the expression if it is invalid.
    pub fn order_by_vsql_suffixed(&mut self, expr: &Ast, comment: Option<&str>, suffix: &str) -> Result<&mut Self, VsqlError> {
        let padded = format!(" {}", suffix.trim());
        let (rest, direction, nulls) = split_order_suffix(&padded);
        if !rest.is_empty() {
            return Err(VsqlError::Invalid(format!("Malformed order suffix `{}`", suffix)));
        }
        self.order_by_vsql(expr, comment, direction, nulls)
    }

    /// # Errors
    ///
    /// The error of the expression if it is invalid.
    pub fn order_by_vsql(
        &mut self,
        expr: &Ast,
        comment: Option<&str>,
        direction: Option<Direction>,
        nulls: Option<Nulls>,
    ) -> Result<&mut Self, VsqlError> {
        let sql = self.render(expr)?;
        let source = expr.source();
        let text = add_comment2(&sql, comment, Some(&source));
        self.push_order_by(text, direction, nulls);
        Ok(self)
    }

    fn push_order_by(&mut self, mut text: String, direction: Option<Direction>, nulls: Option<Nulls>) {
        if let Some(direction) = direction {
            text.push(' ');
            text.push_str(direction.keyword());
        }
        if let Some(nulls) = nulls {
            text.push(' ');
            text.push_str(nulls.keyword());
        }
        self.order_by.push(text);
    }

    /// # Errors
    ///
    /// [`VsqlError::MixedAggregation`] if the query has non-aggregated
    /// fields.
    pub fn group_by_sql(&mut self, expr: &str, comment: Option<&str>) -> Result<&mut Self, VsqlError> {
        self.check_aggregated()?;
        let text = add_comment(expr, comment);
        self.group_by.entry(expr.to_string()).or_insert(text);
        Ok(self)
    }

    /// # Errors
    ///
    /// [`VsqlError::MixedAggregation`] if the query has non-aggregated
    /// fields, or the error of the expression if it is invalid.
    pub fn group_by_vsql(&mut self, expr: &Ast, comment: Option<&str>) -> Result<&mut Self, VsqlError> {
        self.check_aggregated()?;
        let sql = self.render(expr)?;
        let source = expr.source();
        let text = add_comment2(&sql, comment, Some(&source));
        self.group_by.entry(sql).or_insert(text);
        Ok(self)
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn no_limit(&mut self) -> &mut Self {
        self.limit = None;
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    pub fn no_offset(&mut self) -> &mut Self {
        self.offset = None;
        self
    }

    pub fn is_aggregated(&self) -> bool {
        !self.aggregated.is_empty()
    }

    pub fn sql(&self) -> String {
        self.sql_indented(0)
    }

    /// Renders the statement, indenting every line by `level` tabs.
    ///
    /// An empty query renders as `select 42 from dual`.
    pub fn sql_indented(&self, level: usize) -> String {
        let indent = "\t".repeat(level);
        let mut out = String::new();

        if let Some(comment) = &self.comment {
            out.push_str(&indent);
            out.push_str(&make_comment(comment));
            out.push('\n');
        }

        let select = if self.aggregated.is_empty() { &self.fields } else { &self.aggregated };
        if select.is_empty() {
            write_section(&mut out, level, "select", ["42"], ",\n");
        } else {
            write_section(&mut out, level, "select", select.iter().map(String::as_str), ",\n");
        }

        if self.from.is_empty() {
            write_section(&mut out, level, "from", ["dual"], ",\n");
        } else {
            write_section(&mut out, level, "from", self.from.values().map(String::as_str), ",\n");
        }

        if self.wheres.len() == 1 {
            write_section(&mut out, level, "where", self.wheres.values().map(String::as_str), " and\n");
        } else if !self.wheres.is_empty() {
            let wrapped: Vec<String> = self.wheres.values().map(|w| format!("({})", w)).collect();
            write_section(&mut out, level, "where", wrapped.iter().map(String::as_str), " and\n");
        }

        if !self.group_by.is_empty() {
            write_section(&mut out, level, "group by", self.group_by.values().map(String::as_str), ",\n");
        }

        if !self.order_by.is_empty() {
            write_section(&mut out, level, "order by", self.order_by.iter().map(String::as_str), ",\n");
        }

        if let Some(offset) = self.offset {
            out.push_str(&format!("{}offset {} rows\n", indent, offset));
        }
        if let Some(limit) = self.limit {
            out.push_str(&format!("{}fetch next {} rows only\n", indent, limit));
        }
        out
    }
}

fn write_section<'a>(
    out: &mut String,
    level: usize,
    keyword: &str,
    entries: impl IntoIterator<Item = &'a str>,
    separator: &str,
) {
    out.push_str(&"\t".repeat(level));
    out.push_str(keyword);
    out.push('\n');
    let inner = "\t".repeat(level + 1);
    for (i, entry) in entries.into_iter().enumerate() {
        if i != 0 {
            out.push_str(separator);
        }
        out.push_str(&inner);
        out.push_str(entry);
    }
    out.push('\n');
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql())
    }
}
