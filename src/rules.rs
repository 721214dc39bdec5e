//! # Operator overload resolution
//!
//! Every operator, attribute, function and method of vSQL is described by a
//! [`RuleTable`]: a map from an operand type signature to a [`Rule`], i.e. the
//! result type and a SQL [`Template`] for that exact combination of types.
//!
//! ## Lookup
//!
//! Lookup is an exact match on the tuple of operand types. There is no
//! implicit widening: `Bool + Int` works only because the table contains a
//! row for `(BOOL, INT)`. For attributes, functions and methods the key
//! additionally contains the name, so `"upper"` on `(STR)` and `"lower"` on
//! `(STR)` are different rows.
//!
//! ## Templates
//!
//! Templates are written as strings where `{1}`, `{2}`, ... stand for the SQL
//! of the first, second, ... operand:
//!
//! ```text
//! vsqlimpl_pkg.eq_int_int({1}, {2})
//! ```
//!
//! ## Tables
//!
//! The tables live in the submodules, one per operator family, each built
//! exactly once behind a [`LazyLock`](std::sync::LazyLock) and never
//! mutated afterwards.

pub mod access;
pub mod arithmetic;
pub mod compare;
pub mod functions;
pub mod logic;

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::datatype::DataType;
use crate::error::VsqlError;

/// One piece of a [`Template`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Copied to the output verbatim
    Literal(String),
    /// Replaced by the SQL of the operand with this (zero based) index
    Operand(usize),
}

/// A SQL generation template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    tokens: Vec<Token>,
}

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\d+)\}").expect("valid placeholder regex"));

impl Template {
    /// Parses a template string with `{n}` placeholders (`n` starting at 1).
    ///
    /// # Examples
    ///
    /// ```
    /// use vsql::rules::{Template, Token};
    ///
    /// let t = Template::parse("({1} + {2})");
    /// assert_eq!(t.tokens()[1], Token::Operand(0));
    /// ```
    pub fn parse(source: &str) -> Template {
        let mut tokens = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER_RE.captures_iter(source) {
            let (Some(whole), Some(index)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Ok(index) = index.as_str().parse::<usize>() else {
                continue;
            };
            if index == 0 {
                continue;
            }
            if whole.start() > last {
                tokens.push(Token::Literal(source[last..whole.start()].to_string()));
            }
            tokens.push(Token::Operand(index - 1));
            last = whole.end();
        }
        if last < source.len() {
            tokens.push(Token::Literal(source[last..].to_string()));
        }
        Template { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Highest operand index referenced plus one.
    pub fn operand_count(&self) -> usize {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                Token::Operand(i) => Some(i + 1),
                Token::Literal(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Renders the template into `out`, asking `operand` for the SQL of each
    /// referenced operand (possibly several times for the same index).
    pub fn render<F>(&self, out: &mut String, mut operand: F) -> Result<(), VsqlError>
    where
        F: FnMut(usize, &mut String) -> Result<(), VsqlError>,
    {
        for token in &self.tokens {
            match token {
                Token::Literal(s) => out.push_str(s),
                Token::Operand(i) => operand(*i, out)?,
            }
        }
        Ok(())
    }
}

/// Result type and SQL template for one operand signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub result: DataType,
    pub template: Template,
}

/// All rules of one operator kind.
///
/// Rows are keyed by name (empty for plain operators) and operand types.
#[derive(Debug, Default)]
pub struct RuleTable {
    operator: &'static str,
    rules: HashMap<&'static str, HashMap<Vec<DataType>, Rule>>,
}

impl RuleTable {
    pub fn new(operator: &'static str) -> Self {
        RuleTable {
            operator,
            rules: HashMap::new(),
        }
    }

    pub fn operator(&self) -> &'static str {
        self.operator
    }

    /// Adds one row per combination of the type groups in `signature`.
    ///
    /// Every group contributes one operand position; `&[&[INT, NUMBER], &[STR]]`
    /// adds `(INT, STR)` and `(NUMBER, STR)`.
    pub fn add(&mut self, name: &'static str, result: DataType, signature: &[&[DataType]], template: &str) {
        let template = Template::parse(template);
        for types in expand(signature) {
            let previous = self.rules.entry(name).or_default().insert(
                types.clone(),
                Rule {
                    result,
                    template: template.clone(),
                },
            );
            debug_assert!(
                previous.is_none(),
                "duplicate {} rule {:?} {:?}",
                self.operator,
                name,
                types
            );
        }
    }

    /// Like [`add`](Self::add), but only for signatures that don't have a
    /// rule yet.
    pub fn fill(&mut self, name: &'static str, result: DataType, signature: &[&[DataType]], template: &str) {
        let template = Template::parse(template);
        let rows = self.rules.entry(name).or_default();
        for types in expand(signature) {
            rows.entry(types).or_insert_with(|| Rule {
                result,
                template: template.clone(),
            });
        }
    }

    pub fn lookup(&self, name: &str, types: &[DataType]) -> Option<&Rule> {
        self.rules.get(name)?.get(types)
    }

    /// Whether any rule uses this name.
    pub fn knows_name(&self, name: &str) -> bool {
        self.rules.get(name).is_some_and(|rows| !rows.is_empty())
    }

    /// Whether any rule for `name` takes `count` operands.
    pub fn accepts_arity(&self, name: &str, count: usize) -> bool {
        self.rules
            .get(name)
            .is_some_and(|rows| rows.keys().any(|types| types.len() == count))
    }

    /// Names used by this table, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.rules.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn finish(self) -> Self {
        tracing::trace!(operator = self.operator, rules = self.len(), "built rule table");
        self
    }
}

/// Cartesian product of the type groups.
fn expand(signature: &[&[DataType]]) -> Vec<Vec<DataType>> {
    let mut result: Vec<Vec<DataType>> = vec![Vec::new()];
    for group in signature {
        result = result
            .into_iter()
            .flat_map(|prefix| {
                group.iter().map(move |dt| {
                    let mut types = prefix.clone();
                    types.push(*dt);
                    types
                })
            })
            .collect();
    }
    result
}

// Type groups shared by the tables.

use DataType::*;

pub(crate) const NULL: &[DataType] = &[Null];
pub(crate) const BOOL: &[DataType] = &[Bool];
pub(crate) const INT: &[DataType] = &[Int];
pub(crate) const NUMBER: &[DataType] = &[Number];
pub(crate) const STR: &[DataType] = &[Str];
pub(crate) const CLOB: &[DataType] = &[Clob];
pub(crate) const COLOR: &[DataType] = &[Color];
pub(crate) const GEO: &[DataType] = &[Geo];
pub(crate) const DATE: &[DataType] = &[Date];
pub(crate) const DATETIME: &[DataType] = &[DateTime];
pub(crate) const DATEDELTA: &[DataType] = &[DateDelta];
pub(crate) const DATETIMEDELTA: &[DataType] = &[DateTimeDelta];
pub(crate) const MONTHDELTA: &[DataType] = &[MonthDelta];
pub(crate) const NULLLIST: &[DataType] = &[NullList];
pub(crate) const NULLSET: &[DataType] = &[NullSet];

pub(crate) const BOOL_INT: &[DataType] = &[Bool, Int];
pub(crate) const NUMERIC: &[DataType] = &[Bool, Int, Number];
pub(crate) const NULL_BOOL_INT: &[DataType] = &[Null, Bool, Int];
pub(crate) const DELTAS: &[DataType] = &[DateDelta, DateTimeDelta, MonthDelta];
pub(crate) const TEMPORAL: &[DataType] = &[Date, DateTime];

/// Lists with a concrete item type.
pub(crate) const LISTS: &[DataType] = &[IntList, NumberList, StrList, ClobList, DateList, DateTimeList];

/// Sets with a concrete item type.
pub(crate) const SETS: &[DataType] = &[IntSet, NumberSet, StrSet, DateSet, DateTimeSet];

pub(crate) const ALL: &[DataType] = &DataType::ALL;

/// Every type except `NULL`.
pub(crate) const NOT_NULL: &[DataType] = &[
    Bool,
    Int,
    Number,
    Str,
    Clob,
    Color,
    Geo,
    Date,
    DateTime,
    DateDelta,
    DateTimeDelta,
    MonthDelta,
    NullList,
    IntList,
    NumberList,
    StrList,
    ClobList,
    DateList,
    DateTimeList,
    NullSet,
    IntSet,
    NumberSet,
    StrSet,
    DateSet,
    DateTimeSet,
];

/// Name of the database list helper family handling values of type `dt`.
///
/// Sets share the helpers of their list form, and dates are processed by
/// the datetime helpers.
pub(crate) fn list_impl(dt: DataType) -> &'static str {
    match dt {
        NullList => "nulllist",
        IntList | IntSet => "intlist",
        NumberList | NumberSet => "numberlist",
        StrList | StrSet => "strlist",
        ClobList => "cloblist",
        DateList | DateTimeList | DateSet | DateTimeSet => "datetimelist",
        NullSet => "nullset",
        _ => dt.name(),
    }
}

/// Name of the database set helper family handling values of type `dt`.
pub(crate) fn set_impl(dt: DataType) -> &'static str {
    match dt {
        DateSet | DateTimeSet => "datetimeset",
        _ => dt.name(),
    }
}

/// Truthiness of the operand `op` of type `dt` as a SQL expression
/// evaluating to `1` or `0`.
pub(crate) fn truth_sql(dt: DataType, op: &str) -> String {
    match dt {
        Null => "0".to_string(),
        Bool => op.to_string(),
        Int | Number | DateDelta | DateTimeDelta | MonthDelta | NullList | NullSet => {
            format!("(case when nvl({}, 0) = 0 then 0 else 1 end)", op)
        }
        Date | DateTime | Str | Color | Geo => format!("(case when {} is null then 0 else 1 end)", op),
        Clob => format!("vsqlimpl_pkg.bool_clob({})", op),
        _ => format!("vsqlimpl_pkg.bool_{}({})", list_impl(dt), op),
    }
}
