use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::ast::operators::{BinaryOp, UnaryOp};
use crate::datatype::DataType;
use crate::schema::{Field, Vars};
use crate::value::Color;

/// Kind of an expression node.
///
/// The children of a node live in [`Ast`](crate::Ast); the kind only holds
/// what can't be expressed as a child (operators, names, constant values).
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal constant
    Const(Const),

    /// Constant whose source text couldn't be parsed
    ///
    /// Holds the type the constant was supposed to have.
    InvalidConst(DataType),

    /// Reference to a field, possibly through a chain of parent references
    Field(FieldRef),

    /// List literal (`[1, 2, 3]`)
    List,

    /// Set literal (`{1, 2, 3}`, `{/}` when empty)
    Set,

    Unary(UnaryOp),

    Binary(BinaryOp),

    /// Conditional expression (`a if cond else b`)
    ///
    /// Children are `a`, `cond` and `b`.
    If,

    /// Slice (`x[start:stop]`)
    ///
    /// Always has three children; missing indexes are `None` constants that
    /// don't appear in the source. The flags record which ones were given.
    Slice { start: bool, stop: bool },

    /// Attribute access (`x.name`)
    Attr(String),

    /// Function call (`name(args)`)
    Func(String),

    /// Method call (`x.name(args)`), the object is the first child
    Meth(String),
}

impl Node {
    /// Name used for the `nodetype` key of the JSON form.
    pub fn nodetype(&self) -> &'static str {
        match self {
            Node::Const(c) => const_nodetype(c.datatype()),
            Node::InvalidConst(dt) => const_nodetype(*dt),
            Node::Field(_) => "field",
            Node::List => "list",
            Node::Set => "set",
            Node::Unary(op) => op.nodetype(),
            Node::Binary(op) => op.nodetype(),
            Node::If => "ternop_if",
            Node::Slice { .. } => "ternop_slice",
            Node::Attr(_) => "attr",
            Node::Func(_) => "func",
            Node::Meth(_) => "meth",
        }
    }

    /// Human readable name of the node kind, used in diagnostics.
    pub fn description(&self) -> &'static str {
        match self {
            Node::Const(c) => const_description(c.datatype()),
            Node::InvalidConst(dt) => const_description(*dt),
            Node::Field(_) => "Field reference",
            Node::List => "List expression",
            Node::Set => "Set expression",
            Node::Unary(op) => op.description(),
            Node::Binary(op) => op.description(),
            Node::If => "Conditional expression",
            Node::Slice { .. } => "Slice expression",
            Node::Attr(_) => "Attribute access expression",
            Node::Func(_) => "Function call",
            Node::Meth(_) => "Method call",
        }
    }

    /// Binding strength, higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            Node::Const(_) | Node::InvalidConst(_) | Node::List | Node::Set => 20,
            Node::Field(_) | Node::Attr(_) => 19,
            Node::Func(_) => 18,
            Node::Meth(_) => 17,
            Node::Slice { .. } => 16,
            Node::Unary(op) => op.precedence(),
            Node::Binary(op) => op.precedence(),
            Node::If => 3,
        }
    }
}

fn const_nodetype(dt: DataType) -> &'static str {
    match dt {
        DataType::Bool => "const_bool",
        DataType::Int => "const_int",
        DataType::Number => "const_number",
        DataType::Str => "const_str",
        DataType::Date => "const_date",
        DataType::DateTime => "const_datetime",
        DataType::Color => "const_color",
        _ => "const_none",
    }
}

fn const_description(dt: DataType) -> &'static str {
    match dt {
        DataType::Bool => "Bool constant",
        DataType::Int => "Integer constant",
        DataType::Number => "Number constant",
        DataType::Str => "String constant",
        DataType::Date => "Date constant",
        DataType::DateTime => "Datetime constant",
        DataType::Color => "Color constant",
        _ => "None constant",
    }
}

/// A literal constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Const {
    None,
    Bool(bool),
    Int(i64),
    /// Always finite
    Number(f64),
    Str(String),
    Date(NaiveDate),
    /// Second precision
    DateTime(NaiveDateTime),
    Color(Color),
}

impl Const {
    pub fn datatype(&self) -> DataType {
        match self {
            Const::None => DataType::Null,
            Const::Bool(_) => DataType::Bool,
            Const::Int(_) => DataType::Int,
            Const::Number(_) => DataType::Number,
            Const::Str(_) => DataType::Str,
            Const::Date(_) => DataType::Date,
            Const::DateTime(_) => DataType::DateTime,
            Const::Color(_) => DataType::Color,
        }
    }

    /// vSQL source of the constant.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use vsql::ast::Const;
    ///
    /// let d = NaiveDate::from_ymd_opt(2000, 2, 29).unwrap();
    /// assert_eq!(Const::Date(d).source(), "@(2000-02-29)");
    /// assert_eq!(Const::Str("it's".into()).source(), "\"it's\"");
    /// ```
    pub fn source(&self) -> String {
        match self {
            Const::None => "None".to_string(),
            Const::Bool(true) => "True".to_string(),
            Const::Bool(false) => "False".to_string(),
            Const::Int(i) => i.to_string(),
            Const::Number(n) => format_number(*n),
            Const::Str(s) => repr_str(s),
            Const::Date(d) => format!("@({})", d.format("%Y-%m-%d")),
            Const::DateTime(dt) => format!("@({})", dt.format("%Y-%m-%dT%H:%M:%S")),
            Const::Color(c) => c.to_string(),
        }
    }

    /// Value for the JSON form, `None` has none.
    pub fn value(&self) -> Option<String> {
        match self {
            Const::None => None,
            Const::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Const::Int(i) => Some(i.to_string()),
            Const::Number(n) => Some(format_number(*n)),
            Const::Str(s) => Some(s.clone()),
            Const::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Const::DateTime(dt) => Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            Const::Color(c) => Some(c.dump()),
        }
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        match self {
            Const::None => out.push_str("null"),
            Const::Bool(b) => out.push_str(if *b { "1" } else { "0" }),
            Const::Int(i) => {
                let _ = write!(out, "{}", i);
            }
            Const::Number(n) => out.push_str(&format_number(*n)),
            Const::Str(s) => {
                out.push('\'');
                out.push_str(&s.replace('\'', "''"));
                out.push('\'');
            }
            Const::Date(d) => {
                let _ = write!(out, "to_date('{}', 'YYYY-MM-DD')", d.format("%Y-%m-%d"));
            }
            Const::DateTime(dt) => {
                let _ = write!(
                    out,
                    "to_date('{}', 'YYYY-MM-DD HH24:MI:SS')",
                    dt.format("%Y-%m-%d %H:%M:%S")
                );
            }
            Const::Color(c) => {
                let _ = write!(out, "{}", c.packed());
            }
        }
    }
}

/// Numbers always show a fraction or exponent, so that `1.0` stays
/// distinguishable from the integer `1`.
fn format_number(n: f64) -> String {
    format!("{:?}", n)
}

/// String literal in vSQL syntax.
///
/// Single quotes are used unless the string contains a single quote but no
/// double quote.
pub(crate) fn repr_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// A (possibly dotted) field reference such as `p.boss.name`.
///
/// Each link holds the link before it, so `p.boss.name` is a reference to
/// `name` whose parent refers to `boss`, whose parent refers to the variable
/// `p`. A link that can't be resolved has no field; every link after it
/// can't be resolved either.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    parent: Option<Box<FieldRef>>,
    identifier: String,
    field: Option<Arc<Field>>,
}

impl FieldRef {
    /// Reference to the variable `identifier`.
    pub fn root(vars: &Vars, identifier: &str) -> FieldRef {
        FieldRef {
            parent: None,
            identifier: identifier.to_string(),
            field: vars.get(identifier).cloned(),
        }
    }

    /// Reference to `identifier` in the group the current reference points to.
    ///
    /// Unknown identifiers fall back to the group's `*` field.
    pub fn child(self, identifier: &str) -> FieldRef {
        let field = self
            .field
            .as_ref()
            .and_then(|f| f.ref_group())
            .and_then(|group| group.field(identifier).cloned());
        FieldRef {
            parent: Some(Box::new(self)),
            identifier: identifier.to_string(),
            field,
        }
    }

    /// Resolves a chain of identifiers, the first one against `vars`.
    ///
    /// Returns `None` for an empty chain.
    pub fn resolve<S: AsRef<str>>(vars: &Vars, parts: &[S]) -> Option<FieldRef> {
        let (first, rest) = parts.split_first()?;
        let mut result = FieldRef::root(vars, first.as_ref());
        for part in rest {
            result = result.child(part.as_ref());
        }
        Some(result)
    }

    pub fn parent(&self) -> Option<&FieldRef> {
        self.parent.as_deref()
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn field(&self) -> Option<&Arc<Field>> {
        self.field.as_ref()
    }

    /// The dotted path, e.g. `p.boss.name`.
    pub fn full_identifier(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}.{}", parent.full_identifier(), self.identifier),
            None => self.identifier.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repr_str_quotes() {
        assert_eq!(repr_str("foo"), "'foo'");
        assert_eq!(repr_str("it's"), "\"it's\"");
        assert_eq!(repr_str("'\""), "'\\'\"'");
        assert_eq!(repr_str("a\nb\\"), "'a\\nb\\\\'");
    }

    #[test]
    fn test_number_keeps_fraction() {
        assert_eq!(Const::Number(1.0).source(), "1.0");
        assert_eq!(Const::Number(0.5).source(), "0.5");
        let mut sql = String::new();
        Const::Number(-2.25).write_sql(&mut sql);
        assert_eq!(sql, "-2.25");
    }

    #[test]
    fn test_const_sql() {
        let mut sql = String::new();
        Const::Str("it's".into()).write_sql(&mut sql);
        assert_eq!(sql, "'it''s'");

        let mut sql = String::new();
        let dt = NaiveDate::from_ymd_opt(2000, 2, 29).unwrap().and_hms_opt(12, 34, 56).unwrap();
        Const::DateTime(dt).write_sql(&mut sql);
        assert_eq!(sql, "to_date('2000-02-29 12:34:56', 'YYYY-MM-DD HH24:MI:SS')");

        let mut sql = String::new();
        Const::Color(Color::new(0, 0, 0, 255)).write_sql(&mut sql);
        assert_eq!(sql, "255");
    }

    #[test]
    fn test_values() {
        assert_eq!(Const::None.value(), None);
        assert_eq!(Const::Bool(true).value().as_deref(), Some("1"));
        assert_eq!(Const::Color(Color::new(255, 0, 0, 255)).value().as_deref(), Some("#ff0000ff"));
    }
}
