//! # vSQL expression trees
//!
//! An [`Ast`] is one node of a vSQL expression together with its children.
//! Trees are built bottom-up through the constructors on [`Ast`], and every
//! node validates itself as soon as it is constructed:
//!
//! - if any child is invalid, the node is invalid with
//!   [`ErrorKind::SubnodeError`];
//! - otherwise the types of the children are looked up in the
//!   [rule table](crate::rules) of the node kind, and the node either gets
//!   the result type of the matching rule or an error kind describing why
//!   there is none.
//!
//! After construction a node never changes. Exactly one of
//! [`datatype`](Ast::datatype) and [`error`](Ast::error) is set.
//!
//! ## Source text
//!
//! Every node knows the vSQL source it was built from. The constructors
//! produce canonical source and insert parentheses where precedence
//! requires them:
//!
//! ```
//! use vsql::ast::{Ast, BinaryOp};
//!
//! let sum = Ast::binary(BinaryOp::Add, Ast::int(1), Ast::int(2));
//! let product = Ast::binary(BinaryOp::Mul, sum, Ast::int(3));
//! assert_eq!(product.source(), "(1 + 2) * 3");
//! ```
//!
//! ## SQL
//!
//! [`Ast::sql`] renders a valid tree into SQL. Field references register
//! the joins they need with the [`Query`] they are rendered for.
//!
//! ```
//! use vsql::{Query, Vars};
//! use vsql::ast::{Ast, BinaryOp};
//!
//! let mut query = Query::new(None, Vars::new());
//! let cmp = Ast::binary(BinaryOp::Eq, Ast::str("it's"), Ast::none());
//! assert_eq!(
//!     cmp.sql(&mut query).unwrap(),
//!     "(case when 'it''s' is null then 1 else 0 end)"
//! );
//! ```

pub mod expressions;
pub mod operators;

mod json;
mod source;

use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rust_decimal::prelude::ToPrimitive;

pub use expressions::{Const, FieldRef, Node};
pub use json::Dump;
pub use operators::{BinaryOp, UnaryOp};

use crate::datatype::DataType;
use crate::error::{ErrorKind, VsqlError};
use crate::query::Query;
use crate::rules::{Rule, RuleTable, access, functions, logic};
use crate::schema::Vars;
use crate::value::{Color, Value};
use source::{Fragment, SourceBuilder};

/// A validated vSQL expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    node: Node,
    children: Vec<Ast>,
    source: Vec<Fragment>,
    datatype: Option<DataType>,
    error: Option<ErrorKind>,
}

// Constructors

impl Ast {
    fn build(node: Node, children: Vec<Ast>, source: Vec<Fragment>) -> Ast {
        let mut ast = Ast {
            node,
            children,
            source,
            datatype: None,
            error: None,
        };
        match ast.validate() {
            Ok(datatype) => ast.datatype = Some(datatype),
            Err(kind) => ast.error = Some(kind),
        }
        ast
    }

    fn leaf(node: Node, source: String) -> Ast {
        Ast::build(node, Vec::new(), vec![Fragment::Text(source)])
    }

    /// A constant node.
    ///
    /// Non-finite numbers produce an invalid constant.
    pub fn from_const(value: Const) -> Ast {
        match value {
            Const::Number(n) if !n.is_finite() => Ast::leaf(Node::InvalidConst(DataType::Number), format!("{:?}", n)),
            Const::DateTime(dt) => {
                let c = Const::DateTime(dt.with_nanosecond(0).unwrap_or(dt));
                let source = c.source();
                Ast::leaf(Node::Const(c), source)
            }
            c => {
                let source = c.source();
                Ast::leaf(Node::Const(c), source)
            }
        }
    }

    pub fn none() -> Ast {
        Ast::from_const(Const::None)
    }

    pub fn bool(value: bool) -> Ast {
        Ast::from_const(Const::Bool(value))
    }

    pub fn int(value: i64) -> Ast {
        Ast::from_const(Const::Int(value))
    }

    pub fn number(value: f64) -> Ast {
        Ast::from_const(Const::Number(value))
    }

    pub fn str(value: impl Into<String>) -> Ast {
        Ast::from_const(Const::Str(value.into()))
    }

    pub fn date(value: NaiveDate) -> Ast {
        Ast::from_const(Const::Date(value))
    }

    pub fn datetime(value: NaiveDateTime) -> Ast {
        Ast::from_const(Const::DateTime(value))
    }

    pub fn color(value: Color) -> Ast {
        Ast::from_const(Const::Color(value))
    }

    /// Turns a host value into a constant expression.
    ///
    /// Arrays become list literals. Decimals become integers when they have
    /// no fractional part and fit into 64 bits, numbers otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use vsql::{Ast, DataType, Value};
    ///
    /// let list = Ast::constant(&Value::Array(vec![Value::Integer(1), Value::Null]));
    /// assert_eq!(list.source(), "[1, None]");
    /// assert_eq!(list.datatype(), Some(DataType::IntList));
    /// ```
    pub fn constant(value: &Value) -> Ast {
        match value {
            Value::Null => Ast::none(),
            Value::Boolean(b) => Ast::bool(*b),
            Value::Integer(i) => Ast::int(*i),
            Value::Float(f) => Ast::number(*f),
            Value::Decimal(d) => {
                if d.fract().is_zero() {
                    if let Some(i) = d.to_i64() {
                        return Ast::int(i);
                    }
                }
                match d.to_f64() {
                    Some(f) => Ast::number(f),
                    None => Ast::leaf(Node::InvalidConst(DataType::Number), d.to_string()),
                }
            }
            Value::String(s) => Ast::str(s.clone()),
            Value::Color(c) => Ast::color(*c),
            Value::Date(d) => Ast::date(*d),
            Value::DateTime(dt) | Value::Timestamp(dt) => Ast::datetime(*dt),
            Value::Array(items) => Ast::list(items.iter().map(Ast::constant).collect()),
        }
    }

    /// Parses the source text of a constant of type `datatype`.
    ///
    /// Malformed text doesn't fail: it produces an invalid node with the
    /// matching `CONST_*` error kind.
    ///
    /// # Errors
    ///
    /// Returns [`VsqlError::Load`] for types that have no parsable constant
    /// form (strings, collections, deltas and so on).
    ///
    /// # Examples
    ///
    /// ```
    /// use vsql::{Ast, DataType, ErrorKind};
    ///
    /// let ok = Ast::parse_const(DataType::Date, "@(2000-02-29)").unwrap();
    /// assert_eq!(ok.datatype(), Some(DataType::Date));
    ///
    /// let bad = Ast::parse_const(DataType::Date, "@(2000-02-30)").unwrap();
    /// assert_eq!(bad.error(), Some(ErrorKind::ConstDate));
    /// assert_eq!(bad.source(), "@(2000-02-30)");
    /// ```
    pub fn parse_const(datatype: DataType, source: &str) -> Result<Ast, VsqlError> {
        if const_error(datatype).is_none() {
            return Err(VsqlError::Load(format!(
                "Constants of type `{}` can't be parsed",
                datatype
            )));
        }
        let text = match datatype {
            DataType::Date | DataType::DateTime => source
                .strip_prefix("@(")
                .and_then(|s| s.strip_suffix(')'))
                .unwrap_or(""),
            _ => source,
        };
        Ok(match parse_value(datatype, text) {
            Some(c) => {
                let source = source.to_string();
                Ast::leaf(Node::Const(c), source)
            }
            None => Ast::leaf(Node::InvalidConst(datatype), source.to_string()),
        })
    }

    /// Reference to a field through a dotted path like `p.boss.name`.
    ///
    /// The first identifier is looked up in `vars`, each following one in
    /// the group the previous field references.
    pub fn field(vars: &Vars, path: &str) -> Ast {
        let parts: Vec<&str> = path.split('.').collect();
        match FieldRef::resolve(vars, &parts) {
            Some(field_ref) => Ast::field_ref(field_ref),
            None => Ast::field_ref(FieldRef::root(vars, path)),
        }
    }

    pub fn field_ref(field_ref: FieldRef) -> Ast {
        let source = field_ref.full_identifier();
        Ast::leaf(Node::Field(field_ref), source)
    }

    /// List literal, e.g. `[1, 2, None]`.
    pub fn list(items: Vec<Ast>) -> Ast {
        let source = SourceBuilder::new().text("[").separated(0..items.len()).text("]").finish();
        Ast::build(Node::List, items, source)
    }

    /// Set literal, e.g. `{1, 2}`. The empty set is written `{/}`.
    pub fn set(items: Vec<Ast>) -> Ast {
        let source = if items.is_empty() {
            vec![Fragment::Text("{/}".to_string())]
        } else {
            SourceBuilder::new().text("{").separated(0..items.len()).text("}").finish()
        };
        Ast::build(Node::Set, items, source)
    }

    pub fn unary(op: UnaryOp, obj: Ast) -> Ast {
        let parens = obj.precedence() < op.precedence();
        let source = SourceBuilder::new().text(op.symbol()).operand(0, parens).finish();
        Ast::build(Node::Unary(op), vec![obj], source)
    }

    /// Binary operation, parenthesized for left associativity: a left
    /// operand of the same precedence goes without parentheses, a right one
    /// gets them.
    pub fn binary(op: BinaryOp, left: Ast, right: Ast) -> Ast {
        let precedence = op.precedence();
        let mut builder = SourceBuilder::new();
        if op == BinaryOp::Item {
            builder
                .operand(0, left.precedence() < precedence)
                .text("[")
                .child(1)
                .text("]");
        } else {
            builder
                .operand(0, left.precedence() < precedence)
                .text(op.symbol())
                .operand(1, right.precedence() <= precedence);
        }
        let source = builder.finish();
        Ast::build(Node::Binary(op), vec![left, right], source)
    }

    /// Item access `obj[index]`.
    pub fn item(obj: Ast, index: Ast) -> Ast {
        Ast::binary(BinaryOp::Item, obj, index)
    }

    /// Conditional expression `a if cond else b`.
    pub fn if_else(a: Ast, cond: Ast, b: Ast) -> Ast {
        let precedence = Node::If.precedence();
        let source = SourceBuilder::new()
            .operand(0, a.precedence() <= precedence)
            .text(" if ")
            .operand(1, cond.precedence() <= precedence)
            .text(" else ")
            .operand(2, b.precedence() < precedence)
            .finish();
        Ast::build(Node::If, vec![a, cond, b], source)
    }

    /// Slice `obj[start:stop]`, both indexes are optional.
    pub fn slice(obj: Ast, start: Option<Ast>, stop: Option<Ast>) -> Ast {
        let node = Node::Slice {
            start: start.is_some(),
            stop: stop.is_some(),
        };
        let mut builder = SourceBuilder::new();
        builder.operand(0, obj.precedence() < node.precedence()).text("[");
        if start.is_some() {
            builder.child(1);
        }
        builder.text(":");
        if stop.is_some() {
            builder.child(2);
        }
        builder.text("]");
        let source = builder.finish();
        let silent = || Ast {
            node: Node::Const(Const::None),
            children: Vec::new(),
            source: Vec::new(),
            datatype: Some(DataType::Null),
            error: None,
        };
        let children = vec![obj, start.unwrap_or_else(silent), stop.unwrap_or_else(silent)];
        Ast::build(node, children, source)
    }

    /// Attribute access `obj.name`.
    pub fn attr(obj: Ast, name: &str) -> Ast {
        let node = Node::Attr(name.to_string());
        let source = SourceBuilder::new()
            .operand(0, obj.precedence() < node.precedence())
            .text(".")
            .text(name)
            .finish();
        Ast::build(node, vec![obj], source)
    }

    /// Function call `name(args)`.
    pub fn func(name: &str, args: Vec<Ast>) -> Ast {
        let source = SourceBuilder::new()
            .text(name)
            .text("(")
            .separated(0..args.len())
            .text(")")
            .finish();
        Ast::build(Node::Func(name.to_string()), args, source)
    }

    /// Method call `obj.name(args)`.
    pub fn meth(obj: Ast, name: &str, args: Vec<Ast>) -> Ast {
        let node = Node::Meth(name.to_string());
        let mut children = Vec::with_capacity(args.len() + 1);
        children.push(obj);
        children.extend(args);
        let source = SourceBuilder::new()
            .operand(0, children[0].precedence() < node.precedence())
            .text(".")
            .text(name)
            .text("(")
            .separated(1..children.len())
            .text(")")
            .finish();
        Ast::build(node, children, source)
    }
}

// Validation

impl Ast {
    fn validate(&self) -> Result<DataType, ErrorKind> {
        if self.children.iter().any(|child| child.error.is_some()) {
            return Err(ErrorKind::SubnodeError);
        }
        let types: Vec<DataType> = self.children.iter().filter_map(|child| child.datatype).collect();

        match &self.node {
            Node::Const(c) => Ok(c.datatype()),
            Node::InvalidConst(dt) => Err(const_error(*dt).unwrap_or(ErrorKind::SubnodeTypes)),
            Node::Field(field_ref) => field_ref.field().map(|f| f.datatype()).ok_or(ErrorKind::Field),
            Node::List => collection_type(
                &types,
                DataType::list_of,
                DataType::NullList,
                ErrorKind::ListMixedTypes,
                ErrorKind::ListUnsupportedTypes,
            ),
            Node::Set => collection_type(
                &types,
                DataType::set_of,
                DataType::NullSet,
                ErrorKind::SetMixedTypes,
                ErrorKind::SetUnsupportedTypes,
            ),
            Node::Attr(name) | Node::Func(name) | Node::Meth(name) => {
                let Some((table, _)) = self.table() else {
                    return Err(ErrorKind::SubnodeTypes);
                };
                if let Some(rule) = table.lookup(name, &types) {
                    Ok(rule.result)
                } else if !table.knows_name(name) {
                    Err(ErrorKind::Name)
                } else if !table.accepts_arity(name, types.len()) {
                    Err(ErrorKind::Arity)
                } else {
                    Err(ErrorKind::SubnodeTypes)
                }
            }
            Node::Unary(_) | Node::Binary(_) | Node::If | Node::Slice { .. } => {
                self.rule().map(|rule| rule.result).ok_or(ErrorKind::SubnodeTypes)
            }
        }
    }

    /// Rule table and name key for nodes resolved through a table.
    fn table(&self) -> Option<(&'static RuleTable, &str)> {
        match &self.node {
            Node::Unary(op) => Some((op.table(), "")),
            Node::Binary(op) => Some((op.table(), "")),
            Node::If => Some((&*logic::IF, "")),
            Node::Slice { .. } => Some((&*access::SLICE, "")),
            Node::Attr(name) => Some((&*access::ATTR, name.as_str())),
            Node::Func(name) => Some((&*functions::FUNC, name.as_str())),
            Node::Meth(name) => Some((&*access::METH, name.as_str())),
            _ => None,
        }
    }

    /// The rule matching the types of the children, if this node kind is
    /// resolved through a rule table.
    pub fn rule(&self) -> Option<&'static Rule> {
        let (table, name) = self.table()?;
        let types: Option<Vec<DataType>> = self.children.iter().map(|child| child.datatype).collect();
        table.lookup(name, &types?)
    }
}

/// Type of a list or set literal from the types of its items.
///
/// `None` items don't count; without any other item the result is the
/// null collection.
fn collection_type(
    types: &[DataType],
    of: fn(DataType) -> Option<DataType>,
    empty: DataType,
    mixed: ErrorKind,
    unsupported: ErrorKind,
) -> Result<DataType, ErrorKind> {
    let distinct: BTreeSet<DataType> = types.iter().copied().filter(|dt| *dt != DataType::Null).collect();
    let mut iter = distinct.into_iter();
    match (iter.next(), iter.next()) {
        (None, _) => Ok(empty),
        (Some(item), None) => of(item).ok_or(unsupported),
        (Some(_), Some(_)) => Err(mixed),
    }
}

fn const_error(datatype: DataType) -> Option<ErrorKind> {
    match datatype {
        DataType::Bool => Some(ErrorKind::ConstBool),
        DataType::Int => Some(ErrorKind::ConstInt),
        DataType::Number => Some(ErrorKind::ConstNumber),
        DataType::Date => Some(ErrorKind::ConstDate),
        DataType::DateTime => Some(ErrorKind::ConstDateTime),
        DataType::Color => Some(ErrorKind::ConstColor),
        _ => None,
    }
}

/// Parses the value form of a constant (as used by the JSON format).
pub(crate) fn parse_value(datatype: DataType, text: &str) -> Option<Const> {
    match datatype {
        DataType::Null => Some(Const::None),
        DataType::Bool => match text {
            "1" | "True" => Some(Const::Bool(true)),
            "0" | "False" => Some(Const::Bool(false)),
            _ => None,
        },
        DataType::Int => text.parse().ok().map(Const::Int),
        DataType::Number => text
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Const::Number),
        DataType::Str => Some(Const::Str(text.to_string())),
        DataType::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().map(Const::Date),
        DataType::DateTime => ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .map(|dt| Const::DateTime(dt.with_nanosecond(0).unwrap_or(dt))),
        DataType::Color => Color::parse(text).map(Const::Color),
        _ => None,
    }
}

// Inspection

impl Ast {
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn children(&self) -> &[Ast] {
        &self.children
    }

    /// Result type, `None` if the node is invalid.
    pub fn datatype(&self) -> Option<DataType> {
        self.datatype
    }

    /// Validation error, `None` if the node is valid.
    pub fn error(&self) -> Option<ErrorKind> {
        self.error
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn nodetype(&self) -> &'static str {
        self.node.nodetype()
    }

    pub fn description(&self) -> &'static str {
        self.node.description()
    }

    pub fn precedence(&self) -> u8 {
        self.node.precedence()
    }

    /// Number of operands, the object of a method call included.
    pub fn arity(&self) -> usize {
        self.children.len()
    }

    /// vSQL source of this node.
    pub fn source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    pub(crate) fn write_source(&self, out: &mut String) {
        source::write_source(&self.source, &self.children, out);
    }

    /// The operand types in the shape of the expression, e.g. `INT + STR`
    /// or `STR.find(STR, ?)`, with `?` for operands of unknown type.
    pub fn type_signature(&self) -> String {
        let names: Vec<String> = self.children.iter().map(Ast::datatype_name).collect();
        match &self.node {
            Node::Const(_) | Node::InvalidConst(_) | Node::Field(_) => self.datatype_name(),
            Node::List => format!("[{}]", names.join(", ")),
            Node::Set => format!("{{{}}}", names.join(", ")),
            Node::Unary(op) => format!("{}{}", op.symbol(), names.join("")),
            Node::Binary(BinaryOp::Item) => format!("{}[{}]", names[0], names[1]),
            Node::Binary(op) => format!("{}{}{}", names[0], op.symbol(), names[1]),
            Node::If => format!("{} if {} else {}", names[0], names[1], names[2]),
            Node::Slice { .. } => format!("{}[{}:{}]", names[0], names[1], names[2]),
            Node::Attr(name) => format!("{}.{}", names[0], name),
            Node::Func(name) => format!("{}({})", name, names.join(", ")),
            Node::Meth(name) => format!("{}.{}({})", names[0], name, names[1..].join(", ")),
        }
    }

    fn datatype_name(&self) -> String {
        self.datatype
            .map(DataType::signature_name)
            .unwrap_or_else(|| "?".to_string())
    }

    /// The node that caused this node to be invalid.
    ///
    /// Follows [`ErrorKind::SubnodeError`] down to the first child carrying
    /// a real error. Returns `None` for valid nodes.
    pub fn error_ast(&self) -> Option<&Ast> {
        match self.error? {
            ErrorKind::SubnodeError => self
                .children
                .iter()
                .find_map(Ast::error_ast)
                .or(Some(self)),
            _ => Some(self),
        }
    }

    /// Diagnostic of the node that caused this node to be invalid.
    pub fn error_message(&self) -> Option<String> {
        let origin = self.error_ast()?;
        origin.error.map(|kind| kind.message(origin))
    }

    /// Fails unless the node is valid and of type `expected`.
    ///
    /// # Errors
    ///
    /// The error of the originating node for invalid trees, otherwise an
    /// [`ErrorKind::DataType`] diagnostic.
    pub fn check_datatype(&self, expected: DataType) -> Result<(), VsqlError> {
        self.check()?;
        if self.datatype == Some(expected) {
            Ok(())
        } else {
            Err(ErrorKind::DataType(expected).to_error(self))
        }
    }

    /// Fails if the node is invalid, with the diagnostic of the node that
    /// caused it.
    pub fn check(&self) -> Result<(), VsqlError> {
        match self.error_ast() {
            Some(origin) => {
                let kind = origin.error.unwrap_or(ErrorKind::SubnodeError);
                tracing::debug!(source = %self.source(), error = %kind, "refusing invalid expression");
                Err(kind.to_error(origin))
            }
            None => Ok(()),
        }
    }

    /// All field references in the tree, in source order.
    pub fn field_refs(&self) -> Vec<&FieldRef> {
        let mut refs = Vec::new();
        self.collect_field_refs(&mut refs);
        refs
    }

    fn collect_field_refs<'a>(&'a self, refs: &mut Vec<&'a FieldRef>) {
        if let Node::Field(field_ref) = &self.node {
            refs.push(field_ref);
        }
        for child in &self.children {
            child.collect_field_refs(refs);
        }
    }
}

// SQL

impl Ast {
    /// Renders the SQL for this expression.
    ///
    /// Field references register their joins with `query`.
    ///
    /// # Errors
    ///
    /// Invalid trees fail with the diagnostic of the node that caused the
    /// problem: [`VsqlError::UnsupportedOperation`] for unsupported operand
    /// types, [`VsqlError::FieldUnknown`] for unknown fields and
    /// [`VsqlError::Invalid`] otherwise.
    pub fn sql(&self, query: &mut Query) -> Result<String, VsqlError> {
        self.check()?;
        let mut out = String::new();
        self.write_sql(&mut out, query)?;
        Ok(out)
    }

    fn write_sql(&self, out: &mut String, query: &mut Query) -> Result<(), VsqlError> {
        match &self.node {
            Node::Const(c) => c.write_sql(out),
            Node::Field(field_ref) => {
                let field = field_ref
                    .field()
                    .ok_or_else(|| ErrorKind::Field.to_error(self))?;
                let alias = query.register(field_ref);
                match alias {
                    Some(alias) => out.push_str(&field.field_sql().replace("{a}", &alias)),
                    None => out.push_str(field.field_sql()),
                }
                out.push_str(" /* ");
                self.write_source(out);
                out.push_str(" */");
            }
            Node::List => match self.datatype {
                Some(DataType::NullList) => out.push_str(&self.children.len().to_string()),
                datatype => {
                    out.push_str(match datatype {
                        Some(DataType::IntList) => "integers(",
                        Some(DataType::NumberList) => "numbers(",
                        Some(DataType::StrList) => "varchars(",
                        Some(DataType::ClobList) => "clobs(",
                        _ => "dates(",
                    });
                    self.write_items(out, query)?;
                    out.push(')');
                }
            },
            Node::Set => match self.datatype {
                Some(DataType::NullSet) => out.push(if self.children.is_empty() { '0' } else { '1' }),
                datatype => {
                    out.push_str(match datatype {
                        Some(DataType::IntSet) => "vsqlimpl_pkg.set_intlist(integers(",
                        Some(DataType::NumberSet) => "vsqlimpl_pkg.set_numberlist(numbers(",
                        Some(DataType::StrSet) => "vsqlimpl_pkg.set_strlist(varchars(",
                        _ => "vsqlimpl_pkg.set_datetimelist(dates(",
                    });
                    self.write_items(out, query)?;
                    out.push_str("))");
                }
            },
            Node::InvalidConst(_) => return Err(self.refusal()),
            _ => {
                let rule = self.rule().ok_or_else(|| self.refusal())?;
                rule.template.render(out, |index, out| match self.children.get(index) {
                    Some(child) => child.write_sql(out, query),
                    None => Err(VsqlError::Invalid(format!(
                        "Template for {} `{}` references missing operand {}",
                        self.description(),
                        self.source(),
                        index + 1
                    ))),
                })?;
            }
        }
        Ok(())
    }

    fn write_items(&self, out: &mut String, query: &mut Query) -> Result<(), VsqlError> {
        for (i, item) in self.children.iter().enumerate() {
            if i != 0 {
                out.push_str(", ");
            }
            item.write_sql(out, query)?;
        }
        Ok(())
    }

    fn refusal(&self) -> VsqlError {
        self.error.unwrap_or(ErrorKind::SubnodeTypes).to_error(self)
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parentheses() {
        let sum = Ast::binary(BinaryOp::Sub, Ast::int(1), Ast::int(2));
        let left = Ast::binary(BinaryOp::Sub, sum.clone(), Ast::int(3));
        assert_eq!(left.source(), "1 - 2 - 3");
        let right = Ast::binary(BinaryOp::Sub, Ast::int(3), sum);
        assert_eq!(right.source(), "3 - (1 - 2)");
    }

    #[test]
    fn test_neg_of_sum() {
        let sum = Ast::binary(BinaryOp::Add, Ast::int(1), Ast::int(2));
        assert_eq!(Ast::unary(UnaryOp::Neg, sum).source(), "-(1 + 2)");
        assert_eq!(Ast::unary(UnaryOp::Not, Ast::bool(true)).source(), "not True");
    }

    #[test]
    fn test_slice_source_omits_missing_indexes() {
        let s = Ast::slice(Ast::str("abc"), None, Some(Ast::int(2)));
        assert_eq!(s.source(), "'abc'[:2]");
        assert_eq!(s.children().len(), 3);
        assert_eq!(s.datatype(), Some(DataType::Str));
        assert_eq!(s.type_signature(), "STR[NULL:INT]");
    }

    #[test]
    fn test_attr_and_meth_parenthesize_operators() {
        let sum = Ast::binary(BinaryOp::Add, Ast::str("a"), Ast::str("b"));
        assert_eq!(Ast::meth(sum.clone(), "upper", vec![]).source(), "('a' + 'b').upper()");
        assert_eq!(Ast::attr(Ast::func("today", vec![]), "year").source(), "(today()).year");
        assert_eq!(Ast::meth(Ast::str("a"), "find", vec![Ast::str("b"), Ast::none()]).source(), "'a'.find('b', None)");
    }

    #[test]
    fn test_collection_type() {
        use DataType::*;
        let kinds = (ErrorKind::ListMixedTypes, ErrorKind::ListUnsupportedTypes);
        let infer = |types: &[DataType]| collection_type(types, DataType::list_of, NullList, kinds.0, kinds.1);
        assert_eq!(infer(&[]), Ok(NullList));
        assert_eq!(infer(&[Null, Null]), Ok(NullList));
        assert_eq!(infer(&[Int, Null, Int]), Ok(IntList));
        assert_eq!(infer(&[Int, Number]), Err(ErrorKind::ListMixedTypes));
        assert_eq!(infer(&[Color]), Err(ErrorKind::ListUnsupportedTypes));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value(DataType::Bool, "True"), Some(Const::Bool(true)));
        assert_eq!(parse_value(DataType::Int, "4x"), None);
        assert_eq!(parse_value(DataType::Number, "inf"), None);
        assert!(matches!(parse_value(DataType::DateTime, "2000-02-29T12:34"), Some(Const::DateTime(_))));
        assert_eq!(parse_value(DataType::Geo, "x"), None);
    }
}
