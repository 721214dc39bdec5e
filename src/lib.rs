//! vSQL: a small typed expression language compiled to Oracle SQL.
//!
//! Expressions are built as [`Ast`] trees that type check themselves
//! against the operator [`rules`], and are rendered into SQL for a
//! [`Query`], which collects the tables and joins that field references
//! need.

pub mod ast;
pub mod datatype;
pub mod error;
pub mod query;
pub mod rules;
pub mod schema;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{Ast, BinaryOp, Dump, UnaryOp};
pub use datatype::{Aggregate, DataType};
pub use error::{ErrorKind, VsqlError};
pub use query::{Direction, Nulls, Query};
pub use schema::{Field, Group, Schema, Vars};
pub use value::{Color, Value};
