//! JSON form of expression trees.
//!
//! ```json
//! {"nodetype": "binop_add", "datatype": "int", "children": [
//!     {"nodetype": "const_int", "datatype": "int", "value": "1"},
//!     {"nodetype": "field", "datatype": "int", "value": "p.age"}
//! ]}
//! ```
//!
//! `datatype` is informational: loading rebuilds every node through its
//! constructor, which validates it again. Slices always have three
//! children, missing indexes are `null`.

use serde::{Deserialize, Serialize};

use super::{Ast, BinaryOp, Node, UnaryOp, parse_value};
use crate::datatype::DataType;
use crate::error::VsqlError;
use crate::schema::Vars;

/// Serialized form of an [`Ast`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dump {
    pub nodetype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Option<Dump>>,
}

impl Ast {
    pub fn dump(&self) -> Dump {
        let value = match &self.node {
            Node::Const(c) => c.value(),
            Node::InvalidConst(_) => Some(self.source()),
            Node::Field(field_ref) => Some(field_ref.full_identifier()),
            Node::Attr(name) | Node::Func(name) | Node::Meth(name) => Some(name.clone()),
            _ => None,
        };
        let children = match &self.node {
            Node::Slice { start, stop } => vec![
                Some(self.children[0].dump()),
                start.then(|| self.children[1].dump()),
                stop.then(|| self.children[2].dump()),
            ],
            _ => self.children.iter().map(|child| Some(child.dump())).collect(),
        };
        Dump {
            nodetype: self.nodetype().to_string(),
            datatype: self.datatype,
            value,
            children,
        }
    }

    /// The JSON form as a [`serde_json::Value`].
    pub fn as_json(&self) -> serde_json::Value {
        serde_json::to_value(self.dump()).unwrap_or(serde_json::Value::Null)
    }

    /// Rebuilds a tree from its serialized form, resolving field references
    /// against `vars`.
    ///
    /// # Errors
    ///
    /// Returns [`VsqlError::Load`] for unknown node types, missing values
    /// and wrong numbers of children.
    pub fn load(dump: &Dump, vars: &Vars) -> Result<Ast, VsqlError> {
        let nodetype = dump.nodetype.as_str();

        if let Some(datatype) = const_type(nodetype) {
            if datatype == DataType::Null {
                return Ok(Ast::none());
            }
            let text = required_value(dump)?;
            if datatype == DataType::Str {
                return Ok(Ast::str(text));
            }
            return Ok(match parse_value(datatype, text) {
                Some(c) => Ast::from_const(c),
                None => Ast::parse_const(datatype, text)?,
            });
        }

        match nodetype {
            "field" => Ok(Ast::field(vars, required_value(dump)?)),
            "list" => Ok(Ast::list(load_children(dump, vars)?)),
            "set" => Ok(Ast::set(load_children(dump, vars)?)),
            "ternop_if" => {
                let [a, cond, b] = load_exact::<3>(dump, vars)?;
                Ok(Ast::if_else(a, cond, b))
            }
            "ternop_slice" => {
                let [obj, start, stop] = load_optional::<3>(dump, vars)?;
                let obj = obj.ok_or_else(|| VsqlError::Load("Slice without object".to_string()))?;
                Ok(Ast::slice(obj, start, stop))
            }
            "attr" => {
                let [obj] = load_exact::<1>(dump, vars)?;
                Ok(Ast::attr(obj, required_value(dump)?))
            }
            "func" => Ok(Ast::func(required_value(dump)?, load_children(dump, vars)?)),
            "meth" => {
                let mut children = load_children(dump, vars)?;
                if children.is_empty() {
                    return Err(VsqlError::Load("Method call without object".to_string()));
                }
                let obj = children.remove(0);
                Ok(Ast::meth(obj, required_value(dump)?, children))
            }
            _ => {
                if let Some(op) = UnaryOp::ALL.into_iter().find(|op| op.nodetype() == nodetype) {
                    let [obj] = load_exact::<1>(dump, vars)?;
                    Ok(Ast::unary(op, obj))
                } else if let Some(op) = BinaryOp::ALL.into_iter().find(|op| op.nodetype() == nodetype) {
                    let [left, right] = load_exact::<2>(dump, vars)?;
                    Ok(Ast::binary(op, left, right))
                } else {
                    Err(VsqlError::Load(format!("Unknown expression type `{}`", nodetype)))
                }
            }
        }
    }

    /// Loads a tree from JSON text.
    ///
    /// # Examples
    ///
    /// ```
    /// use vsql::{Ast, DataType, Vars};
    ///
    /// let json = r#"{"nodetype": "func", "value": "len", "children": [
    ///     {"nodetype": "const_str", "value": "abc"}
    /// ]}"#;
    /// let ast = Ast::from_json(json, &Vars::new()).unwrap();
    /// assert_eq!(ast.source(), "len('abc')");
    /// assert_eq!(ast.datatype(), Some(DataType::Int));
    /// ```
    pub fn from_json(json: &str, vars: &Vars) -> Result<Ast, VsqlError> {
        let dump: Dump = serde_json::from_str(json)?;
        Ast::load(&dump, vars)
    }

    pub fn to_json(&self) -> Result<String, VsqlError> {
        Ok(serde_json::to_string(&self.dump())?)
    }
}

fn const_type(nodetype: &str) -> Option<DataType> {
    match nodetype {
        "const_none" => Some(DataType::Null),
        "const_bool" => Some(DataType::Bool),
        "const_int" => Some(DataType::Int),
        "const_number" => Some(DataType::Number),
        "const_str" => Some(DataType::Str),
        "const_date" => Some(DataType::Date),
        "const_datetime" => Some(DataType::DateTime),
        "const_color" => Some(DataType::Color),
        _ => None,
    }
}

fn required_value(dump: &Dump) -> Result<&str, VsqlError> {
    dump.value
        .as_deref()
        .ok_or_else(|| VsqlError::Load(format!("Expression type `{}` requires a value", dump.nodetype)))
}

fn load_children(dump: &Dump, vars: &Vars) -> Result<Vec<Ast>, VsqlError> {
    dump.children
        .iter()
        .map(|child| match child {
            Some(child) => Ast::load(child, vars),
            None => Err(VsqlError::Load(format!(
                "Expression type `{}` doesn't allow missing children",
                dump.nodetype
            ))),
        })
        .collect()
}

fn load_optional<const N: usize>(dump: &Dump, vars: &Vars) -> Result<[Option<Ast>; N], VsqlError> {
    let children = dump
        .children
        .iter()
        .map(|child| child.as_ref().map(|child| Ast::load(child, vars)).transpose())
        .collect::<Result<Vec<_>, _>>()?;
    children.try_into().map_err(|children: Vec<Option<Ast>>| {
        VsqlError::Load(format!(
            "Expression type `{}` expects {} operands, got {}",
            dump.nodetype,
            N,
            children.len()
        ))
    })
}

fn load_exact<const N: usize>(dump: &Dump, vars: &Vars) -> Result<[Ast; N], VsqlError> {
    let children = load_children(dump, vars)?;
    children.try_into().map_err(|children: Vec<Ast>| {
        VsqlError::Load(format!(
            "Expression type `{}` expects {} operands, got {}",
            dump.nodetype,
            N,
            children.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_dumps_missing_indexes_as_null() {
        let ast = Ast::slice(Ast::str("abc"), Some(Ast::int(1)), None);
        let json = ast.as_json();
        assert_eq!(json["nodetype"], "ternop_slice");
        assert_eq!(json["children"][2], serde_json::Value::Null);
        assert_eq!(json["children"][1]["value"], "1");
    }

    #[test]
    fn test_unknown_nodetype() {
        let err = Ast::from_json(r#"{"nodetype": "binop_pow"}"#, &Vars::new()).unwrap_err();
        assert_eq!(err.to_string(), "Load error: Unknown expression type `binop_pow`");
    }

    #[test]
    fn test_wrong_operand_count() {
        let json = r#"{"nodetype": "cmp_eq", "children": [{"nodetype": "const_none"}]}"#;
        let err = Ast::from_json(json, &Vars::new()).unwrap_err();
        assert!(err.to_string().contains("expects 2 operands, got 1"));
    }

    #[test]
    fn test_malformed_constant_keeps_its_error() {
        let json = r##"{"nodetype": "const_color", "value": "#12"}"##;
        let ast = Ast::from_json(json, &Vars::new()).unwrap();
        assert_eq!(ast.error(), Some(crate::ErrorKind::ConstColor));
        let reloaded = Ast::load(&ast.dump(), &Vars::new()).unwrap();
        assert_eq!(reloaded.error(), Some(crate::ErrorKind::ConstColor));
    }
}
