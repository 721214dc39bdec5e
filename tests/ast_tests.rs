use std::sync::Arc;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use vsql::ast::{BinaryOp, UnaryOp};
use vsql::{Ast, DataType, ErrorKind, Field, Group, Query, Vars, VsqlError};

fn sql(ast: &Ast) -> Result<String, VsqlError> {
    let mut query = Query::new(None, Vars::new());
    ast.sql(&mut query)
}

fn person_vars() -> Vars {
    let mut person = Group::new(Some("person"));
    person.add_field(Field::new("name", DataType::Str, "{a}.name"));
    person.add_field(Field::new("born", DataType::Date, "{a}.born"));
    let mut vars = Vars::new();
    vars.insert(
        "p".to_string(),
        Arc::new(Field::new("p", DataType::Int, "p_id").with_ref(Some("{d}.id = p_id"), Arc::new(person))),
    );
    vars
}

#[test]
fn test_arithmetic_types() {
    let ast = Ast::binary(BinaryOp::Add, Ast::int(1), Ast::number(2.5));
    assert_eq!(ast.datatype(), Some(DataType::Number));
    assert_eq!(sql(&ast).unwrap(), "(1 + 2.5)");

    let ast = Ast::binary(BinaryOp::Add, Ast::str("a"), Ast::str("b"));
    assert_eq!(ast.datatype(), Some(DataType::Str));
    assert_eq!(sql(&ast).unwrap(), "('a' || 'b')");
}

#[test]
fn test_unsupported_operand_types() {
    let ast = Ast::binary(BinaryOp::Add, Ast::int(1), Ast::str("x"));
    assert_eq!(ast.datatype(), None);
    assert_eq!(ast.error(), Some(ErrorKind::SubnodeTypes));
    let err = sql(&ast).unwrap_err();
    assert!(matches!(err, VsqlError::UnsupportedOperation(_)));
    assert_eq!(err.to_string(), "Addition `1 + 'x'` uses unsupported types of operands: INT + STR");
}

#[test]
fn test_errors_propagate_to_parents() {
    let bad = Ast::binary(BinaryOp::Add, Ast::int(1), Ast::str("x"));
    let outer = Ast::unary(UnaryOp::Neg, Ast::binary(BinaryOp::Mul, bad, Ast::int(2)));
    assert_eq!(outer.error(), Some(ErrorKind::SubnodeError));
    assert_eq!(outer.error_ast().map(Ast::source), Some("1 + 'x'".to_string()));
    assert_eq!(
        outer.error_message().unwrap(),
        "Addition `1 + 'x'` uses unsupported types of operands: INT + STR"
    );
    assert_eq!(outer.source(), "-((1 + 'x') * 2)");
}

#[test]
fn test_function_diagnostics() {
    let unknown = Ast::func("nope", vec![]);
    assert_eq!(unknown.error(), Some(ErrorKind::Name));
    assert_eq!(
        unknown.error_message().unwrap(),
        "Unknown attribute/function/method name in function call `nope()`"
    );

    let arity = Ast::func("len", vec![]);
    assert_eq!(arity.error(), Some(ErrorKind::Arity));
    assert_eq!(
        arity.error_message().unwrap(),
        "Function call `len()` uses unsupported number of operands: 0"
    );

    let types = Ast::func("len", vec![Ast::int(1)]);
    assert_eq!(types.error(), Some(ErrorKind::SubnodeTypes));
    assert_eq!(
        types.error_message().unwrap(),
        "Function call `len(1)` uses unsupported types of operands: len(INT)"
    );
}

#[test]
fn test_list_literals() {
    let ints = Ast::list(vec![Ast::int(1), Ast::none(), Ast::int(2)]);
    assert_eq!(ints.datatype(), Some(DataType::IntList));
    assert_eq!(sql(&ints).unwrap(), "integers(1, null, 2)");

    let nulls = Ast::list(vec![Ast::none(), Ast::none()]);
    assert_eq!(nulls.datatype(), Some(DataType::NullList));
    assert_eq!(sql(&nulls).unwrap(), "2");

    let mixed = Ast::list(vec![Ast::int(1), Ast::str("a")]);
    assert_eq!(mixed.error(), Some(ErrorKind::ListMixedTypes));
    assert_eq!(
        mixed.error_message().unwrap(),
        "List contains incompatible types in list expression `[1, 'a']`: [INT, STR]"
    );
}

#[test]
fn test_set_literals() {
    let empty = Ast::set(vec![]);
    assert_eq!(empty.source(), "{/}");
    assert_eq!(empty.datatype(), Some(DataType::NullSet));
    assert_eq!(sql(&empty).unwrap(), "0");

    let strs = Ast::set(vec![Ast::str("a"), Ast::str("b")]);
    assert_eq!(strs.datatype(), Some(DataType::StrSet));
    assert_eq!(sql(&strs).unwrap(), "vsqlimpl_pkg.set_strlist(varchars('a', 'b'))");
}

#[test]
fn test_constants() {
    let date = NaiveDate::from_ymd_opt(2000, 2, 29).unwrap();
    assert_eq!(sql(&Ast::date(date)).unwrap(), "to_date('2000-02-29', 'YYYY-MM-DD')");
    let datetime = date.and_hms_opt(12, 34, 56).unwrap();
    assert_eq!(
        sql(&Ast::datetime(datetime)).unwrap(),
        "to_date('2000-02-29 12:34:56', 'YYYY-MM-DD HH24:MI:SS')"
    );
    assert_eq!(sql(&Ast::bool(true)).unwrap(), "1");
    assert_eq!(sql(&Ast::none()).unwrap(), "null");
    assert_eq!(sql(&Ast::str("it's")).unwrap(), "'it''s'");

    let nan = Ast::number(f64::NAN);
    assert_eq!(nan.error(), Some(ErrorKind::ConstNumber));
    assert!(matches!(sql(&nan), Err(VsqlError::Invalid(_))));
}

#[test]
fn test_parse_const() {
    let color = Ast::parse_const(DataType::Color, "#fff").unwrap();
    assert_eq!(color.datatype(), Some(DataType::Color));

    let bad = Ast::parse_const(DataType::Int, "12x").unwrap();
    assert_eq!(bad.error(), Some(ErrorKind::ConstInt));

    assert!(matches!(Ast::parse_const(DataType::IntList, "[1]"), Err(VsqlError::Load(_))));
}

#[test]
fn test_equality_with_null() {
    let both = Ast::binary(BinaryOp::Eq, Ast::none(), Ast::none());
    assert_eq!(sql(&both).unwrap(), "1");

    let ne = Ast::binary(BinaryOp::Ne, Ast::int(1), Ast::none());
    assert_eq!(sql(&ne).unwrap(), "(case when 1 is null then 0 else 1 end)");
}

#[test]
fn test_field_references() {
    let vars = person_vars();
    let born = Ast::field(&vars, "p.born");
    assert_eq!(born.datatype(), Some(DataType::Date));

    let year = Ast::attr(born, "year");
    assert_eq!(year.datatype(), Some(DataType::Int));
    assert_eq!(year.source(), "p.born.year");

    let mut query = Query::new(None, vars.clone());
    assert_eq!(year.sql(&mut query).unwrap(), "extract(year from t1.born /* p.born */)");

    let unknown = Ast::field(&vars, "p.shoe_size");
    assert_eq!(unknown.error(), Some(ErrorKind::Field));
    assert_eq!(
        unknown.error_message().unwrap(),
        "Field unknown in field reference `p.shoe_size`"
    );
}

#[test]
fn test_field_refs_in_source_order() {
    let vars = person_vars();
    let cond = Ast::if_else(
        Ast::field(&vars, "p.name"),
        Ast::binary(BinaryOp::Is, Ast::field(&vars, "p.born"), Ast::none()),
        Ast::str("?"),
    );
    let paths: Vec<String> = cond.field_refs().iter().map(|r| r.full_identifier()).collect();
    assert_eq!(paths, vec!["p.name", "p.born"]);
    assert_eq!(cond.source(), "p.name if p.born is None else '?'");
}

#[test]
fn test_check_datatype() {
    let ast = Ast::func("len", vec![Ast::str("abc")]);
    assert!(ast.check_datatype(DataType::Int).is_ok());
    let err = ast.check_datatype(DataType::Str).unwrap_err();
    assert_eq!(err.to_string(), "Function call `len('abc')` should be of type `STR` but is `INT`");
}

#[test]
fn test_json_round_trip_revalidates() {
    let vars = person_vars();
    let ast = Ast::meth(Ast::field(&vars, "p.name"), "upper", vec![]);
    let json = ast.to_json().unwrap();

    let reloaded = Ast::from_json(&json, &vars).unwrap();
    assert_eq!(reloaded, ast);

    // The same tree against a schema without `p` is a broken reference
    let orphan = Ast::from_json(&json, &Vars::new()).unwrap();
    assert_eq!(orphan.error(), Some(ErrorKind::SubnodeError));
    assert_eq!(orphan.error_ast().and_then(Ast::error), Some(ErrorKind::Field));
}

#[test]
fn test_none_is_no_number() {
    let ast = Ast::binary(BinaryOp::Add, Ast::none(), Ast::int(1));
    assert_eq!(ast.error(), Some(ErrorKind::SubnodeTypes));
    assert_eq!(
        sql(&ast).unwrap_err().to_string(),
        "Addition `None + 1` uses unsupported types of operands: NULL + INT"
    );
}

#[test]
fn test_equality_of_unrelated_types() {
    let ast = Ast::binary(BinaryOp::Eq, Ast::bool(true), Ast::str("x"));
    assert_eq!(ast.datatype(), Some(DataType::Bool));
    assert_eq!(sql(&ast).unwrap(), "(case when 1 is null and 'x' is null then 1 else 0 end)");
}

#[test]
fn test_binary_operand_types_follow_rule_tables() {
    let mut vars = Vars::new();
    for dt in DataType::ALL {
        vars.insert(dt.name().to_string(), Arc::new(Field::new(dt.name(), dt, "x")));
    }
    for op in BinaryOp::ALL {
        for a in DataType::ALL {
            for b in DataType::ALL {
                let ast = Ast::binary(op, Ast::field(&vars, a.name()), Ast::field(&vars, b.name()));
                let supported = op.table().lookup("", &[a, b]).is_some();
                if supported {
                    assert_eq!(ast.error(), None, "{}", ast.source());
                } else {
                    assert_eq!(ast.error(), Some(ErrorKind::SubnodeTypes), "{}", ast.source());
                    assert!(matches!(sql(&ast), Err(VsqlError::UnsupportedOperation(_))));
                }
            }
        }
    }
}

#[test]
fn test_json_round_trip_keeps_errors() {
    let vars = Vars::new();
    for ast in [
        Ast::func("nope", vec![]),
        Ast::func("len", vec![]),
        Ast::list(vec![Ast::int(1), Ast::str("a")]),
        Ast::slice(Ast::str("abc"), None, Some(Ast::int(2))),
        Ast::slice(Ast::int(1), Some(Ast::int(0)), None),
    ] {
        let reloaded = Ast::from_json(&ast.to_json().unwrap(), &vars).unwrap();
        assert_eq!(reloaded.source(), ast.source());
        assert_eq!(reloaded.error(), ast.error());
        assert_eq!(reloaded, ast);
    }
    assert_eq!(Ast::slice(Ast::str("abc"), None, Some(Ast::int(2))).source(), "'abc'[:2]");
}
