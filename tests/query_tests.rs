use pretty_assertions::assert_eq;
use vsql::ast::BinaryOp;
use vsql::{Ast, Direction, Nulls, Query, Schema, Vars, VsqlError};

const SCHEMA: &str = r#"{
    "groups": {
        "dept": {"table": "dept", "fields": [
            {"identifier": "id", "type": "int", "sql": "{a}.id"},
            {"identifier": "name", "type": "str", "sql": "{a}.name"}
        ]},
        "person": {"table": "person", "fields": [
            {"identifier": "name", "type": "str", "sql": "{a}.name"},
            {"identifier": "age", "type": "int", "sql": "{a}.age"},
            {"identifier": "dept", "type": "int", "sql": "{a}.dept_id",
             "join": "{m}.dept_id = {d}.id", "group": "dept"}
        ]}
    },
    "vars": [
        {"identifier": "p", "type": "int", "sql": "p_id", "join": "{d}.id = p_id", "group": "person"},
        {"identifier": "limit", "type": "int", "sql": "p_limit"}
    ]
}"#;

fn vars() -> Vars {
    Schema::from_json(SCHEMA).unwrap().vars().clone()
}

fn field(vars: &Vars, path: &str) -> Ast {
    Ast::field(vars, path)
}

#[test]
fn test_joins_are_registered_once() {
    let vars = vars();
    let mut query = Query::new(None, vars.clone());
    query.select_vsql(&field(&vars, "p.name"), None, None).unwrap();
    query.select_vsql(&field(&vars, "p.dept.name"), None, None).unwrap();
    query.select_vsql(&field(&vars, "p.dept.id"), None, Some("dept_id")).unwrap();

    assert_eq!(
        query.sql(),
        "select\n\
         \tt1.name /* p.name */,\n\
         \tt2.name /* p.dept.name */,\n\
         \tt2.id /* p.dept.id */ as dept_id\n\
         from\n\
         \tperson /* p */ t1,\n\
         \tdept /* p.dept */ t2\n\
         where\n\
         \t(t1.id = p_id /* p */) and\n\
         \t(t1.dept_id = t2.id /* p.dept */)\n"
    );
}

#[test]
fn test_top_level_variable_needs_no_table() {
    let vars = vars();
    let mut query = Query::new(None, vars.clone());
    let expr = Ast::binary(BinaryOp::Add, field(&vars, "limit"), Ast::int(1));
    query.select_vsql(&expr, Some("next"), None).unwrap();

    assert_eq!(
        query.sql(),
        "select\n\t(p_limit /* limit */ + 1) /* next: limit + 1 */\nfrom\n\tdual\n"
    );
}

#[test]
fn test_where_converts_to_bool() {
    let vars = vars();
    let mut query = Query::new(Some("adults"), vars.clone());
    query.where_vsql(&field(&vars, "p.age"), None).unwrap();
    let cond = Ast::binary(BinaryOp::Eq, field(&vars, "p.name"), Ast::str("x"));
    query.where_vsql(&cond, Some("named x")).unwrap();

    assert_eq!(
        query.sql(),
        "/* adults */\n\
         select\n\
         \t42\n\
         from\n\
         \tperson /* p */ t1\n\
         where\n\
         \t(t1.id = p_id /* p */) and\n\
         \t((case when nvl(t1.age /* p.age */, 0) = 0 then 0 else 1 end) = 1 /* p.age */) and\n\
         \t(vsqlimpl_pkg.eq_str_str(t1.name /* p.name */, 'x') = 1 /* p.name == 'x': named x */)\n"
    );
}

#[test]
fn test_where_deduplicates() {
    let vars = vars();
    let mut query = Query::new(None, vars.clone());
    let cond = Ast::binary(BinaryOp::Gt, field(&vars, "p.age"), Ast::int(17));
    query.where_vsql(&cond, None).unwrap();
    query.where_vsql(&cond, Some("again")).unwrap();
    query.where_sql("1 = 1", None).where_sql("1 = 1", Some("again"));

    let sql = query.sql();
    assert_eq!(sql.matches("t1.age").count(), 1);
    assert_eq!(sql.matches("1 = 1").count(), 1);
}

#[test]
fn test_from_vsql_shares_alias() {
    let vars = vars();
    let mut query = Query::new(None, vars.clone());
    assert_eq!(query.from_vsql("p").unwrap(), Some("t1".to_string()));
    query.select_vsql(&field(&vars, "p.age"), None, None).unwrap();
    assert_eq!(query.from_vsql("p").unwrap(), Some("t1".to_string()));

    assert_eq!(
        query.sql(),
        "select\n\tt1.age /* p.age */\nfrom\n\tperson /* p */ t1\nwhere\n\tt1.id = p_id /* p */\n"
    );
}

#[test]
fn test_from_vsql_unknown() {
    let mut query = Query::new(None, vars());
    let err = query.from_vsql("q").unwrap_err();
    assert!(matches!(err, VsqlError::FieldUnknown(_)));
    assert_eq!(err.to_string(), "Field `q` unknown!");
}

#[test]
fn test_from_sql_and_order_by() {
    let vars = vars();
    let mut query = Query::new(None, vars.clone());
    query.from_sql("audit", Some("log"), Some("a"));
    query.select_sql("a.ts", None, Some("ts")).unwrap();
    query
        .order_by_vsql(&field(&vars, "p.age"), None, Some(Direction::Desc), Some(Nulls::Last))
        .unwrap();
    query.order_by_sql_suffixed("a.ts asc", None);
    query.offset(10).limit(5);

    assert_eq!(
        query.sql(),
        "select\n\
         \ta.ts as ts\n\
         from\n\
         \taudit /* log */ a,\n\
         \tperson /* p */ t2\n\
         where\n\
         \tt2.id = p_id /* p */\n\
         order by\n\
         \tt2.age /* p.age */ desc nulls last,\n\
         \ta.ts asc\n\
         offset 10 rows\n\
         fetch next 5 rows only\n"
    );

    query.no_offset().no_limit();
    assert!(!query.sql().contains("rows"));
}

#[test]
fn test_order_by_vsql_suffixed() {
    let vars = vars();
    let mut query = Query::new(None, vars.clone());
    query.order_by_vsql_suffixed(&field(&vars, "limit"), None, "nulls first").unwrap();
    assert!(query.sql().ends_with("order by\n\tp_limit /* limit */ nulls first\n"));

    let err = query.order_by_vsql_suffixed(&field(&vars, "limit"), None, "sideways").unwrap_err();
    assert!(matches!(err, VsqlError::Invalid(_)));

    // Each kind of suffix is only taken once
    let err = query.order_by_vsql_suffixed(&field(&vars, "limit"), None, "desc desc").unwrap_err();
    assert_eq!(err.to_string(), "Malformed order suffix `desc desc`");
}

#[test]
fn test_order_by_sql_keeps_repeated_suffix() {
    let mut query = Query::new(None, Vars::new());
    query.from_sql("t", None, Some("t"));
    query.order_by_sql_suffixed("t.x desc desc", None);
    assert!(query.sql().ends_with("order by\n\tt.x desc desc\n"));
}

#[test]
fn test_aggregates() {
    let vars = vars();
    let mut query = Query::new(None, vars.clone());
    query.aggregate_vsql(&Ast::func("count", vec![]), None, Some("n")).unwrap();
    query
        .aggregate_vsql(&Ast::func("group", vec![field(&vars, "p.dept.name")]), None, Some("dept"))
        .unwrap();
    query
        .aggregate_vsql(&Ast::func("sum", vec![field(&vars, "p.age")]), Some("years"), None)
        .unwrap();

    assert_eq!(
        query.sql(),
        "select\n\
         \tcount(*) as n,\n\
         \tt2.name /* p.dept.name */ as dept,\n\
         \tsum(t1.age /* p.age */ /* years */)\n\
         from\n\
         \tperson /* p */ t1,\n\
         \tdept /* p.dept */ t2\n\
         where\n\
         \t(t1.id = p_id /* p */) and\n\
         \t(t1.dept_id = t2.id /* p.dept */)\n\
         group by\n\
         \tt2.name /* p.dept.name */\n"
    );
}

#[test]
fn test_malformed_aggregate() {
    let vars = vars();
    let mut query = Query::new(None, vars.clone());
    for expr in [
        Ast::func("len", vec![Ast::str("x")]),
        Ast::func("count", vec![Ast::int(1)]),
        field(&vars, "p.age"),
    ] {
        let err = query.aggregate_vsql(&expr, None, None).unwrap_err();
        assert_eq!(err.to_string(), "Aggregation call is malformed.");
    }
}

#[test]
fn test_mixing_aggregates_and_fields() {
    let vars = vars();
    let mut query = Query::new(None, vars.clone());
    query.select_vsql(&field(&vars, "p.age"), None, None).unwrap();
    let err = query.aggregate_vsql(&Ast::func("count", vec![]), None, None).unwrap_err();
    assert!(matches!(err, VsqlError::MixedAggregation));
    let err = query.group_by_vsql(&field(&vars, "p.age"), None).unwrap_err();
    assert!(matches!(err, VsqlError::MixedAggregation));
}

#[test]
fn test_group_by() {
    let vars = vars();
    let mut query = Query::new(None, vars.clone());
    query.aggregate_sql("count(*)", Some("all"), Some("n")).unwrap();
    query.group_by_vsql(&field(&vars, "p.age"), None).unwrap();
    query.group_by_vsql(&field(&vars, "p.age"), Some("twice")).unwrap();
    query.group_by_sql("1", None).unwrap();

    assert!(query.is_aggregated());
    assert!(query.sql().ends_with("group by\n\tt1.age /* p.age */,\n\t1\n"));
    assert!(query.sql().starts_with("select\n\tcount(*) /* all */ as n\n"));
}

#[test]
fn test_invalid_expressions_are_refused() {
    let vars = vars();
    let mut query = Query::new(None, vars.clone());

    let err = query.select_vsql(&field(&vars, "p.nope"), None, None).unwrap_err();
    assert!(matches!(err, VsqlError::FieldUnknown(_)));

    let bad = Ast::binary(BinaryOp::Sub, field(&vars, "p.name"), Ast::int(1));
    let err = query.where_vsql(&bad, None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Subtraction `p.name - 1` uses unsupported types of operands: STR - INT"
    );

    // Nothing was added
    assert_eq!(query.sql(), "select\n\t42\nfrom\n\tdual\n");
}

#[test]
fn test_group_without_table() {
    let schema = Schema::from_json(
        r#"{
        "groups": {
            "params": {"fields": [
                {"identifier": "foo", "type": "str", "sql": "vsqlimpl_pkg.param('foo')"}
            ]},
            "person": {"table": "person", "fields": [
                {"identifier": "name", "type": "str", "sql": "{a}.name"}
            ]}
        },
        "vars": [
            {"identifier": "params", "type": "null", "sql": "null", "group": "params"},
            {"identifier": "p", "type": "int", "sql": "p_id", "join": "{d}.id = p_id", "group": "person"}
        ]
    }"#,
    )
    .unwrap();
    let vars = schema.vars();
    let mut query = Query::new(None, vars.clone());
    query.select_vsql(&field(vars, "params.foo"), None, None).unwrap();
    query.select_vsql(&field(vars, "p.name"), None, None).unwrap();

    assert_eq!(
        query.sql(),
        "select\n\
         \tvsqlimpl_pkg.param('foo') /* params.foo */,\n\
         \tt1.name /* p.name */\n\
         from\n\
         \tperson /* p */ t1\n\
         where\n\
         \tt1.id = p_id /* p */\n"
    );
    assert_eq!(query.from_vsql("params").unwrap(), None);
}

#[test]
fn test_self_join() {
    let schema = Schema::from_json(
        r#"{
        "groups": {
            "person": {"table": "person", "fields": [
                {"identifier": "name", "type": "str", "sql": "{a}.name"},
                {"identifier": "boss", "type": "int", "sql": "{a}.boss_id",
                 "join": "{m}.boss_id = {d}.id", "group": "person"}
            ]}
        },
        "vars": [
            {"identifier": "p", "type": "int", "sql": "p_id", "join": "{d}.id = p_id", "group": "person"}
        ]
    }"#,
    )
    .unwrap();
    let vars = schema.vars();
    let mut query = Query::new(None, vars.clone());
    query.select_vsql(&field(vars, "p.boss.boss.name"), None, None).unwrap();
    query.select_vsql(&field(vars, "p.boss.name"), None, None).unwrap();

    assert_eq!(
        query.sql(),
        "select\n\
         \tt3.name /* p.boss.boss.name */,\n\
         \tt2.name /* p.boss.name */\n\
         from\n\
         \tperson /* p */ t1,\n\
         \tperson /* p.boss */ t2,\n\
         \tperson /* p.boss.boss */ t3\n\
         where\n\
         \t(t1.id = p_id /* p */) and\n\
         \t(t1.boss_id = t2.id /* p.boss */) and\n\
         \t(t2.boss_id = t3.id /* p.boss.boss */)\n"
    );
}
