//! Global functions (`today()`, `len(x)`, `rgb(r, g, b)`, ...).
//!
//! Rows are keyed by the function name and the types of the arguments.
//! The aggregate pseudo functions `count`, `min`, `max`, `sum` and `group`
//! are in here too, so that `count()` type checks like any other call.

use std::sync::LazyLock;

use super::*;
use crate::datatype::Aggregate;

pub static FUNC: LazyLock<RuleTable> = LazyLock::new(build);

fn build() -> RuleTable {
    let mut t = RuleTable::new("func");

    t.add("today", Date, &[], "trunc(sysdate)");
    t.add("now", DateTime, &[], "sysdate");

    // Conversions
    t.add("bool", Bool, &[], "0");
    for &dt in ALL {
        t.add("bool", Bool, &[&[dt]], &truth_sql(dt, "{1}"));
    }

    t.add("int", Int, &[], "0");
    t.add("int", Int, &[BOOL_INT], "{1}");
    t.add("int", Int, &[NUMBER], "vsqlimpl_pkg.int_number({1})");
    t.add("int", Int, &[STR], "vsqlimpl_pkg.int_str({1})");
    t.add("int", Int, &[CLOB], "vsqlimpl_pkg.int_clob({1})");

    t.add("float", Number, &[], "0.0");
    t.add("float", Number, &[NUMERIC], "{1}");
    t.add("float", Number, &[STR], "vsqlimpl_pkg.float_str({1})");
    t.add("float", Number, &[CLOB], "vsqlimpl_pkg.float_clob({1})");

    t.add("geo", Geo, &[NUMERIC, NUMERIC], "vsqlimpl_pkg.geo_number_number_str({1}, {2}, null)");
    t.add("geo", Geo, &[NUMERIC, NUMERIC, STR], "vsqlimpl_pkg.geo_number_number_str({1}, {2}, {3})");

    t.add("str", Str, &[], "null");
    t.add("str", Str, &[NULL], "null");
    t.add("str", Str, &[STR], "{1}");
    t.add("str", Clob, &[CLOB], "{1}");
    t.add("str", Str, &[BOOL], "(case {1} when 0 then 'False' when null then 'None' else 'True' end)");
    t.add("str", Str, &[INT], "to_char({1})");
    t.add("str", Str, &[NUMBER], "vsqlimpl_pkg.str_number({1})");
    t.add("str", Str, &[GEO], "vsqlimpl_pkg.repr_geo({1})");
    t.add("str", Str, &[DATE], "to_char({1}, 'YYYY-MM-DD')");
    t.add("str", Str, &[DATETIME], "to_char({1}, 'YYYY-MM-DD HH24:MI:SS')");
    for &dt in [NULLLIST, LISTS, NULLSET, SETS].concat().iter() {
        t.add("str", Str, &[&[dt]], &format!("vsqlimpl_pkg.repr_{}({{1}})", dt.name()));
    }
    for &dt in [Color, DateDelta, DateTimeDelta, MonthDelta].iter() {
        t.add("str", Str, &[&[dt]], &format!("vsqlimpl_pkg.str_{}({{1}})", dt.name()));
    }

    t.add("repr", Str, &[NULL], "'None'");
    t.add("repr", Str, &[BOOL], "(case {1} when 0 then 'False' when null then 'None' else 'True' end)");
    for &dt in NOT_NULL.iter().filter(|&&dt| dt != Bool) {
        let result = if matches!(dt, Clob | ClobList) { Clob } else { Str };
        t.add("repr", result, &[&[dt]], &format!("vsqlimpl_pkg.repr_{}({{1}})", dt.name()));
    }

    t.add("date", Date, &[INT, INT, INT], "vsqlimpl_pkg.date_int({1}, {2}, {3})");
    t.add("date", Date, &[DATETIME], "trunc({1})");

    t.add("datetime", DateTime, &[INT, INT, INT], "vsqlimpl_pkg.datetime_int({1}, {2}, {3})");
    t.add("datetime", DateTime, &[INT, INT, INT, INT], "vsqlimpl_pkg.datetime_int({1}, {2}, {3}, {4})");
    t.add(
        "datetime",
        DateTime,
        &[INT, INT, INT, INT, INT],
        "vsqlimpl_pkg.datetime_int({1}, {2}, {3}, {4}, {5})",
    );
    t.add(
        "datetime",
        DateTime,
        &[INT, INT, INT, INT, INT, INT],
        "vsqlimpl_pkg.datetime_int({1}, {2}, {3}, {4}, {5}, {6})",
    );
    t.add("datetime", DateTime, &[DATE], "{1}");
    t.add("datetime", DateTime, &[DATE, INT], "({1} + {2}/24)");
    t.add("datetime", DateTime, &[DATE, INT, INT], "({1} + {2}/24 + {3}/24/60)");
    t.add(
        "datetime",
        DateTime,
        &[DATE, INT, INT, INT],
        "({1} + {2}/24 + {3}/24/60 + {4}/24/60/60)",
    );

    // Collections
    t.add("len", Int, &[&[Str, Clob]], "nvl(length({1}), 0)");
    t.add("len", Int, &[NULLLIST], "{1}");
    t.add("len", Int, &[NULLSET], "case when {1} > 0 then 1 else {1} end");
    for &dt in [LISTS, SETS].concat().iter() {
        t.add("len", Int, &[&[dt]], &format!("vsqlimpl_pkg.len_{}({{1}})", list_impl(dt)));
    }

    t.add("list", StrList, &[STR], "vsqlimpl_pkg.list_str({1})");
    t.add("list", StrList, &[CLOB], "vsqlimpl_pkg.list_clob({1})");
    for &dt in [NULLLIST, LISTS].concat().iter() {
        t.add("list", dt, &[&[dt]], "{1}");
    }
    for &dt in [NULLSET, SETS].concat().iter() {
        if let Some(list) = dt.item_type().and_then(DataType::list_of) {
            t.add("list", list, &[&[dt]], "{1}");
        }
    }

    t.add("set", StrSet, &[STR], "vsqlimpl_pkg.set_str({1})");
    t.add("set", StrSet, &[CLOB], "vsqlimpl_pkg.set_clob({1})");
    for &dt in SETS {
        t.add("set", dt, &[&[dt]], "{1}");
    }
    t.add("set", NullSet, &[NULLLIST], "case when {1} > 0 then 1 else {1} end");
    t.add("set", IntSet, &[&[IntList]], "vsqlimpl_pkg.set_intlist({1})");
    t.add("set", NumberSet, &[&[NumberList]], "vsqlimpl_pkg.set_numberlist({1})");
    t.add("set", StrSet, &[&[StrList]], "vsqlimpl_pkg.set_strlist({1})");
    t.add("set", DateSet, &[&[DateList]], "vsqlimpl_pkg.set_datetimelist({1})");
    t.add("set", DateTimeSet, &[&[DateTimeList]], "vsqlimpl_pkg.set_datetimelist({1})");

    // Deltas
    t.add("timedelta", DateDelta, &[], "0");
    t.add("timedelta", DateDelta, &[INT], "{1}");
    t.add("timedelta", DateTimeDelta, &[INT, INT], "({1} + {2}/86400)");
    t.add("monthdelta", MonthDelta, &[], "0");
    t.add("monthdelta", MonthDelta, &[INT], "{1}");
    t.add("years", MonthDelta, &[INT], "(12 * {1})");
    t.add("months", MonthDelta, &[INT], "{1}");
    t.add("weeks", DateDelta, &[INT], "(7 * {1})");
    t.add("days", DateDelta, &[INT], "{1}");
    t.add("hours", DateTimeDelta, &[INT], "({1} / 24)");
    t.add("minutes", DateTimeDelta, &[INT], "({1} / 1440)");
    t.add("seconds", DateTimeDelta, &[INT], "({1} / 86400)");

    // Misc
    t.add("md5", Str, &[STR], "lower(rawtohex(dbms_crypto.hash(utl_raw.cast_to_raw({1}), 2)))");
    t.add("random", Number, &[], "dbms_random.value");
    t.add("randrange", Int, &[INT, INT], "floor(dbms_random.value({1}, {2}))");
    t.add("seq", Int, &[], "livingapi_pkg.seq()");
    t.add("rgb", Color, &[NUMERIC, NUMERIC, NUMERIC], "vsqlimpl_pkg.rgb({1}, {2}, {3})");
    t.add(
        "rgb",
        Color,
        &[NUMERIC, NUMERIC, NUMERIC, NUMERIC],
        "vsqlimpl_pkg.rgb({1}, {2}, {3}, {4})",
    );
    t.add("dist", Number, &[GEO, GEO], "vsqlimpl_pkg.dist_geo_geo({1}, {2})");

    // Math
    t.add("abs", Int, &[BOOL], "{1}");
    t.add("abs", Int, &[INT], "abs({1})");
    t.add("abs", Number, &[NUMBER], "abs({1})");
    t.add("cos", Number, &[NUMERIC], "cos({1})");
    t.add("sin", Number, &[NUMERIC], "sin({1})");
    t.add("tan", Number, &[NUMERIC], "tan({1})");
    t.add("sqrt", Number, &[NUMERIC], "sqrt(case when {1} >= 0 then {1} else null end)");

    // Request and global state of the application
    t.add("request_id", Str, &[], "livingapi_pkg.reqid");
    t.add("request_method", Str, &[], "livingapi_pkg.reqmethod");
    t.add("request_url", Str, &[], "livingapi_pkg.requrl");
    t.add("request_header_str", Str, &[STR], "livingapi_pkg.reqheader_str({1})");
    t.add("request_header_strlist", StrList, &[STR], "livingapi_pkg.reqheader_str({1})");
    t.add("request_cookie", Str, &[STR], "livingapi_pkg.reqcookie_str({1})");
    t.add("request_param_str", Str, &[STR], "livingapi_pkg.reqparam_str({1})");
    t.add("request_param_strlist", StrList, &[STR], "livingapi_pkg.reqparam_strlist({1})");
    t.add("request_param_int", Int, &[STR], "livingapi_pkg.reqparam_int({1})");
    t.add("request_param_intlist", IntList, &[STR], "livingapi_pkg.reqparam_intlist({1})");
    t.add("request_param_float", Number, &[STR], "livingapi_pkg.reqparam_float({1})");
    t.add("request_param_floatlist", NumberList, &[STR], "livingapi_pkg.reqparam_floatlist({1})");
    t.add("request_param_date", Date, &[STR], "livingapi_pkg.reqparam_date({1})");
    t.add("request_param_datelist", DateList, &[STR], "livingapi_pkg.reqparam_datelist({1})");
    t.add("request_param_datetime", DateTime, &[STR], "livingapi_pkg.reqparam_datetime({1})");
    t.add(
        "request_param_datetimelist",
        DateTimeList,
        &[STR],
        "livingapi_pkg.reqparam_datetimelist({1})",
    );
    t.add("search", Str, &[], "livingapi_pkg.global_search");
    t.add("lang", Str, &[], "livingapi_pkg.global_lang");
    t.add("mode", Str, &[], "livingapi_pkg.global_mode");

    // Aggregates
    t.add("count", Int, &[], "count(*)");
    for &dt in ALL {
        for aggregate in [Aggregate::Min, Aggregate::Max, Aggregate::Sum] {
            if dt.permits(aggregate) {
                let result = if dt == Bool && aggregate == Aggregate::Sum { Int } else { dt };
                t.add(aggregate.name(), result, &[&[dt]], &format!("{}({{1}})", aggregate.name()));
            }
        }
        if dt.permits(Aggregate::Group) {
            t.add("group", dt, &[&[dt]], "{1}");
        }
    }

    t.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(name: &str, types: &[DataType]) -> Template {
        FUNC.lookup(name, types).unwrap().template.clone()
    }

    #[test]
    fn test_conversions() {
        assert_eq!(template("int", &[Number]), Template::parse("vsqlimpl_pkg.int_number({1})"));
        assert_eq!(template("bool", &[DateSet]), Template::parse("vsqlimpl_pkg.bool_datetimelist({1})"));
        assert_eq!(FUNC.lookup("str", &[Clob]).unwrap().result, Clob);
        assert_eq!(FUNC.lookup("repr", &[ClobList]).unwrap().result, Clob);
        assert_eq!(template("repr", &[Date]), Template::parse("vsqlimpl_pkg.repr_date({1})"));
    }

    #[test]
    fn test_collections() {
        assert_eq!(FUNC.lookup("list", &[DateSet]).unwrap().result, DateList);
        assert_eq!(FUNC.lookup("list", &[NullSet]).unwrap().result, NullList);
        assert_eq!(template("len", &[StrSet]), Template::parse("vsqlimpl_pkg.len_strlist({1})"));
        assert!(FUNC.lookup("set", &[ClobList]).is_none());
    }

    #[test]
    fn test_rgb_accepts_mixed_numbers() {
        assert!(FUNC.lookup("rgb", &[Int, Number, Bool]).is_some());
        assert!(FUNC.lookup("rgb", &[Int, Int, Int, Number]).is_some());
        assert!(FUNC.lookup("rgb", &[Int, Int]).is_none());
        assert!(FUNC.accepts_arity("rgb", 4));
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(template("count", &[]), Template::parse("count(*)"));
        assert_eq!(FUNC.lookup("sum", &[Bool]).unwrap().result, Int);
        assert!(FUNC.lookup("sum", &[Str]).is_none());
        assert_eq!(template("group", &[Str]), Template::parse("{1}"));
    }
}
