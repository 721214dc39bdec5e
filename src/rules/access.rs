//! Item access, slicing, attributes and methods.
//!
//! For attributes and methods the object is operand `{1}` and method
//! arguments follow as `{2}`, `{3}`, ...

use std::sync::LazyLock;

use super::*;

pub static ITEM: LazyLock<RuleTable> = LazyLock::new(item);
pub static SLICE: LazyLock<RuleTable> = LazyLock::new(slice);
pub static ATTR: LazyLock<RuleTable> = LazyLock::new(attr);
pub static METH: LazyLock<RuleTable> = LazyLock::new(meth);

fn item() -> RuleTable {
    let mut t = RuleTable::new("item");
    t.add("", Null, &[NULLLIST, BOOL_INT], "null");
    let rows = [
        (Str, Str),
        (Clob, Str),
        (StrList, Str),
        (ClobList, Clob),
        (IntList, Int),
        (NumberList, Number),
        (DateList, Date),
        (DateTimeList, DateTime),
    ];
    for (container, result) in rows {
        t.add(
            "",
            result,
            &[&[container], BOOL_INT],
            &format!("vsqlimpl_pkg.item_{}({{1}}, {{2}})", list_impl(container)),
        );
    }
    t.finish()
}

fn slice() -> RuleTable {
    let mut t = RuleTable::new("slice");
    for dt in [Str, Clob, NullList, IntList, NumberList, StrList, ClobList, DateList, DateTimeList] {
        t.add(
            "",
            dt,
            &[&[dt], NULL_BOOL_INT, NULL_BOOL_INT],
            &format!("vsqlimpl_pkg.slice_{}({{1}}, {{2}}, {{3}})", list_impl(dt)),
        );
    }
    t.finish()
}

fn attr() -> RuleTable {
    let mut t = RuleTable::new("attr");

    t.add("year", Int, &[TEMPORAL], "extract(year from {1})");
    t.add("month", Int, &[TEMPORAL], "extract(month from {1})");
    t.add("day", Int, &[TEMPORAL], "extract(day from {1})");
    t.add("hour", Int, &[DATETIME], "to_number(to_char({1}, 'HH24'))");
    t.add("minute", Int, &[DATETIME], "to_number(to_char({1}, 'MI'))");
    t.add("second", Int, &[DATETIME], "to_number(to_char({1}, 'SS'))");
    t.add("weekday", Int, &[TEMPORAL], "(to_char({1}, 'D')-1)");
    t.add("yearday", Int, &[TEMPORAL], "to_number(to_char({1}, 'DDD'))");

    t.add("days", Int, &[&[DateDelta, DateTimeDelta]], "trunc({1})");
    t.add("seconds", Int, &[DATETIMEDELTA], "trunc(mod({1}, 1) * 86400 + 0.5)");
    t.add("total_days", Number, &[DATETIMEDELTA], "{1}");
    t.add("total_hours", Number, &[DATETIMEDELTA], "({1} * 24)");
    t.add("total_minutes", Number, &[DATETIMEDELTA], "({1} * 1440)");
    t.add("total_seconds", Number, &[DATETIMEDELTA], "({1} * 86400)");

    t.add("r", Int, &[COLOR], "vsqlimpl_pkg.attr_color_r({1})");
    t.add("g", Int, &[COLOR], "vsqlimpl_pkg.attr_color_g({1})");
    t.add("b", Int, &[COLOR], "vsqlimpl_pkg.attr_color_b({1})");
    t.add("a", Int, &[COLOR], "vsqlimpl_pkg.attr_color_a({1})");

    t.add("lat", Number, &[GEO], "vsqlimpl_pkg.attr_geo_lat({1})");
    t.add("long", Number, &[GEO], "vsqlimpl_pkg.attr_geo_long({1})");
    t.add("info", Str, &[GEO], "vsqlimpl_pkg.attr_geo_info({1})");

    t.finish()
}

fn meth() -> RuleTable {
    let mut t = RuleTable::new("meth");

    for dt in [Str, Clob] {
        let name = dt.name();
        t.add("lower", dt, &[&[dt]], "lower({1})");
        t.add("upper", dt, &[&[dt]], "upper({1})");

        for arg in [Str, StrList] {
            t.add(
                "startswith",
                Bool,
                &[&[dt], &[arg]],
                &format!("vsqlimpl_pkg.startswith_{}_{}({{1}}, {{2}})", name, arg.name()),
            );
            t.add(
                "endswith",
                Bool,
                &[&[dt], &[arg]],
                &format!("vsqlimpl_pkg.endswith_{}_{}({{1}}, {{2}})", name, arg.name()),
            );
        }

        for (method, flags) in [("strip", "1, 1"), ("lstrip", "1, 0"), ("rstrip", "0, 1")] {
            t.add(method, dt, &[&[dt]], &format!("vsqlimpl_pkg.strip_{}({{1}}, null, {})", name, flags));
            t.add(
                method,
                dt,
                &[&[dt], STR],
                &format!("vsqlimpl_pkg.strip_{}({{1}}, {{2}}, {})", name, flags),
            );
        }

        for arg in [Str, Clob] {
            let helper = format!("vsqlimpl_pkg.find_{}_{}", name, arg.name());
            t.add("find", Int, &[&[dt], &[arg]], "(instr({1}, {2}) - 1)");
            t.add("find", Int, &[&[dt], &[arg], NULL], "(instr({1}, {2}) - 1)");
            t.add("find", Int, &[&[dt], &[arg], NULL, NULL], "(instr({1}, {2}) - 1)");
            t.add("find", Int, &[&[dt], &[arg], INT], &format!("{}({{1}}, {{2}}, {{3}}, null)", helper));
            t.add("find", Int, &[&[dt], &[arg], NULL, INT], &format!("{}({{1}}, {{2}}, {{3}}, {{4}})", helper));
            t.add("find", Int, &[&[dt], &[arg], INT, &[Null, Int]], &format!("{}({{1}}, {{2}}, {{3}}, {{4}})", helper));
        }

        t.add("replace", dt, &[&[dt], STR, STR], "replace({1}, {2}, {3})");

        let list = if dt == Str { StrList } else { ClobList };
        let split = format!("vsqlimpl_pkg.split_{}_str", name);
        t.add("split", list, &[&[dt]], &format!("{}({{1}}, null)", split));
        t.add("split", list, &[&[dt], NULL], &format!("{}(null, null)", split));
        t.add("split", list, &[&[dt], STR], &format!("{}({{1}}, {{2}})", split));
        t.add("split", list, &[&[dt], STR, NULL], &format!("{}({{1}}, {{2}})", split));
        t.add("split", list, &[&[dt], NULL, BOOL_INT], &format!("{}({{1}}, null, {{3}})", split));
        t.add("split", list, &[&[dt], STR, BOOL_INT], &format!("{}({{1}}, {{2}}, {{3}})", split));
    }

    t.add("join", Str, &[STR, STR], "vsqlimpl_pkg.join_str_str({1}, {2})");
    t.add("join", Str, &[STR, &[StrList]], "vsqlimpl_pkg.join_str_strlist({1}, {2})");
    t.add("join", Clob, &[STR, CLOB], "vsqlimpl_pkg.join_str_clob({1}, {2})");
    t.add("join", Clob, &[STR, &[ClobList]], "vsqlimpl_pkg.join_str_cloblist({1}, {2})");

    t.add("lum", Number, &[COLOR], "vsqlimpl_pkg.lum({1})");
    t.add("week", Int, &[TEMPORAL], "to_number(to_char({1}, 'IW'))");

    t.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item() {
        assert_eq!(ITEM.lookup("", &[Clob, Int]).unwrap().result, Str);
        assert_eq!(ITEM.lookup("", &[DateList, Bool]).unwrap().result, Date);
        assert_eq!(
            ITEM.lookup("", &[DateTimeList, Int]).unwrap().template,
            Template::parse("vsqlimpl_pkg.item_datetimelist({1}, {2})")
        );
        assert!(ITEM.lookup("", &[IntSet, Int]).is_none());
    }

    #[test]
    fn test_slice() {
        assert_eq!(SLICE.len(), 9 * 9);
        assert_eq!(
            SLICE.lookup("", &[DateList, Null, Int]).unwrap().template,
            Template::parse("vsqlimpl_pkg.slice_datetimelist({1}, {2}, {3})")
        );
    }

    #[test]
    fn test_attributes() {
        assert_eq!(ATTR.lookup("year", &[DateTime]).unwrap().result, Int);
        assert!(ATTR.lookup("hour", &[Date]).is_none());
        assert!(ATTR.knows_name("total_seconds"));
        assert!(!ATTR.knows_name("century"));
    }

    #[test]
    fn test_methods() {
        assert_eq!(
            METH.lookup("lstrip", &[Clob]).unwrap().template,
            Template::parse("vsqlimpl_pkg.strip_clob({1}, null, 1, 0)")
        );
        assert_eq!(
            METH.lookup("find", &[Str, Clob, Int, Null]).unwrap().template,
            Template::parse("vsqlimpl_pkg.find_str_clob({1}, {2}, {3}, {4})")
        );
        assert_eq!(
            METH.lookup("split", &[Clob, Null]).unwrap().template,
            Template::parse("vsqlimpl_pkg.split_clob_str(null, null)")
        );
        assert_eq!(METH.lookup("join", &[Str, ClobList]).unwrap().result, Clob);
        assert!(METH.accepts_arity("find", 4));
        assert!(!METH.accepts_arity("upper", 2));
    }
}
