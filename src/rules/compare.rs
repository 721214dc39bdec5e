//! Equality, identity, ordering and containment.
//!
//! All of these produce `BOOL`. Comparisons involving `NULL` operands are
//! resolved statically where possible; pairs of real values go through the
//! `vsqlimpl_pkg.eq_*` and `vsqlimpl_pkg.cmp_*` helpers of the database.

use std::sync::LazyLock;

use super::*;

pub static EQ: LazyLock<RuleTable> = LazyLock::new(|| equality("eq", true));
pub static NE: LazyLock<RuleTable> = LazyLock::new(|| equality("ne", false));
pub static IS: LazyLock<RuleTable> = LazyLock::new(|| identity("is", true));
pub static ISNOT: LazyLock<RuleTable> = LazyLock::new(|| identity("isnot", false));
pub static LT: LazyLock<RuleTable> = LazyLock::new(|| ordering(Ordering::Lt));
pub static LE: LazyLock<RuleTable> = LazyLock::new(|| ordering(Ordering::Le));
pub static GT: LazyLock<RuleTable> = LazyLock::new(|| ordering(Ordering::Gt));
pub static GE: LazyLock<RuleTable> = LazyLock::new(|| ordering(Ordering::Ge));
pub static CONTAINS: LazyLock<RuleTable> = LazyLock::new(|| containment("contains", true));
pub static NOTCONTAINS: LazyLock<RuleTable> = LazyLock::new(|| containment("notcontains", false));

type Pair = (DataType, DataType, String);

fn number_impl(dt: DataType) -> &'static str {
    if dt == Number { "number" } else { "int" }
}

/// Helper name suffixes for every pair of non-null types that can be
/// compared by value.
fn equality_pairs() -> Vec<Pair> {
    let mut pairs = Vec::new();
    for &a in NUMERIC {
        for &b in NUMERIC {
            pairs.push((a, b, format!("{}_{}", number_impl(a), number_impl(b))));
        }
    }
    pairs.push((Geo, Geo, "str_str".into()));
    pairs.push((Color, Color, "int_int".into()));
    for a in [Str, Clob] {
        for b in [Str, Clob] {
            pairs.push((a, b, format!("{}_{}", a.name(), b.name())));
        }
    }
    pairs.push((Date, Date, "datetime_datetime".into()));
    pairs.push((DateTime, DateTime, "datetime_datetime".into()));
    pairs.push((DateDelta, DateDelta, "int_int".into()));
    pairs.push((MonthDelta, MonthDelta, "int_int".into()));
    pairs.push((DateTimeDelta, DateTimeDelta, "datetimedelta_datetimedelta".into()));
    pairs.extend(list_pairs(true));

    let set_groups: [&[DataType]; 4] = [&[IntSet], &[NumberSet], &[StrSet], &[DateSet, DateTimeSet]];
    pairs.push((NullSet, NullSet, "nullset_nullset".into()));
    for &dt in SETS {
        pairs.push((NullSet, dt, format!("nullset_{}", set_impl(dt))));
        pairs.push((dt, NullSet, format!("{}_nullset", set_impl(dt))));
    }
    for group in set_groups {
        for &a in group {
            for &b in group {
                pairs.push((a, b, format!("{}_{}", set_impl(a), set_impl(b))));
            }
        }
    }
    pairs
}

/// Helper name suffixes for pairs of lists. Lists of dates and datetimes
/// only compare across item types for equality.
fn list_pairs(mixed_dates: bool) -> Vec<Pair> {
    let mut pairs = vec![(NullList, NullList, "nulllist_nulllist".to_string())];
    for &dt in LISTS {
        pairs.push((NullList, dt, format!("nulllist_{}", list_impl(dt))));
        pairs.push((dt, NullList, format!("{}_nulllist", list_impl(dt))));
    }
    let groups: [&[DataType]; 3] = [&[IntList, NumberList], &[StrList, ClobList], &[DateList, DateTimeList]];
    for group in groups {
        for &a in group {
            for &b in group {
                if a != b && a.item_type().is_some_and(|t| TEMPORAL.contains(&t)) && !mixed_dates {
                    continue;
                }
                pairs.push((a, b, format!("{}_{}", list_impl(a), list_impl(b))));
            }
        }
    }
    pairs
}

/// Helper name suffixes for pairs that have an order.
fn ordering_pairs() -> Vec<Pair> {
    let mut pairs = Vec::new();
    for &a in NUMERIC {
        for &b in NUMERIC {
            pairs.push((a, b, format!("{}_{}", number_impl(a), number_impl(b))));
        }
    }
    for a in [Str, Clob] {
        for b in [Str, Clob] {
            pairs.push((a, b, format!("{}_{}", a.name(), b.name())));
        }
    }
    pairs.push((Date, Date, "datetime_datetime".into()));
    pairs.push((DateTime, DateTime, "datetime_datetime".into()));
    pairs.push((DateDelta, DateDelta, "int_int".into()));
    pairs.push((DateTimeDelta, DateTimeDelta, "number_number".into()));
    pairs.extend(list_pairs(false));
    pairs
}

fn equality(operator: &'static str, equal: bool) -> RuleTable {
    let mut t = RuleTable::new(operator);
    let (yes, no) = if equal { ("1", "0") } else { ("0", "1") };

    t.add("", Bool, &[NULL, NULL], yes);
    for &dt in NOT_NULL {
        t.add(
            "",
            Bool,
            &[&[dt], NULL],
            &format!("(case when {{1}} is null then {} else {} end)", yes, no),
        );
        t.add(
            "",
            Bool,
            &[NULL, &[dt]],
            &format!("(case when {{2}} is null then {} else {} end)", yes, no),
        );
    }
    for (a, b, helper) in equality_pairs() {
        let call = format!("vsqlimpl_pkg.eq_{}({{1}}, {{2}})", helper);
        let template = if equal { call } else { format!("(1 - {})", call) };
        t.add("", Bool, &[&[a], &[b]], &template);
    }
    t.fill(
        "",
        Bool,
        &[ALL, ALL],
        &format!("(case when {{1}} is null and {{2}} is null then {} else {} end)", yes, no),
    );
    t.finish()
}

/// `is` and `is not` compare with `None`; any other pair of values is only
/// identical when both are null.
fn identity(operator: &'static str, same: bool) -> RuleTable {
    let mut t = RuleTable::new(operator);
    let check = if same { "is null" } else { "is not null" };

    t.add("", Bool, &[NULL, NULL], if same { "1" } else { "0" });
    for &dt in NOT_NULL {
        t.add("", Bool, &[&[dt], NULL], &format!("(case when {{1}} {} then 1 else 0 end)", check));
        t.add("", Bool, &[NULL, &[dt]], &format!("(case when {{2}} {} then 1 else 0 end)", check));
    }
    let (yes, no) = if same { ("1", "0") } else { ("0", "1") };
    t.fill(
        "",
        Bool,
        &[ALL, ALL],
        &format!("(case when {{1}} is null and {{2}} is null then {} else {} end)", yes, no),
    );
    t.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ordering {
    Lt,
    Le,
    Gt,
    Ge,
}

/// `None` sorts before everything else.
fn ordering(op: Ordering) -> RuleTable {
    let (operator, sql) = match op {
        Ordering::Lt => ("lt", "<"),
        Ordering::Le => ("le", "<="),
        Ordering::Gt => ("gt", ">"),
        Ordering::Ge => ("ge", ">="),
    };
    let mut t = RuleTable::new(operator);

    let (both, left_null, right_null) = match op {
        Ordering::Lt => ("0", "(case when {2} is null then 0 else 1 end)", "0"),
        Ordering::Le => ("1", "1", "(case when {1} is null then 1 else 0 end)"),
        Ordering::Gt => ("0", "0", "(case when {1} is null then 0 else 1 end)"),
        Ordering::Ge => ("1", "(case when {2} is null then 1 else 0 end)", "1"),
    };
    t.add("", Bool, &[NULL, NULL], both);
    t.add("", Bool, &[NULL, NOT_NULL], left_null);
    t.add("", Bool, &[NOT_NULL, NULL], right_null);

    for (a, b, helper) in ordering_pairs() {
        t.add(
            "",
            Bool,
            &[&[a], &[b]],
            &format!(
                "(case when vsqlimpl_pkg.cmp_{}({{1}}, {{2}}) {} 0 then 1 else 0 end)",
                helper, sql
            ),
        );
    }
    t.finish()
}

fn containment(operator: &'static str, positive: bool) -> RuleTable {
    let mut t = RuleTable::new(operator);
    let wrap = |call: String| if positive { call } else { format!("(1 - {})", call) };

    for &dt in [NULLLIST, LISTS].concat().iter() {
        t.add(
            "",
            Bool,
            &[NULL, &[dt]],
            &wrap(format!("vsqlimpl_pkg.contains_null_{}({{2}})", list_impl(dt))),
        );
    }

    let pairs: [(DataType, &[DataType], &str); 5] = [
        (Str, &[Str, Clob, StrList, ClobList, StrSet], "str"),
        (Int, &[IntList, NumberList, IntSet, NumberSet], "int"),
        (Number, &[IntList, NumberList, IntSet, NumberSet], "number"),
        (Date, &[DateList, DateSet], "datetime"),
        (DateTime, &[DateTimeList, DateTimeSet], "datetime"),
    ];
    for (item, containers, name) in pairs {
        for &container in containers {
            t.add(
                "",
                Bool,
                &[&[item], &[container]],
                &wrap(format!("vsqlimpl_pkg.contains_{}_{}({{1}}, {{2}})", name, list_impl(container))),
            );
        }
    }

    let (found, missing) = if positive { ("", "0") } else { ("1 - ", "1") };
    t.add(
        "",
        Bool,
        &[NOT_NULL, NULLLIST],
        &format!(
            "case when {{1}} is null then {}vsqlimpl_pkg.contains_null_nulllist({{2}}) else {} end",
            found, missing
        ),
    );
    t.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(table: &RuleTable, types: &[DataType]) -> Template {
        table.lookup("", types).unwrap().template.clone()
    }

    #[test]
    fn test_equality_regimes() {
        assert_eq!(template(&EQ, &[Null, Null]), Template::parse("1"));
        assert_eq!(template(&EQ, &[Int, Null]), Template::parse("(case when {1} is null then 1 else 0 end)"));
        assert_eq!(template(&EQ, &[Int, Number]), Template::parse("vsqlimpl_pkg.eq_int_number({1}, {2})"));
        assert_eq!(
            template(&EQ, &[Int, Str]),
            Template::parse("(case when {1} is null and {2} is null then 1 else 0 end)")
        );
        assert_eq!(template(&EQ, &[DateSet, NullSet]), Template::parse("vsqlimpl_pkg.eq_datetimeset_nullset({1}, {2})"));
        assert_eq!(EQ.len(), 26 * 26);
    }

    #[test]
    fn test_inequality_negates() {
        assert_eq!(template(&NE, &[Null, Null]), Template::parse("0"));
        assert_eq!(template(&NE, &[Str, Clob]), Template::parse("(1 - vsqlimpl_pkg.eq_str_clob({1}, {2}))"));
    }

    #[test]
    fn test_identity() {
        assert_eq!(template(&ISNOT, &[Null, Int]), Template::parse("(case when {2} is not null then 1 else 0 end)"));
        assert_eq!(template(&IS, &[Null, Null]), Template::parse("1"));
    }

    #[test]
    fn test_ordering() {
        assert_eq!(template(&LE, &[Null, Int]), Template::parse("1"));
        assert_eq!(template(&LT, &[Int, Null]), Template::parse("0"));
        assert_eq!(
            template(&GT, &[Date, Date]),
            Template::parse("(case when vsqlimpl_pkg.cmp_datetime_datetime({1}, {2}) > 0 then 1 else 0 end)")
        );
        assert!(LE.lookup("", &[DateList, DateTimeList]).is_none());
        assert!(LE.lookup("", &[IntSet, IntSet]).is_none());
        assert!(LE.lookup("", &[MonthDelta, MonthDelta]).is_none());
    }

    #[test]
    fn test_containment() {
        assert_eq!(template(&CONTAINS, &[Str, StrSet]), Template::parse("vsqlimpl_pkg.contains_str_strlist({1}, {2})"));
        assert_eq!(template(&CONTAINS, &[Null, DateList]), Template::parse("vsqlimpl_pkg.contains_null_datetimelist({2})"));
        assert_eq!(
            template(&NOTCONTAINS, &[Int, IntList]),
            Template::parse("(1 - vsqlimpl_pkg.contains_int_intlist({1}, {2}))")
        );
        assert!(CONTAINS.lookup("", &[Int, StrList]).is_none());
    }
}
