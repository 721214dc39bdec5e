//! `not`, `and`, `or` and the conditional expression.
//!
//! `and` and `or` don't produce booleans: like in Python they return one of
//! their operands, chosen by the truthiness of the first one.

use std::sync::LazyLock;

use super::*;

pub static NOT: LazyLock<RuleTable> = LazyLock::new(not);
pub static AND: LazyLock<RuleTable> = LazyLock::new(|| shortcut("and", Shortcut::And));
pub static OR: LazyLock<RuleTable> = LazyLock::new(|| shortcut("or", Shortcut::Or));
pub static IF: LazyLock<RuleTable> = LazyLock::new(conditional);

fn not() -> RuleTable {
    let mut t = RuleTable::new("not");
    t.add("", Bool, &[NULL], "1");
    t.add("", Bool, &[BOOL], "(case {1} when 1 then 0 else 1 end)");
    t.add("", Bool, &[&[Int, Number, DateDelta, DateTimeDelta, MonthDelta]], "(case nvl({1}, 0) when 0 then 1 else 0 end)");
    t.add("", Bool, &[&[Date, DateTime, Str, Color, Geo]], "(case when {1} is null then 1 else 0 end)");
    for &dt in [CLOB, NULLLIST, LISTS, NULLSET, SETS].concat().iter() {
        t.add("", Bool, &[&[dt]], &format!("(1 - vsqlimpl_pkg.bool_{}({{1}}))", list_impl(dt)));
    }
    t.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shortcut {
    And,
    Or,
}

/// Rows for `and`/`or`.
///
/// `or` returns the first operand when it is truthy, `and` returns it when
/// it isn't. Mixing with `None` yields the type of the other operand.
fn shortcut(operator: &'static str, op: Shortcut) -> RuleTable {
    let mut t = RuleTable::new(operator);

    // `cond` tests the truthiness of `{1}`
    let pick = |cond: &str, first: &str, second: &str| match op {
        Shortcut::Or => format!("(case when {} then {} else {} end)", cond, first, second),
        Shortcut::And => format!("(case when {} then {} else {} end)", cond, second, first),
    };

    t.add("", Null, &[NULL, NULL], "{1}");
    for &dt in NOT_NULL {
        match op {
            Shortcut::Or => {
                t.add("", dt, &[&[dt], NULL], "{1}");
                t.add("", dt, &[NULL, &[dt]], "{2}");
            }
            Shortcut::And => {
                let truthy = truth_sql(dt, "{1}");
                t.add("", dt, &[&[dt], NULL], &format!("(case when {} = 1 then null else {{1}} end)", truthy));
                t.add("", dt, &[NULL, &[dt]], "{1}");
            }
        }
    }

    t.add("", Bool, &[BOOL, BOOL], &pick("{1} = 1", "{1}", "{2}"));
    let nonzero = "nvl({1}, 0) != 0";
    t.add("", Int, &[BOOL, INT], &pick(nonzero, "{1}", "{2}"));
    t.add("", Int, &[INT, BOOL_INT], &pick(nonzero, "{1}", "{2}"));
    t.add("", Number, &[BOOL_INT, NUMBER], &pick(nonzero, "{1}", "{2}"));
    t.add("", Number, &[NUMBER, NUMERIC], &pick(nonzero, "{1}", "{2}"));
    for &delta in DELTAS {
        t.add("", delta, &[&[delta], &[delta]], &pick(nonzero, "{1}", "{2}"));
    }

    let filled = "{1} is not null and length({1}) != 0";
    match op {
        Shortcut::Or => t.add("", Str, &[STR, STR], "nvl({1}, {2})"),
        Shortcut::And => t.add("", Str, &[STR, STR], &pick("{1} is not null", "{1}", "{2}")),
    }
    t.add("", Clob, &[STR, CLOB], &pick("{1} is not null", "to_clob({1})", "{2}"));
    t.add("", Clob, &[CLOB, CLOB], &pick(filled, "{1}", "{2}"));
    t.add("", Clob, &[CLOB, STR], &pick(filled, "{1}", "to_clob({2})"));
    for &dt in TEMPORAL {
        match op {
            Shortcut::Or => t.add("", dt, &[&[dt], &[dt]], "nvl({1}, {2})"),
            Shortcut::And => t.add("", dt, &[&[dt], &[dt]], &pick("{1} is not null", "{1}", "{2}")),
        }
    }

    for &dt in LISTS {
        let filled = format!("nvl(vsqlimpl_pkg.len_{}({{1}}), 0) != 0", list_impl(dt));
        t.add("", dt, &[&[dt], &[dt]], &pick(&filled, "{1}", "{2}"));
        t.add(
            "",
            dt,
            &[NULLLIST, &[dt]],
            &pick(nonzero, &format!("vsqlimpl_pkg.{}_fromlen({{1}})", list_impl(dt)), "{2}"),
        );
        t.add(
            "",
            dt,
            &[&[dt], NULLLIST],
            &pick(&filled, "{1}", &format!("vsqlimpl_pkg.{}_fromlen({{2}})", list_impl(dt))),
        );
    }
    let filled = "nvl(vsqlimpl_pkg.len_datetimelist({1}), 0) != 0";
    t.add("", DateTimeList, &[&[DateList], &[DateTimeList]], &pick(filled, "{1}", "{2}"));
    t.add("", DateTimeList, &[&[DateTimeList], &[DateList]], &pick(filled, "{1}", "{2}"));
    t.add("", NullList, &[NULLLIST, NULLLIST], &pick(nonzero, "{1}", "{2}"));

    t.finish()
}

/// `a if cond else b`: operands are `a`, `cond` and `b`.
///
/// The branches must agree in type (numbers widen, strings widen to clobs,
/// `None` adapts to the other branch), the condition may be of any type.
fn conditional() -> RuleTable {
    let mut t = RuleTable::new("if");

    let mut branches: Vec<(DataType, DataType, DataType)> = Vec::new();
    for &dt in ALL {
        branches.push((dt, dt, dt));
    }
    for &dt in NOT_NULL {
        branches.push((dt, Null, dt));
        branches.push((Null, dt, dt));
    }
    branches.extend([
        (Bool, Int, Int),
        (Int, Bool, Int),
        (Bool, Number, Number),
        (Number, Bool, Number),
        (Int, Number, Number),
        (Number, Int, Number),
        (Str, Clob, Clob),
        (Clob, Str, Clob),
    ]);

    for &cond in ALL {
        let truthy = truth_sql(cond, "{2}");
        for &(left, right, result) in &branches {
            let first = if left == Str && result == Clob { "to_clob({1})" } else { "{1}" };
            let second = if right == Str && result == Clob { "to_clob({3})" } else { "{3}" };
            t.add(
                "",
                result,
                &[&[left], &[cond], &[right]],
                &format!("(case when {} = 1 then {} else {} end)", truthy, first, second),
            );
        }
    }
    t.finish()
}
