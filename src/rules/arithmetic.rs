//! Arithmetic, bitwise and sign operators.

use std::sync::LazyLock;

use super::*;

pub static ADD: LazyLock<RuleTable> = LazyLock::new(add);
pub static SUB: LazyLock<RuleTable> = LazyLock::new(sub);
pub static MUL: LazyLock<RuleTable> = LazyLock::new(mul);
pub static TRUEDIV: LazyLock<RuleTable> = LazyLock::new(truediv);
pub static FLOORDIV: LazyLock<RuleTable> = LazyLock::new(floordiv);
pub static MOD: LazyLock<RuleTable> = LazyLock::new(modulo);
pub static SHIFTLEFT: LazyLock<RuleTable> = LazyLock::new(shiftleft);
pub static SHIFTRIGHT: LazyLock<RuleTable> = LazyLock::new(shiftright);
pub static BITAND: LazyLock<RuleTable> = LazyLock::new(|| bitwise("bitand", "bitand({1}, {2})"));
pub static BITOR: LazyLock<RuleTable> = LazyLock::new(|| bitwise("bitor", "vsqlimpl_pkg.bitor_int({1}, {2})"));
pub static BITXOR: LazyLock<RuleTable> = LazyLock::new(|| bitwise("bitxor", "vsqlimpl_pkg.bitxor_int({1}, {2})"));
pub static NEG: LazyLock<RuleTable> = LazyLock::new(neg);
pub static BITNOT: LazyLock<RuleTable> = LazyLock::new(bitnot);

/// `INT` for pure bool/int operands, `NUMBER` as soon as a float is involved.
fn numeric(t: &mut RuleTable, template: &str) {
    t.add("", Int, &[BOOL_INT, BOOL_INT], template);
    t.add("", Number, &[BOOL_INT, NUMBER], template);
    t.add("", Number, &[NUMBER, NUMERIC], template);
}

/// Deltas combine to `DATETIMEDELTA` as soon as one of them has a time part.
fn deltas(t: &mut RuleTable, template: &str) {
    t.add("", DateDelta, &[DATEDELTA, DATEDELTA], template);
    t.add("", DateTimeDelta, &[DATEDELTA, DATETIMEDELTA], template);
    t.add("", DateTimeDelta, &[DATETIMEDELTA, &[DateDelta, DateTimeDelta]], template);
    t.add("", MonthDelta, &[MONTHDELTA, MONTHDELTA], template);
}

fn add() -> RuleTable {
    let mut t = RuleTable::new("add");
    numeric(&mut t, "({1} + {2})");

    t.add("", Str, &[STR, STR], "({1} || {2})");
    t.add("", Clob, &[STR, CLOB], "({1} || {2})");
    t.add("", Clob, &[CLOB, &[Str, Clob]], "({1} || {2})");

    // Concatenation of lists
    let combos = [
        (IntList, IntList, IntList),
        (IntList, NumberList, NumberList),
        (NumberList, IntList, NumberList),
        (NumberList, NumberList, NumberList),
        (StrList, StrList, StrList),
        (StrList, ClobList, ClobList),
        (ClobList, StrList, ClobList),
        (ClobList, ClobList, ClobList),
        (DateList, DateList, DateList),
        (DateTimeList, DateTimeList, DateTimeList),
    ];
    for (left, right, result) in combos {
        t.add(
            "",
            result,
            &[&[left], &[right]],
            &format!("vsqlimpl_pkg.add_{}_{}({{1}}, {{2}})", list_impl(left), list_impl(right)),
        );
    }
    t.add("", NullList, &[NULLLIST, NULLLIST], "({1} + {2})");
    for &dt in LISTS {
        t.add(
            "",
            dt,
            &[NULLLIST, &[dt]],
            &format!("vsqlimpl_pkg.add_nulllist_{}({{1}}, {{2}})", list_impl(dt)),
        );
        t.add(
            "",
            dt,
            &[&[dt], NULLLIST],
            &format!("vsqlimpl_pkg.add_{}_nulllist({{1}}, {{2}})", list_impl(dt)),
        );
    }

    t.add("", Date, &[DATE, DATEDELTA], "({1} + {2})");
    t.add("", DateTime, &[DATETIME, &[DateDelta, DateTimeDelta]], "({1} + {2})");
    t.add("", Date, &[DATE, MONTHDELTA], "vsqlimpl_pkg.add_datetime_months({1}, {2})");
    t.add("", DateTime, &[DATETIME, MONTHDELTA], "vsqlimpl_pkg.add_datetime_months({1}, {2})");
    t.add("", Date, &[MONTHDELTA, DATE], "vsqlimpl_pkg.add_months_datetime({1}, {2})");
    t.add("", DateTime, &[MONTHDELTA, DATETIME], "vsqlimpl_pkg.add_months_datetime({1}, {2})");
    deltas(&mut t, "({1} + {2})");

    t.finish()
}

fn sub() -> RuleTable {
    let mut t = RuleTable::new("sub");
    numeric(&mut t, "({1} - {2})");

    t.add("", Date, &[DATE, DATEDELTA], "({1} - {2})");
    t.add("", DateDelta, &[DATE, DATE], "({1} - {2})");
    t.add("", DateTimeDelta, &[DATETIME, DATETIME], "({1} - {2})");
    t.add("", Date, &[DATE, MONTHDELTA], "vsqlimpl_pkg.add_datetime_months({1}, -{2})");
    t.add("", DateTime, &[DATETIME, MONTHDELTA], "vsqlimpl_pkg.add_datetime_months({1}, -{2})");
    t.add("", DateTime, &[DATETIME, &[DateDelta, DateTimeDelta]], "({1} - {2})");
    deltas(&mut t, "({1} - {2})");

    t.finish()
}

fn mul() -> RuleTable {
    let mut t = RuleTable::new("mul");
    numeric(&mut t, "({1} * {2})");

    for &delta in DELTAS {
        t.add("", delta, &[BOOL_INT, &[delta]], "({1} * {2})");
    }
    t.add("", DateTimeDelta, &[NUMBER, DATETIMEDELTA], "({1} * {2})");

    // Repetition of strings and lists
    t.add("", Str, &[BOOL_INT, STR], "vsqlimpl_pkg.mul_int_str({1}, {2})");
    t.add("", Clob, &[BOOL_INT, CLOB], "vsqlimpl_pkg.mul_int_clob({1}, {2})");
    t.add("", Str, &[STR, BOOL_INT], "vsqlimpl_pkg.mul_str_int({1}, {2})");
    t.add("", Clob, &[CLOB, BOOL_INT], "vsqlimpl_pkg.mul_clob_int({1}, {2})");
    for &dt in LISTS {
        t.add(
            "",
            dt,
            &[BOOL_INT, &[dt]],
            &format!("vsqlimpl_pkg.mul_int_{}({{1}}, {{2}})", list_impl(dt)),
        );
        t.add(
            "",
            dt,
            &[&[dt], BOOL_INT],
            &format!("vsqlimpl_pkg.mul_{}_int({{1}}, {{2}})", list_impl(dt)),
        );
    }
    t.add("", NullList, &[BOOL_INT, NULLLIST], "({1} * {2})");
    t.add("", NullList, &[NULLLIST, BOOL_INT], "({1} * {2})");

    t.finish()
}

fn truediv() -> RuleTable {
    let mut t = RuleTable::new("truediv");
    t.add("", Int, &[BOOL, BOOL], "({1} / {2})");
    t.add("", Number, &[BOOL, &[Int, Number]], "({1} / {2})");
    t.add("", Number, &[&[Int, Number], NUMERIC], "({1} / {2})");
    t.add("", DateTimeDelta, &[DATETIMEDELTA, NUMERIC], "({1} / {2})");
    t.finish()
}

fn floordiv() -> RuleTable {
    let mut t = RuleTable::new("floordiv");
    t.add("", Int, &[BOOL_INT, BOOL_INT], "vsqlimpl_pkg.floordiv_int_int({1}, {2})");
    t.add("", Int, &[BOOL_INT, NUMBER], "vsqlimpl_pkg.floordiv_int_number({1}, {2})");
    t.add("", Int, &[NUMBER, BOOL_INT], "vsqlimpl_pkg.floordiv_number_int({1}, {2})");
    t.add("", Int, &[NUMBER, NUMBER], "vsqlimpl_pkg.floordiv_number_number({1}, {2})");
    t.add("", DateDelta, &[DATEDELTA, BOOL_INT], "vsqlimpl_pkg.floordiv_int_int({1}, {2})");
    t.add("", MonthDelta, &[MONTHDELTA, BOOL_INT], "vsqlimpl_pkg.floordiv_int_int({1}, {2})");
    t.add("", DateDelta, &[DATETIMEDELTA, NUMERIC], "vsqlimpl_pkg.floordiv_number_int({1}, {2})");
    t.finish()
}

fn modulo() -> RuleTable {
    let mut t = RuleTable::new("mod");
    t.add("", Int, &[BOOL_INT, BOOL_INT], "vsqlimpl_pkg.mod_int_int({1}, {2})");
    t.add("", Number, &[BOOL_INT, NUMBER], "vsqlimpl_pkg.mod_int_number({1}, {2})");
    t.add("", Number, &[NUMBER, BOOL_INT], "vsqlimpl_pkg.mod_number_int({1}, {2})");
    t.add("", Number, &[NUMBER, NUMBER], "vsqlimpl_pkg.mod_number_number({1}, {2})");
    t.add("", Color, &[COLOR, COLOR], "vsqlimpl_pkg.mod_color_color({1}, {2})");
    t.finish()
}

fn shiftleft() -> RuleTable {
    let mut t = RuleTable::new("shiftleft");
    t.add("", Int, &[BOOL_INT, BOOL_INT], "trunc({1} * power(2, {2}))");
    t.finish()
}

fn shiftright() -> RuleTable {
    let mut t = RuleTable::new("shiftright");
    t.add("", Int, &[BOOL_INT, BOOL_INT], "trunc({1} / power(2, {2}))");
    t.finish()
}

/// Integers combine bitwise, sets of the same type combine as sets
/// (intersection, union or symmetric difference).
fn bitwise(operator: &'static str, int_template: &str) -> RuleTable {
    let mut t = RuleTable::new(operator);
    t.add("", Int, &[BOOL_INT, BOOL_INT], int_template);
    for &dt in SETS {
        t.add(
            "",
            dt,
            &[&[dt], &[dt]],
            &format!("vsqlimpl_pkg.{}_{}({{1}}, {{2}})", operator, set_impl(dt)),
        );
    }
    t.finish()
}

fn neg() -> RuleTable {
    let mut t = RuleTable::new("neg");
    t.add("", Int, &[BOOL_INT], "(-{1})");
    t.add("", Number, &[NUMBER], "(-{1})");
    for &delta in DELTAS {
        t.add("", delta, &[&[delta]], "(-{1})");
    }
    t.finish()
}

fn bitnot() -> RuleTable {
    let mut t = RuleTable::new("bitnot");
    t.add("", Int, &[BOOL_INT], "(-{1} - 1)");
    t.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(table: &RuleTable, types: &[DataType]) -> Option<DataType> {
        table.lookup("", types).map(|rule| rule.result)
    }

    #[test]
    fn test_numeric_widening() {
        assert_eq!(result(&ADD, &[Bool, Bool]), Some(Int));
        assert_eq!(result(&ADD, &[Int, Number]), Some(Number));
        assert_eq!(result(&SUB, &[Number, Bool]), Some(Number));
        assert_eq!(result(&TRUEDIV, &[Int, Int]), Some(Number));
        assert_eq!(result(&TRUEDIV, &[Bool, Bool]), Some(Int));
        assert_eq!(result(&FLOORDIV, &[Number, Number]), Some(Int));
    }

    #[test]
    fn test_date_arithmetic() {
        assert_eq!(result(&SUB, &[Date, Date]), Some(DateDelta));
        assert_eq!(result(&SUB, &[DateTime, DateTime]), Some(DateTimeDelta));
        assert_eq!(result(&ADD, &[MonthDelta, Date]), Some(Date));
        assert_eq!(result(&ADD, &[DateDelta, DateTimeDelta]), Some(DateTimeDelta));
        assert_eq!(result(&ADD, &[Date, DateTimeDelta]), None);
        assert_eq!(
            SUB.lookup("", &[Date, MonthDelta]).unwrap().template,
            Template::parse("vsqlimpl_pkg.add_datetime_months({1}, -{2})")
        );
    }

    #[test]
    fn test_list_helpers_use_datetime_names() {
        assert_eq!(
            ADD.lookup("", &[NullList, DateList]).unwrap().template,
            Template::parse("vsqlimpl_pkg.add_nulllist_datetimelist({1}, {2})")
        );
        assert_eq!(
            MUL.lookup("", &[Int, DateList]).unwrap().template,
            Template::parse("vsqlimpl_pkg.mul_int_datetimelist({1}, {2})")
        );
        assert_eq!(result(&ADD, &[IntList, NumberList]), Some(NumberList));
        assert_eq!(result(&ADD, &[DateList, DateTimeList]), None);
    }

    #[test]
    fn test_set_operators() {
        assert_eq!(
            BITAND.lookup("", &[DateSet, DateSet]).unwrap().template,
            Template::parse("vsqlimpl_pkg.bitand_datetimeset({1}, {2})")
        );
        assert_eq!(result(&BITOR, &[StrSet, StrSet]), Some(StrSet));
        assert_eq!(result(&BITXOR, &[Int, Bool]), Some(Int));
        assert_eq!(result(&BITOR, &[IntSet, NumberSet]), None);
    }

    #[test]
    fn test_unary() {
        assert_eq!(result(&NEG, &[Bool]), Some(Int));
        assert_eq!(result(&NEG, &[MonthDelta]), Some(MonthDelta));
        assert_eq!(result(&NEG, &[Str]), None);
        assert_eq!(result(&BITNOT, &[Int]), Some(Int));
    }
}
