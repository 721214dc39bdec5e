//! The closed set of vSQL data types.
//!
//! Every expression node that validates successfully carries exactly one
//! [`DataType`]. The set is fixed at compile time: scalar types, the three
//! delta types, and a list and set form for the scalar types that the
//! database side can represent as collections.
//!
//! Besides the string mapping used by the JSON formats, each type knows
//! which [`Aggregate`] functions may be applied to it and how to
//! [`conform`](DataType::conform) a [`Value`] handed over by a host
//! application.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::error::VsqlError;
use crate::value::Value;

/// Data type of a vSQL expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Null,
    Bool,
    Int,
    Number,
    Str,
    Clob,
    Color,
    Geo,
    Date,
    DateTime,
    DateDelta,
    DateTimeDelta,
    MonthDelta,
    NullList,
    IntList,
    NumberList,
    StrList,
    ClobList,
    DateList,
    DateTimeList,
    NullSet,
    IntSet,
    NumberSet,
    StrSet,
    DateSet,
    DateTimeSet,
}

/// Aggregate functions usable in `Query::aggregate_vsql`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Group,
    Count,
    Min,
    Max,
    Sum,
}

impl Aggregate {
    pub const ALL: [Aggregate; 5] = [
        Aggregate::Group,
        Aggregate::Count,
        Aggregate::Min,
        Aggregate::Max,
        Aggregate::Sum,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Aggregate::Group => "group",
            Aggregate::Count => "count",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Sum => "sum",
        }
    }

    /// Maps a function name to its aggregate, if it names one.
    pub fn from_name(name: &str) -> Option<Aggregate> {
        Aggregate::ALL.into_iter().find(|a| a.name() == name)
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl DataType {
    /// All data types in declaration order.
    pub const ALL: [DataType; 26] = [
        DataType::Null,
        DataType::Bool,
        DataType::Int,
        DataType::Number,
        DataType::Str,
        DataType::Clob,
        DataType::Color,
        DataType::Geo,
        DataType::Date,
        DataType::DateTime,
        DataType::DateDelta,
        DataType::DateTimeDelta,
        DataType::MonthDelta,
        DataType::NullList,
        DataType::IntList,
        DataType::NumberList,
        DataType::StrList,
        DataType::ClobList,
        DataType::DateList,
        DataType::DateTimeList,
        DataType::NullSet,
        DataType::IntSet,
        DataType::NumberSet,
        DataType::StrSet,
        DataType::DateSet,
        DataType::DateTimeSet,
    ];

    /// Canonical lowercase name, as used in JSON and schema definitions.
    pub fn name(self) -> &'static str {
        match self {
            DataType::Null => "null",
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Number => "number",
            DataType::Str => "str",
            DataType::Clob => "clob",
            DataType::Color => "color",
            DataType::Geo => "geo",
            DataType::Date => "date",
            DataType::DateTime => "datetime",
            DataType::DateDelta => "datedelta",
            DataType::DateTimeDelta => "datetimedelta",
            DataType::MonthDelta => "monthdelta",
            DataType::NullList => "nulllist",
            DataType::IntList => "intlist",
            DataType::NumberList => "numberlist",
            DataType::StrList => "strlist",
            DataType::ClobList => "cloblist",
            DataType::DateList => "datelist",
            DataType::DateTimeList => "datetimelist",
            DataType::NullSet => "nullset",
            DataType::IntSet => "intset",
            DataType::NumberSet => "numberset",
            DataType::StrSet => "strset",
            DataType::DateSet => "dateset",
            DataType::DateTimeSet => "datetimeset",
        }
    }

    /// Uppercase name used in type signatures of diagnostics.
    pub fn signature_name(self) -> String {
        self.name().to_uppercase()
    }

    pub fn is_list(self) -> bool {
        matches!(
            self,
            DataType::NullList
                | DataType::IntList
                | DataType::NumberList
                | DataType::StrList
                | DataType::ClobList
                | DataType::DateList
                | DataType::DateTimeList
        )
    }

    pub fn is_set(self) -> bool {
        matches!(
            self,
            DataType::NullSet
                | DataType::IntSet
                | DataType::NumberSet
                | DataType::StrSet
                | DataType::DateSet
                | DataType::DateTimeSet
        )
    }

    /// The list type whose items are of this type, if there is one.
    pub fn list_of(self) -> Option<DataType> {
        match self {
            DataType::Null => Some(DataType::NullList),
            DataType::Int => Some(DataType::IntList),
            DataType::Number => Some(DataType::NumberList),
            DataType::Str => Some(DataType::StrList),
            DataType::Clob => Some(DataType::ClobList),
            DataType::Date => Some(DataType::DateList),
            DataType::DateTime => Some(DataType::DateTimeList),
            _ => None,
        }
    }

    /// The set type whose items are of this type, if there is one.
    ///
    /// There is no set of clobs.
    pub fn set_of(self) -> Option<DataType> {
        match self {
            DataType::Null => Some(DataType::NullSet),
            DataType::Int => Some(DataType::IntSet),
            DataType::Number => Some(DataType::NumberSet),
            DataType::Str => Some(DataType::StrSet),
            DataType::Date => Some(DataType::DateSet),
            DataType::DateTime => Some(DataType::DateTimeSet),
            _ => None,
        }
    }

    /// Item type of a list or set type.
    pub fn item_type(self) -> Option<DataType> {
        match self {
            DataType::NullList | DataType::NullSet => Some(DataType::Null),
            DataType::IntList | DataType::IntSet => Some(DataType::Int),
            DataType::NumberList | DataType::NumberSet => Some(DataType::Number),
            DataType::StrList | DataType::StrSet => Some(DataType::Str),
            DataType::ClobList => Some(DataType::Clob),
            DataType::DateList | DataType::DateSet => Some(DataType::Date),
            DataType::DateTimeList | DataType::DateTimeSet => Some(DataType::DateTime),
            _ => None,
        }
    }

    /// Whether `aggregate` may be applied to expressions of this type.
    pub fn permits(self, aggregate: Aggregate) -> bool {
        use DataType::*;
        match aggregate {
            Aggregate::Group | Aggregate::Count => true,
            Aggregate::Min | Aggregate::Max => matches!(
                self,
                Bool | Int | Number | Str | Clob | Date | DateTime | DateDelta | DateTimeDelta | MonthDelta
            ),
            Aggregate::Sum => {
                matches!(self, Bool | Int | Number | DateDelta | DateTimeDelta | MonthDelta)
            }
        }
    }

    /// The aggregate functions this type permits.
    pub fn aggregates(self) -> Vec<Aggregate> {
        Aggregate::ALL.into_iter().filter(|a| self.permits(*a)).collect()
    }

    /// Normalizes a value coming from a host application to the canonical
    /// representation for this type.
    ///
    /// Decimals collapse into bools, integers or floats, timestamps into
    /// dates or datetimes, and strings into colors where the type asks for
    /// it. `Null` conforms to every type.
    ///
    /// # Errors
    ///
    /// Returns [`VsqlError::Conform`] when the value can't represent this type.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_decimal::Decimal;
    /// use vsql::{DataType, Value};
    ///
    /// let v = DataType::Int.conform(Value::Decimal(Decimal::new(420, 1))).unwrap();
    /// assert_eq!(v, Value::Integer(42));
    /// ```
    pub fn conform(self, value: Value) -> Result<Value, VsqlError> {
        use DataType::*;

        if value == Value::Null {
            return Ok(Value::Null);
        }

        let conformed = match (self, value) {
            (Bool, Value::Boolean(b)) => Some(Value::Boolean(b)),
            (Bool, Value::Integer(i)) if i == 0 || i == 1 => Some(Value::Boolean(i == 1)),
            (Bool, Value::Decimal(d)) if d.is_zero() || d == Decimal::ONE => {
                Some(Value::Boolean(d == Decimal::ONE))
            }
            (Int | DateDelta | MonthDelta, Value::Boolean(b)) => Some(Value::Integer(i64::from(b))),
            (Int | DateDelta | MonthDelta, Value::Integer(i)) => Some(Value::Integer(i)),
            (Int | DateDelta | MonthDelta, Value::Decimal(d)) => collapse_decimal(d),
            (Int | DateDelta | MonthDelta, Value::Float(f)) if f.fract() == 0.0 => {
                Decimal::from_f64(f).and_then(collapse_decimal)
            }
            (Number | DateTimeDelta, Value::Boolean(b)) => Some(Value::Float(if b { 1.0 } else { 0.0 })),
            (Number | DateTimeDelta, Value::Integer(i)) => Some(Value::Float(i as f64)),
            (Number | DateTimeDelta, Value::Float(f)) if f.is_finite() => Some(Value::Float(f)),
            (Number | DateTimeDelta, Value::Decimal(d)) => d.to_f64().map(Value::Float),
            (Str | Clob | Geo, Value::String(s)) => Some(Value::String(s)),
            (Color, Value::Color(c)) => Some(Value::Color(c)),
            (Color, Value::String(s)) => crate::value::Color::parse(&s).map(Value::Color),
            (Date, Value::Date(d)) => Some(Value::Date(d)),
            (Date, Value::DateTime(dt) | Value::Timestamp(dt)) => Some(Value::Date(dt.date())),
            (DateTime, Value::Date(d)) => Some(Value::DateTime(d.and_time(NaiveTime::MIN))),
            (DateTime, Value::DateTime(dt)) => Some(Value::DateTime(dt.with_nanosecond(0).unwrap_or(dt))),
            (DateTime, Value::Timestamp(dt)) => Some(Value::DateTime(dt.with_nanosecond(0).unwrap_or(dt))),
            (dt, Value::Array(items)) if dt.is_list() || dt.is_set() => {
                let item_type = dt.item_type().unwrap_or(Null);
                let mut conformed = Vec::with_capacity(items.len());
                for item in items {
                    conformed.push(item_type.conform(item)?);
                }
                Some(Value::Array(conformed))
            }
            (_, other) => {
                return Err(VsqlError::Conform {
                    datatype: self,
                    value: other.describe(),
                });
            }
        };

        conformed.ok_or_else(|| VsqlError::Conform {
            datatype: self,
            value: "out of range value".to_string(),
        })
    }
}

/// Turns an integral decimal into an integer, anything else into a float.
fn collapse_decimal(d: Decimal) -> Option<Value> {
    if d.fract().is_zero() {
        d.to_i64().map(Value::Integer)
    } else {
        d.to_f64().map(Value::Float)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = VsqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|dt| dt.name() == s)
            .ok_or_else(|| VsqlError::Load(format!("Unknown data type `{}`", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_names_round_trip() {
        for dt in DataType::ALL {
            assert_eq!(dt.name().parse::<DataType>().unwrap(), dt);
        }
        assert!("varchar".parse::<DataType>().is_err());
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&DataType::DateTimeDelta).unwrap();
        assert_eq!(json, "\"datetimedelta\"");
        let dt: DataType = serde_json::from_str("\"nulllist\"").unwrap();
        assert_eq!(dt, DataType::NullList);
    }

    #[test]
    fn test_collections() {
        assert_eq!(DataType::Clob.list_of(), Some(DataType::ClobList));
        assert_eq!(DataType::Clob.set_of(), None);
        assert_eq!(DataType::Color.list_of(), None);
        assert_eq!(DataType::DateSet.item_type(), Some(DataType::Date));
    }

    #[test]
    fn test_aggregate_permissions() {
        assert!(DataType::Int.permits(Aggregate::Sum));
        assert!(DataType::DateDelta.permits(Aggregate::Sum));
        assert!(!DataType::Str.permits(Aggregate::Sum));
        assert!(!DataType::Date.permits(Aggregate::Sum));
        assert!(!DataType::Color.permits(Aggregate::Sum));
        assert!(DataType::Color.permits(Aggregate::Count));
        assert!(!DataType::Geo.permits(Aggregate::Min));
    }

    #[test]
    fn test_conform_decimal() {
        assert_eq!(
            DataType::Bool.conform(Value::Decimal(Decimal::ONE)).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            DataType::Int.conform(Value::Decimal(Decimal::new(17, 0))).unwrap(),
            Value::Integer(17)
        );
        assert_eq!(
            DataType::Number.conform(Value::Decimal(Decimal::new(15, 1))).unwrap(),
            Value::Float(1.5)
        );
        assert!(DataType::Bool.conform(Value::Decimal(Decimal::new(2, 0))).is_err());
    }

    #[test]
    fn test_conform_timestamp() {
        let ts = NaiveDate::from_ymd_opt(2000, 2, 29)
            .unwrap()
            .and_hms_opt(12, 34, 56)
            .unwrap();
        assert_eq!(
            DataType::Date.conform(Value::Timestamp(ts)).unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2000, 2, 29).unwrap())
        );
        assert_eq!(DataType::DateTime.conform(Value::Timestamp(ts)).unwrap(), Value::DateTime(ts));
    }

    #[test]
    fn test_conform_color_from_string() {
        assert_eq!(
            DataType::Color.conform(Value::String("#f00".into())).unwrap(),
            Value::Color(crate::value::Color::new(255, 0, 0, 255))
        );
        assert!(DataType::Color.conform(Value::String("red".into())).is_err());
    }

    #[test]
    fn test_conform_rejects_mismatch() {
        let err = DataType::Date.conform(Value::String("tomorrow".into())).unwrap_err();
        assert!(matches!(err, VsqlError::Conform { datatype: DataType::Date, .. }));
        assert_eq!(DataType::Geo.conform(Value::Null).unwrap(), Value::Null);
    }
}
