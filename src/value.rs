use std::fmt;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A value handed to vSQL by a host application.
///
/// Hosts don't know vSQL's type system, so they pass whatever their
/// runtime produced (big decimals from a database driver, timestamps,
/// plain strings). [`DataType::conform`](crate::DataType::conform)
/// normalizes such values, and [`Ast::constant`](crate::Ast::constant)
/// turns the normalized value into a constant expression.
///
/// # Examples
///
/// ```
/// use vsql::Value;
///
/// let answer = Value::Integer(42);
/// assert_eq!(answer.describe(), "integer 42");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (`None`)
    Null,

    /// Boolean
    Boolean(bool),

    /// 64 bit integer
    Integer(i64),

    /// Floating-point number
    Float(f64),

    /// Arbitrary precision decimal, as produced by database drivers
    Decimal(Decimal),

    /// UTF-8 string
    String(String),

    /// RGBA color
    Color(Color),

    /// Calendar date
    Date(NaiveDate),

    /// Date and time of day (second precision)
    DateTime(NaiveDateTime),

    /// Raw timestamp from the host, conformed into a date or datetime
    Timestamp(NaiveDateTime),

    /// List or set items
    Array(Vec<Value>),
}

impl Value {
    /// Short human-readable description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Value::Null => "None".to_string(),
            Value::Boolean(b) => format!("bool {}", b),
            Value::Integer(i) => format!("integer {}", i),
            Value::Float(f) => format!("float {}", f),
            Value::Decimal(d) => format!("decimal {}", d),
            Value::String(s) => format!("string {:?}", s),
            Value::Color(c) => format!("color {}", c),
            Value::Date(d) => format!("date {}", d),
            Value::DateTime(dt) => format!("datetime {}", dt),
            Value::Timestamp(ts) => format!("timestamp {}", ts),
            Value::Array(items) => format!("array of {} items", items.len()),
        }
    }
}

static COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("valid color regex")
});

/// An RGBA color with 8 bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    /// Parses `#rgb`, `#rgba`, `#rrggbb` and `#rrggbbaa`.
    ///
    /// Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Color> {
        let caps = COLOR_RE.captures(s)?;
        let digits = caps.get(1)?.as_str();
        let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).ok().map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        match digits.len() {
            3 => Some(Color::new(nibble(0)?, nibble(1)?, nibble(2)?, 255)),
            4 => Some(Color::new(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
            6 => Some(Color::new(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Some(Color::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// The color packed as `rrggbbaa` into one integer, which is how the
    /// database stores colors.
    pub fn packed(&self) -> u32 {
        (u32::from(self.r) << 24) | (u32::from(self.g) << 16) | (u32::from(self.b) << 8) | u32::from(self.a)
    }

    /// Full `#rrggbbaa` form.
    pub fn dump(&self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

/// Shortest form: alpha is omitted when opaque and channels collapse to
/// one digit when both hex digits agree.
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels = [self.r, self.g, self.b, self.a];
        let used = if self.a == 255 { &channels[..3] } else { &channels[..] };
        if used.iter().all(|c| c % 17 == 0) {
            f.write_str("#")?;
            for c in used {
                write!(f, "{:x}", c / 17)?;
            }
        } else {
            f.write_str("#")?;
            for c in used {
                write!(f, "{:02x}", c)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_and_long_forms() {
        assert_eq!(Color::parse("#000"), Some(Color::new(0, 0, 0, 255)));
        assert_eq!(Color::parse("#fff0"), Some(Color::new(255, 255, 255, 0)));
        assert_eq!(Color::parse("#123456"), Some(Color::new(0x12, 0x34, 0x56, 255)));
        assert_eq!(Color::parse("#12345678"), Some(Color::new(0x12, 0x34, 0x56, 0x78)));
        assert_eq!(Color::parse("#12"), None);
        assert_eq!(Color::parse("red"), None);
    }

    #[test]
    fn test_packed() {
        assert_eq!(Color::parse("#000").unwrap().packed(), 255);
        assert_eq!(Color::parse("#fff").unwrap().packed(), 4294967295);
        assert_eq!(Color::parse("#0000").unwrap().packed(), 0);
        assert_eq!(Color::parse("#fff0").unwrap().packed(), 4294967040);
    }

    #[test]
    fn test_display_is_shortest() {
        assert_eq!(Color::new(255, 255, 255, 255).to_string(), "#fff");
        assert_eq!(Color::new(0x12, 0x34, 0x56, 255).to_string(), "#123456");
        assert_eq!(Color::new(0, 0, 0, 0).to_string(), "#0000");
        assert_eq!(Color::new(0, 0, 0, 0).dump(), "#00000000");
    }
}
