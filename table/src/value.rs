//! Cell value types a table can hold.

use std::fmt;
use std::str::FromStr;

/// The two homogeneous table specializations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// 32-bit signed integers.
    Integer,
    /// Double-precision floats.
    Double,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("int"),
            Self::Double => f.write_str("double"),
        }
    }
}

/// Error returned when a value kind name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownValueKind(pub String);

impl fmt::Display for UnknownValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown table data type '{}'", self.0)
    }
}

impl std::error::Error for UnknownValueKind {}

impl FromStr for ValueKind {
    type Err = UnknownValueKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" | "integer" => Ok(Self::Integer),
            "double" | "float" => Ok(Self::Double),
            other => Err(UnknownValueKind(other.to_string())),
        }
    }
}

/// A value storable in a [`Table`](crate::Table) cell.
pub trait CellValue: Copy + PartialEq + fmt::Debug + fmt::Display + 'static {
    /// The table specialization this type belongs to.
    const KIND: ValueKind;

    /// Parses one text field. Returns `None` if the text is not a value of
    /// this type.
    fn parse_cell(text: &str) -> Option<Self>;
}

impl CellValue for i32 {
    const KIND: ValueKind = ValueKind::Integer;

    fn parse_cell(text: &str) -> Option<Self> {
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (radix, body) = match digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
        {
            Some(hex) => (16, hex),
            None => (10, digits),
        };
        if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
            return None;
        }
        let magnitude = i64::from_str_radix(body, radix).ok()?;
        let value = if negative { -magnitude } else { magnitude };
        i32::try_from(value).ok()
    }
}

impl CellValue for f64 {
    const KIND: ValueKind = ValueKind::Double;

    fn parse_cell(text: &str) -> Option<Self> {
        text.parse().ok()
    }
}

/// Parses an identifier field: `0x`-prefixed hexadecimal or decimal.
#[must_use]
pub fn parse_id(text: &str) -> Option<u32> {
    let (radix, body) = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => (16, hex),
        None => (10, text),
    };
    if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(body, radix).ok()
}
