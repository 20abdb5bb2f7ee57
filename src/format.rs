//! Normalization of year/month/hour inputs into the strings the archive expects.
//!
//! Inputs arrive as a [`FieldValue`] (a run file or caller may give a single
//! value or a list, as integers or strings). Every formatter returns a plain
//! `Vec<String>`; the union does not travel any further than this module.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Token expanding a month or hour field to its full range.
pub const ALL: &str = "ALL";

/// Raw user value for a time field.
///
/// Lists mixing integers and strings deserialize as [`FieldValue::StrList`].
/// Any other JSON shape is kept as [`FieldValue::Unsupported`] so the
/// formatters can report it as a type mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawFieldValue")]
pub enum FieldValue {
    Int(i64),
    Str(String),
    IntList(Vec<i64>),
    StrList(Vec<String>),
    /// JSON text of a value no formatter accepts.
    Unsupported(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFieldValue {
    One(RawItem),
    Many(Vec<RawItem>),
    Other(serde_json::Value),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawItem {
    Int(i64),
    Str(String),
}

impl From<RawFieldValue> for FieldValue {
    fn from(raw: RawFieldValue) -> Self {
        match raw {
            RawFieldValue::One(RawItem::Int(i)) => FieldValue::Int(i),
            RawFieldValue::One(RawItem::Str(s)) => FieldValue::Str(s),
            RawFieldValue::Many(items) => {
                let ints: Option<Vec<i64>> = items
                    .iter()
                    .map(|item| match item {
                        RawItem::Int(i) => Some(*i),
                        RawItem::Str(_) => None,
                    })
                    .collect();
                match ints {
                    Some(ints) => FieldValue::IntList(ints),
                    None => FieldValue::StrList(
                        items
                            .into_iter()
                            .map(|item| match item {
                                RawItem::Int(i) => i.to_string(),
                                RawItem::Str(s) => s,
                            })
                            .collect(),
                    ),
                }
            }
            RawFieldValue::Other(v) => FieldValue::Unsupported(v.to_string()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::StrList(value)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(value: Vec<&str>) -> Self {
        FieldValue::StrList(value.into_iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FieldValue {
    fn from(value: [&str; N]) -> Self {
        FieldValue::StrList(value.into_iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<i64>> for FieldValue {
    fn from(value: Vec<i64>) -> Self {
        FieldValue::IntList(value)
    }
}

impl From<Vec<i32>> for FieldValue {
    fn from(value: Vec<i32>) -> Self {
        FieldValue::IntList(value.into_iter().map(|x| x as i64).collect())
    }
}

impl<const N: usize> From<[i32; N]> for FieldValue {
    fn from(value: [i32; N]) -> Self {
        FieldValue::IntList(value.into_iter().map(|x| x as i64).collect())
    }
}

impl FieldValue {
    fn is_all(&self) -> bool {
        matches!(self, FieldValue::Str(s) if s == ALL)
    }
}

/// Years: integers become decimal strings, strings pass through unchanged.
pub fn form_years(years: &FieldValue) -> Result<Vec<String>> {
    match years {
        FieldValue::Int(y) => Ok(vec![y.to_string()]),
        FieldValue::Str(y) => Ok(vec![y.clone()]),
        FieldValue::IntList(ys) => non_empty("years", ys.iter().map(|y| y.to_string()).collect()),
        FieldValue::StrList(ys) => non_empty("years", ys.clone()),
        FieldValue::Unsupported(v) => Err(unsupported("years", v)),
    }
}

/// Months as two-digit codes. `"ALL"` expands to `"01".."12"`.
pub fn form_months(months: &FieldValue) -> Result<Vec<String>> {
    if months.is_all() {
        return Ok((1..=12).map(|m| format!("{m:02}")).collect());
    }

    let out = match months {
        FieldValue::Int(m) => vec![month_code(*m)?],
        FieldValue::IntList(ms) => ms.iter().map(|m| month_code(*m)).collect::<Result<Vec<_>>>()?,
        FieldValue::StrList(ms) => {
            let mut codes = ms
                .iter()
                .map(|m| parse_number("month", m).and_then(month_code))
                .collect::<Result<Vec<_>>>()?;
            codes.sort();
            codes
        }
        FieldValue::Str(s) => vec![parse_number("month", s).and_then(month_code).map_err(|_| {
            Error::TypeMismatch(format!(
                "months must be an int, a list of ints or strings, or {ALL}; got {s:?}"
            ))
        })?],
        FieldValue::Unsupported(v) => return Err(unsupported("months", v)),
    };

    non_empty("months", out)
}

/// Hours as `"HH:00"` strings. `"ALL"` expands to `"00:00".."23:00"`.
pub fn form_hours(hours: &FieldValue) -> Result<Vec<String>> {
    if hours.is_all() {
        return Ok((0..24).map(|h| format!("{h:02}:00")).collect());
    }

    let out = match hours {
        FieldValue::Int(h) => vec![hour_code(*h)?],
        FieldValue::IntList(hs) => hs.iter().map(|h| hour_code(*h)).collect::<Result<Vec<_>>>()?,
        FieldValue::StrList(hs) => hs
            .iter()
            .map(|h| parse_number("hour", h).and_then(hour_code))
            .collect::<Result<Vec<_>>>()?,
        FieldValue::Str(s) => vec![parse_number("hour", s).and_then(hour_code).map_err(|_| {
            Error::TypeMismatch(format!(
                "hours must be {ALL}, a list of strings, or a list of integers; got {s:?}"
            ))
        })?],
        FieldValue::Unsupported(v) => return Err(unsupported("hours", v)),
    };

    non_empty("hours", out)
}

fn month_code(m: i64) -> Result<String> {
    if !(1..=12).contains(&m) {
        return Err(Error::TypeMismatch(format!("month must be within 1..=12, got {m}")));
    }
    Ok(format!("{m:02}"))
}

fn hour_code(h: i64) -> Result<String> {
    if !(0..=23).contains(&h) {
        return Err(Error::TypeMismatch(format!("hour must be within 0..=23, got {h}")));
    }
    Ok(format!("{h:02}:00"))
}

fn parse_number(what: &str, s: &str) -> Result<i64> {
    // Accept "7", "07" and "07:00" for hours.
    let digits = s.trim().strip_suffix(":00").unwrap_or(s.trim());
    digits
        .parse()
        .map_err(|_| Error::TypeMismatch(format!("{what} value is not numeric: {s:?}")))
}

fn unsupported(what: &str, value: &str) -> Error {
    Error::TypeMismatch(format!("{what} must be an int, a string or a list of them; got {value}"))
}

fn non_empty(what: &str, out: Vec<String>) -> Result<Vec<String>> {
    if out.is_empty() {
        return Err(Error::TypeMismatch(format!("{what} list is empty")));
    }
    Ok(out)
}
