use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Days per month, January first.
///
/// The default is the fixed non-leap table, so February always has 28 days
/// regardless of the year being requested. Use [`DayCountTable::leap_aware`] to
/// get real month lengths instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct DayCountTable(pub [u32; 12]);

impl DayCountTable {
    pub const NON_LEAP: DayCountTable =
        DayCountTable([31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]);

    /// Real month lengths for `year`.
    pub fn leap_aware(year: i32) -> Result<Self> {
        let mut days = [0u32; 12];
        for (i, slot) in days.iter_mut().enumerate() {
            let month = i as u32 + 1;
            let first = NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| Error::Configuration(format!("invalid year {year}")))?;
            let next = if month == 12 {
                NaiveDate::from_ymd_opt(year + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(year, month + 1, 1)
            }
            .ok_or_else(|| Error::Configuration(format!("invalid year {year}")))?;
            *slot = next.signed_duration_since(first).num_days() as u32;
        }
        Ok(Self(days))
    }

    pub fn validate(&self) -> Result<()> {
        if let Some((i, n)) = self.0.iter().enumerate().find(|(_, n)| !(1..=31).contains(*n)) {
            return Err(Error::Configuration(format!(
                "day count for month {:02} must be within 1..=31, got {n}",
                i + 1
            )));
        }
        Ok(())
    }

    /// Two-digit day codes `"01"..` for a two-digit month code.
    pub fn day_codes(&self, month: &str) -> Result<Vec<String>> {
        let m: usize = month
            .parse()
            .ok()
            .filter(|m| (1..=12).contains(m))
            .ok_or_else(|| Error::TypeMismatch(format!("invalid month code: {month}")))?;
        Ok((1..=self.0[m - 1]).map(|d| format!("{d:02}")).collect())
    }
}

impl Default for DayCountTable {
    fn default() -> Self {
        Self::NON_LEAP
    }
}
