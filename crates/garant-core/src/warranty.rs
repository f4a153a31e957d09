//! The compact warranty-duration grammar.
//!
//! Durations are stored as short strings like `"8y"`, `"6m"`, `"15d"` or
//! combinations (`"1y 6m"`). Units weigh y = 365 days, m = 30 days, d = 1
//! day; calendar precision is deliberately not attempted.

use chrono::{DateTime, Duration, Utc};

use crate::{Error, Result};

/// Parse a compact duration string into a number of days.
///
/// Whitespace between segments is ignored. An empty string, a segment with
/// no digits, or an unknown unit is an error.
pub fn duration_in_days(spec: &str) -> Result<i64> {
  let mut days = 0i64;
  let mut digits = String::new();
  let mut seen_segment = false;

  for c in spec.trim().to_lowercase().chars() {
    match c {
      '0'..='9' => digits.push(c),
      'y' | 'm' | 'd' => {
        if digits.is_empty() {
          return Err(Error::InvalidWarrantyDuration(spec.to_owned()));
        }
        let n: i64 = digits
          .parse()
          .map_err(|_| Error::InvalidWarrantyDuration(spec.to_owned()))?;
        days += match c {
          'y' => n * 365,
          'm' => n * 30,
          _ => n,
        };
        digits.clear();
        seen_segment = true;
      }
      c if c.is_whitespace() => {}
      _ => return Err(Error::InvalidWarrantyDuration(spec.to_owned())),
    }
  }

  // Trailing digits without a unit, or nothing at all.
  if !digits.is_empty() || !seen_segment {
    return Err(Error::InvalidWarrantyDuration(spec.to_owned()));
  }

  Ok(days)
}

/// The date a warranty starting at `purchase_date` runs out.
pub fn end_date(purchase_date: DateTime<Utc>, spec: &str) -> Result<DateTime<Utc>> {
  Ok(purchase_date + Duration::days(duration_in_days(spec)?))
}

/// Whether a warranty starting at `purchase_date` has expired as of `now`.
pub fn is_expired(purchase_date: DateTime<Utc>, spec: &str, now: DateTime<Utc>) -> Result<bool> {
  Ok(now > end_date(purchase_date, spec)?)
}
