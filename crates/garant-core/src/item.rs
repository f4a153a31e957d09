//! Item: a purchased product under warranty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{warranty, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
  /// `None` until first saved; the repository assigns an id before insert.
  pub id:                Option<String>,
  pub owner_id:          String,
  pub label:             String,
  pub brand:             Option<String>,
  pub category_id:       String,
  /// Path to a product photo on the device, if any.
  pub picture:           Option<String>,
  pub purchase_date:     DateTime<Utc>,
  /// Compact duration string, e.g. `"2y"` or `"1y 6m"`.
  pub warranty_duration: String,
  pub memo:              Option<String>,
  pub is_archived:       bool,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

impl Item {
  /// The date this item's warranty runs out.
  pub fn warranty_end_date(&self) -> Result<DateTime<Utc>> {
    warranty::end_date(self.purchase_date, &self.warranty_duration)
  }

  /// Whether the warranty has expired as of `now`. Expired items are the
  /// ones eligible for archival.
  pub fn is_warranty_expired(&self, now: DateTime<Utc>) -> Result<bool> {
    warranty::is_expired(self.purchase_date, &self.warranty_duration, now)
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn item(duration: &str) -> Item {
    Item {
      id:                Some("item-1".into()),
      owner_id:          "owner-1".into(),
      label:             "Lave-linge".into(),
      brand:             Some("Bosch".into()),
      category_id:       "default-category-1".into(),
      picture:           None,
      purchase_date:     Utc.with_ymd_and_hms(2022, 3, 10, 0, 0, 0).unwrap(),
      warranty_duration: duration.into(),
      memo:              None,
      is_archived:       false,
      created_at:        Utc::now(),
      updated_at:        Utc::now(),
    }
  }

  #[test]
  fn end_date_follows_duration() {
    let end = item("15d").warranty_end_date().unwrap();
    assert_eq!(end, Utc.with_ymd_and_hms(2022, 3, 25, 0, 0, 0).unwrap());
  }

  #[test]
  fn expiry_flag() {
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    assert!(item("1y").is_warranty_expired(now).unwrap());
    assert!(!item("8y").is_warranty_expired(now).unwrap());
  }
}
