//! History: an intervention record (repair, maintenance, and so on) on an item.
//!
//! Histories are owned exclusively by one item and are deleted with it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of intervention took place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryLabel {
  Repair,
  Maintenance,
  Update,
  Replacement,
  Inspection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
  /// `None` until first saved.
  pub id:                Option<String>,
  pub item_id:           String,
  pub label:             HistoryLabel,
  pub intervention_date: DateTime<Utc>,
  pub description:       Option<String>,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

impl History {
  pub fn new(
    item_id: impl Into<String>,
    label: HistoryLabel,
    intervention_date: DateTime<Utc>,
  ) -> Self {
    let now = Utc::now();
    Self {
      id: None,
      item_id: item_id.into(),
      label,
      intervention_date,
      description: None,
      created_at: now,
      updated_at: now,
    }
  }
}
