//! Owner: the single local tenant every other entity is scoped under.
//!
//! Exactly one owner row is created by the initial migration; it is never
//! deleted in normal operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
  pub id:         String,
  /// Short human-shareable code, e.g. `GE-4F09A1`.
  pub unikode:    String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
