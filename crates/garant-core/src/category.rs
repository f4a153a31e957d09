//! Item categories, including the seeded defaults and the fallback rule.
//!
//! Seven default categories are created per owner by the initial migration.
//! Deleting a category must never orphan items: a schema trigger reassigns
//! affected items to [`FALLBACK_CATEGORY_ID`], and the repository refuses to
//! delete the fallback category itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The category items fall back to when their own category is deleted.
pub const FALLBACK_CATEGORY_ID: &str = "default-category-7";

/// Fixed `(id, name)` pairs seeded for the owner at first migration.
pub const DEFAULT_CATEGORIES: [(&str, &str); 7] = [
  ("default-category-1", "Électroménagé"),
  ("default-category-2", "Petit éléctroménagé"),
  ("default-category-3", "Bricolage"),
  ("default-category-4", "Jardin"),
  ("default-category-5", "Mode"),
  ("default-category-6", "Multimédia"),
  ("default-category-7", "Autre"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
  /// `None` until first saved.
  pub id:         Option<String>,
  pub owner_id:   String,
  pub name:       String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Category {
  pub fn new(owner_id: impl Into<String>, name: impl Into<String>) -> Self {
    let now = Utc::now();
    Self {
      id:         None,
      owner_id:   owner_id.into(),
      name:       name.into(),
      created_at: now,
      updated_at: now,
    }
  }

  pub fn is_fallback(&self) -> bool {
    self.id.as_deref() == Some(FALLBACK_CATEGORY_ID)
  }
}
