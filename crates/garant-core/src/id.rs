//! Id and unikode generation.
//!
//! Every entity id is an opaque string, assigned before the first write;
//! the store never relies on storage-assigned identity. Seeded
//! category rows use fixed well-known ids instead of generated ones.

use uuid::Uuid;

/// Generate a new globally-unique entity id.
pub fn new_id() -> String { Uuid::new_v4().hyphenated().to_string() }

/// Generate a short human-shareable owner code, e.g. `GE-4F09A1`.
pub fn new_unikode() -> String {
  let hex = Uuid::new_v4().simple().to_string();
  format!("GE-{}", hex[..6].to_uppercase())
}
