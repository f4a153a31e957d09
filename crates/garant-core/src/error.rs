//! Error types for `garant-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain invariant required for persistence is missing. Raised before
  /// any write is attempted.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("invalid warranty duration: {0:?}")]
  InvalidWarrantyDuration(String),

  #[error("unknown {field} discriminant: {value:?}")]
  UnknownDiscriminant {
    field: &'static str,
    value: String,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
