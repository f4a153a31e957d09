//! Error type for `garant-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] garant_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A migration's apply step failed. Fatal: the run is aborted and boot
  /// must not proceed against the partially-migrated schema.
  #[error("migration {name:?} failed: {source}")]
  Migration {
    name:   &'static str,
    #[source]
    source: tokio_rusqlite::Error,
  },

  /// A write affected zero rows where exactly one was expected: stale id,
  /// wrong owner, or an already-deleted row.
  #[error("{entity} write conflict: no row matched id {id:?}")]
  SaveConflict {
    entity: &'static str,
    id:     String,
  },

  /// An attach/detach affected zero rows.
  #[error("attachment conflict for document {document_id:?} and entity {entity_id:?}")]
  AttachmentConflict {
    document_id: String,
    entity_id:   String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
