//! [`SqliteStore`], the SQLite-backed warranty store.
//!
//! Opening a store configures the connection, then runs every pending
//! migration from the catalog. Repository methods live in the sibling
//! modules (`categories`, `items`, `documents`, `histories`,
//! `notifications`), all as `impl SqliteStore` blocks.

use std::path::Path;

use garant_core::owner::Owner;

use crate::{
  catalog,
  encode::RawOwner,
  migrate::{MigrationRunner, VersionLedger},
  Error, Result,
};

/// Boot-time options.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
  /// Destructive, opt-in: delete the database file before opening so that
  /// migrations re-run from zero. Development and testing only.
  pub reset_on_open: bool,
}

/// A warranty store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. The host
/// process is single-instance; no multi-writer contention is arbitrated.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run pending migrations.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with(path, StoreOptions::default()).await
  }

  /// Open with explicit [`StoreOptions`].
  pub async fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
    let path = path.as_ref();
    if options.reset_on_open {
      tracing::warn!(?path, "reset_on_open set, wiping database");
      remove_database_files(path);
    }
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::boot(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::boot(conn).await
  }

  async fn boot(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(
          "PRAGMA journal_mode = WAL;
           PRAGMA foreign_keys = ON;",
        )?;
        Ok(())
      })
      .await?;

    MigrationRunner::new(catalog::all()).run(&conn).await?;
    Ok(Self { conn })
  }

  pub(crate) fn conn(&self) -> &tokio_rusqlite::Connection { &self.conn }

  /// The derived schema version: the number of migrations applied.
  pub async fn schema_version(&self) -> Result<i64> {
    let version = self
      .conn
      .call(|conn| Ok(VersionLedger::current_version(conn)?))
      .await?;
    Ok(version)
  }

  // ── Owner ─────────────────────────────────────────────────────────────────

  /// The single local tenant, created by the initial migration.
  pub async fn owner(&self) -> Result<Owner> {
    let raw: RawOwner = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT id, unikode, created_at, updated_at FROM owners LIMIT 1",
          [],
          |row| {
            Ok(RawOwner {
              id:         row.get(0)?,
              unikode:    row.get(1)?,
              created_at: row.get(2)?,
              updated_at: row.get(3)?,
            })
          },
        )?)
      })
      .await?;

    raw.into_owner()
  }

  // ── Onboardings ───────────────────────────────────────────────────────────

  pub async fn is_onboarding_completed(&self, name: &str) -> Result<bool> {
    let name = name.to_owned();
    let completed: bool = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT EXISTS(SELECT 1 FROM onboardings WHERE name = ?1 AND is_completed = 1)",
          rusqlite::params![name],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(completed)
  }

  pub async fn complete_onboarding(&self, name: &str) -> Result<()> {
    let name_param = name.to_owned();
    let changes: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE onboardings SET is_completed = 1, updated_at = ?2 WHERE name = ?1",
          rusqlite::params![name_param, chrono::Utc::now().to_rfc3339()],
        )?)
      })
      .await?;

    if changes == 0 {
      return Err(Error::SaveConflict { entity: "onboarding", id: name.to_owned() });
    }
    Ok(())
  }
}

/// Best-effort removal of the database file and its WAL siblings.
fn remove_database_files(path: &Path) {
  for suffix in ["", "-wal", "-shm"] {
    let mut file = path.as_os_str().to_owned();
    file.push(suffix);
    if let Err(err) = std::fs::remove_file(Path::new(&file)) {
      if err.kind() != std::io::ErrorKind::NotFound {
        tracing::warn!(?file, %err, "failed to remove database file");
      }
    }
  }
}
