//! Versioned schema migration: the ledger, the migration descriptor, and the
//! runner that sequences them.
//!
//! The per-migration-name ledger table (`schema_migrations`) is the
//! authoritative record of what has been applied; the integer schema version
//! is derived from it (`MAX(version)`), so the two can never disagree.
//! `PRAGMA user_version` is kept as a mirror for external inspection only.

use crate::{Error, Result};

// ─── Migration descriptor ────────────────────────────────────────────────────

/// A unit of schema change.
///
/// `apply` bodies must be idempotent-safe (`CREATE TABLE IF NOT EXISTS`,
/// existence-guarded `ADD COLUMN`): a migration may be re-invoked if a
/// previous run failed before its ledger record was written. Target versions
/// are assigned at authoring time, strictly increasing, and never reused.
#[derive(Clone, Copy)]
pub struct Migration {
  pub name:           &'static str,
  pub target_version: i64,
  pub apply:          fn(&rusqlite::Connection) -> rusqlite::Result<()>,
}

// ─── VersionLedger ───────────────────────────────────────────────────────────

/// Synchronous accessors over the `schema_migrations` ledger table.
///
/// Absence of the table means a fresh install: "nothing has run", not an
/// error. The runner creates the table before applying anything.
pub struct VersionLedger;

impl VersionLedger {
  pub fn ensure_table(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
      "CREATE TABLE IF NOT EXISTS schema_migrations (
         name       TEXT PRIMARY KEY,
         version    INTEGER NOT NULL UNIQUE,
         applied_at TEXT NOT NULL
       );",
    )
  }

  fn table_exists(conn: &rusqlite::Connection) -> rusqlite::Result<bool> {
    conn.query_row(
      "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations'",
      [],
      |row| row.get::<_, i64>(0),
    )
    .map(|n| n > 0)
  }

  /// The number of migrations applied so far; 0 on a fresh install.
  pub fn current_version(conn: &rusqlite::Connection) -> rusqlite::Result<i64> {
    if !Self::table_exists(conn)? {
      return Ok(0);
    }
    conn.query_row(
      "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
      [],
      |row| row.get(0),
    )
  }

  /// Whether a completion record exists for `name`.
  pub fn has_record(conn: &rusqlite::Connection, name: &str) -> rusqlite::Result<bool> {
    if !Self::table_exists(conn)? {
      return Ok(false);
    }
    conn.query_row(
      "SELECT COUNT(*) FROM schema_migrations WHERE name = ?1",
      rusqlite::params![name],
      |row| row.get::<_, i64>(0),
    )
    .map(|n| n > 0)
  }

  /// Record a successfully applied migration and mirror the new version into
  /// `PRAGMA user_version`.
  pub fn record(
    conn: &rusqlite::Connection,
    name: &str,
    version: i64,
  ) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO schema_migrations (name, version, applied_at) VALUES (?1, ?2, ?3)",
      rusqlite::params![name, version, chrono::Utc::now().to_rfc3339()],
    )?;
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
  }
}

// ─── MigrationRunner ─────────────────────────────────────────────────────────

/// Executes a catalog of migrations against the ledger, exactly once each,
/// in ascending `target_version` order.
pub struct MigrationRunner {
  migrations: Vec<Migration>,
}

impl MigrationRunner {
  /// Declaration order of the catalog does not matter; the runner sorts.
  pub fn new(mut migrations: Vec<Migration>) -> Self {
    migrations.sort_by_key(|m| m.target_version);
    Self { migrations }
  }

  /// Run all pending migrations and return the resulting schema version.
  ///
  /// Each migration applies inside its own transaction together with its
  /// ledger record; there is no enclosing transaction across migrations.
  /// The first failure aborts the run; later migrations are not attempted
  /// and the error names the migration that failed.
  pub async fn run(&self, conn: &tokio_rusqlite::Connection) -> Result<i64> {
    conn
      .call(|conn| {
        VersionLedger::ensure_table(conn)?;
        Ok(())
      })
      .await?;

    for migration in &self.migrations {
      let Migration { name, target_version, apply } = *migration;

      let applied: bool = conn
        .call(move |conn| {
          if VersionLedger::has_record(conn, name)?
            || VersionLedger::current_version(conn)? >= target_version
          {
            return Ok(false);
          }
          let tx = conn.transaction()?;
          apply(&tx)?;
          VersionLedger::record(&tx, name, target_version)?;
          tx.commit()?;
          Ok(true)
        })
        .await
        .map_err(|source| Error::Migration { name, source })?;

      if applied {
        tracing::info!(name, version = target_version, "applied migration");
      } else {
        tracing::debug!(name, version = target_version, "skipped migration");
      }
    }

    let version = conn.call(|conn| Ok(VersionLedger::current_version(conn)?)).await?;
    Ok(version)
  }
}
