//! The schema catalog: every migration known to this build.
//!
//! Target versions are append-only history; never renumber or reuse them.
//! Declaration order below is irrelevant; the runner sorts by version.

use garant_core::{
  category::DEFAULT_CATEGORIES,
  id::{new_id, new_unikode},
};

use crate::migrate::Migration;

pub fn all() -> Vec<Migration> {
  vec![
    Migration {
      name:           "add_brand_column_to_items",
      target_version: 2,
      apply:          add_brand_column_to_items,
    },
    Migration {
      name:           "add_type_column_to_documents",
      target_version: 3,
      apply:          add_type_column_to_documents,
    },
    Migration {
      name:           "create_onboardings_table",
      target_version: 4,
      apply:          create_onboardings_table,
    },
    Migration {
      name:           "create_notifications_table",
      target_version: 5,
      apply:          create_notifications_table,
    },
    Migration {
      name:           "add_description_column_to_histories",
      target_version: 6,
      apply:          add_description_column_to_histories,
    },
    Migration {
      name:           "create_initial_schema",
      target_version: 1,
      apply:          create_initial_schema,
    },
  ]
}

// ─── v1: initial schema ──────────────────────────────────────────────────────

/// Entity tables, the category-delete reassignment trigger, the owner row,
/// and the seven default categories.
const INITIAL_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS owners (
    id         TEXT PRIMARY KEY NOT NULL,
    unikode    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id         TEXT PRIMARY KEY NOT NULL,
    name       TEXT NOT NULL,
    owner_id   TEXT NOT NULL REFERENCES owners(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    id          TEXT PRIMARY KEY NOT NULL,
    name        TEXT NOT NULL,
    filename    TEXT NOT NULL,
    mimetype    TEXT NOT NULL,
    file_path   TEXT NOT NULL,
    file_source TEXT NOT NULL,
    owner_id    TEXT NOT NULL REFERENCES owners(id) ON DELETE CASCADE
);

-- Polymorphic join: entity_id/model deliberately carry no foreign key so any
-- entity table can own documents. Rows referencing a deleted document are
-- removed by the cascade on document_id.
CREATE TABLE IF NOT EXISTS document_attachments (
    id          TEXT PRIMARY KEY NOT NULL,
    document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    entity_id   TEXT NOT NULL,
    model       TEXT NOT NULL DEFAULT 'Item'
);

CREATE TABLE IF NOT EXISTS histories (
    id                TEXT PRIMARY KEY NOT NULL,
    item_id           TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
    label             TEXT NOT NULL,
    intervention_date TEXT NOT NULL,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS items (
    id                TEXT PRIMARY KEY NOT NULL,
    owner_id          TEXT NOT NULL REFERENCES owners(id) ON DELETE CASCADE,
    label             TEXT NOT NULL,
    category_id       TEXT NOT NULL REFERENCES categories(id),
    picture           TEXT,
    purchase_date     TEXT,
    warranty_duration TEXT,
    memo              TEXT,
    is_archived       INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

-- Runs before the category row disappears, so the foreign-key check on
-- items.category_id passes. The fallback category itself is protected by
-- the WHEN clause and by the repository refusing to delete it.
CREATE TRIGGER IF NOT EXISTS reassign_items_on_category_delete
BEFORE DELETE ON categories
FOR EACH ROW
WHEN OLD.id != 'default-category-7'
BEGIN
  UPDATE items SET category_id = 'default-category-7' WHERE category_id = OLD.id;
END;

CREATE INDEX IF NOT EXISTS document_attachments_document_idx
  ON document_attachments(document_id);
CREATE INDEX IF NOT EXISTS document_attachments_entity_idx
  ON document_attachments(entity_id, model);
CREATE INDEX IF NOT EXISTS histories_item_idx ON histories(item_id);
CREATE INDEX IF NOT EXISTS items_owner_idx    ON items(owner_id);
";

fn create_initial_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.execute_batch(INITIAL_SCHEMA)?;

  let has_owner: bool =
    conn.query_row("SELECT EXISTS(SELECT 1 FROM owners)", [], |row| row.get(0))?;
  if !has_owner {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
      "INSERT INTO owners (id, unikode, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
      rusqlite::params![new_id(), new_unikode(), now],
    )?;
  }

  let owner_id: String =
    conn.query_row("SELECT id FROM owners LIMIT 1", [], |row| row.get(0))?;
  for (id, name) in DEFAULT_CATEGORIES {
    conn.execute(
      "INSERT OR IGNORE INTO categories (id, name, owner_id, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?4)",
      rusqlite::params![id, name, owner_id, chrono::Utc::now().to_rfc3339()],
    )?;
  }

  Ok(())
}

// ─── v2: items.brand ─────────────────────────────────────────────────────────

fn add_brand_column_to_items(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  if !column_exists(conn, "items", "brand")? {
    conn.execute_batch("ALTER TABLE items ADD COLUMN brand TEXT DEFAULT NULL;")?;
  }
  Ok(())
}

// ─── v3: documents.type ──────────────────────────────────────────────────────

fn add_type_column_to_documents(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  if !column_exists(conn, "documents", "type")? {
    conn.execute_batch("ALTER TABLE documents ADD COLUMN type TEXT DEFAULT 'invoice';")?;
  }
  Ok(())
}

// ─── v4: onboardings ─────────────────────────────────────────────────────────

fn create_onboardings_table(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.execute_batch(
    "CREATE TABLE IF NOT EXISTS onboardings (
       name         TEXT PRIMARY KEY NOT NULL,
       is_completed INTEGER NOT NULL DEFAULT 0,
       created_at   TEXT NOT NULL,
       updated_at   TEXT NOT NULL
     );",
  )?;
  conn.execute(
    "INSERT OR IGNORE INTO onboardings (name, is_completed, created_at, updated_at)
     VALUES ('initial_onboarding', 0, ?1, ?1)",
    rusqlite::params![chrono::Utc::now().to_rfc3339()],
  )?;
  Ok(())
}

// ─── v5: notifications ───────────────────────────────────────────────────────

fn create_notifications_table(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.execute_batch(
    "CREATE TABLE IF NOT EXISTS notifications (
       id                     TEXT PRIMARY KEY NOT NULL,
       title                  TEXT NOT NULL,
       body                   TEXT NOT NULL,
       data                   TEXT,
       device_notification_id TEXT NOT NULL,
       scheduled_time         TEXT NOT NULL,
       is_read                INTEGER NOT NULL DEFAULT 0,
       created_at             TEXT NOT NULL
     );
     CREATE INDEX IF NOT EXISTS notifications_device_id_idx
       ON notifications(device_notification_id);",
  )
}

// ─── v6: histories.description ───────────────────────────────────────────────

fn add_description_column_to_histories(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  if !column_exists(conn, "histories", "description")? {
    conn.execute_batch("ALTER TABLE histories ADD COLUMN description TEXT DEFAULT NULL;")?;
  }
  Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn column_exists(
  conn: &rusqlite::Connection,
  table: &str,
  column: &str,
) -> rusqlite::Result<bool> {
  conn
    .query_row(
      "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
      rusqlite::params![table, column],
      |row| row.get::<_, i64>(0),
    )
    .map(|n| n > 0)
}
