//! Document repository, the polymorphic attachment index, and the orphan
//! garbage collector ("ghostbuster").
//!
//! Which entities use a document is expressed only through the
//! `document_attachments` join. Detaching never reclaims anything by
//! itself; reclamation is the explicit [`SqliteStore::ghostbuster`] sweep.

use garant_core::{
  document::{Document, DocumentAttachment, EntityKind, FileSource},
  id::new_id,
};

use crate::{
  encode::{
    encode_document_type, encode_entity_kind, encode_file_source, RawAttachment,
    RawDocument,
  },
  Error, Result, SqliteStore,
};

const DOCUMENT_COLUMNS: &str =
  "id, owner_id, name, filename, mimetype, type, file_path, file_source";

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawDocument> {
  Ok(RawDocument {
    id:          row.get(0)?,
    owner_id:    row.get(1)?,
    name:        row.get(2)?,
    filename:    row.get(3)?,
    mimetype:    row.get(4)?,
    doc_type:    row.get(5)?,
    file_path:   row.get(6)?,
    file_source: row.get(7)?,
  })
}

impl SqliteStore {
  // ── Documents ─────────────────────────────────────────────────────────────

  pub async fn list_documents(&self, owner_id: &str) -> Result<Vec<Document>> {
    let owner_id = owner_id.to_owned();
    let raws: Vec<RawDocument> = self
      .conn()
      .call(move |conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE owner_id = ?1"))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_id], row_to_raw)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  pub async fn get_document(&self, id: &str, owner_id: &str) -> Result<Option<Document>> {
    use rusqlite::OptionalExtension as _;

    let id = id.to_owned();
    let owner_id = owner_id.to_owned();
    let raw: Option<RawDocument> = self
      .conn()
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1 AND owner_id = ?2"
              ),
              rusqlite::params![id, owner_id],
              row_to_raw,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  /// Insert-or-update by presence of id.
  pub async fn save_document(&self, mut document: Document) -> Result<Document> {
    match document.id.clone() {
      Some(id) => {
        let changes = {
          let doc = document.clone();
          let id = id.clone();
          self
            .conn()
            .call(move |conn| {
              Ok(conn.execute(
                "UPDATE documents SET
                   name = ?1, filename = ?2, mimetype = ?3, type = ?4,
                   file_path = ?5, file_source = ?6
                 WHERE id = ?7 AND owner_id = ?8",
                rusqlite::params![
                  doc.name,
                  doc.filename,
                  doc.mimetype,
                  encode_document_type(doc.doc_type),
                  doc.file_path,
                  encode_file_source(doc.file_source),
                  id,
                  doc.owner_id,
                ],
              )?)
            })
            .await?
        };
        if changes == 0 {
          return Err(Error::SaveConflict { entity: "document", id });
        }
      }
      None => {
        document.id = Some(new_id());
        let doc = document.clone();
        self
          .conn()
          .call(move |conn| {
            conn.execute(
              &format!(
                "INSERT INTO documents ({DOCUMENT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
              ),
              rusqlite::params![
                doc.id,
                doc.owner_id,
                doc.name,
                doc.filename,
                doc.mimetype,
                encode_document_type(doc.doc_type),
                doc.file_path,
                encode_file_source(doc.file_source),
              ],
            )?;
            Ok(())
          })
          .await?;
      }
    }

    Ok(document)
  }

  /// Delete a document row; its attachment rows go with it via cascade.
  /// The backing file is not touched; that is the collector's concern.
  pub async fn delete_document(&self, id: &str, owner_id: &str) -> Result<()> {
    let id_param = id.to_owned();
    let owner_id = owner_id.to_owned();
    let changes: usize = self
      .conn()
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM documents WHERE id = ?1 AND owner_id = ?2",
          rusqlite::params![id_param, owner_id],
        )?)
      })
      .await?;

    if changes == 0 {
      return Err(Error::SaveConflict { entity: "document", id: id.to_owned() });
    }
    Ok(())
  }

  // ── Attachment index ──────────────────────────────────────────────────────

  /// Attach a document to an owning entity. The document must exist (the
  /// join row carries a foreign key on `document_id`); the entity side is
  /// polymorphic and unchecked.
  pub async fn attach_document(
    &self,
    document_id: &str,
    entity_id: &str,
    kind: EntityKind,
  ) -> Result<DocumentAttachment> {
    let attachment = DocumentAttachment {
      id: new_id(),
      document_id: document_id.to_owned(),
      entity_id: entity_id.to_owned(),
      entity_kind: kind,
    };

    let changes = {
      let a = attachment.clone();
      self
        .conn()
        .call(move |conn| {
          Ok(conn.execute(
            "INSERT INTO document_attachments (id, document_id, entity_id, model)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![a.id, a.document_id, a.entity_id, encode_entity_kind(a.entity_kind)],
          )?)
        })
        .await?
    };

    if changes == 0 {
      return Err(Error::AttachmentConflict {
        document_id: document_id.to_owned(),
        entity_id:   entity_id.to_owned(),
      });
    }
    Ok(attachment)
  }

  /// Remove the matching join row. The pair not being attached is a
  /// conflict, not a silent no-op.
  pub async fn detach_document(
    &self,
    document_id: &str,
    entity_id: &str,
    kind: EntityKind,
  ) -> Result<()> {
    let doc_param = document_id.to_owned();
    let entity_param = entity_id.to_owned();
    let model = encode_entity_kind(kind);

    let changes: usize = self
      .conn()
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM document_attachments
           WHERE document_id = ?1 AND entity_id = ?2 AND model = ?3",
          rusqlite::params![doc_param, entity_param, model],
        )?)
      })
      .await?;

    if changes == 0 {
      return Err(Error::AttachmentConflict {
        document_id: document_id.to_owned(),
        entity_id:   entity_id.to_owned(),
      });
    }
    Ok(())
  }

  /// All attachment rows pointing at one document. Useful for deciding
  /// whether a document is still in use before detaching it.
  pub async fn attachments_for_document(
    &self,
    document_id: &str,
  ) -> Result<Vec<DocumentAttachment>> {
    let document_id = document_id.to_owned();
    let raws: Vec<RawAttachment> = self
      .conn()
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, document_id, entity_id, model
           FROM document_attachments WHERE document_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![document_id], |row| {
            Ok(RawAttachment {
              id:          row.get(0)?,
              document_id: row.get(1)?,
              entity_id:   row.get(2)?,
              model:       row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttachment::into_attachment).collect()
  }

  /// All documents attached to one entity. No ordering is guaranteed.
  pub async fn documents_for(&self, entity_id: &str, kind: EntityKind) -> Result<Vec<Document>> {
    let entity_id = entity_id.to_owned();
    let model = encode_entity_kind(kind);

    let raws: Vec<RawDocument> = self
      .conn()
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT d.id, d.owner_id, d.name, d.filename, d.mimetype, d.type,
                  d.file_path, d.file_source
           FROM documents d
           INNER JOIN document_attachments a ON a.document_id = d.id
           WHERE a.entity_id = ?1 AND a.model = ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![entity_id, model], row_to_raw)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  // ── Ghostbuster ───────────────────────────────────────────────────────────

  /// Reclaim every document of `owner_id` with zero attachment rows.
  ///
  /// Local backing files are removed best-effort: a failed file deletion is
  /// logged and the row is deleted regardless, so one bad path never blocks
  /// the rest of the sweep. A document with any attachment row, even one
  /// pointing at a since-deleted entity, is never touched. Returns the
  /// number of documents reclaimed; running twice with no intervening
  /// writes reclaims zero the second time.
  pub async fn ghostbuster(&self, owner_id: &str) -> Result<usize> {
    let orphans = {
      let owner_id = owner_id.to_owned();
      let raws: Vec<RawDocument> = self
        .conn()
        .call(move |conn| {
          let mut stmt = conn.prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE id NOT IN (SELECT document_id FROM document_attachments)
               AND owner_id = ?1",
          ))?;
          let rows = stmt
            .query_map(rusqlite::params![owner_id], row_to_raw)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?;
      raws
        .into_iter()
        .map(RawDocument::into_document)
        .collect::<Result<Vec<_>>>()?
    };

    for doc in &orphans {
      if doc.file_source == FileSource::Local && !doc.file_path.is_empty() {
        if let Err(err) = std::fs::remove_file(&doc.file_path) {
          tracing::warn!(path = %doc.file_path, %err, "failed to remove orphaned document file");
        }
      }
    }

    let owner_param = owner_id.to_owned();
    let removed: usize = self
      .conn()
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM documents
           WHERE id NOT IN (SELECT document_id FROM document_attachments)
             AND owner_id = ?1",
          rusqlite::params![owner_param],
        )?)
      })
      .await?;

    if removed > 0 {
      tracing::info!(removed, "who you gonna call? removed orphaned documents");
    }
    Ok(removed)
  }
}
