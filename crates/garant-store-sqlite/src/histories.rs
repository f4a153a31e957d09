//! History (intervention record) repository.

use garant_core::{document::EntityKind, history::History, id::new_id};

use crate::{
  encode::{encode_dt, encode_entity_kind, encode_history_label, RawHistory},
  Error, Result, SqliteStore,
};

const HISTORY_COLUMNS: &str =
  "id, item_id, label, intervention_date, description, created_at, updated_at";

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawHistory> {
  Ok(RawHistory {
    id:                row.get(0)?,
    item_id:           row.get(1)?,
    label:             row.get(2)?,
    intervention_date: row.get(3)?,
    description:       row.get(4)?,
    created_at:        row.get(5)?,
    updated_at:        row.get(6)?,
  })
}

impl SqliteStore {
  /// All interventions for one item, most recent first. Histories carry no
  /// `owner_id` column of their own; the owner scope goes through the item.
  pub async fn list_histories(&self, item_id: &str, owner_id: &str) -> Result<Vec<History>> {
    let item_id = item_id.to_owned();
    let owner_id = owner_id.to_owned();
    let raws: Vec<RawHistory> = self
      .conn()
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {HISTORY_COLUMNS} FROM histories
           WHERE item_id = ?1
             AND EXISTS (SELECT 1 FROM items WHERE id = ?1 AND owner_id = ?2)
           ORDER BY intervention_date DESC",
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![item_id, owner_id], row_to_raw)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHistory::into_history).collect()
  }

  /// Insert-or-update by presence of id.
  pub async fn save_history(&self, mut history: History) -> Result<History> {
    let now = chrono::Utc::now();
    history.updated_at = now;

    match history.id.clone() {
      Some(id) => {
        let changes = {
          let h = history.clone();
          let id = id.clone();
          self
            .conn()
            .call(move |conn| {
              Ok(conn.execute(
                "UPDATE histories SET
                   label = ?1, intervention_date = ?2, description = ?3, updated_at = ?4
                 WHERE id = ?5 AND item_id = ?6",
                rusqlite::params![
                  encode_history_label(h.label),
                  encode_dt(h.intervention_date),
                  h.description,
                  encode_dt(h.updated_at),
                  id,
                  h.item_id,
                ],
              )?)
            })
            .await?
        };
        if changes == 0 {
          return Err(Error::SaveConflict { entity: "history", id });
        }
      }
      None => {
        history.id = Some(new_id());
        history.created_at = now;

        let h = history.clone();
        self
          .conn()
          .call(move |conn| {
            conn.execute(
              &format!(
                "INSERT INTO histories ({HISTORY_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
              ),
              rusqlite::params![
                h.id,
                h.item_id,
                encode_history_label(h.label),
                encode_dt(h.intervention_date),
                h.description,
                encode_dt(h.created_at),
                encode_dt(h.updated_at),
              ],
            )?;
            Ok(())
          })
          .await?;
      }
    }

    Ok(history)
  }

  /// Delete a history and its document attachments in one transaction, so
  /// a deleted history never leaves dangling attachment rows that would
  /// shield its documents from the garbage collector.
  pub async fn delete_history(&self, id: &str, item_id: &str, owner_id: &str) -> Result<()> {
    let id_param = id.to_owned();
    let item_id = item_id.to_owned();
    let owner_id = owner_id.to_owned();
    let model = encode_entity_kind(EntityKind::History);

    let changes: usize = self
      .conn()
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changes = tx.execute(
          "DELETE FROM histories
           WHERE id = ?1 AND item_id = ?2
             AND EXISTS (SELECT 1 FROM items WHERE id = ?2 AND owner_id = ?3)",
          rusqlite::params![id_param, item_id, owner_id],
        )?;
        if changes > 0 {
          tx.execute(
            "DELETE FROM document_attachments WHERE entity_id = ?1 AND model = ?2",
            rusqlite::params![id_param, model],
          )?;
          tx.commit()?;
        }
        Ok(changes)
      })
      .await?;

    if changes == 0 {
      return Err(Error::SaveConflict { entity: "history", id: id.to_owned() });
    }
    Ok(())
  }
}
