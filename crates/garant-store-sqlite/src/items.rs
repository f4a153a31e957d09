//! Item repository.
//!
//! Deleting an item cascade-detaches its document attachments, and those of
//! its histories, in the same transaction (the history rows themselves
//! cascade through their foreign key). A deleted item never leaves dangling
//! attachment rows behind, so its documents and its histories' documents
//! become visible to the garbage collector.

use garant_core::{id::new_id, item::Item};

use crate::{
  encode::{encode_dt, encode_entity_kind, RawItem},
  Error, Result, SqliteStore,
};

/// Filters for [`SqliteStore::list_items`].
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
  /// Restrict to one category.
  pub category_id:      Option<String>,
  /// Include items whose warranty has been archived.
  pub include_archived: bool,
}

const ITEM_COLUMNS: &str = "id, owner_id, label, brand, category_id, picture, \
                            purchase_date, warranty_duration, memo, is_archived, \
                            created_at, updated_at";

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawItem> {
  Ok(RawItem {
    id:                row.get(0)?,
    owner_id:          row.get(1)?,
    label:             row.get(2)?,
    brand:             row.get(3)?,
    category_id:       row.get(4)?,
    picture:           row.get(5)?,
    purchase_date:     row.get(6)?,
    warranty_duration: row.get(7)?,
    memo:              row.get(8)?,
    is_archived:       row.get(9)?,
    created_at:        row.get(10)?,
    updated_at:        row.get(11)?,
  })
}

impl SqliteStore {
  pub async fn list_items(&self, owner_id: &str, filter: &ItemFilter) -> Result<Vec<Item>> {
    let owner_id = owner_id.to_owned();
    let category_id = filter.category_id.clone();
    let include_archived = filter.include_archived;

    let raws: Vec<RawItem> = self
      .conn()
      .call(move |conn| {
        let mut sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE owner_id = ?1");
        if category_id.is_some() {
          sql.push_str(" AND category_id = ?2");
        }
        if !include_archived {
          sql.push_str(" AND is_archived = 0");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = match category_id {
          Some(cat) => stmt
            .query_map(rusqlite::params![owner_id, cat], row_to_raw)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
          None => stmt
            .query_map(rusqlite::params![owner_id], row_to_raw)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawItem::into_item).collect()
  }

  pub async fn get_item(&self, id: &str, owner_id: &str) -> Result<Option<Item>> {
    use rusqlite::OptionalExtension as _;

    let id = id.to_owned();
    let owner_id = owner_id.to_owned();
    let raw: Option<RawItem> = self
      .conn()
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1 AND owner_id = ?2"),
              rusqlite::params![id, owner_id],
              row_to_raw,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawItem::into_item).transpose()
  }

  /// Insert-or-update by presence of id. The repository assigns a new id
  /// before insert; storage-assigned identity is never relied on.
  pub async fn save_item(&self, mut item: Item) -> Result<Item> {
    let now = chrono::Utc::now();
    item.updated_at = now;

    match item.id.clone() {
      Some(id) => {
        let changes = {
          let item = item.clone();
          let id = id.clone();
          self
            .conn()
            .call(move |conn| {
              Ok(conn.execute(
                "UPDATE items SET
                   label = ?1, brand = ?2, category_id = ?3, picture = ?4,
                   purchase_date = ?5, warranty_duration = ?6, memo = ?7,
                   is_archived = ?8, updated_at = ?9
                 WHERE id = ?10 AND owner_id = ?11",
                rusqlite::params![
                  item.label,
                  item.brand,
                  item.category_id,
                  item.picture,
                  encode_dt(item.purchase_date),
                  item.warranty_duration,
                  item.memo,
                  item.is_archived,
                  encode_dt(item.updated_at),
                  id,
                  item.owner_id,
                ],
              )?)
            })
            .await?
        };
        if changes == 0 {
          return Err(Error::SaveConflict { entity: "item", id });
        }
      }
      None => {
        item.id = Some(new_id());
        item.created_at = now;

        let insert = item.clone();
        self
          .conn()
          .call(move |conn| {
            conn.execute(
              &format!(
                "INSERT INTO items ({ITEM_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
              ),
              rusqlite::params![
                insert.id,
                insert.owner_id,
                insert.label,
                insert.brand,
                insert.category_id,
                insert.picture,
                encode_dt(insert.purchase_date),
                insert.warranty_duration,
                insert.memo,
                insert.is_archived,
                encode_dt(insert.created_at),
                encode_dt(insert.updated_at),
              ],
            )?;
            Ok(())
          })
          .await?;
      }
    }

    Ok(item)
  }

  /// Delete an item, its attachment rows, its histories (via cascade), and
  /// the attachment rows of those histories.
  pub async fn delete_item(&self, id: &str, owner_id: &str) -> Result<()> {
    let id_param = id.to_owned();
    let owner_id = owner_id.to_owned();
    let item_model = encode_entity_kind(garant_core::document::EntityKind::Item);
    let history_model = encode_entity_kind(garant_core::document::EntityKind::History);

    let changes: usize = self
      .conn()
      .call(move |conn| {
        let tx = conn.transaction()?;
        // The history rows disappear with the item through the foreign-key
        // cascade, so their attachment rows must go while the histories can
        // still be resolved. Rolled back below if the item delete matches
        // nothing.
        tx.execute(
          "DELETE FROM document_attachments
           WHERE model = ?2
             AND entity_id IN (SELECT id FROM histories WHERE item_id = ?1)",
          rusqlite::params![id_param, history_model],
        )?;
        let changes = tx.execute(
          "DELETE FROM items WHERE id = ?1 AND owner_id = ?2",
          rusqlite::params![id_param, owner_id],
        )?;
        if changes > 0 {
          tx.execute(
            "DELETE FROM document_attachments WHERE entity_id = ?1 AND model = ?2",
            rusqlite::params![id_param, item_model],
          )?;
          tx.commit()?;
        }
        Ok(changes)
      })
      .await?;

    if changes == 0 {
      return Err(Error::SaveConflict { entity: "item", id: id.to_owned() });
    }
    Ok(())
  }
}
