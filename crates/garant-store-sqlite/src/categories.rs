//! Category repository.

use garant_core::{
  category::{Category, FALLBACK_CATEGORY_ID},
  id::new_id,
};

use crate::{encode::{encode_dt, RawCategory}, Error, Result, SqliteStore};

impl SqliteStore {
  pub async fn list_categories(&self, owner_id: &str) -> Result<Vec<Category>> {
    let owner_id = owner_id.to_owned();
    let raws: Vec<RawCategory> = self
      .conn()
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, owner_id, name, created_at, updated_at
           FROM categories WHERE owner_id = ?1 ORDER BY name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![owner_id], |row| {
            Ok(RawCategory {
              id:         row.get(0)?,
              owner_id:   row.get(1)?,
              name:       row.get(2)?,
              created_at: row.get(3)?,
              updated_at: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  /// Insert-or-update by presence of id.
  pub async fn save_category(&self, mut category: Category) -> Result<Category> {
    let now = chrono::Utc::now();
    category.updated_at = now;

    match category.id.clone() {
      Some(id) => {
        let name = category.name.clone();
        let owner_id = category.owner_id.clone();
        let updated_at = encode_dt(now);
        let id_param = id.clone();
        let changes: usize = self
          .conn()
          .call(move |conn| {
            Ok(conn.execute(
              "UPDATE categories SET name = ?1, updated_at = ?2
               WHERE id = ?3 AND owner_id = ?4",
              rusqlite::params![name, updated_at, id_param, owner_id],
            )?)
          })
          .await?;
        if changes == 0 {
          return Err(Error::SaveConflict { entity: "category", id });
        }
      }
      None => {
        let id = new_id();
        category.id = Some(id.clone());
        category.created_at = now;

        let name = category.name.clone();
        let owner_id = category.owner_id.clone();
        let at = encode_dt(now);
        self
          .conn()
          .call(move |conn| {
            conn.execute(
              "INSERT INTO categories (id, name, owner_id, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?4)",
              rusqlite::params![id, name, owner_id, at],
            )?;
            Ok(())
          })
          .await?;
      }
    }

    Ok(category)
  }

  /// Delete a category. The schema trigger reassigns this category's items
  /// to the fallback category, which itself can never be deleted.
  pub async fn delete_category(&self, id: &str, owner_id: &str) -> Result<()> {
    if id == FALLBACK_CATEGORY_ID {
      return Err(Error::Core(garant_core::Error::Validation(
        "the fallback category cannot be deleted".into(),
      )));
    }

    let id_param = id.to_owned();
    let owner_id = owner_id.to_owned();
    let changes: usize = self
      .conn()
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM categories WHERE id = ?1 AND owner_id = ?2",
          rusqlite::params![id_param, owner_id],
        )?)
      })
      .await?;

    if changes == 0 {
      return Err(Error::SaveConflict { entity: "category", id: id.to_owned() });
    }
    Ok(())
  }
}
