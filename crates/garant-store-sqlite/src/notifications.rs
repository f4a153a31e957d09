//! Notification repository.
//!
//! Notifications have their own lifecycle and are not owner-scoped.
//! Validation runs before any write: a notification without its device
//! scheduler id is rejected without touching the database.

use garant_core::{id::new_id, notification::Notification};

use crate::{encode::{encode_dt, RawNotification}, Error, Result, SqliteStore};

const NOTIFICATION_COLUMNS: &str =
  "id, title, body, data, device_notification_id, scheduled_time, is_read, created_at";

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawNotification> {
  Ok(RawNotification {
    id:                     row.get(0)?,
    title:                  row.get(1)?,
    body:                   row.get(2)?,
    data:                   row.get(3)?,
    device_notification_id: row.get(4)?,
    scheduled_time:         row.get(5)?,
    is_read:                row.get(6)?,
    created_at:             row.get(7)?,
  })
}

impl SqliteStore {
  /// All notifications, soonest scheduled first.
  pub async fn list_notifications(&self) -> Result<Vec<Notification>> {
    let raws: Vec<RawNotification> = self
      .conn()
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NOTIFICATION_COLUMNS} FROM notifications ORDER BY scheduled_time",
        ))?;
        let rows = stmt
          .query_map([], row_to_raw)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }

  /// Insert-or-update by presence of id; validated before any write.
  pub async fn save_notification(&self, mut notification: Notification) -> Result<Notification> {
    notification.validate().map_err(Error::Core)?;

    let data_json = serde_json::to_string(&notification.data)?;

    match notification.id.clone() {
      Some(id) => {
        let changes = {
          let n = notification.clone();
          let id = id.clone();
          let data_json = data_json.clone();
          self
            .conn()
            .call(move |conn| {
              Ok(conn.execute(
                "UPDATE notifications SET
                   title = ?1, body = ?2, data = ?3, device_notification_id = ?4,
                   scheduled_time = ?5, is_read = ?6
                 WHERE id = ?7",
                rusqlite::params![
                  n.title,
                  n.body,
                  data_json,
                  n.device_notification_id,
                  encode_dt(n.scheduled_time),
                  n.is_read,
                  id,
                ],
              )?)
            })
            .await?
        };
        if changes == 0 {
          return Err(Error::SaveConflict { entity: "notification", id });
        }
      }
      None => {
        notification.id = Some(new_id());
        let n = notification.clone();
        self
          .conn()
          .call(move |conn| {
            conn.execute(
              &format!(
                "INSERT INTO notifications ({NOTIFICATION_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
              ),
              rusqlite::params![
                n.id,
                n.title,
                n.body,
                data_json,
                n.device_notification_id,
                encode_dt(n.scheduled_time),
                n.is_read,
                encode_dt(n.created_at),
              ],
            )?;
            Ok(())
          })
          .await?;
      }
    }

    Ok(notification)
  }

  pub async fn mark_notification_read(&self, id: &str) -> Result<()> {
    let id_param = id.to_owned();
    let changes: usize = self
      .conn()
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET is_read = 1 WHERE id = ?1",
          rusqlite::params![id_param],
        )?)
      })
      .await?;

    if changes == 0 {
      return Err(Error::SaveConflict { entity: "notification", id: id.to_owned() });
    }
    Ok(())
  }

  pub async fn delete_notification(&self, id: &str) -> Result<()> {
    let id_param = id.to_owned();
    let changes: usize = self
      .conn()
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM notifications WHERE id = ?1",
          rusqlite::params![id_param],
        )?)
      })
      .await?;

    if changes == 0 {
      return Err(Error::SaveConflict { entity: "notification", id: id.to_owned() });
    }
    Ok(())
  }
}
