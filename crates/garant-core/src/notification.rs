//! Notification: a scheduled warranty reminder.
//!
//! Notifications have an independent lifecycle and are not owner-scoped like
//! the other entities; the device notification id is the handle into the
//! platform scheduler and is required before persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  /// `None` until first saved.
  pub id:                     Option<String>,
  pub title:                  String,
  pub body:                   String,
  /// Opaque structured payload handed back to the app when the notification
  /// fires.
  pub data:                   serde_json::Value,
  /// The platform scheduler's identifier for this notification.
  pub device_notification_id: String,
  pub scheduled_time:         DateTime<Utc>,
  pub is_read:                bool,
  pub created_at:             DateTime<Utc>,
}

impl Notification {
  pub fn new(
    title: impl Into<String>,
    body: impl Into<String>,
    device_notification_id: impl Into<String>,
    scheduled_time: DateTime<Utc>,
  ) -> Self {
    Self {
      id:                     None,
      title:                  title.into(),
      body:                   body.into(),
      data:                   serde_json::Value::Object(Default::default()),
      device_notification_id: device_notification_id.into(),
      scheduled_time,
      is_read:                false,
      created_at:             Utc::now(),
    }
  }

  /// Check the invariants required for persistence. Called by the
  /// repository before any write is attempted.
  pub fn validate(&self) -> Result<()> {
    if self.device_notification_id.trim().is_empty() {
      return Err(Error::Validation(
        "a notification requires a device notification id before it can be stored".into(),
      ));
    }
    Ok(())
  }
}
