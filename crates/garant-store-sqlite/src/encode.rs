//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings; enum discriminants as
//! short lowercase strings (the attachment `model` column keeps the
//! capitalised names the original data used); the notification payload as
//! compact JSON. Decoding is total over well-formed rows: absent optional
//! columns become documented domain defaults, never a crash.

use chrono::{DateTime, Utc};
use garant_core::{
  category::Category,
  document::{Document, DocumentAttachment, DocumentType, EntityKind, FileSource},
  history::{History, HistoryLabel},
  item::Item,
  notification::Notification,
  owner::Owner,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_dt_or_now(s: Option<&str>) -> Result<DateTime<Utc>> {
  s.map(decode_dt).transpose().map(|dt| dt.unwrap_or_else(Utc::now))
}

// ─── DocumentType ────────────────────────────────────────────────────────────

pub fn encode_document_type(t: DocumentType) -> &'static str {
  match t {
    DocumentType::Invoice => "invoice",
    DocumentType::Ticket => "ticket",
    DocumentType::Intervention => "intervention",
    DocumentType::Other => "other",
  }
}

/// Rows written before the `type` column existed decode to the default.
pub fn decode_document_type(s: Option<&str>) -> Result<DocumentType> {
  match s {
    None => Ok(DocumentType::default()),
    Some("invoice") => Ok(DocumentType::Invoice),
    Some("ticket") => Ok(DocumentType::Ticket),
    Some("intervention") => Ok(DocumentType::Intervention),
    Some("other") => Ok(DocumentType::Other),
    Some(other) => Err(unknown("document type", other)),
  }
}

// ─── FileSource ──────────────────────────────────────────────────────────────

pub fn encode_file_source(s: FileSource) -> &'static str {
  match s {
    FileSource::Local => "local",
    FileSource::Remote => "remote",
  }
}

pub fn decode_file_source(s: &str) -> Result<FileSource> {
  match s {
    "local" => Ok(FileSource::Local),
    "remote" => Ok(FileSource::Remote),
    other => Err(unknown("file source", other)),
  }
}

// ─── EntityKind ──────────────────────────────────────────────────────────────

pub fn encode_entity_kind(k: EntityKind) -> &'static str {
  match k {
    EntityKind::Item => "Item",
    EntityKind::History => "History",
  }
}

pub fn decode_entity_kind(s: &str) -> Result<EntityKind> {
  match s {
    "Item" => Ok(EntityKind::Item),
    "History" => Ok(EntityKind::History),
    other => Err(unknown("entity kind", other)),
  }
}

// ─── HistoryLabel ────────────────────────────────────────────────────────────

pub fn encode_history_label(l: HistoryLabel) -> &'static str {
  match l {
    HistoryLabel::Repair => "repair",
    HistoryLabel::Maintenance => "maintenance",
    HistoryLabel::Update => "update",
    HistoryLabel::Replacement => "replacement",
    HistoryLabel::Inspection => "inspection",
  }
}

pub fn decode_history_label(s: &str) -> Result<HistoryLabel> {
  match s {
    "repair" => Ok(HistoryLabel::Repair),
    "maintenance" => Ok(HistoryLabel::Maintenance),
    "update" => Ok(HistoryLabel::Update),
    "replacement" => Ok(HistoryLabel::Replacement),
    "inspection" => Ok(HistoryLabel::Inspection),
    other => Err(unknown("history label", other)),
  }
}

fn unknown(field: &'static str, value: &str) -> Error {
  Error::Core(garant_core::Error::UnknownDiscriminant {
    field,
    value: value.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `owners` row.
pub struct RawOwner {
  pub id:         String,
  pub unikode:    String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawOwner {
  pub fn into_owner(self) -> Result<Owner> {
    Ok(Owner {
      id:         self.id,
      unikode:    self.unikode,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `categories` row.
pub struct RawCategory {
  pub id:         String,
  pub owner_id:   String,
  pub name:       String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawCategory {
  pub fn into_category(self) -> Result<Category> {
    Ok(Category {
      id:         Some(self.id),
      owner_id:   self.owner_id,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from an `items` row.
pub struct RawItem {
  pub id:                String,
  pub owner_id:          String,
  pub label:             String,
  pub brand:             Option<String>,
  pub category_id:       String,
  pub picture:           Option<String>,
  pub purchase_date:     Option<String>,
  pub warranty_duration: Option<String>,
  pub memo:              Option<String>,
  pub is_archived:       bool,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawItem {
  pub fn into_item(self) -> Result<Item> {
    Ok(Item {
      id:                Some(self.id),
      owner_id:          self.owner_id,
      label:             self.label,
      brand:             self.brand,
      category_id:       self.category_id,
      picture:           self.picture,
      // Legacy rows may lack a purchase date; mirror the original app's
      // "treat as bought today" fallback rather than failing the read.
      purchase_date:     decode_dt_or_now(self.purchase_date.as_deref())?,
      warranty_duration: self.warranty_duration.unwrap_or_default(),
      memo:              self.memo,
      is_archived:       self.is_archived,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `documents` row.
pub struct RawDocument {
  pub id:          String,
  pub owner_id:    String,
  pub name:        String,
  pub filename:    String,
  pub mimetype:    String,
  pub doc_type:    Option<String>,
  pub file_path:   String,
  pub file_source: String,
}

impl RawDocument {
  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      id:          Some(self.id),
      owner_id:    self.owner_id,
      name:        self.name,
      filename:    self.filename,
      mimetype:    self.mimetype,
      doc_type:    decode_document_type(self.doc_type.as_deref())?,
      file_path:   self.file_path,
      file_source: decode_file_source(&self.file_source)?,
    })
  }
}

/// Raw strings read directly from a `document_attachments` row.
pub struct RawAttachment {
  pub id:          String,
  pub document_id: String,
  pub entity_id:   String,
  pub model:       String,
}

impl RawAttachment {
  pub fn into_attachment(self) -> Result<DocumentAttachment> {
    Ok(DocumentAttachment {
      id:          self.id,
      document_id: self.document_id,
      entity_id:   self.entity_id,
      entity_kind: decode_entity_kind(&self.model)?,
    })
  }
}

/// Raw strings read directly from a `histories` row.
pub struct RawHistory {
  pub id:                String,
  pub item_id:           String,
  pub label:             String,
  pub intervention_date: String,
  pub description:       Option<String>,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawHistory {
  pub fn into_history(self) -> Result<History> {
    Ok(History {
      id:                Some(self.id),
      item_id:           self.item_id,
      label:             decode_history_label(&self.label)?,
      intervention_date: decode_dt(&self.intervention_date)?,
      description:       self.description,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `notifications` row.
pub struct RawNotification {
  pub id:                     String,
  pub title:                  String,
  pub body:                   String,
  pub data:                   Option<String>,
  pub device_notification_id: String,
  pub scheduled_time:         String,
  pub is_read:                bool,
  pub created_at:             String,
}

impl RawNotification {
  pub fn into_notification(self) -> Result<Notification> {
    let data = match self.data.as_deref() {
      Some(raw) => serde_json::from_str(raw)?,
      None => serde_json::Value::Object(Default::default()),
    };
    Ok(Notification {
      id: Some(self.id),
      title: self.title,
      body: self.body,
      data,
      device_notification_id: self.device_notification_id,
      scheduled_time: decode_dt(&self.scheduled_time)?,
      is_read: self.is_read,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
