//! Documents (scanned receipts and invoices) and the polymorphic attachment
//! join that ties them to owning entities.
//!
//! A document carries no owning-entity foreign key of its own. Which
//! entities use it is expressed only through [`DocumentAttachment`] rows;
//! a document with zero attachment rows is orphaned and eligible for
//! reclamation by the garbage collector.

use serde::{Deserialize, Serialize};

// ─── Discriminants ───────────────────────────────────────────────────────────

/// What kind of paperwork a document is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
  /// The default when a stored row predates the `type` column.
  #[default]
  Invoice,
  Ticket,
  Intervention,
  Other,
}

impl DocumentType {
  /// True for the document kinds that prove a purchase.
  pub fn is_proof_of_purchase(self) -> bool {
    matches!(self, Self::Invoice | Self::Ticket)
  }
}

/// Where the backing file lives. Only `local` files are reclaimed from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileSource {
  Local,
  Remote,
}

/// The kind of entity an attachment row points at: the `model` column of
/// the polymorphic join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
  Item,
  History,
}

// ─── Document ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
  /// `None` until first saved; the repository assigns an id before insert.
  pub id:          Option<String>,
  pub owner_id:    String,
  pub name:        String,
  pub filename:    String,
  pub mimetype:    String,
  pub doc_type:    DocumentType,
  pub file_path:   String,
  pub file_source: FileSource,
}

// ─── DocumentAttachment ──────────────────────────────────────────────────────

/// One row of the polymorphic many-to-many join between documents and owning
/// entities. The same document can be referenced by several `(kind, id)`
/// pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAttachment {
  pub id:          String,
  pub document_id: String,
  pub entity_id:   String,
  pub entity_kind: EntityKind,
}
