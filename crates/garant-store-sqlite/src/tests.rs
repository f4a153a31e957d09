//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::Utc;
use garant_core::{
  category::{Category, FALLBACK_CATEGORY_ID},
  document::{Document, DocumentType, EntityKind, FileSource},
  history::{History, HistoryLabel},
  id::new_id,
  item::Item,
  notification::Notification,
};

use crate::{catalog, Error, ItemFilter, Migration, MigrationRunner, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

async fn owner_id(s: &SqliteStore) -> String {
  s.owner().await.expect("owner row").id
}

fn document(owner_id: &str, doc_type: DocumentType, file_path: &str) -> Document {
  Document {
    id:          None,
    owner_id:    owner_id.to_owned(),
    name:        "Facture lave-linge".into(),
    filename:    "facture.pdf".into(),
    mimetype:    "application/pdf".into(),
    doc_type,
    file_path:   file_path.to_owned(),
    file_source: FileSource::Local,
  }
}

fn item(owner_id: &str) -> Item {
  let now = Utc::now();
  Item {
    id:                None,
    owner_id:          owner_id.to_owned(),
    label:             "Lave-linge".into(),
    brand:             Some("Bosch".into()),
    category_id:       "default-category-1".into(),
    picture:           None,
    purchase_date:     now,
    warranty_duration: "2y".into(),
    memo:              None,
    is_archived:       false,
    created_at:        now,
    updated_at:        now,
  }
}

// ─── Migrations ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_install_applies_full_catalog() {
  let s = store().await;

  assert_eq!(s.schema_version().await.unwrap(), 6);

  let owner = s.owner().await.unwrap();
  assert!(owner.unikode.starts_with("GE-"));

  let categories = s.list_categories(&owner.id).await.unwrap();
  assert_eq!(categories.len(), 7);
  assert!(
    categories
      .iter()
      .any(|c| c.id.as_deref() == Some(FALLBACK_CATEGORY_ID))
  );
}

#[tokio::test]
async fn reopening_does_not_reapply_migrations() {
  let s = store().await;

  // Same connection, full catalog again: everything must be skipped.
  let version = MigrationRunner::new(catalog::all()).run(s.conn()).await.unwrap();
  assert_eq!(version, 6);

  // Still exactly one owner and seven categories.
  let owner = s.owner().await.unwrap();
  assert_eq!(s.list_categories(&owner.id).await.unwrap().len(), 7);
}

fn create_probe_table(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.execute_batch("CREATE TABLE IF NOT EXISTS probe (n INTEGER NOT NULL);")
}

fn insert_probe_row(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.execute("INSERT INTO probe (n) VALUES (1)", [])?;
  Ok(())
}

fn broken_sql(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.execute_batch("THIS IS NOT SQL;")
}

#[tokio::test]
async fn runner_sorts_catalog_before_executing() {
  let conn = tokio_rusqlite::Connection::open_in_memory().await.unwrap();

  // Declared out of order: the insert at v2 only works if the create at v1
  // ran first.
  let runner = MigrationRunner::new(vec![
    Migration { name: "fill_probe", target_version: 2, apply: insert_probe_row },
    Migration { name: "create_probe", target_version: 1, apply: create_probe_table },
  ]);
  let version = runner.run(&conn).await.unwrap();
  assert_eq!(version, 2);

  let rows: i64 = conn
    .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM probe", [], |r| r.get(0))?))
    .await
    .unwrap();
  assert_eq!(rows, 1);
}

#[tokio::test]
async fn second_run_is_a_no_op() {
  let conn = tokio_rusqlite::Connection::open_in_memory().await.unwrap();
  let catalog = vec![
    Migration { name: "create_probe", target_version: 1, apply: create_probe_table },
    Migration { name: "fill_probe", target_version: 2, apply: insert_probe_row },
  ];

  MigrationRunner::new(catalog.clone()).run(&conn).await.unwrap();
  MigrationRunner::new(catalog).run(&conn).await.unwrap();

  // A re-run must not re-invoke `apply`, so exactly one row.
  let rows: i64 = conn
    .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM probe", [], |r| r.get(0))?))
    .await
    .unwrap();
  assert_eq!(rows, 1);
}

#[tokio::test]
async fn failing_migration_aborts_the_run() {
  let conn = tokio_rusqlite::Connection::open_in_memory().await.unwrap();
  let runner = MigrationRunner::new(vec![
    Migration { name: "create_probe", target_version: 1, apply: create_probe_table },
    Migration { name: "explode", target_version: 2, apply: broken_sql },
    Migration { name: "fill_probe", target_version: 3, apply: insert_probe_row },
  ]);

  let err = runner.run(&conn).await.unwrap_err();
  assert!(matches!(err, Error::Migration { name: "explode", .. }));

  // The ledger stops at the last success; the later migration never ran.
  let (version, rows) = conn
    .call(|conn| {
      let version = crate::VersionLedger::current_version(conn)?;
      let rows: i64 = conn.query_row("SELECT COUNT(*) FROM probe", [], |r| r.get(0))?;
      Ok((version, rows))
    })
    .await
    .unwrap();
  assert_eq!(version, 1);
  assert_eq!(rows, 0);
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn save_document_assigns_id_and_roundtrips() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let saved = s
    .save_document(document(&owner, DocumentType::Ticket, "/tmp/a.pdf"))
    .await
    .unwrap();
  let id = saved.id.clone().expect("assigned id");

  let fetched = s.get_document(&id, &owner).await.unwrap().expect("document");
  assert_eq!(fetched.doc_type, DocumentType::Ticket);
  assert_eq!(fetched.file_source, FileSource::Local);
  assert_eq!(fetched.file_path, "/tmp/a.pdf");
  assert_eq!(fetched.name, saved.name);
  assert_eq!(fetched.filename, saved.filename);
  assert_eq!(fetched.mimetype, saved.mimetype);
}

#[tokio::test]
async fn updating_unknown_document_is_a_conflict() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let mut doc = document(&owner, DocumentType::Invoice, "/tmp/b.pdf");
  doc.id = Some(new_id()); // id present but no such row

  let err = s.save_document(doc).await.unwrap_err();
  assert!(matches!(err, Error::SaveConflict { entity: "document", .. }));
}

#[tokio::test]
async fn repositories_never_cross_owner_boundaries() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let doc = s
    .save_document(document(&owner, DocumentType::Invoice, "/tmp/c.pdf"))
    .await
    .unwrap();
  let id = doc.id.unwrap();

  // Reads under another owner see nothing; writes conflict.
  assert!(s.get_document(&id, "someone-else").await.unwrap().is_none());

  let mut foreign = document("someone-else", DocumentType::Invoice, "/tmp/c.pdf");
  foreign.id = Some(id.clone());
  let err = s.save_document(foreign).await.unwrap_err();
  assert!(matches!(err, Error::SaveConflict { .. }));

  // The row is still there for its real owner.
  assert!(s.get_document(&id, &owner).await.unwrap().is_some());
}

// ─── Attachment index ────────────────────────────────────────────────────────

#[tokio::test]
async fn attach_then_detach_removes_from_listing() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let item = s.save_item(item(&owner)).await.unwrap();
  let item_id = item.id.unwrap();
  let doc = s
    .save_document(document(&owner, DocumentType::Ticket, "/tmp/d.pdf"))
    .await
    .unwrap();
  let doc_id = doc.id.unwrap();

  s.attach_document(&doc_id, &item_id, EntityKind::Item).await.unwrap();
  let attached = s.documents_for(&item_id, EntityKind::Item).await.unwrap();
  assert_eq!(attached.len(), 1);
  assert_eq!(attached[0].id.as_deref(), Some(doc_id.as_str()));

  let joins = s.attachments_for_document(&doc_id).await.unwrap();
  assert_eq!(joins.len(), 1);
  assert_eq!(joins[0].entity_id, item_id);
  assert_eq!(joins[0].entity_kind, EntityKind::Item);

  s.detach_document(&doc_id, &item_id, EntityKind::Item).await.unwrap();
  assert!(s.documents_for(&item_id, EntityKind::Item).await.unwrap().is_empty());
  assert!(s.attachments_for_document(&doc_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn detaching_an_unattached_pair_is_a_conflict() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let doc = s
    .save_document(document(&owner, DocumentType::Other, "/tmp/e.pdf"))
    .await
    .unwrap();

  let err = s
    .detach_document(&doc.id.unwrap(), "no-such-item", EntityKind::Item)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AttachmentConflict { .. }));
}

#[tokio::test]
async fn attachments_are_scoped_by_entity_kind() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let doc = s
    .save_document(document(&owner, DocumentType::Intervention, "/tmp/f.pdf"))
    .await
    .unwrap();
  let doc_id = doc.id.unwrap();

  s.attach_document(&doc_id, "entity-1", EntityKind::History).await.unwrap();

  assert!(s.documents_for("entity-1", EntityKind::Item).await.unwrap().is_empty());
  assert_eq!(s.documents_for("entity-1", EntityKind::History).await.unwrap().len(), 1);
}

// ─── Ghostbuster ─────────────────────────────────────────────────────────────

/// A real file on disk so the collector has something to reclaim.
fn scratch_file() -> std::path::PathBuf {
  let path = std::env::temp_dir().join(format!("garant-test-{}.pdf", new_id()));
  std::fs::write(&path, b"%PDF-1.4").expect("scratch file");
  path
}

#[tokio::test]
async fn ghostbuster_reclaims_orphans_exactly_once() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let path = scratch_file();
  s.save_document(document(&owner, DocumentType::Invoice, path.to_str().unwrap()))
    .await
    .unwrap();

  assert_eq!(s.ghostbuster(&owner).await.unwrap(), 1);
  assert!(!path.exists());
  assert!(s.list_documents(&owner).await.unwrap().is_empty());

  // Idempotent: nothing left to reclaim.
  assert_eq!(s.ghostbuster(&owner).await.unwrap(), 0);
}

#[tokio::test]
async fn ghostbuster_never_touches_attached_documents() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let doc = s
    .save_document(document(&owner, DocumentType::Ticket, "/tmp/g.pdf"))
    .await
    .unwrap();
  let doc_id = doc.id.unwrap();

  // Attach to an entity id that does not exist anywhere: even a dangling
  // attachment row protects the document.
  s.attach_document(&doc_id, "long-gone-entity", EntityKind::Item).await.unwrap();

  for _ in 0..3 {
    assert_eq!(s.ghostbuster(&owner).await.unwrap(), 0);
  }
  assert!(s.get_document(&doc_id, &owner).await.unwrap().is_some());
}

#[tokio::test]
async fn ghostbuster_survives_a_missing_backing_file() {
  let s = store().await;
  let owner = owner_id(&s).await;

  // Local file that was never written: deletion fails, row goes anyway.
  s.save_document(document(&owner, DocumentType::Invoice, "/tmp/never-existed.pdf"))
    .await
    .unwrap();

  assert_eq!(s.ghostbuster(&owner).await.unwrap(), 1);
  assert!(s.list_documents(&owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_an_item_orphans_its_documents() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let item = s.save_item(item(&owner)).await.unwrap();
  let item_id = item.id.unwrap();
  let doc = s
    .save_document(document(&owner, DocumentType::Ticket, "/tmp/h.pdf"))
    .await
    .unwrap();
  let doc_id = doc.id.unwrap();
  s.attach_document(&doc_id, &item_id, EntityKind::Item).await.unwrap();

  // No explicit detach: item deletion cascade-detaches.
  s.delete_item(&item_id, &owner).await.unwrap();

  assert_eq!(s.ghostbuster(&owner).await.unwrap(), 1);
  assert!(s.get_document(&doc_id, &owner).await.unwrap().is_none());
}

// ─── Items and categories ────────────────────────────────────────────────────

#[tokio::test]
async fn save_item_roundtrip_and_filters() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let saved = s.save_item(item(&owner)).await.unwrap();
  let id = saved.id.clone().unwrap();

  let fetched = s.get_item(&id, &owner).await.unwrap().expect("item");
  assert_eq!(fetched.label, "Lave-linge");
  assert_eq!(fetched.brand.as_deref(), Some("Bosch"));
  assert_eq!(fetched.purchase_date, saved.purchase_date);

  // Archive it; the default listing hides it.
  let mut archived = fetched;
  archived.is_archived = true;
  s.save_item(archived).await.unwrap();

  let visible = s.list_items(&owner, &ItemFilter::default()).await.unwrap();
  assert!(visible.is_empty());

  let all = s
    .list_items(&owner, &ItemFilter { include_archived: true, ..Default::default() })
    .await
    .unwrap();
  assert_eq!(all.len(), 1);

  let other_category = s
    .list_items(
      &owner,
      &ItemFilter {
        category_id:      Some("default-category-2".into()),
        include_archived: true,
      },
    )
    .await
    .unwrap();
  assert!(other_category.is_empty());
}

#[tokio::test]
async fn save_category_assigns_a_real_id() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let saved = s.save_category(Category::new(&owner, "Photo")).await.unwrap();
  let id = saved.id.clone().expect("assigned id");
  assert!(!id.is_empty());

  // The stored row carries the very id handed back to the caller.
  let listed = s.list_categories(&owner).await.unwrap();
  let found = listed.iter().find(|c| c.name == "Photo").expect("listed");
  assert_eq!(found.id.as_deref(), Some(id.as_str()));
}

#[tokio::test]
async fn deleting_a_category_reassigns_items_to_the_fallback() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let category = s.save_category(Category::new(&owner, "Photo")).await.unwrap();
  let category_id = category.id.clone().unwrap();

  let mut it = item(&owner);
  it.category_id = category_id.clone();
  let it = s.save_item(it).await.unwrap();
  let item_id = it.id.unwrap();

  s.delete_category(&category_id, &owner).await.unwrap();

  let fetched = s.get_item(&item_id, &owner).await.unwrap().expect("item survives");
  assert_eq!(fetched.category_id, FALLBACK_CATEGORY_ID);
}

#[tokio::test]
async fn the_fallback_category_cannot_be_deleted() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let err = s.delete_category(FALLBACK_CATEGORY_ID, &owner).await.unwrap_err();
  assert!(matches!(err, Error::Core(garant_core::Error::Validation(_))));
}

// ─── Histories ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn histories_follow_their_item() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let it = s.save_item(item(&owner)).await.unwrap();
  let item_id = it.id.unwrap();

  let mut history = History::new(&item_id, HistoryLabel::Repair, Utc::now());
  history.description = Some("Remplacement du tambour".into());
  let history = s.save_history(history).await.unwrap();
  assert!(history.id.is_some());

  let listed = s.list_histories(&item_id, &owner).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].label, HistoryLabel::Repair);
  assert_eq!(listed[0].description.as_deref(), Some("Remplacement du tambour"));

  // Deleting the item cascades to its histories.
  s.delete_item(&item_id, &owner).await.unwrap();
  assert!(s.list_histories(&item_id, &owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn histories_are_scoped_by_owner() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let it = s.save_item(item(&owner)).await.unwrap();
  let item_id = it.id.unwrap();
  let history = s
    .save_history(History::new(&item_id, HistoryLabel::Maintenance, Utc::now()))
    .await
    .unwrap();
  let history_id = history.id.unwrap();

  // Reads under another owner see nothing; deletes conflict.
  assert!(s.list_histories(&item_id, "someone-else").await.unwrap().is_empty());
  let err = s
    .delete_history(&history_id, &item_id, "someone-else")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SaveConflict { entity: "history", .. }));

  // The row is still there for its real owner.
  assert_eq!(s.list_histories(&item_id, &owner).await.unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_a_history_detaches_its_documents() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let it = s.save_item(item(&owner)).await.unwrap();
  let item_id = it.id.unwrap();
  let history = s
    .save_history(History::new(&item_id, HistoryLabel::Repair, Utc::now()))
    .await
    .unwrap();
  let history_id = history.id.unwrap();

  let doc = s
    .save_document(document(&owner, DocumentType::Intervention, "/tmp/i.pdf"))
    .await
    .unwrap();
  let doc_id = doc.id.unwrap();
  s.attach_document(&doc_id, &history_id, EntityKind::History).await.unwrap();

  // No explicit detach: history deletion cascade-detaches, so the document
  // becomes a reclaimable orphan instead of being shielded forever.
  s.delete_history(&history_id, &item_id, &owner).await.unwrap();
  assert!(s.attachments_for_document(&doc_id).await.unwrap().is_empty());

  assert_eq!(s.ghostbuster(&owner).await.unwrap(), 1);
  assert!(s.get_document(&doc_id, &owner).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_an_item_detaches_its_histories_documents() {
  let s = store().await;
  let owner = owner_id(&s).await;

  let it = s.save_item(item(&owner)).await.unwrap();
  let item_id = it.id.unwrap();
  let history = s
    .save_history(History::new(&item_id, HistoryLabel::Inspection, Utc::now()))
    .await
    .unwrap();
  let history_id = history.id.unwrap();

  let doc = s
    .save_document(document(&owner, DocumentType::Intervention, "/tmp/j.pdf"))
    .await
    .unwrap();
  let doc_id = doc.id.unwrap();
  s.attach_document(&doc_id, &history_id, EntityKind::History).await.unwrap();

  // The history goes with the item via cascade; its attachment rows must go
  // too or the document would never be reclaimed.
  s.delete_item(&item_id, &owner).await.unwrap();
  assert!(s.attachments_for_document(&doc_id).await.unwrap().is_empty());
  assert_eq!(s.ghostbuster(&owner).await.unwrap(), 1);
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn notification_roundtrip_and_read_flag() {
  let s = store().await;

  let mut n = Notification::new("Garantie", "Expire dans 30 jours", "device-42", Utc::now());
  n.data = serde_json::json!({ "itemId": "item-1" });

  let saved = s.save_notification(n).await.unwrap();
  let id = saved.id.clone().unwrap();

  let listed = s.list_notifications().await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].device_notification_id, "device-42");
  assert_eq!(listed[0].data["itemId"], "item-1");
  assert!(!listed[0].is_read);

  s.mark_notification_read(&id).await.unwrap();
  assert!(s.list_notifications().await.unwrap()[0].is_read);
}

#[tokio::test]
async fn invalid_notification_is_rejected_before_any_write() {
  let s = store().await;

  let mut n = Notification::new("Garantie", "corps", "", Utc::now());
  n.device_notification_id = String::new();

  let err = s.save_notification(n).await.unwrap_err();
  assert!(matches!(err, Error::Core(garant_core::Error::Validation(_))));
  assert!(s.list_notifications().await.unwrap().is_empty());
}

// ─── Onboardings ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn onboarding_completion_flow() {
  let s = store().await;

  assert!(!s.is_onboarding_completed("initial_onboarding").await.unwrap());
  s.complete_onboarding("initial_onboarding").await.unwrap();
  assert!(s.is_onboarding_completed("initial_onboarding").await.unwrap());

  let err = s.complete_onboarding("no-such-onboarding").await.unwrap_err();
  assert!(matches!(err, Error::SaveConflict { entity: "onboarding", .. }));
}
