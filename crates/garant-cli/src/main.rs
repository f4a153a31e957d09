//! `garant`, the maintenance binary for the Garant warranty store.
//!
//! Opening the store runs every pending schema migration, so `migrate` is
//! just "open and report". The `--reset` flag wipes the database file first
//! (destructive, development/testing only).

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use garant_store_sqlite::{SqliteStore, StoreOptions};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Garant warranty store maintenance")]
struct Cli {
  /// Path to the SQLite database file.
  #[arg(short, long, default_value = "garant.db")]
  db: PathBuf,

  /// Delete the database before opening so migrations re-run from zero.
  /// Destructive; development and testing only.
  #[arg(long)]
  reset: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Run pending migrations and print the resulting schema version.
  Migrate,
  /// Print schema version, owner code, and entity counts.
  Status,
  /// Reclaim orphaned documents and their local backing files.
  Gc,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let store = SqliteStore::open_with(&cli.db, StoreOptions { reset_on_open: cli.reset })
    .await
    .with_context(|| format!("failed to open store at {}", cli.db.display()))?;

  match cli.command {
    Command::Migrate => {
      let version = store.schema_version().await?;
      println!("schema version {version}");
    }
    Command::Status => {
      let version = store.schema_version().await?;
      let owner = store.owner().await?;
      let items = store
        .list_items(&owner.id, &garant_store_sqlite::ItemFilter {
          include_archived: true,
          ..Default::default()
        })
        .await?;
      let documents = store.list_documents(&owner.id).await?;

      println!("schema version {version}");
      println!("owner {} ({})", owner.unikode, owner.id);
      println!("{} items, {} documents", items.len(), documents.len());
    }
    Command::Gc => {
      let owner = store.owner().await?;
      let removed = store.ghostbuster(&owner.id).await?;
      println!("removed {removed} orphaned documents");
    }
  }

  Ok(())
}
