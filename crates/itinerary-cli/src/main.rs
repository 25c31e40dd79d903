// ── itinerary-cli ────────────────────────────────────────────────────────
// Direct store inspection and maintenance, grounded on the teacher's
// `openpawz-cli` shape (clap derive subcommands, `env_logger` init, thin
// command bodies that open the store and print JSON).

use clap::{Parser, Subcommand};
use itinerary_engine::{ChangeEngine, EngineConfig, EngineResult, EventBus, Store};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "itinerary", about = "Inspect and operate on the itinerary store", version)]
struct Cli {
    /// Path to the SQLite database. Defaults to $ITINERARY_DB_PATH or itinerary.db.
    #[arg(long, env = "ITINERARY_DB_PATH")]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every itinerary id in the store.
    List,
    /// Print the full current document for an itinerary.
    Show { itinerary_id: String },
    /// List the revision history for an itinerary.
    Revisions { itinerary_id: String },
    /// Roll an itinerary back to an earlier version, written forward as a
    /// new version (never rewrites history).
    Rollback { itinerary_id: String, version: u64 },
    /// Delete an itinerary and its revision history.
    Delete { itinerary_id: String },
}

#[tokio::main]
async fn main() -> EngineResult<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = EngineConfig::from_env();
    let db_path = cli.db.unwrap_or(config.database_path.clone());
    let store = Arc::new(Store::open(&db_path)?);

    match cli.command {
        Command::List => {
            for id in store.list_ids()? {
                println!("{id}");
            }
        }
        Command::Show { itinerary_id } => match store.get(&itinerary_id)? {
            Some(itinerary) => println!("{}", serde_json::to_string_pretty(&itinerary)?),
            None => eprintln!("no such itinerary: {itinerary_id}"),
        },
        Command::Revisions { itinerary_id } => {
            for revision in store.list_revisions(&itinerary_id)? {
                println!(
                    "v{:<4} {:<24} {:<10} {}",
                    revision.version,
                    revision.description,
                    format!("{:?}", revision.author),
                    revision.timestamp
                );
            }
        }
        Command::Rollback { itinerary_id, version } => {
            let bus = Arc::new(EventBus::new());
            let engine = ChangeEngine::new(store.clone(), bus);
            let result = engine.undo(&itinerary_id, Some(version)).await?;
            println!("rolled back to version {version}, now at version {}", result.to_version);
        }
        Command::Delete { itinerary_id } => {
            store.delete(&itinerary_id)?;
            println!("deleted {itinerary_id}");
        }
    }

    Ok(())
}
