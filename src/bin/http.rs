#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use practice_log::{AppConfig, Journal, http_api, logging};
    use tracing::info;

    let config = AppConfig::from_env()?;
    logging::init(&config.log_level);

    let mut state = http_api::AppState::new(Journal::new());
    #[cfg(feature = "sqlite")]
    {
        use practice_log::{JournalStore, SqliteJournalStore};
        use std::sync::Arc;

        if let Some(path) = &config.database_path {
            let store = SqliteJournalStore::new(path)?;
            let journal = store.load_journal()?.unwrap_or_default();
            info!(path = %path.display(), "journal opened");
            state = http_api::AppState::new(journal).with_store(Arc::new(store));
        }
    }
    #[cfg(not(feature = "sqlite"))]
    {
        if config.database_path.is_some() {
            tracing::warn!("database path ignored: built without the `sqlite` feature");
        }
    }

    info!("practice-log {} starting", env!("CARGO_PKG_VERSION"));
    http_api::serve(config.http_addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
