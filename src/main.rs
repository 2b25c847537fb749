mod board;
mod config;
mod model;
mod projector;
mod reconciler;
mod store;
mod sync;
mod util;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use board::github::GitHubBoardClient;
use store::postgrest::PostgrestStore;
use sync::SyncRunner;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Incomplete config is fatal: nothing is fetched without credentials.
    let config = config::load_config()?;

    let fetcher = GitHubBoardClient::new(config.github.token.clone(), config.github.org.clone());
    let store = PostgrestStore::new(&config.store);

    SyncRunner::new(config, Box::new(fetcher), Box::new(store))
        .run()
        .await
}
