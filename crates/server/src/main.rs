use std::error::Error;
use std::env;

use micro_fs::Server;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Listening address, on every interface.
const ADDRESS: &str = "0.0.0.0:8000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let root = env::current_dir()?;
    Server::builder().root(root).bind(ADDRESS).build()?.start().await?;
    Ok(())
}
