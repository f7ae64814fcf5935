//! File server for the generated dashboard.
//! Run with: cargo run --bin coltviz-serve

use anyhow::Result;
use coltviz::config::ServerConfig;
use coltviz::server;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = ServerConfig::from_env();
    server::serve(&cfg).await
}
