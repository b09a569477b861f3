// SPDX-License-Identifier: MIT

//! Standalone coordinator binary for containers holding only primitive
//! values. Containers with custom `Shareable` types should instead link
//! `share-coordinator` as a library and call `share_coordinator::run`
//! from their own `main`, passing a codec with those types registered.

use std::sync::Arc;

use share_adapters::BincodeCodec;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let codec: Arc<dyn share_adapters::ObjectCodec> = Arc::new(BincodeCodec::new());
    if let Err(e) = share_coordinator::run(codec).await {
        tracing::error!("coordinator exited with error: {}", e);
        std::process::exit(1);
    }
}
