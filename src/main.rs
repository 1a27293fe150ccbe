//! Lectern - blog backend with role-gated sessions

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lectern::{
    config::Args,
    db::{MongoClient, MongoStore},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("lectern={},info", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Lectern v{}", env!("CARGO_PKG_VERSION"));
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Database: {}", args.mongodb_db);
    info!("Session lifetime: {}s", args.jwt_expiry_seconds);

    let jwt = args.jwt_validator()?;

    let connected = MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await;
    let (state, mongo) = match connected {
        Ok(client) => {
            let store = MongoStore::new(&client).await?;
            (AppState::with_mongo(args, jwt, store), Some(client))
        }
        Err(e) if args.dev_mode => {
            warn!("MongoDB unavailable ({}), using in-memory store", e);
            (AppState::in_memory(args, jwt), None)
        }
        Err(e) => {
            error!("MongoDB is required in production mode: {}", e);
            return Err(e.into());
        }
    };

    server::run(Arc::new(state)).await?;

    if let Some(client) = mongo {
        info!("Closing MongoDB connections");
        client.shutdown().await;
    }

    info!("Lectern stopped");
    Ok(())
}
