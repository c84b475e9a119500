//! WasteCare site backend.
//!
//! A standalone HTTP service owning the marketing site's form-submission
//! pipeline, session-aware route guard, cache-invalidation webhook and
//! newsletter unsubscribe endpoint.
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                SITE BACKEND                   │
//!     Page request       │  ┌─────────┐   ┌──────────┐   ┌───────────┐  │
//!     ───────────────────┼─▶│ session │──▶│  routes  │──▶│  content  │──┼──── CMS
//!                        │  │  guard  │   │          │   │  + cache  │  │
//!     Form submission    │  └────┬────┘   └────┬─────┘   └───────────┘  │
//!     ───────────────────┼───────┘            ▼                         │
//!                        │            ┌──────────────┐   ┌───────────┐  │
//!                        │            │    forms     │──▶│  storage  │──┼──── relational
//!                        │            │  dispatcher  │   └───────────┘  │     backend
//!                        │            │ validate →   │   ┌───────────┐  │
//!                        │            │ rate-limit → │──▶│  notify   │──┼──── email
//!                        │            │ spam-check   │   └───────────┘  │     provider
//!                        │            └──────────────┘                  │
//!                        │  config (TOML + hot reload) · tracing ·      │
//!                        │  metrics · request IDs                       │
//!                        └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wastecare_backend::config::watcher::ConfigWatcher;
use wastecare_backend::config::{load_config, AppConfig};
use wastecare_backend::http::{AppState, HttpServer};
use wastecare_backend::notifications::{HttpMailer, Mailer, NullMailer};
use wastecare_backend::observability::metrics;
use wastecare_backend::session::{HttpSessionProvider, NullSessionProvider, SessionProvider};
use wastecare_backend::storage::memory::MemoryStore;
use wastecare_backend::storage::rest::RestStore;
use wastecare_backend::storage::SubmissionStore;

#[derive(Debug, Parser)]
#[command(name = "wastecare-backend", about = "WasteCare site backend")]
struct Args {
    /// Path to the TOML config file. Defaults apply when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    // Initialize tracing subscriber
    let default_filter = format!(
        "wastecare_backend={},tower_http=info",
        config.observability.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("wastecare-backend v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limiting = config.rate_limit.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let upstream_timeout = Duration::from_secs(config.timeouts.upstream_secs);

    let store: Arc<dyn SubmissionStore> = if config.database.url.is_empty() {
        tracing::warn!("No database configured, using the in-process store");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(RestStore::new(
            &config.database.url,
            &config.database.api_key,
            upstream_timeout,
        )?)
    };

    let mailer: Arc<dyn Mailer> = if config.email.api_url.is_empty() {
        Arc::new(NullMailer)
    } else {
        Arc::new(HttpMailer::new(
            &config.email.api_url,
            &config.email.api_key,
            &config.email.from,
            upstream_timeout,
        )?)
    };

    let sessions: Arc<dyn SessionProvider> = if config.session.provider_url.is_empty() {
        tracing::warn!("No auth provider configured, all requests are anonymous");
        Arc::new(NullSessionProvider)
    } else {
        Arc::new(HttpSessionProvider::new(
            &config.session.provider_url,
            &config.session.provider_key,
            upstream_timeout,
        )?)
    };

    let bind_address = config.listener.bind_address.clone();
    let state = AppState::build(config, store, mailer, sessions)?;

    // Hot reload: recompile and swap on every valid file change.
    let _watcher = if let Some(path) = &args.config {
        let (watcher, mut updates) = ConfigWatcher::new(path);
        let guard = watcher.run()?;
        let reload_state = state.clone();
        tokio::spawn(async move {
            while let Some(new_config) = updates.recv().await {
                if let Err(e) = reload_state.apply(new_config) {
                    tracing::error!(error = %e, "Rejected reloaded config");
                }
            }
        });
        Some(guard)
    } else {
        None
    };

    let listener = TcpListener::bind(&bind_address).await?;
    let server = HttpServer::new(state);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
