//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (timeout, request ID, tracing, body limit, guard)
//! - Hold the shared application state, including hot-swappable config
//! - Serve with graceful shutdown

use arc_swap::ArcSwap;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::schema::AppConfig;
use crate::content::ContentService;
use crate::forms::dispatcher::FormPipeline;
use crate::notifications::Mailer;
use crate::routes;
use crate::security::rate_limit::{MemoryRateStore, RateLimiter};
use crate::security::spam::SpamFilter;
use crate::session::guard::{session_guard, RouteMatcher};
use crate::session::SessionProvider;
use crate::storage::SubmissionStore;

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<AppConfig>>,
    pub pipeline: Arc<FormPipeline>,
    pub sessions: Arc<dyn SessionProvider>,
    pub routes: Arc<ArcSwap<RouteMatcher>>,
    pub content: Arc<ContentService>,
    pub store: Arc<dyn SubmissionStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Assemble the state from a validated config and the injected
    /// provider implementations.
    pub fn build(
        config: AppConfig,
        store: Arc<dyn SubmissionStore>,
        mailer: Arc<dyn Mailer>,
        sessions: Arc<dyn SessionProvider>,
    ) -> Result<Self, regex::Error> {
        let spam = Arc::new(ArcSwap::from_pointee(SpamFilter::compile(&config.spam)?));
        let routes = Arc::new(ArcSwap::from_pointee(RouteMatcher::compile(
            &config.session,
        )?));
        let content = Arc::new(ContentService::new(
            &config.content,
            Duration::from_secs(config.timeouts.upstream_secs),
        ));

        let rate_store = Arc::new(MemoryRateStore::new(config.rate_limit.max_tracked_keys));
        let config = Arc::new(ArcSwap::from_pointee(config));
        let pipeline = Arc::new(FormPipeline::new(
            config.clone(),
            spam,
            RateLimiter::new(rate_store),
            store.clone(),
            mailer.clone(),
        ));

        Ok(Self {
            config,
            pipeline,
            sessions,
            routes,
            content,
            store,
            mailer,
        })
    }

    /// Apply a hot-reloaded config: compile the derived artifacts first so
    /// a bad file cannot take down the running rules, then swap.
    pub fn apply(&self, new_config: AppConfig) -> Result<(), regex::Error> {
        let spam = SpamFilter::compile(&new_config.spam)?;
        let routes = RouteMatcher::compile(&new_config.session)?;

        self.pipeline.swap_spam_filter(spam);
        self.routes.store(Arc::new(routes));
        self.config.store(Arc::new(new_config));
        tracing::info!("Configuration reloaded");
        Ok(())
    }
}

/// HTTP server for the site backend.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server over the given state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.load_full();
        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(routes::health))
            .route("/api/revalidate", post(routes::webhook::revalidate))
            .route(
                "/newsletter/unsubscribe",
                get(routes::unsubscribe::unsubscribe),
            )
            .route(
                "/api/forms/newsletter",
                post(routes::forms::submit_newsletter),
            )
            .route("/api/forms/quote", post(routes::forms::submit_quote))
            .route("/api/forms/inquiry", post(routes::forms::submit_inquiry))
            .route("/api/forms/comment", post(routes::forms::submit_comment))
            .route(
                "/api/forms/application",
                post(routes::forms::submit_application),
            )
            .route("/api/account/profile", post(routes::forms::submit_profile))
            .route("/", get(routes::pages::render_root))
            .route("/{*path}", get(routes::pages::render_page))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                session_guard,
            ))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    ))),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
