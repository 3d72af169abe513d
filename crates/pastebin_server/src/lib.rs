//! HTTP server wiring for the pastebin service (API, handlers, and shared state).

/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for paste, user, stats, and short URL endpoints.
pub mod handlers;
/// Background tasks started alongside the server.
pub mod tasks;

pub use pastebin_core::{
    changes, config, db, models, service, AppError, ChangeLogger, Config, Services, Storage,
    StorageBackend, DEFAULT_PORT,
};
pub use tasks::{spawn_background_tasks, BackgroundTasks};

use axum::{
    extract::DefaultBodyLimit,
    http::header,
    routing::{get, post},
    Router,
};
use hyper::HeaderMap;
use pastebin_core::TracingChangeLogger;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub storage: Storage,
    pub config: Arc<Config>,
}

impl AppState {
    /// Construct shared application state that audits changes through `tracing`.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    /// - `storage`: Opened storage context.
    ///
    /// # Returns
    /// A new [`AppState`].
    pub fn new(config: Config, storage: Storage) -> Self {
        Self::with_logger(config, storage, Arc::new(TracingChangeLogger))
    }

    /// Construct shared application state with a custom change logger.
    pub fn with_logger(config: Config, storage: Storage, logger: Arc<dyn ChangeLogger>) -> Self {
        Self {
            services: Services::new(storage.clone(), logger),
            storage,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware.
///
/// # Arguments
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
///
/// # Returns
/// Configured `axum::Router`.
///
/// # Panics
/// Panics if static header values fail to parse (should not happen).
pub fn create_app(state: AppState, allow_public_access: bool) -> Router {
    let cors_port = state.config.port;
    create_app_with_cors_port(state, allow_public_access, cors_port)
}

/// Resolve the listener address from env var overrides and security policy.
///
/// # Arguments
/// - `config`: Server configuration containing the configured `port`.
/// - `allow_public_access`: Whether non-loopback bind targets are permitted.
///
/// # Returns
/// A validated socket address that enforces loopback when public access is disabled.
pub fn resolve_bind_address(config: &Config, allow_public_access: bool) -> SocketAddr {
    resolve_bind_from(std::env::var("BIND").ok(), config.port, allow_public_access)
}

fn resolve_bind_from(bind: Option<String>, port: u16, allow_public_access: bool) -> SocketAddr {
    let default_bind = SocketAddr::from(([127, 0, 0, 1], port));
    let requested = match bind {
        Some(value) => match value.trim().parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::warn!(
                    "Invalid BIND='{}': {}. Falling back to {}",
                    value,
                    err,
                    default_bind
                );
                default_bind
            }
        },
        None => default_bind,
    };

    if allow_public_access || requested.ip().is_loopback() {
        return requested;
    }

    tracing::warn!(
        "Non-loopback bind {} requested without ALLOW_PUBLIC_ACCESS; forcing 127.0.0.1",
        requested
    );
    SocketAddr::from(([127, 0, 0, 1], requested.port()))
}

fn create_app_with_cors_port(state: AppState, allow_public_access: bool, cors_port: u16) -> Router {
    // Security headers
    let mut default_headers = HeaderMap::new();
    default_headers.insert(header::X_CONTENT_TYPE_OPTIONS, "nosniff".parse().unwrap());
    default_headers.insert(header::X_FRAME_OPTIONS, "DENY".parse().unwrap());
    default_headers.insert(
        header::CONTENT_SECURITY_POLICY,
        "default-src 'none'; frame-ancestors 'none'; base-uri 'none'"
            .parse()
            .unwrap(),
    );

    let methods = [
        axum::http::Method::GET,
        axum::http::Method::POST,
        axum::http::Method::DELETE,
    ];
    let cors = if allow_public_access {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        CorsLayer::new()
            .allow_origin([
                format!("http://localhost:{}", cors_port).parse().unwrap(),
                format!("http://127.0.0.1:{}", cors_port).parse().unwrap(),
            ])
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
    };

    // Body limit leaves headroom for the JSON envelope around the content.
    let body_limit = state.config.max_paste_size.saturating_add(64 * 1024);

    Router::new()
        .route("/api/paste", post(handlers::paste::create_paste))
        .route("/api/pastes", get(handlers::paste::list_pastes))
        .route("/api/paste/popular", get(handlers::paste::popular_pastes))
        .route(
            "/api/paste/hash/:hash",
            get(handlers::paste::get_paste_by_hash),
        )
        .route(
            "/api/paste/:id",
            get(handlers::paste::get_paste).delete(handlers::paste::delete_paste),
        )
        .route(
            "/api/user",
            get(handlers::user::list_users).post(handlers::user::create_user),
        )
        .route(
            "/api/user/:id",
            get(handlers::user::get_user).delete(handlers::user::delete_user),
        )
        .route("/api/user/:id/posts", post(handlers::user::add_post))
        .route(
            "/api/stats",
            get(handlers::stats::list_stats).post(handlers::stats::create_stats),
        )
        .route(
            "/api/stat/:id",
            get(handlers::stats::get_stats).delete(handlers::stats::delete_stats),
        )
        .route("/api/stat/:id/views", post(handlers::stats::increment_views))
        .route(
            "/api/shorturl/:id",
            get(handlers::short_url::get_short_url)
                .post(handlers::short_url::create_short_url)
                .delete(handlers::short_url::delete_short_url),
        )
        .route("/api/shorturls", get(handlers::short_url::list_short_urls))
        .route("/s/:code", get(handlers::short_url::resolve_short_url))
        .with_state(state)
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    header::CONTENT_SECURITY_POLICY,
                    default_headers
                        .get(header::CONTENT_SECURITY_POLICY)
                        .unwrap()
                        .clone(),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    default_headers
                        .get(header::X_CONTENT_TYPE_OPTIONS)
                        .unwrap()
                        .clone(),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    default_headers
                        .get(header::X_FRAME_OPTIONS)
                        .unwrap()
                        .clone(),
                )),
        )
}

fn listener_cors_port(listener: &tokio::net::TcpListener, fallback_port: u16) -> u16 {
    listener
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or(fallback_port)
}

/// Run the Axum server with graceful shutdown support.
///
/// # Arguments
/// - `listener`: Bound TCP listener for the server.
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
/// - `shutdown_signal`: Future that resolves when shutdown should start.
///
/// # Returns
/// `Ok(())` when the server exits cleanly.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    allow_public_access: bool,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let cors_port = listener_cors_port(&listener, state.config.port);
    let app = create_app_with_cors_port(state, allow_public_access, cors_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}

/// Open storage, start background tasks, and serve until `shutdown_signal`
/// resolves.
///
/// After the HTTP server drains, background tasks are signalled and awaited.
///
/// # Errors
/// Returns an error when storage cannot be opened or the listener fails.
pub async fn run(
    config: Config,
    allow_public_access: bool,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let storage = Storage::open(config.backend, &config.data_dir)?;
    tracing::info!("Using {} storage backend", storage.backend());
    let state = AppState::new(config.clone(), storage);

    let bind_addr = resolve_bind_address(&config, allow_public_access);
    if !bind_addr.ip().is_loopback() {
        tracing::warn!(
            "Binding to non-localhost address: {} - ensure proper security measures are in place",
            bind_addr
        );
    }

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr().unwrap_or(bind_addr);
    tracing::info!("Pastebin running at http://{}", actual_addr);

    let (trigger, _signal) = pastebin_core::shutdown_channel();
    let tasks = spawn_background_tasks(&state, &trigger);
    let serve_result = serve_router(listener, state, allow_public_access, shutdown_signal).await;

    trigger.trigger();
    tasks.join().await;
    tracing::info!("Background tasks stopped");

    serve_result?;
    Ok(())
}

/// Resolve on Ctrl+C or, on Unix, SIGTERM.
///
/// # Panics
/// Panics if the signal handlers cannot be installed.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
