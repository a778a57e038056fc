//! HTTP server bootstrap for the proof registry.
//!
//! Wires together configuration, the database-backed proof store, the
//! registry and verification services, authentication, the expiry
//! sweeper, and the Axum router.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::auth::{
    ApiKeyRecord, ApiKeyValidator, AuthMiddlewareState, Authenticator, JwtValidator,
};
use crate::crypto::ReceiptSigner;
use crate::infra::{
    shutdown_channel, ExpirySweeper, PgProofStore, ProofStore, SqliteProofStore,
};
use crate::metrics::MetricsRegistry;
use crate::policy::{AccessPolicyGuard, NoShareGrants};
use crate::registry::ProofRegistry;
use crate::verify::VerificationService;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL (`postgres://` or `sqlite://`).
    pub database_url: String,
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Maximum database connections.
    pub max_connections: u32,
    /// Public base URL used for shareable verify links.
    pub public_base_url: String,
    /// Seconds between expiry sweeps.
    pub expiry_sweep_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/prooflink".to_string());

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid listen address: {e}"))?;

        let max_connections: u32 = std::env::var("MAX_DB_CONNECTIONS")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(10);

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{listen_addr}"));
        let public_base_url = public_base_url.trim_end_matches('/').to_string();

        let expiry_sweep_interval = Duration::from_secs(
            std::env::var("EXPIRY_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        );

        Ok(Self {
            database_url,
            listen_addr,
            max_connections,
            public_base_url,
            expiry_sweep_interval,
        })
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ProofRegistry>,
    pub verifier: Arc<VerificationService>,
    pub store: Arc<dyn ProofStore>,
    pub metrics: Arc<MetricsRegistry>,
    pub public_base_url: String,
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting proof registry v{}", env!("CARGO_PKG_VERSION"));

    // Auth configuration
    let auth_mode = std::env::var("AUTH_MODE").unwrap_or_else(|_| "required".to_string());
    let require_auth = auth_mode != "disabled";

    let api_key_validator = Arc::new(ApiKeyValidator::new());
    let mut any_auth_configured = false;

    if let Ok(bootstrap_key) = std::env::var("BOOTSTRAP_ADMIN_API_KEY") {
        let key_hash = ApiKeyValidator::hash_key(&bootstrap_key);
        api_key_validator.register_key(ApiKeyRecord {
            key_hash,
            owner_id: Uuid::nil(),
            admin: true,
            active: true,
        });
        any_auth_configured = true;
        info!("Bootstrap admin API key is configured");
    }

    let jwt_validator = match std::env::var("JWT_SECRET") {
        Ok(secret) => {
            any_auth_configured = true;
            Some(Arc::new(JwtValidator::new(&secret)))
        }
        Err(_) => None,
    };

    if require_auth && !any_auth_configured {
        anyhow::bail!(
            "AUTH_MODE=required but no auth is configured; set JWT_SECRET or BOOTSTRAP_ADMIN_API_KEY (or set AUTH_MODE=disabled for local dev)"
        );
    }

    let authenticator = {
        let authenticator = Authenticator::new(api_key_validator);
        match jwt_validator {
            Some(jwt) => Arc::new(authenticator.with_jwt(jwt)),
            None => Arc::new(authenticator),
        }
    };

    let auth_state = AuthMiddlewareState {
        authenticator,
        require_auth,
    };

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Max connections: {}", config.max_connections);

    // Connect to the database; sqlite is for local development.
    let store: Arc<dyn ProofStore> = if config.database_url.starts_with("sqlite") {
        info!("Connecting to SQLite...");
        Arc::new(SqliteProofStore::from_url(&config.database_url).await?)
    } else {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        info!("Running database migrations...");
        crate::migrations::run_postgres(&pool).await?;
        Arc::new(PgProofStore::new(pool))
    };
    info!("Database ready");

    // Core services
    let guard = Arc::new(AccessPolicyGuard::new(Arc::new(NoShareGrants)));
    let registry = Arc::new(ProofRegistry::new(store.clone(), guard.clone()));

    let mut verifier = VerificationService::new(store.clone(), guard);

    if let Ok(endpoint) = std::env::var("AI_ANALYZER_URL") {
        let timeout = Duration::from_millis(
            std::env::var("AI_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
        );
        info!("AI tamper analyzer configured at {endpoint}");
        let analyzer = crate::ai::HttpTamperAnalyzer::new(endpoint, timeout)?;
        verifier = verifier.with_analyzer(Arc::new(analyzer), timeout);
    } else {
        info!("AI tamper analyzer not configured (set AI_ANALYZER_URL to enable)");
    }

    match std::env::var("RECEIPT_SIGNING_KEY") {
        Ok(key) => {
            let signer = ReceiptSigner::from_base64(&key)
                .map_err(|e| anyhow::anyhow!("RECEIPT_SIGNING_KEY: {e}"))?;
            info!(
                "Receipt signing enabled, public key {}",
                signer.public_key_base64()
            );
            verifier = verifier.with_receipt_signer(Arc::new(signer));
        }
        Err(_) => {
            info!("Receipt signing not configured (set RECEIPT_SIGNING_KEY to enable)");
        }
    }

    let metrics = Arc::new(MetricsRegistry::new());

    let state = AppState {
        registry,
        verifier: Arc::new(verifier),
        store: store.clone(),
        metrics: metrics.clone(),
        public_base_url: config.public_base_url.clone(),
    };

    // Background expiry sweeper with graceful shutdown.
    let (controller, sweeper_signal) = shutdown_channel();
    let server_signal = sweeper_signal.clone();
    let sweeper = ExpirySweeper::new(store, metrics, config.expiry_sweep_interval);
    tokio::spawn(sweeper.run(sweeper_signal));
    tokio::spawn(controller.listen_for_signals());

    // Build router
    let app = build_router(auth_state)?
        .with_state(state)
        .into_make_service_with_connect_info::<SocketAddr>();

    info!("Starting HTTP server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    info!("Proof registry is ready to accept connections");
    let mut server_signal = server_signal;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_signal.recv().await })
        .await?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Assemble the full router: authenticated `/api` routes plus the public
/// verify, health, and metrics surface.
pub fn build_router(auth_state: AuthMiddlewareState) -> anyhow::Result<Router<AppState>> {
    let api = crate::api::rest::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        crate::auth::auth_middleware,
    ));

    let mut router = Router::new()
        .merge(crate::api::rest::public_router())
        .nest("/api", api)
        .layer(TraceLayer::new_for_http());

    if let Some(cors_layer) = cors_layer_from_env()? {
        router = router.layer(cors_layer);
    }

    Ok(router)
}

fn cors_layer_from_env() -> anyhow::Result<Option<CorsLayer>> {
    let origins = match std::env::var("CORS_ALLOW_ORIGINS") {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let origins = origins.trim();
    if origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {s:?}: {e}"))
            })
            .collect::<anyhow::Result<_>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ]),
    ))
}
