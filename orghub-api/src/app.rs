/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use orghub_api::{app::{build_router, AppState}, config::Config};
/// use orghub_shared::store::MemoryStore;
/// use std::sync::Arc;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use orghub_shared::{
    auth::middleware::{authenticate, AuthError},
    store::Store,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{config::Config, error::ApiError, routes};

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Both fields are `Arc`s, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend (PostgreSQL in production, in-memory in tests)
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /api
/// ├── GET  /health                              # public
/// ├── POST /echo                                # public
/// ├── /auth
/// │   ├── POST /register                        # public
/// │   ├── POST /login                           # public
/// │   └── GET  /me                              # bearer
/// └── /organizations                            # bearer
///     ├── POST   /
///     ├── GET    /
///     ├── GET    /:id                           # member
///     ├── DELETE /:id                           # admin
///     ├── POST   /:id/switch                    # member
///     ├── GET    /:id/members                   # member
///     ├── POST   /:id/members                   # admin
///     └── DELETE /:id/members/:user_id          # admin
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. CORS (answers preflights before routing or auth)
/// 2. Logging (tower-http TraceLayer)
/// 3. Bearer authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    let auth_layer = middleware::from_fn_with_state(state.clone(), jwt_auth_layer);

    let auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .route_layer(auth_layer.clone())
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let organization_routes = Router::new()
        .route(
            "/",
            post(routes::organizations::create_organization)
                .get(routes::organizations::list_organizations),
        )
        .route(
            "/:id",
            get(routes::organizations::get_organization)
                .delete(routes::organizations::delete_organization),
        )
        .route("/:id/switch", post(routes::organizations::switch_organization))
        .route(
            "/:id/members",
            get(routes::organizations::list_members).post(routes::organizations::add_member),
        )
        .route(
            "/:id/members/:user_id",
            delete(routes::organizations::remove_member),
        )
        .route_layer(auth_layer);

    let api_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/echo", post(routes::echo::echo))
        .nest("/auth", auth_routes)
        .nest("/organizations", organization_routes);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .nest("/api", api_routes)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Bearer authentication layer
///
/// Validates the token, then confirms the user still exists. Tokens of
/// soft-deleted users are rejected as `INVALID_TOKEN`. On success the
/// `AuthContext` is inserted into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret()).map_err(|e| {
        tracing::debug!(code = e.code(), path = %req.uri().path(), "Authentication failed");
        ApiError::from(e)
    })?;

    if state.store.find_user_by_id(auth_context.user_id).await?.is_none() {
        tracing::debug!(user_id = %auth_context.user_id, "Token for deleted or unknown user");
        return Err(ApiError::from(AuthError::InvalidToken));
    }

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
