/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use synergysphere_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = synergysphere_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use synergysphere_shared::auth::{jwt, middleware::AuthContext};
use synergysphere_shared::realtime::{ConnectionRegistry, Notifier, PgMembershipResolver};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Registry of live WebSocket connections
    ///
    /// Constructed here and passed through state; never a module-level
    /// singleton.
    pub registry: Arc<ConnectionRegistry>,

    /// Best-effort fan-out of domain events to live connections
    pub notifier: Arc<Notifier>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let notifier = Arc::new(Notifier::new(
            registry.clone(),
            Arc::new(PgMembershipResolver::new(db.clone())),
        ));

        Self {
            db,
            config: Arc::new(config),
            registry,
            notifier,
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
/// /
/// ├── /health                       # Health check (public)
/// ├── /v1/                          # API v1 (versioned)
/// │   ├── /auth/                    # Authentication (public)
/// │   │   ├── POST /register
/// │   │   ├── POST /login
/// │   │   └── POST /refresh
/// │   ├── /ws                       # WebSocket upgrade (token-gated)
/// │   ├── /users/                   # User directory (authenticated)
/// │   ├── /projects/                # Projects + members (authenticated)
/// │   ├── /tasks/                   # Tasks (authenticated)
/// │   ├── /events/                  # Calendar events (authenticated)
/// │   └── /notifications/           # Persisted notifications (authenticated)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // User directory (require JWT authentication)
    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/me", get(routes::users::me));

    // Project CRUD + member management
    let project_routes = Router::new()
        .route("/", get(routes::projects::list_projects))
        .route("/", post(routes::projects::create_project))
        .route("/:id", get(routes::projects::get_project))
        .route("/:id", put(routes::projects::update_project))
        .route("/:id", delete(routes::projects::delete_project))
        .route("/:id/tasks", get(routes::tasks::list_project_tasks))
        .route("/:id/members", post(routes::projects::add_member))
        .route(
            "/:id/members/:user_id",
            delete(routes::projects::remove_member),
        );

    // Task CRUD
    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/", post(routes::tasks::create_task))
        .route("/mine", get(routes::tasks::list_my_tasks))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task));

    // Calendar event CRUD + deadline feeds
    let event_routes = Router::new()
        .route("/", get(routes::events::list_events))
        .route("/", post(routes::events::create_event))
        .route("/range", get(routes::events::list_events_in_range))
        .route("/deadlines/tasks", get(routes::events::list_task_deadlines))
        .route(
            "/deadlines/projects",
            get(routes::events::list_project_deadlines),
        )
        .route("/:id", get(routes::events::get_event))
        .route("/:id", put(routes::events::update_event))
        .route("/:id", delete(routes::events::delete_event));

    // Persisted notifications
    let notification_routes = Router::new()
        .route("/", get(routes::notifications::list_notifications))
        .route("/unread", get(routes::notifications::list_unread))
        .route("/:id/read", put(routes::notifications::mark_read));

    let authenticated_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/events", event_routes)
        .nest("/notifications", notification_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // WebSocket upgrade authenticates via token query/header inside the
    // handler so it can close with a WebSocket close code instead of an
    // HTTP status.
    let ws_routes = Router::new().route("/ws", get(routes::ws::ws_upgrade));

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(ws_routes)
        .merge(authenticated_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates JWT token from Authorization header,
/// then injects AuthContext into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let token = synergysphere_shared::auth::middleware::bearer_token(req.headers()).ok_or_else(
        || crate::error::ApiError::Unauthorized("Missing authorization header".to_string()),
    )?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    let auth_context = AuthContext::from_jwt(claims.sub);

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
