/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - Test user creation
/// - JWT token generation
/// - API client helpers
///
/// Tests using this module require a running PostgreSQL database, reachable
/// through the DATABASE_URL environment variable.

use synergysphere_api::app::{build_router, AppState};
use synergysphere_api::config::Config;
use synergysphere_shared::auth::jwt::{create_token, Claims, TokenType};
use synergysphere_shared::auth::password::hash_password;
use synergysphere_shared::models::user::{CreateUser, User};
use sqlx::PgPool;
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
    pub jwt_token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh test user
    pub async fn new() -> anyhow::Result<Self> {
        // Load test configuration
        let config = Config::from_env()?;

        // Connect to database
        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to this crate's Cargo.toml)
        sqlx::migrate!("../synergysphere-shared/migrations")
            .run(&db)
            .await?;

        // Create test user
        let user = Self::create_user(&db, "Test User").await?;

        // Generate JWT token
        let claims = Claims::new(user.id, TokenType::Access);
        let jwt_token = create_token(&claims, &config.jwt.secret)?;

        // Build the application router
        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(Self {
            db,
            app,
            config,
            user,
            jwt_token,
        })
    }

    /// Creates an additional user for multi-user scenarios
    pub async fn create_user(db: &PgPool, name: &str) -> anyhow::Result<User> {
        let user = User::create(
            db,
            CreateUser {
                email: format!("test-{}@example.com", Uuid::new_v4()),
                password_hash: hash_password("integration-test-password-1")?,
                name: Some(name.to_string()),
                avatar_url: None,
            },
        )
        .await?;

        Ok(user)
    }

    /// Generates an access token for an arbitrary user
    pub fn token_for(&self, user_id: Uuid) -> anyhow::Result<String> {
        let claims = Claims::new(user_id, TokenType::Access);
        Ok(create_token(&claims, &self.config.jwt.secret)?)
    }

    /// Authorization header value for the primary test user
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Removes rows created by this context
    ///
    /// Projects, tasks, events, memberships, and notifications cascade away
    /// with their users.
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE email LIKE 'test-%@example.com'")
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
