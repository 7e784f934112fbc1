/// Database models for SynergySphere
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and authentication
/// - `project`: Projects owning tasks and events
/// - `membership`: User-project relationships with roles
/// - `task`: Tasks within a project
/// - `event`: Calendar events, optionally tied to a project or task
/// - `notification`: Persisted notifications, independent of live delivery
///
/// # Example
///
/// ```no_run
/// use synergysphere_shared::models::user::{User, CreateUser};
/// use synergysphere_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: Some("John Doe".to_string()),
///     avatar_url: None,
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod event;
pub mod membership;
pub mod notification;
pub mod project;
pub mod task;
pub mod user;
