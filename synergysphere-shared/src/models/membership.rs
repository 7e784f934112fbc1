/// Project membership model and database operations
///
/// This module provides the ProjectMember model for user-project relationships
/// with role-based access control.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_role AS ENUM ('owner', 'manager', 'member');
///
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role project_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **owner**: Full control, delete project, manage members
/// - **manager**: Manage members and all tasks
/// - **member**: Create and manage tasks, read everything
///
/// # Example
///
/// ```no_run
/// use synergysphere_shared::models::membership::{ProjectMember, CreateProjectMember, ProjectRole};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let membership = ProjectMember::create(&pool, CreateProjectMember {
///     project_id,
///     user_id,
///     role: ProjectRole::Member,
/// }).await?;
///
/// let has_access = ProjectMember::has_access(&pool, project_id, user_id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Roles within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    /// Full control: delete project, manage members and all tasks
    Owner,

    /// Can manage members and all tasks
    Manager,

    /// Can create and manage tasks
    Member,
}

impl ProjectRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Owner => "owner",
            ProjectRole::Manager => "manager",
            ProjectRole::Member => "member",
        }
    }

    /// Can manage the member list
    pub fn can_manage_members(&self) -> bool {
        matches!(self, ProjectRole::Owner | ProjectRole::Manager)
    }

    /// Can delete the project
    pub fn can_delete_project(&self) -> bool {
        matches!(self, ProjectRole::Owner)
    }

    /// Checks if this role has the permission level of the required role
    ///
    /// Hierarchy: Owner > Manager > Member
    pub fn has_permission(&self, required: ProjectRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            ProjectRole::Owner => 3,
            ProjectRole::Manager => 2,
            ProjectRole::Member => 1,
        }
    }
}

/// Membership model representing a user-project relationship with a role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    /// Project ID
    pub project_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the project
    pub role: ProjectRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectMember {
    /// Project ID
    pub project_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role to assign (defaults to Member)
    #[serde(default = "default_role")]
    pub role: ProjectRole,
}

fn default_role() -> ProjectRole {
    ProjectRole::Member
}

impl ProjectMember {
    /// Creates a new membership (adds user to project)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Membership already exists (primary key violation)
    /// - Project or user doesn't exist (foreign key violation)
    pub async fn create(pool: &PgPool, data: CreateProjectMember) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING project_id, user_id, role, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Inserts a membership if one does not already exist
    ///
    /// Used when a task assignee is not yet a member of the task's project:
    /// the invariant is repaired by insertion rather than rejecting the
    /// mutation. Returns true if a row was inserted.
    pub async fn ensure_member(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, 'member')
            ON CONFLICT (project_id, user_id) DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Finds a specific membership by project and user
    pub async fn find(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT project_id, user_id, role, created_at
            FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Checks if a user has access to a project (any role)
    pub async fn has_access(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM project_members
                WHERE project_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Deletes a membership (removes user from project)
    ///
    /// Returns true if a membership was deleted.
    pub async fn delete(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all members of a project
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT project_id, user_id, role, created_at
            FROM project_members
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Lists the user ids of all members of a project
    ///
    /// This is the membership-resolver query behind project broadcasts.
    pub async fn list_user_ids(pool: &PgPool, project_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT user_id
            FROM project_members
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_role_as_str() {
        assert_eq!(ProjectRole::Owner.as_str(), "owner");
        assert_eq!(ProjectRole::Manager.as_str(), "manager");
        assert_eq!(ProjectRole::Member.as_str(), "member");
    }

    #[test]
    fn test_role_permissions() {
        assert!(ProjectRole::Owner.can_manage_members());
        assert!(ProjectRole::Owner.can_delete_project());

        assert!(ProjectRole::Manager.can_manage_members());
        assert!(!ProjectRole::Manager.can_delete_project());

        assert!(!ProjectRole::Member.can_manage_members());
        assert!(!ProjectRole::Member.can_delete_project());
    }

    #[test]
    fn test_role_hierarchy() {
        assert!(ProjectRole::Owner.has_permission(ProjectRole::Manager));
        assert!(ProjectRole::Owner.has_permission(ProjectRole::Member));
        assert!(ProjectRole::Manager.has_permission(ProjectRole::Member));

        assert!(!ProjectRole::Member.has_permission(ProjectRole::Manager));
        assert!(!ProjectRole::Manager.has_permission(ProjectRole::Owner));

        assert!(ProjectRole::Member.has_permission(ProjectRole::Member));
    }

    #[test]
    fn test_create_membership_default_role() {
        assert_eq!(default_role(), ProjectRole::Member);
    }

    // Integration tests for database operations are in the API test suite
}
