//! Project repository.
//!
//! Every query that touches a single project is scoped by owner, except
//! [`ProjectRepository::find_by_id`] which backs the public read route.

use std::sync::Arc;

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use crate::entities::{projects, users};

/// Error types for project operations.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// Owner does not exist.
    #[error("User not found: {0}")]
    UserNotFound(i64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a project.
#[derive(Debug, Clone)]
pub struct CreateProjectInput {
    /// Owner.
    pub user_id: i64,
    /// Display name.
    pub project_name: String,
    /// Image URL (object link or data URL).
    pub image: Option<String>,
    /// Free text.
    pub description: Option<String>,
}

/// Partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateProjectInput {
    /// New name.
    pub project_name: Option<String>,
    /// `Some(None)` clears the image.
    pub image: Option<Option<String>>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}

impl UpdateProjectInput {
    /// True when no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.project_name.is_none() && self.image.is_none() && self.description.is_none()
    }
}

/// Project repository for CRUD and search.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    db: Arc<DatabaseConnection>,
}

impl ProjectRepository {
    /// Creates a new project repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists projects, newest first, optionally for one owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_all(&self, user_id: Option<i64>) -> Result<Vec<projects::Model>, DbErr> {
        let mut query = projects::Entity::find();
        if let Some(user_id) = user_id {
            query = query.filter(projects::Column::UserId.eq(user_id));
        }

        query
            .order_by_desc(projects::Column::CreatedAt)
            .order_by_desc(projects::Column::Id)
            .all(&*self.db)
            .await
    }

    /// Finds a project by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<projects::Model>, DbErr> {
        projects::Entity::find_by_id(id).one(&*self.db).await
    }

    /// Finds a project only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_user_and_id(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<Option<projects::Model>, DbErr> {
        projects::Entity::find_by_id(id)
            .filter(projects::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await
    }

    /// Creates a project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::UserNotFound`] for an unknown owner.
    pub async fn create(&self, input: CreateProjectInput) -> Result<projects::Model, ProjectError> {
        if users::Entity::find_by_id(input.user_id)
            .one(&*self.db)
            .await?
            .is_none()
        {
            return Err(ProjectError::UserNotFound(input.user_id));
        }

        let now = chrono::Utc::now().into();
        let project = projects::ActiveModel {
            user_id: Set(input.user_id),
            project_name: Set(input.project_name),
            image: Set(input.image),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(project.insert(&*self.db).await?)
    }

    /// Applies a partial update to a project owned by `user_id`.
    ///
    /// Returns `None` when no such project exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn update(
        &self,
        id: i64,
        user_id: i64,
        input: UpdateProjectInput,
    ) -> Result<Option<projects::Model>, DbErr> {
        let Some(existing) = self.find_by_user_and_id(user_id, id).await? else {
            return Ok(None);
        };
        if input.is_empty() {
            return Ok(Some(existing));
        }

        let mut project = existing.into_active_model();
        if let Some(name) = input.project_name {
            project.project_name = Set(name);
        }
        if let Some(image) = input.image {
            project.image = Set(image);
        }
        if let Some(description) = input.description {
            project.description = Set(description);
        }
        project.updated_at = Set(chrono::Utc::now().into());

        project.update(&*self.db).await.map(Some)
    }

    /// Deletes a project owned by `user_id`. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete(&self, id: i64, user_id: i64) -> Result<bool, DbErr> {
        let result = projects::Entity::delete_many()
            .filter(projects::Column::Id.eq(id))
            .filter(projects::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Case-insensitive substring search on project name, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn search(
        &self,
        term: &str,
        user_id: Option<i64>,
    ) -> Result<Vec<projects::Model>, DbErr> {
        let pattern = format!("%{}%", term.to_lowercase());
        debug!(%pattern, ?user_id, "searching projects");

        let mut query = projects::Entity::find().filter(
            Expr::expr(Func::lower(Expr::col(projects::Column::ProjectName))).like(pattern),
        );
        if let Some(user_id) = user_id {
            query = query.filter(projects::Column::UserId.eq(user_id));
        }

        query
            .order_by_desc(projects::Column::CreatedAt)
            .order_by_desc(projects::Column::Id)
            .all(&*self.db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_input_is_empty() {
        assert!(UpdateProjectInput::default().is_empty());
        assert!(
            !UpdateProjectInput {
                image: Some(None),
                ..Default::default()
            }
            .is_empty()
        );
    }
}
