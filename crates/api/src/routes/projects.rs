//! Project routes.
//!
//! Ownership is carried by `userId` in the body or query string; every
//! mutation is scoped to it.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;
use validator::Validate;

use crate::AppState;
use crate::error::{
    ApiJson, ApiResult, bad_request, database_error, not_found, validation_error,
};
use folio_db::{
    ProjectRepository,
    entities::projects,
    repositories::{CreateProjectInput, ProjectError, UpdateProjectInput},
};
use folio_shared::AppError;

/// Creates the project router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/search", get(search_projects))
        .route(
            "/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
}

/// `?userId=`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerQuery {
    /// Owner filter.
    pub user_id: Option<i64>,
}

/// `?q=&userId=`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// Search term.
    pub q: Option<String>,
    /// Owner filter.
    pub user_id: Option<i64>,
}

/// Create request body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    /// Owner.
    pub user_id: i64,
    /// Display name.
    #[validate(length(min = 1, max = 200, message = "Project name must be 1-200 characters"))]
    pub project_name: String,
    /// Image URL from `/upload`.
    #[serde(default)]
    pub image: Option<String>,
    /// Free text.
    #[serde(default)]
    pub description: Option<String>,
}

/// Update request body. Absent fields are left alone, `null` clears.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    /// Owner, if not given in the query string.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// New name.
    #[validate(length(min = 1, max = 200, message = "Project name must be 1-200 characters"))]
    #[serde(default)]
    pub project_name: Option<String>,
    /// New image URL, or `null` to clear.
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,
    /// New description, or `null` to clear.
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
}

/// Distinguishes an explicit `null` from a missing field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Project as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    /// Project ID.
    pub id: i64,
    /// Owner.
    pub user_id: i64,
    /// Display name.
    pub project_name: String,
    /// Image URL.
    pub image: Option<String>,
    /// Free text.
    pub description: Option<String>,
    /// Created at.
    pub created_at: DateTime<FixedOffset>,
    /// Last update.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<projects::Model> for ProjectResponse {
    fn from(p: projects::Model) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            project_name: p.project_name,
            image: p.image,
            description: p.description,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

fn repo(state: &AppState) -> ProjectRepository {
    ProjectRepository::new(state.db.clone())
}

fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse().map_err(|_| bad_request("Invalid project id"))
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// GET /projects
async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let projects = repo(&state)
        .find_all(query.user_id)
        .await
        .map_err(|e| database_error(&e))?;

    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

/// GET /projects/search
async fn search_projects(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let term = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| bad_request("Search query is required"))?;

    let projects = repo(&state)
        .search(term, query.user_id)
        .await
        .map_err(|e| database_error(&e))?;

    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

/// GET /projects/{id}
async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectResponse>> {
    let id = parse_id(&id)?;

    let project = repo(&state)
        .find_by_id(id)
        .await
        .map_err(|e| database_error(&e))?
        .ok_or_else(|| not_found("Project not found"))?;

    Ok(Json(project.into()))
}

/// POST /projects
async fn create_project(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate().map_err(|e| validation_error(&e))?;

    let project = repo(&state)
        .create(CreateProjectInput {
            user_id: payload.user_id,
            project_name: payload.project_name.trim().to_string(),
            image: blank_to_none(payload.image),
            description: payload.description,
        })
        .await
        .map_err(|e| match e {
            ProjectError::UserNotFound(_) => AppError::NotFound("User not found".into()),
            ProjectError::Database(e) => AppError::Database(e.to_string()),
        })?;

    info!(project_id = project.id, user_id = project.user_id, "project created");

    Ok((StatusCode::CREATED, Json(ProjectResponse::from(project))))
}

/// PUT /projects/{id}
async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<OwnerQuery>,
    ApiJson(payload): ApiJson<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    let id = parse_id(&id)?;
    payload.validate().map_err(|e| validation_error(&e))?;
    let user_id = payload
        .user_id
        .or(query.user_id)
        .ok_or_else(|| bad_request("userId is required"))?;

    let changes = UpdateProjectInput {
        project_name: payload.project_name.map(|n| n.trim().to_string()),
        image: payload.image.map(blank_to_none),
        description: payload.description,
    };

    let project = repo(&state)
        .update(id, user_id, changes)
        .await
        .map_err(|e| database_error(&e))?
        .ok_or_else(|| not_found("Project not found"))?;

    info!(project_id = project.id, user_id, "project updated");

    Ok(Json(project.into()))
}

/// DELETE /projects/{id}
async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<OwnerQuery>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    let user_id = match query.user_id {
        Some(user_id) => Some(user_id),
        None => owner_from_body(&body)?,
    }
    .ok_or_else(|| bad_request("userId is required"))?;

    if !repo(&state)
        .delete(id, user_id)
        .await
        .map_err(|e| database_error(&e))?
    {
        return Err(not_found("Project not found"));
    }

    info!(project_id = id, user_id, "project deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Reads `userId` from an optional JSON body; an empty body carries none.
fn owner_from_body(body: &[u8]) -> ApiResult<Option<i64>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<OwnerQuery>(body)
        .map(|owner| owner.user_id)
        .map_err(|e| bad_request(format!("Invalid JSON body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_from_body() {
        assert_eq!(owner_from_body(b"").unwrap(), None);
        assert_eq!(owner_from_body(b"{}").unwrap(), None);
        assert_eq!(owner_from_body(br#"{"userId": 7}"#).unwrap(), Some(7));
        assert!(owner_from_body(b"not json").is_err());
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let absent: UpdateProjectRequest = serde_json::from_str(r#"{"userId": 1}"#).unwrap();
        assert!(absent.image.is_none());

        let cleared: UpdateProjectRequest =
            serde_json::from_str(r#"{"userId": 1, "image": null}"#).unwrap();
        assert_eq!(cleared.image, Some(None));

        let set: UpdateProjectRequest =
            serde_json::from_str(r#"{"image": "http://x/b/1.jpg"}"#).unwrap();
        assert_eq!(set.image, Some(Some("http://x/b/1.jpg".to_string())));
        assert!(set.user_id.is_none());
    }

    #[test]
    fn test_blank_image_is_none() {
        assert_eq!(blank_to_none(Some("  ".into())), None);
        assert_eq!(blank_to_none(Some(" a ".into())), Some("a".into()));
    }
}
