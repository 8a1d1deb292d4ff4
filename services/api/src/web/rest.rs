//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the JSON API and the master definition for the
//! OpenAPI specification. Every handler acts with the caller's own access token,
//! so row-level security at the backend decides what is visible.

use crate::web::state::{AppState, CurrentUser};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_assistant_core::domain::StudySession;
use study_assistant_core::listing::sort_newest_first;
use study_assistant_core::ports::PortError;
use study_assistant_core::validation::{FormVariant, SessionForm};
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        me_handler,
        list_sessions_handler,
        create_session_handler,
        get_session_handler,
        delete_session_handler,
    ),
    components(
        schemas(UserResponse, StudySessionResponse, CreateStudySessionRequest, ErrorBody)
    ),
    tags(
        (name = "StudyAssist API", description = "Study sessions of the signed-in user.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The body of every JSON error response.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct StudySessionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub study_level: String,
    pub learning_goals: String,
    pub learning_style: String,
    pub weaknesses: String,
    pub additional_info: String,
    pub created_at: DateTime<Utc>,
}

impl From<StudySession> for StudySessionResponse {
    fn from(s: StudySession) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            title: s.title,
            description: s.description,
            study_level: s.study_level,
            learning_goals: s.learning_goals,
            learning_style: s.learning_style,
            weaknesses: s.weaknesses,
            additional_info: s.additional_info,
            created_at: s.created_at,
        }
    }
}

/// A new study session. `title` and `description` are required; the rest may be omitted.
#[derive(Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct CreateStudySessionRequest {
    pub title: String,
    pub description: String,
    pub study_level: String,
    pub learning_goals: String,
    pub learning_style: String,
    pub weaknesses: String,
    pub additional_info: String,
}

impl From<CreateStudySessionRequest> for SessionForm {
    fn from(r: CreateStudySessionRequest) -> Self {
        SessionForm {
            title: r.title,
            description: r.description,
            study_level: r.study_level,
            learning_goals: r.learning_goals,
            learning_style: r.learning_style,
            weaknesses: r.weaknesses,
            additional_info: r.additional_info,
        }
    }
}

//=========================================================================================
// Errors
//=========================================================================================

/// A JSON API failure: a status code and a message for the caller.
#[derive(Debug)]
pub struct RestError {
    pub status: StatusCode,
    pub message: String,
}

impl RestError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<PortError> for RestError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(message) => Self {
                status: StatusCode::NOT_FOUND,
                message,
            },
            PortError::Unauthorized => Self {
                status: StatusCode::UNAUTHORIZED,
                message: "Unauthorized".to_string(),
            },
            PortError::Validation(message) => Self::bad_request(message),
            PortError::Unexpected(message) => {
                error!("api error: {}", message);
                Self {
                    status: StatusCode::BAD_GATEWAY,
                    message: "The backend request failed".to_string(),
                }
            }
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// The signed-in user.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "The current user", body = UserResponse),
        (status = 401, description = "Not signed in", body = ErrorBody)
    )
)]
pub async fn me_handler(Extension(current): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse {
        id: current.user.id,
        email: current.user.email,
    })
}

/// The caller's study sessions, newest first.
#[utoipa::path(
    get,
    path = "/api/sessions",
    responses(
        (status = 200, description = "All of the caller's sessions", body = [StudySessionResponse]),
        (status = 401, description = "Not signed in", body = ErrorBody)
    )
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<StudySessionResponse>>, RestError> {
    let mut sessions = state.sessions.list_sessions(&current.access_token).await?;
    sort_newest_first(&mut sessions);
    Ok(Json(sessions.into_iter().map(Into::into).collect()))
}

/// Create a study session.
///
/// Inputs are validated before anything is sent to the backend.
#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = CreateStudySessionRequest,
    responses(
        (status = 201, description = "Session created", body = StudySessionResponse),
        (status = 400, description = "The input failed validation", body = ErrorBody),
        (status = 401, description = "Not signed in", body = ErrorBody)
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CreateStudySessionRequest>,
) -> Result<(StatusCode, Json<StudySessionResponse>), RestError> {
    let new_session = SessionForm::from(request)
        .validate(FormVariant::Modal, current.user.id)
        .map_err(|e| RestError::bad_request(e.to_string()))?;

    let created = state
        .sessions
        .create_session(&current.access_token, new_session)
        .await?;
    info!("Created study session {}.", created.id);
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// One study session.
#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(("id" = Uuid, Path, description = "The study session ID")),
    responses(
        (status = 200, description = "The session", body = StudySessionResponse),
        (status = 404, description = "No such session for this user", body = ErrorBody)
    )
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<StudySessionResponse>, RestError> {
    let session = state
        .sessions
        .get_session(&current.access_token, session_id)
        .await?;
    Ok(Json(session.into()))
}

/// Delete a study session.
#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(("id" = Uuid, Path, description = "The study session ID")),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 401, description = "Not signed in", body = ErrorBody)
    )
)]
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, RestError> {
    state
        .sessions
        .delete_session(&current.access_token, session_id)
        .await?;
    info!("Deleted study session {}.", session_id);
    Ok(StatusCode::NO_CONTENT)
}
