//! services/api/src/web/pages.rs
//!
//! Server-rendered pages: the landing page, the dashboard with its create and
//! delete dialogs, the standalone creation form and the chat page shell.
//!
//! Every mutation is followed by a redirect, so the dashboard list is always
//! fetched fresh rather than patched in place.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use std::sync::Arc;
use study_assistant_core::domain::{display_title, StudySession};
use study_assistant_core::listing::sort_newest_first;
use study_assistant_core::ports::{PortError, PortResult};
use study_assistant_core::validation::{FormVariant, SessionForm};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::web::{
    middleware::{resolve_session, store_refreshed},
    state::{AppState, CurrentUser},
    toast::{redirect_with_notice, Notice, NoticeParams, Toast},
    views::{
        level_options, render, ChatPage, DashboardPage, FormValues, LandingPage, NewSessionPage,
        SessionCard,
    },
};

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, Default)]
pub struct DashboardParams {
    pub modal: Option<String>,
    pub delete: Option<Uuid>,
    pub notice: Option<String>,
}

/// The fields of both creation forms. Missing fields arrive as empty strings.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SessionFormInput {
    pub title: String,
    pub description: String,
    pub study_level: String,
    pub learning_goals: String,
    pub learning_style: String,
    pub weaknesses: String,
    pub additional_info: String,
}

impl From<SessionFormInput> for SessionForm {
    fn from(input: SessionFormInput) -> Self {
        SessionForm {
            title: input.title,
            description: input.description,
            study_level: input.study_level,
            learning_goals: input.learning_goals,
            learning_style: input.learning_style,
            weaknesses: input.weaknesses,
            additional_info: input.additional_info,
        }
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Fetches the caller's sessions, newest first.
async fn fetch_sessions(state: &AppState, current: &CurrentUser) -> PortResult<Vec<StudySession>> {
    let mut sessions = state.sessions.list_sessions(&current.access_token).await?;
    sort_newest_first(&mut sessions);
    Ok(sessions)
}

/// Auth failures go back to sign-in; anything else is reported on the dashboard.
fn failure_redirect(e: &PortError, notice: Notice) -> Response {
    if e.is_auth() {
        return Redirect::to("/auth/sign-in").into_response();
    }
    redirect_with_notice("/dashboard", notice).into_response()
}

/// Renders the dashboard with the create dialog reopened and the user's input intact.
async fn dashboard_with_form_error(
    state: &AppState,
    current: &CurrentUser,
    form: &SessionForm,
    message: String,
) -> Response {
    let sessions = match fetch_sessions(state, current).await {
        Ok(sessions) => sessions,
        Err(e) if e.is_auth() => return Redirect::to("/auth/sign-in").into_response(),
        Err(e) => {
            error!("Error fetching data: {}", e);
            Vec::new()
        }
    };
    render(&DashboardPage {
        toast: Some(Toast::error(message)),
        email: current.user.email.clone().unwrap_or_default(),
        sessions: sessions.iter().map(SessionCard::from).collect(),
        show_new_modal: true,
        form: FormValues::from(form),
        delete_target: None,
    })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET / - Landing page. Signed-in visitors are offered the dashboard.
pub async fn landing_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<NoticeParams>,
) -> Response {
    let (email, refreshed) = match resolve_session(&state, &headers).await {
        Ok(resolved) => (
            Some(resolved.current.user.email.unwrap_or_default()),
            resolved.refreshed,
        ),
        Err(e) => {
            if !e.is_auth() {
                error!("Error fetching user: {}", e);
            }
            (None, None)
        }
    };
    let mut response = render(&LandingPage {
        toast: params.into_toast(),
        email,
    });
    store_refreshed(&mut response, refreshed.as_ref(), state.config.cookie_secure);
    response
}

/// GET /dashboard
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<DashboardParams>,
) -> Response {
    let sessions = match fetch_sessions(&state, &current).await {
        Ok(sessions) => sessions,
        Err(e) => {
            // Without a session list there is nothing to show; send the user back to sign in.
            error!("Error fetching data: {}", e);
            return Redirect::to("/auth/sign-in").into_response();
        }
    };

    let delete_target = params
        .delete
        .and_then(|id| sessions.iter().find(|s| s.id == id))
        .map(SessionCard::from);

    let toast = NoticeParams {
        notice: params.notice,
    }
    .into_toast();

    render(&DashboardPage {
        toast,
        email: current.user.email.clone().unwrap_or_default(),
        sessions: sessions.iter().map(SessionCard::from).collect(),
        show_new_modal: params.modal.as_deref() == Some("new"),
        form: FormValues::default(),
        delete_target,
    })
}

/// POST /dashboard/sessions - The dashboard dialog's create action.
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Form(input): Form<SessionFormInput>,
) -> Response {
    let form = SessionForm::from(input);

    let new_session = match form.validate(FormVariant::Modal, current.user.id) {
        Ok(new_session) => new_session,
        Err(e) => {
            info!("Rejected study session form: {}", e);
            return dashboard_with_form_error(&state, &current, &form, e.to_string()).await;
        }
    };

    match state
        .sessions
        .create_session(&current.access_token, new_session)
        .await
    {
        Ok(_) => redirect_with_notice("/dashboard", Notice::SessionCreated).into_response(),
        Err(e) if e.is_auth() => Redirect::to("/auth/sign-in").into_response(),
        Err(e) => {
            error!("Error creating session: {}", e);
            let message = match e {
                PortError::Validation(msg) => msg,
                _ => "Failed to create study session".to_string(),
            };
            dashboard_with_form_error(&state, &current, &form, message).await
        }
    }
}

/// POST /dashboard/sessions/{id}/delete - The confirmed delete action.
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(session_id): Path<Uuid>,
) -> Response {
    match state
        .sessions
        .delete_session(&current.access_token, session_id)
        .await
    {
        Ok(()) => redirect_with_notice("/dashboard", Notice::SessionDeleted).into_response(),
        Err(e) => {
            error!("Error deleting session: {}", e);
            failure_redirect(&e, Notice::DeleteFailed)
        }
    }
}

/// GET /dashboard/new-session - The standalone creation form.
pub async fn new_session_page(Query(params): Query<NoticeParams>) -> Response {
    render(&NewSessionPage {
        toast: params.into_toast(),
        form: FormValues::default(),
        levels: level_options(""),
    })
}

/// POST /dashboard/new-session
pub async fn new_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Form(input): Form<SessionFormInput>,
) -> Response {
    let form = SessionForm::from(input);
    let rerender = |message: String| {
        render(&NewSessionPage {
            toast: Some(Toast::error(message)),
            form: FormValues::from(&form),
            levels: level_options(&form.study_level),
        })
    };

    let new_session = match form.validate(FormVariant::Standalone, current.user.id) {
        Ok(new_session) => new_session,
        Err(e) => {
            info!("Rejected study session form: {}", e);
            return rerender(e.to_string());
        }
    };

    match state
        .sessions
        .create_session(&current.access_token, new_session)
        .await
    {
        Ok(_) => redirect_with_notice("/dashboard", Notice::SessionCreated).into_response(),
        Err(e) if e.is_auth() => Redirect::to("/auth/sign-in").into_response(),
        Err(e) => {
            error!("Error creating session: {}", e);
            rerender(match e {
                PortError::Validation(msg) => msg,
                _ => "Failed to create study session".to_string(),
            })
        }
    }
}

/// GET /dashboard/session/{id} - The chat page. The conversation itself runs over the socket.
pub async fn chat_page_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(session_id): Path<Uuid>,
) -> Response {
    match state
        .sessions
        .get_session(&current.access_token, session_id)
        .await
    {
        Ok(session) => render(&ChatPage {
            toast: None,
            session_id: session.id.to_string(),
            title: display_title(&session.title).to_string(),
            description: session.description,
        }),
        Err(e) if e.is_auth() => Redirect::to("/auth/sign-in").into_response(),
        Err(e) => {
            warn!("Error fetching session {}: {}", session_id, e);
            redirect_with_notice("/dashboard", Notice::SessionLoadFailed).into_response()
        }
    }
}
