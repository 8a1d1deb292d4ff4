//! services/api/src/web/views.rs
//!
//! Askama page templates and the small view models they render.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use study_assistant_core::domain::{display_title, StudyLevel, StudySession};
use study_assistant_core::validation::SessionForm;
use tracing::error;

use crate::web::toast::Toast;

/// Renders a page, turning template failures into a bare 500.
pub fn render<T: Template>(page: &T) -> Response {
    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

// -- View models --

/// One study session as shown on the dashboard.
pub struct SessionCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub learning_goals: String,
    pub created_date: String,
    pub created_time: String,
}

impl From<&StudySession> for SessionCard {
    fn from(s: &StudySession) -> Self {
        Self {
            id: s.id.to_string(),
            title: display_title(&s.title).to_string(),
            description: s.description.clone(),
            learning_goals: s.learning_goals.clone(),
            created_date: s.created_at.format("%b %-d, %Y").to_string(),
            created_time: s.created_at.format("%-I:%M %p").to_string(),
        }
    }
}

/// Form field values echoed back into the inputs.
#[derive(Default)]
pub struct FormValues {
    pub title: String,
    pub description: String,
    pub study_level: String,
    pub learning_goals: String,
    pub learning_style: String,
    pub weaknesses: String,
    pub additional_info: String,
}

impl From<&SessionForm> for FormValues {
    fn from(f: &SessionForm) -> Self {
        Self {
            title: f.title.clone(),
            description: f.description.clone(),
            study_level: f.study_level.clone(),
            learning_goals: f.learning_goals.clone(),
            learning_style: f.learning_style.clone(),
            weaknesses: f.weaknesses.clone(),
            additional_info: f.additional_info.clone(),
        }
    }
}

pub struct LevelOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

pub fn level_options(selected: &str) -> Vec<LevelOption> {
    StudyLevel::ALL
        .iter()
        .map(|level| LevelOption {
            value: level.as_str(),
            label: level.label(),
            selected: level.as_str() == selected,
        })
        .collect()
}

// -- Templates --

#[derive(Template)]
#[template(path = "landing.html")]
pub struct LandingPage {
    pub toast: Option<Toast>,
    pub email: Option<String>,
}

#[derive(Template)]
#[template(path = "sign_in.html")]
pub struct SignInPage {
    pub toast: Option<Toast>,
    pub error: Option<String>,
    pub email: String,
    /// The provider offered by the "Continue with" button.
    pub oauth_provider: String,
}

#[derive(Template)]
#[template(path = "sign_up.html")]
pub struct SignUpPage {
    pub toast: Option<Toast>,
    pub error: Option<String>,
    pub email: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub toast: Option<Toast>,
    pub email: String,
    pub sessions: Vec<SessionCard>,
    pub show_new_modal: bool,
    pub form: FormValues,
    pub delete_target: Option<SessionCard>,
}

#[derive(Template)]
#[template(path = "new_session.html")]
pub struct NewSessionPage {
    pub toast: Option<Toast>,
    pub form: FormValues,
    pub levels: Vec<LevelOption>,
}

#[derive(Template)]
#[template(path = "chat.html")]
pub struct ChatPage {
    pub toast: Option<Toast>,
    pub session_id: String,
    pub title: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn card_formats_creation_date_and_time() {
        let session = StudySession {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            title: String::new(),
            description: "Midterm".to_string(),
            study_level: String::new(),
            learning_goals: String::new(),
            learning_style: String::new(),
            weaknesses: String::new(),
            additional_info: String::new(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 7, 15, 5, 0).unwrap(),
        };
        let card = SessionCard::from(&session);
        assert_eq!(card.title, "Untitled session");
        assert_eq!(card.created_date, "Mar 7, 2024");
        assert_eq!(card.created_time, "3:05 PM");
    }

    #[test]
    fn level_options_mark_the_selected_value() {
        let options = level_options("graduate");
        assert_eq!(options.len(), 4);
        assert!(options.iter().filter(|o| o.selected).all(|o| o.value == "graduate"));
        assert_eq!(options.iter().filter(|o| o.selected).count(), 1);
    }

    #[test]
    fn toast_is_escaped_in_rendered_pages() {
        let page = LandingPage {
            toast: Some(Toast::error("<script>alert(1)</script>")),
            email: None,
        };
        let html = page.render().unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&#60;script&#62;") || html.contains("&lt;script&gt;"));
    }
}
