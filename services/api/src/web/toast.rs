//! services/api/src/web/toast.rs
//!
//! One-shot notifications. Pages rendered in place carry a `Toast` directly.
//! A redirect carries only a `Notice` key in its query string, and the next page
//! turns the key back into its fixed text, so a link can never inject wording.

use axum::response::Redirect;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Error,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Info,
        }
    }

    /// CSS class for the template.
    pub fn css_class(&self) -> &'static str {
        self.kind.as_str()
    }
}

//=========================================================================================
// Notices (Toasts That Survive a Redirect)
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    SessionCreated,
    SessionDeleted,
    DeleteFailed,
    SessionLoadFailed,
    ConfirmEmail,
    SignInFailed,
    SignOutFailed,
}

impl Notice {
    const ALL: [Notice; 7] = [
        Notice::SessionCreated,
        Notice::SessionDeleted,
        Notice::DeleteFailed,
        Notice::SessionLoadFailed,
        Notice::ConfirmEmail,
        Notice::SignInFailed,
        Notice::SignOutFailed,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Notice::SessionCreated => "session_created",
            Notice::SessionDeleted => "session_deleted",
            Notice::DeleteFailed => "delete_failed",
            Notice::SessionLoadFailed => "session_load_failed",
            Notice::ConfirmEmail => "confirm_email",
            Notice::SignInFailed => "sign_in_failed",
            Notice::SignOutFailed => "sign_out_failed",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.key() == key)
    }

    pub fn toast(self) -> Toast {
        match self {
            Notice::SessionCreated => Toast::success("Study session created successfully!"),
            Notice::SessionDeleted => Toast::success("Study session deleted successfully!"),
            Notice::DeleteFailed => Toast::error("Failed to delete study session"),
            Notice::SessionLoadFailed => Toast::error("Failed to load study session"),
            Notice::ConfirmEmail => {
                Toast::info("Check your email to confirm your account, then sign in.")
            }
            Notice::SignInFailed => Toast::error("An unexpected error occurred"),
            Notice::SignOutFailed => Toast::error("Failed to sign out. Please try again."),
        }
    }
}

/// `?notice=...` as received by page handlers. Unknown keys render nothing.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeParams {
    pub notice: Option<String>,
}

impl NoticeParams {
    pub fn into_toast(self) -> Option<Toast> {
        self.notice
            .as_deref()
            .and_then(Notice::from_key)
            .map(Notice::toast)
    }
}

/// A 303 to `path` that shows `notice` on arrival.
pub fn redirect_with_notice(path: &str, notice: Notice) -> Redirect {
    let separator = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!("{}{}notice={}", path, separator, notice.key()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use axum::response::IntoResponse;

    #[test]
    fn every_notice_key_maps_back_to_itself() {
        for notice in Notice::ALL {
            assert_eq!(Notice::from_key(notice.key()), Some(notice));
        }
    }

    #[test]
    fn known_key_renders_its_fixed_text() {
        let params = NoticeParams {
            notice: Some("session_load_failed".to_string()),
        };
        assert_eq!(
            params.into_toast(),
            Some(Toast::error("Failed to load study session"))
        );
    }

    #[test]
    fn free_text_and_missing_notices_render_nothing() {
        assert_eq!(NoticeParams::default().into_toast(), None);
        let params = NoticeParams {
            notice: Some("Your account is locked. Call 555-0100.".to_string()),
        };
        assert_eq!(params.into_toast(), None);
    }

    #[test]
    fn redirect_appends_to_existing_query() {
        let response =
            redirect_with_notice("/dashboard?modal=new", Notice::SessionCreated).into_response();
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert_eq!(location, "/dashboard?modal=new&notice=session_created");
    }
}
