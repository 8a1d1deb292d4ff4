//! crates/study_assistant_core/src/validation.rs
//!
//! Input checks for the two study-session creation forms. Everything here runs
//! before any network call is made.

use uuid::Uuid;

use crate::domain::{NewStudySession, StudyLevel};

pub const MAX_TITLE_CHARS: usize = 30;

/// Which creation form the input came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormVariant {
    /// The dashboard dialog. Title is required.
    Modal,
    /// The `/dashboard/new-session` page. No title field, fixed study levels.
    Standalone,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please provide a title for your study session")]
    MissingTitle,
    #[error("Title must be 30 characters or less")]
    TitleTooLong,
    #[error("Please provide a description of what you're studying for")]
    MissingDescription,
    #[error("Please choose a valid level of study")]
    InvalidStudyLevel(String),
}

/// Raw form state, exactly as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionForm {
    pub title: String,
    pub description: String,
    pub study_level: String,
    pub learning_goals: String,
    pub learning_style: String,
    pub weaknesses: String,
    pub additional_info: String,
}

impl SessionForm {
    /// Checks the form and, on success, produces the record to insert for `user_id`.
    ///
    /// Checks run in form order and the first failure wins. Values are kept
    /// untrimmed; trimming only decides emptiness.
    pub fn validate(
        &self,
        variant: FormVariant,
        user_id: Uuid,
    ) -> Result<NewStudySession, ValidationError> {
        if variant == FormVariant::Modal && self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if self.title.chars().count() > MAX_TITLE_CHARS {
            return Err(ValidationError::TitleTooLong);
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::MissingDescription);
        }
        if variant == FormVariant::Standalone && !self.study_level.is_empty() {
            self.study_level
                .parse::<StudyLevel>()
                .map_err(|_| ValidationError::InvalidStudyLevel(self.study_level.clone()))?;
        }

        Ok(NewStudySession {
            user_id,
            title: self.title.clone(),
            description: self.description.clone(),
            study_level: self.study_level.clone(),
            learning_goals: self.learning_goals.clone(),
            learning_style: self.learning_style.clone(),
            weaknesses: self.weaknesses.clone(),
            additional_info: self.additional_info.clone(),
        })
    }
}
