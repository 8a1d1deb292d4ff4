pub mod chat;
pub mod domain;
pub mod listing;
pub mod ports;
pub mod validation;

pub use chat::{ChatLog, ChatPhase, SubmitRejection};
pub use domain::{AuthTokens, ChatMessage, NewStudySession, Role, StudyLevel, StudySession, User};
pub use ports::{AuthService, PortError, PortResult, ReplyService, StudySessionRepository};
pub use validation::{FormVariant, SessionForm, ValidationError};
