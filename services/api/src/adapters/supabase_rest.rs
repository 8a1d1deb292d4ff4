//! services/api/src/adapters/supabase_rest.rs
//!
//! This module contains the storage adapter, the concrete implementation of the
//! `StudySessionRepository` port. It talks to the hosted backend's REST interface
//! for the `study_sessions` table. Row ownership is enforced by the backend's
//! row-level policies, so every call is made with the caller's access token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use study_assistant_core::domain::{NewStudySession, StudySession};
use study_assistant_core::ports::{PortError, PortResult, StudySessionRepository};
use tracing::info;
use uuid::Uuid;

use super::supabase::{error_from_response, send, SupabaseClient};

const TABLE: &str = "study_sessions";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct SupabaseRestAdapter {
    client: SupabaseClient,
}

impl SupabaseRestAdapter {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

//=========================================================================================
// "Impure" Row Structs
//=========================================================================================

/// A row as returned by `select=*`. Text columns are nullable because the
/// standalone form never writes a title.
#[derive(Deserialize)]
struct StudySessionRecord {
    id: Uuid,
    user_id: Uuid,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    study_level: Option<String>,
    #[serde(default)]
    learning_goals: Option<String>,
    #[serde(default)]
    learning_style: Option<String>,
    #[serde(default)]
    weaknesses: Option<String>,
    #[serde(default)]
    additional_info: Option<String>,
    created_at: DateTime<Utc>,
}

impl StudySessionRecord {
    fn to_domain(self) -> StudySession {
        StudySession {
            id: self.id,
            user_id: self.user_id,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            study_level: self.study_level.unwrap_or_default(),
            learning_goals: self.learning_goals.unwrap_or_default(),
            learning_style: self.learning_style.unwrap_or_default(),
            weaknesses: self.weaknesses.unwrap_or_default(),
            additional_info: self.additional_info.unwrap_or_default(),
            created_at: self.created_at,
        }
    }
}

/// The insert payload. An empty title is left out so the column stays null.
#[derive(Serialize)]
struct NewStudySessionRecord<'a> {
    user_id: Uuid,
    #[serde(skip_serializing_if = "str::is_empty")]
    title: &'a str,
    description: &'a str,
    study_level: &'a str,
    learning_goals: &'a str,
    learning_style: &'a str,
    weaknesses: &'a str,
    additional_info: &'a str,
}

impl<'a> From<&'a NewStudySession> for NewStudySessionRecord<'a> {
    fn from(s: &'a NewStudySession) -> Self {
        Self {
            user_id: s.user_id,
            title: &s.title,
            description: &s.description,
            study_level: &s.study_level,
            learning_goals: &s.learning_goals,
            learning_style: &s.learning_style,
            weaknesses: &s.weaknesses,
            additional_info: &s.additional_info,
        }
    }
}

async fn parse_rows(response: reqwest::Response) -> PortResult<Vec<StudySession>> {
    let records: Vec<StudySessionRecord> = response
        .json()
        .await
        .map_err(|e| PortError::Unexpected(format!("Failed to parse study sessions: {}", e)))?;
    Ok(records.into_iter().map(|r| r.to_domain()).collect())
}

//=========================================================================================
// `StudySessionRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl StudySessionRepository for SupabaseRestAdapter {
    async fn list_sessions(&self, access_token: &str) -> PortResult<Vec<StudySession>> {
        let request = self
            .client
            .get(self.client.rest_url(TABLE))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .bearer_auth(access_token);
        let response = send(request, "list study sessions").await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "list study sessions").await);
        }
        parse_rows(response).await
    }

    async fn get_session(&self, access_token: &str, session_id: Uuid) -> PortResult<StudySession> {
        let id_filter = format!("eq.{}", session_id);
        let request = self
            .client
            .get(self.client.rest_url(TABLE))
            .query(&[("select", "*"), ("id", id_filter.as_str())])
            .bearer_auth(access_token);
        let response = send(request, "load study session").await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "load study session").await);
        }
        parse_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PortError::NotFound(format!("Study session {} not found", session_id)))
    }

    async fn create_session(
        &self,
        access_token: &str,
        session: NewStudySession,
    ) -> PortResult<StudySession> {
        let request = self
            .client
            .post(self.client.rest_url(TABLE))
            .header("Prefer", "return=representation")
            .bearer_auth(access_token)
            .json(&NewStudySessionRecord::from(&session));
        let response = send(request, "create study session").await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "create study session").await);
        }
        let created = parse_rows(response).await?.into_iter().next().ok_or_else(|| {
            PortError::Unexpected("Insert returned no study session".to_string())
        })?;
        info!("Created study session {} for user {}.", created.id, created.user_id);
        Ok(created)
    }

    async fn delete_session(&self, access_token: &str, session_id: Uuid) -> PortResult<()> {
        let id_filter = format!("eq.{}", session_id);
        let request = self
            .client
            .delete(self.client.rest_url(TABLE))
            .query(&[("id", id_filter.as_str())])
            .bearer_auth(access_token);
        let response = send(request, "delete study session").await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "delete study session").await);
        }
        info!("Deleted study session {}.", session_id);
        Ok(())
    }
}
