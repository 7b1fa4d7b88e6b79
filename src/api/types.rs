use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::source::SourceContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyOption {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub options: Vec<SurveyOption>,
}

impl Question {
    pub fn option(&self, option_id: u64) -> Option<&SurveyOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// Survey structure as served by `GET /api/surveys/{id}/structure`.
///
/// `is_active` is a strict boolean; any other encoding fails to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Survey {
    pub fn question(&self, question_id: u64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteStatus {
    Completed,
}

/// Body of `POST /api/votes`, one per answered question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePayload {
    pub survey_id: u64,
    pub question_id: u64,
    pub option_id: u64,
    #[serde(flatten)]
    pub context: SourceContext,
    pub status: VoteStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    pub vote_id: u64,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub antifraud_token: Option<String>,
}
