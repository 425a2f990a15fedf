//! Endpoint paths and wire types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use quizgate_core::{
    AccessToken, AnswerChoice, Answers, Error, ExamResult, InvalidInputError, Question, QuestionId,
    RefreshGrant, RefreshToken, SessionId, TestId, TokenGrant,
};

// ============================================================================
// Paths
// ============================================================================

pub const LOGIN: &str = "/auth/login";
pub const SIGNUP: &str = "/auth/signup";
pub const ME: &str = "/auth/me";
pub const REFRESH: &str = "/auth/refresh";

pub fn start_session(test: &TestId) -> String {
    format!("/sessions/{}/start", test)
}

pub fn questions(test: &TestId) -> String {
    format!("/tests/{}/questions", test)
}

pub fn submit(test: &TestId) -> String {
    format!("/sessions/{}/submit", test)
}

// ============================================================================
// Identity
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `/auth/login` and `/auth/refresh` responses.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    fn split(self) -> Result<(AccessToken, Option<RefreshToken>), Error> {
        if self.access_token.trim().is_empty() {
            return Err(InvalidInputError::Payload {
                message: "empty access_token".to_string(),
            }
            .into());
        }
        let refresh = self
            .refresh_token
            .filter(|t| !t.trim().is_empty())
            .map(RefreshToken::new);
        Ok((AccessToken::new(self.access_token), refresh))
    }

    pub fn into_token_grant(self) -> Result<TokenGrant, Error> {
        let (access_token, refresh_token) = self.split()?;
        Ok(TokenGrant {
            access_token,
            refresh_token,
        })
    }

    pub fn into_refresh_grant(self) -> Result<RefreshGrant, Error> {
        let (access_token, refresh_token) = self.split()?;
        Ok(RefreshGrant {
            access_token,
            refresh_token,
        })
    }
}

// ============================================================================
// Assessment
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: SessionId,
}

/// One element of `/tests/{id}/questions`.
#[derive(Debug, Deserialize)]
pub struct QuestionRecord {
    pub id: QuestionId,
    #[serde(alias = "question", alias = "text")]
    pub ques: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub answer: Option<AnswerChoice>,
}

impl From<QuestionRecord> for Question {
    fn from(record: QuestionRecord) -> Self {
        Question::new(record.id, record.ques, record.options).with_answer_key(record.answer)
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitRequest<'a> {
    pub answers: &'a Answers,
}

/// Body of a submit response. A reply without a score is not a result.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub score: f64,
    #[serde(alias = "total")]
    pub max_score: f64,
    #[serde(default)]
    pub correct_answers: BTreeMap<QuestionId, AnswerChoice>,
}

impl From<SubmitResponse> for ExamResult {
    fn from(response: SubmitResponse) -> Self {
        ExamResult {
            score: response.score,
            max_score: response.max_score,
            correct_answers: response.correct_answers,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error body: `{"detail": "..."}` or a list of validation errors.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Validation(Vec<ValidationItem>),
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
pub struct ValidationItem {
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
}

impl ErrorDetail {
    /// Human-readable text; validation errors are joined as `field: message`.
    pub fn into_message(self) -> String {
        match self {
            ErrorDetail::Message(message) => message,
            ErrorDetail::Validation(items) => items
                .into_iter()
                .map(|item| match item.loc.last().and_then(|l| l.as_str()) {
                    Some(field) if field != "body" => format!("{}: {}", field, item.msg),
                    _ => item.msg,
                })
                .collect::<Vec<_>>()
                .join("; "),
            ErrorDetail::Other(value) => value.to_string(),
        }
    }
}
