//! Exam and token-grant models.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::tokens::{AccessToken, RefreshToken};
use crate::types::QuestionId;

/// Tokens issued by a successful login.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: AccessToken,
    pub refresh_token: Option<RefreshToken>,
}

/// Tokens issued by a successful refresh. The refresh token is only present
/// when the server rotates it.
#[derive(Debug, Clone)]
pub struct RefreshGrant {
    pub access_token: AccessToken,
    pub refresh_token: Option<RefreshToken>,
}

/// The option picked for a question: a position in its options, or a label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerChoice {
    Index(usize),
    Label(String),
}

impl fmt::Display for AnswerChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerChoice::Index(i) => write!(f, "{}", i),
            AnswerChoice::Label(label) => write!(f, "{}", label),
        }
    }
}

impl FromStr for AnswerChoice {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<usize>() {
            Ok(i) => AnswerChoice::Index(i),
            Err(_) => AnswerChoice::Label(s.to_string()),
        })
    }
}

impl From<usize> for AnswerChoice {
    fn from(i: usize) -> Self {
        AnswerChoice::Index(i)
    }
}

/// Recorded answers, keyed by question. Unanswered questions are absent.
pub type Answers = BTreeMap<QuestionId, AnswerChoice>;

/// A question of a test.
///
/// The correct option is held back until [`Question::reveal`] is called
/// after the attempt has been scored.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
    answer_key: Option<AnswerChoice>,
    correct_option: Option<AnswerChoice>,
}

impl Question {
    pub fn new(id: QuestionId, text: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            id,
            text: text.into(),
            options,
            answer_key: None,
            correct_option: None,
        }
    }

    /// Attach the server-provided answer, kept hidden until revealed.
    pub fn with_answer_key(mut self, answer: Option<AnswerChoice>) -> Self {
        self.answer_key = answer;
        self
    }

    /// Reveal the correct option, preferring the one reported with the result.
    pub fn reveal(&mut self, from_result: Option<&AnswerChoice>) {
        self.correct_option = from_result.cloned().or_else(|| self.answer_key.clone());
    }

    /// The correct option, once revealed.
    pub fn correct_option(&self) -> Option<&AnswerChoice> {
        self.correct_option.as_ref()
    }

    /// Returns true when `choice` can be recorded for this question.
    pub fn accepts(&self, choice: &AnswerChoice) -> bool {
        match choice {
            AnswerChoice::Index(i) => *i < self.options.len(),
            AnswerChoice::Label(label) => self.options.iter().any(|o| o == label),
        }
    }
}

/// Score returned by the assessment service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub score: f64,
    #[serde(alias = "total")]
    pub max_score: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub correct_answers: BTreeMap<QuestionId, AnswerChoice>,
}

impl ExamResult {
    /// Score as a percentage of the maximum, or `None` when there is no maximum.
    pub fn percentage(&self) -> Option<f64> {
        (self.max_score > 0.0).then(|| self.score / self.max_score * 100.0)
    }

    /// Returns true when every point was earned.
    pub fn is_perfect(&self) -> bool {
        self.max_score > 0.0 && self.score >= self.max_score
    }
}

/// Lifecycle state of an exam attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    /// Answers may be recorded; the countdown, if any, is running.
    Active,
    /// A submit is in flight.
    Submitting,
    /// The attempt was scored.
    Submitted,
    /// The attempt ended without a result (abandoned, or the login expired).
    Expired,
}

impl ExamStatus {
    /// Returns true for states no transition leaves.
    pub fn is_terminal(self) -> bool {
        matches!(self, ExamStatus::Submitted | ExamStatus::Expired)
    }
}

impl fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExamStatus::Active => "active",
            ExamStatus::Submitting => "submitting",
            ExamStatus::Submitted => "submitted",
            ExamStatus::Expired => "expired",
        };
        f.write_str(s)
    }
}
