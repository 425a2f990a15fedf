//! Assessment service trait.

use async_trait::async_trait;

use crate::models::{Answers, ExamResult, Question};
use crate::types::{SessionId, TestId};
use crate::Result;

/// The assessment service that runs and scores attempts.
///
/// Scoring is opaque: the client only sends answers and displays what comes
/// back.
#[async_trait]
pub trait AssessmentService: Send + Sync {
    /// Open a server-side session for a test.
    async fn start_session(&self, test: &TestId) -> Result<SessionId>;

    /// Fetch the ordered questions of a test.
    async fn fetch_questions(&self, test: &TestId) -> Result<Vec<Question>>;

    /// Submit the recorded answers and receive the score.
    async fn submit(&self, test: &TestId, answers: &Answers) -> Result<ExamResult>;
}
