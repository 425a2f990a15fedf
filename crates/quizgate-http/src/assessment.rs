//! Assessment service over HTTP.

use async_trait::async_trait;
use tracing::{debug, instrument};

use quizgate_core::{Answers, AssessmentService, ExamResult, Question, Result, SessionId, TestId};

use crate::client::ApiRequest;
use crate::endpoints::{
    self, QuestionRecord, StartSessionResponse, SubmitRequest, SubmitResponse,
};
use crate::interceptor::AuthorizedClient;

/// Exam endpoints, called through an [`AuthorizedClient`].
#[derive(Debug, Clone)]
pub struct HttpAssessment {
    client: AuthorizedClient,
}

impl HttpAssessment {
    pub fn new(client: AuthorizedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AssessmentService for HttpAssessment {
    #[instrument(skip(self, test), fields(test = %test))]
    async fn start_session(&self, test: &TestId) -> Result<SessionId> {
        let request =
            ApiRequest::post(endpoints::start_session(test)).json(&serde_json::json!({}))?;
        let response: StartSessionResponse = self.client.call(&request).await?;
        debug!(session_id = %response.session_id, "Session opened");
        Ok(response.session_id)
    }

    #[instrument(skip(self, test), fields(test = %test))]
    async fn fetch_questions(&self, test: &TestId) -> Result<Vec<Question>> {
        let records: Vec<QuestionRecord> = self
            .client
            .call(&ApiRequest::get(endpoints::questions(test)))
            .await?;
        debug!(count = records.len(), "Questions loaded");
        Ok(records.into_iter().map(Question::from).collect())
    }

    #[instrument(skip(self, test, answers), fields(test = %test, answered = answers.len()))]
    async fn submit(&self, test: &TestId, answers: &Answers) -> Result<ExamResult> {
        let request = ApiRequest::post(endpoints::submit(test)).json(&SubmitRequest { answers })?;
        let body: SubmitResponse = self.client.call(&request).await?;
        Ok(body.into())
    }
}
