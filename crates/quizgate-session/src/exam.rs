//! Timed exam attempts.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, trace, warn};

use quizgate_core::{
    AnswerChoice, Answers, AssessmentService, ExamError, ExamResult, ExamStatus, Question,
    QuestionId, Result, SessionId, SubmissionError, TestId,
};

const TICK: Duration = Duration::from_secs(1);

/// What a call to [`ExamSession::submit`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// This call performed the submit and the attempt was scored.
    Submitted(ExamResult),
    /// The session was not `active`, so nothing was sent. Carries the
    /// status at the time of the call.
    Ignored(ExamStatus),
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Manual,
    Timer,
}

enum Tick {
    Continue,
    Stop,
    Expired,
}

/// One attempt at a test: its questions, the recorded answers, an optional
/// countdown and the result.
///
/// Cheap to clone; clones drive the same attempt. Dropping every clone stops
/// the countdown.
///
/// The status moves `active -> submitting -> submitted`. A failed submit
/// goes back to `active` with the answers intact, unless the failure was a
/// forced logout, which ends the attempt as `expired`. [`abandon`] also ends
/// it as `expired`.
///
/// [`abandon`]: ExamSession::abandon
#[derive(Clone)]
pub struct ExamSession {
    inner: Arc<ExamInner>,
}

struct ExamInner {
    test_id: TestId,
    session_id: SessionId,
    started_at: DateTime<Utc>,
    duration: Option<Duration>,
    service: Arc<dyn AssessmentService>,
    state: Mutex<ExamState>,
    status_tx: watch::Sender<ExamStatus>,
}

struct ExamState {
    status: ExamStatus,
    questions: Vec<Question>,
    answers: Answers,
    remaining: Option<u64>,
    result: Option<ExamResult>,
    last_error: Option<String>,
    countdown: Option<JoinHandle<()>>,
}

impl ExamSession {
    /// Start a server-side session for `test_id` and load its questions.
    ///
    /// With a `duration`, a countdown starts immediately and submits the
    /// recorded answers when it reaches zero.
    #[instrument(skip(service, test_id), fields(%test_id))]
    pub async fn start(
        service: Arc<dyn AssessmentService>,
        test_id: TestId,
        duration: Option<Duration>,
    ) -> Result<Self> {
        let session_id = service.start_session(&test_id).await?;
        let questions = service.fetch_questions(&test_id).await?;
        info!(%session_id, questions = questions.len(), "Exam session started");

        let (status_tx, _) = watch::channel(ExamStatus::Active);
        let session = Self {
            inner: Arc::new(ExamInner {
                test_id,
                session_id,
                started_at: Utc::now(),
                duration,
                service,
                state: Mutex::new(ExamState {
                    status: ExamStatus::Active,
                    questions,
                    answers: Answers::new(),
                    remaining: duration.map(|d| d.as_secs()),
                    result: None,
                    last_error: None,
                    countdown: None,
                }),
                status_tx,
            }),
        };

        if duration.is_some() {
            let mut state = session.inner.lock();
            session.inner.start_countdown(&mut state);
        }
        Ok(session)
    }

    pub fn test_id(&self) -> &TestId {
        &self.inner.test_id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    /// The time limit, if the attempt has one.
    pub fn duration(&self) -> Option<Duration> {
        self.inner.duration
    }

    pub fn status(&self) -> ExamStatus {
        self.inner.lock().status
    }

    /// Watch status transitions.
    pub fn subscribe(&self) -> watch::Receiver<ExamStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Time left on the countdown, if the attempt has one.
    pub fn remaining(&self) -> Option<Duration> {
        self.inner.lock().remaining.map(Duration::from_secs)
    }

    pub fn questions(&self) -> Vec<Question> {
        self.inner.lock().questions.clone()
    }

    /// Answers recorded so far.
    pub fn answers(&self) -> Answers {
        self.inner.lock().answers.clone()
    }

    /// Questions without a recorded answer, in question order.
    pub fn unanswered(&self) -> Vec<QuestionId> {
        let state = self.inner.lock();
        state
            .questions
            .iter()
            .filter(|q| !state.answers.contains_key(&q.id))
            .map(|q| q.id.clone())
            .collect()
    }

    /// The score, once submitted.
    pub fn result(&self) -> Option<ExamResult> {
        self.inner.lock().result.clone()
    }

    /// Why the most recent submit failed, including automatic ones.
    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }

    /// Record `choice` for `question`, replacing any earlier answer to it.
    pub fn select_answer(
        &self,
        question: &QuestionId,
        choice: AnswerChoice,
    ) -> std::result::Result<(), ExamError> {
        let mut state = self.inner.lock();
        if state.status != ExamStatus::Active {
            return Err(ExamError::NotActive {
                status: state.status,
            });
        }

        let q = state
            .questions
            .iter()
            .find(|q| &q.id == question)
            .ok_or_else(|| ExamError::UnknownQuestion {
                id: question.to_string(),
            })?;
        if !q.accepts(&choice) {
            let id = question.to_string();
            return Err(match choice {
                AnswerChoice::Index(index) => ExamError::OptionOutOfRange {
                    id,
                    index,
                    count: q.options.len(),
                },
                AnswerChoice::Label(label) => ExamError::UnknownOption { id, label },
            });
        }

        trace!(%question, %choice, "Answer recorded");
        state.answers.insert(question.clone(), choice);
        Ok(())
    }

    /// Submit the recorded answers.
    ///
    /// Only an `active` session submits; otherwise this returns
    /// [`SubmitOutcome::Ignored`] without a network call. When a manual
    /// submit races the countdown, whichever gets to `submitting` first
    /// sends and the other is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`quizgate_core::Error::Submission`] when the service call
    /// fails. The session is `active` again, with its answers, unless the
    /// failure requires a new login.
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        self.submit_with(Trigger::Manual).await
    }

    /// Leave the attempt without submitting.
    ///
    /// Clears questions and answers and stops the countdown. No server call
    /// is made. Returns false when the session was not `active`.
    #[instrument(skip(self), fields(test_id = %self.inner.test_id))]
    pub fn abandon(&self) -> bool {
        let mut state = self.inner.lock();
        if state.status != ExamStatus::Active {
            return false;
        }
        if let Some(countdown) = state.countdown.take() {
            countdown.abort();
        }
        state.questions.clear();
        state.answers.clear();
        state.remaining = None;
        self.inner.set_status(&mut state, ExamStatus::Expired);
        info!("Exam session abandoned");
        true
    }

    #[instrument(skip(self), fields(test_id = %self.inner.test_id))]
    async fn submit_with(&self, trigger: Trigger) -> Result<SubmitOutcome> {
        let answers = {
            let mut state = self.inner.lock();
            if state.status != ExamStatus::Active {
                debug!(status = %state.status, "Submit ignored");
                return Ok(SubmitOutcome::Ignored(state.status));
            }
            if let Some(countdown) = state.countdown.take() {
                // The timer task is the caller on an automatic submit.
                if let Trigger::Manual = trigger {
                    countdown.abort();
                }
            }
            self.inner.set_status(&mut state, ExamStatus::Submitting);
            state.answers.clone()
        };

        info!(answered = answers.len(), "Submitting answers");
        let outcome = self
            .inner
            .service
            .submit(&self.inner.test_id, &answers)
            .await;

        let mut state = self.inner.lock();
        match outcome {
            Ok(result) => {
                for question in &mut state.questions {
                    question.reveal(result.correct_answers.get(&question.id));
                }
                state.result = Some(result.clone());
                state.last_error = None;
                self.inner.set_status(&mut state, ExamStatus::Submitted);
                info!(score = result.score, max_score = result.max_score, "Answers submitted");
                Ok(SubmitOutcome::Submitted(result))
            }
            Err(e) => {
                let next = if e.requires_login() {
                    ExamStatus::Expired
                } else {
                    ExamStatus::Active
                };
                warn!(error = %e, status = %next, "Submit failed");
                state.last_error = Some(e.to_string());
                self.inner.set_status(&mut state, next);
                if next == ExamStatus::Active && state.remaining.is_some_and(|r| r > 0) {
                    self.inner.start_countdown(&mut state);
                }
                Err(SubmissionError::new(e).into())
            }
        }
    }
}

impl ExamInner {
    fn lock(&self) -> MutexGuard<'_, ExamState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, state: &mut ExamState, status: ExamStatus) {
        state.status = status;
        self.status_tx.send_replace(status);
    }

    /// One countdown step. Stops once the session leaves `active`.
    fn tick(&self) -> Tick {
        let mut state = self.lock();
        if state.status != ExamStatus::Active {
            return Tick::Stop;
        }
        let Some(remaining) = state.remaining.as_mut() else {
            return Tick::Stop;
        };
        *remaining = remaining.saturating_sub(1);
        trace!(remaining = *remaining, "Countdown tick");
        if *remaining == 0 {
            Tick::Expired
        } else {
            Tick::Continue
        }
    }

    fn start_countdown(self: &Arc<Self>, state: &mut ExamState) {
        let session: Weak<ExamInner> = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + TICK, TICK);
            loop {
                ticks.tick().await;
                let Some(inner) = session.upgrade() else {
                    return;
                };
                match inner.tick() {
                    Tick::Continue => {}
                    Tick::Stop => return,
                    Tick::Expired => {
                        info!(test_id = %inner.test_id, "Time is up, submitting answers");
                        let session = ExamSession { inner };
                        if let Err(e) = session.submit_with(Trigger::Timer).await {
                            warn!(error = %e, "Automatic submit failed");
                        }
                        return;
                    }
                }
            }
        });
        if let Some(previous) = state.countdown.replace(task) {
            previous.abort();
        }
    }
}

impl Drop for ExamInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(countdown) = state.countdown.take() {
            countdown.abort();
        }
    }
}

impl std::fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("ExamSession")
            .field("test_id", &self.inner.test_id)
            .field("session_id", &self.inner.session_id)
            .field("status", &state.status)
            .field("answered", &state.answers.len())
            .field("remaining", &state.remaining)
            .finish()
    }
}
