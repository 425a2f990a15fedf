//! In-process fakes of the identity and assessment services.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;

use quizgate_core::{
    AccessToken, AnswerChoice, Answers, AssessmentService, AuthError, CredentialError, Error,
    ExamResult, IdentityService, LoginCredentials, ProtocolError, Question, QuestionId,
    RefreshGrant, RefreshToken, Result, SessionId, SignupDetails, TestId, TokenGrant,
    TransportError, UserProfile,
};

static TOKEN_SERIAL: AtomicUsize = AtomicUsize::new(0);

/// An unsigned JWT whose `exp` is `secs` from now. Every call yields a
/// distinct token.
pub fn jwt_expiring_in(secs: i64) -> String {
    let exp = Utc::now().timestamp() + secs;
    let serial = TOKEN_SERIAL.fetch_add(1, Ordering::SeqCst);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp},"jti":{serial}}}"#));
    format!("e30.{payload}.c2ln")
}

pub fn user(name: &str) -> UserProfile {
    UserProfile {
        id: serde_json::json!(42),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        role: Some("student".to_string()),
    }
}

fn unauthorized() -> Error {
    ProtocolError::new(401, Some("Token expired".to_string())).into()
}

#[derive(Default)]
pub struct FakeIdentity {
    pub login_calls: AtomicUsize,
    pub signup_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    token_ttl_secs: Mutex<i64>,
    refresh_delay: Mutex<Duration>,
    refresh_fails: AtomicBool,
    me_rejections: AtomicUsize,
    no_refresh_token: AtomicBool,
    profile_name: Mutex<String>,
}

impl FakeIdentity {
    pub fn new() -> Self {
        let fake = Self::default();
        *fake.token_ttl_secs.lock().unwrap() = 600;
        *fake.profile_name.lock().unwrap() = "Ada".to_string();
        fake
    }

    pub fn with_token_ttl(self, secs: i64) -> Self {
        *self.token_ttl_secs.lock().unwrap() = secs;
        self
    }

    pub fn with_refresh_delay(self, delay: Duration) -> Self {
        *self.refresh_delay.lock().unwrap() = delay;
        self
    }

    pub fn without_refresh_token(self) -> Self {
        self.no_refresh_token.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_refresh(&self, fail: bool) {
        self.refresh_fails.store(fail, Ordering::SeqCst);
    }

    /// Reject every profile request with a 401, or stop rejecting.
    pub fn reject_me(&self, reject: bool) {
        let times = if reject { usize::MAX } else { 0 };
        self.me_rejections.store(times, Ordering::SeqCst);
    }

    /// Reject only the next `times` profile requests.
    pub fn reject_me_times(&self, times: usize) {
        self.me_rejections.store(times, Ordering::SeqCst);
    }

    pub fn rename_profile(&self, name: &str) {
        *self.profile_name.lock().unwrap() = name.to_string();
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn access_token(&self) -> AccessToken {
        AccessToken::new(jwt_expiring_in(*self.token_ttl_secs.lock().unwrap()))
    }
}

#[async_trait]
impl IdentityService for FakeIdentity {
    async fn login(&self, credentials: &LoginCredentials) -> Result<TokenGrant> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if credentials.password() == "wrong" {
            return Err(CredentialError::Rejected {
                status: 401,
                detail: "Invalid credentials".to_string(),
            }
            .into());
        }
        let refresh_token = (!self.no_refresh_token.load(Ordering::SeqCst))
            .then(|| RefreshToken::new("refresh-1"));
        Ok(TokenGrant {
            access_token: self.access_token(),
            refresh_token,
        })
    }

    async fn signup(&self, details: &SignupDetails) -> Result<()> {
        self.signup_calls.fetch_add(1, Ordering::SeqCst);
        if details.credentials().email().starts_with("taken") {
            return Err(CredentialError::Rejected {
                status: 409,
                detail: "Email already registered".to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn me(&self, _token: &AccessToken) -> Result<UserProfile> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        let rejected = self
            .me_rejections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                usize::MAX => Some(usize::MAX),
                n => Some(n - 1),
            })
            .is_ok();
        if rejected {
            return Err(unauthorized());
        }
        Ok(user(&self.profile_name.lock().unwrap()))
    }

    async fn refresh(&self, _token: &RefreshToken) -> Result<RefreshGrant> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.refresh_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.refresh_fails.load(Ordering::SeqCst) {
            return Err(unauthorized());
        }
        Ok(RefreshGrant {
            access_token: self.access_token(),
            refresh_token: None,
        })
    }
}

/// How the next submit should fail.
#[derive(Debug, Clone, Copy)]
pub enum SubmitFailure {
    Unavailable,
    Network,
    SessionExpired,
}

#[derive(Default)]
pub struct FakeAssessment {
    pub submit_calls: AtomicUsize,
    pub submitted: Mutex<Vec<Answers>>,
    submit_delay: Mutex<Duration>,
    failures: Mutex<VecDeque<SubmitFailure>>,
    questions: Vec<Question>,
}

impl FakeAssessment {
    /// Three questions with ids 1..=3, three options each. The answer key
    /// for every question is option 1.
    pub fn new() -> Self {
        let questions = (1..=3u64)
            .map(|n| {
                Question::new(
                    QuestionId::from(n),
                    format!("Question {n}"),
                    vec!["a".into(), "b".into(), "c".into()],
                )
                .with_answer_key(Some(AnswerChoice::Index(1)))
            })
            .collect();
        Self {
            questions,
            ..Self::default()
        }
    }

    pub fn with_submit_delay(self, delay: Duration) -> Self {
        *self.submit_delay.lock().unwrap() = delay;
        self
    }

    pub fn fail_next_submit(&self, failure: SubmitFailure) {
        self.failures.lock().unwrap().push_back(failure);
    }

    pub fn submits(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn last_submitted(&self) -> Option<Answers> {
        self.submitted.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AssessmentService for FakeAssessment {
    async fn start_session(&self, test_id: &TestId) -> Result<SessionId> {
        Ok(SessionId::new(format!("session-{test_id}")))
    }

    async fn fetch_questions(&self, _test_id: &TestId) -> Result<Vec<Question>> {
        Ok(self.questions.clone())
    }

    async fn submit(&self, _test_id: &TestId, answers: &Answers) -> Result<ExamResult> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(answers.clone());

        let delay = *self.submit_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.lock().unwrap().pop_front();
        match failure {
            Some(SubmitFailure::Unavailable) => {
                Err(ProtocolError::new(503, Some("Service unavailable".to_string())).into())
            }
            Some(SubmitFailure::Network) => Err(TransportError::Connection {
                message: "connection reset".to_string(),
            }
            .into()),
            Some(SubmitFailure::SessionExpired) => {
                Err(AuthError::SessionExpired(ProtocolError::new(401, None)).into())
            }
            None => {
                let score = answers
                    .values()
                    .filter(|choice| **choice == AnswerChoice::Index(1))
                    .count();
                let correct_answers: BTreeMap<_, _> = self
                    .questions
                    .iter()
                    .map(|q| (q.id.clone(), AnswerChoice::Index(1)))
                    .collect();
                Ok(ExamResult {
                    score: score as f64,
                    max_score: self.questions.len() as f64,
                    correct_answers,
                })
            }
        }
    }
}

pub fn identity(fake: FakeIdentity) -> Arc<FakeIdentity> {
    Arc::new(fake)
}
