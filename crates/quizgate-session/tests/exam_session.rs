//! Exam session state machine: countdown, submission races and failures.

mod common;

use std::sync::Arc;
use std::time::Duration;

use quizgate_core::{AnswerChoice, Error, ExamError, ExamStatus, QuestionId, TestId};
use quizgate_session::{ExamSession, SubmitOutcome};

use common::{FakeAssessment, SubmitFailure};

async fn start(fake: &Arc<FakeAssessment>, duration: Option<Duration>) -> ExamSession {
    ExamSession::start(fake.clone(), TestId::from(7u64), duration)
        .await
        .unwrap()
}

fn q(n: u64) -> QuestionId {
    QuestionId::from(n)
}

#[tokio::test(start_paused = true)]
async fn countdown_auto_submits_empty_answers_once() {
    let fake = Arc::new(FakeAssessment::new());
    let session = start(&fake, Some(Duration::from_secs(5))).await;
    assert_eq!(session.status(), ExamStatus::Active);
    assert_eq!(session.session_id().as_str(), "session-7");
    assert_eq!(session.questions().len(), 3);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(session.remaining(), Some(Duration::from_secs(3)));
    assert_eq!(fake.submits(), 0);

    tokio::time::sleep(Duration::from_millis(2600)).await;
    assert_eq!(fake.submits(), 1);
    assert!(fake.last_submitted().unwrap().is_empty());
    assert_eq!(session.status(), ExamStatus::Submitted);
    assert_eq!(session.remaining(), Some(Duration::ZERO));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(fake.submits(), 1);
}

#[tokio::test(start_paused = true)]
async fn countdown_submits_recorded_answers() {
    let fake = Arc::new(FakeAssessment::new());
    let session = start(&fake, Some(Duration::from_secs(3))).await;
    session.select_answer(&q(2), AnswerChoice::Index(1)).unwrap();

    tokio::time::sleep(Duration::from_millis(3100)).await;
    let sent = fake.last_submitted().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent.get(&q(2)), Some(&AnswerChoice::Index(1)));
    assert!(!sent.contains_key(&q(1)));

    let result = session.result().unwrap();
    assert_eq!(result.score, 1.0);
    assert_eq!(result.max_score, 3.0);
}

#[tokio::test]
async fn untimed_session_has_no_countdown() {
    let fake = Arc::new(FakeAssessment::new());
    let session = start(&fake, None).await;
    assert_eq!(session.remaining(), None);
    assert_eq!(session.duration(), None);
}

#[tokio::test]
async fn select_answer_overwrites_only_that_question() {
    let fake = Arc::new(FakeAssessment::new());
    let session = start(&fake, None).await;

    session.select_answer(&q(2), AnswerChoice::Index(1)).unwrap();
    session.select_answer(&q(1), AnswerChoice::Index(2)).unwrap();
    session.select_answer(&q(1), AnswerChoice::Index(0)).unwrap();

    let answers = session.answers();
    assert_eq!(answers.get(&q(1)), Some(&AnswerChoice::Index(0)));
    assert_eq!(answers.get(&q(2)), Some(&AnswerChoice::Index(1)));
    assert_eq!(session.unanswered(), vec![q(3)]);
}

#[tokio::test]
async fn select_answer_rejects_unknown_question_and_option() {
    let fake = Arc::new(FakeAssessment::new());
    let session = start(&fake, None).await;

    assert_eq!(
        session.select_answer(&q(99), AnswerChoice::Index(0)),
        Err(ExamError::UnknownQuestion { id: "99".into() })
    );
    assert_eq!(
        session.select_answer(&q(1), AnswerChoice::Index(3)),
        Err(ExamError::OptionOutOfRange {
            id: "1".into(),
            index: 3,
            count: 3
        })
    );
    assert_eq!(
        session.select_answer(&q(1), AnswerChoice::Label("z".into())),
        Err(ExamError::UnknownOption {
            id: "1".into(),
            label: "z".into()
        })
    );
    assert!(session.answers().is_empty());

    session
        .select_answer(&q(1), AnswerChoice::Label("b".into()))
        .unwrap();
}

#[tokio::test]
async fn answers_are_frozen_after_submit() {
    let fake = Arc::new(FakeAssessment::new());
    let session = start(&fake, None).await;
    session.select_answer(&q(1), AnswerChoice::Index(1)).unwrap();
    session.submit().await.unwrap();

    assert_eq!(
        session.select_answer(&q(1), AnswerChoice::Index(0)),
        Err(ExamError::NotActive {
            status: ExamStatus::Submitted
        })
    );
    assert_eq!(session.answers().get(&q(1)), Some(&AnswerChoice::Index(1)));
}

#[tokio::test]
async fn submit_reveals_correct_options() {
    let fake = Arc::new(FakeAssessment::new());
    let session = start(&fake, None).await;
    assert!(session.questions().iter().all(|q| q.correct_option().is_none()));

    session.select_answer(&q(1), AnswerChoice::Index(1)).unwrap();
    session.select_answer(&q(2), AnswerChoice::Index(0)).unwrap();
    let SubmitOutcome::Submitted(result) = session.submit().await.unwrap() else {
        panic!("first submit should send");
    };
    assert_eq!(result.score, 1.0);
    assert!(
        session
            .questions()
            .iter()
            .all(|q| q.correct_option() == Some(&AnswerChoice::Index(1)))
    );
}

#[tokio::test(start_paused = true)]
async fn racing_submits_send_once() {
    let fake = Arc::new(FakeAssessment::new().with_submit_delay(Duration::from_millis(200)));
    let session = start(&fake, None).await;

    let (first, second) = tokio::join!(session.submit(), session.submit());
    let outcomes = [first.unwrap(), second.unwrap()];

    assert_eq!(fake.submits(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, SubmitOutcome::Submitted(_)))
            .count(),
        1
    );
    assert!(
        outcomes
            .iter()
            .any(|o| *o == SubmitOutcome::Ignored(ExamStatus::Submitting))
    );
    assert_eq!(session.status(), ExamStatus::Submitted);
}

#[tokio::test(start_paused = true)]
async fn manual_submit_after_timer_fired_is_ignored() {
    let fake = Arc::new(FakeAssessment::new().with_submit_delay(Duration::from_millis(500)));
    let session = start(&fake, Some(Duration::from_secs(1))).await;

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(session.status(), ExamStatus::Submitting);

    let outcome = session.submit().await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Ignored(ExamStatus::Submitting));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(fake.submits(), 1);
    assert_eq!(session.status(), ExamStatus::Submitted);
}

#[tokio::test(start_paused = true)]
async fn manual_submit_stops_the_countdown() {
    let fake = Arc::new(FakeAssessment::new());
    let session = start(&fake, Some(Duration::from_secs(5))).await;

    tokio::time::sleep(Duration::from_millis(1500)).await;
    session.submit().await.unwrap();
    let left = session.remaining();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(fake.submits(), 1);
    assert_eq!(session.remaining(), left);
    assert_eq!(left, Some(Duration::from_secs(4)));
}

#[tokio::test]
async fn failed_submit_returns_to_active_with_answers() {
    let fake = Arc::new(FakeAssessment::new());
    let session = start(&fake, None).await;
    session.select_answer(&q(1), AnswerChoice::Index(1)).unwrap();
    fake.fail_next_submit(SubmitFailure::Unavailable);

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, Error::Submission(_)));
    assert_eq!(err.status(), Some(503));
    assert!(!err.requires_login());
    assert_eq!(session.status(), ExamStatus::Active);
    assert_eq!(session.answers().get(&q(1)), Some(&AnswerChoice::Index(1)));
    assert!(session.last_error().unwrap().contains("503"));

    // The user can still change answers and try again.
    session.select_answer(&q(2), AnswerChoice::Index(1)).unwrap();
    assert!(matches!(
        session.submit().await.unwrap(),
        SubmitOutcome::Submitted(_)
    ));
    assert_eq!(fake.submits(), 2);
    assert_eq!(fake.last_submitted().unwrap().len(), 2);
    assert!(session.last_error().is_none());
}

#[tokio::test]
async fn network_failure_is_retryable() {
    let fake = Arc::new(FakeAssessment::new());
    let session = start(&fake, None).await;
    fake.fail_next_submit(SubmitFailure::Network);

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, Error::Submission(_)));
    assert_eq!(session.status(), ExamStatus::Active);
}

#[tokio::test]
async fn forced_logout_during_submit_expires_the_session() {
    let fake = Arc::new(FakeAssessment::new());
    let session = start(&fake, None).await;
    session.select_answer(&q(3), AnswerChoice::Index(2)).unwrap();
    fake.fail_next_submit(SubmitFailure::SessionExpired);

    let err = session.submit().await.unwrap_err();
    assert!(err.requires_login());
    assert_eq!(session.status(), ExamStatus::Expired);
    assert_eq!(session.answers().len(), 1);

    assert_eq!(
        session.submit().await.unwrap(),
        SubmitOutcome::Ignored(ExamStatus::Expired)
    );
    assert_eq!(fake.submits(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_auto_submit_waits_for_manual_retry() {
    let fake = Arc::new(FakeAssessment::new());
    let session = start(&fake, Some(Duration::from_secs(2))).await;
    fake.fail_next_submit(SubmitFailure::Unavailable);

    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(fake.submits(), 1);
    assert_eq!(session.status(), ExamStatus::Active);
    assert_eq!(session.remaining(), Some(Duration::ZERO));
    assert!(session.last_error().is_some());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(fake.submits(), 1);

    assert!(matches!(
        session.submit().await.unwrap(),
        SubmitOutcome::Submitted(_)
    ));
    assert_eq!(fake.submits(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_manual_submit_resumes_countdown() {
    let fake = Arc::new(FakeAssessment::new());
    let session = start(&fake, Some(Duration::from_secs(3))).await;
    fake.fail_next_submit(SubmitFailure::Unavailable);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    session.submit().await.unwrap_err();
    assert_eq!(session.remaining(), Some(Duration::from_secs(2)));

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(fake.submits(), 2);
    assert_eq!(session.status(), ExamStatus::Submitted);
}

#[tokio::test(start_paused = true)]
async fn abandon_clears_state_and_stops_countdown() {
    let fake = Arc::new(FakeAssessment::new());
    let session = start(&fake, Some(Duration::from_secs(3))).await;
    session.select_answer(&q(1), AnswerChoice::Index(1)).unwrap();

    assert!(session.abandon());
    assert_eq!(session.status(), ExamStatus::Expired);
    assert!(session.answers().is_empty());
    assert!(session.questions().is_empty());
    assert!(!session.abandon());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(fake.submits(), 0);
    assert_eq!(
        session.submit().await.unwrap(),
        SubmitOutcome::Ignored(ExamStatus::Expired)
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_the_session_stops_countdown() {
    let fake = Arc::new(FakeAssessment::new());
    let session = start(&fake, Some(Duration::from_secs(2))).await;
    drop(session);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(fake.submits(), 0);
}

#[tokio::test(start_paused = true)]
async fn status_changes_are_observable() {
    let fake = Arc::new(FakeAssessment::new().with_submit_delay(Duration::from_millis(100)));
    let session = start(&fake, None).await;
    let mut status = session.subscribe();
    assert_eq!(*status.borrow(), ExamStatus::Active);

    let submitting = {
        let session = session.clone();
        tokio::spawn(async move { session.submit().await })
    };

    status.changed().await.unwrap();
    assert_eq!(*status.borrow_and_update(), ExamStatus::Submitting);
    status.changed().await.unwrap();
    assert_eq!(*status.borrow_and_update(), ExamStatus::Submitted);

    submitting.await.unwrap().unwrap();
}
