//! quizgate-session - Credential lifecycle and timed exam sessions.
//!
//! A [`SessionContext`] owns the process's single credential: the
//! [`TokenStore`], the proactive [`RefreshScheduler`] and the
//! [`InFlightRefresh`] slot. It is created by the application root and
//! shared with the [`AuthGateway`] and with the HTTP layer.
//!
//! [`ExamSession`] runs one timed attempt on top of any
//! [`quizgate_core::AssessmentService`].

mod context;
mod exam;
mod gateway;
mod in_flight;
mod scheduler;
mod token_store;

pub use context::{SessionConfig, SessionContext};
pub use exam::{ExamSession, SubmitOutcome};
pub use gateway::{AuthGateway, RefreshOutcome};
pub use in_flight::InFlightRefresh;
pub use scheduler::RefreshScheduler;
pub use token_store::TokenStore;
