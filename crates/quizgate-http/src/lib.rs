//! quizgate-http - reqwest implementation of the quizgate services.
//!
//! [`HttpIdentity`] talks to the identity endpoints under `/auth`.
//! [`AuthorizedClient`] wraps every other call: it attaches the current
//! access token, and on a 401 joins the single-flight refresh and retries the
//! call once. [`HttpAssessment`] runs exam calls through it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use quizgate_core::{ApiUrl, LoginCredentials, TestId};
//! use quizgate_http::{ApiClient, AuthorizedClient, ClientConfig, HttpAssessment, HttpIdentity};
//! use quizgate_session::{AuthGateway, ExamSession, SessionContext};
//!
//! # async fn example() -> Result<(), quizgate_core::Error> {
//! let config = ClientConfig::new(ApiUrl::new("https://quiz.example.com/api/")?);
//! let client = ApiClient::new(&config)?;
//!
//! let ctx = Arc::new(SessionContext::in_memory());
//! let gateway = AuthGateway::new(ctx, Arc::new(HttpIdentity::new(client.clone())));
//! gateway.login(&LoginCredentials::new("ada@example.com", "hunter22")).await?;
//!
//! let assessment = HttpAssessment::new(AuthorizedClient::new(client, gateway));
//! let session = ExamSession::start(Arc::new(assessment), TestId::new("7")?, None).await?;
//! println!("{} questions", session.questions().len());
//! # Ok(())
//! # }
//! ```

mod assessment;
mod client;
mod config;
mod endpoints;
mod identity;
mod interceptor;

pub use assessment::HttpAssessment;
pub use client::{ApiClient, ApiRequest};
pub use config::ClientConfig;
pub use identity::HttpIdentity;
pub use interceptor::AuthorizedClient;
