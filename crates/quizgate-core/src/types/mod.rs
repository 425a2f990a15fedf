//! Core quizgate types.
//!
//! Identifiers and URLs are validated at construction time, so a value of
//! these types can be interpolated into request paths without re-checking.

mod api_url;
mod ids;
mod test_id;

pub use api_url::ApiUrl;
pub use ids::{QuestionId, SessionId};
pub use test_id::TestId;
