//! HTTP request handlers for the web server.

mod review;
mod status;
mod summarize;

pub use review::literature_review;
pub use status::{api_test, health, not_found};
pub use summarize::summarize;
