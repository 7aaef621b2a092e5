//! HTTP layer: client, retrying request executor, and URL building

mod client;
mod retry;
mod url;

pub use client::{HttpClient, HttpError, HttpRequest, HttpResponse, Transport};
pub use retry::{
    backoff_delay, classify_status, AttemptOutcome, RequestAttempt, RequestExecutor, RetryPolicy,
};
pub use url::{is_valid_endpoint, UrlBuilder};
