//! Retrying request execution
//!
//! Wraps a single logical HTTP request with bounded automatic retry,
//! classifying transient failure classes into a backoff decision.

use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::client::{HttpError, HttpRequest, HttpResponse, Transport};

/// Retry policy for one logical request.
///
/// Retries are reserved for transient conditions (rate limiting, server
/// errors, network blips); client errors are never retried so real defects
/// are not masked as flakiness.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Additional attempts after the first (total attempts = retries + 1)
    pub retries: u32,

    /// Base delay between attempts
    pub retry_delay: Duration,

    /// Acceptable status codes; `None` means the 2xx family
    pub expected_statuses: Option<Vec<u16>>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_delay: Duration::from_millis(1000),
            expected_statuses: None,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn expect_statuses(mut self, statuses: Vec<u16>) -> Self {
        self.expected_statuses = Some(statuses);
        self
    }

    /// Check whether a status code satisfies the caller's expectation
    pub fn is_expected(&self, status: u16) -> bool {
        match &self.expected_statuses {
            Some(statuses) => statuses.contains(&status),
            None => (200..300).contains(&status),
        }
    }
}

/// Classification of one request attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Status matched the caller's expectation
    Success,
    /// 429 — retried with exponential backoff
    RateLimited,
    /// 5xx — retried with linear backoff
    ServerError,
    /// Network-level failure (timeout, connection reset) — retried once the
    /// fixed delay elapses
    Timeout,
    /// Unexpected non-retryable status — returned to the caller as-is
    ClientError,
}

impl AttemptOutcome {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AttemptOutcome::RateLimited | AttemptOutcome::ServerError | AttemptOutcome::Timeout
        )
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Success => write!(f, "success"),
            AttemptOutcome::RateLimited => write!(f, "rate-limited"),
            AttemptOutcome::ServerError => write!(f, "server-error"),
            AttemptOutcome::Timeout => write!(f, "timeout"),
            AttemptOutcome::ClientError => write!(f, "client-error"),
        }
    }
}

/// One attempt within a retry sequence. `attempt_number` is 1-based and
/// never exceeds `retries + 1`.
#[derive(Clone, Debug)]
pub struct RequestAttempt {
    pub attempt_number: u32,
    pub status_code: Option<u16>,
    pub outcome: AttemptOutcome,
}

impl fmt::Display for RequestAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(
                f,
                "attempt {} -> {} ({})",
                self.attempt_number, code, self.outcome
            ),
            None => write!(
                f,
                "attempt {} -> network failure ({})",
                self.attempt_number, self.outcome
            ),
        }
    }
}

/// Classify a response status against the policy
pub fn classify_status(status: u16, policy: &RetryPolicy) -> AttemptOutcome {
    if policy.is_expected(status) {
        AttemptOutcome::Success
    } else if status == 429 {
        AttemptOutcome::RateLimited
    } else if status >= 500 {
        AttemptOutcome::ServerError
    } else {
        AttemptOutcome::ClientError
    }
}

/// Delay before the next attempt, or `None` when the outcome is not
/// retryable. `attempt` is the 1-based number of the attempt that just
/// finished.
pub fn backoff_delay(outcome: AttemptOutcome, attempt: u32, base: Duration) -> Option<Duration> {
    match outcome {
        // Exponential: base * 2^(attempt-1)
        AttemptOutcome::RateLimited => Some(base * 2u32.saturating_pow(attempt - 1)),
        // Linear: base * attempt
        AttemptOutcome::ServerError => Some(base * attempt),
        // Fixed double delay for network blips
        AttemptOutcome::Timeout => Some(base * 2),
        AttemptOutcome::Success | AttemptOutcome::ClientError => None,
    }
}

/// Request executor with bounded retry.
///
/// Each invocation is independent; no state is shared between calls.
pub struct RequestExecutor<T: Transport> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> RequestExecutor<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute one logical request, retrying transient failures.
    ///
    /// HTTP-level failures never become `Err`: when attempts are exhausted
    /// the last response is returned as-is for the caller to inspect. Only
    /// transport errors that persist through the final attempt propagate.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let max_attempts = self.policy.retries + 1;

        for attempt in 1..=max_attempts {
            match self.transport.send(&request).await {
                Ok(response) => {
                    let outcome = classify_status(response.status_code, &self.policy);
                    let record = RequestAttempt {
                        attempt_number: attempt,
                        status_code: Some(response.status_code),
                        outcome,
                    };

                    if !outcome.is_retryable() || attempt == max_attempts {
                        debug!("{record}, returning response");
                        return Ok(response);
                    }

                    // Outcome is retryable and attempts remain
                    let delay = backoff_delay(outcome, attempt, self.policy.retry_delay)
                        .unwrap_or(self.policy.retry_delay);
                    warn!("{record}, retrying in {}ms", delay.as_millis());
                    sleep(delay).await;
                }
                Err(err) => {
                    let record = RequestAttempt {
                        attempt_number: attempt,
                        status_code: None,
                        outcome: AttemptOutcome::Timeout,
                    };

                    if !err.is_transient() || attempt == max_attempts {
                        debug!("{record}, giving up: {err}");
                        return Err(err);
                    }

                    let delay = backoff_delay(AttemptOutcome::Timeout, attempt, self.policy.retry_delay)
                        .unwrap_or(self.policy.retry_delay);
                    warn!("{record}, retrying in {}ms: {err}", delay.as_millis());
                    sleep(delay).await;
                }
            }
        }

        // retries >= 0 guarantees at least one loop iteration
        unreachable!("retry loop always returns within max_attempts")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Transport that replays a fixed script of outcomes
    #[derive(Clone)]
    struct ScriptedTransport {
        script: Arc<Mutex<Vec<Result<u16, HttpError>>>>,
        attempts: Arc<AtomicUsize>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<u16, HttpError>>) -> Self {
            Self {
                script: Arc::new(Mutex::new(script)),
                attempts: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    impl Transport for ScriptedTransport {
        async fn send(&self, _request: &HttpRequest) -> Result<HttpResponse, HttpError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            let next = if script.is_empty() {
                Ok(200)
            } else {
                script.remove(0)
            };

            next.map(|status| HttpResponse {
                status_code: status,
                headers: HashMap::new(),
                body: String::new(),
                duration_ms: 1,
            })
        }
    }

    fn fast_policy(retries: u32) -> RetryPolicy {
        RetryPolicy::new()
            .retries(retries)
            .retry_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_classify_status() {
        let policy = RetryPolicy::default();
        assert_eq!(classify_status(200, &policy), AttemptOutcome::Success);
        assert_eq!(classify_status(429, &policy), AttemptOutcome::RateLimited);
        assert_eq!(classify_status(503, &policy), AttemptOutcome::ServerError);
        assert_eq!(classify_status(404, &policy), AttemptOutcome::ClientError);
        assert_eq!(classify_status(401, &policy), AttemptOutcome::ClientError);
    }

    #[test]
    fn test_expected_statuses_override() {
        let policy = RetryPolicy::new().expect_statuses(vec![404]);
        assert_eq!(classify_status(404, &policy), AttemptOutcome::Success);
        assert_eq!(classify_status(200, &policy), AttemptOutcome::ClientError);
    }

    #[test]
    fn test_backoff_exponential_growth() {
        let base = Duration::from_millis(100);
        let mut previous = Duration::ZERO;
        for attempt in 1..=4 {
            let delay = backoff_delay(AttemptOutcome::RateLimited, attempt, base).unwrap();
            assert!(delay > previous, "attempt {attempt} delay must grow");
            previous = delay;
        }
        assert_eq!(previous, Duration::from_millis(800));
    }

    #[test]
    fn test_backoff_linear_and_fixed() {
        let base = Duration::from_millis(100);
        assert_eq!(
            backoff_delay(AttemptOutcome::ServerError, 3, base),
            Some(Duration::from_millis(300))
        );
        assert_eq!(
            backoff_delay(AttemptOutcome::Timeout, 1, base),
            Some(Duration::from_millis(200))
        );
        assert_eq!(backoff_delay(AttemptOutcome::ClientError, 1, base), None);
    }

    #[tokio::test]
    async fn test_success_returns_immediately() {
        let transport = ScriptedTransport::new(vec![Ok(200)]);
        let executor = RequestExecutor::new(transport.clone(), fast_policy(3));

        let resp = executor.execute(HttpRequest::get("/ok")).await.unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn test_client_error_never_retried() {
        let transport = ScriptedTransport::new(vec![Ok(404), Ok(200)]);
        let executor = RequestExecutor::new(transport.clone(), fast_policy(3));

        let resp = executor.execute(HttpRequest::get("/missing")).await.unwrap();
        assert_eq!(resp.status_code, 404);
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_retried_until_success() {
        let transport = ScriptedTransport::new(vec![Ok(429), Ok(429), Ok(200)]);
        let executor = RequestExecutor::new(transport.clone(), fast_policy(3));

        let resp = executor.execute(HttpRequest::get("/limited")).await.unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(transport.attempts(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_last_response() {
        let transport = ScriptedTransport::new(vec![Ok(503), Ok(503), Ok(503)]);
        let executor = RequestExecutor::new(transport.clone(), fast_policy(2));

        let resp = executor.execute(HttpRequest::get("/down")).await.unwrap();
        assert_eq!(resp.status_code, 503);
        // retries + 1 attempts, no more
        assert_eq!(transport.attempts(), 3);
    }

    #[tokio::test]
    async fn test_network_failure_retried_then_propagates() {
        let transport = ScriptedTransport::new(vec![
            Err(HttpError::ConnectionRefused("api".into())),
            Err(HttpError::Timeout(1)),
        ]);
        let executor = RequestExecutor::new(transport.clone(), fast_policy(1));

        let err = executor.execute(HttpRequest::get("/flaky")).await.unwrap_err();
        assert!(matches!(err, HttpError::Timeout(_)));
        assert_eq!(transport.attempts(), 2);
    }

    #[tokio::test]
    async fn test_network_failure_then_recovery() {
        let transport =
            ScriptedTransport::new(vec![Err(HttpError::ConnectionRefused("api".into())), Ok(201)]);
        let executor = RequestExecutor::new(transport.clone(), fast_policy(2));

        let resp = executor.execute(HttpRequest::post("/create")).await.unwrap();
        assert_eq!(resp.status_code, 201);
        assert_eq!(transport.attempts(), 2);
    }

    #[tokio::test]
    async fn test_zero_retries_single_attempt() {
        let transport = ScriptedTransport::new(vec![Ok(500)]);
        let executor = RequestExecutor::new(transport.clone(), fast_policy(0));

        let resp = executor.execute(HttpRequest::get("/err")).await.unwrap();
        assert_eq!(resp.status_code, 500);
        assert_eq!(transport.attempts(), 1);
    }
}
