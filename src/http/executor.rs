//! Bounded-retry execution of signed requests.

use log::{debug, warn};

use super::retry::{AttemptOutcome, GATEWAY_TIMEOUT, RetryPolicy};
use super::transport::Transport;
use crate::error::{Error, Result};
use crate::request::{Method, SignedRequest};
use crate::runtime::Runtime;

/// Successful result of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Body of a 200 response.
    Body(Vec<u8>),
    /// A retried DELETE that found the resource already gone.
    Empty,
}

impl Response {
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Response::Body(body) => Some(body),
            Response::Empty => None,
        }
    }
}

/// Sends requests through a [`Transport`], retrying timeouts and 504s.
pub struct Executor<T: Transport, R: Runtime> {
    transport: T,
    runtime: R,
    policy: RetryPolicy,
}

impl<T: Transport, R: Runtime> Executor<T, R> {
    pub fn new(transport: T, runtime: R, policy: RetryPolicy) -> Self {
        Self {
            transport,
            runtime,
            policy,
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    #[tracing::instrument(skip(self, request), fields(method = %request.method(), url = request.url()))]
    pub async fn execute(&self, request: &SignedRequest) -> Result<Response> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_response: Option<(u16, Vec<u8>)> = None;
        let mut attempts = 0;

        let (status, body) = loop {
            attempts += 1;

            match AttemptOutcome::classify(self.transport.send(request).await) {
                AttemptOutcome::Success(body) => return Ok(Response::Body(body)),
                AttemptOutcome::Failed(e) => {
                    debug!("{} {}: transport failure: {}", request.method(), request.url(), e);
                    return Err(Error::Transport(e));
                }
                AttemptOutcome::Terminal { status, body } => break (status, body),
                AttemptOutcome::Transient { status, body } => {
                    if let Some(status) = status {
                        last_response = Some((status, body));
                    }

                    if attempts >= max_attempts {
                        debug!(
                            "{} {}: retry budget of {} attempts exhausted",
                            request.method(),
                            request.url(),
                            max_attempts
                        );
                        break last_response.unwrap_or((GATEWAY_TIMEOUT, Vec::new()));
                    }

                    warn!(
                        "{} {}: attempt {}/{} timed out, retrying in {}ms...",
                        request.method(),
                        request.url(),
                        attempts,
                        max_attempts,
                        self.policy.delay.as_millis()
                    );
                    self.runtime.sleep(self.policy.delay).await;
                }
            }
        };

        // A retried delete may have been applied by an attempt whose response was lost.
        if request.method() == Method::Delete && attempts > 1 && status == 404 {
            debug!(
                "{} {}: not found after {} attempts, treating as deleted",
                request.method(),
                request.url(),
                attempts
            );
            return Ok(Response::Empty);
        }

        Err(Error::from_response(status, &body))
    }
}
