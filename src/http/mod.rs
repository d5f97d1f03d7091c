//! HTTP execution: transport, retry policy and the retrying executor.

mod executor;
mod retry;
mod transport;

pub use executor::{Executor, Response};
pub use retry::{AttemptOutcome, GATEWAY_TIMEOUT, MAX_RETRIES, RETRY_DELAY_MS, RetryPolicy};
#[cfg(test)]
pub use transport::MockTransport;
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportError};
