//! One network round trip per call to [`Transport::send`].

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::request::{Method, SignedRequest};

/// Status and body of a response, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A send that produced no response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connect or read deadline elapsed. Retried by the executor.
    #[error("request timed out")]
    Timeout,

    /// Any other I/O fault. Never retried.
    #[error("{0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Failed(Box::new(error))
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &SignedRequest) -> Result<RawResponse, TransportError>;
}

/// [`Transport`] backed by a reqwest client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client with the configured timeouts and user agent.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[tracing::instrument(skip(self, request), fields(method = %request.method(), url = request.url()))]
    async fn send(&self, request: &SignedRequest) -> Result<RawResponse, TransportError> {
        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, request.url())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        debug!("{} {} -> {} ({} bytes)", request.method(), request.url(), status, body.len());

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::Credential;
    use crate::region::Region;
    use crate::request::{Operation, RequestBuilder};
    use crate::signer::Signer;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn build(method: Method, url: &str, body: Option<&[u8]>) -> SignedRequest {
        let credential = Credential::new("client-a", "secret");
        RequestBuilder::new(&credential, Signer::Secret, Region::ApNortheast1, 1_700_000_000)
            .build(
                method,
                url,
                &Operation::new("inbox", "SendMessage"),
                body.map(<[u8]>::to_vec),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_send_forwards_headers_and_body() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("POST", "/inbox")
            .match_header("content-type", "application/json")
            .match_header("x-gs2-client-id", "client-a")
            .match_header("x-gs2-request-timestamp", "1700000000")
            .match_header("x-gs2-request-sign", mockito::Matcher::Any)
            .match_body(r#"{"name":"hello"}"#)
            .with_status(200)
            .with_body(r#"{"item": {}}"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::new(Client::new());
        let request = build(
            Method::Post,
            &format!("{}/{{service}}", url),
            Some(&br#"{"name":"hello"}"#[..]),
        );
        let response = transport.send(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"{"item": {}}"#);
    }

    #[tokio::test]
    async fn test_send_returns_error_statuses_as_responses() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("DELETE", "/inbox")
            .with_status(404)
            .with_body(r#"{"message": "gone"}"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::new(Client::new());
        let request = build(Method::Delete, &format!("{}/{{service}}", url), None);
        let response = transport.send(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response, RawResponse::new(404, r#"{"message": "gone"}"#));
    }

    #[tokio::test]
    async fn test_send_connection_refused_is_failed() {
        // Bind and release a port so nothing is listening on it.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let transport = ReqwestTransport::new(Client::new());
        let request = build(Method::Get, &format!("{}/{{service}}", url), None);
        let err = transport.send(&request).await.unwrap_err();

        assert!(matches!(err, TransportError::Failed(_)));
    }

    /// Serves one 200 response whose body bytes are written one at a time,
    /// `pause` apart.
    async fn serve_slowly(body: &'static [u8], pause: Duration) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            for byte in body {
                tokio::time::sleep(pause).await;
                if socket.write_all(&[*byte]).await.is_err() {
                    return;
                }
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_slow_but_steady_response_is_not_a_timeout() {
        // Takes about 1s in total, but no single read waits longer than 100ms.
        let url = serve_slowly(b"0123456789", Duration::from_millis(100)).await;
        let config = ClientConfig::default().with_timeout(Duration::from_millis(400));
        let transport = ReqwestTransport::from_config(&config).unwrap();

        let request = build(Method::Get, &format!("{}/{{service}}", url), None);
        let response = transport.send(&request).await.unwrap();

        assert_eq!(response, RawResponse::new(200, "0123456789"));
    }

    #[tokio::test]
    async fn test_stalled_read_is_timeout() {
        let url = serve_slowly(b"01", Duration::from_millis(800)).await;
        let config = ClientConfig::default().with_timeout(Duration::from_millis(200));
        let transport = ReqwestTransport::from_config(&config).unwrap();

        let request = build(Method::Get, &format!("{}/{{service}}", url), None);
        let err = transport.send(&request).await.unwrap_err();

        assert!(matches!(err, TransportError::Timeout));
    }
}
