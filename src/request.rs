//! Per-call request construction.

use std::fmt;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::credential::Credential;
use crate::error::Result;
use crate::region::Region;
use crate::signer::Signer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Only mutating verbs send a JSON body.
    pub fn carries_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            _ => anyhow::bail!(
                "Unsupported method: {}. Expected GET, POST, PUT or DELETE.",
                s
            ),
        }
    }
}

/// The remote operation a request targets.
///
/// `service` picks the endpoint host; `module` and `function` are bound into
/// the request signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation<'a> {
    pub service: &'a str,
    pub module: &'a str,
    pub function: &'a str,
}

impl<'a> Operation<'a> {
    /// An operation whose module is the service itself.
    pub fn new(service: &'a str, function: &'a str) -> Self {
        Self {
            service,
            module: service,
            function,
        }
    }

    pub fn with_module(mut self, module: &'a str) -> Self {
        self.module = module;
        self
    }
}

/// A fully resolved request, immutable once built.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl SignedRequest {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Substitutes `{service}` and `{region}` in an endpoint template.
pub fn resolve_url(template: &str, service: &str, region: Region) -> String {
    template
        .replace("{service}", service)
        .replace("{region}", region.name())
}

/// Builds requests against one region with one identity.
///
/// Holds only borrowed, read-only state, so it can be created for every call.
pub struct RequestBuilder<'a> {
    credential: &'a Credential,
    signer: Signer,
    region: Region,
    timestamp: u64,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(credential: &'a Credential, signer: Signer, region: Region, timestamp: u64) -> Self {
        Self {
            credential,
            signer,
            region,
            timestamp,
        }
    }

    /// Builds a request carrying the signer's identity headers.
    pub fn build(
        &self,
        method: Method,
        url_template: &str,
        operation: &Operation<'_>,
        body: Option<Vec<u8>>,
    ) -> Result<SignedRequest> {
        let mut request = self.build_unauthenticated(method, url_template, operation, body);
        self.signer.authorize(
            self.credential,
            operation,
            self.timestamp,
            &mut request.headers,
        )?;
        Ok(request)
    }

    /// Builds a request without identity headers. Used for the login
    /// exchange, where the identity travels in the body.
    pub fn build_unauthenticated(
        &self,
        method: Method,
        url_template: &str,
        operation: &Operation<'_>,
        body: Option<Vec<u8>>,
    ) -> SignedRequest {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        SignedRequest {
            method,
            url: resolve_url(url_template, operation.service, self.region),
            headers,
            body: body.filter(|_| method.carries_body()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::signer::{CLIENT_ID_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER};

    const TEMPLATE: &str = "https://{service}.{region}.gs2.io/inbox/message";

    fn credential() -> Credential {
        Credential::new("client-a", "secret")
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url(TEMPLATE, "inbox", Region::UsEast1),
            "https://inbox.us-east-1.gs2.io/inbox/message"
        );
        assert_eq!(
            resolve_url("http://localhost/{region}/{service}", "money", Region::EuWest1),
            "http://localhost/eu-west-1/money"
        );
    }

    #[test]
    fn test_build_post_keeps_body() {
        let credential = credential();
        let builder = RequestBuilder::new(&credential, Signer::Secret, Region::ApNortheast1, 10);
        let op = Operation::new("inbox", "SendMessage");

        let request = builder
            .build(Method::Post, TEMPLATE, &op, Some(br#"{"a":1}"#.to_vec()))
            .unwrap();

        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.url(), "https://inbox.ap-northeast-1.gs2.io/inbox/message");
        assert_eq!(request.body(), Some(&br#"{"a":1}"#[..]));
        assert_eq!(
            request.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(request.headers().get(CLIENT_ID_HEADER).unwrap(), "client-a");
        assert_eq!(request.headers().get(TIMESTAMP_HEADER).unwrap(), "10");
        assert!(request.headers().contains_key(SIGNATURE_HEADER));
    }

    #[test]
    fn test_build_get_and_delete_drop_body() {
        let credential = credential();
        let builder = RequestBuilder::new(&credential, Signer::Secret, Region::ApNortheast1, 10);
        let op = Operation::new("inbox", "GetMessage");

        for method in [Method::Get, Method::Delete] {
            let request = builder
                .build(method, TEMPLATE, &op, Some(b"{}".to_vec()))
                .unwrap();
            assert_eq!(request.body(), None, "{} must not carry a body", method);
        }

        let put = builder
            .build(Method::Put, TEMPLATE, &op, Some(b"{}".to_vec()))
            .unwrap();
        assert_eq!(put.body(), Some(&b"{}"[..]));
    }

    #[test]
    fn test_build_region_applies_per_builder() {
        let credential = credential();
        let op = Operation::new("inbox", "GetMessage");

        let first = RequestBuilder::new(&credential, Signer::Secret, Region::ApNortheast1, 10)
            .build(Method::Get, TEMPLATE, &op, None)
            .unwrap();
        let second = RequestBuilder::new(&credential, Signer::Secret, Region::EuWest1, 10)
            .build(Method::Get, TEMPLATE, &op, None)
            .unwrap();

        assert!(first.url().contains("ap-northeast-1"));
        assert!(second.url().contains("eu-west-1"));
    }

    #[test]
    fn test_build_fails_when_signer_fails() {
        let credential = Credential::from_parts(None, None);
        let builder = RequestBuilder::new(&credential, Signer::Secret, Region::ApNortheast1, 10);

        let err = builder
            .build(Method::Get, TEMPLATE, &Operation::new("inbox", "GetMessage"), None)
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));
    }

    #[test]
    fn test_build_unauthenticated_has_no_identity() {
        let credential = Credential::from_parts(None, None);
        let builder =
            RequestBuilder::new(&credential, Signer::ProjectToken, Region::ApNortheast1, 10);

        let request = builder.build_unauthenticated(
            Method::Post,
            TEMPLATE,
            &Operation::new("identifier", "login"),
            Some(b"{}".to_vec()),
        );

        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.body(), Some(&b"{}"[..]));
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("delete".parse::<Method>().unwrap(), Method::Delete);
        assert_eq!("POST".parse::<Method>().unwrap(), Method::Post);
        assert!("PATCH".parse::<Method>().is_err());
    }
}
