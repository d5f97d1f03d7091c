//! Request authentication.
//!
//! Two schemes share one pipeline: [`Signer::Secret`] signs every request with
//! an HMAC over the target operation and a timestamp, [`Signer::ProjectToken`]
//! attaches the bearer token obtained by logging in.

use base64::Engine;
use hmac::{Hmac, Mac};
use log::debug;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use sha2::Sha256;

use crate::credential::{Credential, mask};
use crate::error::{Error, Result};
use crate::request::Operation;

pub type HmacSha256 = Hmac<Sha256>;

pub const CLIENT_ID_HEADER: HeaderName = HeaderName::from_static("x-gs2-client-id");
pub const TIMESTAMP_HEADER: HeaderName = HeaderName::from_static("x-gs2-request-timestamp");
pub const SIGNATURE_HEADER: HeaderName = HeaderName::from_static("x-gs2-request-sign");

/// Authentication scheme, selected once when a client is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Signer {
    /// HMAC-SHA256 signature keyed by the client secret.
    #[default]
    Secret,
    /// Bearer project token from a prior login.
    ProjectToken,
}

impl Signer {
    /// Adds the identity headers for one request.
    pub fn authorize(
        &self,
        credential: &Credential,
        operation: &Operation<'_>,
        timestamp: u64,
        headers: &mut HeaderMap,
    ) -> Result<()> {
        match self {
            Signer::Secret => {
                let client_id = credential
                    .client_id()
                    .ok_or_else(|| Error::unauthorized("client id is not set"))?;
                let client_secret = credential
                    .client_secret()
                    .ok_or_else(|| Error::unauthorized("client secret is not set"))?;

                let signature = sign(
                    client_secret,
                    operation.module,
                    operation.function,
                    timestamp,
                )?;

                headers.insert(CLIENT_ID_HEADER, HeaderValue::from_str(client_id)?);
                headers.insert(TIMESTAMP_HEADER, HeaderValue::from(timestamp));
                headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(&signature)?);
            }
            Signer::ProjectToken => {
                let token = credential
                    .project_token()
                    .ok_or_else(|| Error::unauthorized("not logged in: project token is not set"))?;

                if let Some(client_id) = credential.client_id() {
                    headers.insert(CLIENT_ID_HEADER, HeaderValue::from_str(client_id)?);
                }

                let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
                auth_value.set_sensitive(true);
                headers.insert(AUTHORIZATION, auth_value);
                debug!("Authorizing with project token {}", mask(token));
            }
        }
        Ok(())
    }
}

/// Computes the request signature: base64 HMAC-SHA256 of
/// `"{module}:{function}:{timestamp}"` keyed by the client secret.
pub fn sign(client_secret: &str, module: &str, function: &str, timestamp: u64) -> Result<String> {
    let message = format!("{}:{}:{}", module, function, timestamp);

    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .map_err(|e| Error::unauthorized(format!("HMAC initialization failed: {}", e)))?;
    mac.update(message.as_bytes());

    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}
