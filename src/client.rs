//! The client: one identity, one scheme, one region, one executor.

use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::credential::{Credential, mask};
use crate::error::{Error, Result};
use crate::http::{Executor, ReqwestTransport, Response, Transport};
use crate::login::{LOGIN_FUNCTION, LOGIN_PATH, LOGIN_SERVICE, LoginRequest, LoginResult};
use crate::region::Region;
use crate::request::{Method, Operation, RequestBuilder};
use crate::runtime::{RealRuntime, Runtime};
use crate::signer::Signer;

/// Authenticated client for the GS2 HTTP API.
///
/// Calls take `&self` and may run concurrently. Changing the region takes
/// `&mut self`, so it can never race with an in-flight call; it applies to
/// every request built afterwards.
pub struct Gs2Client<T: Transport = ReqwestTransport, R: Runtime = RealRuntime> {
    credential: Credential,
    signer: Signer,
    region: Region,
    endpoint: String,
    executor: Executor<T, R>,
}

impl Gs2Client {
    /// A client signing each request with the client secret. Performs no I/O.
    pub fn signed(credential: Credential, region: Region, config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::from_config(&config)?;
        Ok(Self::assemble(
            credential,
            Signer::Secret,
            region,
            config,
            transport,
            RealRuntime,
        ))
    }

    /// A client using a project token, obtained by logging in before this returns.
    pub async fn login(credential: Credential, region: Region, config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::from_config(&config)?;
        Self::connect(
            credential,
            Signer::ProjectToken,
            region,
            config,
            transport,
            RealRuntime,
        )
        .await
    }
}

impl<T: Transport, R: Runtime> Gs2Client<T, R> {
    /// Builds a client over any transport and runtime. Under
    /// [`Signer::ProjectToken`] the login exchange runs first and its failure
    /// fails construction.
    #[tracing::instrument(skip_all, fields(signer = ?signer, region = %region))]
    pub async fn connect(
        credential: Credential,
        signer: Signer,
        region: Region,
        config: ClientConfig,
        transport: T,
        runtime: R,
    ) -> Result<Self> {
        let client = Self::assemble(credential, signer, region, config, transport, runtime);
        if signer == Signer::ProjectToken {
            client.authenticate().await?;
        }
        Ok(client)
    }

    fn assemble(
        credential: Credential,
        signer: Signer,
        region: Region,
        config: ClientConfig,
        transport: T,
        runtime: R,
    ) -> Self {
        Self {
            credential,
            signer,
            region,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            executor: Executor::new(transport, runtime, config.retry),
        }
    }

    async fn authenticate(&self) -> Result<()> {
        let body = serde_json::to_vec(&LoginRequest::from(&self.credential))?;
        let url = format!("{}{}", self.endpoint, LOGIN_PATH);
        let request = self.builder().build_unauthenticated(
            Method::Post,
            &url,
            &Operation::new(LOGIN_SERVICE, LOGIN_FUNCTION),
            Some(body),
        );

        let body = self
            .executor
            .execute(&request)
            .await?
            .into_bytes()
            .unwrap_or_default();
        let result: LoginResult = serde_json::from_slice(&body)?;

        debug!(
            "Logged in as {}, project token {}",
            self.credential.client_id().unwrap_or("<anonymous>"),
            mask(&result.item.token)
        );
        self.credential.set_project_token(result.item.token);
        Ok(())
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn signer(&self) -> Signer {
        self.signer
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Rebinds all subsequent calls to `region`.
    pub fn set_region(&mut self, region: Region) {
        self.region = region;
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.set_region(region);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn builder(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(
            &self.credential,
            self.signer,
            self.region,
            self.executor.runtime().unix_timestamp(),
        )
    }

    /// Builds, signs and executes one call. `path` is appended to the
    /// endpoint template before `{service}` and `{region}` are resolved.
    #[tracing::instrument(skip(self, body), fields(service = operation.service, function = operation.function))]
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        operation: &Operation<'_>,
        body: Option<Vec<u8>>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.endpoint, path);
        let request = self.builder().build(method, &url, operation, body)?;
        self.executor.execute(&request).await
    }

    pub async fn post<B, U>(&self, path: &str, operation: &Operation<'_>, body: &B) -> Result<U>
    where
        B: Serialize + ?Sized,
        U: DeserializeOwned,
    {
        let body = serde_json::to_vec(body)?;
        let response = self.call(Method::Post, path, operation, Some(body)).await?;
        decode(response)
    }

    pub async fn put<B, U>(&self, path: &str, operation: &Operation<'_>, body: &B) -> Result<U>
    where
        B: Serialize + ?Sized,
        U: DeserializeOwned,
    {
        let body = serde_json::to_vec(body)?;
        let response = self.call(Method::Put, path, operation, Some(body)).await?;
        decode(response)
    }

    pub async fn get<U: DeserializeOwned>(&self, path: &str, operation: &Operation<'_>) -> Result<U> {
        let response = self.call(Method::Get, path, operation, None).await?;
        decode(response)
    }

    /// Returns `None` when a retried delete finds the resource already gone.
    pub async fn delete<U: DeserializeOwned>(
        &self,
        path: &str,
        operation: &Operation<'_>,
    ) -> Result<Option<U>> {
        match self.call(Method::Delete, path, operation, None).await? {
            Response::Body(body) => Ok(Some(serde_json::from_slice(&body)?)),
            Response::Empty => Ok(None),
        }
    }

    /// Executes a call whose response payload is not needed.
    pub async fn send<B>(
        &self,
        method: Method,
        path: &str,
        operation: &Operation<'_>,
        body: Option<&B>,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let body = body.map(serde_json::to_vec).transpose()?;
        self.call(method, path, operation, body).await?;
        Ok(())
    }
}

fn decode<U: DeserializeOwned>(response: Response) -> Result<U> {
    let body = response.into_bytes().unwrap_or_default();
    serde_json::from_slice(&body).map_err(Error::from)
}
