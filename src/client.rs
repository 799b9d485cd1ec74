use crate::errors::ContractError;
use crate::http::common::{API_KEY_HEADER, Endpoint, USER_AGENT};
use crate::http::{error_helpers, files, loud_wire};
use crate::request::ApiRequest;
use crate::response::{ApiResponse, ByteStream};
use crate::retry::{self, RetryPolicy};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::{Value, json};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ENV_BASE_URL: &str = "CONTRACT_API_BASE_URL";
const ENV_API_KEY: &str = "CONTRACT_API_KEY";
const ENV_ACCESS_TOKEN: &str = "CONTRACT_API_ACCESS_TOKEN";
const ENV_TIMEOUT_SECS: &str = "CONTRACT_API_TIMEOUT_SECS";
const ENV_MAX_RETRIES: &str = "CONTRACT_API_MAX_RETRIES";
const ENV_VERIFY_TLS: &str = "CONTRACT_API_VERIFY_TLS";

/// Tokens and API key held by a client and all of its clones.
#[derive(Default)]
struct Credentials {
    access_token: Option<String>,
    refresh_token: Option<String>,
    api_key: Option<String>,
}

/// Shared credential state.
///
/// The `RwLock` is only ever held for a field copy, never across `.await`.
/// `refresh_lock` serializes refresh exchanges between concurrent requests.
struct CredentialStore {
    state: RwLock<Credentials>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl CredentialStore {
    fn new(credentials: Credentials) -> Self {
        Self {
            state: RwLock::new(credentials),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&Credentials) -> R) -> R {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write(&self, f: impl FnOnce(&mut Credentials)) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}

/// The main client for interacting with the Contract Management API.
///
/// Cloning is cheap. Clones share one connection pool and one credential
/// state, so a token refreshed through one clone is used by all of them.
#[derive(Clone)]
pub struct Client {
    http_client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    retry_policy: RetryPolicy,
    credentials: Arc<CredentialStore>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (access, refresh, key) = self.credentials.read(|c| {
            (
                c.access_token.is_some(),
                c.refresh_token.is_some(),
                c.api_key.is_some(),
            )
        });
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("retry_policy", &self.retry_policy)
            .field("has_access_token", &access)
            .field("has_refresh_token", &refresh)
            .field("has_api_key", &key)
            .finish_non_exhaustive()
    }
}

/// Builder for `Client` instances.
///
/// # Example
///
/// ```
/// use contract_sdk::Client;
/// use std::time::Duration;
///
/// let client = Client::builder("https://contracts.example.com")
///     .api_key("ck_live_123")
///     .timeout(Duration::from_secs(60))
///     .max_retries(5)
///     .build()
///     .unwrap();
/// assert_eq!(client.api_key().as_deref(), Some("ck_live_123"));
/// ```
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: String,
    api_key: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    timeout: Duration,
    connect_timeout: Option<Duration>,
    retry_policy: RetryPolicy,
    verify_tls: bool,
    user_agent: String,
}

impl ClientBuilder {
    fn new(base_url: String) -> Self {
        Self {
            base_url,
            api_key: None,
            access_token: None,
            refresh_token: None,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: None,
            retry_policy: RetryPolicy::default(),
            verify_tls: true,
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Creates a builder from `CONTRACT_API_*` environment variables.
    ///
    /// | Variable | Setting |
    /// |----------|---------|
    /// | `CONTRACT_API_BASE_URL` | base URL (required) |
    /// | `CONTRACT_API_KEY` | API key |
    /// | `CONTRACT_API_ACCESS_TOKEN` | initial access token |
    /// | `CONTRACT_API_TIMEOUT_SECS` | request timeout in seconds |
    /// | `CONTRACT_API_MAX_RETRIES` | transport retry budget |
    /// | `CONTRACT_API_VERIFY_TLS` | `true`/`false` |
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::InvalidInput`] if the base URL is missing or a
    /// numeric or boolean variable cannot be parsed.
    pub fn from_env() -> Result<Self, ContractError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ContractError> {
        let base_url = lookup(ENV_BASE_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ContractError::InvalidInput(format!("{ENV_BASE_URL} is not set")))?;

        let mut builder = Self::new(base_url);

        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            builder = builder.api_key(key);
        }
        if let Some(token) = lookup(ENV_ACCESS_TOKEN).filter(|v| !v.is_empty()) {
            builder = builder.access_token(token);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|e| {
                ContractError::InvalidInput(format!("{ENV_TIMEOUT_SECS}={raw:?}: {e}"))
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(raw) = lookup(ENV_MAX_RETRIES) {
            let retries: u32 = raw.trim().parse().map_err(|e| {
                ContractError::InvalidInput(format!("{ENV_MAX_RETRIES}={raw:?}: {e}"))
            })?;
            builder = builder.max_retries(retries);
        }
        if let Some(raw) = lookup(ENV_VERIFY_TLS) {
            let verify = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ContractError::InvalidInput(format!(
                        "{ENV_VERIFY_TLS}={raw:?}: expected true or false"
                    )));
                }
            };
            builder = builder.verify_tls(verify);
        }

        Ok(builder)
    }

    /// Sends `X-API-Key` with every request.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Starts with an existing access token instead of logging in.
    #[must_use]
    pub fn access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    #[must_use]
    pub fn refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Sets the request timeout (default 30 seconds).
    ///
    /// Buffered requests must complete within this time. File uploads and
    /// streamed downloads may run longer, but fail if the connection stalls
    /// for this long.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connection timeout.
    ///
    /// If not set, uses reqwest's default.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the transport retry budget, keeping the rest of the policy.
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.retry_policy = self.retry_policy.with_max_retries(max_retries);
        self
    }

    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Disabling verification accepts any server certificate. Only for
    /// local development against self-signed endpoints.
    #[must_use]
    pub const fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Builds the `Client`.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::InvalidInput`] for an unusable base URL and
    /// [`ContractError::ClientBuild`] if the HTTP stack cannot be initialized.
    pub fn build(self) -> Result<Client, ContractError> {
        let base_url = Url::parse(self.base_url.trim()).map_err(|e| {
            ContractError::InvalidInput(format!("Invalid base URL '{}': {e}", self.base_url))
        })?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ContractError::InvalidInput(format!(
                "Base URL must be an http(s) URL: {}",
                self.base_url
            )));
        }

        let mut builder = ReqwestClient::builder()
            .user_agent(self.user_agent)
            .read_timeout(self.timeout)
            .danger_accept_invalid_certs(!self.verify_tls);

        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        let http_client = builder
            .build()
            .map_err(|e| ContractError::ClientBuild(e.to_string()))?;

        if !self.verify_tls {
            tracing::warn!("TLS certificate verification is disabled for {}", base_url);
        }

        Ok(Client {
            http_client,
            base_url,
            timeout: self.timeout,
            retry_policy: self.retry_policy,
            credentials: Arc::new(CredentialStore::new(Credentials {
                access_token: self.access_token,
                refresh_token: self.refresh_token,
                api_key: self.api_key,
            })),
        })
    }
}

impl Client {
    /// Creates a new builder for `Client` instances.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Root URL of the Contract Management API.
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url.into())
    }

    /// Creates a client with default settings and no credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a usable http(s) URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ContractError> {
        Self::builder(base_url).build()
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    // --- Credentials ---

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.credentials.read(|c| c.access_token.clone())
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.credentials.read(|c| c.refresh_token.clone())
    }

    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        self.credentials.read(|c| c.api_key.clone())
    }

    /// Replaces both tokens in one step.
    pub fn set_tokens(&self, access_token: impl Into<String>, refresh_token: impl Into<String>) {
        let (access, refresh) = (access_token.into(), refresh_token.into());
        self.credentials.write(|c| {
            c.access_token = Some(access);
            c.refresh_token = Some(refresh);
        });
    }

    pub fn set_access_token(&self, access_token: impl Into<String>) {
        let access = access_token.into();
        self.credentials.write(|c| c.access_token = Some(access));
    }

    pub fn set_refresh_token(&self, refresh_token: impl Into<String>) {
        let refresh = refresh_token.into();
        self.credentials.write(|c| c.refresh_token = Some(refresh));
    }

    /// Forgets both tokens. The API key, if any, is kept.
    pub fn clear_tokens(&self) {
        self.credentials.write(|c| {
            c.access_token = None;
            c.refresh_token = None;
        });
    }

    /// Stores the `accessToken`/`refreshToken` pair of a login or refresh response.
    ///
    /// Nothing is stored unless both are present.
    pub(crate) fn store_token_pair(&self, response: &Value) -> Result<(), ContractError> {
        let token = |field: &str| {
            response
                .get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    ContractError::MalformedResponse(format!(
                        "Token response is missing '{field}'"
                    ))
                })
        };
        let access = token("accessToken")?;
        let refresh = token("refreshToken")?;
        self.set_tokens(access, refresh);
        Ok(())
    }

    // --- Request pipeline ---

    /// Sends a request through the full pipeline.
    ///
    /// Attaches credentials, retries transient failures per the client's
    /// [`RetryPolicy`], and on a 401 (with a refresh token held) refreshes the
    /// token pair once and resends.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request cannot be sent ([`ContractError::Network`])
    /// - The API returns a non-2xx status (401 is [`ContractError::Authentication`],
    ///   400 is [`ContractError::Validation`], others [`ContractError::Api`])
    /// - A successful body is not valid JSON ([`ContractError::MalformedResponse`])
    ///
    /// # Example
    ///
    /// ```no_run
    /// use contract_sdk::{ApiRequest, Client};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), contract_sdk::ContractError> {
    /// let client = Client::builder("https://contracts.example.com")
    ///     .api_key("ck_live_123")
    ///     .build()?;
    ///
    /// let response = client
    ///     .execute(ApiRequest::get("/contracts").with_query("status", "draft"))
    ///     .await?;
    /// println!("{:?}", response.json());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ContractError> {
        let sent_with = self.access_token();
        let (mut request_id, mut response) =
            self.send_with_retry(&request, sent_with.as_deref()).await?;

        if response.status() == StatusCode::UNAUTHORIZED
            && request.refreshes_on_unauthorized()
            && self.refresh_token().is_some()
        {
            tracing::debug!(
                "Received 401 for {} {}; refreshing access token",
                request.method(),
                request.path()
            );
            drop(response);
            let token = self.recover_from_unauthorized(sent_with.as_deref()).await?;
            (request_id, response) = self.send_with_retry(&request, token.as_deref()).await?;
        }

        self.finish_response(&request, request_id, response).await
    }

    /// Sends a request and returns the open response body.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    pub async fn execute_stream(&self, request: ApiRequest) -> Result<ByteStream, ContractError> {
        self.execute(request.streaming()).await?.into_byte_stream()
    }

    /// Sends a request and returns its JSON body as a value (`Null` for no content).
    pub(crate) async fn send_json(&self, request: ApiRequest) -> Result<Value, ContractError> {
        self.execute(request).await?.into_value()
    }

    /// GET `path`; `None` means the server returned no content.
    pub async fn get(&self, path: &str) -> Result<Option<Value>, ContractError> {
        self.execute(ApiRequest::get(path)).await?.into_json()
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Option<Value>, ContractError> {
        self.execute(ApiRequest::post(path).with_body(body))
            .await?
            .into_json()
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Option<Value>, ContractError> {
        self.execute(ApiRequest::put(path).with_body(body))
            .await?
            .into_json()
    }

    pub async fn delete(&self, path: &str) -> Result<Option<Value>, ContractError> {
        self.execute(ApiRequest::delete(path)).await?.into_json()
    }

    /// Exchanges the held refresh token for a new token pair.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Authentication`] without a status code if no
    /// refresh token is held, the server's error if the exchange is refused,
    /// and [`ContractError::MalformedResponse`] if the response lacks either token.
    pub async fn refresh_access_token(&self) -> Result<(), ContractError> {
        let _guard = self.credentials.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Refreshes after a 401 unless another request already did.
    ///
    /// `stale` is the access token the rejected request was sent with. If the
    /// held token differs once the lock is acquired, a concurrent refresh has
    /// replaced it and the current token is reused.
    async fn recover_from_unauthorized(
        &self,
        stale: Option<&str>,
    ) -> Result<Option<String>, ContractError> {
        let _guard = self.credentials.refresh_lock.lock().await;

        let current = self.access_token();
        if current.is_some() && current.as_deref() != stale {
            tracing::debug!("Access token was refreshed by a concurrent request");
            return Ok(current);
        }

        self.refresh_locked().await?;
        Ok(self.access_token())
    }

    /// Performs the refresh exchange. Callers hold `refresh_lock`.
    async fn refresh_locked(&self) -> Result<(), ContractError> {
        let Some(refresh_token) = self.refresh_token() else {
            return Err(ContractError::Authentication {
                message: "No refresh token available".to_string(),
                code: None,
                status_code: None,
                details: None,
            });
        };

        let request = ApiRequest::for_endpoint(Method::POST, &Endpoint::RefreshToken)?
            .with_body(json!({ "refreshToken": refresh_token }));

        // Sent directly: a 401 here must never start another refresh.
        let access_token = self.access_token();
        let (request_id, response) = self
            .send_with_retry(&request, access_token.as_deref())
            .await?;
        let body = self
            .finish_response(&request, request_id, response)
            .await?
            .into_value()?;

        self.store_token_pair(&body)?;
        tracing::debug!("Access token refreshed");
        Ok(())
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url, ContractError> {
        let mut url = self.base_url.join(request.path()).map_err(|e| {
            ContractError::InvalidInput(format!("Invalid request path '{}': {e}", request.path()))
        })?;
        if !request.query().is_empty() {
            url.query_pairs_mut().extend_pairs(request.query());
        }
        Ok(url)
    }

    /// Builds one attempt. Multipart bodies are reopened from disk every time.
    async fn build_request(
        &self,
        request: &ApiRequest,
        url: Url,
        body: Option<&str>,
        access_token: Option<&str>,
    ) -> Result<RequestBuilder, ContractError> {
        let mut builder = self.http_client.request(request.method().clone(), url);
        if !request.is_stream() && request.upload().is_none() {
            builder = builder.timeout(self.timeout);
        }

        if let Some(token) = access_token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(key) = self.api_key() {
            builder = builder.header(API_KEY_HEADER, key);
        }

        builder = match request.upload() {
            Some(upload) => builder.multipart(files::multipart_form(upload).await?),
            None => {
                let builder = builder.header(CONTENT_TYPE, "application/json");
                match body {
                    Some(body) => builder.body(body.to_string()),
                    None => builder,
                }
            }
        };

        Ok(builder)
    }

    /// Sends `request`, repeating it while the retry policy allows.
    ///
    /// Connection failures are retried for every method, since the server
    /// never saw the request. Timeouts, mid-flight failures and retryable
    /// statuses are retried only for idempotent methods.
    async fn send_with_retry(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<(usize, Response), ContractError> {
        let url = self.url_for(request)?;
        let body = match (request.upload(), request.body()) {
            (None, Some(body)) => Some(serde_json::to_string(body)?),
            _ => None,
        };
        let idempotent = retry::is_idempotent(request.method());
        let mut retry = self.retry_policy.start();

        loop {
            let builder = self
                .build_request(request, url.clone(), body.as_deref(), access_token)
                .await?;

            let request_id = loud_wire::next_request_id();
            tracing::debug!(
                "{} {} (attempt {})",
                request.method(),
                url,
                retry.retries() + 1
            );
            loud_wire::log_request(
                request_id,
                request.method().as_str(),
                url.as_str(),
                body.as_deref(),
            );

            match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    loud_wire::log_response_status(request_id, status.as_u16());

                    if idempotent && self.retry_policy.is_retryable_status(status.as_u16()) {
                        let hint = retry::retry_after(response.headers());
                        if let Some(delay) = retry.next_delay(hint) {
                            tracing::warn!(
                                "HTTP {} from {} {}; retry {}/{} in {:?}",
                                status.as_u16(),
                                request.method(),
                                request.path(),
                                retry.retries(),
                                self.retry_policy.max_retries(),
                                delay
                            );
                            drop(response);
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }

                    return Ok((request_id, response));
                }
                Err(err) => {
                    let retryable =
                        err.is_connect() || (idempotent && (err.is_timeout() || err.is_request()));
                    if retryable && let Some(delay) = retry.next_delay(None) {
                        tracing::warn!(
                            "Transport error on {} {}: {}; retry {}/{} in {:?}",
                            request.method(),
                            request.path(),
                            err,
                            retry.retries(),
                            self.retry_policy.max_retries(),
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(ContractError::from_transport(err));
                }
            }
        }
    }

    /// Maps the final response of a request to its result.
    async fn finish_response(
        &self,
        request: &ApiRequest,
        request_id: usize,
        response: Response,
    ) -> Result<ApiResponse, ContractError> {
        let status = response.status();
        if !status.is_success() {
            let error = error_helpers::read_error(response).await;
            tracing::debug!(
                "{} {} failed with HTTP {}: {}",
                request.method(),
                request.path(),
                status.as_u16(),
                error.message()
            );
            return Err(error);
        }

        if request.is_stream() {
            return Ok(ApiResponse::Stream(ByteStream::new(response)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(ContractError::from_transport)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(ApiResponse::NoContent);
        }

        loud_wire::log_response_body(request_id, &String::from_utf8_lossy(&bytes));
        let context = format!("{} {}", request.method(), request.path());
        error_helpers::parse_json_body(&bytes, &context).map(ApiResponse::Json)
    }
}
