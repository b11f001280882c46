//! Stockroom HTTP client
//!
//! Every call made through [`StockroomClient`] is decorated with the stored
//! access token. A 401 on a first attempt triggers one coordinated session
//! refresh and a replay of the request; see [`refresh`] for the single-flight
//! lock shared by concurrent requests.

pub mod error;
pub mod navigator;
pub mod refresh;
pub mod request;
pub mod resources;
pub mod session;

pub use error::{ClientError, RefreshError};
pub use navigator::{LogNavigator, Navigator};
pub use request::{Attempt, RequestDescriptor};
pub use resources::Resource;

use refresh::RefreshCoordinator;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder, Response};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use stockroom_core::config::{DEFAULT_LOGIN_PATH, DEFAULT_REFRESH_PATH, DEFAULT_SIGNIN_ROUTE};
use stockroom_core::{ClientConfig, CredentialStore, FileCredentialStore, MemoryCredentialStore};
use tracing::{debug, warn};

/// Stockroom API client
#[derive(Clone)]
pub struct StockroomClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    client: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    coordinator: Arc<RefreshCoordinator>,
    default_headers: RwLock<HeaderMap>,
    login_path: String,
    refresh_path: String,
    signin_route: String,
}

impl StockroomClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> StockroomClientBuilder {
        StockroomClientBuilder::default()
    }

    /// Create a client from loaded configuration, persisting credentials to disk
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        StockroomClientBuilder::from_config(config).build()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// The store holding this client's session credentials
    pub fn credential_store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    /// Headers applied to every request before the bearer token
    pub fn default_headers(&self) -> HeaderMap {
        self.inner
            .default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a session refresh is in progress
    pub fn is_refreshing(&self) -> bool {
        self.inner.coordinator.is_refreshing()
    }

    /// Describe a request to `path`, relative to the base URL
    pub fn request(&self, method: reqwest::Method, path: &str) -> RequestDescriptor {
        RequestDescriptor::new(method, path)
    }

    /// Send a request, recovering once from an expired session
    pub async fn send(&self, request: RequestDescriptor) -> Result<Response, ClientError> {
        let response = self.dispatch(&request).await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED && !request.is_replay() {
            debug!(
                method = %request.method(),
                path = request.path(),
                "Access token rejected, recovering session"
            );
            return self.recover(request).await;
        }

        Self::check_status(response).await
    }

    /// Send a request and decode its JSON response
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    /// Decorate and send a request exactly once, without interpreting the status
    async fn dispatch(&self, request: &RequestDescriptor) -> Result<Response, ClientError> {
        let mut headers = self.default_headers();
        headers.extend(request.headers().clone());

        let authorization = match request.bearer() {
            Some(token) => Some(bearer_value(token)?),
            None => match self.inner.store.load().await {
                Ok(record) => record.access_token.as_deref().map(bearer_value).transpose()?,
                Err(error) => {
                    warn!(%error, "Credential store unreadable, using default authorization");
                    headers.get(header::AUTHORIZATION).cloned()
                }
            },
        };

        match authorization {
            Some(value) => {
                headers.insert(header::AUTHORIZATION, value);
            }
            None => {
                headers.remove(header::AUTHORIZATION);
            }
        }

        let mut builder = self
            .inner
            .client
            .request(request.method().clone(), self.url(request.path()))
            .headers(headers);

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body_bytes() {
            builder = builder.body(body.clone());
        }

        Ok(builder.send().await?)
    }

    /// Turn a non-success response into an error, preserving status and body
    async fn check_status(response: Response) -> Result<Response, ClientError> {
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            Err(ClientError::from_status(status, message))
        }
    }

    fn set_default_bearer(&self, token: Option<&str>) {
        let mut headers = self
            .inner
            .default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        match token.map(bearer_value) {
            Some(Ok(value)) => {
                headers.insert(header::AUTHORIZATION, value);
            }
            Some(Err(error)) => {
                warn!(%error, "Refusing to store malformed bearer token in default headers");
                headers.remove(header::AUTHORIZATION);
            }
            None => {
                headers.remove(header::AUTHORIZATION);
            }
        }
    }
}

fn bearer_value(token: &str) -> Result<HeaderValue, ClientError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
        ClientError::Configuration("access token is not a valid header value".into())
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Builder for StockroomClient
#[derive(Default)]
pub struct StockroomClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    store: Option<Arc<dyn CredentialStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    login_path: Option<String>,
    refresh_path: Option<String>,
    signin_route: Option<String>,
}

impl StockroomClientBuilder {
    /// Start from loaded configuration, persisting credentials to disk
    pub fn from_config(config: &ClientConfig) -> Self {
        let builder = StockroomClient::builder()
            .base_url(&config.base_url)
            .user_agent(&config.user_agent)
            .credential_store(Arc::new(FileCredentialStore::new(&config.credentials_path)))
            .login_path(&config.login_path)
            .refresh_path(&config.refresh_path)
            .signin_route(&config.signin_route);

        match config.timeout() {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set where session credentials are kept (in memory by default)
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the hook called when the session ends
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Override the login endpoint path
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = Some(path.into());
        self
    }

    /// Override the refresh endpoint path
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = Some(path.into());
        self
    }

    /// Override the route passed to the navigator when the session ends
    pub fn signin_route(mut self, route: impl Into<String>) -> Self {
        self.signin_route = Some(route.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<StockroomClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        url::Url::parse(&base_url).map_err(|e| {
            ClientError::Configuration(format!("invalid base_url {base_url:?}: {e}"))
        })?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| format!("stockroom-client/{}", env!("CARGO_PKG_VERSION"))),
        );

        let client = client_builder.build()?;

        Ok(StockroomClient {
            inner: Arc::new(ClientInner {
                client,
                base_url,
                store: self
                    .store
                    .unwrap_or_else(|| Arc::new(MemoryCredentialStore::new())),
                navigator: self.navigator.unwrap_or_else(|| Arc::new(LogNavigator)),
                coordinator: Arc::new(RefreshCoordinator::new()),
                default_headers: RwLock::new(HeaderMap::new()),
                login_path: self
                    .login_path
                    .unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_string()),
                refresh_path: self
                    .refresh_path
                    .unwrap_or_else(|| DEFAULT_REFRESH_PATH.to_string()),
                signin_route: self
                    .signin_route
                    .unwrap_or_else(|| DEFAULT_SIGNIN_ROUTE.to_string()),
            }),
        })
    }
}
