//! Session lifecycle: login, logout and recovery from an expired access token

use super::refresh::{Acquire, RefreshLease, RefreshOutcome};
use super::{ClientError, RefreshError, RequestDescriptor, StockroomClient};
use crate::types::{DataEnvelope, LoginRequest, RefreshTokenRequest, SessionData};
use reqwest::Response;
use stockroom_core::{CredentialRecord, UserProfile};
use tracing::{debug, info, warn};

impl StockroomClient {
    /// Sign in and persist the issued session
    pub async fn login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<UserProfile, ClientError> {
        let body = LoginRequest {
            email: email.into(),
            password: password.into(),
        };

        let response = self
            .inner
            .client
            .post(self.url(&self.inner.login_path))
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let envelope: DataEnvelope<SessionData> = response.json().await?;

        let profile = envelope.data.profile();
        let access_token = envelope.data.access_token.clone();
        self.inner
            .store
            .save(&CredentialRecord::from(envelope.data))
            .await?;
        self.set_default_bearer(Some(&access_token));

        info!(account_id = %profile.account_id, "Signed in");
        Ok(profile)
    }

    /// Forget the stored session
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.inner.store.clear().await?;
        self.set_default_bearer(None);
        info!("Signed out");
        Ok(())
    }

    /// Profile of the signed-in user, if any
    pub async fn current_user(&self) -> Result<Option<UserProfile>, ClientError> {
        Ok(self.inner.store.load().await?.user_info)
    }

    /// Recover a request that failed with 401 on its first attempt
    pub(super) async fn recover(&self, request: RequestDescriptor) -> Result<Response, ClientError> {
        let outcome = loop {
            match self.inner.coordinator.acquire_or_wait() {
                Acquire::Waiter(pending) => match pending.wait().await {
                    Err(RefreshError::Abandoned) => {
                        debug!("Session refresh abandoned by its owner, retrying");
                    }
                    outcome => break outcome,
                },
                Acquire::Owner(lease) => {
                    // Detached so that dropping this request cannot cancel the
                    // refresh the queued requests are waiting on
                    let client = self.clone();
                    let refresh = tokio::spawn(async move { client.run_refresh(lease).await });
                    break refresh.await.unwrap_or_else(|error| {
                        warn!(%error, "Session refresh task failed");
                        Err(RefreshError::Abandoned)
                    });
                }
            }
        };

        let token = outcome?;
        self.replay(&request, &token).await
    }

    /// Perform one refresh cycle and settle every queued request with its outcome
    async fn run_refresh(&self, lease: RefreshLease) -> RefreshOutcome {
        let outcome = self.refresh_session().await;

        if outcome.is_ok() {
            lease.settle(&outcome);
        } else {
            self.end_session().await;
            lease.settle(&outcome);
            self.inner.navigator.redirect(&self.inner.signin_route);
        }

        outcome
    }

    /// Re-issue `request` once with `token`
    async fn replay(
        &self,
        request: &RequestDescriptor,
        token: &str,
    ) -> Result<Response, ClientError> {
        let Some(replay) = request.replay_with(token) else {
            return Err(ClientError::Unauthorized(format!(
                "{} {} was already replayed",
                request.method(),
                request.path()
            )));
        };

        debug!(method = %replay.method(), path = replay.path(), "Replaying request");
        let response = self.dispatch(&replay).await?;
        Self::check_status(response).await
    }

    /// Exchange the stored tokens for a new session
    ///
    /// Only the holder of the refresh lease calls this.
    async fn refresh_session(&self) -> Result<String, RefreshError> {
        let record = self.inner.store.load().await?;
        let Some((access_token, refresh_token)) = record.token_pair() else {
            warn!("Session refresh skipped, no stored tokens");
            return Err(RefreshError::MissingCredentials);
        };

        info!("Refreshing session");
        let body = RefreshTokenRequest {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
        };

        let response = self
            .inner
            .client
            .post(self.url(&self.inner.refresh_path))
            .json(&body)
            .send()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            warn!(status = status.as_u16(), "Session refresh rejected");
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: DataEnvelope<SessionData> = response
            .json()
            .await
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

        let access_token = envelope.data.access_token.clone();
        self.inner
            .store
            .save(&CredentialRecord::from(envelope.data))
            .await?;
        self.set_default_bearer(Some(&access_token));

        info!("Session refreshed");
        Ok(access_token)
    }

    /// Drop every trace of the session after a failed refresh
    async fn end_session(&self) {
        if let Err(error) = self.inner.store.clear().await {
            warn!(%error, "Failed to clear stored credentials");
        }
        self.set_default_bearer(None);
        warn!("Session expired");
    }
}
