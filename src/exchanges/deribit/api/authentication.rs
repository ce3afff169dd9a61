use crate::core::errors::ExchangeError;
use crate::exchanges::deribit::client::DeribitWsClient;
use crate::exchanges::deribit::models::{AuthParams, AuthResponse, LogoutParams};
use tracing::{debug, instrument};

impl DeribitWsClient {
    /// `public/auth` with explicit params; the returned tokens become the session tokens
    #[instrument(skip(self, params), fields(exchange = "deribit", grant_type = ?params.grant_type))]
    pub async fn auth(&self, params: &AuthParams) -> Result<AuthResponse, ExchangeError> {
        let response: AuthResponse = self.call("public/auth", params).await?;
        self.store_tokens(&response);
        Ok(response)
    }

    /// Exchange the stored refresh token for a new token pair
    pub async fn refresh_token(&self) -> Result<AuthResponse, ExchangeError> {
        let refresh_token = self
            .tokens()
            .map(|tokens| tokens.refresh_token)
            .ok_or(ExchangeError::AuthenticationRequired)?;
        self.auth(&AuthParams::refresh_token(refresh_token)).await
    }

    /// `private/logout`
    ///
    /// The server closes the socket instead of answering, so a lost
    /// connection counts as success. Tokens are dropped either way.
    pub async fn logout(&self, params: &LogoutParams) -> Result<(), ExchangeError> {
        let outcome = self
            .call::<_, serde_json::Value>("private/logout", params)
            .await;
        match outcome {
            Ok(_) | Err(ExchangeError::ConnectionLost) => {
                debug!("Logged out");
                self.clear_tokens();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
