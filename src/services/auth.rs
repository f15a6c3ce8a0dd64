use crate::api::ApiClient;
use crate::core::{AuthResponse, LoginCredentials, Result};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct AccessToken {
    access: String,
}

/// Authentication endpoints. Both calls are made without a bearer token.
pub struct AuthService<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse> {
        self.client.post_anonymous("/auth/login/", credentials).await
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh(&self, refresh: &str) -> Result<String> {
        let token: AccessToken = self
            .client
            .post_anonymous("/auth/token/refresh/", &json!({ "refresh": refresh }))
            .await?;
        Ok(token.access)
    }
}
