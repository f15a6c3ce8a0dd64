//! Authenticated API client
//!
//! On a 401 the client makes exactly one attempt to renew the access token
//! with the stored refresh token and replays the original request once.
//! If there is no refresh token, or renewal fails, the local session is
//! cleared and [`Error::SessionExpired`] is returned.

use crate::api::{ApiRequest, ApiResponse, HttpTransport, Method, MockTransport, Transport};
use crate::core::{ApiConfig, Error, Query, Result};
use crate::session::SessionStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

const REFRESH_PATH: &str = "/auth/token/refresh/";

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Best-effort human message from an error body: `message`, then `detail`
pub fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["message", "detail"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn check_status(response: ApiResponse) -> Result<ApiResponse> {
    if response.is_success() {
        return Ok(response);
    }
    let message = error_message(&response.body)
        .unwrap_or_else(|| format!("Request failed with status code {}", response.status));
    Err(Error::Api {
        status: response.status,
        message,
    })
}

fn decode<T: DeserializeOwned>(response: &ApiResponse) -> Result<T> {
    // Empty 2xx bodies decode as JSON null
    if response.body.is_empty() {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_slice(&response.body)?)
}

/// API client shared by all services
pub struct ApiClient {
    transport: Box<dyn Transport>,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(transport: Box<dyn Transport>, session: Arc<SessionStore>) -> Self {
        Self { transport, session }
    }

    /// Pick the transport from configuration
    pub fn from_config(config: &ApiConfig, session: Arc<SessionStore>) -> Result<Self> {
        let transport: Box<dyn Transport> = if config.mock_mode {
            log::info!("Using the built-in mock backend");
            Box::new(MockTransport::new())
        } else {
            log::info!("Using REST API at {}", config.base_url);
            Box::new(HttpTransport::new(config)?)
        };
        Ok(Self::new(transport, session))
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: Query) -> Result<T> {
        let response = self.execute(ApiRequest::new(Method::Get, path).with_query(query)).await?;
        decode(&response)
    }

    /// GET returning the raw body (file downloads)
    pub async fn get_bytes(&self, path: &str, query: Query) -> Result<Vec<u8>> {
        let response = self.execute(ApiRequest::new(Method::Get, path).with_query(query)).await?;
        Ok(response.body)
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let request = ApiRequest::new(Method::Post, path).with_body(serde_json::to_value(body)?);
        decode(&self.execute(request).await?)
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let request = ApiRequest::new(Method::Patch, path).with_body(serde_json::to_value(body)?);
        decode(&self.execute(request).await?)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(ApiRequest::new(Method::Delete, path)).await?;
        Ok(())
    }

    /// POST without credentials and without the 401 renewal (login, refresh)
    pub async fn post_anonymous<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let request = ApiRequest::new(Method::Post, path).with_body(serde_json::to_value(body)?);
        let response = check_status(self.transport.send(&request).await?)?;
        decode(&response)
    }

    async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        request.bearer = self.session.access_token();
        let response = self.transport.send(&request).await?;

        if response.status == 401 {
            log::debug!("{} {} unauthorized, renewing session", request.method, request.path);
            return self.reauthenticate_and_replay(request).await;
        }

        check_status(response)
    }

    async fn reauthenticate_and_replay(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        let Some(refresh) = self.session.refresh_token() else {
            self.expire_session();
            return Err(Error::SessionExpired);
        };

        let renewed = self
            .post_anonymous::<_, RefreshResponse>(REFRESH_PATH, &json!({ "refresh": refresh }))
            .await;

        let access = match renewed {
            Ok(r) => r.access,
            Err(e) => {
                log::warn!("Token renewal failed: {}", e);
                self.expire_session();
                return Err(Error::SessionExpired);
            }
        };

        self.session.replace_access_token(&access)?;
        request.bearer = Some(access);

        // Replayed once; a second failure is reported as-is
        check_status(self.transport.send(&request).await?)
    }

    fn expire_session(&self) {
        if let Err(e) = self.session.logout() {
            log::warn!("Failed to clear local session: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AuthResponse, User};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies with canned responses and records what it was sent
    struct ScriptedTransport {
        replies: Mutex<VecDeque<ApiResponse>>,
        sent: Arc<Mutex<Vec<ApiRequest>>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<ApiResponse>) -> (Self, Arc<Mutex<Vec<ApiRequest>>>) {
            let sent = Arc::new(Mutex::new(Vec::new()));
            let transport = Self {
                replies: Mutex::new(replies.into()),
                sent: sent.clone(),
            };
            (transport, sent)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
            self.sent.lock().unwrap().push(request.clone());
            Ok(self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ApiResponse::empty(500)))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn signed_in_store() -> Arc<SessionStore> {
        let store = SessionStore::in_memory().unwrap();
        store
            .login(AuthResponse {
                access: "old".into(),
                refresh: "r1".into(),
                user: User {
                    id: 1,
                    username: "admin".into(),
                    email: String::new(),
                    first_name: String::new(),
                    last_name: String::new(),
                    is_staff: true,
                    is_active: true,
                    date_joined: None,
                },
            })
            .unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_bearer_token_is_attached() {
        let (transport, sent) = ScriptedTransport::new(vec![ApiResponse::json(200, &json!(["Bloco A"]))]);
        let client = ApiClient::new(Box::new(transport), signed_in_store());

        let locations: Vec<String> = client.get("/gasometers/locations/", Vec::new()).await.unwrap();

        assert_eq!(locations, vec!["Bloco A".to_string()]);
        assert_eq!(sent.lock().unwrap()[0].bearer.as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_unauthorized_refreshes_and_replays_once() {
        let (transport, sent) = ScriptedTransport::new(vec![
            ApiResponse::empty(401),
            ApiResponse::json(200, &json!({"access": "new"})),
            ApiResponse::json(200, &json!({"total": 2, "novo": 1, "em_analise": 1, "resolvido": 0})),
        ]);
        let store = signed_in_store();
        let client = ApiClient::new(Box::new(transport), store.clone());

        let stats: crate::core::AlertStats = client.get("/alerts/stats/", Vec::new()).await.unwrap();

        assert_eq!(stats.total, 2);
        assert_eq!(store.access_token().as_deref(), Some("new"));

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1].path, REFRESH_PATH);
        assert_eq!(sent[1].bearer, None);
        assert_eq!(sent[1].body, Some(json!({"refresh": "r1"})));
        assert_eq!(sent[2].path, "/alerts/stats/");
        assert_eq!(sent[2].bearer.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_session() {
        let (transport, sent) = ScriptedTransport::new(vec![
            ApiResponse::empty(401),
            ApiResponse::json(401, &json!({"detail": "Token is invalid or expired"})),
        ]);
        let store = signed_in_store();
        let client = ApiClient::new(Box::new(transport), store.clone());

        let result: Result<Value> = client.get("/readings/", Vec::new()).await;

        assert!(matches!(result, Err(Error::SessionExpired)));
        assert!(store.current().is_none());
        assert_eq!(sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_clears_session_without_calls() {
        let (transport, sent) = ScriptedTransport::new(vec![ApiResponse::empty(401)]);
        let client = ApiClient::new(Box::new(transport), Arc::new(SessionStore::in_memory().unwrap()));

        let result = client.delete("/alerts/1/").await;

        assert!(matches!(result, Err(Error::SessionExpired)));
        assert_eq!(sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replay_is_not_retried_again() {
        let (transport, sent) = ScriptedTransport::new(vec![
            ApiResponse::empty(401),
            ApiResponse::json(200, &json!({"access": "new"})),
            ApiResponse::empty(401),
        ]);
        let client = ApiClient::new(Box::new(transport), signed_in_store());

        let result = client.delete("/alerts/1/").await;

        assert!(matches!(result, Err(Error::Api { status: 401, .. })));
        assert_eq!(sent.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_error_message_extraction() {
        let (transport, _) = ScriptedTransport::new(vec![
            ApiResponse::json(400, &json!({"message": "Identificador duplicado", "detail": "x"})),
            ApiResponse::json(404, &json!({"detail": "N\u{00E3}o encontrado."})),
            ApiResponse::empty(502),
        ]);
        let client = ApiClient::new(Box::new(transport), signed_in_store());

        let messages: Vec<String> = collect_messages(&client).await;
        assert_eq!(
            messages,
            vec![
                "Identificador duplicado".to_string(),
                "N\u{00E3}o encontrado.".to_string(),
                "Request failed with status code 502".to_string(),
            ]
        );
    }

    async fn collect_messages(client: &ApiClient) -> Vec<String> {
        let mut out = Vec::new();
        for _ in 0..3 {
            match client.get::<Value>("/gasometers/", Vec::new()).await {
                Err(Error::Api { message, .. }) => out.push(message),
                other => panic!("unexpected {:?}", other),
            }
        }
        out
    }

    #[test]
    fn test_error_message_ignores_non_json() {
        assert_eq!(error_message(b"<html>Bad Gateway</html>"), None);
        assert_eq!(error_message(br#"{"message": ""}"#), None);
    }
}
