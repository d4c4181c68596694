//! API client for the screening, monitoring and analytics service.
//!
//! Every domain operation goes through [`ApiClient::request`], which attaches
//! the session's bearer token, sends JSON, and folds network, HTTP and
//! parsing failures into a single [`ApiError`].

use std::time::Duration;

use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::auth::{Identity, SharedSession};
use crate::config::Config;
use crate::models::{
    AuditLogPage, DashboardAnalytics, Entity, EntityList, LoginRequest, LoginResponse,
    NewEntity, ScreeningResult, Timeframe, Transaction, TransactionAnalysis,
};
use crate::utils::truncate;

use super::error::MAX_ERROR_BODY_LENGTH;
use super::{ApiError, QueryParams};

// ============================================================================
// Endpoints
// ============================================================================

const LOGIN_ENDPOINT: &str = "/auth/login";
const SCREENING_ENDPOINT: &str = "/v1/screening";
const ENTITIES_ENDPOINT: &str = "/v1/entities";
const TRANSACTION_MONITOR_ENDPOINT: &str = "/v1/transactions/monitor";
const DASHBOARD_ENDPOINT: &str = "/v1/analytics/dashboard";
const AUDIT_ENDPOINT: &str = "/v1/audit";

/// Request payload. Structured values are serialized to JSON text; text is
/// sent unchanged.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Text(String),
}

impl RequestBody {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::Encode(e.to_string()))
    }

    fn into_text(self) -> Result<String, ApiError> {
        match self {
            RequestBody::Json(value) => {
                serde_json::to_string(&value).map_err(|e| ApiError::Encode(e.to_string()))
            }
            RequestBody::Text(text) => Ok(text),
        }
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

/// API client for the screening service.
///
/// Holds no state of its own besides the shared session, which is read once
/// per request. A logout racing an in-flight request may let that request go
/// out with the old token; the server validates every request regardless.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SharedSession,
}

impl ApiClient {
    /// Create a client from the application configuration
    pub fn new(config: &Config, session: SharedSession) -> Result<Self, ApiError> {
        Self::with_base_url(
            config.api_base_url(),
            Duration::from_secs(config.request_timeout_secs()),
            session,
        )
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Duration,
        session: SharedSession,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let token = self.session.read().await.token().map(str::to_owned);
        if let Some(token) = token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::Encode(format!("invalid bearer token: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Send a request and return the parsed JSON body.
    ///
    /// The body is parsed as JSON whatever the status, because the service
    /// puts its error detail in an `error` field. No retries.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<RequestBody>,
    ) -> Result<Value, ApiError> {
        let url = self.url(endpoint);
        let mut builder = self
            .client
            .request(method.clone(), &url)
            .headers(self.headers().await?);
        if let Some(body) = body {
            builder = builder.body(body.into_text()?);
        }

        debug!(%method, endpoint, "Sending request");
        let response = builder.send().await.map_err(|e| {
            error!(%method, endpoint, error = %e, "API request failed to send");
            ApiError::Network(e)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            error!(%method, endpoint, %status, error = %e, "Failed to read response body");
            ApiError::Network(e)
        })?;

        match (status.is_success(), serde_json::from_str::<Value>(&text)) {
            (true, Ok(value)) => Ok(value),
            (true, Err(e)) => {
                error!(%method, endpoint, %status, error = %e, "Response body is not JSON");
                Err(ApiError::invalid_body(&e, &text))
            }
            (false, Ok(value)) => {
                let err = ApiError::from_body(status, &value);
                warn!(%method, endpoint, %status, error = %err.message(), "API request failed");
                Err(err)
            }
            (false, Err(_)) => {
                warn!(
                    %method,
                    endpoint,
                    %status,
                    body = %truncate(&text, MAX_ERROR_BODY_LENGTH),
                    "API request failed with a non-JSON body"
                );
                Err(ApiError::from_status(status))
            }
        }
    }

    /// [`request`](Self::request), then deserialize into the endpoint's type.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<RequestBody>,
    ) -> Result<T, ApiError> {
        let value = self.request(method, endpoint, body).await?;
        serde_json::from_value(value).map_err(|e| {
            warn!(endpoint, error = %e, "Response does not match the expected shape");
            ApiError::Schema(format!("{}: {}", endpoint, e))
        })
    }

    // ===== Session =====

    /// Exchange credentials for a token and store it in the session.
    ///
    /// A token that cannot be persisted is still held for this process.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = RequestBody::json(&LoginRequest { email, password })?;
        let response: LoginResponse = self
            .request_as(Method::POST, LOGIN_ENDPOINT, Some(body))
            .await?;

        if let Err(e) = self.replace_token(Some(response.token.clone())).await {
            warn!(error = %e, "Failed to persist session token");
        }
        debug!(user = response.user.display_name(), "Logged in");

        Ok(response)
    }

    /// Drop the session locally. Subsequent requests go out unauthenticated.
    pub async fn logout(&self) {
        if let Err(e) = self.replace_token(None).await {
            warn!(error = %e, "Failed to remove persisted session token");
        }
        debug!("Logged out");
    }

    /// Swap the in-memory token under the session lock, then persist on the
    /// blocking pool once the lock is released.
    async fn replace_token(&self, token: Option<String>) -> anyhow::Result<()> {
        let store = {
            let mut session = self.session.write().await;
            session.hold_token(token.clone());
            session.store()
        };
        tokio::task::spawn_blocking(move || match token {
            Some(token) => store.save(&token),
            None => store.clear(),
        })
        .await?
    }

    /// Identity decoded from the current token, if any
    pub async fn current_identity(&self) -> Option<Identity> {
        self.session.read().await.identity()
    }

    // ===== Screening =====

    pub async fn screen_entity(&self, entity: &NewEntity) -> Result<ScreeningResult, ApiError> {
        let body = RequestBody::json(entity)?;
        self.request_as(Method::POST, SCREENING_ENDPOINT, Some(body))
            .await
    }

    pub async fn get_entities(
        &self,
        params: impl Into<QueryParams>,
    ) -> Result<Vec<Entity>, ApiError> {
        let endpoint = params.into().append_to(ENTITIES_ENDPOINT);
        let list: EntityList = self.request_as(Method::GET, &endpoint, None).await?;
        Ok(list.into())
    }

    // ===== Monitoring =====

    pub async fn monitor_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<TransactionAnalysis, ApiError> {
        let body = RequestBody::json(transaction)?;
        self.request_as(Method::POST, TRANSACTION_MONITOR_ENDPOINT, Some(body))
            .await
    }

    // ===== Analytics & audit =====

    /// Fetch the dashboard; `None` means the default 30-day window.
    pub async fn get_dashboard_analytics(
        &self,
        timeframe: impl Into<Option<Timeframe>>,
    ) -> Result<DashboardAnalytics, ApiError> {
        let timeframe: Option<Timeframe> = timeframe.into();
        let timeframe = timeframe.unwrap_or_default();
        let endpoint = QueryParams::new()
            .with("timeframe", timeframe)
            .append_to(DASHBOARD_ENDPOINT);
        self.request_as(Method::GET, &endpoint, None).await
    }

    pub async fn get_audit_logs(
        &self,
        params: impl Into<QueryParams>,
    ) -> Result<AuditLogPage, ApiError> {
        let endpoint = params.into().append_to(AUDIT_ENDPOINT);
        self.request_as(Method::GET, &endpoint, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex, OnceLock};

    use crate::auth::{MemoryTokenStore, Session, TokenStore};
    use serde_json::json;

    fn client(base_url: &str) -> ApiClient {
        let session = Session::new(MemoryTokenStore::new()).into_shared();
        ApiClient::with_base_url(base_url, Duration::from_secs(5), session).unwrap()
    }

    #[test]
    fn test_url_joins_base_and_endpoint() {
        let api = client("http://localhost:8080/api/");
        assert_eq!(api.base_url(), "http://localhost:8080/api");
        assert_eq!(api.url(SCREENING_ENDPOINT), "http://localhost:8080/api/v1/screening");
    }

    #[test]
    fn test_request_body_encoding() {
        let body = RequestBody::from(json!({"name": "Acme"}));
        assert_eq!(body.into_text().unwrap(), r#"{"name":"Acme"}"#);

        let body = RequestBody::from("already encoded");
        assert_eq!(body.into_text().unwrap(), "already encoded");
    }

    #[tokio::test]
    async fn test_headers_follow_session() {
        let api = client("http://localhost");
        let headers = api.headers().await.unwrap();
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert!(!headers.contains_key(header::AUTHORIZATION));

        api.session().write().await.set_token("abc").unwrap();
        let headers = api.headers().await.unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer abc");

        api.logout().await;
        let headers = api.headers().await.unwrap();
        assert!(!headers.contains_key(header::AUTHORIZATION));
    }

    /// Records, on every write, whether the session lock was free.
    #[derive(Clone, Default)]
    struct LockRecordingStore {
        session: Arc<OnceLock<SharedSession>>,
        lock_free: Arc<Mutex<Vec<bool>>>,
    }

    impl LockRecordingStore {
        fn record(&self) -> anyhow::Result<()> {
            let free = self
                .session
                .get()
                .map(|s| s.try_write().is_ok())
                .unwrap_or(false);
            self.lock_free.lock().unwrap().push(free);
            Ok(())
        }
    }

    impl TokenStore for LockRecordingStore {
        fn load(&self) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn save(&self, _token: &str) -> anyhow::Result<()> {
            self.record()
        }

        fn clear(&self) -> anyhow::Result<()> {
            self.record()
        }
    }

    #[tokio::test]
    async fn test_token_is_persisted_outside_session_lock() {
        let store = LockRecordingStore::default();
        let session = Session::new(store.clone()).into_shared();
        let _ = store.session.set(session.clone());
        let api = ApiClient::with_base_url("http://localhost", Duration::from_secs(5), session)
            .unwrap();

        api.replace_token(Some("abc".to_string())).await.unwrap();
        assert_eq!(api.session().read().await.token(), Some("abc"));
        api.logout().await;
        assert_eq!(api.session().read().await.token(), None);

        assert_eq!(*store.lock_free.lock().unwrap(), vec![true, true]);
    }

    /// Collects the field names and values of every event.
    #[derive(Clone, Default)]
    struct EventFields(Arc<Mutex<Vec<Vec<(String, String)>>>>);

    struct FieldVisitor<'a>(&'a mut Vec<(String, String)>);

    impl tracing::field::Visit for FieldVisitor<'_> {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.0.push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    impl tracing::Subscriber for EventFields {
        fn enabled(&self, _: &tracing::Metadata<'_>) -> bool {
            true
        }

        fn new_span(&self, _: &tracing::span::Attributes<'_>) -> tracing::span::Id {
            tracing::span::Id::from_u64(1)
        }

        fn record(&self, _: &tracing::span::Id, _: &tracing::span::Record<'_>) {}

        fn record_follows_from(&self, _: &tracing::span::Id, _: &tracing::span::Id) {}

        fn event(&self, event: &tracing::Event<'_>) {
            let mut fields = Vec::new();
            event.record(&mut FieldVisitor(&mut fields));
            self.0.lock().unwrap().push(fields);
        }

        fn enter(&self, _: &tracing::span::Id) {}

        fn exit(&self, _: &tracing::span::Id) {}
    }

    #[tokio::test]
    async fn test_failure_event_has_single_message_field() {
        use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/v1/audit"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "forbidden"})))
            .mount(&server)
            .await;
        let api = client(&server.uri());

        let events = EventFields::default();
        let _guard = tracing::subscriber::set_default(events.clone());
        let err = api.request(Method::GET, AUDIT_ENDPOINT, None).await.unwrap_err();
        assert_eq!(err.message(), "forbidden");

        let recorded = events.0.lock().unwrap();
        let failure = recorded
            .iter()
            .find(|fields| fields.iter().any(|(k, v)| k == "message" && v == "API request failed"))
            .expect("no failure event recorded");
        let messages = failure.iter().filter(|(k, _)| k == "message").count();
        assert_eq!(messages, 1);
        assert!(failure.iter().any(|(k, v)| k == "error" && v == "forbidden"));
    }

    #[tokio::test]
    async fn test_unencodable_token_is_rejected() {
        let api = client("http://localhost");
        api.session().write().await.set_token("bad\ntoken").unwrap();
        assert!(matches!(api.headers().await, Err(ApiError::Encode(_))));
    }
}
