use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;
use crate::models::{Activities, Activity, ErrorBody, LoginGrant, MessageBody};
use crate::session::Session;

/// The activities backend as seen by the controller.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn activities(&self) -> Result<Vec<Activity>, ApiError>;
    async fn login(&self, username: &str, password: &str) -> Result<LoginGrant, ApiError>;
    async fn logout(&self, session: &Session) -> Result<(), ApiError>;
    async fn signup(&self, session: &Session, activity: &str, email: &str)
        -> Result<String, ApiError>;
    async fn unregister(
        &self,
        session: &Session,
        activity: &str,
        email: &str,
    ) -> Result<String, ApiError>;
}

pub struct SchoolClient {
    client: Client,
    base_url: String,
}

impl SchoolClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn headers(&self, session: Option<&Session>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = session.and_then(Session::token) {
            if let Ok(val) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, val);
            }
        }
        headers
    }

    fn participant_url(&self, activity: &str, action: &str, email: &str) -> String {
        format!(
            "{}/activities/{}/{}?email={}",
            self.base_url,
            urlencoding::encode(activity),
            action,
            urlencoding::encode(email)
        )
    }
}

/// Decode a 2xx body as `T`, or turn a non-2xx `{detail}` body into a
/// rejection. Bodies that are not JSON are parse failures either way.
async fn read_reply<T: DeserializeOwned>(what: &str, resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    let text = resp.text().await?;
    debug!("{} response (status {}): {}", what, status, text);

    if status.is_success() {
        return serde_json::from_str(&text).map_err(|source| ApiError::Parse { status, source });
    }
    let body: ErrorBody =
        serde_json::from_str(&text).map_err(|source| ApiError::Parse { status, source })?;
    Err(ApiError::Rejected {
        status,
        detail: body.detail_text(),
    })
}

#[async_trait]
impl Backend for SchoolClient {
    async fn activities(&self) -> Result<Vec<Activity>, ApiError> {
        let url = format!("{}/activities", self.base_url);

        let resp = self
            .client
            .get(&url)
            .headers(self.headers(None))
            .send()
            .await?;

        let Activities(list) = read_reply("Activities", resp).await?;
        debug!("Fetched {} activities", list.len());
        Ok(list)
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginGrant, ApiError> {
        let url = format!(
            "{}/login?username={}&password={}",
            self.base_url,
            urlencoding::encode(username),
            urlencoding::encode(password)
        );

        let resp = self
            .client
            .post(&url)
            .headers(self.headers(None))
            .send()
            .await?;

        read_reply("Login", resp).await
    }

    async fn logout(&self, session: &Session) -> Result<(), ApiError> {
        let url = format!("{}/logout", self.base_url);

        let resp = self
            .client
            .post(&url)
            .headers(self.headers(Some(session)))
            .send()
            .await?;

        debug!("Logout response status {}", resp.status());
        Ok(())
    }

    async fn signup(
        &self,
        session: &Session,
        activity: &str,
        email: &str,
    ) -> Result<String, ApiError> {
        let url = self.participant_url(activity, "signup", email);

        let resp = self
            .client
            .post(&url)
            .headers(self.headers(Some(session)))
            .send()
            .await?;

        let body: MessageBody = read_reply("Signup", resp).await?;
        Ok(body.message)
    }

    async fn unregister(
        &self,
        session: &Session,
        activity: &str,
        email: &str,
    ) -> Result<String, ApiError> {
        let url = self.participant_url(activity, "unregister", email);

        let resp = self
            .client
            .delete(&url)
            .headers(self.headers(Some(session)))
            .send()
            .await?;

        let body: MessageBody = read_reply("Unregister", resp).await?;
        Ok(body.message)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::{delete, get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;
    use crate::storage::memory::MemoryStore;

    /// (route, Authorization header) for every participant/logout call
    type Seen = Arc<Mutex<Vec<(String, Option<String>)>>>;

    fn bearer(headers: &HeaderMap) -> Option<String> {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    async fn login(Query(q): Query<HashMap<String, String>>) -> Response {
        if q.get("password").map(String::as_str) == Some("s3cret&pw") {
            Json(json!({"token": "t1", "username": q["username"]})).into_response()
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Invalid username or password"})),
            )
                .into_response()
        }
    }

    async fn logout(State(seen): State<Seen>, headers: HeaderMap) -> StatusCode {
        seen.lock().unwrap().push(("logout".into(), bearer(&headers)));
        StatusCode::NO_CONTENT
    }

    async fn signup(
        State(seen): State<Seen>,
        Path(name): Path<String>,
        Query(q): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Response {
        let email = q.get("email").cloned().unwrap_or_default();
        seen.lock()
            .unwrap()
            .push((format!("signup {name} {email}"), bearer(&headers)));
        if bearer(&headers).is_none() {
            return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"})))
                .into_response();
        }
        if email.is_empty() {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"detail": [{"loc": ["query", "email"], "msg": "field required"}]})),
            )
                .into_response();
        }
        if email == "a@x.com" {
            return (StatusCode::BAD_REQUEST, Json(json!({"detail": "Already registered"})))
                .into_response();
        }
        Json(json!({"message": format!("Signed up {email} for {name}")})).into_response()
    }

    async fn unregister(
        State(seen): State<Seen>,
        Path(name): Path<String>,
        Query(q): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Response {
        let email = q.get("email").cloned().unwrap_or_default();
        seen.lock()
            .unwrap()
            .push((format!("unregister {name} {email}"), bearer(&headers)));
        if name == "Chess Club" && email == "a@x.com" {
            return Json(json!({"message": format!("Unregistered {email} from {name}")}))
                .into_response();
        }
        (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Student is not signed up for this activity"})),
        )
            .into_response()
    }

    async fn mock_backend() -> (SchoolClient, Seen) {
        let seen: Seen = Arc::default();
        let app = Router::new()
            .route(
                "/activities",
                get(|| async {
                    Json(json!({
                        "Chess Club": {
                            "description": "Club",
                            "schedule": "Mon",
                            "max_participants": 5,
                            "participants": ["a@x.com"]
                        },
                        "Art Studio": {
                            "description": "Paint",
                            "schedule": "Wed",
                            "max_participants": 10,
                            "participants": []
                        }
                    }))
                }),
            )
            .route("/login", post(login))
            .route("/logout", post(logout))
            .route("/activities/{name}/signup", post(signup))
            .route("/activities/{name}/unregister", delete(unregister))
            .with_state(Arc::clone(&seen));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = SchoolClient::new(&format!("http://{addr}/")).unwrap();
        (client, seen)
    }

    fn signed_in() -> Session {
        let mut store = MemoryStore::default();
        let mut session = Session::default();
        session.establish("t1", "bob", &mut store);
        session
    }

    #[tokio::test]
    async fn test_activities_in_backend_order() {
        let (client, _) = mock_backend().await;
        let list = client.activities().await.unwrap();
        let names: Vec<&str> = list.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Chess Club", "Art Studio"]);
        assert_eq!(list[0].details.participants, ["a@x.com"]);
    }

    #[tokio::test]
    async fn test_login_encodes_credentials() {
        let (client, _) = mock_backend().await;
        let grant = client.login("bob smith", "s3cret&pw").await.unwrap();
        assert_eq!(grant.token, "t1");
        assert_eq!(grant.username, "bob smith");
    }

    #[tokio::test]
    async fn test_login_rejection_carries_detail() {
        let (client, _) = mock_backend().await;
        let err = client.login("bob", "wrong").await.unwrap_err();
        match err {
            ApiError::Rejected { status, detail } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(detail.as_deref(), Some("Invalid username or password"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_signup_sends_bearer_token() {
        let (client, seen) = mock_backend().await;
        let message = client
            .signup(&signed_in(), "Chess Club", "new+kid@x.com")
            .await
            .unwrap();
        assert_eq!(message, "Signed up new+kid@x.com for Chess Club");

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, "signup Chess Club new+kid@x.com");
        assert_eq!(seen[0].1.as_deref(), Some("Bearer t1"));
    }

    #[tokio::test]
    async fn test_signup_without_session_sends_no_header() {
        let (client, seen) = mock_backend().await;
        let err = client
            .signup(&Session::default(), "Chess Club", "b@x.com")
            .await
            .unwrap_err();
        assert_eq!(err.rejection_detail("?"), Some("Not authenticated"));
        assert_eq!(seen.lock().unwrap()[0].1, None);
    }

    #[tokio::test]
    async fn test_signup_duplicate_is_rejected() {
        let (client, _) = mock_backend().await;
        let err = client
            .signup(&signed_in(), "Chess Club", "a@x.com")
            .await
            .unwrap_err();
        assert_eq!(err.rejection_detail("?"), Some("Already registered"));
    }

    #[tokio::test]
    async fn test_validation_error_list_is_a_rejection() {
        let (client, _) = mock_backend().await;
        let err = client
            .signup(&signed_in(), "Chess Club", "")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Rejected { status, .. } if status == StatusCode::UNPROCESSABLE_ENTITY
        ));
        assert_eq!(err.rejection_detail("?"), Some("field required"));
    }

    #[tokio::test]
    async fn test_unregister() {
        let (client, seen) = mock_backend().await;
        let session = signed_in();

        let message = client
            .unregister(&session, "Chess Club", "a@x.com")
            .await
            .unwrap();
        assert_eq!(message, "Unregistered a@x.com from Chess Club");

        let err = client
            .unregister(&session, "Art Studio", "a@x.com")
            .await
            .unwrap_err();
        assert_eq!(
            err.rejection_detail("?"),
            Some("Student is not signed up for this activity")
        );

        let seen = seen.lock().unwrap();
        assert!(seen.iter().all(|(_, auth)| auth.as_deref() == Some("Bearer t1")));
    }

    #[tokio::test]
    async fn test_logout_sends_token() {
        let (client, seen) = mock_backend().await;
        client.logout(&signed_in()).await.unwrap();
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            [("logout".to_string(), Some("Bearer t1".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = SchoolClient::new(&format!("http://{addr}")).unwrap();
        let err = client.activities().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(err.rejection_detail("?"), None);
    }

    #[tokio::test]
    async fn test_html_error_page_is_parse_error() {
        let app = Router::new().route(
            "/activities",
            get(|| async { (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = SchoolClient::new(&format!("http://{addr}")).unwrap();
        let err = client.activities().await.unwrap_err();
        assert!(matches!(err, ApiError::Parse { .. }));
    }
}
