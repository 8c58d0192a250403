//! HTTP client for the CTFd `/api/v1` challenge endpoints.

use std::time::Duration;

use async_trait::async_trait;
use ctfsync_core::ChallengeId;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::wire::{
    ChallengeDetail, ChallengeStub, Envelope, FileRecord, FlagRecord, HintRecord,
    RequirementsRecord, TagRecord, TopicRecord,
};
use crate::{CatalogApi, ClientError};

/// How the client authenticates against CTFd.
#[derive(Clone)]
pub enum Auth {
    /// Admin API token, sent as `Authorization: Token <key>`.
    Token(String),
    /// Value of an admin's `session` cookie.
    Session(String),
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Token(_) => f.write_str("Auth::Token(<redacted>)"),
            Auth::Session(_) => f.write_str("Auth::Session(<redacted>)"),
        }
    }
}

/// CTFd client for a single instance.
pub struct CtfdClient {
    client: reqwest::Client,
    base_url: String,
}

impl CtfdClient {
    /// Create a client for the given CTFd base URL.
    ///
    /// `base_url` is the instance root, like `https://ctf.example.org`
    /// (a trailing slash is tolerated). `timeout` bounds every request.
    pub fn new(base_url: String, auth: Auth, timeout: Duration) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let (name, value) = match &auth {
            Auth::Token(key) => (AUTHORIZATION, format!("Token {key}")),
            Auth::Session(session) => (COOKIE, format!("session={session}")),
        };
        let mut value = HeaderValue::from_str(&value)
            .map_err(|e| ClientError::Config(format!("credential is not a valid header: {e}")))?;
        value.set_sensitive(true);
        headers.insert(name, value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET an API path and unwrap the CTFd envelope.
    ///
    /// Returns `None` when the server answered `"data": null`.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ClientError> {
        let url = format!("{}/api/v1{}", self.base_url, path);

        debug!(url = %url, "GET");
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
        if !envelope.success {
            return Err(ClientError::Api(envelope.failure_reason()));
        }
        Ok(envelope.data)
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ClientError> {
        Ok(self.get(path).await?.unwrap_or_default())
    }
}

#[async_trait]
impl CatalogApi for CtfdClient {
    async fn list_challenges(&self) -> Result<Vec<ChallengeStub>, ClientError> {
        let stubs: Vec<ChallengeStub> = self.get_list("/challenges?view=admin").await?;
        info!(count = stubs.len(), "listed challenges");
        Ok(stubs)
    }

    async fn get_challenge(&self, id: ChallengeId) -> Result<ChallengeDetail, ClientError> {
        self.get(&format!("/challenges/{id}"))
            .await?
            .ok_or_else(|| ClientError::Api(format!("challenge {id} came back without data")))
    }

    async fn get_requirements(&self, id: ChallengeId) -> Result<RequirementsRecord, ClientError> {
        Ok(self
            .get(&format!("/challenges/{id}/requirements"))
            .await?
            .unwrap_or_default())
    }

    async fn get_flags(&self, id: ChallengeId) -> Result<Vec<FlagRecord>, ClientError> {
        self.get_list(&format!("/challenges/{id}/flags")).await
    }

    async fn get_hints(&self, id: ChallengeId) -> Result<Vec<HintRecord>, ClientError> {
        self.get_list(&format!("/challenges/{id}/hints")).await
    }

    async fn get_files(&self, id: ChallengeId) -> Result<Vec<FileRecord>, ClientError> {
        self.get_list(&format!("/challenges/{id}/files")).await
    }

    async fn get_tags(&self, id: ChallengeId) -> Result<Vec<TagRecord>, ClientError> {
        self.get_list(&format!("/challenges/{id}/tags")).await
    }

    async fn get_topics(&self, id: ChallengeId) -> Result<Vec<TopicRecord>, ClientError> {
        self.get_list(&format!("/challenges/{id}/topics")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CtfdClient {
        CtfdClient::new(
            server.uri(),
            Auth::Token("ctfd_admin_key".into()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn ok(data: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": data }))
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = CtfdClient::new(
            "http://localhost:8000/".into(),
            Auth::Token("k".into()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn auth_debug_is_redacted() {
        let debug = format!("{:?}", Auth::Session("s3cr3t".into()));
        assert!(!debug.contains("s3cr3t"));
    }

    #[test]
    fn invalid_credential_rejected() {
        let result = CtfdClient::new(
            "http://localhost".into(),
            Auth::Token("line\nbreak".into()),
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[tokio::test]
    async fn list_challenges_sends_token_and_admin_view() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/challenges"))
            .and(query_param("view", "admin"))
            .and(header("Authorization", "Token ctfd_admin_key"))
            .respond_with(ok(json!([
                { "id": 3, "name": "c", "type": "standard" },
                { "id": 1, "name": "a", "type": "dynamic" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let stubs = client_for(&server).list_challenges().await.unwrap();
        let ids: Vec<u64> = stubs.iter().map(|s| s.id).collect();
        assert_eq!(ids, [3, 1]);
    }

    #[tokio::test]
    async fn session_auth_sends_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/challenges"))
            .and(header("Cookie", "session=abc"))
            .respond_with(ok(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = CtfdClient::new(
            server.uri(),
            Auth::Session("abc".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(client.list_challenges().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn server_error_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/challenges"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
            .mount(&server)
            .await;

        let err = client_for(&server).list_challenges().await.unwrap_err();
        match err {
            ClientError::Server { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "Forbidden");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unsuccessful_envelope_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/challenges/4/flags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "errors": { "challenge": "not found" }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).get_flags(ChallengeId(4)).await.unwrap_err();
        assert!(matches!(err, ClientError::Api(_)));
    }

    #[tokio::test]
    async fn malformed_body_is_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/challenges"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).list_challenges().await.unwrap_err();
        assert!(matches!(err, ClientError::Json(_)));
    }

    #[tokio::test]
    async fn null_requirements_default_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/challenges/7/requirements"))
            .respond_with(ok(serde_json::Value::Null))
            .mount(&server)
            .await;

        let reqs = client_for(&server)
            .get_requirements(ChallengeId(7))
            .await
            .unwrap();
        assert_eq!(reqs, RequirementsRecord::default());
    }

    #[tokio::test]
    async fn missing_challenge_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/challenges/99"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "success": false })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_challenge(ChallengeId(99))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn nested_collections_keep_server_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/challenges/2/hints"))
            .respond_with(ok(json!([
                { "id": 9, "challenge_id": 2, "content": "second", "cost": 10, "requirements": { "prerequisites": [8] } },
                { "id": 8, "challenge_id": 2, "content": "first", "cost": 0 }
            ])))
            .mount(&server)
            .await;

        let hints = client_for(&server).get_hints(ChallengeId(2)).await.unwrap();
        assert_eq!(hints.len(), 2);
        assert_eq!(hints[0].id, 9);
        assert_eq!(
            hints[0].requirements.as_ref().map(|r| r.prerequisites.clone()),
            Some(vec![8])
        );
        assert!(hints[1].requirements.is_none());
    }
}
