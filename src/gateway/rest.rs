use super::{Gateway, NewPostRecord, PostRecord, Session};
use crate::config::GatewayConfig;
use crate::error::FetchError;
use crate::feeds::RowRange;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const POSTS_TABLE: &str = "posts";

/// Talks to a PostgREST data API and its companion auth endpoint.
pub struct RestGateway {
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

/// Error body shape shared by the data and auth endpoints.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(alias = "msg", alias = "error_description")]
    message: Option<String>,
}

impl RestGateway {
    pub fn new(config: &GatewayConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("postfeed/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            client,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.anon_key)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
    }
}

async fn error_from_response(response: reqwest::Response) -> FetchError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| format!("Gateway error: {}", status));
    FetchError::new(message)
}

#[async_trait]
impl Gateway for RestGateway {
    async fn fetch_posts(&self, range: RowRange) -> Result<Vec<PostRecord>, FetchError> {
        debug!(offset = range.offset, limit = range.limit, "fetching posts");

        let response = self
            .authorized(self.client.get(self.table_url(POSTS_TABLE)))
            .query(&[
                ("select", "*".to_string()),
                ("order", "id.asc".to_string()),
                ("offset", range.offset.to_string()),
                ("limit", range.limit.to_string()),
            ])
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            warn!(error = %err, "post fetch rejected");
            return Err(err);
        }

        let records: Vec<PostRecord> = response.json().await?;
        Ok(records)
    }

    async fn upsert_post(&self, record: NewPostRecord) -> Result<(), FetchError> {
        debug!(title = %record.title, "upserting post");

        let response = self
            .authorized(self.client.post(self.table_url(POSTS_TABLE)))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[record])
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            warn!(error = %err, "post upsert rejected");
            return Err(err);
        }

        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>, FetchError> {
        let Some(token) = self.access_token.as_deref() else {
            return Ok(None);
        };

        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.json().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            _ => Err(error_from_response(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wiremock::matchers::{body_json, header, headers, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_for(server: &MockServer, access_token: Option<&str>) -> RestGateway {
        RestGateway::new(&GatewayConfig {
            url: format!("{}/", server.uri()),
            anon_key: "anon".to_string(),
            access_token: access_token.map(str::to_string),
            timeout_secs: 5,
        })
    }

    #[tokio::test]
    async fn test_fetch_posts_sends_range_and_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/posts"))
            .and(query_param("offset", "3"))
            .and(query_param("limit", "3"))
            .and(header("apikey", "anon"))
            .and(header("Authorization", "Bearer anon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": 4,
                    "title": "Fourth",
                    "content": "#four",
                    "image_url": "file:///photos/4.jpg",
                    "created_at": "2024-05-01T09:00:00+00:00"
                }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server, None);
        let records = gateway
            .fetch_posts(RowRange {
                offset: 3,
                limit: 3,
            })
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 4);
        assert_eq!(records[0].image_url.as_deref(), Some("file:///photos/4.jpg"));
    }

    #[tokio::test]
    async fn test_fetch_posts_surfaces_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/posts"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "code": "42P01",
                "message": "relation \"public.posts\" does not exist"
            })))
            .mount(&server)
            .await;

        let err = gateway_for(&server, None)
            .fetch_posts(RowRange {
                offset: 0,
                limit: 3,
            })
            .await
            .unwrap_err();
        assert_eq!(err.message, "relation \"public.posts\" does not exist");
    }

    #[tokio::test]
    async fn test_fetch_posts_falls_back_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = gateway_for(&server, None)
            .fetch_posts(RowRange {
                offset: 0,
                limit: 3,
            })
            .await
            .unwrap_err();
        assert!(err.message.contains("502"));
    }

    #[tokio::test]
    async fn test_upsert_post_posts_single_row() {
        let server = MockServer::start().await;
        let record = NewPostRecord {
            title: "Hello".to_string(),
            content: "first #post".to_string(),
            image_url: "/tmp/cat.png".to_string(),
            created_at: Utc::now(),
        };
        Mock::given(method("POST"))
            .and(path("/rest/v1/posts"))
            .and(header("Authorization", "Bearer user-token"))
            .and(headers(
                "Prefer",
                vec!["resolution=merge-duplicates", "return=minimal"],
            ))
            .and(body_json(serde_json::json!([record])))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        gateway_for(&server, Some("user-token"))
            .upsert_post(record)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_session_without_token_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let session = gateway_for(&server, None).current_session().await.unwrap();
        assert_eq!(session, None);
    }

    #[tokio::test]
    async fn test_session_with_valid_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("Authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "5a1c",
                "email": "admin@example.com",
                "role": "authenticated"
            })))
            .mount(&server)
            .await;

        let session = gateway_for(&server, Some("user-token"))
            .current_session()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.user_id, "5a1c");
        assert_eq!(session.email.as_deref(), Some("admin@example.com"));
    }

    #[tokio::test]
    async fn test_session_with_expired_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "msg": "invalid JWT"
            })))
            .mount(&server)
            .await;

        let session = gateway_for(&server, Some("stale"))
            .current_session()
            .await
            .unwrap();
        assert_eq!(session, None);
    }
}
