/// REST client for the social backend
///
/// Every call attaches the bearer credential from client session storage
/// when one is present. Transport-level failures surface as
/// `EngineError::Transport` so callers can retry or downgrade.
use crate::api::types::{
    AckEnvelope, CommentDto, CommentRequest, CommentsEnvelope, CreatePostRequest, FeedEnvelope,
    PostDto, ReactEnvelope, ReactRequest, ReactionOutcome, ReportRequest,
};
use crate::api::FeedBackend;
use crate::config::ApiConfig;
use crate::error::{EngineError, Result};
use crate::models::{FeedKind, PostId, ReactionType};
use async_trait::async_trait;
use reqwest::RequestBuilder;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EngineError::Internal(format!("http client: {}", e)))?;

        Ok(ApiClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Simple success/failure envelope shared by the mutation endpoints
    async fn ack(&self, builder: RequestBuilder) -> Result<()> {
        let envelope: AckEnvelope = self
            .authorize(builder)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if envelope.success {
            Ok(())
        } else {
            Err(EngineError::Transport(
                envelope
                    .message
                    .unwrap_or_else(|| "backend rejected the request".to_string()),
            ))
        }
    }
}

#[async_trait]
impl FeedBackend for ApiClient {
    async fn fetch_page(&self, kind: FeedKind, page: u32, size: u32) -> Result<FeedEnvelope> {
        let envelope = self
            .authorize(self.http.get(self.url("feed")))
            .query(&[
                ("kind", kind.as_str().to_string()),
                ("page", page.to_string()),
                ("size", size.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(envelope)
    }

    async fn react(&self, post_id: &PostId, reaction: ReactionType) -> Result<ReactionOutcome> {
        let envelope: ReactEnvelope = self
            .authorize(self.http.post(self.url(&format!("post/{}/react", post_id))))
            .json(&ReactRequest {
                reaction_type: reaction,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !envelope.success {
            return Err(EngineError::Transport(
                "reaction not acknowledged".to_string(),
            ));
        }
        Ok(envelope.action)
    }

    async fn fetch_comments(
        &self,
        post_id: &PostId,
        page: u32,
        size: u32,
    ) -> Result<CommentsEnvelope> {
        let envelope = self
            .authorize(
                self.http
                    .get(self.url(&format!("post/{}/comments", post_id))),
            )
            .query(&[("page", page.to_string()), ("size", size.to_string())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(envelope)
    }

    async fn create_comment(
        &self,
        post_id: &PostId,
        content: &str,
        parent_comment_id: Option<&str>,
    ) -> Result<CommentDto> {
        let comment = self
            .authorize(
                self.http
                    .post(self.url(&format!("post/{}/comments", post_id))),
            )
            .json(&CommentRequest {
                content: content.to_string(),
                parent_comment_id: parent_comment_id.map(str::to_string),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(comment)
    }

    async fn save_post(&self, post_id: &PostId, saved: bool) -> Result<()> {
        let url = self.url(&format!("post/{}/save", post_id));
        let builder = if saved {
            self.http.post(url)
        } else {
            self.http.delete(url)
        };
        self.ack(builder).await
    }

    async fn hide_post(&self, post_id: &PostId) -> Result<()> {
        self.ack(self.http.post(self.url(&format!("post/{}/hide", post_id))))
            .await
    }

    async fn share_post(&self, post_id: &PostId) -> Result<()> {
        self.ack(self.http.post(self.url(&format!("post/{}/share", post_id))))
            .await
    }

    async fn report_post(&self, post_id: &PostId, report_type: &str, reason: &str) -> Result<()> {
        self.ack(
            self.http
                .post(self.url(&format!("post/{}/report", post_id)))
                .json(&ReportRequest {
                    report_type: report_type.to_string(),
                    reason: reason.to_string(),
                }),
        )
        .await
    }

    async fn create_post(&self, req: &CreatePostRequest) -> Result<PostDto> {
        let post = self
            .authorize(self.http.post(self.url("post/create")))
            .json(req)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(post)
    }

    async fn delete_post(&self, post_id: &PostId) -> Result<()> {
        self.ack(self.http.delete(self.url(&format!("post/{}", post_id))))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, token: Option<&str>) -> ApiClient {
        let config = ApiConfig {
            base_url: server.uri(),
            timeout_secs: 2,
        };
        ApiClient::new(&config, token.map(str::to_string)).unwrap()
    }

    #[tokio::test]
    async fn fetch_page_sends_kind_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .and(query_param("kind", "trending"))
            .and(query_param("page", "0"))
            .and(header("authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [],
                "totalPages": 0,
                "totalElements": 0
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("token-1"));
        let envelope = client
            .fetch_page(FeedKind::Trending, 0, 10)
            .await
            .unwrap();
        assert!(envelope.items.is_empty());
        assert_eq!(envelope.total_pages, 0);
    }

    #[tokio::test]
    async fn react_returns_backend_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/post/9/react"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "action": "updated"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let outcome = client
            .react(&PostId::from("9"), ReactionType::Love)
            .await
            .unwrap();
        assert_eq!(outcome, ReactionOutcome::Updated);
    }

    #[tokio::test]
    async fn non_success_status_maps_to_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/post/9/hide"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let err = client.hide_post(&PostId::from("9")).await.unwrap_err();
        assert!(matches!(err, EngineError::Transport(_)));
    }
}
