//! LINE Messaging API client.
//!
//! `ChatPlatform` is the seam the registration flow and the group router
//! talk through; `LineClient` is the reqwest implementation.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::ChannelError;
use crate::line::flex;
use crate::reply::Reply;

const DEFAULT_API_BASE: &str = "https://api.line.me";
const DEFAULT_DATA_API_BASE: &str = "https://api-data.line.me";

/// A group member's public profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub display_name: String,
    pub user_id: String,
}

/// Outbound operations the bot needs from the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Profile of `user_id` inside `group_id`, or `None` when the user is
    /// not a member.
    async fn group_member_profile(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Option<MemberProfile>, ChannelError>;

    /// Raw bytes of an uploaded message attachment.
    async fn message_content(&self, message_id: &str) -> Result<Vec<u8>, ChannelError>;

    /// Answer an event through its reply token.
    async fn reply(&self, reply_token: &str, replies: &[Reply]) -> Result<(), ChannelError>;
}

/// reqwest-backed LINE client.
pub struct LineClient {
    access_token: SecretString,
    api_base: String,
    data_api_base: String,
    client: reqwest::Client,
}

impl LineClient {
    pub fn new(access_token: SecretString) -> Self {
        Self::with_base_urls(access_token, DEFAULT_API_BASE, DEFAULT_DATA_API_BASE)
    }

    /// Point the client at other hosts (e.g. a mock server).
    pub fn with_base_urls(
        access_token: SecretString,
        api_base: impl Into<String>,
        data_api_base: impl Into<String>,
    ) -> Self {
        Self {
            access_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            data_api_base: data_api_base.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v2/bot/{path}", self.api_base)
    }

    fn data_api_url(&self, path: &str) -> String {
        format!("{}/v2/bot/{path}", self.data_api_base)
    }

    async fn get(&self, endpoint: &str, url: String) -> Result<reqwest::Response, ChannelError> {
        self.client
            .get(url)
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| ChannelError::RequestFailed {
                endpoint: endpoint.into(),
                reason: e.to_string(),
            })
    }
}

/// Turn a non-success response into `ChannelError::Status`.
async fn check_status(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, ChannelError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ChannelError::Status {
        endpoint: endpoint.into(),
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ChatPlatform for LineClient {
    async fn group_member_profile(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Option<MemberProfile>, ChannelError> {
        const ENDPOINT: &str = "group member profile";
        let resp = self
            .get(ENDPOINT, self.api_url(&format!("group/{group_id}/member/{user_id}")))
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(group_id, user_id, "Not a group member");
            return Ok(None);
        }

        let profile = check_status(ENDPOINT, resp)
            .await?
            .json::<MemberProfile>()
            .await
            .map_err(|e| ChannelError::InvalidResponse {
                endpoint: ENDPOINT.into(),
                reason: e.to_string(),
            })?;
        Ok(Some(profile))
    }

    async fn message_content(&self, message_id: &str) -> Result<Vec<u8>, ChannelError> {
        const ENDPOINT: &str = "message content";
        let resp = self
            .get(ENDPOINT, self.data_api_url(&format!("message/{message_id}/content")))
            .await?;

        let bytes = check_status(ENDPOINT, resp)
            .await?
            .bytes()
            .await
            .map_err(|e| ChannelError::InvalidResponse {
                endpoint: ENDPOINT.into(),
                reason: e.to_string(),
            })?;
        tracing::debug!(message_id, size = bytes.len(), "Fetched message content");
        Ok(bytes.to_vec())
    }

    async fn reply(&self, reply_token: &str, replies: &[Reply]) -> Result<(), ChannelError> {
        const ENDPOINT: &str = "reply";
        let messages = flex::render_messages(replies);
        if messages.is_empty() {
            tracing::debug!("Nothing to reply");
            return Ok(());
        }

        let body = serde_json::json!({
            "replyToken": reply_token,
            "messages": messages,
        });
        let resp = self
            .client
            .post(self.api_url("message/reply"))
            .bearer_auth(self.access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::RequestFailed {
                endpoint: ENDPOINT.into(),
                reason: e.to_string(),
            })?;
        check_status(ENDPOINT, resp).await?;

        tracing::info!(count = messages.len(), "Reply sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> LineClient {
        LineClient::with_base_urls(SecretString::from("test-token"), server.uri(), server.uri())
    }

    #[tokio::test]
    async fn member_profile_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/bot/group/G1/member/U1"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "displayName": "Kami",
                "userId": "U1",
                "pictureUrl": "https://example.com/p.png"
            })))
            .mount(&server)
            .await;

        let profile = client_for(&server)
            .group_member_profile("G1", "U1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.display_name, "Kami");
        assert_eq!(profile.user_id, "U1");
    }

    #[tokio::test]
    async fn member_profile_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/bot/group/G1/member/U2"))
            .respond_with(ResponseTemplate::new(404).set_body_string("{\"message\":\"Not found\"}"))
            .mount(&server)
            .await;

        let profile = client_for(&server).group_member_profile("G1", "U2").await.unwrap();
        assert!(profile.is_none());
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/bot/group/G1/member/U1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .group_member_profile("G1", "U1")
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::Status { status: 500, ref body, .. } if body == "boom"));
    }

    #[tokio::test]
    async fn fetches_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/bot/message/M1/content"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
            .mount(&server)
            .await;

        let bytes = client_for(&server).message_content("M1").await.unwrap();
        assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn reply_posts_rendered_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/message/reply"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(serde_json::json!({
                "replyToken": "R1",
                "messages": [{ "type": "text", "text": "hi" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .reply("R1", &[Reply::text("hi")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_reply_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        client_for(&server)
            .reply("R1", &[Reply::Catchers(vec![])])
            .await
            .unwrap();
    }
}
