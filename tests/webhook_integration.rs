//! Integration tests for the webhook endpoint.
//!
//! Each test builds the real Axum router over stub LINE / Imgur clients and
//! an in-memory libSQL store, then drives it with signed webhook payloads.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use secrecy::SecretString;
use tokio::time::timeout;
use tower::ServiceExt;

use kamiq_bot::commands::GroupCommandRouter;
use kamiq_bot::error::{ChannelError, UploadError};
use kamiq_bot::groups::{Group, GroupDirectory};
use kamiq_bot::handler::EventHandler;
use kamiq_bot::imgur::ImageHost;
use kamiq_bot::line::webhook::sign;
use kamiq_bot::line::{ChatPlatform, MemberProfile};
use kamiq_bot::registration::prompts::{ASK_COVER, ASK_INTRO, ASK_PLACES, ASK_PLATE, REGISTRATION_COMPLETE};
use kamiq_bot::registration::{ConversationStore, RegistrationFlow};
use kamiq_bot::reply::Reply;
use kamiq_bot::server::{AppState, webhook_routes};
use kamiq_bot::store::{LibSqlBackend, ProfileStore};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const SECRET: &str = "test-channel-secret";

/// Stub LINE client: fixed memberships, records every reply.
struct StubPlatform {
    members: HashMap<(String, String), String>,
    sent: Mutex<Vec<(String, Vec<Reply>)>>,
}

impl StubPlatform {
    fn sent(&self) -> Vec<(String, Vec<Reply>)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatPlatform for StubPlatform {
    async fn group_member_profile(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Option<MemberProfile>, ChannelError> {
        Ok(self
            .members
            .get(&(group_id.to_string(), user_id.to_string()))
            .map(|name| MemberProfile {
                display_name: name.clone(),
                user_id: user_id.to_string(),
            }))
    }

    async fn message_content(&self, _message_id: &str) -> Result<Vec<u8>, ChannelError> {
        Ok(vec![0xFF, 0xD8, 0xFF])
    }

    async fn reply(&self, reply_token: &str, replies: &[Reply]) -> Result<(), ChannelError> {
        self.sent
            .lock()
            .unwrap()
            .push((reply_token.to_string(), replies.to_vec()));
        Ok(())
    }
}

struct StubImageHost;

#[async_trait]
impl ImageHost for StubImageHost {
    async fn upload(&self, _image: Vec<u8>) -> Result<String, UploadError> {
        Ok("https://i.imgur.com/stub.jpg".to_string())
    }
}

struct TestApp {
    app: Router,
    platform: Arc<StubPlatform>,
    store: Arc<LibSqlBackend>,
}

async fn build_app() -> TestApp {
    let platform = Arc::new(StubPlatform {
        members: [
            (("C-north", "U1"), "Kami"),
            (("C-south", "U1"), "Kami"),
            (("C-general", "U2"), "Newbie"),
        ]
        .into_iter()
        .map(|((g, u), name)| ((g.to_string(), u.to_string()), name.to_string()))
        .collect(),
        sent: Mutex::new(Vec::new()),
    });
    let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let groups = Arc::new(GroupDirectory::new(
        vec![Group::new("C-general", "大一群")],
        vec![Group::new("C-north", "北一群"), Group::new("C-south", "南區群")],
    ));

    let flow = RegistrationFlow::new(
        platform.clone(),
        Arc::new(StubImageHost),
        store.clone(),
        ConversationStore::new(Duration::from_secs(600)),
        groups.clone(),
    );
    let commands = GroupCommandRouter::new(platform.clone(), store.clone(), groups);
    let handler = Arc::new(EventHandler::new(platform.clone(), flow, commands));

    let app = webhook_routes(AppState {
        channel_secret: SecretString::from(SECRET),
        handler,
    });
    TestApp {
        app,
        platform,
        store,
    }
}

fn direct_text(token: &str, user_id: &str, text: &str) -> Value {
    json!({
        "type": "message",
        "replyToken": token,
        "source": { "type": "user", "userId": user_id },
        "message": { "type": "text", "id": format!("m-{token}"), "text": text }
    })
}

fn direct_image(token: &str, user_id: &str) -> Value {
    json!({
        "type": "message",
        "replyToken": token,
        "source": { "type": "user", "userId": user_id },
        "message": { "type": "image", "id": format!("m-{token}") }
    })
}

fn group_text(token: &str, group_id: &str, text: &str) -> Value {
    json!({
        "type": "message",
        "replyToken": token,
        "source": { "type": "group", "groupId": group_id, "userId": "U9" },
        "message": { "type": "text", "id": format!("m-{token}"), "text": text }
    })
}

fn signed_request(body: Vec<u8>) -> Request<Body> {
    let signature = sign(SECRET.as_bytes(), &body).unwrap();
    Request::builder()
        .method("POST")
        .uri("/callback")
        .header("content-type", "application/json")
        .header("x-line-signature", signature)
        .body(Body::from(body))
        .unwrap()
}

async fn deliver(app: &Router, events: Vec<Value>) -> StatusCode {
    let body = serde_json::to_vec(&json!({ "destination": "Ubot", "events": events })).unwrap();
    let resp = timeout(TEST_TIMEOUT, app.clone().oneshot(signed_request(body)))
        .await
        .expect("request timed out")
        .unwrap();
    resp.status()
}

fn first_text(replies: &[Reply]) -> &str {
    match replies.first() {
        Some(Reply::Text(text)) => text,
        other => panic!("expected a text reply, got {other:?}"),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_endpoint() {
    let t = build_app().await;
    let resp = t
        .app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let t = build_app().await;
    let req = Request::builder()
        .method("POST")
        .uri("/callback")
        .body(Body::from(r#"{"events":[]}"#))
        .unwrap();
    let resp = t.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_signature_is_rejected_without_side_effects() {
    let t = build_app().await;
    let body = serde_json::to_vec(&json!({
        "events": [group_text("R1", "C-general", "?1234")]
    }))
    .unwrap();
    let req = Request::builder()
        .method("POST")
        .uri("/callback")
        .header("x-line-signature", sign(b"wrong-secret", &body).unwrap())
        .body(Body::from(body))
        .unwrap();

    let resp = t.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(t.platform.sent().is_empty());
    assert_eq!(t.store.increment_wild_catcher("1234").await.unwrap(), 1);
}

#[tokio::test]
async fn malformed_payload_is_a_server_error() {
    let t = build_app().await;
    let resp = t
        .app
        .clone()
        .oneshot(signed_request(b"{not json".to_vec()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn full_registration_over_the_webhook() {
    let t = build_app().await;

    let steps = [
        ("R1", "一起抓抓樂", ASK_PLATE),
        ("R2", "abc-1234", ASK_PLACES),
        ("R3", "龜山島", ASK_INTRO),
        ("R4", "52~~", ASK_COVER),
    ];
    for (token, text, _) in steps {
        assert_eq!(deliver(&t.app, vec![direct_text(token, "U1", text)]).await, StatusCode::OK);
    }
    assert_eq!(deliver(&t.app, vec![direct_image("R5", "U1")]).await, StatusCode::OK);

    let sent = t.platform.sent();
    assert_eq!(sent.len(), 5);
    for ((token, _, prompt), (sent_token, replies)) in steps.iter().zip(&sent) {
        assert_eq!(sent_token, token);
        assert_eq!(first_text(replies), *prompt);
    }

    let (token, replies) = &sent[4];
    assert_eq!(token, "R5");
    assert_eq!(first_text(replies), REGISTRATION_COMPLETE);
    let Some(Reply::Catchers(cards)) = replies.get(1) else {
        panic!("expected catcher cards, got {replies:?}");
    };
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].group_name, "北一群/南區群");
    assert_eq!(cards[0].cover_url, "https://i.imgur.com/stub.jpg");

    let stored = t.store.list_catchers_for_user("U1").await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|r| r.plate_number == "ABC-1234" && r.self_intro == "我愛蛇哥"));

    // The registered plate is now found from any group.
    deliver(&t.app, vec![group_text("R6", "C-general", "？1234")]).await;
    let sent = t.platform.sent();
    let (_, replies) = sent.last().unwrap();
    assert!(matches!(replies.as_slice(), [Reply::Catchers(cards)] if cards.len() == 1));
}

#[tokio::test]
async fn events_in_one_delivery_run_in_order() {
    let t = build_app().await;
    let status = deliver(
        &t.app,
        vec![
            direct_text("R1", "U1", "一起抓抓樂"),
            direct_text("R2", "U1", "ABC-1234"),
            group_text("R3", "C-general", "?5678"),
            group_text("R4", "C-general", "5678？"),
            group_text("R5", "C-general", "just chatting"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let sent = t.platform.sent();
    let tokens: Vec<_> = sent.iter().map(|(token, _)| token.as_str()).collect();
    assert_eq!(tokens, ["R1", "R2", "R3", "R4"]);
    assert_eq!(first_text(&sent[1].1), ASK_PLACES);
    assert!(first_text(&sent[2].1).ends_with("目前該車號已被發現 1 次"));
    assert!(first_text(&sent[3].1).ends_with("目前該車號已被發現 2 次"));
}

#[tokio::test]
async fn non_member_cannot_register() {
    let t = build_app().await;
    deliver(&t.app, vec![direct_text("R1", "U2", "一起抓抓樂")]).await;
    deliver(&t.app, vec![direct_text("R2", "U2", "ABC-1234")]).await;

    let sent = t.platform.sent();
    assert_eq!(sent.len(), 1, "follow-up text must be ignored");
    assert_eq!(first_text(&sent[0].1), "授權未通過，請確認已在 KamiQ 車主限定群");
}

#[tokio::test]
async fn member_joined_sends_welcome() {
    let t = build_app().await;
    let event = json!({
        "type": "memberJoined",
        "replyToken": "R1",
        "source": { "type": "group", "groupId": "C-general" },
        "joined": { "members": [
            { "type": "user", "userId": "U2" },
            { "type": "user", "userId": "U-unknown" }
        ] }
    });
    assert_eq!(deliver(&t.app, vec![event]).await, StatusCode::OK);

    let sent = t.platform.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, vec![Reply::Welcome { names: vec!["Newbie".into()] }]);
}

#[tokio::test]
async fn keyword_menu_in_group() {
    let t = build_app().await;
    deliver(&t.app, vec![group_text("R1", "C-general", "？指令")]).await;

    let sent = t.platform.sent();
    let [(_, replies)] = sent.as_slice() else {
        panic!("expected one reply, got {sent:?}");
    };
    let [Reply::Menu { title, actions }] = replies.as_slice() else {
        panic!("expected a menu, got {replies:?}");
    };
    assert_eq!(title, "？指令");
    assert_eq!(actions.len(), 11);
}
