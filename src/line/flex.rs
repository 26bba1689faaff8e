//! Render [`Reply`] values as LINE Messaging API message objects.
//!
//! Flex JSON is built with `serde_json::json!`; the shapes follow the
//! Messaging API reference for text, flex bubble and carousel messages.

use serde_json::{Value, json};

use crate::reply::{MenuAction, Reply};
use crate::store::CatcherRecord;

/// Messages accepted by one reply call.
pub const MAX_REPLY_MESSAGES: usize = 5;

/// Bubbles accepted by one carousel.
pub const MAX_CAROUSEL_BUBBLES: usize = 12;

/// Longest `altText` the API accepts, in characters.
const MAX_ALT_TEXT_CHARS: usize = 400;

const CATCHER_ALT_TEXT: &str = "抓抓樂資訊";
const INFO_CARD_ALT_TEXT: &str = "資訊卡";

const STAR_ICON_URL: &str =
    "https://scdn.line-apps.com/n/channel_devcenter/img/fx/review_gold_star_28.png";
const MENU_HERO_URL: &str =
    "https://kamiq.club/upload/36/favicon_images/c1a630ef-c78f-43cc-b95e-0619f3f4da4d.jpg";

struct InfoCard {
    image_url: &'static str,
    label: &'static str,
    uri: &'static str,
}

const INFO_CARDS: &[InfoCard] = &[
    InfoCard {
        image_url: "https://kamiq.club/upload/36/news_images/6b8a6da0-cafb-4904-87b7-d9ffa01b2075.jpeg",
        label: "入群必讀",
        uri: "https://kamiq.club/news?hid=498&nid=214",
    },
    InfoCard {
        image_url: "https://i.imgur.com/Jo0JBxU.png",
        label: "KamiQ車友群官網",
        uri: "https://kamiq.club",
    },
    InfoCard {
        image_url: "https://i.imgur.com/rILuNbA.jpg",
        label: "一起抓抓樂",
        uri: "https://lin.ee/e6uqqPo",
    },
];

/// Greeting text for newly joined members.
pub fn welcome_text(names: &[String]) -> String {
    let names = if names.is_empty() {
        String::new()
    } else {
        format!(" {} ", names.join(","))
    };
    format!(
        "新朋友{names}您好!!\n\
         歡迎加入KamiQ車主限定群\n\
         \n\
         有任何問題可於\n\
         官網查詢、詢問機器人\n\
         或直接發問哦~\n\
         群組訊息較多，記得關提醒!!\n\
         \n\
         以下連結請務必看一下哦~"
    )
}

/// Convert replies to API message objects, capped at [`MAX_REPLY_MESSAGES`].
///
/// A welcome expands to two messages (text plus info carousel). Replies
/// that would render an empty carousel are dropped.
pub fn render_messages(replies: &[Reply]) -> Vec<Value> {
    let mut messages = Vec::new();
    for reply in replies {
        match reply {
            Reply::Text(text) => messages.push(text_message(text)),
            Reply::Catchers(catchers) => {
                let bubbles: Vec<Value> = catchers.iter().map(catcher_bubble).collect();
                if let Some(message) = carousel_message(CATCHER_ALT_TEXT, bubbles) {
                    messages.push(message);
                }
            }
            Reply::Menu { title, actions } => {
                let bubbles: Vec<Value> = actions.iter().map(menu_bubble).collect();
                if let Some(message) = carousel_message(title, bubbles) {
                    messages.push(message);
                }
            }
            Reply::Welcome { names } => {
                messages.push(text_message(&welcome_text(names)));
                let bubbles: Vec<Value> = INFO_CARDS.iter().map(info_bubble).collect();
                if let Some(message) = carousel_message(INFO_CARD_ALT_TEXT, bubbles) {
                    messages.push(message);
                }
            }
        }
    }

    if messages.len() > MAX_REPLY_MESSAGES {
        tracing::warn!(
            dropped = messages.len() - MAX_REPLY_MESSAGES,
            "Reply exceeds message limit, truncating"
        );
        messages.truncate(MAX_REPLY_MESSAGES);
    }
    messages
}

fn text_message(text: &str) -> Value {
    json!({ "type": "text", "text": text })
}

fn carousel_message(alt_text: &str, mut bubbles: Vec<Value>) -> Option<Value> {
    if bubbles.is_empty() {
        return None;
    }
    if bubbles.len() > MAX_CAROUSEL_BUBBLES {
        tracing::warn!(
            dropped = bubbles.len() - MAX_CAROUSEL_BUBBLES,
            "Carousel exceeds bubble limit, truncating"
        );
        bubbles.truncate(MAX_CAROUSEL_BUBBLES);
    }
    let alt_text: String = alt_text.chars().take(MAX_ALT_TEXT_CHARS).collect();
    Some(json!({
        "type": "flex",
        "altText": alt_text,
        "contents": { "type": "carousel", "contents": bubbles },
    }))
}

fn hero_image(url: &str, aspect_mode: &str) -> Value {
    json!({
        "type": "image",
        "url": url,
        "size": "full",
        "aspectRatio": "20:13",
        "aspectMode": aspect_mode,
    })
}

fn action_json(action: &MenuAction) -> Value {
    match action {
        MenuAction::Message { label, text } => {
            json!({ "type": "message", "label": label, "text": text })
        }
        MenuAction::Uri { label, uri } => json!({ "type": "uri", "label": label, "uri": uri }),
    }
}

fn button_footer(action: &MenuAction) -> Value {
    json!({
        "type": "box",
        "layout": "vertical",
        "contents": [{
            "type": "button",
            "style": "primary",
            "action": action_json(action),
        }],
    })
}

fn catcher_row(label: &str, value: &str) -> Value {
    // Flex rejects empty text components.
    let value = if value.is_empty() { "-" } else { value };
    json!({
        "type": "box",
        "layout": "baseline",
        "spacing": "sm",
        "contents": [
            { "type": "icon", "url": STAR_ICON_URL },
            { "type": "text", "text": label, "color": "#aaaaaa", "size": "md", "flex": 1 },
            { "type": "text", "text": value, "color": "#666666", "size": "md", "flex": 2, "wrap": true },
        ],
    })
}

fn catcher_bubble(catcher: &CatcherRecord) -> Value {
    json!({
        "type": "bubble",
        "hero": hero_image(&catcher.cover_url, "cover"),
        "body": {
            "type": "box",
            "layout": "vertical",
            "contents": [
                catcher_row("車牌號碼:", &catcher.plate_number),
                catcher_row("賴的名稱:", &catcher.user_name),
                catcher_row("出沒地點:", &catcher.haunted_places),
                catcher_row("所在群組:", &catcher.group_name),
                catcher_row("自我介紹:", &catcher.self_intro),
            ],
        },
    })
}

fn menu_bubble(action: &MenuAction) -> Value {
    json!({
        "type": "bubble",
        "hero": hero_image(MENU_HERO_URL, "fit"),
        "footer": button_footer(action),
    })
}

fn info_bubble(card: &InfoCard) -> Value {
    let action = MenuAction::Uri {
        label: card.label,
        uri: card.uri,
    };
    json!({
        "type": "bubble",
        "hero": hero_image(card.image_url, "cover"),
        "footer": button_footer(&action),
    })
}
