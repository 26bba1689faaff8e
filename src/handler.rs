//! EventHandler: routes each inbound event to the component that owns it
//! and sends whatever that component answers.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::commands::GroupCommandRouter;
use crate::line::{ChatPlatform, InboundEvent};
use crate::registration::RegistrationFlow;
use crate::reply::Reply;

pub struct EventHandler {
    platform: Arc<dyn ChatPlatform>,
    registration: RegistrationFlow,
    commands: GroupCommandRouter,
}

impl EventHandler {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        registration: RegistrationFlow,
        commands: GroupCommandRouter,
    ) -> Self {
        Self {
            platform,
            registration,
            commands,
        }
    }

    /// Process one event to completion.
    pub async fn handle(&self, event: InboundEvent) {
        let kind = event.kind();
        let (reply_token, replies) = match event {
            InboundEvent::DirectText {
                reply_token,
                user_id,
                text,
            } => {
                debug!(%user_id, "Direct text");
                (reply_token, self.registration.handle_text(&user_id, &text).await)
            }
            InboundEvent::DirectImage {
                reply_token,
                user_id,
                message_id,
            } => {
                debug!(%user_id, %message_id, "Direct image");
                (
                    reply_token,
                    self.registration.handle_image(&user_id, &message_id).await,
                )
            }
            InboundEvent::GroupText {
                reply_token,
                group_id,
                text,
            } => (reply_token, self.commands.handle_text(&group_id, &text).await),
            InboundEvent::MemberJoined {
                reply_token,
                group_id,
                user_ids,
            } => {
                debug!(%group_id, joined = user_ids.len(), "Members joined");
                (
                    reply_token,
                    self.commands.handle_member_joined(&group_id, &user_ids).await,
                )
            }
            InboundEvent::Ignored => return,
        };

        self.send(kind, &reply_token, &replies).await;
    }

    /// Send replies; failures are logged and dropped.
    async fn send(&self, kind: &str, reply_token: &str, replies: &[Reply]) {
        if replies.is_empty() {
            return;
        }
        if let Err(e) = self.platform.reply(reply_token, replies).await {
            let kinds: Vec<_> = replies.iter().map(Reply::kind).collect();
            warn!(event = kind, replies = ?kinds, "Failed to send reply: {e}");
        }
    }
}
