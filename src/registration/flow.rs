//! RegistrationFlow: drives a catcher registration from the trigger phrase
//! to the fanned-out, persisted records.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::groups::{Group, GroupDirectory};
use crate::imgur::ImageHost;
use crate::line::ChatPlatform;
use crate::merge::merge_catchers;
use crate::reply::Reply;
use crate::store::{CatcherRecord, ProfileStore};

use super::prompts::{
    AUTHORIZATION_FAILED, REGISTRATION_COMPLETE, REGISTRATION_FAILED, TRIGGER_PHRASE,
    correction_for, prompt_for,
};
use super::state::{CatcherProfile, ConversationState, RegistrationStep, TextOutcome};
use super::store::ConversationStore;

/// Per-record result of persisting a finished profile.
///
/// Upserts run in group order and stop at the first failure; the failing
/// record and everything after it land in `failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub persisted: Vec<CatcherRecord>,
    pub failed: Vec<CatcherRecord>,
}

impl FanOutReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && !self.persisted.is_empty()
    }
}

/// Runs the registration conversation for one-to-one chats.
pub struct RegistrationFlow {
    platform: Arc<dyn ChatPlatform>,
    images: Arc<dyn ImageHost>,
    store: Arc<dyn ProfileStore>,
    conversations: Arc<ConversationStore>,
    groups: Arc<GroupDirectory>,
}

impl RegistrationFlow {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        images: Arc<dyn ImageHost>,
        store: Arc<dyn ProfileStore>,
        conversations: Arc<ConversationStore>,
        groups: Arc<GroupDirectory>,
    ) -> Self {
        Self {
            platform,
            images,
            store,
            conversations,
            groups,
        }
    }

    /// Handle a text message from `user_id`. Returns the replies to send;
    /// empty means stay silent.
    pub async fn handle_text(&self, user_id: &str, text: &str) -> Vec<Reply> {
        if text == TRIGGER_PHRASE {
            return self.start(user_id).await;
        }

        match self.conversations.update(user_id, |state| state.apply_text(text)) {
            None => Vec::new(),
            Some(TextOutcome::Advanced(step)) => {
                debug!(user_id, %step, "Registration advanced");
                vec![Reply::text(prompt_for(step))]
            }
            Some(TextOutcome::Rejected(e)) => {
                debug!(user_id, error = %e, "Registration answer rejected");
                vec![Reply::text(correction_for(&e))]
            }
            Some(TextOutcome::Ignored) => Vec::new(),
        }
    }

    /// Handle an image from `user_id`: the cover photo that completes a
    /// registration. Anything other than a well-formed completion is silent,
    /// except a failed fan-out, which tells the user to retry.
    pub async fn handle_image(&self, user_id: &str, message_id: &str) -> Vec<Reply> {
        let awaiting_cover = self
            .conversations
            .get(user_id)
            .is_some_and(|state| state.step == RegistrationStep::AwaitingCover);
        if !awaiting_cover {
            debug!(user_id, "Image outside cover step ignored");
            return Vec::new();
        }

        let image = match self.platform.message_content(message_id).await {
            Ok(image) => image,
            Err(e) => {
                warn!(user_id, message_id, "Failed to fetch cover image: {e}");
                return Vec::new();
            }
        };

        let cover_url = match self.images.upload(image).await {
            Ok(url) if !url.is_empty() => url,
            Ok(_) => {
                warn!(user_id, "Image host returned no link");
                return Vec::new();
            }
            Err(e) => {
                warn!(user_id, "Cover upload failed: {e}");
                return Vec::new();
            }
        };

        let (memberships, user_name) = self.regional_memberships(user_id).await;
        if memberships.is_empty() {
            info!(user_id, "No regional memberships at completion, aborting");
            return Vec::new();
        }

        let profile = self.conversations.update(user_id, |state| {
            if state.step != RegistrationStep::AwaitingCover {
                return None;
            }
            state.profile.cover_url = cover_url;
            state.profile.user_name = user_name.unwrap_or_default();
            state.profile.set_memberships(&memberships);
            Some(state.profile.clone())
        });
        let Some(profile) = profile.flatten() else {
            debug!(user_id, "Registration changed during upload, aborting");
            return Vec::new();
        };

        let report = self.fan_out(&profile).await;
        if !report.is_complete() {
            warn!(
                user_id,
                persisted = report.persisted.len(),
                failed = report.failed.len(),
                "Registration fan-out incomplete"
            );
            return vec![Reply::text(REGISTRATION_FAILED)];
        }

        self.conversations.clear(user_id);
        info!(
            user_id,
            plate = %profile.plate_number,
            groups = report.persisted.len(),
            "Registration complete"
        );
        let stored = self.stored_records(user_id, &report.persisted).await;
        vec![
            Reply::text(REGISTRATION_COMPLETE),
            Reply::Catchers(merge_catchers(&stored)),
        ]
    }

    /// Read back the rows just written for the confirmation card. Falls back
    /// to the in-memory records when the read fails or comes back empty.
    async fn stored_records(
        &self,
        user_id: &str,
        persisted: &[CatcherRecord],
    ) -> Vec<CatcherRecord> {
        match self.store.list_catchers_for_user(user_id).await {
            Ok(rows) => {
                let rows: Vec<_> = rows
                    .into_iter()
                    .filter(|row| persisted.iter().any(|p| p.group_id == row.group_id))
                    .collect();
                if rows.is_empty() {
                    persisted.to_vec()
                } else {
                    rows
                }
            }
            Err(e) => {
                warn!(user_id, "Reading back registration failed: {e}");
                persisted.to_vec()
            }
        }
    }

    /// Upsert one record per group membership, stopping at the first error.
    pub async fn fan_out(&self, profile: &CatcherProfile) -> FanOutReport {
        let mut report = FanOutReport::default();
        let mut records = profile.fan_out().into_iter();

        for record in records.by_ref() {
            match self.store.upsert_catcher(&record).await {
                Ok(_) => report.persisted.push(record),
                Err(e) => {
                    warn!(
                        user_id = %record.user_id,
                        group_id = %record.group_id,
                        "Catcher upsert failed: {e}"
                    );
                    report.failed.push(record);
                    break;
                }
            }
        }
        report.failed.extend(records);
        report
    }

    async fn start(&self, user_id: &str) -> Vec<Reply> {
        if !self.is_regional_member(user_id).await {
            info!(user_id, "Registration refused, not in a regional group");
            return vec![Reply::text(AUTHORIZATION_FAILED)];
        }

        let state = ConversationState::start(user_id);
        let prompt = prompt_for(state.step);
        self.conversations.set(user_id, state);
        info!(user_id, "Registration started");
        vec![Reply::text(prompt)]
    }

    /// True as soon as one regional group confirms membership.
    async fn is_regional_member(&self, user_id: &str) -> bool {
        for group in self.groups.regional() {
            match self.platform.group_member_profile(&group.id, user_id).await {
                Ok(Some(_)) => return true,
                Ok(None) => {}
                Err(e) => {
                    warn!(user_id, group_id = %group.id, "Membership check failed: {e}");
                }
            }
        }
        false
    }

    /// Every regional group the user is in, plus their display name from
    /// the first group that answered.
    async fn regional_memberships(&self, user_id: &str) -> (Vec<Group>, Option<String>) {
        let mut memberships = Vec::new();
        let mut user_name = None;
        for group in self.groups.regional() {
            match self.platform.group_member_profile(&group.id, user_id).await {
                Ok(Some(profile)) => {
                    user_name.get_or_insert(profile.display_name);
                    memberships.push(group.clone());
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(user_id, group_id = %group.id, "Membership check failed: {e}");
                }
            }
        }
        (memberships, user_name)
    }
}
