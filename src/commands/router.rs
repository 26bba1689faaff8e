//! GroupCommandRouter: answers `?keyword` messages and member joins in
//! group chats.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::groups::GroupDirectory;
use crate::line::ChatPlatform;
use crate::merge::merge_catchers;
use crate::reply::{MenuAction, Reply};
use crate::store::ProfileStore;

use super::menu;

const ASCII_QUESTION: char = '?';
const FULLWIDTH_QUESTION: char = '？';

/// Keyword that replays the welcome message.
pub const TEST_WELCOME_KEYWORD: &str = "test welcome";

/// Name used by the replayed welcome.
const TEST_WELCOME_NAME: &str = "test";

/// A parsed group command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupCommand<'a> {
    Menu(&'static [MenuAction]),
    TestWelcome,
    /// Exactly four ASCII digits: a partial plate to look up.
    PlateLookup(&'a str),
    Unknown,
}

/// Strip one leading and one trailing question mark of either width.
///
/// Returns `None` when the text neither starts nor ends with one, i.e. it
/// is not addressed to the bot.
pub fn command_key(text: &str) -> Option<&str> {
    let marks = [ASCII_QUESTION, FULLWIDTH_QUESTION];
    if !text.starts_with(marks) && !text.ends_with(marks) {
        return None;
    }
    let key = text.strip_prefix(ASCII_QUESTION).unwrap_or(text);
    let key = key.strip_prefix(FULLWIDTH_QUESTION).unwrap_or(key);
    let key = key.strip_suffix(ASCII_QUESTION).unwrap_or(key);
    let key = key.strip_suffix(FULLWIDTH_QUESTION).unwrap_or(key);
    Some(key)
}

/// Classify a stripped key.
pub fn parse_command(key: &str) -> GroupCommand<'_> {
    if key == TEST_WELCOME_KEYWORD {
        return GroupCommand::TestWelcome;
    }
    if let Some(actions) = menu::lookup(key) {
        return GroupCommand::Menu(actions);
    }
    if is_partial_plate(key) {
        return GroupCommand::PlateLookup(key);
    }
    GroupCommand::Unknown
}

fn is_partial_plate(key: &str) -> bool {
    key.len() == 4 && key.bytes().all(|b| b.is_ascii_digit())
}

pub struct GroupCommandRouter {
    platform: Arc<dyn ChatPlatform>,
    store: Arc<dyn ProfileStore>,
    groups: Arc<GroupDirectory>,
}

impl GroupCommandRouter {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        store: Arc<dyn ProfileStore>,
        groups: Arc<GroupDirectory>,
    ) -> Self {
        Self {
            platform,
            store,
            groups,
        }
    }

    /// Handle a text message posted in `group_id`.
    pub async fn handle_text(&self, group_id: &str, text: &str) -> Vec<Reply> {
        let Some(key) = command_key(text) else {
            return Vec::new();
        };

        match parse_command(key) {
            GroupCommand::Menu(actions) => {
                debug!(group_id, key, "Menu requested");
                vec![Reply::Menu {
                    title: text.to_string(),
                    actions,
                }]
            }
            GroupCommand::TestWelcome => vec![Reply::Welcome {
                names: vec![TEST_WELCOME_NAME.to_string()],
            }],
            GroupCommand::PlateLookup(fragment) => self.lookup_plate(group_id, fragment).await,
            GroupCommand::Unknown => Vec::new(),
        }
    }

    /// Registered catchers matching `fragment`, or a wild sighting count
    /// when nobody has registered it.
    async fn lookup_plate(&self, group_id: &str, fragment: &str) -> Vec<Reply> {
        let found = match self.store.search_catchers_by_plate(group_id, fragment).await {
            Ok(found) => found,
            Err(e) => {
                warn!(group_id, fragment, "Plate search failed: {e}");
                return Vec::new();
            }
        };

        if !found.is_empty() {
            return vec![Reply::Catchers(merge_catchers(&found))];
        }

        match self.store.increment_wild_catcher(fragment).await {
            Ok(count) => {
                info!(group_id, plate = fragment, count, "Wild catcher spotted");
                vec![Reply::Text(wild_catcher_text(count))]
            }
            Err(e) => {
                warn!(group_id, plate = fragment, "Wild catcher increment failed: {e}");
                Vec::new()
            }
        }
    }

    /// Welcome members who just joined a recognized group.
    pub async fn handle_member_joined(&self, group_id: &str, user_ids: &[String]) -> Vec<Reply> {
        if !self.groups.is_recognized(group_id) {
            debug!(group_id, "Join in unrecognized group ignored");
            return Vec::new();
        }

        let mut names = Vec::new();
        for user_id in user_ids {
            match self.platform.group_member_profile(group_id, user_id).await {
                Ok(Some(profile)) => names.push(profile.display_name),
                Ok(None) => debug!(group_id, %user_id, "Joined member has no profile"),
                Err(e) => warn!(group_id, %user_id, "Profile lookup failed: {e}"),
            }
        }

        vec![Reply::Welcome { names }]
    }
}

/// Reply for a plate nobody has registered.
pub fn wild_catcher_text(count: i64) -> String {
    format!("捕獲野生卡米!!\n趕快收服牠吧!!\n目前該車號已被發現 {count} 次")
}
