//! Platform-neutral replies produced by the registration flow and the
//! group command router. `line::flex` turns these into LINE messages.

use crate::store::CatcherRecord;

/// A button on a menu card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Tapping sends `text` back into the chat as the user.
    Message {
        label: &'static str,
        text: &'static str,
    },
    /// Tapping opens `uri`.
    Uri {
        label: &'static str,
        uri: &'static str,
    },
}

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// Catcher cards, already merged by plate.
    Catchers(Vec<CatcherRecord>),
    /// One card per action; `title` is the message the menu answers.
    Menu {
        title: String,
        actions: &'static [MenuAction],
    },
    /// Greeting for newly joined members. Empty `names` greets anonymously.
    Welcome { names: Vec<String> },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Short kind name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Catchers(_) => "catchers",
            Self::Menu { .. } => "menu",
            Self::Welcome { .. } => "welcome",
        }
    }
}
