//! Catcher registration: a four-step conversation in one-to-one chats.

pub mod flow;
pub mod prompts;
pub mod state;
pub mod store;

pub use flow::{FanOutReport, RegistrationFlow};
pub use state::{CatcherProfile, ConversationState, RegistrationStep, TextOutcome};
pub use store::{ConversationStore, spawn_expiry_task};
