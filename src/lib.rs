//! KamiQ bot: LINE webhook service for catcher registration and group
//! keyword menus.

pub mod commands;
pub mod config;
pub mod error;
pub mod groups;
pub mod handler;
pub mod imgur;
pub mod line;
pub mod merge;
pub mod registration;
pub mod reply;
pub mod server;
pub mod store;
