//! LINE Messaging API integration.

pub mod client;
pub mod flex;
pub mod webhook;

pub use client::{ChatPlatform, LineClient, MemberProfile};
pub use webhook::{InboundEvent, parse_events, verify_signature};
