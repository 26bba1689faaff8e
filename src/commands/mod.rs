//! Group chat commands: `?keyword` menus, partial plate lookups and the
//! member-joined welcome.

pub mod menu;
pub mod router;

pub use router::{GroupCommand, GroupCommandRouter};
