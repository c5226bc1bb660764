//! Lead-capture conversation: `/start` → pick a service → leave a Telegram
//! contact → the lead goes to the administrator.
//!
//! Everything here is synchronous and free of I/O. The dispatcher feeds
//! events in and carries out the returned actions.

pub mod command;
pub mod contact;
pub mod machine;
pub mod menu;
pub mod messages;
pub mod session;

pub use command::{Command, parse_command};
pub use contact::{is_valid, normalize, parse_contact};
pub use machine::{Action, LeadFlow, Transition};
pub use menu::{Menu, MenuOption};
pub use messages::LeadReport;
pub use session::{Session, Stage};
