//! Application layer for Parley.
//!
//! Use cases that coordinate the chat state, the store and the presentation
//! collaborators.

pub mod chat_service;
pub mod data_management;
pub mod reply_simulator;
pub mod theme_service;

pub use chat_service::ChatService;
pub use data_management::DataManagementService;
pub use reply_simulator::{CANNED_REPLIES, PlannedReply, ReplySimulator};
pub use theme_service::{ThemeSelection, ThemeService};
