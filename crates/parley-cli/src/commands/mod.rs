pub mod chat;
pub mod data;
pub mod settings;
