//! Partner and user profiles, and chat backgrounds.

use serde::{Deserialize, Serialize};

/// Display information for one side of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// Avatar image URL, if any.
    pub avatar: Option<String>,
    /// Presence text ("Online").
    pub status: String,
}

impl Profile {
    /// Default profile for the simulated partner.
    pub fn default_partner() -> Self {
        Self {
            name: "Chat partner".to_string(),
            avatar: None,
            status: "Online".to_string(),
        }
    }

    /// Default profile for the local user.
    pub fn default_user() -> Self {
        Self {
            name: "Me".to_string(),
            avatar: None,
            status: "Online".to_string(),
        }
    }
}

/// Kind of chat background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundKind {
    /// CSS color or gradient.
    Color,
    /// Image URL or data URL.
    Image,
}

/// A chat background, stored under `currentBackground` and collected in
/// `backgroundGallery`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Background {
    #[serde(rename = "type")]
    pub kind: BackgroundKind,
    pub value: String,
}

impl Background {
    pub fn color(value: impl Into<String>) -> Self {
        Self {
            kind: BackgroundKind::Color,
            value: value.into(),
        }
    }

    pub fn image(value: impl Into<String>) -> Self {
        Self {
            kind: BackgroundKind::Image,
            value: value.into(),
        }
    }
}
